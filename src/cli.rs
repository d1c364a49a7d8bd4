// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn req(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn project_year(cmd: Command) -> Command {
    cmd.arg(req("project", "Project name"))
        .arg(req("year", "Year, e.g. 2025"))
}

pub fn build_cli() -> Command {
    command!()
        .name("staffledger")
        .about("Staffing coverage, revenue reconciliation and margins for services projects")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("client")
                .about("Manage clients")
                .subcommand(Command::new("add").arg(req("name", "Client name")))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("role")
                .about("Manage roles")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Role name"))
                        .arg(opt("category", "Role category"))
                        .arg(opt("seniority", "Seniority, e.g. Senior")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("ratecard")
                .about("Manage rate cards")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Rate card name"))
                        .arg(req("currency", "Currency code"))
                        .arg(req("from", "Valid from YYYY-MM-DD"))
                        .arg(opt("to", "Valid to YYYY-MM-DD")),
                )
                .subcommand(
                    Command::new("set-line")
                        .arg(req("card", "Rate card name"))
                        .arg(req("role", "Role name"))
                        .arg(req("price", "Price per unit"))
                        .arg(
                            Arg::new("unit")
                                .long("unit")
                                .default_value("month")
                                .value_parser(["hour", "month"])
                                .help("Price unit"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("show").arg(req("card", "Rate card name")),
                )),
        )
        .subcommand(
            Command::new("project")
                .about("Manage projects")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Project name"))
                        .arg(req("client", "Client name"))
                        .arg(req("currency", "Billing currency"))
                        .arg(opt("rate-card", "Rate card name")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("set-rate-card")
                        .about("Switch rate card; retires the project's demand lines")
                        .arg(req("project", "Project name"))
                        .arg(req("card", "Rate card name")),
                ),
        )
        .subcommand(
            Command::new("resource")
                .about("Manage people")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Resource name"))
                        .arg(req("role", "Role name"))
                        .arg(req("cost", "Monthly cost of one FTE"))
                        .arg(req("currency", "Cost currency")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("plan")
                .about("Demand lines: planned FTE per role")
                .subcommand(
                    Command::new("add")
                        .arg(req("project", "Project name"))
                        .arg(req("role", "Role name"))
                        .arg(opt("label", "Free-text label")),
                )
                .subcommand(
                    Command::new("set")
                        .arg(req("line", "Demand line id").value_parser(clap::value_parser!(i64)))
                        .arg(req("month", "Month YYYY-MM"))
                        .arg(req("fte", "Planned FTE")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(req("line", "Demand line id").value_parser(clap::value_parser!(i64))),
                )
                .subcommand(json_flags(project_year(Command::new("list")))),
        )
        .subcommand(
            Command::new("assign")
                .about("Supply: resource assignments and monthly allocation")
                .subcommand(
                    Command::new("add")
                        .arg(req("project", "Project name"))
                        .arg(req("resource", "Resource name"))
                        .arg(req("start", "Start date YYYY-MM-DD"))
                        .arg(opt("end", "End date YYYY-MM-DD"))
                        .arg(
                            Arg::new("non-billable")
                                .long("non-billable")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("set")
                        .arg(
                            req("assignment", "Assignment id")
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(req("month", "Month YYYY-MM"))
                        .arg(req("pct", "Allocation percentage 0-200")),
                )
                .subcommand(json_flags(project_year(Command::new("list")))),
        )
        .subcommand(
            Command::new("fx")
                .about("Monthly FX entries for the configured pair")
                .subcommand(
                    Command::new("set")
                        .arg(req("month", "Month YYYY-MM"))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("ACTUAL")
                                .value_parser(["ACTUAL", "PLANNED", "actual", "planned"]),
                        )
                        .arg(req("rate", "1 base = rate quote")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(req("year", "Year")),
                ))
                .subcommand(json_flags(
                    Command::new("resolve").arg(req("year", "Year")),
                )),
        )
        .subcommand(json_flags(project_year(
            Command::new("coverage").about("Per-line and monthly staffing coverage"),
        )))
        .subcommand(json_flags(project_year(
            Command::new("revenue")
                .about("Forecast vs. staffed revenue")
                .arg(
                    Arg::new("base")
                        .long("base")
                        .default_value("monthly")
                        .value_parser(["hours", "monthly"])
                        .help("Allocation base for assignment pricing"),
                ),
        )))
        .subcommand(json_flags(project_year(
            Command::new("summary").about("Monthly and annual P&L for a project"),
        )))
        .subcommand(json_flags(
            Command::new("portfolio")
                .about("Roll every project up into the reporting currency")
                .arg(req("year", "Year")),
        ))
        .subcommand(
            Command::new("import")
                .about("Import CSV batches (all-or-nothing)")
                .subcommand(
                    Command::new("allocations")
                        .arg(req("path", "CSV: assignment_id,year,month,pct")),
                )
                .subcommand(
                    Command::new("forecast").arg(req("path", "CSV: demand_line_id,year,month,fte")),
                ),
        )
        .subcommand(
            Command::new("export").about("Export reports").subcommand(project_year(
                Command::new("coverage")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(req("out", "Output file")),
            )),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check for missing rates, FX gaps and over-allocation")
                .arg(req("year", "Year")),
        )
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting name"))
                        .arg(Arg::new("value").long("value").required(true).allow_hyphen_values(true)),
                ),
        )
}
