// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::project_and_year;
use crate::config::{self, EngineConfig};
use crate::db;
use crate::engine::coverage::compute_coverage;
use crate::engine::financials::{MonthlyFinancials, project_financials};
use crate::engine::revenue::{AllocationBase, compute_revenue};
use crate::engine::rollup::{PortfolioRollup, combine, rollup_portfolio};
use crate::store;
use crate::utils::{fmt_dec, fmt_opt, maybe_print_json, parse_year, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::path::PathBuf;

fn base_arg(sub: &clap::ArgMatches) -> Result<AllocationBase> {
    let raw = sub
        .get_one::<String>("base")
        .map(|s| s.as_str())
        .unwrap_or("monthly");
    AllocationBase::parse(raw).ok_or_else(|| anyhow!("Unknown allocation base '{}'", raw))
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {}", w);
    }
}

pub fn coverage(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (project_id, year) = project_and_year(conn, sub)?;
    let lines = store::get_demand_lines(conn, project_id, year)?;
    let supply = store::get_active_supply(conn, project_id, year)?;
    let report = compute_coverage(year, &lines, &supply).rounded();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let by_line = report
        .by_line
        .iter()
        .map(|l| {
            let statuses = l
                .months
                .iter()
                .filter(|m| m.demand_fte > rust_decimal::Decimal::ZERO)
                .map(|m| m.status.label())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
                .join(",");
            vec![
                l.demand_line_id.to_string(),
                l.role_name.clone(),
                l.label.clone().unwrap_or_default(),
                fmt_dec(l.total_demand_fte),
                fmt_dec(l.total_assigned_fte),
                statuses,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Line", "Role", "Label", "Demand FTE", "Assigned FTE", "Statuses"],
            by_line
        )
    );

    let by_month = report
        .by_month
        .iter()
        .map(|m| {
            vec![
                format!("{}-{:02}", year, m.month),
                fmt_dec(m.demand_fte),
                fmt_dec(m.supplied_fte),
                fmt_dec(m.gap_fte),
                fmt_dec(m.unattributed_fte),
                fmt_dec(m.ratio),
                m.status.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Month", "Demand", "Supplied", "Gap", "Unattributed", "Ratio", "Status"],
            by_month
        )
    );
    Ok(())
}

pub fn revenue(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (project_id, year) = project_and_year(conn, sub)?;
    let base = base_arg(sub)?;
    let cfg = config::load(conn)?;
    let project = store::get_project(conn, project_id)?;
    let card_id = project
        .rate_card_id
        .ok_or_else(|| anyhow!("Project '{}' has no rate card", project.name))?;
    let card = store::get_rate_card(conn, card_id)?;
    let lines = store::get_demand_lines(conn, project_id, year)?;
    let supply = store::get_active_supply(conn, project_id, year)?;

    let coverage = compute_coverage(year, &lines, &supply);
    let report = compute_revenue(year, &lines, &supply, &card, &coverage, base, &cfg).rounded();

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    let rows = report
        .by_month
        .iter()
        .map(|r| {
            vec![
                format!("{}-{:02}", year, r.month),
                fmt_dec(r.forecast_revenue),
                fmt_dec(r.staffed_revenue),
                fmt_dec(r.coverage_ratio),
                fmt_dec(r.assigned_revenue),
                fmt_dec(r.revenue_gap),
            ]
        })
        .collect();
    println!("Revenue in {}", report.currency);
    println!(
        "{}",
        pretty_table(
            &["Month", "Forecast", "Staffed", "Coverage", "Assigned", "Gap"],
            rows
        )
    );
    print_warnings(&report.warnings);
    Ok(())
}

fn pnl_rows(year: i32, months: &[MonthlyFinancials]) -> Vec<Vec<String>> {
    months
        .iter()
        .map(|m| {
            vec![
                format!("{}-{:02}", year, m.month),
                fmt_dec(m.demand_fte),
                fmt_dec(m.supplied_fte),
                m.status.to_string(),
                fmt_dec(m.forecast_revenue),
                fmt_dec(m.assigned_revenue),
                fmt_dec(m.labor_cost),
                fmt_dec(m.overhead_cost),
                fmt_opt(m.blended_rate),
                fmt_opt(m.gross_margin_pct),
            ]
        })
        .collect()
}

const PNL_HEADERS: [&str; 10] = [
    "Month", "Demand", "Supplied", "Status", "Forecast", "Assigned", "Labor", "Overhead",
    "Rate/FTE", "Margin %",
];

pub fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (project_id, year) = project_and_year(conn, sub)?;
    let cfg = config::load(conn)?;
    let inputs = store::load_project_inputs(conn, project_id, year, &cfg)?;
    let py = project_financials(&inputs, AllocationBase::MonthlyPrice, &cfg).rounded();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &py)? {
        return Ok(());
    }

    println!("{} {} ({})", py.project_name, year, py.currency);
    println!("{}", pretty_table(&PNL_HEADERS, pnl_rows(year, &py.months)));
    let a = &py.annual;
    let rows = vec![
        vec!["Forecast FTE".to_string(), fmt_dec(a.forecast_fte)],
        vec!["Supplied FTE".to_string(), fmt_dec(a.supplied_fte)],
        vec!["Forecast revenue".to_string(), fmt_dec(a.forecast_revenue)],
        vec!["Assigned revenue".to_string(), fmt_dec(a.assigned_revenue)],
        vec!["Revenue gap".to_string(), fmt_dec(a.revenue_gap)],
        vec!["Labor cost".to_string(), fmt_dec(a.labor_cost)],
        vec!["Overhead".to_string(), fmt_dec(a.overhead_cost)],
        vec!["Avg rate / FTE".to_string(), fmt_opt(a.blended_rate)],
        vec!["Avg cost / FTE".to_string(), fmt_opt(a.blended_cost)],
        vec!["Labor margin %".to_string(), fmt_opt(a.labor_margin_pct)],
        vec!["Gross margin %".to_string(), fmt_opt(a.gross_margin_pct)],
    ];
    println!("{}", pretty_table(&["Annual", "Value"], rows));
    print_warnings(&py.warnings);
    Ok(())
}

/// File-backed databases are read by a pool of fresh connections; anything
/// else (in-memory) is fetched on the caller's connection.
fn portfolio_rollup(conn: &Connection, year: i32, cfg: &EngineConfig) -> Result<PortfolioRollup> {
    let ids: Vec<i64> = store::list_projects(conn)?.iter().map(|p| p.id).collect();
    let base = AllocationBase::MonthlyPrice;
    match conn.path().filter(|p| !p.is_empty()).map(PathBuf::from) {
        Some(path) => rollup_portfolio(&ids, year, base, cfg, |id, y| {
            let c = db::open_read_only(&path)?;
            store::load_project_inputs(&c, id, y, cfg)
        }),
        None => {
            let mut years = Vec::with_capacity(ids.len());
            for id in ids {
                let inputs = store::load_project_inputs(conn, id, year, cfg)?;
                years.push(project_financials(&inputs, base, cfg));
            }
            Ok(combine(year, &years, cfg))
        }
    }
}

pub fn portfolio(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = parse_year(sub.get_one::<String>("year").unwrap())?;
    let cfg = config::load(conn)?;
    let rollup = portfolio_rollup(conn, year, &cfg)?.rounded();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rollup)? {
        return Ok(());
    }

    println!("Portfolio {} ({})", year, rollup.currency);
    let rows = rollup
        .projects
        .iter()
        .map(|p| {
            vec![
                p.project_name.clone(),
                fmt_dec(p.annual.forecast_revenue),
                fmt_dec(p.annual.assigned_revenue),
                fmt_dec(p.annual.labor_cost + p.annual.overhead_cost),
                fmt_opt(p.annual.gross_margin_pct),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Project", "Forecast", "Assigned", "Cost", "Margin %"],
            rows
        )
    );
    println!("{}", pretty_table(&PNL_HEADERS, pnl_rows(year, &rollup.months)));
    print_warnings(&rollup.warnings);
    Ok(())
}
