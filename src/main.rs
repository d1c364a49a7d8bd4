// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use staffledger::{cli, commands, db};

fn init_logging() {
    // stdout carries tables and JSON; diagnostics go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("client", sub)) => commands::clients::handle(&conn, sub)?,
        Some(("role", sub)) => commands::roles::handle(&conn, sub)?,
        Some(("ratecard", sub)) => commands::ratecards::handle(&conn, sub)?,
        Some(("project", sub)) => commands::projects::handle(&mut conn, sub)?,
        Some(("resource", sub)) => commands::resources::handle(&conn, sub)?,
        Some(("plan", sub)) => commands::plan::handle(&mut conn, sub)?,
        Some(("assign", sub)) => commands::assign::handle(&mut conn, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&conn, sub)?,
        Some(("coverage", sub)) => commands::reports::coverage(&conn, sub)?,
        Some(("revenue", sub)) => commands::reports::revenue(&conn, sub)?,
        Some(("summary", sub)) => commands::reports::summary(&conn, sub)?,
        Some(("portfolio", sub)) => commands::reports::portfolio(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&conn, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
