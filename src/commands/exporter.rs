// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::project_and_year;
use crate::engine::coverage::compute_coverage;
use crate::store;
use crate::utils::fmt_dec;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("coverage", sub)) => export_coverage(conn, sub),
        _ => Ok(()),
    }
}

fn export_coverage(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let (project_id, year) = project_and_year(conn, sub)?;
    let project = store::get_project(conn, project_id)?;
    let lines = store::get_demand_lines(conn, project_id, year)?;
    let supply = store::get_active_supply(conn, project_id, year)?;
    let report = compute_coverage(year, &lines, &supply).rounded();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "project", "year", "month", "line", "role", "label", "demand_fte",
                "assigned_fte", "ratio", "status",
            ])?;
            for line in &report.by_line {
                for m in &line.months {
                    wtr.write_record([
                        project.name.clone(),
                        year.to_string(),
                        m.month.to_string(),
                        line.demand_line_id.to_string(),
                        line.role_name.clone(),
                        line.label.clone().unwrap_or_default(),
                        fmt_dec(m.demand_fte),
                        fmt_dec(m.assigned_fte),
                        fmt_dec(m.ratio),
                        m.status.label().to_string(),
                    ])?;
                }
            }
            wtr.flush()?;
        }
        "json" => {
            let doc = json!({
                "project": project.name,
                "year": year,
                "by_line": report.by_line,
                "by_month": report.by_month,
            });
            std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported coverage for {} {} to {}", project.name, year, out);
    Ok(())
}
