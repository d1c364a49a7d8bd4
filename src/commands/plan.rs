// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::project_and_year;
use crate::models::MONTHS;
use crate::store::{self, ForecastUpdate};
use crate::utils::{
    fmt_dec, id_for_project, id_for_role, maybe_print_json, parse_decimal, parse_month,
    pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("set", sub)) => set(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("line").unwrap();
            store::soft_delete_demand_line(conn, id)?;
            println!("Removed demand line {}", id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let project = sub.get_one::<String>("project").unwrap();
    let role = sub.get_one::<String>("role").unwrap();
    let label = sub
        .get_one::<String>("label")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    let project_id = id_for_project(conn, project)?;
    let role_id = id_for_role(conn, role)?;
    let id = store::add_demand_line(conn, project_id, role_id, label)?;
    println!("Added demand line {} ({} on {})", id, role.trim(), project.trim());
    Ok(())
}

fn set(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let line = *sub.get_one::<i64>("line").unwrap();
    let (year, month) = parse_month(sub.get_one::<String>("month").unwrap())?;
    let fte = parse_decimal(sub.get_one::<String>("fte").unwrap())?;
    store::upsert_forecast(
        conn,
        &[ForecastUpdate {
            demand_line_id: line,
            year,
            month,
            fte,
        }],
    )?;
    println!("Demand line {} {}-{:02} = {} FTE", line, year, month, fte);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (project_id, year) = project_and_year(conn, sub)?;
    let lines = store::get_demand_lines(conn, project_id, year)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &lines)? {
        return Ok(());
    }
    let mut headers = vec!["Id", "Role", "Label"];
    let month_hdrs: Vec<String> = MONTHS.map(|m| format!("{:02}", m)).collect();
    headers.extend(month_hdrs.iter().map(|s| s.as_str()));
    let rows = lines
        .iter()
        .map(|l| {
            let mut row = vec![
                l.id.to_string(),
                l.role.name.clone(),
                l.label.clone().unwrap_or_default(),
            ];
            row.extend(MONTHS.map(|m| {
                l.monthly_forecast
                    .get(&m)
                    .map(|v| fmt_dec(*v))
                    .unwrap_or_default()
            }));
            row
        })
        .collect();
    println!("{}", pretty_table(&headers, rows));
    Ok(())
}
