// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::project_and_year;
use crate::models::MONTHS;
use crate::store::{self, AllocationUpdate};
use crate::utils::{
    fmt_dec, id_for_project, id_for_resource, maybe_print_json, parse_date, parse_decimal,
    parse_month, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let project = sub.get_one::<String>("project").unwrap();
    let resource = sub.get_one::<String>("resource").unwrap();
    let start = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end = match sub.get_one::<String>("end") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let billable = !sub.get_flag("non-billable");
    let project_id = id_for_project(conn, project)?;
    let resource_id = id_for_resource(conn, resource)?;
    let id = store::add_assignment(conn, project_id, resource_id, start, end, billable)?;
    println!(
        "Added assignment {}: {} on {} from {}{}",
        id,
        resource.trim(),
        project.trim(),
        start,
        if billable { "" } else { " (non-billable)" }
    );
    Ok(())
}

fn set(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let assignment_id = *sub.get_one::<i64>("assignment").unwrap();
    let (year, month) = parse_month(sub.get_one::<String>("month").unwrap())?;
    let pct = parse_decimal(sub.get_one::<String>("pct").unwrap())?;
    store::upsert_allocations(
        conn,
        &[AllocationUpdate {
            assignment_id,
            year,
            month,
            pct,
        }],
    )?;
    if pct > rust_decimal::Decimal::ONE_HUNDRED {
        println!("Note: {}% over-allocates this assignment", pct);
    }
    println!("Assignment {} {}-{:02} = {}%", assignment_id, year, month, pct);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (project_id, year) = project_and_year(conn, sub)?;
    let supply = store::get_active_supply(conn, project_id, year)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &supply)? {
        return Ok(());
    }
    let mut headers = vec!["Id", "Resource", "Role", "Billable"];
    let month_hdrs: Vec<String> = MONTHS.map(|m| format!("{:02}", m)).collect();
    headers.extend(month_hdrs.iter().map(|s| s.as_str()));
    let rows = supply
        .iter()
        .map(|s| {
            let mut row = vec![
                s.id.to_string(),
                s.resource_name.clone(),
                s.role_name.clone(),
                if s.billable { "yes" } else { "no" }.to_string(),
            ];
            row.extend(MONTHS.map(|m| {
                if s.is_active_in(year, m) {
                    s.monthly_allocation_pct
                        .get(&m)
                        .map(|v| fmt_dec(*v))
                        .unwrap_or_default()
                } else {
                    "·".to_string()
                }
            }));
            row
        })
        .collect();
    println!("{}", pretty_table(&headers, rows));
    Ok(())
}
