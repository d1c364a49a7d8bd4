// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{id_for_role, normalize_currency, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", _)) => list(conn)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let role = sub.get_one::<String>("role").unwrap();
    let cost = parse_decimal(sub.get_one::<String>("cost").unwrap())?;
    if cost.is_sign_negative() && !cost.is_zero() {
        return Err(anyhow!("Monthly cost must not be negative"));
    }
    let ccy = normalize_currency(sub.get_one::<String>("currency").unwrap())?;
    let role_id = id_for_role(conn, role)?;
    store::add_resource(conn, name, role_id, cost, &ccy)?;
    println!("Added resource '{}' ({}, {} {}/month)", name, role.trim(), cost, ccy);
    Ok(())
}

fn list(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT res.name, r.name, res.monthly_cost, res.cost_currency
         FROM resources res JOIN roles r ON res.role_id=r.id ORDER BY res.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (n, role, cost, ccy) = row?;
        data.push(vec![n, role, cost, ccy]);
    }
    println!(
        "{}",
        pretty_table(&["Resource", "Role", "Monthly cost", "CCY"], data)
    );
    Ok(())
}
