// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{
    id_for_client, id_for_project, id_for_rate_card, maybe_print_json, normalize_currency,
    pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-rate-card", sub)) => set_rate_card(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let client_id = id_for_client(conn, sub.get_one::<String>("client").unwrap())?;
    let ccy = normalize_currency(sub.get_one::<String>("currency").unwrap())?;
    let card_id = match sub.get_one::<String>("rate-card") {
        Some(card) => Some(id_for_rate_card(conn, card)?),
        None => None,
    };
    store::add_project(conn, client_id, name, &ccy, card_id)?;
    println!("Added project '{}' ({})", name, ccy);
    Ok(())
}

#[derive(Serialize)]
struct ProjectRow {
    name: String,
    client: String,
    currency: String,
    rate_card: Option<String>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT p.name, c.name, p.currency, rc.name FROM projects p
         JOIN clients c ON p.client_id=c.id
         LEFT JOIN rate_cards rc ON p.rate_card_id=rc.id
         ORDER BY c.name, p.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(ProjectRow {
            name: r.get(0)?,
            client: r.get(1)?,
            currency: r.get(2)?,
            rate_card: r.get(3)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|p| vec![p.name, p.client, p.currency, p.rate_card.unwrap_or_default()])
            .collect();
        println!(
            "{}",
            pretty_table(&["Project", "Client", "CCY", "Rate card"], rows)
        );
    }
    Ok(())
}

fn set_rate_card(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let project = sub.get_one::<String>("project").unwrap();
    let card = sub.get_one::<String>("card").unwrap();
    let project_id = id_for_project(conn, project)?;
    let card_id = id_for_rate_card(conn, card)?;
    let retired = store::set_project_rate_card(conn, project_id, Some(card_id))?;
    println!(
        "Project '{}' now uses rate card '{}' ({} demand lines retired)",
        project.trim(),
        card.trim(),
        retired
    );
    Ok(())
}
