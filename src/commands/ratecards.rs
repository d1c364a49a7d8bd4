// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::RateUnit;
use crate::store;
use crate::utils::{
    id_for_rate_card, id_for_role, maybe_print_json, normalize_currency, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("set-line", sub)) => set_line(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let ccy = normalize_currency(sub.get_one::<String>("currency").unwrap())?;
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = match sub.get_one::<String>("to") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    if let Some(t) = to {
        if t < from {
            return Err(anyhow!("Rate card ends ({}) before it starts ({})", t, from));
        }
    }
    store::add_rate_card(conn, name, &ccy, from, to)?;
    println!("Added rate card '{}' ({}) from {}", name, ccy, from);
    Ok(())
}

fn set_line(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = sub.get_one::<String>("card").unwrap();
    let role = sub.get_one::<String>("role").unwrap();
    let price = parse_decimal(sub.get_one::<String>("price").unwrap())?;
    let unit_raw = sub.get_one::<String>("unit").unwrap();
    let unit = RateUnit::parse(unit_raw).ok_or_else(|| anyhow!("Invalid unit '{}'", unit_raw))?;
    let card_id = id_for_rate_card(conn, card)?;
    let role_id = id_for_role(conn, role)?;
    store::set_rate_card_line(conn, card_id, role_id, price, unit)?;
    println!(
        "Rate for {} on {} = {} per {}",
        role.trim(),
        card.trim(),
        price,
        unit.as_str()
    );
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card_id = id_for_rate_card(conn, sub.get_one::<String>("card").unwrap())?;
    let card = store::get_rate_card(conn, card_id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &card)? {
        return Ok(());
    }
    let rows = card
        .lines
        .iter()
        .map(|l| {
            vec![
                l.role_name.clone(),
                format!("{:.2}", l.price),
                card.currency.clone(),
                l.unit.as_str().to_string(),
            ]
        })
        .collect();
    println!(
        "{} ({} .. {})",
        card.name,
        card.valid_from,
        card.valid_to
            .map(|d| d.to_string())
            .unwrap_or_else(|| "open".into())
    );
    println!("{}", pretty_table(&["Role", "Price", "CCY", "Unit"], rows));
    Ok(())
}
