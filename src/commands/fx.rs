// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config;
use crate::engine::fx::{fx_warnings, resolve_fx_rates};
use crate::models::FxKind;
use crate::store;
use crate::utils::{maybe_print_json, parse_decimal, parse_month, parse_year, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set_rate(conn, sub)?,
        Some(("list", sub)) => list_rates(conn, sub)?,
        Some(("resolve", sub)) => resolve(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set_rate(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (year, month) = parse_month(sub.get_one::<String>("month").unwrap())?;
    let kind_raw = sub.get_one::<String>("kind").unwrap();
    let kind = FxKind::parse(kind_raw).ok_or_else(|| anyhow!("Invalid FX kind '{}'", kind_raw))?;
    let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
    store::upsert_fx_entry(conn, year, month, kind, rate)?;
    let cfg = config::load(conn)?;
    println!(
        "{} {}-{:02}: 1 {} = {} {}",
        kind, year, month, cfg.fx_base_currency, rate, cfg.fx_quote_currency
    );
    Ok(())
}

fn list_rates(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = parse_year(sub.get_one::<String>("year").unwrap())?;
    let entries = store::get_fx_entries(conn, year)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &entries)? {
        return Ok(());
    }
    let data = entries
        .iter()
        .map(|e| {
            vec![
                format!("{}-{:02}", e.year, e.month),
                e.kind.to_string(),
                e.rate.to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Month", "Kind", "Rate"], data));
    Ok(())
}

fn resolve(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = parse_year(sub.get_one::<String>("year").unwrap())?;
    let cfg = config::load(conn)?;
    let entries = store::get_fx_entries(conn, year)?;
    let seed = store::fx_seed(conn, year, &cfg)?;
    let rates = resolve_fx_rates(year, &entries, seed.as_ref());
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rates)? {
        return Ok(());
    }
    let data = rates
        .iter()
        .map(|r| {
            vec![
                format!("{}-{:02}", year, r.month),
                r.rate.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                if r.is_fallback { "yes" } else { "" }.to_string(),
                format!("{:?}", r.source),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Effective rate", "Fallback", "Source"], data)
    );
    for w in fx_warnings(&rates) {
        eprintln!("warning: {}", w);
    }
    Ok(())
}
