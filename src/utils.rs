// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{LedgerError, check_year};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("static regex"));

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parse `YYYY-MM` into (year, month).
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let s = s.trim();
    let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((check_year(d.year())?, d.month()))
}

pub fn parse_year(s: &str) -> Result<i32> {
    let y: i32 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid year '{}'", s))?;
    Ok(check_year(y)?)
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn normalize_currency(s: &str) -> Result<String> {
    let c = s.trim().to_uppercase();
    if CURRENCY_RE.is_match(&c) {
        Ok(c)
    } else {
        Err(LedgerError::InvalidCurrency(s.trim().to_string()).into())
    }
}

/// Emission rounding for money and FTE figures.
pub fn round2(d: Decimal) -> Decimal {
    d.round_dp(2)
}

pub fn fmt_dec(d: Decimal) -> String {
    format!("{:.2}", round2(d))
}

pub fn fmt_opt(d: Option<Decimal>) -> String {
    d.map(fmt_dec).unwrap_or_else(|| "-".to_string())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

fn id_by_name(conn: &Connection, table: &str, label: &str, name: &str) -> Result<i64> {
    let sql = format!("SELECT id FROM {} WHERE name=?1", table);
    let mut stmt = conn.prepare(&sql)?;
    let id: Option<i64> = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .optional()?;
    id.ok_or_else(|| LedgerError::NotFound(format!("{} '{}'", label, name.trim())).into())
}

pub fn id_for_client(conn: &Connection, name: &str) -> Result<i64> {
    id_by_name(conn, "clients", "Client", name)
}

pub fn id_for_project(conn: &Connection, name: &str) -> Result<i64> {
    id_by_name(conn, "projects", "Project", name)
}

pub fn id_for_role(conn: &Connection, name: &str) -> Result<i64> {
    id_by_name(conn, "roles", "Role", name)
}

pub fn id_for_resource(conn: &Connection, name: &str) -> Result<i64> {
    id_by_name(conn, "resources", "Resource", name)
}

pub fn id_for_rate_card(conn: &Connection, name: &str) -> Result<i64> {
    id_by_name(conn, "rate_cards", "Rate card", name)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
