// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_setting, normalize_currency, parse_decimal, set_setting};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

/// Global defaults handed explicitly to the engine functions that need them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    /// Company overhead applied on top of labor cost, in percent.
    pub overhead_pct: Decimal,
    /// Standard billable hours in one FTE-month.
    pub hours_per_month: Decimal,
    /// Last-resort FX seed when no entry exists for the year or any earlier one.
    pub default_fx_rate: Option<Decimal>,
    /// FX table pair: 1 `fx_base_currency` = rate `fx_quote_currency`.
    pub fx_base_currency: String,
    pub fx_quote_currency: String,
    /// Currency portfolio rollups are expressed in.
    pub reporting_currency: String,
    /// Max concurrent per-project fetches during a portfolio rollup.
    pub fetch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overhead_pct: Decimal::ZERO,
            hours_per_month: Decimal::from(160),
            default_fx_rate: None,
            fx_base_currency: "USD".to_string(),
            fx_quote_currency: "CLP".to_string(),
            reporting_currency: "USD".to_string(),
            fetch_concurrency: 3,
        }
    }
}

pub const KEYS: [&str; 7] = [
    "overhead_pct",
    "hours_per_month",
    "default_fx_rate",
    "fx_base_currency",
    "fx_quote_currency",
    "reporting_currency",
    "fetch_concurrency",
];

pub fn load(conn: &Connection) -> Result<EngineConfig> {
    let mut cfg = EngineConfig::default();
    for key in KEYS {
        if let Some(v) = get_setting(conn, key)? {
            apply(&mut cfg, key, &v)
                .with_context(|| format!("Invalid stored setting '{}'", key))?;
        }
    }
    Ok(cfg)
}

/// Validate and persist one setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<EngineConfig> {
    let mut cfg = load(conn)?;
    apply(&mut cfg, key, value)?;
    let stored = match key {
        "fx_base_currency" | "fx_quote_currency" | "reporting_currency" => {
            normalize_currency(value)?
        }
        _ => value.trim().to_string(),
    };
    set_setting(conn, key, &stored)?;
    Ok(cfg)
}

fn apply(cfg: &mut EngineConfig, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        "overhead_pct" => {
            let v = parse_decimal(value)?;
            if v.is_sign_negative() {
                return Err(anyhow!("overhead_pct must not be negative"));
            }
            cfg.overhead_pct = v;
        }
        "hours_per_month" => {
            let v = parse_decimal(value)?;
            if v <= Decimal::ZERO {
                return Err(anyhow!("hours_per_month must be positive"));
            }
            cfg.hours_per_month = v;
        }
        "default_fx_rate" => {
            cfg.default_fx_rate = if value.is_empty() {
                None
            } else {
                let v = parse_decimal(value)?;
                if v <= Decimal::ZERO {
                    return Err(anyhow!("default_fx_rate must be positive"));
                }
                Some(v)
            };
        }
        "fx_base_currency" => cfg.fx_base_currency = normalize_currency(value)?,
        "fx_quote_currency" => cfg.fx_quote_currency = normalize_currency(value)?,
        "reporting_currency" => cfg.reporting_currency = normalize_currency(value)?,
        "fetch_concurrency" => {
            let n: usize = value
                .parse()
                .with_context(|| format!("Invalid concurrency '{}'", value))?;
            cfg.fetch_concurrency = n.max(1);
        }
        _ => return Err(anyhow!("Unknown setting '{}' (known: {})", key, KEYS.join(", "))),
    }
    Ok(())
}
