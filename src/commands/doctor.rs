// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config;
use crate::engine::fx::resolve_fx_rates;
use crate::models::MONTHS;
use crate::store;
use crate::utils::{parse_year, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Finding {
    pub issue: String,
    pub detail: String,
}

fn finding(issue: &str, detail: String) -> Finding {
    Finding {
        issue: issue.to_string(),
        detail,
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let year = parse_year(m.get_one::<String>("year").unwrap())?;
    let rows: Vec<Vec<String>> = diagnose(conn, year)?
        .into_iter()
        .map(|f| vec![f.issue, f.detail])
        .collect();
    if rows.is_empty() {
        println!("doctor: no issues found for {}", year);
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn diagnose(conn: &Connection, year: i32) -> Result<Vec<Finding>> {
    let cfg = config::load(conn)?;
    let mut out = BTreeSet::new();
    let year_start = NaiveDate::from_ymd_opt(year, 1, 1);
    let year_end = NaiveDate::from_ymd_opt(year, 12, 31);
    // (resource, month) -> summed pct across every project
    let mut load: BTreeMap<(String, u32), Decimal> = BTreeMap::new();

    for project in store::list_projects(conn)? {
        let lines = store::get_demand_lines(conn, project.id, year)?;
        let supply = store::get_active_supply(conn, project.id, year)?;

        for s in &supply {
            for month in MONTHS {
                if s.is_active_in(year, month) {
                    *load
                        .entry((s.resource_name.clone(), month))
                        .or_insert(Decimal::ZERO) += s.allocation_pct(month);
                }
            }
        }

        let Some(card_id) = project.rate_card_id else {
            if !lines.is_empty() || !supply.is_empty() {
                out.insert(finding("no_rate_card", project.name.clone()));
            }
            continue;
        };
        let card = store::get_rate_card(conn, card_id)?;
        let starts_late = year_end.is_some_and(|end| card.valid_from > end);
        let ends_early = matches!((card.valid_to, year_start), (Some(to), Some(start)) if to < start);
        if starts_late || ends_early {
            out.insert(finding(
                "rate_card_out_of_range",
                format!("{}: '{}' not valid in {}", project.name, card.name, year),
            ));
        }

        let demand_roles = lines
            .iter()
            .filter(|l| l.monthly_forecast.values().any(|v| *v > Decimal::ZERO))
            .map(|l| (l.role.id, l.role.name.as_str()));
        let supply_roles = supply
            .iter()
            .filter(|s| s.billable)
            .map(|s| (s.role_id, s.role_name.as_str()));
        for (role_id, role_name) in demand_roles.chain(supply_roles) {
            if card.line_for(role_id).is_none() {
                out.insert(finding(
                    "missing_rate",
                    format!("{}: {} on '{}'", project.name, role_name, card.name),
                ));
            }
        }
    }

    for ((resource, month), pct) in load {
        if pct > Decimal::ONE_HUNDRED {
            out.insert(finding(
                "over_allocated",
                format!("{} {}-{:02}: {}%", resource, year, month, pct.normalize()),
            ));
        }
    }

    let entries = store::get_fx_entries(conn, year)?;
    let seed = store::fx_seed(conn, year, &cfg)?;
    let missing: Vec<String> = resolve_fx_rates(year, &entries, seed.as_ref())
        .iter()
        .filter(|r| r.rate.is_none())
        .map(|r| format!("{:02}", r.month))
        .collect();
    if !missing.is_empty() {
        out.insert(finding(
            "missing_fx",
            format!(
                "{}/{} {}: {}",
                cfg.fx_base_currency,
                cfg.fx_quote_currency,
                year,
                missing.join(", ")
            ),
        ));
    }

    Ok(out.into_iter().collect())
}
