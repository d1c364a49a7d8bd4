// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config;
use crate::utils::{fmt_opt, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let cfg = config::load(conn)?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cfg)? {
                return Ok(());
            }
            let rows = vec![
                vec!["overhead_pct".into(), cfg.overhead_pct.to_string()],
                vec!["hours_per_month".into(), cfg.hours_per_month.to_string()],
                vec!["default_fx_rate".into(), fmt_opt(cfg.default_fx_rate)],
                vec!["fx_base_currency".into(), cfg.fx_base_currency],
                vec!["fx_quote_currency".into(), cfg.fx_quote_currency],
                vec!["reporting_currency".into(), cfg.reporting_currency],
                vec!["fetch_concurrency".into(), cfg.fetch_concurrency.to_string()],
            ];
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            config::set(conn, key, value)?;
            println!("{} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}
