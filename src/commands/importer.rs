// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! CSV batches. A file is parsed completely before anything is written and
//! then applied in one transaction, so a bad row leaves the store untouched.

use crate::store::{self, AllocationUpdate, ForecastUpdate};
use crate::utils::parse_decimal;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("allocations", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let n = import_allocations(conn, Path::new(path))?;
            println!("Imported {} allocation rows from {}", n, path);
        }
        Some(("forecast", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let n = import_forecast(conn, Path::new(path))?;
            println!("Imported {} forecast rows from {}", n, path);
        }
        _ => {}
    }
    Ok(())
}

fn field<'r>(rec: &'r StringRecord, idx: usize, name: &str, line: u64) -> Result<&'r str> {
    rec.get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .with_context(|| format!("line {}: {} missing", line, name))
}

fn read_rows<T>(
    path: &Path,
    parse: impl Fn(&StringRecord, u64) -> Result<T>,
) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let mut out = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let line = rec.position().map(|p| p.line()).unwrap_or_default();
        out.push(parse(&rec, line)?);
    }
    Ok(out)
}

/// `assignment_id,year,month,pct`
pub fn import_allocations(conn: &mut Connection, path: &Path) -> Result<usize> {
    let batch = read_rows(path, |rec, line| {
        Ok(AllocationUpdate {
            assignment_id: field(rec, 0, "assignment_id", line)?
                .parse()
                .with_context(|| format!("line {}: invalid assignment_id", line))?,
            year: field(rec, 1, "year", line)?
                .parse()
                .with_context(|| format!("line {}: invalid year", line))?,
            month: field(rec, 2, "month", line)?
                .parse()
                .with_context(|| format!("line {}: invalid month", line))?,
            pct: parse_decimal(field(rec, 3, "pct", line)?)
                .with_context(|| format!("line {}: invalid pct", line))?,
        })
    })?;
    store::upsert_allocations(conn, &batch)
}

/// `demand_line_id,year,month,fte`
pub fn import_forecast(conn: &mut Connection, path: &Path) -> Result<usize> {
    let batch = read_rows(path, |rec, line| {
        Ok(ForecastUpdate {
            demand_line_id: field(rec, 0, "demand_line_id", line)?
                .parse()
                .with_context(|| format!("line {}: invalid demand_line_id", line))?,
            year: field(rec, 1, "year", line)?
                .parse()
                .with_context(|| format!("line {}: invalid year", line))?,
            month: field(rec, 2, "month", line)?
                .parse()
                .with_context(|| format!("line {}: invalid month", line))?,
            fte: parse_decimal(field(rec, 3, "fte", line)?)
                .with_context(|| format!("line {}: invalid fte", line))?,
        })
    })?;
    store::upsert_forecast(conn, &batch)
}
