// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Effective monthly FX rates.
//!
//! Precedence per month is ACTUAL, then PLANNED, then the last rate that was
//! genuinely sourced earlier in the same year, then a seed taken from the
//! most recent prior year. Carried and seeded values are flagged as
//! fallbacks and never become anchors themselves: the chain re-anchors on
//! the next ACTUAL or PLANNED entry.

use crate::models::{FxEntry, FxKind};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Actual,
    Planned,
    CarriedForward,
    Seeded,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEffectiveRate {
    pub month: u32,
    pub rate: Option<Decimal>,
    pub is_fallback: bool,
    pub source: RateSource,
}

/// Value used to fill months before the first sourced entry of a year.
#[derive(Debug, Clone, PartialEq)]
pub struct FxSeed {
    pub rate: Decimal,
    /// (year, month) of the entry it came from; `None` for the configured default.
    pub origin: Option<(i32, u32)>,
}

impl FxSeed {
    pub fn from_entry(e: &FxEntry) -> Self {
        FxSeed {
            rate: e.rate,
            origin: Some((e.year, e.month)),
        }
    }

    pub fn default_rate(rate: Decimal) -> Self {
        FxSeed { rate, origin: None }
    }
}

/// Resolve all twelve months of `year`.
///
/// `entries` may contain rows for other years; they are ignored.
pub fn resolve_fx_rates(
    year: i32,
    entries: &[FxEntry],
    seed: Option<&FxSeed>,
) -> [MonthlyEffectiveRate; 12] {
    let mut by_month: HashMap<(u32, FxKind), Decimal> = HashMap::new();
    for e in entries.iter().filter(|e| e.year == year) {
        by_month.insert((e.month, e.kind), e.rate);
    }

    let mut anchor: Option<Decimal> = None;
    std::array::from_fn(|i| {
        let month = i as u32 + 1;
        let sourced = by_month
            .get(&(month, FxKind::Actual))
            .map(|r| (*r, RateSource::Actual))
            .or_else(|| {
                by_month
                    .get(&(month, FxKind::Planned))
                    .map(|r| (*r, RateSource::Planned))
            });
        if let Some((rate, source)) = sourced {
            anchor = Some(rate);
            return MonthlyEffectiveRate {
                month,
                rate: Some(rate),
                is_fallback: false,
                source,
            };
        }
        if let Some(rate) = anchor {
            debug!(year, month, %rate, "fx carried forward");
            return MonthlyEffectiveRate {
                month,
                rate: Some(rate),
                is_fallback: true,
                source: RateSource::CarriedForward,
            };
        }
        if let Some(s) = seed {
            debug!(year, month, origin = ?s.origin, rate = %s.rate, "fx seeded");
            return MonthlyEffectiveRate {
                month,
                rate: Some(s.rate),
                is_fallback: true,
                source: RateSource::Seeded,
            };
        }
        MonthlyEffectiveRate {
            month,
            rate: None,
            is_fallback: false,
            source: RateSource::Missing,
        }
    })
}

/// Pick the seed among entries strictly before `year`: latest year, latest
/// month, ACTUAL over PLANNED.
pub fn pick_seed(year: i32, entries: &[FxEntry]) -> Option<FxSeed> {
    entries
        .iter()
        .filter(|e| e.year < year)
        .max_by_key(|e| (e.year, e.month, e.kind == FxKind::Actual))
        .map(FxSeed::from_entry)
}

/// Sorted warnings for months left without a rate.
pub fn fx_warnings(rates: &[MonthlyEffectiveRate]) -> Vec<String> {
    let missing: Vec<String> = rates
        .iter()
        .filter(|r| r.rate.is_none())
        .map(|r| r.month.to_string())
        .collect();
    if missing.is_empty() {
        Vec::new()
    } else {
        vec![format!("no FX rate for months: {}", missing.join(", "))]
    }
}

/// The single pair the FX table describes: 1 `base` = rate `quote`.
#[derive(Debug, Clone, Copy)]
pub struct FxPair<'a> {
    pub base: &'a str,
    pub quote: &'a str,
}

/// Convert `amount` with a supplied rate. `None` when the currencies differ
/// and either the pair does not cover them or the rate is missing.
pub fn convert(
    amount: Decimal,
    from: &str,
    to: &str,
    pair: FxPair<'_>,
    rate: Option<Decimal>,
) -> Option<Decimal> {
    if from.eq_ignore_ascii_case(to) {
        return Some(amount);
    }
    let rate = rate.filter(|r| !r.is_zero())?;
    if from.eq_ignore_ascii_case(pair.base) && to.eq_ignore_ascii_case(pair.quote) {
        Some(amount * rate)
    } else if from.eq_ignore_ascii_case(pair.quote) && to.eq_ignore_ascii_case(pair.base) {
        Some(amount / rate)
    } else {
        None
    }
}
