// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

/// A monthly series tagged with its rollup rule.
#[derive(Debug, Clone)]
pub enum MetricSeries<'a> {
    /// FTE and money totals: plain sum, missing months count as zero.
    Sum(&'a [Option<Decimal>]),
    /// Blended rate / cost: mean over months that have a value.
    Average(&'a [Option<Decimal>]),
    /// Margin %: recomputed from the annual totals, never averaged.
    Margin {
        revenue: &'a [Option<Decimal>],
        cost: &'a [Option<Decimal>],
    },
}

pub fn aggregate_annual(series: &MetricSeries<'_>) -> Option<Decimal> {
    match series {
        MetricSeries::Sum(values) => Some(sum(values)),
        MetricSeries::Average(values) => average(values),
        MetricSeries::Margin { revenue, cost } => margin_pct(sum(revenue), sum(cost)),
    }
}

pub fn sum(values: &[Option<Decimal>]) -> Decimal {
    values.iter().flatten().sum()
}

/// Mean of the present values; `None` when every month is empty.
pub fn average(values: &[Option<Decimal>]) -> Option<Decimal> {
    let present: Vec<Decimal> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let total: Decimal = present.iter().sum();
    Some(total / Decimal::from(present.len()))
}

/// (revenue - cost) / revenue x 100, undefined without positive revenue.
pub fn margin_pct(revenue: Decimal, cost: Decimal) -> Option<Decimal> {
    if revenue > Decimal::ZERO {
        Some((revenue - cost) / revenue * Decimal::ONE_HUNDRED)
    } else {
        None
    }
}
