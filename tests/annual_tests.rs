// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use staffledger::engine::annual::{MetricSeries, aggregate_annual, margin_pct};

fn some(v: i64) -> Option<Decimal> {
    Some(Decimal::from(v))
}

#[test]
fn margin_is_recomputed_from_totals() {
    let revenue = [some(0), some(100)];
    let cost = [some(0), some(50)];
    let m = aggregate_annual(&MetricSeries::Margin {
        revenue: &revenue,
        cost: &cost,
    })
    .unwrap();
    assert_eq!(format!("{:.2}", m), "50.00");

    // averaging monthly margins would give a different answer
    let revenue = [some(100), some(300)];
    let cost = [some(50), some(300)];
    let m = aggregate_annual(&MetricSeries::Margin {
        revenue: &revenue,
        cost: &cost,
    })
    .unwrap();
    assert_eq!(format!("{:.2}", m), "12.50");
}

#[test]
fn margin_undefined_without_revenue() {
    assert_eq!(margin_pct(Decimal::ZERO, Decimal::from(10)), None);
    let zeros = [some(0); 12];
    assert_eq!(
        aggregate_annual(&MetricSeries::Margin {
            revenue: &zeros,
            cost: &zeros,
        }),
        None
    );
    let loss = margin_pct(Decimal::from(100), Decimal::from(150)).unwrap();
    assert_eq!(format!("{:.2}", loss), "-50.00");
}

#[test]
fn averages_skip_months_without_a_value() {
    let rates = [some(10), None, some(20), None];
    let avg = aggregate_annual(&MetricSeries::Average(&rates)).unwrap();
    assert_eq!(format!("{:.2}", avg), "15.00");
    assert_eq!(aggregate_annual(&MetricSeries::Average(&[None, None])), None);
}

#[test]
fn sums_treat_missing_as_zero() {
    let fte = [some(1), None, some(2)];
    let total = aggregate_annual(&MetricSeries::Sum(&fte)).unwrap();
    assert_eq!(total, Decimal::from(3));
    assert_eq!(aggregate_annual(&MetricSeries::Sum(&[])), Some(Decimal::ZERO));
}
