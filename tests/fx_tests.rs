// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use staffledger::config::EngineConfig;
use staffledger::db;
use staffledger::engine::fx::{
    FxPair, FxSeed, RateSource, convert, fx_warnings, pick_seed, resolve_fx_rates,
};
use staffledger::models::{FxEntry, FxKind};
use staffledger::store;

fn entry(year: i32, month: u32, kind: FxKind, rate: i64) -> FxEntry {
    FxEntry {
        year,
        month,
        kind,
        rate: Decimal::from(rate),
    }
}

#[test]
fn actual_beats_planned_and_gaps_carry_forward() {
    let entries = vec![
        entry(2025, 1, FxKind::Planned, 910),
        entry(2025, 1, FxKind::Actual, 900),
        entry(2025, 2, FxKind::Planned, 850),
        entry(2025, 4, FxKind::Actual, 870),
    ];
    let rates = resolve_fx_rates(2025, &entries, None);

    assert_eq!(rates[0].rate, Some(Decimal::from(900)));
    assert_eq!(rates[0].source, RateSource::Actual);
    assert!(!rates[0].is_fallback);

    assert_eq!(rates[1].rate, Some(Decimal::from(850)));
    assert_eq!(rates[1].source, RateSource::Planned);

    // March has nothing: February's rate, flagged
    assert_eq!(rates[2].rate, Some(Decimal::from(850)));
    assert!(rates[2].is_fallback);
    assert_eq!(rates[2].source, RateSource::CarriedForward);

    // April re-anchors the carry
    assert_eq!(rates[3].rate, Some(Decimal::from(870)));
    for r in &rates[4..] {
        assert_eq!(r.rate, Some(Decimal::from(870)));
        assert!(r.is_fallback);
    }
    assert!(fx_warnings(&rates).is_empty());
}

#[test]
fn leading_months_use_the_seed() {
    let entries = vec![entry(2025, 3, FxKind::Actual, 880)];
    let seed = FxSeed {
        rate: Decimal::from(940),
        origin: Some((2024, 12)),
    };
    let rates = resolve_fx_rates(2025, &entries, Some(&seed));
    assert_eq!(rates[0].rate, Some(Decimal::from(940)));
    assert_eq!(rates[1].source, RateSource::Seeded);
    assert!(rates[1].is_fallback);
    assert_eq!(rates[2].rate, Some(Decimal::from(880)));
    assert_eq!(rates[11].rate, Some(Decimal::from(880)));
    assert_eq!(rates[11].source, RateSource::CarriedForward);
}

#[test]
fn no_data_means_no_rate_not_zero() {
    let entries = vec![entry(2026, 1, FxKind::Actual, 990)];
    let rates = resolve_fx_rates(2025, &entries, None);
    for r in &rates {
        assert_eq!(r.rate, None);
        assert!(!r.is_fallback);
        assert_eq!(r.source, RateSource::Missing);
    }
    assert_eq!(
        fx_warnings(&rates),
        vec!["no FX rate for months: 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12".to_string()]
    );

    let partial = resolve_fx_rates(2025, &[entry(2025, 11, FxKind::Planned, 950)], None);
    assert_eq!(partial[9].rate, None);
    assert_eq!(partial[10].rate, Some(Decimal::from(950)));
    assert_eq!(
        fx_warnings(&partial),
        vec!["no FX rate for months: 1, 2, 3, 4, 5, 6, 7, 8, 9, 10".to_string()]
    );
}

#[test]
fn seed_is_latest_prior_entry_actual_first() {
    let entries = vec![
        entry(2023, 12, FxKind::Actual, 820),
        entry(2024, 11, FxKind::Actual, 930),
        entry(2024, 12, FxKind::Planned, 950),
        entry(2024, 12, FxKind::Actual, 940),
        entry(2025, 1, FxKind::Actual, 900),
    ];
    let seed = pick_seed(2025, &entries).unwrap();
    assert_eq!(seed.rate, Decimal::from(940));
    assert_eq!(seed.origin, Some((2024, 12)));
    assert!(pick_seed(2023, &entries).is_none());
}

#[test]
fn store_seed_matches_pure_pick() {
    let conn = db::open_in_memory().unwrap();
    let cfg = EngineConfig::default();
    assert!(store::fx_seed(&conn, 2025, &cfg).unwrap().is_none());

    store::upsert_fx_entry(&conn, 2024, 12, FxKind::Planned, Decimal::from(950)).unwrap();
    store::upsert_fx_entry(&conn, 2024, 12, FxKind::Actual, Decimal::from(940)).unwrap();
    store::upsert_fx_entry(&conn, 2024, 6, FxKind::Actual, Decimal::from(910)).unwrap();
    let seed = store::fx_seed(&conn, 2025, &cfg).unwrap().unwrap();
    assert_eq!(seed.rate, Decimal::from(940));
    assert_eq!(seed.origin, Some((2024, 12)));

    // re-setting a month replaces the value
    store::upsert_fx_entry(&conn, 2024, 12, FxKind::Actual, Decimal::from(945)).unwrap();
    let seed = store::fx_seed(&conn, 2025, &cfg).unwrap().unwrap();
    assert_eq!(seed.rate, Decimal::from(945));

    assert!(store::upsert_fx_entry(&conn, 2025, 1, FxKind::Actual, Decimal::ZERO).is_err());
    assert!(store::upsert_fx_entry(&conn, 2025, 13, FxKind::Actual, Decimal::ONE).is_err());
}

#[test]
fn configured_default_seeds_an_empty_history() {
    let conn = db::open_in_memory().unwrap();
    let cfg = EngineConfig {
        default_fx_rate: Some(Decimal::from(900)),
        ..EngineConfig::default()
    };
    let seed = store::fx_seed(&conn, 2025, &cfg).unwrap().unwrap();
    assert_eq!(seed.origin, None);
    let rates = resolve_fx_rates(2025, &[], Some(&seed));
    assert!(rates.iter().all(|r| r.rate == Some(Decimal::from(900)) && r.is_fallback));
}

#[test]
fn convert_both_directions_of_the_pair() {
    let pair = FxPair {
        base: "USD",
        quote: "CLP",
    };
    let rate = Some(Decimal::from(900));
    let clp = convert(Decimal::from(100), "USD", "CLP", pair, rate).unwrap();
    assert_eq!(format!("{:.2}", clp), "90000.00");
    let usd = convert(Decimal::from(45000), "clp", "usd", pair, rate).unwrap();
    assert_eq!(format!("{:.2}", usd), "50.00");

    // same currency needs no rate
    assert_eq!(
        convert(Decimal::from(7), "EUR", "EUR", pair, None),
        Some(Decimal::from(7))
    );
    assert_eq!(convert(Decimal::from(7), "EUR", "USD", pair, rate), None);
    assert_eq!(convert(Decimal::from(7), "USD", "CLP", pair, None), None);
}
