// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use staffledger::config::EngineConfig;
use staffledger::engine::classify::CoverageStatus;
use staffledger::engine::coverage::compute_coverage;
use staffledger::engine::financials::{ProjectInputs, project_financials};
use staffledger::engine::revenue::{
    AllocationBase, assignment_revenue, attribute_revenue, compute_revenue, forecast_revenue,
};
use staffledger::models::{
    DemandLine, Project, RateCard, RateCardLine, RateUnit, RoleRef, SupplyRecord,
};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn card(lines: Vec<RateCardLine>) -> RateCard {
    RateCard {
        id: 1,
        name: "Std 2025".to_string(),
        currency: "USD".to_string(),
        valid_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        valid_to: None,
        lines,
    }
}

fn rate(role_id: i64, price: &str, unit: RateUnit) -> RateCardLine {
    RateCardLine {
        role_id,
        role_name: format!("Role{}", role_id),
        price: d(price),
        unit,
    }
}

fn demand(id: i64, role_id: i64, role_name: &str, forecast: &[(u32, &str)]) -> DemandLine {
    DemandLine {
        id,
        project_id: 1,
        role: RoleRef {
            id: role_id,
            name: role_name.to_string(),
            category: None,
            seniority: None,
        },
        label: None,
        created_at: format!("2025-01-01 00:00:0{}.000", id),
        monthly_forecast: forecast.iter().map(|(m, v)| (*m, d(v))).collect(),
    }
}

fn staff(id: i64, role_id: i64, role_name: &str, billable: bool, pcts: &[(u32, &str)]) -> SupplyRecord {
    SupplyRecord {
        id,
        resource_id: id,
        resource_name: format!("R{}", id),
        role_id,
        role_name: role_name.to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        end_date: None,
        billable,
        monthly_cost: d("3000"),
        cost_currency: "USD".to_string(),
        monthly_allocation_pct: pcts.iter().map(|(m, v)| (*m, d(v))).collect(),
    }
}

#[test]
fn partial_coverage_scales_forecast_revenue() {
    let cfg = EngineConfig::default();
    let card = card(vec![rate(1, "5000", RateUnit::Month)]);
    let lines = vec![demand(1, 1, "Dev", &[(1, "2")])];
    let supply = vec![
        staff(1, 1, "Dev", true, &[(1, "100")]),
        staff(2, 1, "Dev", true, &[(1, "50")]),
    ];
    let coverage = compute_coverage(2025, &lines, &supply);
    let (_, warnings) = forecast_revenue(2025, &lines, &card, &cfg);
    assert!(warnings.is_empty());

    let report = compute_revenue(
        2025,
        &lines,
        &supply,
        &card,
        &coverage,
        AllocationBase::MonthlyPrice,
        &cfg,
    );
    let jan = &report.by_month[0];
    assert_eq!(format!("{:.2}", jan.forecast_revenue), "10000.00");
    assert_eq!(format!("{:.2}", jan.coverage_ratio), "0.75");
    assert_eq!(format!("{:.2}", jan.assigned_revenue), "7500.00");
    assert_eq!(format!("{:.2}", jan.revenue_gap), "2500.00");
    assert_eq!(format!("{:.2}", jan.staffed_revenue), "7500.00");
    assert_eq!(coverage.month(1).unwrap().status, CoverageStatus::Partial);
    assert_eq!(report.currency, "USD");
}

#[test]
fn staff_without_forecast_earns_nothing() {
    let cfg = EngineConfig::default();
    let card = card(vec![rate(1, "5000", RateUnit::Month)]);
    let lines = vec![demand(1, 1, "Dev", &[(2, "0")])];
    let supply = vec![staff(1, 1, "Dev", true, &[(2, "200")])];
    let coverage = compute_coverage(2025, &lines, &supply);
    let report = compute_revenue(
        2025,
        &lines,
        &supply,
        &card,
        &coverage,
        AllocationBase::MonthlyPrice,
        &cfg,
    );
    let feb = &report.by_month[1];
    assert_eq!(feb.coverage_ratio, Decimal::ZERO);
    assert_eq!(feb.assigned_revenue, Decimal::ZERO);
    assert_eq!(feb.revenue_gap, Decimal::ZERO);
    assert_eq!(format!("{:.2}", feb.staffed_revenue), "10000.00");
    assert_eq!(coverage.month(2).unwrap().status, CoverageStatus::OverAllocated);
}

#[test]
fn over_coverage_caps_at_forecast() {
    let cfg = EngineConfig::default();
    let card = card(vec![rate(1, "5000", RateUnit::Month)]);
    let lines = vec![demand(1, 1, "Dev", &[(6, "1")])];
    let supply = vec![staff(1, 1, "Dev", true, &[(6, "200")])];
    let coverage = compute_coverage(2025, &lines, &supply);
    let report = compute_revenue(
        2025,
        &lines,
        &supply,
        &card,
        &coverage,
        AllocationBase::MonthlyPrice,
        &cfg,
    );
    let jun = &report.by_month[5];
    assert_eq!(format!("{:.2}", jun.coverage_ratio), "2.00");
    assert_eq!(format!("{:.2}", jun.assigned_revenue), "5000.00");
    assert_eq!(jun.revenue_gap, Decimal::ZERO);
}

#[test]
fn hourly_and_monthly_bases_agree_on_a_standard_month() {
    let cfg = EngineConfig::default();
    let hourly = rate(1, "50", RateUnit::Hour);
    let monthly = rate(1, "8000", RateUnit::Month);
    let half = d("50");
    for line in [&hourly, &monthly] {
        let by_hours = assignment_revenue(line, half, AllocationBase::Hours, &cfg);
        let by_month = assignment_revenue(line, half, AllocationBase::MonthlyPrice, &cfg);
        assert_eq!(format!("{:.2}", by_hours), "4000.00");
        assert_eq!(format!("{:.2}", by_month), "4000.00");
    }

    let short_months = EngineConfig {
        hours_per_month: d("120"),
        ..EngineConfig::default()
    };
    let v = assignment_revenue(&hourly, d("100"), AllocationBase::Hours, &short_months);
    assert_eq!(format!("{:.2}", v), "6000.00");
}

#[test]
fn missing_rates_collapse_into_one_sorted_warning() {
    let cfg = EngineConfig::default();
    let card = card(vec![rate(1, "5000", RateUnit::Month)]);
    let supply = vec![
        staff(1, 3, "QA", true, &[(1, "100"), (2, "100")]),
        staff(2, 2, "Data", true, &[(1, "100")]),
        staff(3, 1, "Dev", true, &[(1, "100")]),
    ];
    let attribution = attribute_revenue(2025, &supply, &card, AllocationBase::MonthlyPrice, &cfg);
    assert_eq!(
        attribution.warnings.to_vec(),
        vec!["role missing a rate: Data, QA".to_string()]
    );
    // only the priced role contributes
    assert_eq!(format!("{:.2}", attribution.by_month[0].revenue), "5000.00");
    assert_eq!(format!("{:.2}", attribution.by_month[0].billable_fte), "3.00");

    let lines = vec![
        demand(1, 3, "QA", &[(1, "1")]),
        demand(2, 4, "Ops", &[(1, "0")]),
    ];
    let (forecast, warnings) = forecast_revenue(2025, &lines, &card, &cfg);
    assert_eq!(warnings.into_vec(), vec!["role missing a rate: QA".to_string()]);
    assert!(forecast.values().all(|v| v.is_zero()));
}

#[test]
fn non_billable_and_inactive_staff_are_not_priced() {
    let cfg = EngineConfig::default();
    let card = card(vec![rate(1, "5000", RateUnit::Month)]);
    let mut ended = staff(2, 1, "Dev", true, &[(1, "100"), (3, "100")]);
    ended.end_date = NaiveDate::from_ymd_opt(2025, 2, 28);
    let supply = vec![staff(1, 1, "Dev", false, &[(1, "100")]), ended];
    let attribution = attribute_revenue(2025, &supply, &card, AllocationBase::MonthlyPrice, &cfg);
    assert_eq!(format!("{:.2}", attribution.by_month[0].revenue), "5000.00");
    assert_eq!(attribution.by_month[2].revenue, Decimal::ZERO);
    assert!(attribution.warnings.is_empty());
}

fn inputs(card: RateCard, lines: Vec<DemandLine>, supply: Vec<SupplyRecord>) -> ProjectInputs {
    ProjectInputs {
        project: Project {
            id: 1,
            client_id: 1,
            name: "Apollo".to_string(),
            currency: "USD".to_string(),
            rate_card_id: Some(card.id),
        },
        year: 2025,
        demand_lines: lines,
        supply,
        rate_card: Some(card),
        fx_entries: vec![],
        fx_seed: None,
    }
}

#[test]
fn forecast_and_staffing_gaps_share_one_warning() {
    let cfg = EngineConfig::default();
    let lines = vec![demand(1, 5, "Architect", &[(1, "1")])];
    let supply = vec![staff(1, 3, "QA", true, &[(1, "100")])];

    let py = project_financials(
        &inputs(card(vec![]), lines.clone(), supply.clone()),
        AllocationBase::MonthlyPrice,
        &cfg,
    );
    assert_eq!(py.warnings, vec!["role missing a rate: Architect, QA".to_string()]);

    let coverage = compute_coverage(2025, &lines, &supply);
    let report = compute_revenue(
        2025,
        &lines,
        &supply,
        &card(vec![]),
        &coverage,
        AllocationBase::Hours,
        &cfg,
    );
    assert_eq!(report.warnings, vec!["role missing a rate: Architect, QA".to_string()]);
}

#[test]
fn card_out_of_force_prices_nothing() {
    let cfg = EngineConfig::default();
    let mut later = card(vec![rate(1, "5000", RateUnit::Month)]);
    later.valid_from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let lines = vec![demand(1, 1, "Dev", &[(1, "1")])];
    let supply = vec![staff(1, 1, "Dev", true, &[(1, "100")])];

    let py = project_financials(
        &inputs(later.clone(), lines.clone(), supply.clone()),
        AllocationBase::MonthlyPrice,
        &cfg,
    );
    assert_eq!(py.months[0].forecast_revenue, Decimal::ZERO);
    assert_eq!(py.months[0].staffed_revenue, Decimal::ZERO);
    assert_eq!(py.annual.assigned_revenue, Decimal::ZERO);
    assert_eq!(
        py.warnings,
        vec!["rate card 'Std 2025' not valid in months: 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12"
            .to_string()]
    );

    // a card ending mid-year still prices the months it overlaps
    let mut ending = card(vec![rate(1, "5000", RateUnit::Month)]);
    ending.valid_to = NaiveDate::from_ymd_opt(2025, 3, 15);
    let lines = vec![demand(1, 1, "Dev", &[(3, "1"), (4, "1")])];
    let (forecast, warnings) = forecast_revenue(2025, &lines, &ending, &cfg);
    assert_eq!(format!("{:.2}", forecast[&3]), "5000.00");
    assert_eq!(forecast[&4], Decimal::ZERO);
    assert_eq!(
        warnings.into_vec(),
        vec!["rate card 'Std 2025' not valid in months: 4, 5, 6, 7, 8, 9, 10, 11, 12"
            .to_string()]
    );
    assert!(ending.is_valid_in(2025, 3));
    assert!(!ending.is_valid_in(2025, 4));
}
