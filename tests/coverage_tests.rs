// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use staffledger::engine::classify::{CoverageStatus, classify, coverage_ratio};
use staffledger::engine::coverage::{compute_coverage, distribute, supplied_fte};
use staffledger::models::{DemandLine, MonthlyValues, RoleRef, SupplyRecord};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn role(id: i64, name: &str) -> RoleRef {
    RoleRef {
        id,
        name: name.to_string(),
        category: None,
        seniority: None,
    }
}

fn line(id: i64, created_at: &str, role_id: i64, forecast: &[(u32, &str)]) -> DemandLine {
    DemandLine {
        id,
        project_id: 1,
        role: role(role_id, &format!("Role{}", role_id)),
        label: None,
        created_at: created_at.to_string(),
        monthly_forecast: forecast.iter().map(|(m, v)| (*m, d(v))).collect(),
    }
}

fn assignment(id: i64, start: &str, end: Option<&str>, pcts: &[(u32, &str)]) -> SupplyRecord {
    SupplyRecord {
        id,
        resource_id: id,
        resource_name: format!("R{}", id),
        role_id: 1,
        role_name: "Role1".to_string(),
        start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        end_date: end.map(|e| NaiveDate::parse_from_str(e, "%Y-%m-%d").unwrap()),
        billable: true,
        monthly_cost: d("3000"),
        cost_currency: "USD".to_string(),
        monthly_allocation_pct: pcts.iter().map(|(m, v)| (*m, d(v))).collect::<MonthlyValues>(),
    }
}

#[test]
fn classification_table() {
    let cases = [
        ("0", "0", CoverageStatus::Unassigned),
        ("0", "2", CoverageStatus::OverAllocated),
        ("2", "0", CoverageStatus::Unassigned),
        ("2", "1.5", CoverageStatus::Partial),
        ("2", "2", CoverageStatus::Covered),
        ("2", "2.5", CoverageStatus::OverAllocated),
    ];
    for (demand, assigned, want) in cases {
        assert_eq!(classify(d(demand), d(assigned)), want, "{} / {}", demand, assigned);
    }
}

#[test]
fn ratio_with_no_demand_reads_as_zero() {
    // 0/0 and n/0 are reported as a zero ratio; the status carries the meaning
    assert_eq!(coverage_ratio(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    assert_eq!(coverage_ratio(Decimal::ZERO, d("2")), Decimal::ZERO);
    assert_eq!(format!("{:.2}", coverage_ratio(d("2"), d("1.5"))), "0.75");
}

#[test]
fn status_labels_serialize_as_codes() {
    assert_eq!(
        serde_json::to_string(&CoverageStatus::Partial).unwrap(),
        "\"PARCIAL\""
    );
    assert_eq!(CoverageStatus::OverAllocated.to_string(), "SOBRE_ASIGNADO");
    assert_eq!(CoverageStatus::Unassigned.label(), "SIN_ASIGNAR");
    assert_eq!(CoverageStatus::Covered.label(), "CUBIERTO");
}

#[test]
fn distribute_fills_lines_in_order() {
    let shares = distribute(d("1.5"), &[d("1"), d("1"), d("1")]);
    assert_eq!(shares, vec![d("1"), d("0.5"), Decimal::ZERO]);

    let dust = distribute(d("1.00005"), &[d("1"), d("1")]);
    assert_eq!(dust[1], Decimal::ZERO);
}

#[test]
fn earlier_lines_are_served_first() {
    let lines = vec![
        line(2, "2025-01-02 09:00:00.000", 1, &[(1, "1")]),
        line(1, "2025-01-01 09:00:00.000", 1, &[(1, "1")]),
    ];
    let supply = vec![
        assignment(10, "2025-01-01", None, &[(1, "100")]),
        assignment(11, "2025-01-01", None, &[(1, "50")]),
    ];
    let report = compute_coverage(2025, &lines, &supply);

    let first = &report.by_line[0];
    assert_eq!(first.demand_line_id, 1);
    assert_eq!(first.months[0].assigned_fte, d("1"));
    assert_eq!(first.months[0].status, CoverageStatus::Covered);

    let second = &report.by_line[1];
    assert_eq!(second.demand_line_id, 2);
    assert_eq!(format!("{:.2}", second.months[0].assigned_fte), "0.50");
    assert_eq!(second.months[0].status, CoverageStatus::Partial);

    let jan = report.month(1).unwrap();
    assert_eq!(format!("{:.2}", jan.ratio), "0.75");
    assert_eq!(format!("{:.2}", jan.gap_fte), "0.50");
    assert_eq!(jan.unattributed_fte, Decimal::ZERO);
    assert_eq!(jan.status, CoverageStatus::Partial);
}

#[test]
fn equal_timestamps_fall_back_to_id() {
    let ts = "2025-01-01 09:00:00.000";
    let a = vec![line(7, ts, 1, &[(3, "1")]), line(4, ts, 1, &[(3, "1")])];
    let b = vec![line(4, ts, 1, &[(3, "1")]), line(7, ts, 1, &[(3, "1")])];
    let supply = vec![assignment(1, "2025-01-01", None, &[(3, "60")])];

    let ra = compute_coverage(2025, &a, &supply);
    let rb = compute_coverage(2025, &b, &supply);
    for report in [&ra, &rb] {
        assert_eq!(report.by_line[0].demand_line_id, 4);
        assert_eq!(report.by_line[0].months[2].assigned_fte, d("0.6"));
        assert_eq!(report.by_line[1].months[2].assigned_fte, Decimal::ZERO);
    }
}

#[test]
fn surplus_supply_is_unattributed() {
    let lines = vec![line(1, "2025-01-01 00:00:00.000", 1, &[(5, "1")])];
    let supply = vec![
        assignment(1, "2025-01-01", None, &[(5, "150")]),
        assignment(2, "2025-01-01", None, &[(5, "100")]),
    ];
    let report = compute_coverage(2025, &lines, &supply);
    let may = report.month(5).unwrap();
    assert_eq!(format!("{:.2}", may.supplied_fte), "2.50");
    assert_eq!(format!("{:.2}", may.assigned_fte), "1.00");
    assert_eq!(format!("{:.2}", may.unattributed_fte), "1.50");
    assert_eq!(format!("{:.2}", may.ratio), "2.50");
    assert_eq!(may.status, CoverageStatus::OverAllocated);
    assert_eq!(report.by_line[0].months[4].status, CoverageStatus::Covered);
}

#[test]
fn supply_without_demand_is_over_allocated() {
    let supply = vec![assignment(1, "2025-01-01", None, &[(2, "200")])];
    let report = compute_coverage(2025, &[], &supply);
    let feb = report.month(2).unwrap();
    assert_eq!(feb.ratio, Decimal::ZERO);
    assert_eq!(feb.status, CoverageStatus::OverAllocated);
    assert_eq!(report.month(3).unwrap().status, CoverageStatus::Unassigned);
}

#[test]
fn assigned_never_exceeds_supplied() {
    let lines = vec![
        line(1, "2025-01-01 00:00:00.000", 1, &[(1, "0.7"), (2, "2")]),
        line(2, "2025-01-01 00:00:01.000", 1, &[(1, "0.4"), (2, "0.3")]),
        line(3, "2025-01-01 00:00:02.000", 1, &[(1, "1"), (2, "0")]),
    ];
    let supply = vec![assignment(1, "2025-01-01", None, &[(1, "100"), (2, "333")])];
    let report = compute_coverage(2025, &lines, &supply);
    for m in &report.by_month {
        assert!(m.assigned_fte <= m.supplied_fte);
        if m.supplied_fte <= m.demand_fte {
            assert_eq!(m.assigned_fte, m.supplied_fte);
        }
        let per_line: Decimal = report
            .by_line
            .iter()
            .map(|l| l.months[m.month as usize - 1].assigned_fte)
            .sum();
        assert_eq!(per_line, m.assigned_fte);
    }
}

#[test]
fn inactive_and_zero_allocations_supply_nothing() {
    let supply = vec![
        assignment(1, "2025-01-01", Some("2025-03-15"), &[(3, "100"), (4, "100")]),
        assignment(2, "2025-06-01", None, &[(5, "100"), (6, "80")]),
        assignment(3, "2025-01-01", None, &[(6, "0")]),
    ];
    assert_eq!(supplied_fte(&supply, 2025, 3), d("1"));
    assert_eq!(supplied_fte(&supply, 2025, 4), Decimal::ZERO);
    assert_eq!(supplied_fte(&supply, 2025, 5), Decimal::ZERO);
    assert_eq!(supplied_fte(&supply, 2025, 6), d("0.8"));
}
