// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Greedy attribution of staffed FTE across demand lines.
//!
//! No record ties a resource to a demand line, so per-line coverage is a
//! deterministic attribution: each month the total supplied FTE is handed
//! out to lines in (created_at, id) order, each line taking at most its own
//! forecast. Reordering lines changes the output.

use crate::engine::classify::{CoverageStatus, classify, coverage_ratio};
use crate::models::{DemandLine, MONTHS, SupplyRecord, month_value};
use crate::utils::round2;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Remaining supply below this is treated as exhausted.
pub fn epsilon() -> Decimal {
    Decimal::new(1, 4)
}

#[derive(Debug, Clone, Serialize)]
pub struct LineMonthCoverage {
    pub month: u32,
    pub demand_fte: Decimal,
    pub assigned_fte: Decimal,
    pub ratio: Decimal,
    pub status: CoverageStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageResult {
    pub demand_line_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub label: Option<String>,
    pub months: Vec<LineMonthCoverage>,
    pub total_demand_fte: Decimal,
    pub total_assigned_fte: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTotals {
    pub month: u32,
    pub demand_fte: Decimal,
    pub supplied_fte: Decimal,
    /// Sum of the per-line attribution; never above `supplied_fte`.
    pub assigned_fte: Decimal,
    pub gap_fte: Decimal,
    /// Supply left over once every line is satisfied.
    pub unattributed_fte: Decimal,
    /// supplied / demand, zero when there is no demand.
    pub ratio: Decimal,
    pub status: CoverageStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub year: i32,
    pub by_line: Vec<CoverageResult>,
    pub by_month: Vec<MonthlyTotals>,
}

impl CoverageReport {
    pub fn month(&self, month: u32) -> Option<&MonthlyTotals> {
        self.by_month.iter().find(|m| m.month == month)
    }

    /// Copy with every FTE and ratio rounded for output.
    pub fn rounded(&self) -> Self {
        let mut out = self.clone();
        for line in &mut out.by_line {
            line.total_demand_fte = round2(line.total_demand_fte);
            line.total_assigned_fte = round2(line.total_assigned_fte);
            for m in &mut line.months {
                m.demand_fte = round2(m.demand_fte);
                m.assigned_fte = round2(m.assigned_fte);
                m.ratio = round2(m.ratio);
            }
        }
        for m in &mut out.by_month {
            m.demand_fte = round2(m.demand_fte);
            m.supplied_fte = round2(m.supplied_fte);
            m.assigned_fte = round2(m.assigned_fte);
            m.gap_fte = round2(m.gap_fte);
            m.unattributed_fte = round2(m.unattributed_fte);
            m.ratio = round2(m.ratio);
        }
        out
    }
}

/// Σ pct/100 over supply records active and non-zero in (year, month).
pub fn supplied_fte(supply: &[SupplyRecord], year: i32, month: u32) -> Decimal {
    supply
        .iter()
        .filter(|s| s.is_active_in(year, month))
        .map(|s| s.allocation_pct(month))
        .filter(|pct| *pct > Decimal::ZERO)
        .map(|pct| pct / Decimal::ONE_HUNDRED)
        .sum()
}

/// Indices of `lines` in attribution order: created_at, then id.
pub fn attribution_order(lines: &[DemandLine]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..lines.len()).collect();
    idx.sort_by(|a, b| {
        let (la, lb) = (&lines[*a], &lines[*b]);
        la.created_at
            .cmp(&lb.created_at)
            .then_with(|| la.id.cmp(&lb.id))
    });
    idx
}

/// Hand `supplied` out across `demands` in order; returns each slot's share.
pub fn distribute(supplied: Decimal, demands: &[Decimal]) -> Vec<Decimal> {
    let eps = epsilon();
    let mut remaining = supplied.max(Decimal::ZERO);
    demands
        .iter()
        .map(|demand| {
            let take = (*demand).max(Decimal::ZERO).min(remaining);
            remaining -= take;
            if remaining < eps {
                remaining = Decimal::ZERO;
            }
            take
        })
        .collect()
}

pub fn compute_coverage(
    year: i32,
    demand_lines: &[DemandLine],
    supply: &[SupplyRecord],
) -> CoverageReport {
    let order = attribution_order(demand_lines);
    let mut per_line: Vec<Vec<LineMonthCoverage>> = vec![Vec::with_capacity(12); order.len()];
    let mut by_month = Vec::with_capacity(12);

    for month in MONTHS {
        let supplied = supplied_fte(supply, year, month);
        let demands: Vec<Decimal> = order
            .iter()
            .map(|i| month_value(&demand_lines[*i].monthly_forecast, month))
            .collect();
        let shares = distribute(supplied, &demands);

        let mut demand_total = Decimal::ZERO;
        let mut assigned_total = Decimal::ZERO;
        for (pos, (demand, assigned)) in demands.iter().zip(shares.iter()).enumerate() {
            demand_total += *demand;
            assigned_total += *assigned;
            per_line[pos].push(LineMonthCoverage {
                month,
                demand_fte: *demand,
                assigned_fte: *assigned,
                ratio: coverage_ratio(*demand, *assigned),
                status: classify(*demand, *assigned),
            });
        }

        debug!(
            year,
            month,
            demand = %demand_total,
            supplied = %supplied,
            assigned = %assigned_total,
            "coverage month"
        );
        by_month.push(MonthlyTotals {
            month,
            demand_fte: demand_total,
            supplied_fte: supplied,
            assigned_fte: assigned_total,
            gap_fte: (demand_total - assigned_total).max(Decimal::ZERO),
            unattributed_fte: (supplied - assigned_total).max(Decimal::ZERO),
            ratio: coverage_ratio(demand_total, supplied),
            status: classify(demand_total, supplied),
        });
    }

    let by_line = order
        .iter()
        .zip(per_line)
        .map(|(i, months)| {
            let line = &demand_lines[*i];
            CoverageResult {
                demand_line_id: line.id,
                role_id: line.role.id,
                role_name: line.role.name.clone(),
                label: line.label.clone(),
                total_demand_fte: months.iter().map(|m| m.demand_fte).sum(),
                total_assigned_fte: months.iter().map(|m| m.assigned_fte).sum(),
                months,
            }
        })
        .collect();

    CoverageReport {
        year,
        by_line,
        by_month,
    }
}
