// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Revenue from staffing.
//!
//! Two views are produced. `attribute_revenue` prices every billable,
//! active assignment with the rate card. `reconcile_revenue` scales the
//! forecast revenue by month coverage, capped at 100%, so over-staffing
//! never earns more than the forecast.

use crate::config::EngineConfig;
use crate::engine::Warnings;
use crate::engine::coverage::CoverageReport;
use crate::models::{
    DemandLine, MONTHS, MonthlyValues, RateCard, RateCardLine, RateUnit, SupplyRecord,
    month_value,
};
use crate::utils::round2;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

/// How an allocation percentage turns into billed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationBase {
    /// hours_per_month x pct/100, billed at the hourly-equivalent rate.
    Hours,
    /// pct/100 of the monthly-equivalent price.
    MonthlyPrice,
}

impl AllocationBase {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hours" | "hour" => Some(Self::Hours),
            "monthly" | "month" | "monthly_price" => Some(Self::MonthlyPrice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    pub month: u32,
    pub revenue: Decimal,
    pub billable_fte: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueAttribution {
    pub currency: String,
    pub by_month: Vec<MonthlyRevenue>,
    pub warnings: Warnings,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueResult {
    pub month: u32,
    pub forecast_revenue: Decimal,
    /// Rate-card value of the billable assignments.
    pub staffed_revenue: Decimal,
    pub coverage_ratio: Decimal,
    /// forecast x min(coverage, 1)
    pub assigned_revenue: Decimal,
    pub revenue_gap: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub currency: String,
    pub by_month: Vec<RevenueResult>,
    pub warnings: Vec<String>,
}

impl RevenueReport {
    pub fn rounded(&self) -> Self {
        let mut out = self.clone();
        for m in &mut out.by_month {
            m.forecast_revenue = round2(m.forecast_revenue);
            m.staffed_revenue = round2(m.staffed_revenue);
            m.coverage_ratio = round2(m.coverage_ratio);
            m.assigned_revenue = round2(m.assigned_revenue);
            m.revenue_gap = round2(m.revenue_gap);
        }
        out
    }
}

pub fn monthly_equivalent(line: &RateCardLine, cfg: &EngineConfig) -> Decimal {
    match line.unit {
        RateUnit::Month => line.price,
        RateUnit::Hour => line.price * cfg.hours_per_month,
    }
}

pub fn hourly_equivalent(line: &RateCardLine, cfg: &EngineConfig) -> Decimal {
    match line.unit {
        RateUnit::Hour => line.price,
        RateUnit::Month if cfg.hours_per_month > Decimal::ZERO => {
            line.price / cfg.hours_per_month
        }
        RateUnit::Month => Decimal::ZERO,
    }
}

/// Revenue of one assignment-month. `pct` is the allocation percentage.
pub fn assignment_revenue(
    line: &RateCardLine,
    pct: Decimal,
    base: AllocationBase,
    cfg: &EngineConfig,
) -> Decimal {
    let share = pct / Decimal::ONE_HUNDRED;
    match base {
        AllocationBase::Hours => cfg.hours_per_month * share * hourly_equivalent(line, cfg),
        AllocationBase::MonthlyPrice => monthly_equivalent(line, cfg) * share,
    }
}

/// Months of `year` the card does not cover, as one warning.
fn validity_warning(rate_card: &RateCard, year: i32) -> Option<String> {
    let months: Vec<String> = MONTHS
        .filter(|m| !rate_card.is_valid_in(year, *m))
        .map(|m| m.to_string())
        .collect();
    if months.is_empty() {
        return None;
    }
    Some(format!(
        "rate card '{}' not valid in months: {}",
        rate_card.name,
        months.join(", ")
    ))
}

/// Price every billable assignment active in each month of `year`.
/// Amounts are in the rate card's currency and left unrounded. Months the
/// card is not in force for are priced at zero.
pub fn attribute_revenue(
    year: i32,
    supply: &[SupplyRecord],
    rate_card: &RateCard,
    base: AllocationBase,
    cfg: &EngineConfig,
) -> RevenueAttribution {
    let mut warnings = Warnings::default();
    let mut uncovered = false;
    let by_month = MONTHS
        .map(|month| {
            let card_valid = rate_card.is_valid_in(year, month);
            let mut revenue = Decimal::ZERO;
            let mut billable_fte = Decimal::ZERO;
            for s in supply {
                let pct = s.allocation_pct(month);
                if pct <= Decimal::ZERO || !s.billable || !s.is_active_in(year, month) {
                    continue;
                }
                billable_fte += pct / Decimal::ONE_HUNDRED;
                if !card_valid {
                    uncovered = true;
                    continue;
                }
                match rate_card.line_for(s.role_id) {
                    Some(line) => revenue += assignment_revenue(line, pct, base, cfg),
                    None => warnings.missing_rate(&s.role_name),
                }
            }
            MonthlyRevenue {
                month,
                revenue,
                billable_fte,
            }
        })
        .collect();

    if uncovered {
        warnings.extend(validity_warning(rate_card, year));
    }
    if !warnings.is_empty() {
        warn!(rate_card = %rate_card.name, year, "assignments without a rate");
    }
    RevenueAttribution {
        currency: rate_card.currency.clone(),
        by_month,
        warnings,
    }
}

/// Forecast revenue per month: Σ line FTE x monthly-equivalent price.
/// Months the card is not in force for contribute nothing.
pub fn forecast_revenue(
    year: i32,
    demand_lines: &[DemandLine],
    rate_card: &RateCard,
    cfg: &EngineConfig,
) -> (MonthlyValues, Warnings) {
    let mut warnings = Warnings::default();
    let mut uncovered = false;
    let mut out: MonthlyValues = MONTHS.map(|m| (m, Decimal::ZERO)).collect();
    for line in demand_lines {
        let price = rate_card
            .line_for(line.role.id)
            .map(|l| monthly_equivalent(l, cfg));
        let mut unpriced = false;
        for month in MONTHS {
            let fte = month_value(&line.monthly_forecast, month);
            if fte <= Decimal::ZERO {
                continue;
            }
            if !rate_card.is_valid_in(year, month) {
                uncovered = true;
                continue;
            }
            match price {
                Some(p) => *out.entry(month).or_insert(Decimal::ZERO) += p * fte,
                None => unpriced = true,
            }
        }
        if unpriced {
            warnings.missing_rate(&line.role.name);
        }
    }
    if uncovered {
        warnings.extend(validity_warning(rate_card, year));
    }
    (out, warnings)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconciledMonth {
    pub month: u32,
    pub coverage_ratio: Decimal,
    pub assigned_revenue: Decimal,
    pub revenue_gap: Decimal,
}

/// Coverage-proportional revenue: assigned = forecast x min(ratio, 1).
pub fn reconcile_revenue(
    forecast: &MonthlyValues,
    coverage: &CoverageReport,
) -> Vec<ReconciledMonth> {
    MONTHS
        .map(|month| {
            let forecast_m = month_value(forecast, month);
            let ratio = coverage
                .month(month)
                .map(|m| m.ratio)
                .unwrap_or(Decimal::ZERO);
            let assigned = forecast_m * ratio.min(Decimal::ONE).max(Decimal::ZERO);
            ReconciledMonth {
                month,
                coverage_ratio: ratio,
                assigned_revenue: assigned,
                revenue_gap: forecast_m - assigned,
            }
        })
        .collect()
}

/// Full monthly revenue picture for a project-year, with the forecast and
/// staffing warnings merged.
pub fn compute_revenue(
    year: i32,
    demand_lines: &[DemandLine],
    supply: &[SupplyRecord],
    rate_card: &RateCard,
    coverage: &CoverageReport,
    base: AllocationBase,
    cfg: &EngineConfig,
) -> RevenueReport {
    let (forecast, mut warnings) = forecast_revenue(year, demand_lines, rate_card, cfg);
    let attribution = attribute_revenue(year, supply, rate_card, base, cfg);
    warnings.merge(attribution.warnings);
    let by_month = reconcile_revenue(&forecast, coverage)
        .into_iter()
        .zip(attribution.by_month.iter())
        .map(|(r, staffed)| RevenueResult {
            month: r.month,
            forecast_revenue: month_value(&forecast, r.month),
            staffed_revenue: staffed.revenue,
            coverage_ratio: r.coverage_ratio,
            assigned_revenue: r.assigned_revenue,
            revenue_gap: r.revenue_gap,
        })
        .collect();
    RevenueReport {
        currency: attribution.currency,
        by_month,
        warnings: warnings.into_vec(),
    }
}
