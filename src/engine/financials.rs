// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-project yearly P&L built from coverage, revenue, FX and the annual
//! rollup rules. Everything is in the project's currency.

use crate::config::EngineConfig;
use crate::engine::Warnings;
use crate::engine::annual::{MetricSeries, aggregate_annual, margin_pct};
use crate::engine::classify::CoverageStatus;
use crate::engine::coverage::{CoverageReport, compute_coverage};
use crate::engine::fx::{
    FxPair, FxSeed, MonthlyEffectiveRate, convert, fx_warnings, resolve_fx_rates,
};
use crate::engine::revenue::{
    AllocationBase, attribute_revenue, forecast_revenue, reconcile_revenue,
};
use crate::models::{
    DemandLine, FxEntry, MONTHS, MonthlyValues, Project, RateCard, SupplyRecord, month_value,
};
use crate::utils::round2;
use rust_decimal::Decimal;
use serde::Serialize;

/// Snapshot of everything one project-year computation reads.
#[derive(Debug, Clone)]
pub struct ProjectInputs {
    pub project: Project,
    pub year: i32,
    pub demand_lines: Vec<DemandLine>,
    pub supply: Vec<SupplyRecord>,
    pub rate_card: Option<RateCard>,
    pub fx_entries: Vec<FxEntry>,
    pub fx_seed: Option<FxSeed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyFinancials {
    pub month: u32,
    pub demand_fte: Decimal,
    pub supplied_fte: Decimal,
    pub assigned_fte: Decimal,
    pub gap_fte: Decimal,
    pub status: CoverageStatus,
    pub forecast_revenue: Decimal,
    pub staffed_revenue: Decimal,
    pub assigned_revenue: Decimal,
    pub revenue_gap: Decimal,
    pub labor_cost: Decimal,
    pub overhead_cost: Decimal,
    pub blended_rate: Option<Decimal>,
    pub blended_cost: Option<Decimal>,
    pub labor_margin_pct: Option<Decimal>,
    pub gross_margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnualSummary {
    pub forecast_fte: Decimal,
    pub supplied_fte: Decimal,
    pub assigned_fte: Decimal,
    pub gap_fte: Decimal,
    pub forecast_revenue: Decimal,
    pub staffed_revenue: Decimal,
    pub assigned_revenue: Decimal,
    pub revenue_gap: Decimal,
    pub labor_cost: Decimal,
    pub overhead_cost: Decimal,
    pub blended_rate: Option<Decimal>,
    pub blended_cost: Option<Decimal>,
    pub labor_margin_pct: Option<Decimal>,
    pub gross_margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectYear {
    pub project_id: i64,
    pub project_name: String,
    pub currency: String,
    pub year: i32,
    pub coverage: CoverageReport,
    pub fx: Vec<MonthlyEffectiveRate>,
    pub months: Vec<MonthlyFinancials>,
    pub annual: AnnualSummary,
    pub warnings: Vec<String>,
}

impl ProjectYear {
    /// Output copy: amounts, FTEs and percentages at two decimals.
    pub fn rounded(&self) -> Self {
        ProjectYear {
            coverage: self.coverage.rounded(),
            months: self.months.iter().map(MonthlyFinancials::rounded).collect(),
            annual: self.annual.rounded(),
            ..self.clone()
        }
    }
}

fn ratio(num: Decimal, den: Decimal) -> Option<Decimal> {
    if den > Decimal::ZERO {
        Some(num / den)
    } else {
        None
    }
}

fn round_opt(v: Option<Decimal>) -> Option<Decimal> {
    v.map(round2)
}

impl MonthlyFinancials {
    pub fn rounded(&self) -> Self {
        MonthlyFinancials {
            month: self.month,
            demand_fte: round2(self.demand_fte),
            supplied_fte: round2(self.supplied_fte),
            assigned_fte: round2(self.assigned_fte),
            gap_fte: round2(self.gap_fte),
            status: self.status,
            forecast_revenue: round2(self.forecast_revenue),
            staffed_revenue: round2(self.staffed_revenue),
            assigned_revenue: round2(self.assigned_revenue),
            revenue_gap: round2(self.revenue_gap),
            labor_cost: round2(self.labor_cost),
            overhead_cost: round2(self.overhead_cost),
            blended_rate: round_opt(self.blended_rate),
            blended_cost: round_opt(self.blended_cost),
            labor_margin_pct: round_opt(self.labor_margin_pct),
            gross_margin_pct: round_opt(self.gross_margin_pct),
        }
    }
}

impl AnnualSummary {
    pub fn rounded(&self) -> Self {
        AnnualSummary {
            forecast_fte: round2(self.forecast_fte),
            supplied_fte: round2(self.supplied_fte),
            assigned_fte: round2(self.assigned_fte),
            gap_fte: round2(self.gap_fte),
            forecast_revenue: round2(self.forecast_revenue),
            staffed_revenue: round2(self.staffed_revenue),
            assigned_revenue: round2(self.assigned_revenue),
            revenue_gap: round2(self.revenue_gap),
            labor_cost: round2(self.labor_cost),
            overhead_cost: round2(self.overhead_cost),
            blended_rate: round_opt(self.blended_rate),
            blended_cost: round_opt(self.blended_cost),
            labor_margin_pct: round_opt(self.labor_margin_pct),
            gross_margin_pct: round_opt(self.gross_margin_pct),
        }
    }

    /// Roll twelve months up, each metric with its own rule.
    pub fn from_months(months: &[MonthlyFinancials]) -> Self {
        let col = |f: fn(&MonthlyFinancials) -> Decimal| -> Vec<Option<Decimal>> {
            months.iter().map(|m| Some(f(m))).collect()
        };
        let total = |f: fn(&MonthlyFinancials) -> Decimal| -> Decimal {
            aggregate_annual(&MetricSeries::Sum(&col(f))).unwrap_or(Decimal::ZERO)
        };
        let revenue = col(|m| m.assigned_revenue);
        let labor = col(|m| m.labor_cost);
        let loaded: Vec<Option<Decimal>> = months
            .iter()
            .map(|m| Some(m.labor_cost + m.overhead_cost))
            .collect();
        let rates: Vec<Option<Decimal>> = months.iter().map(|m| m.blended_rate).collect();
        let costs: Vec<Option<Decimal>> = months.iter().map(|m| m.blended_cost).collect();

        AnnualSummary {
            forecast_fte: total(|m| m.demand_fte),
            supplied_fte: total(|m| m.supplied_fte),
            assigned_fte: total(|m| m.assigned_fte),
            gap_fte: total(|m| m.gap_fte),
            forecast_revenue: total(|m| m.forecast_revenue),
            staffed_revenue: total(|m| m.staffed_revenue),
            assigned_revenue: total(|m| m.assigned_revenue),
            revenue_gap: total(|m| m.revenue_gap),
            labor_cost: total(|m| m.labor_cost),
            overhead_cost: total(|m| m.overhead_cost),
            blended_rate: aggregate_annual(&MetricSeries::Average(&rates)),
            blended_cost: aggregate_annual(&MetricSeries::Average(&costs)),
            labor_margin_pct: aggregate_annual(&MetricSeries::Margin {
                revenue: &revenue,
                cost: &labor,
            }),
            gross_margin_pct: aggregate_annual(&MetricSeries::Margin {
                revenue: &revenue,
                cost: &loaded,
            }),
        }
    }
}

/// Converts amounts into the project currency month by month, recording a
/// warning for every crossing that has no usable rate.
struct Converter<'a> {
    pair: FxPair<'a>,
    rates: &'a [MonthlyEffectiveRate],
    target: &'a str,
}

impl Converter<'_> {
    fn to_target(
        &self,
        amount: Decimal,
        from: &str,
        month: u32,
        warnings: &mut Warnings,
    ) -> Decimal {
        if amount.is_zero() {
            return amount;
        }
        let rate = self.rates.get(month as usize - 1).and_then(|r| r.rate);
        match convert(amount, from, self.target, self.pair, rate) {
            Some(v) => v,
            None => {
                warnings.push(format!(
                    "no FX rate for {}->{} in month {}",
                    from, self.target, month
                ));
                Decimal::ZERO
            }
        }
    }
}

pub fn project_financials(
    inputs: &ProjectInputs,
    base: AllocationBase,
    cfg: &EngineConfig,
) -> ProjectYear {
    let year = inputs.year;
    let project = &inputs.project;
    let mut warnings = Warnings::default();

    let coverage = compute_coverage(year, &inputs.demand_lines, &inputs.supply);
    let fx = resolve_fx_rates(year, &inputs.fx_entries, inputs.fx_seed.as_ref()).to_vec();
    let conv = Converter {
        pair: FxPair {
            base: &cfg.fx_base_currency,
            quote: &cfg.fx_quote_currency,
        },
        rates: &fx,
        target: &project.currency,
    };

    let (forecast, staffed) = match &inputs.rate_card {
        Some(card) => {
            let (forecast, fw) = forecast_revenue(year, &inputs.demand_lines, card, cfg);
            let attribution = attribute_revenue(year, &inputs.supply, card, base, cfg);
            warnings.merge(fw);
            warnings.merge(attribution.warnings);
            let mut forecast_conv = MonthlyValues::new();
            let mut staffed_conv = MonthlyValues::new();
            for month in MONTHS {
                let amount = month_value(&forecast, month);
                forecast_conv.insert(
                    month,
                    conv.to_target(amount, &card.currency, month, &mut warnings),
                );
            }
            for m in &attribution.by_month {
                staffed_conv.insert(
                    m.month,
                    conv.to_target(m.revenue, &card.currency, m.month, &mut warnings),
                );
            }
            (forecast_conv, staffed_conv)
        }
        None => {
            warnings.push(format!("project '{}' has no rate card", project.name));
            (MonthlyValues::new(), MonthlyValues::new())
        }
    };
    let reconciled = reconcile_revenue(&forecast, &coverage);

    let overhead_share = cfg.overhead_pct / Decimal::ONE_HUNDRED;
    let months: Vec<MonthlyFinancials> = MONTHS
        .map(|month| {
            let totals = coverage.month(month);
            let r = &reconciled[month as usize - 1];
            let mut labor_cost = Decimal::ZERO;
            for s in &inputs.supply {
                let pct = s.allocation_pct(month);
                if pct <= Decimal::ZERO || !s.is_active_in(year, month) {
                    continue;
                }
                let cost = s.monthly_cost * pct / Decimal::ONE_HUNDRED;
                labor_cost += conv.to_target(cost, &s.cost_currency, month, &mut warnings);
            }
            let overhead_cost = labor_cost * overhead_share;
            let demand_fte = totals.map(|t| t.demand_fte).unwrap_or_default();
            let supplied_fte = totals.map(|t| t.supplied_fte).unwrap_or_default();
            let assigned_fte = totals.map(|t| t.assigned_fte).unwrap_or_default();
            MonthlyFinancials {
                month,
                demand_fte,
                supplied_fte,
                assigned_fte,
                gap_fte: totals.map(|t| t.gap_fte).unwrap_or_default(),
                status: totals
                    .map(|t| t.status)
                    .unwrap_or(CoverageStatus::Unassigned),
                forecast_revenue: month_value(&forecast, month),
                staffed_revenue: month_value(&staffed, month),
                assigned_revenue: r.assigned_revenue,
                revenue_gap: r.revenue_gap,
                labor_cost,
                overhead_cost,
                blended_rate: ratio(r.assigned_revenue, assigned_fte),
                blended_cost: ratio(labor_cost, supplied_fte),
                labor_margin_pct: margin_pct(r.assigned_revenue, labor_cost),
                gross_margin_pct: margin_pct(r.assigned_revenue, labor_cost + overhead_cost),
            }
        })
        .collect();

    let annual = AnnualSummary::from_months(&months);
    if needs_fx(inputs) {
        warnings.extend(fx_warnings(&fx));
    }

    ProjectYear {
        project_id: project.id,
        project_name: project.name.clone(),
        currency: project.currency.clone(),
        year,
        coverage,
        fx,
        months,
        annual,
        warnings: warnings.into_vec(),
    }
}

/// True when any price or cost crosses into another currency.
fn needs_fx(inputs: &ProjectInputs) -> bool {
    let target = &inputs.project.currency;
    let card_crosses = inputs
        .rate_card
        .as_ref()
        .is_some_and(|c| !c.currency.eq_ignore_ascii_case(target));
    card_crosses
        || inputs
            .supply
            .iter()
            .any(|s| !s.cost_currency.eq_ignore_ascii_case(target))
}
