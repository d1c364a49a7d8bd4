// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Organisation-wide rollup: one project-year computation per project,
//! summed in the reporting currency.

use crate::config::EngineConfig;
use crate::engine::Warnings;
use crate::engine::annual::margin_pct;
use crate::engine::classify::classify;
use crate::engine::financials::{
    AnnualSummary, MonthlyFinancials, ProjectInputs, ProjectYear, project_financials,
};
use crate::engine::fx::{FxPair, convert};
use crate::engine::revenue::AllocationBase;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRollupLine {
    pub project_id: i64,
    pub project_name: String,
    pub currency: String,
    /// Annual figures in the reporting currency.
    pub annual: AnnualSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioRollup {
    pub year: i32,
    pub currency: String,
    pub projects: Vec<ProjectRollupLine>,
    pub months: Vec<MonthlyFinancials>,
    pub annual: AnnualSummary,
    pub warnings: Vec<String>,
}

impl PortfolioRollup {
    pub fn rounded(&self) -> Self {
        PortfolioRollup {
            projects: self
                .projects
                .iter()
                .map(|p| ProjectRollupLine {
                    annual: p.annual.rounded(),
                    ..p.clone()
                })
                .collect(),
            months: self.months.iter().map(MonthlyFinancials::rounded).collect(),
            annual: self.annual.rounded(),
            ..self.clone()
        }
    }
}

/// Fetch and compute every project on a pool of `cfg.fetch_concurrency`
/// threads, so at most that many fetches hit the store at once.
pub fn rollup_portfolio<F>(
    project_ids: &[i64],
    year: i32,
    base: AllocationBase,
    cfg: &EngineConfig,
    fetch: F,
) -> Result<PortfolioRollup>
where
    F: Fn(i64, i32) -> Result<ProjectInputs> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.fetch_concurrency.max(1))
        .build()
        .context("Failed to build rollup worker pool")?;
    let years: Vec<ProjectYear> = pool.install(|| {
        project_ids
            .par_iter()
            .map(|id| {
                let inputs = fetch(*id, year)
                    .with_context(|| format!("Fetch project {} for {}", id, year))?;
                Ok(project_financials(&inputs, base, cfg))
            })
            .collect::<Result<Vec<_>>>()
    })?;
    info!(year, projects = years.len(), "portfolio rollup computed");
    Ok(combine(year, &years, cfg))
}

/// Sum already-computed project years into one portfolio view.
pub fn combine(year: i32, years: &[ProjectYear], cfg: &EngineConfig) -> PortfolioRollup {
    let target = cfg.reporting_currency.as_str();
    let pair = FxPair {
        base: &cfg.fx_base_currency,
        quote: &cfg.fx_quote_currency,
    };
    let mut warnings = Warnings::default();
    let mut sums: Vec<MonthlyFinancials> = (1..=12).map(empty_month).collect();
    let mut projects = Vec::with_capacity(years.len());

    for py in years {
        for w in &py.warnings {
            warnings.push(format!("{}: {}", py.project_name, w));
        }
        let mut converted = Vec::with_capacity(12);
        for m in &py.months {
            let rate = py.fx.get(m.month as usize - 1).and_then(|r| r.rate);
            let mut to_target = |amount: Decimal| -> Decimal {
                if amount.is_zero() {
                    return amount;
                }
                convert(amount, &py.currency, target, pair, rate).unwrap_or_else(|| {
                    warnings.push(format!(
                        "{}: no FX rate for {}->{} in month {}",
                        py.project_name, py.currency, target, m.month
                    ));
                    Decimal::ZERO
                })
            };
            let c = MonthlyFinancials {
                forecast_revenue: to_target(m.forecast_revenue),
                staffed_revenue: to_target(m.staffed_revenue),
                assigned_revenue: to_target(m.assigned_revenue),
                revenue_gap: to_target(m.revenue_gap),
                labor_cost: to_target(m.labor_cost),
                overhead_cost: to_target(m.overhead_cost),
                ..m.clone()
            };
            add_into(&mut sums[m.month as usize - 1], &c);
            converted.push(with_ratios(c));
        }
        projects.push(ProjectRollupLine {
            project_id: py.project_id,
            project_name: py.project_name.clone(),
            currency: target.to_string(),
            annual: AnnualSummary::from_months(&converted),
        });
    }

    let months: Vec<MonthlyFinancials> = sums.into_iter().map(with_ratios).collect();
    let annual = AnnualSummary::from_months(&months);
    PortfolioRollup {
        year,
        currency: target.to_string(),
        projects,
        months,
        annual,
        warnings: warnings.into_vec(),
    }
}

fn empty_month(month: u32) -> MonthlyFinancials {
    MonthlyFinancials {
        month,
        demand_fte: Decimal::ZERO,
        supplied_fte: Decimal::ZERO,
        assigned_fte: Decimal::ZERO,
        gap_fte: Decimal::ZERO,
        status: classify(Decimal::ZERO, Decimal::ZERO),
        forecast_revenue: Decimal::ZERO,
        staffed_revenue: Decimal::ZERO,
        assigned_revenue: Decimal::ZERO,
        revenue_gap: Decimal::ZERO,
        labor_cost: Decimal::ZERO,
        overhead_cost: Decimal::ZERO,
        blended_rate: None,
        blended_cost: None,
        labor_margin_pct: None,
        gross_margin_pct: None,
    }
}

fn add_into(acc: &mut MonthlyFinancials, m: &MonthlyFinancials) {
    acc.demand_fte += m.demand_fte;
    acc.supplied_fte += m.supplied_fte;
    acc.assigned_fte += m.assigned_fte;
    acc.gap_fte += m.gap_fte;
    acc.forecast_revenue += m.forecast_revenue;
    acc.staffed_revenue += m.staffed_revenue;
    acc.assigned_revenue += m.assigned_revenue;
    acc.revenue_gap += m.revenue_gap;
    acc.labor_cost += m.labor_cost;
    acc.overhead_cost += m.overhead_cost;
}

/// Re-derive status, blended figures and margins from the summed amounts.
fn with_ratios(mut m: MonthlyFinancials) -> MonthlyFinancials {
    m.status = classify(m.demand_fte, m.supplied_fte);
    m.blended_rate = (m.assigned_fte > Decimal::ZERO).then(|| m.assigned_revenue / m.assigned_fte);
    m.blended_cost = (m.supplied_fte > Decimal::ZERO).then(|| m.labor_cost / m.supplied_fte);
    m.labor_margin_pct = margin_pct(m.assigned_revenue, m.labor_cost);
    m.gross_margin_pct = margin_pct(m.assigned_revenue, m.labor_cost + m.overhead_cost);
    m
}
