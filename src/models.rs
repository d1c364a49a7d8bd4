// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Month index (1..=12) -> value. Absent months read as zero.
pub type MonthlyValues = BTreeMap<u32, Decimal>;

pub const MONTHS: std::ops::RangeInclusive<u32> = 1..=12;

pub fn month_value(values: &MonthlyValues, month: u32) -> Decimal {
    values.get(&month).copied().unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub currency: String,
    pub rate_card_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateUnit {
    Hour,
    Month,
}

impl RateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateUnit::Hour => "hour",
            RateUnit::Month => "month",
        }
    }

    pub fn parse(s: &str) -> Option<RateUnit> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hourly" | "h" => Some(RateUnit::Hour),
            "month" | "monthly" | "m" => Some(RateUnit::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCardLine {
    pub role_id: i64,
    pub role_name: String,
    pub price: Decimal,
    pub unit: RateUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCard {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub lines: Vec<RateCardLine>,
}

impl RateCard {
    pub fn line_for(&self, role_id: i64) -> Option<&RateCardLine> {
        self.lines.iter().find(|l| l.role_id == role_id)
    }

    /// In force for at least one day of the month.
    pub fn is_valid_in(&self, year: i32, month: u32) -> bool {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return false;
        };
        if self.valid_from > last_day_of_month(first) {
            return false;
        }
        self.valid_to.is_none_or(|to| to >= first)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub seniority: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandLine {
    pub id: i64,
    pub project_id: i64,
    pub role: RoleRef,
    pub label: Option<String>,
    pub created_at: String, // sqlite datetime text, sorts chronologically
    pub monthly_forecast: MonthlyValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyRecord {
    pub id: i64,
    pub resource_id: i64,
    pub resource_name: String,
    pub role_id: i64,
    pub role_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub billable: bool,
    pub monthly_cost: Decimal,
    pub cost_currency: String,
    pub monthly_allocation_pct: MonthlyValues,
}

impl SupplyRecord {
    /// True when the assignment's date range touches (year, month).
    pub fn is_active_in(&self, year: i32, month: u32) -> bool {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return false;
        };
        let last = last_day_of_month(first);
        if self.start_date > last {
            return false;
        }
        match self.end_date {
            Some(end) => end >= first,
            None => true,
        }
    }

    pub fn allocation_pct(&self, month: u32) -> Decimal {
        month_value(&self.monthly_allocation_pct, month)
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(first)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FxKind {
    Actual,
    Planned,
}

impl FxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FxKind::Actual => "ACTUAL",
            FxKind::Planned => "PLANNED",
        }
    }

    pub fn parse(s: &str) -> Option<FxKind> {
        match s.trim().to_uppercase().as_str() {
            "ACTUAL" => Some(FxKind::Actual),
            "PLANNED" => Some(FxKind::Planned),
            _ => None,
        }
    }
}

impl fmt::Display for FxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxEntry {
    pub year: i32,
    pub month: u32,
    pub kind: FxKind,
    pub rate: Decimal, // 1 base = rate quote
}
