// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageStatus {
    #[serde(rename = "SIN_ASIGNAR")]
    Unassigned,
    #[serde(rename = "PARCIAL")]
    Partial,
    #[serde(rename = "CUBIERTO")]
    Covered,
    #[serde(rename = "SOBRE_ASIGNADO")]
    OverAllocated,
}

impl CoverageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CoverageStatus::Unassigned => "SIN_ASIGNAR",
            CoverageStatus::Partial => "PARCIAL",
            CoverageStatus::Covered => "CUBIERTO",
            CoverageStatus::OverAllocated => "SOBRE_ASIGNADO",
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `assigned / demand`, or zero when there is no demand.
///
/// The zero for `demand == 0` is a business convention (there is nothing to
/// cover), not the value of 0/0.
pub fn coverage_ratio(demand: Decimal, assigned: Decimal) -> Decimal {
    if demand > Decimal::ZERO {
        assigned / demand
    } else {
        Decimal::ZERO
    }
}

/// Classify one (line or month) cell.
///
/// With no demand the ratio is zero by convention, so supply is read from
/// `assigned` directly to tell "nothing here" from "staffed with no plan".
pub fn classify(demand: Decimal, assigned: Decimal) -> CoverageStatus {
    if demand <= Decimal::ZERO {
        return if assigned > Decimal::ZERO {
            CoverageStatus::OverAllocated
        } else {
            CoverageStatus::Unassigned
        };
    }
    classify_ratio(coverage_ratio(demand, assigned))
}

/// Status for a positive-demand cell given its ratio. Exactly 1 is covered.
pub fn classify_ratio(ratio: Decimal) -> CoverageStatus {
    if ratio <= Decimal::ZERO {
        CoverageStatus::Unassigned
    } else if ratio < Decimal::ONE {
        CoverageStatus::Partial
    } else if ratio == Decimal::ONE {
        CoverageStatus::Covered
    } else {
        CoverageStatus::OverAllocated
    }
}
