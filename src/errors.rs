// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Input rejected before it reaches the store or the engine.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Invalid month {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error("Invalid year {0}, expected 1900-2999")]
    InvalidYear(i32),

    #[error("Negative FTE {fte} for month {month}")]
    NegativeFte { month: u32, fte: Decimal },

    #[error("Allocation {pct}% for month {month} is outside 0-200")]
    AllocationOutOfRange { month: u32, pct: Decimal },

    #[error("Invalid currency code '{0}', expected three letters")]
    InvalidCurrency(String),

    #[error("{0} not found")]
    NotFound(String),
}

pub fn check_month(month: u32) -> Result<u32, LedgerError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(LedgerError::InvalidMonth(month))
    }
}

pub fn check_year(year: i32) -> Result<i32, LedgerError> {
    if (1900..=2999).contains(&year) {
        Ok(year)
    } else {
        Err(LedgerError::InvalidYear(year))
    }
}

pub fn check_fte(month: u32, fte: Decimal) -> Result<Decimal, LedgerError> {
    check_month(month)?;
    if fte.is_sign_negative() && !fte.is_zero() {
        return Err(LedgerError::NegativeFte { month, fte });
    }
    Ok(fte)
}

pub fn check_allocation(month: u32, pct: Decimal) -> Result<Decimal, LedgerError> {
    check_month(month)?;
    if pct < Decimal::ZERO || pct > Decimal::from(200) {
        return Err(LedgerError::AllocationOutOfRange { month, pct });
    }
    Ok(pct)
}
