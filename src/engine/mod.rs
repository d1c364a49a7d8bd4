// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure coverage, revenue and margin computations.
//!
//! Nothing in here touches the database. Inputs are snapshots fetched by
//! `store`; missing business facts come back as `None` or as warnings, never
//! as errors.

pub mod annual;
pub mod classify;
pub mod coverage;
pub mod financials;
pub mod fx;
pub mod revenue;
pub mod rollup;

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

/// Sorted, de-duplicated warning collector returned next to results.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    missing_rates: BTreeSet<String>,
    other: BTreeSet<String>,
}

impl Warnings {
    pub fn missing_rate(&mut self, role_name: &str) {
        self.missing_rates.insert(role_name.to_string());
    }

    pub fn push(&mut self, msg: impl Into<String>) {
        self.other.insert(msg.into());
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, msgs: I) {
        self.other.extend(msgs);
    }

    /// Fold another collector in, keeping its missing-rate roles unformatted
    /// so they end up in the same message as ours.
    pub fn merge(&mut self, other: Warnings) {
        self.missing_rates.extend(other.missing_rates);
        self.other.extend(other.other);
    }

    pub fn is_empty(&self) -> bool {
        self.missing_rates.is_empty() && self.other.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        let mut out = self.other.clone();
        if !self.missing_rates.is_empty() {
            let names: Vec<&str> = self.missing_rates.iter().map(String::as_str).collect();
            out.insert(format!("role missing a rate: {}", names.join(", ")));
        }
        out.into_iter().collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.to_vec()
    }
}

impl Serialize for Warnings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}
