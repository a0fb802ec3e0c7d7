//! Half-open stay ranges.
//!
//! A stay of `[check_in, check_out)` occupies the nights from `check_in` up
//! to but not including `check_out`, so a stay ending the morning another
//! begins never conflicts with it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReservationError;

/// A validated date range: `check_in < check_out` always holds, so every
/// range covers at least one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    /// Build a range, rejecting zero-night and inverted ranges.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ReservationError> {
        if check_out <= check_in {
            return Err(ReservationError::InvalidDateRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights covered. Always >= 1.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open overlap: `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}
