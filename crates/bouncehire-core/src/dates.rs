//! # Rental Date Ranges
//!
//! Whole-day date intervals for rentals. The system reasons in calendar
//! days only: a hire runs from its start date to its end date *inclusive*,
//! and time-of-day never participates in overlap decisions.
//!
//! ## Closed-Interval Overlap
//! ```text
//! existing:              [06-12 ─────── 06-15]
//! requested: [06-10 ── 06-12]                     → CONFLICT (shared day)
//! requested: [06-10 ─ 06-11]                      → free
//! ```
//! A checkout day equal to another booking's start day counts as a
//! conflict: the physical equipment cannot be collected, cleaned and
//! redelivered within the same calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An inclusive calendar-day interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// Closed-interval overlap test:
    /// `self.start <= other.end && self.end >= other.start`.
    #[inline]
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Whether `day` falls inside this range.
    #[inline]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Billable day count: difference in days, minimum 1.
    ///
    /// A same-day hire (`start == end`) is billed for one day, never zero.
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    /// Iterates every calendar day in the range, inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let end = self.end;
        start.iter_days().take_while(move |d| *d <= end)
    }
}
