//! # Availability Calculator
//!
//! Pure, side-effect-free decision of whether a requested quantity of a
//! product is free over a date interval, given the product's inventory
//! units and their attached reservations.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Availability Decision                               │
//! │                                                                         │
//! │  units for product (status ≠ maintenance)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For each unit: any reservation overlapping [start, end]?              │
//! │       │                                                                 │
//! │       ├── yes → unit is BLOCKED, contributes 0                         │
//! │       ├── out_of_stock → contributes 0                                 │
//! │       └── no  → unit is a CANDIDATE, contributes its full quantity     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  available_quantity = Σ candidate quantities                           │
//! │  is_available       = available_quantity >= requested                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Allocation Is Unit-Grained
//! A unit with `quantity = 5` is either fully available or fully blocked
//! for an interval; partial overlap slicing within a single unit is not
//! modeled. This is a deliberate simplification matching physical-item
//! rental semantics (one castle = one unit; quantity > 1 per unit is rare).
//! Products that need more than one simultaneous hire carry multiple unit
//! records. Known limitation, not a bug.
//!
//! ## Purity
//! Nothing here touches a database. Callers fetch units (with reservations
//! attached) and hand them in; the reservation write path re-runs this
//! function inside its transaction so the decision is always made against
//! the state being written.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::types::{InventoryUnit, UnitStatus};

// =============================================================================
// Decision Types
// =============================================================================

/// Outcome of an availability assessment.
#[derive(Debug, Clone)]
pub struct Availability {
    /// Whether the requested quantity fits.
    pub is_available: bool,

    /// Total quantity free over the whole interval.
    pub available_quantity: i64,

    /// Unblocked units, in input order — the reservation candidates.
    pub candidates: Vec<InventoryUnit>,

    /// Human-readable reason when unavailable.
    pub reason: Option<String>,
}

/// Remaining quantity for a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    /// Quantity free on this day.
    pub remaining: i64,
    /// Whether the requested quantity fits on this day.
    pub available: bool,
}

// =============================================================================
// Assessment
// =============================================================================

/// Decides whether `requested` units are free over `range`.
///
/// ## Arguments
/// * `units` - the product's inventory units, reservations attached.
///   Callers pass every non-maintenance unit (out_of_stock included, so a
///   sold-out product reports "0 available" rather than "not found").
/// * `range` - requested interval, inclusive, pre-validated as ordered.
/// * `requested` - quantity the caller wants.
///
/// ## Overlap Rule
/// Closed intervals: `existing.start <= requested.end && existing.end >=
/// requested.start`. A checkout day equal to another booking's start day
/// is a conflict.
pub fn assess(units: &[InventoryUnit], range: DateRange, requested: i64) -> Availability {
    let mut candidates = Vec::new();
    let mut available_quantity = 0;

    for unit in units {
        if unit.status == UnitStatus::Maintenance {
            // Defensively skipped; the store query already excludes these.
            continue;
        }
        if unit.status == UnitStatus::OutOfStock {
            continue;
        }
        if unit.is_blocked_for(&range) {
            continue;
        }
        available_quantity += unit.quantity;
        candidates.push(unit.clone());
    }

    let is_available = available_quantity >= requested;
    let reason = if is_available {
        None
    } else {
        Some(format!(
            "Only {} available, {} required",
            available_quantity, requested
        ))
    };

    Availability {
        is_available,
        available_quantity,
        candidates,
        reason,
    }
}

/// Per-day remaining quantity over `range`, for calendar displays.
///
/// Each day is assessed independently with the same unit-grained rule:
/// a unit contributes its full quantity on every day no reservation
/// covers, and nothing on covered days.
pub fn calendar(units: &[InventoryUnit], range: DateRange, requested: i64) -> Vec<DayAvailability> {
    range
        .days()
        .map(|date| {
            let day = DateRange {
                start: date,
                end: date,
            };
            let remaining: i64 = units
                .iter()
                .filter(|u| {
                    u.status != UnitStatus::Maintenance
                        && u.status != UnitStatus::OutOfStock
                        && !u.is_blocked_for(&day)
                })
                .map(|u| u.quantity)
                .sum();

            DayAvailability {
                date,
                remaining,
                available: remaining >= requested,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
