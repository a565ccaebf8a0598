//! # Pricing
//!
//! Line totals, VAT, and the delivery/collection fee schedule.
//!
//! ## Fee Model
//! ```text
//! line total    = quantity × per-day rate × billable days (min 1)
//! subtotal      = Σ line totals
//! VAT           = subtotal × configured rate
//! delivery fee  = 0 if the requested slot fits the free window, else flat
//! collection fee= 0 if the requested slot fits the free window, else flat
//! overnight fee = flat, only when keep_overnight
//! total         = subtotal + VAT + fees
//! ```
//!
//! Free windows and surcharges are configuration, not constants: sites run
//! different van schedules, so the schedule is injected by the engine.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{TaxRate, TimeSlot};

// =============================================================================
// Fee Schedule
// =============================================================================

/// Delivery/collection fee schedule, injected into the booking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Delivery slots fully inside this window are free.
    pub delivery_free_window: TimeSlot,
    /// Flat surcharge for delivery outside the free window.
    pub delivery_surcharge_pence: i64,
    /// Collection slots fully inside this window are free.
    pub collection_free_window: TimeSlot,
    /// Flat surcharge for collection outside the free window.
    pub collection_surcharge_pence: i64,
    /// Flat fee for keeping equipment overnight.
    pub overnight_fee_pence: i64,
}

impl FeeSchedule {
    /// Delivery fee for a requested slot.
    pub fn delivery_fee(&self, slot: &TimeSlot) -> Money {
        if self.delivery_free_window.covers(slot) {
            Money::zero()
        } else {
            Money::from_pence(self.delivery_surcharge_pence)
        }
    }

    /// Collection fee for a requested slot.
    pub fn collection_fee(&self, slot: &TimeSlot) -> Money {
        if self.collection_free_window.covers(slot) {
            Money::zero()
        } else {
            Money::from_pence(self.collection_surcharge_pence)
        }
    }

    /// Overnight-keep fee, when requested.
    pub fn overnight_fee(&self, keep_overnight: bool) -> Money {
        if keep_overnight {
            Money::from_pence(self.overnight_fee_pence)
        } else {
            Money::zero()
        }
    }
}

impl Default for FeeSchedule {
    /// Morning deliveries (08:00-12:00) and daytime collections
    /// (08:00-17:00) are free; anything else carries a £10 surcharge.
    /// Overnight keep is £30.
    fn default() -> Self {
        FeeSchedule {
            delivery_free_window: TimeSlot::new(8, 12),
            delivery_surcharge_pence: 1000,
            collection_free_window: TimeSlot::new(8, 17),
            collection_surcharge_pence: 1000,
            overnight_fee_pence: 3000,
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Computed totals for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub collection_fee: Money,
    pub overnight_fee: Money,
    pub total: Money,
}

impl BookingTotals {
    /// Assembles totals from a subtotal plus fees.
    pub fn compute(
        subtotal: Money,
        tax_rate: TaxRate,
        delivery_fee: Money,
        collection_fee: Money,
        overnight_fee: Money,
    ) -> Self {
        let tax = subtotal.calculate_tax(tax_rate);
        BookingTotals {
            subtotal,
            tax,
            delivery_fee,
            collection_fee,
            overnight_fee,
            total: subtotal + tax + delivery_fee + collection_fee + overnight_fee,
        }
    }
}

/// Line total for a cart line: quantity × per-day rate × billable days.
pub fn line_total(quantity: i64, rate: Money, days: i64) -> Money {
    rate.multiply_quantity(quantity).multiply_quantity(days)
}

// =============================================================================
// Unit Tests
// =============================================================================
