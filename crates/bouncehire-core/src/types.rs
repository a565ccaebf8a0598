//! # Domain Types
//!
//! Core domain types for the rental system.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InventoryUnit  │   │     Booking     │   │   Reservation   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  start_date     │       │
//! │  │  product_id     │   │  booking_number │   │  end_date       │       │
//! │  │  quantity       │   │  status         │   │  booking_id     │       │
//! │  │  booked_dates[] │   │  items[]        │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   UnitStatus    │   │  BookingStatus  │   │  PaymentMethod  │       │
//! │  │  Available      │   │  Pending        │   │  CashOnDelivery │       │
//! │  │  Booked         │   │  Confirmed      │   │  BankTransfer   │       │
//! │  │  Maintenance    │   │  ... Completed  │   │  Card           │       │
//! │  │  OutOfStock     │   │  Cancelled      │   │  Paypal         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where humans need one (booking_number)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (UK VAT standard rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// The status of an inventory unit.
///
/// `Maintenance` units are invisible to availability; `OutOfStock` units are
/// visible but contribute zero quantity, so callers see "0 available" rather
/// than "no such product".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Free to hire.
    Available,
    /// Carries at least one active reservation.
    Booked,
    /// Pulled from service for repair/cleaning; never offered.
    Maintenance,
    /// Stock line exhausted; listed but contributes nothing.
    OutOfStock,
}

impl Default for UnitStatus {
    fn default() -> Self {
        UnitStatus::Available
    }
}

/// A date-range hold attached to an inventory unit, tying it to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub booking_id: String,
}

impl Reservation {
    /// The reserved interval as a range.
    ///
    /// Reservations are only ever created from validated ranges, so the
    /// fields are ordered by construction.
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// One schedulable physical stock record for a product at a warehouse.
///
/// ## Allocation Granularity
/// A unit is the atomic allocation unit: any overlapping reservation blocks
/// the whole unit for that interval, even when `quantity > 1`. Stock lines
/// that must be split across simultaneous hires are represented as multiple
/// unit records. (One castle = one unit in practice.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryUnit {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product this unit is stock for.
    pub product_id: String,

    /// Warehouse label (free text, e.g. "Main Warehouse").
    pub warehouse: String,

    /// Supplying vendor label.
    pub vendor: String,

    /// Units of identical stock represented by this record.
    pub quantity: i64,

    /// Per-day rental fee in pence.
    pub rental_fee_pence: i64,

    /// Current lifecycle status.
    pub status: UnitStatus,

    /// Active date-range reservations on this unit.
    pub booked_dates: Vec<Reservation>,

    /// When the unit was created.
    pub created_at: DateTime<Utc>,

    /// When the unit was last updated.
    pub updated_at: DateTime<Utc>,
}

impl InventoryUnit {
    /// Returns the per-day rental fee as Money.
    #[inline]
    pub fn rental_fee(&self) -> Money {
        Money::from_pence(self.rental_fee_pence)
    }

    /// Whether any existing reservation overlaps the requested interval.
    pub fn is_blocked_for(&self, requested: &DateRange) -> bool {
        self.booked_dates
            .iter()
            .any(|r| r.range().overlaps(requested))
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// The lifecycle status of a booking.
///
/// ## State Machine
/// ```text
/// pending → confirmed → processing → ready_for_delivery → out_for_delivery
///     → delivered → ready_for_collection → collected → completed
///
/// cancelled: reachable from every non-terminal state, exactly once
/// ```
/// Transitions are forward-only; the single backward-looking edge is
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created from a cart, awaiting confirmation. Subject to expiry.
    Pending,
    /// Confirmed by payment or admin action.
    Confirmed,
    /// Being prepared for dispatch.
    Processing,
    /// Packed and waiting for the delivery run.
    ReadyForDelivery,
    /// On the van.
    OutForDelivery,
    /// With the customer.
    Delivered,
    /// Hire period over, awaiting collection.
    ReadyForCollection,
    /// Equipment back in the warehouse.
    Collected,
    /// Closed out.
    Completed,
    /// Cancelled by the customer, an admin, or the expiry sweep.
    Cancelled,
}

impl BookingStatus {
    /// Position in the forward chain, used to enforce monotonic movement.
    fn ordinal(&self) -> u8 {
        match self {
            BookingStatus::Pending => 0,
            BookingStatus::Confirmed => 1,
            BookingStatus::Processing => 2,
            BookingStatus::ReadyForDelivery => 3,
            BookingStatus::OutForDelivery => 4,
            BookingStatus::Delivered => 5,
            BookingStatus::ReadyForCollection => 6,
            BookingStatus::Collected => 7,
            BookingStatus::Completed => 8,
            BookingStatus::Cancelled => 9,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Forward moves (including skips, e.g. an admin jumping
    /// `confirmed → ready_for_delivery`) are allowed; backward moves are
    /// not; `cancelled` is reachable from any non-terminal state.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == BookingStatus::Cancelled {
            return true;
        }
        next.ordinal() > self.ordinal()
    }

    /// snake_case label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Processing => "processing",
            BookingStatus::ReadyForDelivery => "ready_for_delivery",
            BookingStatus::OutForDelivery => "out_for_delivery",
            BookingStatus::Delivered => "delivered",
            BookingStatus::ReadyForCollection => "ready_for_collection",
            BookingStatus::Collected => "collected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Settle in cash when the equipment arrives.
    CashOnDelivery,
    /// Invoice paid by bank transfer.
    BankTransfer,
    /// Card payment taken by the host checkout.
    Card,
    /// PayPal payment taken by the host checkout.
    Paypal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Payment details attached to a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Amount due in pence.
    pub amount_pence: i64,
}

impl PaymentDetails {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_pence(self.amount_pence)
    }
}

// =============================================================================
// Invoicing
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Regular,
    Corporate,
}

impl Default for InvoiceType {
    fn default() -> Self {
        InvoiceType::Regular
    }
}

/// Bank details required for corporate invoicing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub sort_code: String,
    pub bank_name: String,
}

/// Invoice options supplied at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceOptions {
    pub invoice_type: InvoiceType,
    pub bank_details: Option<BankDetails>,
}

impl Default for InvoiceOptions {
    fn default() -> Self {
        InvoiceOptions {
            invoice_type: InvoiceType::Regular,
            bank_details: None,
        }
    }
}

// =============================================================================
// Shipping & Time Slots
// =============================================================================

/// An hour-of-day window, e.g. 8..12 for "8am-12pm".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeSlot {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        TimeSlot {
            start_hour,
            end_hour,
        }
    }

    /// Whether `other` fits entirely inside this window.
    pub fn covers(&self, other: &TimeSlot) -> bool {
        self.start_hour <= other.start_hour && other.end_hour <= self.end_hour
    }
}

/// Delivery address plus the scheduling preferences that drive fees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    /// Requested delivery window on the start date.
    pub delivery_slot: TimeSlot,
    /// Requested collection window on the end date.
    pub collection_slot: TimeSlot,
    /// Keep the equipment overnight after the event (flat fee).
    pub keep_overnight: bool,
    pub notes: Option<String>,
}

// =============================================================================
// Booking
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RentalType {
    Daily,
    Weekly,
    Monthly,
}

impl Default for RentalType {
    fn default() -> Self {
        RentalType::Daily
    }
}

/// A line item in a booking.
/// Uses snapshot pattern to freeze product data at time of booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingItem {
    pub id: String,
    pub booking_id: String,
    pub product_id: String,
    /// Product name at time of booking (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Per-day rate in pence at time of booking (frozen).
    pub rate_pence: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Billable days for this line (minimum 1).
    pub total_days: i64,
    pub rental_type: RentalType,
    /// Warehouse the allocated stock ships from (frozen).
    pub warehouse: String,
    /// Supplying vendor (frozen).
    pub vendor: String,
}

impl BookingItem {
    /// The hired interval as a range.
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Line total: quantity × rate × days.
    pub fn line_total(&self) -> Money {
        Money::from_pence(self.rate_pence)
            .multiply_quantity(self.quantity)
            .multiply_quantity(self.total_days)
    }
}

/// Audit trail entry recording a status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: BookingStatus,
    pub changed_at: DateTime<Utc>,
    /// User id of whoever drove the change ("system" for the sweeper).
    pub changed_by: String,
    pub notes: Option<String>,
}

/// A booking aggregate: line items, address, payment, totals, audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    /// Human-readable number: BK{YY}{MM}{NNNN}, monotonic within a month.
    pub booking_number: String,
    pub user_id: String,
    pub items: Vec<BookingItem>,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentDetails,
    pub status: BookingStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub subtotal_pence: i64,
    pub tax_pence: i64,
    pub delivery_fee_pence: i64,
    pub collection_fee_pence: i64,
    pub overnight_fee_pence: i64,
    pub total_pence: i64,
    pub invoice_type: InvoiceType,
    pub bank_details: Option<BankDetails>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Returns the booking total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_pence(self.total_pence)
    }
}

// =============================================================================
// Cart (read-only input from the host)
// =============================================================================

/// One line of the host application's cart, consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Per-day rate in pence the customer saw.
    pub rate_pence: i64,
    pub rental_type: RentalType,
}

/// Snapshot of the cart at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(2000);
        assert_eq!(rate.bps(), 2000);
        assert!((rate.percentage() - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_status_forward_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(ReadyForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(Collected.can_transition_to(Completed));
        // Admins may skip ahead
        assert!(Confirmed.can_transition_to(ReadyForDelivery));
    }

    #[test]
    fn test_status_rejects_backward_transitions() {
        use BookingStatus::*;
        assert!(!Delivered.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(ReadyForCollection));
    }

    #[test]
    fn test_cancellation_from_non_terminal_only() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(OutForDelivery.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_unit_blocked_by_overlapping_reservation() {
        let unit = InventoryUnit {
            id: "u1".into(),
            product_id: "p1".into(),
            warehouse: "Main Warehouse".into(),
            vendor: "Acme Inflatables".into(),
            quantity: 1,
            rental_fee_pence: 4500,
            status: UnitStatus::Booked,
            booked_dates: vec![Reservation {
                start_date: "2024-06-12".parse().unwrap(),
                end_date: "2024-06-15".parse().unwrap(),
                booking_id: "bk1".into(),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let requested = DateRange {
            start: "2024-06-10".parse().unwrap(),
            end: "2024-06-12".parse().unwrap(),
        };
        assert!(unit.is_blocked_for(&requested));

        let clear = DateRange {
            start: "2024-06-16".parse().unwrap(),
            end: "2024-06-18".parse().unwrap(),
        };
        assert!(!unit.is_blocked_for(&clear));
    }

    #[test]
    fn test_time_slot_covers() {
        let free_window = TimeSlot::new(8, 12);
        assert!(free_window.covers(&TimeSlot::new(8, 12)));
        assert!(free_window.covers(&TimeSlot::new(9, 11)));
        assert!(!free_window.covers(&TimeSlot::new(12, 16)));
        assert!(!free_window.covers(&TimeSlot::new(7, 12)));
    }

    #[test]
    fn test_booking_item_line_total() {
        let item = BookingItem {
            id: "i1".into(),
            booking_id: "bk1".into(),
            product_id: "p1".into(),
            name_snapshot: "Princess Castle".into(),
            quantity: 2,
            rate_pence: 4500,
            start_date: "2024-07-01".parse().unwrap(),
            end_date: "2024-07-04".parse().unwrap(),
            total_days: 3,
            rental_type: RentalType::Daily,
            warehouse: "Main Warehouse".into(),
            vendor: "Acme Inflatables".into(),
        };
        // 2 × £45.00 × 3 days = £270.00
        assert_eq!(item.line_total().pence(), 27000);
    }
}
