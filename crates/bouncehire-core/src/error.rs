//! # Error Types
//!
//! Domain-specific error types for bouncehire-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bouncehire-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bouncehire-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bouncehire-engine errors (separate crate)                             │
//! │  └── EngineError      - What the host HTTP layer sees                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError → Host      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, quantities, dates)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Not enough inventory units are free for the requested dates.
    ///
    /// ## When This Occurs
    /// - All units for the product carry a reservation overlapping the
    ///   requested interval
    /// - The product only has `out_of_stock` units
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 2, 2024-07-01..2024-07-05)
    ///      │
    ///      ▼
    /// Availability check: 1 unit free
    ///      │
    ///      ▼
    /// InsufficientInventory { product_id, available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// UI shows: "Only 1 available, 2 required"
    /// ```
    #[error("Only {available} available, {requested} required for product {product_id}")]
    InsufficientInventory {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Booking not found.
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// Booking is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Moving a booking backwards (e.g. delivered → confirmed)
    /// - Cancelling an already cancelled or completed booking
    #[error("Booking {booking_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        booking_id: String,
        from: String,
        to: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any reservation work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// End date precedes start date.
    #[error("endDate must be on or after startDate ({start} > {end})")]
    InvalidDateRange { start: String, end: String },

    /// Cart has no lines to book.
    #[error("Cart is empty")]
    EmptyCart,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
