//! # bouncehire-core: Pure Business Logic for BounceHire
//!
//! This crate is the **heart** of the rental system. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      BounceHire Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Host HTTP Application                          │   │
//! │  │    Catalog UI ──► Cart ──► Checkout ──► Booking admin          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bouncehire-engine                              │   │
//! │  │    create_booking_from_cart, cancel_booking, expiry sweep      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ bouncehire-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │availability│  │  pricing  │  │ validation│ │   │
//! │  │   │ Inventory │  │  overlap   │  │  totals   │  │   rules   │ │   │
//! │  │   │  Booking  │  │  decision  │  │   fees    │  │   checks  │ │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bouncehire-db (Database Layer)                 │   │
//! │  │         SQLite queries, migrations, reservation manager         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryUnit, Booking, Reservation, etc.)
//! - [`dates`] - Whole-day date ranges and the closed-interval overlap rule
//! - [`availability`] - The pure availability calculator
//! - [`pricing`] - Line totals, VAT, delivery/collection fee schedule
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in pence (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bouncehire_core::availability;
//! use bouncehire_core::dates::DateRange;
//!
//! let range = DateRange::new(
//!     "2024-07-01".parse().unwrap(),
//!     "2024-07-05".parse().unwrap(),
//! ).unwrap();
//!
//! // No units on file yet: zero available, with a readable reason.
//! let decision = availability::assess(&[], range, 1);
//! assert!(!decision.is_available);
//! assert_eq!(decision.available_quantity, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod dates;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bouncehire_core::Money` instead of
// `use bouncehire_core::money::Money`

pub use availability::{Availability, DayAvailability};
pub use dates::DateRange;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{BookingTotals, FeeSchedule};
pub use types::*;
