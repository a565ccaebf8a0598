//! # bouncehire-db: Database Layer for BounceHire
//!
//! This crate provides database access for the rental system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       BounceHire Data Flow                              │
//! │                                                                         │
//! │  bouncehire-engine (create_booking_from_cart)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   bouncehire-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │  Repositories  │   │ Reservation  │   │   │
//! │  │   │   (pool.rs)   │   │ inventory.rs   │   │   Manager    │   │   │
//! │  │   │               │   │ booking.rs     │   │              │   │   │
//! │  │   │ SqlitePool    │◄──│ row assembly   │◄──│ reserve()    │   │   │
//! │  │   │ WAL mode      │   │ explicit joins │   │ release()    │   │   │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: inventory_units, unit_reservations,                           │
//! │          bookings, booking_items, booking_status_history               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (inventory, booking)
//! - [`reservation`] - The transactional reserve/release path
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bouncehire_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bouncehire.db")).await?;
//!
//! let units = db.inventory().find_units_for_product(&product_id).await?;
//! let reserved = db
//!     .reservations()
//!     .reserve(&product_id, range, 1, &booking_id)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod reservation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use reservation::{ReservationError, ReservationManager, ReservationResult};

// Repository re-exports for convenience
pub use repository::booking::{BookingFilter, BookingRepository};
pub use repository::inventory::InventoryRepository;
