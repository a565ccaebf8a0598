//! # bouncehire-engine: Booking Lifecycle for BounceHire
//!
//! The orchestration layer the host application calls into: cart → booking
//! creation with compensating rollback, cancellation, admin status updates,
//! the availability facade, and the background expiry sweeper.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     BounceHire Request Flow                             │
//! │                                                                         │
//! │  Host HTTP handler (auth already done)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                bouncehire-engine (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   BookingEngine                 ExpirySweeper                   │   │
//! │  │   ├── check_availability        ├── run()   (spawned task)      │   │
//! │  │   ├── create_booking_from_cart  └── sweep_expired_bookings()    │   │
//! │  │   ├── cancel_booking                                            │   │
//! │  │   └── update_booking_status     injected seams:                 │   │
//! │  │                                 ProductCatalog, Notifier        │   │
//! │  └────────────┬────────────────────────────────┬───────────────────┘   │
//! │               ▼                                ▼                        │
//! │        bouncehire-core                  bouncehire-db                  │
//! │        (pure decisions)                 (transactional storage)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring It Up
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bouncehire_db::{Database, DbConfig};
//! use bouncehire_engine::{
//!     BookingEngine, EngineConfig, ExpirySweeper, LogNotifier, StaticCatalog,
//! };
//!
//! let db = Database::new(DbConfig::new("bouncehire.db")).await?;
//! let config = EngineConfig::from_env()?;
//!
//! let engine = BookingEngine::new(
//!     db.clone(),
//!     Arc::new(my_catalog),       // host's ProductCatalog impl
//!     Arc::new(LogNotifier),      // or the host's email dispatcher
//!     config.clone(),
//! );
//!
//! let (sweeper, sweeper_handle) = ExpirySweeper::new(db, config);
//! tokio::spawn(sweeper.run());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notify;
pub mod sweeper;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{CatalogProduct, ProductCatalog, StaticCatalog};
pub use checkout::{Actor, AvailabilityReport, BookingEngine};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use notify::{BookingEvent, LogNotifier, Notifier, NotifyError};
pub use sweeper::{sweep_expired_bookings, ExpirySweeper, SweeperHandle};
