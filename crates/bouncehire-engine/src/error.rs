//! # Engine Error Types
//!
//! The error surface the host application sees.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation   → 400-equivalent, never retried, surfaced verbatim       │
//! │  Insufficient → 409-equivalent, "selected dates unavailable";          │
//! │                 the caller may retry with different dates              │
//! │  NotFound     → 404-equivalent                                         │
//! │  Forbidden    → 403-equivalent, checked before any mutating work       │
//! │  Core         → business rule violation (bad status transition, ...)   │
//! │  Db           → 5xx-equivalent; transaction conflicts were already     │
//! │                 retried once below this layer                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notification failures never appear here - the booking succeeded, so they
//! are logged and swallowed at the call site.

use thiserror::Error;

use bouncehire_core::{CoreError, ValidationError};
use bouncehire_db::{DbError, ReservationError};

/// Errors surfaced by the booking engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing booking input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The availability re-check failed at reservation time.
    #[error("Only {available} available, {requested} required for product {product_id}")]
    Insufficient {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Referenced product/booking missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Caller lacks ownership or role for the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Business rule violation (e.g. illegal status transition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<ReservationError> for EngineError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::Insufficient {
                product_id,
                available,
                requested,
            } => EngineError::Insufficient {
                product_id,
                available,
                requested,
            },
            ReservationError::Db(db) => EngineError::Db(db),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
