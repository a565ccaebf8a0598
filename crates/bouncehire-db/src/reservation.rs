//! # Reservation Manager
//!
//! Atomically converts an availability decision into durable reservation
//! rows, guaranteeing no two concurrent reservations can both succeed for
//! the same unit/interval.
//!
//! ## The Race This Closes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WITHOUT a transaction around re-check + write:                         │
//! │                                                                         │
//! │  Request A: check availability → 1 unit free                           │
//! │  Request B: check availability → 1 unit free      (same unit!)         │
//! │  Request A: write reservation  → ok                                    │
//! │  Request B: write reservation  → ok               ← DOUBLE-BOOKED      │
//! │                                                                         │
//! │  WITH the transaction (this module):                                    │
//! │                                                                         │
//! │  Request A: BEGIN → re-check → write → COMMIT                          │
//! │  Request B: BEGIN → waits on writer lock / conflicts →                 │
//! │             retried once → re-check sees A's rows → Insufficient       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite allows a single writer at a time, so two reserve transactions for
//! the same product serialize at commit. The loser of the race surfaces as
//! a busy/locked conflict (`DbError::Conflict`); `reserve` re-runs the whole
//! check-then-write sequence once against the committed state, where the
//! availability re-check gives the honest answer. First-committed-wins,
//! never last-write-wins.
//!
//! ## Atomicity
//! The transaction boundary is one `reserve` call, not one unit: a call
//! consuming three units commits all three reservation rows together or
//! none of them. `release` is the exact inverse and is idempotent.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{load_units_by_booking, load_units_for_product};
use bouncehire_core::{availability, DateRange, InventoryUnit, Reservation, UnitStatus};

// =============================================================================
// Errors
// =============================================================================

/// Reservation failures, layered above plain database errors.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The re-check inside the transaction found too little free stock.
    ///
    /// Signals the caller to abort the whole booking - no partial
    /// reservation exists when this is returned.
    #[error("Only {available} available, {requested} required for product {product_id}")]
    Insufficient {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Underlying storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for reservation operations.
pub type ReservationResult<T> = Result<T, ReservationError>;

// =============================================================================
// Reservation Manager
// =============================================================================

/// The only writer of `unit_reservations` rows.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    pool: SqlitePool,
}

impl ReservationManager {
    /// Creates a new ReservationManager.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationManager { pool }
    }

    /// Reserves `quantity` units of a product over `range` for a booking.
    ///
    /// ## What This Does
    /// 1. Opens a transaction
    /// 2. Re-fetches the product's units and re-runs the availability
    ///    calculator *inside* the transaction - an earlier read is never
    ///    trusted at write time
    /// 3. Greedily consumes candidate units in calculator order until the
    ///    quantity is satisfied: one reservation row per consumed unit,
    ///    unit status flipped to `booked`
    /// 4. Commits everything together
    ///
    /// A busy/locked conflict (another reserve committing first) retries
    /// the whole sequence exactly once; the retry observes the winner's
    /// committed rows.
    ///
    /// ## Returns
    /// The mutated units (reservations attached) for audit/logging.
    pub async fn reserve(
        &self,
        product_id: &str,
        range: DateRange,
        quantity: i64,
        booking_id: &str,
    ) -> ReservationResult<Vec<InventoryUnit>> {
        match self.try_reserve(product_id, range, quantity, booking_id).await {
            Err(ReservationError::Db(err)) if err.is_retryable() => {
                warn!(
                    product_id,
                    booking_id,
                    error = %err,
                    "Reservation hit a write conflict, retrying once"
                );
                self.try_reserve(product_id, range, quantity, booking_id)
                    .await
            }
            other => other,
        }
    }

    /// One reserve attempt: a single check-then-write transaction.
    async fn try_reserve(
        &self,
        product_id: &str,
        range: DateRange,
        quantity: i64,
        booking_id: &str,
    ) -> ReservationResult<Vec<InventoryUnit>> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Re-check at write time, not at the caller's earlier read.
        let units = load_units_for_product(&mut tx, product_id).await?;
        let decision = availability::assess(&units, range, quantity);

        if !decision.is_available {
            // Dropping the transaction rolls it back; nothing was written.
            return Err(ReservationError::Insufficient {
                product_id: product_id.to_string(),
                available: decision.available_quantity,
                requested: quantity,
            });
        }

        let now = Utc::now();
        let mut remaining = quantity;
        let mut consumed = Vec::new();

        for mut unit in decision.candidates {
            if remaining <= 0 {
                break;
            }

            let reservation_id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO unit_reservations (id, unit_id, booking_id, start_date, end_date, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&reservation_id)
            .bind(&unit.id)
            .bind(booking_id)
            .bind(range.start)
            .bind(range.end)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            // Unit-grained allocation: any active reservation marks the
            // whole unit booked.
            sqlx::query("UPDATE inventory_units SET status = 'booked', updated_at = ?2 WHERE id = ?1")
                .bind(&unit.id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;

            remaining -= unit.quantity;

            unit.status = UnitStatus::Booked;
            unit.updated_at = now;
            unit.booked_dates.push(Reservation {
                start_date: range.start,
                end_date: range.end,
                booking_id: booking_id.to_string(),
            });
            consumed.push(unit);
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id,
            booking_id,
            quantity,
            units = consumed.len(),
            start = %range.start,
            end = %range.end,
            "Reserved inventory"
        );

        Ok(consumed)
    }

    /// Releases every reservation tied to a booking.
    ///
    /// Units left with no remaining reservations flip back to `available`
    /// (units in `maintenance`/`out_of_stock` keep their status). Calling
    /// this twice for the same booking is a no-op the second time.
    ///
    /// ## Returns
    /// The number of units that had a reservation removed.
    pub async fn release(&self, booking_id: &str) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;

        let touched = load_units_by_booking(&mut tx, booking_id).await?;
        if touched.is_empty() {
            debug!(booking_id, "Release found nothing to do");
            return Ok(0);
        }

        sqlx::query("DELETE FROM unit_reservations WHERE booking_id = ?1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for unit in &touched {
            sqlx::query(
                r#"
                UPDATE inventory_units
                SET status = 'available', updated_at = ?2
                WHERE id = ?1
                  AND status = 'booked'
                  AND NOT EXISTS (SELECT 1 FROM unit_reservations WHERE unit_id = ?1)
                "#,
            )
            .bind(&unit.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(booking_id, units = touched.len(), "Released inventory");
        Ok(touched.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bouncehire_core::InventoryUnit;

    fn d(s: &str) -> chrono::NaiveDate {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(d(start), d(end)).unwrap()
    }

    async fn seed_unit(db: &Database, product_id: &str, quantity: i64) -> InventoryUnit {
        let now = Utc::now();
        let unit = InventoryUnit {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            warehouse: "Main Warehouse".to_string(),
            vendor: "Acme Inflatables".to_string(),
            quantity,
            rental_fee_pence: 4500,
            status: UnitStatus::Available,
            booked_dates: vec![],
            created_at: now,
            updated_at: now,
        };
        db.inventory().insert_unit(&unit).await.unwrap();
        unit
    }

    #[tokio::test]
    async fn test_reserve_flips_status_and_attaches_dates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = seed_unit(&db, "castle-1", 1).await;

        let reserved = db
            .reservations()
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 1, "bk1")
            .await
            .unwrap();

        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].id, unit.id);
        assert_eq!(reserved[0].status, UnitStatus::Booked);

        let stored = db.inventory().get_by_id(&unit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UnitStatus::Booked);
        assert_eq!(stored.booked_dates.len(), 1);
        assert_eq!(stored.booked_dates[0].booking_id, "bk1");
    }

    #[tokio::test]
    async fn test_second_overlapping_reserve_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db, "castle-1", 1).await;

        let manager = db.reservations();
        manager
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 1, "bk1")
            .await
            .unwrap();

        let err = manager
            .reserve("castle-1", range("2024-07-03", "2024-07-04"), 1, "bk2")
            .await
            .unwrap_err();

        match err {
            ReservationError::Insufficient {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("expected Insufficient, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_reserves_only_one_wins() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db, "castle-1", 1).await;

        let m1 = db.reservations();
        let m2 = db.reservations();
        let r = range("2024-07-01", "2024-07-05");

        let (a, b) = tokio::join!(
            m1.reserve("castle-1", r, 1, "bk-a"),
            m2.reserve("castle-1", r, 1, "bk-b"),
        );

        // Exactly one attempt succeeds, whichever commits first.
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_multi_unit_reserve_commits_together() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db, "castle-1", 1).await;
        seed_unit(&db, "castle-1", 1).await;

        let reserved = db
            .reservations()
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 2, "bk1")
            .await
            .unwrap();

        assert_eq!(reserved.len(), 2);
        let units = db.inventory().find_units_by_booking("bk1").await.unwrap();
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.status == UnitStatus::Booked));
    }

    #[tokio::test]
    async fn test_insufficient_leaves_no_partial_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db, "castle-1", 1).await;

        let err = db
            .reservations()
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 3, "bk1")
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::Insufficient { .. }));

        let units = db.inventory().find_units_by_booking("bk1").await.unwrap();
        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn test_release_restores_pre_reservation_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = seed_unit(&db, "castle-1", 1).await;

        let manager = db.reservations();
        manager
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 1, "bk1")
            .await
            .unwrap();

        let released = manager.release("bk1").await.unwrap();
        assert_eq!(released, 1);

        let stored = db.inventory().get_by_id(&unit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UnitStatus::Available);
        assert!(stored.booked_dates.is_empty());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = seed_unit(&db, "castle-1", 1).await;

        let manager = db.reservations();
        manager
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 1, "bk1")
            .await
            .unwrap();

        assert_eq!(manager.release("bk1").await.unwrap(), 1);
        assert_eq!(manager.release("bk1").await.unwrap(), 0);

        let stored = db.inventory().get_by_id(&unit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UnitStatus::Available);
    }

    #[tokio::test]
    async fn test_release_keeps_unit_booked_for_other_bookings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = seed_unit(&db, "castle-1", 1).await;

        let manager = db.reservations();
        manager
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 1, "bk1")
            .await
            .unwrap();
        manager
            .reserve("castle-1", range("2024-08-01", "2024-08-03"), 1, "bk2")
            .await
            .unwrap();

        manager.release("bk1").await.unwrap();

        // bk2 still holds the unit: status stays booked, its dates remain.
        let stored = db.inventory().get_by_id(&unit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UnitStatus::Booked);
        assert_eq!(stored.booked_dates.len(), 1);
        assert_eq!(stored.booked_dates[0].booking_id, "bk2");
    }

    #[tokio::test]
    async fn test_release_unknown_booking_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.reservations().release("no-such-booking").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_availability_restored_after_release() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db, "castle-1", 1).await;

        let manager = db.reservations();
        manager
            .reserve("castle-1", range("2024-07-01", "2024-07-05"), 1, "bk1")
            .await
            .unwrap();

        let units = db.inventory().find_units_for_product("castle-1").await.unwrap();
        let decision =
            availability::assess(&units, range("2024-07-03", "2024-07-04"), 1);
        assert!(!decision.is_available);
        assert_eq!(decision.available_quantity, 0);

        manager.release("bk1").await.unwrap();

        let units = db.inventory().find_units_for_product("castle-1").await.unwrap();
        let decision =
            availability::assess(&units, range("2024-07-03", "2024-07-04"), 1);
        assert!(decision.is_available);
    }
}
