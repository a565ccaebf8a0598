//! # Expiry Sweeper
//!
//! Reclaims inventory held by abandoned bookings.
//!
//! ## Why It Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A checkout reserves inventory the moment the booking is created        │
//! │  (status: pending). If the customer never confirms - closed the tab,   │
//! │  abandoned payment - that stock would stay locked forever.             │
//! │                                                                         │
//! │  The sweeper is the sole timeout mechanism for pending bookings:       │
//! │                                                                         │
//! │  every sweep_interval:                                                  │
//! │      bookings WHERE status = pending                                   │
//! │               AND created_at <= now - pending_timeout                  │
//! │          │                                                              │
//! │          ├── release(booking_id)   ← reservations freed                │
//! │          └── delete booking row    ← items/history cascade             │
//! │                                                                         │
//! │  One booking failing does NOT stop the sweep: each candidate is        │
//! │  processed independently, logged, and counted.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sweep interval should be a fraction of the pending timeout so a
//! reclaimed unit never sits idle much past its deadline (defaults: 5 min
//! sweep, 30 min timeout).

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use bouncehire_db::Database;

use crate::config::EngineConfig;

// =============================================================================
// Sweeper Handle
// =============================================================================

/// Handle for controlling a running sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) {
        // A closed channel means the sweeper already stopped; nothing to do.
        let _ = self.shutdown_tx.send(()).await;
    }
}

// =============================================================================
// Expiry Sweeper
// =============================================================================

/// Periodic task that deletes stale pending bookings and frees their stock.
pub struct ExpirySweeper {
    db: Database,
    config: EngineConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ExpirySweeper {
    /// Creates a new sweeper and returns a handle.
    pub fn new(db: Database, config: EngineConfig) -> (Self, SweeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let sweeper = ExpirySweeper {
            db,
            config,
            shutdown_rx,
        };

        (sweeper, SweeperHandle { shutdown_tx })
    }

    /// Runs the sweep loop.
    ///
    /// This should be spawned as a background task:
    /// ```rust,ignore
    /// let (sweeper, handle) = ExpirySweeper::new(db.clone(), config.clone());
    /// tokio::spawn(sweeper.run());
    /// ```
    pub async fn run(mut self) {
        info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            timeout_secs = self.config.pending_timeout.as_secs(),
            "Expiry sweeper starting"
        );

        let mut interval = tokio::time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match sweep_expired_bookings(&self.db, &self.config).await {
                        Ok(0) => {}
                        Ok(count) => info!(count, "Expired bookings reclaimed"),
                        Err(e) => error!(error = %e, "Expiry sweep failed"),
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Expiry sweeper shutting down");
                    break;
                }
            }
        }
    }
}

/// One sweep pass, also invocable by an external scheduler.
///
/// Finds pending bookings older than the timeout window, releases their
/// reservations, and deletes the booking records. A failure on one booking
/// is logged and the sweep moves on.
///
/// ## Returns
/// The number of bookings successfully reclaimed.
pub async fn sweep_expired_bookings(
    db: &Database,
    config: &EngineConfig,
) -> bouncehire_db::DbResult<usize> {
    let cutoff = Utc::now()
        - chrono::Duration::from_std(config.pending_timeout)
            .unwrap_or_else(|_| chrono::Duration::minutes(30));

    let expired = db.bookings().find_expired_pending(cutoff).await?;
    if expired.is_empty() {
        debug!("No expired pending bookings");
        return Ok(0);
    }

    let mut reclaimed = 0usize;
    for booking_id in &expired {
        // Release first, delete second: if the delete fails the booking is
        // still pending and the next pass retries it (release is idempotent).
        let result = async {
            db.reservations().release(booking_id).await?;
            db.bookings().delete(booking_id).await
        }
        .await;

        match result {
            Ok(()) => {
                info!(booking_id, "Expired pending booking removed");
                reclaimed += 1;
            }
            Err(e) => {
                error!(booking_id, error = %e, "Failed to reclaim expired booking");
            }
        }
    }

    Ok(reclaimed)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogProduct, StaticCatalog};
    use crate::checkout::BookingEngine;
    use crate::notify::LogNotifier;
    use bouncehire_core::{
        CartLine, CartSnapshot, InventoryUnit, InvoiceOptions, PaymentMethod, RentalType,
        ShippingAddress, TimeSlot, UnitStatus,
    };
    use bouncehire_db::DbConfig;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn engine(db: &Database) -> BookingEngine {
        let catalog = Arc::new(StaticCatalog::new([CatalogProduct {
            id: "castle-1".into(),
            name: "Princess Castle".into(),
            daily_rate_pence: 4500,
        }]));
        BookingEngine::new(
            db.clone(),
            catalog,
            Arc::new(LogNotifier),
            EngineConfig::default(),
        )
    }

    async fn seed_unit(db: &Database) {
        let now = Utc::now();
        db.inventory()
            .insert_unit(&InventoryUnit {
                id: Uuid::new_v4().to_string(),
                product_id: "castle-1".to_string(),
                warehouse: "Main Warehouse".to_string(),
                vendor: "Acme Inflatables".to_string(),
                quantity: 1,
                rental_fee_pence: 4500,
                status: UnitStatus::Available,
                booked_dates: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Amy".into(),
            last_name: "Pond".into(),
            email: "amy@example.com".into(),
            phone: "07700900001".into(),
            street: "1 Leadworth Lane".into(),
            city: "Gloucester".into(),
            postal_code: "GL1 1AA".into(),
            country: "United Kingdom".into(),
            delivery_slot: TimeSlot::new(8, 12),
            collection_slot: TimeSlot::new(8, 17),
            keep_overnight: false,
            notes: None,
        }
    }

    fn cart() -> CartSnapshot {
        CartSnapshot {
            items: vec![CartLine {
                product_id: "castle-1".into(),
                quantity: 1,
                start_date: "2024-07-01".parse().unwrap(),
                end_date: "2024-07-05".parse().unwrap(),
                rate_pence: 4500,
                rental_type: RentalType::Daily,
            }],
        }
    }

    /// Backdates a booking so it looks abandoned.
    async fn backdate(db: &Database, booking_id: &str, minutes: i64) {
        let then = Utc::now() - chrono::Duration::minutes(minutes);
        sqlx::query("UPDATE bookings SET created_at = ?2 WHERE id = ?1")
            .bind(booking_id)
            .bind(then)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_reclaims_stale_pending_booking() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db).await;
        let engine = engine(&db).await;
        let config = EngineConfig::default();

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();
        backdate(&db, &booking.id, 45).await;

        let reclaimed = sweep_expired_bookings(&db, &config).await.unwrap();
        assert_eq!(reclaimed, 1);

        // Booking gone, inventory free again.
        assert!(db.bookings().get_by_id(&booking.id).await.unwrap().is_none());
        let units = db.inventory().find_units_for_product("castle-1").await.unwrap();
        assert_eq!(units[0].status, UnitStatus::Available);
        assert!(units[0].booked_dates.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_leaves_fresh_and_confirmed_bookings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_unit(&db).await;
        let engine = engine(&db).await;
        let config = EngineConfig::default();

        // Fresh pending booking: inside the timeout window.
        let fresh = engine
            .create_booking_from_cart(
                "user-1",
                &cart(),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        let reclaimed = sweep_expired_bookings(&db, &config).await.unwrap();
        assert_eq!(reclaimed, 0);
        assert!(db.bookings().get_by_id(&fresh.id).await.unwrap().is_some());

        // Stale but confirmed booking: not the sweeper's business.
        use crate::checkout::Actor;
        engine
            .update_booking_status(
                &fresh.id,
                bouncehire_core::BookingStatus::Confirmed,
                &Actor::admin("admin-1"),
                None,
            )
            .await
            .unwrap();
        backdate(&db, &fresh.id, 120).await;

        let reclaimed = sweep_expired_bookings(&db, &config).await.unwrap();
        assert_eq!(reclaimed, 0);
        assert!(db.bookings().get_by_id(&fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweeper_loop_shuts_down() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (sweeper, handle) = ExpirySweeper::new(db, EngineConfig::default());

        let task = tokio::spawn(sweeper.run());
        handle.shutdown().await;

        // The loop exits promptly once told to.
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("sweeper did not shut down")
            .unwrap();
    }
}
