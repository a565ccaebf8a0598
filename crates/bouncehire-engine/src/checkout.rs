//! # Booking Lifecycle Controller
//!
//! Drives cart → booking creation, cancellation, and status updates.
//!
//! ## Creation State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 create_booking_from_cart                                │
//! │                                                                         │
//! │  validating ──► reserving ──► persisting ──► notifying ──► done        │
//! │       │             │              │              │                     │
//! │       │             │              │              └── failure is        │
//! │       │             │              │                  logged only       │
//! │       │             │              │                                    │
//! │       │             │              └── failure releases every           │
//! │       │             │                  reservation, then rethrows       │
//! │       │             │                                                   │
//! │       │             └── first failing line releases all lines          │
//! │       │                 already reserved for this booking               │
//! │       │                                                                 │
//! │       └── failure aborts with nothing persisted                        │
//! │                                                                         │
//! │  Partial bookings are never persisted. The booking row is the          │
//! │  durability boundary; notification is best-effort after it.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every line of one booking reserves under the same booking id, so the
//! compensating rollback is a single `release(booking_id)` regardless of
//! how many lines had already succeeded.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bouncehire_core::{
    availability, validation, Booking, BookingItem, BookingStatus, BookingTotals, CartSnapshot,
    CoreError, DateRange, DayAvailability, InvoiceOptions, Money, PaymentDetails, PaymentMethod,
    PaymentStatus, ShippingAddress, StatusHistoryEntry,
};
use bouncehire_db::Database;

use crate::catalog::ProductCatalog;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::notify::{BookingEvent, Notifier};

// =============================================================================
// Caller Identity
// =============================================================================

/// Pre-authenticated caller identity, supplied by the host's auth layer.
///
/// The engine trusts this: authentication itself is the host's problem.
/// Ownership checks here only compare ids and the admin flag.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
            is_admin: true,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Availability answer for the host's product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub is_available: bool,
    pub available_quantity: i64,
    pub reason: Option<String>,
}

// =============================================================================
// Booking Engine
// =============================================================================

/// Orchestrates the booking lifecycle over injected collaborators.
pub struct BookingEngine {
    db: Database,
    catalog: Arc<dyn ProductCatalog>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl BookingEngine {
    /// Creates a new engine.
    ///
    /// All collaborators are explicit constructor arguments - there is no
    /// ambient database or mail singleton to reach for.
    pub fn new(
        db: Database,
        catalog: Arc<dyn ProductCatalog>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        BookingEngine {
            db,
            catalog,
            notifier,
            config,
        }
    }

    /// Read access to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Whether `quantity` units of a product are free over the interval.
    pub async fn check_availability(
        &self,
        product_id: &str,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        quantity: i64,
    ) -> EngineResult<AvailabilityReport> {
        let range = DateRange::new(start_date, end_date)?;
        validation::validate_quantity(quantity)?;

        let units = self.db.inventory().find_units_for_product(product_id).await?;
        let decision = availability::assess(&units, range, quantity);

        Ok(AvailabilityReport {
            is_available: decision.is_available,
            available_quantity: decision.available_quantity,
            reason: decision.reason,
        })
    }

    /// Per-day remaining quantity over the interval, for calendar widgets.
    pub async fn availability_calendar(
        &self,
        product_id: &str,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        quantity: i64,
    ) -> EngineResult<Vec<DayAvailability>> {
        let range = DateRange::new(start_date, end_date)?;
        validation::validate_quantity(quantity)?;

        let units = self.db.inventory().find_units_for_product(product_id).await?;
        Ok(availability::calendar(&units, range, quantity))
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a booking from the host's cart snapshot.
    ///
    /// See the module docs for the state machine. On success the booking is
    /// persisted `pending` with every line's inventory reserved; on any
    /// failure, nothing is persisted and no reservation survives.
    pub async fn create_booking_from_cart(
        &self,
        user_id: &str,
        cart: &CartSnapshot,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        invoice: InvoiceOptions,
    ) -> EngineResult<Booking> {
        // --- validating ------------------------------------------------------
        validation::validate_cart(cart)?;
        validation::validate_shipping_address(&shipping_address)?;
        validation::validate_invoice_options(&invoice)?;

        let booking_id = Uuid::new_v4().to_string();
        debug!(booking_id, user_id, lines = cart.items.len(), "Creating booking");

        // --- reserving -------------------------------------------------------
        match self.reserve_cart(cart, &booking_id).await {
            Ok(items) => {
                // --- persisting ----------------------------------------------
                match self
                    .persist_booking(
                        &booking_id,
                        user_id,
                        items,
                        shipping_address,
                        payment_method,
                        invoice,
                    )
                    .await
                {
                    Ok(booking) => {
                        // --- notifying (best-effort) -------------------------
                        self.emit(BookingEvent::BookingCreated, &booking).await;
                        info!(
                            booking_id,
                            booking_number = %booking.booking_number,
                            total = %booking.total(),
                            "Booking created"
                        );
                        Ok(booking)
                    }
                    Err(err) => {
                        self.release_after_failure(&booking_id).await;
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.release_after_failure(&booking_id).await;
                Err(err)
            }
        }
    }

    /// Reserves every cart line under one booking id and builds the frozen
    /// line items. The first failing line aborts the whole pass; the caller
    /// releases whatever already succeeded.
    async fn reserve_cart(
        &self,
        cart: &CartSnapshot,
        booking_id: &str,
    ) -> EngineResult<Vec<BookingItem>> {
        let reservations = self.db.reservations();
        let mut items = Vec::with_capacity(cart.items.len());

        for line in &cart.items {
            let product = self
                .catalog
                .product(&line.product_id)
                .await
                .ok_or_else(|| EngineError::not_found("Product", &line.product_id))?;

            let range = DateRange::new(line.start_date, line.end_date)?;
            let reserved = reservations
                .reserve(&line.product_id, range, line.quantity, booking_id)
                .await?;

            // Snapshot fulfilment details from the allocated stock; a
            // successful reserve always consumed at least one unit.
            let (warehouse, vendor) = reserved
                .first()
                .map(|u| (u.warehouse.clone(), u.vendor.clone()))
                .unwrap_or_default();
            items.push(BookingItem {
                id: Uuid::new_v4().to_string(),
                booking_id: booking_id.to_string(),
                product_id: line.product_id.clone(),
                name_snapshot: product.name,
                quantity: line.quantity,
                rate_pence: line.rate_pence,
                start_date: line.start_date,
                end_date: line.end_date,
                total_days: range.total_days(),
                rental_type: line.rental_type,
                warehouse,
                vendor,
            });
        }

        Ok(items)
    }

    /// Prices the items and writes the booking aggregate.
    async fn persist_booking(
        &self,
        booking_id: &str,
        user_id: &str,
        items: Vec<BookingItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        invoice: InvoiceOptions,
    ) -> EngineResult<Booking> {
        let subtotal: Money = items.iter().map(BookingItem::line_total).sum();
        let totals = BookingTotals::compute(
            subtotal,
            self.config.tax_rate(),
            self.config.fees.delivery_fee(&shipping_address.delivery_slot),
            self.config.fees.collection_fee(&shipping_address.collection_slot),
            self.config.fees.overnight_fee(shipping_address.keep_overnight),
        );

        let now = Utc::now();
        let mut booking = Booking {
            id: booking_id.to_string(),
            booking_number: String::new(), // assigned on insert
            user_id: user_id.to_string(),
            items,
            shipping_address,
            payment: PaymentDetails {
                method: payment_method,
                status: PaymentStatus::Pending,
                amount_pence: totals.total.pence(),
            },
            status: BookingStatus::Pending,
            status_history: vec![StatusHistoryEntry {
                status: BookingStatus::Pending,
                changed_at: now,
                changed_by: user_id.to_string(),
                notes: Some("Booking created".to_string()),
            }],
            subtotal_pence: totals.subtotal.pence(),
            tax_pence: totals.tax.pence(),
            delivery_fee_pence: totals.delivery_fee.pence(),
            collection_fee_pence: totals.collection_fee.pence(),
            overnight_fee_pence: totals.overnight_fee.pence(),
            total_pence: totals.total.pence(),
            invoice_type: invoice.invoice_type,
            bank_details: invoice.bank_details,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.db.bookings().insert_booking(&mut booking).await?;
        Ok(booking)
    }

    /// Compensating rollback: a plain release-by-booking. Its own failure is
    /// logged and swallowed - the sweeper cannot help here (no booking row
    /// exists), but release is idempotent and safe to re-run by hand.
    async fn release_after_failure(&self, booking_id: &str) {
        if let Err(err) = self.db.reservations().release(booking_id).await {
            warn!(booking_id, error = %err, "Rollback release failed");
        }
    }

    // =========================================================================
    // Cancellation & Status
    // =========================================================================

    /// Cancels a booking, releasing its inventory.
    ///
    /// Permitted for the booking's owner or an admin, from any non-terminal
    /// state, exactly once.
    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        actor: &Actor,
        reason: &str,
    ) -> EngineResult<Booking> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        if !actor.is_admin && booking.user_id != actor.user_id {
            return Err(EngineError::Forbidden(
                "You can only cancel your own bookings".to_string(),
            ));
        }

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(CoreError::InvalidStatusTransition {
                booking_id: booking_id.to_string(),
                from: booking.status.as_str().to_string(),
                to: BookingStatus::Cancelled.as_str().to_string(),
            }
            .into());
        }

        self.db.reservations().release(booking_id).await?;

        let bookings = self.db.bookings();
        bookings
            .record_status(
                booking_id,
                BookingStatus::Cancelled,
                &actor.user_id,
                Some(&format!("Cancelled: {reason}")),
            )
            .await?;
        bookings.set_cancellation_reason(booking_id, reason).await?;

        let cancelled = bookings
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        self.emit(BookingEvent::BookingCancelled, &cancelled).await;
        info!(booking_id, reason, "Booking cancelled");
        Ok(cancelled)
    }

    /// Moves a booking along its status machine (admin surface).
    ///
    /// Cancelling through here also releases the booking's inventory.
    pub async fn update_booking_status(
        &self,
        booking_id: &str,
        new_status: BookingStatus,
        actor: &Actor,
        notes: Option<&str>,
    ) -> EngineResult<Booking> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        if !booking.status.can_transition_to(new_status) {
            return Err(CoreError::InvalidStatusTransition {
                booking_id: booking_id.to_string(),
                from: booking.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            }
            .into());
        }

        if new_status == BookingStatus::Cancelled {
            self.db.reservations().release(booking_id).await?;
        }

        self.db
            .bookings()
            .record_status(booking_id, new_status, &actor.user_id, notes)
            .await?;

        let updated = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        self.emit(BookingEvent::BookingStatusChanged, &updated).await;
        info!(booking_id, status = new_status.as_str(), "Booking status updated");
        Ok(updated)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a booking, enforcing ownership for non-admin callers.
    pub async fn get_booking(&self, booking_id: &str, actor: &Actor) -> EngineResult<Booking> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        if !actor.is_admin && booking.user_id != actor.user_id {
            return Err(EngineError::Forbidden(
                "You can only view your own bookings".to_string(),
            ));
        }

        Ok(booking)
    }

    /// Lists bookings newest-first. Non-admins see only their own.
    pub async fn list_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> EngineResult<Vec<Booking>> {
        let filter = bouncehire_db::BookingFilter {
            status,
            user_id: (!actor.is_admin).then(|| actor.user_id.clone()),
        };
        Ok(self.db.bookings().list(&filter, page, limit).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Best-effort event emission; failures are logged, never propagated.
    async fn emit(&self, event: BookingEvent, booking: &Booking) {
        if let Err(err) = self.notifier.notify(event, booking).await {
            warn!(
                booking_id = %booking.id,
                event = ?event,
                error = %err,
                "Notification failed (ignored)"
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogProduct, StaticCatalog};
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use bouncehire_core::{CartLine, InventoryUnit, RentalType, TimeSlot, UnitStatus};
    use bouncehire_db::DbConfig;
    use std::sync::Mutex;

    /// Notifier that records events for assertions.
    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<(BookingEvent, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: BookingEvent, booking: &Booking) -> Result<(), NotifyError> {
            self.events
                .lock()
                .unwrap()
                .push((event, booking.id.clone()));
            Ok(())
        }
    }

    /// Notifier that always fails, to prove failures are swallowed.
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _: BookingEvent, _: &Booking) -> Result<(), NotifyError> {
            Err(NotifyError("smtp down".to_string()))
        }
    }

    async fn engine_with(notifier: Arc<dyn Notifier>) -> (BookingEngine, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = Arc::new(StaticCatalog::new([
            CatalogProduct {
                id: "castle-1".into(),
                name: "Princess Castle".into(),
                daily_rate_pence: 4500,
            },
            CatalogProduct {
                id: "slide-9".into(),
                name: "Mega Slide".into(),
                daily_rate_pence: 8000,
            },
        ]));
        let engine = BookingEngine::new(db.clone(), catalog, notifier, EngineConfig::default());
        (engine, db)
    }

    async fn test_engine() -> (BookingEngine, Database, Arc<RecordingNotifier>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let recording = Arc::new(RecordingNotifier::default());
        let catalog = Arc::new(StaticCatalog::new([
            CatalogProduct {
                id: "castle-1".into(),
                name: "Princess Castle".into(),
                daily_rate_pence: 4500,
            },
            CatalogProduct {
                id: "slide-9".into(),
                name: "Mega Slide".into(),
                daily_rate_pence: 8000,
            },
        ]));
        let engine = BookingEngine::new(
            db.clone(),
            catalog,
            recording.clone(),
            EngineConfig::default(),
        );
        (engine, db, recording)
    }

    async fn seed_unit(db: &Database, product_id: &str) {
        let now = Utc::now();
        db.inventory()
            .insert_unit(&InventoryUnit {
                id: Uuid::new_v4().to_string(),
                product_id: product_id.to_string(),
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

    fn cart(lines: &[(&str, i64, &str, &str)]) -> CartSnapshot {
        CartSnapshot {
            items: lines
                .iter()
                .map(|(product, qty, start, end)| CartLine {
                    product_id: product.to_string(),
                    quantity: *qty,
                    start_date: start.parse().unwrap(),
                    end_date: end.parse().unwrap(),
                    rate_pence: 4500,
                    rental_type: RentalType::Daily,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_booking_happy_path() {
        let (engine, db, recording) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::CashOnDelivery,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.booking_number.starts_with("BK"));
        assert_eq!(booking.items.len(), 1);
        assert_eq!(booking.items[0].total_days, 4);
        assert_eq!(booking.items[0].name_snapshot, "Princess Castle");

        // 1 × £45.00 × 4 days = £180.00; VAT £36.00; free delivery/collection
        assert_eq!(booking.subtotal_pence, 18000);
        assert_eq!(booking.tax_pence, 3600);
        assert_eq!(booking.delivery_fee_pence, 0);
        assert_eq!(booking.total_pence, 21600);

        // Inventory is held
        let units = db.inventory().find_units_by_booking(&booking.id).await.unwrap();
        assert_eq!(units.len(), 1);

        // Event fired
        let events = recording.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, BookingEvent::BookingCreated);
    }

    #[tokio::test]
    async fn test_same_day_hire_billed_one_day() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-01")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(booking.items[0].total_days, 1);
        assert_eq!(booking.subtotal_pence, 4500);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_any_work() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let err = engine
            .create_booking_from_cart(
                "user-1",
                &CartSnapshot { items: vec![] },
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_multi_line_failure_releases_everything() {
        let (engine, db, recording) = test_engine().await;
        seed_unit(&db, "castle-1").await;
        // slide-9 exists in the catalog but has NO inventory units

        let err = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[
                    ("castle-1", 1, "2024-07-01", "2024-07-05"),
                    ("slide-9", 1, "2024-07-01", "2024-07-05"),
                ]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap_err();

        match err {
            EngineError::Insufficient { product_id, .. } => assert_eq!(product_id, "slide-9"),
            other => panic!("expected Insufficient, got {other:?}"),
        }

        // The castle reserved for line 1 was released again (all-or-nothing).
        let units = db.inventory().find_units_for_product("castle-1").await.unwrap();
        assert!(units[0].booked_dates.is_empty());
        assert_eq!(units[0].status, UnitStatus::Available);

        // And the castle is immediately bookable by someone else.
        let report = engine
            .check_availability(
                "castle-1",
                "2024-07-01".parse().unwrap(),
                "2024-07-05".parse().unwrap(),
                1,
            )
            .await
            .unwrap();
        assert!(report.is_available);

        assert!(recording.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (engine, _db, _) = test_engine().await;

        let err = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("ghost-product", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_booking() {
        let (engine, db) = engine_with(Arc::new(FailingNotifier)).await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        // Booking persisted despite the notifier erroring.
        assert!(db.bookings().get_by_id(&booking.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_releases_inventory_and_frees_dates() {
        let (engine, db, recording) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        // Scenario from the product page: the held dates read unavailable...
        let report = engine
            .check_availability(
                "castle-1",
                "2024-07-03".parse().unwrap(),
                "2024-07-04".parse().unwrap(),
                1,
            )
            .await
            .unwrap();
        assert!(!report.is_available);
        assert_eq!(report.available_quantity, 0);

        let cancelled = engine
            .cancel_booking(&booking.id, &Actor::user("user-1"), "Rained off")
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Rained off"));
        assert_eq!(cancelled.status_history.len(), 2);

        // ...and cancellation frees them again.
        let report = engine
            .check_availability(
                "castle-1",
                "2024-07-03".parse().unwrap(),
                "2024-07-04".parse().unwrap(),
                1,
            )
            .await
            .unwrap();
        assert!(report.is_available);

        let events = recording.events.lock().unwrap();
        assert_eq!(events.last().unwrap().0, BookingEvent::BookingCancelled);
    }

    #[tokio::test]
    async fn test_cancel_requires_ownership() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        let err = engine
            .cancel_booking(&booking.id, &Actor::user("someone-else"), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        // Admins may cancel on behalf of the customer.
        engine
            .cancel_booking(&booking.id, &Actor::admin("admin-1"), "customer called in")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_twice_rejected() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        engine
            .cancel_booking(&booking.id, &Actor::user("user-1"), "first")
            .await
            .unwrap();
        let err = engine
            .cancel_booking(&booking.id, &Actor::user("user-1"), "second")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_status_walks_forward_only() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        let admin = Actor::admin("admin-1");
        let updated = engine
            .update_booking_status(&booking.id, BookingStatus::Confirmed, &admin, Some("Paid"))
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);

        let err = engine
            .update_booking_status(&booking.id, BookingStatus::Pending, &admin, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_corporate_invoice_needs_bank_details() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let err = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::BankTransfer,
                InvoiceOptions {
                    invoice_type: bouncehire_core::InvoiceType::Corporate,
                    bank_details: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_and_list_enforce_ownership() {
        let (engine, db, _) = test_engine().await;
        seed_unit(&db, "castle-1").await;

        let booking = engine
            .create_booking_from_cart(
                "user-1",
                &cart(&[("castle-1", 1, "2024-07-01", "2024-07-05")]),
                address(),
                PaymentMethod::Card,
                InvoiceOptions::default(),
            )
            .await
            .unwrap();

        assert!(engine
            .get_booking(&booking.id, &Actor::user("user-1"))
            .await
            .is_ok());
        assert!(matches!(
            engine
                .get_booking(&booking.id, &Actor::user("other"))
                .await
                .unwrap_err(),
            EngineError::Forbidden(_)
        ));

        let mine = engine
            .list_bookings(&Actor::user("user-1"), None, 1, 20)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let others = engine
            .list_bookings(&Actor::user("other"), None, 1, 20)
            .await
            .unwrap();
        assert!(others.is_empty());

        let all = engine
            .list_bookings(&Actor::admin("admin-1"), None, 1, 20)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }
}
