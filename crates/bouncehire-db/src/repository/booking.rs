//! # Booking Repository
//!
//! Database operations for booking aggregates.
//!
//! ## Aggregate Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bookings ──┬── booking_items            (line items, snapshots)        │
//! │             └── booking_status_history   (audit trail)                  │
//! │                                                                         │
//! │  shipping_address / bank_details live as JSON documents on the         │
//! │  booking row: written and read whole, never filtered on.               │
//! │                                                                         │
//! │  Reads assemble the three tables into Booking { items, history, .. }   │
//! │  with explicit queries per table.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Booking Numbers
//! `BK{YY}{MM}{NNNN}` - monotonic within a calendar month, generated inside
//! the insert transaction by reading the month's highest number. The UNIQUE
//! index backstops the rare case of two checkouts drawing the same number;
//! the loser's insert fails and its reservations are released by the caller.

use chrono::{DateTime, Datelike, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bouncehire_core::{
    BankDetails, Booking, BookingItem, BookingStatus, InvoiceType, PaymentDetails, PaymentMethod,
    PaymentStatus, RentalType, ShippingAddress, StatusHistoryEntry,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: String,
    booking_number: String,
    user_id: String,
    status: BookingStatus,
    shipping_address: String,
    bank_details: Option<String>,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    payment_amount_pence: i64,
    subtotal_pence: i64,
    tax_pence: i64,
    delivery_fee_pence: i64,
    collection_fee_pence: i64,
    overnight_fee_pence: i64,
    total_pence: i64,
    invoice_type: InvoiceType,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    booking_id: String,
    product_id: String,
    name_snapshot: String,
    quantity: i64,
    rate_pence: i64,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    total_days: i64,
    rental_type: RentalType,
    warehouse: String,
    vendor: String,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    status: BookingStatus,
    changed_at: DateTime<Utc>,
    changed_by: String,
    notes: Option<String>,
}

impl BookingRow {
    fn into_booking(
        self,
        items: Vec<BookingItem>,
        status_history: Vec<StatusHistoryEntry>,
    ) -> DbResult<Booking> {
        let shipping_address: ShippingAddress = serde_json::from_str(&self.shipping_address)
            .map_err(|e| DbError::CorruptDocument {
                entity: "Booking.shipping_address".to_string(),
                id: self.id.clone(),
                message: e.to_string(),
            })?;

        let bank_details: Option<BankDetails> = match &self.bank_details {
            Some(raw) => Some(serde_json::from_str(raw).map_err(|e| DbError::CorruptDocument {
                entity: "Booking.bank_details".to_string(),
                id: self.id.clone(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Booking {
            id: self.id,
            booking_number: self.booking_number,
            user_id: self.user_id,
            items,
            shipping_address,
            payment: PaymentDetails {
                method: self.payment_method,
                status: self.payment_status,
                amount_pence: self.payment_amount_pence,
            },
            status: self.status,
            status_history,
            subtotal_pence: self.subtotal_pence,
            tax_pence: self.tax_pence,
            delivery_fee_pence: self.delivery_fee_pence,
            collection_fee_pence: self.collection_fee_pence,
            overnight_fee_pence: self.overnight_fee_pence,
            total_pence: self.total_pence,
            invoice_type: self.invoice_type,
            bank_details,
            cancellation_reason: self.cancellation_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<ItemRow> for BookingItem {
    fn from(row: ItemRow) -> Self {
        BookingItem {
            id: row.id,
            booking_id: row.booking_id,
            product_id: row.product_id,
            name_snapshot: row.name_snapshot,
            quantity: row.quantity,
            rate_pence: row.rate_pence,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            rental_type: row.rental_type,
            warehouse: row.warehouse,
            vendor: row.vendor,
        }
    }
}

const SELECT_BOOKING_COLUMNS: &str = "SELECT id, booking_number, user_id, status, shipping_address, bank_details, \
     payment_method, payment_status, payment_amount_pence, \
     subtotal_pence, tax_pence, delivery_fee_pence, collection_fee_pence, \
     overnight_fee_pence, total_pence, invoice_type, cancellation_reason, \
     created_at, updated_at FROM bookings";

// =============================================================================
// Filters
// =============================================================================

/// Filter for booking list queries.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub user_id: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Inserts a complete booking aggregate.
    ///
    /// Generates the booking number inside the same transaction as the
    /// insert and writes it back into `booking`. Items and the initial
    /// status history land in the same transaction: the aggregate is
    /// persisted whole or not at all.
    pub async fn insert_booking(&self, booking: &mut Booking) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        booking.booking_number = next_booking_number(&mut tx, booking.created_at).await?;

        debug!(id = %booking.id, booking_number = %booking.booking_number, "Inserting booking");

        let shipping_address = serde_json::to_string(&booking.shipping_address)
            .map_err(|e| DbError::Internal(e.to_string()))?;
        let bank_details = booking
            .bank_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, booking_number, user_id, status,
                shipping_address, bank_details,
                payment_method, payment_status, payment_amount_pence,
                subtotal_pence, tax_pence, delivery_fee_pence,
                collection_fee_pence, overnight_fee_pence, total_pence,
                invoice_type, cancellation_reason,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17,
                ?18, ?19
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.booking_number)
        .bind(&booking.user_id)
        .bind(booking.status)
        .bind(&shipping_address)
        .bind(&bank_details)
        .bind(booking.payment.method)
        .bind(booking.payment.status)
        .bind(booking.payment.amount_pence)
        .bind(booking.subtotal_pence)
        .bind(booking.tax_pence)
        .bind(booking.delivery_fee_pence)
        .bind(booking.collection_fee_pence)
        .bind(booking.overnight_fee_pence)
        .bind(booking.total_pence)
        .bind(booking.invoice_type)
        .bind(&booking.cancellation_reason)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &booking.items {
            sqlx::query(
                r#"
                INSERT INTO booking_items (
                    id, booking_id, product_id, name_snapshot,
                    quantity, rate_pence, start_date, end_date,
                    total_days, rental_type, warehouse, vendor
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&item.id)
            .bind(&item.booking_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.quantity)
            .bind(item.rate_pence)
            .bind(item.start_date)
            .bind(item.end_date)
            .bind(item.total_days)
            .bind(item.rental_type)
            .bind(&item.warehouse)
            .bind(&item.vendor)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &booking.status_history {
            insert_history_entry(&mut tx, &booking.id, entry).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a booking by ID with items and history attached.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<BookingRow> =
            sqlx::query_as(&format!("{SELECT_BOOKING_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, booking_id, product_id, name_snapshot, quantity, rate_pence, \
             start_date, end_date, total_days, rental_type, warehouse, vendor \
             FROM booking_items WHERE booking_id = ?1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let history: Vec<HistoryRow> = sqlx::query_as(
            "SELECT status, changed_at, changed_by, notes \
             FROM booking_status_history WHERE booking_id = ?1 ORDER BY changed_at, id",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let booking = row.into_booking(
            items.into_iter().map(BookingItem::from).collect(),
            history
                .into_iter()
                .map(|h| StatusHistoryEntry {
                    status: h.status,
                    changed_at: h.changed_at,
                    changed_by: h.changed_by,
                    notes: h.notes,
                })
                .collect(),
        )?;

        Ok(Some(booking))
    }

    /// Lists bookings newest-first, optionally filtered by status/user.
    pub async fn list(
        &self,
        filter: &BookingFilter,
        page: u32,
        limit: u32,
    ) -> DbResult<Vec<Booking>> {
        let mut sql = String::from("SELECT id FROM bookings WHERE 1=1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.user_id.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id LIMIT ? OFFSET ?");

        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        let mut query = sqlx::query_scalar::<_, String>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(user_id) = &filter.user_id {
            query = query.bind(user_id);
        }
        let ids: Vec<String> = query
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut bookings = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(booking) = self.get_by_id(&id).await? {
                bookings.push(booking);
            }
        }
        Ok(bookings)
    }

    /// Updates a booking's status and appends the audit entry.
    ///
    /// The caller validates the state-machine edge; this just persists it.
    pub async fn record_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        changed_by: &str,
        notes: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE bookings SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(booking_id)
            .bind(status)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", booking_id));
        }

        let entry = StatusHistoryEntry {
            status,
            changed_at: now,
            changed_by: changed_by.to_string(),
            notes: notes.map(str::to_string),
        };
        insert_history_entry(&mut tx, booking_id, &entry).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Records why a booking was cancelled.
    pub async fn set_cancellation_reason(&self, booking_id: &str, reason: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE bookings SET cancellation_reason = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(booking_id)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", booking_id));
        }
        Ok(())
    }

    /// Ids of pending bookings created at or before `cutoff`.
    ///
    /// The expiry sweeper's work list.
    pub async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM bookings WHERE status = 'pending' AND created_at <= ?1 ORDER BY created_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Deletes a booking; items and history go with it (ON DELETE CASCADE).
    pub async fn delete(&self, booking_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?1")
            .bind(booking_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", booking_id));
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn insert_history_entry(
    conn: &mut SqliteConnection,
    booking_id: &str,
    entry: &StatusHistoryEntry,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO booking_status_history (id, booking_id, status, changed_at, changed_by, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(booking_id)
    .bind(entry.status)
    .bind(entry.changed_at)
    .bind(&entry.changed_by)
    .bind(&entry.notes)
    .execute(conn)
    .await?;

    Ok(())
}

/// Generates the next booking number for the month of `at`.
///
/// ## Format
/// `BK{YY}{MM}{NNNN}` - e.g. `BK24070001`, `BK24070002`, ...
async fn next_booking_number(
    conn: &mut SqliteConnection,
    at: DateTime<Utc>,
) -> DbResult<String> {
    let prefix = format!("BK{:02}{:02}", at.year() % 100, at.month());

    let last: Option<String> = sqlx::query_scalar(
        "SELECT booking_number FROM bookings WHERE booking_number LIKE ?1 \
         ORDER BY booking_number DESC LIMIT 1",
    )
    .bind(format!("{prefix}%"))
    .fetch_optional(conn)
    .await?;

    let sequence = last
        .and_then(|number| number[prefix.len()..].parse::<u32>().ok())
        .map_or(1, |seq| seq + 1);

    Ok(format!("{prefix}{sequence:04}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bouncehire_core::TimeSlot;

    fn sample_booking(user_id: &str) -> Booking {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        Booking {
            id: id.clone(),
            booking_number: String::new(), // filled by insert_booking
            user_id: user_id.to_string(),
            items: vec![BookingItem {
                id: Uuid::new_v4().to_string(),
                booking_id: id,
                product_id: "castle-1".to_string(),
                name_snapshot: "Princess Castle".to_string(),
                quantity: 1,
                rate_pence: 4500,
                start_date: "2024-07-01".parse().unwrap(),
                end_date: "2024-07-05".parse().unwrap(),
                total_days: 4,
                rental_type: RentalType::Daily,
                warehouse: "Main Warehouse".to_string(),
                vendor: "Acme Inflatables".to_string(),
            }],
            shipping_address: ShippingAddress {
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
            },
            payment: PaymentDetails {
                method: PaymentMethod::CashOnDelivery,
                status: PaymentStatus::Pending,
                amount_pence: 22600,
            },
            status: BookingStatus::Pending,
            status_history: vec![StatusHistoryEntry {
                status: BookingStatus::Pending,
                changed_at: now,
                changed_by: user_id.to_string(),
                notes: Some("Booking created".to_string()),
            }],
            subtotal_pence: 18000,
            tax_pence: 3600,
            delivery_fee_pence: 1000,
            collection_fee_pence: 0,
            overnight_fee_pence: 0,
            total_pence: 22600,
            invoice_type: InvoiceType::Regular,
            bank_details: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_aggregate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bookings();

        let mut booking = sample_booking("user-1");
        repo.insert_booking(&mut booking).await.unwrap();
        assert!(booking.booking_number.starts_with("BK"));

        let fetched = repo.get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.booking_number, booking.booking_number);
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].name_snapshot, "Princess Castle");
        assert_eq!(fetched.status_history.len(), 1);
        assert_eq!(fetched.shipping_address.city, "Gloucester");
        assert_eq!(fetched.total_pence, 22600);
    }

    #[tokio::test]
    async fn test_booking_numbers_increment_within_month() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bookings();

        let mut first = sample_booking("user-1");
        let mut second = sample_booking("user-2");
        repo.insert_booking(&mut first).await.unwrap();
        repo.insert_booking(&mut second).await.unwrap();

        let prefix = &first.booking_number[..6];
        assert_eq!(&second.booking_number[..6], prefix);

        let a: u32 = first.booking_number[6..].parse().unwrap();
        let b: u32 = second.booking_number[6..].parse().unwrap();
        assert_eq!(b, a + 1);
    }

    #[tokio::test]
    async fn test_record_status_appends_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bookings();

        let mut booking = sample_booking("user-1");
        repo.insert_booking(&mut booking).await.unwrap();

        repo.record_status(&booking.id, BookingStatus::Confirmed, "admin-1", Some("Paid"))
            .await
            .unwrap();

        let fetched = repo.get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, BookingStatus::Confirmed);
        assert_eq!(fetched.status_history.len(), 2);
        assert_eq!(fetched.status_history[1].changed_by, "admin-1");
    }

    #[tokio::test]
    async fn test_record_status_unknown_booking() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .bookings()
            .record_status("nope", BookingStatus::Confirmed, "admin-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_expired_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bookings();

        let mut stale = sample_booking("user-1");
        stale.created_at = Utc::now() - chrono::Duration::minutes(45);
        repo.insert_booking(&mut stale).await.unwrap();

        let mut fresh = sample_booking("user-2");
        repo.insert_booking(&mut fresh).await.unwrap();

        let mut confirmed = sample_booking("user-3");
        confirmed.created_at = Utc::now() - chrono::Duration::minutes(45);
        repo.insert_booking(&mut confirmed).await.unwrap();
        repo.record_status(&confirmed.id, BookingStatus::Confirmed, "admin-1", None)
            .await
            .unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(30);
        let expired = repo.find_expired_pending(cutoff).await.unwrap();

        assert_eq!(expired, vec![stale.id]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bookings();

        let mut booking = sample_booking("user-1");
        repo.insert_booking(&mut booking).await.unwrap();
        repo.delete(&booking.id).await.unwrap();

        assert!(repo.get_by_id(&booking.id).await.unwrap().is_none());

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM booking_items WHERE booking_id = ?1")
                .bind(&booking.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bookings();

        let mut a = sample_booking("user-1");
        let mut b = sample_booking("user-2");
        repo.insert_booking(&mut a).await.unwrap();
        repo.insert_booking(&mut b).await.unwrap();
        repo.record_status(&b.id, BookingStatus::Confirmed, "admin-1", None)
            .await
            .unwrap();

        let pending = repo
            .list(
                &BookingFilter {
                    status: Some(BookingStatus::Pending),
                    user_id: None,
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);

        let by_user = repo
            .list(
                &BookingFilter {
                    status: None,
                    user_id: Some("user-2".to_string()),
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].id, b.id);
    }
}
