//! # Inventory Repository
//!
//! Database operations for inventory units and their reservations.
//!
//! ## Storage Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inventory_units            unit_reservations                           │
//! │  ┌──────────────────┐       ┌──────────────────────────────┐           │
//! │  │ id               │◄──────│ unit_id                      │           │
//! │  │ product_id       │       │ booking_id                   │           │
//! │  │ quantity         │       │ start_date .. end_date       │           │
//! │  │ status           │       └──────────────────────────────┘           │
//! │  └──────────────────┘       one row per date-range hold                │
//! │                                                                         │
//! │  Reads assemble the two into InventoryUnit { booked_dates: [...] }     │
//! │  with explicit queries - no lazy loading, no hidden population.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All writes to `unit_reservations` go through the ReservationManager;
//! this repository only reads them and manages the unit records themselves.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bouncehire_core::{InventoryUnit, Reservation, UnitStatus};

// =============================================================================
// Row Types
// =============================================================================

/// Raw `inventory_units` row; reservations are attached separately.
#[derive(Debug, sqlx::FromRow)]
struct UnitRow {
    id: String,
    product_id: String,
    warehouse: String,
    vendor: String,
    quantity: i64,
    rental_fee_pence: i64,
    status: UnitStatus,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

/// Raw `unit_reservations` row.
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    unit_id: String,
    booking_id: String,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
}

impl UnitRow {
    fn into_unit(self, booked_dates: Vec<Reservation>) -> InventoryUnit {
        InventoryUnit {
            id: self.id,
            product_id: self.product_id,
            warehouse: self.warehouse,
            vendor: self.vendor,
            quantity: self.quantity,
            rental_fee_pence: self.rental_fee_pence,
            status: self.status,
            booked_dates,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Zips unit rows with their reservation rows into assembled units.
fn assemble(units: Vec<UnitRow>, reservations: Vec<ReservationRow>) -> Vec<InventoryUnit> {
    let mut by_unit: HashMap<String, Vec<Reservation>> = HashMap::new();
    for row in reservations {
        by_unit.entry(row.unit_id).or_default().push(Reservation {
            start_date: row.start_date,
            end_date: row.end_date,
            booking_id: row.booking_id,
        });
    }

    units
        .into_iter()
        .map(|row| {
            let booked = by_unit.remove(&row.id).unwrap_or_default();
            row.into_unit(booked)
        })
        .collect()
}

// =============================================================================
// Connection-Level Loaders
// =============================================================================
// These take a bare connection so the ReservationManager can run the same
// reads inside its own transaction; the repository methods below wrap them
// with a pooled connection.

const SELECT_UNIT_COLUMNS: &str = "SELECT id, product_id, warehouse, vendor, quantity, \
     rental_fee_pence, status, created_at, updated_at FROM inventory_units";

/// Loads every non-maintenance unit for a product, reservations attached.
///
/// `out_of_stock` units are included on purpose: the availability
/// calculator reports them as zero quantity rather than "product unknown".
pub(crate) async fn load_units_for_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Vec<InventoryUnit>> {
    let units: Vec<UnitRow> = sqlx::query_as(&format!(
        "{SELECT_UNIT_COLUMNS} WHERE product_id = ?1 AND status != 'maintenance' ORDER BY created_at, id"
    ))
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let reservations: Vec<ReservationRow> = sqlx::query_as(
        r#"
        SELECT r.unit_id, r.booking_id, r.start_date, r.end_date
        FROM unit_reservations r
        JOIN inventory_units u ON u.id = r.unit_id
        WHERE u.product_id = ?1
        ORDER BY r.start_date
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble(units, reservations))
}

/// Loads every unit holding a reservation for the given booking.
pub(crate) async fn load_units_by_booking(
    conn: &mut SqliteConnection,
    booking_id: &str,
) -> DbResult<Vec<InventoryUnit>> {
    let units: Vec<UnitRow> = sqlx::query_as(&format!(
        "{SELECT_UNIT_COLUMNS} WHERE id IN \
         (SELECT DISTINCT unit_id FROM unit_reservations WHERE booking_id = ?1) \
         ORDER BY created_at, id"
    ))
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    let reservations: Vec<ReservationRow> = sqlx::query_as(
        r#"
        SELECT unit_id, booking_id, start_date, end_date
        FROM unit_reservations
        WHERE unit_id IN (SELECT DISTINCT unit_id FROM unit_reservations WHERE booking_id = ?1)
        ORDER BY start_date
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble(units, reservations))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory unit database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Inserts a new inventory unit (admin stock entry).
    pub async fn insert_unit(&self, unit: &InventoryUnit) -> DbResult<()> {
        debug!(id = %unit.id, product_id = %unit.product_id, "Inserting inventory unit");

        sqlx::query(
            r#"
            INSERT INTO inventory_units (
                id, product_id, warehouse, vendor,
                quantity, rental_fee_pence, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.product_id)
        .bind(&unit.warehouse)
        .bind(&unit.vendor)
        .bind(unit.quantity)
        .bind(unit.rental_fee_pence)
        .bind(unit.status)
        .bind(unit.created_at)
        .bind(unit.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a unit by ID, reservations attached.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryUnit>> {
        let mut conn = self.pool.acquire().await?;

        let unit: Option<UnitRow> =
            sqlx::query_as(&format!("{SELECT_UNIT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        let Some(unit) = unit else {
            return Ok(None);
        };

        let reservations: Vec<ReservationRow> = sqlx::query_as(
            "SELECT unit_id, booking_id, start_date, end_date \
             FROM unit_reservations WHERE unit_id = ?1 ORDER BY start_date",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(assemble(vec![unit], reservations).pop())
    }

    /// Returns every bookable unit for a product (status ≠ maintenance).
    ///
    /// A product with no units yields an empty vector, not an error.
    pub async fn find_units_for_product(&self, product_id: &str) -> DbResult<Vec<InventoryUnit>> {
        let mut conn = self.pool.acquire().await?;
        load_units_for_product(&mut conn, product_id).await
    }

    /// Returns every unit holding a reservation for a booking.
    ///
    /// Supports release-by-booking and cancellation audits.
    pub async fn find_units_by_booking(&self, booking_id: &str) -> DbResult<Vec<InventoryUnit>> {
        let mut conn = self.pool.acquire().await?;
        load_units_by_booking(&mut conn, booking_id).await
    }

    /// Flips a unit's status (admin maintenance / stock actions).
    pub async fn set_status(&self, id: &str, status: UnitStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory_units SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryUnit", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
