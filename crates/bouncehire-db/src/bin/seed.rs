//! # Seed Data Generator
//!
//! Populates the database with test inventory for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file (./bouncehire.db)
//! cargo run -p bouncehire-db --bin seed
//!
//! # Specify database path
//! cargo run -p bouncehire-db --bin seed -- --db ./data/bouncehire.db
//! ```
//!
//! ## Generated Inventory
//! Creates a realistic hire fleet: bouncy castles, slides, soft play sets
//! and party extras, each as one or more inventory units with a per-day
//! rental fee. Every unit starts `available` with an empty reservation list.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use bouncehire_core::{InventoryUnit, UnitStatus};
use bouncehire_db::{Database, DbConfig};

/// Product id, display name, units to create, per-day fee in pence.
const FLEET: &[(&str, &str, usize, i64)] = &[
    ("castle-princess", "Princess Castle 12x12", 2, 4500),
    ("castle-jungle", "Jungle Adventure Castle", 2, 5000),
    ("castle-disco", "Disco Dome", 1, 7500),
    ("slide-mega", "Mega Slide 18ft", 1, 8000),
    ("slide-toddler", "Toddler Slide Combo", 2, 4000),
    ("softplay-starter", "Soft Play Starter Set", 3, 3000),
    ("obstacle-40ft", "40ft Obstacle Course", 1, 12000),
    ("extras-ballpit", "Ball Pit & 500 Balls", 2, 2000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./bouncehire.db".to_string());
    tracing::info!(path = %db_path, "Seeding inventory");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let inventory = db.inventory();

    let mut created = 0usize;
    for (product_id, name, unit_count, fee) in FLEET {
        for n in 0..*unit_count {
            let now = Utc::now();
            let unit = InventoryUnit {
                id: Uuid::new_v4().to_string(),
                product_id: (*product_id).to_string(),
                warehouse: "Main Warehouse".to_string(),
                vendor: "Acme Inflatables".to_string(),
                quantity: 1,
                rental_fee_pence: *fee,
                status: UnitStatus::Available,
                booked_dates: vec![],
                created_at: now,
                updated_at: now,
            };
            inventory.insert_unit(&unit).await?;
            created += 1;
            tracing::debug!(product = name, unit = n + 1, "Unit created");
        }
    }

    tracing::info!(units = created, products = FLEET.len(), "Seed complete");
    db.close().await;
    Ok(())
}

/// Reads `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
