//! Engine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The fee free-windows and the pending timeout are deliberately
//! configuration rather than constants: sites run different van schedules
//! and different checkout funnels.

use std::env;
use std::time::Duration;

use bouncehire_core::{FeeSchedule, TaxRate, TimeSlot};

/// Booking engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a pending booking may sit unconfirmed before the sweeper
    /// reclaims its inventory.
    pub pending_timeout: Duration,

    /// How often the sweeper runs. Should be a fraction of the pending
    /// timeout so reclaimed stock doesn't go stale.
    pub sweep_interval: Duration,

    /// VAT rate in basis points (2000 = 20%).
    pub tax_rate_bps: u32,

    /// Delivery/collection fee schedule.
    pub fees: FeeSchedule,
}

impl EngineConfig {
    /// Returns the VAT rate.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Load configuration from environment variables.
    ///
    /// ## Variables
    /// - `BOUNCEHIRE_PENDING_TIMEOUT_MINS` (default 30)
    /// - `BOUNCEHIRE_SWEEP_INTERVAL_SECS` (default 300)
    /// - `BOUNCEHIRE_TAX_RATE_BPS` (default 2000)
    /// - `BOUNCEHIRE_DELIVERY_FREE_START_HOUR` / `_END_HOUR` (default 8 / 12)
    /// - `BOUNCEHIRE_DELIVERY_SURCHARGE_PENCE` (default 1000)
    /// - `BOUNCEHIRE_COLLECTION_FREE_START_HOUR` / `_END_HOUR` (default 8 / 17)
    /// - `BOUNCEHIRE_COLLECTION_SURCHARGE_PENCE` (default 1000)
    /// - `BOUNCEHIRE_OVERNIGHT_FEE_PENCE` (default 3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();
        let default_fees = &defaults.fees;

        Ok(EngineConfig {
            pending_timeout: Duration::from_secs(
                60 * env_parse("BOUNCEHIRE_PENDING_TIMEOUT_MINS", 30u64)?,
            ),
            sweep_interval: Duration::from_secs(env_parse(
                "BOUNCEHIRE_SWEEP_INTERVAL_SECS",
                300u64,
            )?),
            tax_rate_bps: env_parse("BOUNCEHIRE_TAX_RATE_BPS", defaults.tax_rate_bps)?,
            fees: FeeSchedule {
                delivery_free_window: TimeSlot::new(
                    env_parse(
                        "BOUNCEHIRE_DELIVERY_FREE_START_HOUR",
                        default_fees.delivery_free_window.start_hour,
                    )?,
                    env_parse(
                        "BOUNCEHIRE_DELIVERY_FREE_END_HOUR",
                        default_fees.delivery_free_window.end_hour,
                    )?,
                ),
                delivery_surcharge_pence: env_parse(
                    "BOUNCEHIRE_DELIVERY_SURCHARGE_PENCE",
                    default_fees.delivery_surcharge_pence,
                )?,
                collection_free_window: TimeSlot::new(
                    env_parse(
                        "BOUNCEHIRE_COLLECTION_FREE_START_HOUR",
                        default_fees.collection_free_window.start_hour,
                    )?,
                    env_parse(
                        "BOUNCEHIRE_COLLECTION_FREE_END_HOUR",
                        default_fees.collection_free_window.end_hour,
                    )?,
                ),
                collection_surcharge_pence: env_parse(
                    "BOUNCEHIRE_COLLECTION_SURCHARGE_PENCE",
                    default_fees.collection_surcharge_pence,
                )?,
                overnight_fee_pence: env_parse(
                    "BOUNCEHIRE_OVERNIGHT_FEE_PENCE",
                    default_fees.overnight_fee_pence,
                )?,
            },
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            pending_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(300),
            tax_rate_bps: 2000,
            fees: FeeSchedule::default(),
        }
    }
}

/// Parses an env var, falling back to `default` when unset.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
