//! # Notification Seam
//!
//! Booking events are emitted to the host's notification dispatch (email,
//! admin alerts, webhooks - the engine doesn't care). Notification is
//! strictly best-effort: by the time an event fires, the booking work has
//! already committed, so a delivery failure is logged by the caller and
//! never propagated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use bouncehire_core::Booking;

/// Lifecycle events the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEvent {
    /// New booking persisted (customer confirmation + admin alert).
    BookingCreated,
    /// Status changed by an admin action.
    BookingStatusChanged,
    /// Booking cancelled by the customer, an admin, or the expiry sweep.
    BookingCancelled,
}

/// Notification delivery failure.
#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget event dispatch, implemented by the host.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: BookingEvent, booking: &Booking) -> Result<(), NotifyError>;
}

/// Default implementation: structured log lines only.
///
/// Useful in development and as a safe fallback when the host hasn't wired
/// a real dispatcher yet.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: BookingEvent, booking: &Booking) -> Result<(), NotifyError> {
        info!(
            event = ?event,
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            status = booking.status.as_str(),
            "Booking event"
        );
        Ok(())
    }
}
