//! # Validation Module
//!
//! Input validation for booking requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host HTTP layer                                              │
//! │  ├── Request shape, auth, JSON parsing                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Cart non-empty, dates ordered, address complete                   │
//! │  └── Runs before any reservation work, so failures cost nothing        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{BankDetails, CartSnapshot, InvoiceOptions, InvoiceType, ShippingAddress};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Limits
// =============================================================================

/// Maximum distinct lines in a single booking.
pub const MAX_CART_LINES: usize = 50;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 100 instead of 10);
/// nobody hires a hundred of the same castle.
pub const MAX_LINE_QUANTITY: i64 = 100;

// =============================================================================
// Validators
// =============================================================================

/// Validates a line quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the cart snapshot handed over at checkout.
///
/// ## Rules
/// - At least one line, at most MAX_CART_LINES
/// - Every line: positive quantity, ordered dates, non-negative rate
pub fn validate_cart(cart: &CartSnapshot) -> ValidationResult<()> {
    if cart.items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if cart.items.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    for line in &cart.items {
        validate_quantity(line.quantity)?;

        if line.end_date < line.start_date {
            return Err(ValidationError::InvalidDateRange {
                start: line.start_date.to_string(),
                end: line.end_date.to_string(),
            });
        }

        if line.rate_pence < 0 {
            return Err(ValidationError::OutOfRange {
                field: "rate".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

/// Validates that a shipping address is complete.
pub fn validate_shipping_address(address: &ShippingAddress) -> ValidationResult<()> {
    let required: &[(&str, &str)] = &[
        ("firstName", &address.first_name),
        ("lastName", &address.last_name),
        ("email", &address.email),
        ("phone", &address.phone),
        ("street", &address.street),
        ("city", &address.city),
        ("postalCode", &address.postal_code),
        ("country", &address.country),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates invoice options.
///
/// Corporate invoices must carry complete bank details; regular invoices
/// need nothing extra.
pub fn validate_invoice_options(options: &InvoiceOptions) -> ValidationResult<()> {
    if options.invoice_type != InvoiceType::Corporate {
        return Ok(());
    }

    let details = options
        .bank_details
        .as_ref()
        .ok_or_else(|| ValidationError::Required {
            field: "bankDetails".to_string(),
        })?;

    validate_bank_details(details)
}

fn validate_bank_details(details: &BankDetails) -> ValidationResult<()> {
    let required: &[(&str, &str)] = &[
        ("accountName", &details.account_name),
        ("accountNumber", &details.account_number),
        ("sortCode", &details.sort_code),
        ("bankName", &details.bank_name),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
