//! # Validation Module
//!
//! Field validators shared by the entity parsers in [`crate::entities`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: NLU (upstream, out of process)                               │
//! │  └── Best-effort entity extraction; may be wrong or missing            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Handler entry (Rust)                                         │
//! │  ├── Entities → typed request (entities.rs)                            │
//! │  └── THIS MODULE: field rules; failure means zero store access         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                         │
//! │  ├── CHECK (current_stock >= 0)                                        │
//! │  └── UNIQUE (tenant_id, sale_number) / (tenant_id, receipt_number)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::sanitize::{sanitize_input, MAX_TEXT_LEN};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Requires a non-empty value after sanitizing.
pub fn validate_required(field: &str, value: Option<String>) -> ValidationResult<String> {
    let value = value
        .map(|v| sanitize_input(&v, MAX_TEXT_LEN))
        .filter(|v| !v.is_empty());
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

/// Validates a phone number.
///
/// Keeps digits and a leading `+`; spaces, dashes and brackets are dropped.
/// Between 7 and 15 digits are accepted.
pub fn validate_phone(raw: &str) -> ValidationResult<String> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(7..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "expected 7 to 15 digits".to_string(),
        });
    }
    if trimmed.starts_with('+') {
        Ok(format!("+{digits}"))
    } else {
        Ok(digits)
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ```text
/// "sold 5 bags of cement"
///       │
///       ▼
/// validate_quantity(5) ← THIS FUNCTION
///       │
///       ├── qty <= 0?   → "quantity must be greater than zero"
///       ├── qty > 999?  → "quantity must be between 1 and 999"
///       └── OK → product lookup
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<i64> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(qty)
}

/// Validates a monetary amount: present and strictly positive.
pub fn validate_amount(amount: Option<Money>) -> ValidationResult<Money> {
    match amount {
        None => Err(ValidationError::Required {
            field: "amount".to_string(),
        }),
        Some(m) if !m.is_positive() => Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }),
        Some(m) => Ok(m),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
