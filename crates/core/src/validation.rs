//! Shared input validation helpers.
//!
//! Reusable checks applied at the pricing entry points before any
//! arithmetic runs. Each returns a `CoreError::Validation` naming the
//! offending field so the form layer can surface it directly.

use crate::error::CoreError;

/// Validate that an order quantity is a positive unit count.
///
/// Zero and negative quantities are rejected outright, never clamped.
pub fn validate_quantity(quantity: i64) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation(format!(
            "quantity must be a positive number of units, got {quantity}"
        )));
    }
    Ok(())
}

/// Validate that a dollar rate is a finite, non-negative number.
pub fn validate_rate(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must not be negative, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a negotiated price is a finite number.
///
/// A negotiated price below cost is allowed here; the calculator flags it
/// as a loss rather than rejecting it.
pub fn validate_price(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}
