//! Validation helpers for command handler precondition checks.
//!
//! Eliminates repeated validation boilerplate across aggregate handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! use angzarr_client::validation::{require_exists, require_positive};
//!
//! fn handle_deposit(state: &PlayerState, amount: i64) -> CommandResult<EventBook> {
//!     require_exists(state.exists(), "Player does not exist")?;
//!     require_positive(amount, "amount")?;
//!     // ... rest of handler
//! }
//! ```

use crate::CommandRejectedError;

/// Require that an aggregate exists (has prior events).
pub fn require_exists(exists: bool, message: &str) -> Result<(), CommandRejectedError> {
    if !exists {
        return Err(CommandRejectedError::new(message));
    }
    Ok(())
}

/// Require that an aggregate does not exist.
pub fn require_not_exists(exists: bool, message: &str) -> Result<(), CommandRejectedError> {
    if exists {
        return Err(CommandRejectedError::new(message));
    }
    Ok(())
}

/// Require that a value is positive (greater than zero).
pub fn require_positive<T: PartialOrd + Default>(
    value: T,
    field_name: &str,
) -> Result<(), CommandRejectedError> {
    if value <= T::default() {
        return Err(CommandRejectedError::new(format!(
            "{} must be positive",
            field_name
        )));
    }
    Ok(())
}

/// Require that a value is non-negative (zero or greater).
pub fn require_non_negative<T: PartialOrd + Default>(
    value: T,
    field_name: &str,
) -> Result<(), CommandRejectedError> {
    if value < T::default() {
        return Err(CommandRejectedError::new(format!(
            "{} must be non-negative",
            field_name
        )));
    }
    Ok(())
}

/// Require that a string is not empty.
pub fn require_not_empty_str(value: &str, field_name: &str) -> Result<(), CommandRejectedError> {
    if value.is_empty() {
        return Err(CommandRejectedError::new(format!(
            "{} must not be empty",
            field_name
        )));
    }
    Ok(())
}

/// Require that a collection is not empty.
pub fn require_not_empty<T>(items: &[T], field_name: &str) -> Result<(), CommandRejectedError> {
    if items.is_empty() {
        return Err(CommandRejectedError::new(format!(
            "{} must not be empty",
            field_name
        )));
    }
    Ok(())
}

/// Require that a status matches an expected value.
pub fn require_status<T: PartialEq>(
    actual: T,
    expected: T,
    message: &str,
) -> Result<(), CommandRejectedError> {
    if actual != expected {
        return Err(CommandRejectedError::new(message));
    }
    Ok(())
}

/// Require that a status does not match a forbidden value.
pub fn require_status_not<T: PartialEq>(
    actual: T,
    forbidden: T,
    message: &str,
) -> Result<(), CommandRejectedError> {
    if actual == forbidden {
        return Err(CommandRejectedError::new(message));
    }
    Ok(())
}
