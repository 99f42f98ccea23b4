//! # Validation Module
//!
//! Checks applied before a table or sale is written to the store.
//!
//! ## Validation vs Leniency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WRITE PATH (this module)            READ PATH (billing, reconcile)    │
//! │  ─────────────────────────           ──────────────────────────────    │
//! │  Reject bad input up front:          Tolerate whatever is stored:      │
//! │  • empty table name                  • malformed amount → 0            │
//! │  • negative / missing hourly rate    • bad timestamp → absent          │
//! │  • non-numeric sale amount           • never fail a reconciliation     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::validate_sale_amount;
//!
//! assert_eq!(validate_sale_amount("12.50").unwrap().cents(), 1250);
//! assert!(validate_sale_amount("twelve").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewSale, NewTable, TableKind};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted table name.
pub const MAX_TABLE_NAME_LEN: usize = 80;

/// Validates a table name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most [`MAX_TABLE_NAME_LEN`] characters
pub fn validate_table_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_TABLE_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_TABLE_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates the hourly rate against the table kind.
///
/// ## Rules
/// - Hourly tables need a rate, and it must not be negative
/// - Other kinds must not carry a rate
pub fn validate_hourly_rate(kind: TableKind, rate: Option<Money>) -> ValidationResult<()> {
    match (kind.policy().accrues_time, rate) {
        (true, None) => Err(ValidationError::Required {
            field: "hourly_rate".to_string(),
        }),
        (true, Some(rate)) if rate.is_negative() => Err(ValidationError::MustNotBeNegative {
            field: "hourly_rate".to_string(),
        }),
        (false, Some(_)) => Err(ValidationError::NotApplicable {
            field: "hourly_rate".to_string(),
            kind,
        }),
        _ => Ok(()),
    }
}

/// Validates a table creation request.
pub fn validate_new_table(input: &NewTable) -> ValidationResult<()> {
    validate_table_name(&input.name)?;
    validate_hourly_rate(input.kind, input.hourly_rate)
}

/// Parses and validates a sale amount written in major units.
///
/// ## Rules
/// - Must be a plain decimal number
/// - Must not be negative
pub fn validate_sale_amount(raw: &str) -> ValidationResult<Money> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "sale_total".to_string(),
        });
    }

    let amount = Money::parse_major(raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: "sale_total".to_string(),
        reason: format!("'{}' is not a decimal amount", raw.trim()),
    })?;

    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "sale_total".to_string(),
        });
    }

    Ok(amount)
}

/// Validates a sale creation request.
pub fn validate_new_sale(input: &NewSale) -> ValidationResult<Money> {
    if input.table_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "table_id".to_string(),
        });
    }
    validate_sale_amount(&input.sale_total)
}
