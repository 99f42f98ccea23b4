//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Session rule violations                        │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── LedgerError      - A ledger fetch failed                          │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: sqlx::Error → DbError → LedgerError → Reconciler (degrades)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What is NOT an Error Here
//! Malformed sale amounts and unparseable timestamps never surface as
//! errors. They are logged and counted as zero / "no elapsed time", so one
//! corrupt record cannot block a table's reconciliation.

use thiserror::Error;

use crate::types::TableKind;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations around table sessions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A session is already running on this table.
    ///
    /// ## When This Occurs
    /// - Staff taps "open" twice on the same pool table
    /// - Two terminals open the same table concurrently
    #[error("Table {table_id} already has an open session")]
    SessionAlreadyOpen { table_id: String },

    /// There is no running session to close.
    #[error("Table {table_id} has no open session")]
    NoOpenSession { table_id: String },

    /// The table's kind has no session lifecycle.
    ///
    /// ## When This Occurs
    /// - Trying to open an instant table (its charge is a one-shot sale)
    #[error("{kind} table {table_id} does not support sessions")]
    SessionNotSupported { table_id: String, kind: TableKind },

    /// Auto-close was requested for a kind that never auto-closes.
    #[error("{kind} table {table_id} cannot be closed automatically")]
    AutoCloseNotAllowed { table_id: String, kind: TableKind },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., non-numeric amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Field does not apply to this kind of table.
    #[error("{field} is not allowed on {kind} tables")]
    NotApplicable { field: String, kind: TableKind },
}

// =============================================================================
// Ledger Error
// =============================================================================

/// A read from the table/sales ledger failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The backing store could not answer.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for ledger reads.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================
