//! # tally-core: Table Billing & Reconciliation Logic
//!
//! This crate computes what a venue table owes and whether it is occupied.
//! It contains no I/O: the ledger it reads from is a trait, implemented by
//! tally-db for SQLite and by fakes in tests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Callers (view layer, apps/refresher sync job)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  billing  │  │ reconcile │  │  policy   │  │  session  │  │   │
//! │  │   │  charges  │  │ Reconciler│  │ per-kind  │  │ open/close│  │   │
//! │  │   └───────────┘  └─────┬─────┘  └───────────┘  └───────────┘  │   │
//! │  │                        │ TableLedger (trait)                    │   │
//! │  └────────────────────────┼────────────────────────────────────────┘   │
//! │                           │                                             │
//! │  ┌────────────────────────▼────────────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Table, TableKind, Sale
//! - [`money`] - Money type with integer arithmetic
//! - [`clock`] - Injectable clock and timestamp parsing
//! - [`billing`] - Billing calculator (pure)
//! - [`policy`] - Per-kind rules and the auto-close decision
//! - [`session`] - Open/close transitions
//! - [`ledger`] - Data-access contract
//! - [`reconcile`] - Status reconciler
//! - [`validation`] - Write-path input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use tally_core::billing::{check_total_at, hourly_charge_at};
//! use tally_core::{Money, Table, TableKind};
//!
//! let now = Utc::now();
//! let table = Table::new("t1", "Pool 1", TableKind::Hourly)
//!     .with_rate(Money::from_cents(4000))
//!     .opened_at(now - Duration::minutes(90))
//!     .with_totals(Money::from_cents(2000), Money::zero());
//!
//! assert_eq!(hourly_charge_at(&table, now).cents(), 6000);
//! assert_eq!(check_total_at(&table, now).cents(), 8000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod money;
pub mod policy;
pub mod reconcile;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, LedgerError, ValidationError};
pub use ledger::TableLedger;
pub use money::Money;
pub use policy::{should_auto_close, KindPolicy};
pub use reconcile::{Reconciled, Reconciler};
pub use types::*;
