//! # Billing Calculator
//!
//! Pure functions that derive a table's time charge and check total.
//!
//! ## How a Check Total is Built
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HOURLY, session open        HOURLY, session closed   INSTANT/REGULAR  │
//! │  ────────────────────        ──────────────────────   ───────────────  │
//! │  rate × (now - open_time)    stored hourly_total      0                │
//! │           │                  (frozen at close)        │                │
//! │           ▼                           │               ▼                │
//! │     hourly_charge ◄───────────────────┘         hourly_charge          │
//! │           │                                           │                │
//! │           └────────────► + sales_total ◄──────────────┘                │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                          check_total                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clock is the only hidden input. Each function that reads "now" has an
//! `_at` twin taking it explicitly.

use chrono::{DateTime, Utc};

use crate::clock::parse_timestamp;
use crate::money::Money;
use crate::types::{Sale, Table};

const SECONDS_PER_HOUR: f64 = 3600.0;

// =============================================================================
// Elapsed Time
// =============================================================================

/// Hours from `start` to `now`, never negative.
///
/// Returns 0 when `start` is absent or lies after `now` (clock skew).
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use tally_core::billing::hours_elapsed;
///
/// let now = Utc::now();
/// assert!((hours_elapsed(Some(now - Duration::minutes(90)), now) - 1.5).abs() < 1e-9);
/// assert_eq!(hours_elapsed(Some(now + Duration::seconds(1)), now), 0.0);
/// assert_eq!(hours_elapsed(None, now), 0.0);
/// ```
pub fn hours_elapsed(start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    hours_between(start, Some(now))
}

/// [`hours_elapsed`] for a start time still in its stored text form.
/// Unparseable text counts as "no elapsed time".
pub fn hours_elapsed_str(start: Option<&str>, now: DateTime<Utc>) -> f64 {
    hours_elapsed(start.and_then(parse_timestamp), now)
}

/// Hours from `start` to `end`, never negative.
///
/// Used for closed sessions, where both ends are known.
pub fn hours_between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> f64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 0.0;
    };

    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0.0;
    }
    millis as f64 / 1000.0 / SECONDS_PER_HOUR
}

// =============================================================================
// Charges
// =============================================================================

/// Time charge of `table` right now. See [`hourly_charge_at`].
pub fn hourly_charge(table: &Table) -> Money {
    hourly_charge_at(table, Utc::now())
}

/// Time charge of `table` at `now`.
///
/// ## Rules
/// - Kinds that do not accrue time: 0
/// - Session closed (`close_time` set): the stored `hourly_total`, unchanged.
///   Recomputing would bill the idle time after close.
/// - Session open with `open_time` and `hourly_rate`: rate × elapsed
/// - Anything else: 0
pub fn hourly_charge_at(table: &Table, now: DateTime<Utc>) -> Money {
    if !table.kind.policy().accrues_time {
        return Money::zero();
    }

    if table.close_time.is_some() {
        return table.hourly_total;
    }

    match (table.open_time, table.hourly_rate) {
        (Some(open_time), Some(rate)) if open_time <= now => rate.for_duration(now - open_time),
        _ => Money::zero(),
    }
}

/// Charge to freeze when closing a session at `close_time`.
///
/// Zero for kinds that do not accrue time or when the session never had a
/// start time or rate.
pub fn session_charge(table: &Table, close_time: DateTime<Utc>) -> Money {
    if !table.kind.policy().accrues_time {
        return Money::zero();
    }

    match (table.open_time, table.hourly_rate) {
        (Some(open_time), Some(rate)) if open_time <= close_time => {
            rate.for_duration(close_time - open_time)
        }
        _ => Money::zero(),
    }
}

/// Check total of `table` right now. See [`check_total_at`].
pub fn check_total(table: &Table) -> Money {
    check_total_at(table, Utc::now())
}

/// `hourly_charge + sales_total`. For kinds that do not accrue time the
/// hourly charge is zero, so this is `sales_total` alone.
pub fn check_total_at(table: &Table, now: DateTime<Utc>) -> Money {
    hourly_charge_at(table, now) + table.sales_total
}

/// Sum of unpaid sale amounts.
///
/// Malformed amounts count as zero. Paid sales are skipped even if a ledger
/// hands them over.
pub fn sales_total(sales: &[Sale]) -> Money {
    sales
        .iter()
        .filter(|sale| !sale.is_paid)
        .map(Sale::amount)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
