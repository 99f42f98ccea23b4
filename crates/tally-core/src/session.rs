//! # Session Transitions
//!
//! The explicit open/close actions staff perform on a table. These are the
//! only way hourly and instant tables change occupancy; the reconciler never
//! flips them.
//!
//! ## Hourly Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  idle ──open(now)──► running ──close(now)──► closed ──reset──► idle    │
//! │                      open_time=now           close_time=now             │
//! │                      hourly_total accrues    hourly_total FROZEN        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function takes a `Table` by value and returns the next value; the
//! caller persists it.

use chrono::{DateTime, Utc};

use crate::billing::session_charge;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Table, TableKind};

/// Starts a billing session at `now`.
///
/// ## Errors
/// - [`CoreError::SessionNotSupported`] for instant tables
/// - [`CoreError::SessionAlreadyOpen`] if a session is running
pub fn open(table: Table, now: DateTime<Utc>) -> CoreResult<Table> {
    if table.kind == TableKind::Instant {
        return Err(CoreError::SessionNotSupported {
            table_id: table.id,
            kind: table.kind,
        });
    }
    if table.has_open_session() {
        return Err(CoreError::SessionAlreadyOpen { table_id: table.id });
    }

    let mut next = table.opened_at(now);
    next.hourly_total = Money::zero();
    next.check_total = next.sales_total;
    next.updated_at = now;
    Ok(next)
}

/// Ends the running session at `now`.
///
/// Hourly tables freeze their time charge here; from then on billing
/// returns the stored `hourly_total`. Regular tables are simply reset.
///
/// ## Errors
/// - [`CoreError::NoOpenSession`] if nothing is running
pub fn close(table: Table, now: DateTime<Utc>) -> CoreResult<Table> {
    if !table.has_open_session() {
        return Err(CoreError::NoOpenSession { table_id: table.id });
    }

    if !table.kind.policy().accrues_time {
        return Ok(reset(table, now));
    }

    let frozen = session_charge(&table, now);
    let mut next = table.closed_at(now, frozen);
    next.is_active = false;
    next.check_total = next.hourly_total + next.sales_total;
    next.updated_at = now;
    Ok(next)
}

/// Clears the session fields and marks the table idle.
///
/// Used after settlement and when applying an auto-close recommendation.
/// `sales_total` is kept: it belongs to the ledger, not the session.
pub fn reset(table: Table, now: DateTime<Utc>) -> Table {
    Table {
        is_active: false,
        open_time: None,
        close_time: None,
        hourly_total: Money::zero(),
        check_total: table.sales_total,
        updated_at: now,
        ..table
    }
}

/// Applies an auto-close recommendation: the table goes idle with its
/// session fields cleared.
///
/// ## Errors
/// - [`CoreError::AutoCloseNotAllowed`] for kinds whose policy forbids it
pub fn auto_close(table: Table, now: DateTime<Utc>) -> CoreResult<Table> {
    if !table.kind.policy().auto_closes {
        return Err(CoreError::AutoCloseNotAllowed {
            table_id: table.id,
            kind: table.kind,
        });
    }
    Ok(reset(table, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::hourly_charge_at;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()
    }

    fn pool_table() -> Table {
        Table::new("t1", "Pool 1", TableKind::Hourly).with_rate(Money::from_cents(4000))
    }

    #[test]
    fn test_open_then_close_freezes_charge() {
        let opened = open(pool_table(), t0()).unwrap();
        assert!(opened.is_active);
        assert_eq!(opened.open_time, Some(t0()));

        let closed = close(opened, t0() + Duration::minutes(90)).unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.hourly_total.cents(), 6000);
        assert_eq!(closed.check_total.cents(), 6000);

        // A day later the charge has not moved
        let much_later = t0() + Duration::days(1);
        assert_eq!(hourly_charge_at(&closed, much_later).cents(), 6000);
    }

    #[test]
    fn test_open_twice_fails() {
        let opened = open(pool_table(), t0()).unwrap();
        let err = open(opened, t0()).unwrap_err();
        assert!(matches!(err, CoreError::SessionAlreadyOpen { .. }));
    }

    #[test]
    fn test_reopen_after_close() {
        let closed = close(open(pool_table(), t0()).unwrap(), t0() + Duration::hours(1)).unwrap();
        let reopened = open(closed, t0() + Duration::hours(2)).unwrap();
        assert!(reopened.close_time.is_none());
        assert!(reopened.hourly_total.is_zero());
    }

    #[test]
    fn test_close_without_session_fails() {
        let err = close(pool_table(), t0()).unwrap_err();
        assert!(matches!(err, CoreError::NoOpenSession { .. }));
    }

    #[test]
    fn test_instant_has_no_session() {
        let table = Table::new("t3", "Arcade", TableKind::Instant);
        let err = open(table, t0()).unwrap_err();
        assert!(matches!(err, CoreError::SessionNotSupported { .. }));
    }

    #[test]
    fn test_close_regular_resets() {
        let table = Table::new("t2", "Bar 2", TableKind::Regular)
            .with_totals(Money::from_cents(500), Money::from_cents(500));
        let opened = open(table, t0()).unwrap();
        let closed = close(opened, t0() + Duration::hours(1)).unwrap();
        assert!(!closed.is_active);
        assert!(closed.open_time.is_none());
        assert_eq!(closed.sales_total.cents(), 500);
        assert_eq!(closed.check_total.cents(), 500);
    }

    #[test]
    fn test_auto_close_only_for_regular() {
        let mut bar = Table::new("t2", "Bar 2", TableKind::Regular).opened_at(t0());
        bar.is_active = true;
        let closed = auto_close(bar, t0() + Duration::hours(1)).unwrap();
        assert!(!closed.is_active);
        assert!(closed.open_time.is_none());

        let err = auto_close(pool_table(), t0()).unwrap_err();
        assert!(matches!(err, CoreError::AutoCloseNotAllowed { .. }));
    }

    #[test]
    fn test_reset_keeps_sales_total() {
        let closed = close(open(pool_table(), t0()).unwrap(), t0() + Duration::hours(1))
            .unwrap()
            .with_totals(Money::from_cents(300), Money::from_cents(4300));
        let idle = reset(closed, t0() + Duration::hours(2));
        assert!(idle.hourly_total.is_zero());
        assert_eq!(idle.check_total.cents(), 300);
        assert!(idle.close_time.is_none());
    }
}
