//! # Status Reconciler
//!
//! Brings a table up to date with the unpaid-sales ledger.
//!
//! ## Pipeline (one direction, per call)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caller ──► Reconciler ──► TableLedger.fetch_unpaid_sales(id)          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │          sales_total = Σ unpaid amounts (malformed → 0)                │
//! │          hourly_total = billing::hourly_charge_at(table, clock.now())  │
//! │          check_total  = hourly_total + sales_total                     │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │          occupancy (ledger-driven kinds only)                          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  caller ◄── new Table value (caller persists it)                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//! Nothing is cached between calls. The ledger may change right after the
//! sales snapshot is taken; the answer is exact for that snapshot and the
//! caller re-invokes after any mutation. Re-running from scratch always
//! converges, so there is no drift to repair.

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::billing::{hourly_charge_at, sales_total};
use crate::clock::{Clock, SystemClock};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::TableLedger;
use crate::types::{Sale, Table};

pub use crate::policy::should_auto_close;

// =============================================================================
// Reconciled
// =============================================================================

/// Outcome of reconciling one table in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciled {
    /// The updated table, or the input unchanged when `error` is set.
    pub table: Table,
    /// Number of unpaid sales in the snapshot.
    pub unpaid_sales: usize,
    /// Auto-close recommendation for the updated table.
    pub auto_close: bool,
    /// Set when the sales fetch failed.
    #[serde(skip)]
    pub error: Option<LedgerError>,
}

impl Reconciled {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Recomputes table totals and occupancy from a [`TableLedger`].
///
/// Holds no table state; share one instance freely across tasks.
#[derive(Debug, Clone)]
pub struct Reconciler<L, C = SystemClock> {
    ledger: L,
    clock: C,
}

impl<L: TableLedger> Reconciler<L> {
    /// Creates a reconciler on the system clock.
    pub fn new(ledger: L) -> Self {
        Reconciler {
            ledger,
            clock: SystemClock,
        }
    }
}

impl<L: TableLedger, C: Clock> Reconciler<L, C> {
    /// Creates a reconciler reading time from `clock`.
    pub fn with_clock(ledger: L, clock: C) -> Self {
        Reconciler { ledger, clock }
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns the clock totals are computed against.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Loads a table and returns it with fresh totals.
    ///
    /// `None` when the table does not exist. A failed fetch is logged and
    /// also yields `None`. Nothing is written anywhere.
    pub async fn get_table_with_totals(&self, table_id: &str) -> Option<Table> {
        match self.try_get_table_with_totals(table_id).await {
            Ok(table) => table,
            Err(e) => {
                warn!(table_id = %table_id, error = %e, "Could not load table totals");
                None
            }
        }
    }

    /// [`get_table_with_totals`](Self::get_table_with_totals), surfacing
    /// fetch failures.
    pub async fn try_get_table_with_totals(&self, table_id: &str) -> LedgerResult<Option<Table>> {
        let Some(table) = self.ledger.fetch_table(table_id).await? else {
            debug!(table_id = %table_id, "Table not found");
            return Ok(None);
        };

        let unpaid = self.ledger.fetch_unpaid_sales(table_id).await?;
        Ok(Some(self.with_totals(table, &unpaid)))
    }

    /// Recomputes totals for an already-loaded table and, for kinds whose
    /// occupancy follows the ledger, its `is_active` flag.
    ///
    /// When the sales fetch fails the input is returned unchanged.
    /// Does not persist anything.
    pub async fn sync_table_status(&self, table: Table) -> Table {
        let table_id = table.id.clone();
        match self.sync_with_sales(table.clone()).await {
            Ok((synced, _)) => synced,
            Err(e) => {
                warn!(table_id = %table_id, error = %e, "Status sync skipped");
                table
            }
        }
    }

    /// [`sync_table_status`](Self::sync_table_status), surfacing fetch
    /// failures.
    pub async fn try_sync_table_status(&self, table: Table) -> LedgerResult<Table> {
        self.sync_with_sales(table).await.map(|(synced, _)| synced)
    }

    /// Syncs many tables concurrently.
    ///
    /// Results come back in input order. A table whose fetch fails is
    /// returned unchanged with `error` set; the rest of the batch proceeds.
    pub async fn refresh_tables(&self, tables: Vec<Table>) -> Vec<Reconciled> {
        let jobs = tables.into_iter().map(|table| async move {
            match self.sync_with_sales(table.clone()).await {
                Ok((synced, unpaid)) => Reconciled {
                    auto_close: should_auto_close(&synced, &unpaid),
                    unpaid_sales: unpaid.len(),
                    table: synced,
                    error: None,
                },
                Err(e) => {
                    warn!(table_id = %table.id, error = %e, "Table skipped in refresh");
                    Reconciled {
                        table,
                        unpaid_sales: 0,
                        auto_close: false,
                        error: Some(e),
                    }
                }
            }
        });

        join_all(jobs).await
    }

    async fn sync_with_sales(&self, table: Table) -> LedgerResult<(Table, Vec<Sale>)> {
        let unpaid = self.ledger.fetch_unpaid_sales(&table.id).await?;
        let table = self.with_totals(table, &unpaid);
        let table = with_occupancy(table, &unpaid);
        Ok((table, unpaid))
    }

    fn with_totals(&self, table: Table, unpaid: &[Sale]) -> Table {
        let sales_total = sales_total(unpaid);
        let mut next = Table {
            sales_total,
            ..table
        };
        next.hourly_total = hourly_charge_at(&next, self.clock.now());
        next.check_total = next.hourly_total + next.sales_total;

        debug!(
            table_id = %next.id,
            kind = %next.kind,
            unpaid = unpaid.len(),
            hourly_total = %next.hourly_total,
            sales_total = %next.sales_total,
            check_total = %next.check_total,
            "Totals recomputed"
        );
        next
    }
}

fn with_occupancy(table: Table, unpaid: &[Sale]) -> Table {
    if !table.kind.policy().ledger_driven_occupancy {
        return table;
    }

    let is_active = !unpaid.is_empty() || table.check_total.is_positive();
    if is_active != table.is_active {
        debug!(table_id = %table.id, is_active, "Occupancy changed");
    }
    Table { is_active, ..table }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::ledger::memory::MemoryLedger;
    use crate::money::Money;
    use crate::types::TableKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()
    }

    fn pool_table() -> Table {
        Table::new("t1", "Pool 1", TableKind::Hourly)
            .with_rate(Money::from_cents(4000))
            .opened_at(t0())
    }

    fn bar_table() -> Table {
        Table::new("t2", "Bar 2", TableKind::Regular)
    }

    fn at(offset: Duration) -> FixedClock {
        FixedClock(t0() + offset)
    }

    #[tokio::test]
    async fn test_hourly_scenario() {
        let ledger = MemoryLedger::default().with_table(pool_table());
        ledger.add_sale(Sale::unpaid("s1", "t1", "15"));
        ledger.add_sale(Sale::unpaid("s2", "t1", "5"));

        let reconciler = Reconciler::with_clock(ledger, at(Duration::minutes(90)));
        let table = reconciler.get_table_with_totals("t1").await.unwrap();

        assert_eq!(table.hourly_total.cents(), 6000);
        assert_eq!(table.sales_total.cents(), 2000);
        assert_eq!(table.check_total.cents(), 8000);
    }

    #[tokio::test]
    async fn test_unknown_table_is_none() {
        let reconciler = Reconciler::new(MemoryLedger::default());
        assert!(reconciler.get_table_with_totals("missing").await.is_none());
        assert!(reconciler
            .try_get_table_with_totals("missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_regular_occupancy_follows_ledger() {
        let ledger = MemoryLedger::default().with_table(bar_table());
        let reconciler = Reconciler::new(ledger);

        let mut active = bar_table();
        active.is_active = true;
        let synced = reconciler.sync_table_status(active).await;
        assert!(!synced.is_active);

        reconciler.ledger().add_sale(Sale::unpaid("s1", "t2", "1"));
        let synced = reconciler.sync_table_status(synced).await;
        assert!(synced.is_active);
        assert_eq!(synced.check_total.cents(), 100);
    }

    #[tokio::test]
    async fn test_zero_valued_sale_keeps_regular_active() {
        let ledger = MemoryLedger::default().with_table(bar_table());
        ledger.add_sale(Sale::unpaid("s1", "t2", "0"));
        let reconciler = Reconciler::new(ledger);

        let synced = reconciler.sync_table_status(bar_table()).await;
        assert!(synced.is_active);
        assert!(synced.check_total.is_zero());
    }

    #[tokio::test]
    async fn test_hourly_and_instant_occupancy_untouched() {
        let idle_pool = Table::new("t1", "Pool 1", TableKind::Hourly);
        let instant = Table::new("t3", "Arcade", TableKind::Instant);
        let ledger = MemoryLedger::default()
            .with_table(idle_pool.clone())
            .with_table(instant.clone());
        ledger.add_sale(Sale::unpaid("s1", "t1", "12"));
        ledger.add_sale(Sale::unpaid("s2", "t3", "3"));
        let reconciler = Reconciler::new(ledger);

        let pool = reconciler.sync_table_status(idle_pool).await;
        assert!(!pool.is_active);
        assert_eq!(pool.check_total.cents(), 1200);

        let mut active_instant = instant;
        active_instant.is_active = true;
        let arcade = reconciler.sync_table_status(active_instant).await;
        assert!(arcade.is_active);
        assert_eq!(arcade.check_total.cents(), 300);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let ledger = MemoryLedger::default().with_table(pool_table());
        ledger.add_sale(Sale::unpaid("s1", "t1", "7.25"));
        let reconciler = Reconciler::with_clock(ledger, at(Duration::hours(2)));

        let first = reconciler.sync_table_status(pool_table()).await;
        let second = reconciler.sync_table_status(first.clone()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_both_entry_points_agree() {
        let ledger = MemoryLedger::default().with_table(pool_table());
        ledger.add_sale(Sale::unpaid("s1", "t1", "3.10"));
        ledger.add_sale(Sale::unpaid("s2", "t1", "broken"));
        let reconciler = Reconciler::with_clock(ledger, at(Duration::minutes(30)));

        let by_id = reconciler.get_table_with_totals("t1").await.unwrap();
        let by_value = reconciler.sync_table_status(pool_table()).await;

        assert_eq!(by_id.sales_total, by_value.sales_total);
        assert_eq!(by_id.hourly_total, by_value.hourly_total);
        assert_eq!(by_id.check_total, by_value.check_total);
        assert_eq!(by_id.sales_total.cents(), 310);
    }

    #[tokio::test]
    async fn test_closed_session_stays_frozen() {
        let closed = pool_table().closed_at(t0() + Duration::hours(1), Money::from_cents(4000));
        let ledger = MemoryLedger::default().with_table(closed.clone());

        for hours in [1, 6, 30] {
            let reconciler = Reconciler::with_clock(&ledger, at(Duration::hours(hours)));
            let table = reconciler.sync_table_status(closed.clone()).await;
            assert_eq!(table.hourly_total.cents(), 4000);
        }
    }

    #[tokio::test]
    async fn test_non_hourly_stored_hourly_total_is_dropped() {
        let mut table = bar_table();
        table.hourly_total = Money::from_cents(999);
        let ledger = MemoryLedger::default().with_table(table.clone());
        let reconciler = Reconciler::new(ledger);

        let synced = reconciler.sync_table_status(table).await;
        assert!(synced.hourly_total.is_zero());
        assert!(synced.check_total.is_zero());
    }

    #[tokio::test]
    async fn test_payment_is_seen_on_next_call() {
        let ledger = MemoryLedger::default().with_table(bar_table());
        ledger.add_sale(Sale::unpaid("s1", "t2", "8"));
        let reconciler = Reconciler::new(ledger);

        let before = reconciler.get_table_with_totals("t2").await.unwrap();
        assert_eq!(before.sales_total.cents(), 800);

        reconciler.ledger().pay_all("t2");
        let after = reconciler.get_table_with_totals("t2").await.unwrap();
        assert!(after.sales_total.is_zero());
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades() {
        let ledger = MemoryLedger::default().with_table(bar_table());
        ledger.fail_for("t2");
        let reconciler = Reconciler::new(ledger);

        assert!(reconciler.get_table_with_totals("t2").await.is_none());
        assert!(reconciler.try_get_table_with_totals("t2").await.is_err());

        let mut input = bar_table();
        input.is_active = true;
        let unchanged = reconciler.sync_table_status(input.clone()).await;
        assert_eq!(unchanged, input);
        assert!(reconciler.try_sync_table_status(input).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_batch_survives_one_failure() {
        let healthy = Table::new("t4", "Bar 4", TableKind::Regular);
        let ledger = MemoryLedger::default()
            .with_table(bar_table())
            .with_table(healthy.clone())
            .with_table(pool_table());
        ledger.add_sale(Sale::unpaid("s1", "t1", "4"));
        ledger.fail_for("t2");
        let reconciler = Reconciler::with_clock(ledger, at(Duration::hours(1)));

        let results = reconciler
            .refresh_tables(vec![bar_table(), healthy, pool_table()])
            .await;

        assert_eq!(results.len(), 3);
        assert!(!results[0].is_ok());
        assert_eq!(results[0].table, bar_table());

        assert!(results[1].is_ok());
        assert!(results[1].auto_close);

        assert!(results[2].is_ok());
        assert!(!results[2].auto_close);
        assert_eq!(results[2].unpaid_sales, 1);
        assert_eq!(results[2].table.check_total.cents(), 4400);
    }

    #[tokio::test]
    async fn test_oversized_sales_saturate() {
        let ledger = MemoryLedger::default()
            .with_table(bar_table())
            .with_table(pool_table());
        ledger.add_sale(Sale::unpaid("s1", "t2", "90000000000000000"));
        ledger.add_sale(Sale::unpaid("s2", "t2", "90000000000000000"));
        ledger.add_sale(Sale::unpaid("s3", "t1", "90000000000000000"));
        ledger.add_sale(Sale::unpaid("s4", "t1", "90000000000000000"));
        let reconciler = Reconciler::with_clock(ledger, at(Duration::hours(1)));

        let table = reconciler.get_table_with_totals("t2").await.unwrap();
        assert_eq!(table.sales_total, Money::from_cents(i64::MAX));
        assert_eq!(table.check_total, Money::from_cents(i64::MAX));
        assert!(table.is_active);

        let results = reconciler
            .refresh_tables(vec![bar_table(), pool_table()])
            .await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(results[1].table.check_total, Money::from_cents(i64::MAX));
    }
}
