//! # Refresh Pass
//!
//! One pass over every table: reconcile, persist, optionally auto-close.
//! A table that fails is counted and skipped; the pass carries on.

use tally_core::{Clock, Reconciler, TableLedger};
use tally_db::Database;
use tracing::{debug, info, warn};

use crate::error::RefresherResult;

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Tables whose totals were recomputed and saved.
    pub refreshed: usize,
    /// Tables skipped because a read or write failed.
    pub failed: usize,
    /// Regular tables idled by auto-close.
    pub closed: usize,
}

/// Runs a single refresh pass.
///
/// Listing the tables is the only failure that aborts the pass.
/// `auto_close` idles regular tables that the reconciler recommends closing
/// and that still have a session recorded.
pub async fn run_once<L, C>(
    db: &Database,
    reconciler: &Reconciler<L, C>,
    auto_close: bool,
) -> RefresherResult<RefreshReport>
where
    L: TableLedger,
    C: Clock,
{
    let tables = db.tables().list().await?;
    debug!(count = tables.len(), "Refreshing tables");

    let mut report = RefreshReport::default();

    for result in reconciler.refresh_tables(tables).await {
        if !result.is_ok() {
            report.failed += 1;
            continue;
        }

        let now = reconciler.clock().now();
        let table = result.table;

        if let Err(e) = db.tables().save_totals(&table, now).await {
            warn!(table_id = %table.id, error = %e, "Could not save table totals");
            report.failed += 1;
            continue;
        }
        report.refreshed += 1;

        if auto_close && result.auto_close && table.has_open_session() {
            match db.tables().apply_auto_close(&table.id, now).await {
                Ok(_) => report.closed += 1,
                Err(e) => {
                    warn!(table_id = %table.id, error = %e, "Auto-close failed");
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        refreshed = report.refreshed,
        failed = report.failed,
        closed = report.closed,
        "Refresh pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tally_core::error::LedgerResult;
    use tally_core::{FixedClock, LedgerError, Money, NewSale, NewTable, Sale, Table, TableKind};
    use tally_db::DbConfig;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn create(db: &Database, name: &str, kind: TableKind, rate: Option<i64>) -> Table {
        db.tables()
            .create(&NewTable {
                name: name.to_string(),
                kind,
                hourly_rate: rate.map(Money::from_cents),
            })
            .await
            .unwrap()
    }

    async fn charge(db: &Database, table_id: &str, amount: &str) {
        db.sales()
            .add_sale(&NewSale {
                table_id: table_id.to_string(),
                sale_total: amount.to_string(),
            })
            .await
            .unwrap();
    }

    /// Delegates to SQLite but fails sales reads for one table.
    struct FlakyLedger {
        inner: Database,
        broken: String,
    }

    #[async_trait]
    impl TableLedger for FlakyLedger {
        async fn fetch_table(&self, table_id: &str) -> LedgerResult<Option<Table>> {
            self.inner.fetch_table(table_id).await
        }

        async fn fetch_unpaid_sales(&self, table_id: &str) -> LedgerResult<Vec<Sale>> {
            if table_id == self.broken {
                return Err(LedgerError::Unavailable("disk on fire".to_string()));
            }
            self.inner.fetch_unpaid_sales(table_id).await
        }
    }

    #[tokio::test]
    async fn test_pass_persists_totals() {
        let db = db().await;
        let pool = create(&db, "Pool 1", TableKind::Hourly, Some(4000)).await;
        db.tables().open_session(&pool.id, t0()).await.unwrap();
        charge(&db, &pool.id, "12").await;
        charge(&db, &pool.id, "8.00").await;

        let reconciler = Reconciler::with_clock(db.clone(), FixedClock(t0() + Duration::minutes(90)));
        let report = run_once(&db, &reconciler, true).await.unwrap();
        assert_eq!(
            report,
            RefreshReport {
                refreshed: 1,
                failed: 0,
                closed: 0
            }
        );

        let stored = db.tables().get_by_id(&pool.id).await.unwrap().unwrap();
        assert_eq!(stored.hourly_total.cents(), 6000);
        assert_eq!(stored.sales_total.cents(), 2000);
        assert_eq!(stored.check_total.cents(), 8000);
        assert!(stored.is_active);
        assert_eq!(stored.updated_at, t0() + Duration::minutes(90));
    }

    #[tokio::test]
    async fn test_idle_regular_table_is_auto_closed() {
        let db = db().await;
        let bar = create(&db, "Bar 2", TableKind::Regular, None).await;
        db.tables().open_session(&bar.id, t0()).await.unwrap();

        let reconciler = Reconciler::with_clock(db.clone(), FixedClock(t0() + Duration::hours(1)));
        let report = run_once(&db, &reconciler, true).await.unwrap();
        assert_eq!(report.closed, 1);

        let stored = db.tables().get_by_id(&bar.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(stored.open_time.is_none());

        // Nothing left to close on the next pass
        let report = run_once(&db, &reconciler, true).await.unwrap();
        assert_eq!(report.closed, 0);
    }

    #[tokio::test]
    async fn test_auto_close_disabled() {
        let db = db().await;
        let bar = create(&db, "Bar 2", TableKind::Regular, None).await;
        db.tables().open_session(&bar.id, t0()).await.unwrap();

        let reconciler = Reconciler::with_clock(db.clone(), FixedClock(t0()));
        let report = run_once(&db, &reconciler, false).await.unwrap();
        assert_eq!(report.closed, 0);

        let stored = db.tables().get_by_id(&bar.id).await.unwrap().unwrap();
        assert_eq!(stored.open_time, Some(t0()));
    }

    #[tokio::test]
    async fn test_regular_table_with_sales_stays_open() {
        let db = db().await;
        let bar = create(&db, "Bar 1", TableKind::Regular, None).await;
        db.tables().open_session(&bar.id, t0()).await.unwrap();
        charge(&db, &bar.id, "6.50").await;

        let reconciler = Reconciler::with_clock(db.clone(), FixedClock(t0()));
        let report = run_once(&db, &reconciler, true).await.unwrap();
        assert_eq!(report.closed, 0);

        let stored = db.tables().get_by_id(&bar.id).await.unwrap().unwrap();
        assert!(stored.is_active);
        assert_eq!(stored.check_total.cents(), 650);
    }

    #[tokio::test]
    async fn test_failed_table_does_not_stop_pass() {
        let db = db().await;
        let broken = create(&db, "Arcade", TableKind::Instant, None).await;
        let bar = create(&db, "Bar 1", TableKind::Regular, None).await;
        charge(&db, &bar.id, "3").await;

        let ledger = FlakyLedger {
            inner: db.clone(),
            broken: broken.id.clone(),
        };
        let reconciler = Reconciler::with_clock(ledger, FixedClock(t0()));
        let report = run_once(&db, &reconciler, true).await.unwrap();

        assert_eq!(report.refreshed, 1);
        assert_eq!(report.failed, 1);

        let stored = db.tables().get_by_id(&bar.id).await.unwrap().unwrap();
        assert_eq!(stored.check_total.cents(), 300);
    }

    #[tokio::test]
    async fn test_closed_database_aborts_pass() {
        let db = db().await;
        let reconciler = Reconciler::new(db.clone());
        db.close().await;

        assert!(run_once(&db, &reconciler, true).await.is_err());
    }
}
