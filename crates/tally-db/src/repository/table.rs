//! # Table Repository
//!
//! Database operations for venue tables.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  staff actions          open_session / close_session / settle          │
//! │                         → session fields + totals                      │
//! │                                                                         │
//! │  refresher job          save_totals → totals + is_active               │
//! │                         apply_auto_close → idle regular tables         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Session transitions load the row, run the pure transition from
//! `tally_core::session`, and write the result back inside one transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::validate_new_table;
use tally_core::{session, Money, NewTable, Table, TableRow};

const SELECT_TABLE: &str = r#"
    SELECT
        id, name, kind, is_active,
        open_time, close_time,
        hourly_rate_cents, hourly_total_cents, sales_total_cents, check_total_cents,
        updated_at
    FROM venue_tables
"#;

/// Repository for table database operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Creates an idle table.
    ///
    /// ## Errors
    /// - `DbError::Validation` for an empty name or a rate that doesn't fit the kind
    pub async fn create(&self, input: &NewTable) -> DbResult<Table> {
        validate_new_table(input)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let name = input.name.trim();

        debug!(id = %id, name = %name, kind = %input.kind, "Creating table");

        sqlx::query(
            r#"
            INSERT INTO venue_tables (
                id, name, kind, is_active, hourly_rate_cents,
                hourly_total_cents, sales_total_cents, check_total_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, 0, ?4, 0, 0, 0, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(input.kind)
        .bind(input.hourly_rate.map(|rate| rate.cents()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut table = Table::new(id, name, input.kind);
        table.hourly_rate = input.hourly_rate;
        table.updated_at = now;
        Ok(table)
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        let mut conn = self.pool.acquire().await?;
        fetch_table(&mut conn, id).await
    }

    /// Lists every table, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Table>> {
        let rows: Vec<TableRow> = sqlx::query_as(&format!("{SELECT_TABLE} ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Table::from).collect())
    }

    /// Counts tables.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venue_tables")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Persists the derived fields of a reconciled table.
    ///
    /// Writes `hourly_total`, `sales_total`, `check_total` and `is_active`,
    /// and stamps `updated_at` with `now`. Session timestamps are left alone:
    /// only staff actions move those.
    pub async fn save_totals(&self, table: &Table, now: DateTime<Utc>) -> DbResult<()> {
        debug!(
            id = %table.id,
            check_total = %table.check_total,
            is_active = table.is_active,
            "Saving table totals"
        );

        let result = sqlx::query(
            r#"
            UPDATE venue_tables SET
                is_active = ?2,
                hourly_total_cents = ?3,
                sales_total_cents = ?4,
                check_total_cents = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&table.id)
        .bind(table.is_active)
        .bind(table.hourly_total.cents())
        .bind(table.sales_total.cents())
        .bind(table.check_total.cents())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", &table.id));
        }

        Ok(())
    }

    /// Starts a billing session at `now`.
    ///
    /// ## Errors
    /// - `DbError::NotFound` for an unknown id
    /// - `DbError::Core` if the table is instant or already running
    pub async fn open_session(&self, id: &str, now: DateTime<Utc>) -> DbResult<Table> {
        self.transition(id, |table| session::open(table, now).map_err(DbError::from))
            .await
    }

    /// Ends the running session at `now`, freezing the hourly charge.
    pub async fn close_session(&self, id: &str, now: DateTime<Utc>) -> DbResult<Table> {
        self.transition(id, |table| session::close(table, now).map_err(DbError::from))
            .await
    }

    /// Idles a regular table the reconciler recommended closing.
    ///
    /// ## Errors
    /// - `DbError::Core` for kinds that never auto-close
    pub async fn apply_auto_close(&self, id: &str, now: DateTime<Utc>) -> DbResult<Table> {
        let table = self
            .transition(id, |table| session::auto_close(table, now).map_err(DbError::from))
            .await?;

        info!(id = %id, name = %table.name, "Table auto-closed");
        Ok(table)
    }

    /// Takes payment for everything on the table and returns it to idle.
    ///
    /// Marks every unpaid sale as paid and resets the session in one
    /// transaction, so the table never shows as idle with sales still owed.
    pub async fn settle(&self, id: &str, now: DateTime<Utc>) -> DbResult<Table> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let table = fetch_table(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Table", id))?;

        let paid = sqlx::query(
            "UPDATE sales SET is_paid = 1, paid_at = ?2 WHERE table_id = ?1 AND is_paid = 0",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let settled = session::reset(
            Table {
                sales_total: Money::zero(),
                ..table
            },
            now,
        );
        write_state(&mut tx, &settled).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, sales_paid = paid, "Table settled");
        Ok(settled)
    }

    /// Deletes a table and, by cascade, its sales.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM venue_tables WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        Ok(())
    }

    async fn transition<F>(&self, id: &str, apply: F) -> DbResult<Table>
    where
        F: FnOnce(Table) -> DbResult<Table>,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let table = fetch_table(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Table", id))?;

        let next = apply(table)?;
        write_state(&mut tx, &next).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(id = %id, is_active = next.is_active, "Table session updated");
        Ok(next)
    }
}

async fn fetch_table(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Table>> {
    let row: Option<TableRow> = sqlx::query_as(&format!("{SELECT_TABLE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Table::from))
}

/// Writes session fields and totals.
async fn write_state(conn: &mut SqliteConnection, table: &Table) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE venue_tables SET
            is_active = ?2,
            open_time = ?3,
            close_time = ?4,
            hourly_total_cents = ?5,
            sales_total_cents = ?6,
            check_total_cents = ?7,
            updated_at = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&table.id)
    .bind(table.is_active)
    .bind(format_time(table.open_time))
    .bind(format_time(table.close_time))
    .bind(table.hourly_total.cents())
    .bind(table.sales_total.cents())
    .bind(table.check_total.cents())
    .bind(table.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Table", &table.id));
    }

    Ok(())
}

fn format_time(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// =============================================================================
// Unit Tests
// =============================================================================
