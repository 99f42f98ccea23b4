//! # Sale Repository
//!
//! Database operations for sales charged to tables.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CHARGE                                                             │
//! │     └── add_sale() → Sale { is_paid: false }                           │
//! │                                                                         │
//! │  2. PAY                                                                │
//! │     └── mark_paid() / mark_all_paid_for_table()                        │
//! │         → Sale { is_paid: true, paid_at }                              │
//! │                                                                         │
//! │  3. (OPTIONAL) VOID                                                    │
//! │     └── delete()                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `add_sale` validates the amount. `import` stores a record exactly as an
//! upstream till produced it, malformed amount included; billing counts such
//! amounts as zero.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::validate_new_sale;
use tally_core::{NewSale, Sale, SaleRow};

const SELECT_SALE: &str = "SELECT id, table_id, sale_total, is_paid, created_at, paid_at FROM sales";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Charges a validated sale to a table.
    ///
    /// The amount is normalised to two decimals before it is stored.
    ///
    /// ## Errors
    /// - `DbError::Validation` for a missing, non-numeric or negative amount
    /// - `DbError::ForeignKeyViolation` if the table doesn't exist
    pub async fn add_sale(&self, input: &NewSale) -> DbResult<Sale> {
        let amount = validate_new_sale(input)?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            table_id: input.table_id.trim().to_string(),
            sale_total: Some(amount.to_string()),
            is_paid: false,
            created_at: Utc::now(),
            paid_at: None,
        };

        debug!(id = %sale.id, table_id = %sale.table_id, amount = %amount, "Adding sale");

        self.import(&sale).await?;
        Ok(sale)
    }

    /// Inserts a sale record as-is, without validating the amount.
    pub async fn import(&self, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, table_id, sale_total, is_paid, created_at, paid_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.table_id)
        .bind(&sale.sale_total)
        .bind(sale.is_paid)
        .bind(sale.created_at)
        .bind(sale.paid_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row: Option<SaleRow> = sqlx::query_as(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Sale::from))
    }

    /// Gets the unpaid sales charged to a table, oldest first.
    pub async fn get_unpaid_for_table(&self, table_id: &str) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "{SELECT_SALE} WHERE table_id = ?1 AND is_paid = 0 ORDER BY created_at, id"
        ))
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }

    /// Gets every sale charged to a table, paid or not, oldest first.
    pub async fn get_for_table(&self, table_id: &str) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "{SELECT_SALE} WHERE table_id = ?1 ORDER BY created_at, id"
        ))
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }

    /// Marks one unpaid sale as paid.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the sale doesn't exist or is already paid
    pub async fn mark_paid(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET is_paid = 1, paid_at = ?2 WHERE id = ?1 AND is_paid = 0")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (unpaid)", id));
        }

        Ok(())
    }

    /// Marks every unpaid sale of a table as paid. Returns how many changed.
    pub async fn mark_all_paid_for_table(&self, table_id: &str, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE sales SET is_paid = 1, paid_at = ?2 WHERE table_id = ?1 AND is_paid = 0",
        )
        .bind(table_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(table_id = %table_id, paid = result.rows_affected(), "Marked sales paid");
        Ok(result.rows_affected())
    }

    /// Voids a sale.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
