//! # SQLite Ledger
//!
//! [`Database`] is the production [`TableLedger`]. Both reads go straight to
//! SQLite on every call; nothing is cached between reconciliations.

use async_trait::async_trait;
use tally_core::error::LedgerResult;
use tally_core::{Sale, Table, TableLedger};

use crate::pool::Database;

#[async_trait]
impl TableLedger for Database {
    async fn fetch_table(&self, table_id: &str) -> LedgerResult<Option<Table>> {
        Ok(self.tables().get_by_id(table_id).await?)
    }

    async fn fetch_unpaid_sales(&self, table_id: &str) -> LedgerResult<Vec<Sale>> {
        Ok(self.sales().get_unpaid_for_table(table_id).await?)
    }
}
