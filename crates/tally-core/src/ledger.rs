//! # Ledger Contract
//!
//! The two reads the reconciler needs from the outside world. tally-db
//! implements this for SQLite; tests use an in-memory fake.
//!
//! ## Contract
//! - `fetch_table` returns `Ok(None)` for an unknown id, never an error.
//! - `fetch_unpaid_sales` returns every unpaid sale of the table exactly
//!   once, in any order.
//! - Neither call caches: each invocation reflects the store at that moment.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::types::{Sale, Table};

/// Read access to table records and their unpaid sales.
#[async_trait]
pub trait TableLedger: Send + Sync {
    /// Loads a table by id.
    async fn fetch_table(&self, table_id: &str) -> LedgerResult<Option<Table>>;

    /// Loads the unpaid sales charged to a table.
    async fn fetch_unpaid_sales(&self, table_id: &str) -> LedgerResult<Vec<Sale>>;
}

#[async_trait]
impl<L: TableLedger + ?Sized> TableLedger for std::sync::Arc<L> {
    async fn fetch_table(&self, table_id: &str) -> LedgerResult<Option<Table>> {
        (**self).fetch_table(table_id).await
    }

    async fn fetch_unpaid_sales(&self, table_id: &str) -> LedgerResult<Vec<Sale>> {
        (**self).fetch_unpaid_sales(table_id).await
    }
}

#[async_trait]
impl<L: TableLedger + ?Sized> TableLedger for &L {
    async fn fetch_table(&self, table_id: &str) -> LedgerResult<Option<Table>> {
        (**self).fetch_table(table_id).await
    }

    async fn fetch_unpaid_sales(&self, table_id: &str) -> LedgerResult<Vec<Sale>> {
        (**self).fetch_unpaid_sales(table_id).await
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory ledger for reconciler tests.

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;
    use crate::error::LedgerError;

    #[derive(Default)]
    pub struct MemoryLedger {
        tables: Mutex<HashMap<String, Table>>,
        sales: Mutex<Vec<Sale>>,
        failing: Mutex<HashSet<String>>,
    }

    impl MemoryLedger {
        pub fn with_table(self, table: Table) -> Self {
            self.tables.lock().unwrap().insert(table.id.clone(), table);
            self
        }

        pub fn add_sale(&self, sale: Sale) {
            self.sales.lock().unwrap().push(sale);
        }

        pub fn pay_all(&self, table_id: &str) {
            for sale in self.sales.lock().unwrap().iter_mut() {
                if sale.table_id == table_id {
                    sale.is_paid = true;
                }
            }
        }

        /// Makes every fetch for `table_id` fail.
        pub fn fail_for(&self, table_id: &str) {
            self.failing.lock().unwrap().insert(table_id.to_string());
        }

        fn check(&self, table_id: &str) -> LedgerResult<()> {
            if self.failing.lock().unwrap().contains(table_id) {
                return Err(LedgerError::Unavailable(format!("injected for {table_id}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TableLedger for MemoryLedger {
        async fn fetch_table(&self, table_id: &str) -> LedgerResult<Option<Table>> {
            self.check(table_id)?;
            Ok(self.tables.lock().unwrap().get(table_id).cloned())
        }

        async fn fetch_unpaid_sales(&self, table_id: &str) -> LedgerResult<Vec<Sale>> {
            self.check(table_id)?;
            Ok(self
                .sales
                .lock()
                .unwrap()
                .iter()
                .filter(|sale| sale.table_id == table_id && !sale.is_paid)
                .cloned()
                .collect())
        }
    }
}
