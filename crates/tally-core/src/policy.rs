//! # Kind Policy
//!
//! Per-kind billing and occupancy rules, kept in one dispatch table so the
//! "hourly and instant tables never auto-close" rule lives in exactly one
//! place.
//!
//! ```text
//! ┌──────────┬──────────────┬─────────────────────────┬─────────────┐
//! │ kind     │ accrues_time │ ledger_driven_occupancy │ auto_closes │
//! ├──────────┼──────────────┼─────────────────────────┼─────────────┤
//! │ hourly   │     yes      │           no            │     no      │
//! │ instant  │     no       │           no            │     no      │
//! │ regular  │     no       │           yes           │     yes     │
//! └──────────┴──────────────┴─────────────────────────┴─────────────┘
//! ```

use crate::types::{Sale, Table, TableKind};

/// Billing and occupancy rules for one [`TableKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPolicy {
    /// Session time is charged at the hourly rate.
    pub accrues_time: bool,
    /// `is_active` follows the unpaid-sales ledger. When false, occupancy
    /// only changes through explicit open/close actions.
    pub ledger_driven_occupancy: bool,
    /// The table may be closed automatically once its balance is zero.
    pub auto_closes: bool,
}

const HOURLY: KindPolicy = KindPolicy {
    accrues_time: true,
    ledger_driven_occupancy: false,
    auto_closes: false,
};

const INSTANT: KindPolicy = KindPolicy {
    accrues_time: false,
    ledger_driven_occupancy: false,
    auto_closes: false,
};

const REGULAR: KindPolicy = KindPolicy {
    accrues_time: false,
    ledger_driven_occupancy: true,
    auto_closes: true,
};

impl KindPolicy {
    /// Looks up the rules for `kind`.
    pub const fn for_kind(kind: TableKind) -> KindPolicy {
        match kind {
            TableKind::Hourly => HOURLY,
            TableKind::Instant => INSTANT,
            TableKind::Regular => REGULAR,
        }
    }
}

/// Recommends whether `table` should be closed automatically.
///
/// Only kinds whose policy allows auto-closing are eligible. For those, all
/// of the following must hold at once:
/// - `unpaid_sales` is empty
/// - the table's `check_total` is zero
/// - the table's `sales_total` is zero
///
/// The totals are read from `table` as given, not recomputed: a check total
/// computed from a stale sales total while the ledger already changed must
/// not slip through.
///
/// This only reports a recommendation. Applying it is up to the caller.
pub fn should_auto_close(table: &Table, unpaid_sales: &[Sale]) -> bool {
    if !table.kind.policy().auto_closes {
        return false;
    }

    unpaid_sales.is_empty() && table.check_total.is_zero() && table.sales_total.is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_dispatch_table() {
        assert!(TableKind::Hourly.policy().accrues_time);
        assert!(!TableKind::Instant.policy().accrues_time);
        assert!(!TableKind::Regular.policy().accrues_time);

        assert!(TableKind::Regular.policy().ledger_driven_occupancy);
        assert!(!TableKind::Hourly.policy().ledger_driven_occupancy);
        assert!(!TableKind::Instant.policy().ledger_driven_occupancy);
    }

    #[test]
    fn test_only_regular_auto_closes() {
        assert!(TableKind::Regular.policy().auto_closes);
        assert!(!TableKind::Hourly.policy().auto_closes);
        assert!(!TableKind::Instant.policy().auto_closes);
    }

    #[test]
    fn test_regular_zero_balance_closes() {
        let table = Table::new("t2", "Bar 2", TableKind::Regular);
        assert!(should_auto_close(&table, &[]));
    }

    #[test]
    fn test_regular_with_unpaid_sale_stays_open() {
        let table = Table::new("t2", "Bar 2", TableKind::Regular)
            .with_totals(Money::from_cents(1000), Money::from_cents(1000));
        let sales = vec![Sale::unpaid("s1", "t2", "10")];
        assert!(!should_auto_close(&table, &sales));
    }

    #[test]
    fn test_hourly_and_instant_never_close() {
        for kind in [TableKind::Hourly, TableKind::Instant] {
            let table = Table::new("t", "T", kind);
            assert!(!should_auto_close(&table, &[]), "{kind} must not auto-close");
        }
    }

    #[test]
    fn test_each_condition_is_required() {
        // Ledger empty but stale totals still non-zero
        let stale_check = Table::new("t", "T", TableKind::Regular)
            .with_totals(Money::zero(), Money::from_cents(1));
        assert!(!should_auto_close(&stale_check, &[]));

        let stale_sales = Table::new("t", "T", TableKind::Regular)
            .with_totals(Money::from_cents(1), Money::zero());
        assert!(!should_auto_close(&stale_sales, &[]));

        // Totals zero but ledger already has a (zero-valued) sale
        let zero_sale = vec![Sale::unpaid("s", "t", "0")];
        let table = Table::new("t", "T", TableKind::Regular);
        assert!(!should_auto_close(&table, &zero_sale));
    }
}
