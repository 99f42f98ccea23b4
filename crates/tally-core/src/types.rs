//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TableRow     │──►│      Table      │◄──│      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  as stored      │   │  id (UUID)      │   │  table_id (ref) │       │
//! │  │  times as text  │   │  kind           │   │  sale_total     │       │
//! │  │                 │   │  open/close     │   │  is_paid        │       │
//! │  └─────────────────┘   │  totals (Money) │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐                                                   │
//! │  │   TableKind     │  Hourly | Instant | Regular                       │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Raw vs Typed
//! The store keeps timestamps and recorded sale amounts as text, exactly as
//! the till wrote them. `TableRow` and `SaleRow` mirror that shape; converting
//! them into a `Table` or `Sale` parses leniently, so one corrupt field never
//! blocks a table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::clock::parse_timestamp;
use crate::money::Money;
use crate::policy::KindPolicy;

// =============================================================================
// Table Kind
// =============================================================================

/// How a table is billed. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Billed by elapsed session time × hourly rate.
    Hourly,
    /// Billed by a single flat sale; no running session.
    Instant,
    /// Billed by an open tab of item sales.
    Regular,
}

impl TableKind {
    /// Returns the billing/occupancy rules for this kind.
    #[inline]
    pub const fn policy(self) -> KindPolicy {
        KindPolicy::for_kind(self)
    }

    /// Lowercase name, as stored.
    pub const fn as_str(self) -> &'static str {
        match self {
            TableKind::Hourly => "hourly",
            TableKind::Instant => "instant",
            TableKind::Regular => "regular",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TableKind {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(TableKind::Hourly),
            "instant" => Ok(TableKind::Instant),
            "regular" => Ok(TableKind::Regular),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec![
                    "hourly".to_string(),
                    "instant".to_string(),
                    "regular".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// A billable unit (seat, station, room) with its last computed totals.
///
/// Values of this type are snapshots: every reconciliation returns a new one
/// and nothing in the core holds on to it between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Table {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Label shown to staff ("Pool 3", "Bar 12").
    pub name: String,

    /// Billing kind; never changes after creation.
    pub kind: TableKind,

    /// Occupancy flag.
    pub is_active: bool,

    /// When the current billing session started.
    #[ts(as = "Option<String>")]
    pub open_time: Option<DateTime<Utc>>,

    /// When the billing session ended (hourly tables).
    #[ts(as = "Option<String>")]
    pub close_time: Option<DateTime<Utc>>,

    /// Charge per hour (hourly tables only).
    pub hourly_rate: Option<Money>,

    /// Last computed time charge; frozen once `close_time` is set.
    pub hourly_total: Money,

    /// Sum of currently unpaid sales.
    pub sales_total: Money,

    /// `hourly_total + sales_total`, recomputed on every reconciliation.
    pub check_total: Money,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Table {
    /// Creates an idle table with zero totals.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TableKind) -> Self {
        Table {
            id: id.into(),
            name: name.into(),
            kind,
            is_active: false,
            open_time: None,
            close_time: None,
            hourly_rate: None,
            hourly_total: Money::zero(),
            sales_total: Money::zero(),
            check_total: Money::zero(),
            updated_at: Utc::now(),
        }
    }

    /// Sets the hourly rate.
    pub fn with_rate(mut self, rate: Money) -> Self {
        self.hourly_rate = Some(rate);
        self
    }

    /// Marks a session as started at `at`.
    pub fn opened_at(mut self, at: DateTime<Utc>) -> Self {
        self.open_time = Some(at);
        self.close_time = None;
        self.is_active = true;
        self
    }

    /// Marks the session as ended at `at` with a frozen time charge.
    pub fn closed_at(mut self, at: DateTime<Utc>, hourly_total: Money) -> Self {
        self.close_time = Some(at);
        self.hourly_total = hourly_total;
        self
    }

    /// Sets the stored totals (as a persisted record would carry them).
    pub fn with_totals(mut self, sales_total: Money, check_total: Money) -> Self {
        self.sales_total = sales_total;
        self.check_total = check_total;
        self
    }

    /// Returns true while a session is open (started, not yet closed).
    pub fn has_open_session(&self) -> bool {
        self.open_time.is_some() && self.close_time.is_none()
    }
}

// =============================================================================
// Table Row
// =============================================================================

/// A table exactly as the store holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TableRow {
    pub id: String,
    pub name: String,
    pub kind: TableKind,
    pub is_active: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub hourly_total_cents: i64,
    pub sales_total_cents: i64,
    pub check_total_cents: i64,
    pub updated_at: Option<String>,
}

impl From<TableRow> for Table {
    fn from(row: TableRow) -> Self {
        let open_time = lenient_time(&row.id, "open_time", row.open_time.as_deref());
        let close_time = lenient_time(&row.id, "close_time", row.close_time.as_deref());
        let updated_at = required_time(&row.id, "updated_at", row.updated_at.as_deref());

        let hourly_rate = match row.hourly_rate_cents {
            Some(cents) if cents < 0 => {
                warn!(table_id = %row.id, cents, "Negative hourly rate ignored");
                None
            }
            other => other.map(Money::from_cents),
        };

        Table {
            id: row.id,
            name: row.name,
            kind: row.kind,
            is_active: row.is_active,
            open_time,
            close_time,
            hourly_rate,
            hourly_total: Money::from_cents(row.hourly_total_cents),
            sales_total: Money::from_cents(row.sales_total_cents),
            check_total: Money::from_cents(row.check_total_cents),
            updated_at,
        }
    }
}

fn lenient_time(record_id: &str, field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!(record_id = %record_id, field, raw, "Unparseable timestamp treated as absent");
    }
    parsed
}

/// Like [`lenient_time`] for columns that always carry a value: a missing or
/// corrupt one reads as the Unix epoch.
fn required_time(record_id: &str, field: &str, raw: Option<&str>) -> DateTime<Utc> {
    lenient_time(record_id, field, raw).unwrap_or_else(|| {
        warn!(record_id = %record_id, field, "Missing timestamp read as epoch");
        DateTime::<Utc>::UNIX_EPOCH
    })
}

// =============================================================================
// Sale
// =============================================================================

/// An item sale charged to a table.
///
/// The amount is kept as the till recorded it (major units, as text);
/// [`Sale::amount`] is the only way billing reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// The table this sale is charged to (reference, not ownership).
    pub table_id: String,
    /// Recorded amount in major units ("12.50").
    pub sale_total: Option<String>,
    pub is_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Creates an unpaid sale (used by tests and the seeder).
    pub fn unpaid(
        id: impl Into<String>,
        table_id: impl Into<String>,
        sale_total: impl Into<String>,
    ) -> Self {
        Sale {
            id: id.into(),
            table_id: table_id.into(),
            sale_total: Some(sale_total.into()),
            is_paid: false,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    /// Returns the sale amount, or zero when the recorded value is missing,
    /// non-numeric or negative.
    pub fn amount(&self) -> Money {
        let Some(raw) = self.sale_total.as_deref() else {
            warn!(sale_id = %self.id, "Sale has no amount, counted as zero");
            return Money::zero();
        };

        match Money::parse_major(raw) {
            Some(amount) if !amount.is_negative() => amount,
            Some(amount) => {
                warn!(sale_id = %self.id, %amount, "Negative sale amount counted as zero");
                Money::zero()
            }
            None => {
                warn!(sale_id = %self.id, raw, "Malformed sale amount counted as zero");
                Money::zero()
            }
        }
    }
}

/// A sale exactly as the store holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRow {
    pub id: String,
    pub table_id: String,
    pub sale_total: Option<String>,
    pub is_paid: bool,
    pub created_at: Option<String>,
    pub paid_at: Option<String>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        let created_at = required_time(&row.id, "created_at", row.created_at.as_deref());
        let paid_at = lenient_time(&row.id, "paid_at", row.paid_at.as_deref());

        Sale {
            id: row.id,
            table_id: row.table_id,
            sale_total: row.sale_total,
            is_paid: row.is_paid,
            created_at,
            paid_at,
        }
    }
}

// =============================================================================
// Creation Inputs
// =============================================================================

/// Input for creating a table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTable {
    pub name: String,
    pub kind: TableKind,
    /// Required for hourly tables, rejected for the others.
    pub hourly_rate: Option<Money>,
}

/// Input for charging a sale to a table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub table_id: String,
    /// Amount in major units ("12.50").
    pub sale_total: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
