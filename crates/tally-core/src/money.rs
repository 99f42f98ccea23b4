//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A tab of 0.10 + 0.20 in floating point = 0.30000000000000004          │
//! │  Summed over a busy night, the check total drifts.                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Sales are summed as cents, time charges are computed from           │
//! │    milliseconds with one explicit rounding step.                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//! use chrono::Duration;
//!
//! let rate = Money::from_cents(4000); // 40.00 per hour
//! let charge = rate.for_duration(Duration::minutes(90));
//! assert_eq!(charge.cents(), 6000);
//!
//! // Recorded amounts arrive as text from the till
//! assert_eq!(Money::parse_major("15.5"), Some(Money::from_cents(1550)));
//! assert_eq!(Money::parse_major("n/a"), None);
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use ts_rs::TS;

/// Milliseconds in one hour, the denominator of every time charge.
const MILLIS_PER_HOUR: i128 = 3_600_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Addition saturates; domain rules reject negatives
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Table.hourly_rate ──► for_duration(elapsed) ──► Table.hourly_total     │
/// │                                                          │              │
/// │  Sale.sale_total ──► parse_major ──► Σ unpaid ──► Table.sales_total    │
/// │                                                          │              │
/// │                              hourly_total + sales_total = check_total  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses an amount written in major units ("12", "12.5", "12.50").
    ///
    /// Returns `None` for anything that is not a plain decimal number
    /// (empty text, letters, exponents, several dots). More than two
    /// fractional digits are rounded half-up to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major(" 7 "), Some(Money::from_cents(700)));
    /// assert_eq!(Money::parse_major("0.125"), Some(Money::from_cents(13)));
    /// assert_eq!(Money::parse_major("-2.5"), Some(Money::from_cents(-250)));
    /// assert_eq!(Money::parse_major("1e3"), None);
    /// assert_eq!(Money::parse_major(""), None);
    /// ```
    pub fn parse_major(text: &str) -> Option<Money> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (major_part, minor_part) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major_part.is_empty() && minor_part.is_empty() {
            return None;
        }
        if !major_part.bytes().all(|b| b.is_ascii_digit())
            || !minor_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let major: i64 = if major_part.is_empty() {
            0
        } else {
            major_part.parse().ok()?
        };

        let mut minor_digits = minor_part.bytes().map(|b| i64::from(b - b'0'));
        let tens = minor_digits.next().unwrap_or(0);
        let units = minor_digits.next().unwrap_or(0);
        let round_up = minor_digits.next().is_some_and(|d| d >= 5);

        let cents = major
            .checked_mul(100)?
            .checked_add(tens * 10 + units + i64::from(round_up))?;

        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the value as a decimal number of major units (display only).
    #[inline]
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Treats `self` as a rate per hour and charges it for `elapsed`.
    ///
    /// ## Implementation
    /// Integer math on milliseconds, rounded half-up:
    /// `(rate_cents * elapsed_ms + 1_800_000) / 3_600_000`.
    /// Negative durations charge nothing.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use chrono::Duration;
    ///
    /// let rate = Money::from_cents(5000); // 50.00 per hour
    /// assert_eq!(rate.for_duration(Duration::hours(1)).cents(), 5000);
    /// assert_eq!(rate.for_duration(Duration::minutes(-5)).cents(), 0);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Pool table #3: 40.00/h, opened 19:00
    ///      │
    ///      ▼
    /// Display refresh at 20:30 → for_duration(1h30m) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Time charge: 60.00
    /// ```
    pub fn for_duration(&self, elapsed: Duration) -> Money {
        let millis = elapsed.num_milliseconds().max(0) as i128;
        let cents = (self.0 as i128 * millis + MILLIS_PER_HOUR / 2) / MILLIS_PER_HOUR;
        Money(cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs. The view layer does its own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    /// Saturates at the `i64` bounds instead of overflowing.
    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
