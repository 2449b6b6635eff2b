//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Amounts arrive from chat as "5,000", "KES 1,250.50" or 2500.           │
//! │  They are parsed DIGIT BY DIGIT into cents, never through f64:          │
//! │                                                                         │
//! │    "1,250.50"  ──► 125050 cents                                         │
//! │    2500        ──► 250000 cents                                         │
//! │    "12.345"    ──► 1235 cents (half-up on the third decimal)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(125050);
//! assert_eq!(price.to_string(), "1,250.50");
//! assert_eq!(price.format_with("KES"), "KES 1,250.50");
//!
//! let parsed = Money::parse_amount("$1,250.50").unwrap();
//! assert_eq!(parsed, price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: net figures (sales minus expenses) can go negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: JSON payloads carry `*_cents` integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Divides a total evenly across `qty` units, rounding half up.
    ///
    /// Used when a sale gives the line total and the unit price has to be
    /// derived from it. Returns the total unchanged for `qty <= 1`.
    pub fn per_unit(&self, qty: i64) -> Money {
        if qty <= 1 {
            return *self;
        }
        let q = qty as i128;
        Money::from_cents(((self.0 as i128 * 2 + q) / (2 * q)) as i64)
    }

    /// Parses a human-typed amount into cents.
    ///
    /// ## Accepted Forms
    /// ```text
    /// "5000"          → 500000
    /// "5,000.50"      → 500050
    /// "KES 1,200"     → 120000
    /// "$ 12.345"      → 1235   (half-up on the third decimal)
    /// "-40"           → -4000  (caller decides whether negatives are allowed)
    /// ```
    ///
    /// Currency codes, symbols, thousands separators and whitespace are
    /// ignored. Returns `None` when no digits remain, more than one decimal
    /// point appears, or the value overflows.
    pub fn parse_amount(raw: &str) -> Option<Money> {
        let mut negative = false;
        let mut whole = String::new();
        let mut fraction = String::new();
        let mut seen_point = false;

        for c in raw.trim().chars() {
            match c {
                '0'..='9' if seen_point => fraction.push(c),
                '0'..='9' => whole.push(c),
                '.' if seen_point => return None,
                '.' => seen_point = true,
                '-' if whole.is_empty() && !seen_point => negative = true,
                _ => {}
            }
        }

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let digits: Vec<i64> = fraction
            .chars()
            .filter_map(|c| c.to_digit(10).map(i64::from))
            .collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).map(|d| *d >= 5).unwrap_or(false);

        let cents = whole
            .checked_mul(100)?
            .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;
        Some(Money(if negative { -cents } else { cents }))
    }

    /// Formats with a currency symbol or code.
    ///
    /// Alphabetic codes get a separating space (`KES 1,250.00`), symbols do
    /// not (`$1,250.00`). Negative values put the sign first.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = Money(self.0.abs());
        if symbol.is_empty() {
            format!("{sign}{magnitude}")
        } else if symbol.chars().last().map(char::is_alphabetic).unwrap_or(false) {
            format!("{sign}{symbol} {magnitude}")
        } else {
            format!("{sign}{symbol}{magnitude}")
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with thousands separators and two decimals,
/// without a currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.major().abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "{}{}.{:02}", sign, grouped, self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(125_050).to_string(), "1,250.50");
        assert_eq!(Money::from_cents(100_000_000).to_string(), "1,000,000.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_format_with_symbol() {
        let m = Money::from_cents(250_000);
        assert_eq!(m.format_with("KES"), "KES 2,500.00");
        assert_eq!(m.format_with("$"), "$2,500.00");
        assert_eq!(m.format_with(""), "2,500.00");
        assert_eq!(Money::from_cents(-100).format_with("$"), "-$1.00");
    }

    #[test]
    fn test_parse_amount_plain_and_grouped() {
        assert_eq!(Money::parse_amount("5000"), Some(Money::from_cents(500_000)));
        assert_eq!(Money::parse_amount("5,000.50"), Some(Money::from_cents(500_050)));
        assert_eq!(Money::parse_amount("KES 1,200"), Some(Money::from_cents(120_000)));
        assert_eq!(Money::parse_amount("$12.5"), Some(Money::from_cents(1250)));
        assert_eq!(Money::parse_amount(".75"), Some(Money::from_cents(75)));
    }

    #[test]
    fn test_parse_amount_rounds_third_decimal() {
        assert_eq!(Money::parse_amount("12.345"), Some(Money::from_cents(1235)));
        assert_eq!(Money::parse_amount("12.344"), Some(Money::from_cents(1234)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(Money::parse_amount(""), None);
        assert_eq!(Money::parse_amount("abc"), None);
        assert_eq!(Money::parse_amount("1.2.3"), None);
        assert_eq!(Money::parse_amount("99999999999999999999"), None);
    }

    #[test]
    fn test_parse_amount_keeps_sign() {
        assert_eq!(Money::parse_amount("-40"), Some(Money::from_cents(-4000)));
        assert_eq!(Money::parse_amount("0"), Some(Money::zero()));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_per_unit_rounds_half_up() {
        assert_eq!(Money::from_cents(1000).per_unit(3).cents(), 333);
        assert_eq!(Money::from_cents(1001).per_unit(2).cents(), 501);
        assert_eq!(Money::from_cents(700).per_unit(1).cents(), 700);
        assert_eq!(Money::from_cents(700).per_unit(0).cents(), 700);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert!(!negative.is_positive());
    }
}
