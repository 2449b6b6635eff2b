//! # Document Numbers
//!
//! Formatting and parsing of `PREFIX-YYYY-NNNN` numbers.
//!
//! ```text
//!   SALE-2026-0042        RCP-2026-0007
//!   ──── ──── ────        ─── ──── ────
//!    │    │    └── value, zero-padded to 4 (grows past 9999)
//!    │    └─────── calendar year of allocation
//!    └──────────── series prefix
//! ```
//!
//! Allocation itself needs the store and lives in the application; this
//! module only holds the pure pieces.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]+)-(\d{4})-(\d+)$").expect("document number pattern is valid")
});

/// Which numbered document is being allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentSeries {
    Sale,
    Receipt,
}

impl DocumentSeries {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentSeries::Sale => "SALE",
            DocumentSeries::Receipt => "RCP",
        }
    }

    /// Counter key for a year, e.g. `SALE-2026`.
    pub fn key(&self, year: i32) -> String {
        format!("{}-{}", self.prefix(), year)
    }
}

/// A parsed or freshly allocated document number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceNumber {
    pub prefix: String,
    pub year: i32,
    pub value: u32,
}

impl SequenceNumber {
    pub fn new(series: DocumentSeries, year: i32, value: u32) -> Self {
        SequenceNumber {
            prefix: series.prefix().to_string(),
            year,
            value,
        }
    }

    pub fn parse(number: &str) -> Option<SequenceNumber> {
        let caps = NUMBER_PATTERN.captures(number.trim())?;
        Some(SequenceNumber {
            prefix: caps[1].to_string(),
            year: caps[2].parse().ok()?,
            value: caps[3].parse().ok()?,
        })
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", self.prefix, self.year, self.value)
    }
}

/// Next value by scanning recently issued numbers.
///
/// Takes the largest suffix among `recent` numbers in the same series and
/// year, then adds `1 + attempt` so each retry skips past a value that
/// just collided. Numbers from other series or years are ignored.
pub fn next_from_recent<S: AsRef<str>>(
    recent: &[S],
    series: DocumentSeries,
    year: i32,
    attempt: u32,
) -> u32 {
    let max = recent
        .iter()
        .filter_map(|n| SequenceNumber::parse(n.as_ref()))
        .filter(|n| n.prefix == series.prefix() && n.year == year)
        .map(|n| n.value)
        .max()
        .unwrap_or(0);
    max.saturating_add(1).saturating_add(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_four_digits() {
        assert_eq!(SequenceNumber::new(DocumentSeries::Sale, 2026, 1).to_string(), "SALE-2026-0001");
        assert_eq!(SequenceNumber::new(DocumentSeries::Receipt, 2026, 42).to_string(), "RCP-2026-0042");
        assert_eq!(SequenceNumber::new(DocumentSeries::Sale, 2026, 12345).to_string(), "SALE-2026-12345");
    }

    #[test]
    fn test_parse_round_trips() {
        let n = SequenceNumber::parse("SALE-2026-0042").unwrap();
        assert_eq!(n, SequenceNumber::new(DocumentSeries::Sale, 2026, 42));
        assert!(SequenceNumber::parse("SALE-26-0042").is_none());
        assert!(SequenceNumber::parse("sale-2026-0042").is_none());
        assert!(SequenceNumber::parse("SALE-2026-").is_none());
    }

    #[test]
    fn test_series_key() {
        assert_eq!(DocumentSeries::Receipt.key(2026), "RCP-2026");
    }

    #[test]
    fn test_next_from_recent_takes_max_plus_one() {
        let recent = ["SALE-2026-0003", "SALE-2026-0009", "SALE-2026-0004"];
        assert_eq!(next_from_recent(&recent, DocumentSeries::Sale, 2026, 0), 10);
    }

    #[test]
    fn test_next_from_recent_adds_attempt() {
        let recent = ["SALE-2026-0009"];
        assert_eq!(next_from_recent(&recent, DocumentSeries::Sale, 2026, 2), 12);
    }

    #[test]
    fn test_next_from_recent_ignores_other_series_and_years() {
        let recent = ["RCP-2026-0050", "SALE-2025-0099", "garbage", "SALE-2026-0002"];
        assert_eq!(next_from_recent(&recent, DocumentSeries::Sale, 2026, 0), 3);
        let empty: [&str; 0] = [];
        assert_eq!(next_from_recent(&empty, DocumentSeries::Sale, 2026, 0), 1);
    }
}
