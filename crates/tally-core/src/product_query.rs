//! # Product Query Normalizer
//!
//! Turns what a cashier typed into a bounded `LIKE` pattern.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "5 cmnt bgs"                                                           │
//! │       │ sanitize_input (≤ 100 chars, no control chars)                  │
//! │       │ lowercase, non-alphanumerics → spaces                           │
//! │       ▼                                                                 │
//! │  ["5", "cmnt", "bgs"]                                                   │
//! │       │ drop noise words and pure numbers                               │
//! │       ▼                                                                 │
//! │  ["cmnt"]                                                               │
//! │       │ expand abbreviations (one token may become several)             │
//! │       ▼                                                                 │
//! │  ["cement"]                                                             │
//! │       │ first 3 terms, escape \ % _                                     │
//! │       ▼                                                                 │
//! │  "%cement%"          matches "Cement (50kg bag)", not "Cooking Oil"     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When every token is noise the fallback pattern is the whole sanitized
//! input, escaped and wrapped in `%…%`.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::sanitize::{escape_like, sanitize_input, MAX_QUERY_LEN};

/// Terms kept in a pattern.
pub const MAX_SEARCH_TERMS: usize = 3;

/// Search limit when resolving the product of a sale.
pub const SALE_SEARCH_LIMIT: i64 = 1;

/// Search limit for stock and price lookups.
pub const LOOKUP_SEARCH_LIMIT: i64 = 10;

static NOISE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // packaging and units
        "bag", "bags", "bgs", "bg", "pc", "pcs", "piece", "pieces", "unit", "units", "pkt",
        "packet", "packets", "pack", "packs", "box", "boxes", "carton", "cartons", "ctn", "kg",
        "kgs", "g", "gm", "gms", "l", "ltr", "ltrs", "litre", "litres", "liter", "liters", "ml",
        "x", "qty",
        // filler
        "a", "an", "the", "of", "for", "and", "with", "some", "please", "pls", "sold", "sell",
        "selling", "buy", "bought", "stock", "price", "check", "how", "much", "many", "is",
        "are", "in", "we", "have", "do", "to",
    ]
    .into_iter()
    .collect()
});

static ABBREVIATIONS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let entries: [(&'static str, &'static [&'static str]); 18] = [
        ("cmnt", &["cement"]),
        ("cmt", &["cement"]),
        ("cem", &["cement"]),
        ("strw", &["lifestraw"]),
        ("lfstrw", &["lifestraw"]),
        ("ckg", &["cooking"]),
        ("cookoil", &["cooking", "oil"]),
        ("coil", &["cooking", "oil"]),
        ("wtr", &["water"]),
        ("fltr", &["filter"]),
        ("filt", &["filter"]),
        ("sgr", &["sugar"]),
        ("rce", &["rice"]),
        ("flr", &["flour"]),
        ("mlk", &["milk"]),
        ("sp", &["soap"]),
        ("blt", &["bolt"]),
        ("nls", &["nails"]),
    ];
    entries.into_iter().collect()
});

/// A normalized product search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    /// Sanitized input, original casing.
    pub raw: String,
    /// `LIKE` pattern, escaped, wrapped in `%`.
    pub pattern: String,
    /// Terms that made it into the pattern; empty when the fallback was used.
    pub search_terms: Vec<String>,
}

/// Builds a search for `raw`. `None` for empty (or all-control) input.
pub fn normalize_product_query(raw: &str) -> Option<ProductQuery> {
    let sanitized = sanitize_input(raw, MAX_QUERY_LEN);
    if sanitized.is_empty() {
        return None;
    }

    let lowered = sanitized.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut terms: Vec<String> = Vec::new();
    for token in spaced.split_whitespace() {
        if NOISE_WORDS.contains(token) || token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        match ABBREVIATIONS.get(token) {
            Some(expansion) => terms.extend(expansion.iter().map(|t| t.to_string())),
            None => terms.push(token.to_string()),
        }
    }
    terms.dedup();
    terms.truncate(MAX_SEARCH_TERMS);

    let pattern = if terms.is_empty() {
        let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("%{}%", escape_like(&collapsed))
    } else {
        let escaped: Vec<String> = terms.iter().map(|t| escape_like(t)).collect();
        format!("%{}%", escaped.join("%"))
    };

    Some(ProductQuery {
        raw: sanitized,
        pattern,
        search_terms: terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::like_matches;

    #[test]
    fn test_abbreviation_with_quantity_and_unit() {
        let q = normalize_product_query("5 cmnt bgs").unwrap();
        assert_eq!(q.search_terms, vec!["cement"]);
        assert_eq!(q.pattern, "%cement%");
        assert!(like_matches(&q.pattern, "Cement (50kg bag)"));
        assert!(!like_matches(&q.pattern, "Cooking Oil"));
    }

    #[test]
    fn test_multi_word_expansion() {
        let q = normalize_product_query("2 cookoil").unwrap();
        assert_eq!(q.pattern, "%cooking%oil%");
        assert!(like_matches(&q.pattern, "Cooking Oil 5L"));
    }

    #[test]
    fn test_keeps_first_three_terms() {
        let q = normalize_product_query("red clay roofing tiles premium").unwrap();
        assert_eq!(q.search_terms, vec!["red", "clay", "roofing"]);
        assert_eq!(q.pattern, "%red%clay%roofing%");
    }

    #[test]
    fn test_punctuation_becomes_separator() {
        let q = normalize_product_query("life-straw/family").unwrap();
        assert_eq!(q.pattern, "%life%straw%family%");
    }

    #[test]
    fn test_metacharacters_never_act_as_wildcards() {
        // % and _ split tokens, so they never reach a term
        let q = normalize_product_query("50%_off").unwrap();
        assert_eq!(q.pattern, "%off%");

        // all-noise input falls back to the escaped raw string
        let q = normalize_product_query("the %").unwrap();
        assert!(q.search_terms.is_empty());
        assert_eq!(q.pattern, "%the \\%%");
        assert!(!like_matches(&q.pattern, "the cement"));
    }

    #[test]
    fn test_fallback_for_all_noise() {
        let q = normalize_product_query("  5   bags ").unwrap();
        assert!(q.search_terms.is_empty());
        assert_eq!(q.pattern, "%5 bags%");
    }

    #[test]
    fn test_empty_input_yields_no_query() {
        assert!(normalize_product_query("").is_none());
        assert!(normalize_product_query(" \u{0} ").is_none());
    }

    #[test]
    fn test_input_bounded_to_100_chars() {
        let long = format!("cement {}", "x".repeat(300));
        let q = normalize_product_query(&long).unwrap();
        assert_eq!(q.raw.chars().count(), 100);
    }
}
