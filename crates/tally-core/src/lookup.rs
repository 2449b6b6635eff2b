//! Synonym and keyword tables for free-text entities.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::{ExpenseCategory, PaymentMethod};

static PAYMENT_SYNONYMS: Lazy<HashMap<&'static str, PaymentMethod>> = Lazy::new(|| {
    use PaymentMethod::*;

    [
        ("cash", Cash),
        ("money", Cash),
        ("mpesa", MobileMoney),
        ("m pesa", MobileMoney),
        ("mobile", MobileMoney),
        ("mobile money", MobileMoney),
        ("momo", MobileMoney),
        ("airtel money", MobileMoney),
        ("till", MobileMoney),
        ("paybill", MobileMoney),
        ("bank", BankTransfer),
        ("bank transfer", BankTransfer),
        ("transfer", BankTransfer),
        ("eft", BankTransfer),
        ("rtgs", BankTransfer),
        ("card", Card),
        ("credit card", Card),
        ("debit card", Card),
        ("visa", Card),
        ("mastercard", Card),
        ("pos", Card),
        ("cheque", Cheque),
        ("check", Cheque),
        ("credit", Credit),
        ("on credit", Credit),
        ("debt", Credit),
        ("deni", Credit),
        ("pay later", Credit),
    ]
    .into_iter()
    .collect()
});

/// Ordered: the first category with a matching keyword wins.
static EXPENSE_KEYWORDS: Lazy<Vec<(ExpenseCategory, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (ExpenseCategory::Rent, &["rent", "lease", "landlord"][..]),
        (
            ExpenseCategory::Utilities,
            &["electricity", "power", "water", "internet", "wifi", "utility", "utilities", "kplc", "airtime", "bill"][..],
        ),
        (ExpenseCategory::Salaries, &["salary", "salaries", "wage", "wages", "payroll", "casual", "casuals"][..]),
        (
            ExpenseCategory::Transport,
            &["transport", "fuel", "petrol", "diesel", "delivery", "fare", "taxi", "matatu", "boda", "lorry"][..],
        ),
        (ExpenseCategory::Supplies, &["supplies", "stationery", "packaging", "cleaning", "paper"][..]),
        (ExpenseCategory::Maintenance, &["repair", "repairs", "maintenance", "fix", "fixing", "servicing"][..]),
        (ExpenseCategory::Marketing, &["marketing", "advert", "advertising", "ads", "promotion", "flyers", "posters"][..]),
        (ExpenseCategory::Inventory, &["inventory", "restock", "restocking", "goods", "purchase", "purchases", "wholesale"][..]),
    ]
});

fn normalize_phrase(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a payment method phrase. `None` when nothing in the table matches;
/// callers decide the fallback.
pub fn payment_method_from_text(text: &str) -> Option<PaymentMethod> {
    let phrase = normalize_phrase(text);
    if phrase.is_empty() {
        return None;
    }
    if let Some(method) = PAYMENT_SYNONYMS.get(phrase.as_str()) {
        return Some(*method);
    }
    let compact = phrase.replace(' ', "");
    if let Some(method) = PAYMENT_SYNONYMS.get(compact.as_str()) {
        return Some(*method);
    }
    // "paid via mpesa", "by bank"
    phrase
        .split(' ')
        .find_map(|word| PAYMENT_SYNONYMS.get(word).copied())
}

/// Infers an expense category from the `category` entity and the description.
///
/// An exact category name wins, then the first keyword hit across both
/// texts, then `Other`.
pub fn infer_expense_category(category: Option<&str>, description: Option<&str>) -> ExpenseCategory {
    if let Some(exact) = category.and_then(ExpenseCategory::parse) {
        return exact;
    }

    let words: Vec<String> = [category, description]
        .into_iter()
        .flatten()
        .flat_map(|text| {
            normalize_phrase(text)
                .split(' ')
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    EXPENSE_KEYWORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map(|(category, _)| *category)
        .unwrap_or(ExpenseCategory::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_synonyms() {
        assert_eq!(payment_method_from_text("M-Pesa"), Some(PaymentMethod::MobileMoney));
        assert_eq!(payment_method_from_text("mpesa"), Some(PaymentMethod::MobileMoney));
        assert_eq!(payment_method_from_text("Bank Transfer"), Some(PaymentMethod::BankTransfer));
        assert_eq!(payment_method_from_text("paid by visa"), Some(PaymentMethod::Card));
        assert_eq!(payment_method_from_text("CASH"), Some(PaymentMethod::Cash));
        assert_eq!(payment_method_from_text("on credit"), Some(PaymentMethod::Credit));
    }

    #[test]
    fn test_unrecognized_payment_is_none() {
        assert_eq!(payment_method_from_text("barter"), None);
        assert_eq!(payment_method_from_text(""), None);
    }

    #[test]
    fn test_exact_category_wins() {
        assert_eq!(infer_expense_category(Some("Marketing"), Some("fuel for van")), ExpenseCategory::Marketing);
    }

    #[test]
    fn test_category_from_description_keywords() {
        assert_eq!(infer_expense_category(None, Some("Paid KPLC token")), ExpenseCategory::Utilities);
        assert_eq!(infer_expense_category(Some("van"), Some("diesel for deliveries")), ExpenseCategory::Transport);
        assert_eq!(infer_expense_category(Some("staff"), Some("casuals wages")), ExpenseCategory::Salaries);
    }

    #[test]
    fn test_category_fallback_other() {
        assert_eq!(infer_expense_category(None, Some("team lunch")), ExpenseCategory::Other);
        assert_eq!(infer_expense_category(None, None), ExpenseCategory::Other);
    }
}
