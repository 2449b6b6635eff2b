//! # Entity Bags
//!
//! The NLU layer sends `entities` as a free JSON object. [`Entities`] wraps
//! it with lenient typed getters, and the request types below turn a bag
//! into the validated input of one handler.
//!
//! Getters accept what chat extraction tends to produce: numbers as strings
//! (`"5,000"`), strings as numbers (`42` for a name), and `null` for absent.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::error::ValidationError;
use crate::lookup::{infer_expense_category, payment_method_from_text};
use crate::money::Money;
use crate::sanitize::{sanitize_input, MAX_TEXT_LEN};
use crate::types::{ExpenseCategory, PaymentMethod};
use crate::validation::{
    validate_amount, validate_phone, validate_quantity, validate_required, ValidationResult,
};
use crate::WALK_IN_CUSTOMER;

/// Free-form entity object. Non-object JSON reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct Entities(Map<String, Value>);

impl From<Value> for Entities {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Entities(map),
            _ => Entities::default(),
        }
    }
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sanitized, non-empty text under `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        let raw = match self.0.get(key)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        Some(sanitize_input(&raw, MAX_TEXT_LEN)).filter(|s| !s.is_empty())
    }

    /// First present key among `keys`.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// Monetary amount under the first present key among `keys`.
    ///
    /// Absent → `Ok(None)`. Present but unparseable → `InvalidFormat`.
    pub fn amount(&self, keys: &[&str]) -> ValidationResult<Option<Money>> {
        let Some((key, value)) = keys
            .iter()
            .find_map(|k| self.0.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
        else {
            return Ok(None);
        };
        let raw = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => String::new(),
        };
        let parsed = match value {
            Value::Number(n) => money_from_number(n),
            _ => Money::parse_amount(&raw),
        };
        parsed
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: key.to_string(),
                reason: format!("'{}' is not an amount", sanitize_input(&raw, 40)),
            })
    }

    /// Whole number under `key`. `2.0` and `"2"` are accepted, `2.5` is not.
    pub fn integer(&self, key: &str) -> ValidationResult<Option<i64>> {
        let invalid = || ValidationError::InvalidFormat {
            field: key.to_string(),
            reason: "expected a whole number".to_string(),
        };
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(Some(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(Some(f as i64)),
                        _ => Err(invalid()),
                    }
                }
            }
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(None)
                } else {
                    s.parse::<i64>().map(Some).map_err(|_| invalid())
                }
            }
            Some(_) => Err(invalid()),
        }
    }

    /// ISO date (`YYYY-MM-DD`) under `key`.
    pub fn date(&self, key: &str) -> ValidationResult<Option<NaiveDate>> {
        match self.text(key) {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ValidationError::InvalidFormat {
                    field: key.to_string(),
                    reason: "expected YYYY-MM-DD".to_string(),
                }),
        }
    }
}

impl From<Map<String, Value>> for Entities {
    fn from(map: Map<String, Value>) -> Self {
        Entities(map)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Validated input of `record_sale`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRequest {
    pub product: String,
    /// Total charged for the line.
    pub amount: Money,
    pub quantity: i64,
    pub payment_method: PaymentMethod,
    /// False when the payment phrase was present but not in the synonym table.
    pub payment_recognized: bool,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl SaleRequest {
    pub fn from_entities(entities: &Entities) -> ValidationResult<SaleRequest> {
        let product = validate_required("product", entities.first_text(&["product", "product_name", "item"]))?;
        let amount = validate_amount(entities.amount(&["amount", "total", "price"])?)?;
        let quantity = validate_quantity(entities.integer("quantity")?.unwrap_or(1))?;

        let payment_text = entities.first_text(&["payment_method", "payment"]);
        let resolved = payment_text.as_deref().and_then(payment_method_from_text);
        let payment_recognized = payment_text.is_none() || resolved.is_some();

        let customer_phone = entities
            .first_text(&["customer_phone", "phone"])
            .map(|p| validate_phone(&p))
            .transpose()?;

        Ok(SaleRequest {
            product,
            amount,
            quantity,
            payment_method: resolved.unwrap_or_default(),
            payment_recognized,
            customer_name: entities
                .first_text(&["customer_name", "customer"])
                .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
            customer_phone,
            notes: entities.text("notes"),
        })
    }

    pub fn unit_price(&self) -> Money {
        self.amount.per_unit(self.quantity)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// Validated input of `record_expense`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRequest {
    pub amount: Money,
    pub category: ExpenseCategory,
    pub description: String,
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
}

impl ExpenseRequest {
    pub fn from_entities(entities: &Entities) -> ValidationResult<ExpenseRequest> {
        let amount = validate_amount(entities.amount(&["amount", "total"])?)?;
        let category_text = entities.text("category");
        let description_text = entities.first_text(&["description", "item", "notes"]);
        let category = infer_expense_category(category_text.as_deref(), description_text.as_deref());

        Ok(ExpenseRequest {
            amount,
            category,
            description: description_text
                .or(category_text)
                .unwrap_or_else(|| category.as_str().to_string()),
            vendor: entities.first_text(&["vendor", "vendor_name", "paid_to"]),
            date: entities.date("date")?,
        })
    }
}

// =============================================================================
// Task
// =============================================================================

/// Validated input of `create_task`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl TaskRequest {
    pub fn from_entities(entities: &Entities) -> ValidationResult<TaskRequest> {
        Ok(TaskRequest {
            title: validate_required("title", entities.first_text(&["title", "task"]))?,
            description: entities.text("description"),
            assignee: entities.first_text(&["assignee", "assigned_to", "employee"]),
            due_date: entities.date("due_date")?,
        })
    }
}

/// Largest whole amount accepted from a JSON number; beyond it `f64`
/// cannot hold every cent.
const MAX_NUMERIC_AMOUNT: f64 = 1e13;

/// JSON numbers may arrive in exponent form (`1e20`, `1.5e-7`), which the
/// text parser would read digit by digit.
fn money_from_number(n: &Number) -> Option<Money> {
    if let Some(whole) = n.as_i64() {
        return whole.checked_mul(100).map(Money::from_cents);
    }
    let text = n.to_string();
    if !text.contains(['e', 'E']) {
        return Money::parse_amount(&text);
    }
    let value = n.as_f64().filter(|v| v.is_finite() && v.abs() < MAX_NUMERIC_AMOUNT)?;
    Some(Money::from_cents((value * 100.0).round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Entities {
        Entities::from(value)
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(bag(json!(null)).is_empty());
        assert!(bag(json!([1, 2])).is_empty());
        let parsed: Entities = serde_json::from_value(json!("text")).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_sale_defaults() {
        let req = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": 1500}))).unwrap();
        assert_eq!(req.quantity, 1);
        assert_eq!(req.payment_method, PaymentMethod::Cash);
        assert!(req.payment_recognized);
        assert_eq!(req.customer_name, "Walk-in Customer");
        assert_eq!(req.amount, Money::from_cents(150_000));
        assert!(req.customer_phone.is_none());
    }

    #[test]
    fn test_sale_string_amount_and_synonym() {
        let req = SaleRequest::from_entities(&bag(json!({
            "product": "5 cmnt bgs",
            "amount": "KES 3,750",
            "quantity": "5",
            "payment_method": "mpesa",
            "customer_name": "Otieno",
            "customer_phone": "0712 345 678"
        })))
        .unwrap();
        assert_eq!(req.amount.cents(), 375_000);
        assert_eq!(req.quantity, 5);
        assert_eq!(req.unit_price().cents(), 75_000);
        assert_eq!(req.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(req.customer_phone.as_deref(), Some("0712345678"));
    }

    #[test]
    fn test_sale_unknown_payment_coerces_to_cash() {
        let req = SaleRequest::from_entities(&bag(json!({
            "product": "cement", "amount": 10, "payment_method": "barter"
        })))
        .unwrap();
        assert_eq!(req.payment_method, PaymentMethod::Cash);
        assert!(!req.payment_recognized);
    }

    #[test]
    fn test_sale_rejections() {
        let missing_product = SaleRequest::from_entities(&bag(json!({"amount": 10})));
        assert_eq!(
            missing_product.unwrap_err(),
            ValidationError::Required { field: "product".into() }
        );

        let zero = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": 0})));
        assert!(matches!(zero, Err(ValidationError::MustBePositive { .. })));

        let negative = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": "-5"})));
        assert!(matches!(negative, Err(ValidationError::MustBePositive { .. })));

        let words = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": "lots"})));
        assert!(matches!(words, Err(ValidationError::InvalidFormat { .. })));

        let fractional = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": 5, "quantity": 2.5})));
        assert!(matches!(fractional, Err(ValidationError::InvalidFormat { .. })));

        let too_many = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": 5, "quantity": 1000})));
        assert!(matches!(too_many, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_exponent_amounts() {
        let huge = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": 1e20})));
        assert!(matches!(huge, Err(ValidationError::InvalidFormat { .. })));

        let tiny = SaleRequest::from_entities(&bag(json!({"product": "cement", "amount": 1.5e-7})));
        assert!(matches!(tiny, Err(ValidationError::MustBePositive { .. })));

        let entities = bag(json!({"a": 1.25e3, "b": 12.5, "c": u64::MAX}));
        assert_eq!(entities.amount(&["a"]).unwrap(), Some(Money::from_cents(125_000)));
        assert_eq!(entities.amount(&["b"]).unwrap(), Some(Money::from_cents(1_250)));
        assert!(entities.amount(&["c"]).is_err());
    }

    #[test]
    fn test_expense_request() {
        let req = ExpenseRequest::from_entities(&bag(json!({
            "amount": "2,000", "description": "fuel for delivery van", "vendor": "Shell", "date": "2026-03-02"
        })))
        .unwrap();
        assert_eq!(req.category, ExpenseCategory::Transport);
        assert_eq!(req.vendor.as_deref(), Some("Shell"));
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 3, 2));
        assert_eq!(req.amount.cents(), 200_000);
    }

    #[test]
    fn test_expense_without_description_uses_category() {
        let req = ExpenseRequest::from_entities(&bag(json!({"amount": 500}))).unwrap();
        assert_eq!(req.category, ExpenseCategory::Other);
        assert_eq!(req.description, "Other");
    }

    #[test]
    fn test_expense_bad_date() {
        let res = ExpenseRequest::from_entities(&bag(json!({"amount": 500, "date": "yesterday"})));
        assert!(matches!(res, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn test_task_request() {
        let req = TaskRequest::from_entities(&bag(json!({"title": "Restock shelves", "assignee": "Amina"}))).unwrap();
        assert_eq!(req.title, "Restock shelves");
        assert_eq!(req.assignee.as_deref(), Some("Amina"));
        assert!(TaskRequest::from_entities(&bag(json!({}))).is_err());
    }
}
