//! # Domain Types
//!
//! Core domain types used throughout the Tally intent bridge.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InventoryItem  │   │      Sale       │   │ PaymentReceipt  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  sale_number    │◄──│  receipt_number │       │
//! │  │  name           │   │  customer_name  │   │  sale_id?       │       │
//! │  │  current_stock  │   │  total_cents    │   │  notes → sale # │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │           ▲                     │                                       │
//! │           │            ┌────────▼────────┐   ┌─────────────────┐       │
//! │           └────────────│    SaleItem     │   │SalesTransaction │       │
//! │        (nullable link) │  description    │   │  (projection)   │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Expense   Employee   AttendanceRecord   Task   Membership             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for relations
//! - Business ID where one exists (`sale_number`, `receipt_number`)
//!
//! Every entity carries `tenant_id`; no row exists outside a tenant.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

/// Generates a new entity id (UUID v4, hyphenated).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Membership
// =============================================================================

/// A user's membership in a business (tenant).
///
/// The `role` column is kept as the raw string from the store; unknown
/// roles parse to no permissions at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub tenant_id: String,
    pub user_id: String,
    pub role: String,
    pub is_active: bool,
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub sku: Option<String>,
    /// Never negative; decremented only through an atomic reservation.
    pub current_stock: i64,
    pub reorder_level: i64,
    pub unit_price_cents: i64,
    /// Liters per unit for liquid products, used for the liters-sold figure.
    pub liters_per_unit: Option<f64>,
}

impl InventoryItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// At or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.reorder_level
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a customer paid. Free-text synonyms resolve through
/// [`crate::lookup::payment_method_from_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Mobile Money")]
    MobileMoney,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    Card,
    Cheque,
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::MobileMoney,
        PaymentMethod::BankTransfer,
        PaymentMethod::Card,
        PaymentMethod::Cheque,
        PaymentMethod::Credit,
    ];

    /// Label stored in the database and shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Credit => "Credit",
        }
    }

    /// Inverse of [`PaymentMethod::as_str`]. Stored rows with an unexpected
    /// label read back as `Cash`.
    pub fn from_label(label: &str) -> PaymentMethod {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(PaymentMethod::Cash)
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Sale header. Exists for every recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub sale_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
///
/// `inventory_item_id` is `None` for service sales (no matching product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub tenant_id: String,
    pub sale_id: String,
    pub inventory_item_id: Option<String>,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// Receipt issued for a sale. `notes` carries the sale number back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub id: String,
    pub tenant_id: String,
    pub receipt_number: String,
    pub sale_id: Option<String>,
    pub amount_paid_cents: i64,
    pub payment_method: PaymentMethod,
    pub client_name: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Denormalized analytics row written after each sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTransaction {
    pub id: String,
    pub tenant_id: String,
    pub sale_id: String,
    pub sale_number: String,
    pub receipt_number: String,
    pub product_name: String,
    pub inventory_item_id: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub liters_sold: Option<f64>,
    pub recorded_by: String,
    pub transaction_date: DateTime<Utc>,
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Rent,
    Utilities,
    Salaries,
    Transport,
    Supplies,
    Maintenance,
    Marketing,
    Inventory,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 9] = [
        ExpenseCategory::Rent,
        ExpenseCategory::Utilities,
        ExpenseCategory::Salaries,
        ExpenseCategory::Transport,
        ExpenseCategory::Supplies,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Marketing,
        ExpenseCategory::Inventory,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Supplies => "Supplies",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Inventory => "Inventory",
            ExpenseCategory::Other => "Other",
        }
    }

    /// Exact (case-insensitive) category name; `None` otherwise.
    pub fn parse(name: &str) -> Option<ExpenseCategory> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub tenant_id: String,
    pub category: ExpenseCategory,
    pub amount_cents: i64,
    pub vendor_name: Option<String>,
    pub description: String,
    pub date_incurred: NaiveDate,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Staff
// =============================================================================

/// An employee. `user_id` links the roster entry to a login, when one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub tenant_id: String,
    pub user_id: Option<String>,
    pub full_name: String,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// One shift. Open while `clock_out` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub tenant_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub hours_worked: Option<f64>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Hours between clock-in and `at`, rounded to two decimals.
    pub fn hours_until(&self, at: DateTime<Utc>) -> f64 {
        let minutes = (at - self.clock_in).num_minutes().max(0) as f64;
        (minutes / 60.0 * 100.0).round() / 100.0
    }
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Unknown stored values read back as `Pending`.
    pub fn from_label(label: &str) -> TaskStatus {
        match label {
            "in_progress" => TaskStatus::InProgress,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Employee id of the assignee.
    pub assigned_to: Option<String>,
    pub assignee_name: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payment_method_labels_round_trip() {
        for m in PaymentMethod::ALL {
            assert_eq!(PaymentMethod::from_label(m.as_str()), m);
        }
        assert_eq!(PaymentMethod::from_label("bitcoin"), PaymentMethod::Cash);
    }

    #[test]
    fn test_payment_method_serializes_as_label() {
        let json = serde_json::to_string(&PaymentMethod::MobileMoney).unwrap();
        assert_eq!(json, "\"Mobile Money\"");
    }

    #[test]
    fn test_expense_category_parse() {
        assert_eq!(ExpenseCategory::parse("rent"), Some(ExpenseCategory::Rent));
        assert_eq!(ExpenseCategory::parse(" Utilities "), Some(ExpenseCategory::Utilities));
        assert_eq!(ExpenseCategory::parse("snacks"), None);
    }

    #[test]
    fn test_low_stock_flag() {
        let mut item = InventoryItem {
            id: new_id(),
            tenant_id: "t1".into(),
            name: "Cement (50kg bag)".into(),
            sku: None,
            current_stock: 5,
            reorder_level: 5,
            unit_price_cents: 75_000,
            liters_per_unit: None,
        };
        assert!(item.is_low_stock());
        item.current_stock = 6;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_attendance_hours() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let record = AttendanceRecord {
            id: new_id(),
            tenant_id: "t1".into(),
            employee_id: "e1".into(),
            employee_name: "Amina".into(),
            clock_in: start,
            clock_out: None,
            hours_worked: None,
        };
        assert!(record.is_open());
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 16, 30, 0).unwrap();
        assert_eq!(record.hours_until(end), 8.5);
    }

    #[test]
    fn test_task_status_labels() {
        assert_eq!(TaskStatus::from_label("in_progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_label("done?"), TaskStatus::Pending);
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }
}
