//! # Intents
//!
//! The closed set of operations the bridge executes.
//!
//! An intent name arrives as a string from the NLU layer. Parsing is total:
//! every string is either one of the [`Intent`] variants or an
//! [`UnknownIntent`] carrying the original name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One executable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RecordSale,
    CheckStock,
    CheckPrice,
    ListProducts,
    LowStockReport,
    SalesSummary,
    SaleDetails,
    CustomerLookup,
    RecordExpense,
    ExpenseSummary,
    BusinessOverview,
    ClockIn,
    ClockOut,
    AttendanceSummary,
    ListEmployees,
    EmployeeDetails,
    CreateTask,
    ListTasks,
    CompleteTask,
    Help,
}

/// Intent name outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("I don't know how to '{0}' yet. Say \"help\" to see what I can do.")]
pub struct UnknownIntent(pub String);

impl Intent {
    pub const ALL: [Intent; 20] = [
        Intent::RecordSale,
        Intent::CheckStock,
        Intent::CheckPrice,
        Intent::ListProducts,
        Intent::LowStockReport,
        Intent::SalesSummary,
        Intent::SaleDetails,
        Intent::CustomerLookup,
        Intent::RecordExpense,
        Intent::ExpenseSummary,
        Intent::BusinessOverview,
        Intent::ClockIn,
        Intent::ClockOut,
        Intent::AttendanceSummary,
        Intent::ListEmployees,
        Intent::EmployeeDetails,
        Intent::CreateTask,
        Intent::ListTasks,
        Intent::CompleteTask,
        Intent::Help,
    ];

    /// Wire name, e.g. `record_sale`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::RecordSale => "record_sale",
            Intent::CheckStock => "check_stock",
            Intent::CheckPrice => "check_price",
            Intent::ListProducts => "list_products",
            Intent::LowStockReport => "low_stock_report",
            Intent::SalesSummary => "sales_summary",
            Intent::SaleDetails => "sale_details",
            Intent::CustomerLookup => "customer_lookup",
            Intent::RecordExpense => "record_expense",
            Intent::ExpenseSummary => "expense_summary",
            Intent::BusinessOverview => "business_overview",
            Intent::ClockIn => "clock_in",
            Intent::ClockOut => "clock_out",
            Intent::AttendanceSummary => "attendance_summary",
            Intent::ListEmployees => "list_employees",
            Intent::EmployeeDetails => "employee_details",
            Intent::CreateTask => "create_task",
            Intent::ListTasks => "list_tasks",
            Intent::CompleteTask => "complete_task",
            Intent::Help => "help",
        }
    }

    /// One-line description used by the `help` intent.
    pub fn describe(&self) -> &'static str {
        match self {
            Intent::RecordSale => "Record a sale (e.g. \"sold 2 bags of cement for 1500\")",
            Intent::CheckStock => "Check how much of a product is in stock",
            Intent::CheckPrice => "Look up a product's price",
            Intent::ListProducts => "List products in inventory",
            Intent::LowStockReport => "Show products at or below their reorder level",
            Intent::SalesSummary => "Summarize sales for today, yesterday, this week or this month",
            Intent::SaleDetails => "Show the details of a sale",
            Intent::CustomerLookup => "Look up a customer's purchases",
            Intent::RecordExpense => "Record a business expense",
            Intent::ExpenseSummary => "Summarize expenses by category",
            Intent::BusinessOverview => "Today's sales, expenses and stock alerts at a glance",
            Intent::ClockIn => "Clock in for your shift",
            Intent::ClockOut => "Clock out of your shift",
            Intent::AttendanceSummary => "See who has clocked in today",
            Intent::ListEmployees => "List employees",
            Intent::EmployeeDetails => "Show an employee's details",
            Intent::CreateTask => "Create a task and optionally assign it",
            Intent::ListTasks => "List open tasks",
            Intent::CompleteTask => "Mark a task as completed",
            Intent::Help => "Show this list",
        }
    }

    /// Intents that write to the store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Intent::RecordSale
                | Intent::RecordExpense
                | Intent::ClockIn
                | Intent::ClockOut
                | Intent::CreateTask
                | Intent::CompleteTask
        )
    }
}

impl FromStr for Intent {
    type Err = UnknownIntent;

    /// Exact wire-name match after trimming and lowercasing.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let wanted = name.trim().to_ascii_lowercase();
        Intent::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| UnknownIntent(name.trim().to_string()))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
