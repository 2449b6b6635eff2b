//! # Permission Table
//!
//! Static role → intent table, loaded once.
//!
//! ```text
//! ┌──────────┬──────────────────────────────────────────────────────────────┐
//! │ admin    │ every intent (listed out)                                    │
//! │ manager  │ every intent (own list, not inherited from admin)            │
//! │ cashier  │ sales, stock/price lookups, customers, clock, own tasks      │
//! │ staff    │ stock/price lookups, clock, own tasks                        │
//! │ viewer   │ read-only reports                                            │
//! │ other    │ nothing                                                      │
//! └──────────┴──────────────────────────────────────────────────────────────┘
//! ```

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use crate::context::{Role, VerifiedRole};
use crate::intent::Intent;

static PERMISSIONS: Lazy<HashMap<Role, HashSet<Intent>>> = Lazy::new(|| {
    use Intent::*;

    let mut table = HashMap::new();
    table.insert(
        Role::Admin,
        [
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
        ]
        .into_iter()
        .collect(),
    );
    table.insert(
        Role::Manager,
        [
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
        ]
        .into_iter()
        .collect(),
    );
    table.insert(
        Role::Cashier,
        [
            RecordSale,
            CheckStock,
            CheckPrice,
            ListProducts,
            SalesSummary,
            SaleDetails,
            CustomerLookup,
            ClockIn,
            ClockOut,
            ListTasks,
            CompleteTask,
            Help,
        ]
        .into_iter()
        .collect(),
    );
    table.insert(
        Role::Staff,
        [
            CheckStock,
            CheckPrice,
            ListProducts,
            ClockIn,
            ClockOut,
            ListTasks,
            CompleteTask,
            Help,
        ]
        .into_iter()
        .collect(),
    );
    table.insert(
        Role::Viewer,
        [
            CheckStock,
            CheckPrice,
            ListProducts,
            LowStockReport,
            SalesSummary,
            SaleDetails,
            ExpenseSummary,
            BusinessOverview,
            Help,
        ]
        .into_iter()
        .collect(),
    );
    table
});

/// True iff the role's row lists the intent. Unknown roles are never permitted.
pub fn is_permitted(role: &VerifiedRole, intent: Intent) -> bool {
    role.role()
        .and_then(|r| PERMISSIONS.get(&r))
        .map(|allowed| allowed.contains(&intent))
        .unwrap_or(false)
}

/// Intents the role may use, in declaration order.
pub fn permitted_intents(role: &VerifiedRole) -> Vec<Intent> {
    Intent::ALL
        .into_iter()
        .filter(|i| is_permitted(role, *i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Membership;

    fn role(name: &str) -> VerifiedRole {
        VerifiedRole::from_membership(&Membership {
            tenant_id: "t1".into(),
            user_id: "u1".into(),
            role: name.into(),
            is_active: true,
        })
    }

    fn names(role_name: &str) -> Vec<&'static str> {
        permitted_intents(&role(role_name))
            .into_iter()
            .map(|i| i.as_str())
            .collect()
    }

    #[test]
    fn test_rows_are_pinned() {
        let everything = vec![
            "record_sale",
            "check_stock",
            "check_price",
            "list_products",
            "low_stock_report",
            "sales_summary",
            "sale_details",
            "customer_lookup",
            "record_expense",
            "expense_summary",
            "business_overview",
            "clock_in",
            "clock_out",
            "attendance_summary",
            "list_employees",
            "employee_details",
            "create_task",
            "list_tasks",
            "complete_task",
            "help",
        ];
        assert_eq!(names("admin"), everything);
        assert_eq!(names("manager"), everything);
        assert_eq!(
            names("cashier"),
            vec![
                "record_sale",
                "check_stock",
                "check_price",
                "list_products",
                "sales_summary",
                "sale_details",
                "customer_lookup",
                "clock_in",
                "clock_out",
                "list_tasks",
                "complete_task",
                "help",
            ]
        );
        assert_eq!(
            names("staff"),
            vec![
                "check_stock",
                "check_price",
                "list_products",
                "clock_in",
                "clock_out",
                "list_tasks",
                "complete_task",
                "help",
            ]
        );
        assert_eq!(
            names("viewer"),
            vec![
                "check_stock",
                "check_price",
                "list_products",
                "low_stock_report",
                "sales_summary",
                "sale_details",
                "expense_summary",
                "business_overview",
                "help",
            ]
        );
    }

    #[test]
    fn test_cashier_cannot_record_expense() {
        assert!(!is_permitted(&role("cashier"), Intent::RecordExpense));
        assert!(is_permitted(&role("cashier"), Intent::RecordSale));
    }

    #[test]
    fn test_viewer_is_read_only() {
        for intent in permitted_intents(&role("viewer")) {
            assert!(!intent.is_write(), "viewer may {intent}");
        }
    }

    #[test]
    fn test_unlisted_roles_permit_nothing() {
        for name in ["owner", "", "ADMIN ", "root"] {
            let r = role(name);
            let expected = Role::parse(name).is_some();
            for intent in Intent::ALL {
                if !expected {
                    assert!(!is_permitted(&r, intent));
                }
            }
        }
        assert!(permitted_intents(&role("owner")).is_empty());
    }

    #[test]
    fn test_help_is_open_to_every_known_role() {
        for name in ["admin", "manager", "cashier", "staff", "viewer"] {
            assert!(is_permitted(&role(name), Intent::Help));
        }
    }
}
