//! # Response Formatter
//!
//! Renders the human-readable `message` of each intent. For chat callers
//! this text is the whole user experience, so every message names the
//! product, customer, or amount it is about.
//!
//! Amounts use the configured currency code; times are shown in the
//! business-local offset.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::fmt::Write;

use tally_core::{
    AttendanceRecord, Employee, Expense, ExpenseCategory, Intent, InventoryItem, Money,
    PaymentMethod, PaymentReceipt, Period, Sale, SaleItem, Task,
};

/// The line a sale was recorded for.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// False for service sales (no inventory match).
    pub matched: bool,
    pub remaining_stock: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SalesSummary {
    pub period: Period,
    pub count: usize,
    pub total: Money,
    pub by_payment: Vec<(PaymentMethod, usize, Money)>,
    /// (product, quantity, revenue), best seller first.
    pub top_products: Vec<(String, i64, Money)>,
}

#[derive(Debug, Clone)]
pub struct ExpenseSummary {
    pub period: Period,
    pub count: usize,
    pub total: Money,
    pub by_category: Vec<(ExpenseCategory, Money)>,
}

#[derive(Debug, Clone)]
pub struct Overview {
    pub date: NaiveDate,
    pub sales_count: usize,
    pub sales_total: Money,
    pub expenses_total: Money,
    pub low_stock: Vec<String>,
}

impl Overview {
    pub fn net(&self) -> Money {
        self.sales_total - self.expenses_total
    }
}

#[derive(Debug, Clone)]
pub struct Formatter {
    currency: String,
    offset: FixedOffset,
}

impl Formatter {
    pub fn new(currency: impl Into<String>, offset: FixedOffset) -> Self {
        Formatter {
            currency: currency.into(),
            offset,
        }
    }

    pub fn money(&self, amount: Money) -> String {
        amount.format_with(&self.currency)
    }

    pub fn cents(&self, cents: i64) -> String {
        self.money(Money::from_cents(cents))
    }

    pub fn date_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%d %b %Y, %H:%M").to_string()
    }

    pub fn date(&self, date: NaiveDate) -> String {
        date.format("%d %b %Y").to_string()
    }

    pub fn time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%H:%M").to_string()
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    pub fn sale_recorded(&self, sale: &Sale, receipt_number: &str, line: &SaleLine) -> String {
        let mut out = format!("Sale recorded: {}\n", sale.sale_number);
        let _ = writeln!(out, "Receipt: {receipt_number}");
        let _ = writeln!(out, "Customer: {}", sale.customer_name);
        let _ = writeln!(
            out,
            "Item: {} x {} @ {}{}",
            line.quantity,
            line.description,
            self.money(line.unit_price),
            if line.matched { "" } else { " (service)" }
        );
        let _ = writeln!(out, "Total: {}", self.cents(sale.total_cents));
        let _ = writeln!(out, "Payment: {}", sale.payment_method);
        let _ = write!(out, "Date: {}", self.date_time(sale.created_at));
        if let Some(remaining) = line.remaining_stock {
            let _ = write!(out, "\n{} left in stock: {}", line.description, remaining);
        }
        out
    }

    pub fn sale_details(&self, sale: &Sale, items: &[SaleItem], receipt: Option<&PaymentReceipt>) -> String {
        let mut out = format!("Sale {} ({})\n", sale.sale_number, self.date_time(sale.created_at));
        let _ = writeln!(out, "Customer: {}", sale.customer_name);
        if let Some(phone) = &sale.customer_phone {
            let _ = writeln!(out, "Phone: {phone}");
        }
        if items.is_empty() {
            let _ = writeln!(out, "Items: none recorded");
        } else {
            let _ = writeln!(out, "Items:");
            for item in items {
                let _ = writeln!(
                    out,
                    "- {} x {} @ {} = {}",
                    item.quantity,
                    item.description,
                    self.cents(item.unit_price_cents),
                    self.cents(item.total_price_cents)
                );
            }
        }
        let _ = writeln!(out, "Total: {}", self.cents(sale.total_cents));
        let _ = write!(out, "Payment: {}", sale.payment_method);
        match receipt {
            Some(r) => {
                let _ = write!(out, "\nReceipt: {}", r.receipt_number);
            }
            None => {
                let _ = write!(out, "\nReceipt: not issued");
            }
        }
        out
    }

    pub fn sales_summary(&self, summary: &SalesSummary) -> String {
        if summary.count == 0 {
            return format!("No sales recorded {}.", summary.period);
        }

        let mut out = format!(
            "Sales {}: {} sale{} totalling {}",
            summary.period,
            summary.count,
            plural(summary.count),
            self.money(summary.total)
        );
        if !summary.by_payment.is_empty() {
            out.push_str("\nBy payment method:");
            for (method, count, total) in &summary.by_payment {
                let _ = write!(out, "\n- {method}: {} ({count})", self.money(*total));
            }
        }
        if !summary.top_products.is_empty() {
            out.push_str("\nTop products:");
            for (name, quantity, revenue) in &summary.top_products {
                let _ = write!(out, "\n- {name}: {quantity} sold, {}", self.money(*revenue));
            }
        }
        out
    }

    pub fn customer_history(&self, query: &str, sales: &[Sale]) -> String {
        if sales.is_empty() {
            return format!("No purchases found for '{query}'.");
        }
        let total: Money = sales.iter().map(Sale::total).sum();
        let mut out = format!(
            "{} purchase{} found for '{query}', totalling {}:",
            sales.len(),
            plural(sales.len()),
            self.money(total)
        );
        for sale in sales {
            let _ = write!(
                out,
                "\n- {} {} ({}): {}",
                sale.sale_number,
                sale.customer_name,
                self.date_time(sale.created_at),
                self.cents(sale.total_cents)
            );
        }
        out
    }

    // -------------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------------

    pub fn stock_levels(&self, query: &str, items: &[InventoryItem]) -> String {
        if items.is_empty() {
            return format!("No products found matching '{query}'.");
        }
        let mut out = format!("Stock for '{query}':");
        for item in items {
            let _ = write!(out, "\n- {}: {} in stock", item.name, item.current_stock);
            if item.is_low_stock() {
                let _ = write!(out, " (low, reorder level {})", item.reorder_level);
            }
        }
        out
    }

    pub fn prices(&self, query: &str, items: &[InventoryItem]) -> String {
        if items.is_empty() {
            return format!("No products found matching '{query}'.");
        }
        let mut out = format!("Prices for '{query}':");
        for item in items {
            let _ = write!(out, "\n- {}: {}", item.name, self.money(item.unit_price()));
        }
        out
    }

    pub fn product_list(&self, items: &[InventoryItem]) -> String {
        if items.is_empty() {
            return "No products in inventory yet.".to_string();
        }
        let mut out = format!("{} product{}:", items.len(), plural(items.len()));
        for item in items {
            let _ = write!(
                out,
                "\n- {}: {} @ {}",
                item.name,
                item.current_stock,
                self.money(item.unit_price())
            );
        }
        out
    }

    pub fn low_stock(&self, items: &[InventoryItem]) -> String {
        if items.is_empty() {
            return "All products are above their reorder level.".to_string();
        }
        let mut out = format!("{} product{} at or below reorder level:", items.len(), plural(items.len()));
        for item in items {
            let _ = write!(
                out,
                "\n- {}: {} left (reorder level {})",
                item.name, item.current_stock, item.reorder_level
            );
        }
        out
    }

    // -------------------------------------------------------------------------
    // Expenses
    // -------------------------------------------------------------------------

    pub fn expense_recorded(&self, expense: &Expense) -> String {
        let mut out = format!(
            "Expense recorded: {} for {} ({})",
            self.cents(expense.amount_cents),
            expense.description,
            expense.category
        );
        if let Some(vendor) = &expense.vendor_name {
            let _ = write!(out, "\nPaid to: {vendor}");
        }
        let _ = write!(out, "\nDate: {}", self.date(expense.date_incurred));
        out
    }

    pub fn expense_summary(&self, summary: &ExpenseSummary) -> String {
        if summary.count == 0 {
            return format!("No expenses recorded {}.", summary.period);
        }
        let mut out = format!(
            "Expenses {}: {} totalling {}",
            summary.period,
            summary.count,
            self.money(summary.total)
        );
        for (category, total) in &summary.by_category {
            let _ = write!(out, "\n- {category}: {}", self.money(*total));
        }
        out
    }

    pub fn business_overview(&self, overview: &Overview) -> String {
        let mut out = format!("Business overview for {}:\n", self.date(overview.date));
        let _ = writeln!(
            out,
            "Sales: {} ({} sale{})",
            self.money(overview.sales_total),
            overview.sales_count,
            plural(overview.sales_count)
        );
        let _ = writeln!(out, "Expenses: {}", self.money(overview.expenses_total));
        let _ = write!(out, "Net: {}", self.money(overview.net()));
        if overview.low_stock.is_empty() {
            out.push_str("\nStock: no items below reorder level");
        } else {
            let _ = write!(
                out,
                "\nLow stock ({}): {}",
                overview.low_stock.len(),
                overview.low_stock.join(", ")
            );
        }
        out
    }

    // -------------------------------------------------------------------------
    // Staff
    // -------------------------------------------------------------------------

    pub fn clocked_in(&self, record: &AttendanceRecord) -> String {
        format!("{} clocked in at {}.", record.employee_name, self.time(record.clock_in))
    }

    pub fn clocked_out(&self, record: &AttendanceRecord, clock_out: DateTime<Utc>, hours: f64) -> String {
        format!(
            "{} clocked out at {}. Shift: {:.2} hours (since {}).",
            record.employee_name,
            self.time(clock_out),
            hours,
            self.time(record.clock_in)
        )
    }

    pub fn attendance(&self, date: NaiveDate, records: &[AttendanceRecord], now: DateTime<Utc>) -> String {
        if records.is_empty() {
            return format!("Nobody has clocked in on {}.", self.date(date));
        }
        let present = records.iter().filter(|r| r.is_open()).count();
        let mut out = format!(
            "Attendance for {}: {} shift{}, {} still clocked in",
            self.date(date),
            records.len(),
            plural(records.len()),
            present
        );
        for record in records {
            match record.clock_out {
                Some(out_at) => {
                    let _ = write!(
                        out,
                        "\n- {}: {} to {} ({:.2} h)",
                        record.employee_name,
                        self.time(record.clock_in),
                        self.time(out_at),
                        record.hours_worked.unwrap_or_else(|| record.hours_until(out_at))
                    );
                }
                None => {
                    let _ = write!(
                        out,
                        "\n- {}: in since {} ({:.2} h so far)",
                        record.employee_name,
                        self.time(record.clock_in),
                        record.hours_until(now)
                    );
                }
            }
        }
        out
    }

    pub fn employees(&self, employees: &[Employee]) -> String {
        if employees.is_empty() {
            return "No employees on record.".to_string();
        }
        let mut out = format!("{} employee{}:", employees.len(), plural(employees.len()));
        for employee in employees {
            let _ = write!(out, "\n- {}", employee.full_name);
            if let Some(position) = &employee.position {
                let _ = write!(out, " ({position})");
            }
        }
        out
    }

    pub fn employee_details(&self, employee: &Employee, open_shift: Option<&AttendanceRecord>) -> String {
        let mut out = employee.full_name.clone();
        let _ = write!(out, "\nPosition: {}", employee.position.as_deref().unwrap_or("not set"));
        let _ = write!(out, "\nPhone: {}", employee.phone.as_deref().unwrap_or("not set"));
        match open_shift {
            Some(shift) => {
                let _ = write!(out, "\nClocked in since {}", self.time(shift.clock_in));
            }
            None => out.push_str("\nNot clocked in"),
        }
        out
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    pub fn task_created(&self, task: &Task) -> String {
        let mut out = format!("Task created: {}", task.title);
        if let Some(name) = &task.assignee_name {
            let _ = write!(out, "\nAssigned to: {name}");
        }
        if let Some(due) = task.due_date {
            let _ = write!(out, "\nDue: {}", self.date(due));
        }
        out
    }

    pub fn tasks(&self, tasks: &[Task], own_only: bool) -> String {
        let scope = if own_only { "assigned to you" } else { "open" };
        if tasks.is_empty() {
            return format!("No tasks {scope}.");
        }
        let mut out = format!("{} task{} {scope}:", tasks.len(), plural(tasks.len()));
        for task in tasks {
            let _ = write!(out, "\n- {}", task.title);
            if let Some(name) = &task.assignee_name {
                let _ = write!(out, " [{name}]");
            }
            if let Some(due) = task.due_date {
                let _ = write!(out, " due {}", self.date(due));
            }
        }
        out
    }

    pub fn task_completed(&self, task: &Task) -> String {
        format!("Task completed: {}", task.title)
    }

    // -------------------------------------------------------------------------
    // Help
    // -------------------------------------------------------------------------

    pub fn help(&self, display_name: &str, role: &str, intents: &[Intent]) -> String {
        if intents.is_empty() {
            return format!("Hi {display_name}, your role ({role}) has no actions available.");
        }
        let mut out = format!("Hi {display_name}, here is what you can do:");
        for intent in intents {
            let _ = write!(out, "\n- {}: {}", intent, intent.describe());
        }
        out
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};

    fn formatter() -> Formatter {
        Formatter::new("KES", Utc.fix())
    }

    #[test]
    fn test_money_and_dates() {
        let f = formatter();
        assert_eq!(f.cents(250_000), "KES 2,500.00");
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 14, 5, 0).unwrap();
        assert_eq!(f.date_time(at), "02 Mar 2026, 14:05");

        let nairobi = Formatter::new("KES", FixedOffset::east_opt(3 * 3600).unwrap());
        assert_eq!(nairobi.time(at), "17:05");
    }

    #[test]
    fn test_empty_summaries_name_period() {
        let f = formatter();
        let summary = SalesSummary {
            period: Period::Yesterday,
            count: 0,
            total: Money::zero(),
            by_payment: vec![],
            top_products: vec![],
        };
        assert_eq!(f.sales_summary(&summary), "No sales recorded yesterday.");
    }

    #[test]
    fn test_overview_net_can_be_negative() {
        let overview = Overview {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            sales_count: 1,
            sales_total: Money::from_major(100),
            expenses_total: Money::from_major(250),
            low_stock: vec!["Cement".into()],
        };
        let text = formatter().business_overview(&overview);
        assert!(text.contains("Net: -KES 150.00"));
        assert!(text.contains("Low stock (1): Cement"));
    }
}
