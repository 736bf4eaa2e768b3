//! Compact views of store records for re-injection into the model context.
//!
//! Amounts travel as integer pence everywhere else; they only become decimal
//! pounds here and in [`to_minor_units`] at the inbound boundary.

use chrono::NaiveDate;
use serde::Serialize;

use crate::store::{Category, DashboardStats, Expense, MAX_AMOUNT_MINOR};

const DATE_FORMAT: &str = "%d %b %Y";

/// Converts a decimal amount in pounds to pence, rejecting non-finite,
/// non-positive and out-of-range values.
pub fn to_minor_units(amount: f64) -> Result<i64, String> {
    if !amount.is_finite() {
        return Err("amount must be a finite number".to_string());
    }
    let pence = (amount * 100.0).round();
    if pence < 1.0 {
        return Err(format!("amount must be at least £0.01, got {}", amount));
    }
    if pence > MAX_AMOUNT_MINOR as f64 {
        return Err(format!(
            "amount {} is above the {} limit",
            amount,
            format_gbp(MAX_AMOUNT_MINOR)
        ));
    }
    Ok(pence as i64)
}

/// `2540` -> `£25.40`, `123450` -> `£1,234.50`.
pub fn format_gbp(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let pounds = (abs / 100).to_string();
    let pence = abs % 100;

    let mut grouped = String::with_capacity(pounds.len() + pounds.len() / 3);
    for (i, ch) in pounds.chars().enumerate() {
        if i > 0 && (pounds.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}£{}.{:02}", sign, grouped, pence)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub amount: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub submitted_by: String,
}

impl From<&Expense> for ExpenseView {
    fn from(e: &Expense) -> Self {
        Self {
            id: e.id,
            date: format_date(e.expense_date),
            category: e.category_name.clone(),
            amount: format_gbp(e.amount_minor),
            status: e.status.as_str(),
            description: e.description.clone(),
            submitted_by: e.user_name.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_expenses: u64,
    pub pending_approvals: u64,
    pub approved_amount: String,
    pub approved_count: u64,
}

impl From<DashboardStats> for StatsView {
    fn from(s: DashboardStats) -> Self {
        Self {
            total_expenses: s.total_expenses,
            pending_approvals: s.pending_approvals,
            approved_amount: format_gbp(s.approved_amount_minor),
            approved_count: s.approved_count,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

pub fn expense_views(expenses: &[Expense]) -> Vec<ExpenseView> {
    expenses.iter().map(ExpenseView::from).collect()
}
