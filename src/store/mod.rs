//! Expense Store capability consumed by the chat tools and the REST API.

mod memory;

pub use memory::MemoryExpenseStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ExpenseId = i64;
pub type CategoryId = i64;

/// Largest single expense accepted, in pence (£10,000,000.00).
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpenseStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Draft => "Draft",
            ExpenseStatus::Submitted => "Submitted",
            ExpenseStatus::Approved => "Approved",
            ExpenseStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub user_name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub status: ExpenseStatus,
    /// Amount in minor units (pence).
    pub amount_minor: i64,
    pub currency: String,
    pub expense_date: NaiveDate,
    pub description: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_expenses: u64,
    pub pending_approvals: u64,
    pub approved_amount_minor: i64,
    pub approved_count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub amount_minor: i64,
    pub expense_date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Expense store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Failures of the store itself, as opposed to problems with the request.
    pub fn is_upstream(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the expense backend exposes. Each call is atomic on the store side.
///
/// State transitions that are not allowed (approving a draft, submitting an
/// approved expense) report `Ok(false)` rather than an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn list_expenses(&self, filter: Option<String>) -> StoreResult<Vec<Expense>>;

    async fn list_pending(&self) -> StoreResult<Vec<Expense>>;

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Expense>;

    async fn create_expense(&self, new: NewExpense) -> StoreResult<Expense>;

    async fn submit_expense(&self, id: ExpenseId, user_id: UserId) -> StoreResult<bool>;

    async fn approve_expense(&self, id: ExpenseId, reviewer_id: UserId) -> StoreResult<bool>;

    async fn reject_expense(&self, id: ExpenseId, reviewer_id: UserId) -> StoreResult<bool>;
}
