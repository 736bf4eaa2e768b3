//! Expense operations the model may call, one handler per tool.

pub use self::create_expense::CreateExpense;
pub use self::get_all_expenses::GetAllExpenses;
pub use self::get_categories::GetCategories;
pub use self::get_dashboard_stats::GetDashboardStats;
pub use self::get_pending_expenses::GetPendingExpenses;
pub use self::review_expense::{Decision, ReviewExpense};

mod create_expense;
mod get_all_expenses;
mod get_categories;
mod get_dashboard_stats;
mod get_pending_expenses;
mod review_expense;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::store::{ExpenseStore, StoreError, UserId};
use crate::tool_registry::ToolDefinition;

/// Per-request data handed to every tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolContext {
    /// Identity used as owner for created expenses and reviewer for decisions.
    pub user_id: UserId,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// `args` has already been checked against `definition().parameters`.
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError>;
}

pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The fixed catalog, in the order it is presented to the model.
pub fn catalog(store: Arc<dyn ExpenseStore>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        Arc::new(GetAllExpenses::new(store.clone())),
        Arc::new(GetPendingExpenses::new(store.clone())),
        Arc::new(GetDashboardStats::new(store.clone())),
        Arc::new(GetCategories::new(store.clone())),
        Arc::new(CreateExpense::new(store.clone())),
        Arc::new(ReviewExpense::new(store.clone(), Decision::Approve)),
        Arc::new(ReviewExpense::new(store, Decision::Reject)),
    ]
}
