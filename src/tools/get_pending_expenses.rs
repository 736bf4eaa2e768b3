use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolContext, ToolError, ToolHandler};
use crate::format::expense_views;
use crate::store::ExpenseStore;
use crate::tool_registry::{ParameterSchema, ToolDefinition};

pub struct GetPendingExpenses {
    store: Arc<dyn ExpenseStore>,
}

impl GetPendingExpenses {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GetPendingExpenses {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_pending_expenses",
            description: "Retrieves expenses that have been submitted and are awaiting approval.",
            parameters: ParameterSchema::empty(),
        }
    }

    async fn call(&self, _args: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let pending = self.store.list_pending().await?;
        Ok(json!({
            "count": pending.len(),
            "expenses": expense_views(&pending),
        }))
    }
}
