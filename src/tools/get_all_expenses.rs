use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolContext, ToolError, ToolHandler, parse_args};
use crate::format::expense_views;
use crate::store::ExpenseStore;
use crate::tool_registry::{ParamType, Parameter, ParameterSchema, ToolDefinition};

#[derive(Deserialize)]
struct Args {
    filter: Option<String>,
}

pub struct GetAllExpenses {
    store: Arc<dyn ExpenseStore>,
}

impl GetAllExpenses {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GetAllExpenses {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_all_expenses",
            description: "Retrieves all expenses, newest first. Optionally narrows the list \
                          with a free-text filter matched against description, category, \
                          submitter and status.",
            parameters: ParameterSchema::new(vec![Parameter::optional(
                "filter",
                ParamType::String,
                "Text to filter by, e.g. 'travel' or 'Approved'",
            )]),
        }
    }

    async fn call(&self, args: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let expenses = self.store.list_expenses(args.filter).await?;
        Ok(json!({
            "count": expenses.len(),
            "expenses": expense_views(&expenses),
        }))
    }
}
