use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolContext, ToolError, ToolHandler, parse_args};
use crate::store::ExpenseStore;
use crate::tool_registry::{ParamType, Parameter, ParameterSchema, ToolDefinition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn verb(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    expense_id: i64,
}

/// Approves or rejects a submitted expense on behalf of the requesting user.
pub struct ReviewExpense {
    store: Arc<dyn ExpenseStore>,
    decision: Decision,
}

impl ReviewExpense {
    pub fn new(store: Arc<dyn ExpenseStore>, decision: Decision) -> Self {
        Self { store, decision }
    }
}

#[async_trait]
impl ToolHandler for ReviewExpense {
    fn definition(&self) -> ToolDefinition {
        let (name, description) = match self.decision {
            Decision::Approve => (
                "approve_expense",
                "Approves a submitted expense. Only expenses awaiting approval can be approved.",
            ),
            Decision::Reject => (
                "reject_expense",
                "Rejects a submitted expense. Only expenses awaiting approval can be rejected.",
            ),
        };
        ToolDefinition {
            name,
            description,
            parameters: ParameterSchema::new(vec![Parameter::required(
                "expenseId",
                ParamType::Integer,
                "Id of the expense",
            )]),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let Args { expense_id } = parse_args(args)?;
        let done = match self.decision {
            Decision::Approve => self.store.approve_expense(expense_id, ctx.user_id).await?,
            Decision::Reject => self.store.reject_expense(expense_id, ctx.user_id).await?,
        };

        let message = if done {
            format!("Expense {} {}", expense_id, self.decision.past_tense())
        } else {
            format!("Failed to {} expense {}", self.decision.verb(), expense_id)
        };
        Ok(json!({ "success": done, "message": message }))
    }
}
