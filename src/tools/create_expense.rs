use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolContext, ToolError, ToolHandler, parse_args};
use crate::format::{ExpenseView, format_gbp, to_minor_units};
use crate::store::{ExpenseStore, NewExpense};
use crate::tool_registry::{ParamType, Parameter, ParameterSchema, ToolDefinition};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    amount: f64,
    category_id: i64,
    expense_date: String,
    description: Option<String>,
}

pub struct CreateExpense {
    store: Arc<dyn ExpenseStore>,
}

impl CreateExpense {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for CreateExpense {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_expense",
            description: "Creates a new expense in Draft status for the current user. \
                          Call get_categories first if the category id is unknown.",
            parameters: ParameterSchema::new(vec![
                Parameter::required(
                    "amount",
                    ParamType::Number,
                    "Amount in pounds (GBP), e.g. 25.40",
                ),
                Parameter::required("categoryId", ParamType::Integer, "Category id"),
                Parameter::required(
                    "expenseDate",
                    ParamType::String,
                    "Date of the expense as YYYY-MM-DD",
                ),
                Parameter::optional("description", ParamType::String, "Short description"),
            ]),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let amount_minor = to_minor_units(args.amount).map_err(ToolError::InvalidArguments)?;
        let expense_date = NaiveDate::parse_from_str(args.expense_date.trim(), "%Y-%m-%d")
            .map_err(|_| {
                ToolError::InvalidArguments(format!(
                    "expenseDate '{}' is not a YYYY-MM-DD date",
                    args.expense_date
                ))
            })?;

        let created = self
            .store
            .create_expense(NewExpense {
                user_id: ctx.user_id,
                category_id: args.category_id,
                amount_minor,
                expense_date,
                description: args.description,
            })
            .await?;

        Ok(json!({
            "success": true,
            "message": format!(
                "Created draft expense {} for {}",
                created.id,
                format_gbp(created.amount_minor)
            ),
            "expense": ExpenseView::from(&created),
        }))
    }
}
