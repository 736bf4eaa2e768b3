use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolContext, ToolError, ToolHandler};
use crate::format::StatsView;
use crate::store::ExpenseStore;
use crate::tool_registry::{ParameterSchema, ToolDefinition};

pub struct GetDashboardStats {
    store: Arc<dyn ExpenseStore>,
}

impl GetDashboardStats {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GetDashboardStats {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_dashboard_stats",
            description: "Returns totals: number of expenses, pending approvals, \
                          and the count and sum of approved expenses.",
            parameters: ParameterSchema::empty(),
        }
    }

    async fn call(&self, _args: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let stats = self.store.dashboard_stats().await?;
        Ok(json!(StatsView::from(stats)))
    }
}
