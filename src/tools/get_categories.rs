use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolContext, ToolError, ToolHandler};
use crate::format::CategoryView;
use crate::store::ExpenseStore;
use crate::tool_registry::{ParameterSchema, ToolDefinition};

pub struct GetCategories {
    store: Arc<dyn ExpenseStore>,
}

impl GetCategories {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GetCategories {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_categories",
            description: "Lists expense categories with their ids. Use the id as \
                          categoryId when creating an expense.",
            parameters: ParameterSchema::empty(),
        }
    }

    async fn call(&self, _args: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let categories = self.store.list_categories().await?;
        let views: Vec<CategoryView> = categories.iter().map(CategoryView::from).collect();
        Ok(json!(views))
    }
}
