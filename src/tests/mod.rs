
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::mocks::mock_llm_client::MockLlmClient;
use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::store::{
    Category, DashboardStats, Expense, ExpenseId, ExpenseStatus, ExpenseStore,
    MemoryExpenseStore, NewExpense, StoreResult, UserId,
};
use crate::tool_registry::ToolRegistry;
use crate::types::{Message, Role};

pub(crate) fn test_options() -> OrchestratorOptions {
    OrchestratorOptions {
        max_tool_rounds: 5,
        step_timeout: std::time::Duration::from_secs(10),
        tool_timeout: std::time::Duration::from_secs(10),
        default_user_id: 2,
    }
}

pub(crate) fn orchestrator_with(
    store: Arc<dyn ExpenseStore>,
    llm: &MockLlmClient,
    opts: OrchestratorOptions,
) -> Orchestrator {
    Orchestrator::new(Some(Arc::new(llm.clone())), ToolRegistry::new(store), opts)
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn sample_expense(id: i64, status: ExpenseStatus, description: &str) -> Expense {
    Expense {
        id,
        user_id: 1,
        user_name: "Alice Example".to_string(),
        category_id: 1,
        category_name: "Travel".to_string(),
        status,
        amount_minor: 4250,
        currency: "GBP".to_string(),
        expense_date: date(2026, 10, 14),
        description: Some(description.to_string()),
        submitted_at: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap(),
    }
}

/// Seeded store holding one submitted expense per description, in order.
pub(crate) async fn store_with_submitted(descriptions: &[&str]) -> Arc<MemoryExpenseStore> {
    let store = Arc::new(MemoryExpenseStore::seeded());
    for (i, description) in descriptions.iter().enumerate() {
        let created = store
            .create_expense(NewExpense {
                user_id: 1,
                category_id: 1,
                amount_minor: 4250 + i as i64,
                expense_date: date(2026, 10, 10 + i as u32),
                description: Some(description.to_string()),
            })
            .await
            .unwrap();
        assert!(store.submit_expense(created.id, 1).await.unwrap());
    }
    store
}

/// System turn exactly once and first; every tool turn answers a call issued
/// by the assistant turn that opened its batch.
pub(crate) fn assert_transcript_invariants(messages: &[Message]) {
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(
        messages.iter().filter(|m| m.role == Role::System).count(),
        1
    );

    let mut open_calls: Vec<String> = Vec::new();
    for (i, m) in messages.iter().enumerate() {
        match m.role {
            Role::Tool => {
                let id = m.tool_call_id.as_ref().expect("tool turn without id");
                assert!(
                    open_calls.contains(id),
                    "orphaned tool turn {} at position {}",
                    id,
                    i
                );
            }
            Role::Assistant => {
                open_calls = m.pending_calls().iter().map(|c| c.id.clone()).collect();
            }
            _ => open_calls.clear(),
        }
    }
}

/// Seeded store whose `list_categories` stalls for `delay` before answering.
pub(crate) struct SlowCategoriesStore {
    inner: MemoryExpenseStore,
    delay: Duration,
}

impl SlowCategoriesStore {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryExpenseStore::seeded(),
            delay,
        }
    }
}

#[async_trait]
impl ExpenseStore for SlowCategoriesStore {
    async fn list_expenses(&self, filter: Option<String>) -> StoreResult<Vec<Expense>> {
        self.inner.list_expenses(filter).await
    }

    async fn list_pending(&self) -> StoreResult<Vec<Expense>> {
        self.inner.list_pending().await
    }

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        self.inner.dashboard_stats().await
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_categories().await
    }

    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Expense> {
        self.inner.get_expense(id).await
    }

    async fn create_expense(&self, new: NewExpense) -> StoreResult<Expense> {
        self.inner.create_expense(new).await
    }

    async fn submit_expense(&self, id: ExpenseId, user_id: UserId) -> StoreResult<bool> {
        self.inner.submit_expense(id, user_id).await
    }

    async fn approve_expense(&self, id: ExpenseId, reviewer_id: UserId) -> StoreResult<bool> {
        self.inner.approve_expense(id, reviewer_id).await
    }

    async fn reject_expense(&self, id: ExpenseId, reviewer_id: UserId) -> StoreResult<bool> {
        self.inner.reject_expense(id, reviewer_id).await
    }
}
