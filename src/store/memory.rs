use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    Category, CategoryId, DashboardStats, Expense, ExpenseId, ExpenseStatus, ExpenseStore,
    MAX_AMOUNT_MINOR, NewExpense, StoreError, StoreResult, UserId,
};

const CURRENCY: &str = "GBP";

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, String>,
    categories: Vec<Category>,
    expenses: BTreeMap<ExpenseId, Expense>,
    next_id: ExpenseId,
}

/// In-process expense store. Every operation holds the table lock for its whole
/// duration, so each call is atomic.
pub struct MemoryExpenseStore {
    tables: RwLock<Tables>,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: 1,
                ..Tables::default()
            }),
        }
    }

    /// Store with the demo users and the standard category list.
    pub fn seeded() -> Self {
        let mut tables = Tables {
            next_id: 1,
            ..Tables::default()
        };
        tables.users.insert(1, "Alice Example".to_string());
        tables.users.insert(2, "Bob Manager".to_string());
        tables.categories = ["Travel", "Meals", "Supplies", "Accommodation", "Other"]
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: i as CategoryId + 1,
                name: name.to_string(),
            })
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub async fn add_user(&self, id: UserId, name: &str) {
        self.tables.write().await.users.insert(id, name.to_string());
    }

    pub async fn add_category(&self, id: CategoryId, name: &str) {
        let mut tables = self.tables.write().await;
        tables.categories.retain(|c| c.id != id);
        tables.categories.push(Category {
            id,
            name: name.to_string(),
        });
        tables.categories.sort_by_key(|c| c.id);
    }

    async fn transition(
        &self,
        id: ExpenseId,
        from: ExpenseStatus,
        to: ExpenseStatus,
        actor: UserId,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let expense = tables.expenses.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "Expense",
            id,
        })?;
        if expense.status != from {
            tracing::debug!(
                expense_id = id,
                status = expense.status.as_str(),
                target = to.as_str(),
                "Rejected status transition"
            );
            return Ok(false);
        }
        let now = Utc::now();
        expense.status = to;
        match to {
            ExpenseStatus::Submitted => expense.submitted_at = Some(now),
            ExpenseStatus::Approved | ExpenseStatus::Rejected => {
                expense.reviewed_by = Some(actor);
                expense.reviewed_at = Some(now);
            }
            ExpenseStatus::Draft => {}
        }
        Ok(true)
    }
}

impl Default for MemoryExpenseStore {
    fn default() -> Self {
        Self::seeded()
    }
}

fn newest_first(mut expenses: Vec<Expense>) -> Vec<Expense> {
    expenses.sort_by(|a, b| {
        b.expense_date
            .cmp(&a.expense_date)
            .then_with(|| b.id.cmp(&a.id))
    });
    expenses
}

fn matches_filter(expense: &Expense, needle: &str) -> bool {
    let haystacks = [
        expense.description.as_deref().unwrap_or_default(),
        expense.category_name.as_str(),
        expense.user_name.as_str(),
        expense.status.as_str(),
    ];
    haystacks
        .iter()
        .any(|h| h.to_lowercase().contains(needle))
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn list_expenses(&self, filter: Option<String>) -> StoreResult<Vec<Expense>> {
        let tables = self.tables.read().await;
        let needle = filter
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());
        let selected = tables
            .expenses
            .values()
            .filter(|e| needle.as_deref().is_none_or(|n| matches_filter(e, n)))
            .cloned()
            .collect();
        Ok(newest_first(selected))
    }

    async fn list_pending(&self) -> StoreResult<Vec<Expense>> {
        let tables = self.tables.read().await;
        let pending = tables
            .expenses
            .values()
            .filter(|e| e.status == ExpenseStatus::Submitted)
            .cloned()
            .collect();
        Ok(newest_first(pending))
    }

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let tables = self.tables.read().await;
        let mut stats = DashboardStats::default();
        for expense in tables.expenses.values() {
            stats.total_expenses += 1;
            match expense.status {
                ExpenseStatus::Submitted => stats.pending_approvals += 1,
                ExpenseStatus::Approved => {
                    stats.approved_count += 1;
                    stats.approved_amount_minor = stats
                        .approved_amount_minor
                        .checked_add(expense.amount_minor)
                        .ok_or_else(|| {
                            StoreError::InvalidInput("approved total overflows".to_string())
                        })?;
                }
                _ => {}
            }
        }
        Ok(stats)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.tables.read().await.categories.clone())
    }

    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Expense> {
        self.tables
            .read()
            .await
            .expenses
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "Expense",
                id,
            })
    }

    async fn create_expense(&self, new: NewExpense) -> StoreResult<Expense> {
        if new.amount_minor <= 0 {
            return Err(StoreError::InvalidInput(
                "amount must be greater than zero".to_string(),
            ));
        }
        if new.amount_minor > MAX_AMOUNT_MINOR {
            return Err(StoreError::InvalidInput(format!(
                "amount must not exceed {} pence",
                MAX_AMOUNT_MINOR
            )));
        }
        let mut tables = self.tables.write().await;
        let category_name = tables
            .categories
            .iter()
            .find(|c| c.id == new.category_id)
            .map(|c| c.name.clone())
            .ok_or(StoreError::NotFound {
                entity: "Category",
                id: new.category_id,
            })?;
        let user_name = tables
            .users
            .get(&new.user_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "User",
                id: new.user_id,
            })?;

        let id = tables.next_id;
        tables.next_id += 1;
        let expense = Expense {
            id,
            user_id: new.user_id,
            user_name,
            category_id: new.category_id,
            category_name,
            status: ExpenseStatus::Draft,
            amount_minor: new.amount_minor,
            currency: CURRENCY.to_string(),
            expense_date: new.expense_date,
            description: new.description.filter(|d| !d.trim().is_empty()),
            submitted_at: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        tables.expenses.insert(id, expense.clone());
        tracing::info!(expense_id = id, amount_minor = expense.amount_minor, "Expense created");
        Ok(expense)
    }

    async fn submit_expense(&self, id: ExpenseId, user_id: UserId) -> StoreResult<bool> {
        self.transition(id, ExpenseStatus::Draft, ExpenseStatus::Submitted, user_id)
            .await
    }

    async fn approve_expense(&self, id: ExpenseId, reviewer_id: UserId) -> StoreResult<bool> {
        self.transition(id, ExpenseStatus::Submitted, ExpenseStatus::Approved, reviewer_id)
            .await
    }

    async fn reject_expense(&self, id: ExpenseId, reviewer_id: UserId) -> StoreResult<bool> {
        self.transition(id, ExpenseStatus::Submitted, ExpenseStatus::Rejected, reviewer_id)
            .await
    }
}
