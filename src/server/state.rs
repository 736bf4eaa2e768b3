//! Shared application state

use std::sync::Arc;

use crate::orchestrator::Orchestrator;
use crate::store::{ExpenseStore, UserId};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExpenseStore>,
    pub orchestrator: Arc<Orchestrator>,
    /// Identity applied when a request carries no `X-User-Id` header
    pub default_user_id: UserId,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        orchestrator: Arc<Orchestrator>,
        default_user_id: UserId,
    ) -> Self {
        Self {
            store,
            orchestrator,
            default_user_id,
        }
    }
}
