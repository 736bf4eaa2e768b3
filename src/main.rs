use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_desk::config::Config;
use expense_desk::llm_client::{CompletionClient, LlmClient};
use expense_desk::orchestrator::{Orchestrator, OrchestratorOptions};
use expense_desk::server::{self, AppState};
use expense_desk::store::{ExpenseStore, MemoryExpenseStore};
use expense_desk::tool_registry::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn ExpenseStore> = Arc::new(MemoryExpenseStore::seeded());
    let tools = ToolRegistry::new(store.clone());

    let llm: Option<Arc<dyn CompletionClient>> = match &config.llm {
        Some(settings) => {
            tracing::info!(
                base_url = %settings.base_url,
                model = %settings.model,
                temperature = settings.temperature,
                "Chat assistant enabled"
            );
            Some(Arc::new(
                LlmClient::new(
                    settings.base_url.clone(),
                    settings.api_key.clone(),
                    settings.model.clone(),
                )?
                .with_temperature(settings.temperature),
            ))
        }
        None => {
            tracing::warn!("OPENAI_BASE_URL or OPENAI_MODEL not set - chat assistant disabled");
            None
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(
        llm,
        tools,
        OrchestratorOptions::from(&config),
    ));
    let state = AppState::new(store, orchestrator, config.default_user_id);

    server::serve(state, config.bind_addr).await
}
