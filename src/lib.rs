pub mod config;
pub mod format;
pub mod llm_client;
pub mod orchestrator;
pub mod prompts;
pub mod server;
pub mod store;
pub mod tool_registry;
pub mod tools;
pub mod transcript;
pub mod types;
pub mod utils;

#[cfg(test)]
mod mocks;
#[cfg(test)]
mod tests;
