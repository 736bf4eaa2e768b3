use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Duration;

use crate::config::DEFAULT_TEMPERATURE;
use crate::types::{Completion, FinishReason, Message};
use crate::utils::clip;

const ERROR_BODY_CLIP: usize = 500;

/// A chat-completions endpoint that supports function calling.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message], tools: &Value) -> anyhow::Result<Completion>;

    /// Model name, for logs.
    fn model(&self) -> &str;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature: DEFAULT_TEMPERATURE,
            http,
        })
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn request_body(&self, messages: &[Message], tools: &Value) -> Value {
        let mut req = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": false,
        });
        if tools.as_array().is_some_and(|t| !t.is_empty()) {
            req["tools"] = tools.clone();
            req["tool_choice"] = Value::from("auto");
        }
        req
    }
}

/// Pulls the first choice out of a chat-completions response body.
pub fn parse_completion(body: &Value) -> anyhow::Result<Completion> {
    let choice = body["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| anyhow!("No choices in response"))?;

    let message: Message = serde_json::from_value(choice["message"].clone())
        .context("Malformed message in completion response")?;

    let finish_reason = match choice.get("finish_reason") {
        Some(Value::String(_)) => serde_json::from_value(choice["finish_reason"].clone())?,
        _ if !message.pending_calls().is_empty() => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    };

    Ok(Completion {
        message,
        finish_reason,
    })
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, messages: &[Message], tools: &Value) -> anyhow::Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self.http.post(url).json(&self.request_body(messages, tools));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.context("Completion request failed")?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(anyhow!(
                "Completion endpoint returned {}: {}",
                status,
                clip(&text, ERROR_BODY_CLIP)
            ));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;
        let completion = parse_completion(&body)?;
        tracing::debug!(
            model = %self.model,
            finish_reason = ?completion.finish_reason,
            tool_calls = completion.message.pending_calls().len(),
            "Completion received"
        );
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
