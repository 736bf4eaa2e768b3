use futures::future::join_all;
use std::sync::Arc;
use tokio::time::{Duration, timeout};
use tracing::Instrument;

use crate::config::{self, Config};
use crate::llm_client::CompletionClient;
use crate::prompts::system_prompt;
use crate::store::{StoreError, UserId};
use crate::tool_registry::{ToolRegistry, error_payload};
use crate::tools::ToolContext;
use crate::transcript::{Transcript, TranscriptError};
use crate::types::{ChatRequest, ChatResponse, FinishReason, Message, ToolCall};
use crate::utils::clip;

pub const UNCONFIGURED_MESSAGE: &str = "The AI assistant is not configured. Set OPENAI_BASE_URL \
     and OPENAI_MODEL to enable chat. Expenses can still be managed through the rest of the app.";

pub const APOLOGY_MESSAGE: &str =
    "Sorry, I ran into a problem while handling that request. Please try again.";

const LOG_CLIP: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Completion request timed out after {0:?}")]
    CompletionTimeout(Duration),

    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: StoreError,
    },

    #[error("Tool '{0}' timed out after {1:?}")]
    ToolTimeout(String, Duration),

    #[error("No final answer after {0} tool rounds")]
    RoundLimitExceeded(usize),

    #[error("Model returned an empty answer")]
    EmptyResponse,

    #[error("Model stopped before finishing its answer (finish reason: {})", .0.as_str())]
    Truncated(FinishReason),

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(#[from] TranscriptError),
}

#[derive(Clone, Debug)]
pub struct OrchestratorOptions {
    /// Tool-call rounds allowed before the request fails.
    pub max_tool_rounds: usize,
    pub step_timeout: Duration,
    pub tool_timeout: Duration,
    /// Identity used by [`Orchestrator::handle`] when the caller supplies none.
    pub default_user_id: UserId,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: config::DEFAULT_MAX_TOOL_ROUNDS,
            step_timeout: config::DEFAULT_STEP_TIMEOUT,
            tool_timeout: config::DEFAULT_TOOL_TIMEOUT,
            default_user_id: config::DEFAULT_USER_ID,
        }
    }
}

impl From<&Config> for OrchestratorOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_tool_rounds: config.max_tool_rounds,
            step_timeout: config.step_timeout,
            tool_timeout: config.tool_timeout,
            default_user_id: config.default_user_id,
        }
    }
}

/// Drives the exchange between the user, the model and the expense tools.
pub struct Orchestrator {
    llm: Option<Arc<dyn CompletionClient>>,
    tools: ToolRegistry,
    opts: OrchestratorOptions,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        llm: Option<Arc<dyn CompletionClient>>,
        tools: ToolRegistry,
        opts: OrchestratorOptions,
    ) -> Self {
        let system_prompt = system_prompt(&tools);
        Self {
            llm,
            tools,
            opts,
            system_prompt,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.opts
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub async fn handle(&self, request: ChatRequest) -> ChatResponse {
        self.handle_as(request, self.opts.default_user_id).await
    }

    /// Answers `request` on behalf of `user_id`. Never fails: every error is
    /// folded into an unsuccessful [`ChatResponse`].
    pub async fn handle_as(&self, request: ChatRequest, user_id: UserId) -> ChatResponse {
        let Some(llm) = &self.llm else {
            tracing::debug!("Chat requested while unconfigured");
            return ChatResponse::answer(UNCONFIGURED_MESSAGE);
        };

        let mut transcript =
            Transcript::new(&self.system_prompt, request.history, &request.message);
        let span = tracing::info_span!(
            "chat",
            request_id = %transcript.id,
            started_at = %transcript.created_at,
            model = llm.model(),
            user_id
        );
        let ctx = ToolContext { user_id };

        match self
            .run(llm.as_ref(), &mut transcript, &ctx)
            .instrument(span)
            .await
        {
            Ok(answer) => ChatResponse::answer(answer),
            Err(e) => {
                tracing::error!(request_id = %transcript.id, error = %e, "Chat request failed");
                ChatResponse::failure(APOLOGY_MESSAGE, e.to_string())
            }
        }
    }

    /// Runs the completion/tool loop over `transcript` until the model gives a
    /// final answer, which is also appended to the transcript.
    pub async fn run(
        &self,
        llm: &dyn CompletionClient,
        transcript: &mut Transcript,
        ctx: &ToolContext,
    ) -> Result<String, ChatError> {
        let mut rounds = 0;
        loop {
            let completion = match timeout(
                self.opts.step_timeout,
                llm.complete(transcript.messages(), self.tools.schemas()),
            )
            .await
            {
                Ok(Ok(c)) => c,
                Ok(Err(e)) => return Err(ChatError::Completion(format!("{:#}", e))),
                Err(_) => return Err(ChatError::CompletionTimeout(self.opts.step_timeout)),
            };

            if !completion.wants_tools() {
                if completion.finish_reason.is_truncated() {
                    tracing::warn!(
                        finish_reason = completion.finish_reason.as_str(),
                        "Final answer was cut off"
                    );
                    return Err(ChatError::Truncated(completion.finish_reason));
                }
                let text = completion
                    .message
                    .content
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                if text.is_empty() {
                    return Err(ChatError::EmptyResponse);
                }
                tracing::info!(rounds, "Chat resolved");
                transcript.push_assistant(text.clone());
                return Ok(text);
            }

            if rounds == self.opts.max_tool_rounds {
                tracing::warn!(rounds, "Tool round limit reached");
                return Err(ChatError::RoundLimitExceeded(rounds));
            }
            rounds += 1;
            self.run_tool_round(completion.message, transcript, ctx, rounds)
                .await?;
        }
    }

    /// Dispatches every call of one batch concurrently and records the results
    /// in issue order. All siblings run to completion even if one fails; an
    /// upstream failure then aborts the request once the round is recorded.
    async fn run_tool_round(
        &self,
        assistant: Message,
        transcript: &mut Transcript,
        ctx: &ToolContext,
        round: usize,
    ) -> Result<(), ChatError> {
        let calls = assistant.pending_calls().to_vec();
        let names: Vec<&str> = calls.iter().map(|c| c.function.name.as_str()).collect();
        tracing::info!(round, tools = ?names, "Dispatching tool calls");

        let outcomes = join_all(calls.iter().map(|call| self.dispatch_one(call, ctx))).await;

        let mut results = Vec::with_capacity(calls.len());
        let mut failure = None;
        for (call, outcome) in calls.iter().zip(outcomes) {
            match outcome {
                Ok(content) => results.push((call.id.clone(), content)),
                Err(e) => {
                    results.push((call.id.clone(), error_payload(e.to_string())));
                    failure.get_or_insert(e);
                }
            }
        }

        transcript.push_tool_round(assistant, results)?;
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn dispatch_one(&self, call: &ToolCall, ctx: &ToolContext) -> Result<String, ChatError> {
        let name = call.function.name.clone();
        match timeout(self.opts.tool_timeout, self.tools.dispatch(call, ctx)).await {
            Ok(Ok(content)) => {
                tracing::debug!(
                    tool = %name,
                    call_id = %call.id,
                    output = %clip(&content, LOG_CLIP),
                    "Tool result"
                );
                Ok(content)
            }
            Ok(Err(source)) => {
                tracing::error!(tool = %name, error = %source, "Tool hit an upstream failure");
                Err(ChatError::Tool { tool: name, source })
            }
            Err(_) => {
                tracing::error!(tool = %name, "Tool call timed out");
                Err(ChatError::ToolTimeout(name, self.opts.tool_timeout))
            }
        }
    }
}
