use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{HistoryTurn, Message, Role};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("assistant turn carries no tool calls")]
    NoToolCalls,

    #[error("tool result for '{0}' does not match any call in the preceding assistant turn")]
    OrphanResult(String),

    #[error("expected {expected} tool results, got {actual}")]
    ResultCount { expected: usize, actual: usize },
}

/// The ordered turns sent to the model for a single chat request.
///
/// Built fresh per request: one system turn first, then caller history, then
/// the new user message. Tool turns can only be appended together with the
/// assistant turn that issued them.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub id: String,
    pub created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: &str, history: Vec<HistoryTurn>, user_message: &str) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(history.into_iter().map(Message::from));
        messages.push(Message::user(user_message));
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends the assistant turn carrying a batch of tool calls followed by one
    /// tool turn per result, in the order the calls were issued.
    ///
    /// `results` pairs each `tool_call_id` with its serialized output.
    pub fn push_tool_round(
        &mut self,
        assistant: Message,
        results: Vec<(String, String)>,
    ) -> Result<(), TranscriptError> {
        let calls = assistant.pending_calls();
        if calls.is_empty() {
            return Err(TranscriptError::NoToolCalls);
        }
        if calls.len() != results.len() {
            return Err(TranscriptError::ResultCount {
                expected: calls.len(),
                actual: results.len(),
            });
        }
        if let Some((orphan, _)) = results
            .iter()
            .find(|(id, _)| !calls.iter().any(|c| &c.id == id))
        {
            return Err(TranscriptError::OrphanResult(orphan.clone()));
        }

        self.messages.push(Message {
            role: Role::Assistant,
            ..assistant
        });
        self.messages.extend(
            results
                .into_iter()
                .map(|(id, content)| Message::tool(id, content)),
        );
        Ok(())
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Number of assistant turns that requested tools.
    pub fn tool_rounds(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant && !m.pending_calls().is_empty())
            .count()
    }
}
