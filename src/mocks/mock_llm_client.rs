use crate::llm_client::CompletionClient;
use crate::types::{Completion, FinishReason, Message, Role, ToolCall};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Scripted {
    Reply(Completion),
    Fail(String),
    Stall(Duration),
}

/// Scripted completion endpoint. Replies are consumed in order; once the
/// script runs out, `fallback` (if any) is returned on every call.
#[derive(Clone)]
pub struct MockLlmClient {
    responses: Arc<Mutex<Vec<Scripted>>>,
    fallback: Arc<Mutex<Option<Completion>>>,
    call_history: Arc<Mutex<Vec<Vec<Message>>>>,
    tool_history: Arc<Mutex<Vec<Value>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            fallback: Arc::new(Mutex::new(None)),
            call_history: Arc::new(Mutex::new(Vec::new())),
            tool_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_text_response(&mut self, content: &str) {
        self.add_text_response_with_reason(content, FinishReason::Stop);
    }

    pub fn add_text_response_with_reason(&mut self, content: &str, finish_reason: FinishReason) {
        let response = Completion {
            message: Message::assistant(content),
            finish_reason,
        };
        self.responses.lock().unwrap().push(Scripted::Reply(response));
    }

    pub fn add_tool_call_response(&mut self, tool_name: &str, args: &str) {
        let id = format!("call_{}", self.responses.lock().unwrap().len());
        self.add_tool_calls_response(vec![ToolCall::new(id, tool_name, args)]);
    }

    pub fn add_tool_calls_response(&mut self, calls: Vec<ToolCall>) {
        let response = tool_calls_completion(calls);
        self.responses.lock().unwrap().push(Scripted::Reply(response));
    }

    pub fn add_error_response(&mut self, error_msg: &str) {
        self.responses
            .lock()
            .unwrap()
            .push(Scripted::Fail(error_msg.to_string()));
    }

    pub fn add_stalled_response(&mut self, delay: Duration) {
        self.responses.lock().unwrap().push(Scripted::Stall(delay));
    }

    /// Answers every call past the end of the script with the same tool call.
    pub fn repeat_tool_call(&mut self, tool_name: &str, args: &str) {
        let call = ToolCall::new("call_repeat", tool_name, args);
        *self.fallback.lock().unwrap() = Some(tool_calls_completion(vec![call]));
    }

    pub fn get_call_history(&self) -> Vec<Vec<Message>> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn get_tool_history(&self) -> Vec<Value> {
        self.tool_history.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    fn pop_response(&self) -> Option<Scripted> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            self.fallback
                .lock()
                .unwrap()
                .clone()
                .map(Scripted::Reply)
        } else {
            Some(responses.remove(0))
        }
    }
}

fn tool_calls_completion(calls: Vec<ToolCall>) -> Completion {
    Completion {
        message: Message {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        },
        finish_reason: FinishReason::ToolCalls,
    }
}

#[async_trait]
impl CompletionClient for MockLlmClient {
    async fn complete(&self, messages: &[Message], tools: &Value) -> Result<Completion> {
        // Store the call for verification
        self.call_history.lock().unwrap().push(messages.to_vec());
        self.tool_history.lock().unwrap().push(tools.clone());

        match self.pop_response() {
            Some(Scripted::Reply(completion)) => Ok(completion),
            Some(Scripted::Fail(msg)) => Err(anyhow::anyhow!("{}", msg)),
            Some(Scripted::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Err(anyhow::anyhow!("stalled response was not cancelled"))
            }
            None => Err(anyhow::anyhow!("No mock response available")),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
