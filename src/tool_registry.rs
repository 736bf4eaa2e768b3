use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::{ExpenseStore, StoreError};
use crate::tools::{self, ToolContext, ToolError, ToolHandler};
use crate::types::ToolCall;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Parameter {
    #[serde(skip)]
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: &'static str,
    #[serde(skip)]
    pub required: bool,
}

impl Parameter {
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            required: true,
        }
    }

    pub fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// Object schema for a tool's arguments. The same declaration is shown to the
/// model and used to check what it sends back.
#[derive(Clone, Debug, Default)]
pub struct ParameterSchema {
    pub params: Vec<Parameter>,
}

impl ParameterSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), json!(p)))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Checks object shape, required fields and primitive types. Unknown
    /// fields are ignored; `null` counts as absent.
    pub fn validate(&self, args: &Value) -> Result<(), String> {
        let obj = args
            .as_object()
            .ok_or_else(|| "arguments must be a JSON object".to_string())?;
        for p in &self.params {
            match obj.get(p.name) {
                None | Some(Value::Null) if p.required => {
                    return Err(format!("missing required argument '{}'", p.name));
                }
                None | Some(Value::Null) => {}
                Some(v) if !p.param_type.accepts(v) => {
                    return Err(format!(
                        "argument '{}' must be of type {}",
                        p.name,
                        p.param_type.as_str()
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: ParameterSchema,
}

impl ToolDefinition {
    /// Chat-completions `tools` entry.
    pub fn to_openai(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters.to_json(),
            }
        })
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

pub fn error_payload(message: impl Into<String>) -> String {
    json!({ "error": message.into() }).to_string()
}

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<Vec<RegisteredTool>>,
    by_name: Arc<HashMap<&'static str, usize>>,
    schemas: Arc<Value>,
}

impl ToolRegistry {
    /// The expense catalog, every handler backed by `store`.
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self::from_handlers(tools::catalog(store))
    }

    pub fn from_handlers(handlers: Vec<Arc<dyn ToolHandler>>) -> Self {
        let mut tools = Vec::with_capacity(handlers.len());
        let mut by_name = HashMap::with_capacity(handlers.len());
        for handler in handlers {
            let definition = handler.definition();
            if by_name.contains_key(definition.name) {
                tracing::warn!(tool = definition.name, "Duplicate tool name ignored");
                continue;
            }
            by_name.insert(definition.name, tools.len());
            tools.push(RegisteredTool { definition, handler });
        }
        // Single source of truth for "tools" schema the LLM sees
        let schemas = Value::Array(tools.iter().map(|t| t.definition.to_openai()).collect());
        Self {
            tools: Arc::new(tools),
            by_name: Arc::new(by_name),
            schemas: Arc::new(schemas),
        }
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn schemas(&self) -> &Value {
        &self.schemas
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.definition.name).collect()
    }

    fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Runs one tool call and returns the text for its `tool` turn.
    ///
    /// Unknown tools, malformed or invalid arguments and rejected store requests
    /// come back as `{"error": ...}` payloads so the model can correct itself.
    /// Only upstream store failures are returned as `Err`.
    pub async fn dispatch(&self, call: &ToolCall, ctx: &ToolContext) -> Result<String, StoreError> {
        let name = call.function.name.as_str();
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, call_id = %call.id, "Model requested unknown function");
            return Ok(error_payload(format!("Unknown function: {}", name)));
        };

        let raw = call.function.arguments.trim();
        let args: Value = if raw.is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_str(raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(tool = name, error = %e, "Unparseable tool arguments");
                    return Ok(error_payload(format!(
                        "Failed to parse arguments for {}: {}",
                        name, e
                    )));
                }
            }
        };

        if let Err(e) = tool.definition.parameters.validate(&args) {
            tracing::warn!(tool = name, error = %e, "Tool arguments failed validation");
            return Ok(error_payload(format!("Invalid arguments for {}: {}", name, e)));
        }

        match tool.handler.call(args, ctx).await {
            Ok(value) => Ok(value.to_string()),
            Err(ToolError::Store(e)) if e.is_upstream() => Err(e),
            Err(e) => Ok(error_payload(e.to_string())),
        }
    }
}
