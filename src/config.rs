use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::store::UserId;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
/// The seeded manager account.
pub const DEFAULT_USER_ID: UserId = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection details for the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` leaves the chat assistant unconfigured.
    pub llm: Option<LlmSettings>,
    pub max_tool_rounds: usize,
    pub step_timeout: Duration,
    pub tool_timeout: Duration,
    pub default_user_id: UserId,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let temperature = parse_or(
            "OPENAI_TEMPERATURE",
            get("OPENAI_TEMPERATURE"),
            DEFAULT_TEMPERATURE,
        )?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                name: "OPENAI_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            });
        }

        let llm = match (get("OPENAI_BASE_URL"), get("OPENAI_MODEL")) {
            (Some(base_url), Some(model)) => Some(LlmSettings {
                base_url,
                api_key: get("OPENAI_API_KEY"),
                model,
                temperature,
            }),
            _ => None,
        };

        let max_tool_rounds = parse_or(
            "CHAT_MAX_TOOL_ROUNDS",
            get("CHAT_MAX_TOOL_ROUNDS"),
            DEFAULT_MAX_TOOL_ROUNDS,
        )?;
        if max_tool_rounds == 0 {
            return Err(ConfigError::Invalid {
                name: "CHAT_MAX_TOOL_ROUNDS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let step_secs = parse_or(
            "CHAT_STEP_TIMEOUT_SECS",
            get("CHAT_STEP_TIMEOUT_SECS"),
            DEFAULT_STEP_TIMEOUT.as_secs(),
        )?;
        let tool_secs = parse_or(
            "CHAT_TOOL_TIMEOUT_SECS",
            get("CHAT_TOOL_TIMEOUT_SECS"),
            DEFAULT_TOOL_TIMEOUT.as_secs(),
        )?;

        Ok(Self {
            llm,
            max_tool_rounds,
            step_timeout: Duration::from_secs(step_secs),
            tool_timeout: Duration::from_secs(tool_secs),
            default_user_id: parse_or("DEFAULT_USER_ID", get("DEFAULT_USER_ID"), DEFAULT_USER_ID)?,
            bind_addr: parse_or(
                "BIND_ADDR",
                get("BIND_ADDR"),
                SocketAddr::from(([127, 0, 0, 1], 3000)),
            )?,
        })
    }

    pub fn chat_configured(&self) -> bool {
        self.llm.is_some()
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
