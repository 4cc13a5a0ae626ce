use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RoastError};

/// Relation stored when the user leaves the relation field blank.
pub const UNKNOWN_RELATION: &str = "unknown";

// Who authored a turn
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation. Turns are immutable once created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Turn {
    id: Uuid,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// The person being roasted, locked for the lifetime of a conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TargetBinding {
    name: String,
    relation: String,
}

impl TargetBinding {
    /// Validates raw form input. The name must contain something other than
    /// whitespace; a blank relation becomes [`UNKNOWN_RELATION`]. Both values
    /// are otherwise kept verbatim.
    pub fn new(name: &str, relation: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(RoastError::invalid_input(
                "Please enter a target name first!",
            ));
        }
        let relation = if relation.trim().is_empty() {
            UNKNOWN_RELATION.to_string()
        } else {
            relation.to_string()
        };
        Ok(Self {
            name: name.to_string(),
            relation,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn has_known_relation(&self) -> bool {
        self.relation != UNKNOWN_RELATION
    }
}

/// Fixed decoding parameters sent with every completion request.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DecodingParams {
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub max_length: u32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            temperature: 0.9,
            max_length: 2048,
        }
    }
}

impl DecodingParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_new_tokens == 0 {
            return Err(RoastError::configuration(
                "max new tokens must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(RoastError::configuration(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.max_length < self.max_new_tokens {
            return Err(RoastError::configuration(format!(
                "max length ({}) must be at least max new tokens ({})",
                self.max_length, self.max_new_tokens
            )));
        }
        Ok(())
    }
}

/// How the one-shot roast prompt reaches the service.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PromptRoute {
    /// Wrap the prompt in a single user message on the chat endpoint.
    #[default]
    Chat,
    /// Send the raw prompt to the text-generation endpoint.
    TextGeneration,
}

impl FromStr for PromptRoute {
    type Err = RoastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(PromptRoute::Chat),
            "text-generation" | "text_generation" => Ok(PromptRoute::TextGeneration),
            other => Err(RoastError::configuration(format!(
                "unknown prompt route '{}', expected 'chat' or 'text-generation'",
                other
            ))),
        }
    }
}

// Represents the configured remote model
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub model: String,   // e.g. "deepseek-ai/DeepSeek-V3.1"
    pub api_url: String, // Base URL, no trailing path
    pub prompt_route: PromptRoute,
    pub decoding: DecodingParams,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Snapshot handed to the presentation layer after every action.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SessionView {
    pub conversation_id: Uuid,
    pub target: Option<TargetBinding>,
    pub turns: Vec<Turn>,
}
