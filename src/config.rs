use crate::error::{Result, RoastError};
use crate::models::{DecodingParams, ModelConfig, PromptRoute};
use keyring::Entry;
use std::str::FromStr;
use std::time::Duration;

pub const MODEL_VAR: &str = "ROAST_MODEL";
pub const API_KEY_REF_VAR: &str = "ROAST_API_KEY_REF";
pub const API_URL_VAR: &str = "ROAST_API_URL";
pub const PROMPT_ROUTE_VAR: &str = "ROAST_PROMPT_ROUTE";
pub const MAX_NEW_TOKENS_VAR: &str = "ROAST_MAX_NEW_TOKENS";
pub const TEMPERATURE_VAR: &str = "ROAST_TEMPERATURE";
pub const MAX_LENGTH_VAR: &str = "ROAST_MAX_LENGTH";
pub const TIMEOUT_VAR: &str = "ROAST_TIMEOUT_SECS";
pub const PERSONA_VAR: &str = "ROAST_PERSONA";

pub const DEFAULT_API_KEY_REF: &str = "env:HUGGINGFACEHUB_API_TOKEN";
pub const DEFAULT_API_URL: &str = "https://router.huggingface.co";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const KEYRING_SERVICE: &str = "roastchat_api_key";

/// Everything the core needs from the hosting environment, resolved once at
/// startup.
#[derive(Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub api_key: String,
    pub persona: Option<String>,
}

// Keep the credential out of debug output
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("persona", &self.persona)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => log::debug!("No .env file found"),
            Err(e) => return Err(RoastError::configuration(format!("Failed to read .env: {}", e))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = get(MODEL_VAR)
            .map(|m| m.trim().to_string())
            .ok_or_else(|| RoastError::configuration(format!("{} is not set", MODEL_VAR)))?;
        let api_url = get(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let prompt_route = match get(PROMPT_ROUTE_VAR) {
            Some(route) => route.parse()?,
            None => PromptRoute::default(),
        };

        let defaults = DecodingParams::default();
        let decoding = DecodingParams {
            max_new_tokens: parse_or(&get, MAX_NEW_TOKENS_VAR, defaults.max_new_tokens)?,
            temperature: parse_or(&get, TEMPERATURE_VAR, defaults.temperature)?,
            max_length: parse_or(&get, MAX_LENGTH_VAR, defaults.max_length)?,
        };
        decoding.validate()?;

        let timeout_secs: u64 = parse_or(&get, TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(RoastError::configuration(format!(
                "{} must be greater than zero",
                TIMEOUT_VAR
            )));
        }

        let model = ModelConfig {
            model,
            api_url,
            prompt_route,
            decoding,
            request_timeout: Duration::from_secs(timeout_secs),
        };

        let key_ref = get(API_KEY_REF_VAR).unwrap_or_else(|| DEFAULT_API_KEY_REF.to_string());
        let api_key = get_api_key(&key_ref, &model.model, &lookup)?;

        Ok(Self {
            model,
            api_key,
            persona: get(PERSONA_VAR),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            RoastError::configuration(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

/// Resolves the credential named by `key_ref`: either `env:<VAR>` or
/// `keyring` (looked up under the model identifier).
pub fn get_api_key<F>(key_ref: &str, model: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let key = match key_ref.trim() {
        r if r.starts_with("env:") => {
            let env_var_name = r.trim_start_matches("env:");
            log::debug!("Retrieving API key from environment variable: {}", env_var_name);
            lookup(env_var_name).ok_or_else(|| {
                RoastError::configuration(format!(
                    "API key environment variable '{}' is not set",
                    env_var_name
                ))
            })?
        }
        "keyring" => {
            log::debug!("Retrieving API key from keyring for service: {}", KEYRING_SERVICE);
            let entry = Entry::new(KEYRING_SERVICE, model).map_err(|e| {
                RoastError::configuration(format!("Failed to create keyring entry: {}", e))
            })?;
            entry.get_password().map_err(|e| {
                RoastError::configuration(format!(
                    "Failed to get API key from keyring for '{}': {}",
                    model, e
                ))
            })?
        }
        other => {
            return Err(RoastError::configuration(format!(
                "Unsupported api key reference: {}",
                other
            )))
        }
    };

    if key.trim().is_empty() {
        return Err(RoastError::configuration("API key is empty"));
    }
    Ok(key)
}
