use crate::models::{ModelConfig, PromptRoute, Role, Turn};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Trait defining the interface for the remote text-generation service
#[async_trait]
pub trait LLMApiProvider: Send + Sync {
    /// Sends a single instruction with the configured decoding parameters.
    async fn send_prompt_request(
        &self,
        config: &ModelConfig,
        api_key: &str,
        prompt: &str,
    ) -> Result<String>;

    /// Sends the whole ordered history as role-tagged messages.
    async fn send_chat_request(
        &self,
        config: &ModelConfig,
        api_key: &str,
        turns: &[Turn],
    ) -> Result<String>;
}

// --- Chat completions (OpenAI compatible) ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequestBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool, // Always false, one response per request
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.content().to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

// --- Text generation (raw prompt + parameters) ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TextGenerationRequestBody {
    pub inputs: String,
    pub parameters: TextGenerationParameters,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TextGenerationParameters {
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub max_length: u32,
    pub return_full_text: bool,
}

#[derive(Deserialize, Debug)]
struct GeneratedText {
    generated_text: String,
}

// The endpoint answers with either a list or a single object
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TextGenerationResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

/// Translates stored turns one-to-one into the chat request, preserving order
/// and roles.
pub fn build_chat_request(config: &ModelConfig, turns: &[Turn]) -> ChatRequestBody {
    ChatRequestBody {
        model: config.model.clone(),
        messages: turns.iter().map(ChatMessage::from).collect(),
        max_tokens: config.decoding.max_new_tokens,
        temperature: config.decoding.temperature,
        stream: false,
    }
}

pub fn build_text_generation_request(config: &ModelConfig, prompt: &str) -> TextGenerationRequestBody {
    TextGenerationRequestBody {
        inputs: prompt.to_string(),
        parameters: TextGenerationParameters {
            max_new_tokens: config.decoding.max_new_tokens,
            temperature: config.decoding.temperature,
            max_length: config.decoding.max_length,
            return_full_text: false,
        },
    }
}

pub fn chat_url(config: &ModelConfig) -> String {
    format!("{}/v1/chat/completions", config.api_url.trim_end_matches('/'))
}

pub fn text_generation_url(config: &ModelConfig) -> String {
    format!(
        "{}/hf-inference/models/{}",
        config.api_url.trim_end_matches('/'),
        config.model
    )
}

pub struct HuggingFaceProvider {
    client: Client,
}

impl HuggingFaceProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<Failed to read error body>".to_string());
            log::error!("Completion request failed with status {}: {}", status, error_body);
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status,
                error_body
            ));
        }
        Ok(response)
    }

    async fn chat(&self, config: &ModelConfig, api_key: &str, messages: Vec<ChatMessage>) -> Result<String> {
        let url = chat_url(config);
        let body = ChatRequestBody {
            messages,
            ..build_chat_request(config, &[])
        };
        log::info!(
            "Sending chat request to {} using model {} ({} messages)",
            url,
            config.model,
            body.messages.len()
        );

        let response: ChatResponse = self
            .post(&url, api_key, &body)
            .await?
            .json()
            .await
            .context("Failed to decode chat completion response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Chat completion response contained no message content")?;
        non_empty(content)
    }
}

#[async_trait]
impl LLMApiProvider for HuggingFaceProvider {
    async fn send_prompt_request(
        &self,
        config: &ModelConfig,
        api_key: &str,
        prompt: &str,
    ) -> Result<String> {
        match config.prompt_route {
            PromptRoute::Chat => {
                let message = ChatMessage {
                    role: Role::User,
                    content: prompt.to_string(),
                };
                self.chat(config, api_key, vec![message]).await
            }
            PromptRoute::TextGeneration => {
                let url = text_generation_url(config);
                let body = build_text_generation_request(config, prompt);
                log::info!("Sending text-generation request to {}", url);

                let response: TextGenerationResponse = self
                    .post(&url, api_key, &body)
                    .await?
                    .json()
                    .await
                    .context("Failed to decode text-generation response")?;

                let generated = match response {
                    TextGenerationResponse::Many(items) => items
                        .into_iter()
                        .next()
                        .map(|item| item.generated_text)
                        .context("Text-generation response was an empty list")?,
                    TextGenerationResponse::One(item) => item.generated_text,
                };
                non_empty(generated)
            }
        }
    }

    async fn send_chat_request(
        &self,
        config: &ModelConfig,
        api_key: &str,
        turns: &[Turn],
    ) -> Result<String> {
        let messages = turns.iter().map(ChatMessage::from).collect();
        self.chat(config, api_key, messages).await
    }
}

// Blank completions count as failures
fn non_empty(text: String) -> Result<String> {
    if text.trim().is_empty() {
        anyhow::bail!("Completion service returned empty text");
    }
    Ok(text)
}
