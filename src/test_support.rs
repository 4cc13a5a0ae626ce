use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::LLMApiProvider;
use crate::config::AppConfig;
use crate::models::{DecodingParams, ModelConfig, PromptRoute, Turn};

pub fn test_config(persona: Option<&str>) -> AppConfig {
    AppConfig {
        model: ModelConfig {
            model: "test/model".to_string(),
            api_url: "http://localhost:0".to_string(),
            prompt_route: PromptRoute::Chat,
            decoding: DecodingParams::default(),
            request_timeout: Duration::from_secs(1),
        },
        api_key: "test-key".to_string(),
        persona: persona.map(str::to_string),
    }
}

/// Answers requests from a fixed script and records what it was sent.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, &'static str>>>,
    prompts: Mutex<Vec<String>>,
    histories: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, &'static str>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::new(vec![Err("service unavailable"); 8])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn histories(&self) -> Vec<Vec<Turn>> {
        self.histories.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len() + self.histories.lock().unwrap().len()
    }

    fn next(&self) -> anyhow::Result<String> {
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => Err(anyhow::anyhow!("script exhausted")),
        }
    }
}

#[async_trait]
impl LLMApiProvider for ScriptedProvider {
    async fn send_prompt_request(
        &self,
        _config: &ModelConfig,
        _api_key: &str,
        prompt: &str,
    ) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.next()
    }

    async fn send_chat_request(
        &self,
        _config: &ModelConfig,
        _api_key: &str,
        turns: &[Turn],
    ) -> anyhow::Result<String> {
        self.histories.lock().unwrap().push(turns.to_vec());
        self.next()
    }
}
