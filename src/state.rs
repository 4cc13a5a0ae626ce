use crate::api::LLMApiProvider;
use crate::config::AppConfig;
use crate::error::{Result, RoastError};
use crate::models::{ModelConfig, SessionView, TargetBinding, Turn};
use crate::prompt::PromptTemplate;
use crate::storage::ConversationStore;
use std::sync::Arc;

/// One interactive session: the current conversation plus everything needed
/// to talk to the completion service. Passed explicitly to whatever handles
/// user actions; there is no global state.
///
/// Failure policy: nothing is appended unless the completion succeeds. A
/// failed follow-up leaves no unanswered user turn behind, and a failed roast
/// leaves the target unbound so the user can simply try again.
pub struct Session {
    store: ConversationStore,
    api_provider: Arc<dyn LLMApiProvider>, // Hold the trait object
    model: ModelConfig,
    api_key: String,
    persona: Option<String>,
    template: PromptTemplate,
}

impl Session {
    pub fn new(config: AppConfig, api_provider: Arc<dyn LLMApiProvider>) -> Result<Self> {
        let template = PromptTemplate::roast()?;
        let store = fresh_store(config.persona.as_deref());
        Ok(Self {
            store,
            api_provider,
            model: config.model,
            api_key: config.api_key,
            persona: config.persona,
            template,
        })
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn target(&self) -> Option<&TargetBinding> {
        self.store.target()
    }

    pub fn view(&self) -> SessionView {
        self.store.snapshot()
    }

    /// Renders the roast instruction for a target without sending it.
    pub fn roast_prompt(&self, target: &TargetBinding) -> Result<String> {
        self.template.render_for(target)
    }

    /// Produces the opening roast and locks the target.
    pub async fn submit_roast(&mut self, name: &str, relation: &str) -> Result<SessionView> {
        if let Some(existing) = self.store.target() {
            return Err(RoastError::TargetAlreadyBound(existing.name().to_string()));
        }
        let target = TargetBinding::new(name, relation)?;
        let prompt = self.roast_prompt(&target)?;

        log::info!(
            "Requesting roast for '{}' in conversation {}",
            target.name(),
            self.store.id()
        );
        let roast = self
            .api_provider
            .send_prompt_request(&self.model, &self.api_key, &prompt)
            .await
            .map_err(|e| {
                log::error!("Roast request failed: {:?}", e);
                RoastError::completion(&e)
            })?;

        self.store.bind(target)?;
        self.store.append(Turn::assistant(roast));
        Ok(self.view())
    }

    /// Sends a follow-up message with the full history and records the reply.
    pub async fn send_message(&mut self, text: &str) -> Result<SessionView> {
        if !self.store.is_bound() {
            return Err(RoastError::invalid_input(
                "Roast somebody first, then keep the conversation going.",
            ));
        }
        if text.trim().is_empty() {
            return Err(RoastError::invalid_input("Message is empty."));
        }

        let user_turn = Turn::user(text);
        let mut history: Vec<Turn> = self.store.all_turns().cloned().collect();
        history.push(user_turn.clone());

        log::info!(
            "Sending follow-up in conversation {} ({} turns)",
            self.store.id(),
            history.len()
        );
        let reply = self
            .api_provider
            .send_chat_request(&self.model, &self.api_key, &history)
            .await
            .map_err(|e| {
                log::error!("Follow-up request failed: {:?}", e);
                RoastError::completion(&e)
            })?;

        self.store.append(user_turn);
        self.store.append(Turn::assistant(reply));
        Ok(self.view())
    }

    /// Starts a new conversation, dropping turns and the target.
    pub fn reset(&mut self) -> SessionView {
        self.store.reset();
        if let Some(persona) = &self.persona {
            self.store.append(Turn::system(persona.clone()));
        }
        self.view()
    }
}

fn fresh_store(persona: Option<&str>) -> ConversationStore {
    match persona {
        Some(persona) => ConversationStore::with_persona(persona),
        None => ConversationStore::new(),
    }
}
