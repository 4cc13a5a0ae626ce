use std::slice;

use uuid::Uuid;

use crate::error::{Result, RoastError};
use crate::models::{SessionView, TargetBinding, Turn};

/// In-memory state of one conversation: its turns in chronological order and
/// the target they are about. Nothing here outlives the process.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    id: Uuid,
    turns: Vec<Turn>,
    target: Option<TargetBinding>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Creates an empty, unbound conversation.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
            target: None,
        }
    }

    /// Creates a conversation seeded with a single persona system turn.
    pub fn with_persona(persona: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.append(Turn::system(persona));
        store
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drops every turn and the target binding, and starts a fresh
    /// conversation id.
    pub fn reset(&mut self) {
        log::info!("Resetting conversation {}", self.id);
        self.id = Uuid::new_v4();
        self.turns.clear();
        self.target = None;
    }

    /// Validates and locks the target for this conversation.
    pub fn bind_target(&mut self, name: &str, relation: &str) -> Result<&TargetBinding> {
        let binding = TargetBinding::new(name, relation)?;
        self.bind(binding)
    }

    /// Locks an already validated binding. Re-binding requires [`reset`] first.
    ///
    /// [`reset`]: ConversationStore::reset
    pub fn bind(&mut self, binding: TargetBinding) -> Result<&TargetBinding> {
        if let Some(existing) = &self.target {
            log::warn!(
                "Refusing to re-bind conversation {} from '{}' to '{}'",
                self.id,
                existing.name(),
                binding.name()
            );
            return Err(RoastError::TargetAlreadyBound(existing.name().to_string()));
        }
        log::debug!(
            "Binding conversation {} to target '{}' (relation: {})",
            self.id,
            binding.name(),
            binding.relation()
        );
        let bound = self.target.insert(binding);
        Ok(&*bound)
    }

    pub fn target(&self) -> Option<&TargetBinding> {
        self.target.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Iterates the turns in insertion order. The iterator is `Clone`, so a
    /// consumer can restart it, and the borrow keeps the store from growing
    /// underneath it.
    pub fn all_turns(&self) -> slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Owned copy of the current state for rendering.
    pub fn snapshot(&self) -> SessionView {
        SessionView {
            conversation_id: self.id,
            target: self.target.clone(),
            turns: self.turns.clone(),
        }
    }
}
