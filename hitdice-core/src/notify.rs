//! User-facing notifications and chat output.

use crate::character::{Character, CharacterId};
use crate::dice::RollResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who a chat message is posted as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub character_id: CharacterId,
    pub alias: String,
}

impl Speaker {
    pub fn of(character: &Character) -> Self {
        Self {
            character_id: character.id,
            alias: character.name.clone(),
        }
    }
}

/// A message for the game's chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub speaker: Speaker,
    pub roll: Option<RollResult>,
}

impl ChatMessage {
    pub fn new(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            speaker,
            roll: None,
        }
    }

    pub fn with_roll(mut self, roll: RollResult) -> Self {
        self.roll = Some(roll);
        self
    }
}

/// Notification and chat channel provided by the host.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn warn(&self, text: &str);
    fn info(&self, text: &str);
    fn error(&self, text: &str);

    async fn post_message(&self, message: ChatMessage);

    /// Ask the presentation layer to redraw the character's sheet.
    async fn refresh_sheet(&self, _character_id: CharacterId) {}
}

/// Notifier that emits everything as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    fn warn(&self, text: &str) {
        tracing::warn!("{text}");
    }

    fn info(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn error(&self, text: &str) {
        tracing::error!("{text}");
    }

    async fn post_message(&self, message: ChatMessage) {
        match message.roll {
            Some(ref roll) => tracing::info!(
                speaker = %message.speaker.alias,
                formula = %roll.formula,
                total = roll.total,
                "{}",
                message.content
            ),
            None => tracing::info!(speaker = %message.speaker.alias, "{}", message.content),
        }
    }

    async fn refresh_sheet(&self, character_id: CharacterId) {
        tracing::debug!(character = %character_id, "Sheet refresh requested");
    }
}
