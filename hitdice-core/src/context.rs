//! Shared handles to the host-provided ports.

use crate::config::RestConfig;
use crate::dice::RollEngine;
use crate::error::{RestError, ValidationError};
use crate::notify::{ChatMessage, Notifier};
use crate::store::CharacterStore;
use std::sync::Arc;

/// Everything the engines and the rest controller talk to.
#[derive(Clone)]
pub struct RestContext {
    pub store: Arc<dyn CharacterStore>,
    pub roller: Arc<dyn RollEngine>,
    pub notifier: Arc<dyn Notifier>,
    pub config: RestConfig,
}

impl RestContext {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        roller: Arc<dyn RollEngine>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            roller,
            notifier,
            config: RestConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RestConfig) -> Self {
        self.config = config;
        self
    }

    /// Surface a validation failure to the user and turn it into an error.
    pub(crate) fn reject(&self, err: ValidationError) -> RestError {
        self.notifier.warn(&err.to_string());
        err.into()
    }

    /// Post to chat, or fall back to an info notification when chat is off.
    pub(crate) async fn announce(&self, message: ChatMessage) {
        if self.config.announce_in_chat {
            self.notifier.post_message(message).await;
        } else {
            self.notifier.info(&message.content);
        }
    }
}
