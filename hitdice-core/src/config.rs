//! Module configuration.

use serde::{Deserialize, Serialize};

/// Flag namespace hit dice are stored under by default.
pub const DEFAULT_NAMESPACE: &str = "hit-dice";

/// Flag key holding the current hit dice count.
pub const DEFAULT_HIT_DICE_KEY: &str = "currentHitDice";

/// Configuration shared by the pool, engines and rest controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Flag namespace for this module's data on the character.
    pub namespace: String,

    /// Flag key for the current hit dice count.
    pub hit_dice_key: String,

    /// Post healing rolls and rest summaries to chat.
    pub announce_in_chat: bool,

    /// Ask the presentation layer to redraw after a long or full rest.
    pub refresh_after_rest: bool,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            hit_dice_key: DEFAULT_HIT_DICE_KEY.to_string(),
            announce_in_chat: true,
            refresh_after_rest: true,
        }
    }
}

impl RestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the flag namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the flag key for the hit dice count.
    pub fn with_hit_dice_key(mut self, key: impl Into<String>) -> Self {
        self.hit_dice_key = key.into();
        self
    }

    pub fn with_chat_announcements(mut self, enabled: bool) -> Self {
        self.announce_in_chat = enabled;
        self
    }

    pub fn with_refresh_after_rest(mut self, enabled: bool) -> Self {
        self.refresh_after_rest = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_keeps_defaults() {
        let config = RestConfig::from_json(r#"{"announce_in_chat": false}"#).unwrap();
        assert!(!config.announce_in_chat);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.hit_dice_key, DEFAULT_HIT_DICE_KEY);
        assert!(config.refresh_after_rest);
    }

    #[test]
    fn test_builder() {
        let config = RestConfig::new()
            .with_namespace("my-module")
            .with_hit_dice_key("dice")
            .with_refresh_after_rest(false);
        assert_eq!(config.namespace, "my-module");
        assert_eq!(config.hit_dice_key, "dice");
        assert!(!config.refresh_after_rest);
    }
}
