//! Error types for hit dice and rest operations.

use crate::character::{CharacterId, ItemId};
use crate::dice::DiceError;
use thiserror::Error;

/// Rejected requests. Always raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Not enough hit dice: {requested} requested, {available} available")]
    InsufficientDice { requested: u32, available: u32 },

    #[error("At least one hit die must be spent (requested {requested})")]
    BelowMinimumDiceCount { requested: u32 },

    #[error("{entry} level {level} spell slots are already full")]
    SlotFull { entry: String, level: u8 },

    #[error("Spellcasting entry not found: {0}")]
    EntryNotFound(ItemId),

    #[error("Invalid spell slot level: {0} (expected 1-10)")]
    InvalidSlotLevel(u8),
}

/// Errors from the character store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Spellcasting entry {entry} has no slot level {level}")]
    SlotNotFound { entry: ItemId, level: u8 },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from healing, slot recovery and rest operations.
#[derive(Debug, Error)]
pub enum RestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("Roll error: {0}")]
    Dice(#[from] DiceError),
}

impl RestError {
    /// Returns the validation failure, if this was one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            RestError::Validation(err) => Some(err),
            _ => None,
        }
    }
}
