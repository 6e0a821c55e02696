//! Hit dice pool bookkeeping.
//!
//! The maximum is derived from level (`level + 1`) and the die size from
//! class. Only the current count is stored, as one integer flag on the
//! character. A character that has never spent a die has no flag and
//! reads as full.

use crate::character::Character;
use crate::class_table;
use crate::config::RestConfig;
use crate::dice::DieType;
use crate::error::StoreError;
use crate::store::CharacterStore;
use serde_json::Value;

/// Typed accessor for a character's hit dice.
#[derive(Debug, Clone)]
pub struct HitDicePool {
    namespace: String,
    key: String,
}

impl HitDicePool {
    pub fn new(config: &RestConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            key: config.hit_dice_key.clone(),
        }
    }

    pub fn max(&self, character: &Character) -> u32 {
        character.level.saturating_add(1)
    }

    /// Stored count capped at the current maximum. Unset, negative or
    /// non-integral values read as the maximum.
    pub fn current(&self, character: &Character) -> u32 {
        let max = self.max(character);
        let Some(stored) = character.flags.get(&self.namespace, &self.key) else {
            return max;
        };

        match stored_count(stored) {
            Some(count) => count.min(max as u64) as u32,
            None => {
                tracing::warn!(
                    character = %character.id,
                    value = %stored,
                    "Ignoring hit dice flag that is not a non-negative integer"
                );
                max
            }
        }
    }

    /// Clamp `value` to `0..=max` and persist it. Returns the stored count.
    pub async fn set_current(
        &self,
        store: &dyn CharacterStore,
        character: &mut Character,
        value: i64,
    ) -> Result<u32, StoreError> {
        let clamped = value.clamp(0, self.max(character) as i64) as u32;
        store
            .set_value(character.id, &self.namespace, &self.key, Value::from(clamped))
            .await?;
        character
            .flags
            .set(&self.namespace, &self.key, Value::from(clamped));

        tracing::debug!(character = %character.id, requested = value, stored = clamped, "Set hit dice");
        Ok(clamped)
    }

    /// Die size for the character's class, falling back to d8.
    pub fn die_type(&self, character: &Character) -> DieType {
        class_table::lookup(&character.class_name).unwrap_or_else(|| {
            tracing::warn!(
                character = %character.id,
                class = %character.class_name,
                default = %class_table::DEFAULT_DIE,
                "Unknown class, using default hit die"
            );
            class_table::DEFAULT_DIE
        })
    }

    pub fn con_modifier(&self, character: &Character) -> i32 {
        character.con_modifier.unwrap_or(0)
    }

    pub fn missing(&self, character: &Character) -> u32 {
        self.max(character) - self.current(character)
    }

    pub fn is_full(&self, character: &Character) -> bool {
        self.missing(character) == 0
    }

    /// Refill to the maximum. Returns how many dice were restored.
    pub async fn replenish(
        &self,
        store: &dyn CharacterStore,
        character: &mut Character,
    ) -> Result<u32, StoreError> {
        let restored = self.missing(character);
        let max = self.max(character);
        self.set_current(store, character, max as i64).await?;
        Ok(restored)
    }
}

fn stored_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64)
    })
}
