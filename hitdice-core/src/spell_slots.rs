//! Spell slot recovery paid for with hit dice.
//!
//! Restoring one slot costs as many hit dice as the slot's level. Only
//! prepared and spontaneous entries have slots; innate, focus and ritual
//! casting never qualify.

use crate::character::{Character, FieldUpdate, ItemId, UpdateOptions, MAX_SLOT_LEVEL};
use crate::context::RestContext;
use crate::error::{RestError, ValidationError};
use crate::notify::{ChatMessage, Speaker};
use crate::pool::HitDicePool;
use crate::store;
use serde::{Deserialize, Serialize};

/// A slot level with charges missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepletedSlot {
    pub entry_id: ItemId,
    pub entry_name: String,
    pub level: u8,
    pub current: u8,
    pub max: u8,
}

impl DepletedSlot {
    /// Hit dice needed to restore one charge.
    pub fn cost(&self) -> u32 {
        self.level as u32
    }
}

/// Result of restoring one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRestored {
    pub entry_id: ItemId,
    pub entry_name: String,
    pub level: u8,
    pub slot_value: u8,
    pub slot_max: u8,
    pub dice_spent: u32,
    pub dice_remaining: u32,
}

pub struct SpellSlotRecovery {
    ctx: RestContext,
    pool: HitDicePool,
}

impl SpellSlotRecovery {
    pub fn new(ctx: RestContext) -> Self {
        let pool = HitDicePool::new(&ctx.config);
        Self { ctx, pool }
    }

    pub fn is_spellcaster(&self, character: &Character) -> bool {
        character
            .spellcasting
            .iter()
            .any(|entry| entry.casting.uses_slots())
    }

    /// Depleted slots across all slot-using entries, lowest level first.
    pub fn depleted_slots(&self, character: &Character) -> Vec<DepletedSlot> {
        let mut depleted: Vec<DepletedSlot> = character
            .spellcasting
            .iter()
            .filter(|entry| entry.casting.uses_slots())
            .flat_map(|entry| {
                (1..=MAX_SLOT_LEVEL).filter_map(move |level| {
                    let slot = entry.slot(level)?;
                    slot.is_depleted().then(|| DepletedSlot {
                        entry_id: entry.id,
                        entry_name: entry.name.clone(),
                        level,
                        current: slot.value,
                        max: slot.max,
                    })
                })
            })
            .collect();
        // Stable, so entries keep their order within a level.
        depleted.sort_by_key(|slot| slot.level);
        depleted
    }

    /// Depleted slots the character can currently afford.
    pub fn restorable_slots(&self, character: &Character) -> Vec<DepletedSlot> {
        let available = self.pool.current(character);
        self.depleted_slots(character)
            .into_iter()
            .filter(|slot| slot.cost() <= available)
            .collect()
    }

    /// Restore one charge of `level` on `entry_id`, paying `level` hit dice.
    pub async fn restore_slot(
        &self,
        character: &mut Character,
        entry_id: ItemId,
        level: u8,
    ) -> Result<SlotRestored, RestError> {
        let cost = level as u32;
        let available = self.pool.current(character);
        if cost > available {
            return Err(self.ctx.reject(ValidationError::InsufficientDice {
                requested: cost,
                available,
            }));
        }

        let Some(entry) = character
            .spellcasting_entry(entry_id)
            .filter(|e| e.casting.uses_slots())
        else {
            return Err(self.ctx.reject(ValidationError::EntryNotFound(entry_id)));
        };
        let Some(slot) = entry.slot(level).copied() else {
            return Err(self.ctx.reject(ValidationError::InvalidSlotLevel(level)));
        };
        if slot.value >= slot.max {
            return Err(self.ctx.reject(ValidationError::SlotFull {
                entry: entry.name.clone(),
                level,
            }));
        }
        let entry_name = entry.name.clone();

        let slot_value = slot.value + 1;
        store::commit(
            self.ctx.store.as_ref(),
            character,
            &[FieldUpdate::SpellSlot {
                entry_id,
                level,
                value: slot_value,
            }],
            UpdateOptions::default(),
        )
        .await?;
        let dice_remaining = self
            .pool
            .set_current(
                self.ctx.store.as_ref(),
                character,
                available as i64 - cost as i64,
            )
            .await?;

        tracing::info!(
            character = %character.id,
            entry = %entry_name,
            level,
            dice_remaining,
            "Restored spell slot"
        );
        let content = format!(
            "{} spends {} hit {} to restore a level {} slot ({}). {} hit dice remaining.",
            character.name,
            cost,
            if cost == 1 { "die" } else { "dice" },
            level,
            entry_name,
            dice_remaining,
        );
        self.ctx
            .announce(ChatMessage::new(Speaker::of(character), content))
            .await;

        Ok(SlotRestored {
            entry_id,
            entry_name,
            level,
            slot_value,
            slot_max: slot.max,
            dice_spent: cost,
            dice_remaining,
        })
    }
}
