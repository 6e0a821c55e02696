//! Healing rolls paid for with hit dice.
//!
//! Each die spent heals at least 1 HP, whatever the roll or modifier, and
//! healing never goes past maximum HP. A roll is evaluated, then HP is
//! written, then the pool is decremented, and only then is the result
//! announced.

use crate::character::{Character, FieldUpdate, UpdateOptions};
use crate::context::RestContext;
use crate::dice::{DieType, HealingFormula, RollResult};
use crate::error::{RestError, ValidationError};
use crate::notify::{ChatMessage, Speaker};
use crate::pool::HitDicePool;
use crate::store;
use serde::{Deserialize, Serialize};

/// Lowest and highest possible healing for a roll, after the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealingRange {
    pub min: i32,
    pub max: i32,
}

/// Healing range for `dice_count` dice with the modifier applied per die.
///
/// Arithmetic saturates at the `i32` bounds.
pub fn calculate_range(dice_count: u32, die_type: DieType, con_mod: i32) -> HealingRange {
    let count = dice_floor(dice_count);
    let total_mod = total_modifier(dice_count, con_mod);
    let highest = (die_type.sides() as i32).saturating_mul(count);
    HealingRange {
        min: count.max(count.saturating_add(total_mod)),
        max: count.max(highest.saturating_add(total_mod)),
    }
}

/// Formula string for a healing roll, e.g. `3d8+6`.
pub fn build_formula(dice_count: u32, die_type: DieType, con_mod: i32) -> String {
    HealingFormula::new(dice_count, die_type, total_modifier(dice_count, con_mod)).to_string()
}

/// Minimum healing for `dice_count` dice: one per die.
fn dice_floor(dice_count: u32) -> i32 {
    i32::try_from(dice_count).unwrap_or(i32::MAX)
}

fn total_modifier(dice_count: u32, con_mod: i32) -> i32 {
    con_mod.saturating_mul(dice_floor(dice_count))
}

/// What a roll would look like, for display before committing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealingPreview {
    pub formula: String,
    pub range: HealingRange,
    pub dice_available: u32,
}

/// Result of spending hit dice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingOutcome {
    pub formula: String,
    pub roll: RollResult,
    /// Roll total after the one-per-die floor.
    pub healing: i32,
    /// HP actually restored after the max HP cap.
    pub actual_healing: i32,
    pub dice_spent: u32,
    pub dice_remaining: u32,
    pub was_limited: bool,
}

/// Spends hit dice to restore hit points.
pub struct HealingEngine {
    ctx: RestContext,
    pool: HitDicePool,
}

impl HealingEngine {
    pub fn new(ctx: RestContext) -> Self {
        let pool = HitDicePool::new(&ctx.config);
        Self { ctx, pool }
    }

    pub fn pool(&self) -> &HitDicePool {
        &self.pool
    }

    pub fn preview(&self, character: &Character, dice_count: u32) -> HealingPreview {
        let die_type = self.pool.die_type(character);
        let con_mod = self.pool.con_modifier(character);
        HealingPreview {
            formula: build_formula(dice_count, die_type, con_mod),
            range: calculate_range(dice_count, die_type, con_mod),
            dice_available: self.pool.current(character),
        }
    }

    /// Spend `dice_count` hit dice and heal the character.
    pub async fn roll_and_heal(
        &self,
        character: &mut Character,
        dice_count: u32,
    ) -> Result<HealingOutcome, RestError> {
        if dice_count < 1 {
            return Err(self.ctx.reject(ValidationError::BelowMinimumDiceCount {
                requested: dice_count,
            }));
        }
        let available = self.pool.current(character);
        if dice_count > available {
            return Err(self.ctx.reject(ValidationError::InsufficientDice {
                requested: dice_count,
                available,
            }));
        }

        let formula = build_formula(
            dice_count,
            self.pool.die_type(character),
            self.pool.con_modifier(character),
        );
        let roll = self.ctx.roller.evaluate(&formula).await?;

        let healing = roll.total.max(dice_floor(dice_count));
        let actual_healing = character.hit_points.healing_room(healing);
        let was_limited = healing > actual_healing;

        let new_hp = character.hit_points.current + actual_healing;
        store::commit(
            self.ctx.store.as_ref(),
            character,
            &[FieldUpdate::HitPoints(new_hp)],
            UpdateOptions::default(),
        )
        .await?;
        let dice_remaining = self
            .pool
            .set_current(
                self.ctx.store.as_ref(),
                character,
                available as i64 - dice_count as i64,
            )
            .await?;

        tracing::info!(
            character = %character.id,
            formula = %formula,
            total = roll.total,
            actual_healing,
            dice_remaining,
            was_limited,
            "Spent hit dice"
        );

        let content = format!(
            "{} spends {} hit {} ({}): rolled {}, healed {} HP{}. {} hit dice remaining.",
            character.name,
            dice_count,
            if dice_count == 1 { "die" } else { "dice" },
            formula,
            roll.total,
            actual_healing,
            if was_limited { " (capped at max HP)" } else { "" },
            dice_remaining,
        );
        self.ctx
            .announce(ChatMessage::new(Speaker::of(character), content).with_roll(roll.clone()))
            .await;

        Ok(HealingOutcome {
            formula,
            roll,
            healing,
            actual_healing,
            dice_spent: dice_count,
            dice_remaining,
            was_limited,
        })
    }
}
