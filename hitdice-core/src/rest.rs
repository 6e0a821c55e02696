//! Rest tiers.
//!
//! - **Short**: nothing happens automatically. Hit dice can be spent on
//!   healing or spell slots through [`HealingEngine`] and
//!   [`SpellSlotRecovery`].
//! - **Long**: refills hit dice and focus, decays conditions, and resets
//!   daily resources. HP and spell slots are never touched.
//! - **Full**: hands HP, slot and condition recovery to the host's own
//!   rest procedure, then refills hit dice, which that procedure does not
//!   know about.
//!
//! Validation happens before anything is written. A store failure stops
//! the sequence where it is; earlier steps stay applied.

use crate::character::{Character, Condition, FieldUpdate, ItemId, UpdateOptions};
use crate::context::RestContext;
use crate::error::{RestError, StoreError};
use crate::healing::HealingEngine;
use crate::notify::{ChatMessage, Speaker};
use crate::pool::HitDicePool;
use crate::spell_slots::SpellSlotRecovery;
use crate::store;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestTier {
    Short,
    Long,
    Full,
}

impl RestTier {
    pub fn name(&self) -> &'static str {
        match self {
            RestTier::Short => "Short Rest",
            RestTier::Long => "Long Rest",
            RestTier::Full => "Full Rest",
        }
    }
}

impl fmt::Display for RestTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of a rest, for the notification layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestResult {
    pub tier: RestTier,
    pub messages: Vec<String>,
    pub dice_restored: u32,
    pub focus_restored: u8,
    pub conditions_changed: usize,
    pub charges_refreshed: usize,
    pub items_deleted: usize,
}

impl RestResult {
    pub fn new(tier: RestTier) -> Self {
        Self {
            tier,
            messages: Vec::new(),
            dice_restored: 0,
            focus_restored: 0,
            conditions_changed: 0,
            charges_refreshed: 0,
            items_deleted: 0,
        }
    }

    fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// One message listing every step, headed by who rested.
    pub fn summary(&self, character_name: &str) -> String {
        let mut lines = vec![format!("{} takes a {}.", character_name, self.tier.name())];
        lines.extend(self.messages.iter().map(|m| format!("- {m}")));
        lines.join("\n")
    }
}

/// The host's own complete-rest procedure.
#[async_trait]
pub trait FullRestHook: Send + Sync {
    /// Restore HP, spell slots and conditions. `skip_confirmation` suppresses
    /// any prompt the host would otherwise show.
    async fn complete_rest(
        &self,
        character: &mut Character,
        skip_confirmation: bool,
    ) -> Result<(), StoreError>;
}

/// Runs a chosen rest tier against one character.
pub struct RestController {
    ctx: RestContext,
    pool: HitDicePool,
    healing: HealingEngine,
    spell_slots: SpellSlotRecovery,
    full_rest: Option<Arc<dyn FullRestHook>>,
}

impl RestController {
    pub fn new(ctx: RestContext) -> Self {
        Self {
            pool: HitDicePool::new(&ctx.config),
            healing: HealingEngine::new(ctx.clone()),
            spell_slots: SpellSlotRecovery::new(ctx.clone()),
            full_rest: None,
            ctx,
        }
    }

    /// Use the host's complete-rest procedure for full rests.
    pub fn with_full_rest_hook(mut self, hook: Arc<dyn FullRestHook>) -> Self {
        self.full_rest = Some(hook);
        self
    }

    pub fn pool(&self) -> &HitDicePool {
        &self.pool
    }

    pub fn healing(&self) -> &HealingEngine {
        &self.healing
    }

    pub fn spell_slots(&self) -> &SpellSlotRecovery {
        &self.spell_slots
    }

    pub async fn rest(
        &self,
        character: &mut Character,
        tier: RestTier,
    ) -> Result<RestResult, RestError> {
        tracing::info!(character = %character.id, tier = %tier, "Starting rest");
        match tier {
            RestTier::Short => Ok(self.short_rest(character)),
            RestTier::Long => self.long_rest(character).await,
            RestTier::Full => self.full_rest(character).await,
        }
    }

    fn short_rest(&self, character: &Character) -> RestResult {
        let mut result = RestResult::new(RestTier::Short);
        result.push(format!(
            "{}/{} hit dice available to spend",
            self.pool.current(character),
            self.pool.max(character)
        ));
        if self.spell_slots.is_spellcaster(character) {
            let depleted = self.spell_slots.depleted_slots(character).len();
            result.push(format!("{depleted} depleted spell slot levels can be restored"));
        }
        result
    }

    async fn long_rest(&self, character: &mut Character) -> Result<RestResult, RestError> {
        let store = self.ctx.store.as_ref();
        let mut result = RestResult::new(RestTier::Long);

        let restored = self.pool.replenish(store, character).await?;
        let max = self.pool.max(character);
        result.dice_restored = restored;
        if restored > 0 {
            result.push(format!("Recovered {restored} hit dice ({max}/{max})"));
        } else {
            result.push(format!("Hit dice already full ({max}/{max})"));
        }

        let mut updates = Vec::new();

        if let Some(focus) = character.focus.filter(|f| !f.is_full()) {
            updates.push(FieldUpdate::FocusPoints(focus.max));
            result.focus_restored = focus.missing();
            result.push(format!("Focus points restored ({}/{})", focus.max, focus.max));
        }

        decay_conditions(character, &mut updates, &mut result);

        self.refresh_daily_resources(character, &mut updates, &mut result)
            .await?;

        result.push(format!(
            "HP unchanged ({}/{})",
            character.hit_points.current, character.hit_points.maximum
        ));
        result.push("Spell slots unchanged");

        store::commit(store, character, &updates, UpdateOptions::quiet()).await?;
        tracing::info!(
            character = %character.id,
            fields = updates.len(),
            dice_restored = result.dice_restored,
            "Long rest applied"
        );

        self.ctx
            .announce(ChatMessage::new(
                Speaker::of(character),
                result.summary(&character.name),
            ))
            .await;
        if self.ctx.config.refresh_after_rest {
            self.ctx.notifier.refresh_sheet(character.id).await;
        }
        Ok(result)
    }

    async fn refresh_daily_resources(
        &self,
        character: &mut Character,
        updates: &mut Vec<FieldUpdate>,
        result: &mut RestResult,
    ) -> Result<(), StoreError> {
        // Temporary items are deleted below, so their charges are not refreshed.
        for item in character.items.iter().filter(|i| !i.temporary) {
            if let Some(frequency) = item.frequency {
                if frequency.is_daily() && frequency.value < frequency.max {
                    updates.push(FieldUpdate::ItemFrequency {
                        item_id: item.id,
                        value: frequency.max,
                    });
                    result.charges_refreshed += 1;
                }
            }
            if item.wand.is_some_and(|w| w.overcharged) {
                updates.push(FieldUpdate::WandOvercharge {
                    item_id: item.id,
                    overcharged: false,
                });
                result.charges_refreshed += 1;
            }
        }
        if result.charges_refreshed > 0 {
            result.push(format!(
                "Refreshed {} daily item charges",
                result.charges_refreshed
            ));
        }

        if let Some(reagents) = character.crafting_reagents.filter(|r| !r.is_full()) {
            updates.push(FieldUpdate::CraftingReagents(reagents.max));
            result.push(format!(
                "Crafting reagents restored ({}/{})",
                reagents.max, reagents.max
            ));
        }

        if character.daily_preparation_complete {
            updates.push(FieldUpdate::DailyPreparation(false));
            result.push("Daily preparations can be made again");
        }

        let temporary: Vec<ItemId> = character
            .items
            .iter()
            .filter(|i| i.temporary)
            .map(|i| i.id)
            .collect();
        if !temporary.is_empty() {
            self.ctx
                .store
                .delete_items(character.id, &temporary)
                .await?;
            character.remove_items(&temporary);
            result.items_deleted = temporary.len();
            result.push(format!("Removed {} temporary items", temporary.len()));
        }
        Ok(())
    }

    async fn full_rest(&self, character: &mut Character) -> Result<RestResult, RestError> {
        let mut result = RestResult::new(RestTier::Full);

        match self.full_rest {
            Some(ref hook) => {
                hook.complete_rest(character, true).await?;
                result.push("HP, spell slots and conditions recovered");
            }
            None => {
                tracing::info!(
                    character = %character.id,
                    "No full rest procedure available, restoring hit dice only"
                );
                result.push("Full rest procedure unavailable, only hit dice restored");
            }
        }

        let restored = self
            .pool
            .replenish(self.ctx.store.as_ref(), character)
            .await?;
        result.dice_restored = restored;
        if restored > 0 {
            let max = self.pool.max(character);
            let notice = format!("Recovered {restored} hit dice ({max}/{max})");
            result.push(notice.clone());
            self.ctx
                .announce(ChatMessage::new(
                    Speaker::of(character),
                    format!("{}: {}", character.name, notice),
                ))
                .await;
        }

        if self.ctx.config.refresh_after_rest {
            self.ctx.notifier.refresh_sheet(character.id).await;
        }
        Ok(result)
    }
}

/// Queue long rest condition changes. Wounded only clears at full HP.
fn decay_conditions(
    character: &Character,
    updates: &mut Vec<FieldUpdate>,
    result: &mut RestResult,
) {
    if character.has_condition(Condition::Fatigued) {
        updates.push(FieldUpdate::RemoveCondition(Condition::Fatigued));
        result.conditions_changed += 1;
        result.push("Fatigued removed");
    }

    for condition in [Condition::Doomed, Condition::Drained] {
        let Some(active) = character.condition(condition) else {
            continue;
        };
        let value = active.value.unwrap_or(1);
        if value <= 1 {
            updates.push(FieldUpdate::RemoveCondition(condition));
            result.push(format!("{condition} removed"));
        } else {
            updates.push(FieldUpdate::ConditionValue {
                condition,
                value: value - 1,
            });
            result.push(format!("{} reduced to {}", condition, value - 1));
        }
        result.conditions_changed += 1;
    }

    if character.has_condition(Condition::Wounded) {
        if character.hit_points.is_full() {
            updates.push(FieldUpdate::RemoveCondition(Condition::Wounded));
            result.conditions_changed += 1;
            result.push("Wounded removed");
        } else {
            result.push(format!(
                "Wounded remains until HP is full ({}/{})",
                character.hit_points.current, character.hit_points.maximum
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{ActiveCondition, Item, ItemType, ResourcePool};
    use crate::store::MockCharacterStore;
    use crate::testing::{sample_fighter, RecordingNotifier, ScriptedRollEngine};
    use serde_json::Value;

    struct FailingFullRest;

    #[async_trait]
    impl FullRestHook for FailingFullRest {
        async fn complete_rest(
            &self,
            _character: &mut Character,
            _skip_confirmation: bool,
        ) -> Result<(), StoreError> {
            Err(StoreError::Backend("rest procedure failed".to_string()))
        }
    }

    fn controller_with(
        store: MockCharacterStore,
        notifier: Arc<RecordingNotifier>,
    ) -> RestController {
        RestController::new(RestContext::new(
            Arc::new(store),
            Arc::new(ScriptedRollEngine::new(vec![])),
            notifier,
        ))
    }

    #[test]
    fn test_decay_conditions() {
        let mut character = sample_fighter(3);
        character.add_condition(ActiveCondition::new(Condition::Fatigued, "march"));
        character.add_condition(ActiveCondition::new(Condition::Doomed, "curse").with_value(3));
        character.add_condition(ActiveCondition::new(Condition::Drained, "wight"));

        let mut updates = Vec::new();
        let mut result = RestResult::new(RestTier::Long);
        decay_conditions(&character, &mut updates, &mut result);

        assert_eq!(
            updates,
            vec![
                FieldUpdate::RemoveCondition(Condition::Fatigued),
                FieldUpdate::ConditionValue {
                    condition: Condition::Doomed,
                    value: 2
                },
                FieldUpdate::RemoveCondition(Condition::Drained),
            ]
        );
        assert_eq!(result.conditions_changed, 3);
        assert!(result.messages.iter().any(|m| m == "Doomed reduced to 2"));
    }

    #[test]
    fn test_wounded_clears_only_at_full_hp() {
        let mut character = sample_fighter(3);
        character.add_condition(ActiveCondition::new(Condition::Wounded, "dying"));

        let mut updates = Vec::new();
        let mut result = RestResult::new(RestTier::Long);
        decay_conditions(&character, &mut updates, &mut result);
        assert_eq!(updates, vec![FieldUpdate::RemoveCondition(Condition::Wounded)]);

        character.hit_points.current -= 1;
        let mut updates = Vec::new();
        let mut result = RestResult::new(RestTier::Long);
        decay_conditions(&character, &mut updates, &mut result);
        assert!(updates.is_empty());
        assert_eq!(result.conditions_changed, 0);
        assert!(result.messages[0].starts_with("Wounded remains"));
    }

    #[test]
    fn test_summary_lists_steps() {
        let mut result = RestResult::new(RestTier::Long);
        result.push("Fatigued removed");
        assert_eq!(
            result.summary("Valeros"),
            "Valeros takes a Long Rest.\n- Fatigued removed"
        );
    }

    #[tokio::test]
    async fn test_long_rest_stops_at_failed_batch_write() {
        let mut character = sample_fighter(3);
        character.add_condition(ActiveCondition::new(Condition::Fatigued, "march"));
        character
            .items
            .push(Item::new("Conjured Rope", ItemType::Equipment).temporary());

        let mut store = MockCharacterStore::new();
        store
            .expect_set_value()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        store.expect_delete_items().times(1).returning(|_, _| Ok(()));
        store
            .expect_update_fields()
            .times(1)
            .returning(|_, _, _| Err(StoreError::Backend("connection lost".to_string())));

        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller_with(store, notifier.clone());

        let err = controller
            .rest(&mut character, RestTier::Long)
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::Store(StoreError::Backend(_))));

        // Earlier steps stay applied; the batched condition change does not.
        assert!(controller.pool().is_full(&character));
        assert!(character.items.is_empty());
        assert!(character.has_condition(Condition::Fatigued));
        assert!(notifier.messages().is_empty());
        assert!(notifier.refreshes().is_empty());
    }

    #[tokio::test]
    async fn test_long_rest_stops_when_dice_write_fails() {
        let mut character = sample_fighter(3);
        character
            .items
            .push(Item::new("Conjured Rope", ItemType::Equipment).temporary());

        let mut store = MockCharacterStore::new();
        store
            .expect_set_value()
            .times(1)
            .returning(|_, _, _, _| Err(StoreError::Backend("read only".to_string())));
        store.expect_delete_items().never();
        store.expect_update_fields().never();

        let controller = controller_with(store, Arc::new(RecordingNotifier::new()));
        let result = controller.rest(&mut character, RestTier::Long).await;
        assert!(result.is_err());
        assert_eq!(character.items.len(), 1);
    }

    #[tokio::test]
    async fn test_long_rest_leaves_full_focus_alone() {
        let mut character = sample_fighter(3);
        character.focus = Some(ResourcePool::new(2, 2));
        character.add_condition(ActiveCondition::new(Condition::Fatigued, "march"));

        let mut store = MockCharacterStore::new();
        store
            .expect_set_value()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        store.expect_delete_items().never();
        store
            .expect_update_fields()
            .withf(|_, updates, options| {
                options.suppress_refresh
                    && updates.to_vec() == vec![FieldUpdate::RemoveCondition(Condition::Fatigued)]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let controller = controller_with(store, Arc::new(RecordingNotifier::new()));
        let result = controller
            .rest(&mut character, RestTier::Long)
            .await
            .unwrap();

        assert_eq!(result.focus_restored, 0);
        assert!(!result.messages.iter().any(|m| m.starts_with("Focus")));
        assert_eq!(character.focus, Some(ResourcePool::new(2, 2)));
    }

    #[tokio::test]
    async fn test_full_rest_hook_failure_keeps_dice_spent() {
        let mut character = sample_fighter(3);
        character.flags.set("hit-dice", "currentHitDice", Value::from(1));

        let mut store = MockCharacterStore::new();
        store.expect_set_value().never();
        store.expect_update_fields().never();
        store.expect_delete_items().never();

        let notifier = Arc::new(RecordingNotifier::new());
        let controller = controller_with(store, notifier.clone())
            .with_full_rest_hook(Arc::new(FailingFullRest));

        let err = controller
            .rest(&mut character, RestTier::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::Store(StoreError::Backend(_))));
        assert_eq!(controller.pool().current(&character), 1);
        assert!(notifier.messages().is_empty());
        assert!(notifier.refreshes().is_empty());
    }

    #[tokio::test]
    async fn test_short_rest_writes_nothing() {
        let mut store = MockCharacterStore::new();
        store.expect_set_value().never();
        store.expect_update_fields().never();
        store.expect_delete_items().never();

        let mut character = sample_fighter(4);
        let controller = controller_with(store, Arc::new(RecordingNotifier::new()));
        let result = controller
            .rest(&mut character, RestTier::Short)
            .await
            .unwrap();
        assert_eq!(result.tier, RestTier::Short);
        assert_eq!(result.messages, vec!["5/5 hit dice available to spend"]);
    }
}
