//! Testing utilities.
//!
//! - `ScriptedRollEngine` returns fixed roll totals in order
//! - `RecordingNotifier` captures warnings, chat messages and refreshes
//! - `TestHarness` wires both to an in-memory store
//! - sample characters for common scenarios

use crate::character::{
    CastingType, Character, CharacterId, FieldUpdate, ResourcePool, SpellcastingEntry,
    UpdateOptions,
};
use crate::config::RestConfig;
use crate::context::RestContext;
use crate::dice::{DiceError, HealingFormula, RollEngine, RollResult};
use crate::error::StoreError;
use crate::healing::HealingEngine;
use crate::notify::{ChatMessage, Notifier};
use crate::rest::{FullRestHook, RestController};
use crate::spell_slots::SpellSlotRecovery;
use crate::store::{self, CharacterStore, InMemoryCharacterStore};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Roll engine that returns scripted totals.
///
/// Once the script runs out, every roll returns the formula's maximum.
pub struct ScriptedRollEngine {
    totals: Mutex<VecDeque<i32>>,
    formulas: Mutex<Vec<String>>,
}

impl ScriptedRollEngine {
    pub fn new(totals: Vec<i32>) -> Self {
        Self {
            totals: Mutex::new(totals.into()),
            formulas: Mutex::new(Vec::new()),
        }
    }

    /// Formulas evaluated so far.
    pub fn formulas(&self) -> Vec<String> {
        self.formulas.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RollEngine for ScriptedRollEngine {
    async fn evaluate(&self, formula: &str) -> Result<RollResult, DiceError> {
        let parsed = HealingFormula::parse(formula)?;
        let poisoned = || DiceError::EngineUnavailable("script lock poisoned".to_string());

        self.formulas
            .lock()
            .map_err(|_| poisoned())?
            .push(parsed.to_string());
        let scripted = self.totals.lock().map_err(|_| poisoned())?.pop_front();
        let total = scripted.unwrap_or(
            parsed.count as i32 * parsed.die_type.sides() as i32 + parsed.modifier,
        );

        Ok(RollResult {
            formula: parsed.to_string(),
            die_type: parsed.die_type,
            rolls: Vec::new(),
            modifier: parsed.modifier,
            total,
        })
    }
}

/// Something a notifier was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Warn(String),
    Info(String),
    Error(String),
    Message(ChatMessage),
    Refresh(CharacterId),
}

/// Notifier that records every call.
#[derive(Default)]
pub struct RecordingNotifier {
    log: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Warn(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn refreshes(&self) -> Vec<CharacterId> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Refresh(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, notification: Notification) {
        if let Ok(mut log) = self.log.lock() {
            log.push(notification);
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn warn(&self, text: &str) {
        self.record(Notification::Warn(text.to_string()));
    }

    fn info(&self, text: &str) {
        self.record(Notification::Info(text.to_string()));
    }

    fn error(&self, text: &str) {
        self.record(Notification::Error(text.to_string()));
    }

    async fn post_message(&self, message: ChatMessage) {
        self.record(Notification::Message(message));
    }

    async fn refresh_sheet(&self, character_id: CharacterId) {
        self.record(Notification::Refresh(character_id));
    }
}

/// Full rest procedure that does nothing but count calls.
#[derive(Default)]
pub struct NoopFullRest {
    calls: AtomicUsize,
}

impl NoopFullRest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullRestHook for NoopFullRest {
    async fn complete_rest(
        &self,
        _character: &mut Character,
        _skip_confirmation: bool,
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Full rest procedure that restores HP and every spell slot through a store.
pub struct RestoringFullRest {
    store: Arc<dyn CharacterStore>,
}

impl RestoringFullRest {
    pub fn new(store: Arc<dyn CharacterStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FullRestHook for RestoringFullRest {
    async fn complete_rest(
        &self,
        character: &mut Character,
        _skip_confirmation: bool,
    ) -> Result<(), StoreError> {
        let mut updates = vec![FieldUpdate::HitPoints(character.hit_points.maximum)];
        for entry in &character.spellcasting {
            for (index, slot) in entry.slots.iter().enumerate() {
                if slot.is_depleted() {
                    updates.push(FieldUpdate::SpellSlot {
                        entry_id: entry.id,
                        level: index as u8 + 1,
                        value: slot.max,
                    });
                }
            }
        }
        store::commit(
            self.store.as_ref(),
            character,
            &updates,
            UpdateOptions::default(),
        )
        .await
    }
}

/// Level `level` fighter (d10, +2 CON) at full HP.
pub fn sample_fighter(level: u32) -> Character {
    let mut character = Character::new("Valeros");
    character.level = level;
    character.class_name = "Fighter".to_string();
    character.con_modifier = Some(2);
    character.hit_points.maximum = 20 + 12 * level as i32;
    character.hit_points.current = character.hit_points.maximum;
    character
}

/// Level 5 wizard (d6, +1 CON) with prepared slots at levels 1-3, an
/// innate entry, and a focus pool.
pub fn sample_wizard() -> Character {
    let mut character = Character::new("Ezren");
    character.level = 5;
    character.class_name = "Wizard".to_string();
    character.con_modifier = Some(1);
    character.hit_points.maximum = 41;
    character.hit_points.current = 41;
    character.focus = Some(ResourcePool::new(1, 1));
    character.spellcasting.push(
        SpellcastingEntry::new("Arcane Prepared Spells", CastingType::Prepared)
            .with_slots(1, 3, 3)
            .with_slots(2, 3, 3)
            .with_slots(3, 2, 2),
    );
    character.spellcasting.push(
        SpellcastingEntry::new("Elven Innate Spells", CastingType::Innate).with_slots(1, 0, 1),
    );
    character
}

/// Test harness wiring the ports to in-memory fakes.
pub struct TestHarness {
    pub store: Arc<InMemoryCharacterStore>,
    pub roller: Arc<ScriptedRollEngine>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: RestContext,
}

impl TestHarness {
    /// Harness whose rolls return `totals` in order.
    pub fn new(totals: Vec<i32>) -> Self {
        Self::with_config(totals, RestConfig::default())
    }

    pub fn with_config(totals: Vec<i32>, config: RestConfig) -> Self {
        let store = Arc::new(InMemoryCharacterStore::new());
        let roller = Arc::new(ScriptedRollEngine::new(totals));
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = RestContext::new(store.clone(), roller.clone(), notifier.clone())
            .with_config(config);
        Self {
            store,
            roller,
            notifier,
            ctx,
        }
    }

    /// Store a character and hand back the working copy.
    pub async fn add(&self, character: Character) -> Character {
        self.store.insert(character.clone()).await;
        character
    }

    /// The character as currently persisted.
    pub async fn stored(&self, id: CharacterId) -> Character {
        match self.store.load(id).await {
            Ok(character) => character,
            Err(err) => panic!("character {id} missing from store: {err}"),
        }
    }

    pub fn controller(&self) -> RestController {
        RestController::new(self.ctx.clone())
    }

    pub fn healing(&self) -> HealingEngine {
        HealingEngine::new(self.ctx.clone())
    }

    pub fn spell_slots(&self) -> SpellSlotRecovery {
        SpellSlotRecovery::new(self.ctx.clone())
    }
}
