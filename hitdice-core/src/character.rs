//! Character document types.
//!
//! The host owns the character; this module is the typed view the rest
//! of the crate reads from, plus [`FieldUpdate`], the vocabulary for
//! every write this crate makes to it.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for items, including spellcasting entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
    pub temporary: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
            temporary: 0,
        }
    }

    /// HP that would actually be restored by `amount` of healing.
    pub fn healing_room(&self, amount: i32) -> i32 {
        ((self.current + amount).min(self.maximum) - self.current).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.maximum
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Status conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Clumsy,
    Doomed,
    Drained,
    Dying,
    Enfeebled,
    Fatigued,
    Frightened,
    Prone,
    Sickened,
    Stupefied,
    Unconscious,
    Wounded,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Clumsy => "Clumsy",
            Condition::Doomed => "Doomed",
            Condition::Drained => "Drained",
            Condition::Dying => "Dying",
            Condition::Enfeebled => "Enfeebled",
            Condition::Fatigued => "Fatigued",
            Condition::Frightened => "Frightened",
            Condition::Prone => "Prone",
            Condition::Sickened => "Sickened",
            Condition::Stupefied => "Stupefied",
            Condition::Unconscious => "Unconscious",
            Condition::Wounded => "Wounded",
        }
    }

    /// Lowercase identifier used in update paths.
    pub fn slug(&self) -> String {
        self.name().to_lowercase()
    }

    /// Whether the condition carries a severity value.
    pub fn is_valued(&self) -> bool {
        matches!(
            self,
            Condition::Clumsy
                | Condition::Doomed
                | Condition::Drained
                | Condition::Dying
                | Condition::Enfeebled
                | Condition::Frightened
                | Condition::Sickened
                | Condition::Stupefied
                | Condition::Wounded
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A condition on a character with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub condition: Condition,
    pub value: Option<u8>,
    pub source: String,
}

impl ActiveCondition {
    pub fn new(condition: Condition, source: impl Into<String>) -> Self {
        Self {
            condition,
            value: condition.is_valued().then_some(1),
            source: source.into(),
        }
    }

    pub fn with_value(mut self, value: u8) -> Self {
        self.value = Some(value);
        self
    }
}

impl fmt::Display for ActiveCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{} {}", self.condition, value),
            None => write!(f, "{}", self.condition),
        }
    }
}

// ============================================================================
// Resource Pools
// ============================================================================

/// A current/max pool such as focus points or crafting reagents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub value: u8,
    pub max: u8,
}

impl ResourcePool {
    pub fn new(value: u8, max: u8) -> Self {
        Self { value, max }
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }

    pub fn missing(&self) -> u8 {
        self.max.saturating_sub(self.value)
    }
}

// ============================================================================
// Items
// ============================================================================

/// How often a limited-use item or ability recharges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyPeriod {
    Turn,
    Round,
    Minute,
    TenMinutes,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Limited use tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub value: u8,
    pub max: u8,
    pub per: FrequencyPeriod,
}

impl Frequency {
    pub fn per_day(value: u8, max: u8) -> Self {
        Self {
            value,
            max,
            per: FrequencyPeriod::Day,
        }
    }

    pub fn is_daily(&self) -> bool {
        self.per == FrequencyPeriod::Day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Action,
    Consumable,
    Equipment,
    Feat,
    Wand,
    Other,
}

/// Daily overcharge tracker carried by wands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WandState {
    pub overcharged: bool,
}

/// Inventory item, feat or action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub item_type: ItemType,
    pub frequency: Option<Frequency>,
    /// Temporary items are deleted by a long rest.
    pub temporary: bool,
    pub wand: Option<WandState>,
}

impl Item {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            item_type,
            frequency: None,
            temporary: false,
            wand: (item_type == ItemType::Wand).then(WandState::default),
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }
}

// ============================================================================
// Spellcasting
// ============================================================================

/// How a spellcasting entry casts its spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastingType {
    Prepared,
    Spontaneous,
    Innate,
    Focus,
    Ritual,
}

impl CastingType {
    /// Only prepared and spontaneous casting draws on spell slots.
    pub fn uses_slots(&self) -> bool {
        matches!(self, CastingType::Prepared | CastingType::Spontaneous)
    }
}

/// Slots for one spell level. `max == 0` means the level does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub value: u8,
    pub max: u8,
}

impl SlotInfo {
    pub fn new(value: u8, max: u8) -> Self {
        Self { value, max }
    }

    pub fn is_depleted(&self) -> bool {
        self.max > 0 && self.value < self.max
    }
}

/// Highest spell slot level.
pub const MAX_SLOT_LEVEL: u8 = 10;

/// A spellcasting entry with slot levels 1 to 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellcastingEntry {
    pub id: ItemId,
    pub name: String,
    pub casting: CastingType,
    pub slots: [SlotInfo; MAX_SLOT_LEVEL as usize],
}

impl SpellcastingEntry {
    pub fn new(name: impl Into<String>, casting: CastingType) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            casting,
            slots: [SlotInfo::default(); MAX_SLOT_LEVEL as usize],
        }
    }

    /// Set the slots for one level; levels outside 1-10 are ignored.
    pub fn with_slots(mut self, level: u8, value: u8, max: u8) -> Self {
        if let Some(slot) = self.slot_mut(level) {
            *slot = SlotInfo::new(value, max);
        }
        self
    }

    pub fn slot(&self, level: u8) -> Option<&SlotInfo> {
        if (1..=MAX_SLOT_LEVEL).contains(&level) {
            self.slots.get(level as usize - 1)
        } else {
            None
        }
    }

    pub fn slot_mut(&mut self, level: u8) -> Option<&mut SlotInfo> {
        if (1..=MAX_SLOT_LEVEL).contains(&level) {
            self.slots.get_mut(level as usize - 1)
        } else {
            None
        }
    }
}

// ============================================================================
// Flags
// ============================================================================

/// Loosely-typed per-module storage on the character (`namespace -> key -> JSON`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flags(BTreeMap<String, BTreeMap<String, Value>>);

impl Flags {
    pub fn get(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.0.get(namespace).and_then(|scope| scope.get(key))
    }

    pub fn set(&mut self, namespace: &str, key: &str, value: Value) {
        self.0
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn unset(&mut self, namespace: &str, key: &str) -> Option<Value> {
        self.0.get_mut(namespace).and_then(|scope| scope.remove(key))
    }
}

// ============================================================================
// Character
// ============================================================================

/// Player character as seen by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub level: u32,
    pub class_name: String,
    pub con_modifier: Option<i32>,

    pub hit_points: HitPoints,
    pub conditions: Vec<ActiveCondition>,

    pub focus: Option<ResourcePool>,
    pub crafting_reagents: Option<ResourcePool>,
    pub daily_preparation_complete: bool,

    pub items: Vec<Item>,
    pub spellcasting: Vec<SpellcastingEntry>,

    #[serde(default)]
    pub flags: Flags,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            level: 1,
            class_name: String::new(),
            con_modifier: None,
            hit_points: HitPoints::new(10),
            conditions: Vec::new(),
            focus: None,
            crafting_reagents: None,
            daily_preparation_complete: false,
            items: Vec::new(),
            spellcasting: Vec::new(),
            flags: Flags::default(),
        }
    }

    pub fn condition(&self, condition: Condition) -> Option<&ActiveCondition> {
        self.conditions.iter().find(|c| c.condition == condition)
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.condition(condition).is_some()
    }

    /// Add a condition if not already present. Returns true if it was added.
    pub fn add_condition(&mut self, active: ActiveCondition) -> bool {
        if self.has_condition(active.condition) {
            false
        } else {
            self.conditions.push(active);
            true
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn spellcasting_entry(&self, id: ItemId) -> Option<&SpellcastingEntry> {
        self.spellcasting.iter().find(|e| e.id == id)
    }

    /// Mirror a committed update onto this document.
    pub fn apply(&mut self, update: &FieldUpdate) -> Result<(), StoreError> {
        match update {
            FieldUpdate::HitPoints(value) => {
                self.hit_points.current = *value;
            }
            FieldUpdate::FocusPoints(value) => {
                if let Some(ref mut focus) = self.focus {
                    focus.value = *value;
                }
            }
            FieldUpdate::CraftingReagents(value) => {
                if let Some(ref mut reagents) = self.crafting_reagents {
                    reagents.value = *value;
                }
            }
            FieldUpdate::ItemFrequency { item_id, value } => {
                let item = self.item_mut(*item_id)?;
                if let Some(ref mut frequency) = item.frequency {
                    frequency.value = *value;
                }
            }
            FieldUpdate::WandOvercharge {
                item_id,
                overcharged,
            } => {
                let item = self.item_mut(*item_id)?;
                item.wand.get_or_insert_with(WandState::default).overcharged = *overcharged;
            }
            FieldUpdate::SpellSlot {
                entry_id,
                level,
                value,
            } => {
                let entry = self
                    .spellcasting
                    .iter_mut()
                    .find(|e| e.id == *entry_id)
                    .ok_or(StoreError::ItemNotFound(*entry_id))?;
                let slot = entry.slot_mut(*level).ok_or(StoreError::SlotNotFound {
                    entry: *entry_id,
                    level: *level,
                })?;
                slot.value = *value;
            }
            FieldUpdate::DailyPreparation(complete) => {
                self.daily_preparation_complete = *complete;
            }
            FieldUpdate::RemoveCondition(condition) => {
                self.conditions.retain(|c| c.condition != *condition);
            }
            FieldUpdate::ConditionValue { condition, value } => {
                if let Some(active) = self
                    .conditions
                    .iter_mut()
                    .find(|c| c.condition == *condition)
                {
                    active.value = Some(*value);
                }
            }
        }
        Ok(())
    }

    /// Remove items from this document. Unknown IDs are ignored.
    pub fn remove_items(&mut self, ids: &[ItemId]) {
        self.items.retain(|i| !ids.contains(&i.id));
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut Item, StoreError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::ItemNotFound(id))
    }
}

/// A single field write against a character document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldUpdate {
    HitPoints(i32),
    FocusPoints(u8),
    CraftingReagents(u8),
    ItemFrequency { item_id: ItemId, value: u8 },
    WandOvercharge { item_id: ItemId, overcharged: bool },
    SpellSlot { entry_id: ItemId, level: u8, value: u8 },
    DailyPreparation(bool),
    RemoveCondition(Condition),
    ConditionValue { condition: Condition, value: u8 },
}

impl FieldUpdate {
    /// Dotted document path of the field, for logs and host adapters.
    pub fn path(&self) -> String {
        match self {
            FieldUpdate::HitPoints(_) => "system.attributes.hp.value".to_string(),
            FieldUpdate::FocusPoints(_) => "system.resources.focus.value".to_string(),
            FieldUpdate::CraftingReagents(_) => {
                "system.resources.crafting.reagents.value".to_string()
            }
            FieldUpdate::ItemFrequency { item_id, .. } => {
                format!("items.{item_id}.system.frequency.value")
            }
            FieldUpdate::WandOvercharge { item_id, .. } => {
                format!("items.{item_id}.system.uses.overcharged")
            }
            FieldUpdate::SpellSlot {
                entry_id, level, ..
            } => format!("items.{entry_id}.system.slots.slot{level}.value"),
            FieldUpdate::DailyPreparation(_) => "system.resources.dailyPreparation".to_string(),
            FieldUpdate::RemoveCondition(condition) => format!("conditions.{}", condition.slug()),
            FieldUpdate::ConditionValue { condition, .. } => {
                format!("conditions.{}.value", condition.slug())
            }
        }
    }
}

/// Options for a batched field update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Skip the host's sheet re-render for this write.
    pub suppress_refresh: bool,
}

impl UpdateOptions {
    pub fn quiet() -> Self {
        Self {
            suppress_refresh: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healing_room_caps_at_max() {
        let mut hp = HitPoints::new(30);
        hp.current = 25;
        assert_eq!(hp.healing_room(10), 5);
        assert_eq!(hp.healing_room(3), 3);

        hp.current = 35;
        assert_eq!(hp.healing_room(4), 0);
    }

    #[test]
    fn test_valued_conditions_start_at_one() {
        assert_eq!(ActiveCondition::new(Condition::Doomed, "curse").value, Some(1));
        assert_eq!(ActiveCondition::new(Condition::Fatigued, "march").value, None);
        assert_eq!(
            ActiveCondition::new(Condition::Drained, "vampire")
                .with_value(3)
                .to_string(),
            "Drained 3"
        );
    }

    #[test]
    fn test_add_condition_rejects_duplicates() {
        let mut character = Character::new("Ezren");
        assert!(character.add_condition(ActiveCondition::new(Condition::Fatigued, "march")));
        assert!(!character.add_condition(ActiveCondition::new(Condition::Fatigued, "again")));
        assert_eq!(character.conditions.len(), 1);
    }

    #[test]
    fn test_slot_levels_are_one_based() {
        let entry = SpellcastingEntry::new("Arcane Prepared", CastingType::Prepared)
            .with_slots(1, 2, 3)
            .with_slots(10, 1, 1)
            .with_slots(11, 1, 1);
        assert_eq!(entry.slot(1), Some(&SlotInfo::new(2, 3)));
        assert_eq!(entry.slot(10), Some(&SlotInfo::new(1, 1)));
        assert!(entry.slot(0).is_none());
        assert!(entry.slot(11).is_none());
    }

    #[test]
    fn test_apply_updates() {
        let mut character = Character::new("Kyra");
        character.focus = Some(ResourcePool::new(0, 2));
        character.add_condition(ActiveCondition::new(Condition::Doomed, "curse").with_value(2));
        let wand = Item::new("Wand of Heal", ItemType::Wand);
        let wand_id = wand.id;
        character.items.push(wand);

        character.apply(&FieldUpdate::FocusPoints(2)).unwrap();
        character
            .apply(&FieldUpdate::ConditionValue {
                condition: Condition::Doomed,
                value: 1,
            })
            .unwrap();
        character
            .apply(&FieldUpdate::WandOvercharge {
                item_id: wand_id,
                overcharged: true,
            })
            .unwrap();

        assert_eq!(character.focus.unwrap().value, 2);
        assert_eq!(character.condition(Condition::Doomed).unwrap().value, Some(1));
        assert!(character.item(wand_id).unwrap().wand.unwrap().overcharged);

        character
            .apply(&FieldUpdate::RemoveCondition(Condition::Doomed))
            .unwrap();
        assert!(!character.has_condition(Condition::Doomed));
    }

    #[test]
    fn test_apply_unknown_item_fails() {
        let mut character = Character::new("Kyra");
        let result = character.apply(&FieldUpdate::ItemFrequency {
            item_id: ItemId::new(),
            value: 1,
        });
        assert!(matches!(result, Err(StoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_flags_round_trip() {
        let mut flags = Flags::default();
        assert!(flags.get("rest", "dice").is_none());
        flags.set("rest", "dice", Value::from(3));
        assert_eq!(flags.get("rest", "dice"), Some(&Value::from(3)));
        assert_eq!(flags.unset("rest", "dice"), Some(Value::from(3)));
        assert!(flags.get("rest", "dice").is_none());
    }

    #[test]
    fn test_update_paths() {
        assert_eq!(FieldUpdate::HitPoints(3).path(), "system.attributes.hp.value");
        assert_eq!(
            FieldUpdate::RemoveCondition(Condition::Fatigued).path(),
            "conditions.fatigued"
        );
    }
}
