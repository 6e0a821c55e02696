//! Hit dice healing, spell slot recovery and rest tiers.
//!
//! This crate provides:
//! - A per-character hit dice pool (`level + 1` dice, die size by class)
//! - Healing rolls paid for with hit dice, floored at 1 HP per die and
//!   capped at max HP
//! - Spell slot recovery costing hit dice equal to the slot level
//! - Short, Long and Full rests with distinct recovery rules
//!
//! The host game supplies the character store, roll engine, notification
//! channel and (optionally) its own full rest procedure through the traits
//! in [`store`], [`dice`], [`notify`] and [`rest`].
//!
//! # Quick Start
//!
//! ```ignore
//! use hitdice_core::{RestContext, RestController, RestTier};
//! use hitdice_core::{InMemoryCharacterStore, RandomRollEngine, TracingNotifier};
//! use std::sync::Arc;
//!
//! let ctx = RestContext::new(
//!     Arc::new(InMemoryCharacterStore::new()),
//!     Arc::new(RandomRollEngine::new()),
//!     Arc::new(TracingNotifier),
//! );
//! let controller = RestController::new(ctx);
//!
//! let outcome = controller.healing().roll_and_heal(&mut character, 2).await?;
//! println!("Healed {} HP", outcome.actual_healing);
//!
//! let result = controller.rest(&mut character, RestTier::Long).await?;
//! for line in &result.messages {
//!     println!("{line}");
//! }
//! ```

pub mod character;
pub mod class_table;
pub mod config;
pub mod context;
pub mod dice;
pub mod error;
pub mod healing;
pub mod notify;
pub mod pool;
pub mod rest;
pub mod spell_slots;
pub mod store;
pub mod testing;

// Primary public API
pub use character::{Character, CharacterId, FieldUpdate, ItemId, UpdateOptions};
pub use config::RestConfig;
pub use context::RestContext;
pub use dice::{DieType, RandomRollEngine, RollEngine, RollResult};
pub use error::{RestError, StoreError, ValidationError};
pub use healing::{build_formula, calculate_range, HealingEngine, HealingOutcome, HealingRange};
pub use notify::{ChatMessage, Notifier, TracingNotifier};
pub use pool::HitDicePool;
pub use rest::{FullRestHook, RestController, RestResult, RestTier};
pub use spell_slots::{DepletedSlot, SlotRestored, SpellSlotRecovery};
pub use store::{CharacterStore, InMemoryCharacterStore};
pub use testing::TestHarness;
