//! Hit die size per class.

use crate::dice::DieType;
use std::collections::HashMap;

/// Die used when a class name is not in the table.
pub const DEFAULT_DIE: DieType = DieType::D8;

const CLASS_DICE: &[(&str, DieType)] = &[
    // d6
    ("psychic", DieType::D6),
    ("sorcerer", DieType::D6),
    ("witch", DieType::D6),
    ("wizard", DieType::D6),
    // d8
    ("alchemist", DieType::D8),
    ("animist", DieType::D8),
    ("bard", DieType::D8),
    ("cleric", DieType::D8),
    ("commander", DieType::D8),
    ("druid", DieType::D8),
    ("inventor", DieType::D8),
    ("investigator", DieType::D8),
    ("kineticist", DieType::D8),
    ("magus", DieType::D8),
    ("oracle", DieType::D8),
    ("rogue", DieType::D8),
    ("swashbuckler", DieType::D8),
    ("thaumaturge", DieType::D8),
    // d10
    ("champion", DieType::D10),
    ("exemplar", DieType::D10),
    ("fighter", DieType::D10),
    ("guardian", DieType::D10),
    ("gunslinger", DieType::D10),
    ("monk", DieType::D10),
    ("ranger", DieType::D10),
    ("runesmith", DieType::D10),
    ("summoner", DieType::D10),
    // d12
    ("barbarian", DieType::D12),
];

lazy_static::lazy_static! {
    static ref CLASS_DIE_TABLE: HashMap<&'static str, DieType> =
        CLASS_DICE.iter().copied().collect();
}

/// Look up a class's hit die. Matching ignores case and surrounding whitespace.
pub fn lookup(class_name: &str) -> Option<DieType> {
    let key = class_name.trim().to_lowercase();
    CLASS_DIE_TABLE.get(key.as_str()).copied()
}

/// Every known class with its die, sorted by name.
pub fn known_classes() -> Vec<(&'static str, DieType)> {
    let mut classes: Vec<_> = CLASS_DIE_TABLE.iter().map(|(k, v)| (*k, *v)).collect();
    classes.sort_by_key(|(name, _)| *name);
    classes
}
