//! Hit dice formulas and rolling.
//!
//! Healing rolls use a narrow notation: `NdD`, `NdD+M` or `NdD-M`, where
//! `D` is one of the hit die sizes (6, 8, 10 or 12) and `M` is the
//! already-multiplied modifier.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

/// Error type for formula parsing and rolling.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid hit die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Roll engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// Hit die sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DieType {
    D6,
    D8,
    D10,
    D12,
}

impl DieType {
    pub const ALL: [DieType; 4] = [DieType::D6, DieType::D8, DieType::D10, DieType::D12];

    pub fn sides(&self) -> u32 {
        match self {
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A healing roll: `count` dice of one size plus a flat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealingFormula {
    pub count: u32,
    pub die_type: DieType,
    pub modifier: i32,
}

impl HealingFormula {
    pub fn new(count: u32, die_type: DieType, modifier: i32) -> Self {
        Self {
            count,
            die_type,
            modifier,
        }
    }

    /// Parse `NdD`, `NdD+M` or `NdD-M`. A missing count means one die.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation: String = notation
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(notation.clone()))?;
        let count_str = &notation[..d_pos];
        let rest = &notation[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(notation.clone()))?
        };
        if count == 0 {
            return Err(DiceError::NoDice);
        }

        let (sides_str, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(sign_pos) => {
                let modifier: i32 = rest[sign_pos..]
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
                (&rest[..sign_pos], modifier)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
        let die_type = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        Ok(Self::new(count, die_type, modifier))
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollResult {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.gen_range(1..=self.die_type.sides()))
            .collect();
        let dice_total: i32 = rolls.iter().map(|r| *r as i32).sum();

        RollResult {
            formula: self.to_string(),
            die_type: self.die_type,
            rolls,
            modifier: self.modifier,
            total: dice_total + self.modifier,
        }
    }
}

impl FromStr for HealingFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HealingFormula::parse(s)
    }
}

impl fmt::Display for HealingFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}{}", self.count, self.die_type),
            m if m > 0 => write!(f, "{}{}+{}", self.count, self.die_type, m),
            m => write!(f, "{}{}{}", self.count, self.die_type, m),
        }
    }
}

/// Complete result of a healing roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub formula: String,
    pub die_type: DieType,
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        let dice_str = format!(
            "[{}]",
            self.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        match self.modifier {
            0 => dice_str,
            m if m > 0 => format!("{dice_str} + {m}"),
            m => format!("{} - {}", dice_str, m.abs()),
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

/// Evaluates formula strings into roll results.
#[async_trait]
pub trait RollEngine: Send + Sync {
    async fn evaluate(&self, formula: &str) -> Result<RollResult, DiceError>;
}

/// Default roll engine backed by a seedable RNG.
pub struct RandomRollEngine {
    rng: Mutex<StdRng>,
}

impl RandomRollEngine {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic engine for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomRollEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RollEngine for RandomRollEngine {
    async fn evaluate(&self, formula: &str) -> Result<RollResult, DiceError> {
        let parsed = HealingFormula::parse(formula)?;
        let result = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| DiceError::EngineUnavailable("rng lock poisoned".to_string()))?;
            parsed.roll_with_rng(&mut *rng)
        };
        tracing::debug!(formula = %result.formula, total = result.total, "Evaluated roll");
        Ok(result)
    }
}
