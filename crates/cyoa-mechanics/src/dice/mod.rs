//! Dice formulas, roll results, and the seeded roller.
//!
//! Formulas follow the grammar `^(\d+)d(\d+)([+-]\d+)?$`, matched
//! case-insensitively after all whitespace is removed, so `" 2D6 + 3 "`
//! reads the same as `2d6+3`.

pub mod roll;
pub mod roller;

pub use roll::RollResult;
pub use roller::DiceRoller;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DiceError, DiceResult};

/// Most dice a single formula may roll.
pub const MAX_DICE: u32 = 1000;

/// Most sides a single die may have.
pub const MAX_SIDES: u32 = 1_000_000;

static FORMULA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)d(\d+)([+-]\d+)?$").expect("valid regex"));

/// A parsed dice formula such as `2d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceFormula {
    /// Number of dice to roll.
    pub count: u32,
    /// Sides on each die.
    pub sides: u32,
    /// Flat amount added to the sum of the dice.
    pub modifier: i64,
}

impl DiceFormula {
    /// Build a formula, checking that it can be rolled.
    pub fn new(count: u32, sides: u32, modifier: i64) -> DiceResult<Self> {
        if !(1..=MAX_DICE).contains(&count) {
            return Err(DiceError::Range(format!("dice count must be 1 to {MAX_DICE}, got {count}")));
        }
        if !(2..=MAX_SIDES).contains(&sides) {
            return Err(DiceError::Range(format!("die sides must be 2 to {MAX_SIDES}, got {sides}")));
        }
        Ok(Self { count, sides, modifier })
    }

    /// A single d20 with a flat modifier.
    pub fn d20(modifier: i64) -> Self {
        Self {
            count: 1,
            sides: 20,
            modifier,
        }
    }

    /// Parse a formula string.
    pub fn parse(input: &str) -> DiceResult<Self> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let caps = FORMULA_RE
            .captures(&compact)
            .ok_or_else(|| DiceError::Format(input.to_string()))?;

        let count = caps[1]
            .parse::<u32>()
            .map_err(|_| DiceError::Range(format!("dice count '{}' is too large", &caps[1])))?;
        let sides = caps[2]
            .parse::<u32>()
            .map_err(|_| DiceError::Range(format!("die sides '{}' is too large", &caps[2])))?;
        let modifier = match caps.get(3) {
            Some(m) => m
                .as_str()
                .parse::<i64>()
                .map_err(|_| DiceError::Range(format!("modifier '{}' is too large", m.as_str())))?,
            None => 0,
        };
        Self::new(count, sides, modifier)
    }

    /// Whether this formula rolls exactly one d20, so critical rules apply.
    pub fn is_single_d20(&self) -> bool {
        self.count == 1 && self.sides == 20
    }

    /// The same dice with `extra` added to the modifier.
    pub fn plus(self, extra: i64) -> Self {
        Self {
            modifier: self.modifier.saturating_add(extra),
            ..self
        }
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Ability-style modifier for a stat: `floor((stat - 10) / 2)`.
pub fn stat_modifier(stat: i64) -> i64 {
    (stat - 10).div_euclid(2)
}
