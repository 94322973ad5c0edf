//! Dice mechanics for the CYOA rules engine.
//!
//! Parses dice formulas such as `2d6+3`, rolls them with a seeded
//! ChaCha20 generator so a session can be replayed from a stored seed,
//! and applies D20 critical rules and ability-style stat modifiers.

pub mod dice;
pub mod error;

pub use dice::{DiceFormula, DiceRoller, RollResult, stat_modifier};
pub use error::{DiceError, DiceResult};
