//! The seeded dice roller.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use super::{DiceFormula, RollResult, stat_modifier};
use crate::error::{DiceError, DiceResult};

/// Rolls dice from a ChaCha20 stream.
///
/// A roller seeded from a string produces the same sequence every time,
/// which is what makes a play session replayable. Create one roller per
/// transition rather than sharing one.
#[derive(Debug, Clone)]
pub struct DiceRoller {
    rng: ChaCha20Rng,
}

impl Default for DiceRoller {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl DiceRoller {
    /// A roller whose sequence is fixed by `seed`.
    pub fn seeded(seed: &str) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed_key(seed)),
        }
    }

    /// A roller seeded from the thread RNG.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_rng(&mut rand::rng()),
        }
    }

    /// Replace the generator with one seeded from `seed`.
    pub fn set_seed(&mut self, seed: &str) {
        self.rng = ChaCha20Rng::from_seed(seed_key(seed));
    }

    /// Parse and roll a formula, judging success against `difficulty` if given.
    pub fn roll(&mut self, formula: &str, difficulty: Option<i64>) -> DiceResult<RollResult> {
        let formula = DiceFormula::parse(formula)?;
        Ok(self.roll_formula(&formula, difficulty))
    }

    /// Roll an already parsed formula.
    ///
    /// On a single d20 a natural 20 always succeeds and a natural 1 always
    /// fails, whatever the difficulty.
    pub fn roll_formula(&mut self, formula: &DiceFormula, difficulty: Option<i64>) -> RollResult {
        let rolls: Vec<u32> = (0..formula.count)
            .map(|_| self.rng.random_range(1..=formula.sides))
            .collect();
        let natural: i64 = rolls.iter().map(|r| i64::from(*r)).sum();
        let total = natural.saturating_add(formula.modifier);

        let mut critical_success = false;
        let mut critical_failure = false;
        let mut success = difficulty.map(|dc| total >= dc);
        if formula.is_single_d20() {
            match rolls.first() {
                Some(20) => {
                    critical_success = true;
                    success = Some(true);
                }
                Some(1) => {
                    critical_failure = true;
                    success = Some(false);
                }
                _ => {}
            }
        }

        RollResult {
            total,
            rolls,
            modifier: formula.modifier,
            formula: formula.to_string(),
            success,
            critical_success,
            critical_failure,
        }
    }

    /// Roll `1d20` plus the modifier for `stat` against `difficulty`.
    pub fn roll_with_stat_modifier(&mut self, stat: i64, difficulty: i64) -> RollResult {
        self.roll_formula(&DiceFormula::d20(stat_modifier(stat)), Some(difficulty))
    }

    /// Roll an authored formula with the modifier for `stat` added.
    pub fn roll_with_formula_and_stat(&mut self, formula: &str, stat: i64, difficulty: i64) -> DiceResult<RollResult> {
        let formula = DiceFormula::parse(formula)?.plus(stat_modifier(stat));
        Ok(self.roll_formula(&formula, Some(difficulty)))
    }

    /// A uniform integer in `min..=max`.
    pub fn random_int(&mut self, min: i64, max: i64) -> DiceResult<i64> {
        if min > max {
            return Err(DiceError::Range(format!("min {min} is greater than max {max}")));
        }
        Ok(self.rng.random_range(min..=max))
    }

    /// A uniformly chosen element of `items`.
    pub fn random_element<'a, T>(&mut self, items: &'a [T]) -> DiceResult<&'a T> {
        if items.is_empty() {
            return Err(DiceError::EmptyInput);
        }
        let index = self.rng.random_range(0..items.len());
        items.get(index).ok_or(DiceError::EmptyInput)
    }
}

fn seed_key(seed: &str) -> [u8; 32] {
    Sha256::digest(seed.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Find a seed whose first d20 shows `face`.
    fn seed_showing(face: u32) -> String {
        (0..10_000)
            .map(|i| format!("crit-{i}"))
            .find(|seed| DiceRoller::seeded(seed).roll("1d20", None).unwrap().rolls[0] == face)
            .unwrap()
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = DiceRoller::seeded("abc");
        let mut b = DiceRoller::seeded("abc");
        for _ in 0..20 {
            assert_eq!(a.roll("3d6+1", None).unwrap(), b.roll("3d6+1", None).unwrap());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = DiceRoller::seeded("abc");
        let mut b = DiceRoller::seeded("abd");
        let ra: Vec<u32> = (0..10).flat_map(|_| a.roll("1d20", None).unwrap().rolls).collect();
        let rb: Vec<u32> = (0..10).flat_map(|_| b.roll("1d20", None).unwrap().rolls).collect();
        assert_ne!(ra, rb);
    }

    #[test]
    fn set_seed_restarts_sequence() {
        let mut roller = DiceRoller::seeded("replay");
        let first = roller.roll("4d6", None).unwrap();
        roller.roll("4d6", None).unwrap();
        roller.set_seed("replay");
        assert_eq!(roller.roll("4d6", None).unwrap(), first);
    }

    #[test]
    fn natural_twenty_ignores_difficulty() {
        let seed = seed_showing(20);
        let r = DiceRoller::seeded(&seed).roll("1d20", Some(1000)).unwrap();
        assert!(r.critical_success);
        assert_eq!(r.success, Some(true));
    }

    #[test]
    fn natural_one_always_fails() {
        let seed = seed_showing(1);
        let r = DiceRoller::seeded(&seed).roll("1d20+50", Some(2)).unwrap();
        assert!(r.critical_failure);
        assert_eq!(r.success, Some(false));
        assert_eq!(r.total, 51);
    }

    #[test]
    fn criticals_only_on_single_d20() {
        for i in 0..200 {
            let r = DiceRoller::seeded(&format!("s{i}")).roll("2d20", Some(10)).unwrap();
            assert!(!r.critical_success && !r.critical_failure);
        }
    }

    #[test]
    fn no_difficulty_no_verdict() {
        let r = DiceRoller::seeded("x").roll("2d6", None).unwrap();
        assert_eq!(r.success, None);
    }

    #[test]
    fn stat_modifier_in_formula() {
        let r = DiceRoller::seeded("x").roll_with_stat_modifier(14, 12);
        assert_eq!(r.modifier, 2);
        assert_eq!(r.formula, "1d20+2");

        let r = DiceRoller::seeded("x").roll_with_stat_modifier(7, 12);
        assert_eq!(r.modifier, -2);
        assert_eq!(r.formula, "1d20-2");
    }

    #[test]
    fn authored_formula_with_stat() {
        let r = DiceRoller::seeded("x").roll_with_formula_and_stat("2d6+1", 16, 9).unwrap();
        assert_eq!(r.modifier, 4);
        assert_eq!(r.formula, "2d6+4");
        assert_eq!(r.rolls.len(), 2);
        assert!(DiceRoller::seeded("x").roll_with_formula_and_stat("nope", 10, 9).is_err());
    }

    #[test]
    fn random_int_bounds() {
        let mut roller = DiceRoller::seeded("ints");
        for _ in 0..100 {
            let n = roller.random_int(-3, 3).unwrap();
            assert!((-3..=3).contains(&n));
        }
        assert_eq!(roller.random_int(5, 5).unwrap(), 5);
        assert!(matches!(roller.random_int(4, 3), Err(DiceError::Range(_))));
    }

    #[test]
    fn random_element_picks_member() {
        let mut roller = DiceRoller::seeded("pick");
        let items = ["a", "b", "c"];
        assert!(items.contains(roller.random_element(&items).unwrap()));
        let empty: [u8; 0] = [];
        assert_eq!(roller.random_element(&empty), Err(DiceError::EmptyInput));
    }

    #[test]
    fn entropy_rollers_work() {
        let r = DiceRoller::default().roll("1d6", None).unwrap();
        assert!((1..=6).contains(&r.rolls[0]));
    }

    proptest! {
        #[test]
        fn dice_in_range(seed in "[a-z0-9]{1,12}", count in 1u32..10, sides in 2u32..100, modifier in -20i64..20) {
            let formula = DiceFormula::new(count, sides, modifier).unwrap();
            let r = DiceRoller::seeded(&seed).roll_formula(&formula, None);
            prop_assert_eq!(r.rolls.len(), count as usize);
            prop_assert!(r.rolls.iter().all(|v| (1..=sides).contains(v)));
            prop_assert_eq!(r.total, r.natural() + modifier);
        }

        #[test]
        fn seeded_rolls_repeat(seed in ".{0,20}", formula in "[1-5]d(4|6|8|10|12|20)") {
            let a = DiceRoller::seeded(&seed).roll(&formula, None).unwrap();
            let b = DiceRoller::seeded(&seed).roll(&formula, None).unwrap();
            prop_assert_eq!(a.rolls, b.rolls);
            prop_assert_eq!(a.total, b.total);
        }
    }
}
