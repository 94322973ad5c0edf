//! How fractional effect results become whole numbers.

use serde::{Deserialize, Serialize};

/// Rounding rule for wallet, inventory, and stat arithmetic.
///
/// Balances, quantities, and stats are whole numbers, but effect values
/// may be fractional (`multiply` by `0.5`). The result is rounded with this
/// rule before the target's floor is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Nearest integer, halves away from zero.
    #[default]
    Nearest,
    /// Toward negative infinity.
    Down,
    /// Toward positive infinity.
    Up,
    /// Drop the fractional part.
    TowardZero,
}

impl Rounding {
    /// Round `n` to a whole number.
    pub fn apply(self, n: f64) -> i64 {
        let rounded = match self {
            Self::Nearest => n.round(),
            Self::Down => n.floor(),
            Self::Up => n.ceil(),
            Self::TowardZero => n.trunc(),
        };
        // Float-to-int `as` saturates at the i64 bounds and maps NaN to 0.
        rounded as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rounds_halves_away_from_zero() {
        assert_eq!(Rounding::Nearest.apply(2.5), 3);
        assert_eq!(Rounding::Nearest.apply(-2.5), -3);
        assert_eq!(Rounding::Nearest.apply(2.4), 2);
        assert_eq!(Rounding::Nearest.apply(15.0), 15);
    }

    #[test]
    fn directed_rules() {
        assert_eq!(Rounding::Down.apply(2.7), 2);
        assert_eq!(Rounding::Down.apply(-2.2), -3);
        assert_eq!(Rounding::Up.apply(2.1), 3);
        assert_eq!(Rounding::TowardZero.apply(-2.7), -2);
    }

    #[test]
    fn saturates() {
        assert_eq!(Rounding::Nearest.apply(1e300), i64::MAX);
        assert_eq!(Rounding::Nearest.apply(f64::NAN), 0);
    }

    #[test]
    fn deserializes_snake_case() {
        let r: Rounding = serde_json::from_str("\"toward_zero\"").unwrap();
        assert_eq!(r, Rounding::TowardZero);
        assert_eq!(Rounding::default(), Rounding::Nearest);
    }
}
