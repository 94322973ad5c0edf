//! Effect application.
//!
//! Each [`Effect`] mutates one part of a [`GameState`]. A target touched
//! for the first time starts from its base value (wallets and inventory at
//! 0, stats at 10). Results are floored: wallets at 0, inventory at 0 with
//! the key removed, stats at 1.

mod rounding;

pub use rounding::Rounding;

use std::sync::Arc;

use cyoa_core::state::{DEFAULT_STAT_VALUE, MIN_STAT, MIN_WALLET};
use cyoa_core::{Clock, Effect, EffectKind, GameState, Operation, StatusEffect, SystemClock, Value};

use crate::error::{EffectError, EffectResult};

/// Applies effects to game states.
#[derive(Debug, Clone)]
pub struct EffectProcessor {
    rounding: Rounding,
    clock: Arc<dyn Clock>,
}

impl Default for EffectProcessor {
    fn default() -> Self {
        Self {
            rounding: Rounding::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl EffectProcessor {
    /// A processor with nearest rounding and the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rounding rule.
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Set the clock used to stamp `updatedAt`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The rounding rule in use.
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Apply one effect in place.
    ///
    /// Returns `Ok(false)` for effect types this processor does not know.
    pub fn apply_effect(&self, effect: &Effect, state: &mut GameState) -> EffectResult<bool> {
        match &effect.kind {
            EffectKind::Wallet => {
                let current = state.wallet(&effect.target);
                let next = self.arithmetic(effect, current)?.max(MIN_WALLET);
                state.wallets.insert(effect.target.clone(), next);
                tracing::debug!("Wallet effect: {} {current} -> {next}", effect.target);
            }
            EffectKind::Inventory => {
                let current = state.item_count(&effect.target);
                let next = self.arithmetic(effect, current)?.max(0);
                if next == 0 {
                    state.inventory.remove(&effect.target);
                } else {
                    state.inventory.insert(effect.target.clone(), next);
                }
                tracing::debug!("Inventory effect: {} {current} -> {next}", effect.target);
            }
            EffectKind::Stat => {
                let current = state.stat(&effect.target).unwrap_or(DEFAULT_STAT_VALUE);
                let next = self.arithmetic(effect, current)?.max(MIN_STAT);
                state.stats.insert(effect.target.clone(), next);
                tracing::debug!("Stat effect: {} {current} -> {next}", effect.target);
            }
            EffectKind::Flag => apply_flag(effect, state)?,
            EffectKind::StatusEffect => apply_status(effect, state)?,
            EffectKind::Unknown(kind) => {
                tracing::warn!("Unknown effect type: {kind}");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Apply effects in order and return the ones that took hold.
    ///
    /// Effects are independent: one that fails is logged and skipped, and
    /// the rest still apply. Stamps `updatedAt` when any effect was given.
    pub fn apply_effects(&self, effects: &[Effect], state: &mut GameState) -> Vec<Effect> {
        if effects.is_empty() {
            return Vec::new();
        }
        let mut applied = Vec::with_capacity(effects.len());
        for effect in effects {
            match self.apply_effect(effect, state) {
                Ok(true) => applied.push(effect.clone()),
                Ok(false) => {}
                Err(e) => tracing::warn!("Error applying effect ({effect}): {e}"),
            }
        }
        state.updated_at = self.clock.now();
        applied
    }

    /// Apply effects to a copy of `state`, leaving the original untouched.
    pub fn applied_to(&self, effects: &[Effect], state: &GameState) -> (GameState, Vec<Effect>) {
        let mut next = state.clone();
        let applied = self.apply_effects(effects, &mut next);
        (next, applied)
    }

    /// Advance every timed status effect by one turn.
    ///
    /// Durations above zero are decremented. Effects whose duration is (or
    /// reaches) zero are removed. Permanent effects are untouched.
    pub fn process_status_effect_durations(&self, state: &mut GameState) {
        state.status_effects.retain_mut(|effect| match effect.duration {
            None => true,
            Some(0) => false,
            Some(turns) => {
                effect.duration = Some(turns - 1);
                turns > 1
            }
        });
    }

    fn arithmetic(&self, effect: &Effect, current: i64) -> EffectResult<i64> {
        let value = numeric_value(effect)?;
        let current = current as f64;
        let result = match effect.operation {
            Operation::Add => current + value,
            Operation::Subtract => current - value,
            Operation::Set => value,
            Operation::Multiply => current * value,
            Operation::Unknown(_) => return Err(invalid_operation(effect, "unknown operation")),
        };
        Ok(self.rounding.apply(result))
    }
}

fn numeric_value(effect: &Effect) -> EffectResult<f64> {
    effect.value.to_number().ok_or_else(|| EffectError::InvalidValue {
        kind: effect.kind.to_string(),
        target: effect.target.clone(),
        found: effect.value.type_name(),
    })
}

fn invalid_operation(effect: &Effect, reason: impl Into<String>) -> EffectError {
    EffectError::InvalidOperation {
        kind: effect.kind.to_string(),
        target: effect.target.clone(),
        operation: effect.operation.to_string(),
        reason: reason.into(),
    }
}

fn apply_flag(effect: &Effect, state: &mut GameState) -> EffectResult<()> {
    let next = match &effect.operation {
        Operation::Set => effect.value.clone(),
        Operation::Unknown(_) => return Err(invalid_operation(effect, "unknown operation")),
        op => {
            let current = state.flags.get(&effect.target).cloned().unwrap_or_default();
            flag_arithmetic(op, &current, &effect.value).ok_or_else(|| {
                invalid_operation(
                    effect,
                    format!(
                        "arithmetic needs numbers, flag is {} and value is {}",
                        current.type_name(),
                        effect.value.type_name()
                    ),
                )
            })?
        }
    };
    if let Value::Float(n) = next
        && !n.is_finite()
    {
        return Err(invalid_operation(effect, format!("result {n} is not a finite number")));
    }
    tracing::debug!("Flag effect: {} -> {next}", effect.target);
    state.flags.insert(effect.target.clone(), next);
    Ok(())
}

/// Integers stay integers; anything involving a float becomes a float.
fn flag_arithmetic(op: &Operation, current: &Value, value: &Value) -> Option<Value> {
    match (current, value) {
        (Value::Integer(a), Value::Integer(b)) => {
            let n = match op {
                Operation::Add => a.saturating_add(*b),
                Operation::Subtract => a.saturating_sub(*b),
                Operation::Multiply => a.saturating_mul(*b),
                _ => return None,
            };
            Some(Value::Integer(n))
        }
        _ => {
            let (a, b) = (current.as_f64()?, value.as_f64()?);
            let n = match op {
                Operation::Add => a + b,
                Operation::Subtract => a - b,
                Operation::Multiply => a * b,
                _ => return None,
            };
            Some(Value::Float(n))
        }
    }
}

fn apply_status(effect: &Effect, state: &mut GameState) -> EffectResult<()> {
    match effect.operation {
        Operation::Add | Operation::Set => {
            let mut status = StatusEffect::new(effect.target.clone(), numeric_value(effect)?);
            status.duration = effect.duration();
            status.source = effect.source().map(str::to_string);
            match state.status_effects.iter_mut().find(|e| e.kind == effect.target) {
                Some(existing) => *existing = status,
                None => state.status_effects.push(status),
            }
            tracing::debug!("Status effect {}: {}", effect.operation, effect.target);
            Ok(())
        }
        Operation::Subtract => {
            state.status_effects.retain(|e| e.kind != effect.target);
            tracing::debug!("Status effect removed: {}", effect.target);
            Ok(())
        }
        Operation::Multiply | Operation::Unknown(_) => {
            Err(invalid_operation(effect, "status effects support add, set, and subtract"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cyoa_core::{FixedClock, StateManager};
    use proptest::prelude::*;

    fn state() -> GameState {
        let mut state = StateManager::new().create_new_state("p", "s", "start", "slot-1", None);
        state.wallets.insert("gold".into(), 100);
        state
    }

    fn fx(kind: EffectKind, target: &str, op: Operation, value: impl Into<Value>) -> Effect {
        Effect::new(kind, target, op, value)
    }

    #[test]
    fn wallet_floor() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Subtract, 250), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gold"), 0);

        p.apply_effect(&fx(EffectKind::Wallet, "gems", Operation::Add, 5), &mut s)
            .unwrap();
        p.apply_effect(&fx(EffectKind::Wallet, "gems", Operation::Multiply, -3), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gems"), 0);

        p.apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Set, -10), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gold"), 0);
    }

    #[test]
    fn wallet_fractional_multiply_rounds() {
        let mut s = state();
        s.wallets.insert("gold".into(), 5);
        EffectProcessor::new()
            .apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Multiply, 0.5), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gold"), 3);

        s.wallets.insert("gold".into(), 5);
        EffectProcessor::new()
            .with_rounding(Rounding::Down)
            .apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Multiply, 0.5), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gold"), 2);
    }

    #[test]
    fn inventory_zero_removes_key() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::Inventory, "sword", Operation::Add, 1), &mut s)
            .unwrap();
        assert_eq!(s.item_count("sword"), 1);
        p.apply_effect(&fx(EffectKind::Inventory, "sword", Operation::Subtract, 1), &mut s)
            .unwrap();
        assert!(!s.inventory.contains_key("sword"));

        p.apply_effect(&fx(EffectKind::Inventory, "arrow", Operation::Set, 12), &mut s)
            .unwrap();
        p.apply_effect(&fx(EffectKind::Inventory, "arrow", Operation::Multiply, 0), &mut s)
            .unwrap();
        assert!(!s.inventory.contains_key("arrow"));

        p.apply_effect(&fx(EffectKind::Inventory, "ghost", Operation::Subtract, 3), &mut s)
            .unwrap();
        assert!(!s.inventory.contains_key("ghost"));
    }

    #[test]
    fn stat_floor_and_default() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::Stat, "strength", Operation::Subtract, 20), &mut s)
            .unwrap();
        assert_eq!(s.stat("strength"), Some(1));

        p.apply_effect(&fx(EffectKind::Stat, "wisdom", Operation::Add, 2), &mut s)
            .unwrap();
        assert_eq!(s.stat("wisdom"), Some(12));

        p.apply_effect(&fx(EffectKind::Stat, "luck", Operation::Multiply, 1.5), &mut s)
            .unwrap();
        assert_eq!(s.stat("luck"), Some(15));

        p.apply_effect(&fx(EffectKind::Stat, "charisma", Operation::Add, -50), &mut s)
            .unwrap();
        assert_eq!(s.stat("charisma"), Some(1));
    }

    #[test]
    fn numeric_targets_reject_text() {
        let p = EffectProcessor::new();
        let mut s = state();
        let err = p
            .apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Add, "lots"), &mut s)
            .unwrap_err();
        assert!(matches!(err, EffectError::InvalidValue { found: "string", .. }));
        assert_eq!(s.wallet("gold"), 100);
    }

    #[test]
    fn numeric_targets_coerce_text_and_booleans() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Add, "5"), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gold"), 105);

        p.apply_effect(&fx(EffectKind::Inventory, "rope", Operation::Add, true), &mut s)
            .unwrap();
        assert_eq!(s.item_count("rope"), 1);

        p.apply_effect(&fx(EffectKind::Stat, "luck", Operation::Subtract, " 3 "), &mut s)
            .unwrap();
        assert_eq!(s.stat("luck"), Some(7));

        p.apply_effect(&fx(EffectKind::Wallet, "gold", Operation::Add, ""), &mut s)
            .unwrap();
        assert_eq!(s.wallet("gold"), 105);

        p.apply_effect(&fx(EffectKind::StatusEffect, "blessed", Operation::Add, true), &mut s)
            .unwrap();
        assert_eq!(s.status_effect("blessed").map(|e| e.value), Some(1.0));
    }

    #[test]
    fn unknown_operation_is_error() {
        let p = EffectProcessor::new();
        let mut s = state();
        let effect = fx(EffectKind::Wallet, "gold", Operation::Unknown("divide".into()), 2);
        assert!(matches!(
            p.apply_effect(&effect, &mut s),
            Err(EffectError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn flags() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::Flag, "door", Operation::Set, "open"), &mut s)
            .unwrap();
        assert_eq!(s.flags["door"], Value::from("open"));

        p.apply_effect(&fx(EffectKind::Flag, "rep", Operation::Add, 2), &mut s)
            .unwrap();
        p.apply_effect(&fx(EffectKind::Flag, "rep", Operation::Multiply, 3), &mut s)
            .unwrap();
        assert_eq!(s.flags["rep"], Value::Integer(6));

        p.apply_effect(&fx(EffectKind::Flag, "rep", Operation::Subtract, 0.5), &mut s)
            .unwrap();
        assert_eq!(s.flags["rep"], Value::Float(5.5));

        let err = p
            .apply_effect(&fx(EffectKind::Flag, "door", Operation::Add, 1), &mut s)
            .unwrap_err();
        assert!(matches!(err, EffectError::InvalidOperation { .. }));

        let err = p
            .apply_effect(&fx(EffectKind::Flag, "rep", Operation::Add, true), &mut s)
            .unwrap_err();
        assert!(matches!(err, EffectError::InvalidOperation { .. }));
    }

    #[test]
    fn flag_overflow_to_infinity_rejected() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::Flag, "huge", Operation::Set, 1e300), &mut s)
            .unwrap();
        let err = p
            .apply_effect(&fx(EffectKind::Flag, "huge", Operation::Multiply, 1e300), &mut s)
            .unwrap_err();
        assert!(matches!(err, EffectError::InvalidOperation { .. }));
        assert_eq!(s.flags["huge"], Value::Float(1e300));

        let snapshot = StateManager::new().create_snapshot(&s).unwrap();
        assert!(StateManager::new().restore_from_snapshot(&snapshot).is_ok());
    }

    #[test]
    fn status_effects_upsert() {
        let p = EffectProcessor::new();
        let mut s = state();
        let first = fx(EffectKind::StatusEffect, "poisoned", Operation::Add, 1).with_duration(3);
        let second = fx(EffectKind::StatusEffect, "poisoned", Operation::Add, 2)
            .with_duration(5)
            .with_source("spider");
        p.apply_effect(&first, &mut s).unwrap();
        p.apply_effect(&second, &mut s).unwrap();

        assert_eq!(s.status_effects.len(), 1);
        let poisoned = s.status_effect("poisoned").unwrap();
        assert_eq!(poisoned.value, 2.0);
        assert_eq!(poisoned.duration, Some(5));
        assert_eq!(poisoned.source.as_deref(), Some("spider"));
    }

    #[test]
    fn status_subtract_removes_regardless_of_value() {
        let p = EffectProcessor::new();
        let mut s = state();
        p.apply_effect(&fx(EffectKind::StatusEffect, "cursed", Operation::Set, 4), &mut s)
            .unwrap();
        p.apply_effect(&fx(EffectKind::StatusEffect, "cursed", Operation::Subtract, "ignored"), &mut s)
            .unwrap();
        assert!(!s.has_status_effect("cursed"));
    }

    #[test]
    fn status_multiply_rejected() {
        let p = EffectProcessor::new();
        let mut s = state();
        let err = p
            .apply_effect(&fx(EffectKind::StatusEffect, "haste", Operation::Multiply, 2), &mut s)
            .unwrap_err();
        assert!(matches!(err, EffectError::InvalidOperation { .. }));
    }

    #[test]
    fn durations_tick_and_expire() {
        let p = EffectProcessor::new();
        let mut s = state();
        s.status_effects = vec![
            StatusEffect::new("brief", 1.0).with_duration(1),
            StatusEffect::new("longer", 1.0).with_duration(3),
            StatusEffect::new("spent", 1.0).with_duration(0),
            StatusEffect::new("permanent", 1.0),
        ];
        p.process_status_effect_durations(&mut s);
        let kinds: Vec<&str> = s.status_effects.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["longer", "permanent"]);
        assert_eq!(s.status_effect("longer").unwrap().duration, Some(2));

        for _ in 0..10 {
            p.process_status_effect_durations(&mut s);
        }
        assert!(s.has_status_effect("permanent"));
        assert!(!s.has_status_effect("longer"));
    }

    #[test]
    fn batch_skips_failures_and_stamps() {
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let p = EffectProcessor::new().with_clock(Arc::new(FixedClock(later)));
        let mut s = state();
        let effects = vec![
            fx(EffectKind::Wallet, "gold", Operation::Subtract, 80),
            fx(EffectKind::Flag, "mood", Operation::Set, "grim"),
            fx(EffectKind::Unknown("reputation".into()), "guild", Operation::Add, 1),
            fx(EffectKind::Flag, "mood", Operation::Add, 1),
            fx(EffectKind::Inventory, "armor", Operation::Add, 1),
        ];
        let applied = p.apply_effects(&effects, &mut s);
        assert_eq!(applied.len(), 3);
        assert_eq!(applied[2].target, "armor");
        assert_eq!(s.wallet("gold"), 20);
        assert_eq!(s.item_count("armor"), 1);
        assert_eq!(s.updated_at, later);
    }

    #[test]
    fn applied_to_leaves_original() {
        let p = EffectProcessor::new();
        let original = state();
        let (next, applied) = p.applied_to(&[fx(EffectKind::Wallet, "gold", Operation::Set, 1)], &original);
        assert_eq!(applied.len(), 1);
        assert_eq!(next.wallet("gold"), 1);
        assert_eq!(original.wallet("gold"), 100);
    }

    fn op_strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            Just(Operation::Add),
            Just(Operation::Subtract),
            Just(Operation::Set),
            Just(Operation::Multiply),
        ]
    }

    proptest! {
        #[test]
        fn floors_hold(ops in proptest::collection::vec((op_strategy(), -500i64..500), 1..30)) {
            let p = EffectProcessor::new();
            let mut s = state();
            for (op, value) in ops {
                for kind in [EffectKind::Wallet, EffectKind::Inventory, EffectKind::Stat] {
                    p.apply_effect(&fx(kind, "x", op.clone(), value), &mut s).unwrap();
                }
                prop_assert!(s.wallet("x") >= 0);
                prop_assert!(s.inventory.get("x").is_none_or(|q| *q > 0));
                prop_assert!(s.stat("x").is_some_and(|v| v >= 1));
            }
        }
    }
}
