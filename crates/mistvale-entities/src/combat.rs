//! The damage model.
//!
//! One formula covers auto-attacks and damaging techniques:
//!
//! ```text
//! raw      = attacker.strength · weapon_coef + technique_add − defender.defense · DEF_COEF
//! modified = raw · (1 + (attacker_out_pct + defender_in_pct) / 100)    (sum bounded ±75%)
//! damage   = max(1, modified)          — the clamp applies to damaging effects only
//! ```
//!
//! The caller supplies effective stat blocks (equipment already folded
//! in) and the bounded effect percentages from [`crate::effects`].

use mistvale_types::StatBlock;

use crate::effects::EFFECT_PCT_BOUND;

/// Fraction of defender defense subtracted from raw damage.
pub const DEF_COEF: f64 = 0.5;

/// Inputs to one damage resolution.
#[derive(Debug, Clone, Copy)]
pub struct DamageInput<'a> {
    /// Attacker effective stats.
    pub attacker: &'a StatBlock,
    /// Defender effective stats.
    pub defender: &'a StatBlock,
    /// Weapon coefficient in percent (100 = ×1.0; bare hands 0 use 100).
    pub weapon_coef_pct: u32,
    /// Flat technique damage, 0 for auto-attacks.
    pub technique_add: u32,
    /// Attacker's bounded outgoing-damage percent.
    pub attacker_out_pct: i32,
    /// Defender's bounded incoming-damage percent.
    pub defender_in_pct: i32,
}

/// Resolve one damaging hit. Always at least 1.
pub fn resolve_damage(input: &DamageInput<'_>) -> u32 {
    let coef = if input.weapon_coef_pct == 0 {
        1.0
    } else {
        f64::from(input.weapon_coef_pct) / 100.0
    };

    let raw = f64::from(input.attacker.strength) * coef + f64::from(input.technique_add)
        - f64::from(input.defender.defense) * DEF_COEF;

    let pct = (input.attacker_out_pct.saturating_add(input.defender_in_pct))
        .clamp(-EFFECT_PCT_BOUND, EFFECT_PCT_BOUND);
    let modified = raw * (1.0 + f64::from(pct) / 100.0);

    if modified < 1.0 {
        1
    } else if modified >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        modified.round() as u32
    }
}

/// Apply damage to an HP pool, clamping at 0. Returns `(new_hp, died)`.
pub const fn apply_damage(hp: u32, damage: u32) -> (u32, bool) {
    let new_hp = hp.saturating_sub(damage);
    (new_hp, new_hp == 0)
}

/// Apply healing to an HP pool, clamping at the maximum.
pub const fn apply_heal(hp: u32, max_hp: u32, amount: u32) -> u32 {
    let healed = hp.saturating_add(amount);
    if healed > max_hp { max_hp } else { healed }
}

/// Apply a signed per-tick HP delta (DoT/regen), clamping to `0..=max`.
/// Returns `(new_hp, died)`.
pub fn apply_periodic(hp: u32, max_hp: u32, delta: i64) -> (u32, bool) {
    if delta >= 0 {
        let amount = u32::try_from(delta).unwrap_or(u32::MAX);
        (apply_heal(hp, max_hp, amount), false)
    } else {
        let amount = u32::try_from(delta.saturating_neg()).unwrap_or(u32::MAX);
        apply_damage(hp, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(strength: u32, defense: u32) -> StatBlock {
        StatBlock {
            strength,
            defense,
            ..StatBlock::default()
        }
    }

    #[test]
    fn basic_formula() {
        // 10 · 1.0 + 0 − 4 · 0.5 = 8
        let attacker = stats(10, 0);
        let defender = stats(0, 4);
        let damage = resolve_damage(&DamageInput {
            attacker: &attacker,
            defender: &defender,
            weapon_coef_pct: 100,
            technique_add: 0,
            attacker_out_pct: 0,
            defender_in_pct: 0,
        });
        assert_eq!(damage, 8);
    }

    #[test]
    fn weapon_coefficient_scales_strength() {
        // 10 · 1.5 + 0 − 0 = 15
        let attacker = stats(10, 0);
        let defender = stats(0, 0);
        let damage = resolve_damage(&DamageInput {
            attacker: &attacker,
            defender: &defender,
            weapon_coef_pct: 150,
            technique_add: 0,
            attacker_out_pct: 0,
            defender_in_pct: 0,
        });
        assert_eq!(damage, 15);
    }

    #[test]
    fn technique_adds_flat_damage() {
        // 10 + 6 − 2 = 14
        let attacker = stats(10, 0);
        let defender = stats(0, 4);
        let damage = resolve_damage(&DamageInput {
            attacker: &attacker,
            defender: &defender,
            weapon_coef_pct: 100,
            technique_add: 6,
            attacker_out_pct: 0,
            defender_in_pct: 0,
        });
        assert_eq!(damage, 14);
    }

    #[test]
    fn damage_clamps_at_one() {
        let attacker = stats(1, 0);
        let defender = stats(0, 100);
        let damage = resolve_damage(&DamageInput {
            attacker: &attacker,
            defender: &defender,
            weapon_coef_pct: 100,
            technique_add: 0,
            attacker_out_pct: 0,
            defender_in_pct: 0,
        });
        assert_eq!(damage, 1);
    }

    #[test]
    fn effect_percent_modifies_multiplicatively_over_the_sum() {
        // raw 10, +20% out and +10% in → 10 · 1.3 = 13
        let attacker = stats(10, 0);
        let defender = stats(0, 0);
        let damage = resolve_damage(&DamageInput {
            attacker: &attacker,
            defender: &defender,
            weapon_coef_pct: 100,
            technique_add: 0,
            attacker_out_pct: 20,
            defender_in_pct: 10,
        });
        assert_eq!(damage, 13);
    }

    #[test]
    fn combined_percent_is_bounded() {
        // +60 out and +60 in bound to +75 → 10 · 1.75 = 18 (rounded)
        let attacker = stats(10, 0);
        let defender = stats(0, 0);
        let damage = resolve_damage(&DamageInput {
            attacker: &attacker,
            defender: &defender,
            weapon_coef_pct: 100,
            technique_add: 0,
            attacker_out_pct: 60,
            defender_in_pct: 60,
        });
        assert_eq!(damage, 18);
    }

    #[test]
    fn apply_damage_clamps_and_reports_death() {
        assert_eq!(apply_damage(30, 12), (18, false));
        assert_eq!(apply_damage(10, 12), (0, true));
        assert_eq!(apply_damage(12, 12), (0, true));
    }

    #[test]
    fn apply_heal_clamps_at_max() {
        assert_eq!(apply_heal(90, 100, 25), 100);
        assert_eq!(apply_heal(50, 100, 25), 75);
    }

    #[test]
    fn periodic_handles_both_signs() {
        assert_eq!(apply_periodic(50, 100, 5), (55, false));
        assert_eq!(apply_periodic(3, 100, -5), (0, true));
    }
}
