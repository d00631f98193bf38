//! Active-effect bookkeeping: expiry, damage modifiers, periodic HP.
//!
//! Effects carry additive damage percentages and per-tick HP deltas. The
//! combined modifier from all live effects is bounded to ±75% before it
//! touches the damage formula, so stacking buffs cannot trivialize or
//! one-shot anything.

use mistvale_types::ActiveEffect;

/// Bound on the combined additive damage modifier, in percent.
pub const EFFECT_PCT_BOUND: i32 = 75;

/// Remove expired effects, returning how many were dropped.
pub fn expire_effects(effects: &mut Vec<ActiveEffect>, tick: u64) -> usize {
    let before = effects.len();
    effects.retain(|e| e.expires_at_tick > tick);
    before.saturating_sub(effects.len())
}

/// Combined additive percent applied to damage this entity *deals*,
/// bounded to ±[`EFFECT_PCT_BOUND`].
pub fn outgoing_damage_pct(effects: &[ActiveEffect]) -> i32 {
    bound_pct(effects.iter().map(|e| e.outgoing_damage_pct).sum())
}

/// Combined additive percent applied to damage this entity *takes*,
/// bounded to ±[`EFFECT_PCT_BOUND`].
pub fn incoming_damage_pct(effects: &[ActiveEffect]) -> i32 {
    bound_pct(effects.iter().map(|e| e.incoming_damage_pct).sum())
}

/// Net HP change per tick from damage-over-time and regeneration effects.
pub fn hp_per_tick(effects: &[ActiveEffect]) -> i64 {
    effects.iter().map(|e| e.hp_per_tick).sum()
}

const fn bound_pct(pct: i32) -> i32 {
    if pct > EFFECT_PCT_BOUND {
        EFFECT_PCT_BOUND
    } else if pct < -EFFECT_PCT_BOUND {
        -EFFECT_PCT_BOUND
    } else {
        pct
    }
}
