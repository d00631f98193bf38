//! Mob behavior: idle → aggro → strike.
//!
//! Each tick, every live mob either acquires the nearest live player
//! within its detection radius, walks one straight-line step toward its
//! target (terrain cost weighted: heavy tiles are crossed every other
//! tick), or stands ready to strike — the actual swing happens in the
//! combat phase. There is no path planning; a blocked step just waits.

use mistvale_types::{EntityId, Position};

use crate::state::ZoneState;

/// Advance every mob's behavior by one tick. Returns how many mobs
/// moved (for the tick summary).
pub fn advance_mobs(state: &mut ZoneState, tick: u64) -> usize {
    let mob_ids: Vec<EntityId> = state
        .entities
        .values()
        .filter(|e| e.as_mob().is_some_and(|m| m.alive))
        .map(|e| e.id)
        .collect();

    let mut moved = 0_usize;
    for mob_id in mob_ids {
        if advance_one(state, mob_id, tick) {
            moved = moved.saturating_add(1);
        }
    }
    moved
}

fn advance_one(state: &mut ZoneState, mob_id: EntityId, tick: u64) -> bool {
    let Some(entity) = state.entity(mob_id) else {
        return false;
    };
    let mob_pos = entity.pos;
    let Some(mob) = entity.as_mob() else {
        return false;
    };
    let detection = mob.detection_radius;
    let strike = mob.strike_radius;
    let current_target = mob.aggro_target;

    // Validate or acquire the aggro target from the spatial index. The
    // index may be one tick stale; target positions are re-read exactly.
    let target = current_target
        .filter(|id| is_live_player(state, *id))
        .or_else(|| nearest_live_player(state, mob_pos, detection));

    let target_pos = target.and_then(|id| state.entity(id).map(|e| e.pos));

    let Some(mob) = state.entity_mut(mob_id).and_then(|e| e.as_mob_mut()) else {
        return false;
    };
    mob.aggro_target = target;

    let Some(target_pos) = target_pos else {
        return false;
    };
    if mob_pos.within_range(target_pos, strike) {
        return false;
    }

    // Heavy terrain halves effective speed: cross it on even ticks only.
    if state.terrain.move_cost(mob_pos) >= 1.5 && tick % 2 == 1 {
        return false;
    }

    let next = mob_pos.step_toward(target_pos);
    if next == mob_pos || !state.terrain.is_walkable(next) {
        return false;
    }
    if let Some(entity) = state.entity_mut(mob_id) {
        entity.pos = next;
        return true;
    }
    false
}

fn is_live_player(state: &ZoneState, id: EntityId) -> bool {
    state
        .entity(id)
        .and_then(|e| e.as_player())
        .is_some_and(|p| p.alive)
}

fn nearest_live_player(state: &ZoneState, from: Position, radius: f64) -> Option<EntityId> {
    state
        .spatial
        .query_radius(from, radius)
        .into_iter()
        .filter(|id| is_live_player(state, *id))
        .min_by(|a, b| {
            let da = state.entity(*a).map_or(f64::MAX, |e| from.distance_to(e.pos));
            let db = state.entity(*b).map_or(f64::MAX, |e| from.distance_to(e.pos));
            da.total_cmp(&db)
        })
}
