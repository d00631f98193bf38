//! The eight-phase zone tick.
//!
//! Each clock event the runtime, holding the zone lock, runs:
//!
//! 1. advance the tick counter (and clear the per-tick action dedup set)
//! 2. deferred timers — active-effect expiry, player revivals due
//! 3. queued actions — these serialize through the same zone lock
//!    between ticks, so there is nothing to drain here
//! 4. mob AI
//! 5. combat resolution — auto-attacks for engaged pairs, DoT/regen
//! 6. resource-node respawn
//! 7. mob respawn
//! 8. spatial index rebuild
//!
//! Per-entity failures are logged and skipped for the tick; only a tick
//! counter overflow aborts (and that ends the zone, not the process).

use tracing::debug;

use mistvale_entities::combat::{DamageInput, apply_damage, apply_periodic, resolve_damage};
use mistvale_entities::effects;
use mistvale_types::{EntityId, Role, StatBlock, ZoneEvent};

use crate::ai;
use crate::death;
use crate::error::ZoneError;
use crate::jobs::LedgerJob;
use crate::runtime::ZoneContext;
use crate::state::ZoneState;

/// Summary of one tick's execution.
#[derive(Debug, Default)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Active effects that expired this tick.
    pub effects_expired: usize,
    /// Auto-attacks resolved.
    pub attacks_resolved: usize,
    /// Entities that died this tick.
    pub deaths: Vec<EntityId>,
    /// Mobs re-inserted by the respawner.
    pub mobs_respawned: usize,
    /// Nodes restored to full charges.
    pub nodes_respawned: usize,
    /// Players revived.
    pub players_respawned: usize,
    /// Best-effort loot mints for the caller to dispatch after the zone
    /// lock is released.
    pub loot_jobs: Vec<LedgerJob>,
}

/// Execute one complete tick of a zone.
///
/// # Errors
///
/// Returns [`ZoneError::Clock`] only on tick counter overflow.
pub fn run_tick(state: &mut ZoneState, ctx: &ZoneContext) -> Result<TickSummary, ZoneError> {
    let mut summary = TickSummary::default();

    // --- Phase 1: advance the clock ---
    summary.tick = state.advance_tick()?;

    // --- Phase 2: deferred timers ---
    summary.effects_expired = expire_all_effects(state);
    summary.players_respawned = death::run_player_respawns(state);

    // --- Phase 3: queued actions serialize through the zone mutex ---

    // --- Phase 4: mob AI ---
    let moved = ai::advance_mobs(state, summary.tick);

    // --- Phase 5: combat resolution ---
    resolve_combat(state, ctx, &mut summary);

    // --- Phase 6: node respawn ---
    summary.nodes_respawned = death::run_node_respawns(state);

    // --- Phase 7: mob respawn ---
    summary.mobs_respawned = death::run_mob_respawns(state);

    // --- Phase 8: spatial index rebuild ---
    state.rebuild_spatial();

    debug!(
        zone = %state.id,
        tick = summary.tick,
        mobs_moved = moved,
        attacks = summary.attacks_resolved,
        deaths = summary.deaths.len(),
        "tick complete"
    );
    Ok(summary)
}

/// Phase 2a: expire timed effects on every combat entity.
fn expire_all_effects(state: &mut ZoneState) -> usize {
    let tick = state.tick();
    let mut expired = 0_usize;
    for entity in state.entities.values_mut() {
        let dropped = match &mut entity.role {
            Role::Player(p) => effects::expire_effects(&mut p.active_effects, tick),
            Role::Mob(m) => effects::expire_effects(&mut m.active_effects, tick),
            _ => 0,
        };
        expired = expired.saturating_add(dropped);
    }
    expired
}

/// A pending auto-attack, collected before any mutation.
pub(crate) struct PendingSwing {
    /// The swinging entity.
    pub(crate) attacker: EntityId,
    /// The entity being hit.
    pub(crate) target: EntityId,
}

/// Phase 5: periodic effect HP, then auto-attacks for engaged pairs.
fn resolve_combat(state: &mut ZoneState, ctx: &ZoneContext, summary: &mut TickSummary) {
    apply_periodic_effects(state, ctx, summary);

    let tick = state.tick();
    let attack_range = ctx.config.proximity.attack;
    let cooldown = ctx.config.world.attack_cooldown_ticks;

    // Collect ready swings without holding borrows across mutation.
    let mut swings: Vec<PendingSwing> = Vec::new();
    for entity in state.entities.values() {
        match &entity.role {
            Role::Player(p) if p.alive && p.attack_ready_at <= tick => {
                if let Some(target) = p.engaged_target {
                    let in_range = state
                        .entity(target)
                        .is_some_and(|t| entity.pos.within_range(t.pos, attack_range));
                    if in_range {
                        swings.push(PendingSwing {
                            attacker: entity.id,
                            target,
                        });
                    }
                }
            }
            Role::Mob(m) if m.alive && m.attack_ready_at <= tick => {
                if let Some(target) = m.aggro_target {
                    let in_range = state
                        .entity(target)
                        .is_some_and(|t| entity.pos.within_range(t.pos, m.strike_radius));
                    if in_range {
                        swings.push(PendingSwing {
                            attacker: entity.id,
                            target,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    for swing in swings {
        if let Some((_damage, outcome)) = resolve_swing(state, ctx, &swing, tick, cooldown) {
            summary.attacks_resolved = summary.attacks_resolved.saturating_add(1);
            if !outcome.killed.is_empty() {
                summary.deaths.extend(outcome.killed);
                summary.loot_jobs.extend(outcome.loot);
            }
        }
    }
}

/// One swing resolved on behalf of an `attack` action, with the damage
/// figure surfaced for the action outcome.
pub(crate) struct ActionSwing {
    /// Damage applied.
    pub(crate) damage: u32,
    /// Entities killed by the swing.
    pub(crate) killed: Vec<EntityId>,
    /// Loot jobs produced by those deaths.
    pub(crate) loot: Vec<LedgerJob>,
}

/// Resolve a swing for the attack action path.
pub(crate) fn resolve_swing_for_action(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    swing: &PendingSwing,
    tick: u64,
    cooldown: u64,
) -> Option<ActionSwing> {
    resolve_swing(state, ctx, swing, tick, cooldown).map(|(damage, outcome)| ActionSwing {
        damage,
        killed: outcome.killed,
        loot: outcome.loot,
    })
}

/// Outcome of one resolved swing.
pub(crate) struct SwingOutcome {
    /// Entities killed by the swing.
    pub killed: Vec<EntityId>,
    /// Loot jobs produced by those deaths.
    pub loot: Vec<LedgerJob>,
}

/// Resolve one swing: damage, death processing, cooldown stamp.
fn resolve_swing(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    swing: &PendingSwing,
    tick: u64,
    cooldown: u64,
) -> Option<(u32, SwingOutcome)> {
    let (damage, target_is_player) = {
        let attacker = state.entity(swing.attacker)?;
        let target = state.entity(swing.target)?;
        if !attacker.is_alive() || !target.is_alive() {
            return None;
        }
        let (attacker_stats, weapon_coef, out_pct) = attack_profile(attacker, ctx);
        let (defender_stats, in_pct) = defense_profile(target);
        (
            resolve_damage(&DamageInput {
                attacker: &attacker_stats,
                defender: &defender_stats,
                weapon_coef_pct: weapon_coef,
                technique_add: 0,
                attacker_out_pct: out_pct,
                defender_in_pct: in_pct,
            }),
            target.as_player().is_some(),
        )
    };

    // Stamp the attacker's cooldown.
    if let Some(attacker) = state.entity_mut(swing.attacker) {
        match &mut attacker.role {
            Role::Player(p) => p.attack_ready_at = tick.saturating_add(cooldown),
            Role::Mob(m) => m.attack_ready_at = tick.saturating_add(cooldown),
            _ => return None,
        }
    }

    // Apply the damage.
    let died = {
        let target = state.entity_mut(swing.target)?;
        match &mut target.role {
            Role::Player(p) => {
                let (hp, died) = apply_damage(p.hp, damage);
                p.hp = hp;
                died
            }
            Role::Mob(m) => {
                let (hp, died) = apply_damage(m.hp, damage);
                m.hp = hp;
                died
            }
            _ => return None,
        }
    };

    state.push_event(ZoneEvent::AttackLanded {
        attacker: swing.attacker,
        target: swing.target,
        damage,
    });

    let mut outcome = SwingOutcome {
        killed: Vec::new(),
        loot: Vec::new(),
    };
    if died {
        outcome.killed.push(swing.target);
        if target_is_player {
            death::process_player_death(state, ctx, swing.target, Some(swing.attacker));
        } else {
            outcome.loot =
                death::process_mob_death(state, ctx, swing.target, Some(swing.attacker));
        }
    }
    Some((damage, outcome))
}

/// Attacker-side damage profile: effective stats, weapon coefficient,
/// bounded outgoing percent.
pub(crate) fn attack_profile(
    entity: &mistvale_types::Entity,
    ctx: &ZoneContext,
) -> (StatBlock, u32, i32) {
    match &entity.role {
        Role::Player(p) => {
            let weapon_coef = p
                .equipment
                .get(&mistvale_types::EquipSlot::Weapon)
                .filter(|w| !w.broken)
                .and_then(|w| ctx.content.items.get(&w.token))
                .map_or(100, mistvale_content::items::ItemDef::weapon_coef_pct);
            (
                p.effective_stats(),
                if weapon_coef == 0 { 100 } else { weapon_coef },
                effects::outgoing_damage_pct(&p.active_effects),
            )
        }
        Role::Mob(m) => (
            m.stats,
            100,
            effects::outgoing_damage_pct(&m.active_effects),
        ),
        _ => (StatBlock::default(), 100, 0),
    }
}

/// Defender-side profile: effective stats and bounded incoming percent.
pub(crate) fn defense_profile(entity: &mistvale_types::Entity) -> (StatBlock, i32) {
    match &entity.role {
        Role::Player(p) => (
            p.effective_stats(),
            effects::incoming_damage_pct(&p.active_effects),
        ),
        Role::Mob(m) => (m.stats, effects::incoming_damage_pct(&m.active_effects)),
        _ => (StatBlock::default(), 0),
    }
}

/// Phase 5a: DoT/regen from active effects, with death processing.
fn apply_periodic_effects(state: &mut ZoneState, ctx: &ZoneContext, summary: &mut TickSummary) {
    let ids: Vec<EntityId> = state.entities.keys().copied().collect();
    for id in ids {
        let result = {
            let Some(entity) = state.entity_mut(id) else {
                continue;
            };
            match &mut entity.role {
                Role::Player(p) if p.alive => {
                    let delta = effects::hp_per_tick(&p.active_effects);
                    if delta == 0 {
                        continue;
                    }
                    let (hp, died) = apply_periodic(p.hp, p.max_hp, delta);
                    p.hp = hp;
                    Some((died, true))
                }
                Role::Mob(m) if m.alive => {
                    let delta = effects::hp_per_tick(&m.active_effects);
                    if delta == 0 {
                        continue;
                    }
                    let (hp, died) = apply_periodic(m.hp, m.max_hp, delta);
                    m.hp = hp;
                    Some((died, false))
                }
                _ => None,
            }
        };

        if let Some((true, is_player)) = result {
            summary.deaths.push(id);
            if is_player {
                death::process_player_death(state, ctx, id, None);
            } else {
                // A DoT kill has no attributable killer on this path.
                let jobs = death::process_mob_death(state, ctx, id, None);
                summary.loot_jobs.extend(jobs);
            }
        }
    }
}
