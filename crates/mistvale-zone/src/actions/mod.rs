//! Action execution inside the zone runtime.
//!
//! The dispatcher routes a validated [`ActionEnvelope`] here; execution
//! acquires the zone lock (the fair mutex serializes actions in arrival
//! order), runs the common precondition pipeline, and hands off to the
//! per-verb handler. Handlers that touch the ledger follow one of two
//! disciplines:
//!
//! - **blocking-in-actor** for infrequent calls (craft, shop, quest
//!   rewards): the ledger call runs while this task holds no zone lock
//!   where possible, but the action itself completes synchronously from
//!   the caller's view;
//! - **deferred reserve-then-compensate** for gathering: state is
//!   reserved under the lock, the lock is released for the mint, and a
//!   failure re-locks to restore node charge and tool durability.
//!
//! Every path returns an [`ActionOutcome`] or a typed [`ActionError`];
//! nothing panics across the tick boundary.

mod craft;
mod gather;
mod quest;
mod trade;

use mistvale_entities::validation::{require_alive, require_wallet, require_within_range};
use mistvale_types::{
    Action, ActionEnvelope, ActionError, ActionOutcome, Entity, EntityId, Position,
    PreconditionFailure, Role, TargetKind, ZoneEvent,
};

use mistvale_content::techniques::{TechniqueDef, TechniqueEffect};
use mistvale_entities::combat::apply_heal;
use mistvale_types::{ActiveEffect, EffectKind};

use crate::jobs;
use crate::runtime::{ZoneContext, ZoneHandle};
use crate::state::ZoneState;
use crate::tick::{self, PendingSwing};

/// Execute one action against its zone. This is the only entry point
/// the dispatcher uses.
pub async fn execute(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: ActionEnvelope,
) -> Result<ActionOutcome, ActionError> {
    match envelope.action.clone() {
        // Handlers that never touch the ledger complete under one lock.
        Action::Move { x, y } => {
            let mut state = zone.lock().await;
            preflight(&state, &envelope)?;
            dedup(&mut state, &envelope)?;
            handle_move(&mut state, envelope.entity, Position::new(x, y))
        }
        Action::Attack { target } => {
            let loot;
            let outcome;
            {
                let mut state = zone.lock().await;
                preflight(&state, &envelope)?;
                dedup(&mut state, &envelope)?;
                let (out, jobs) = handle_attack(&mut state, ctx, envelope.entity, target)?;
                outcome = out;
                loot = jobs;
            }
            if !loot.is_empty() {
                let tick_now = zone.lock().await.tick();
                jobs::dispatch_best_effort(ctx, tick_now, loot);
            }
            Ok(outcome)
        }
        Action::CastTechnique { technique, target } => {
            let loot;
            let outcome;
            {
                let mut state = zone.lock().await;
                preflight(&state, &envelope)?;
                dedup(&mut state, &envelope)?;
                let (out, jobs) =
                    handle_cast(&mut state, ctx, envelope.entity, &technique, target)?;
                outcome = out;
                loot = jobs;
            }
            if !loot.is_empty() {
                let tick_now = zone.lock().await.tick();
                jobs::dispatch_best_effort(ctx, tick_now, loot);
            }
            Ok(outcome)
        }
        Action::Unequip { slot } => {
            let mut state = zone.lock().await;
            preflight(&state, &envelope)?;
            dedup(&mut state, &envelope)?;
            let player = require_player_mut(&mut state, envelope.entity)?;
            let _removed = mistvale_entities::equipment::unequip_slot(player, slot)?;
            Ok(ActionOutcome::Unequipped { slot })
        }
        Action::AcceptQuest { npc, quest: quest_id } => {
            let mut state = zone.lock().await;
            preflight(&state, &envelope)?;
            dedup(&mut state, &envelope)?;
            quest::handle_accept(&mut state, ctx, envelope.entity, npc, &quest_id)
        }
        Action::TalkQuest { npc } => {
            let mut state = zone.lock().await;
            preflight(&state, &envelope)?;
            dedup(&mut state, &envelope)?;
            quest::handle_talk(&mut state, ctx, envelope.entity, npc)
        }
        Action::LearnTechnique { trainer, technique } => {
            let mut state = zone.lock().await;
            preflight(&state, &envelope)?;
            dedup(&mut state, &envelope)?;
            handle_learn_technique(&mut state, ctx, envelope.entity, trainer, &technique)
        }
        Action::LearnProfession {
            trainer,
            profession,
        } => {
            let mut state = zone.lock().await;
            preflight(&state, &envelope)?;
            dedup(&mut state, &envelope)?;
            handle_learn_profession(&mut state, ctx, envelope.entity, trainer, profession)
        }

        // Ledger-coupled handlers manage their own locking windows.
        Action::GatherOre { node } | Action::GatherFlower { node } => {
            gather::handle_gather(zone, ctx, &envelope, node).await
        }
        Action::Craft { station, recipe } => {
            craft::handle_craft(zone, ctx, &envelope, station, &recipe).await
        }
        Action::Upgrade { forge, recipe } => {
            craft::handle_upgrade(zone, ctx, &envelope, forge, &recipe).await
        }
        Action::ApplyEnchant {
            altar,
            catalyst,
            slot,
        } => craft::handle_enchant(zone, ctx, &envelope, altar, &catalyst, slot).await,
        Action::Equip { token } => trade::handle_equip(zone, ctx, &envelope, &token).await,
        Action::Buy {
            merchant,
            token,
            quantity,
        } => trade::handle_buy(zone, ctx, &envelope, merchant, &token, quantity).await,
        Action::Sell {
            merchant,
            token,
            quantity,
        } => trade::handle_sell(zone, ctx, &envelope, merchant, &token, quantity).await,
        Action::TurnInQuest { npc, quest: quest_id } => {
            quest::handle_turn_in(zone, ctx, &envelope, npc, &quest_id).await
        }
    }
}

/// The common precondition pipeline: routing sanity, entity existence,
/// wallet authorization, actor liveness.
pub(crate) fn preflight(state: &ZoneState, envelope: &ActionEnvelope) -> Result<(), ActionError> {
    if state.id != envelope.zone {
        return Err(ActionError::validation(format!(
            "action routed to zone {} but targets zone {}",
            state.id, envelope.zone
        )));
    }
    let entity = require_entity(state, envelope.entity)?;
    require_wallet(entity, envelope.wallet.as_ref())?;
    require_alive(entity)?;
    Ok(())
}

/// Per-tick duplicate suppression by action id.
pub(crate) fn dedup(state: &mut ZoneState, envelope: &ActionEnvelope) -> Result<(), ActionError> {
    if !state.note_action(envelope.action_id) {
        return Err(ActionError::conflict(format!(
            "duplicate action {} within tick {}",
            envelope.action_id,
            state.tick()
        )));
    }
    Ok(())
}

/// Entity lookup with the validation-error contract.
pub(crate) fn require_entity(
    state: &ZoneState,
    id: EntityId,
) -> Result<&Entity, ActionError> {
    state
        .entity(id)
        .ok_or_else(|| ActionError::validation(format!("unknown entity {id} in zone {}", state.id)))
}

/// Mutable player narrowing with structured errors.
pub(crate) fn require_player_mut(
    state: &mut ZoneState,
    id: EntityId,
) -> Result<&mut mistvale_types::PlayerState, ActionError> {
    let zone = state.id.clone();
    state
        .entity_mut(id)
        .ok_or_else(|| ActionError::validation(format!("unknown entity {id} in zone {zone}")))?
        .as_player_mut()
        .ok_or_else(|| ActionError::validation(format!("entity {id} is not a player")))
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

fn handle_move(
    state: &mut ZoneState,
    entity_id: EntityId,
    dest: Position,
) -> Result<ActionOutcome, ActionError> {
    if !state.bounds.contains(dest) {
        return Err(ActionError::validation(format!(
            "destination {dest} is outside zone {}",
            state.id
        )));
    }
    if !state.terrain.is_walkable(dest) {
        return Err(PreconditionFailure::NotWalkable.into());
    }
    let Some(entity) = state.entity_mut(entity_id) else {
        return Err(ActionError::internal("entity vanished during move"));
    };
    entity.pos = dest;
    Ok(ActionOutcome::Moved { pos: dest })
}

// ---------------------------------------------------------------------------
// Attack engagement
// ---------------------------------------------------------------------------

fn handle_attack(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    attacker_id: EntityId,
    target_id: EntityId,
) -> Result<(ActionOutcome, Vec<jobs::LedgerJob>), ActionError> {
    let tick = state.tick();
    let attack_range = ctx.config.proximity.attack;

    let (attacker_pos, ready_at) = {
        let attacker = require_entity(state, attacker_id)?;
        let ready = attacker.as_player().map_or(0, |p| p.attack_ready_at);
        (attacker.pos, ready)
    };
    {
        let target = require_entity(state, target_id)?;
        if !target.is_combatant() {
            return Err(ActionError::validation(format!(
                "entity {target_id} cannot be attacked"
            )));
        }
        if !target.is_alive() {
            return Err(PreconditionFailure::TargetDead.into());
        }
        require_within_range(attacker_pos, target.pos, attack_range)?;
    }

    // Engage: auto-attacks continue each tick from here on.
    {
        let player = require_player_mut(state, attacker_id)?;
        player.engaged_target = Some(target_id);
    }

    // Swing immediately when the cooldown allows it.
    if ready_at <= tick {
        let cooldown = ctx.config.world.attack_cooldown_ticks;
        let swing = PendingSwing {
            attacker: attacker_id,
            target: target_id,
        };
        if let Some(outcome) = tick::resolve_swing_for_action(state, ctx, &swing, tick, cooldown) {
            let killed = outcome.killed.contains(&target_id);
            return Ok((
                ActionOutcome::Engaged {
                    target: target_id,
                    damage: Some(outcome.damage),
                    killed,
                },
                outcome.loot,
            ));
        }
    }

    Ok((
        ActionOutcome::Engaged {
            target: target_id,
            damage: None,
            killed: false,
        },
        Vec::new(),
    ))
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

fn handle_learn_technique(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    player_id: EntityId,
    trainer_id: EntityId,
    technique_id: &mistvale_types::TechniqueId,
) -> Result<ActionOutcome, ActionError> {
    let def = ctx
        .content
        .techniques
        .get(technique_id)
        .ok_or_else(|| ActionError::validation(format!("unknown technique {technique_id}")))?
        .clone();

    let player_pos = require_entity(state, player_id)?.pos;
    {
        let trainer = require_entity(state, trainer_id)?;
        let npc = trainer
            .as_npc()
            .ok_or_else(|| ActionError::validation(format!("entity {trainer_id} is not an npc")))?;
        if npc.role != mistvale_types::NpcRole::Trainer {
            return Err(ActionError::validation("npc is not a technique trainer"));
        }
        if !npc.teaches.contains(technique_id) {
            return Err(ActionError::validation(format!(
                "trainer does not teach {technique_id}"
            )));
        }
        require_within_range(player_pos, trainer.pos, ctx.config.proximity.npc)?;
    }

    let player = require_player_mut(state, player_id)?;
    mistvale_entities::validation::require_level(player.level, def.min_level)?;
    if !player.learned_techniques.insert(technique_id.clone()) {
        return Err(ActionError::conflict(format!(
            "technique {technique_id} already learned"
        )));
    }
    Ok(ActionOutcome::TechniqueLearned {
        technique: technique_id.clone(),
    })
}

fn handle_learn_profession(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    player_id: EntityId,
    trainer_id: EntityId,
    profession: mistvale_types::Profession,
) -> Result<ActionOutcome, ActionError> {
    let player_pos = require_entity(state, player_id)?.pos;
    {
        let trainer = require_entity(state, trainer_id)?;
        let npc = trainer
            .as_npc()
            .ok_or_else(|| ActionError::validation(format!("entity {trainer_id} is not an npc")))?;
        if npc.role != mistvale_types::NpcRole::ProfessionTrainer {
            return Err(ActionError::validation("npc is not a profession trainer"));
        }
        if !npc.trains.contains(&profession) {
            return Err(ActionError::validation(format!(
                "trainer does not train {profession}"
            )));
        }
        require_within_range(player_pos, trainer.pos, ctx.config.proximity.npc)?;
    }

    let player = require_player_mut(state, player_id)?;
    if !player.professions.insert(profession) {
        return Err(ActionError::conflict(format!(
            "profession {profession} already learned"
        )));
    }
    Ok(ActionOutcome::ProfessionLearned { profession })
}

// ---------------------------------------------------------------------------
// Technique cast
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_lines)]
fn handle_cast(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    caster_id: EntityId,
    technique_id: &mistvale_types::TechniqueId,
    target_id: Option<EntityId>,
) -> Result<(ActionOutcome, Vec<jobs::LedgerJob>), ActionError> {
    let tick = state.tick();
    let def = ctx
        .content
        .techniques
        .get(technique_id)
        .ok_or_else(|| ActionError::validation(format!("unknown technique {technique_id}")))?
        .clone();

    // Caster-side gates.
    let caster_pos = {
        let entity = require_entity(state, caster_id)?;
        let pos = entity.pos;
        let player = entity
            .as_player()
            .ok_or_else(|| ActionError::validation("only players cast techniques"))?;
        if !player.learned_techniques.contains(technique_id) {
            return Err(PreconditionFailure::TechniqueNotLearned(technique_id.clone()).into());
        }
        mistvale_entities::validation::require_level(player.level, def.min_level)?;
        let ready_at = player.cooldowns.get(technique_id).copied().unwrap_or(0);
        mistvale_entities::validation::require_ready(tick, ready_at)?;
        mistvale_entities::validation::require_essence(player.essence, def.essence_cost)?;
        pos
    };

    // Target-kind gates.
    let affected: Vec<EntityId> = match def.target {
        TargetKind::Caster => vec![caster_id],
        TargetKind::Single => {
            let target_id = target_id.ok_or_else(|| {
                ActionError::validation(format!("technique {technique_id} requires a target"))
            })?;
            let target = require_entity(state, target_id)?;
            if !target.is_combatant() {
                return Err(ActionError::validation(format!(
                    "entity {target_id} cannot be targeted"
                )));
            }
            if !target.is_alive() {
                return Err(PreconditionFailure::TargetDead.into());
            }
            require_within_range(caster_pos, target.pos, ctx.config.proximity.attack)?;
            vec![target_id]
        }
        TargetKind::Aoe => {
            let radius = f64::from(def.radius);
            let hits = state.spatial.query_radius(caster_pos, radius);
            match def.effect {
                // Damaging AoE lands on live mobs.
                TechniqueEffect::Damage { .. } | TechniqueEffect::DamageOverTime { .. } => hits
                    .into_iter()
                    .filter(|id| {
                        state
                            .entity(*id)
                            .and_then(Entity::as_mob)
                            .is_some_and(|m| m.alive)
                    })
                    .collect(),
                // Supportive AoE lands on live players, caster included.
                _ => hits
                    .into_iter()
                    .filter(|id| {
                        state
                            .entity(*id)
                            .and_then(Entity::as_player)
                            .is_some_and(|p| p.alive)
                    })
                    .collect(),
            }
        }
    };

    // Pay the cost and stamp the cooldown.
    {
        let player = require_player_mut(state, caster_id)?;
        player.essence = player.essence.saturating_sub(def.essence_cost);
        player
            .cooldowns
            .insert(technique_id.clone(), tick.saturating_add(def.cooldown_ticks));
    }

    // Apply the effect to each affected entity.
    let mut loot = Vec::new();
    let mut landed = Vec::new();
    for id in affected {
        match apply_technique_to(state, ctx, caster_id, id, &def, tick) {
            Ok(jobs) => {
                landed.push(id);
                loot.extend(jobs);
            }
            Err(err) => {
                // Per-target failures are logged and skipped; the cast
                // itself already paid its cost.
                tracing::debug!(%err, target = %id, technique = %technique_id, "technique application skipped");
            }
        }
    }

    state.push_event(ZoneEvent::TechniqueResolved {
        caster: caster_id,
        technique: technique_id.clone(),
        affected: landed.clone(),
    });

    Ok((
        ActionOutcome::TechniqueCast {
            technique: technique_id.clone(),
            affected: landed,
        },
        loot,
    ))
}

/// Apply one technique to one entity, returning any loot jobs from a
/// resulting death.
fn apply_technique_to(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    caster_id: EntityId,
    target_id: EntityId,
    def: &TechniqueDef,
    tick: u64,
) -> Result<Vec<jobs::LedgerJob>, ActionError> {
    match &def.effect {
        TechniqueEffect::Damage { added } => {
            let damage = {
                let caster = require_entity(state, caster_id)?;
                let target = require_entity(state, target_id)?;
                let (attacker_stats, weapon_coef, out_pct) = tick::attack_profile(caster, ctx);
                let (defender_stats, in_pct) = tick::defense_profile(target);
                mistvale_entities::resolve_damage(&mistvale_entities::DamageInput {
                    attacker: &attacker_stats,
                    defender: &defender_stats,
                    weapon_coef_pct: weapon_coef,
                    technique_add: *added,
                    attacker_out_pct: out_pct,
                    defender_in_pct: in_pct,
                })
            };

            let died = {
                let target = state
                    .entity_mut(target_id)
                    .ok_or_else(|| ActionError::internal("technique target vanished"))?;
                match &mut target.role {
                    Role::Player(p) => {
                        let (hp, died) = mistvale_entities::apply_damage(p.hp, damage);
                        p.hp = hp;
                        died
                    }
                    Role::Mob(m) => {
                        let (hp, died) = mistvale_entities::apply_damage(m.hp, damage);
                        m.hp = hp;
                        died
                    }
                    _ => return Err(ActionError::validation("target cannot take damage")),
                }
            };

            state.push_event(ZoneEvent::AttackLanded {
                attacker: caster_id,
                target: target_id,
                damage,
            });

            if died {
                let is_player = state
                    .entity(target_id)
                    .is_some_and(|e| e.as_player().is_some());
                if is_player {
                    crate::death::process_player_death(state, ctx, target_id, Some(caster_id));
                    return Ok(Vec::new());
                }
                return Ok(crate::death::process_mob_death(
                    state,
                    ctx,
                    target_id,
                    Some(caster_id),
                ));
            }
            Ok(Vec::new())
        }
        TechniqueEffect::Heal { amount } => {
            let target = state
                .entity_mut(target_id)
                .ok_or_else(|| ActionError::internal("technique target vanished"))?;
            match &mut target.role {
                Role::Player(p) => p.hp = apply_heal(p.hp, p.max_hp, *amount),
                Role::Mob(m) => m.hp = apply_heal(m.hp, m.max_hp, *amount),
                _ => return Err(ActionError::validation("target cannot be healed")),
            }
            Ok(Vec::new())
        }
        TechniqueEffect::Modifier {
            outgoing_damage_pct,
            incoming_damage_pct,
            duration_ticks,
        } => {
            push_effect(
                state,
                target_id,
                ActiveEffect {
                    source: def.id.clone(),
                    kind: if *outgoing_damage_pct >= 0 && *incoming_damage_pct <= 0 {
                        EffectKind::Buff
                    } else {
                        EffectKind::Debuff
                    },
                    expires_at_tick: tick.saturating_add(*duration_ticks),
                    outgoing_damage_pct: *outgoing_damage_pct,
                    incoming_damage_pct: *incoming_damage_pct,
                    hp_per_tick: 0,
                },
            )?;
            Ok(Vec::new())
        }
        TechniqueEffect::DamageOverTime {
            per_tick,
            duration_ticks,
        } => {
            push_effect(
                state,
                target_id,
                ActiveEffect {
                    source: def.id.clone(),
                    kind: EffectKind::DamageOverTime,
                    expires_at_tick: tick.saturating_add(*duration_ticks),
                    outgoing_damage_pct: 0,
                    incoming_damage_pct: 0,
                    hp_per_tick: -i64::from(*per_tick),
                },
            )?;
            Ok(Vec::new())
        }
        TechniqueEffect::RegenOverTime {
            per_tick,
            duration_ticks,
        } => {
            push_effect(
                state,
                target_id,
                ActiveEffect {
                    source: def.id.clone(),
                    kind: EffectKind::RegenOverTime,
                    expires_at_tick: tick.saturating_add(*duration_ticks),
                    outgoing_damage_pct: 0,
                    incoming_damage_pct: 0,
                    hp_per_tick: i64::from(*per_tick),
                },
            )?;
            Ok(Vec::new())
        }
    }
}

fn push_effect(
    state: &mut ZoneState,
    target_id: EntityId,
    effect: ActiveEffect,
) -> Result<(), ActionError> {
    let target = state
        .entity_mut(target_id)
        .ok_or_else(|| ActionError::internal("effect target vanished"))?;
    match &mut target.role {
        Role::Player(p) => p.active_effects.push(effect),
        Role::Mob(m) => m.active_effects.push(effect),
        _ => return Err(ActionError::validation("target cannot carry effects")),
    }
    Ok(())
}
