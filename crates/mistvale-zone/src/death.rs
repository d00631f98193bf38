//! Death resolution for mobs and players.
//!
//! A mob death awards XP (with the party split), advances the killer's
//! kill quests, rolls loot into best-effort mint jobs, removes the mob,
//! and schedules its respawn. A player death clears effects, flags the
//! entity dead in place, and schedules a revival at the zone spawn point
//! — inventory is untouched (it lives on the ledger).

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use mistvale_entities::{grant_xp, party_xp_shares};
use mistvale_entities::quests::record_kill;
use mistvale_types::{Entity, EntityId, ZoneEvent};

use mistvale_content::loot::{roll_auto_drops, roll_currency};

use crate::jobs::LedgerJob;
use crate::runtime::ZoneContext;
use crate::state::{MobRespawn, PlayerRespawn, ZoneState};

/// Resolve a mob death. Returns the best-effort loot jobs for the
/// caller to dispatch once the zone lock is released.
pub fn process_mob_death(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    victim: EntityId,
    killer: Option<EntityId>,
) -> Vec<LedgerJob> {
    let tick = state.tick();

    let Some(mut entity) = state.remove_entity(victim) else {
        return Vec::new();
    };
    let mob_name = entity.name.clone();
    let Some(mob) = entity.as_mob_mut() else {
        // Not a mob after all; put it back untouched.
        state.insert_entity(entity);
        return Vec::new();
    };

    mob.hp = 0;
    mob.alive = false;
    let base_xp = mob.xp_reward;
    let template = mob.template.clone();
    let respawn_at = tick.saturating_add(mob.respawn_ticks);

    // Reset the record for re-insertion at its original spawn.
    let spawn_pos = mob.spawn_pos;
    mob.hp = mob.max_hp;
    mob.alive = true;
    mob.aggro_target = None;
    mob.attack_ready_at = 0;
    mob.active_effects.clear();
    entity.pos = spawn_pos;
    entity.id = EntityId::new();

    state.push_event(ZoneEvent::Death { victim, killer });
    state.mob_respawns.push(MobRespawn {
        at_tick: respawn_at,
        entity,
    });

    let Some(killer_id) = killer else {
        return Vec::new();
    };

    award_kill(state, ctx, killer_id, &mob_name, base_xp);
    roll_loot(state, ctx, killer_id, &template)
}

/// XP (party split) and quest progress for a kill.
fn award_kill(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    killer_id: EntityId,
    mob_name: &str,
    base_xp: u64,
) {
    // Kill count and quest progress belong to the killer alone.
    if let Some(killer) = state.entity_mut(killer_id).and_then(|e| e.as_player_mut()) {
        killer.kills = killer.kills.saturating_add(1);
        let advanced = record_kill(killer, mob_name, &ctx.content.quests);
        for (quest, progress) in advanced {
            state.push_event(ZoneEvent::QuestProgress {
                entity: killer_id,
                quest,
                progress,
            });
        }
    } else {
        return;
    }

    // XP splits across the party members present in this zone.
    let members = ctx
        .parties
        .party_members(killer_id)
        .unwrap_or_else(|| vec![killer_id]);
    let present: Vec<(EntityId, bool)> = members
        .into_iter()
        .filter_map(|id| {
            state
                .entity(id)
                .and_then(Entity::as_player)
                .map(|p| (id, p.alive))
        })
        .collect();

    for share in party_xp_shares(base_xp, &present) {
        let Some(player) = state
            .entity_mut(share.member)
            .and_then(|e| e.as_player_mut())
        else {
            continue;
        };
        let grant = grant_xp(player, share.amount);
        if grant.levels_gained > 0 {
            state.push_event(ZoneEvent::LevelUp {
                entity: share.member,
                level: grant.new_level,
            });
        }
    }
}

/// Roll the loot table into mint jobs for the killer's wallet.
fn roll_loot(
    state: &ZoneState,
    ctx: &ZoneContext,
    killer_id: EntityId,
    template: &mistvale_types::MobTemplateId,
) -> Vec<LedgerJob> {
    let Some(wallet) = state
        .entity(killer_id)
        .and_then(|e| e.wallet())
        .cloned()
    else {
        return Vec::new();
    };
    let Some(table) = ctx.content.loot.get(template) else {
        return Vec::new();
    };

    let mut rng = loot_rng();
    let mut jobs = Vec::new();
    for (item, qty) in roll_auto_drops(table, &mut rng) {
        jobs.push(LedgerJob::MintItem {
            wallet: wallet.clone(),
            token: item,
            qty,
            reason: "loot_drop",
        });
    }
    let currency = roll_currency(table, &mut rng);
    if currency > 0 {
        jobs.push(LedgerJob::MintCurrency {
            wallet,
            amount: currency,
            reason: "loot_currency",
        });
    }
    debug!(template = %template, jobs = jobs.len(), "loot rolled");
    jobs
}

fn loot_rng() -> StdRng {
    StdRng::from_rng(&mut rand::rng())
}

/// Resolve a player death in place: effects cleared, flagged dead, a
/// revival scheduled at the zone spawn point after the configured delay.
pub fn process_player_death(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    victim: EntityId,
    killer: Option<EntityId>,
) {
    let tick = state.tick();
    let Some(player) = state.entity_mut(victim).and_then(|e| e.as_player_mut()) else {
        return;
    };
    player.hp = 0;
    player.alive = false;
    player.active_effects.clear();
    player.engaged_target = None;

    state.push_event(ZoneEvent::Death { victim, killer });
    state.player_respawns.push(PlayerRespawn {
        at_tick: tick.saturating_add(ctx.config.world.player_respawn_delay_ticks),
        entity: victim,
    });
}

/// Revive players whose respawn tick has arrived: full vitals, zone
/// spawn point, no effects.
pub fn run_player_respawns(state: &mut ZoneState) -> usize {
    let tick = state.tick();
    let spawn_point = state.spawn_point;
    let due: Vec<EntityId> = state
        .player_respawns
        .iter()
        .filter(|r| r.at_tick <= tick)
        .map(|r| r.entity)
        .collect();
    state.player_respawns.retain(|r| r.at_tick > tick);

    let mut revived = 0_usize;
    for id in due {
        let Some(entity) = state.entity_mut(id) else {
            continue;
        };
        entity.pos = spawn_point;
        if let Some(player) = entity.as_player_mut() {
            player.hp = player.max_hp;
            player.essence = player.max_essence;
            player.alive = true;
            revived = revived.saturating_add(1);
        }
        state.push_event(ZoneEvent::Respawned { entity: id });
    }
    revived
}

/// Re-insert mobs whose respawn tick has arrived.
pub fn run_mob_respawns(state: &mut ZoneState) -> usize {
    let tick = state.tick();
    let due: Vec<MobRespawn> = {
        let mut kept = Vec::new();
        let mut due = Vec::new();
        for respawn in state.mob_respawns.drain(..) {
            if respawn.at_tick <= tick {
                due.push(respawn);
            } else {
                kept.push(respawn);
            }
        }
        state.mob_respawns = kept;
        due
    };

    let mut count = 0_usize;
    for respawn in due {
        let id = respawn.entity.id;
        state.insert_entity(respawn.entity);
        state.push_event(ZoneEvent::Respawned { entity: id });
        count = count.saturating_add(1);
    }
    count
}

/// Restore depleted resource nodes whose respawn delay has elapsed.
pub fn run_node_respawns(state: &mut ZoneState) -> usize {
    let tick = state.tick();
    let mut restored = Vec::new();
    for entity in state.entities.values_mut() {
        let id = entity.id;
        let Some(node) = entity.as_node_mut() else {
            continue;
        };
        let Some(depleted_at) = node.depleted_at_tick else {
            continue;
        };
        if tick.saturating_sub(depleted_at) >= node.respawn_ticks {
            node.charges = node.max_charges;
            node.depleted_at_tick = None;
            restored.push(id);
        }
    }
    for id in &restored {
        state.push_event(ZoneEvent::Respawned { entity: *id });
    }
    restored.len()
}
