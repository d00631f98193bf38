//! Dungeon instancing: gate opening, instance lifecycle, teardown.
//!
//! Opening a gate burns the rank's key, allocates a fresh
//! `dungeon-<uuid>` zone with rank-scaled mobs, and moves the whole
//! party in atomically (both zone locks held; a mid-batch failure moves
//! everyone back and tears the instance down). A dedicated ticker sweeps
//! live instances: cleared when no mobs remain, timed out when the clock
//! passes `expires_at`, abandoned when no players remain — every exit
//! path teleports survivors back near the gate and deletes the zone.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use mistvale_content::zones::RankScaling;
use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::with_deadline;
use mistvale_types::{
    ActionError, EntityId, GateRank, InstanceId, PartyId, Position, PreconditionFailure,
    WalletAddress, ZoneEvent, ZoneId,
};
use mistvale_world::TerrainGrid;
use mistvale_zone::spawn;
use mistvale_zone::state::ZoneState;

use crate::party::PartyManager;
use crate::world::{WorldManager, with_zone_pair};

/// Dungeon zone edge length in tiles.
const DUNGEON_EDGE: u32 = 96;

/// A live dungeon instance record.
#[derive(Debug, Clone)]
pub struct DungeonInstance {
    /// Instance id.
    pub instance_id: InstanceId,
    /// Gate rank.
    pub rank: GateRank,
    /// Whether the gate was a danger gate.
    pub is_danger_gate: bool,
    /// The zone the gate stands in.
    pub source_zone: ZoneId,
    /// The gate's position (return teleports land near here).
    pub source_pos: Position,
    /// The gate entity, re-closed on teardown.
    pub source_gate: EntityId,
    /// The party that opened the gate.
    pub party_id: PartyId,
    /// Members moved in at open time.
    pub member_ids: Vec<EntityId>,
    /// The instance's zone id (`dungeon-<uuid>`).
    pub dungeon_zone: ZoneId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Hard deadline; the sweep tears the instance down at or past this.
    pub expires_at: DateTime<Utc>,
    /// Set when the instance was cleared rather than abandoned.
    pub cleared: bool,
    /// Mobs spawned at creation.
    pub total_mobs: u32,
}

/// Why an instance was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// Every mob died.
    Cleared,
    /// The time limit passed.
    TimedOut,
    /// No players remained inside.
    Abandoned,
}

/// Owns the dungeon instance map and its lifecycle.
pub struct DungeonManager {
    parties: Arc<PartyManager>,
    instances: Mutex<BTreeMap<InstanceId, DungeonInstance>>,
}

impl DungeonManager {
    /// Create a manager.
    pub fn new(parties: Arc<PartyManager>) -> Arc<Self> {
        Arc::new(Self {
            parties,
            instances: Mutex::new(BTreeMap::new()),
        })
    }

    /// A snapshot of one instance record.
    pub async fn instance(&self, id: InstanceId) -> Option<DungeonInstance> {
        self.instances.lock().await.get(&id).cloned()
    }

    /// Snapshot every live instance.
    pub async fn instances(&self) -> Vec<DungeonInstance> {
        self.instances.lock().await.values().cloned().collect()
    }

    /// Open a dungeon gate: validate the party, burn the key, build the
    /// instance zone, and teleport every member in.
    #[allow(clippy::too_many_lines)]
    pub async fn open_gate(
        &self,
        world: &Arc<WorldManager>,
        wallet: &WalletAddress,
        zone_id: &ZoneId,
        entity_id: EntityId,
        gate_id: EntityId,
    ) -> Result<InstanceId, ActionError> {
        let ctx = world.context().clone();
        let source = world.require_zone(zone_id).await?;

        // Phase 1: validate everything under the source lock.
        let (gate_pos, rank, is_danger, party, members) = {
            let state = source.lock().await;

            let requester = state
                .entity(entity_id)
                .ok_or_else(|| ActionError::validation(format!("unknown entity {entity_id}")))?;
            mistvale_entities::validation::require_wallet(requester, Some(wallet))?;
            mistvale_entities::validation::require_alive(requester)?;

            let gate_entity = state
                .entity(gate_id)
                .ok_or_else(|| ActionError::validation(format!("unknown gate {gate_id}")))?;
            let gate = gate_entity
                .as_gate()
                .ok_or_else(|| ActionError::validation(format!("entity {gate_id} is not a gate")))?;
            if gate.opened {
                return Err(ActionError::conflict("gate already opened"));
            }
            let gate_pos = gate_entity.pos;
            let rank = gate.rank;
            let is_danger = gate.is_danger_gate;

            let Some(party) = self.parties.party_of(entity_id) else {
                return Err(PreconditionFailure::NotInParty.into());
            };

            let row = ctx
                .content
                .zones
                .rank(rank)
                .ok_or_else(|| ActionError::internal(format!("no scaling row for rank {rank}")))?;

            // Every member: present, close enough, leveled enough.
            let mut members = Vec::new();
            for member in &party.members {
                let entity = state.entity(*member).ok_or_else(|| {
                    ActionError::validation(format!("party member {member} is not in zone {zone_id}"))
                })?;
                let player = entity.as_player().ok_or_else(|| {
                    ActionError::internal(format!("party member {member} is not a player"))
                })?;
                mistvale_entities::validation::require_within_range(
                    entity.pos,
                    gate_pos,
                    ctx.config.proximity.gate,
                )?;
                if player.level < row.level_requirement {
                    return Err(PreconditionFailure::MemberLevelTooLow {
                        member: *member,
                        required: row.level_requirement,
                    }
                    .into());
                }
                members.push((*member, entity.pos));
            }
            (gate_pos, rank, is_danger, party, members)
        };

        let row = ctx
            .content
            .zones
            .rank(rank)
            .ok_or_else(|| ActionError::internal(format!("no scaling row for rank {rank}")))?
            .clone();

        // Phase 2: burn the key. A failure here aborts cleanly — nothing
        // local has changed yet.
        let tick_now = source.lock().await.tick();
        let held = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.item_balance(wallet.clone(), row.key_item.clone()),
        )
        .await
        .map_err(|e| map_ledger(&e))?;
        if held == 0 {
            return Err(PreconditionFailure::MissingGateKey {
                item: row.key_item.clone(),
            }
            .into());
        }
        let burn = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.burn_item(wallet.clone(), row.key_item.clone(), 1),
        )
        .await;
        ctx.audit.lock().await.record(
            tick_now,
            AuditOp::Burn,
            wallet,
            &row.key_item,
            1,
            "gate_key",
            &burn,
        );
        if let Err(error) = burn {
            warn!(%wallet, gate = %gate_id, %error, "gate key burn failed; gate stays closed");
            return Err(map_ledger(&error));
        }

        // Phase 3: build and register the instance zone.
        let instance_id = InstanceId::new();
        let dungeon_zone_id = ZoneId::from(format!("dungeon-{}", Uuid::now_v7()));
        let (dungeon_state, total_mobs, dungeon_spawn) =
            build_instance_zone(&ctx, &dungeon_zone_id, &row, is_danger)?;
        let dungeon = world.add_zone(dungeon_state).await;

        // Phase 4: mark the gate opened (re-checking for a racing open).
        {
            let mut state = source.lock().await;
            let Some(gate) = state.entity_mut(gate_id).and_then(|e| e.as_gate_mut()) else {
                let _ = world.remove_zone(&dungeon_zone_id).await;
                return Err(ActionError::internal("gate vanished during open"));
            };
            if gate.opened {
                let _ = world.remove_zone(&dungeon_zone_id).await;
                return Err(ActionError::conflict("gate already opened"));
            }
            gate.opened = true;
        }

        // Phase 5: move every member in, atomically; roll back on any
        // mid-batch failure.
        let member_ids: Vec<EntityId> = members.iter().map(|(id, _)| *id).collect();
        let move_result = with_zone_pair(&source, &dungeon, |src, dst| {
            teleport_batch(src, dst, &members, dungeon_spawn)
        })
        .await?;

        if let Err(err) = move_result {
            error!(%err, "dungeon entry teleport failed; tearing down");
            let mut state = source.lock().await;
            if let Some(gate) = state.entity_mut(gate_id).and_then(|e| e.as_gate_mut()) {
                gate.opened = false;
            }
            drop(state);
            let _ = world.remove_zone(&dungeon_zone_id).await;
            return Err(err);
        }

        // Phase 6: record the instance.
        let time_limit_ms = ctx
            .config
            .dungeon
            .time_limit_overrides_ms
            .get(&rank.to_string())
            .copied()
            .unwrap_or(row.time_limit_ms);
        let now = Utc::now();
        let instance = DungeonInstance {
            instance_id,
            rank,
            is_danger_gate: is_danger,
            source_zone: zone_id.clone(),
            source_pos: gate_pos,
            source_gate: gate_id,
            party_id: party.id,
            member_ids,
            dungeon_zone: dungeon_zone_id.clone(),
            created_at: now,
            expires_at: now
                + ChronoDuration::milliseconds(i64::try_from(time_limit_ms).unwrap_or(i64::MAX)),
            cleared: false,
            total_mobs,
        };
        self.instances.lock().await.insert(instance_id, instance);

        info!(
            instance = %instance_id,
            zone = %dungeon_zone_id,
            rank = %rank,
            mobs = total_mobs,
            "dungeon instance opened"
        );
        Ok(instance_id)
    }

    /// A member walks out voluntarily: teleport them back and drop them
    /// from the roster. The sweep handles the empty-instance teardown.
    pub async fn leave(
        &self,
        world: &Arc<WorldManager>,
        wallet: &WalletAddress,
        entity_id: EntityId,
    ) -> Result<ZoneId, ActionError> {
        let instance = {
            let instances = self.instances.lock().await;
            instances
                .values()
                .find(|i| i.member_ids.contains(&entity_id))
                .cloned()
                .ok_or_else(|| ActionError::validation("not inside a dungeon"))?
        };

        let dungeon = world.require_zone(&instance.dungeon_zone).await?;
        let source = world.require_zone(&instance.source_zone).await?;

        with_zone_pair(&dungeon, &source, |dgn, src| {
            let entity = dgn
                .entity(entity_id)
                .ok_or_else(|| ActionError::validation("not inside the dungeon zone"))?;
            mistvale_entities::validation::require_wallet(entity, Some(wallet))?;
            move_back_one(dgn, src, entity_id, instance.source_pos);
            Ok::<_, ActionError>(())
        })
        .await??;

        let mut instances = self.instances.lock().await;
        if let Some(record) = instances.get_mut(&instance.instance_id) {
            record.member_ids.retain(|m| *m != entity_id);
        }
        Ok(instance.source_zone)
    }

    /// One monitor sweep over every live instance. Returns the torn-down
    /// instances with their reasons.
    pub async fn sweep(
        &self,
        world: &Arc<WorldManager>,
    ) -> Vec<(InstanceId, TeardownReason)> {
        let snapshot: Vec<DungeonInstance> =
            self.instances.lock().await.values().cloned().collect();
        let now = Utc::now();

        let mut torn_down = Vec::new();
        for instance in snapshot {
            let Some(dungeon) = world.zone(&instance.dungeon_zone).await else {
                // The zone is already gone; drop the orphan record.
                self.instances.lock().await.remove(&instance.instance_id);
                continue;
            };

            let (live_mobs, players) = {
                let state = dungeon.lock().await;
                (state.live_mob_count(), state.player_count())
            };

            let reason = if live_mobs == 0 {
                Some(TeardownReason::Cleared)
            } else if players == 0 {
                Some(TeardownReason::Abandoned)
            } else if now >= instance.expires_at {
                Some(TeardownReason::TimedOut)
            } else {
                None
            };

            if let Some(reason) = reason {
                self.teardown(world, &instance, reason).await;
                torn_down.push((instance.instance_id, reason));
            }
        }
        torn_down
    }

    /// Teleport survivors home, close the gate, delete the zone, drop
    /// the record.
    async fn teardown(
        &self,
        world: &Arc<WorldManager>,
        instance: &DungeonInstance,
        reason: TeardownReason,
    ) {
        let cleared = reason == TeardownReason::Cleared;

        let dungeon = world.zone(&instance.dungeon_zone).await;
        let source = world.zone(&instance.source_zone).await;

        if let (Some(dungeon), Some(source)) = (dungeon, source) {
            let source_pos = instance.source_pos;
            let gate_id = instance.source_gate;
            let result = with_zone_pair(&dungeon, &source, |dgn, src| {
                let survivors: Vec<EntityId> = dgn
                    .entities
                    .values()
                    .filter(|e| e.as_player().is_some())
                    .map(|e| e.id)
                    .collect();
                for id in survivors {
                    move_back_one(dgn, src, id, source_pos);
                }
                if let Some(gate) = src.entity_mut(gate_id).and_then(|e| e.as_gate_mut()) {
                    gate.opened = false;
                }
            })
            .await;
            if let Err(err) = result {
                error!(%err, instance = %instance.instance_id, "dungeon teardown teleport failed");
            }
        }

        let _ = world.remove_zone(&instance.dungeon_zone).await;
        self.instances.lock().await.remove(&instance.instance_id);
        info!(
            instance = %instance.instance_id,
            cleared,
            ?reason,
            "dungeon instance torn down"
        );
    }

    /// Spawn the periodic instance monitor.
    pub fn spawn_ticker(
        self: &Arc<Self>,
        world: Arc<WorldManager>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let interval_ms = world.context().config.dungeon.tick_interval_ms;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(interval_ms.max(10)));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                }
                let _ = manager.sweep(&world).await;
            }
        })
    }
}

/// Build the instance zone and populate it per the rank row.
fn build_instance_zone(
    ctx: &mistvale_zone::ZoneContext,
    zone_id: &ZoneId,
    row: &RankScaling,
    is_danger: bool,
) -> Result<(ZoneState, u32, Position), ActionError> {
    let seed = seed_from_zone_id(zone_id);
    let bounds = mistvale_types::Bounds::new(DUNGEON_EDGE, DUNGEON_EDGE);
    let terrain = TerrainGrid::generate(bounds, seed);

    let mut rng = StdRng::seed_from_u64(seed);
    let spawn_point = find_walkable(&terrain, &mut rng)
        .unwrap_or(Position::new((DUNGEON_EDGE / 2) as i32, (DUNGEON_EDGE / 2) as i32));

    let mut state = ZoneState::new(
        zone_id.clone(),
        spawn_point,
        1,
        terrain,
        ctx.config.world.event_ring_capacity,
    );

    let hp_mult = if is_danger { row.danger_hp_mult_pct } else { 100 };
    let xp_mult = if is_danger {
        u64::from(row.danger_xp_mult_pct)
    } else {
        100
    };

    let (min, max) = row.mob_count;
    let trash_count = if min >= max {
        min
    } else {
        rng.random_range(min..=max)
    };

    let mut spawned = 0_u32;
    for _ in 0..trash_count {
        if spawn_scaled_mob(
            ctx,
            &mut state,
            &mut rng,
            &row.mob_template,
            row.mob_level,
            scale_pct(row.mob_hp, hp_mult),
            xp_mult,
        ) {
            spawned = spawned.saturating_add(1);
        }
    }
    for _ in 0..row.boss_count {
        if spawn_scaled_mob(
            ctx,
            &mut state,
            &mut rng,
            &row.boss_template,
            row.mob_level,
            scale_pct(row.boss_hp, hp_mult),
            xp_mult,
        ) {
            spawned = spawned.saturating_add(1);
        }
    }

    state.rebuild_spatial();
    Ok((state, spawned, spawn_point))
}

/// Spawn one mob from a template with rank-scaled level, HP, and XP.
fn spawn_scaled_mob(
    ctx: &mistvale_zone::ZoneContext,
    state: &mut ZoneState,
    rng: &mut StdRng,
    template_id: &mistvale_types::MobTemplateId,
    level: u32,
    hp: u32,
    xp_mult_pct: u64,
) -> bool {
    let Ok(template) = ctx.content.zones.require_template(template_id) else {
        return false;
    };
    let pos = find_walkable(&state.terrain, rng).unwrap_or(state.spawn_point);
    let mut entity = spawn::mob_entity(
        template,
        pos,
        &ctx.content,
        ctx.config.world.mob_respawn_ticks_default,
    );
    if let Some(mob) = entity.as_mob_mut() {
        mob.level = level;
        mob.hp = hp.max(1);
        mob.max_hp = hp.max(1);
        mob.xp_reward = mob.xp_reward.saturating_mul(xp_mult_pct) / 100;
        // Dungeon mobs do not respawn; park the delay far out.
        mob.respawn_ticks = u64::MAX / 2;
    }
    state.insert_entity(entity);
    true
}

const fn scale_pct(base: u32, pct: u32) -> u32 {
    ((base as u64).saturating_mul(pct as u64) / 100) as u32
}

fn seed_from_zone_id(zone_id: &ZoneId) -> u64 {
    // Stable fold of the id bytes; only uniqueness matters.
    zone_id
        .as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

fn find_walkable(terrain: &TerrainGrid, rng: &mut StdRng) -> Option<Position> {
    let bounds = terrain.bounds();
    for _ in 0..64 {
        let pos = Position::new(
            rng.random_range(0..bounds.width.min(i32::MAX as u32) as i32),
            rng.random_range(0..bounds.height.min(i32::MAX as u32) as i32),
        );
        if terrain.is_walkable(pos) {
            return Some(pos);
        }
    }
    None
}

/// Move one batch of members, rolling back the already-moved on failure.
fn teleport_batch(
    src: &mut ZoneState,
    dst: &mut ZoneState,
    members: &[(EntityId, Position)],
    dungeon_spawn: Position,
) -> Result<(), ActionError> {
    let mut moved: Vec<(EntityId, Position)> = Vec::new();
    for (member, original_pos) in members {
        let Some(mut entity) = src.remove_entity(*member) else {
            // Roll back everyone already moved.
            for (id, pos) in moved.drain(..) {
                if let Some(mut back) = dst.remove_entity(id) {
                    back.pos = pos;
                    src.insert_entity(back);
                }
            }
            return Err(ActionError::internal(format!(
                "party member {member} disappeared during dungeon entry"
            )));
        };
        entity.pos = dungeon_spawn;
        if let Some(player) = entity.as_player_mut() {
            player.engaged_target = None;
        }
        src.push_event(ZoneEvent::Transitioned {
            entity: *member,
            to_zone: dst.id.clone(),
        });
        dst.insert_entity(entity);
        moved.push((*member, *original_pos));
    }
    Ok(())
}

/// Move one entity from the dungeon back near the gate, with a small
/// jitter so a whole party does not stack on one tile.
fn move_back_one(dgn: &mut ZoneState, src: &mut ZoneState, id: EntityId, source_pos: Position) {
    let Some(mut entity) = dgn.remove_entity(id) else {
        return;
    };
    let mut rng = rand::rng();
    let jittered = Position::new(
        source_pos.x.saturating_add(rng.random_range(-2..=2)),
        source_pos.y.saturating_add(rng.random_range(-2..=2)),
    );
    let landing = if src.terrain.is_walkable(jittered) {
        jittered
    } else if src.terrain.is_walkable(source_pos) {
        source_pos
    } else {
        src.spawn_point
    };
    entity.pos = landing;
    if let Some(player) = entity.as_player_mut() {
        player.engaged_target = None;
    }
    dgn.push_event(ZoneEvent::Transitioned {
        entity: id,
        to_zone: src.id.clone(),
    });
    src.insert_entity(entity);
}

fn map_ledger(error: &mistvale_ledger::LedgerError) -> ActionError {
    if error.is_transient() {
        ActionError::LedgerTransient {
            detail: error.to_string(),
        }
    } else {
        ActionError::LedgerPermanent {
            detail: error.to_string(),
        }
    }
}
