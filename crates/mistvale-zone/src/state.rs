//! Zone state: the entity store, terrain, spatial index, and event ring.
//!
//! A [`ZoneState`] is owned by exactly one zone runtime and protected by
//! the zone's mutex — nothing in here locks. An entity belongs to exactly
//! one zone at any instant; cross-zone moves are an atomic
//! remove-then-insert performed by the transition layer while holding
//! both zone locks in the global order.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use mistvale_types::{
    ActionId, Bounds, Entity, EntityId, Position, ZoneEvent, ZoneEventRecord, ZoneId,
};
use mistvale_world::{SpatialIndex, TerrainGrid};

use crate::clock::{ClockError, TickClock};

/// A dead mob waiting to be re-inserted.
#[derive(Debug, Clone)]
pub struct MobRespawn {
    /// Tick at which the mob re-enters the zone.
    pub at_tick: u64,
    /// The entity to re-insert (vitals already reset, fresh id stamped
    /// at insertion).
    pub entity: Entity,
}

/// A dead player waiting to respawn at the zone spawn point.
#[derive(Debug, Clone, Copy)]
pub struct PlayerRespawn {
    /// Tick at which the player revives.
    pub at_tick: u64,
    /// The player entity (stays in the zone while dead).
    pub entity: EntityId,
}

/// The mutable state of one zone.
#[derive(Debug)]
pub struct ZoneState {
    /// Zone id.
    pub id: ZoneId,
    clock: TickClock,
    /// Zone bounds in tiles.
    pub bounds: Bounds,
    /// Default spawn / respawn point.
    pub spawn_point: Position,
    /// Minimum player level to enter through a portal.
    pub min_level: u32,
    /// Every entity currently in the zone.
    pub entities: BTreeMap<EntityId, Entity>,
    /// The terrain grid.
    pub terrain: TerrainGrid,
    /// The spatial index, rebuilt at the end of every tick.
    pub spatial: SpatialIndex,
    /// Dead mobs scheduled for re-insertion.
    pub mob_respawns: Vec<MobRespawn>,
    /// Dead players scheduled for revival.
    pub player_respawns: Vec<PlayerRespawn>,
    events: VecDeque<ZoneEventRecord>,
    event_capacity: usize,
    seen_actions: BTreeSet<ActionId>,
}

impl ZoneState {
    /// Create an empty zone over the given terrain.
    pub fn new(
        id: ZoneId,
        spawn_point: Position,
        min_level: u32,
        terrain: TerrainGrid,
        event_capacity: usize,
    ) -> Self {
        Self {
            id,
            clock: TickClock::new(),
            bounds: terrain.bounds(),
            spawn_point,
            min_level,
            entities: BTreeMap::new(),
            terrain,
            spatial: SpatialIndex::default(),
            mob_respawns: Vec::new(),
            player_respawns: Vec::new(),
            events: VecDeque::new(),
            event_capacity: event_capacity.max(1),
            seen_actions: BTreeSet::new(),
        }
    }

    /// The current tick.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Advance the tick counter (phase 1 of the tick loop). Also clears
    /// the per-tick duplicate-action set.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] on counter overflow.
    pub fn advance_tick(&mut self) -> Result<u64, ClockError> {
        self.seen_actions.clear();
        self.clock.advance()
    }

    /// Insert an entity and record the entry event.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.push_event(ZoneEvent::EntityEntered {
            entity: entity.id,
            pos: entity.pos,
        });
        self.spatial.insert(entity.id, entity.pos);
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity and record the exit event.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            self.push_event(ZoneEvent::EntityLeft { entity: id });
        }
        removed
    }

    /// Borrow an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutably borrow an entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Append an event to the bounded ring, dropping the oldest record
    /// when full.
    pub fn push_event(&mut self, event: ZoneEvent) {
        if self.events.len() >= self.event_capacity {
            self.events.pop_front();
        }
        self.events.push_back(ZoneEventRecord {
            tick: self.tick(),
            event,
        });
    }

    /// The buffered events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &ZoneEventRecord> {
        self.events.iter()
    }

    /// Drain up to `max` buffered events for the edge layer.
    pub fn drain_events(&mut self, max: usize) -> Vec<ZoneEventRecord> {
        let take = self.events.len().min(max);
        self.events.drain(..take).collect()
    }

    /// Record an action id for duplicate suppression. Returns `false`
    /// when the id was already seen this tick.
    pub fn note_action(&mut self, id: ActionId) -> bool {
        self.seen_actions.insert(id)
    }

    /// Rebuild the spatial index from the live entity set (phase 8).
    pub fn rebuild_spatial(&mut self) {
        let positions: Vec<(EntityId, Position)> = self
            .entities
            .values()
            .map(|e| (e.id, e.pos))
            .collect();
        self.spatial.rebuild(positions);
    }

    /// Number of live mobs in the zone (dungeon clear condition).
    pub fn live_mob_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| e.as_mob().is_some_and(|m| m.alive))
            .count()
    }

    /// Number of player entities (alive or dead) in the zone.
    pub fn player_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| e.as_player().is_some())
            .count()
    }
}
