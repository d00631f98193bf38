//! Entity construction from content definitions.
//!
//! The world manager calls [`build_zone`] once per zone definition at
//! boot; the dungeon manager uses the mob constructor directly when
//! populating instances. Every entity gets a fresh world-unique id at
//! spawn.

use mistvale_types::{
    Entity, GateState, MobState, NodeState, NpcState, PlayerState, PortalState, Position, Role,
    StationState, WalletAddress,
};

use mistvale_content::ContentCatalog;
use mistvale_content::zones::{
    GateSpawn, MobTemplate, NodeSpawn, NpcSpawn, PortalSpawn, StationSpawn, ZoneDef,
};
use mistvale_types::{Class, Race};
use mistvale_world::TerrainGrid;

use crate::config::RealmConfig;
use crate::error::ZoneError;
use crate::state::ZoneState;

/// Build a zone from its definition: generate terrain, replay any
/// persisted chunk diffs, then spawn every placed entity.
///
/// # Errors
///
/// Returns [`ZoneError::Content`] if a mob spawn names an unknown
/// template (the registry validates this at build, so only hand-rolled
/// registries can trip it).
pub fn build_zone(
    def: &ZoneDef,
    content: &ContentCatalog,
    config: &RealmConfig,
    chunk_diffs: &[mistvale_world::ChunkState],
) -> Result<ZoneState, ZoneError> {
    let terrain = TerrainGrid::generate_with_diffs(def.bounds, def.seed, chunk_diffs);
    let mut zone = ZoneState::new(
        def.id.clone(),
        def.spawn_point,
        def.min_level,
        terrain,
        config.world.event_ring_capacity,
    );

    for npc in &def.npcs {
        zone.insert_entity(npc_entity(npc));
    }
    for spawn in &def.mobs {
        let template = content.zones.require_template(&spawn.template)?;
        zone.insert_entity(mob_entity(
            template,
            spawn.pos,
            content,
            config.world.mob_respawn_ticks_default,
        ));
    }
    for node in &def.nodes {
        zone.insert_entity(node_entity(node));
    }
    for station in &def.stations {
        zone.insert_entity(station_entity(station));
    }
    for gate in &def.gates {
        zone.insert_entity(gate_entity(gate));
    }
    for portal in &def.portals {
        zone.insert_entity(portal_entity(portal));
    }

    zone.rebuild_spatial();
    Ok(zone)
}

/// Construct a mob entity from its template. XP and respawn delay come
/// from the loot catalog, falling back to `default_respawn_ticks`.
pub fn mob_entity(
    template: &MobTemplate,
    pos: Position,
    content: &ContentCatalog,
    default_respawn_ticks: u64,
) -> Entity {
    let loot = content.loot.get(&template.id);
    Entity::new(
        template.name.clone(),
        pos,
        Role::Mob(MobState {
            template: template.id.clone(),
            level: template.level,
            stats: template.stats,
            hp: template.max_hp,
            max_hp: template.max_hp,
            alive: true,
            is_boss: template.is_boss,
            xp_reward: loot.map_or(0, |t| t.xp_reward),
            detection_radius: f64::from(template.detection_radius),
            strike_radius: f64::from(template.strike_radius),
            aggro_target: None,
            attack_ready_at: 0,
            respawn_ticks: loot
                .and_then(|t| t.respawn_ticks)
                .unwrap_or(default_respawn_ticks),
            spawn_pos: pos,
            active_effects: Vec::new(),
        }),
    )
}

/// Construct an NPC entity from its placement.
pub fn npc_entity(spawn: &NpcSpawn) -> Entity {
    Entity::new(
        spawn.name.clone(),
        spawn.pos,
        Role::Npc(NpcState {
            role: spawn.role,
            stock: spawn.stock.clone(),
            teaches: spawn.teaches.clone(),
            trains: spawn.trains.clone(),
        }),
    )
}

/// Construct a resource-node entity at full charges.
pub fn node_entity(spawn: &NodeSpawn) -> Entity {
    Entity::new(
        spawn.name.clone(),
        spawn.pos,
        Role::ResourceNode(NodeState {
            kind: spawn.kind,
            yield_item: spawn.yield_item.clone(),
            tier: spawn.tier,
            charges: spawn.max_charges,
            max_charges: spawn.max_charges,
            depleted_at_tick: None,
            respawn_ticks: spawn.respawn_ticks,
        }),
    )
}

/// Construct a station entity.
pub fn station_entity(spawn: &StationSpawn) -> Entity {
    Entity::new(
        spawn.name.clone(),
        spawn.pos,
        Role::Station(StationState { kind: spawn.kind }),
    )
}

/// Construct a closed dungeon-gate entity.
pub fn gate_entity(spawn: &GateSpawn) -> Entity {
    Entity::new(
        spawn.name.clone(),
        spawn.pos,
        Role::DungeonGate(GateState {
            rank: spawn.rank,
            is_danger_gate: spawn.is_danger_gate,
            opened: false,
        }),
    )
}

/// Construct a portal marker entity.
pub fn portal_entity(spawn: &PortalSpawn) -> Entity {
    Entity::new(
        spawn.name.clone(),
        spawn.pos,
        Role::Portal(PortalState {
            destination_zone: spawn.destination_zone.clone(),
            destination_portal: spawn.destination_portal.clone(),
        }),
    )
}

/// Construct a fresh level-1 player entity for a wallet.
pub fn new_player_entity(
    name: impl Into<String>,
    wallet: WalletAddress,
    race: Race,
    class: Class,
    pos: Position,
) -> Entity {
    let (stats, max_hp, max_essence) = ContentCatalog::new_character_block(race, class);
    Entity::new(
        name,
        pos,
        Role::Player(PlayerState {
            wallet,
            level: 1,
            xp: 0,
            race,
            class,
            kills: 0,
            hp: max_hp,
            max_hp,
            essence: max_essence,
            max_essence,
            alive: true,
            base_stats: stats,
            professions: std::collections::BTreeSet::new(),
            learned_techniques: std::collections::BTreeSet::new(),
            active_quests: Vec::new(),
            completed_quests: Vec::new(),
            active_effects: Vec::new(),
            equipment: std::collections::BTreeMap::new(),
            cooldowns: std::collections::BTreeMap::new(),
            attack_ready_at: 0,
            engaged_target: None,
        }),
    )
}
