//! Zone definitions, mob templates, and the dungeon rank table.
//!
//! A [`ZoneDef`] describes everything needed to boot a zone: bounds,
//! terrain seed, level gate, spawn point, and the placement lists the
//! world manager turns into entities. [`MobTemplate`] is the combat-side
//! sibling of a loot table. [`RankScaling`] drives dungeon instance
//! population and time limits per gate rank.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::{
    Bounds, GateRank, ItemId, MobTemplateId, NodeKind, NpcRole, Position, Profession, StatBlock,
    StationKind, TechniqueId, ZoneId,
};

use crate::error::ContentError;

/// A combat template for spawning mobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobTemplate {
    /// Template key; also the loot-table key.
    pub id: MobTemplateId,
    /// Display name. Kill quests match on this.
    pub name: String,
    /// Mob level.
    pub level: u32,
    /// Combat stats.
    pub stats: StatBlock,
    /// Hit point pool.
    pub max_hp: u32,
    /// Whether the template is a boss.
    pub is_boss: bool,
    /// Aggro detection radius in tiles.
    pub detection_radius: u32,
    /// Melee strike radius in tiles.
    pub strike_radius: u32,
}

/// An NPC placement within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcSpawn {
    /// Display name. Quest giver/turn-in matching uses this.
    pub name: String,
    /// Position in zone tiles.
    pub pos: Position,
    /// What the NPC does.
    pub role: NpcRole,
    /// Items stocked for sale (merchants).
    pub stock: Vec<ItemId>,
    /// Techniques taught (trainers).
    pub teaches: Vec<TechniqueId>,
    /// Professions taught (profession trainers).
    pub trains: Vec<Profession>,
}

/// A mob placement within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobSpawn {
    /// The template to spawn.
    pub template: MobTemplateId,
    /// Position in zone tiles.
    pub pos: Position,
}

/// A resource-node placement within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpawn {
    /// Display name.
    pub name: String,
    /// Ore or flower.
    pub kind: NodeKind,
    /// The token minted per gather.
    pub yield_item: ItemId,
    /// Node tier; the tool tier must be at least this.
    pub tier: u8,
    /// Charges when full.
    pub max_charges: u32,
    /// Ticks from depletion to restoration.
    pub respawn_ticks: u64,
    /// Position in zone tiles.
    pub pos: Position,
}

/// A crafting-station placement within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSpawn {
    /// Display name.
    pub name: String,
    /// Station kind.
    pub kind: StationKind,
    /// Position in zone tiles.
    pub pos: Position,
}

/// A dungeon-gate placement within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpawn {
    /// Display name.
    pub name: String,
    /// Gate rank.
    pub rank: GateRank,
    /// Danger gates multiply mob HP and XP.
    pub is_danger_gate: bool,
    /// Position in zone tiles.
    pub pos: Position,
}

/// A portal placement within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSpawn {
    /// Portal marker name; transition targets refer to this.
    pub name: String,
    /// Position in zone tiles.
    pub pos: Position,
    /// Destination zone.
    pub destination_zone: ZoneId,
    /// Destination portal marker name in that zone.
    pub destination_portal: String,
}

/// Everything needed to boot one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    /// Zone id.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
    /// Zone bounds in tiles.
    pub bounds: Bounds,
    /// Terrain generation seed.
    pub seed: u64,
    /// Minimum player level to enter through a portal.
    pub min_level: u32,
    /// Default spawn / respawn point.
    pub spawn_point: Position,
    /// NPC placements.
    pub npcs: Vec<NpcSpawn>,
    /// Mob placements.
    pub mobs: Vec<MobSpawn>,
    /// Resource node placements.
    pub nodes: Vec<NodeSpawn>,
    /// Station placements.
    pub stations: Vec<StationSpawn>,
    /// Gate placements.
    pub gates: Vec<GateSpawn>,
    /// Portal placements.
    pub portals: Vec<PortalSpawn>,
}

/// Dungeon population and limits for one gate rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankScaling {
    /// The rank this row describes.
    pub rank: GateRank,
    /// Minimum level for every party member.
    pub level_requirement: u32,
    /// The key token burned to open a gate of this rank.
    pub key_item: ItemId,
    /// Trash mob count range `(min, max)` inclusive.
    pub mob_count: (u32, u32),
    /// Boss count.
    pub boss_count: u32,
    /// Template for trash mobs.
    pub mob_template: MobTemplateId,
    /// Template for bosses.
    pub boss_template: MobTemplateId,
    /// Level stamped on spawned mobs, overriding the template.
    pub mob_level: u32,
    /// HP pool for trash mobs at this rank (before danger multiplier).
    pub mob_hp: u32,
    /// HP pool for bosses at this rank (before danger multiplier).
    pub boss_hp: u32,
    /// Instance time limit in milliseconds.
    pub time_limit_ms: u64,
    /// Danger-gate HP multiplier in percent (100 = unchanged).
    pub danger_hp_mult_pct: u32,
    /// Danger-gate XP multiplier in percent.
    pub danger_xp_mult_pct: u32,
}

/// The read-only zone and dungeon-rank registry.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: BTreeMap<ZoneId, ZoneDef>,
    templates: BTreeMap<MobTemplateId, MobTemplate>,
    ranks: BTreeMap<GateRank, RankScaling>,
}

impl ZoneRegistry {
    /// Build a registry and validate cross-references (mob spawns and
    /// rank rows must name known templates; portals must name known
    /// zones).
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::DanglingReference`] on a broken link.
    pub fn new(
        zones: impl IntoIterator<Item = ZoneDef>,
        templates: impl IntoIterator<Item = MobTemplate>,
        ranks: impl IntoIterator<Item = RankScaling>,
    ) -> Result<Self, ContentError> {
        let zones: BTreeMap<ZoneId, ZoneDef> =
            zones.into_iter().map(|z| (z.id.clone(), z)).collect();
        let templates: BTreeMap<MobTemplateId, MobTemplate> =
            templates.into_iter().map(|t| (t.id.clone(), t)).collect();
        let ranks: BTreeMap<GateRank, RankScaling> =
            ranks.into_iter().map(|r| (r.rank, r)).collect();

        for zone in zones.values() {
            for mob in &zone.mobs {
                if !templates.contains_key(&mob.template) {
                    return Err(ContentError::DanglingReference {
                        detail: format!(
                            "zone {} spawns unknown template {}",
                            zone.id, mob.template
                        ),
                    });
                }
            }
            for portal in &zone.portals {
                if !zones.contains_key(&portal.destination_zone) {
                    return Err(ContentError::DanglingReference {
                        detail: format!(
                            "portal {} in zone {} targets unknown zone {}",
                            portal.name, zone.id, portal.destination_zone
                        ),
                    });
                }
            }
        }
        for row in ranks.values() {
            for template in [&row.mob_template, &row.boss_template] {
                if !templates.contains_key(template) {
                    return Err(ContentError::DanglingReference {
                        detail: format!(
                            "rank {} scaling names unknown template {template}",
                            row.rank
                        ),
                    });
                }
            }
        }

        Ok(Self {
            zones,
            templates,
            ranks,
        })
    }

    /// Look up a zone definition.
    pub fn zone(&self, id: &ZoneId) -> Option<&ZoneDef> {
        self.zones.get(id)
    }

    /// Look up a zone definition or fail.
    pub fn require_zone(&self, id: &ZoneId) -> Result<&ZoneDef, ContentError> {
        self.zones
            .get(id)
            .ok_or_else(|| ContentError::UnknownZone(id.clone()))
    }

    /// Look up a mob template.
    pub fn template(&self, id: &MobTemplateId) -> Option<&MobTemplate> {
        self.templates.get(id)
    }

    /// Look up a mob template or fail.
    pub fn require_template(&self, id: &MobTemplateId) -> Result<&MobTemplate, ContentError> {
        self.templates
            .get(id)
            .ok_or_else(|| ContentError::UnknownMobTemplate(id.clone()))
    }

    /// Look up the scaling row for a rank. Every rank in shipped content
    /// has a row; the option only covers hand-built test registries.
    pub fn rank(&self, rank: GateRank) -> Option<&RankScaling> {
        self.ranks.get(&rank)
    }

    /// Iterate all zone definitions.
    pub fn zones(&self) -> impl Iterator<Item = &ZoneDef> {
        self.zones.values()
    }
}
