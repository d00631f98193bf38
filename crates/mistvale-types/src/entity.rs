//! The entity data model: one header plus a role-tagged union.
//!
//! An [`Entity`] is the sole in-zone subject of simulation. The common
//! header carries identity, display name, and position; everything
//! role-specific lives in the [`Role`] variant so that handlers narrow on
//! the tag instead of probing optional fields.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{
    Class, EffectKind, EquipSlot, GateRank, NodeKind, NpcRole, Profession, Quality, Race,
    StationKind,
};
use crate::geometry::Position;
use crate::ids::{EntityId, ItemId, MobTemplateId, QuestId, TechniqueId, WalletAddress, ZoneId};
use crate::stats::StatBlock;

/// A simulated subject in a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// World-unique identity, generated at spawn.
    pub id: EntityId,
    /// Display name. Quest objectives match on mob and NPC names.
    pub name: String,
    /// Position in zone tile coordinates.
    pub pos: Position,
    /// Role-specific state.
    pub role: Role,
}

impl Entity {
    /// Construct an entity with a fresh id.
    pub fn new(name: impl Into<String>, pos: Position, role: Role) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            pos,
            role,
        }
    }

    /// Narrow to a player, if this entity is one.
    pub const fn as_player(&self) -> Option<&PlayerState> {
        match &self.role {
            Role::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Narrow to a mutable player, if this entity is one.
    pub const fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.role {
            Role::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Narrow to a mob, if this entity is one.
    pub const fn as_mob(&self) -> Option<&MobState> {
        match &self.role {
            Role::Mob(m) => Some(m),
            _ => None,
        }
    }

    /// Narrow to a mutable mob, if this entity is one.
    pub const fn as_mob_mut(&mut self) -> Option<&mut MobState> {
        match &mut self.role {
            Role::Mob(m) => Some(m),
            _ => None,
        }
    }

    /// Narrow to an NPC, if this entity is one.
    pub const fn as_npc(&self) -> Option<&NpcState> {
        match &self.role {
            Role::Npc(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to a resource node, if this entity is one.
    pub const fn as_node(&self) -> Option<&NodeState> {
        match &self.role {
            Role::ResourceNode(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to a mutable resource node, if this entity is one.
    pub const fn as_node_mut(&mut self) -> Option<&mut NodeState> {
        match &mut self.role {
            Role::ResourceNode(n) => Some(n),
            _ => None,
        }
    }

    /// Narrow to a crafting station, if this entity is one.
    pub const fn as_station(&self) -> Option<&StationState> {
        match &self.role {
            Role::Station(s) => Some(s),
            _ => None,
        }
    }

    /// Narrow to a dungeon gate, if this entity is one.
    pub const fn as_gate(&self) -> Option<&GateState> {
        match &self.role {
            Role::DungeonGate(g) => Some(g),
            _ => None,
        }
    }

    /// Narrow to a mutable dungeon gate, if this entity is one.
    pub const fn as_gate_mut(&mut self) -> Option<&mut GateState> {
        match &mut self.role {
            Role::DungeonGate(g) => Some(g),
            _ => None,
        }
    }

    /// Narrow to a portal marker, if this entity is one.
    pub const fn as_portal(&self) -> Option<&PortalState> {
        match &self.role {
            Role::Portal(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this entity participates in combat (player or mob).
    pub const fn is_combatant(&self) -> bool {
        matches!(self.role, Role::Player(_) | Role::Mob(_))
    }

    /// Whether this entity is alive. Non-combat entities are always
    /// considered alive.
    pub const fn is_alive(&self) -> bool {
        match &self.role {
            Role::Player(p) => p.alive,
            Role::Mob(m) => m.alive,
            _ => true,
        }
    }

    /// The wallet bound to this entity, if any. Entities without a wallet
    /// are server-owned.
    pub const fn wallet(&self) -> Option<&WalletAddress> {
        match &self.role {
            Role::Player(p) => Some(&p.wallet),
            _ => None,
        }
    }
}

/// Role-specific entity state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    /// An agent-controlled character.
    Player(PlayerState),
    /// A hostile creature (bosses are mobs with `is_boss`).
    Mob(MobState),
    /// A scripted service NPC.
    Npc(NpcState),
    /// A gatherable ore or flower node.
    ResourceNode(NodeState),
    /// A crafting station.
    Station(StationState),
    /// A dungeon gate.
    DungeonGate(GateState),
    /// A portal marker declaring a cross-zone destination.
    Portal(PortalState),
}

/// Mutable state of a player entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// External ledger key; authorization compares this against the
    /// request wallet.
    pub wallet: WalletAddress,
    /// Character level, 1..=60.
    pub level: u32,
    /// Accumulated experience. Retained past the level-60 threshold.
    pub xp: u64,
    /// Race, fixed at character creation.
    pub race: Race,
    /// Class, fixed at character creation.
    pub class: Class,
    /// Lifetime kill count.
    pub kills: u64,
    /// Current hit points. Invariant: `0 <= hp <= max_hp`.
    pub hp: u32,
    /// Maximum hit points at the current level and equipment.
    pub max_hp: u32,
    /// Current essence. Invariant: `0 <= essence <= max_essence`.
    pub essence: u32,
    /// Maximum essence.
    pub max_essence: u32,
    /// Cleared when hp reaches 0; restored on respawn.
    pub alive: bool,
    /// Base stats derived from race × class × level (no equipment).
    pub base_stats: StatBlock,
    /// Learned professions.
    pub professions: BTreeSet<Profession>,
    /// Learned technique ids.
    pub learned_techniques: BTreeSet<TechniqueId>,
    /// Quests currently in progress.
    pub active_quests: Vec<ActiveQuest>,
    /// Completed quest ids, in completion order.
    pub completed_quests: Vec<QuestId>,
    /// Active timed effects.
    pub active_effects: Vec<ActiveEffect>,
    /// Equipped items by slot.
    pub equipment: BTreeMap<EquipSlot, EquippedItem>,
    /// Technique cooldowns: technique id → tick at which it is ready.
    pub cooldowns: BTreeMap<TechniqueId, u64>,
    /// Tick at which the next auto-attack may fire.
    pub attack_ready_at: u64,
    /// Current auto-attack target, if engaged.
    pub engaged_target: Option<EntityId>,
}

impl PlayerState {
    /// Effective stats: base block plus equipment bonuses (rolled stats
    /// and enchantments on non-broken items). Active-effect percentage
    /// modifiers apply at damage time, not here.
    pub fn effective_stats(&self) -> StatBlock {
        let mut effective = self.base_stats;
        for item in self.equipment.values() {
            if item.broken {
                continue;
            }
            if let Some(rolled) = &item.rolled_stats {
                effective = effective.combined(rolled);
            }
            for enchant in &item.enchantments {
                effective.add(enchant.stat, enchant.amount);
            }
        }
        effective
    }
}

/// Mutable state of a mob entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobState {
    /// Spawn template this mob was created from; also the loot-table key.
    pub template: MobTemplateId,
    /// Mob level, used for XP scaling display only.
    pub level: u32,
    /// Combat stats.
    pub stats: StatBlock,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Cleared on death; the mob is removed and rescheduled.
    pub alive: bool,
    /// Whether this mob is a boss.
    pub is_boss: bool,
    /// XP granted to the killer (before party math).
    pub xp_reward: u64,
    /// Radius within which the mob aggros onto a player.
    pub detection_radius: f64,
    /// Radius within which the mob can strike.
    pub strike_radius: f64,
    /// Current aggro target.
    pub aggro_target: Option<EntityId>,
    /// Tick at which the next auto-attack may fire.
    pub attack_ready_at: u64,
    /// Ticks between death and respawn.
    pub respawn_ticks: u64,
    /// Original spawn position, used on respawn.
    pub spawn_pos: Position,
    /// Active timed effects (debuffs and damage over time land on mobs
    /// the same as on players).
    pub active_effects: Vec<ActiveEffect>,
}

/// State of a service NPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcState {
    /// What this NPC does.
    pub role: NpcRole,
    /// Items stocked for sale (merchants only).
    pub stock: Vec<ItemId>,
    /// Techniques taught (trainers only).
    pub teaches: Vec<TechniqueId>,
    /// Professions taught (profession trainers only).
    pub trains: Vec<Profession>,
}

/// State of a gatherable resource node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    /// Ore or flower.
    pub kind: NodeKind,
    /// The item token minted per successful gather.
    pub yield_item: ItemId,
    /// Node tier; the equipped tool tier must be at least this.
    pub tier: u8,
    /// Remaining charges. Reaching 0 marks the node depleted.
    pub charges: u32,
    /// Charge count restored on respawn.
    pub max_charges: u32,
    /// Tick at which the node was depleted, if it is.
    pub depleted_at_tick: Option<u64>,
    /// Ticks from depletion to restoration.
    pub respawn_ticks: u64,
}

impl NodeState {
    /// Whether the node currently has no charges.
    pub const fn is_depleted(&self) -> bool {
        self.charges == 0
    }
}

/// State of a crafting station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationState {
    /// Which station this is.
    pub kind: StationKind,
}

/// State of a dungeon gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateState {
    /// Gate rank; selects the scaling row and key item.
    pub rank: GateRank,
    /// Danger gates multiply mob HP and XP.
    pub is_danger_gate: bool,
    /// Set while an instance spawned from this gate is live.
    pub opened: bool,
}

/// State of a portal marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalState {
    /// Destination zone id.
    pub destination_zone: ZoneId,
    /// Name of the destination portal marker inside that zone.
    pub destination_portal: String,
}

/// An item occupying an equipment slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedItem {
    /// Ledger token id of the item.
    pub token: ItemId,
    /// Remaining durability. Invariant: `0 <= durability <= max_durability`
    /// and `broken` iff `durability == 0`.
    pub durability: u32,
    /// Durability when pristine.
    pub max_durability: u32,
    /// Set when durability reaches 0. Broken items stay equipped but
    /// contribute no stats and fail tool checks.
    pub broken: bool,
    /// Quality grade rolled at mint time.
    pub quality: Quality,
    /// Bonus stats rolled at mint time, if any.
    pub rolled_stats: Option<StatBlock>,
    /// Enchantments applied at an altar. In-memory on the live entity.
    pub enchantments: Vec<Enchantment>,
}

/// An enchantment record on an equipped item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enchantment {
    /// The catalyst token consumed to apply this enchantment.
    pub catalyst: ItemId,
    /// The stat the enchantment raises.
    pub stat: crate::enums::StatKind,
    /// Flat bonus added to the effective stat block.
    pub amount: u32,
}

/// A quest in progress on a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveQuest {
    /// Quest id in the quest catalog.
    pub quest: QuestId,
    /// Objective progress. Invariant: never exceeds the catalog count.
    pub progress: u32,
    /// Tick at which the quest was accepted.
    pub started_at_tick: u64,
}

/// A timed effect on a combat entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// The technique that applied this effect.
    pub source: TechniqueId,
    /// Effect category.
    pub kind: EffectKind,
    /// Tick at which the effect expires and is removed.
    pub expires_at_tick: u64,
    /// Additive percent applied to damage this entity deals.
    pub outgoing_damage_pct: i32,
    /// Additive percent applied to damage this entity takes.
    pub incoming_damage_pct: i32,
    /// HP delta applied each tick (negative for damage over time).
    pub hp_per_tick: i64,
}
