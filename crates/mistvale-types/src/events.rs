//! Structured records appended to a zone's event ring buffer.
//!
//! The edge layer drains these to feed client updates; the core also uses
//! them as an audit trail in tests. The ring is bounded, so consumers
//! that fall behind lose the oldest records — events are observability,
//! never authority.

use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::ids::{EntityId, ItemId, QuestId, TechniqueId, WalletAddress, ZoneId};

/// A single zone event with the tick it occurred on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEventRecord {
    /// Tick at which the event occurred.
    pub tick: u64,
    /// The event payload.
    pub event: ZoneEvent,
}

/// Something observable that happened inside a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ZoneEvent {
    /// An entity entered the zone (spawn, login, or transition).
    EntityEntered {
        /// The entity.
        entity: EntityId,
        /// Where it appeared.
        pos: Position,
    },
    /// An entity left the zone (despawn, logout, or transition).
    EntityLeft {
        /// The entity.
        entity: EntityId,
    },
    /// An attack landed.
    AttackLanded {
        /// The attacker.
        attacker: EntityId,
        /// The target.
        target: EntityId,
        /// Damage applied after mitigation and clamping.
        damage: u32,
    },
    /// A technique resolved.
    TechniqueResolved {
        /// The caster.
        caster: EntityId,
        /// The technique.
        technique: TechniqueId,
        /// Affected entities.
        affected: Vec<EntityId>,
    },
    /// A combat entity died.
    Death {
        /// The victim.
        victim: EntityId,
        /// The killer, when attributable.
        killer: Option<EntityId>,
    },
    /// A player leveled up.
    LevelUp {
        /// The player.
        entity: EntityId,
        /// The new level.
        level: u32,
    },
    /// A resource node ran out of charges.
    NodeDepleted {
        /// The node.
        node: EntityId,
    },
    /// A resource node or mob respawned.
    Respawned {
        /// The restored entity.
        entity: EntityId,
    },
    /// Quest progress advanced.
    QuestProgress {
        /// The player.
        entity: EntityId,
        /// The quest.
        quest: QuestId,
        /// New progress value.
        progress: u32,
    },
    /// A best-effort ledger mint failed and was not retried.
    MintFailed {
        /// Destination wallet.
        wallet: WalletAddress,
        /// The token that failed to mint.
        item: ItemId,
        /// Adapter-reported reason.
        reason: String,
    },
    /// The runtime detected a state/ledger inconsistency it will not
    /// silently repair (e.g. burns succeeded but the output mint failed).
    Inconsistency {
        /// Diagnostic detail.
        detail: String,
    },
    /// An entity was teleported across zones.
    Transitioned {
        /// The entity.
        entity: EntityId,
        /// Destination zone.
        to_zone: ZoneId,
    },
}
