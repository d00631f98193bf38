//! Shared type definitions for the Mistvale world server.
//!
//! This crate is the vocabulary every other crate speaks: strongly-typed
//! identifiers, the role-tagged entity union, stat blocks, the dispatcher
//! action surface, the zone event records, and the action error taxonomy.
//! It contains no behavior beyond cheap accessors and arithmetic — logic
//! lives in `mistvale-entities` and above.
//!
//! # Modules
//!
//! - [`ids`] — UUID v7 and string-key identifier newtypes
//! - [`geometry`] — tile-space positions, bounds, range checks
//! - [`enums`] — closed vocabularies (slots, ranks, professions, …)
//! - [`stats`] — the eight-stat block and its arithmetic
//! - [`entity`] — the entity header + role-tagged union
//! - [`actions`] — action payloads, envelopes, outcomes
//! - [`events`] — zone event ring records
//! - [`error`] — the action error taxonomy

pub mod actions;
pub mod entity;
pub mod enums;
pub mod error;
pub mod events;
pub mod geometry;
pub mod ids;
pub mod stats;

pub use actions::{Action, ActionEnvelope, ActionOutcome};
pub use entity::{
    ActiveEffect, ActiveQuest, Enchantment, Entity, EquippedItem, GateState, MobState, NodeState,
    NpcState, PlayerState, PortalState, Role, StationState,
};
pub use enums::{
    Class, EffectKind, EquipSlot, GateRank, NodeKind, NpcRole, Profession, Quality, Race,
    StatKind, StationKind, TargetKind,
};
pub use error::{ActionError, PreconditionFailure};
pub use events::{ZoneEvent, ZoneEventRecord};
pub use geometry::{Bounds, Position};
pub use ids::{
    ActionId, EntityId, InstanceId, ItemId, MobTemplateId, PartyId, QuestId, RecipeId,
    TechniqueId, WalletAddress, ZoneId,
};
pub use stats::StatBlock;
