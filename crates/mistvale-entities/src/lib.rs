//! Entity-state logic for the Mistvale world server.
//!
//! Everything here operates on entity state without touching I/O: the
//! crate sits between `mistvale-types` (data) and `mistvale-zone`
//! (orchestration, async, ledger calls). Handlers in the zone runtime
//! validate with these functions, reserve state optimistically, call the
//! ledger, and compensate with the matching undo on failure.
//!
//! # Modules
//!
//! - [`combat`] — the damage formula and HP arithmetic
//! - [`effects`] — active-effect expiry and bounded damage modifiers
//! - [`leveling`] — XP grants, level-ups, the party XP split
//! - [`gathering`] — gather validation, reservation, compensation
//! - [`equipment`] — equip/unequip record management
//! - [`crafting`] — recipe gates, burn/mint plans, upgrade re-equip
//! - [`enchanting`] — catalyst validation and enchantment application
//! - [`quests`] — accept/progress/talk/turn-in state transitions
//! - [`validation`] — the common precondition pipeline and range table

pub mod combat;
pub mod crafting;
pub mod effects;
pub mod enchanting;
pub mod equipment;
pub mod gathering;
pub mod leveling;
pub mod quests;
pub mod validation;

pub use combat::{DamageInput, apply_damage, apply_heal, apply_periodic, resolve_damage};
pub use effects::{expire_effects, hp_per_tick, incoming_damage_pct, outgoing_damage_pct};
pub use gathering::{
    GatherReservation, compensate_gather, compensate_node, reserve_gather, validate_gather,
};
pub use leveling::{XpGrant, XpShare, grant_xp, party_xp_shares};
pub use validation::{ProximityConfig, require_within_range};
