//! The common precondition pipeline.
//!
//! Every action the dispatcher routes into a zone runs the same gate
//! sequence: entity exists → wallet authorization → role narrowing →
//! proximity → level/prerequisite gates → cooldowns and resource costs.
//! The helpers here are that sequence's vocabulary; in particular,
//! [`require_within_range`] is the *single* range check every handler
//! uses, so the proximity table has one source of truth.

use mistvale_types::{
    ActionError, Entity, Position, PreconditionFailure, WalletAddress,
};

/// The proximity table, in tile units. One row per interaction class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityConfig {
    /// Talking to, buying from, or turning in at an NPC.
    pub npc: f64,
    /// Stepping through a portal.
    pub portal: f64,
    /// Working an enchanting altar.
    pub altar: f64,
    /// Opening a dungeon gate (every party member).
    pub gate: f64,
    /// Gathering a resource node.
    pub node: f64,
    /// Working a forge or alchemy lab.
    pub station: f64,
    /// Engaging and auto-attacking a combat target.
    pub attack: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            npc: 50.0,
            portal: 30.0,
            altar: 100.0,
            gate: 50.0,
            node: 50.0,
            station: 50.0,
            attack: 50.0,
        }
    }
}

/// The one range gate. Fails with the measured distance so the client
/// can render "too far away" meaningfully.
pub fn require_within_range(
    source: Position,
    target: Position,
    required: f64,
) -> Result<(), PreconditionFailure> {
    let actual = source.distance_to(target);
    if actual > required {
        return Err(PreconditionFailure::OutOfRange { required, actual });
    }
    Ok(())
}

/// Authorization: the request wallet must own the acting entity.
/// Server-owned entities (no wallet) accept only server-issued requests
/// (no wallet in the envelope).
pub fn require_wallet(entity: &Entity, wallet: Option<&WalletAddress>) -> Result<(), ActionError> {
    match (entity.wallet(), wallet) {
        (Some(owner), Some(requester)) if owner == requester => Ok(()),
        (None, None) => Ok(()),
        (Some(owner), Some(requester)) => Err(ActionError::authorization(format!(
            "wallet {requester} does not own entity {} (owner {owner})",
            entity.id
        ))),
        (Some(_), None) => Err(ActionError::authorization(format!(
            "entity {} requires a wallet identity",
            entity.id
        ))),
        (None, Some(_)) => Err(ActionError::authorization(format!(
            "entity {} is server-owned",
            entity.id
        ))),
    }
}

/// The acting entity must be alive.
pub fn require_alive(entity: &Entity) -> Result<(), PreconditionFailure> {
    if entity.is_alive() {
        Ok(())
    } else {
        Err(PreconditionFailure::ActorDead)
    }
}

/// Level gate.
pub const fn require_level(actual: u32, required: u32) -> Result<(), PreconditionFailure> {
    if actual < required {
        return Err(PreconditionFailure::LevelTooLow { required, actual });
    }
    Ok(())
}

/// Cooldown gate: the current tick must have reached `ready_at`.
pub const fn require_ready(tick: u64, ready_at: u64) -> Result<(), PreconditionFailure> {
    if tick < ready_at {
        return Err(PreconditionFailure::CooldownActive { ready_at });
    }
    Ok(())
}

/// Essence cost gate. Exactly enough essence succeeds.
pub const fn require_essence(available: u32, required: u32) -> Result<(), PreconditionFailure> {
    if available < required {
        return Err(PreconditionFailure::InsufficientEssence {
            required,
            available,
        });
    }
    Ok(())
}
