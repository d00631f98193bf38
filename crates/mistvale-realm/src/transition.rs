//! Cross-zone transitions through portals.
//!
//! A transition is an atomic remove-then-insert performed while holding
//! both zone locks in lexicographic order: a reader of either zone sees
//! the entity in exactly one of them at every instant. Validation (range
//! 30, destination level gate, both portals present) happens inside the
//! pair lock so nothing can shift between check and move.

use std::sync::Arc;

use tracing::info;

use mistvale_types::{
    ActionError, Entity, EntityId, Position, PreconditionFailure, WalletAddress, ZoneEvent,
    ZoneId,
};
use mistvale_zone::state::ZoneState;

use mistvale_entities::validation::{require_alive, require_wallet, require_within_range};

use crate::world::{WorldManager, with_zone_pair};

/// Where a transition landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// The destination zone.
    pub zone: ZoneId,
    /// The position at the destination portal.
    pub pos: Position,
}

/// Transition through a named portal entity.
pub async fn transition_portal(
    world: &Arc<WorldManager>,
    wallet: Option<&WalletAddress>,
    zone_id: &ZoneId,
    entity_id: EntityId,
    portal_id: EntityId,
) -> Result<TransitionOutcome, ActionError> {
    let source = world.require_zone(zone_id).await?;

    // Read the portal's destination outside the pair lock; everything is
    // re-validated inside it.
    let destination_zone = {
        let state = source.lock().await;
        let portal = state
            .entity(portal_id)
            .ok_or_else(|| ActionError::validation(format!("unknown portal {portal_id}")))?;
        portal
            .as_portal()
            .ok_or_else(|| ActionError::validation(format!("entity {portal_id} is not a portal")))?
            .destination_zone
            .clone()
    };
    let destination = world.require_zone(&destination_zone).await?;

    let proximity = world.context().config.proximity.portal;
    let outcome = with_zone_pair(&source, &destination, move |src, dst| {
        move_through_portal(src, dst, wallet, entity_id, Some(portal_id), proximity)
    })
    .await??;

    info!(entity = %entity_id, from = %zone_id, to = %outcome.zone, "transitioned");
    Ok(outcome)
}

/// Transition through whichever portal is in range (the "walk into the
/// portal" path — no explicit portal id from the client).
pub async fn transition_auto(
    world: &Arc<WorldManager>,
    wallet: Option<&WalletAddress>,
    zone_id: &ZoneId,
    entity_id: EntityId,
) -> Result<TransitionOutcome, ActionError> {
    let source = world.require_zone(zone_id).await?;
    let proximity = world.context().config.proximity.portal;

    let portal_id = {
        let state = source.lock().await;
        let pos = state
            .entity(entity_id)
            .ok_or_else(|| ActionError::validation(format!("unknown entity {entity_id}")))?
            .pos;
        nearest_portal(&state, pos, proximity).ok_or_else(|| {
            ActionError::Precondition(PreconditionFailure::OutOfRange {
                required: proximity,
                actual: f64::INFINITY,
            })
        })?
    };

    transition_portal(world, wallet, zone_id, entity_id, portal_id).await
}

fn nearest_portal(state: &ZoneState, from: Position, radius: f64) -> Option<EntityId> {
    state
        .entities
        .values()
        .filter(|e| e.as_portal().is_some())
        .filter(|e| from.within_range(e.pos, radius))
        .min_by(|a, b| from.distance_to(a.pos).total_cmp(&from.distance_to(b.pos)))
        .map(|e| e.id)
}

/// The locked half of a transition: validate, remove, reposition, insert.
fn move_through_portal(
    src: &mut ZoneState,
    dst: &mut ZoneState,
    wallet: Option<&WalletAddress>,
    entity_id: EntityId,
    portal_id: Option<EntityId>,
    proximity: f64,
) -> Result<TransitionOutcome, ActionError> {
    // Source-side validation.
    let (entity_pos, level) = {
        let entity = src
            .entity(entity_id)
            .ok_or_else(|| ActionError::validation(format!("unknown entity {entity_id}")))?;
        require_wallet(entity, wallet)?;
        require_alive(entity)?;
        let level = entity.as_player().map_or(u32::MAX, |p| p.level);
        (entity.pos, level)
    };

    let (portal_pos, destination_portal) = {
        let portal = portal_id
            .and_then(|id| src.entity(id))
            .ok_or_else(|| ActionError::validation("portal not found"))?;
        let info = portal
            .as_portal()
            .ok_or_else(|| ActionError::validation("entity is not a portal"))?;
        if info.destination_zone != dst.id {
            return Err(ActionError::internal("portal destination drifted mid-lock"));
        }
        (portal.pos, info.destination_portal.clone())
    };

    require_within_range(entity_pos, portal_pos, proximity)?;
    mistvale_entities::validation::require_level(level, dst.min_level)?;

    // The counterpart portal must exist in the destination.
    let arrival_pos = dst
        .entities
        .values()
        .find(|e| e.as_portal().is_some() && e.name == destination_portal)
        .map(|e| e.pos)
        .ok_or_else(|| {
            ActionError::validation(format!(
                "destination portal {destination_portal} missing in zone {}",
                dst.id
            ))
        })?;

    // Atomic to observers of either zone: both locks are held.
    let mut entity: Entity = src
        .remove_entity(entity_id)
        .ok_or_else(|| ActionError::internal("entity vanished mid-transition"))?;
    entity.pos = arrival_pos;
    if let Some(player) = entity.as_player_mut() {
        // Engagements do not survive a zone change.
        player.engaged_target = None;
    }
    let dst_zone = dst.id.clone();
    src.push_event(ZoneEvent::Transitioned {
        entity: entity_id,
        to_zone: dst_zone.clone(),
    });
    dst.insert_entity(entity);

    Ok(TransitionOutcome {
        zone: dst_zone,
        pos: arrival_pos,
    })
}
