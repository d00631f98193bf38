//! The gather handler: the deferred reserve-then-compensate discipline.
//!
//! Gathering is the highest-frequency ledger-coupled action, so it never
//! holds the zone lock across the mint: the charge and durability are
//! reserved under the lock, the lock is released, the mint runs with the
//! standard deadline, and a failure re-locks the zone to restore both.
//! Other actions slot in between — which is exactly why the reservation
//! (not the mint result) is what makes a depleted node visible within
//! the same tick.

use mistvale_entities::gathering::{
    GatherReservation, compensate_gather, compensate_node, reserve_gather, validate_gather,
};
use mistvale_entities::validation::require_within_range;
use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::with_deadline;
use mistvale_types::{
    Action, ActionEnvelope, ActionError, ActionOutcome, Entity, EntityId, NodeKind, WalletAddress,
    ZoneEvent,
};

use crate::runtime::{ZoneContext, ZoneHandle};
use crate::state::ZoneState;

use super::{dedup, preflight, require_entity};

pub(crate) async fn handle_gather(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    node_id: EntityId,
) -> Result<ActionOutcome, ActionError> {
    // Phase A: validate and reserve under the zone lock.
    let (wallet, reservation, tick_now) = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;
        reserve_under_lock(&mut state, ctx, envelope, node_id)?
    };

    // Phase B: the mint, with the zone lock released.
    let result = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger
            .mint_item(wallet.clone(), reservation.yield_item.clone(), 1),
    )
    .await;

    ctx.audit.lock().await.record(
        tick_now,
        AuditOp::Mint,
        &wallet,
        &reservation.yield_item,
        1,
        "gather",
        &result,
    );

    match result {
        Ok(_tx) => {
            if reservation.node_newly_depleted {
                zone.lock()
                    .await
                    .push_event(ZoneEvent::NodeDepleted { node: node_id });
            }
            Ok(ActionOutcome::Gathered {
                item: reservation.yield_item.clone(),
                node_charges_left: reservation.charges_after,
                tool_durability: reservation.durability_after,
            })
        }
        Err(error) => {
            // Phase C: compensation — restore the reserved state.
            let mut state = zone.lock().await;
            with_node_and_player(&mut state, envelope.entity, node_id, |player, node| {
                match player {
                    Some(player) => compensate_gather(player, node, &reservation),
                    // The gatherer left the zone mid-flight; the node
                    // charge is restored regardless.
                    None => compensate_node(node, &reservation),
                }
            });
            tracing::warn!(
                wallet = %wallet,
                node = %node_id,
                %error,
                "gather mint failed; reservation compensated"
            );
            Err(map_ledger_error(&error))
        }
    }
}

/// Validate every gather gate and consume the reservation, returning the
/// wallet, the reservation, and the tick for the audit record.
fn reserve_under_lock(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    node_id: EntityId,
) -> Result<(WalletAddress, GatherReservation, u64), ActionError> {
    let tick = state.tick();

    let (player_pos, wallet) = {
        let entity = require_entity(state, envelope.entity)?;
        let wallet = entity
            .wallet()
            .cloned()
            .ok_or_else(|| ActionError::validation("gathering requires a wallet-owned player"))?;
        (entity.pos, wallet)
    };

    let (node_pos, node_kind) = {
        let entity = require_entity(state, node_id)?;
        let node = entity
            .as_node()
            .ok_or_else(|| ActionError::validation(format!("entity {node_id} is not a node")))?;
        (entity.pos, node.kind)
    };

    // The verb must match the node kind.
    let verb_matches = matches!(
        (&envelope.action, node_kind),
        (Action::GatherOre { .. }, NodeKind::Ore)
            | (Action::GatherFlower { .. }, NodeKind::Flower)
    );
    if !verb_matches {
        return Err(ActionError::validation(format!(
            "action {} does not match node kind {node_kind:?}",
            envelope.action.verb()
        )));
    }

    require_within_range(player_pos, node_pos, ctx.config.proximity.node)?;

    // Read-only validation with both borrows shared.
    {
        let player = state
            .entity(envelope.entity)
            .and_then(Entity::as_player)
            .ok_or_else(|| ActionError::validation("gatherer is not a player"))?;
        let node = state
            .entity(node_id)
            .and_then(Entity::as_node)
            .ok_or_else(|| ActionError::internal("node vanished during validation"))?;
        validate_gather(player, node, &ctx.content.items)?;
    }

    // The reservation needs the player and the node mutable at once;
    // lift the node entity out of the map for the duration.
    let mut reservation = Err(ActionError::internal("reservation did not run"));
    with_node_and_player(state, envelope.entity, node_id, |player, node| {
        reservation = match player {
            Some(player) => reserve_gather(player, node, tick),
            None => Err(ActionError::internal("gatherer vanished during reservation")),
        };
    });
    let reservation = reservation?;

    Ok((wallet, reservation, tick))
}

/// Run `f` with the node state borrowed mutably alongside the player (if
/// still present), by temporarily lifting the node entity out of the map.
fn with_node_and_player(
    state: &mut ZoneState,
    player_id: EntityId,
    node_id: EntityId,
    f: impl FnOnce(Option<&mut mistvale_types::PlayerState>, &mut mistvale_types::NodeState),
) {
    let Some(mut node_entity) = state.entities.remove(&node_id) else {
        return;
    };
    if let Some(node) = node_entity.as_node_mut() {
        let player = state.entity_mut(player_id).and_then(Entity::as_player_mut);
        f(player, node);
    }
    state.entities.insert(node_id, node_entity);
}

/// Map an adapter failure into the action taxonomy.
pub(crate) fn map_ledger_error(error: &mistvale_ledger::LedgerError) -> ActionError {
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
