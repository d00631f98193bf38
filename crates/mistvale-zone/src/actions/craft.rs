//! Crafting, upgrading, and enchanting handlers.
//!
//! All three consume wallet tokens through the adapter. Burns run
//! sequentially; when a burn fails after earlier burns succeeded, the
//! already-burned inputs are re-minted best-effort (an "un-burn"). When
//! every burn succeeds but the output mint fails, the runtime records an
//! inconsistency event and does not retry — the wallet is short one
//! output and operators can see exactly where.

use mistvale_entities::crafting::{CraftPlan, plan_recipe, re_equip_upgraded, validate_recipe_gates};
use mistvale_entities::enchanting::{apply_enchant, validate_enchant};
use mistvale_entities::validation::require_within_range;
use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::with_deadline;
use mistvale_types::{
    ActionEnvelope, ActionError, ActionOutcome, EntityId, EquipSlot, ItemId, PreconditionFailure,
    StationKind, WalletAddress, ZoneEvent,
};

use mistvale_content::recipes::RecipeKind;

use crate::runtime::{ZoneContext, ZoneHandle};
use crate::state::ZoneState;

use super::gather::map_ledger_error;
use super::{dedup, preflight, require_entity, require_player_mut};

pub(crate) async fn handle_craft(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    station_id: EntityId,
    recipe_id: &mistvale_types::RecipeId,
) -> Result<ActionOutcome, ActionError> {
    let (wallet, plan, tick_now) = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;
        validate_at_station(&state, ctx, envelope, station_id, recipe_id, None)?
    };

    execute_plan(zone, ctx, &wallet, &plan, tick_now, "craft").await?;

    Ok(ActionOutcome::Crafted {
        output: plan.mint.0,
    })
}

pub(crate) async fn handle_upgrade(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    forge_id: EntityId,
    recipe_id: &mistvale_types::RecipeId,
) -> Result<ActionOutcome, ActionError> {
    let (wallet, plan, tick_now) = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;
        validate_at_station(
            &state,
            ctx,
            envelope,
            forge_id,
            recipe_id,
            Some(StationKind::Forge),
        )?
    };

    let recipe = ctx
        .content
        .recipes
        .require(recipe_id)
        .map_err(|e| ActionError::validation(e.to_string()))?
        .clone();
    if !matches!(recipe.kind, RecipeKind::Upgrade { .. }) {
        return Err(ActionError::validation(format!(
            "recipe {recipe_id} is not an upgrade"
        )));
    }

    execute_plan(zone, ctx, &wallet, &plan, tick_now, "upgrade").await?;

    // Keep the equipment slot if the upgraded-from item was equipped.
    let re_equipped = {
        let mut state = zone.lock().await;
        let player = require_player_mut(&mut state, envelope.entity)?;
        re_equip_upgraded(player, &recipe, &ctx.content.items)?
    };

    Ok(ActionOutcome::Upgraded {
        output: plan.mint.0,
        re_equipped,
    })
}

pub(crate) async fn handle_enchant(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    altar_id: EntityId,
    catalyst_id: &ItemId,
    slot: EquipSlot,
) -> Result<ActionOutcome, ActionError> {
    let catalyst_def = ctx
        .content
        .items
        .require(catalyst_id)
        .map_err(|e| ActionError::validation(e.to_string()))?
        .clone();

    let (wallet, enchantment, tick_now) = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;

        let (player_pos, wallet) = {
            let entity = require_entity(&state, envelope.entity)?;
            let wallet = entity
                .wallet()
                .cloned()
                .ok_or_else(|| ActionError::validation("enchanting requires a wallet"))?;
            (entity.pos, wallet)
        };
        {
            let altar = require_entity(&state, altar_id)?;
            let station = altar.as_station().ok_or_else(|| {
                ActionError::validation(format!("entity {altar_id} is not a station"))
            })?;
            if station.kind != StationKind::EnchantingAltar {
                return Err(ActionError::validation("enchanting requires an altar"));
            }
            require_within_range(player_pos, altar.pos, ctx.config.proximity.altar)?;
        }

        let player = state
            .entity(envelope.entity)
            .and_then(mistvale_types::Entity::as_player)
            .ok_or_else(|| ActionError::validation("enchanter is not a player"))?;
        let enchantment = validate_enchant(player, &catalyst_def, slot)?;
        (wallet, enchantment, state.tick())
    };

    // Burn the catalyst; nothing local has been mutated yet, so a
    // failure needs no compensation.
    require_balance(ctx, &wallet, catalyst_id, 1).await?;
    let burn = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.burn_item(wallet.clone(), catalyst_id.clone(), 1),
    )
    .await;
    ctx.audit.lock().await.record(
        tick_now,
        AuditOp::Burn,
        &wallet,
        catalyst_id,
        1,
        "enchant_catalyst",
        &burn,
    );
    if let Err(error) = burn {
        return Err(map_ledger_error(&error));
    }

    // Apply the record on the live entity.
    {
        let mut state = zone.lock().await;
        let player = require_player_mut(&mut state, envelope.entity)?;
        if let Err(err) = apply_enchant(player, slot, enchantment) {
            state.push_event(ZoneEvent::Inconsistency {
                detail: format!(
                    "catalyst {catalyst_id} burned but enchant application failed: {err}"
                ),
            });
            return Err(err);
        }
    }

    Ok(ActionOutcome::Enchanted { slot })
}

/// Shared station-side validation for craft and upgrade: station entity,
/// kind, range, recipe gates. Returns the wallet, the plan, and the tick.
fn validate_at_station(
    state: &ZoneState,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    station_id: EntityId,
    recipe_id: &mistvale_types::RecipeId,
    required_kind: Option<StationKind>,
) -> Result<(WalletAddress, CraftPlan, u64), ActionError> {
    let recipe = ctx
        .content
        .recipes
        .require(recipe_id)
        .map_err(|e| ActionError::validation(e.to_string()))?;

    let (player_pos, wallet) = {
        let entity = require_entity(state, envelope.entity)?;
        let wallet = entity
            .wallet()
            .cloned()
            .ok_or_else(|| ActionError::validation("crafting requires a wallet"))?;
        (entity.pos, wallet)
    };

    let station_kind = {
        let entity = require_entity(state, station_id)?;
        let station = entity
            .as_station()
            .ok_or_else(|| ActionError::validation(format!("entity {station_id} is not a station")))?;
        require_within_range(player_pos, entity.pos, ctx.config.proximity.station)?;
        station.kind
    };
    if let Some(required) = required_kind
        && station_kind != required
    {
        return Err(ActionError::validation(format!(
            "station {station_id} is a {station_kind:?}, not a {required:?}"
        )));
    }

    let player = state
        .entity(envelope.entity)
        .and_then(mistvale_types::Entity::as_player)
        .ok_or_else(|| ActionError::validation("crafter is not a player"))?;
    validate_recipe_gates(player, recipe, station_kind)?;

    Ok((wallet, plan_recipe(recipe), state.tick()))
}

/// Check a wallet balance, mapping a short balance to a precondition.
pub(crate) async fn require_balance(
    ctx: &ZoneContext,
    wallet: &WalletAddress,
    token: &ItemId,
    required: u64,
) -> Result<(), ActionError> {
    let held = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.item_balance(wallet.clone(), token.clone()),
    )
    .await
    .map_err(|e| map_ledger_error(&e))?;
    if held < required {
        return Err(PreconditionFailure::InsufficientBalance {
            item: token.clone(),
            required,
            available: held,
        }
        .into());
    }
    Ok(())
}

/// Run a plan's burns then its mint, with un-burn compensation.
async fn execute_plan(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    wallet: &WalletAddress,
    plan: &CraftPlan,
    tick_now: u64,
    reason: &'static str,
) -> Result<(), ActionError> {
    // Fail fast on short balances before burning anything.
    for (token, qty) in &plan.burns {
        require_balance(ctx, wallet, token, *qty).await?;
    }

    // Sequential burns; compensate on mid-sequence failure.
    let mut burned: Vec<(ItemId, u64)> = Vec::new();
    for (token, qty) in &plan.burns {
        let result = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.burn_item(wallet.clone(), token.clone(), *qty),
        )
        .await;
        ctx.audit
            .lock()
            .await
            .record(tick_now, AuditOp::Burn, wallet, token, *qty, reason, &result);

        if let Err(error) = result {
            unburn(ctx, wallet, &burned, tick_now).await;
            return Err(map_ledger_error(&error));
        }
        burned.push((token.clone(), *qty));
    }

    // Output mint. Failure here is an inconsistency, not a rollback.
    let (output, qty) = &plan.mint;
    let result = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.mint_item(wallet.clone(), output.clone(), *qty),
    )
    .await;
    ctx.audit
        .lock()
        .await
        .record(tick_now, AuditOp::Mint, wallet, output, *qty, reason, &result);

    if let Err(error) = result {
        tracing::error!(
            %wallet,
            output = %output,
            %error,
            "inputs burned but output mint failed"
        );
        zone.lock().await.push_event(ZoneEvent::Inconsistency {
            detail: format!("inputs burned for {output} but the output mint failed: {error}"),
        });
        return Err(map_ledger_error(&error));
    }
    Ok(())
}

/// Best-effort re-mint of already-burned inputs.
async fn unburn(ctx: &ZoneContext, wallet: &WalletAddress, burned: &[(ItemId, u64)], tick_now: u64) {
    for (token, qty) in burned {
        let result = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.mint_item(wallet.clone(), token.clone(), *qty),
        )
        .await;
        if let Err(error) = &result {
            tracing::error!(%wallet, token = %token, %error, "un-burn failed; wallet is short");
        }
        ctx.audit
            .lock()
            .await
            .record(tick_now, AuditOp::Mint, wallet, token, *qty, "unburn", &result);
    }
}
