//! Shop and equipment handlers: buy, sell, equip.
//!
//! Purchases settle currency-burn-then-item-mint; sales settle
//! item-burn-then-currency-mint. A mint failure after a successful burn
//! triggers a best-effort reverse mint plus an inconsistency event —
//! never a silent retry. Prices come from the item catalog, so the
//! buy/sell spread is catalog data, not handler logic.

use mistvale_entities::equipment::equip_item;
use mistvale_entities::validation::require_within_range;
use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::{currency_token, with_deadline};
use mistvale_types::{
    ActionEnvelope, ActionError, ActionOutcome, EntityId, ItemId, NpcRole, PreconditionFailure,
    WalletAddress, ZoneEvent,
};

use crate::runtime::{ZoneContext, ZoneHandle};
use crate::state::ZoneState;

use super::craft::require_balance;
use super::gather::map_ledger_error;
use super::{dedup, preflight, require_entity, require_player_mut};

pub(crate) async fn handle_equip(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    token: &ItemId,
) -> Result<ActionOutcome, ActionError> {
    let def = ctx
        .content
        .items
        .require(token)
        .map_err(|e| ActionError::validation(e.to_string()))?
        .clone();
    if def.equip_slot().is_none() {
        return Err(ActionError::validation(format!(
            "item {token} is not equippable"
        )));
    }

    let wallet = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;
        require_entity(&state, envelope.entity)?
            .wallet()
            .cloned()
            .ok_or_else(|| ActionError::validation("equipping requires a wallet"))?
    };

    // The token must actually be held; the ledger is authoritative.
    require_balance(ctx, &wallet, token, 1).await?;

    let mut state = zone.lock().await;
    let player = require_player_mut(&mut state, envelope.entity)?;
    let (slot, _displaced) = equip_item(player, &def)?;
    Ok(ActionOutcome::Equipped { slot })
}

pub(crate) async fn handle_buy(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    merchant_id: EntityId,
    token: &ItemId,
    quantity: u64,
) -> Result<ActionOutcome, ActionError> {
    if quantity == 0 {
        return Err(ActionError::validation("cannot buy zero items"));
    }
    let def = ctx
        .content
        .items
        .require(token)
        .map_err(|e| ActionError::validation(e.to_string()))?
        .clone();
    if def.purchase_price == 0 {
        return Err(ActionError::validation(format!("item {token} is not sold")));
    }
    let cost = def
        .purchase_price
        .checked_mul(quantity)
        .ok_or_else(|| ActionError::validation("purchase cost overflow"))?;

    let (wallet, tick_now) = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;
        merchant_checks(&state, ctx, envelope.entity, merchant_id, Some(token))?;
        let wallet = require_entity(&state, envelope.entity)?
            .wallet()
            .cloned()
            .ok_or_else(|| ActionError::validation("buying requires a wallet"))?;
        (wallet, state.tick())
    };

    // Currency burn first.
    require_currency(ctx, &wallet, cost).await?;
    let burn = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.burn_currency(wallet.clone(), cost),
    )
    .await;
    ctx.audit.lock().await.record(
        tick_now,
        AuditOp::Burn,
        &wallet,
        &currency_token(),
        cost,
        "buy",
        &burn,
    );
    if let Err(error) = burn {
        return Err(map_ledger_error(&error));
    }

    // Then the item mint; on failure, refund the currency best-effort.
    let mint = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.mint_item(wallet.clone(), token.clone(), quantity),
    )
    .await;
    ctx.audit
        .lock()
        .await
        .record(tick_now, AuditOp::Mint, &wallet, token, quantity, "buy", &mint);

    if let Err(error) = mint {
        let refund = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.mint_currency(wallet.clone(), cost),
        )
        .await;
        ctx.audit.lock().await.record(
            tick_now,
            AuditOp::Mint,
            &wallet,
            &currency_token(),
            cost,
            "buy_refund",
            &refund,
        );
        zone.lock().await.push_event(ZoneEvent::Inconsistency {
            detail: format!("currency burned for {token} but the item mint failed: {error}"),
        });
        return Err(map_ledger_error(&error));
    }

    Ok(ActionOutcome::Bought {
        token: token.clone(),
        quantity,
        cost,
    })
}

pub(crate) async fn handle_sell(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    merchant_id: EntityId,
    token: &ItemId,
    quantity: u64,
) -> Result<ActionOutcome, ActionError> {
    if quantity == 0 {
        return Err(ActionError::validation("cannot sell zero items"));
    }
    let def = ctx
        .content
        .items
        .require(token)
        .map_err(|e| ActionError::validation(e.to_string()))?
        .clone();
    if def.sale_price == 0 {
        return Err(ActionError::validation(format!(
            "item {token} is not bought by merchants"
        )));
    }
    let proceeds = def
        .sale_price
        .checked_mul(quantity)
        .ok_or_else(|| ActionError::validation("sale proceeds overflow"))?;

    let (wallet, tick_now) = {
        let mut state = zone.lock().await;
        preflight(&state, envelope)?;
        dedup(&mut state, envelope)?;
        merchant_checks(&state, ctx, envelope.entity, merchant_id, None)?;
        let wallet = require_entity(&state, envelope.entity)?
            .wallet()
            .cloned()
            .ok_or_else(|| ActionError::validation("selling requires a wallet"))?;
        (wallet, state.tick())
    };

    require_balance(ctx, &wallet, token, quantity).await?;
    let burn = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.burn_item(wallet.clone(), token.clone(), quantity),
    )
    .await;
    ctx.audit
        .lock()
        .await
        .record(tick_now, AuditOp::Burn, &wallet, token, quantity, "sell", &burn);
    if let Err(error) = burn {
        return Err(map_ledger_error(&error));
    }

    let mint = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.mint_currency(wallet.clone(), proceeds),
    )
    .await;
    ctx.audit.lock().await.record(
        tick_now,
        AuditOp::Mint,
        &wallet,
        &currency_token(),
        proceeds,
        "sell",
        &mint,
    );

    if let Err(error) = mint {
        // Give the item back best-effort; the sale did not settle.
        let restore = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.mint_item(wallet.clone(), token.clone(), quantity),
        )
        .await;
        ctx.audit.lock().await.record(
            tick_now,
            AuditOp::Mint,
            &wallet,
            token,
            quantity,
            "sell_restore",
            &restore,
        );
        zone.lock().await.push_event(ZoneEvent::Inconsistency {
            detail: format!("item {token} burned but the currency mint failed: {error}"),
        });
        return Err(map_ledger_error(&error));
    }

    Ok(ActionOutcome::Sold {
        token: token.clone(),
        quantity,
        proceeds,
    })
}

/// Merchant-side checks: the target is a merchant NPC in range, and (for
/// purchases) stocks the requested token.
fn merchant_checks(
    state: &ZoneState,
    ctx: &ZoneContext,
    buyer: EntityId,
    merchant_id: EntityId,
    must_stock: Option<&ItemId>,
) -> Result<(), ActionError> {
    let buyer_pos = require_entity(state, buyer)?.pos;
    let merchant = require_entity(state, merchant_id)?;
    let npc = merchant
        .as_npc()
        .ok_or_else(|| ActionError::validation(format!("entity {merchant_id} is not an npc")))?;
    if npc.role != NpcRole::Merchant {
        return Err(ActionError::validation(format!(
            "npc {merchant_id} is not a merchant"
        )));
    }
    require_within_range(buyer_pos, merchant.pos, ctx.config.proximity.npc)?;
    if let Some(token) = must_stock
        && !npc.stock.contains(token)
    {
        return Err(ActionError::validation(format!(
            "merchant does not stock {token}"
        )));
    }
    Ok(())
}

/// Currency balance gate for purchases.
async fn require_currency(
    ctx: &ZoneContext,
    wallet: &WalletAddress,
    required: u64,
) -> Result<(), ActionError> {
    let held = with_deadline(
        ctx.config.ledger_deadline(),
        ctx.ledger.currency_balance(wallet.clone()),
    )
    .await
    .map_err(|e| map_ledger_error(&e))?;
    if held < required {
        return Err(PreconditionFailure::InsufficientBalance {
            item: currency_token(),
            required,
            available: held,
        }
        .into());
    }
    Ok(())
}
