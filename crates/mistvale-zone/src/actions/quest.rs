//! Quest handlers: accept, talk visit, turn-in.
//!
//! Turn-in reward ordering is XP → currency → items, so a level-up is
//! visible before any mint settles. A reward mint failure is logged and
//! audited but does not revert the turn-in — liveness over strict
//! atomicity, per the reward contract.

use mistvale_entities::leveling::grant_xp;
use mistvale_entities::quests;
use mistvale_entities::validation::require_within_range;
use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::{currency_token, with_deadline};
use mistvale_types::{
    ActionEnvelope, ActionError, ActionOutcome, EntityId, NpcRole, PreconditionFailure,
    QuestId, ZoneEvent,
};

use crate::runtime::{ZoneContext, ZoneHandle};
use crate::state::ZoneState;

use super::{require_entity, require_player_mut};

/// Accept a quest from a nearby quest giver.
pub(crate) fn handle_accept(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    player_id: EntityId,
    npc_id: EntityId,
    quest_id: &QuestId,
) -> Result<ActionOutcome, ActionError> {
    let tick = state.tick();
    let npc_name = quest_npc_checks(state, ctx, player_id, npc_id)?;

    let def = ctx
        .content
        .quests
        .require(quest_id)
        .map_err(|e| ActionError::validation(e.to_string()))?
        .clone();
    if def.giver_npc != npc_name {
        return Err(PreconditionFailure::QuestNotOfferedHere {
            quest: quest_id.clone(),
        }
        .into());
    }

    let player = require_player_mut(state, player_id)?;
    quests::accept_quest(player, &def, &ctx.content.quests, tick)?;
    Ok(ActionOutcome::QuestAccepted {
        quest: quest_id.clone(),
    })
}

/// Visit an NPC: auto-accept and fulfill eligible talk quests.
pub(crate) fn handle_talk(
    state: &mut ZoneState,
    ctx: &ZoneContext,
    player_id: EntityId,
    npc_id: EntityId,
) -> Result<ActionOutcome, ActionError> {
    let tick = state.tick();
    let npc_name = quest_npc_checks(state, ctx, player_id, npc_id)?;

    let player = require_player_mut(state, player_id)?;
    let completed = quests::record_talk_visit(player, &npc_name, &ctx.content.quests, tick);
    for quest in &completed {
        state.push_event(ZoneEvent::QuestProgress {
            entity: player_id,
            quest: quest.clone(),
            progress: 1,
        });
    }
    Ok(ActionOutcome::Talked { completed })
}

/// Turn in a fulfilled quest and grant its rewards.
pub(crate) async fn handle_turn_in(
    zone: &ZoneHandle,
    ctx: &ZoneContext,
    envelope: &ActionEnvelope,
    npc_id: EntityId,
    quest_id: &QuestId,
) -> Result<ActionOutcome, ActionError> {
    // Phase A under the lock: verify, move to completed, apply XP.
    let (def, wallet, tick_now, xp) = {
        let mut state = zone.lock().await;
        super::preflight(&state, envelope)?;
        super::dedup(&mut state, envelope)?;

        let npc_name = quest_npc_checks(&state, ctx, envelope.entity, npc_id)?;

        let wallet = require_entity(&state, envelope.entity)?
            .wallet()
            .cloned()
            .ok_or_else(|| ActionError::validation("quest turn-in requires a wallet"))?;

        let player = require_player_mut(&mut state, envelope.entity)?;
        let def = quests::take_turn_in(player, quest_id, &npc_name, &ctx.content.quests)?;

        // XP first, so the level-up is visible before any mint.
        let grant = grant_xp(player, def.reward_xp);
        if grant.levels_gained > 0 {
            let level = grant.new_level;
            state.push_event(ZoneEvent::LevelUp {
                entity: envelope.entity,
                level,
            });
        }
        (def, wallet, state.tick(), grant.xp)
    };

    // Phase B unlocked: currency, then items. Failures are logged and do
    // not revert the completed turn-in.
    if def.reward_currency > 0 {
        let result = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.mint_currency(wallet.clone(), def.reward_currency),
        )
        .await;
        ctx.audit.lock().await.record(
            tick_now,
            AuditOp::Mint,
            &wallet,
            &currency_token(),
            def.reward_currency,
            "quest_reward",
            &result,
        );
        if let Err(error) = result {
            tracing::warn!(%wallet, quest = %quest_id, %error, "quest currency mint failed");
        }
    }
    for (item, qty) in &def.reward_items {
        let result = with_deadline(
            ctx.config.ledger_deadline(),
            ctx.ledger.mint_item(wallet.clone(), item.clone(), *qty),
        )
        .await;
        ctx.audit.lock().await.record(
            tick_now,
            AuditOp::Mint,
            &wallet,
            item,
            *qty,
            "quest_reward",
            &result,
        );
        if let Err(error) = result {
            tracing::warn!(%wallet, quest = %quest_id, item = %item, %error, "quest item mint failed");
        }
    }

    Ok(ActionOutcome::QuestTurnedIn {
        quest: quest_id.clone(),
        xp,
        currency: def.reward_currency,
    })
}

/// Common NPC-side checks for quest verbs: the target is a quest giver
/// within NPC range. Returns the NPC's display name for catalog matches.
fn quest_npc_checks(
    state: &ZoneState,
    ctx: &ZoneContext,
    player_id: EntityId,
    npc_id: EntityId,
) -> Result<String, ActionError> {
    let player_pos = require_entity(state, player_id)?.pos;
    let npc = require_entity(state, npc_id)?;
    let npc_state = npc
        .as_npc()
        .ok_or_else(|| ActionError::validation(format!("entity {npc_id} is not an npc")))?;
    if npc_state.role != NpcRole::QuestGiver {
        return Err(ActionError::validation(format!(
            "npc {npc_id} does not handle quests"
        )));
    }
    require_within_range(player_pos, npc.pos, ctx.config.proximity.npc)?;
    Ok(npc.name.clone())
}
