//! Quest state transitions on the player: accept, progress, talk, turn-in.
//!
//! The catalog owns the definitions; this module owns the player-side
//! state machine. Reward *granting* (XP application and ledger mints)
//! belongs to the runtime — [`take_turn_in`] only verifies and moves the
//! quest from active to completed, returning the reward description.

use mistvale_types::{ActionError, ActiveQuest, PlayerState, PreconditionFailure, QuestId};

use mistvale_content::quests::{QuestCatalog, QuestDef, QuestObjective};

/// Accept a quest.
///
/// Verifies it is not already active or completed and that the
/// prerequisite chain is satisfied. NPC proximity and identity are
/// checked by the caller against the catalog's `giver_npc`.
pub fn accept_quest(
    player: &mut PlayerState,
    quest: &QuestDef,
    catalog: &QuestCatalog,
    tick: u64,
) -> Result<(), ActionError> {
    if player.completed_quests.contains(&quest.id) {
        return Err(PreconditionFailure::QuestAlreadyCompleted(quest.id.clone()).into());
    }
    if player.active_quests.iter().any(|q| q.quest == quest.id) {
        return Err(ActionError::conflict(format!(
            "quest {} is already active",
            quest.id
        )));
    }
    if let Err(missing) = catalog.prerequisite_met(quest, &player.completed_quests) {
        return Err(PreconditionFailure::MissingPrerequisite { quest: missing }.into());
    }

    player.active_quests.push(ActiveQuest {
        quest: quest.id.clone(),
        progress: 0,
        started_at_tick: tick,
    });
    Ok(())
}

/// Advance kill-quest progress after the player killed a mob named
/// `mob_name`. Returns the quests whose progress moved, with their new
/// progress values. Progress never exceeds the objective count.
pub fn record_kill(
    player: &mut PlayerState,
    mob_name: &str,
    catalog: &QuestCatalog,
) -> Vec<(QuestId, u32)> {
    let mut advanced = Vec::new();
    for active in &mut player.active_quests {
        let Some(def) = catalog.get(&active.quest) else {
            continue;
        };
        let QuestObjective::Kill {
            target_mob_name,
            count,
        } = &def.objective
        else {
            continue;
        };
        if target_mob_name != mob_name || active.progress >= *count {
            continue;
        }
        active.progress = active.progress.saturating_add(1).min(*count);
        advanced.push((active.quest.clone(), active.progress));
    }
    advanced
}

/// Handle a talk visit at the NPC named `npc_name`.
///
/// Every eligible talk quest targeting this NPC is auto-accepted (when
/// not yet active) and its progress set to the objective count. Returns
/// the quests now fulfilled by the visit.
pub fn record_talk_visit(
    player: &mut PlayerState,
    npc_name: &str,
    catalog: &QuestCatalog,
    tick: u64,
) -> Vec<QuestId> {
    let mut fulfilled = Vec::new();

    let candidates: Vec<QuestDef> = catalog.talk_targets(npc_name).cloned().collect();
    for def in candidates {
        if player.completed_quests.contains(&def.id) {
            continue;
        }
        if catalog
            .prerequisite_met(&def, &player.completed_quests)
            .is_err()
        {
            continue;
        }

        let required = def.objective.required_count();
        match player.active_quests.iter_mut().find(|q| q.quest == def.id) {
            Some(active) => {
                if active.progress < required {
                    active.progress = required;
                    fulfilled.push(def.id.clone());
                }
            }
            None => {
                player.active_quests.push(ActiveQuest {
                    quest: def.id.clone(),
                    progress: required,
                    started_at_tick: tick,
                });
                fulfilled.push(def.id.clone());
            }
        }
    }

    fulfilled
}

/// Verify a turn-in at the NPC named `npc_name` and move the quest from
/// active to completed. Returns the definition so the runtime can grant
/// rewards (XP first, then currency, then items).
pub fn take_turn_in(
    player: &mut PlayerState,
    quest_id: &QuestId,
    npc_name: &str,
    catalog: &QuestCatalog,
) -> Result<QuestDef, ActionError> {
    let def = catalog
        .get(quest_id)
        .ok_or_else(|| ActionError::validation(format!("unknown quest {quest_id}")))?
        .clone();

    if def.turn_in_npc != npc_name {
        return Err(PreconditionFailure::QuestNotOfferedHere {
            quest: quest_id.clone(),
        }
        .into());
    }

    let Some(index) = player
        .active_quests
        .iter()
        .position(|q| q.quest == *quest_id)
    else {
        if player.completed_quests.contains(quest_id) {
            return Err(PreconditionFailure::QuestAlreadyCompleted(quest_id.clone()).into());
        }
        return Err(PreconditionFailure::QuestNotActive(quest_id.clone()).into());
    };

    let required = def.objective.required_count();
    let progress = player
        .active_quests
        .get(index)
        .map_or(0, |q| q.progress);
    if progress < required {
        return Err(PreconditionFailure::QuestIncomplete {
            progress,
            required,
        }
        .into());
    }

    player.active_quests.remove(index);
    player.completed_quests.push(quest_id.clone());
    Ok(def)
}
