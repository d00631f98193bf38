//! The action error taxonomy.
//!
//! Every dispatch path produces either a success value or one of these
//! typed errors; nothing is thrown across the tick boundary. The edge
//! layer maps the variants to structured client codes — the core only
//! supplies an optional detail string for debugging.

use crate::enums::Profession;
use crate::ids::{EntityId, ItemId, QuestId, TechniqueId};

/// Why a precondition gate rejected an action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionFailure {
    /// Source and target are farther apart than the action allows.
    #[error("out of range: required {required}, actual {actual:.1}")]
    OutOfRange {
        /// Maximum allowed distance for this action.
        required: f64,
        /// Measured distance.
        actual: f64,
    },

    /// The acting or target entity does not meet a level requirement.
    #[error("level too low: requires {required}, have {actual}")]
    LevelTooLow {
        /// Required level.
        required: u32,
        /// Actual level.
        actual: u32,
    },

    /// A party member does not meet the gate's level requirement.
    #[error("party member {member} below required level {required}")]
    MemberLevelTooLow {
        /// The offending member.
        member: EntityId,
        /// Required level.
        required: u32,
    },

    /// A prerequisite quest has not been completed.
    #[error("missing prerequisite quest {quest}")]
    MissingPrerequisite {
        /// The unmet prerequisite.
        quest: QuestId,
    },

    /// The technique or attack is still cooling down.
    #[error("cooldown active until tick {ready_at}")]
    CooldownActive {
        /// Tick at which the action becomes available.
        ready_at: u64,
    },

    /// Not enough essence to cast.
    #[error("insufficient essence: requires {required}, have {available}")]
    InsufficientEssence {
        /// Essence cost.
        required: u32,
        /// Current essence.
        available: u32,
    },

    /// The equipped tool is broken.
    #[error("tool is broken")]
    ToolBroken,

    /// No tool is equipped in the weapon slot.
    #[error("no tool equipped")]
    NoToolEquipped,

    /// The equipped tool's tier is below the node's tier.
    #[error("tool tier {actual} below node tier {required}")]
    ToolTierTooLow {
        /// Node tier.
        required: u8,
        /// Tool tier.
        actual: u8,
    },

    /// The node has no charges left.
    #[error("node is depleted")]
    NodeDepleted,

    /// The player has not learned the required profession.
    #[error("missing profession: {0}")]
    MissingProfession(Profession),

    /// The player has not learned the technique.
    #[error("technique not learned: {0}")]
    TechniqueNotLearned(TechniqueId),

    /// The target of a combat action is already dead.
    #[error("target is dead")]
    TargetDead,

    /// The acting entity is dead.
    #[error("actor is dead")]
    ActorDead,

    /// The wallet does not hold enough of a token.
    #[error("insufficient balance of {item}: requires {required}, have {available}")]
    InsufficientBalance {
        /// The token in question.
        item: ItemId,
        /// Required quantity.
        required: u64,
        /// Held quantity.
        available: u64,
    },

    /// The wallet does not hold the dungeon key for the gate's rank.
    #[error("missing gate key {item}")]
    MissingGateKey {
        /// The key token for the gate rank.
        item: ItemId,
    },

    /// The quest was already completed.
    #[error("quest already completed: {0}")]
    QuestAlreadyCompleted(QuestId),

    /// The quest is not active on the player.
    #[error("quest not active: {0}")]
    QuestNotActive(QuestId),

    /// The quest objective is not yet fulfilled.
    #[error("quest objective incomplete: {progress}/{required}")]
    QuestIncomplete {
        /// Current progress.
        progress: u32,
        /// Required count.
        required: u32,
    },

    /// The NPC does not offer or accept this quest.
    #[error("quest {quest} is not handled by this npc")]
    QuestNotOfferedHere {
        /// The quest in question.
        quest: QuestId,
    },

    /// The destination tile cannot be walked onto.
    #[error("destination tile is not walkable")]
    NotWalkable,

    /// The requester must be in a party for this action.
    #[error("not in a party")]
    NotInParty,
}

/// Typed error for every action path (spec error taxonomy).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    /// Malformed request, unknown id, out of bounds. No mutation occurred.
    #[error("validation failed: {detail}")]
    Validation {
        /// What was malformed or missing.
        detail: String,
    },

    /// The request wallet does not own the acting entity.
    #[error("authorization failed: {detail}")]
    Authorization {
        /// Which check failed.
        detail: String,
    },

    /// A range, level, cooldown, prerequisite, proficiency, durability,
    /// depletion, or quest-state gate rejected the action.
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionFailure),

    /// The action conflicts with existing state (already in party, gate
    /// already open, quest already active, duplicate action id, …).
    #[error("conflict: {detail}")]
    Conflict {
        /// What conflicted.
        detail: String,
    },

    /// An external ledger call timed out or returned a retryable status.
    /// Local compensation has been applied.
    #[error("ledger transient failure: {detail}")]
    LedgerTransient {
        /// Adapter-reported detail.
        detail: String,
    },

    /// An external ledger call was rejected outright. Local compensation
    /// has been applied; retrying will not help.
    #[error("ledger permanent failure: {detail}")]
    LedgerPermanent {
        /// Adapter-reported detail.
        detail: String,
    },

    /// An invariant was violated mid-operation. Logged; no auto-recovery.
    #[error("internal error: {detail}")]
    Internal {
        /// Diagnostic detail.
        detail: String,
    },
}

impl ActionError {
    /// Shorthand for a validation error.
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation {
            detail: detail.into(),
        }
    }

    /// Shorthand for an authorization error.
    pub fn authorization(detail: impl Into<String>) -> Self {
        Self::Authorization {
            detail: detail.into(),
        }
    }

    /// Shorthand for a conflict error.
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict {
            detail: detail.into(),
        }
    }

    /// Shorthand for an internal error.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_converts_into_action_error() {
        let err: ActionError = PreconditionFailure::ToolBroken.into();
        assert!(matches!(err, ActionError::Precondition(_)));
    }

    #[test]
    fn messages_carry_detail() {
        let err = ActionError::validation("unknown entity");
        assert_eq!(err.to_string(), "validation failed: unknown entity");

        let err = PreconditionFailure::LevelTooLow {
            required: 5,
            actual: 4,
        };
        assert_eq!(err.to_string(), "level too low: requires 5, have 4");
    }
}
