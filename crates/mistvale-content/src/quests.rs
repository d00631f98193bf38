//! The quest catalog: static definitions and the prerequisite chain.
//!
//! Quests form a DAG where each quest has zero or one prerequisite.
//! Catalog construction validates the chain (no cycles, no dangling
//! prerequisite ids) so runtime checks reduce to set membership.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::{ItemId, QuestId};

use crate::error::ContentError;

/// What the player must do to fulfill a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "objective", rename_all = "snake_case")]
pub enum QuestObjective {
    /// Kill `count` mobs whose display name matches `target_mob_name`.
    Kill {
        /// Mob display name to match on each kill.
        target_mob_name: String,
        /// Required kill count.
        count: u32,
    },
    /// Visit the NPC whose display name matches `target_npc_name`.
    Talk {
        /// NPC display name to visit.
        target_npc_name: String,
    },
}

impl QuestObjective {
    /// The progress count that marks the objective fulfilled.
    pub const fn required_count(&self) -> u32 {
        match self {
            Self::Kill { count, .. } => *count,
            Self::Talk { .. } => 1,
        }
    }
}

/// A static quest definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDef {
    /// Catalog key.
    pub id: QuestId,
    /// Display name.
    pub name: String,
    /// Display name of the NPC that offers this quest. For talk chains
    /// this is the first NPC in the chain.
    pub giver_npc: String,
    /// Display name of the NPC that accepts the turn-in.
    pub turn_in_npc: String,
    /// The objective.
    pub objective: QuestObjective,
    /// Prerequisite quest, if any (each quest has zero or one).
    pub prerequisite: Option<QuestId>,
    /// XP granted on turn-in.
    pub reward_xp: u64,
    /// Currency minted on turn-in.
    pub reward_currency: u64,
    /// Item stacks minted on turn-in.
    pub reward_items: Vec<(ItemId, u64)>,
}

/// The read-only quest catalog.
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: BTreeMap<QuestId, QuestDef>,
}

impl QuestCatalog {
    /// Build and validate a catalog from a list of definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::DanglingReference`] if a prerequisite id
    /// is not itself cataloged, or [`ContentError::QuestCycle`] if the
    /// prerequisite chain loops.
    pub fn from_defs(defs: impl IntoIterator<Item = QuestDef>) -> Result<Self, ContentError> {
        let quests: BTreeMap<QuestId, QuestDef> =
            defs.into_iter().map(|d| (d.id.clone(), d)).collect();

        for def in quests.values() {
            if let Some(prereq) = &def.prerequisite
                && !quests.contains_key(prereq)
            {
                return Err(ContentError::DanglingReference {
                    detail: format!("quest {} requires unknown quest {prereq}", def.id),
                });
            }
        }

        // Walk each chain; a chain longer than the catalog must loop.
        for def in quests.values() {
            let mut hops = 0_usize;
            let mut cursor = def.prerequisite.as_ref();
            while let Some(prereq) = cursor {
                hops = hops.saturating_add(1);
                if hops > quests.len() {
                    return Err(ContentError::QuestCycle(def.id.clone()));
                }
                cursor = quests.get(prereq).and_then(|q| q.prerequisite.as_ref());
            }
        }

        Ok(Self { quests })
    }

    /// Look up a quest, if present.
    pub fn get(&self, id: &QuestId) -> Option<&QuestDef> {
        self.quests.get(id)
    }

    /// Look up a quest or fail with [`ContentError::UnknownQuest`].
    pub fn require(&self, id: &QuestId) -> Result<&QuestDef, ContentError> {
        self.quests
            .get(id)
            .ok_or_else(|| ContentError::UnknownQuest(id.clone()))
    }

    /// Quests offered by the NPC with the given display name.
    pub fn offered_by<'a>(&'a self, npc_name: &'a str) -> impl Iterator<Item = &'a QuestDef> {
        self.quests.values().filter(move |q| q.giver_npc == npc_name)
    }

    /// Talk quests whose target NPC has the given display name.
    pub fn talk_targets<'a>(&'a self, npc_name: &'a str) -> impl Iterator<Item = &'a QuestDef> {
        self.quests.values().filter(move |q| {
            matches!(&q.objective, QuestObjective::Talk { target_npc_name } if target_npc_name == npc_name)
        })
    }

    /// Whether the prerequisite of `quest` (if any) appears in
    /// `completed`. Returns the unmet prerequisite on failure.
    pub fn prerequisite_met(
        &self,
        quest: &QuestDef,
        completed: &[QuestId],
    ) -> Result<(), QuestId> {
        match &quest.prerequisite {
            Some(prereq) if !completed.contains(prereq) => Err(prereq.clone()),
            _ => Ok(()),
        }
    }

    /// Iterate all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &QuestDef> {
        self.quests.values()
    }
}
