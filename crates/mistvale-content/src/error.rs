//! Error types for the mistvale-content crate.

use mistvale_types::{ItemId, MobTemplateId, QuestId, RecipeId, TechniqueId, ZoneId};

/// Errors raised by catalog lookups and catalog validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The item id is not in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// The recipe id is not in the registry.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(RecipeId),

    /// The quest id is not in the catalog.
    #[error("unknown quest: {0}")]
    UnknownQuest(QuestId),

    /// The technique id is not in the catalog.
    #[error("unknown technique: {0}")]
    UnknownTechnique(TechniqueId),

    /// The zone id has no definition.
    #[error("unknown zone: {0}")]
    UnknownZone(ZoneId),

    /// The mob template id has no definition.
    #[error("unknown mob template: {0}")]
    UnknownMobTemplate(MobTemplateId),

    /// A quest prerequisite chain loops back on itself.
    #[error("quest prerequisite cycle through {0}")]
    QuestCycle(QuestId),

    /// A catalog cross-reference points at a missing entry.
    #[error("dangling reference: {detail}")]
    DanglingReference {
        /// What referenced what.
        detail: String,
    },
}
