//! The recipe and profession registry.
//!
//! A recipe binds a station kind, a profession gate, input token stacks,
//! and an output token. Upgrade recipes are forge recipes whose output is
//! a higher-tier version of one named input; the runtime uses that link
//! to keep an upgraded item in its equipment slot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::{ItemId, Profession, RecipeId, StationKind};

use crate::error::ContentError;

/// Whether a recipe is plain crafting or an in-place upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeKind {
    /// Inputs burned, output minted.
    Craft,
    /// Like craft, but `from` is the item being upgraded: if the player
    /// has it equipped, the minted output replaces it in the same slot.
    Upgrade {
        /// The input token being upgraded.
        from: ItemId,
    },
}

/// A crafting or upgrade recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Registry key.
    pub id: RecipeId,
    /// Station kind the player must stand at.
    pub station: StationKind,
    /// Profession gate.
    pub profession: Profession,
    /// Minimum character level.
    pub min_level: u32,
    /// Input stacks burned from the wallet.
    pub inputs: Vec<(ItemId, u64)>,
    /// Output token minted on success.
    pub output: ItemId,
    /// Output quantity.
    pub output_qty: u64,
    /// Craft vs upgrade.
    pub kind: RecipeKind,
}

/// The read-only recipe registry.
#[derive(Debug, Clone, Default)]
pub struct RecipeRegistry {
    recipes: BTreeMap<RecipeId, RecipeDef>,
}

impl RecipeRegistry {
    /// Build a registry from a list of definitions.
    pub fn from_defs(defs: impl IntoIterator<Item = RecipeDef>) -> Self {
        Self {
            recipes: defs.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// Look up a recipe, if present.
    pub fn get(&self, id: &RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id)
    }

    /// Look up a recipe or fail with [`ContentError::UnknownRecipe`].
    pub fn require(&self, id: &RecipeId) -> Result<&RecipeDef, ContentError> {
        self.recipes
            .get(id)
            .ok_or_else(|| ContentError::UnknownRecipe(id.clone()))
    }

    /// Iterate all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &RecipeDef> {
        self.recipes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bronze_sword_recipe() -> RecipeDef {
        RecipeDef {
            id: RecipeId::from("forge_bronze_sword"),
            station: StationKind::Forge,
            profession: Profession::Blacksmithing,
            min_level: 3,
            inputs: vec![
                (ItemId::from("copper_ore"), 2),
                (ItemId::from("tin_ore"), 1),
            ],
            output: ItemId::from("bronze_sword"),
            output_qty: 1,
            kind: RecipeKind::Craft,
        }
    }

    #[test]
    fn registry_lookup_roundtrip() {
        let registry = RecipeRegistry::from_defs([bronze_sword_recipe()]);
        let id = RecipeId::from("forge_bronze_sword");
        assert_eq!(registry.require(&id).ok().map(|r| r.output.as_str()), Some("bronze_sword"));
    }

    #[test]
    fn unknown_recipe_is_an_error() {
        let registry = RecipeRegistry::default();
        let id = RecipeId::from("nope");
        assert_eq!(
            registry.require(&id),
            Err(ContentError::UnknownRecipe(id))
        );
    }
}
