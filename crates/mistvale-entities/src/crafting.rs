//! Crafting and upgrading: gate validation and ledger plans.
//!
//! A recipe execution is a sequence of burns followed by one mint. The
//! runtime performs the ledger calls; this module validates the gates and
//! produces the [`CraftPlan`] describing exactly which calls to make, so
//! the compensation logic (un-burn already-burned inputs when a later
//! burn fails) can be written once against the plan.

use mistvale_types::{
    ActionError, EquipSlot, ItemId, PlayerState, PreconditionFailure, StationKind,
};

use mistvale_content::items::ItemCatalog;
use mistvale_content::recipes::{RecipeDef, RecipeKind};

use crate::equipment;

/// The ledger calls a recipe execution will make, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftPlan {
    /// Input stacks to burn, in order.
    pub burns: Vec<(ItemId, u64)>,
    /// The output mint.
    pub mint: (ItemId, u64),
}

/// Validate the player-side gates of a recipe at a station.
///
/// Checks the station kind, the profession, and the level gate. Wallet
/// balances are the runtime's concern (they require ledger reads).
pub fn validate_recipe_gates(
    player: &PlayerState,
    recipe: &RecipeDef,
    station: StationKind,
) -> Result<(), ActionError> {
    if station != recipe.station {
        return Err(ActionError::validation(format!(
            "recipe {} requires a {:?}, not a {station:?}",
            recipe.id, recipe.station
        )));
    }
    if !player.professions.contains(&recipe.profession) {
        return Err(PreconditionFailure::MissingProfession(recipe.profession).into());
    }
    if player.level < recipe.min_level {
        return Err(PreconditionFailure::LevelTooLow {
            required: recipe.min_level,
            actual: player.level,
        }
        .into());
    }
    Ok(())
}

/// Build the burn/mint plan for a recipe.
pub fn plan_recipe(recipe: &RecipeDef) -> CraftPlan {
    CraftPlan {
        burns: recipe.inputs.clone(),
        mint: (recipe.output.clone(), recipe.output_qty),
    }
}

/// After a successful upgrade mint: if the upgraded-from item was
/// equipped, replace it in place with the freshly minted output so the
/// player keeps the slot assignment. Returns whether a swap happened.
pub fn re_equip_upgraded(
    player: &mut PlayerState,
    recipe: &RecipeDef,
    items: &ItemCatalog,
) -> Result<bool, ActionError> {
    let RecipeKind::Upgrade { from } = &recipe.kind else {
        return Ok(false);
    };

    let equipped_from = player
        .equipment
        .get(&EquipSlot::Weapon)
        .is_some_and(|item| item.token == *from);
    if !equipped_from {
        return Ok(false);
    }

    let output_def = items
        .require(&recipe.output)
        .map_err(|e| ActionError::internal(e.to_string()))?;
    let _ = equipment::equip_item(player, output_def)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use mistvale_types::{
        Class, EquippedItem, Profession, Quality, Race, RecipeId, StatBlock, WalletAddress,
    };

    use mistvale_content::items::{ItemCategory, ItemDef};

    use super::*;

    fn smith(level: u32) -> PlayerState {
        let mut professions = BTreeSet::new();
        professions.insert(Profession::Blacksmithing);
        PlayerState {
            wallet: WalletAddress::from("0xp"),
            level,
            xp: 0,
            race: Race::Human,
            class: Class::Warrior,
            kills: 0,
            hp: 100,
            max_hp: 100,
            essence: 50,
            max_essence: 50,
            alive: true,
            base_stats: StatBlock::default(),
            professions,
            learned_techniques: BTreeSet::new(),
            active_quests: Vec::new(),
            completed_quests: Vec::new(),
            active_effects: Vec::new(),
            equipment: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            attack_ready_at: 0,
            engaged_target: None,
        }
    }

    fn upgrade_recipe() -> RecipeDef {
        RecipeDef {
            id: RecipeId::from("upgrade_iron_sword"),
            station: StationKind::Forge,
            profession: Profession::Blacksmithing,
            min_level: 5,
            inputs: vec![
                (ItemId::from("bronze_sword"), 1),
                (ItemId::from("iron_ore"), 3),
            ],
            output: ItemId::from("iron_sword"),
            output_qty: 1,
            kind: RecipeKind::Upgrade {
                from: ItemId::from("bronze_sword"),
            },
        }
    }

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_defs([ItemDef {
            id: ItemId::from("iron_sword"),
            name: "Iron Sword".to_owned(),
            category: ItemCategory::Weapon { coef_pct: 125 },
            max_durability: Some(120),
            purchase_price: 0,
            sale_price: 70,
            granted_stats: Some(StatBlock {
                strength: 4,
                ..StatBlock::default()
            }),
            quality: Quality::Uncommon,
        }])
    }

    #[test]
    fn wrong_station_rejected() {
        let player = smith(10);
        let result =
            validate_recipe_gates(&player, &upgrade_recipe(), StationKind::AlchemyLab);
        assert!(matches!(result, Err(ActionError::Validation { .. })));
    }

    #[test]
    fn level_gate_enforced() {
        let player = smith(4);
        let result = validate_recipe_gates(&player, &upgrade_recipe(), StationKind::Forge);
        assert_eq!(
            result,
            Err(ActionError::Precondition(PreconditionFailure::LevelTooLow {
                required: 5,
                actual: 4
            }))
        );
    }

    #[test]
    fn profession_gate_enforced() {
        let mut player = smith(10);
        player.professions.clear();
        let result = validate_recipe_gates(&player, &upgrade_recipe(), StationKind::Forge);
        assert_eq!(
            result,
            Err(ActionError::Precondition(
                PreconditionFailure::MissingProfession(Profession::Blacksmithing)
            ))
        );
    }

    #[test]
    fn plan_lists_burns_then_mint() {
        let plan = plan_recipe(&upgrade_recipe());
        assert_eq!(plan.burns.len(), 2);
        assert_eq!(plan.mint, (ItemId::from("iron_sword"), 1));
    }

    #[test]
    fn upgrade_swaps_equipped_input_in_place() {
        let mut player = smith(10);
        player.equipment.insert(
            EquipSlot::Weapon,
            EquippedItem {
                token: ItemId::from("bronze_sword"),
                durability: 30,
                max_durability: 80,
                broken: false,
                quality: Quality::Common,
                rolled_stats: None,
                enchantments: Vec::new(),
            },
        );

        let swapped = re_equip_upgraded(&mut player, &upgrade_recipe(), &catalog());
        assert_eq!(swapped, Ok(true));
        let weapon = player.equipment.get(&EquipSlot::Weapon);
        assert_eq!(weapon.map(|w| w.token.as_str()), Some("iron_sword"));
    }

    #[test]
    fn upgrade_without_equipped_input_leaves_slot_alone() {
        let mut player = smith(10);
        let swapped = re_equip_upgraded(&mut player, &upgrade_recipe(), &catalog());
        assert_eq!(swapped, Ok(false));
        assert!(player.equipment.is_empty());
    }
}
