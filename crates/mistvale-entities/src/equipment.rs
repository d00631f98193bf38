//! Equip and unequip operations.
//!
//! Equipping materializes an [`EquippedItem`] record from the catalog
//! definition; the ledger balance check happens in the runtime before
//! this runs (the token stays on the ledger — equipment records are the
//! server's view of which owned token sits in which slot).

use mistvale_types::{ActionError, EquipSlot, EquippedItem, PlayerState};

use mistvale_content::items::ItemDef;

/// Equip `def` on the player, returning the slot it landed in and the
/// record it displaced, if any.
///
/// # Errors
///
/// Returns a validation error if the item is not equippable.
pub fn equip_item(
    player: &mut PlayerState,
    def: &ItemDef,
) -> Result<(EquipSlot, Option<EquippedItem>), ActionError> {
    let Some(slot) = def.equip_slot() else {
        return Err(ActionError::validation(format!(
            "item {} is not equippable",
            def.id
        )));
    };

    let max_durability = def.max_durability.unwrap_or(0);
    let record = EquippedItem {
        token: def.id.clone(),
        durability: max_durability,
        max_durability,
        broken: false,
        quality: def.quality,
        rolled_stats: def.granted_stats,
        enchantments: Vec::new(),
    };

    let displaced = player.equipment.insert(slot, record);
    Ok((slot, displaced))
}

/// Clear a slot, returning the removed record.
///
/// # Errors
///
/// Returns a validation error if the slot is empty.
pub fn unequip_slot(
    player: &mut PlayerState,
    slot: EquipSlot,
) -> Result<EquippedItem, ActionError> {
    player
        .equipment
        .remove(&slot)
        .ok_or_else(|| ActionError::validation(format!("slot {slot:?} is empty")))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use mistvale_types::{
        Class, ItemId, Quality, Race, StatBlock, WalletAddress,
    };

    use mistvale_content::items::ItemCategory;

    use super::*;

    fn player() -> PlayerState {
        PlayerState {
            wallet: WalletAddress::from("0xp"),
            level: 1,
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
            professions: BTreeSet::new(),
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

    fn sword() -> ItemDef {
        ItemDef {
            id: ItemId::from("bronze_sword"),
            name: "Bronze Sword".to_owned(),
            category: ItemCategory::Weapon { coef_pct: 110 },
            max_durability: Some(80),
            purchase_price: 120,
            sale_price: 30,
            granted_stats: Some(StatBlock {
                strength: 2,
                ..StatBlock::default()
            }),
            quality: Quality::Common,
        }
    }

    fn ore() -> ItemDef {
        ItemDef {
            id: ItemId::from("coal_ore"),
            name: "Coal Ore".to_owned(),
            category: ItemCategory::Resource,
            max_durability: None,
            purchase_price: 0,
            sale_price: 6,
            granted_stats: None,
            quality: Quality::Common,
        }
    }

    #[test]
    fn equip_fills_the_slot_at_full_durability() {
        let mut p = player();
        let result = equip_item(&mut p, &sword());
        assert_eq!(result.as_ref().map(|(slot, _)| *slot), Ok(EquipSlot::Weapon));
        let record = p.equipment.get(&EquipSlot::Weapon);
        assert_eq!(record.map(|r| (r.durability, r.broken)), Some((80, false)));
    }

    #[test]
    fn equip_displaces_the_previous_item() {
        let mut p = player();
        let _ = equip_item(&mut p, &sword());
        let result = equip_item(&mut p, &sword());
        let displaced = result.ok().and_then(|(_, displaced)| displaced);
        assert_eq!(displaced.map(|d| d.token), Some(ItemId::from("bronze_sword")));
    }

    #[test]
    fn non_equippable_items_rejected() {
        let mut p = player();
        assert!(matches!(
            equip_item(&mut p, &ore()),
            Err(ActionError::Validation { .. })
        ));
    }

    #[test]
    fn unequip_empty_slot_rejected() {
        let mut p = player();
        assert!(matches!(
            unequip_slot(&mut p, EquipSlot::Helm),
            Err(ActionError::Validation { .. })
        ));
    }

    #[test]
    fn unequip_returns_the_record() {
        let mut p = player();
        let _ = equip_item(&mut p, &sword());
        let removed = unequip_slot(&mut p, EquipSlot::Weapon);
        assert_eq!(removed.map(|r| r.token), Ok(ItemId::from("bronze_sword")));
        assert!(p.equipment.is_empty());
    }
}
