//! Enchantment application.
//!
//! Enchanting burns a catalyst token and appends an enchantment record to
//! an equipped item on the live entity. The record is in-memory player
//! state — the character store decides whether it survives logout.

use mistvale_types::{ActionError, Enchantment, EquipSlot, PlayerState, Profession, PreconditionFailure};

use mistvale_content::items::{ItemCategory, ItemDef};

/// Validate the player-side gates of an enchant and describe the record
/// that would be appended.
///
/// Checks the enchanting profession, that the catalyst really is a
/// catalyst, and that the slot holds a non-broken item.
pub fn validate_enchant(
    player: &PlayerState,
    catalyst: &ItemDef,
    slot: EquipSlot,
) -> Result<Enchantment, ActionError> {
    if !player.professions.contains(&Profession::Enchanting) {
        return Err(PreconditionFailure::MissingProfession(Profession::Enchanting).into());
    }

    let ItemCategory::Catalyst { stat, amount } = &catalyst.category else {
        return Err(ActionError::validation(format!(
            "item {} is not an enchantment catalyst",
            catalyst.id
        )));
    };

    let Some(target) = player.equipment.get(&slot) else {
        return Err(ActionError::validation(format!("slot {slot:?} is empty")));
    };
    if target.broken {
        return Err(PreconditionFailure::ToolBroken.into());
    }

    Ok(Enchantment {
        catalyst: catalyst.id.clone(),
        stat: *stat,
        amount: *amount,
    })
}

/// Append the enchantment to the equipped item. Effective stats are
/// derived on read, so no recompute step is needed here.
pub fn apply_enchant(
    player: &mut PlayerState,
    slot: EquipSlot,
    enchantment: Enchantment,
) -> Result<(), ActionError> {
    let Some(target) = player.equipment.get_mut(&slot) else {
        return Err(ActionError::internal(
            "enchant target vanished between validate and apply",
        ));
    };
    target.enchantments.push(enchantment);
    Ok(())
}
