//! Gathering: validation, optimistic reservation, and compensation.
//!
//! The gather contract is reserve-then-mint: the runtime consumes a node
//! charge and a point of tool durability *before* calling the ledger,
//! releases the zone lock for the call, and — if the mint fails — applies
//! [`compensate_gather`] to restore both. A successful gather therefore
//! has exactly one matching mint, and an unsuccessful one leaves node and
//! tool untouched.

use mistvale_types::{
    ActionError, EquipSlot, ItemId, NodeState, PlayerState, PreconditionFailure,
};

use mistvale_content::items::ItemCatalog;

/// The state consumed by an optimistic gather reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherReservation {
    /// The token to mint.
    pub yield_item: ItemId,
    /// Node charges after the reservation.
    pub charges_after: u32,
    /// Tool durability after the reservation.
    pub durability_after: u32,
    /// Whether this reservation depleted the node.
    pub node_newly_depleted: bool,
    /// Whether this reservation broke the tool.
    pub tool_newly_broken: bool,
}

/// Check every gather precondition without mutating anything.
///
/// Order: profession → tool equipped → tool matches node kind and tier →
/// tool not broken → node not depleted. Proximity is checked by the
/// common pipeline before this runs.
pub fn validate_gather(
    player: &PlayerState,
    node: &NodeState,
    items: &ItemCatalog,
) -> Result<(), ActionError> {
    let profession = node.kind.profession();
    if !player.professions.contains(&profession) {
        return Err(PreconditionFailure::MissingProfession(profession).into());
    }

    let Some(tool) = player.equipment.get(&EquipSlot::Weapon) else {
        return Err(PreconditionFailure::NoToolEquipped.into());
    };

    let def = items
        .require(&tool.token)
        .map_err(|e| ActionError::internal(e.to_string()))?;
    let Some(tier) = def.tool_tier(node.kind) else {
        return Err(PreconditionFailure::NoToolEquipped.into());
    };
    if tier < node.tier {
        return Err(PreconditionFailure::ToolTierTooLow {
            required: node.tier,
            actual: tier,
        }
        .into());
    }

    if tool.broken {
        return Err(PreconditionFailure::ToolBroken.into());
    }
    if node.is_depleted() {
        return Err(PreconditionFailure::NodeDepleted.into());
    }

    Ok(())
}

/// Consume one node charge and one point of tool durability.
///
/// Call only after [`validate_gather`] passed; re-checks the cheap
/// invariants and fails internal if they no longer hold.
pub fn reserve_gather(
    player: &mut PlayerState,
    node: &mut NodeState,
    tick: u64,
) -> Result<GatherReservation, ActionError> {
    if node.charges == 0 {
        return Err(PreconditionFailure::NodeDepleted.into());
    }
    let Some(tool) = player.equipment.get_mut(&EquipSlot::Weapon) else {
        return Err(ActionError::internal("tool vanished between validate and reserve"));
    };
    if tool.durability == 0 {
        return Err(PreconditionFailure::ToolBroken.into());
    }

    node.charges = node.charges.saturating_sub(1);
    let node_newly_depleted = node.charges == 0;
    if node_newly_depleted {
        node.depleted_at_tick = Some(tick);
    }

    tool.durability = tool.durability.saturating_sub(1);
    let tool_newly_broken = tool.durability == 0;
    if tool_newly_broken {
        tool.broken = true;
    }

    Ok(GatherReservation {
        yield_item: node.yield_item.clone(),
        charges_after: node.charges,
        durability_after: tool.durability,
        node_newly_depleted,
        tool_newly_broken,
    })
}

/// Undo a reservation after a failed mint: restore the node charge and
/// the tool durability, clearing depletion and breakage the reservation
/// introduced.
pub fn compensate_gather(
    player: &mut PlayerState,
    node: &mut NodeState,
    reservation: &GatherReservation,
) {
    compensate_node(node, reservation);

    if let Some(tool) = player.equipment.get_mut(&EquipSlot::Weapon) {
        tool.durability = tool.durability.saturating_add(1).min(tool.max_durability);
        if reservation.tool_newly_broken {
            tool.broken = false;
        }
    }
}

/// The node half of the compensation, for when the gatherer has since
/// left the zone: the charge is restored either way.
pub fn compensate_node(node: &mut NodeState, reservation: &GatherReservation) {
    node.charges = node.charges.saturating_add(1).min(node.max_charges);
    if reservation.node_newly_depleted {
        node.depleted_at_tick = None;
    }
}
