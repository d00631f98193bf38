//! The dispatcher surface: action payloads, envelopes, and outcomes.
//!
//! A client request arrives at the edge already authenticated; the edge
//! wraps it into an [`ActionEnvelope`] carrying the pre-verified wallet
//! identity and the target zone, and the dispatcher routes it to the
//! owning zone runtime. Every action produces either an [`ActionOutcome`]
//! or a typed [`ActionError`].
//!
//! [`ActionError`]: crate::error::ActionError

use serde::{Deserialize, Serialize};

use crate::enums::EquipSlot;
use crate::geometry::Position;
use crate::ids::{ActionId, EntityId, ItemId, QuestId, RecipeId, TechniqueId, WalletAddress, ZoneId};

/// A zone-local action payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum Action {
    /// Move to a tile within the zone.
    Move {
        /// Destination x.
        x: i32,
        /// Destination y.
        y: i32,
    },
    /// Begin (or refresh) an auto-attack engagement against a target.
    Attack {
        /// Target entity.
        target: EntityId,
    },
    /// Cast a learned technique.
    CastTechnique {
        /// Technique id from the catalog.
        technique: TechniqueId,
        /// Target, required for single-target techniques.
        target: Option<EntityId>,
    },
    /// Gather an ore node.
    GatherOre {
        /// The node entity.
        node: EntityId,
    },
    /// Gather a flower node.
    GatherFlower {
        /// The node entity.
        node: EntityId,
    },
    /// Execute a crafting recipe at a station.
    Craft {
        /// The station entity.
        station: EntityId,
        /// Recipe to execute.
        recipe: RecipeId,
    },
    /// Upgrade an input item to its higher-tier version at a forge.
    Upgrade {
        /// The forge entity.
        forge: EntityId,
        /// Upgrade recipe to execute.
        recipe: RecipeId,
    },
    /// Apply an enchantment catalyst to an equipped item.
    ApplyEnchant {
        /// The enchanting altar entity.
        altar: EntityId,
        /// The catalyst token to burn.
        catalyst: ItemId,
        /// Which equipped slot receives the enchantment.
        slot: EquipSlot,
    },
    /// Equip an owned item token.
    Equip {
        /// The token to equip.
        token: ItemId,
    },
    /// Unequip a slot.
    Unequip {
        /// The slot to clear.
        slot: EquipSlot,
    },
    /// Accept a quest from a nearby NPC.
    AcceptQuest {
        /// The offering NPC.
        npc: EntityId,
        /// The quest to accept.
        quest: QuestId,
    },
    /// Turn in a fulfilled quest at its NPC.
    TurnInQuest {
        /// The accepting NPC.
        npc: EntityId,
        /// The quest to turn in.
        quest: QuestId,
    },
    /// Visit an NPC to advance talk quests (auto-accept + complete).
    TalkQuest {
        /// The visited NPC.
        npc: EntityId,
    },
    /// Buy from a merchant: currency burned, item minted.
    Buy {
        /// The merchant NPC.
        merchant: EntityId,
        /// The token to buy.
        token: ItemId,
        /// Quantity.
        quantity: u64,
    },
    /// Sell to a merchant: item burned, currency minted.
    Sell {
        /// The merchant NPC.
        merchant: EntityId,
        /// The token to sell.
        token: ItemId,
        /// Quantity.
        quantity: u64,
    },
    /// Learn a technique from a trainer.
    LearnTechnique {
        /// The trainer NPC.
        trainer: EntityId,
        /// The technique to learn.
        technique: TechniqueId,
    },
    /// Learn a profession from a profession trainer.
    LearnProfession {
        /// The profession trainer NPC.
        trainer: EntityId,
        /// The profession to learn.
        profession: crate::enums::Profession,
    },
}

impl Action {
    /// Short verb name for logging.
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::CastTechnique { .. } => "cast_technique",
            Self::GatherOre { .. } => "gather_ore",
            Self::GatherFlower { .. } => "gather_flower",
            Self::Craft { .. } => "craft",
            Self::Upgrade { .. } => "upgrade",
            Self::ApplyEnchant { .. } => "apply_enchant",
            Self::Equip { .. } => "equip",
            Self::Unequip { .. } => "unequip",
            Self::AcceptQuest { .. } => "accept_quest",
            Self::TurnInQuest { .. } => "turn_in_quest",
            Self::TalkQuest { .. } => "talk_quest",
            Self::Buy { .. } => "buy",
            Self::Sell { .. } => "sell",
            Self::LearnTechnique { .. } => "learn_technique",
            Self::LearnProfession { .. } => "learn_profession",
        }
    }
}

/// A routed, authenticated action request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Unique id for duplicate suppression within a tick.
    pub action_id: ActionId,
    /// Pre-verified wallet identity from the request context. `None` for
    /// server-issued actions.
    pub wallet: Option<WalletAddress>,
    /// The zone the acting entity is expected to be in.
    pub zone: ZoneId,
    /// The acting entity.
    pub entity: EntityId,
    /// The action payload.
    pub action: Action,
}

impl ActionEnvelope {
    /// Build an envelope with a fresh action id.
    pub fn new(
        wallet: Option<WalletAddress>,
        zone: ZoneId,
        entity: EntityId,
        action: Action,
    ) -> Self {
        Self {
            action_id: ActionId::new(),
            wallet,
            zone,
            entity,
            action,
        }
    }
}

/// Success payload of a zone-local action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The entity moved.
    Moved {
        /// New position.
        pos: Position,
    },
    /// An attack engagement opened (and possibly an immediate swing).
    Engaged {
        /// The engaged target.
        target: EntityId,
        /// Damage dealt by an immediate swing, if one fired.
        damage: Option<u32>,
        /// Whether the swing killed the target.
        killed: bool,
    },
    /// A technique resolved.
    TechniqueCast {
        /// The technique cast.
        technique: TechniqueId,
        /// Entities affected.
        affected: Vec<EntityId>,
    },
    /// A gather succeeded and its mint was confirmed.
    Gathered {
        /// The minted token.
        item: ItemId,
        /// Charges left on the node after this gather.
        node_charges_left: u32,
        /// Tool durability after this gather.
        tool_durability: u32,
    },
    /// A craft succeeded.
    Crafted {
        /// The minted output token.
        output: ItemId,
    },
    /// An upgrade succeeded.
    Upgraded {
        /// The minted higher-tier token.
        output: ItemId,
        /// Whether the upgraded item was re-equipped in place.
        re_equipped: bool,
    },
    /// An enchantment was applied.
    Enchanted {
        /// The slot that received the enchantment.
        slot: EquipSlot,
    },
    /// An item was equipped.
    Equipped {
        /// The populated slot.
        slot: EquipSlot,
    },
    /// A slot was cleared.
    Unequipped {
        /// The cleared slot.
        slot: EquipSlot,
    },
    /// A quest was accepted.
    QuestAccepted {
        /// The accepted quest.
        quest: QuestId,
    },
    /// A quest was turned in.
    QuestTurnedIn {
        /// The completed quest.
        quest: QuestId,
        /// XP granted.
        xp: u64,
        /// Currency granted.
        currency: u64,
    },
    /// A talk visit resolved.
    Talked {
        /// Quests completed by this visit.
        completed: Vec<QuestId>,
    },
    /// A purchase settled.
    Bought {
        /// Token bought.
        token: ItemId,
        /// Quantity bought.
        quantity: u64,
        /// Currency spent.
        cost: u64,
    },
    /// A sale settled.
    Sold {
        /// Token sold.
        token: ItemId,
        /// Quantity sold.
        quantity: u64,
        /// Currency received.
        proceeds: u64,
    },
    /// A technique was learned.
    TechniqueLearned {
        /// The learned technique.
        technique: TechniqueId,
    },
    /// A profession was learned.
    ProfessionLearned {
        /// The learned profession.
        profession: crate::enums::Profession,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_gets_fresh_action_id() {
        let a = ActionEnvelope::new(
            None,
            ZoneId::from("z1"),
            EntityId::new(),
            Action::Move { x: 1, y: 2 },
        );
        let b = ActionEnvelope::new(
            None,
            ZoneId::from("z1"),
            EntityId::new(),
            Action::Move { x: 1, y: 2 },
        );
        assert_ne!(a.action_id, b.action_id);
    }

    #[test]
    fn action_verb_names_are_stable() {
        assert_eq!(Action::Move { x: 0, y: 0 }.verb(), "move");
        assert_eq!(
            Action::GatherOre {
                node: EntityId::new()
            }
            .verb(),
            "gather_ore"
        );
    }

    #[test]
    fn action_serde_roundtrip() {
        let action = Action::CastTechnique {
            technique: TechniqueId::from("ember_bolt"),
            target: Some(EntityId::new()),
        };
        let json = serde_json::to_string(&action).ok();
        assert!(json.is_some());
        let back: Result<Action, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(action));
    }
}
