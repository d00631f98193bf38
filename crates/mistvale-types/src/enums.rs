//! Closed vocabularies shared across the world server.

use serde::{Deserialize, Serialize};

/// Equipment slots a player entity can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    /// Main-hand weapon or gathering tool.
    Weapon,
    /// Chest armor.
    Chest,
    /// Leg armor.
    Legs,
    /// Boots.
    Boots,
    /// Helm.
    Helm,
    /// Shoulder armor.
    Shoulders,
    /// Gloves.
    Gloves,
    /// Belt.
    Belt,
    /// Ring.
    Ring,
    /// Amulet.
    Amulet,
}

impl EquipSlot {
    /// All slots, in display order.
    pub const ALL: [Self; 10] = [
        Self::Weapon,
        Self::Chest,
        Self::Legs,
        Self::Boots,
        Self::Helm,
        Self::Shoulders,
        Self::Gloves,
        Self::Belt,
        Self::Ring,
        Self::Amulet,
    ];
}

/// Item quality grade. Affects rolled stats at mint time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Baseline quality.
    Common,
    /// Slightly above baseline.
    Uncommon,
    /// Noticeably above baseline.
    Rare,
    /// Top-tier crafted or dropped gear.
    Epic,
}

/// Dungeon gate rank, weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GateRank {
    /// Entry-level gate.
    E,
    /// Rank D.
    D,
    /// Rank C.
    C,
    /// Rank B.
    B,
    /// Rank A.
    A,
    /// The strongest gates.
    S,
}

impl core::fmt::Display for GateRank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::E => "E",
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::S => "S",
        };
        write!(f, "{s}")
    }
}

/// Professions a player can learn. Gathering and crafting actions are
/// gated on the matching profession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profession {
    /// Ore gathering.
    Mining,
    /// Flower gathering.
    Herbalism,
    /// Forging and upgrading at a forge.
    Blacksmithing,
    /// Brewing at an alchemy lab.
    Alchemy,
    /// Applying enchantments at an enchanting altar.
    Enchanting,
}

impl core::fmt::Display for Profession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Mining => "mining",
            Self::Herbalism => "herbalism",
            Self::Blacksmithing => "blacksmithing",
            Self::Alchemy => "alchemy",
            Self::Enchanting => "enchanting",
        };
        write!(f, "{s}")
    }
}

/// The function an NPC serves in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcRole {
    /// Buys and sells catalog items.
    Merchant,
    /// Teaches combat techniques.
    Trainer,
    /// Teaches professions.
    ProfessionTrainer,
    /// Offers and accepts quests.
    QuestGiver,
    /// Runs the auction house (surface out of scope; the NPC exists).
    Auctioneer,
}

/// Crafting station kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    /// Forging and upgrading.
    Forge,
    /// Potion brewing.
    AlchemyLab,
    /// Enchantment application.
    EnchantingAltar,
}

/// Resource node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Mined with a pickaxe; gated on [`Profession::Mining`].
    Ore,
    /// Picked with a sickle; gated on [`Profession::Herbalism`].
    Flower,
}

impl NodeKind {
    /// The profession required to gather this node kind.
    pub const fn profession(self) -> Profession {
        match self {
            Self::Ore => Profession::Mining,
            Self::Flower => Profession::Herbalism,
        }
    }
}

/// Playable races. Each applies a flat stat modifier on top of the class
/// base block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    /// Balanced modifiers.
    Human,
    /// Agility and intellect leaning.
    Elf,
    /// Strength and defense leaning.
    Dwarf,
    /// Raw strength leaning.
    Orc,
}

/// Playable classes. Each defines the level-1 base stat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    /// Melee frontline.
    Warrior,
    /// Essence-heavy caster.
    Mage,
    /// Agile skirmisher.
    Ranger,
    /// Faith-based support.
    Cleric,
}

/// The eight primary stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Physical power; scales outgoing damage.
    Strength,
    /// Damage mitigation.
    Defense,
    /// Health pool contribution.
    Hp,
    /// Agility.
    Agility,
    /// Intellect.
    Intellect,
    /// Essence pool contribution.
    Mp,
    /// Faith.
    Faith,
    /// Luck; nudges loot rolls.
    Luck,
}

/// Technique target discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Applies to the caster only; no target id expected.
    Caster,
    /// Requires exactly one target entity.
    Single,
    /// Applies to every combat entity within a radius of the caster.
    Aoe,
}

/// Category of an active effect on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Positive stat or damage modifier.
    Buff,
    /// Negative stat or damage modifier.
    Debuff,
    /// Periodic damage.
    DamageOverTime,
    /// Periodic healing.
    RegenOverTime,
}
