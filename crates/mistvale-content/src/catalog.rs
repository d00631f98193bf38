//! The aggregate content catalog and the shipped Mistvale world.
//!
//! [`ContentCatalog`] bundles every static registry behind one handle;
//! the world manager shares it behind an `Arc` and nothing mutates it
//! after boot. [`ContentCatalog::default_world`] builds the shipped
//! content: two overworld zones, the starter quest chain, the tool and
//! weapon lines, and the full dungeon rank table.

use mistvale_types::{
    Bounds, Class, EquipSlot, GateRank, ItemId, MobTemplateId, NodeKind, NpcRole, Position,
    Profession, Quality, QuestId, Race, RecipeId, StatBlock, StatKind, StationKind, TargetKind,
    TechniqueId, ZoneId,
};

use crate::error::ContentError;
use crate::items::{ItemCatalog, ItemCategory, ItemDef};
use crate::loot::{LootCatalog, LootDrop, LootTable};
use crate::progression;
use crate::quests::{QuestCatalog, QuestDef, QuestObjective};
use crate::recipes::{RecipeDef, RecipeKind, RecipeRegistry};
use crate::techniques::{TechniqueCatalog, TechniqueDef, TechniqueEffect};
use crate::zones::{
    GateSpawn, MobSpawn, MobTemplate, NodeSpawn, NpcSpawn, PortalSpawn, RankScaling, StationSpawn,
    ZoneDef, ZoneRegistry,
};

/// Every static registry behind one read-only handle.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    /// Item metadata.
    pub items: ItemCatalog,
    /// Crafting and upgrade recipes.
    pub recipes: RecipeRegistry,
    /// Loot tables keyed by mob template.
    pub loot: LootCatalog,
    /// Quest definitions and prerequisite chain.
    pub quests: QuestCatalog,
    /// Technique definitions.
    pub techniques: TechniqueCatalog,
    /// Zone definitions, mob templates, and the dungeon rank table.
    pub zones: ZoneRegistry,
}

impl ContentCatalog {
    /// The zone new characters spawn into.
    pub fn starter_zone() -> ZoneId {
        ZoneId::from("starter-vale")
    }

    /// Build the shipped Mistvale world content.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if any cross-reference is broken — which
    /// would be a content bug caught at boot, not at play time.
    pub fn default_world() -> Result<Self, ContentError> {
        let quests = QuestCatalog::from_defs(quest_defs())?;
        let zones = ZoneRegistry::new(zone_defs(), mob_templates(), rank_table())?;
        Ok(Self {
            items: ItemCatalog::from_defs(item_defs()),
            recipes: RecipeRegistry::from_defs(recipe_defs()),
            loot: LootCatalog::from_tables(loot_tables()),
            quests,
            techniques: TechniqueCatalog::from_defs(technique_defs()),
            zones,
        })
    }

    /// Starting vitals and stats for a freshly created character.
    pub fn new_character_block(race: Race, class: Class) -> (StatBlock, u32, u32) {
        let stats = progression::stats_at_level(race, class, 1);
        (
            stats,
            progression::max_hp_for(&stats),
            progression::max_essence_for(&stats),
        )
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

fn item(id: &str, name: &str, category: ItemCategory) -> ItemDef {
    ItemDef {
        id: ItemId::from(id),
        name: name.to_owned(),
        category,
        max_durability: None,
        purchase_price: 0,
        sale_price: 0,
        granted_stats: None,
        quality: Quality::Common,
    }
}

fn stats(strength: u32, defense: u32, luck: u32) -> StatBlock {
    StatBlock {
        strength,
        defense,
        luck,
        ..StatBlock::default()
    }
}

#[allow(clippy::too_many_lines)]
fn item_defs() -> Vec<ItemDef> {
    let mut defs = Vec::new();

    // Gathering tools. Tools live in the weapon slot and wear per use.
    let mut stone_pickaxe = item(
        "stone_pickaxe",
        "Stone Pickaxe",
        ItemCategory::Tool {
            kind: NodeKind::Ore,
            tier: 1,
        },
    );
    stone_pickaxe.max_durability = Some(64);
    stone_pickaxe.purchase_price = 40;
    stone_pickaxe.sale_price = 10;
    defs.push(stone_pickaxe);

    let mut iron_pickaxe = item(
        "iron_pickaxe",
        "Iron Pickaxe",
        ItemCategory::Tool {
            kind: NodeKind::Ore,
            tier: 2,
        },
    );
    iron_pickaxe.max_durability = Some(128);
    iron_pickaxe.purchase_price = 150;
    iron_pickaxe.sale_price = 40;
    defs.push(iron_pickaxe);

    let mut rusty_sickle = item(
        "rusty_sickle",
        "Rusty Sickle",
        ItemCategory::Tool {
            kind: NodeKind::Flower,
            tier: 1,
        },
    );
    rusty_sickle.max_durability = Some(64);
    rusty_sickle.purchase_price = 35;
    rusty_sickle.sale_price = 8;
    defs.push(rusty_sickle);

    let mut fine_sickle = item(
        "fine_sickle",
        "Fine Sickle",
        ItemCategory::Tool {
            kind: NodeKind::Flower,
            tier: 2,
        },
    );
    fine_sickle.max_durability = Some(128);
    fine_sickle.purchase_price = 140;
    fine_sickle.sale_price = 35;
    defs.push(fine_sickle);

    // Raw materials.
    for (id, name, sale) in [
        ("copper_ore", "Copper Ore", 4_u64),
        ("tin_ore", "Tin Ore", 4),
        ("coal_ore", "Coal Ore", 6),
        ("iron_ore", "Iron Ore", 10),
        ("moonpetal", "Moonpetal", 5),
        ("sunblossom", "Sunblossom", 9),
        ("rat_tail", "Rat Tail", 2),
        ("wolf_pelt", "Wolf Pelt", 12),
    ] {
        let mut def = item(id, name, ItemCategory::Resource);
        def.sale_price = sale;
        defs.push(def);
    }

    // Weapon line: bronze → iron → steel.
    let mut bronze_sword = item(
        "bronze_sword",
        "Bronze Sword",
        ItemCategory::Weapon { coef_pct: 110 },
    );
    bronze_sword.max_durability = Some(80);
    bronze_sword.granted_stats = Some(stats(2, 0, 0));
    bronze_sword.purchase_price = 120;
    bronze_sword.sale_price = 30;
    defs.push(bronze_sword);

    let mut iron_sword = item(
        "iron_sword",
        "Iron Sword",
        ItemCategory::Weapon { coef_pct: 125 },
    );
    iron_sword.max_durability = Some(120);
    iron_sword.granted_stats = Some(stats(4, 0, 0));
    iron_sword.quality = Quality::Uncommon;
    iron_sword.sale_price = 70;
    defs.push(iron_sword);

    let mut steel_sword = item(
        "steel_sword",
        "Steel Sword",
        ItemCategory::Weapon { coef_pct: 140 },
    );
    steel_sword.max_durability = Some(180);
    steel_sword.granted_stats = Some(stats(7, 0, 0));
    steel_sword.quality = Quality::Rare;
    steel_sword.sale_price = 160;
    defs.push(steel_sword);

    // Armor and accessories.
    let mut leather_chest = item(
        "leather_chest",
        "Leather Chest",
        ItemCategory::Armor {
            slot: EquipSlot::Chest,
        },
    );
    leather_chest.max_durability = Some(100);
    leather_chest.granted_stats = Some(stats(0, 3, 0));
    leather_chest.purchase_price = 90;
    leather_chest.sale_price = 25;
    defs.push(leather_chest);

    let mut iron_chest = item(
        "iron_chest",
        "Iron Chestplate",
        ItemCategory::Armor {
            slot: EquipSlot::Chest,
        },
    );
    iron_chest.max_durability = Some(160);
    iron_chest.granted_stats = Some(stats(0, 6, 0));
    iron_chest.quality = Quality::Uncommon;
    iron_chest.sale_price = 60;
    defs.push(iron_chest);

    let mut lucky_ring = item(
        "lucky_ring",
        "Lucky Ring",
        ItemCategory::Accessory {
            slot: EquipSlot::Ring,
        },
    );
    lucky_ring.granted_stats = Some(stats(0, 0, 3));
    lucky_ring.purchase_price = 200;
    lucky_ring.sale_price = 50;
    defs.push(lucky_ring);

    // Consumables.
    let mut healing = item(
        "minor_healing_draught",
        "Minor Healing Draught",
        ItemCategory::Consumable,
    );
    healing.purchase_price = 15;
    healing.sale_price = 4;
    defs.push(healing);

    let mut philter = item(
        "essence_philter",
        "Essence Philter",
        ItemCategory::Consumable,
    );
    philter.purchase_price = 25;
    philter.sale_price = 7;
    defs.push(philter);

    // Enchantment catalysts.
    defs.push(item(
        "ember_dust",
        "Ember Dust",
        ItemCategory::Catalyst {
            stat: StatKind::Strength,
            amount: 2,
        },
    ));
    defs.push(item(
        "hartwood_resin",
        "Hartwood Resin",
        ItemCategory::Catalyst {
            stat: StatKind::Defense,
            amount: 2,
        },
    ));

    // Gate keys, one per rank.
    for (id, name, rank) in [
        ("gate_key_e", "E-Rank Gate Key", GateRank::E),
        ("gate_key_d", "D-Rank Gate Key", GateRank::D),
        ("gate_key_c", "C-Rank Gate Key", GateRank::C),
        ("gate_key_b", "B-Rank Gate Key", GateRank::B),
        ("gate_key_a", "A-Rank Gate Key", GateRank::A),
        ("gate_key_s", "S-Rank Gate Key", GateRank::S),
    ] {
        defs.push(item(id, name, ItemCategory::GateKey { rank }));
    }

    defs
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

fn recipe_defs() -> Vec<RecipeDef> {
    vec![
        RecipeDef {
            id: RecipeId::from("forge_bronze_sword"),
            station: StationKind::Forge,
            profession: Profession::Blacksmithing,
            min_level: 2,
            inputs: vec![
                (ItemId::from("copper_ore"), 2),
                (ItemId::from("tin_ore"), 1),
            ],
            output: ItemId::from("bronze_sword"),
            output_qty: 1,
            kind: RecipeKind::Craft,
        },
        RecipeDef {
            id: RecipeId::from("upgrade_iron_sword"),
            station: StationKind::Forge,
            profession: Profession::Blacksmithing,
            min_level: 5,
            inputs: vec![
                (ItemId::from("bronze_sword"), 1),
                (ItemId::from("iron_ore"), 3),
                (ItemId::from("coal_ore"), 1),
            ],
            output: ItemId::from("iron_sword"),
            output_qty: 1,
            kind: RecipeKind::Upgrade {
                from: ItemId::from("bronze_sword"),
            },
        },
        RecipeDef {
            id: RecipeId::from("upgrade_steel_sword"),
            station: StationKind::Forge,
            profession: Profession::Blacksmithing,
            min_level: 12,
            inputs: vec![
                (ItemId::from("iron_sword"), 1),
                (ItemId::from("iron_ore"), 4),
                (ItemId::from("coal_ore"), 2),
            ],
            output: ItemId::from("steel_sword"),
            output_qty: 1,
            kind: RecipeKind::Upgrade {
                from: ItemId::from("iron_sword"),
            },
        },
        RecipeDef {
            id: RecipeId::from("brew_minor_healing"),
            station: StationKind::AlchemyLab,
            profession: Profession::Alchemy,
            min_level: 1,
            inputs: vec![(ItemId::from("moonpetal"), 2)],
            output: ItemId::from("minor_healing_draught"),
            output_qty: 1,
            kind: RecipeKind::Craft,
        },
        RecipeDef {
            id: RecipeId::from("brew_essence_philter"),
            station: StationKind::AlchemyLab,
            profession: Profession::Alchemy,
            min_level: 4,
            inputs: vec![
                (ItemId::from("sunblossom"), 2),
                (ItemId::from("moonpetal"), 1),
            ],
            output: ItemId::from("essence_philter"),
            output_qty: 1,
            kind: RecipeKind::Craft,
        },
    ]
}

// ---------------------------------------------------------------------------
// Techniques
// ---------------------------------------------------------------------------

fn technique_defs() -> Vec<TechniqueDef> {
    vec![
        TechniqueDef {
            id: TechniqueId::from("ember_bolt"),
            name: "Ember Bolt".to_owned(),
            essence_cost: 8,
            cooldown_ticks: 4,
            target: TargetKind::Single,
            radius: 0,
            min_level: 1,
            effect: TechniqueEffect::Damage { added: 6 },
        },
        TechniqueDef {
            id: TechniqueId::from("mending_light"),
            name: "Mending Light".to_owned(),
            essence_cost: 10,
            cooldown_ticks: 6,
            target: TargetKind::Caster,
            radius: 0,
            min_level: 1,
            effect: TechniqueEffect::Heal { amount: 25 },
        },
        TechniqueDef {
            id: TechniqueId::from("war_cry"),
            name: "War Cry".to_owned(),
            essence_cost: 12,
            cooldown_ticks: 30,
            target: TargetKind::Caster,
            radius: 0,
            min_level: 3,
            effect: TechniqueEffect::Modifier {
                outgoing_damage_pct: 15,
                incoming_damage_pct: 0,
                duration_ticks: 20,
            },
        },
        TechniqueDef {
            id: TechniqueId::from("venom_spit"),
            name: "Venom Spit".to_owned(),
            essence_cost: 10,
            cooldown_ticks: 10,
            target: TargetKind::Single,
            radius: 0,
            min_level: 2,
            effect: TechniqueEffect::DamageOverTime {
                per_tick: 3,
                duration_ticks: 6,
            },
        },
        TechniqueDef {
            id: TechniqueId::from("quake_stomp"),
            name: "Quake Stomp".to_owned(),
            essence_cost: 20,
            cooldown_ticks: 12,
            target: TargetKind::Aoe,
            radius: 6,
            min_level: 5,
            effect: TechniqueEffect::Damage { added: 10 },
        },
    ]
}

// ---------------------------------------------------------------------------
// Mobs and loot
// ---------------------------------------------------------------------------

fn mob_templates() -> Vec<MobTemplate> {
    vec![
        MobTemplate {
            id: MobTemplateId::from("giant_rat"),
            name: "Giant Rat".to_owned(),
            level: 1,
            stats: stats(4, 2, 0),
            max_hp: 30,
            is_boss: false,
            detection_radius: 12,
            strike_radius: 2,
        },
        MobTemplate {
            id: MobTemplateId::from("meadow_wolf"),
            name: "Meadow Wolf".to_owned(),
            level: 4,
            stats: stats(9, 4, 0),
            max_hp: 80,
            is_boss: false,
            detection_radius: 16,
            strike_radius: 2,
        },
        MobTemplate {
            id: MobTemplateId::from("thorn_boar"),
            name: "Thorn Boar".to_owned(),
            level: 6,
            stats: stats(13, 8, 0),
            max_hp: 140,
            is_boss: false,
            detection_radius: 14,
            strike_radius: 2,
        },
        MobTemplate {
            id: MobTemplateId::from("gloom_spawn"),
            name: "Gloom Spawn".to_owned(),
            level: 3,
            stats: stats(7, 3, 0),
            max_hp: 60,
            is_boss: false,
            detection_radius: 20,
            strike_radius: 2,
        },
        MobTemplate {
            id: MobTemplateId::from("gloom_tyrant"),
            name: "Gloom Tyrant".to_owned(),
            level: 8,
            stats: stats(18, 10, 0),
            max_hp: 400,
            is_boss: true,
            detection_radius: 24,
            strike_radius: 3,
        },
    ]
}

fn loot_tables() -> Vec<LootTable> {
    vec![
        LootTable {
            template: MobTemplateId::from("giant_rat"),
            auto_drops: vec![LootDrop {
                item: ItemId::from("rat_tail"),
                chance_pct: 60,
                min_qty: 1,
                max_qty: 1,
            }],
            skinning_drops: Vec::new(),
            currency: (2, 6),
            xp_reward: 12,
            respawn_ticks: Some(20),
        },
        LootTable {
            template: MobTemplateId::from("meadow_wolf"),
            auto_drops: vec![LootDrop {
                item: ItemId::from("wolf_pelt"),
                chance_pct: 45,
                min_qty: 1,
                max_qty: 1,
            }],
            skinning_drops: vec![LootDrop {
                item: ItemId::from("wolf_pelt"),
                chance_pct: 100,
                min_qty: 1,
                max_qty: 2,
            }],
            currency: (5, 12),
            xp_reward: 35,
            respawn_ticks: Some(30),
        },
        LootTable {
            template: MobTemplateId::from("thorn_boar"),
            auto_drops: Vec::new(),
            skinning_drops: Vec::new(),
            currency: (8, 15),
            xp_reward: 60,
            respawn_ticks: None,
        },
        LootTable {
            template: MobTemplateId::from("gloom_spawn"),
            auto_drops: Vec::new(),
            skinning_drops: Vec::new(),
            currency: (4, 10),
            xp_reward: 25,
            respawn_ticks: None,
        },
        LootTable {
            template: MobTemplateId::from("gloom_tyrant"),
            auto_drops: vec![LootDrop {
                item: ItemId::from("gate_key_d"),
                chance_pct: 25,
                min_qty: 1,
                max_qty: 1,
            }],
            skinning_drops: Vec::new(),
            currency: (50, 120),
            xp_reward: 200,
            respawn_ticks: None,
        },
    ]
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

fn quest_defs() -> Vec<QuestDef> {
    vec![
        QuestDef {
            id: QuestId::from("rat_extermination"),
            name: "Rat Extermination".to_owned(),
            giver_npc: "Marcus".to_owned(),
            turn_in_npc: "Marcus".to_owned(),
            objective: QuestObjective::Kill {
                target_mob_name: "Giant Rat".to_owned(),
                count: 3,
            },
            prerequisite: None,
            reward_xp: 50,
            reward_currency: 25,
            reward_items: Vec::new(),
        },
        QuestDef {
            id: QuestId::from("wolf_cull"),
            name: "Wolf Cull".to_owned(),
            giver_npc: "Marcus".to_owned(),
            turn_in_npc: "Marcus".to_owned(),
            objective: QuestObjective::Kill {
                target_mob_name: "Meadow Wolf".to_owned(),
                count: 2,
            },
            prerequisite: Some(QuestId::from("rat_extermination")),
            reward_xp: 120,
            reward_currency: 40,
            reward_items: vec![(ItemId::from("leather_chest"), 1)],
        },
        QuestDef {
            id: QuestId::from("meet_the_elder"),
            name: "Meet the Elder".to_owned(),
            giver_npc: "Marcus".to_owned(),
            turn_in_npc: "Elder Rowan".to_owned(),
            objective: QuestObjective::Talk {
                target_npc_name: "Elder Rowan".to_owned(),
            },
            prerequisite: Some(QuestId::from("rat_extermination")),
            reward_xp: 30,
            reward_currency: 10,
            reward_items: Vec::new(),
        },
        QuestDef {
            id: QuestId::from("boar_menace"),
            name: "The Boar Menace".to_owned(),
            giver_npc: "Hella".to_owned(),
            turn_in_npc: "Hella".to_owned(),
            objective: QuestObjective::Kill {
                target_mob_name: "Thorn Boar".to_owned(),
                count: 2,
            },
            prerequisite: None,
            reward_xp: 200,
            reward_currency: 60,
            reward_items: vec![(ItemId::from("gate_key_e"), 1)],
        },
    ]
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_lines)]
fn zone_defs() -> Vec<ZoneDef> {
    let starter = ZoneDef {
        id: ZoneId::from("starter-vale"),
        name: "Starter Vale".to_owned(),
        bounds: Bounds::new(256, 256),
        seed: 101,
        min_level: 1,
        spawn_point: Position::new(128, 128),
        npcs: vec![
            NpcSpawn {
                name: "Marcus".to_owned(),
                pos: Position::new(150, 150),
                role: NpcRole::QuestGiver,
                stock: Vec::new(),
                teaches: Vec::new(),
                trains: Vec::new(),
            },
            NpcSpawn {
                name: "Elder Rowan".to_owned(),
                pos: Position::new(110, 140),
                role: NpcRole::QuestGiver,
                stock: Vec::new(),
                teaches: Vec::new(),
                trains: Vec::new(),
            },
            NpcSpawn {
                name: "Tilda".to_owned(),
                pos: Position::new(140, 120),
                role: NpcRole::Merchant,
                stock: vec![
                    ItemId::from("stone_pickaxe"),
                    ItemId::from("rusty_sickle"),
                    ItemId::from("iron_pickaxe"),
                    ItemId::from("leather_chest"),
                    ItemId::from("lucky_ring"),
                    ItemId::from("minor_healing_draught"),
                    ItemId::from("essence_philter"),
                ],
                teaches: Vec::new(),
                trains: Vec::new(),
            },
            NpcSpawn {
                name: "Serah".to_owned(),
                pos: Position::new(132, 118),
                role: NpcRole::Trainer,
                stock: Vec::new(),
                teaches: vec![
                    TechniqueId::from("ember_bolt"),
                    TechniqueId::from("mending_light"),
                    TechniqueId::from("war_cry"),
                ],
                trains: Vec::new(),
            },
            NpcSpawn {
                name: "Bram".to_owned(),
                pos: Position::new(126, 116),
                role: NpcRole::ProfessionTrainer,
                stock: Vec::new(),
                teaches: Vec::new(),
                trains: vec![
                    Profession::Mining,
                    Profession::Herbalism,
                    Profession::Blacksmithing,
                    Profession::Alchemy,
                    Profession::Enchanting,
                ],
            },
        ],
        mobs: vec![
            MobSpawn {
                template: MobTemplateId::from("giant_rat"),
                pos: Position::new(165, 160),
            },
            MobSpawn {
                template: MobTemplateId::from("giant_rat"),
                pos: Position::new(170, 155),
            },
            MobSpawn {
                template: MobTemplateId::from("giant_rat"),
                pos: Position::new(160, 170),
            },
            MobSpawn {
                template: MobTemplateId::from("meadow_wolf"),
                pos: Position::new(200, 200),
            },
        ],
        nodes: vec![
            NodeSpawn {
                name: "Copper Vein".to_owned(),
                kind: NodeKind::Ore,
                yield_item: ItemId::from("copper_ore"),
                tier: 1,
                max_charges: 5,
                respawn_ticks: 40,
                pos: Position::new(90, 180),
            },
            NodeSpawn {
                name: "Coal Seam".to_owned(),
                kind: NodeKind::Ore,
                yield_item: ItemId::from("coal_ore"),
                tier: 1,
                max_charges: 3,
                respawn_ticks: 60,
                pos: Position::new(95, 186),
            },
            NodeSpawn {
                name: "Moonpetal Patch".to_owned(),
                kind: NodeKind::Flower,
                yield_item: ItemId::from("moonpetal"),
                tier: 1,
                max_charges: 4,
                respawn_ticks: 30,
                pos: Position::new(105, 95),
            },
        ],
        stations: vec![
            StationSpawn {
                name: "Old Forge".to_owned(),
                kind: StationKind::Forge,
                pos: Position::new(138, 110),
            },
            StationSpawn {
                name: "Herbalist's Lab".to_owned(),
                kind: StationKind::AlchemyLab,
                pos: Position::new(120, 108),
            },
            StationSpawn {
                name: "Whispering Altar".to_owned(),
                kind: StationKind::EnchantingAltar,
                pos: Position::new(112, 100),
            },
        ],
        gates: vec![
            GateSpawn {
                name: "Mossy Gate".to_owned(),
                rank: GateRank::E,
                is_danger_gate: false,
                pos: Position::new(60, 60),
            },
            GateSpawn {
                name: "Cracked Gate".to_owned(),
                rank: GateRank::D,
                is_danger_gate: false,
                pos: Position::new(48, 72),
            },
        ],
        portals: vec![PortalSpawn {
            name: "meadow-gate".to_owned(),
            pos: Position::new(250, 128),
            destination_zone: ZoneId::from("wild-meadow"),
            destination_portal: "vale-gate".to_owned(),
        }],
    };

    let meadow = ZoneDef {
        id: ZoneId::from("wild-meadow"),
        name: "Wild Meadow".to_owned(),
        bounds: Bounds::new(256, 256),
        seed: 202,
        min_level: 5,
        spawn_point: Position::new(20, 128),
        npcs: vec![NpcSpawn {
            name: "Hella".to_owned(),
            pos: Position::new(30, 120),
            role: NpcRole::QuestGiver,
            stock: Vec::new(),
            teaches: Vec::new(),
            trains: Vec::new(),
        }],
        mobs: vec![
            MobSpawn {
                template: MobTemplateId::from("meadow_wolf"),
                pos: Position::new(80, 90),
            },
            MobSpawn {
                template: MobTemplateId::from("thorn_boar"),
                pos: Position::new(120, 150),
            },
            MobSpawn {
                template: MobTemplateId::from("thorn_boar"),
                pos: Position::new(130, 160),
            },
        ],
        nodes: vec![
            NodeSpawn {
                name: "Iron Deposit".to_owned(),
                kind: NodeKind::Ore,
                yield_item: ItemId::from("iron_ore"),
                tier: 2,
                max_charges: 5,
                respawn_ticks: 60,
                pos: Position::new(180, 60),
            },
            NodeSpawn {
                name: "Sunblossom Field".to_owned(),
                kind: NodeKind::Flower,
                yield_item: ItemId::from("sunblossom"),
                tier: 2,
                max_charges: 6,
                respawn_ticks: 45,
                pos: Position::new(70, 200),
            },
        ],
        stations: Vec::new(),
        gates: vec![GateSpawn {
            name: "Umbral Gate".to_owned(),
            rank: GateRank::C,
            is_danger_gate: true,
            pos: Position::new(200, 200),
        }],
        portals: vec![PortalSpawn {
            name: "vale-gate".to_owned(),
            pos: Position::new(6, 128),
            destination_zone: ZoneId::from("starter-vale"),
            destination_portal: "meadow-gate".to_owned(),
        }],
    };

    vec![starter, meadow]
}

// ---------------------------------------------------------------------------
// Dungeon rank table
// ---------------------------------------------------------------------------

fn rank_table() -> Vec<RankScaling> {
    let row = |rank,
               level_requirement,
               key: &str,
               mob_count,
               boss_count,
               mob_level,
               mob_hp,
               boss_hp,
               time_limit_ms| RankScaling {
        rank,
        level_requirement,
        key_item: ItemId::from(key),
        mob_count,
        boss_count,
        mob_template: MobTemplateId::from("gloom_spawn"),
        boss_template: MobTemplateId::from("gloom_tyrant"),
        mob_level,
        mob_hp,
        boss_hp,
        time_limit_ms,
        danger_hp_mult_pct: 150,
        danger_xp_mult_pct: 200,
    };

    vec![
        row(GateRank::E, 1, "gate_key_e", (5, 8), 0, 3, 60, 300, 600_000),
        row(GateRank::D, 7, "gate_key_d", (7, 10), 1, 8, 120, 600, 900_000),
        row(GateRank::C, 15, "gate_key_c", (9, 12), 1, 16, 240, 1_200, 1_200_000),
        row(GateRank::B, 25, "gate_key_b", (10, 14), 1, 26, 420, 2_100, 1_500_000),
        row(GateRank::A, 38, "gate_key_a", (12, 16), 2, 40, 700, 3_500, 1_800_000),
        row(GateRank::S, 50, "gate_key_s", (14, 18), 2, 52, 1_100, 5_500, 2_400_000),
    ]
}
