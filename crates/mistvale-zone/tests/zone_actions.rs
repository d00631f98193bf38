//! End-to-end exercises of the zone runtime: gathering with
//! compensation, combat and respawn, duplicate suppression, technique
//! gates, and zone isolation under a stalled ledger.

use std::sync::Arc;
use std::time::Duration;

use mistvale_content::ContentCatalog;
use mistvale_ledger::{AssetLedger, InMemoryLedger, LedgerError, shared_audit_log};
use mistvale_types::{
    Action, ActionEnvelope, ActionError, ActionOutcome, Bounds, EntityId, EquipSlot, EquippedItem,
    ItemId, NodeKind, NodeState, Position, PreconditionFailure, Profession, Quality, Role,
    TechniqueId, WalletAddress, ZoneId,
};
use mistvale_world::TerrainGrid;
use mistvale_zone::actions;
use mistvale_zone::jobs;
use mistvale_zone::runtime::{NoParties, ZoneContext, ZoneHandle};
use mistvale_zone::spawn;
use mistvale_zone::state::ZoneState;
use mistvale_zone::tick::run_tick;
use mistvale_zone::{RealmConfig, spawn_tick_task};

const WALLET: &str = "0xplayer";

fn wallet() -> WalletAddress {
    WalletAddress::from(WALLET)
}

fn context(ledger: &Arc<InMemoryLedger>) -> ZoneContext {
    let content = ContentCatalog::default_world().unwrap_or_default();
    let dyn_ledger: Arc<dyn AssetLedger> = Arc::clone(ledger) as Arc<dyn AssetLedger>;
    ZoneContext {
        content: Arc::new(content),
        config: Arc::new(RealmConfig::default()),
        ledger: dyn_ledger,
        audit: shared_audit_log(),
        parties: Arc::new(NoParties),
    }
}

fn test_zone(id: &str) -> ZoneState {
    ZoneState::new(
        ZoneId::from(id),
        Position::new(8, 8),
        1,
        TerrainGrid::generate(Bounds::new(64, 64), 3),
        256,
    )
}

/// Spawn a miner with a stone pickaxe at the given durability.
fn add_miner(state: &mut ZoneState, durability: u32) -> EntityId {
    let mut entity = spawn::new_player_entity(
        "Mira",
        wallet(),
        mistvale_types::Race::Human,
        mistvale_types::Class::Warrior,
        Position::new(10, 10),
    );
    if let Some(player) = entity.as_player_mut() {
        player.professions.insert(Profession::Mining);
        player.equipment.insert(
            EquipSlot::Weapon,
            EquippedItem {
                token: ItemId::from("stone_pickaxe"),
                durability,
                max_durability: 64,
                broken: durability == 0,
                quality: Quality::Common,
                rolled_stats: None,
                enchantments: Vec::new(),
            },
        );
    }
    let id = entity.id;
    state.insert_entity(entity);
    id
}

fn add_coal_node(state: &mut ZoneState, charges: u32) -> EntityId {
    let entity = mistvale_types::Entity::new(
        "Coal Seam",
        Position::new(12, 10),
        Role::ResourceNode(NodeState {
            kind: NodeKind::Ore,
            yield_item: ItemId::from("coal_ore"),
            tier: 1,
            charges,
            max_charges: charges.max(1),
            depleted_at_tick: None,
            respawn_ticks: 5,
        }),
    );
    let id = entity.id;
    state.insert_entity(entity);
    id
}

fn add_rat(state: &mut ZoneState, ctx: &ZoneContext, pos: Position) -> EntityId {
    let template = ctx
        .content
        .zones
        .require_template(&mistvale_types::MobTemplateId::from("giant_rat"))
        .map(Clone::clone);
    let Ok(template) = template else {
        return EntityId::new();
    };
    let entity = spawn::mob_entity(&template, pos, &ctx.content, 4);
    let id = entity.id;
    state.insert_entity(entity);
    id
}

fn envelope(zone: &str, entity: EntityId, action: Action) -> ActionEnvelope {
    ActionEnvelope::new(Some(wallet()), ZoneId::from(zone), entity, action)
}

fn node_snapshot(state: &ZoneState, node: EntityId) -> (u32, Option<u64>) {
    state
        .entity(node)
        .and_then(|e| e.as_node())
        .map_or((0, None), |n| (n.charges, n.depleted_at_tick))
}

fn tool_snapshot(state: &ZoneState, player: EntityId) -> (u32, bool) {
    state
        .entity(player)
        .and_then(|e| e.as_player())
        .and_then(|p| p.equipment.get(&EquipSlot::Weapon))
        .map_or((0, false), |t| (t.durability, t.broken))
}

// ---------------------------------------------------------------------------
// Gathering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gather_with_last_durability_breaks_tool_and_mints() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 1);
    let node = add_coal_node(&mut state, 3);
    let zone = ZoneHandle::new(state);

    let result = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::GatherOre { node }),
    )
    .await;
    assert_eq!(
        result,
        Ok(ActionOutcome::Gathered {
            item: ItemId::from("coal_ore"),
            node_charges_left: 2,
            tool_durability: 0,
        })
    );

    let state = zone.lock().await;
    assert_eq!(node_snapshot(&state, node), (2, None));
    assert_eq!(tool_snapshot(&state, player), (0, true));
    drop(state);

    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("coal_ore")).await, 1);

    // The broken tool rejects the next gather; the node is untouched.
    let second = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::GatherOre { node }),
    )
    .await;
    assert_eq!(
        second,
        Err(ActionError::Precondition(PreconditionFailure::ToolBroken))
    );
    let state = zone.lock().await;
    assert_eq!(node_snapshot(&state, node), (2, None));
}

#[tokio::test]
async fn gather_mint_failure_compensates_node_and_tool() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);
    ledger
        .inject_failure(LedgerError::transient("chain congested"))
        .await;

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let node = add_coal_node(&mut state, 3);
    let zone = ZoneHandle::new(state);

    let result = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::GatherOre { node }),
    )
    .await;
    assert!(matches!(result, Err(ActionError::LedgerTransient { .. })));

    // Invariant G1: the failed gather left node and durability untouched.
    let state = zone.lock().await;
    assert_eq!(node_snapshot(&state, node), (3, None));
    assert_eq!(tool_snapshot(&state, player), (10, false));
    drop(state);
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("coal_ore")).await, 0);
}

#[tokio::test]
async fn gathering_last_charge_depletes_and_rejects_within_tick() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let node = add_coal_node(&mut state, 1);
    let zone = ZoneHandle::new(state);

    let first = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::GatherOre { node }),
    )
    .await;
    assert!(first.is_ok());

    // Same tick: the depleted node rejects the follow-up gather.
    let second = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::GatherOre { node }),
    )
    .await;
    assert_eq!(
        second,
        Err(ActionError::Precondition(PreconditionFailure::NodeDepleted))
    );
}

#[tokio::test]
async fn depleted_node_respawns_after_delay() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let node = add_coal_node(&mut state, 1);
    let zone = ZoneHandle::new(state);

    let _ = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::GatherOre { node }),
    )
    .await;

    let mut state = zone.lock().await;
    assert!(state.entity(node).and_then(|e| e.as_node()).is_some_and(NodeState::is_depleted));

    // respawn_ticks is 5 on the test node.
    for _ in 0..6 {
        let _ = run_tick(&mut state, &ctx);
    }
    assert_eq!(node_snapshot(&state, node), (1, None));
}

// ---------------------------------------------------------------------------
// Duplicate suppression
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_action_id_rejected_within_tick() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let zone = ZoneHandle::new(state);

    let env = envelope("z1", player, Action::Move { x: 10, y: 11 });
    // Make sure the destination is walkable to isolate the dedup path.
    {
        let mut state = zone.lock().await;
        let _ = state
            .terrain
            .set_tile(Position::new(10, 11), mistvale_world::TileKind::Grass);
    }

    let first = actions::execute(&zone, &ctx, env.clone()).await;
    assert!(first.is_ok());

    let second = actions::execute(&zone, &ctx, env).await;
    assert!(matches!(second, Err(ActionError::Conflict { .. })));
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn engaged_auto_attacks_kill_award_xp_and_schedule_respawn() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let rat = add_rat(&mut state, &ctx, Position::new(14, 10));
    state.rebuild_spatial();
    let zone = ZoneHandle::new(state);

    let engaged = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::Attack { target: rat }),
    )
    .await;
    assert!(engaged.is_ok());

    // Auto-attacks resolve in the tick loop until the rat dies.
    let mut all_jobs = Vec::new();
    {
        let mut state = zone.lock().await;
        for _ in 0..30 {
            let summary = run_tick(&mut state, &ctx);
            let Ok(summary) = summary else {
                break;
            };
            all_jobs.extend(summary.loot_jobs);
            if state.entity(rat).is_none() {
                break;
            }
        }

        assert!(state.entity(rat).is_none(), "rat should be dead and removed");
        assert_eq!(state.mob_respawns.len(), 1);

        let killer = state.entity(player).and_then(|e| e.as_player());
        assert_eq!(killer.map(|p| p.kills), Some(1));
        // Giant Rat grants 12 XP to a solo killer.
        assert_eq!(killer.map(|p| p.xp), Some(12));
    }

    // Loot mints are best-effort background jobs.
    let tick_now = zone.lock().await.tick();
    jobs::dispatch_best_effort(&ctx, tick_now, all_jobs);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let currency = ledger
        .balance_of(&wallet(), &mistvale_ledger::currency_token())
        .await;
    assert!(currency >= 2, "rat currency roll is at least 2, got {currency}");
}

#[tokio::test]
async fn dead_mob_respawns_at_schedule() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let rat = add_rat(&mut state, &ctx, Position::new(14, 10));
    state.rebuild_spatial();
    let zone = ZoneHandle::new(state);

    let _ = actions::execute(
        &zone,
        &ctx,
        envelope("z1", player, Action::Attack { target: rat }),
    )
    .await;

    let mut state = zone.lock().await;
    for _ in 0..30 {
        let _ = run_tick(&mut state, &ctx);
        if state.entity(rat).is_none() {
            break;
        }
    }
    assert_eq!(state.live_mob_count(), 0);

    // The giant rat's loot table schedules respawn 20 ticks out.
    for _ in 0..21 {
        let _ = run_tick(&mut state, &ctx);
    }
    assert_eq!(state.live_mob_count(), 1);
}

// ---------------------------------------------------------------------------
// Techniques
// ---------------------------------------------------------------------------

fn caster_zone(ctx: &ZoneContext, essence: u32) -> (ZoneHandle, EntityId, EntityId) {
    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    if let Some(p) = state.entity_mut(player).and_then(|e| e.as_player_mut()) {
        p.learned_techniques.insert(TechniqueId::from("ember_bolt"));
        p.essence = essence;
    }
    let rat = add_rat(&mut state, ctx, Position::new(14, 10));
    state.rebuild_spatial();
    (ZoneHandle::new(state), player, rat)
}

#[tokio::test]
async fn cast_with_exact_essence_succeeds() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);
    // Ember Bolt costs 8.
    let (zone, player, rat) = caster_zone(&ctx, 8);

    let result = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::CastTechnique {
                technique: TechniqueId::from("ember_bolt"),
                target: Some(rat),
            },
        ),
    )
    .await;
    assert!(matches!(result, Ok(ActionOutcome::TechniqueCast { .. })));

    let state = zone.lock().await;
    let essence = state.entity(player).and_then(|e| e.as_player()).map(|p| p.essence);
    assert_eq!(essence, Some(0));
}

#[tokio::test]
async fn cast_one_essence_short_fails() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);
    let (zone, player, rat) = caster_zone(&ctx, 7);

    let result = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::CastTechnique {
                technique: TechniqueId::from("ember_bolt"),
                target: Some(rat),
            },
        ),
    )
    .await;
    assert_eq!(
        result,
        Err(ActionError::Precondition(
            PreconditionFailure::InsufficientEssence {
                required: 8,
                available: 7
            }
        ))
    );
}

#[tokio::test]
async fn cast_respects_cooldown() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);
    let (zone, player, rat) = caster_zone(&ctx, 50);

    let cast = |target| {
        envelope(
            "z1",
            player,
            Action::CastTechnique {
                technique: TechniqueId::from("ember_bolt"),
                target: Some(target),
            },
        )
    };

    let first = actions::execute(&zone, &ctx, cast(rat)).await;
    assert!(first.is_ok());

    let second = actions::execute(&zone, &ctx, cast(rat)).await;
    assert!(matches!(
        second,
        Err(ActionError::Precondition(
            PreconditionFailure::CooldownActive { .. }
        ))
    ));
}

// ---------------------------------------------------------------------------
// Zone isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stalled_zone_does_not_block_its_neighbor() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut ctx = context(&ledger);
    let mut config = RealmConfig::default();
    config.world.tick_interval_ms = 20;
    ctx.config = Arc::new(config);

    let z1 = ZoneHandle::new(test_zone("z1"));
    let z2 = ZoneHandle::new(test_zone("z2"));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let t1 = spawn_tick_task(z1.clone(), ctx.clone(), shutdown_rx.clone());
    let t2 = spawn_tick_task(z2.clone(), ctx.clone(), shutdown_rx);

    // Simulate an in-flight action holding z1 across a slow ledger call.
    let guard = z1.lock().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let z1_tick_while_held = guard.tick();
    drop(guard);

    let z2_tick = z2.lock().await.tick();
    assert_eq!(z1_tick_while_held, 0, "z1 must not tick while held");
    assert!(
        z2_tick >= 3,
        "z2 should keep ticking while z1 is stalled (saw {z2_tick})"
    );

    let _ = shutdown_tx.send(true);
    let _ = t1.await;
    let _ = t2.await;
}

// ---------------------------------------------------------------------------
// Crafting and the shop
// ---------------------------------------------------------------------------

fn add_forge(state: &mut ZoneState) -> EntityId {
    let entity = mistvale_types::Entity::new(
        "Old Forge",
        Position::new(11, 10),
        Role::Station(mistvale_types::StationState {
            kind: mistvale_types::StationKind::Forge,
        }),
    );
    let id = entity.id;
    state.insert_entity(entity);
    id
}

fn add_merchant(state: &mut ZoneState) -> EntityId {
    let entity = mistvale_types::Entity::new(
        "Tilda",
        Position::new(12, 10),
        Role::Npc(mistvale_types::NpcState {
            role: mistvale_types::NpcRole::Merchant,
            stock: vec![ItemId::from("stone_pickaxe")],
            teaches: Vec::new(),
            trains: Vec::new(),
        }),
    );
    let id = entity.id;
    state.insert_entity(entity);
    id
}

fn make_smith(state: &mut ZoneState) -> EntityId {
    let player = add_miner(state, 10);
    if let Some(p) = state.entity_mut(player).and_then(|e| e.as_player_mut()) {
        p.professions.insert(Profession::Blacksmithing);
        p.level = 2;
    }
    player
}

#[tokio::test]
async fn craft_burns_inputs_and_mints_output() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = make_smith(&mut state);
    let forge = add_forge(&mut state);
    let zone = ZoneHandle::new(state);

    ledger.set_balance(&wallet(), &ItemId::from("copper_ore"), 2).await;
    ledger.set_balance(&wallet(), &ItemId::from("tin_ore"), 1).await;

    let result = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::Craft {
                station: forge,
                recipe: mistvale_types::RecipeId::from("forge_bronze_sword"),
            },
        ),
    )
    .await;
    assert_eq!(
        result,
        Ok(ActionOutcome::Crafted {
            output: ItemId::from("bronze_sword"),
        })
    );

    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("copper_ore")).await, 0);
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("tin_ore")).await, 0);
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("bronze_sword")).await, 1);
}

#[tokio::test]
async fn craft_mid_sequence_burn_failure_unburns_earlier_inputs() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = make_smith(&mut state);
    let forge = add_forge(&mut state);
    let zone = ZoneHandle::new(state);

    ledger.set_balance(&wallet(), &ItemId::from("copper_ore"), 2).await;
    ledger.set_balance(&wallet(), &ItemId::from("tin_ore"), 1).await;
    // Call order: balance copper, balance tin, burn copper, burn tin.
    // Fail the tin burn (offset 3 from now).
    ledger
        .inject_failure_at(3, LedgerError::transient("chain congested"))
        .await;

    let result = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::Craft {
                station: forge,
                recipe: mistvale_types::RecipeId::from("forge_bronze_sword"),
            },
        ),
    )
    .await;
    assert!(matches!(result, Err(ActionError::LedgerTransient { .. })));

    // The copper burn was compensated; nothing else moved.
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("copper_ore")).await, 2);
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("tin_ore")).await, 1);
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("bronze_sword")).await, 0);
}

#[tokio::test]
async fn buy_then_sell_nets_the_price_spread() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let merchant = add_merchant(&mut state);
    let zone = ZoneHandle::new(state);

    let coin = mistvale_ledger::currency_token();
    ledger.set_balance(&wallet(), &coin, 100).await;

    // Stone pickaxe: buys at 40, sells back at 10.
    let bought = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::Buy {
                merchant,
                token: ItemId::from("stone_pickaxe"),
                quantity: 1,
            },
        ),
    )
    .await;
    assert_eq!(
        bought,
        Ok(ActionOutcome::Bought {
            token: ItemId::from("stone_pickaxe"),
            quantity: 1,
            cost: 40,
        })
    );
    assert_eq!(ledger.balance_of(&wallet(), &coin).await, 60);

    let sold = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::Sell {
                merchant,
                token: ItemId::from("stone_pickaxe"),
                quantity: 1,
            },
        ),
    )
    .await;
    assert_eq!(
        sold,
        Ok(ActionOutcome::Sold {
            token: ItemId::from("stone_pickaxe"),
            quantity: 1,
            proceeds: 10,
        })
    );

    // Net currency change is purchase minus sale price.
    assert_eq!(ledger.balance_of(&wallet(), &coin).await, 70);
    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("stone_pickaxe")).await, 0);
}

#[tokio::test]
async fn buying_without_funds_is_a_precondition_error() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let merchant = add_merchant(&mut state);
    let zone = ZoneHandle::new(state);

    let result = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::Buy {
                merchant,
                token: ItemId::from("stone_pickaxe"),
                quantity: 1,
            },
        ),
    )
    .await;
    assert!(matches!(
        result,
        Err(ActionError::Precondition(
            PreconditionFailure::InsufficientBalance { .. }
        ))
    ));
}

// ---------------------------------------------------------------------------
// Enchanting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enchant_burns_catalyst_and_raises_effective_stats() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    if let Some(p) = state.entity_mut(player).and_then(|e| e.as_player_mut()) {
        p.professions.insert(Profession::Enchanting);
    }
    let altar = mistvale_types::Entity::new(
        "Whispering Altar",
        Position::new(14, 12),
        Role::Station(mistvale_types::StationState {
            kind: mistvale_types::StationKind::EnchantingAltar,
        }),
    );
    let altar_id = altar.id;
    state.insert_entity(altar);
    let zone = ZoneHandle::new(state);

    ledger.set_balance(&wallet(), &ItemId::from("ember_dust"), 1).await;

    let before = zone
        .lock()
        .await
        .entity(player)
        .and_then(|e| e.as_player())
        .map(|p| p.effective_stats().strength)
        .unwrap_or(0);

    let result = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::ApplyEnchant {
                altar: altar_id,
                catalyst: ItemId::from("ember_dust"),
                slot: EquipSlot::Weapon,
            },
        ),
    )
    .await;
    assert_eq!(result, Ok(ActionOutcome::Enchanted { slot: EquipSlot::Weapon }));

    assert_eq!(ledger.balance_of(&wallet(), &ItemId::from("ember_dust")).await, 0);
    let after = zone
        .lock()
        .await
        .entity(player)
        .and_then(|e| e.as_player())
        .map(|p| p.effective_stats().strength)
        .unwrap_or(0);
    assert_eq!(after, before + 2);
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trainers_teach_techniques_and_professions_once() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ctx = context(&ledger);

    let mut state = test_zone("z1");
    let player = add_miner(&mut state, 10);
    let trainer = mistvale_types::Entity::new(
        "Serah",
        Position::new(13, 10),
        Role::Npc(mistvale_types::NpcState {
            role: mistvale_types::NpcRole::Trainer,
            stock: Vec::new(),
            teaches: vec![TechniqueId::from("ember_bolt")],
            trains: Vec::new(),
        }),
    );
    let trainer_id = trainer.id;
    state.insert_entity(trainer);
    let prof_trainer = mistvale_types::Entity::new(
        "Bram",
        Position::new(13, 11),
        Role::Npc(mistvale_types::NpcState {
            role: mistvale_types::NpcRole::ProfessionTrainer,
            stock: Vec::new(),
            teaches: Vec::new(),
            trains: vec![Profession::Alchemy],
        }),
    );
    let prof_trainer_id = prof_trainer.id;
    state.insert_entity(prof_trainer);
    let zone = ZoneHandle::new(state);

    let learned = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::LearnTechnique {
                trainer: trainer_id,
                technique: TechniqueId::from("ember_bolt"),
            },
        ),
    )
    .await;
    assert_eq!(
        learned,
        Ok(ActionOutcome::TechniqueLearned {
            technique: TechniqueId::from("ember_bolt"),
        })
    );

    // Learning twice conflicts.
    let again = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::LearnTechnique {
                trainer: trainer_id,
                technique: TechniqueId::from("ember_bolt"),
            },
        ),
    )
    .await;
    assert!(matches!(again, Err(ActionError::Conflict { .. })));

    let profession = actions::execute(
        &zone,
        &ctx,
        envelope(
            "z1",
            player,
            Action::LearnProfession {
                trainer: prof_trainer_id,
                profession: Profession::Alchemy,
            },
        ),
    )
    .await;
    assert_eq!(
        profession,
        Ok(ActionOutcome::ProfessionLearned {
            profession: Profession::Alchemy,
        })
    );

    let has = zone
        .lock()
        .await
        .entity(player)
        .and_then(|e| e.as_player())
        .map(|p| {
            (
                p.learned_techniques.contains(&TechniqueId::from("ember_bolt")),
                p.professions.contains(&Profession::Alchemy),
            )
        });
    assert_eq!(has, Some((true, true)));
}
