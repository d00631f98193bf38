//! End-to-end scenarios over the booted default world: the quest loop,
//! gate validation, dungeon lifecycle, portal gating, and the
//! login/logout persistence round trip.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use mistvale_content::ContentCatalog;
use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::{AssetLedger, InMemoryLedger, currency_token, shared_audit_log};
use mistvale_realm::{
    Dispatcher, DungeonManager, PartyManager, SessionManager, TeardownReason, WorldManager,
};
use mistvale_store::{CharacterStore, ChunkDiffStore};
use mistvale_types::{
    Action, ActionEnvelope, ActionError, ActionOutcome, Class, EntityId, ItemId, PlayerState,
    Position, PreconditionFailure, QuestId, Race, TechniqueId, WalletAddress, ZoneId,
};
use mistvale_zone::RealmConfig;
use mistvale_zone::runtime::{ZoneContext, ZoneHandle};

struct Harness {
    world: Arc<WorldManager>,
    parties: Arc<PartyManager>,
    dungeons: Arc<DungeonManager>,
    dispatcher: Dispatcher,
    ledger: Arc<InMemoryLedger>,
    ctx: ZoneContext,
    _dir: tempfile::TempDir,
}

async fn boot(mut config: RealmConfig) -> Harness {
    config.world.tick_interval_ms = 20;
    config.dungeon.tick_interval_ms = 50;

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(InMemoryLedger::new());
    let parties = Arc::new(PartyManager::new(config.party.max_size));

    let ctx = ZoneContext {
        content: Arc::new(ContentCatalog::default_world().unwrap_or_default()),
        config: Arc::new(config),
        ledger: Arc::clone(&ledger) as Arc<dyn AssetLedger>,
        audit: shared_audit_log(),
        parties: Arc::clone(&parties) as Arc<dyn mistvale_zone::PartyLookup>,
    };

    let chunks = ChunkDiffStore::new(dir.path().join("chunks"));
    let world = WorldManager::boot(ctx.clone(), &chunks)
        .await
        .unwrap();

    let dungeons = DungeonManager::new(Arc::clone(&parties));
    let sessions = SessionManager::new(CharacterStore::new(dir.path().join("characters")));
    let dispatcher = Dispatcher::new(
        Arc::clone(&world),
        Arc::clone(&parties),
        Arc::clone(&dungeons),
        sessions,
    );

    Harness {
        world,
        parties,
        dungeons,
        dispatcher,
        ledger,
        ctx,
        _dir: dir,
    }
}

fn wallet(tag: &str) -> WalletAddress {
    WalletAddress::from(format!("0x{tag}"))
}

async fn find_by_name(zone: &ZoneHandle, name: &str) -> Vec<EntityId> {
    zone.lock()
        .await
        .entities
        .values()
        .filter(|e| e.name == name)
        .map(|e| e.id)
        .collect()
}

async fn place(zone: &ZoneHandle, entity: EntityId, pos: Position) {
    if let Some(e) = zone.lock().await.entity_mut(entity) {
        e.pos = pos;
    }
}

async fn tweak_player(zone: &ZoneHandle, entity: EntityId, f: impl FnOnce(&mut PlayerState)) {
    if let Some(p) = zone
        .lock()
        .await
        .entity_mut(entity)
        .and_then(|e| e.as_player_mut())
    {
        f(p);
    }
}

async fn read_player(zone: &ZoneHandle, entity: EntityId) -> Option<PlayerState> {
    zone.lock()
        .await
        .entity(entity)
        .and_then(|e| e.as_player())
        .cloned()
}

async fn wait_for(mut pred: impl AsyncFnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if pred().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ---------------------------------------------------------------------------
// S1 — quest accept, kill, turn-in
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quest_accept_kill_and_turn_in() {
    let h = boot(RealmConfig::default()).await;
    let w = wallet("s1");

    let login = h.dispatcher.login(&w, "Pell", Race::Human, Class::Warrior).await;
    let Ok(login) = login else {
        assert!(login.is_ok());
        return;
    };
    let zone = h.world.require_zone(&login.zone).await.unwrap();

    // Stand with Marcus.
    let marcus = find_by_name(&zone, "Marcus").await;
    let Some(marcus) = marcus.first().copied() else {
        return;
    };
    place(&zone, login.entity, Position::new(150, 150)).await;

    let accepted = h
        .dispatcher
        .dispatch(ActionEnvelope::new(
            Some(w.clone()),
            login.zone.clone(),
            login.entity,
            Action::AcceptQuest {
                npc: marcus,
                quest: QuestId::from("rat_extermination"),
            },
        ))
        .await;
    assert!(accepted.is_ok(), "accept failed: {accepted:?}");

    // Kill the three Giant Rats through engagement + auto-attacks.
    let rats = find_by_name(&zone, "Giant Rat").await;
    assert_eq!(rats.len(), 3);
    for rat in rats {
        let engaged = h
            .dispatcher
            .dispatch(ActionEnvelope::new(
                Some(w.clone()),
                login.zone.clone(),
                login.entity,
                Action::Attack { target: rat },
            ))
            .await;
        assert!(engaged.is_ok(), "attack failed: {engaged:?}");

        let dead = wait_for(
            async || zone.lock().await.entity(rat).is_none(),
            Duration::from_secs(5),
        )
        .await;
        assert!(dead, "rat survived the auto-attack loop");
    }

    let player = read_player(&zone, login.entity).await;
    assert_eq!(
        player.as_ref().and_then(|p| p.active_quests.first()).map(|q| q.progress),
        Some(3)
    );
    assert_eq!(player.as_ref().map(|p| p.kills), Some(3));

    // Turn in: 50 XP then a 25-coin mint, quest moves to completed.
    let turned_in = h
        .dispatcher
        .dispatch(ActionEnvelope::new(
            Some(w.clone()),
            login.zone.clone(),
            login.entity,
            Action::TurnInQuest {
                npc: marcus,
                quest: QuestId::from("rat_extermination"),
            },
        ))
        .await;
    assert_eq!(
        turned_in,
        Ok(ActionOutcome::QuestTurnedIn {
            quest: QuestId::from("rat_extermination"),
            xp: 50,
            currency: 25,
        })
    );

    let player = read_player(&zone, login.entity).await;
    // 3 rat kills at 12 XP each plus the 50 XP reward.
    assert_eq!(player.as_ref().map(|p| p.xp), Some(86));
    assert_eq!(
        player.map(|p| p.completed_quests),
        Some(vec![QuestId::from("rat_extermination")])
    );

    // The reward mint is audited against the currency token.
    let audit = h.ctx.audit.lock().await;
    let reward_minted = audit
        .entries()
        .iter()
        .any(|e| e.reason == "quest_reward" && e.token == currency_token() && e.qty == 25);
    assert!(reward_minted);
    drop(audit);
    assert!(h.ledger.currency_balance(w).await.unwrap_or(0) >= 25);

    h.world.shutdown().await;
}

// ---------------------------------------------------------------------------
// S3 — gate open with an under-leveled member
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gate_open_rejects_underleveled_member_without_burning_the_key() {
    let h = boot(RealmConfig::default()).await;
    let (w1, w2) = (wallet("s3a"), wallet("s3b"));

    let leader = h.dispatcher.login(&w1, "Ansel", Race::Human, Class::Warrior).await;
    let member = h.dispatcher.login(&w2, "Brith", Race::Dwarf, Class::Cleric).await;
    let (Ok(leader), Ok(member)) = (leader, member) else {
        return;
    };
    let zone = h.world.require_zone(&leader.zone).await.unwrap();

    // Rank D requires level 7; the member is one short.
    tweak_player(&zone, leader.entity, |p| p.level = 7).await;
    tweak_player(&zone, member.entity, |p| p.level = 6).await;

    let gates = find_by_name(&zone, "Cracked Gate").await;
    let Some(gate) = gates.first().copied() else {
        return;
    };
    let gate_pos = zone.lock().await.entity(gate).map_or(Position::new(48, 72), |e| e.pos);
    place(&zone, leader.entity, gate_pos).await;
    place(&zone, member.entity, Position::new(gate_pos.x + 3, gate_pos.y)).await;

    let _ = h.dispatcher.party_create(&w1, &leader.zone, leader.entity).await;
    let _ = h
        .dispatcher
        .party_invite(&w1, &leader.zone, leader.entity, member.entity)
        .await;
    let _ = h.dispatcher.party_join(&w2, &leader.zone, member.entity).await;

    h.ledger.set_balance(&w1, &ItemId::from("gate_key_d"), 1).await;

    let result = h
        .dispatcher
        .open_dungeon_gate(&w1, &leader.zone, leader.entity, gate)
        .await;
    assert_eq!(
        result,
        Err(ActionError::Precondition(
            PreconditionFailure::MemberLevelTooLow {
                member: member.entity,
                required: 7,
            }
        ))
    );

    // The key was not burned and no instance exists.
    assert_eq!(h.ledger.balance_of(&w1, &ItemId::from("gate_key_d")).await, 1);
    assert!(h.dungeons.instances().await.is_empty());
    let opened = zone
        .lock()
        .await
        .entity(gate)
        .and_then(|e| e.as_gate())
        .map(|g| g.opened);
    assert_eq!(opened, Some(false));

    h.world.shutdown().await;
}

// ---------------------------------------------------------------------------
// S4 — dungeon clear
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dungeon_clear_teleports_party_home_and_removes_the_instance() {
    let h = boot(RealmConfig::default()).await;
    let w = wallet("s4");

    let login = h.dispatcher.login(&w, "Kessa", Race::Orc, Class::Warrior).await;
    let Ok(login) = login else {
        return;
    };
    let source = h.world.require_zone(&login.zone).await.unwrap();

    tweak_player(&source, login.entity, |p| p.level = 3).await;
    let gates = find_by_name(&source, "Mossy Gate").await;
    let Some(gate) = gates.first().copied() else {
        return;
    };
    let gate_pos = source.lock().await.entity(gate).map_or(Position::new(60, 60), |e| e.pos);
    place(&source, login.entity, gate_pos).await;

    let _ = h.dispatcher.party_create(&w, &login.zone, login.entity).await;
    h.ledger.set_balance(&w, &ItemId::from("gate_key_e"), 1).await;

    let instance_id = h
        .dispatcher
        .open_dungeon_gate(&w, &login.zone, login.entity, gate)
        .await;
    let Ok(instance_id) = instance_id else {
        assert!(instance_id.is_ok(), "open failed: {instance_id:?}");
        return;
    };

    // I6: exactly one key burn, exactly one new instance.
    {
        let audit = h.ctx.audit.lock().await;
        assert_eq!(
            audit.confirmed_count(AuditOp::Burn, &ItemId::from("gate_key_e")),
            1
        );
    }
    assert_eq!(h.ledger.balance_of(&w, &ItemId::from("gate_key_e")).await, 0);
    let instance = h.dungeons.instance(instance_id).await;
    let Some(instance) = instance else {
        return;
    };
    assert!(instance.total_mobs >= 5);

    // The player was moved in atomically.
    assert!(source.lock().await.entity(login.entity).is_none());
    let dungeon = h
        .world
        .require_zone(&instance.dungeon_zone)
        .await
        .unwrap();
    assert!(dungeon.lock().await.entity(login.entity).is_some());

    // "Kill" every mob, then let the monitor observe the clear.
    {
        let mut state = dungeon.lock().await;
        let mobs: Vec<EntityId> = state
            .entities
            .values()
            .filter(|e| e.as_mob().is_some())
            .map(|e| e.id)
            .collect();
        for mob in mobs {
            if let Some(m) = state.entity_mut(mob).and_then(|e| e.as_mob_mut()) {
                m.hp = 0;
                m.alive = false;
            }
        }
    }

    let torn_down = h.dungeons.sweep(&h.world).await;
    assert_eq!(torn_down, vec![(instance_id, TeardownReason::Cleared)]);

    // Survivor teleported back near the gate, zone deleted, record gone.
    let back = source.lock().await.entity(login.entity).map(|e| e.pos);
    let Some(back) = back else {
        assert!(back.is_some(), "player did not return to the source zone");
        return;
    };
    assert!(back.distance_to(gate_pos) <= 6.0, "landed too far: {back}");
    assert!(h.world.zone(&instance.dungeon_zone).await.is_none());
    assert!(h.dungeons.instances().await.is_empty());
    let reopened = source
        .lock()
        .await
        .entity(gate)
        .and_then(|e| e.as_gate())
        .map(|g| g.opened);
    assert_eq!(reopened, Some(false));

    h.world.shutdown().await;
}

// ---------------------------------------------------------------------------
// B4 — timeout fires on the sweep after expiry, not before
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dungeon_times_out_on_the_next_sweep() {
    let mut config = RealmConfig::default();
    config
        .dungeon
        .time_limit_overrides_ms
        .insert("E".to_owned(), 400);
    let h = boot(config).await;
    let w = wallet("b4");

    let login = h.dispatcher.login(&w, "Tove", Race::Elf, Class::Ranger).await;
    let Ok(login) = login else {
        return;
    };
    let source = h.world.require_zone(&login.zone).await.unwrap();
    tweak_player(&source, login.entity, |p| p.level = 3).await;

    let gates = find_by_name(&source, "Mossy Gate").await;
    let Some(gate) = gates.first().copied() else {
        return;
    };
    let gate_pos = source.lock().await.entity(gate).map_or(Position::new(60, 60), |e| e.pos);
    place(&source, login.entity, gate_pos).await;
    let _ = h.dispatcher.party_create(&w, &login.zone, login.entity).await;
    h.ledger.set_balance(&w, &ItemId::from("gate_key_e"), 1).await;

    let instance_id = h
        .dispatcher
        .open_dungeon_gate(&w, &login.zone, login.entity, gate)
        .await;
    let Ok(instance_id) = instance_id else {
        return;
    };

    // Before expiry: a sweep leaves the instance alone.
    assert!(h.dungeons.sweep(&h.world).await.is_empty());

    tokio::time::sleep(Duration::from_millis(500)).await;
    let torn_down = h.dungeons.sweep(&h.world).await;
    assert_eq!(torn_down, vec![(instance_id, TeardownReason::TimedOut)]);
    assert!(source.lock().await.entity(login.entity).is_some());

    h.world.shutdown().await;
}

// ---------------------------------------------------------------------------
// S5 — portal transition with a level gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn portal_gates_on_destination_level() {
    let h = boot(RealmConfig::default()).await;
    let w = wallet("s5");

    let login = h.dispatcher.login(&w, "Odo", Race::Human, Class::Mage).await;
    let Ok(login) = login else {
        return;
    };
    let source = h.world.require_zone(&login.zone).await.unwrap();

    let portals = find_by_name(&source, "meadow-gate").await;
    let Some(portal) = portals.first().copied() else {
        return;
    };
    let portal_pos = source
        .lock()
        .await
        .entity(portal)
        .map_or(Position::new(250, 128), |e| e.pos);
    place(&source, login.entity, portal_pos).await;
    tweak_player(&source, login.entity, |p| p.level = 4).await;

    // Wild Meadow requires level 5.
    let denied = h
        .dispatcher
        .transition_portal(&w, &login.zone, login.entity, portal)
        .await;
    assert_eq!(
        denied,
        Err(ActionError::Precondition(PreconditionFailure::LevelTooLow {
            required: 5,
            actual: 4,
        }))
    );
    assert!(source.lock().await.entity(login.entity).is_some());

    tweak_player(&source, login.entity, |p| p.level = 5).await;
    let allowed = h
        .dispatcher
        .transition_portal(&w, &login.zone, login.entity, portal)
        .await;
    let Ok(outcome) = allowed else {
        assert!(allowed.is_ok(), "transition failed: {allowed:?}");
        return;
    };
    assert_eq!(outcome.zone, ZoneId::from("wild-meadow"));

    // The entity lives in exactly one zone.
    assert!(source.lock().await.entity(login.entity).is_none());
    let meadow = h.world.require_zone(&outcome.zone).await.unwrap();
    let arrived = meadow.lock().await.entity(login.entity).map(|e| e.pos);
    assert_eq!(arrived, Some(outcome.pos));

    h.world.shutdown().await;
}

// ---------------------------------------------------------------------------
// R1 — logout snapshot round trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_then_login_restores_the_character() {
    let h = boot(RealmConfig::default()).await;
    let w = wallet("r1");

    let login = h.dispatcher.login(&w, "Sylwen", Race::Elf, Class::Ranger).await;
    let Ok(first) = login else {
        return;
    };
    let zone = h.world.require_zone(&first.zone).await.unwrap();

    place(&zone, first.entity, Position::new(99, 77)).await;
    tweak_player(&zone, first.entity, |p| {
        p.level = 7;
        p.xp = 2_450;
        p.kills = 31;
        p.completed_quests.push(QuestId::from("rat_extermination"));
        p.learned_techniques.insert(TechniqueId::from("ember_bolt"));
        p.professions.insert(mistvale_types::Profession::Herbalism);
    })
    .await;

    let out = h.dispatcher.logout(&w, first.entity).await;
    assert!(out.is_ok(), "logout failed: {out:?}");
    assert!(zone.lock().await.entity(first.entity).is_none());

    let second = h.dispatcher.login(&w, "ignored", Race::Human, Class::Warrior).await;
    let Ok(second) = second else {
        return;
    };
    assert_eq!(second.zone, first.zone);
    assert_eq!(second.level, 7);

    let restored = read_player(&zone, second.entity).await;
    let Some(restored) = restored else {
        return;
    };
    assert_eq!(restored.level, 7);
    assert_eq!(restored.xp, 2_450);
    assert_eq!(restored.kills, 31);
    assert_eq!(restored.race, Race::Elf);
    assert_eq!(restored.class, Class::Ranger);
    assert_eq!(
        restored.completed_quests,
        vec![QuestId::from("rat_extermination")]
    );
    assert!(restored.learned_techniques.contains(&TechniqueId::from("ember_bolt")));
    assert!(restored.professions.contains(&mistvale_types::Profession::Herbalism));
    let pos = zone.lock().await.entity(second.entity).map(|e| e.pos);
    assert_eq!(pos, Some(Position::new(99, 77)));

    // Same wallet cannot double-login.
    let third = h.dispatcher.login(&w, "x", Race::Human, Class::Mage).await;
    assert!(matches!(third, Err(ActionError::Conflict { .. })));

    h.world.shutdown().await;
}

// ---------------------------------------------------------------------------
// P1 — party membership stays exclusive through the dispatcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn party_flow_through_the_dispatcher() {
    let h = boot(RealmConfig::default()).await;
    let (w1, w2) = (wallet("p1a"), wallet("p1b"));

    let a = h.dispatcher.login(&w1, "Ava", Race::Human, Class::Warrior).await;
    let b = h.dispatcher.login(&w2, "Bron", Race::Dwarf, Class::Warrior).await;
    let (Ok(a), Ok(b)) = (a, b) else {
        return;
    };

    let created = h.dispatcher.party_create(&w1, &a.zone, a.entity).await;
    assert!(created.is_ok());
    let invited = h
        .dispatcher
        .party_invite(&w1, &a.zone, a.entity, b.entity)
        .await;
    assert!(invited.is_ok());
    let joined = h.dispatcher.party_join(&w2, &b.zone, b.entity).await;
    assert!(joined.is_ok());

    assert_eq!(
        h.parties.party_of(a.entity).map(|p| p.members.len()),
        Some(2)
    );
    // P1: the member cannot create a second party.
    assert!(matches!(
        h.dispatcher.party_create(&w2, &b.zone, b.entity).await,
        Err(ActionError::Conflict { .. })
    ));

    h.world.shutdown().await;
}
