//! End-to-end scenarios against the world store.
//!
//! Each test drives a [`WorldStore`] through its public operations only and
//! checks the resulting world and audit trail.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::json;
use worldtick_core::{
    CoreError, EntryError, SimulationConfig, StubEntryVerifier, WorldStore,
};
use worldtick_types::{ActionPayload, AgentId, DenialReason, EventKind, Goal, PendingReaction};

fn events_at(store: &WorldStore, tick: u64) -> Vec<EventKind> {
    store
        .recent_logs(500)
        .into_iter()
        .filter(|e| e.tick == tick)
        .map(|e| e.event)
        .collect()
}

fn tx(n: u8) -> String {
    format!("0x{}", format!("{n:02x}").repeat(32))
}

#[test]
fn a_broke_agent_cannot_move() {
    let store = WorldStore::default();
    let charlie = store.join("charlie", 0).unwrap();

    store
        .enqueue_action(charlie.id, ActionPayload::move_to("market"))
        .unwrap();
    let report = store.tick_step(1).unwrap();

    assert_eq!(report.tick, 1);
    assert_eq!(report.applied_actions, 0);
    assert_eq!(report.denied_actions, 1);
    let after = store.agent(charlie.id).unwrap();
    assert_eq!(after.pos, "spawn");
    assert_eq!(after.balance_mon, 0);
    assert_eq!(
        events_at(&store, 1),
        vec![EventKind::MoveDeniedInsufficientFunds, EventKind::Tick]
    );
}

#[test]
fn the_workshop_runs_out_of_capacity() {
    let store = WorldStore::default();
    let alice = store.join("alice", 10).unwrap();

    store
        .enqueue_action(alice.id, ActionPayload::move_to("workshop"))
        .unwrap();
    store.tick_step(1).unwrap();
    let moved = store.agent(alice.id).unwrap();
    assert_eq!((moved.pos.as_str(), moved.balance_mon), ("workshop", 9));
    assert_eq!(
        events_at(&store, 1),
        vec![EventKind::MoveCost, EventKind::Move, EventKind::Tick]
    );

    store.enqueue_action(alice.id, ActionPayload::earn(3)).unwrap();
    store.enqueue_action(alice.id, ActionPayload::earn(3)).unwrap();
    let report = store.tick_step(1).unwrap();

    assert_eq!(report.applied_actions, 1);
    let after = store.agent(alice.id).unwrap();
    assert_eq!(after.balance_mon, 12);
    assert_eq!(after.cooldown_until_tick, 4);
    assert_eq!(
        after.pending_reaction,
        Some(PendingReaction {
            reason: DenialReason::Capacity,
            denied_at_tick: 2,
        })
    );
    assert_eq!(store.metrics().workshop_capacity_left, 0);
    assert_eq!(
        events_at(&store, 2),
        vec![
            EventKind::Earn,
            EventKind::EarnDeniedCapacity,
            EventKind::CooldownPenalty,
            EventKind::Tick,
        ]
    );

    store.tick_step(1).unwrap();
    assert_eq!(store.metrics().workshop_capacity_left, 1);
}

#[test]
fn transfers_cannot_overdraw() {
    let store = WorldStore::default();
    let bob = store.join("bob", 2).unwrap();
    let alice = store.join("alice", 10).unwrap();

    store
        .enqueue_action(bob.id, ActionPayload::transfer(alice.id, 5))
        .unwrap();
    store.tick_step(1).unwrap();

    assert_eq!(store.agent(bob.id).unwrap().balance_mon, 2);
    assert_eq!(store.agent(alice.id).unwrap().balance_mon, 10);
    let denial = store
        .recent_logs(10)
        .into_iter()
        .find(|e| e.event == EventKind::TransferDeniedInsufficientFunds)
        .unwrap();
    assert_eq!(denial.data["agent_id"], 1);
    assert_eq!(denial.data["amount"], 5);
}

#[test]
fn a_wanderer_cycles_through_every_location() {
    let store = WorldStore::default();
    let bob = store.join("bob", 5).unwrap();
    store.enable_auto(bob.id).unwrap();
    store.set_goal(bob.id, Goal::Wander).unwrap();

    let mut path = Vec::new();
    for _ in 0..3 {
        let report = store.auto_tick(None).unwrap();
        assert_eq!(report.auto.generated_actions.len(), 1);
        path.push(store.agent(bob.id).unwrap().pos);
    }

    assert_eq!(path, vec!["market", "workshop", "spawn"]);
    assert_eq!(store.agent(bob.id).unwrap().balance_mon, 2);
    assert_eq!(store.metrics().tick, 3);
}

#[test]
fn the_basic_auto_scenario_explains_itself() {
    let store = WorldStore::default();
    store.load_scenario("basic_auto").unwrap();

    let first = store.auto_tick(None).unwrap();
    assert_eq!(first.auto.generated_actions.len(), 2);
    store.auto_tick(None).unwrap();
    store.auto_tick(None).unwrap();

    let balances: Vec<(u64, String)> = store
        .world()
        .agents
        .into_iter()
        .map(|a| (a.balance_mon, a.pos))
        .collect();
    assert_eq!(
        balances,
        vec![
            (11, "workshop".to_owned()),
            (0, "workshop".to_owned()),
            (0, "spawn".to_owned()),
        ]
    );

    let lines = store.explain_agent(AgentId(2), 50).unwrap();
    assert!(lines.contains(
        &"tick 0: auto decision agent=2 goal=wander reason=wander -> move spawn -> market chosen=move {\"to\":\"market\"}"
            .to_owned()
    ));
    assert!(lines.contains(&"tick 2: auto decision agent=2 goal=wander reason=insufficient funds for move chosen=none".to_owned()));

    let recent = store.explain_recent(1);
    assert_eq!(recent, vec!["tick 3: tick step applied_actions=1"]);
}

#[test]
fn snapshots_survive_a_trip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("world.json");

    let source = WorldStore::default();
    source.load_scenario("basic").unwrap();
    source
        .enqueue_action(AgentId(1), ActionPayload::move_to("market"))
        .unwrap();
    source.tick_step(1).unwrap();
    source
        .enqueue_action(AgentId(2), ActionPayload::say("hello"))
        .unwrap();
    let saved = source.save_to_path(Some(&path), Some(true)).unwrap();
    assert_eq!(saved.path, path);

    let target = WorldStore::default();
    let loaded = target.load_from_path(Some(&path)).unwrap();
    assert_eq!(loaded.tick, 1);
    assert_eq!(loaded.agents, 3);

    let before = source.state();
    let after = target.state();
    assert_eq!(after.agents, before.agents);
    assert_eq!(after.action_queue, before.action_queue);
    assert_eq!(after.economy, before.economy);
    assert_eq!(after.locations, before.locations);

    let dave = target.join("dave", 1).unwrap();
    assert_eq!(dave.id, AgentId(4));
}

#[test]
fn resetting_twice_changes_nothing() {
    let store = WorldStore::default();
    store.load_scenario("basic").unwrap();
    store.tick_step(3).unwrap();

    store.reset_world(false);
    let once = store.world();
    store.reset_world(false);
    let twice = store.world();

    assert_eq!(once, twice);
    assert_eq!(twice.tick, 0);
    assert!(twice.agents.is_empty());
    assert_eq!(store.metrics().workshop_capacity_left, 1);
}

#[test]
fn malformed_loaded_amounts_are_denied_when_applied() {
    let store = WorldStore::default();
    let document = json!({
        "schema_version": "1",
        "saved_at": 1_700_000_000.5,
        "world_state": {
            "tick": "4",
            "agents": [
                { "id": 3, "name": "alice", "balance_mon": 5, "pos": "workshop", "status": "active" },
                { "id": 0, "name": "ghost" },
            ],
            "action_queue": [
                { "queued_at_tick": 4, "agent_id": 3, "type": "earn", "payload": { "amount": "lots" } },
                { "queued_at_tick": 4, "agent_id": 3, "type": "dance", "payload": {} },
            ],
            "logs": [],
        },
    });
    let receipt = store.load_snapshot(&document).unwrap();
    assert_eq!(receipt.tick, 4);
    assert_eq!(receipt.agents, 1);
    assert_eq!(store.metrics().queued_actions, 1);

    store.tick_step(1).unwrap();
    assert_eq!(
        events_at(&store, 5),
        vec![EventKind::EarnDeniedInvalidAmount, EventKind::Tick]
    );
    assert_eq!(store.agent(AgentId(3)).unwrap().balance_mon, 5);
    assert_eq!(store.join("bob", 0).unwrap().id, AgentId(4));
}

#[test]
fn replay_protection_outlives_scenario_loads() {
    let store = WorldStore::default();
    let verifier = StubEntryVerifier::default();
    store.join_with_entry("alice", 3, &tx(9), &verifier).unwrap();

    store.load_scenario("basic").unwrap();
    let err = store
        .join_with_entry("eve", 3, &tx(9), &verifier)
        .unwrap_err();
    assert!(matches!(err, CoreError::Entry(EntryError::ReplayedTx(_))));

    store.reset_world(false);
    assert!(store.join_with_entry("eve", 3, &tx(9), &verifier).is_ok());
}

#[test]
fn paid_entry_can_be_mandatory() {
    let mut config = SimulationConfig::default();
    config.entry.allow_free_join = false;
    let store = WorldStore::new(&config);

    let err = store.join("alice", 1).unwrap_err();
    assert!(matches!(err, CoreError::Entry(EntryError::PaymentRequired)));
    assert!(err.is_domain_rejection());

    let err = store
        .join_with_entry("alice", 1, "0xnot-a-hash", &StubEntryVerifier::default())
        .unwrap_err();
    assert!(matches!(err, CoreError::Entry(EntryError::InvalidTxHash(_))));
    assert_eq!(store.metrics().agents, 0);
}

#[test]
fn unrecognized_tags_are_explained_and_saved_back() {
    let store = WorldStore::default();
    let document = json!({
        "schema_version": "1",
        "saved_at": 0,
        "world_state": {
            "tick": 1,
            "agents": [
                { "id": 1, "name": "mallory", "balance_mon": 2, "status": "banned" },
                { "id": 2, "name": "trent", "balance_mon": 4, "status": "inactive" },
            ],
            "logs": [
                { "time": "2024-01-01T00:00:00Z", "tick": 1, "event": "entry_refunded",
                  "data": { "agent_id": 1 } },
            ],
        },
    });
    store.load_snapshot(&document).unwrap();

    assert_eq!(
        store.explain_agent(AgentId(1), 10).unwrap(),
        vec!["tick 1: entry_refunded {\"agent_id\":1}"]
    );
    assert!(!store.agent(AgentId(1)).unwrap().is_active());

    let saved = store.save_snapshot(true).unwrap();
    let world = &saved["world_state"];
    assert_eq!(world["agents"][0]["status"], "banned");
    assert_eq!(world["agents"][1]["status"], "inactive");
    assert_eq!(world["logs"][0]["event"], "entry_refunded");
    assert_eq!(world["logs"][1]["event"], "persist_load");
}
