//! Integration tests for prosim_runtime.
//!
//! Sessions are in-memory; every test builds its own registry.

use std::sync::Arc;
use std::thread;

use prosim_engine::domain::ProductLine;
use prosim_engine::{Decisions, SimError, SimulationConfig};

use prosim_runtime::drift;
use prosim_runtime::replay;
use prosim_runtime::session::{GameSession, SessionRegistry};
use prosim_runtime::snapshot;
use prosim_runtime::RuntimeError;

const SEED: u64 = 42;

fn week_decisions(week: u32) -> Decisions {
    let mut d = Decisions::idle(week, 1, 9)
        .with_budgets(750.0, 500.0)
        .with_raw_material_orders(6000.0, 0.0);
    for id in 1..=9 {
        d = d.schedule(id, ProductLine::ALL[((id - 1) % 3) as usize], 40.0);
    }
    d
}

fn played_session(id: &str, weeks: u32, interval: u32) -> GameSession {
    let mut session = GameSession::new(id, SimulationConfig::default(), 1, SEED, interval).unwrap();
    for week in 1..=weeks {
        session.submit_week(&week_decisions(week)).unwrap();
    }
    session
}

// ─────────────────────────────────────────────────────────────
// Test 1: replay_matches_live_session
// ─────────────────────────────────────────────────────────────

#[test]
fn replay_matches_live_session() {
    let session = played_session("replay", 6, 0);
    let live = session.current_hash().unwrap();
    let (company, hash) = replay::rebuild_company(session.config(), 1, session.history()).unwrap();
    assert_eq!(hash, live, "Replay hash does not match live session hash");
    assert_eq!(&company, session.company());
    assert_eq!(session.verify_replay().unwrap(), live);
}

// ─────────────────────────────────────────────────────────────
// Test 2: determinism_across_replays
// ─────────────────────────────────────────────────────────────

#[test]
fn determinism_across_replays() {
    let session = played_session("determinism", 8, 0);
    let hash = drift::verify_determinism(session.config(), 1, session.history()).unwrap();
    assert_eq!(hash, session.current_hash().unwrap());
}

// ─────────────────────────────────────────────────────────────
// Test 3: rejected_week_leaves_session_unchanged
// ─────────────────────────────────────────────────────────────

#[test]
fn rejected_week_leaves_session_unchanged() {
    let mut session = played_session("rejected", 2, 0);
    let before = session.current_hash().unwrap();

    let mut bad = week_decisions(3);
    bad.machines[0].scheduled_hours = 70.0;
    assert!(!session.preview(&bad).is_valid());

    let err = session.submit_week(&bad).unwrap_err();
    assert!(matches!(err, RuntimeError::Sim(SimError::Validation(_))));
    assert_eq!(session.current_hash().unwrap(), before);
    assert_eq!(session.history().len(), 2);

    // Week out of order is also rejected.
    assert!(session.submit_week(&week_decisions(5)).is_err());
    assert_eq!(session.current_week(), 2);
}

// ─────────────────────────────────────────────────────────────
// Test 4: concurrent_sessions_isolated
// ─────────────────────────────────────────────────────────────

#[test]
fn concurrent_sessions_isolated() {
    let registry = Arc::new(SessionRegistry::new(SimulationConfig::default(), 0).unwrap());

    let handles: Vec<_> = ["a", "b"]
        .iter()
        .map(|id| {
            let registry = Arc::clone(&registry);
            let id = id.to_string();
            thread::spawn(move || {
                let session = registry.get_or_create(&id, 1, SEED).unwrap();
                for week in 1..=4 {
                    session.submit_week(&week_decisions(week)).unwrap();
                }
                session.current_hash().unwrap()
            })
        })
        .collect();
    let hashes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Same seed and decisions in separate sessions land on the same company.
    assert_eq!(hashes[0], hashes[1]);
    assert_eq!(registry.session_ids().unwrap(), vec!["a".to_string(), "b".to_string()]);

    let a = registry.get("a").unwrap().unwrap();
    a.submit_week(&week_decisions(5)).unwrap();
    let b = registry.get_or_create("b", 1, SEED).unwrap();
    assert_eq!(a.current_week().unwrap(), 5);
    assert_eq!(b.current_week().unwrap(), 4);

    assert!(registry.remove("a").unwrap().is_some());
    assert!(registry.get("a").unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────
// Test 5: engine_version_rejection
// ─────────────────────────────────────────────────────────────

#[test]
fn engine_version_rejection() {
    let session = played_session("version", 1, 0);
    let mut snap = snapshot::take_snapshot(session.company()).unwrap();
    snap.engine_version = 999;
    match snapshot::restore_snapshot(&snap) {
        Err(RuntimeError::Snapshot(message)) => assert!(message.contains("999")),
        other => panic!("expected snapshot error, got {:?}", other),
    }
}

// ─────────────────────────────────────────────────────────────
// Test 6: corrupted_snapshot_detection
// ─────────────────────────────────────────────────────────────

#[test]
fn corrupted_snapshot_detection() {
    let session = played_session("corrupt", 2, 0);
    let mut snap = snapshot::take_snapshot(session.company()).unwrap();
    assert!(snapshot::verify_snapshot_hash(&snap));

    snap.canonical_json = snap.canonical_json.replacen("\"current_week\":2", "\"current_week\":3", 1);
    assert!(!snapshot::verify_snapshot_hash(&snap));
    assert!(matches!(
        snapshot::restore_snapshot(&snap),
        Err(RuntimeError::Snapshot(_))
    ));
}

// ─────────────────────────────────────────────────────────────
// Test 7: snapshot_replay_parity
// ─────────────────────────────────────────────────────────────

#[test]
fn snapshot_replay_parity() {
    let session = played_session("parity", 7, 3);
    let weeks: Vec<u32> = [3, 6].iter().filter_map(|w| session.snapshots().get(*w).map(|s| s.week)).collect();
    assert_eq!(weeks, vec![3, 6]);
    assert_eq!(session.snapshots().len(), 2);

    let latest = session.snapshots().latest().unwrap();
    let at_six = snapshot::restore_snapshot(latest).unwrap();
    assert_eq!(at_six.current_week(), 6);

    let restored = session.restore().unwrap();
    assert_eq!(&restored, session.company());
}

// ─────────────────────────────────────────────────────────────
// Test 8: drift_report_tracks_changes
// ─────────────────────────────────────────────────────────────

#[test]
fn drift_report_tracks_changes() {
    let early = played_session("early", 1, 0);
    let late = played_session("late", 3, 0);

    let same = drift::compare_companies(early.company(), early.company());
    assert!(same.is_empty());

    let report = drift::compare_companies(early.company(), late.company());
    assert_eq!(report.week_delta, 2);
    assert_eq!(report.headcount_delta, 0);
    assert!(report.total_costs_delta > 0.0);
    assert_eq!(report.inventory.len(), 7);
    assert!(!report.is_empty());
}

// ─────────────────────────────────────────────────────────────
// Test 9: full_game_then_game_over
// ─────────────────────────────────────────────────────────────

#[test]
fn full_game_then_game_over() {
    let mut session = played_session("full", 15, 5);
    assert!(session.is_game_over());
    assert_eq!(session.history().len(), 15);
    let err = session.submit_week(&week_decisions(16)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Sim(SimError::GameOver { max_weeks: 15 })
    ));
    assert_eq!(session.restore().unwrap(), *session.company());
}
