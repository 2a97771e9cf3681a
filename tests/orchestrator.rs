//! Orchestrator integration tests.
//!
//! Drives `engine::run_once` against a deterministic in-memory arena
//! and state store — no network, no disk. Covers the cron-safety
//! contract (closed window = zero effect), the dead-zone skip, the
//! success-append path, and the failure-no-mutation guarantee.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use augur::api::{ArenaApi, PlacedBet};
use augur::engine::{self, Credential, RunOutcome};
use augur::storage::{StateStore, HISTORY_RETENTION};
use augur::types::*;

// ---------------------------------------------------------------------------
// Mock arena
// ---------------------------------------------------------------------------

/// A mock arena with controllable round status, signal, and bet
/// behaviour. Counts calls so tests can assert what was (not) hit.
struct MockArena {
    round: RoundStatus,
    signal: SignalSnapshot,
    /// If set, `place_bet` fails with this message.
    bet_error: Option<String>,
    bets: Vec<BetSummary>,
    signal_calls: AtomicUsize,
    bet_calls: AtomicUsize,
}

impl MockArena {
    fn open(signal: SignalSnapshot) -> Self {
        Self {
            round: RoundStatus {
                prediction_open: true,
                next_signal_in: None,
                next_prediction_window: None,
            },
            signal,
            bet_error: None,
            bets: Vec::new(),
            signal_calls: AtomicUsize::new(0),
            bet_calls: AtomicUsize::new(0),
        }
    }

    fn closed() -> Self {
        let mut arena = Self::open(neutral_signal());
        arena.round = RoundStatus {
            prediction_open: false,
            next_signal_in: Some("4h 30m".to_string()),
            next_prediction_window: Some("21:00 UTC".to_string()),
        };
        arena
    }
}

#[async_trait]
impl ArenaApi for MockArena {
    async fn round_status(&self) -> Result<RoundStatus> {
        Ok(self.round.clone())
    }

    async fn fetch_signal(&self) -> Result<SignalSnapshot> {
        self.signal_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.signal.clone())
    }

    async fn register(&self, name: &str, _wallet_address: &str) -> Result<Registration> {
        Ok(Registration {
            record: AgentRecord {
                agent_id: "mock-agent-1".to_string(),
                api_key: "mock-key".to_string(),
                name: name.to_string(),
            },
            welcome_bonus: Some(1000.0),
        })
    }

    async fn place_bet(
        &self,
        _api_key: &str,
        direction: Direction,
        _round_type: &str,
    ) -> Result<PlacedBet> {
        self.bet_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.bet_error {
            return Err(anyhow!("{msg}"));
        }
        Ok(PlacedBet {
            receipt: BetReceipt {
                id: "mock-bet-1".to_string(),
                direction,
                btc_price_at_bet: self.signal.btc_price,
                resolve_after: Some("2026-08-24T21:00:00Z".to_string()),
            },
            blind: true,
        })
    }

    async fn list_bets(&self, _agent_name: &str) -> Result<Vec<BetSummary>> {
        Ok(self.bets.clone())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory `StateStore` double.
#[derive(Default)]
struct MemoryStore {
    agent: Mutex<Option<AgentRecord>>,
    history: Mutex<Vec<PredictionRecord>>,
}

impl MemoryStore {
    fn with_agent(record: AgentRecord) -> Self {
        let store = Self::default();
        *store.agent.lock().unwrap() = Some(record);
        store
    }

    fn history_snapshot(&self) -> Vec<PredictionRecord> {
        self.history.lock().unwrap().clone()
    }
}

impl StateStore for MemoryStore {
    fn load_agent(&self) -> Option<AgentRecord> {
        self.agent.lock().unwrap().clone()
    }

    fn save_agent(&self, record: &AgentRecord) -> Result<()> {
        *self.agent.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    fn load_history(&self) -> Vec<PredictionRecord> {
        self.history_snapshot()
    }

    fn append_history(&self, entry: PredictionRecord) -> Result<()> {
        let mut history = self.history.lock().unwrap();
        history.push(entry);
        if history.len() > HISTORY_RETENTION {
            let excess = history.len() - HISTORY_RETENTION;
            history.drain(..excess);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn neutral_signal() -> SignalSnapshot {
    SignalSnapshot {
        btc_price: 97_500.0,
        price_change_24h: 0.0,
        fear_greed: None,
        oracle: None,
        signal_strength: 0.0,
    }
}

/// Worked example from the strategy: extreme fear + confident oracle
/// UP → score 3.6 → UP.
fn strong_up_signal() -> SignalSnapshot {
    SignalSnapshot {
        btc_price: 97_500.0,
        price_change_24h: -1.2,
        fear_greed: Some(15),
        oracle: Some(OracleReading {
            direction: Direction::Up,
            confidence: 0.8,
        }),
        signal_strength: 0.2,
    }
}

/// Weak oracle DOWN with neutral fear/greed → score -0.4 → dead zone.
fn dead_zone_signal() -> SignalSnapshot {
    SignalSnapshot {
        btc_price: 97_500.0,
        price_change_24h: 0.3,
        fear_greed: Some(50),
        oracle: Some(OracleReading {
            direction: Direction::Down,
            confidence: 0.2,
        }),
        signal_strength: 0.1,
    }
}

fn credential() -> Credential {
    Credential {
        api_key: "test-key".to_string(),
        agent_name: Some("augur-test".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Window gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_closed_window_short_circuits_everything() {
    let arena = MockArena::closed();
    let store = MemoryStore::default();

    let outcome = engine::run_once(&arena, &store, &credential(), "daily")
        .await
        .unwrap();

    match outcome {
        RunOutcome::WindowClosed { next_window } => {
            assert_eq!(next_window.as_deref(), Some("21:00 UTC"));
        }
        other => panic!("expected WindowClosed, got {other:?}"),
    }

    // Cron-safety: nothing downstream was touched.
    assert_eq!(arena.signal_calls.load(Ordering::SeqCst), 0);
    assert_eq!(arena.bet_calls.load(Ordering::SeqCst), 0);
    assert!(store.history_snapshot().is_empty());
}

// ---------------------------------------------------------------------------
// Dead zone
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dead_zone_skips_submission() {
    let arena = MockArena::open(dead_zone_signal());
    let store = MemoryStore::default();

    let outcome = engine::run_once(&arena, &store, &credential(), "daily")
        .await
        .unwrap();

    match outcome {
        RunOutcome::NoConviction { decision } => {
            assert!((decision.score - (-0.4)).abs() < 1e-10);
            assert_eq!(decision.reasons, vec!["oracle_DOWN(conf=0.20)"]);
        }
        other => panic!("expected NoConviction, got {other:?}"),
    }

    assert_eq!(arena.signal_calls.load(Ordering::SeqCst), 1);
    assert_eq!(arena.bet_calls.load(Ordering::SeqCst), 0);
    assert!(store.history_snapshot().is_empty());
}

#[tokio::test]
async fn test_empty_signal_skips_submission() {
    let arena = MockArena::open(neutral_signal());
    let store = MemoryStore::default();

    let outcome = engine::run_once(&arena, &store, &credential(), "daily")
        .await
        .unwrap();

    match outcome {
        RunOutcome::NoConviction { decision } => {
            assert_eq!(decision.score, 0.0);
            assert!(decision.reasons.is_empty());
        }
        other => panic!("expected NoConviction, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_strong_signal_places_and_records() {
    let arena = MockArena::open(strong_up_signal());
    let store = MemoryStore::default();

    let outcome = engine::run_once(&arena, &store, &credential(), "daily")
        .await
        .unwrap();

    let record = match outcome {
        RunOutcome::Placed { record } => record,
        other => panic!("expected Placed, got {other:?}"),
    };

    assert_eq!(record.direction, Direction::Up);
    assert_eq!(record.bet_id, "mock-bet-1");
    assert!(record.blind);
    assert!((record.score - 3.6).abs() < 1e-10);
    assert_eq!(
        record.reasons,
        vec!["extreme_fear(15)", "oracle_UP(conf=0.80)"],
    );
    assert!((record.btc_price_at_bet - 97_500.0).abs() < 1e-10);

    // Exactly one history entry was appended.
    let history = store.history_snapshot();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], record);

    assert_eq!(arena.bet_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_down_signal_places_down() {
    let signal = SignalSnapshot {
        fear_greed: Some(85), // extreme_greed → -2.0
        oracle: Some(OracleReading {
            direction: Direction::Down,
            confidence: 0.6, // -1.2
        }),
        ..neutral_signal()
    };
    let arena = MockArena::open(signal);
    let store = MemoryStore::default();

    let outcome = engine::run_once(&arena, &store, &credential(), "weekly")
        .await
        .unwrap();

    match outcome {
        RunOutcome::Placed { record } => {
            assert_eq!(record.direction, Direction::Down);
            assert!((record.score - (-3.2)).abs() < 1e-10);
        }
        other => panic!("expected Placed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bet_failure_leaves_history_untouched() {
    let mut arena = MockArena::open(strong_up_signal());
    arena.bet_error = Some("arena rejected the bet".to_string());
    let store = MemoryStore::default();

    let result = engine::run_once(&arena, &store, &credential(), "daily").await;
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("rejected"));

    // Submission failed → no partial state mutation.
    assert!(store.history_snapshot().is_empty());
    assert_eq!(arena.bet_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_history_retention_across_runs() {
    let arena = MockArena::open(strong_up_signal());
    let store = MemoryStore::default();

    // Pre-fill to the retention cap.
    for i in 0..HISTORY_RETENTION {
        store
            .append_history(PredictionRecord {
                date: "2026-05-01".to_string(),
                direction: Direction::Down,
                score: -1.0,
                reasons: vec![],
                blind: false,
                bet_id: format!("old-{i}"),
                btc_price_at_bet: 90_000.0,
            })
            .unwrap();
    }

    engine::run_once(&arena, &store, &credential(), "daily")
        .await
        .unwrap();

    let history = store.history_snapshot();
    assert_eq!(history.len(), HISTORY_RETENTION);
    // Oldest evicted, newest appended, order preserved.
    assert_eq!(history[0].bet_id, "old-1");
    assert_eq!(history[HISTORY_RETENTION - 1].bet_id, "mock-bet-1");
}

// ---------------------------------------------------------------------------
// Credential resolution
// ---------------------------------------------------------------------------

#[test]
fn test_env_key_takes_precedence_over_record() {
    let store = MemoryStore::with_agent(AgentRecord {
        agent_id: "agent-1".to_string(),
        api_key: "stored-key".to_string(),
        name: "stored-name".to_string(),
    });

    let credential =
        engine::resolve_credential(&store, Some("env-key".to_string())).unwrap();
    assert_eq!(credential.api_key, "env-key");
    assert!(credential.agent_name.is_none());
}

#[test]
fn test_stored_record_supplies_key_and_name() {
    let store = MemoryStore::with_agent(AgentRecord {
        agent_id: "agent-1".to_string(),
        api_key: "stored-key".to_string(),
        name: "stored-name".to_string(),
    });

    let credential = engine::resolve_credential(&store, None).unwrap();
    assert_eq!(credential.api_key, "stored-key");
    assert_eq!(credential.agent_name.as_deref(), Some("stored-name"));
}

#[test]
fn test_no_credential_is_a_distinct_error() {
    let store = MemoryStore::default();
    let err = engine::resolve_credential(&store, None).unwrap_err();
    assert!(matches!(err, AugurError::MissingCredential));
}

// ---------------------------------------------------------------------------
// Registration path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_registration_persists_agent_record() {
    let arena = MockArena::open(neutral_signal());
    let store = MemoryStore::default();

    let registration = arena.register("augur-fresh", "0xabc").await.unwrap();
    store.save_agent(&registration.record).unwrap();

    let loaded = store.load_agent().unwrap();
    assert_eq!(loaded.name, "augur-fresh");
    assert_eq!(loaded.api_key, "mock-key");

    // The saved record now satisfies credential resolution.
    let credential = engine::resolve_credential(&store, None).unwrap();
    assert_eq!(credential.api_key, "mock-key");
}
