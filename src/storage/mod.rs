//! Persistence layer.
//!
//! Two independent JSON documents: the agent record (identity +
//! credentials, written once at registration) and the bounded
//! prediction history. Both are read-modify-write whole files —
//! no partial updates, no locking. Concurrent invocations must be
//! serialized by the caller (the cron scheduler).
//!
//! Load paths fall back silently to empty: a missing or corrupt
//! state file means "start fresh", because the arena — not the local
//! disk — is the source of truth for identity and bet outcomes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::{AgentRecord, PredictionRecord};

/// Maximum number of history entries retained (~90 daily rounds).
pub const HISTORY_RETENTION: usize = 90;

/// Default agent record file path.
pub const DEFAULT_AGENT_FILE: &str = "augur_agent.json";
/// Default prediction history file path.
pub const DEFAULT_HISTORY_FILE: &str = "augur_history.json";

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Abstraction over local agent state so the run orchestrator can be
/// tested without real file I/O.
pub trait StateStore {
    /// Load the saved agent record. Absence is not an error.
    fn load_agent(&self) -> Option<AgentRecord>;

    /// Persist the agent record (full overwrite). Called exactly once,
    /// at first successful registration.
    fn save_agent(&self, record: &AgentRecord) -> Result<()>;

    /// Load the prediction history, oldest first. Absent or corrupt
    /// files yield an empty history.
    fn load_history(&self) -> Vec<PredictionRecord>;

    /// Append one entry, trim to the most recent `HISTORY_RETENTION`
    /// entries (oldest-first eviction), and persist the whole sequence.
    /// Only called after a confirmed bet placement.
    fn append_history(&self, entry: PredictionRecord) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// File-backed store holding the two JSON documents.
pub struct JsonStore {
    agent_path: PathBuf,
    history_path: PathBuf,
}

impl JsonStore {
    pub fn new(agent_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            agent_path: agent_path.into(),
            history_path: history_path.into(),
        }
    }

    /// Store using the default file names in the working directory.
    pub fn default_paths() -> Self {
        Self::new(DEFAULT_AGENT_FILE, DEFAULT_HISTORY_FILE)
    }

    /// Read and parse a JSON file, mapping every failure mode
    /// (missing, unreadable, unparsable) to None with a log line.
    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
        if !path.exists() {
            debug!(path = %path.display(), "No state file, starting fresh");
            return None;
        }
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "State file unreadable, starting fresh");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "State file corrupt, starting fresh");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialise state")?;
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write state to {}", path.display()))?;
        debug!(path = %path.display(), "State saved");
        Ok(())
    }
}

impl StateStore for JsonStore {
    fn load_agent(&self) -> Option<AgentRecord> {
        Self::read_json(&self.agent_path)
    }

    fn save_agent(&self, record: &AgentRecord) -> Result<()> {
        Self::write_json(&self.agent_path, record)
    }

    fn load_history(&self) -> Vec<PredictionRecord> {
        Self::read_json(&self.history_path).unwrap_or_default()
    }

    fn append_history(&self, entry: PredictionRecord) -> Result<()> {
        let mut history = self.load_history();
        history.push(entry);
        if history.len() > HISTORY_RETENTION {
            let excess = history.len() - HISTORY_RETENTION;
            history.drain(..excess);
        }
        Self::write_json(&self.history_path, &history)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn temp_store() -> (JsonStore, PathBuf, PathBuf) {
        let dir = std::env::temp_dir();
        let agent = dir.join(format!("augur_test_agent_{}.json", uuid::Uuid::new_v4()));
        let history = dir.join(format!("augur_test_history_{}.json", uuid::Uuid::new_v4()));
        (JsonStore::new(&agent, &history), agent, history)
    }

    fn cleanup(paths: &[&PathBuf]) {
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }

    fn make_record(bet_id: &str) -> PredictionRecord {
        PredictionRecord {
            date: "2026-08-23".to_string(),
            direction: Direction::Up,
            score: 2.1,
            reasons: vec!["extreme_fear(12)".to_string()],
            blind: true,
            bet_id: bet_id.to_string(),
            btc_price_at_bet: 97_000.0,
        }
    }

    // -- Agent record --

    #[test]
    fn test_agent_save_and_load() {
        let (store, agent, history) = temp_store();
        let record = AgentRecord {
            agent_id: "agent-1".to_string(),
            api_key: "augur_key".to_string(),
            name: "augur-test".to_string(),
        };

        store.save_agent(&record).unwrap();
        let loaded = store.load_agent().unwrap();
        assert_eq!(loaded, record);

        cleanup(&[&agent, &history]);
    }

    #[test]
    fn test_agent_load_missing_is_none() {
        let (store, agent, history) = temp_store();
        assert!(store.load_agent().is_none());
        cleanup(&[&agent, &history]);
    }

    #[test]
    fn test_agent_load_corrupt_is_none() {
        let (store, agent, history) = temp_store();
        std::fs::write(&agent, "{not json at all").unwrap();
        assert!(store.load_agent().is_none());
        cleanup(&[&agent, &history]);
    }

    // -- History --

    #[test]
    fn test_history_load_missing_is_empty() {
        let (store, agent, history) = temp_store();
        assert!(store.load_history().is_empty());
        cleanup(&[&agent, &history]);
    }

    #[test]
    fn test_history_load_corrupt_is_empty() {
        let (store, agent, history) = temp_store();
        std::fs::write(&history, "[[[garbage").unwrap();
        assert!(store.load_history().is_empty());
        cleanup(&[&agent, &history]);
    }

    #[test]
    fn test_history_append_preserves_order() {
        let (store, agent, history) = temp_store();

        store.append_history(make_record("bet-1")).unwrap();
        store.append_history(make_record("bet-2")).unwrap();
        store.append_history(make_record("bet-3")).unwrap();

        let loaded = store.load_history();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].bet_id, "bet-1");
        assert_eq!(loaded[2].bet_id, "bet-3");

        cleanup(&[&agent, &history]);
    }

    #[test]
    fn test_history_retention_evicts_oldest() {
        let (store, agent, history) = temp_store();

        // Seed a full 90-entry history directly.
        let full: Vec<PredictionRecord> =
            (0..HISTORY_RETENTION).map(|i| make_record(&format!("bet-{i}"))).collect();
        JsonStore::write_json(&history, &full).unwrap();

        // The 91st append evicts bet-0 and keeps relative order.
        store.append_history(make_record("bet-new")).unwrap();

        let loaded = store.load_history();
        assert_eq!(loaded.len(), HISTORY_RETENTION);
        assert_eq!(loaded[0].bet_id, "bet-1");
        assert_eq!(loaded[HISTORY_RETENTION - 1].bet_id, "bet-new");

        cleanup(&[&agent, &history]);
    }

    #[test]
    fn test_history_append_over_corrupt_file_starts_fresh() {
        let (store, agent, history) = temp_store();
        std::fs::write(&history, "corrupt").unwrap();

        store.append_history(make_record("bet-1")).unwrap();
        let loaded = store.load_history();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].bet_id, "bet-1");

        cleanup(&[&agent, &history]);
    }
}
