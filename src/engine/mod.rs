//! Run orchestrator.
//!
//! Sequences one check-window → fetch-signal → score → bet → record
//! cycle. Strictly linear; every step short-circuits the run on
//! failure or non-actionability. Designed to be cron-safe: a closed
//! window or a no-conviction score is a clean, zero-effect exit, not
//! an error.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::ArenaApi;
use crate::storage::StateStore;
use crate::strategy;
use crate::types::{AgentRecord, AugurError, BetSummary, Decision, PredictionRecord};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Resolved credential for one run. The env override wins over the
/// saved agent record; the agent name is only known when the record
/// supplied the key (the bare env var carries no identity).
#[derive(Debug, Clone)]
pub struct Credential {
    pub api_key: String,
    pub agent_name: Option<String>,
}

/// Resolve the credential for this run: an explicit env-provided key
/// takes precedence, then the saved agent record. Absence of both is
/// a configuration error, distinct from "window closed".
pub fn resolve_credential(
    store: &dyn StateStore,
    env_key: Option<String>,
) -> Result<Credential, AugurError> {
    if let Some(api_key) = env_key {
        return Ok(Credential {
            api_key,
            agent_name: None,
        });
    }
    match store.load_agent() {
        Some(AgentRecord { api_key, name, .. }) => Ok(Credential {
            api_key,
            agent_name: Some(name),
        }),
        None => Err(AugurError::MissingCredential),
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// Terminal state of one orchestrator invocation. All variants are
/// successful process exits; fatal conditions surface as errors.
#[derive(Debug)]
pub enum RunOutcome {
    /// Prediction window closed — nothing fetched, nothing placed.
    WindowClosed { next_window: Option<String> },
    /// Score landed in the dead zone — no bet this round.
    NoConviction { decision: Decision },
    /// Bet confirmed and recorded in history.
    Placed { record: PredictionRecord },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run one full prediction cycle.
///
/// Steps:
/// 1. Window gate — closed window exits cleanly with zero effects.
/// 2. Fetch a fresh signal snapshot.
/// 3. Score it; dead-zone scores exit cleanly without submission.
/// 4. Place the bet with the given credential.
/// 5. On confirmation, append one history entry (bounded retention).
///
/// History is only mutated after the arena confirms the bet; a
/// submission failure propagates with no local state change.
pub async fn run_once(
    api: &dyn ArenaApi,
    store: &dyn StateStore,
    credential: &Credential,
    round_type: &str,
) -> Result<RunOutcome> {
    // 1. Window gate
    let round = api.round_status().await.context("Round status check failed")?;
    if !round.prediction_open {
        info!(
            next_window = round.next_prediction_window.as_deref().unwrap_or("unknown"),
            "Prediction window closed, nothing to do"
        );
        return Ok(RunOutcome::WindowClosed {
            next_window: round.next_prediction_window,
        });
    }
    info!("Prediction window is OPEN");

    // 2. Fetch signal
    let signal = api.fetch_signal().await.context("Signal fetch failed")?;
    info!(signal = %signal, "Signal snapshot fetched");

    // 3. Score
    let decision = strategy::score(&signal);
    let direction = match decision.direction {
        Some(direction) => direction,
        None => {
            info!(decision = %decision, "Skipping round");
            return Ok(RunOutcome::NoConviction { decision });
        }
    };
    info!(decision = %decision, "Prediction made");

    // 4. Submit
    let placed = api
        .place_bet(&credential.api_key, direction, round_type)
        .await
        .context("Bet submission failed")?;
    info!(
        receipt = %placed.receipt,
        blind = placed.blind,
        "Bet confirmed by the arena"
    );

    // 5. Record
    let record = PredictionRecord::from_decision(&decision, &placed.receipt, placed.blind);
    if let Err(e) = store.append_history(record.clone()) {
        // The bet stands regardless; history is a local convenience cache.
        warn!(error = %e, "Failed to record prediction history");
    }

    Ok(RunOutcome::Placed { record })
}

// ---------------------------------------------------------------------------
// Accuracy report
// ---------------------------------------------------------------------------

/// Aggregate win/loss stats from the arena's bet list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccuracyReport {
    pub resolved: usize,
    pub active: usize,
    pub wins: usize,
    pub losses: usize,
}

impl AccuracyReport {
    /// Accuracy as a percentage. None until at least one bet resolved.
    pub fn accuracy_pct(&self) -> Option<f64> {
        if self.resolved == 0 {
            None
        } else {
            Some(self.wins as f64 / self.resolved as f64 * 100.0)
        }
    }
}

/// Fold a bet list into an accuracy report.
pub fn summarize_bets(bets: &[BetSummary]) -> AccuracyReport {
    let mut report = AccuracyReport::default();
    for bet in bets {
        if bet.is_resolved() {
            report.resolved += 1;
            if bet.is_win() {
                report.wins += 1;
            } else if bet.is_loss() {
                report.losses += 1;
            }
        } else {
            report.active += 1;
        }
    }
    report
}

/// Fetch and log the agent's running accuracy. Informational only —
/// failures are logged as warnings and never fail the run.
pub async fn report_accuracy(api: &dyn ArenaApi, agent_name: &str) {
    match api.list_bets(agent_name).await {
        Ok(bets) => {
            let report = summarize_bets(&bets);
            match report.accuracy_pct() {
                Some(pct) => info!(
                    agent = agent_name,
                    resolved = report.resolved,
                    wins = report.wins,
                    losses = report.losses,
                    active = report.active,
                    accuracy = format!("{pct:.1}%"),
                    "Accuracy report"
                ),
                None => info!(
                    agent = agent_name,
                    active = report.active,
                    "No resolved bets yet"
                ),
            }
        }
        Err(e) => warn!(agent = agent_name, error = %e, "Accuracy report unavailable"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
