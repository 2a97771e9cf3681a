//! Shared types for the AUGUR agent.
//!
//! These types form the data model used across all modules:
//! the normalized market signal, the scoring verdict, the round
//! window status, and the two persisted records (agent identity
//! and prediction history).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Predicted BTC direction for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Wire representation ("UP" / "DOWN").
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            _ => Err(anyhow::anyhow!("Unknown direction: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Signal snapshot
// ---------------------------------------------------------------------------

/// One directional reading from the upstream oracle, with its
/// self-reported confidence (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OracleReading {
    pub direction: Direction,
    pub confidence: f64,
}

/// Normalized view of one market-data fetch. Constructed fresh each
/// run; absent optional fields mean the corresponding scoring factor
/// simply does not fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Spot BTC price in USD (non-negative).
    pub btc_price: f64,
    /// 24-hour price change, signed percentage.
    pub price_change_24h: f64,
    /// Fear & Greed index, 0–100. Absent = no contrarian factor.
    pub fear_greed: Option<u8>,
    /// Oracle direction + confidence. Absent = no oracle factor.
    pub oracle: Option<OracleReading>,
    /// Signed signal strength. Defaults to 0 when the feed omits it.
    pub signal_strength: f64,
}

impl fmt::Display for SignalSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fg = self
            .fear_greed
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "BTC ${:.0} ({}{:.1}%) | F&G: {fg} | strength: {:.2}",
            self.btc_price,
            if self.price_change_24h >= 0.0 { "+" } else { "" },
            self.price_change_24h,
            self.signal_strength,
        )
    }
}

impl SignalSnapshot {
    /// Helper to build a test snapshot with all factors absent.
    #[cfg(test)]
    pub fn neutral() -> Self {
        SignalSnapshot {
            btc_price: 97_500.0,
            price_change_24h: 0.0,
            fear_greed: None,
            oracle: None,
            signal_strength: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Output of the scoring engine. Never persisted in raw form —
/// actionable decisions are recorded as `PredictionRecord`s after
/// the bet is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// `None` means the score landed in the dead zone: no conviction,
    /// no bet this round.
    pub direction: Option<Direction>,
    /// Additive combination of the weighted factors.
    pub score: f64,
    /// One entry per factor that fired, in fixed evaluation order.
    pub reasons: Vec<String>,
}

impl Decision {
    /// Whether this decision carries enough conviction to act on.
    pub fn is_actionable(&self) -> bool {
        self.direction.is_some()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(d) => write!(
                f,
                "{d} (score={:.2}, factors=[{}])",
                self.score,
                self.reasons.join(", "),
            ),
            None => write!(
                f,
                "NO CONVICTION (score={:.2}, factors=[{}])",
                self.score,
                self.reasons.join(", "),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Round status
// ---------------------------------------------------------------------------

/// Current round window state as reported by the arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundStatus {
    /// Whether a directional submission would be accepted right now.
    #[serde(default)]
    pub prediction_open: bool,
    /// Informational: time until the next signal reveal.
    #[serde(default)]
    pub next_signal_in: Option<String>,
    /// Informational: when the next prediction window opens.
    #[serde(default)]
    pub next_prediction_window: Option<String>,
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// Agent identity and credentials. Created once at first successful
/// registration and durable for the life of the install; the arena
/// never returns the api_key again after that first response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub api_key: String,
    pub name: String,
}

/// One entry in the bounded prediction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Calendar date of the bet (YYYY-MM-DD, UTC).
    pub date: String,
    pub direction: Direction,
    /// Score rounded to 2 decimals at record time.
    pub score: f64,
    pub reasons: Vec<String>,
    /// Whether the arena accepted this as a blind bet.
    pub blind: bool,
    pub bet_id: String,
    pub btc_price_at_bet: f64,
}

impl PredictionRecord {
    /// Build a record from a decision and the arena's receipt,
    /// stamped with today's UTC date.
    pub fn from_decision(decision: &Decision, receipt: &BetReceipt, blind: bool) -> Self {
        PredictionRecord {
            date: Utc::now().format("%Y-%m-%d").to_string(),
            direction: receipt.direction,
            score: (decision.score * 100.0).round() / 100.0,
            reasons: decision.reasons.clone(),
            blind,
            bet_id: receipt.id.clone(),
            btc_price_at_bet: receipt.btc_price_at_bet,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena receipts
// ---------------------------------------------------------------------------

/// Confirmed bet as returned by the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetReceipt {
    pub id: String,
    pub direction: Direction,
    pub btc_price_at_bet: f64,
    /// When the round resolves (opaque arena timestamp).
    #[serde(default)]
    pub resolve_after: Option<String>,
}

impl fmt::Display for BetReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ ${:.0} [{}]",
            self.direction, self.btc_price_at_bet, self.id,
        )
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub record: AgentRecord,
    pub welcome_bonus: Option<f64>,
}

/// One historical bet as listed by the arena (read-only, used for
/// the accuracy report).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSummary {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
}

impl BetSummary {
    pub fn is_resolved(&self) -> bool {
        self.status == "resolved"
    }

    pub fn is_win(&self) -> bool {
        self.is_resolved() && self.result.as_deref() == Some("WIN")
    }

    pub fn is_loss(&self) -> bool {
        self.is_resolved() && self.result.as_deref() == Some("LOSS")
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for AUGUR.
#[derive(Debug, thiserror::Error)]
pub enum AugurError {
    /// No API key in the environment and no saved agent record.
    #[error("No credential: set AUGUR_API_KEY or register first")]
    MissingCredential,

    #[error("Arena error ({endpoint}): {message}")]
    Arena { endpoint: String, message: String },

    #[error("Bet rejected: {message}")]
    BetRejected {
        message: String,
        /// Arena hint for when the next window opens, if given.
        next_window: Option<String>,
    },

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
