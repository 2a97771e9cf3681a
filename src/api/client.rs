//! HTTP client for the arena service.
//!
//! One base endpoint, JSON in/out. The round and bet endpoints speak
//! snake_case; the signal feed speaks camelCase with every field
//! optional — absent fields degrade to "factor does not fire" in the
//! snapshot, never an error.
//!
//! Auth: none for reads; `Authorization: Bearer {api_key}` for bets.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ArenaApi, PlacedBet};
use crate::types::{
    AgentRecord, AugurError, BetReceipt, BetSummary, Direction, OracleReading, Registration,
    RoundStatus, SignalSnapshot,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Model identifier sent with registrations.
const AGENT_MODEL: &str = "augur-rs";
/// Strategy blurb sent with registrations (shown on the leaderboard).
const AGENT_STRATEGY: &str = "Contrarian fear/greed + oracle tailing";

// ---------------------------------------------------------------------------
// Wire types (arena JSON → Rust)
// ---------------------------------------------------------------------------

/// `GET /openclaw/signal` response. camelCase feed; we only
/// deserialize the fields the scoring engine consumes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignalResponse {
    #[serde(default)]
    btc_price: f64,
    #[serde(default)]
    price_change24h: f64,
    #[serde(default)]
    fear_greed: Option<FearGreedBlock>,
    #[serde(default)]
    parsimonious: Option<ParsimoniousBlock>,
    #[serde(default)]
    signal_strength: f64,
}

#[derive(Debug, Deserialize)]
struct FearGreedBlock {
    #[serde(default)]
    value: Option<u8>,
}

/// Oracle block. `direction` may be "UP", "DOWN", or "NEUTRAL" —
/// only the first two produce an oracle reading.
#[derive(Debug, Deserialize)]
struct ParsimoniousBlock {
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    confidence: f64,
}

impl SignalResponse {
    fn into_snapshot(self) -> SignalSnapshot {
        let oracle = self.parsimonious.and_then(|p| {
            let direction = p.direction?.parse::<Direction>().ok()?;
            Some(OracleReading {
                direction,
                confidence: p.confidence,
            })
        });

        SignalSnapshot {
            btc_price: self.btc_price,
            price_change_24h: self.price_change24h,
            fear_greed: self.fear_greed.and_then(|fg| fg.value),
            oracle,
            signal_strength: self.signal_strength,
        }
    }
}

/// `POST /arena/register` response.
#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    welcome_bonus: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

/// `POST /arena/bet` response.
#[derive(Debug, Deserialize)]
struct BetResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    blind: bool,
    #[serde(default)]
    bet: Option<BetBody>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    next_prediction_window: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BetBody {
    id: String,
    direction: Direction,
    #[serde(default)]
    btc_price_at_bet: f64,
    #[serde(default)]
    resolve_after: Option<String>,
}

/// `GET /arena/bets` response.
#[derive(Debug, Deserialize)]
struct BetsListResponse {
    #[serde(default)]
    bets: Vec<BetSummary>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Arena HTTP client.
pub struct ArenaClient {
    http: Client,
    base_url: String,
}

impl ArenaClient {
    /// Create a new client against the given base URL
    /// (e.g. `https://arena.example.com/api`).
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("AUGUR/0.1.0 (btc-prediction-agent)")
            .build()
            .context("Failed to build HTTP client for the arena")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a JSON endpoint, bailing on non-success status.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "Arena GET");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Arena request failed: {path}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AugurError::Arena {
                endpoint: path.to_string(),
                message: format!("HTTP {status}: {body}"),
            }
            .into());
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse arena response: {path}"))
    }
}

#[async_trait]
impl ArenaApi for ArenaClient {
    async fn round_status(&self) -> Result<RoundStatus> {
        self.get_json("/arena/current-round").await
    }

    async fn fetch_signal(&self) -> Result<SignalSnapshot> {
        let resp: SignalResponse = self.get_json("/openclaw/signal").await?;
        Ok(resp.into_snapshot())
    }

    async fn register(&self, name: &str, wallet_address: &str) -> Result<Registration> {
        let path = "/arena/register";
        let body = serde_json::json!({
            "name": name,
            "model": AGENT_MODEL,
            "strategy": AGENT_STRATEGY,
            "wallet_address": wallet_address,
        });

        let resp = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .context("Arena registration request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AugurError::Arena {
                endpoint: path.to_string(),
                message: format!("HTTP {status}: {body}"),
            }
            .into());
        }

        let reg: RegisterResponse = resp
            .json()
            .await
            .context("Failed to parse arena registration response")?;

        if !reg.success {
            return Err(AugurError::Registration(
                reg.error.unwrap_or_else(|| "Unknown error".to_string()),
            )
            .into());
        }

        let record = AgentRecord {
            agent_id: reg
                .agent_id
                .ok_or_else(|| AugurError::Registration("Response missing agent_id".into()))?,
            api_key: reg
                .api_key
                .ok_or_else(|| AugurError::Registration("Response missing api_key".into()))?,
            name: reg.name.unwrap_or_else(|| name.to_string()),
        };

        info!(agent_id = %record.agent_id, name = %record.name, "Registered with the arena");

        Ok(Registration {
            record,
            welcome_bonus: reg.welcome_bonus,
        })
    }

    async fn place_bet(
        &self,
        api_key: &str,
        direction: Direction,
        round_type: &str,
    ) -> Result<PlacedBet> {
        let path = "/arena/bet";
        let body = serde_json::json!({
            "direction": direction.as_str(),
            "round_type": round_type,
        });

        let resp = self
            .http
            .post(self.url(path))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .context("Arena bet request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AugurError::Arena {
                endpoint: path.to_string(),
                message: format!("HTTP {status}: {body}"),
            }
            .into());
        }

        let bet: BetResponse = resp
            .json()
            .await
            .context("Failed to parse arena bet response")?;

        if !bet.success {
            return Err(AugurError::BetRejected {
                message: bet.error.unwrap_or_else(|| "Unknown error".to_string()),
                next_window: bet.next_prediction_window,
            }
            .into());
        }

        let confirmed = bet.bet.ok_or_else(|| AugurError::Arena {
            endpoint: path.to_string(),
            message: "Success response missing bet body".to_string(),
        })?;

        info!(
            bet_id = %confirmed.id,
            direction = %confirmed.direction,
            btc_price = confirmed.btc_price_at_bet,
            blind = bet.blind,
            "Bet placed"
        );

        Ok(PlacedBet {
            receipt: BetReceipt {
                id: confirmed.id,
                direction: confirmed.direction,
                btc_price_at_bet: confirmed.btc_price_at_bet,
                resolve_after: confirmed.resolve_after,
            },
            blind: bet.blind,
        })
    }

    async fn list_bets(&self, agent_name: &str) -> Result<Vec<BetSummary>> {
        let path = format!("/arena/bets?agent={}", urlencoding::encode(agent_name));
        let resp: BetsListResponse = self.get_json(&path).await?;
        Ok(resp.bets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
