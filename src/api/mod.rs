//! Arena API boundary.
//!
//! Defines the `ArenaApi` trait and provides the HTTP implementation
//! in `client`. The trait exists so the run orchestrator can be
//! driven by an in-memory mock in tests.

pub mod client;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{BetReceipt, BetSummary, Direction, Registration, RoundStatus, SignalSnapshot};

pub use client::ArenaClient;

/// A confirmed bet placement, including whether the arena accepted
/// it blind (before the current oracle reveal).
#[derive(Debug, Clone)]
pub struct PlacedBet {
    pub receipt: BetReceipt,
    pub blind: bool,
}

/// Abstraction over the remote arena service.
///
/// All calls are single-shot: a transport failure or non-success
/// response is fatal for the current run, never retried here.
#[async_trait]
pub trait ArenaApi: Send + Sync {
    /// Current round window state.
    async fn round_status(&self) -> Result<RoundStatus>;

    /// Fresh market-signal snapshot.
    async fn fetch_signal(&self) -> Result<SignalSnapshot>;

    /// Register a new agent. The returned api_key is shown exactly
    /// once and cannot be retrieved later.
    async fn register(&self, name: &str, wallet_address: &str) -> Result<Registration>;

    /// Place a directional bet for the given round type, authorized
    /// by the agent's api_key.
    async fn place_bet(
        &self,
        api_key: &str,
        direction: Direction,
        round_type: &str,
    ) -> Result<PlacedBet>;

    /// List this agent's past bets (read-only, for the accuracy report).
    async fn list_bets(&self, agent_name: &str) -> Result<Vec<BetSummary>>;
}
