//! AUGUR — Autonomous BTC Direction Prediction Agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! resolves the credential (env key, saved record, or first-run
//! registration), and performs exactly one check→decide→bet cycle.
//! Designed for cron: a closed window or a no-conviction score exits
//! with status 0 and zero side effects.

use anyhow::Result;
use tracing::{error, info, warn};

use augur::api::{ArenaApi, ArenaClient};
use augur::config::AppConfig;
use augur::engine::{self, RunOutcome};
use augur::storage::{JsonStore, StateStore};
use augur::types::AugurError;

const BANNER: &str = r#"
    _   _   _  ____ _   _ ____
   / \ | | | |/ ___| | | |  _ \
  / _ \| | | | |  _| | | | |_) |
 / ___ \ |_| | |_| | |_| |  _ <
/_/   \_\___/ \____|\___/|_| \_\

  BTC Direction Prediction Agent
  v0.1.0 — one cycle per invocation
"#;

#[tokio::main]
async fn main() {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Run failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = AppConfig::load_or_default("config.toml")?;

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        round_type = %cfg.agent.round_type,
        base_url = %cfg.arena.base_url,
        "AUGUR starting up"
    );

    let client = ArenaClient::new(&cfg.arena.base_url, cfg.arena.timeout_secs)?;
    let store = JsonStore::new(&cfg.state.agent_file, &cfg.state.history_file);

    let credential = resolve_or_register(&client, &store, &cfg).await?;

    let outcome = engine::run_once(&client, &store, &credential, &cfg.agent.round_type).await?;

    match outcome {
        RunOutcome::WindowClosed { next_window } => {
            info!(
                next_window = next_window.as_deref().unwrap_or("unknown"),
                "Done: window closed"
            );
        }
        RunOutcome::NoConviction { decision } => {
            info!(score = format!("{:.2}", decision.score), "Done: no bet placed");
        }
        RunOutcome::Placed { record } => {
            info!(
                bet_id = %record.bet_id,
                direction = %record.direction,
                blind = record.blind,
                btc_price = record.btc_price_at_bet,
                "Done: bet placed"
            );
            // Informational only; uses the registered name when known.
            let name = credential
                .agent_name
                .clone()
                .unwrap_or_else(|| cfg.agent.name.clone());
            engine::report_accuracy(&client, &name).await;
        }
    }

    Ok(())
}

/// Resolve the credential for this run, registering a new agent on
/// first use when the environment provides the registration inputs.
///
/// Precedence: `AUGUR_API_KEY` env var, then the saved agent record,
/// then a fresh registration via `AUGUR_AGENT_NAME` + `AUGUR_WALLET`.
async fn resolve_or_register(
    client: &ArenaClient,
    store: &JsonStore,
    cfg: &AppConfig,
) -> Result<engine::Credential> {
    match engine::resolve_credential(store, AppConfig::env_opt("AUGUR_API_KEY")) {
        Ok(credential) => Ok(credential),
        Err(AugurError::MissingCredential) => {
            let (name, wallet) = match (
                AppConfig::env_opt("AUGUR_AGENT_NAME"),
                AppConfig::env_opt("AUGUR_WALLET"),
            ) {
                (Some(name), Some(wallet)) => (name, wallet),
                _ => return Err(AugurError::MissingCredential.into()),
            };

            info!(name = %name, "No saved credential — registering new agent");
            let registration = client.register(&name, &wallet).await?;
            if let Some(bonus) = registration.welcome_bonus {
                info!(welcome_bonus = bonus, "Registration bonus credited");
            }
            // The arena never returns this key again.
            warn!(
                api_key = %registration.record.api_key,
                "Store this API key — it cannot be retrieved later"
            );
            store.save_agent(&registration.record)?;

            Ok(engine::Credential {
                api_key: registration.record.api_key,
                agent_name: Some(registration.record.name),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("augur=info"));

    let json_logging = std::env::var("AUGUR_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
