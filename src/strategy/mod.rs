//! Multi-factor scoring engine.
//!
//! Maps one `SignalSnapshot` into a directional `Decision` with an
//! auditable score and reason trail. Pure and total: missing optional
//! fields mean the factor does not fire, never an error.
//!
//! Factors, evaluated in fixed order (order affects only the reason
//! trail — the score is a commutative sum):
//! 1. Fear & Greed extremes (contrarian)
//! 2. Oracle direction weighted by confidence
//! 3. Signal strength

use tracing::debug;

use crate::types::{Decision, Direction, SignalSnapshot};

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------
// Fixed policy, deliberately not externalized to config.

/// Fear & Greed index at or below this is extreme fear → strong contrarian UP.
const EXTREME_FEAR_MAX: u8 = 20;
/// Upper bound of the plain-fear bucket.
const FEAR_MAX: u8 = 35;
/// Lower bound of the plain-greed bucket.
const GREED_MIN: u8 = 65;
/// Fear & Greed index at or above this is extreme greed → strong contrarian DOWN.
const EXTREME_GREED_MIN: u8 = 80;

const EXTREME_FEAR_WEIGHT: f64 = 2.0;
const FEAR_WEIGHT: f64 = 1.0;
const GREED_WEIGHT: f64 = -0.5;
const EXTREME_GREED_WEIGHT: f64 = -2.0;

/// Oracle contribution is `confidence * ORACLE_WEIGHT`, signed by direction.
const ORACLE_WEIGHT: f64 = 2.0;

/// Strength factor fires only above this absolute value (strict).
const STRENGTH_FLOOR: f64 = 0.5;
const STRENGTH_WEIGHT: f64 = 0.5;

/// Scores inside [-DEAD_ZONE, +DEAD_ZONE] (inclusive) produce no
/// direction. Marginal conviction never places a bet.
const DEAD_ZONE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a signal snapshot into a decision.
///
/// Positive scores lean UP, negative lean DOWN. A direction is only
/// produced when the score clears the dead zone strictly.
pub fn score(signal: &SignalSnapshot) -> Decision {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    // Factor 1: Fear & Greed extremes (contrarian)
    if let Some(fg) = signal.fear_greed {
        if let Some((weight, label)) = fear_greed_factor(fg) {
            total += weight;
            reasons.push(format!("{label}({fg})"));
            debug!(fear_greed = fg, weight, "Fear/Greed factor fired");
        }
    }

    // Factor 2: Oracle direction weighted by confidence.
    // Fires whenever a direction is present, even at confidence 0 —
    // the reason trail still records the degenerate reading.
    if let Some(oracle) = signal.oracle {
        let weight = match oracle.direction {
            Direction::Up => oracle.confidence * ORACLE_WEIGHT,
            Direction::Down => -(oracle.confidence * ORACLE_WEIGHT),
        };
        total += weight;
        reasons.push(format!(
            "oracle_{}(conf={:.2})",
            oracle.direction, oracle.confidence,
        ));
        debug!(direction = %oracle.direction, confidence = oracle.confidence, weight, "Oracle factor fired");
    }

    // Factor 3: Signal strength
    if signal.signal_strength.abs() > STRENGTH_FLOOR {
        let weight = signal.signal_strength * STRENGTH_WEIGHT;
        total += weight;
        reasons.push(format!("strength({:.2})", signal.signal_strength));
        debug!(strength = signal.signal_strength, weight, "Strength factor fired");
    }

    Decision {
        direction: derive_direction(total),
        score: total,
        reasons,
    }
}

/// Contrarian bucket for a Fear & Greed index value.
/// Returns the contribution and reason label, or None in the
/// neutral 36–64 band.
fn fear_greed_factor(fg: u8) -> Option<(f64, &'static str)> {
    if fg <= EXTREME_FEAR_MAX {
        Some((EXTREME_FEAR_WEIGHT, "extreme_fear"))
    } else if fg <= FEAR_MAX {
        Some((FEAR_WEIGHT, "fear"))
    } else if fg >= EXTREME_GREED_MIN {
        Some((EXTREME_GREED_WEIGHT, "extreme_greed"))
    } else if fg >= GREED_MIN {
        Some((GREED_WEIGHT, "greed"))
    } else {
        None
    }
}

/// Dead-zone direction derivation: strictly outside ±DEAD_ZONE or
/// nothing. A score of exactly ±0.5 does not trigger a bet.
fn derive_direction(score: f64) -> Option<Direction> {
    if score > DEAD_ZONE {
        Some(Direction::Up)
    } else if score < -DEAD_ZONE {
        Some(Direction::Down)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
