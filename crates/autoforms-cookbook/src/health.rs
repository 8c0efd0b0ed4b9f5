//! Manual health transitions.
//!
//! The only place the replay threshold and the success/failure deltas are
//! defined. Health is stored on a 0-100 integer scale and exposed to
//! callers as a 0-1 fraction.

use autoforms_protocols::types::{MAX_HEALTH, Outcome};

/// Manuals at or below this fraction are not replayed.
pub const REPLAY_THRESHOLD: f64 = 0.3;

/// Initial health of a manual recorded from a live run.
pub const RECORDED_INITIAL_HEALTH: u32 = 100;

/// Initial health of an imported manual.
pub const IMPORTED_INITIAL_HEALTH: u32 = 80;

const SUCCESS_BONUS: u32 = 2;
const FAILURE_PENALTY: u32 = 5;
const REPEATED_FAILURE_PENALTY: u32 = 15;
/// Failure count above which the heavier penalty applies.
const REPEATED_FAILURE_AFTER: u32 = 5;

/// Health after one outcome, given the failure count before it.
pub fn compute_health(current: u32, prior_failure_count: u32, outcome: Outcome) -> u32 {
    let current = current.min(MAX_HEALTH);
    match outcome {
        Outcome::Success => (current + SUCCESS_BONUS).min(MAX_HEALTH),
        Outcome::Failure => {
            let penalty = if prior_failure_count + 1 > REPEATED_FAILURE_AFTER {
                REPEATED_FAILURE_PENALTY
            } else {
                FAILURE_PENALTY
            };
            current.saturating_sub(penalty)
        }
    }
}

/// Whether a manual at `health` (0-1) may be replayed.
pub fn is_replayable(health: f64) -> bool {
    health > REPLAY_THRESHOLD
}
