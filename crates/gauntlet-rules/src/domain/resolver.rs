//! Rolls dice pools and reads them into outcomes.
//!
//! The resolver only counts. It knows nothing about difficulty; grading
//! an outcome is the classifier's job.

use gauntlet_core::rng::DeterministicRng;
use tracing::debug;

use super::dice::{DicePool, FaceReading, RollMode};
use super::outcome::RollOutcome;

/// Rolls `pool.count()` independent dice in `[1, pool.die_faces()]` and
/// reads them with `reading`.
///
/// A pool of zero dice rolls nothing and yields an empty outcome.
pub fn resolve(
    pool: &DicePool,
    reading: &impl FaceReading,
    rng: &mut dyn DeterministicRng,
) -> RollOutcome {
    if pool.count() == 0 {
        return RollOutcome::empty();
    }

    let rolls: Vec<u32> = (0..pool.count())
        .map(|_| rng.next_u32_range(1, pool.die_faces()))
        .collect();
    let outcome = RollOutcome::from_rolls(rolls, reading);

    debug!(
        pool = %pool,
        rolls = ?outcome.rolls(),
        successes = outcome.success_count(),
        botches = outcome.botch_count(),
        net = outcome.net_successes(),
        "pool rolled"
    );

    outcome
}

/// Rolls the pool once, or twice under advantage/disadvantage.
///
/// With two rolls the kept outcome is the one with the higher
/// (advantage) or lower (disadvantage) net successes; ties keep the
/// first roll.
pub fn resolve_with_mode(
    pool: &DicePool,
    reading: &impl FaceReading,
    mode: RollMode,
    rng: &mut dyn DeterministicRng,
) -> RollOutcome {
    match mode {
        RollMode::Normal => resolve(pool, reading, rng),
        RollMode::Advantage => {
            let first = resolve(pool, reading, rng);
            let second = resolve(pool, reading, rng);
            if second.net_successes() > first.net_successes() {
                second
            } else {
                first
            }
        }
        RollMode::Disadvantage => {
            let first = resolve(pool, reading, rng);
            let second = resolve(pool, reading, rng);
            if second.net_successes() < first.net_successes() {
                second
            } else {
                first
            }
        }
    }
}
