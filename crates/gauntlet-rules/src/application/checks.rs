//! One-shot checks: roll a pool and grade it in one call.
//!
//! Multi-round challenges go through the procedure engine instead; this
//! is the primitive it is built from, exposed for callers that only need
//! a single pass/fail read.

use gauntlet_core::error::DomainError;
use gauntlet_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::classifier::{OutcomeCategory, OutcomeThresholds, classify};
use crate::domain::dice::{DicePool, FaceRules, RollMode};
use crate::domain::outcome::RollOutcome;
use crate::domain::resolver::resolve_with_mode;

/// A single graded roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Dice actually rolled.
    pub pool_size: u32,
    /// Difficulty the roll was graded against.
    pub difficulty: i32,
    /// The kept roll.
    pub outcome: RollOutcome,
    /// How the roll graded.
    pub category: OutcomeCategory,
}

/// Pool size from an attribute and a dice modifier; never below one die.
#[must_use]
pub fn effective_pool_size(attribute_score: i32, pool_size_modifier: i32) -> u32 {
    let size = attribute_score.saturating_add(pool_size_modifier).max(1);
    u32::try_from(size).unwrap_or(1)
}

/// Rolls `pool_size` dice under `faces` and classifies the kept outcome
/// against `difficulty`.
///
/// # Errors
///
/// Returns `DomainError::InvalidConfiguration` if the face rules or
/// thresholds are malformed.
pub fn perform_check(
    faces: &FaceRules,
    thresholds: &OutcomeThresholds,
    pool_size: u32,
    difficulty: i32,
    mode: RollMode,
    rng: &mut dyn DeterministicRng,
) -> Result<CheckResult, DomainError> {
    faces.validate()?;
    thresholds.validate()?;

    let pool: DicePool = faces.pool(pool_size);
    let outcome = resolve_with_mode(&pool, faces, mode, rng);
    let category = classify(&outcome, difficulty, thresholds);

    debug!(pool = %pool, difficulty, %category, "check performed");

    Ok(CheckResult {
        pool_size,
        difficulty,
        outcome,
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_test_support::{MockRng, SequenceRng};

    #[test]
    fn test_effective_pool_size_floors_at_one() {
        assert_eq!(effective_pool_size(3, 2), 5);
        assert_eq!(effective_pool_size(2, -5), 1);
        assert_eq!(effective_pool_size(0, 0), 1);
        assert_eq!(effective_pool_size(i32::MIN, -1), 1);
    }

    #[test]
    fn test_perform_check_grades_success() {
        let mut rng = SequenceRng::new(vec![9, 8, 2]);

        let result = perform_check(
            &FaceRules::NARROW,
            &OutcomeThresholds::STANDARD,
            3,
            2,
            RollMode::Normal,
            &mut rng,
        )
        .unwrap();

        assert_eq!(result.outcome.success_count(), 2);
        assert_eq!(result.category, OutcomeCategory::Success);
        assert!(rng.is_exhausted());
    }

    #[test]
    fn test_perform_check_reports_fumble() {
        let result = perform_check(
            &FaceRules::WIDE,
            &OutcomeThresholds::STANDARD,
            4,
            0,
            RollMode::Normal,
            &mut MockRng,
        )
        .unwrap();

        assert_eq!(result.category, OutcomeCategory::Fumble);
    }

    #[test]
    fn test_perform_check_with_advantage_keeps_better_roll() {
        let mut rng = SequenceRng::new(vec![2, 3, 9, 10]);

        let result = perform_check(
            &FaceRules::WIDE,
            &OutcomeThresholds::STANDARD,
            2,
            2,
            RollMode::Advantage,
            &mut rng,
        )
        .unwrap();

        assert_eq!(result.outcome.rolls(), &[9, 10]);
        assert_eq!(result.category, OutcomeCategory::Success);
    }

    #[test]
    fn test_perform_check_rejects_bad_faces() {
        let faces = FaceRules {
            die_faces: 10,
            success_threshold: 1,
            botch_face: 1,
            botches_cancel_successes: false,
        };

        let result = perform_check(
            &faces,
            &OutcomeThresholds::STANDARD,
            3,
            1,
            RollMode::Normal,
            &mut MockRng,
        );

        match result.unwrap_err() {
            DomainError::InvalidConfiguration(msg) => assert!(msg.contains("botch")),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }
}
