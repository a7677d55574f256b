//! The immutable result of rolling a dice pool.

use serde::{Deserialize, Serialize};

use super::dice::FaceReading;

/// Raw faces of one roll and the counts derived from them.
///
/// Every field is derived from `rolls` and the face reading at construction
/// time; there is no way to change a `RollOutcome` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    rolls: Vec<u32>,
    success_count: u32,
    botch_count: u32,
    net_successes: i32,
}

impl RollOutcome {
    /// Reads `rolls` with the given face rules.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn from_rolls(rolls: Vec<u32>, reading: &impl FaceReading) -> Self {
        let success_count = rolls.iter().filter(|&&face| reading.is_success(face)).count() as u32;
        let botch_count = rolls.iter().filter(|&&face| reading.is_botch(face)).count() as u32;
        let net_successes = if reading.botches_cancel_successes() {
            success_count as i32 - botch_count as i32
        } else {
            success_count as i32
        };

        Self {
            rolls,
            success_count,
            botch_count,
            net_successes,
        }
    }

    /// An outcome with no dice rolled.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rolls: Vec::new(),
            success_count: 0,
            botch_count: 0,
            net_successes: 0,
        }
    }

    /// Faces in the order they were rolled.
    #[must_use]
    pub fn rolls(&self) -> &[u32] {
        &self.rolls
    }

    /// Number of dice that showed a success face.
    #[must_use]
    pub const fn success_count(&self) -> u32 {
        self.success_count
    }

    /// Number of dice that showed a botch face.
    #[must_use]
    pub const fn botch_count(&self) -> u32 {
        self.botch_count
    }

    /// Successes, less botches when the reading cancels them.
    #[must_use]
    pub const fn net_successes(&self) -> i32 {
        self.net_successes
    }

    /// Dice that did not show a success face.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn non_success_count(&self) -> u32 {
        self.rolls.len() as u32 - self.success_count
    }

    /// Zero successes with at least one botch.
    #[must_use]
    pub const fn is_fumble(&self) -> bool {
        self.success_count == 0 && self.botch_count >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dice::FaceRules;

    #[test]
    fn test_counts_successes_and_botches() {
        let outcome = RollOutcome::from_rolls(vec![9, 9, 8, 3, 1], &FaceRules::NARROW);

        assert_eq!(outcome.success_count(), 3);
        assert_eq!(outcome.botch_count(), 1);
        assert_eq!(outcome.net_successes(), 3);
        assert_eq!(outcome.non_success_count(), 2);
        assert!(!outcome.is_fumble());
    }

    #[test]
    fn test_botch_cancellation_subtracts_botches() {
        let rules = FaceRules::NARROW.with_botch_cancellation();
        let outcome = RollOutcome::from_rolls(vec![10, 1, 1, 4], &rules);

        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.botch_count(), 2);
        assert_eq!(outcome.net_successes(), -1);
        assert!(!outcome.is_fumble());
    }

    #[test]
    fn test_zero_successes_with_botch_is_fumble() {
        let outcome = RollOutcome::from_rolls(vec![3, 4, 5, 2, 1], &FaceRules::NARROW);

        assert_eq!(outcome.success_count(), 0);
        assert_eq!(outcome.botch_count(), 1);
        assert!(outcome.is_fumble());
    }

    #[test]
    fn test_zero_successes_without_botch_is_not_fumble() {
        let outcome = RollOutcome::from_rolls(vec![3, 4, 5], &FaceRules::NARROW);
        assert!(!outcome.is_fumble());
    }

    #[test]
    fn test_empty_outcome_never_fumbles() {
        let outcome = RollOutcome::empty();
        assert_eq!(outcome.rolls(), &[] as &[u32]);
        assert!(!outcome.is_fumble());
    }
}
