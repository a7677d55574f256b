//! The caller's description of a single attempt.

use std::fmt;

use gauntlet_rules::domain::dice::RollMode;
use serde::{Deserialize, Serialize};

/// The method the actor picked for an attempt, e.g. `force`, `finesse`,
/// `bribery`.
///
/// Which approaches exist is up to each challenge's configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Approach(String);

impl Approach {
    /// Wraps an approach name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The approach name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Approach {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an approach bends the odds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproachAdjustment {
    /// Added to the difficulty.
    #[serde(default)]
    pub difficulty_shift: i32,
    /// Added to the pool size.
    #[serde(default)]
    pub pool_shift: i32,
}

impl ApproachAdjustment {
    /// No shift at all.
    pub const NONE: Self = Self {
        difficulty_shift: 0,
        pool_shift: 0,
    };

    /// Shifts difficulty only.
    #[must_use]
    pub const fn difficulty(shift: i32) -> Self {
        Self {
            difficulty_shift: shift,
            pool_shift: 0,
        }
    }

    /// Shifts both difficulty and pool size.
    #[must_use]
    pub const fn new(difficulty_shift: i32, pool_shift: i32) -> Self {
        Self {
            difficulty_shift,
            pool_shift,
        }
    }
}

/// One attempt as the caller sees it: the obstacle, the situation, the
/// chosen approach.
///
/// The actor's attribute score travels separately on the attempt command;
/// the engine never interprets what the attribute is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeContext {
    /// Difficulty before any adjustment.
    pub base_difficulty: i32,
    /// Sum of situational difficulty adjustments; may be negative.
    #[serde(default)]
    pub difficulty_modifier: i32,
    /// Bonus or penalty dice; may be negative.
    #[serde(default)]
    pub pool_size_modifier: i32,
    /// The approach chosen, if the challenge offers any.
    #[serde(default)]
    pub approach: Option<Approach>,
    /// 1-based index of this attempt within the procedure.
    pub attempt_number: u32,
    /// Whether the pool is rolled once or twice.
    #[serde(default)]
    pub roll_mode: RollMode,
}

impl ChallengeContext {
    /// A plain attempt against `base_difficulty`.
    #[must_use]
    pub const fn new(base_difficulty: i32, attempt_number: u32) -> Self {
        Self {
            base_difficulty,
            difficulty_modifier: 0,
            pool_size_modifier: 0,
            approach: None,
            attempt_number,
            roll_mode: RollMode::Normal,
        }
    }

    /// Adds situational difficulty.
    #[must_use]
    pub const fn with_difficulty_modifier(mut self, modifier: i32) -> Self {
        self.difficulty_modifier = modifier;
        self
    }

    /// Adds bonus (or penalty) dice.
    #[must_use]
    pub const fn with_pool_size_modifier(mut self, modifier: i32) -> Self {
        self.pool_size_modifier = modifier;
        self
    }

    /// Selects an approach.
    #[must_use]
    pub fn with_approach(mut self, approach: impl Into<Approach>) -> Self {
        self.approach = Some(approach.into());
        self
    }

    /// Rolls with advantage or disadvantage.
    #[must_use]
    pub const fn with_roll_mode(mut self, mode: RollMode) -> Self {
        self.roll_mode = mode;
        self
    }
}
