//! Grades a roll outcome against a difficulty.

use std::fmt;

use gauntlet_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::outcome::RollOutcome;

/// Categorical result of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    /// Zero successes and at least one botch.
    Fumble,
    /// Missed the difficulty, outside any partial band.
    Failure,
    /// Missed the difficulty by no more than the partial margin.
    PartialSuccess,
    /// Met or beat the difficulty.
    Success,
    /// Beat the difficulty by at least the critical margin.
    CriticalSuccess,
}

impl OutcomeCategory {
    /// Success or critical success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::CriticalSuccess)
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fumble => "Fumble",
            Self::Failure => "Failure",
            Self::PartialSuccess => "PartialSuccess",
            Self::Success => "Success",
            Self::CriticalSuccess => "CriticalSuccess",
        };
        f.write_str(name)
    }
}

/// Margins that separate the outcome bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeThresholds {
    /// Net successes over the difficulty needed for a critical.
    pub critical_margin: i32,
    /// How far below the difficulty still counts as partial. `None` folds
    /// the partial band into failure.
    #[serde(default)]
    pub partial_margin: Option<i32>,
}

impl OutcomeThresholds {
    /// Critical at +5 and no partial band.
    pub const STANDARD: Self = Self {
        critical_margin: 5,
        partial_margin: None,
    };

    /// Adds a partial band `margin` successes wide.
    #[must_use]
    pub const fn with_partial_margin(self, margin: i32) -> Self {
        Self {
            partial_margin: Some(margin),
            ..self
        }
    }

    /// Both margins must be positive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` otherwise.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.critical_margin <= 0 {
            return Err(DomainError::configuration(format!(
                "critical margin must be positive, got {}",
                self.critical_margin
            )));
        }
        if let Some(margin) = self.partial_margin.filter(|margin| *margin <= 0) {
            return Err(DomainError::configuration(format!(
                "partial margin must be positive, got {margin}"
            )));
        }
        Ok(())
    }
}

impl Default for OutcomeThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Classifies `outcome` against `difficulty`.
///
/// Precedence is strict: fumble, critical, success, partial, failure. A
/// roll with no successes and a botch is a fumble whatever the difficulty.
#[must_use]
pub fn classify(
    outcome: &RollOutcome,
    difficulty: i32,
    thresholds: &OutcomeThresholds,
) -> OutcomeCategory {
    if outcome.is_fumble() {
        return OutcomeCategory::Fumble;
    }

    let margin = outcome.net_successes().saturating_sub(difficulty);
    if margin >= thresholds.critical_margin {
        return OutcomeCategory::CriticalSuccess;
    }
    if margin >= 0 {
        return OutcomeCategory::Success;
    }
    match thresholds.partial_margin {
        Some(partial) if margin >= partial.saturating_neg() => OutcomeCategory::PartialSuccess,
        _ => OutcomeCategory::Failure,
    }
}
