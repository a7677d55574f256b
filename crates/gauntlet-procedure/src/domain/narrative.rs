//! Flavor text lookup.
//!
//! The engine asks a [`NarrativeSource`] for a line after each attempt and
//! passes whatever comes back through untouched. Text is content; it
//! never influences a transition.

use std::collections::BTreeMap;

use gauntlet_core::error::DomainError;
use gauntlet_rules::domain::classifier::OutcomeCategory;
use gauntlet_rules::domain::complication::ComplicationEffect;
use serde::{Deserialize, Serialize};

use super::aggregates::ProcedureStatus;

/// What happened, as far as the narrative source needs to know.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    /// Challenge kind.
    pub kind: &'a str,
    /// How the attempt graded.
    pub category: OutcomeCategory,
    /// Complication rolled, if any.
    pub complication: Option<&'a ComplicationEffect>,
    /// Status once the attempt was applied.
    pub status: ProcedureStatus,
}

/// Supplies flavor text for attempts.
pub trait NarrativeSource: Send + Sync {
    /// A line for the attempt, or `None` if there is nothing to say.
    fn describe(&self, request: &NarrativeRequest<'_>) -> Option<String>;
}

/// Says nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNarrative;

impl NarrativeSource for NoNarrative {
    fn describe(&self, _request: &NarrativeRequest<'_>) -> Option<String> {
        None
    }
}

/// Lines for one challenge kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeLines {
    /// One line per outcome category.
    #[serde(default)]
    pub outcomes: BTreeMap<OutcomeCategory, String>,
    /// One line per complication, keyed by effect tag.
    #[serde(default)]
    pub complications: BTreeMap<String, String>,
}

/// Narrative keyed by challenge kind, loadable from YAML.
///
/// ```yaml
/// trap_disarmament:
///   outcomes:
///     success: The mechanism clicks and goes still.
///   complications:
///     alarm_triggered: Somewhere a bell starts ringing.
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NarrativeTable {
    kinds: BTreeMap<String, NarrativeLines>,
}

impl NarrativeTable {
    /// Parses a table from YAML.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the YAML does not
    /// parse.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::configuration(format!("narrative YAML: {e}")))
    }

    /// Adds or replaces the lines for `kind`.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>, lines: NarrativeLines) -> Self {
        self.kinds.insert(kind.into(), lines);
        self
    }
}

impl NarrativeSource for NarrativeTable {
    fn describe(&self, request: &NarrativeRequest<'_>) -> Option<String> {
        let lines = self.kinds.get(request.kind)?;
        let outcome = lines.outcomes.get(&request.category);
        let complication = request
            .complication
            .and_then(|effect| lines.complications.get(effect.tag()));

        match (outcome, complication) {
            (Some(outcome), Some(complication)) => Some(format!("{outcome} {complication}")),
            (Some(line), None) | (None, Some(line)) => Some(line.clone()),
            (None, None) => None,
        }
    }
}
