//! Challenge rules: everything that makes a trap different from an
//! interrogation.
//!
//! The engine talks to rules through [`ChallengeRules`]. [`ChallengeConfig`]
//! is the data-driven implementation, loadable from YAML; hand-written
//! strategies can implement the trait directly.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use gauntlet_core::error::DomainError;
use gauntlet_rules::domain::classifier::OutcomeThresholds;
use gauntlet_rules::domain::complication::ComplicationTable;
use gauntlet_rules::domain::dice::FaceRules;
use serde::{Deserialize, Serialize};

use super::context::{Approach, ApproachAdjustment};

/// How hard an opponent or mechanism is to wear down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceTier {
    /// Barely resists.
    Minimal,
    /// Some resistance.
    Low,
    /// Typical.
    Moderate,
    /// Stubborn.
    High,
    /// Near immovable.
    Extreme,
}

impl ResistanceTier {
    /// All tiers, weakest first.
    pub const ALL: [Self; 5] = [
        Self::Minimal,
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::Extreme,
    ];

    /// Assesses a tier from a caller-computed resistance score.
    #[must_use]
    pub const fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=2 => Self::Minimal,
            3..=4 => Self::Low,
            5..=6 => Self::Moderate,
            7..=8 => Self::High,
            _ => Self::Extreme,
        }
    }
}

impl fmt::Display for ResistanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
        };
        f.write_str(name)
    }
}

/// One value per resistance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable<T> {
    /// Value for [`ResistanceTier::Minimal`].
    pub minimal: T,
    /// Value for [`ResistanceTier::Low`].
    pub low: T,
    /// Value for [`ResistanceTier::Moderate`].
    pub moderate: T,
    /// Value for [`ResistanceTier::High`].
    pub high: T,
    /// Value for [`ResistanceTier::Extreme`].
    pub extreme: T,
}

impl<T> TierTable<T> {
    /// Builds a table from values listed weakest tier first.
    #[must_use]
    pub const fn new(minimal: T, low: T, moderate: T, high: T, extreme: T) -> Self {
        Self {
            minimal,
            low,
            moderate,
            high,
            extreme,
        }
    }

    /// The value for `tier`.
    #[must_use]
    pub const fn get(&self, tier: ResistanceTier) -> &T {
        match tier {
            ResistanceTier::Minimal => &self.minimal,
            ResistanceTier::Low => &self.low,
            ResistanceTier::Moderate => &self.moderate,
            ResistanceTier::High => &self.high,
            ResistanceTier::Extreme => &self.extreme,
        }
    }
}

impl<T: Copy> TierTable<T> {
    /// The same value for every tier.
    #[must_use]
    pub const fn uniform(value: T) -> Self {
        Self::new(value, value, value, value, value)
    }
}

/// How difficulty moves between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRules {
    /// Difficulty added after each failed attempt.
    pub escalation_per_failure: u32,
    /// Difficulty removed after each failed attempt as the actor learns.
    #[serde(default)]
    pub learning_per_failure: u32,
    /// Effective difficulty never drops below this.
    #[serde(default)]
    pub floor: Option<i32>,
    /// Accrued escalation never exceeds this.
    #[serde(default)]
    pub escalation_cap: Option<u32>,
    /// Reaching the cap with less depletion progress than this percentage
    /// fails the procedure.
    #[serde(default)]
    pub collapse_below_progress_percent: Option<u32>,
    /// Converts effective difficulty into successes required as
    /// `ceil(difficulty / divisor)`.
    #[serde(default)]
    pub successes_divisor: Option<u32>,
}

/// What a fumble does to the procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FumblePolicy {
    /// A fumble ends the procedure in failure.
    Catastrophic,
    /// A fumble is a failure with extra escalation on top.
    Penalty {
        /// Escalation added beyond the ordinary per-failure step.
        escalation: u32,
    },
}

impl FumblePolicy {
    /// A fumble counts as an ordinary failure.
    pub const ORDINARY: Self = Self::Penalty { escalation: 0 };
}

/// How much resistance a successful attempt removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressRule {
    /// The same amount for every success.
    Fixed {
        /// Resistance removed.
        amount: u32,
    },
    /// Successes beyond what was required.
    NetMargin,
}

/// Depleting-resistance settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResistanceRules {
    /// Resistance a procedure starts with, per tier.
    pub starting: TierTable<u32>,
    /// Progress per successful attempt.
    pub progress: ProgressRule,
    /// Progress never falls below this on a success.
    #[serde(default = "default_minimum_progress")]
    pub minimum_progress: u32,
}

const fn default_minimum_progress() -> u32 {
    1
}

impl ResistanceRules {
    /// Resistance removed by a success that beat its requirement by
    /// `margin`.
    #[must_use]
    pub fn progress_for(&self, margin: i32) -> u32 {
        let raw = match self.progress {
            ProgressRule::Fixed { amount } => amount,
            ProgressRule::NetMargin => u32::try_from(margin).unwrap_or(0),
        };
        raw.max(self.minimum_progress)
    }
}

/// When a procedure parks itself and how it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallRules {
    /// Escalation at which the procedure stalls on its own.
    pub escalation_threshold: u32,
    /// Escalation removed by a resume that names no amount.
    #[serde(default = "default_resume_reduction")]
    pub resume_reduction: u32,
    /// A resume never takes escalation below this.
    #[serde(default)]
    pub resume_floor: u32,
}

impl StallRules {
    /// Reduction applied when neither the caller nor the rules name one.
    pub const DEFAULT_RESUME_REDUCTION: u32 = 2;
}

const fn default_resume_reduction() -> u32 {
    StallRules::DEFAULT_RESUME_REDUCTION
}

/// Settings for the optional look-before-you-leap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationRules {
    /// Investigation difficulty relative to the challenge's base.
    #[serde(default)]
    pub difficulty_offset: i32,
    /// Width of the bands around the investigation difficulty.
    pub tier_spread: i32,
    /// Difficulty removed from every later attempt on a mastery read.
    pub insight_relief: u32,
}

/// The strategy a [`crate::application::engine::ProcedureEngine`] consults.
///
/// Getters expose the configured numbers; the provided methods derive
/// values from them and may be overridden by hand-written rules.
pub trait ChallengeRules: Send + Sync {
    /// Name of the challenge kind, e.g. `trap_disarmament`.
    fn kind(&self) -> &str;

    /// How dice faces are read.
    fn face_rules(&self) -> &FaceRules;

    /// Critical and partial margins.
    fn thresholds(&self) -> &OutcomeThresholds;

    /// Escalation, learning, floors and caps.
    fn difficulty_rules(&self) -> &DifficultyRules;

    /// What a fumble does.
    fn fumble_policy(&self) -> FumblePolicy;

    /// Table consulted on failure, if any.
    fn complications(&self) -> Option<&ComplicationTable>;

    /// Depletion settings; `None` for single-success challenges.
    fn resistance(&self) -> Option<&ResistanceRules>;

    /// Attempt limit for a tier; `None` means unlimited.
    fn max_attempts(&self, tier: ResistanceTier) -> Option<u32>;

    /// Stall settings, if the challenge stalls on its own.
    fn stall(&self) -> Option<&StallRules>;

    /// Investigation settings, if the challenge can be investigated.
    fn investigation(&self) -> Option<&InvestigationRules>;

    /// The adjustment for the chosen approach.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the approach is not offered.
    fn approach(&self, approach: Option<&Approach>) -> Result<ApproachAdjustment, DomainError>;

    /// Checks the rules are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` describing the problem.
    fn validate(&self) -> Result<(), DomainError>;

    /// Successes a roll needs to meet `difficulty`.
    fn successes_required(&self, difficulty: i32) -> i32 {
        match self.difficulty_rules().successes_divisor {
            Some(divisor) if divisor > 0 => {
                let divisor = i32::try_from(divisor).unwrap_or(i32::MAX);
                difficulty.div_euclid(divisor) + i32::from(difficulty.rem_euclid(divisor) != 0)
            }
            _ => difficulty,
        }
    }

    /// Starting resistance for a tier, if the challenge depletes.
    fn starting_resistance(&self, tier: ResistanceTier) -> Option<u32> {
        self.resistance().map(|rules| *rules.starting.get(tier))
    }
}

/// Data-driven [`ChallengeRules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Name of the challenge kind.
    pub kind: String,
    /// How dice faces are read.
    pub faces: FaceRules,
    /// Critical and partial margins.
    #[serde(default)]
    pub thresholds: OutcomeThresholds,
    /// Escalation, learning, floors and caps.
    #[serde(default)]
    pub difficulty: DifficultyRules,
    /// What a fumble does.
    pub fumble: FumblePolicy,
    /// Table consulted on failure.
    #[serde(default)]
    pub complications: Option<ComplicationTable>,
    /// Depletion settings.
    #[serde(default)]
    pub resistance: Option<ResistanceRules>,
    /// Attempt limits per tier.
    #[serde(default)]
    pub max_attempts: Option<TierTable<u32>>,
    /// Stall settings.
    #[serde(default)]
    pub stall: Option<StallRules>,
    /// Investigation settings.
    #[serde(default)]
    pub investigation: Option<InvestigationRules>,
    /// Offered approaches. Empty accepts any approach with no shift.
    #[serde(default)]
    pub approaches: BTreeMap<Approach, ApproachAdjustment>,
}

impl ChallengeConfig {
    /// Parses and validates a single challenge from YAML.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the YAML does not
    /// parse or the rules are inconsistent.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::configuration(format!("challenge YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

impl ChallengeRules for ChallengeConfig {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn face_rules(&self) -> &FaceRules {
        &self.faces
    }

    fn thresholds(&self) -> &OutcomeThresholds {
        &self.thresholds
    }

    fn difficulty_rules(&self) -> &DifficultyRules {
        &self.difficulty
    }

    fn fumble_policy(&self) -> FumblePolicy {
        self.fumble
    }

    fn complications(&self) -> Option<&ComplicationTable> {
        self.complications.as_ref()
    }

    fn resistance(&self) -> Option<&ResistanceRules> {
        self.resistance.as_ref()
    }

    fn max_attempts(&self, tier: ResistanceTier) -> Option<u32> {
        self.max_attempts.as_ref().map(|table| *table.get(tier))
    }

    fn stall(&self) -> Option<&StallRules> {
        self.stall.as_ref()
    }

    fn investigation(&self) -> Option<&InvestigationRules> {
        self.investigation.as_ref()
    }

    fn approach(&self, approach: Option<&Approach>) -> Result<ApproachAdjustment, DomainError> {
        if self.approaches.is_empty() {
            return Ok(ApproachAdjustment::NONE);
        }
        let Some(approach) = approach else {
            return Err(DomainError::precondition(format!(
                "{} requires an approach",
                self.kind
            )));
        };
        self.approaches.get(approach).copied().ok_or_else(|| {
            DomainError::precondition(format!(
                "{} does not offer the {approach} approach",
                self.kind
            ))
        })
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.kind.trim().is_empty() {
            return Err(DomainError::configuration("challenge kind is empty"));
        }
        self.faces.validate()?;
        self.thresholds.validate()?;
        if let Some(table) = &self.complications {
            table.validate()?;
        }

        if self.difficulty.successes_divisor == Some(0) {
            return Err(DomainError::configuration(
                "successes divisor must be positive",
            ));
        }
        if let Some(percent) = self
            .difficulty
            .collapse_below_progress_percent
            .filter(|percent| *percent > 100)
        {
            return Err(DomainError::configuration(format!(
                "collapse threshold {percent}% exceeds 100%"
            )));
        }
        if self.difficulty.collapse_below_progress_percent.is_some()
            && (self.difficulty.escalation_cap.is_none() || self.resistance.is_none())
        {
            return Err(DomainError::configuration(
                "collapse needs both an escalation cap and depleting resistance",
            ));
        }

        if let Some(resistance) = &self.resistance {
            if let Some(tier) = ResistanceTier::ALL
                .into_iter()
                .find(|tier| *resistance.starting.get(*tier) == 0)
            {
                return Err(DomainError::configuration(format!(
                    "starting resistance for {tier} tier must be positive"
                )));
            }
            if resistance.minimum_progress == 0 {
                return Err(DomainError::configuration(
                    "minimum progress per success must be positive",
                ));
            }
        }

        if let Some(limits) = &self.max_attempts {
            if let Some(tier) = ResistanceTier::ALL
                .into_iter()
                .find(|tier| *limits.get(*tier) == 0)
            {
                return Err(DomainError::configuration(format!(
                    "max attempts for {tier} tier must be positive"
                )));
            }
        }

        if let Some(stall) = &self.stall {
            if stall.escalation_threshold == 0 {
                return Err(DomainError::configuration(
                    "stall threshold must be positive",
                ));
            }
            if stall.resume_floor >= stall.escalation_threshold {
                return Err(DomainError::configuration(format!(
                    "resume floor {} would leave the procedure at its stall threshold {}",
                    stall.resume_floor, stall.escalation_threshold
                )));
            }
        }

        if let Some(investigation) = &self.investigation {
            if investigation.tier_spread < 0 {
                return Err(DomainError::configuration(format!(
                    "investigation spread must not be negative, got {}",
                    investigation.tier_spread
                )));
            }
        }

        Ok(())
    }
}

/// A named set of challenge configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeCatalog {
    challenges: BTreeMap<String, ChallengeConfig>,
}

#[derive(Deserialize)]
struct CatalogFile {
    challenges: Vec<ChallengeConfig>,
}

impl ChallengeCatalog {
    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the bundled file is
    /// malformed.
    pub fn bundled() -> Result<Self, DomainError> {
        Self::from_yaml(include_str!("../../config/default_challenges.yaml"))
    }

    /// Parses and validates a catalog: a `challenges` list of configs with
    /// unique kinds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the YAML does not
    /// parse, a config is invalid or a kind appears twice.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::configuration(format!("catalog YAML: {e}")))?;

        let mut challenges = BTreeMap::new();
        for config in file.challenges {
            config.validate()?;
            let kind = config.kind.clone();
            if challenges.insert(kind.clone(), config).is_some() {
                return Err(DomainError::configuration(format!(
                    "challenge kind {kind} is defined twice"
                )));
            }
        }
        Ok(Self { challenges })
    }

    /// Reads a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the file cannot be
    /// read or fails [`ChallengeCatalog::from_yaml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// The config for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&ChallengeConfig> {
        self.challenges.get(kind)
    }

    /// Challenge kinds in the catalog, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.challenges.keys().map(String::as_str)
    }

    /// Number of challenge kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::presets;

    fn minimal_yaml() -> &'static str {
        r"
kind: lockpicking
faces: { die_faces: 10, success_threshold: 8, botch_face: 1 }
fumble: { kind: catastrophic }
"
    }

    #[test]
    fn test_from_score_bands() {
        assert_eq!(ResistanceTier::from_score(-3), ResistanceTier::Minimal);
        assert_eq!(ResistanceTier::from_score(2), ResistanceTier::Minimal);
        assert_eq!(ResistanceTier::from_score(3), ResistanceTier::Low);
        assert_eq!(ResistanceTier::from_score(6), ResistanceTier::Moderate);
        assert_eq!(ResistanceTier::from_score(8), ResistanceTier::High);
        assert_eq!(ResistanceTier::from_score(9), ResistanceTier::Extreme);
    }

    #[test]
    fn test_tier_table_lookup() {
        let table = TierTable::new(1, 2, 3, 4, 5);
        let values: Vec<u32> = ResistanceTier::ALL.iter().map(|t| *table.get(*t)).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = ChallengeConfig::from_yaml(minimal_yaml()).unwrap();

        assert_eq!(config.kind(), "lockpicking");
        assert_eq!(config.thresholds, OutcomeThresholds::STANDARD);
        assert_eq!(config.difficulty, DifficultyRules::default());
        assert!(config.complications().is_none());
        assert_eq!(config.max_attempts(ResistanceTier::High), None);
        assert_eq!(
            config.approach(Some(&Approach::new("anything"))).unwrap(),
            ApproachAdjustment::NONE
        );
    }

    #[test]
    fn test_unparseable_yaml_is_configuration_error() {
        let result = ChallengeConfig::from_yaml("kind: [unterminated");
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_inverted_faces_are_rejected() {
        let yaml = r"
kind: broken
faces: { die_faces: 10, success_threshold: 3, botch_face: 5 }
fumble: { kind: catastrophic }
";
        match ChallengeConfig::from_yaml(yaml).unwrap_err() {
            DomainError::InvalidConfiguration(msg) => assert!(msg.contains("botch face")),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_starting_resistance_is_rejected() {
        let mut config = presets::extended_influence();
        config.resistance = Some(ResistanceRules {
            starting: TierTable::new(0, 10, 15, 20, 25),
            progress: ProgressRule::NetMargin,
            minimum_progress: 1,
        });

        match config.validate().unwrap_err() {
            DomainError::InvalidConfiguration(msg) => assert!(msg.contains("minimal")),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_divisor_is_rejected() {
        let mut config = presets::interrogation();
        config.difficulty.successes_divisor = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_collapse_without_cap_is_rejected() {
        let mut config = presets::extended_influence();
        config.difficulty.escalation_cap = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_successes_required_rounds_up() {
        let config = presets::interrogation();
        assert_eq!(config.successes_required(12), 3);
        assert_eq!(config.successes_required(14), 4);
        assert_eq!(config.successes_required(16), 4);
        assert_eq!(config.successes_required(0), 0);
        assert_eq!(config.successes_required(-3), 0);
    }

    #[test]
    fn test_successes_required_without_divisor_is_identity() {
        let config = presets::trap_disarmament();
        assert_eq!(config.successes_required(14), 14);
    }

    #[test]
    fn test_unknown_approach_is_precondition() {
        let config = presets::interrogation();
        match config.approach(Some(&Approach::new("torture"))).unwrap_err() {
            DomainError::Precondition(msg) => assert!(msg.contains("torture")),
            other => panic!("expected Precondition, got {other:?}"),
        }
        assert!(matches!(
            config.approach(None),
            Err(DomainError::Precondition(_))
        ));
    }

    #[test]
    fn test_progress_has_minimum() {
        let rules = ResistanceRules {
            starting: TierTable::uniform(6),
            progress: ProgressRule::NetMargin,
            minimum_progress: 1,
        };
        assert_eq!(rules.progress_for(0), 1);
        assert_eq!(rules.progress_for(-2), 1);
        assert_eq!(rules.progress_for(3), 3);
    }

    #[test]
    fn test_bundled_catalog_matches_presets() {
        let catalog = ChallengeCatalog::bundled().unwrap();

        assert_eq!(catalog.len(), 5);
        for preset in presets::all() {
            assert_eq!(catalog.get(&preset.kind), Some(&preset), "{}", preset.kind);
        }
    }

    #[test]
    fn test_duplicate_kinds_are_rejected() {
        let yaml = format!(
            "challenges:\n  - {}\n  - {}\n",
            "{ kind: a, faces: { die_faces: 10, success_threshold: 8, botch_face: 1 }, fumble: { kind: catastrophic } }",
            "{ kind: a, faces: { die_faces: 10, success_threshold: 6, botch_face: 1 }, fumble: { kind: catastrophic } }",
        );
        match ChallengeCatalog::from_yaml(&yaml).unwrap_err() {
            DomainError::InvalidConfiguration(msg) => assert!(msg.contains("twice")),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_load_reports_missing_file() {
        let result = ChallengeCatalog::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }
}
