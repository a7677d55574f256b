//! Ready-made rules for the five challenge kinds the engine was built
//! around.
//!
//! The numbers are game balance, not engine logic. The bundled
//! `config/default_challenges.yaml` carries the same values.

use std::collections::BTreeMap;

use gauntlet_rules::domain::classifier::OutcomeThresholds;
use gauntlet_rules::domain::complication::ComplicationTable;
use gauntlet_rules::domain::dice::FaceRules;

use super::config::{
    ChallengeConfig, DifficultyRules, FumblePolicy, InvestigationRules, ProgressRule,
    ResistanceRules, StallRules, TierTable,
};
use super::context::{Approach, ApproachAdjustment};

/// Disarming a detected trap: one success clears it, every miss makes
/// the mechanism touchier, a fumble sets it off.
#[must_use]
pub fn trap_disarmament() -> ChallengeConfig {
    ChallengeConfig {
        kind: "trap_disarmament".to_owned(),
        faces: FaceRules::NARROW.with_botch_cancellation(),
        thresholds: OutcomeThresholds::STANDARD,
        difficulty: DifficultyRules {
            escalation_per_failure: 1,
            ..DifficultyRules::default()
        },
        fumble: FumblePolicy::Catastrophic,
        complications: None,
        resistance: None,
        max_attempts: None,
        stall: None,
        investigation: Some(InvestigationRules {
            difficulty_offset: 0,
            tier_spread: 2,
            insight_relief: 1,
        }),
        approaches: BTreeMap::new(),
    }
}

/// Coaxing a broken mechanism into working: the actor learns from each
/// failure, and failures roll on the machinery complication table.
#[must_use]
pub fn jury_rigging() -> ChallengeConfig {
    ChallengeConfig {
        kind: "jury_rigging".to_owned(),
        faces: FaceRules::NARROW.with_botch_cancellation(),
        thresholds: OutcomeThresholds::STANDARD.with_partial_margin(2),
        difficulty: DifficultyRules {
            escalation_per_failure: 0,
            learning_per_failure: 1,
            floor: Some(4),
            ..DifficultyRules::default()
        },
        fumble: FumblePolicy::Catastrophic,
        complications: Some(ComplicationTable::standard()),
        resistance: None,
        max_attempts: None,
        stall: None,
        investigation: Some(InvestigationRules {
            difficulty_offset: 0,
            tier_spread: 2,
            insight_relief: 2,
        }),
        approaches: BTreeMap::new(),
    }
}

/// Wearing down a subject's resistance one round at a time. The method
/// shifts a base difficulty of 12 and every round needs a quarter of the
/// difficulty in successes.
#[must_use]
pub fn interrogation() -> ChallengeConfig {
    let approaches = [
        ("good_cop", 2),
        ("bad_cop", 0),
        ("deception", 4),
        ("bribery", -2),
    ]
    .into_iter()
    .map(|(name, shift)| (Approach::new(name), ApproachAdjustment::difficulty(shift)))
    .collect();

    ChallengeConfig {
        kind: "interrogation".to_owned(),
        faces: FaceRules::NARROW,
        thresholds: OutcomeThresholds::STANDARD,
        difficulty: DifficultyRules {
            escalation_per_failure: 1,
            successes_divisor: Some(4),
            ..DifficultyRules::default()
        },
        fumble: FumblePolicy::Penalty { escalation: 1 },
        complications: None,
        resistance: Some(ResistanceRules {
            starting: TierTable::new(1, 3, 5, 8, 12),
            progress: ProgressRule::Fixed { amount: 1 },
            minimum_progress: 1,
        }),
        max_attempts: Some(TierTable::new(3, 6, 10, 15, 20)),
        stall: None,
        investigation: None,
        approaches,
    }
}

/// Shifting a conviction over several conversations. Stubbornness builds
/// with each failure; the exchange stalls when it runs hot and collapses
/// if it peaks before the argument is half won.
#[must_use]
pub fn extended_influence() -> ChallengeConfig {
    ChallengeConfig {
        kind: "extended_influence".to_owned(),
        faces: FaceRules::WIDE,
        thresholds: OutcomeThresholds::STANDARD,
        difficulty: DifficultyRules {
            escalation_per_failure: 1,
            escalation_cap: Some(6),
            collapse_below_progress_percent: Some(50),
            ..DifficultyRules::default()
        },
        fumble: FumblePolicy::ORDINARY,
        complications: None,
        resistance: Some(ResistanceRules {
            starting: TierTable::new(5, 10, 15, 20, 25),
            progress: ProgressRule::NetMargin,
            minimum_progress: 1,
        }),
        max_attempts: None,
        stall: Some(StallRules {
            escalation_threshold: 4,
            resume_reduction: 2,
            resume_floor: 0,
        }),
        investigation: None,
        approaches: BTreeMap::new(),
    }
}

/// Forcing a barrier. Sturdier barriers allow fewer tries; a fumble jars
/// the frame and makes every later try harder.
#[must_use]
pub fn brute_force() -> ChallengeConfig {
    ChallengeConfig {
        kind: "brute_force".to_owned(),
        faces: FaceRules::NARROW.with_botch_cancellation(),
        thresholds: OutcomeThresholds::STANDARD,
        difficulty: DifficultyRules {
            escalation_per_failure: 1,
            ..DifficultyRules::default()
        },
        fumble: FumblePolicy::Penalty { escalation: 2 },
        complications: None,
        resistance: None,
        max_attempts: Some(TierTable::new(5, 5, 3, 3, 2)),
        stall: None,
        investigation: None,
        approaches: BTreeMap::new(),
    }
}

/// Every preset.
#[must_use]
pub fn all() -> Vec<ChallengeConfig> {
    vec![
        trap_disarmament(),
        jury_rigging(),
        interrogation(),
        extended_influence(),
        brute_force(),
    ]
}
