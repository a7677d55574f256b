//! Shared helpers for procedure integration tests.
#![allow(dead_code)]

use gauntlet_core::error::DomainError;
use gauntlet_core::rng::DeterministicRng;
use gauntlet_procedure::application::engine::ProcedureEngine;
use gauntlet_procedure::domain::aggregates::{AttemptResult, ProcedureState};
use gauntlet_procedure::domain::commands::{
    AttemptChallenge, BeginProcedure, Investigate, ResumeProcedure, StallProcedure,
};
use gauntlet_procedure::domain::config::{ChallengeRules, ResistanceTier};
use gauntlet_procedure::domain::context::ChallengeContext;
use gauntlet_test_support::{SequenceRng, fixed_clock};
use uuid::Uuid;

/// Begins a procedure with a fresh id.
pub fn begin<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    tier: ResistanceTier,
    resistance: Option<u32>,
) -> ProcedureState {
    begin_with_id(engine, Uuid::new_v4(), tier, resistance)
}

/// Begins a procedure with a chosen id.
pub fn begin_with_id<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    procedure_id: Uuid,
    tier: ResistanceTier,
    resistance: Option<u32>,
) -> ProcedureState {
    engine
        .begin(
            &BeginProcedure {
                correlation_id: Uuid::new_v4(),
                procedure_id,
                tier,
                resistance,
            },
            &fixed_clock(),
        )
        .unwrap()
}

/// Makes the next attempt with any RNG.
pub fn attempt_with<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    state: &mut ProcedureState,
    context: ChallengeContext,
    attribute_score: i32,
    rng: &mut dyn DeterministicRng,
) -> Result<AttemptResult, DomainError> {
    engine.attempt(
        state,
        &AttemptChallenge {
            correlation_id: Uuid::new_v4(),
            context,
            attribute_score,
        },
        rng,
        &fixed_clock(),
    )
}

/// Makes the next attempt with scripted faces, asserting all were used.
pub fn attempt<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    state: &mut ProcedureState,
    context: ChallengeContext,
    attribute_score: i32,
    rolls: Vec<u32>,
) -> AttemptResult {
    let mut rng = SequenceRng::new(rolls);
    let result = attempt_with(engine, state, context, attribute_score, &mut rng).unwrap();
    assert!(rng.is_exhausted(), "scripted rolls left over");
    result
}

/// Investigates with scripted faces.
pub fn investigate<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    state: &mut ProcedureState,
    base_difficulty: i32,
    attribute_score: i32,
    rolls: Vec<u32>,
) -> gauntlet_procedure::domain::aggregates::InsightTier {
    engine
        .investigate(
            state,
            &Investigate {
                correlation_id: Uuid::new_v4(),
                base_difficulty,
                attribute_score,
                pool_size_modifier: 0,
            },
            &mut SequenceRng::new(rolls),
            &fixed_clock(),
        )
        .unwrap()
}

/// Stalls at the caller's request.
pub fn stall<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    state: &mut ProcedureState,
    reason: &str,
) {
    engine
        .stall(
            state,
            &StallProcedure {
                correlation_id: Uuid::new_v4(),
                reason: reason.to_owned(),
                resume_condition: None,
            },
            &fixed_clock(),
        )
        .unwrap();
}

/// Resumes with the configured reduction.
pub fn resume<R: ChallengeRules>(
    engine: &ProcedureEngine<R>,
    state: &mut ProcedureState,
) -> Result<u32, DomainError> {
    engine.resume(
        state,
        &ResumeProcedure {
            correlation_id: Uuid::new_v4(),
            reduction: None,
        },
        &fixed_clock(),
    )
}
