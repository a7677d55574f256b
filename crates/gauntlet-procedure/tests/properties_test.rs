//! Properties that hold for any roll sequence.

mod common;

use gauntlet_core::error::DomainError;
use gauntlet_procedure::application::engine::ProcedureEngine;
use gauntlet_procedure::domain::aggregates::ProcedureStatus;
use gauntlet_procedure::domain::commands::AbortProcedure;
use gauntlet_procedure::domain::config::ResistanceTier;
use gauntlet_procedure::domain::context::ChallengeContext;
use gauntlet_procedure::domain::presets;
use gauntlet_test_support::{SequenceRng, fixed_clock};
use proptest::prelude::*;
use uuid::Uuid;

proptest! {
    #[test]
    fn test_failures_escalate_difficulty_linearly(
        base in 1i32..30,
        faces in prop::collection::vec(2u32..=7, 0..10),
    ) {
        let engine = ProcedureEngine::new(presets::trap_disarmament()).unwrap();
        let mut state = common::begin(&engine, ResistanceTier::Moderate, None);

        for (index, face) in faces.iter().enumerate() {
            let number = u32::try_from(index).unwrap() + 1;
            common::attempt(&engine, &mut state, ChallengeContext::new(base, number), 1, vec![*face]);
        }

        let failures = i32::try_from(faces.len()).unwrap();
        let next = ChallengeContext::new(base, u32::try_from(faces.len()).unwrap() + 1);
        prop_assert_eq!(engine.effective_difficulty(&state, &next).unwrap(), base + failures);
    }

    #[test]
    fn test_resistance_never_increases(
        faces in prop::collection::vec(1u32..=10, 3..=36),
        base in 1i32..6,
    ) {
        let engine = ProcedureEngine::new(presets::extended_influence()).unwrap();
        let mut state = common::begin(&engine, ResistanceTier::High, None);
        let mut rng = SequenceRng::new(faces.clone());
        let mut previous = state.resistance_remaining();

        for chunk in 0..faces.len() / 3 {
            if state.status() == ProcedureStatus::Stalled {
                common::resume(&engine, &mut state).unwrap();
                prop_assert_eq!(state.resistance_remaining(), previous);
            }
            if state.status() != ProcedureStatus::Active {
                break;
            }
            let number = u32::try_from(chunk).unwrap() + 1;
            common::attempt_with(&engine, &mut state, ChallengeContext::new(base, number), 3, &mut rng)
                .unwrap();
            prop_assert!(state.resistance_remaining() <= previous);
            previous = state.resistance_remaining();
        }
    }

    #[test]
    fn test_terminal_states_reject_every_command(ending in 0u8..3, face in 1u32..=10) {
        let engine = ProcedureEngine::new(presets::brute_force()).unwrap();
        let mut state = common::begin(&engine, ResistanceTier::Extreme, None);

        match ending {
            0 => {
                common::attempt(&engine, &mut state, ChallengeContext::new(1, 1), 1, vec![9]);
            }
            1 => {
                common::attempt(&engine, &mut state, ChallengeContext::new(20, 1), 1, vec![5]);
                common::attempt(&engine, &mut state, ChallengeContext::new(20, 2), 1, vec![5]);
            }
            _ => {
                engine
                    .abort(
                        &mut state,
                        &AbortProcedure { correlation_id: Uuid::new_v4(), reason: "walked away".to_owned() },
                        &fixed_clock(),
                    )
                    .unwrap();
            }
        }
        prop_assert!(state.status().is_absorbing());
        let frozen = engine.snapshot(&state);

        let number = state.attempts_made() + 1;
        let attempt = common::attempt_with(
            &engine,
            &mut state,
            ChallengeContext::new(1, number),
            1,
            &mut SequenceRng::new(vec![face]),
        );
        prop_assert!(matches!(attempt, Err(DomainError::Precondition(_))));
        prop_assert!(matches!(common::resume(&engine, &mut state), Err(DomainError::Precondition(_))));
        prop_assert_eq!(engine.snapshot(&state), frozen);
    }
}

#[test]
fn test_resume_requires_stalled_procedure() {
    let engine = ProcedureEngine::new(presets::extended_influence()).unwrap();
    let mut state = common::begin(&engine, ResistanceTier::Low, None);

    let result = common::resume(&engine, &mut state);

    assert!(matches!(result, Err(DomainError::Precondition(_))));
    assert_eq!(state.status(), ProcedureStatus::Active);
}
