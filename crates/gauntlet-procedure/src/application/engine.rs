//! The procedure engine: one generic state machine for every challenge
//! kind.
//!
//! The engine owns its rules and narrative source. State, randomness and
//! time arrive with each call, so one engine can serve any number of
//! independent procedures. A call either applies completely or, on error,
//! leaves the state untouched.

use gauntlet_core::clock::Clock;
use gauntlet_core::command::Command;
use gauntlet_core::error::DomainError;
use gauntlet_core::rng::DeterministicRng;
use gauntlet_rules::application::checks::effective_pool_size;
use gauntlet_rules::domain::classifier::{OutcomeCategory, classify};
use gauntlet_rules::domain::complication::{ComplicationImpact, ComplicationRoll};
use gauntlet_rules::domain::outcome::RollOutcome;
use gauntlet_rules::domain::resolver::{resolve, resolve_with_mode};
use tracing::{debug, info, instrument, warn};

use crate::application::query_handlers::{self, ProcedureView};
use crate::domain::aggregates::{
    AttemptResult, InsightTier, ProcedureState, ProcedureStatus, ProcedureStep,
    depletion_percent,
};
use crate::domain::commands::{
    AbortProcedure, AttemptChallenge, BeginProcedure, Investigate, ResumeProcedure, StallProcedure,
};
use crate::domain::config::{ChallengeConfig, ChallengeRules, FumblePolicy, StallRules};
use crate::domain::context::{ApproachAdjustment, ChallengeContext};
use crate::domain::events::{
    AttemptResolved, ProcedureAborted, ProcedureBegan, ProcedureEventKind, ProcedureInvestigated,
    ProcedureResumed, ProcedureStalled,
};
use crate::domain::narrative::{NarrativeRequest, NarrativeSource, NoNarrative};

/// Runs procedures under one set of [`ChallengeRules`].
pub struct ProcedureEngine<R: ChallengeRules = ChallengeConfig> {
    rules: R,
    narrative: Box<dyn NarrativeSource>,
}

/// What an attempt does to the procedure, worked out before anything is
/// recorded.
struct Transition {
    status: ProcedureStatus,
    escalation_after: u32,
    learning_after: u32,
    resistance_after: Option<u32>,
    resistance_delta: i32,
    complication: Option<ComplicationRoll>,
    auto_stall: Option<String>,
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl<R: ChallengeRules> ProcedureEngine<R> {
    /// Validates `rules` and builds an engine with no narrative.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the rules are
    /// inconsistent.
    pub fn new(rules: R) -> Result<Self, DomainError> {
        rules.validate()?;
        Ok(Self {
            rules,
            narrative: Box::new(NoNarrative),
        })
    }

    /// Replaces the narrative source.
    #[must_use]
    pub fn with_narrative(mut self, narrative: impl NarrativeSource + 'static) -> Self {
        self.narrative = Box::new(narrative);
        self
    }

    /// The rules this engine runs.
    #[must_use]
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Sets up a new procedure in `Setup`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if a starting resistance
    /// is supplied for a challenge that does not deplete, is zero, or is
    /// missing for one that does.
    #[instrument(
        skip_all,
        fields(
            command = command.command_type(),
            correlation_id = %command.correlation_id,
            kind = %self.rules.kind(),
            procedure_id = %command.procedure_id,
        )
    )]
    pub fn begin(
        &self,
        command: &BeginProcedure,
        clock: &dyn Clock,
    ) -> Result<ProcedureState, DomainError> {
        let kind = self.rules.kind();
        let starting_resistance = match (self.rules.resistance(), command.resistance) {
            (Some(_), Some(0)) => {
                return Err(DomainError::configuration(
                    "starting resistance must be positive",
                ));
            }
            (Some(_), Some(resistance)) => Some(resistance),
            (Some(_), None) => Some(self.rules.starting_resistance(command.tier).ok_or_else(
                || {
                    DomainError::configuration(format!(
                        "{kind} has no starting resistance for the {} tier",
                        command.tier
                    ))
                },
            )?),
            (None, Some(_)) => {
                return Err(DomainError::configuration(format!(
                    "{kind} does not track resistance"
                )));
            }
            (None, None) => None,
        };
        let max_attempts = self.rules.max_attempts(command.tier);

        let mut state = ProcedureState::new(command.procedure_id);
        state.record(
            ProcedureEventKind::Began(ProcedureBegan {
                procedure_id: command.procedure_id,
                kind: kind.to_owned(),
                tier: command.tier,
                starting_resistance,
                max_attempts,
            }),
            command.correlation_id,
            clock,
        );

        info!(
            correlation_id = %command.correlation_id,
            tier = %command.tier,
            resistance = ?starting_resistance,
            max_attempts = ?max_attempts,
            "procedure began"
        );
        Ok(state)
    }

    /// Studies the obstacle before the first attempt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the procedure is not `Active`
    /// in `Setup`, belongs to other rules, or the challenge offers no
    /// investigation.
    #[instrument(
        skip_all,
        fields(
            command = command.command_type(),
            correlation_id = %command.correlation_id,
            kind = %self.rules.kind(),
            procedure_id = %state.id,
        )
    )]
    pub fn investigate(
        &self,
        state: &mut ProcedureState,
        command: &Investigate,
        rng: &mut dyn DeterministicRng,
        clock: &dyn Clock,
    ) -> Result<InsightTier, DomainError> {
        self.ensure_runs(state)?;
        state.ensure_active("investigate")?;
        if state.step != ProcedureStep::Setup {
            return Err(DomainError::precondition(format!(
                "cannot investigate: procedure is past setup ({:?})",
                state.step
            )));
        }
        let Some(rules) = self.rules.investigation() else {
            return Err(DomainError::precondition(format!(
                "{} cannot be investigated",
                self.rules.kind()
            )));
        };

        let difficulty = command.base_difficulty.saturating_add(rules.difficulty_offset);
        let faces = self.rules.face_rules();
        let pool = faces.pool(effective_pool_size(
            command.attribute_score,
            command.pool_size_modifier,
        ));
        let outcome = resolve(&pool, faces, rng);
        let insight = if outcome.is_fumble() {
            InsightTier::Nothing
        } else {
            InsightTier::read(outcome.net_successes(), difficulty, rules.tier_spread)
        };
        let difficulty_relief = if insight == InsightTier::Mastery {
            rules.insight_relief
        } else {
            0
        };

        state.record(
            ProcedureEventKind::Investigated(ProcedureInvestigated {
                procedure_id: state.id,
                roll_outcome: outcome,
                difficulty,
                insight,
                difficulty_relief,
            }),
            command.correlation_id,
            clock,
        );

        info!(difficulty, ?insight, difficulty_relief, "procedure investigated");
        Ok(insight)
    }

    /// Difficulty the next attempt described by `context` would face.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the approach is not offered.
    pub fn effective_difficulty(
        &self,
        state: &ProcedureState,
        context: &ChallengeContext,
    ) -> Result<i32, DomainError> {
        let adjustment = self.rules.approach(context.approach.as_ref())?;
        Ok(self.difficulty_with(state, context, adjustment))
    }

    /// Rolls one attempt and applies its outcome.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the procedure is not `Active`,
    /// the attempt number does not follow the attempts made, the attempt
    /// limit is spent or the approach is not offered. Errors from the
    /// complication table propagate unchanged.
    #[instrument(
        skip_all,
        fields(
            command = command.command_type(),
            correlation_id = %command.correlation_id,
            kind = %self.rules.kind(),
            procedure_id = %state.id,
            attempt = command.context.attempt_number,
        )
    )]
    pub fn attempt(
        &self,
        state: &mut ProcedureState,
        command: &AttemptChallenge,
        rng: &mut dyn DeterministicRng,
        clock: &dyn Clock,
    ) -> Result<AttemptResult, DomainError> {
        self.ensure_runs(state)?;
        state.ensure_active("attempt")?;

        let context = &command.context;
        let expected = state.attempts_made.saturating_add(1);
        if context.attempt_number != expected {
            return Err(DomainError::precondition(format!(
                "attempt number {} does not follow {} attempts made",
                context.attempt_number, state.attempts_made
            )));
        }
        if state
            .max_attempts
            .is_some_and(|max| state.attempts_made >= max)
        {
            return Err(DomainError::precondition(format!(
                "all {} attempts are spent",
                state.attempts_made
            )));
        }

        let adjustment = self.rules.approach(context.approach.as_ref())?;
        let difficulty = self.difficulty_with(state, context, adjustment);
        let successes_required = self.rules.successes_required(difficulty);
        let pool_size = effective_pool_size(
            command.attribute_score,
            context.pool_size_modifier.saturating_add(adjustment.pool_shift),
        );
        let faces = self.rules.face_rules();
        let outcome = resolve_with_mode(&faces.pool(pool_size), faces, context.roll_mode, rng);
        let category = classify(&outcome, successes_required, self.rules.thresholds());

        debug!(
            difficulty,
            successes_required,
            pool = pool_size,
            net = outcome.net_successes(),
            %category,
            "attempt rolled"
        );

        let transition = self.transition(state, &outcome, category, successes_required, rng)?;

        let narrative = self.narrative.describe(&NarrativeRequest {
            kind: self.rules.kind(),
            category,
            complication: transition.complication.as_ref().map(|rolled| &rolled.effect),
            status: transition.status,
        });

        let result = AttemptResult {
            attempt_number: context.attempt_number,
            is_fumble: outcome.is_fumble(),
            roll_outcome: outcome,
            category,
            difficulty_used: difficulty,
            successes_required,
            pool_size,
            resistance_delta: transition.resistance_delta,
            escalation_delta: transition.escalation_after - state.escalation_accrued,
            learning_delta: transition.learning_after - state.learning_accrued,
            complication: transition.complication,
            status_after: transition.status,
            narrative,
        };

        state.record(
            ProcedureEventKind::AttemptResolved(Box::new(AttemptResolved {
                procedure_id: state.id,
                result: result.clone(),
                escalation_after: transition.escalation_after,
                learning_after: transition.learning_after,
                resistance_after: transition.resistance_after,
            })),
            command.correlation_id,
            clock,
        );

        if let Some(reason) = transition.auto_stall {
            warn!(escalation = transition.escalation_after, "procedure stalled");
            state.record(
                ProcedureEventKind::Stalled(ProcedureStalled {
                    procedure_id: state.id,
                    reason,
                    resume_condition: None,
                    automatic: true,
                }),
                command.correlation_id,
                clock,
            );
        }

        info!(
            %category,
            status = %result.status_after,
            difficulty,
            escalation = state.escalation_accrued,
            resistance = ?state.resistance_remaining,
            "attempt resolved"
        );
        Ok(result)
    }

    /// Parks an active procedure until [`ProcedureEngine::resume`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the procedure is `Active`.
    #[instrument(
        skip_all,
        fields(
            command = command.command_type(),
            correlation_id = %command.correlation_id,
            kind = %self.rules.kind(),
            procedure_id = %state.id,
        )
    )]
    pub fn stall(
        &self,
        state: &mut ProcedureState,
        command: &StallProcedure,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_runs(state)?;
        state.ensure_active("stall")?;

        state.record(
            ProcedureEventKind::Stalled(ProcedureStalled {
                procedure_id: state.id,
                reason: command.reason.clone(),
                resume_condition: command.resume_condition.clone(),
                automatic: false,
            }),
            command.correlation_id,
            clock,
        );

        warn!(reason = %command.reason, "procedure stalled");
        Ok(())
    }

    /// Returns a stalled procedure to `Active`, lowering escalation by the
    /// requested or configured amount but never below the resume floor.
    /// Returns the escalation left afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the procedure is `Stalled`.
    #[instrument(
        skip_all,
        fields(
            command = command.command_type(),
            correlation_id = %command.correlation_id,
            kind = %self.rules.kind(),
            procedure_id = %state.id,
        )
    )]
    pub fn resume(
        &self,
        state: &mut ProcedureState,
        command: &ResumeProcedure,
        clock: &dyn Clock,
    ) -> Result<u32, DomainError> {
        self.ensure_runs(state)?;
        if state.status != ProcedureStatus::Stalled {
            return Err(DomainError::precondition(format!(
                "cannot resume: procedure is {}, not Stalled",
                state.status
            )));
        }

        let stall = self.rules.stall();
        let reduction = command
            .reduction
            .or_else(|| stall.map(|rules| rules.resume_reduction))
            .unwrap_or(StallRules::DEFAULT_RESUME_REDUCTION);
        let floor = stall.map_or(0, |rules| rules.resume_floor);
        let current = state.escalation_accrued;
        let escalation_after = if current <= floor {
            current
        } else {
            current.saturating_sub(reduction).max(floor)
        };

        state.record(
            ProcedureEventKind::Resumed(ProcedureResumed {
                procedure_id: state.id,
                escalation_reduced: current - escalation_after,
                escalation_after,
            }),
            command.correlation_id,
            clock,
        );

        info!(escalation = escalation_after, "procedure resumed");
        Ok(escalation_after)
    }

    /// Abandons a procedure that has not already ended.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the procedure is `Succeeded`,
    /// `Failed` or `Aborted`.
    #[instrument(
        skip_all,
        fields(
            command = command.command_type(),
            correlation_id = %command.correlation_id,
            kind = %self.rules.kind(),
            procedure_id = %state.id,
        )
    )]
    pub fn abort(
        &self,
        state: &mut ProcedureState,
        command: &AbortProcedure,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_runs(state)?;
        if state.status.is_absorbing() {
            return Err(DomainError::precondition(format!(
                "cannot abort: procedure is {}",
                state.status
            )));
        }

        state.record(
            ProcedureEventKind::Aborted(ProcedureAborted {
                procedure_id: state.id,
                reason: command.reason.clone(),
            }),
            command.correlation_id,
            clock,
        );

        info!(reason = %command.reason, "procedure aborted");
        Ok(())
    }

    /// Read-only view of `state`.
    #[must_use]
    pub fn snapshot(&self, state: &ProcedureState) -> ProcedureView {
        query_handlers::snapshot(state)
    }

    fn ensure_runs(&self, state: &ProcedureState) -> Result<(), DomainError> {
        if state.version == 0 {
            return Err(DomainError::precondition(format!(
                "procedure {} has not begun",
                state.id
            )));
        }
        if state.kind != self.rules.kind() {
            return Err(DomainError::precondition(format!(
                "procedure {} runs under {}, not {}",
                state.id,
                state.kind,
                self.rules.kind()
            )));
        }
        Ok(())
    }

    fn difficulty_with(
        &self,
        state: &ProcedureState,
        context: &ChallengeContext,
        adjustment: ApproachAdjustment,
    ) -> i32 {
        let raw = context
            .base_difficulty
            .saturating_add(context.difficulty_modifier)
            .saturating_add(adjustment.difficulty_shift)
            .saturating_add(to_i32(state.escalation_accrued))
            .saturating_sub(to_i32(state.learning_accrued))
            .saturating_sub(to_i32(state.insight_relief));
        self.rules
            .difficulty_rules()
            .floor
            .map_or(raw, |floor| raw.max(floor))
    }

    /// Applies, in order: fumble policy, the category's rule, the
    /// complication table, the escalation cap, the attempt limit and the
    /// stall threshold.
    fn transition(
        &self,
        state: &ProcedureState,
        outcome: &RollOutcome,
        category: OutcomeCategory,
        successes_required: i32,
        rng: &mut dyn DeterministicRng,
    ) -> Result<Transition, DomainError> {
        let difficulty = self.rules.difficulty_rules();
        let mut status = ProcedureStatus::Active;
        let mut escalation_step = 0;
        let mut learning_step = 0;
        let mut depleted = 0;
        let mut consult_complications = false;

        match category {
            OutcomeCategory::Fumble => match self.rules.fumble_policy() {
                FumblePolicy::Catastrophic => {
                    warn!("catastrophic fumble");
                    status = ProcedureStatus::Failed;
                }
                FumblePolicy::Penalty { escalation } => {
                    warn!(penalty = escalation, "fumble");
                    escalation_step = difficulty.escalation_per_failure.saturating_add(escalation);
                    learning_step = difficulty.learning_per_failure;
                    consult_complications = true;
                }
            },
            OutcomeCategory::Failure => {
                escalation_step = difficulty.escalation_per_failure;
                learning_step = difficulty.learning_per_failure;
                consult_complications = true;
            }
            OutcomeCategory::PartialSuccess => {}
            OutcomeCategory::Success | OutcomeCategory::CriticalSuccess => {
                match (self.rules.resistance(), state.resistance_remaining) {
                    (Some(rules), Some(remaining)) => {
                        let margin = outcome.net_successes().saturating_sub(successes_required);
                        depleted = rules.progress_for(margin).min(remaining);
                        if remaining == depleted {
                            status = ProcedureStatus::Succeeded;
                        }
                    }
                    _ => status = ProcedureStatus::Succeeded,
                }
            }
        }

        let complication = match self.rules.complications() {
            Some(table) if consult_complications => {
                let rolled = table.roll(rng)?;
                match rolled.effect.impact() {
                    ComplicationImpact::ForcesFailure => {
                        warn!(effect = rolled.effect.tag(), "complication ends the procedure");
                        status = ProcedureStatus::Failed;
                    }
                    ComplicationImpact::ForcesSuccess => {
                        status = ProcedureStatus::Succeeded;
                    }
                    ComplicationImpact::None => {}
                }
                Some(rolled)
            }
            _ => None,
        };

        let uncapped = state.escalation_accrued.saturating_add(escalation_step);
        let escalation_after = difficulty
            .escalation_cap
            .map_or(uncapped, |cap| uncapped.min(cap))
            .max(state.escalation_accrued);
        let escalated = escalation_after > state.escalation_accrued;
        let learning_after = state.learning_accrued.saturating_add(learning_step);
        let resistance_after = state
            .resistance_remaining
            .map(|remaining| remaining - depleted);

        if status == ProcedureStatus::Active && escalated {
            if let (Some(cap), Some(threshold)) = (
                difficulty.escalation_cap,
                difficulty.collapse_below_progress_percent,
            ) {
                let progress = depletion_percent(state.starting_resistance, resistance_after);
                if escalation_after >= cap && progress.is_some_and(|progress| progress < threshold)
                {
                    warn!(?progress, threshold, "escalation peaked before enough progress");
                    status = ProcedureStatus::Failed;
                }
            }
        }

        let attempts_after = state.attempts_made.saturating_add(1);
        if status == ProcedureStatus::Active
            && state.max_attempts.is_some_and(|max| attempts_after >= max)
        {
            info!(attempts = attempts_after, "attempt limit reached");
            status = ProcedureStatus::Failed;
        }

        let mut auto_stall = None;
        if let Some(stall) = self.rules.stall() {
            if status == ProcedureStatus::Active
                && escalated
                && escalation_after >= stall.escalation_threshold
            {
                status = ProcedureStatus::Stalled;
                auto_stall = Some(format!("escalation reached {escalation_after}"));
            }
        }

        Ok(Transition {
            status,
            escalation_after,
            learning_after,
            resistance_after,
            resistance_delta: -to_i32(depleted),
            complication,
            auto_stall,
        })
    }
}
