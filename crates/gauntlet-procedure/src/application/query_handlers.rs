//! Read-only views of a procedure for rendering and narration.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{AttemptResult, ProcedureState};

/// Read-only view of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptView {
    /// 1-based attempt index.
    pub attempt_number: u32,
    /// Faces rolled.
    pub rolls: Vec<u32>,
    /// Successes counted.
    pub successes: u32,
    /// Botches counted.
    pub botches: u32,
    /// Net successes.
    pub net_successes: i32,
    /// Outcome category as a string.
    pub category: String,
    /// Effective difficulty of the attempt.
    pub difficulty: i32,
    /// Successes the roll needed.
    pub successes_required: i32,
    /// Change in remaining resistance.
    pub resistance_delta: i32,
    /// Escalation added.
    pub escalation_delta: u32,
    /// Complication effect tag, if one was rolled.
    pub complication: Option<String>,
    /// Status after the attempt as a string.
    pub status_after: String,
    /// Flavor text, if any.
    pub narrative: Option<String>,
}

impl From<&AttemptResult> for AttemptView {
    fn from(result: &AttemptResult) -> Self {
        Self {
            attempt_number: result.attempt_number,
            rolls: result.roll_outcome.rolls().to_vec(),
            successes: result.roll_outcome.success_count(),
            botches: result.roll_outcome.botch_count(),
            net_successes: result.roll_outcome.net_successes(),
            category: result.category.to_string(),
            difficulty: result.difficulty_used,
            successes_required: result.successes_required,
            resistance_delta: result.resistance_delta,
            escalation_delta: result.escalation_delta,
            complication: result
                .complication
                .as_ref()
                .map(|rolled| rolled.effect.tag().to_owned()),
            status_after: result.status_after.to_string(),
            narrative: result.narrative.clone(),
        }
    }
}

/// Read-only view of a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureView {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// Challenge kind.
    pub kind: String,
    /// Resistance tier as a string.
    pub tier: String,
    /// Current step as a string.
    pub step: String,
    /// Current status as a string.
    pub status: String,
    /// Attempts made so far.
    pub attempts_made: u32,
    /// Attempt limit, if any.
    pub max_attempts: Option<u32>,
    /// Resistance still to deplete.
    pub resistance_remaining: Option<u32>,
    /// Share of resistance depleted, in whole percent.
    pub progress_percent: Option<u32>,
    /// Difficulty added by failures so far.
    pub escalation_accrued: u32,
    /// Difficulty removed by learning so far.
    pub learning_accrued: u32,
    /// Investigation result as a string, if one was made.
    pub insight: Option<String>,
    /// Why the procedure is parked, while it is.
    pub stall_reason: Option<String>,
    /// What has to happen before it may resume.
    pub resume_condition: Option<String>,
    /// Every attempt, oldest first.
    pub history: Vec<AttemptView>,
    /// Current version (event count).
    pub version: i64,
}

/// Builds a [`ProcedureView`] of `state`.
#[must_use]
pub fn snapshot(state: &ProcedureState) -> ProcedureView {
    let stall = state.stall_note();
    ProcedureView {
        procedure_id: state.id,
        kind: state.kind().to_owned(),
        tier: state.tier().to_string(),
        step: format!("{:?}", state.step()),
        status: state.status().to_string(),
        attempts_made: state.attempts_made(),
        max_attempts: state.max_attempts(),
        resistance_remaining: state.resistance_remaining(),
        progress_percent: state.progress_percent(),
        escalation_accrued: state.escalation_accrued(),
        learning_accrued: state.learning_accrued(),
        insight: state.insight().map(|tier| format!("{tier:?}")),
        stall_reason: stall.map(|note| note.reason.clone()),
        resume_condition: stall.and_then(|note| note.resume_condition.clone()),
        history: state.history().iter().map(AttemptView::from).collect(),
        version: state.version,
    }
}
