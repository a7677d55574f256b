//! Aggregate roots for the Procedure context.

use std::fmt;

use gauntlet_core::aggregate::AggregateRoot;
use gauntlet_core::clock::Clock;
use gauntlet_core::error::DomainError;
use gauntlet_core::event::EventMetadata;
use gauntlet_rules::domain::classifier::OutcomeCategory;
use gauntlet_rules::domain::complication::ComplicationRoll;
use gauntlet_rules::domain::outcome::RollOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::ResistanceTier;
use super::events::{ProcedureEvent, ProcedureEventKind};

/// Where in the challenge the procedure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureStep {
    /// Set up, nothing tried yet.
    Setup,
    /// The obstacle has been studied.
    Investigate,
    /// At least one attempt made and more allowed.
    Attempt,
    /// No attempt can be made until something changes.
    Terminal,
}

/// Lifecycle status of a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureStatus {
    /// Attempts may be made.
    Active,
    /// The challenge was overcome.
    Succeeded,
    /// The challenge beat the actor.
    Failed,
    /// Parked until resumed.
    Stalled,
    /// Abandoned by the caller.
    Aborted,
}

impl ProcedureStatus {
    /// Succeeded, Failed and Aborted admit no further transition.
    #[must_use]
    pub const fn is_absorbing(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for ProcedureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Stalled => "Stalled",
            Self::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

/// How much an investigation revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTier {
    /// Nothing useful.
    Nothing,
    /// A rough idea.
    Glimpse,
    /// A working understanding.
    Understanding,
    /// Full understanding; later attempts get easier.
    Mastery,
}

impl InsightTier {
    /// Reads `net_successes` against bands `spread` wide around
    /// `difficulty`.
    #[must_use]
    pub const fn read(net_successes: i32, difficulty: i32, spread: i32) -> Self {
        if net_successes >= difficulty.saturating_add(spread) {
            Self::Mastery
        } else if net_successes >= difficulty {
            Self::Understanding
        } else if net_successes >= difficulty.saturating_sub(spread) {
            Self::Glimpse
        } else {
            Self::Nothing
        }
    }
}

/// Share of `starting` resistance already removed, rounded down. `None`
/// when the procedure does not deplete.
pub(crate) fn depletion_percent(starting: Option<u32>, remaining: Option<u32>) -> Option<u32> {
    let starting = starting.filter(|starting| *starting > 0)?;
    let depleted = u64::from(starting.saturating_sub(remaining?));
    u32::try_from(depleted * 100 / u64::from(starting)).ok()
}

/// Everything one attempt produced. Appended to the procedure's history
/// and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// 1-based attempt index.
    pub attempt_number: u32,
    /// The kept roll.
    pub roll_outcome: RollOutcome,
    /// How the roll graded.
    pub category: OutcomeCategory,
    /// Effective difficulty of the attempt.
    pub difficulty_used: i32,
    /// Successes the roll needed.
    pub successes_required: i32,
    /// Dice rolled.
    pub pool_size: u32,
    /// Change in remaining resistance; zero or negative.
    pub resistance_delta: i32,
    /// Escalation added by the attempt.
    pub escalation_delta: u32,
    /// Learning added by the attempt.
    pub learning_delta: u32,
    /// Complication rolled, if any.
    pub complication: Option<ComplicationRoll>,
    /// Whether the roll was a fumble.
    pub is_fumble: bool,
    /// Procedure status once the attempt was applied.
    pub status_after: ProcedureStatus,
    /// Flavor text from the narrative source, if it had any.
    pub narrative: Option<String>,
}

/// Why a procedure is parked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallNote {
    /// Why it stalled.
    pub reason: String,
    /// What has to happen before it may resume.
    pub resume_condition: Option<String>,
    /// Whether the rules stalled it rather than the caller.
    pub automatic: bool,
}

/// The aggregate root for one challenge instance.
///
/// Owned by the caller for the lifetime of the challenge; the engine
/// borrows it per call and keeps nothing between calls.
#[derive(Debug)]
pub struct ProcedureState {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) kind: String,
    pub(crate) tier: ResistanceTier,
    pub(crate) step: ProcedureStep,
    pub(crate) status: ProcedureStatus,
    pub(crate) attempts_made: u32,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) starting_resistance: Option<u32>,
    pub(crate) resistance_remaining: Option<u32>,
    pub(crate) escalation_accrued: u32,
    pub(crate) learning_accrued: u32,
    pub(crate) insight: Option<InsightTier>,
    pub(crate) insight_relief: u32,
    pub(crate) history: Vec<AttemptResult>,
    pub(crate) stall_note: Option<StallNote>,
    pub(crate) abort_reason: Option<String>,
    /// Events recorded since the last clear.
    uncommitted_events: Vec<ProcedureEvent>,
}

impl ProcedureState {
    /// Creates an empty procedure; `begin` fills it in.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            kind: String::new(),
            tier: ResistanceTier::Moderate,
            step: ProcedureStep::Setup,
            status: ProcedureStatus::Active,
            attempts_made: 0,
            max_attempts: None,
            starting_resistance: None,
            resistance_remaining: None,
            escalation_accrued: 0,
            learning_accrued: 0,
            insight: None,
            insight_relief: 0,
            history: Vec::new(),
            stall_note: None,
            abort_reason: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Rebuilds a procedure from its recorded events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if an event belongs to another
    /// procedure or the stream does not start with `Began`.
    pub fn reconstitute(id: Uuid, events: &[ProcedureEvent]) -> Result<Self, DomainError> {
        let mut state = Self::new(id);
        for (index, event) in events.iter().enumerate() {
            if event.metadata.aggregate_id != id {
                return Err(DomainError::precondition(format!(
                    "event {} belongs to procedure {}, not {id}",
                    event.metadata.event_id, event.metadata.aggregate_id
                )));
            }
            if (index == 0) != matches!(event.kind, ProcedureEventKind::Began(_)) {
                return Err(DomainError::precondition(
                    "a procedure stream starts with exactly one Began event",
                ));
            }
            state.apply(event);
        }
        Ok(state)
    }

    /// Challenge kind the procedure runs under.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Assessed resistance tier.
    #[must_use]
    pub const fn tier(&self) -> ResistanceTier {
        self.tier
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> ProcedureStep {
        self.step
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ProcedureStatus {
        self.status
    }

    /// Attempts made so far.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Attempt limit, if any.
    #[must_use]
    pub const fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Resistance the procedure started with, for depleting challenges.
    #[must_use]
    pub const fn starting_resistance(&self) -> Option<u32> {
        self.starting_resistance
    }

    /// Resistance still to deplete, for depleting challenges.
    #[must_use]
    pub const fn resistance_remaining(&self) -> Option<u32> {
        self.resistance_remaining
    }

    /// Difficulty added by failures and fumbles so far.
    #[must_use]
    pub const fn escalation_accrued(&self) -> u32 {
        self.escalation_accrued
    }

    /// Difficulty removed by learning so far.
    #[must_use]
    pub const fn learning_accrued(&self) -> u32 {
        self.learning_accrued
    }

    /// What the investigation revealed, if one was made.
    #[must_use]
    pub const fn insight(&self) -> Option<InsightTier> {
        self.insight
    }

    /// Difficulty relief earned by investigating.
    #[must_use]
    pub const fn insight_relief(&self) -> u32 {
        self.insight_relief
    }

    /// Every attempt so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[AttemptResult] {
        &self.history
    }

    /// Why the procedure is parked, while it is.
    #[must_use]
    pub const fn stall_note(&self) -> Option<&StallNote> {
        self.stall_note.as_ref()
    }

    /// Why the procedure was abandoned, if it was.
    #[must_use]
    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    /// Share of starting resistance already depleted, in whole percent.
    #[must_use]
    pub fn progress_percent(&self) -> Option<u32> {
        depletion_percent(self.starting_resistance, self.resistance_remaining)
    }

    /// Errors unless the procedure is `Active`.
    pub(crate) fn ensure_active(&self, action: &str) -> Result<(), DomainError> {
        match self.status {
            ProcedureStatus::Active => Ok(()),
            ProcedureStatus::Stalled => Err(DomainError::precondition(format!(
                "cannot {action}: procedure is Stalled and must be resumed first"
            ))),
            status => Err(DomainError::precondition(format!(
                "cannot {action}: procedure is {status}"
            ))),
        }
    }

    /// Applies `kind` and keeps the event for the caller.
    pub(crate) fn record(
        &mut self,
        kind: ProcedureEventKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let event = ProcedureEvent {
            metadata: EventMetadata::caused_by(
                kind.event_type(),
                self.id,
                self.next_sequence_number(),
                correlation_id,
                clock.now(),
            ),
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }
}

impl AggregateRoot for ProcedureState {
    type Event = ProcedureEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            ProcedureEventKind::Began(payload) => {
                self.kind.clone_from(&payload.kind);
                self.tier = payload.tier;
                self.starting_resistance = payload.starting_resistance;
                self.resistance_remaining = payload.starting_resistance;
                self.max_attempts = payload.max_attempts;
                self.step = ProcedureStep::Setup;
                self.status = ProcedureStatus::Active;
            }
            ProcedureEventKind::Investigated(payload) => {
                self.insight = Some(payload.insight);
                self.insight_relief = payload.difficulty_relief;
                self.step = ProcedureStep::Investigate;
            }
            ProcedureEventKind::AttemptResolved(payload) => {
                self.attempts_made = payload.result.attempt_number;
                self.escalation_accrued = payload.escalation_after;
                self.learning_accrued = payload.learning_after;
                self.resistance_remaining = payload.resistance_after;
                self.status = payload.result.status_after;
                self.step = if self.status == ProcedureStatus::Active {
                    ProcedureStep::Attempt
                } else {
                    ProcedureStep::Terminal
                };
                self.history.push(payload.result.clone());
            }
            ProcedureEventKind::Stalled(payload) => {
                self.status = ProcedureStatus::Stalled;
                self.step = ProcedureStep::Terminal;
                self.stall_note = Some(StallNote {
                    reason: payload.reason.clone(),
                    resume_condition: payload.resume_condition.clone(),
                    automatic: payload.automatic,
                });
            }
            ProcedureEventKind::Resumed(payload) => {
                self.status = ProcedureStatus::Active;
                self.step = ProcedureStep::Attempt;
                self.escalation_accrued = payload.escalation_after;
                self.stall_note = None;
            }
            ProcedureEventKind::Aborted(payload) => {
                self.status = ProcedureStatus::Aborted;
                self.step = ProcedureStep::Terminal;
                self.abort_reason = Some(payload.reason.clone());
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{ProcedureAborted, ProcedureBegan, ProcedureStalled};
    use gauntlet_core::event::DomainEvent;
    use gauntlet_test_support::fixed_clock;

    fn began(state: &mut ProcedureState, resistance: Option<u32>) {
        let kind = ProcedureEventKind::Began(ProcedureBegan {
            procedure_id: state.id,
            kind: "extended_influence".to_owned(),
            tier: ResistanceTier::Low,
            starting_resistance: resistance,
            max_attempts: Some(4),
        });
        state.record(kind, Uuid::new_v4(), &fixed_clock());
    }

    #[test]
    fn test_record_applies_and_keeps_event() {
        let mut state = ProcedureState::new(Uuid::new_v4());

        began(&mut state, Some(10));

        assert_eq!(state.version(), 1);
        assert_eq!(state.kind(), "extended_influence");
        assert_eq!(state.tier(), ResistanceTier::Low);
        assert_eq!(state.resistance_remaining(), Some(10));
        assert_eq!(state.max_attempts(), Some(4));
        let events = state.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "procedure.began");
        assert_eq!(events[0].metadata().sequence_number, 1);
        assert_eq!(events[0].metadata().occurred_at, fixed_clock().0);
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut state = ProcedureState::new(Uuid::new_v4());
        began(&mut state, None);
        let stalled = ProcedureEventKind::Stalled(ProcedureStalled {
            procedure_id: state.id,
            reason: "tempers flared".to_owned(),
            resume_condition: Some("a night's rest".to_owned()),
            automatic: false,
        });
        state.record(stalled, Uuid::new_v4(), &fixed_clock());

        let numbers: Vec<i64> = state
            .uncommitted_events()
            .iter()
            .map(|event| event.metadata().sequence_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(state.status(), ProcedureStatus::Stalled);
        assert_eq!(state.step(), ProcedureStep::Terminal);
        assert_eq!(
            state.stall_note().and_then(|note| note.resume_condition.as_deref()),
            Some("a night's rest")
        );
    }

    #[test]
    fn test_clear_uncommitted_events_keeps_state() {
        let mut state = ProcedureState::new(Uuid::new_v4());
        began(&mut state, Some(5));

        state.clear_uncommitted_events();

        assert!(state.uncommitted_events().is_empty());
        assert_eq!(state.version(), 1);
        assert_eq!(state.resistance_remaining(), Some(5));
    }

    #[test]
    fn test_reconstitute_replays_stream() {
        let id = Uuid::new_v4();
        let mut original = ProcedureState::new(id);
        began(&mut original, Some(5));
        let aborted = ProcedureEventKind::Aborted(ProcedureAborted {
            procedure_id: id,
            reason: "gave up".to_owned(),
        });
        original.record(aborted, Uuid::new_v4(), &fixed_clock());

        let rebuilt = ProcedureState::reconstitute(id, original.uncommitted_events()).unwrap();

        assert_eq!(rebuilt.version(), 2);
        assert_eq!(rebuilt.status(), ProcedureStatus::Aborted);
        assert_eq!(rebuilt.abort_reason(), Some("gave up"));
        assert!(rebuilt.uncommitted_events().is_empty());
    }

    #[test]
    fn test_reconstitute_rejects_foreign_events() {
        let mut other = ProcedureState::new(Uuid::new_v4());
        began(&mut other, None);

        let result = ProcedureState::reconstitute(Uuid::new_v4(), other.uncommitted_events());

        match result.unwrap_err() {
            DomainError::Precondition(msg) => assert!(msg.contains("belongs to procedure")),
            other => panic!("expected Precondition, got {other:?}"),
        }
    }

    #[test]
    fn test_reconstitute_requires_began_first() {
        let id = Uuid::new_v4();
        let mut state = ProcedureState::new(id);
        began(&mut state, None);
        let aborted = ProcedureEventKind::Aborted(ProcedureAborted {
            procedure_id: id,
            reason: "gave up".to_owned(),
        });
        state.record(aborted, Uuid::new_v4(), &fixed_clock());

        let result = ProcedureState::reconstitute(id, &state.uncommitted_events()[1..]);

        assert!(matches!(result, Err(DomainError::Precondition(_))));
    }

    #[test]
    fn test_ensure_active_messages() {
        let mut state = ProcedureState::new(Uuid::new_v4());
        assert!(state.ensure_active("attempt").is_ok());

        state.status = ProcedureStatus::Stalled;
        match state.ensure_active("attempt").unwrap_err() {
            DomainError::Precondition(msg) => assert!(msg.contains("resumed first")),
            other => panic!("expected Precondition, got {other:?}"),
        }

        state.status = ProcedureStatus::Succeeded;
        match state.ensure_active("attempt").unwrap_err() {
            DomainError::Precondition(msg) => {
                assert_eq!(msg, "cannot attempt: procedure is Succeeded");
            }
            other => panic!("expected Precondition, got {other:?}"),
        }
    }

    #[test]
    fn test_progress_percent() {
        let mut state = ProcedureState::new(Uuid::new_v4());
        assert_eq!(state.progress_percent(), None);

        state.starting_resistance = Some(10);
        state.resistance_remaining = Some(7);
        assert_eq!(state.progress_percent(), Some(30));

        state.resistance_remaining = Some(0);
        assert_eq!(state.progress_percent(), Some(100));
    }

    #[test]
    fn test_depletion_percent_rounds_down() {
        assert_eq!(depletion_percent(Some(3), Some(2)), Some(33));
        assert_eq!(depletion_percent(Some(0), Some(0)), None);
        assert_eq!(depletion_percent(Some(5), None), None);
        assert_eq!(depletion_percent(None, Some(5)), None);
    }

    #[test]
    fn test_insight_bands() {
        assert_eq!(InsightTier::read(0, 4, 2), InsightTier::Nothing);
        assert_eq!(InsightTier::read(2, 4, 2), InsightTier::Glimpse);
        assert_eq!(InsightTier::read(4, 4, 2), InsightTier::Understanding);
        assert_eq!(InsightTier::read(6, 4, 2), InsightTier::Mastery);
        assert_eq!(InsightTier::read(0, i32::MAX, 2), InsightTier::Nothing);
        assert_eq!(InsightTier::read(0, i32::MIN, 2), InsightTier::Mastery);
    }

    #[test]
    fn test_absorbing_statuses() {
        assert!(ProcedureStatus::Succeeded.is_absorbing());
        assert!(ProcedureStatus::Failed.is_absorbing());
        assert!(ProcedureStatus::Aborted.is_absorbing());
        assert!(!ProcedureStatus::Active.is_absorbing());
        assert!(!ProcedureStatus::Stalled.is_absorbing());
    }
}
