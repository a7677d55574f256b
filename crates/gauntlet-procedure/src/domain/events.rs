//! Domain events for the Procedure context.

use gauntlet_core::event::{DomainEvent, EventMetadata};
use gauntlet_rules::domain::outcome::RollOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregates::{AttemptResult, InsightTier};
use super::config::ResistanceTier;

/// Emitted when a procedure is set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureBegan {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// Challenge kind the procedure runs under.
    pub kind: String,
    /// Assessed resistance tier.
    pub tier: ResistanceTier,
    /// Resistance to deplete, for depleting challenges.
    pub starting_resistance: Option<u32>,
    /// Attempt limit, if any.
    pub max_attempts: Option<u32>,
}

/// Emitted when the obstacle has been studied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureInvestigated {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// The investigation roll.
    pub roll_outcome: RollOutcome,
    /// Difficulty the roll was read against.
    pub difficulty: i32,
    /// What the actor learned.
    pub insight: InsightTier,
    /// Difficulty removed from every later attempt.
    pub difficulty_relief: u32,
}

/// Emitted once per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResolved {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// Everything the attempt produced.
    pub result: AttemptResult,
    /// Accrued escalation after the attempt.
    pub escalation_after: u32,
    /// Accrued learning after the attempt.
    pub learning_after: u32,
    /// Remaining resistance after the attempt.
    pub resistance_after: Option<u32>,
}

/// Emitted when a procedure is parked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureStalled {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// Why it stalled.
    pub reason: String,
    /// What has to happen before it may resume.
    pub resume_condition: Option<String>,
    /// Whether the rules stalled it rather than the caller.
    pub automatic: bool,
}

/// Emitted when a stalled procedure picks up again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureResumed {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// Escalation actually removed.
    pub escalation_reduced: u32,
    /// Accrued escalation after the resume.
    pub escalation_after: u32,
}

/// Emitted when the caller abandons a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureAborted {
    /// The procedure identifier.
    pub procedure_id: Uuid,
    /// Why it was abandoned.
    pub reason: String,
}

/// Event payload variants for the Procedure context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcedureEventKind {
    /// The procedure was set up.
    Began(ProcedureBegan),
    /// The obstacle was studied.
    Investigated(ProcedureInvestigated),
    /// An attempt was rolled and applied.
    AttemptResolved(Box<AttemptResolved>),
    /// The procedure was parked.
    Stalled(ProcedureStalled),
    /// The procedure picked up again.
    Resumed(ProcedureResumed),
    /// The procedure was abandoned.
    Aborted(ProcedureAborted),
}

/// Domain event envelope for the Procedure context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProcedureEventKind,
}

impl ProcedureEventKind {
    /// Stable type name for routing.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Began(_) => "procedure.began",
            Self::Investigated(_) => "procedure.investigated",
            Self::AttemptResolved(_) => "procedure.attempt_resolved",
            Self::Stalled(_) => "procedure.stalled",
            Self::Resumed(_) => "procedure.resumed",
            Self::Aborted(_) => "procedure.aborted",
        }
    }
}

impl DomainEvent for ProcedureEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ProcedureEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_core::clock::Clock;
    use gauntlet_test_support::fixed_clock;

    fn aborted_event() -> ProcedureEvent {
        let procedure_id = Uuid::new_v4();
        ProcedureEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: "procedure.aborted".to_owned(),
                aggregate_id: procedure_id,
                sequence_number: 3,
                correlation_id: Uuid::new_v4(),
                causation_id: Uuid::new_v4(),
                occurred_at: fixed_clock().now(),
            },
            kind: ProcedureEventKind::Aborted(ProcedureAborted {
                procedure_id,
                reason: "walked away".to_owned(),
            }),
        }
    }

    #[test]
    fn test_event_type_matches_kind() {
        let event = aborted_event();
        assert_eq!(event.event_type(), "procedure.aborted");
        assert_eq!(event.event_type(), event.metadata().event_type);
    }

    #[test]
    fn test_payload_round_trips_through_json() {
        let event = aborted_event();

        let payload = event.to_payload();
        let kind: ProcedureEventKind = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(kind, event.kind);
        assert_eq!(payload["Aborted"]["reason"], "walked away");
    }
}
