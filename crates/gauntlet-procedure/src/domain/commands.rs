//! Commands for the Procedure context.

use gauntlet_core::command::Command;
use uuid::Uuid;

use super::config::ResistanceTier;
use super::context::ChallengeContext;

/// Command to set up a new procedure.
#[derive(Debug, Clone)]
pub struct BeginProcedure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier for the new procedure.
    pub procedure_id: Uuid,
    /// Assessed resistance tier.
    pub tier: ResistanceTier,
    /// Overrides the configured starting resistance.
    pub resistance: Option<u32>,
}

impl Command for BeginProcedure {
    fn command_type(&self) -> &'static str {
        "procedure.begin"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to study the obstacle before the first attempt.
#[derive(Debug, Clone)]
pub struct Investigate {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Difficulty of the challenge being studied.
    pub base_difficulty: i32,
    /// Actor's relevant attribute.
    pub attribute_score: i32,
    /// Bonus or penalty dice.
    pub pool_size_modifier: i32,
}

impl Command for Investigate {
    fn command_type(&self) -> &'static str {
        "procedure.investigate"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to make one attempt.
#[derive(Debug, Clone)]
pub struct AttemptChallenge {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Difficulty, modifiers and approach for this attempt.
    pub context: ChallengeContext,
    /// Actor's relevant attribute; the base pool size.
    pub attribute_score: i32,
}

impl Command for AttemptChallenge {
    fn command_type(&self) -> &'static str {
        "procedure.attempt"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to park an active procedure.
#[derive(Debug, Clone)]
pub struct StallProcedure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Why the procedure is parked.
    pub reason: String,
    /// What has to happen before it may resume.
    pub resume_condition: Option<String>,
}

impl Command for StallProcedure {
    fn command_type(&self) -> &'static str {
        "procedure.stall"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to pick a stalled procedure back up.
#[derive(Debug, Clone)]
pub struct ResumeProcedure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Escalation to remove; the configured amount when `None`.
    pub reduction: Option<u32>,
}

impl Command for ResumeProcedure {
    fn command_type(&self) -> &'static str {
        "procedure.resume"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to abandon a procedure.
#[derive(Debug, Clone)]
pub struct AbortProcedure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Why it was abandoned.
    pub reason: String,
}

impl Command for AbortProcedure {
    fn command_type(&self) -> &'static str {
        "procedure.abort"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
