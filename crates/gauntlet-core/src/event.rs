//! Recorded facts and their envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope carried by every recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Time-ordered event id.
    pub event_id: Uuid,
    /// Dotted type name, e.g. `procedure.attempt_resolved`.
    pub event_type: String,
    /// Aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// Position in the aggregate's stream, starting at 1.
    pub sequence_number: i64,
    /// Id shared by everything one caller request produced.
    pub correlation_id: Uuid,
    /// Command that produced the event.
    pub causation_id: Uuid,
    /// Clock reading when the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Envelope for an event produced directly by a command, so the
    /// causation id equals the correlation id.
    #[must_use]
    pub fn caused_by(
        event_type: &str,
        aggregate_id: Uuid,
        sequence_number: i64,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.to_owned(),
            aggregate_id,
            sequence_number,
            correlation_id,
            causation_id: correlation_id,
            occurred_at,
        }
    }
}

/// An event an aggregate can apply and a caller can audit.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Dotted type name matching `metadata().event_type`.
    fn event_type(&self) -> &'static str;

    /// JSON body of the event without its envelope.
    fn to_payload(&self) -> serde_json::Value;

    /// The event's envelope.
    fn metadata(&self) -> &EventMetadata;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_caused_by_links_causation_to_correlation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        let metadata =
            EventMetadata::caused_by("procedure.began", aggregate_id, 1, correlation_id, at);

        assert_eq!(metadata.event_type, "procedure.began");
        assert_eq!(metadata.aggregate_id, aggregate_id);
        assert_eq!(metadata.sequence_number, 1);
        assert_eq!(metadata.causation_id, correlation_id);
        assert_eq!(metadata.occurred_at, at);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let first = EventMetadata::caused_by("x", Uuid::nil(), 1, Uuid::nil(), at);
        let second = EventMetadata::caused_by("x", Uuid::nil(), 2, Uuid::nil(), at);

        assert_ne!(first.event_id, second.event_id);
    }
}
