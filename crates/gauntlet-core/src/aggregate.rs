//! Event-sourced aggregates.

use uuid::Uuid;

use crate::event::DomainEvent;

/// State that changes only by applying its own events.
///
/// Operations validate first, then record events; `apply` never fails.
pub trait AggregateRoot: Send + Sync {
    /// Events this aggregate records and replays.
    type Event: DomainEvent;

    /// Id shared by every event in the stream.
    fn aggregate_id(&self) -> Uuid;

    /// Number of events applied so far.
    fn version(&self) -> i64;

    /// Folds one event into the state.
    fn apply(&mut self, event: &Self::Event);

    /// Events recorded since the last clear, oldest first.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Drops recorded events once the caller has consumed them.
    fn clear_uncommitted_events(&mut self);

    /// Sequence number the next recorded event takes.
    fn next_sequence_number(&self) -> i64 {
        self.version() + 1
    }
}
