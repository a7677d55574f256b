//! Caller requests.

use uuid::Uuid;

/// A request to change an aggregate.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted type name, e.g. `procedure.attempt`. Recorded on engine spans.
    fn command_type(&self) -> &'static str;

    /// Id copied onto every event the command produces.
    fn correlation_id(&self) -> Uuid;
}
