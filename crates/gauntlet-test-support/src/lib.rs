//! Shared test doubles and utilities for the Gauntlet challenge engine.

mod clock;
mod rng;
mod tracing;

pub use clock::{FixedClock, fixed_clock};
pub use rng::{MockRng, SequenceRng};
pub use tracing::init_tracing;
