//! Gauntlet — Rules & Resolution bounded context.
//!
//! Responsible for rolling dice pools, reading faces as successes and
//! botches, grading outcomes against a difficulty, and dispatching
//! complication tables. Everything here is pure given an injected RNG.

pub mod application;
pub mod domain;
