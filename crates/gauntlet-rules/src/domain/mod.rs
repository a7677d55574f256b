//! Domain layer for the Rules & Resolution context.

pub mod classifier;
pub mod complication;
pub mod dice;
pub mod outcome;
pub mod resolver;
