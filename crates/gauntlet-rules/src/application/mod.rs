//! Application layer for the Rules & Resolution context.

pub mod checks;
