//! Application layer for the Procedure context.

pub mod engine;
pub mod query_handlers;
