//! Domain layer for the Procedure context.

pub mod aggregates;
pub mod commands;
pub mod config;
pub mod context;
pub mod events;
pub mod narrative;
pub mod presets;
