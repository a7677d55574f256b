//! Gauntlet Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the rules
//! and procedure contexts depend on. It contains no game content and no
//! storage code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod rng;
