//! Gauntlet — multi-round challenge procedures.
//!
//! A procedure walks one challenge (a trap, a jammed mechanism, a
//! stubborn witness) from setup through optional investigation into a
//! loop of resisted attempts until it succeeds, fails, stalls or is
//! abandoned. The shape is shared; everything that differs between
//! challenge kinds lives in [`domain::config::ChallengeRules`].

pub mod application;
pub mod domain;
