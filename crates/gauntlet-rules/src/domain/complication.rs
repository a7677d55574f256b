//! Complication tables consulted when an attempt goes wrong.
//!
//! A table maps a secondary die roll to one effect. The engine picks the
//! effect and hands it back; applying damage, alarms or locks is the
//! caller's business.

use gauntlet_core::error::DomainError;
use gauntlet_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dice::DiceExpression;

/// What a complication does to the situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComplicationEffect {
    /// The target locks for good.
    PermanentLock,
    /// Something noticed; raise the alarm.
    AlarmTriggered,
    /// The actor takes damage rolled from `dice`.
    DamageEffect {
        /// Damage roll for the caller to make.
        dice: DiceExpression,
    },
    /// Nothing happens.
    NoEffect,
    /// A secondary function of the target activates.
    PartialFunctionActivated,
    /// The target's own instability completes the job.
    AutoSuccessGlitch,
}

/// How a complication bears on the procedure's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplicationImpact {
    /// The procedure carries on.
    None,
    /// The procedure is over and failed.
    ForcesFailure,
    /// The procedure is over and succeeded.
    ForcesSuccess,
}

impl ComplicationEffect {
    /// Stable snake-case name of the effect.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::PermanentLock => "permanent_lock",
            Self::AlarmTriggered => "alarm_triggered",
            Self::DamageEffect { .. } => "damage_effect",
            Self::NoEffect => "no_effect",
            Self::PartialFunctionActivated => "partial_function_activated",
            Self::AutoSuccessGlitch => "auto_success_glitch",
        }
    }

    /// Whether this effect ends the procedure.
    #[must_use]
    pub const fn impact(&self) -> ComplicationImpact {
        match self {
            Self::PermanentLock => ComplicationImpact::ForcesFailure,
            Self::AutoSuccessGlitch => ComplicationImpact::ForcesSuccess,
            _ => ComplicationImpact::None,
        }
    }
}

/// One contiguous band of rolls on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplicationEntry {
    /// Lowest roll (inclusive) mapped to `effect`.
    pub min_roll: u32,
    /// Highest roll (inclusive) mapped to `effect`.
    pub max_roll: u32,
    /// The effect for this band.
    pub effect: ComplicationEffect,
}

impl ComplicationEntry {
    /// A band covering `min_roll..=max_roll`.
    #[must_use]
    pub const fn new(min_roll: u32, max_roll: u32, effect: ComplicationEffect) -> Self {
        Self {
            min_roll,
            max_roll,
            effect,
        }
    }

    const fn covers(&self, roll: u32) -> bool {
        self.min_roll <= roll && roll <= self.max_roll
    }
}

/// A complication roll and the effect it selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplicationRoll {
    /// The face rolled on the table's die.
    pub roll: u32,
    /// The effect the roll selected.
    pub effect: ComplicationEffect,
}

/// Lookup from a die roll to a complication effect.
///
/// A valid table covers every face of its die exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplicationTable {
    die_faces: u32,
    entries: Vec<ComplicationEntry>,
}

impl ComplicationTable {
    /// Builds and validates a table.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the entries do not
    /// cover `1..=die_faces` exactly once.
    pub fn new(die_faces: u32, entries: Vec<ComplicationEntry>) -> Result<Self, DomainError> {
        let table = Self { die_faces, entries };
        table.validate()?;
        Ok(table)
    }

    /// The d10 table observed for machinery: lock on 1, alarm on 2-3,
    /// 1d6 sparks on 4-5, nothing on 6-7, partial function on 8-9,
    /// glitch in the actor's favour on 10.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            die_faces: 10,
            entries: vec![
                ComplicationEntry::new(1, 1, ComplicationEffect::PermanentLock),
                ComplicationEntry::new(2, 3, ComplicationEffect::AlarmTriggered),
                ComplicationEntry::new(
                    4,
                    5,
                    ComplicationEffect::DamageEffect {
                        dice: DiceExpression::new(1, 6),
                    },
                ),
                ComplicationEntry::new(6, 7, ComplicationEffect::NoEffect),
                ComplicationEntry::new(8, 9, ComplicationEffect::PartialFunctionActivated),
                ComplicationEntry::new(10, 10, ComplicationEffect::AutoSuccessGlitch),
            ],
        }
    }

    /// Faces on the table's die.
    #[must_use]
    pub const fn die_faces(&self) -> u32 {
        self.die_faces
    }

    /// The table's bands in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[ComplicationEntry] {
        &self.entries
    }

    /// Checks that the bands tile `1..=die_faces` with no gap or overlap.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` describing the problem.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.die_faces == 0 {
            return Err(DomainError::configuration(
                "complication die must have at least one face",
            ));
        }
        if self.entries.is_empty() {
            return Err(DomainError::configuration("complication table is empty"));
        }

        let mut bands: Vec<&ComplicationEntry> = self.entries.iter().collect();
        bands.sort_by_key(|entry| entry.min_roll);

        let mut next = 1;
        for band in bands {
            if band.min_roll > band.max_roll {
                return Err(DomainError::configuration(format!(
                    "complication band {}..={} is inverted",
                    band.min_roll, band.max_roll
                )));
            }
            if band.min_roll != next {
                return Err(DomainError::configuration(format!(
                    "complication table expects a band starting at {next}, found {}",
                    band.min_roll
                )));
            }
            next = band.max_roll.checked_add(1).ok_or_else(|| {
                DomainError::configuration(format!(
                    "complication band {}..={} has no upper bound",
                    band.min_roll, band.max_roll
                ))
            })?;
        }
        let covered = next - 1;
        if covered != self.die_faces {
            return Err(DomainError::configuration(format!(
                "complication table covers 1..={covered} but the die has {} faces",
                self.die_faces
            )));
        }
        Ok(())
    }

    /// The effect for `roll`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidComplicationRoll` if `roll` is outside
    /// `1..=die_faces`, and `DomainError::InvalidConfiguration` if no band
    /// covers it.
    pub fn lookup(&self, roll: u32) -> Result<&ComplicationEffect, DomainError> {
        if roll == 0 || roll > self.die_faces {
            return Err(DomainError::InvalidComplicationRoll {
                roll,
                faces: self.die_faces,
            });
        }
        self.entries
            .iter()
            .find(|entry| entry.covers(roll))
            .map(|entry| &entry.effect)
            .ok_or_else(|| {
                DomainError::configuration(format!("no complication covers roll {roll}"))
            })
    }

    /// Rolls the table's die and looks the result up.
    ///
    /// # Errors
    ///
    /// Propagates [`ComplicationTable::lookup`] errors.
    pub fn roll(&self, rng: &mut dyn DeterministicRng) -> Result<ComplicationRoll, DomainError> {
        let roll = rng.next_u32_range(1, self.die_faces);
        let effect = self.lookup(roll)?.clone();
        debug!(roll, effect = effect.tag(), "complication rolled");
        Ok(ComplicationRoll { roll, effect })
    }
}
