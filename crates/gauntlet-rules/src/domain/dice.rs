//! Dice pools and the rules for reading their faces.

use std::fmt;
use std::str::FromStr;

use gauntlet_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A request to roll `count` dice of `die_faces` sides each.
///
/// A pool of zero dice is legal and always reads as zero successes and
/// zero botches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DicePool {
    die_faces: u32,
    count: u32,
}

impl DicePool {
    /// Creates a pool.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if `die_faces` is zero.
    pub fn new(die_faces: u32, count: u32) -> Result<Self, DomainError> {
        if die_faces == 0 {
            return Err(DomainError::configuration(
                "dice must have at least one face",
            ));
        }
        Ok(Self { die_faces, count })
    }

    /// A pool of ten-sided dice.
    #[must_use]
    pub const fn d10(count: u32) -> Self {
        Self {
            die_faces: 10,
            count,
        }
    }

    /// Number of faces on each die.
    #[must_use]
    pub const fn die_faces(&self) -> u32 {
        self.die_faces
    }

    /// Number of dice in the pool.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.die_faces)
    }
}

/// Decides which faces count as successes and which as botches.
pub trait FaceReading {
    /// Whether `face` counts as a success.
    fn is_success(&self, face: u32) -> bool;

    /// Whether `face` counts as a botch.
    fn is_botch(&self, face: u32) -> bool;

    /// Whether botches are subtracted from successes to form net successes.
    fn botches_cancel_successes(&self) -> bool {
        false
    }
}

/// Threshold-based face reading, the form every challenge config uses.
///
/// Faces `>= success_threshold` are successes, faces `<= botch_face` are
/// botches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRules {
    /// Faces on each die.
    pub die_faces: u32,
    /// Lowest face that counts as a success.
    pub success_threshold: u32,
    /// Highest face that counts as a botch.
    pub botch_face: u32,
    /// Net successes subtract botches when set.
    #[serde(default)]
    pub botches_cancel_successes: bool,
}

impl FaceRules {
    /// d10 with successes on 6+ and botches on 1.
    pub const WIDE: Self = Self::d10(6);

    /// d10 with successes on 8+ and botches on 1.
    pub const NARROW: Self = Self::d10(8);

    /// d10 reading with the given success threshold and botches on 1.
    #[must_use]
    pub const fn d10(success_threshold: u32) -> Self {
        Self {
            die_faces: 10,
            success_threshold,
            botch_face: 1,
            botches_cancel_successes: false,
        }
    }

    /// Same faces, but botches cancel successes.
    #[must_use]
    pub const fn with_botch_cancellation(self) -> Self {
        Self {
            botches_cancel_successes: true,
            ..self
        }
    }

    /// Checks that `1 <= botch_face < success_threshold <= die_faces`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` describing the first
    /// ordering violation.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.die_faces == 0 {
            return Err(DomainError::configuration(
                "dice must have at least one face",
            ));
        }
        if self.success_threshold == 0 || self.success_threshold > self.die_faces {
            return Err(DomainError::configuration(format!(
                "success threshold {} is outside 1..={}",
                self.success_threshold, self.die_faces
            )));
        }
        if self.botch_face == 0 || self.botch_face >= self.success_threshold {
            return Err(DomainError::configuration(format!(
                "botch face {} must be at least 1 and below the success threshold {}",
                self.botch_face, self.success_threshold
            )));
        }
        Ok(())
    }

    /// A pool of `count` dice read by these rules.
    #[must_use]
    pub const fn pool(&self, count: u32) -> DicePool {
        DicePool {
            die_faces: self.die_faces,
            count,
        }
    }
}

impl FaceReading for FaceRules {
    fn is_success(&self, face: u32) -> bool {
        face >= self.success_threshold
    }

    fn is_botch(&self, face: u32) -> bool {
        face <= self.botch_face
    }

    fn botches_cancel_successes(&self) -> bool {
        self.botches_cancel_successes
    }
}

/// Face reading built from two arbitrary predicates.
pub struct FacePredicates<S, B> {
    success: S,
    botch: B,
}

impl<S, B> FacePredicates<S, B>
where
    S: Fn(u32) -> bool,
    B: Fn(u32) -> bool,
{
    /// Wraps a success predicate and a botch predicate.
    pub const fn new(success: S, botch: B) -> Self {
        Self { success, botch }
    }
}

impl<S, B> FaceReading for FacePredicates<S, B>
where
    S: Fn(u32) -> bool,
    B: Fn(u32) -> bool,
{
    fn is_success(&self, face: u32) -> bool {
        (self.success)(face)
    }

    fn is_botch(&self, face: u32) -> bool {
        (self.botch)(face)
    }
}

/// How many times the pool is rolled and which result is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// Roll once.
    #[default]
    Normal,
    /// Roll twice, keep the higher net successes.
    Advantage,
    /// Roll twice, keep the lower net successes.
    Disadvantage,
}

/// A damage or effect roll such as `2d10` or `1d6+1`.
///
/// The engine never rolls these; they travel to the caller as payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    /// Number of dice.
    pub count: u32,
    /// Faces per die.
    pub faces: u32,
    /// Flat modifier added to the total.
    pub bonus: i32,
}

impl DiceExpression {
    /// `count`d`faces` with no modifier.
    #[must_use]
    pub const fn new(count: u32, faces: u32) -> Self {
        Self {
            count,
            faces,
            bonus: 0,
        }
    }

    /// Adds a flat modifier.
    #[must_use]
    pub const fn plus(self, bonus: i32) -> Self {
        Self { bonus, ..self }
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.faces)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "{b}"),
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::configuration(format!("malformed dice expression {s:?}"));
        let text = s.trim().to_ascii_lowercase();

        let (count, rest) = text.split_once('d').ok_or_else(malformed)?;
        let count = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().map_err(|_| malformed())?
        };

        let (faces, bonus) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(idx) => {
                let (faces, bonus) = rest.split_at(idx);
                (faces, bonus.parse::<i32>().map_err(|_| malformed())?)
            }
            None => (rest, 0),
        };
        let faces = faces.parse::<u32>().map_err(|_| malformed())?;

        if count == 0 || faces == 0 {
            return Err(malformed());
        }
        Ok(Self {
            count,
            faces,
            bonus,
        })
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceExpression> for String {
    fn from(value: DiceExpression) -> Self {
        value.to_string()
    }
}
