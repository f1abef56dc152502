//! Dice notation parsing and deterministic rolls
//!
//! Supports `NdS`, `NdS+M`, `NdS-M` and the `dS` shorthand for `1dS`.
//! Rolls thread [`PrngState`] exactly like the other generator functions:
//! one `random_int(1, sides)` draw per die, in order.

use crate::rng::{random_float, PrngState};
use crate::DiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most dice a single notation may roll
pub const MAX_DICE: u32 = 1_000;

/// Most sides a single die may have
pub const MAX_SIDES: u32 = 1_000_000;

/// A parsed dice expression like `2d6+3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceNotation {
    /// Number of dice to roll (N in NdS)
    pub count: u32,
    /// Sides per die (S in NdS)
    pub sides: u32,
    /// Added after summing the dice
    pub modifier: i64,
}

impl DiceNotation {
    /// Create a notation, validating count and sides
    ///
    /// `count` is capped at [`MAX_DICE`] and `sides` at [`MAX_SIDES`], which
    /// keeps every roll's allocation and sum bounded.
    pub fn new(count: u32, sides: u32, modifier: i64) -> Result<Self, DiceError> {
        if count == 0 {
            return Err(DiceError::InvalidCount);
        }
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice {
                count,
                max: MAX_DICE,
            });
        }
        if sides == 0 {
            return Err(DiceError::InvalidSides);
        }
        if sides > MAX_SIDES {
            return Err(DiceError::TooManySides {
                sides,
                max: MAX_SIDES,
            });
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Parse a notation string
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceError::Empty);
        }

        let (count_str, rest) = input
            .split_once('d')
            .ok_or_else(|| DiceError::InvalidFormat(format!("missing 'd' in '{}'", input)))?;

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidFormat(format!("bad dice count '{}'", count_str)))?
        };

        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides_str, mod_str) = rest.split_at(pos);
                let modifier: i64 = mod_str
                    .parse()
                    .map_err(|_| DiceError::InvalidFormat(format!("bad modifier '{}'", mod_str)))?;
                (sides_str, modifier)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidFormat(format!("bad die size '{}'", sides_str)))?;

        Self::new(count, sides, modifier)
    }

    /// Smallest possible total
    pub fn min_total(&self) -> i64 {
        (self.count as i64).saturating_add(self.modifier)
    }

    /// Largest possible total
    pub fn max_total(&self) -> i64 {
        (self.count as i64 * self.sides as i64).saturating_add(self.modifier)
    }
}

impl FromStr for DiceNotation {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// Outcome of a roll with every die kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub notation: DiceNotation,
    /// Individual die faces, in draw order
    pub rolls: Vec<i64>,
    pub total: i64,
}

/// Roll a parsed notation
pub fn roll_detailed(state: PrngState, notation: &DiceNotation) -> (DiceRoll, PrngState) {
    let mut state = state;
    let mut rolls = Vec::with_capacity(notation.count as usize);
    let sides = notation.sides.max(1) as f64;
    for _ in 0..notation.count {
        // Same draw as random_int(state, 1, sides)
        let (f, next) = random_float(state);
        rolls.push((f * sides).floor() as i64 + 1);
        state = next;
    }
    let total = rolls.iter().sum::<i64>().saturating_add(notation.modifier);
    (
        DiceRoll {
            notation: *notation,
            rolls,
            total,
        },
        state,
    )
}

/// Parse and roll, returning only the total
pub fn roll_dice(state: PrngState, notation: &str) -> Result<(i64, PrngState), DiceError> {
    let parsed = DiceNotation::parse(notation)?;
    let (roll, next) = roll_detailed(state, &parsed);
    Ok((roll.total, next))
}
