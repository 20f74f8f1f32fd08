//! Dice rolling system
//!
//! Parses and rolls formulas like "1d6", "4d8+4", "2d6+1d4+2" and provides
//! the attribute, gold and initiative rolls used at the table.
//!
//! Every roll takes an explicit RNG so tests can seed it; the convenience
//! wrappers use the thread RNG.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::chat::RollData;

/// Total used when a formula cannot be parsed
pub const FALLBACK_TOTAL: i32 = 1;

/// Upper bound on dice in a single term
const MAX_DICE_PER_TERM: u32 = 100;
/// Largest die
const MAX_SIDES: u32 = 1000;
/// Largest constant term, either sign
const MAX_CONSTANT: i32 = 1000;

/// Formula parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty dice formula")]
    Empty,
    #[error("invalid term: {0}")]
    InvalidTerm(String),
    #[error("invalid dice count: {0}")]
    InvalidCount(String),
    #[error("invalid die sides: {0}")]
    InvalidSides(String),
    #[error("too many dice in one term: {0}")]
    TooManyDice(u32),
}

/// One term of a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceTerm {
    /// `<count>d<sides>`
    Dice { count: u32, sides: u32 },
    /// Signed constant
    Constant(i32),
}

/// A parsed dice formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceFormula {
    terms: Vec<DiceTerm>,
}

/// Individual die results plus the total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub results: Vec<u32>,
    pub total: i32,
}

impl DiceFormula {
    pub fn terms(&self) -> &[DiceTerm] {
        &self.terms
    }

    /// Roll every die term and add the constants.
    ///
    /// A total that does not fit in an `i32` becomes [`FALLBACK_TOTAL`].
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> RollOutcome {
        let mut results = Vec::new();
        let mut total: Option<i32> = Some(0);

        for term in &self.terms {
            match *term {
                DiceTerm::Dice { count, sides } => {
                    for _ in 0..count {
                        let roll = roll_die(sides, rng);
                        results.push(roll);
                        total = total.and_then(|t| t.checked_add(roll as i32));
                    }
                }
                DiceTerm::Constant(value) => total = total.and_then(|t| t.checked_add(value)),
            }
        }

        let total = total.unwrap_or_else(|| {
            debug!("Dice total overflowed for {}", self);
            FALLBACK_TOTAL
        });
        RollOutcome { results, total }
    }

    /// Roll with the thread RNG
    pub fn roll(&self) -> RollOutcome {
        self.roll_with(&mut rand::rng())
    }

    /// Get the minimum possible result
    pub fn min(&self) -> i32 {
        self.terms
            .iter()
            .map(|t| match *t {
                DiceTerm::Dice { count, .. } => count as i32,
                DiceTerm::Constant(v) => v,
            })
            .fold(0, i32::saturating_add)
    }

    /// Get the maximum possible result
    pub fn max(&self) -> i32 {
        self.terms
            .iter()
            .map(|t| match *t {
                DiceTerm::Dice { count, sides } => (count * sides) as i32,
                DiceTerm::Constant(v) => v,
            })
            .fold(0, i32::saturating_add)
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            match *term {
                DiceTerm::Dice { count, sides } => {
                    if i > 0 {
                        write!(f, "+")?;
                    }
                    write!(f, "{}d{}", count, sides)?;
                }
                DiceTerm::Constant(v) if i > 0 => write!(f, "{:+}", v)?,
                DiceTerm::Constant(v) => write!(f, "{}", v)?,
            }
        }
        Ok(())
    }
}

/// Parse a formula: terms joined by `+` (or `-` before a constant)
pub fn parse_formula(notation: &str) -> Result<DiceFormula, DiceError> {
    let notation: String = notation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if notation.is_empty() {
        return Err(DiceError::Empty);
    }

    // Split into signed chunks, keeping each sign with its term
    let mut chunks = Vec::new();
    let mut start = 0;
    for (i, c) in notation.char_indices() {
        if (c == '+' || c == '-') && i > 0 {
            chunks.push(&notation[start..i]);
            start = i;
        }
    }
    chunks.push(&notation[start..]);

    let terms = chunks
        .into_iter()
        .map(parse_term)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DiceFormula { terms })
}

fn parse_term(chunk: &str) -> Result<DiceTerm, DiceError> {
    let (negative, body) = match chunk.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, chunk.strip_prefix('+').unwrap_or(chunk)),
    };

    if body.is_empty() {
        return Err(DiceError::InvalidTerm(chunk.to_string()));
    }

    match body.split_once('d') {
        Some((count_str, sides_str)) => {
            if negative {
                return Err(DiceError::InvalidTerm(chunk.to_string()));
            }

            // "d6" means "1d6"
            let count: u32 = if count_str.is_empty() {
                1
            } else {
                count_str
                    .parse()
                    .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?
            };
            if count == 0 {
                return Err(DiceError::InvalidCount(count_str.to_string()));
            }
            if count > MAX_DICE_PER_TERM {
                return Err(DiceError::TooManyDice(count));
            }

            let sides: u32 = sides_str
                .parse()
                .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;
            if sides == 0 || sides > MAX_SIDES {
                return Err(DiceError::InvalidSides(sides_str.to_string()));
            }

            Ok(DiceTerm::Dice { count, sides })
        }
        None => {
            let value: i32 = body
                .parse()
                .map_err(|_| DiceError::InvalidTerm(chunk.to_string()))?;
            if value > MAX_CONSTANT {
                return Err(DiceError::InvalidTerm(chunk.to_string()));
            }
            Ok(DiceTerm::Constant(if negative { -value } else { value }))
        }
    }
}

/// Roll a formula, falling back to [`FALLBACK_TOTAL`] when it is malformed
pub fn roll_formula_with<R: Rng + ?Sized>(notation: &str, rng: &mut R) -> RollOutcome {
    match parse_formula(notation) {
        Ok(formula) => formula.roll_with(rng),
        Err(e) => {
            debug!("Malformed dice formula {:?}: {}", notation, e);
            RollOutcome {
                results: Vec::new(),
                total: FALLBACK_TOTAL,
            }
        }
    }
}

/// Roll a formula with the thread RNG; malformed formulas total 1
pub fn roll_formula(notation: &str) -> i32 {
    roll_formula_with(notation, &mut rand::rng()).total
}

/// Roll a single die
pub fn roll_die<R: Rng + ?Sized>(sides: u32, rng: &mut R) -> u32 {
    rng.random_range(1..=sides.max(1))
}

/// Roll a single d20
pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    roll_die(20, rng)
}

/// Initiative: 1d20 plus a modifier
pub fn roll_initiative<R: Rng + ?Sized>(modifier: i32, rng: &mut R) -> i32 {
    roll_d20(rng) as i32 + modifier
}

/// Starting gold: 3d6 x 10
pub fn roll_gold<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    (0..3).map(|_| roll_die(6, rng)).sum::<u32>() * 10
}

/// One die plus a flat modifier, as thrown from the chat dice tray
pub fn quick_roll<R: Rng + ?Sized>(sides: u32, modifier: i32, rng: &mut R) -> RollData {
    let result = roll_die(sides, rng);
    let formula = match modifier {
        0 => format!("1d{}", sides),
        m => format!("1d{}{:+}", sides, m),
    };
    RollData {
        formula,
        results: vec![result],
        total: result as i32 + modifier,
    }
}

/// Attribute rolling method used during character creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RollMethod {
    /// 3d6 in order
    #[default]
    Classic,
    /// 3d6, then arrange the totals freely
    Adventurer,
    /// 4d6, drop the lowest
    Heroic,
}

/// Dice thrown for one attribute and the resulting score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRoll {
    pub dice: Vec<u32>,
    pub score: i32,
}

impl RollMethod {
    /// Whether rolled totals may be rearranged across attributes
    pub fn allows_reassignment(self) -> bool {
        matches!(self, RollMethod::Adventurer)
    }

    fn dice_count(self) -> usize {
        match self {
            RollMethod::Classic | RollMethod::Adventurer => 3,
            RollMethod::Heroic => 4,
        }
    }

    /// Score produced by a given set of d6 results
    pub fn score(self, dice: &[u32]) -> i32 {
        match self {
            RollMethod::Classic | RollMethod::Adventurer => dice.iter().sum::<u32>() as i32,
            RollMethod::Heroic => drop_lowest_total(dice),
        }
    }

    /// Roll one attribute score
    pub fn roll_score<R: Rng + ?Sized>(self, rng: &mut R) -> ScoreRoll {
        let dice: Vec<u32> = (0..self.dice_count()).map(|_| roll_die(6, rng)).collect();
        let score = self.score(&dice);
        ScoreRoll { dice, score }
    }
}

/// Sum of the dice after discarding the single lowest one
pub fn drop_lowest_total(dice: &[u32]) -> i32 {
    let sum: u32 = dice.iter().sum();
    let lowest = dice.iter().min().copied().unwrap_or(0);
    (sum - lowest) as i32
}
