//! Combat module
//!
//! - Dice formulas and attribute rolling methods
//! - Initiative-ordered encounter tracker

pub mod dice;
pub mod tracker;

pub use dice::{
    parse_formula, quick_roll, roll_formula, roll_formula_with, DiceError, DiceFormula,
    RollMethod, RollOutcome,
};
pub use tracker::{CombatError, CombatTracker, Combatant, CombatantKind, EncounterState};
