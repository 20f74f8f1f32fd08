//! Derived combat statistics
//!
//! Pure functions over a character snapshot. Nothing here is stored: every
//! value is recomputed from attributes, level and equipped items.

use serde::Serialize;

use super::{Character, ItemKind};
use crate::rules::{ClassArchetype, DEXTERITY, STRENGTH};

/// Base armor class before dexterity and armor
pub const BASE_ARMOR_CLASS: i32 = 10;

/// Damage formula used when no weapon is equipped
pub const UNARMED_DAMAGE: &str = "1d3";

/// Map a raw attribute score to its modifier
pub fn modifier_for(value: i32) -> i32 {
    match value {
        i32::MIN..=3 => -3,
        4..=5 => -2,
        6..=8 => -1,
        9..=12 => 0,
        13..=14 => 1,
        15..=16 => 2,
        17..=18 => 3,
        _ => 4,
    }
}

/// 10 + DEX modifier + bonus of every equipped armor item
pub fn armor_class(character: &Character) -> i32 {
    let armor: i32 = character
        .equipped()
        .map(|i| match i.item.kind {
            ItemKind::Armor { ac } => ac,
            ItemKind::Weapon { .. } | ItemKind::Gear => 0,
        })
        .sum();
    BASE_ARMOR_CLASS + character.modifier(DEXTERITY) + armor
}

/// Simplified base attack: floor(level / 2) + 1
pub fn attack_bonus(character: &Character) -> i32 {
    (character.level / 2) as i32 + 1
}

/// Damage formula of the first equipped weapon plus the signed STR modifier
pub fn damage(character: &Character) -> String {
    let weapon = character.equipped().find_map(|i| match &i.item.kind {
        ItemKind::Weapon { damage } => Some(damage.as_str()),
        ItemKind::Armor { .. } | ItemKind::Gear => None,
    });
    let formula = weapon.unwrap_or(UNARMED_DAMAGE);
    format!("{}{:+}", formula, character.modifier(STRENGTH))
}

/// First-level maximum hit points for a class, never below 1
pub fn hp_max(class: &str, con_modifier: i32) -> i32 {
    (ClassArchetype::of(class).base_hit_points() + con_modifier).max(1)
}

/// Derived values shown on a character sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage: String,
    pub unarmed: bool,
}

pub fn derived_stats(character: &Character) -> DerivedStats {
    let unarmed = !character
        .equipped()
        .any(|i| matches!(i.item.kind, ItemKind::Weapon { .. }));
    DerivedStats {
        armor_class: armor_class(character),
        attack_bonus: attack_bonus(character),
        damage: damage(character),
        unarmed,
    }
}
