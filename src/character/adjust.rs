//! Game-master stat adjustments
//!
//! The GM grants or removes hit points, gold and experience. Every non-zero
//! change produces a chat notice for the table.

use serde::{Deserialize, Serialize};

use super::Character;
use crate::chat::ChatMessage;

/// Adjustable character stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Hp,
    Gold,
    Xp,
}

impl StatKind {
    /// Label used in chat notices
    pub fn label(self) -> &'static str {
        match self {
            StatKind::Hp => "HP",
            StatKind::Gold => "gold",
            StatKind::Xp => "XP",
        }
    }
}

fn add_clamped(value: u32, delta: i32) -> u32 {
    (i64::from(value) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32
}

/// Apply a signed delta to a character stat.
///
/// Hit points are clamped to `[0, max]`, gold and xp at zero. Returns the
/// system message announcing the change, or `None` for a zero delta.
pub fn apply_adjustment(character: &mut Character, stat: StatKind, delta: i32) -> Option<ChatMessage> {
    if delta == 0 {
        return None;
    }

    match stat {
        StatKind::Hp => {
            character.hp.adjust(delta);
        }
        StatKind::Gold => character.gold = add_clamped(character.gold, delta),
        StatKind::Xp => character.xp = add_clamped(character.xp, delta),
    }

    let verb = if delta > 0 { "gained" } else { "lost" };
    Some(ChatMessage::system(format!(
        "{} {} {} {}.",
        character.name,
        verb,
        delta.unsigned_abs(),
        stat.label()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::tests::sample_character;
    use crate::character::HitPoints;
    use crate::chat::{MessageType, SYSTEM_SENDER};

    #[test]
    fn test_hp_clamped_to_zero() {
        let mut c = sample_character(10, 10, 10);
        c.hp = HitPoints::new(5, 10);
        let msg = apply_adjustment(&mut c, StatKind::Hp, -999).unwrap();
        assert_eq!(c.hp.current(), 0);
        assert_eq!(msg.content, "Aria lost 999 HP.");
        assert_eq!(msg.kind, MessageType::System);
        assert_eq!(msg.sender_name, SYSTEM_SENDER);
    }

    #[test]
    fn test_hp_clamped_to_max() {
        let mut c = sample_character(10, 10, 10);
        c.hp = HitPoints::new(5, 10);
        apply_adjustment(&mut c, StatKind::Hp, 50);
        assert_eq!(c.hp.current(), 10);
    }

    #[test]
    fn test_gold_gain_message() {
        let mut c = sample_character(10, 10, 10);
        let msg = apply_adjustment(&mut c, StatKind::Gold, 5).unwrap();
        assert_eq!(c.gold, 35);
        assert_eq!(msg.content, "Aria gained 5 gold.");
    }

    #[test]
    fn test_gold_and_xp_floor_at_zero() {
        let mut c = sample_character(10, 10, 10);
        apply_adjustment(&mut c, StatKind::Gold, -100);
        assert_eq!(c.gold, 0);
        apply_adjustment(&mut c, StatKind::Xp, 250);
        apply_adjustment(&mut c, StatKind::Xp, -300);
        assert_eq!(c.xp, 0);
    }

    #[test]
    fn test_zero_delta_is_silent() {
        let mut c = sample_character(10, 10, 10);
        let before = c.clone();
        assert!(apply_adjustment(&mut c, StatKind::Xp, 0).is_none());
        assert_eq!(c, before);
    }

    #[test]
    fn test_stat_kind_wire_names() {
        let stat: StatKind = serde_json::from_str("\"gold\"").unwrap();
        assert_eq!(stat, StatKind::Gold);
        assert_eq!(serde_json::to_value(StatKind::Hp).unwrap(), "hp");
    }
}
