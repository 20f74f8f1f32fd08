//! Combat tracker
//!
//! Encounter state machine with an initiative-ordered turn queue:
//! - Idle until started, Active until explicitly ended
//! - Monsters added from templates, players imported from a roster
//! - Turn pointer and round counter
//!
//! Combatants are ephemeral and never persisted.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dice::{roll_formula_with, roll_initiative};
use crate::character::{armor_class, Character};
use crate::rules::{MonsterTemplate, DEXTERITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombatantKind {
    Player,
    Monster,
}

/// An entry in the turn queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    /// Character id for players, `m-<uuid>` for monsters
    pub id: String,
    pub name: String,
    pub initiative: i32,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(rename = "type")]
    pub kind: CombatantKind,
    pub ac: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EncounterState {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("combat is already in progress")]
    AlreadyActive,
    #[error("no combat in progress")]
    NotActive,
}

/// Turn order, pointer and round counter for one encounter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatTracker {
    state: EncounterState,
    combatants: Vec<Combatant>,
    current_turn: usize,
    round: u32,
}

impl CombatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EncounterState::Active
    }

    /// Combatants in initiative order
    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Combatant whose turn it is
    pub fn current(&self) -> Option<&Combatant> {
        self.combatants.get(self.current_turn)
    }

    /// Begin an encounter at round 1
    pub fn start(&mut self) -> Result<(), CombatError> {
        if self.is_active() {
            return Err(CombatError::AlreadyActive);
        }
        self.state = EncounterState::Active;
        self.combatants.clear();
        self.current_turn = 0;
        self.round = 1;
        Ok(())
    }

    /// End the encounter and clear the queue
    pub fn end(&mut self) -> Result<(), CombatError> {
        if !self.is_active() {
            return Err(CombatError::NotActive);
        }
        *self = Self::default();
        Ok(())
    }

    fn require_active(&self) -> Result<(), CombatError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CombatError::NotActive)
        }
    }

    /// Add `count` instances of a monster, returning the new combatants
    pub fn add_monsters<R: Rng + ?Sized>(
        &mut self,
        template: &MonsterTemplate,
        count: u32,
        rng: &mut R,
    ) -> Result<Vec<Combatant>, CombatError> {
        self.require_active()?;

        let added: Vec<Combatant> = (1..=count)
            .map(|n| {
                let hp = roll_formula_with(&template.hp, rng).total.max(1);
                let name = if count > 1 {
                    format!("{} {}", template.name, n)
                } else {
                    template.name.clone()
                };
                Combatant {
                    id: format!("m-{}", uuid::Uuid::new_v4()),
                    name,
                    initiative: roll_initiative(template.initiative, rng),
                    hp,
                    max_hp: hp,
                    kind: CombatantKind::Monster,
                    ac: template.ac,
                }
            })
            .collect();

        self.insert_sorted(added.clone());
        Ok(added)
    }

    /// Import every character not already in the queue. Returns how many were added.
    pub fn import_players<R: Rng + ?Sized>(
        &mut self,
        roster: &[Character],
        rng: &mut R,
    ) -> Result<usize, CombatError> {
        self.require_active()?;

        let mut added = Vec::new();
        for character in roster {
            let present = self.combatants.iter().any(|c| c.id == character.id)
                || added.iter().any(|c: &Combatant| c.id == character.id);
            if present {
                continue;
            }
            added.push(Combatant {
                id: character.id.clone(),
                name: character.name.clone(),
                initiative: roll_initiative(character.modifier(DEXTERITY), rng),
                hp: character.hp.current(),
                max_hp: character.hp.max(),
                kind: CombatantKind::Player,
                ac: armor_class(character),
            });
        }

        let count = added.len();
        self.insert_sorted(added);
        Ok(count)
    }

    /// Append and re-sort, keeping the pointer on the active combatant
    fn insert_sorted(&mut self, new: Vec<Combatant>) {
        if new.is_empty() {
            return;
        }
        let active_id = self.current().map(|c| c.id.clone());
        self.combatants.extend(new);
        // Vec::sort_by is stable, so ties keep insertion order
        self.combatants.sort_by(|a, b| b.initiative.cmp(&a.initiative));
        self.current_turn = active_id
            .and_then(|id| self.combatants.iter().position(|c| c.id == id))
            .unwrap_or(0);
    }

    /// Move to the next combatant. Returns the new round number on wrap-around.
    pub fn advance_turn(&mut self) -> Option<u32> {
        if self.combatants.is_empty() {
            return None;
        }
        self.current_turn += 1;
        if self.current_turn >= self.combatants.len() {
            self.current_turn = 0;
            self.round += 1;
            return Some(self.round);
        }
        None
    }

    /// Remove a combatant by id
    pub fn remove(&mut self, id: &str) -> Option<Combatant> {
        let pos = self.combatants.iter().position(|c| c.id == id)?;
        let removed = self.combatants.remove(pos);
        if pos < self.current_turn {
            self.current_turn -= 1;
        } else if self.current_turn >= self.combatants.len() {
            self.current_turn = 0;
        }
        Some(removed)
    }

    /// Apply a signed hp delta clamped to `[0, max_hp]`. Returns the new hp.
    pub fn adjust_hp(&mut self, id: &str, delta: i32) -> Option<i32> {
        let combatant = self.combatants.iter_mut().find(|c| c.id == id)?;
        combatant.hp = (i64::from(combatant.hp) + i64::from(delta))
            .clamp(0, i64::from(combatant.max_hp)) as i32;
        Some(combatant.hp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::tests::sample_character;
    use crate::rules::monster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn active() -> CombatTracker {
        let mut tracker = CombatTracker::new();
        tracker.start().unwrap();
        tracker
    }

    fn push(tracker: &mut CombatTracker, id: &str, initiative: i32) {
        tracker.insert_sorted(vec![Combatant {
            id: id.to_string(),
            name: id.to_string(),
            initiative,
            hp: 5,
            max_hp: 5,
            kind: CombatantKind::Monster,
            ac: 10,
        }]);
    }

    fn ids(tracker: &CombatTracker) -> Vec<&str> {
        tracker.combatants().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_start_and_end() {
        let mut tracker = CombatTracker::new();
        assert_eq!(tracker.state(), EncounterState::Idle);
        assert_eq!(tracker.end(), Err(CombatError::NotActive));

        tracker.start().unwrap();
        assert!(tracker.is_active());
        assert_eq!(tracker.round(), 1);
        assert_eq!(tracker.current_turn(), 0);
        assert_eq!(tracker.start(), Err(CombatError::AlreadyActive));

        push(&mut tracker, "a", 10);
        tracker.end().unwrap();
        assert_eq!(tracker.state(), EncounterState::Idle);
        assert!(tracker.combatants().is_empty());
        assert_eq!(tracker.round(), 0);
    }

    #[test]
    fn test_add_requires_active() {
        let mut tracker = CombatTracker::new();
        let mut rng = StdRng::seed_from_u64(1);
        let goblin = monster("Goblin").unwrap();
        assert_eq!(
            tracker.add_monsters(&goblin, 1, &mut rng),
            Err(CombatError::NotActive)
        );
    }

    #[test]
    fn test_goblins_then_player_import() {
        let mut tracker = active();
        let mut rng = StdRng::seed_from_u64(11);
        let goblin = monster("Goblin").unwrap();

        let added = tracker.add_monsters(&goblin, 2, &mut rng).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].name, "Goblin 1");
        assert_eq!(added[1].name, "Goblin 2");
        for g in &added {
            assert!(g.id.starts_with("m-"));
            assert!((1..=6).contains(&g.hp));
            assert_eq!(g.hp, g.max_hp);
            assert!((2..=21).contains(&g.initiative));
        }

        let player = sample_character(10, 13, 10);
        let roster = vec![player];
        assert_eq!(tracker.import_players(&roster, &mut rng).unwrap(), 1);
        assert_eq!(tracker.combatants().len(), 3);

        let player_entry = tracker
            .combatants()
            .iter()
            .find(|c| c.kind == CombatantKind::Player)
            .unwrap();
        assert_eq!(player_entry.ac, 11);
        assert!((2..=21).contains(&player_entry.initiative));

        let inits: Vec<i32> = tracker.combatants().iter().map(|c| c.initiative).collect();
        assert!(inits.windows(2).all(|w| w[0] >= w[1]));

        assert_eq!(tracker.import_players(&roster, &mut rng).unwrap(), 0);
        assert_eq!(tracker.combatants().len(), 3);
    }

    #[test]
    fn test_single_monster_keeps_plain_name() {
        let mut tracker = active();
        let mut rng = StdRng::seed_from_u64(2);
        let ogre = monster("Ogro").unwrap();
        let added = tracker.add_monsters(&ogre, 1, &mut rng).unwrap();
        assert_eq!(added[0].name, "Ogro");
        assert!((8..=36).contains(&added[0].hp));
    }

    #[test]
    fn test_malformed_hp_formula_uses_fallback() {
        let mut tracker = active();
        let mut rng = StdRng::seed_from_u64(2);
        let odd = MonsterTemplate::new("Blob", "lots", 9, 0, 1);
        let added = tracker.add_monsters(&odd, 1, &mut rng).unwrap();
        assert_eq!(added[0].hp, 1);
    }

    #[test]
    fn test_stable_sort_on_ties() {
        let mut tracker = active();
        push(&mut tracker, "a", 12);
        push(&mut tracker, "b", 15);
        push(&mut tracker, "c", 12);
        push(&mut tracker, "d", 12);
        assert_eq!(ids(&tracker), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_advance_wraps_and_counts_rounds() {
        let mut tracker = active();
        push(&mut tracker, "a", 20);
        push(&mut tracker, "b", 15);
        push(&mut tracker, "c", 10);

        assert_eq!(tracker.advance_turn(), None);
        assert_eq!(tracker.current_turn(), 1);
        assert_eq!(tracker.advance_turn(), None);
        assert_eq!(tracker.current_turn(), 2);
        assert_eq!(tracker.advance_turn(), Some(2));
        assert_eq!(tracker.current_turn(), 0);
        assert_eq!(tracker.round(), 2);

        for _ in 0..3 {
            tracker.advance_turn();
        }
        assert_eq!(tracker.round(), 3);
        assert_eq!(tracker.current_turn(), 0);
    }

    #[test]
    fn test_advance_on_empty_is_noop() {
        let mut tracker = active();
        assert_eq!(tracker.advance_turn(), None);
        assert_eq!(tracker.round(), 1);
        assert_eq!(tracker.current_turn(), 0);
    }

    #[test]
    fn test_resort_keeps_active_combatant() {
        let mut tracker = active();
        push(&mut tracker, "a", 20);
        push(&mut tracker, "b", 10);
        tracker.advance_turn();
        assert_eq!(tracker.current().unwrap().id, "b");

        push(&mut tracker, "c", 25);
        assert_eq!(ids(&tracker), vec!["c", "a", "b"]);
        assert_eq!(tracker.current().unwrap().id, "b");
    }

    #[test]
    fn test_remove_active_last_clamps_pointer() {
        let mut tracker = active();
        push(&mut tracker, "a", 20);
        push(&mut tracker, "b", 15);
        push(&mut tracker, "c", 10);
        tracker.advance_turn();
        tracker.advance_turn();

        tracker.remove("c").unwrap();
        assert_eq!(tracker.current_turn(), 0);
        assert_eq!(tracker.current().unwrap().id, "a");
    }

    #[test]
    fn test_remove_before_pointer_keeps_active() {
        let mut tracker = active();
        push(&mut tracker, "a", 20);
        push(&mut tracker, "b", 15);
        push(&mut tracker, "c", 10);
        tracker.advance_turn();
        tracker.advance_turn();

        tracker.remove("a").unwrap();
        assert_eq!(tracker.current().unwrap().id, "c");
    }

    #[test]
    fn test_remove_unknown_or_empty() {
        let mut tracker = active();
        assert!(tracker.remove("ghost").is_none());
        push(&mut tracker, "a", 5);
        assert!(tracker.remove("ghost").is_none());
        tracker.remove("a").unwrap();
        assert_eq!(tracker.current_turn(), 0);
        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_adjust_hp_clamps() {
        let mut tracker = active();
        push(&mut tracker, "a", 5);
        assert_eq!(tracker.adjust_hp("a", -999), Some(0));
        assert_eq!(tracker.adjust_hp("a", 3), Some(3));
        assert_eq!(tracker.adjust_hp("a", 100), Some(5));
        assert_eq!(tracker.adjust_hp("ghost", 1), None);
    }
}
