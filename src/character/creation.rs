//! Character creation workflow
//!
//! A `CharacterDraft` walks through the steps a player takes at a new table:
//! 1. Pick race, class and attribute rolling method, then roll attributes
//! 2. Roll starting gold once and buy gear from the catalog
//! 3. Write a backstory
//! 4. Finish into a first-level `Character`

use rand::Rng;
use thiserror::Error;

use super::{hp_max, modifier_for, Attribute, Character, HitPoints, InventoryItem, Item};
use crate::combat::dice::{roll_gold, RollMethod, ScoreRoll};
use crate::rules::{self, RulesSystem, CONSTITUTION};
use crate::session::{GameSession, User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("unknown rules system: {0}")]
    UnknownSystem(String),
    #[error("{0} is not a race of this system")]
    UnknownRace(String),
    #[error("{0} is not a class of this system")]
    UnknownClass(String),
    #[error("attributes have not been rolled yet")]
    NotRolled,
    #[error("starting gold was already rolled")]
    GoldAlreadyRolled,
    #[error("not enough gold for {item}: costs {cost}, have {available}")]
    InsufficientGold {
        item: String,
        cost: u32,
        available: u32,
    },
    #[error("no item named {0} in the catalog")]
    NoSuchItem(String),
    #[error("rolled scores can only be rearranged with the Adventurer method")]
    ReassignNotAllowed,
    #[error("no attribute slot {0}")]
    NoSuchSlot(usize),
}

/// In-progress character
#[derive(Debug, Clone)]
pub struct CharacterDraft {
    system: &'static RulesSystem,
    session_id: String,
    pub name: String,
    race: Option<String>,
    class: Option<String>,
    method: RollMethod,
    /// One roll per attribute slot, in system order
    rolls: Vec<ScoreRoll>,
    gold: Option<u32>,
    inventory: Vec<InventoryItem>,
    pub history: String,
    pub avatar_url: Option<String>,
}

impl CharacterDraft {
    /// Start a draft for a session, using its rules system
    pub fn new(session: &GameSession) -> Result<Self, DraftError> {
        let system = rules::system(&session.system_id)
            .ok_or_else(|| DraftError::UnknownSystem(session.system_id.clone()))?;
        Ok(Self {
            system,
            session_id: session.id.clone(),
            name: String::new(),
            race: None,
            class: None,
            method: RollMethod::default(),
            rolls: Vec::new(),
            gold: None,
            inventory: Vec::new(),
            history: String::new(),
            avatar_url: None,
        })
    }

    pub fn system(&self) -> &'static RulesSystem {
        self.system
    }

    pub fn set_race(&mut self, race: &str) -> Result<(), DraftError> {
        if !self.system.has_race(race) {
            return Err(DraftError::UnknownRace(race.to_string()));
        }
        self.race = Some(race.to_string());
        Ok(())
    }

    pub fn set_class(&mut self, class: &str) -> Result<(), DraftError> {
        if !self.system.has_class(class) {
            return Err(DraftError::UnknownClass(class.to_string()));
        }
        self.class = Some(class.to_string());
        Ok(())
    }

    pub fn method(&self) -> RollMethod {
        self.method
    }

    /// Change the rolling method. Discards any rolled scores.
    pub fn set_method(&mut self, method: RollMethod) {
        if self.method != method {
            self.method = method;
            self.rolls.clear();
        }
    }

    /// Roll every attribute with the current method. Re-rolling is allowed.
    pub fn roll_attributes<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[ScoreRoll] {
        self.rolls = self
            .system
            .attributes
            .iter()
            .map(|_| self.method.roll_score(rng))
            .collect();
        &self.rolls
    }

    /// Rolled scores paired with their attribute codes
    pub fn scores(&self) -> Vec<(&'static str, i32)> {
        self.system
            .attributes
            .iter()
            .zip(&self.rolls)
            .map(|(code, roll)| (*code, roll.score))
            .collect()
    }

    /// Swap two rolled scores (Adventurer method only)
    pub fn reassign(&mut self, a: usize, b: usize) -> Result<(), DraftError> {
        if !self.method.allows_reassignment() {
            return Err(DraftError::ReassignNotAllowed);
        }
        if self.rolls.is_empty() {
            return Err(DraftError::NotRolled);
        }
        for slot in [a, b] {
            if slot >= self.rolls.len() {
                return Err(DraftError::NoSuchSlot(slot));
            }
        }
        self.rolls.swap(a, b);
        Ok(())
    }

    pub fn gold(&self) -> Option<u32> {
        self.gold
    }

    /// Roll starting gold (3d6 x 10). Only once per draft.
    pub fn roll_gold<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u32, DraftError> {
        if self.gold.is_some() {
            return Err(DraftError::GoldAlreadyRolled);
        }
        let gold = roll_gold(rng);
        self.gold = Some(gold);
        Ok(gold)
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    /// Buy a catalog item by name
    pub fn buy(&mut self, name: &str) -> Result<&InventoryItem, DraftError> {
        let item: Item = rules::starting_gear()
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| DraftError::NoSuchItem(name.to_string()))?;

        let available = self.gold.unwrap_or(0);
        if item.cost > available {
            return Err(DraftError::InsufficientGold {
                item: item.name,
                cost: item.cost,
                available,
            });
        }

        self.gold = Some(available - item.cost);
        self.inventory.push(InventoryItem::new(item));
        Ok(&self.inventory[self.inventory.len() - 1])
    }

    /// Return a bought item by position, refunding its cost
    pub fn remove_item(&mut self, index: usize) -> Result<InventoryItem, DraftError> {
        if index >= self.inventory.len() {
            return Err(DraftError::NoSuchSlot(index));
        }
        let removed = self.inventory.remove(index);
        self.gold = Some(self.gold.unwrap_or(0) + removed.item.cost);
        Ok(removed)
    }

    /// Build the first-level character for `player`
    pub fn finish(self, player: &User) -> Result<Character, DraftError> {
        let race = self
            .race
            .ok_or_else(|| DraftError::UnknownRace(String::new()))?;
        let class = self
            .class
            .ok_or_else(|| DraftError::UnknownClass(String::new()))?;
        if self.rolls.len() != self.system.attributes.len() {
            return Err(DraftError::NotRolled);
        }

        let attributes: Vec<Attribute> = self
            .system
            .attributes
            .iter()
            .zip(&self.rolls)
            .map(|(code, roll)| Attribute::new(code, roll.score))
            .collect();
        let con = attributes
            .iter()
            .find(|a| a.code() == CONSTITUTION)
            .map_or(0, |a| modifier_for(a.value()));
        let max = hp_max(&class, con);

        let name = match self.name.trim() {
            "" => player.username.clone(),
            name => name.to_string(),
        };

        Ok(Character {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: self.session_id,
            name,
            race,
            class,
            level: 1,
            hp: HitPoints::full(max),
            xp: 0,
            gold: self.gold.unwrap_or(0),
            attributes,
            equipment: self.inventory,
            system_id: self.system.id.to_string(),
            avatar_url: self.avatar_url,
            history: self.history,
            player_name: Some(player.username.clone()),
        })
    }
}
