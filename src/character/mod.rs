//! Character records
//!
//! The character sheet data model: attributes, hit points, inventory.
//! Derived combat values live in [`stats`], the creation workflow in
//! [`creation`] and game-master adjustments in [`adjust`].

pub mod adjust;
pub mod creation;
pub mod stats;

use serde::{Deserialize, Serialize};

pub use adjust::{apply_adjustment, StatKind};
pub use creation::{CharacterDraft, DraftError};
pub use stats::{
    armor_class, attack_bonus, damage, derived_stats, hp_max, modifier_for, DerivedStats,
};

/// A single attribute score
///
/// The modifier is always derived from the value. It is written out on
/// serialization for clients, and ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "AttributeRecord", from = "AttributeRecord")]
pub struct Attribute {
    code: String,
    name: String,
    value: i32,
}

/// Wire shape of an attribute
#[derive(Serialize, Deserialize)]
struct AttributeRecord {
    code: String,
    #[serde(default)]
    name: String,
    value: i32,
    #[serde(default)]
    modifier: i32,
}

impl From<Attribute> for AttributeRecord {
    fn from(attr: Attribute) -> Self {
        let modifier = attr.modifier();
        Self {
            code: attr.code,
            name: attr.name,
            value: attr.value,
            modifier,
        }
    }
}

impl From<AttributeRecord> for Attribute {
    fn from(record: AttributeRecord) -> Self {
        let name = if record.name.is_empty() {
            record.code.clone()
        } else {
            record.name
        };
        Self {
            code: record.code,
            name,
            value: record.value,
        }
    }
}

impl Attribute {
    /// Create an attribute whose display name is its code
    pub fn new(code: &str, value: i32) -> Self {
        Self {
            code: code.to_string(),
            name: code.to_string(),
            value,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Modifier derived from the current value
    pub fn modifier(&self) -> i32 {
        modifier_for(self.value)
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
    }
}

/// Current and maximum hit points, current always within `[0, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawHitPoints")]
pub struct HitPoints {
    current: i32,
    max: i32,
}

#[derive(Deserialize)]
struct RawHitPoints {
    current: i32,
    max: i32,
}

impl From<RawHitPoints> for HitPoints {
    fn from(raw: RawHitPoints) -> Self {
        HitPoints::new(raw.current, raw.max)
    }
}

impl HitPoints {
    /// Create hit points, clamping current into range
    pub fn new(current: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    /// Fully healed
    pub fn full(max: i32) -> Self {
        Self::new(max, max)
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Apply a signed delta, returning the change actually applied
    pub fn adjust(&mut self, delta: i32) -> i32 {
        let before = self.current;
        self.current = (i64::from(self.current) + i64::from(delta)).clamp(0, i64::from(self.max)) as i32;
        self.current - before
    }
}

/// Item category with its type-specific data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ItemKind {
    /// Weapon with a damage dice formula
    Weapon { damage: String },
    /// Armor or shield with an armor-class bonus
    Armor {
        #[serde(default)]
        ac: i32,
    },
    /// Anything else
    Gear,
}

impl ItemKind {
    pub fn weapon(damage: &str) -> Self {
        ItemKind::Weapon {
            damage: damage.to_string(),
        }
    }
}

/// A catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub cost: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: &str, cost: u32, kind: ItemKind) -> Self {
        Self {
            name: name.to_string(),
            cost,
            kind,
        }
    }
}

/// An owned copy of an item with its own equipped flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub instance_id: String,
    #[serde(default)]
    pub equipped: bool,
    #[serde(flatten)]
    pub item: Item,
}

impl InventoryItem {
    /// Create a new unequipped instance of an item
    pub fn new(item: Item) -> Self {
        Self {
            instance_id: uuid::Uuid::new_v4().to_string(),
            equipped: false,
            item,
        }
    }
}

/// A player character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    /// Session this character plays in
    #[serde(default)]
    pub session_id: String,
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u32,
    pub hp: HitPoints,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub gold: u32,
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub equipment: Vec<InventoryItem>,
    pub system_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Backstory
    #[serde(default)]
    pub history: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

impl Character {
    /// Find an attribute by code
    pub fn attribute(&self, code: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.code == code)
    }

    /// Modifier of an attribute, 0 when the system has no such attribute
    pub fn modifier(&self, code: &str) -> i32 {
        self.attribute(code).map_or(0, Attribute::modifier)
    }

    /// Set an attribute's raw value. Returns false if the code is unknown.
    pub fn set_attribute(&mut self, code: &str, value: i32) -> bool {
        match self.attributes.iter_mut().find(|a| a.code == code) {
            Some(attr) => {
                attr.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Flip the equipped flag of an inventory item, returning the new state
    pub fn toggle_equipped(&mut self, instance_id: &str) -> Option<bool> {
        let item = self
            .equipment
            .iter_mut()
            .find(|i| i.instance_id == instance_id)?;
        item.equipped = !item.equipped;
        Some(item.equipped)
    }

    /// Add an unequipped copy of `item`, returning its instance id
    pub fn add_item(&mut self, item: Item) -> String {
        let instance = InventoryItem::new(item);
        let id = instance.instance_id.clone();
        self.equipment.push(instance);
        id
    }

    /// Remove an inventory item by instance id. No refund.
    pub fn remove_item(&mut self, instance_id: &str) -> Option<InventoryItem> {
        let index = self
            .equipment
            .iter()
            .position(|i| i.instance_id == instance_id)?;
        Some(self.equipment.remove(index))
    }

    pub fn set_history(&mut self, history: &str) {
        self.history = history.to_string();
    }

    /// Equipped inventory items
    pub fn equipped(&self) -> impl Iterator<Item = &InventoryItem> {
        self.equipment.iter().filter(|i| i.equipped)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Level 1 fighter with the given (FOR, DES, CON) scores
    pub(crate) fn sample_character(str_score: i32, dex_score: i32, con_score: i32) -> Character {
        Character {
            id: "char-1".to_string(),
            session_id: "game-1".to_string(),
            name: "Aria".to_string(),
            race: "Humano".to_string(),
            class: "Guerreiro".to_string(),
            level: 1,
            hp: HitPoints::full(10),
            xp: 0,
            gold: 30,
            attributes: vec![
                Attribute::new("FOR", str_score),
                Attribute::new("DES", dex_score),
                Attribute::new("CON", con_score),
                Attribute::new("INT", 10),
                Attribute::new("SAB", 10),
                Attribute::new("CAR", 10),
            ],
            equipment: Vec::new(),
            system_id: "od2".to_string(),
            avatar_url: None,
            history: String::new(),
            player_name: Some("aria_player".to_string()),
        }
    }

    #[test]
    fn test_hit_points_clamp() {
        let hp = HitPoints::new(15, 10);
        assert_eq!(hp.current(), 10);

        let mut hp = HitPoints::new(5, 10);
        assert_eq!(hp.adjust(-999), -5);
        assert_eq!(hp.current(), 0);
        assert_eq!(hp.adjust(999), 10);
        assert_eq!(hp.current(), 10);
    }

    #[test]
    fn test_hit_points_clamped_on_load() {
        let hp: HitPoints = serde_json::from_str(r#"{"current": -4, "max": 8}"#).unwrap();
        assert_eq!(hp, HitPoints::new(0, 8));
    }

    #[test]
    fn test_attribute_modifier_ignored_on_load() {
        let attr: Attribute =
            serde_json::from_str(r#"{"code": "FOR", "name": "FOR", "value": 17, "modifier": -3}"#)
                .unwrap();
        assert_eq!(attr.modifier(), 3);

        let json = serde_json::to_value(&attr).unwrap();
        assert_eq!(json["modifier"], 3);
    }

    #[test]
    fn test_item_wire_format() {
        let item = InventoryItem {
            instance_id: "i-1".to_string(),
            equipped: true,
            item: Item::new("Escudo", 10, ItemKind::Armor { ac: 1 }),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "ARMOR");
        assert_eq!(json["ac"], 1);
        assert_eq!(json["instanceId"], "i-1");

        let gear: InventoryItem = serde_json::from_str(
            r#"{"instanceId": "i-2", "equipped": false, "name": "Mochila", "cost": 2, "type": "GEAR"}"#,
        )
        .unwrap();
        assert_eq!(gear.item.kind, ItemKind::Gear);
    }

    #[test]
    fn test_toggle_equipped() {
        let mut c = sample_character(10, 10, 10);
        let item = InventoryItem::new(Item::new("Adaga", 2, ItemKind::weapon("1d4")));
        let id = item.instance_id.clone();
        c.equipment.push(item);

        assert_eq!(c.toggle_equipped(&id), Some(true));
        assert_eq!(c.equipped().count(), 1);
        assert_eq!(c.toggle_equipped(&id), Some(false));
        assert_eq!(c.toggle_equipped("missing"), None);
    }

    #[test]
    fn test_set_attribute_rederives_modifier() {
        let mut c = sample_character(10, 10, 10);
        assert_eq!(c.modifier("FOR"), 0);
        assert!(c.set_attribute("FOR", 16));
        assert_eq!(c.modifier("FOR"), 2);
        assert!(!c.set_attribute("PdF", 3));
        assert_eq!(c.modifier("PdF"), 0);
    }

    #[test]
    fn test_add_and_remove_items() {
        let mut c = sample_character(10, 10, 10);
        let first = c.add_item(Item::new("Corda", 1, ItemKind::Gear));
        let second = c.add_item(Item::new("Corda", 1, ItemKind::Gear));
        assert_ne!(first, second);
        assert_eq!(c.equipment.len(), 2);
        assert!(!c.equipment[0].equipped);

        let removed = c.remove_item(&first).unwrap();
        assert_eq!(removed.instance_id, first);
        assert_eq!(c.equipment.len(), 1);
        assert_eq!(c.equipment[0].instance_id, second);
        assert!(c.remove_item(&first).is_none());
        assert_eq!(c.gold, 30);
    }
}
