//! Rules systems catalog
//!
//! Static content for the supported rules systems:
//! - Attribute layout, races and classes per system
//! - Starting gear and monster templates for the reference system (Old Dragon 2e)
//! - Class archetypes used for hit-point budgets
//! - Knowledge base handed to the Oracle

use serde::{Deserialize, Serialize};

use crate::character::{Item, ItemKind};

/// Identifier of the reference system the stat engine is modeled on
pub const REFERENCE_SYSTEM: &str = "od2";

/// Strength attribute code
pub const STRENGTH: &str = "FOR";
/// Dexterity attribute code
pub const DEXTERITY: &str = "DES";
/// Constitution attribute code
pub const CONSTITUTION: &str = "CON";

/// A named ruleset governing character creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesSystem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Attribute codes in sheet order
    pub attributes: &'static [&'static str],
    pub races: &'static [&'static str],
    pub classes: &'static [&'static str],
}

impl RulesSystem {
    /// Check whether a race belongs to this system
    pub fn has_race(&self, race: &str) -> bool {
        self.races.contains(&race)
    }

    /// Check whether a class belongs to this system
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(&class)
    }
}

static SYSTEMS: &[RulesSystem] = &[
    RulesSystem {
        id: "od2",
        name: "Old Dragon 2e",
        description: "Classic fantasy adventures. A Brazilian OSR system focused on simplicity.",
        attributes: &["FOR", "DES", "CON", "INT", "SAB", "CAR"],
        races: &["Humano", "Anão", "Elfo", "Halfling"],
        classes: &[
            "Guerreiro", "Clérigo", "Mago", "Ladrão", "Bárbaro", "Paladino", "Druida", "Ranger",
            "Bardo",
        ],
    },
    RulesSystem {
        id: "t20",
        name: "Tormenta 20",
        description: "Epic fantasy in the world of Arton.",
        attributes: &["FOR", "DES", "CON", "INT", "SAB", "CAR"],
        races: &["Humano", "Lefou", "Qareen", "Minotauro", "Goblin"],
        classes: &[
            "Arcanista", "Bárbaro", "Bardo", "Bucaneiro", "Caçador", "Cavaleiro", "Clérigo",
            "Druida", "Guerreiro", "Inventor", "Ladino", "Lutador", "Nobre", "Paladino",
        ],
    },
    RulesSystem {
        id: "alpha",
        name: "3D&T Alpha",
        description: "Anime and manga flavored over-the-top adventures.",
        attributes: &["F", "H", "R", "A", "PdF"],
        races: &["Humano", "Elfo", "Anão", "Alienígena", "Androide"],
        classes: &["Aventureiro"],
    },
];

/// All supported rules systems
pub fn systems() -> &'static [RulesSystem] {
    SYSTEMS
}

/// Look up a rules system by id
pub fn system(id: &str) -> Option<&'static RulesSystem> {
    SYSTEMS.iter().find(|s| s.id == id)
}

/// Hit-point archetype of a character class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassArchetype {
    /// Fighters and other front-liners (d10)
    Martial,
    /// Arcane casters (d4)
    Arcane,
    /// Skill-based classes (d6)
    Skilled,
    /// Everything else (d8)
    Standard,
}

impl ClassArchetype {
    /// Classify a class name
    pub fn of(class: &str) -> ClassArchetype {
        match class {
            "Guerreiro" | "Bárbaro" | "Paladino" | "Cavaleiro" | "Lutador" => {
                ClassArchetype::Martial
            }
            "Mago" | "Arcanista" => ClassArchetype::Arcane,
            "Ladrão" | "Ladino" | "Bardo" => ClassArchetype::Skilled,
            _ => ClassArchetype::Standard,
        }
    }

    /// Hit points granted at first level before the constitution modifier
    pub fn base_hit_points(self) -> i32 {
        match self {
            ClassArchetype::Martial => 10,
            ClassArchetype::Arcane => 4,
            ClassArchetype::Skilled => 6,
            ClassArchetype::Standard => 8,
        }
    }
}

/// A monster that can be dropped into an encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub name: String,
    /// Hit-point dice formula, e.g. "2d8"
    pub hp: String,
    pub ac: i32,
    /// Initiative modifier added to the d20
    pub initiative: i32,
    pub xp: u32,
}

impl MonsterTemplate {
    pub fn new(name: &str, hp: &str, ac: i32, initiative: i32, xp: u32) -> Self {
        Self {
            name: name.to_string(),
            hp: hp.to_string(),
            ac,
            initiative,
            xp,
        }
    }
}

const MONSTERS: &[(&str, &str, i32, i32, u32)] = &[
    ("Goblin", "1d6", 12, 1, 15),
    ("Orc", "1d8+1", 13, 0, 35),
    ("Esqueleto", "1d6", 12, 0, 15),
    ("Zumbi", "2d8", 11, -1, 50),
    ("Gnoll", "2d8", 14, 1, 65),
    ("Ogro", "4d8+4", 14, 0, 200),
    ("Lobo", "2d8", 13, 2, 65),
    ("Bandido", "1d6", 11, 1, 15),
    ("Necromante", "4d4", 10, 1, 150),
    ("Dragão Jovem", "10d8", 18, 2, 2000),
];

/// Monster templates of the reference system
pub fn monsters() -> Vec<MonsterTemplate> {
    MONSTERS
        .iter()
        .map(|&(name, hp, ac, init, xp)| MonsterTemplate::new(name, hp, ac, init, xp))
        .collect()
}

/// Look up a monster template by name (case-insensitive)
pub fn monster(name: &str) -> Option<MonsterTemplate> {
    monsters()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
}

/// Starting gear shop of the reference system
pub fn starting_gear() -> Vec<Item> {
    let weapon = |name: &str, cost, damage: &str| Item::new(name, cost, ItemKind::weapon(damage));
    let armor = |name: &str, cost, ac| Item::new(name, cost, ItemKind::Armor { ac });
    let gear = |name: &str, cost| Item::new(name, cost, ItemKind::Gear);

    vec![
        weapon("Espada Longa", 10, "1d8"),
        weapon("Espada Curta", 6, "1d6"),
        weapon("Adaga", 2, "1d4"),
        weapon("Machado de Batalha", 10, "1d8"),
        weapon("Arco Curto", 25, "1d6"),
        armor("Armadura de Couro", 20, 2),
        armor("Cota de Malha", 60, 4),
        armor("Escudo", 10, 1),
        gear("Mochila", 2),
        gear("Corda (15m)", 1),
        gear("Tocha (5)", 1),
        gear("Rações de Viagem (7)", 5),
        gear("Cantil", 1),
    ]
}

/// Short rules blurb for a class, if one exists
pub fn class_feature(class: &str) -> Option<&'static str> {
    match class {
        "Guerreiro" => Some("d10 HP per level. Uses every weapon and armor. Progressive attack bonus."),
        "Clérigo" => Some("d8 HP per level. Divine magic, turns undead. No edged weapons."),
        "Mago" => Some("d4 HP per level. Powerful arcane magic. No armor. Keeps a spellbook."),
        "Ladrão" => Some("d6 HP per level. Thief skills and sneak attack. Light armor only."),
        _ => None,
    }
}

/// Short rules blurb for a race, if one exists
pub fn race_feature(race: &str) -> Option<&'static str> {
    match race {
        "Humano" => Some("Versatile. +10% XP. +1 to one saving throw of choice."),
        "Anão" => Some("Infravision. Detects constructions. Resists poison and magic. +1 attack vs orcs."),
        "Elfo" => Some("Infravision. Immune to ghoul paralysis. +1 attack with bows and longswords."),
        "Halfling" => Some("Naturally stealthy. +1 to thrown attacks. +2 AC vs large creatures."),
        _ => None,
    }
}

/// Rules summary given to the Oracle as grounding
pub const KNOWLEDGE_BASE: &str = "\
SYSTEM: Old Dragon 2nd Edition (OD2).
CONCEPT: Old-school RPG focused on simplicity, exploration and danger.
ATTRIBUTES: Strength (FOR), Dexterity (DES), Constitution (CON), Intelligence (INT), Wisdom (SAB), Charisma (CAR).
MODIFIERS: 3(-3), 4-5(-2), 6-8(-1), 9-12(0), 13-14(+1), 15-16(+2), 17-18(+3), 19+(+4).
CLASSES:
- Fighter (Guerreiro): combat, every weapon and armor. d10 hit die.
- Cleric (Clérigo): divine magic, turns undead. Armor, blunt weapons. d8 hit die.
- Magic-user (Mago): arcane magic, fragile. No armor. d4 hit die.
- Thief (Ladrão): skills (open locks, stealth), sneak attack. d6 hit die.
GOLDEN RULES:
1. The game is fun.
2. The game is collaborative.
3. The game is fiction, not science.
ATTACK BONUS (BA): added to the d20 to attack.
ARMOR CLASS (CA): difficulty to be hit. 10 + DES + armor.
TESTS: roll 1d20. For attributes, roll LESS than or EQUAL to the score. For attacks, beat the AC.
";
