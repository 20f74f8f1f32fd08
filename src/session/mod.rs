//! Game sessions and users
//!
//! - `GameSession`: a table that players join by invite code
//! - `User`: a logged-in person, created on first login
//! - Invite code generation and lookup
//!
//! The per-client application state lives in [`controller`], the periodic
//! refresh task in [`sync`].

pub mod controller;
pub mod sync;

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use controller::{Role, TableController, TableError, TableState};
pub use sync::SyncHandle;

/// Default length of generated invite codes
pub const DEFAULT_INVITE_CODE_LENGTH: usize = 6;

const INVITE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Attempts before giving up on finding an unused invite code
const MAX_INVITE_ATTEMPTS: usize = 64;

static INVITE_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{4,16}$").unwrap());

/// A game session (table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub system_id: String,
    #[serde(default)]
    pub gm_id: String,
    #[serde(default)]
    pub gm_name: String,
    #[serde(default)]
    pub player_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_session: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    /// Unique join key, upper-case
    #[serde(default)]
    pub invite_code: String,
}

impl GameSession {
    /// Create a new session run by `gm`
    pub fn new(name: &str, system_id: &str, gm: &User, invite_code: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            system_id: system_id.to_string(),
            gm_id: gm.id.clone(),
            gm_name: gm.username.clone(),
            player_count: 0,
            next_session: None,
            description: String::new(),
            banner_url: None,
            invite_code,
        }
    }

    pub fn is_game_master(&self, user: &User) -> bool {
        self.gm_id == user.id
    }
}

/// A user account. No credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
}

impl User {
    /// Create a user with a generated id and initials avatar
    pub fn new(username: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: None,
            avatar_url: default_avatar_url(username),
        }
    }
}

/// Initials avatar for a username
pub fn default_avatar_url(username: &str) -> String {
    let name: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '+' })
        .collect();
    format!(
        "https://ui-avatars.com/api/?name={}&background=059669&color=fff",
        name
    )
}

/// Canonical form of a user-typed invite code
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Check that a (normalized) code has the invite code shape
pub fn is_valid_invite_code(code: &str) -> bool {
    INVITE_CODE_REGEX.is_match(code)
}

/// Generate a random invite code from `A-Z0-9`
pub fn generate_invite_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

/// Generate a code that `taken` reports as unused
pub fn unique_invite_code<R, F>(rng: &mut R, length: usize, taken: F) -> Option<String>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    (0..MAX_INVITE_ATTEMPTS)
        .map(|_| generate_invite_code(rng, length))
        .find(|code| !taken(code))
}

/// Find a session by invite code, ignoring case and surrounding whitespace
pub fn find_by_invite_code<'a>(sessions: &'a [GameSession], code: &str) -> Option<&'a GameSession> {
    let code = normalize_invite_code(code);
    sessions
        .iter()
        .find(|s| s.invite_code.eq_ignore_ascii_case(&code))
}

/// Sessions available on a fresh install
pub fn reference_sessions() -> Vec<GameSession> {
    vec![
        GameSession {
            id: "1".to_string(),
            name: "A Tumba do Rei Esqueleto".to_string(),
            system_id: "od2".to_string(),
            gm_id: "gm1".to_string(),
            gm_name: "Mestre Ancião".to_string(),
            player_count: 4,
            next_session: Some("Hoje, 20:00".to_string()),
            description: "A classic dungeon full of dangers and ancient treasure.".to_string(),
            banner_url: Some("https://picsum.photos/id/1036/400/200".to_string()),
            invite_code: "SKEL123".to_string(),
        },
        GameSession {
            id: "2".to_string(),
            name: "Coração de Rubi".to_string(),
            system_id: "t20".to_string(),
            gm_id: "gm2".to_string(),
            gm_name: "Lady Dice".to_string(),
            player_count: 5,
            next_session: Some("Sábado, 19:00".to_string()),
            description: "The epic journey to save Arton from the Tormenta.".to_string(),
            banner_url: Some("https://picsum.photos/id/1040/400/200".to_string()),
            invite_code: "RUBI456".to_string(),
        },
    ]
}
