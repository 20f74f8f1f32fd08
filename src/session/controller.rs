//! Table controller
//!
//! Owns the application state of one joined session: chat log, roster,
//! own character and the combat tracker. Every mutation goes through a
//! method here. Changes are applied to local state first, then persisted
//! through the store. Persistence failures are logged, never raised.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{GameSession, User};
use crate::character::{apply_adjustment, Character, InventoryItem, Item, StatKind};
use crate::chat::{ChatMessage, RollData, CHAT_HISTORY_LIMIT};
use crate::combat::dice::{self, quick_roll, FALLBACK_TOTAL};
use crate::combat::{CombatError, CombatTracker, Combatant};
use crate::oracle::Oracle;
use crate::rules;
use crate::store::GameStore;

/// Chat prefix that routes a question to the Oracle
pub const ORACLE_COMMAND: &str = "/oracle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    GameMaster,
    Player,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("only the game master can do that")]
    NotGameMaster,
    #[error("no character {0} at this table")]
    CharacterNotFound(String),
    #[error("unknown monster: {0}")]
    UnknownMonster(String),
    #[error("you have no character at this table")]
    NoCharacter,
    #[error("no attribute {0} on this sheet")]
    UnknownAttribute(String),
    #[error("no item {0} in the inventory")]
    UnknownItem(String),
    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// Everything one client knows about a table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    pub session: GameSession,
    pub viewer: User,
    pub role: Role,
    pub messages: Vec<ChatMessage>,
    /// Characters of the session (loaded for the game master)
    pub roster: Vec<Character>,
    /// The viewer's own character (players)
    pub character: Option<Character>,
    pub combat: CombatTracker,
}

impl TableState {
    /// Append, keeping the local view bounded like the stores
    fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > CHAT_HISTORY_LIMIT {
            let excess = self.messages.len() - CHAT_HISTORY_LIMIT;
            self.messages.drain(..excess);
        }
    }
}

pub struct TableController {
    store: Arc<dyn GameStore>,
    oracle: Arc<dyn Oracle>,
    state: RwLock<TableState>,
}

impl TableController {
    /// Join a session as `viewer`, loading chat and (for the GM) the roster
    pub async fn open(
        store: Arc<dyn GameStore>,
        oracle: Arc<dyn Oracle>,
        session: GameSession,
        viewer: User,
        character: Option<Character>,
    ) -> Arc<Self> {
        let role = if session.is_game_master(&viewer) {
            Role::GameMaster
        } else {
            Role::Player
        };
        info!(
            "{} joined {} as {:?}",
            viewer.username, session.name, role
        );

        let controller = Arc::new(Self {
            store,
            oracle,
            state: RwLock::new(TableState {
                session,
                viewer,
                role,
                messages: Vec::new(),
                roster: Vec::new(),
                character,
                combat: CombatTracker::new(),
            }),
        });

        controller.load_initial().await;
        controller
    }

    async fn load_initial(&self) {
        let (session, role) = {
            let state = self.state.read().await;
            (state.session.clone(), state.role)
        };

        match self.store.fetch_chat_history(&session.id).await {
            // Welcome only when the store confirms the chat is empty
            Ok(history) if history.is_empty() && role == Role::GameMaster => {
                let system_name = rules::system(&session.system_id)
                    .map_or(session.system_id.as_str(), |s| s.name);
                let welcome = ChatMessage::system(format!(
                    "Adventure started: {}\nSystem: {}",
                    session.name, system_name
                ));
                self.post(welcome).await;
            }
            Ok(history) => self.state.write().await.messages = history,
            Err(e) => warn!("Could not load chat for {}: {}", session.id, e),
        }

        if role == Role::GameMaster {
            self.reload_roster(&session.id).await;
        }
    }

    async fn reload_roster(&self, session_id: &str) {
        match self.store.fetch_characters(session_id).await {
            Ok(roster) => self.state.write().await.roster = roster,
            Err(e) => warn!("Could not load roster for {}: {}", session_id, e),
        }
    }

    /// Append locally, then persist
    async fn post(&self, message: ChatMessage) -> ChatMessage {
        let session_id = {
            let mut state = self.state.write().await;
            state.push_message(message.clone());
            state.session.id.clone()
        };
        if let Err(e) = self.store.append_chat_message(&session_id, &message).await {
            warn!("Could not persist message {}: {}", message.id, e);
        }
        message
    }

    async fn persist_character(&self, character: &Character) {
        if let Err(e) = self.store.save_character(character).await {
            warn!("Could not persist character {}: {}", character.id, e);
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> TableState {
        self.state.read().await.clone()
    }

    pub async fn role(&self) -> Role {
        self.state.read().await.role
    }

    async fn require_game_master(&self) -> Result<(), TableError> {
        match self.role().await {
            Role::GameMaster => Ok(()),
            Role::Player => Err(TableError::NotGameMaster),
        }
    }

    /// Replace chat (and the GM's roster) with the store's current view
    pub async fn refresh(&self) {
        let (session_id, role) = {
            let state = self.state.read().await;
            (state.session.id.clone(), state.role)
        };

        match self.store.fetch_chat_history(&session_id).await {
            Ok(history) => self.state.write().await.messages = history,
            Err(e) => warn!("Chat refresh failed for {}: {}", session_id, e),
        }

        if role == Role::GameMaster {
            self.reload_roster(&session_id).await;
        }
        debug!("Refreshed table {}", session_id);
    }

    /// Send a chat line. `/oracle <question>` also asks the Oracle.
    ///
    /// Returns the messages appended, empty for blank input.
    pub async fn send_message(&self, input: &str) -> Vec<ChatMessage> {
        if input.trim().is_empty() {
            return Vec::new();
        }

        let (text, question, context) = {
            let state = self.state.read().await;
            let is_gm = state.role == Role::GameMaster;
            let text = ChatMessage::text(&state.viewer.id, &state.viewer.username, input, is_gm);
            let question = input
                .strip_prefix(ORACLE_COMMAND)
                .map(|rest| rest.trim().to_string());
            (text, question, oracle_context(&state))
        };

        let mut sent = vec![self.post(text).await];

        if let Some(question) = question {
            let answer = self.oracle.ask(&question, &context).await;
            sent.push(self.post(ChatMessage::oracle(answer)).await);
        }
        sent
    }

    /// Quick roll: one die plus a modifier
    pub async fn roll(&self, sides: u32, modifier: i32) -> ChatMessage {
        let data = quick_roll(sides, modifier, &mut rand::rng());
        self.post_roll(data).await
    }

    /// Roll a free-form formula. Malformed formulas total 1.
    pub async fn roll_formula(&self, formula: &str) -> ChatMessage {
        let data = match dice::parse_formula(formula) {
            Ok(parsed) => {
                let outcome = parsed.roll_with(&mut rand::rng());
                RollData {
                    formula: parsed.to_string(),
                    results: outcome.results,
                    total: outcome.total,
                }
            }
            Err(e) => {
                debug!("Malformed formula {:?}: {}", formula, e);
                RollData {
                    formula: formula.trim().to_string(),
                    results: Vec::new(),
                    total: FALLBACK_TOTAL,
                }
            }
        };
        self.post_roll(data).await
    }

    async fn post_roll(&self, data: RollData) -> ChatMessage {
        let message = {
            let state = self.state.read().await;
            ChatMessage::roll(
                &state.viewer.id,
                &state.viewer.username,
                state.role == Role::GameMaster,
                data,
            )
        };
        self.post(message).await
    }

    /// Game master grants or removes hp, gold or xp
    pub async fn adjust_stat(
        &self,
        character_id: &str,
        stat: StatKind,
        delta: i32,
    ) -> Result<Option<ChatMessage>, TableError> {
        self.require_game_master().await?;

        let (updated, notice) = {
            let mut state = self.state.write().await;
            let character = state
                .roster
                .iter_mut()
                .find(|c| c.id == character_id)
                .ok_or_else(|| TableError::CharacterNotFound(character_id.to_string()))?;
            let notice = apply_adjustment(character, stat, delta);
            (character.clone(), notice)
        };

        let Some(notice) = notice else {
            return Ok(None);
        };
        self.persist_character(&updated).await;
        Ok(Some(self.post(notice).await))
    }

    /// Adopt a freshly created character as the viewer's own
    pub async fn set_character(&self, character: Character) {
        self.persist_character(&character).await;
        self.state.write().await.character = Some(character);
    }

    async fn edit_character<T>(
        &self,
        edit: impl FnOnce(&mut Character) -> Result<T, TableError>,
    ) -> Result<T, TableError> {
        let (result, updated) = {
            let mut state = self.state.write().await;
            let character = state.character.as_mut().ok_or(TableError::NoCharacter)?;
            let result = edit(character)?;
            (result, character.clone())
        };
        self.persist_character(&updated).await;
        Ok(result)
    }

    /// Set one of the viewer's attribute scores
    pub async fn set_attribute(&self, code: &str, value: i32) -> Result<(), TableError> {
        self.edit_character(|c| {
            if c.set_attribute(code, value) {
                Ok(())
            } else {
                Err(TableError::UnknownAttribute(code.to_string()))
            }
        })
        .await
    }

    /// Equip or unequip an inventory item, returning the new state
    pub async fn toggle_equipped(&self, instance_id: &str) -> Result<bool, TableError> {
        self.edit_character(|c| {
            c.toggle_equipped(instance_id)
                .ok_or_else(|| TableError::UnknownItem(instance_id.to_string()))
        })
        .await
    }

    /// Add a custom item to the viewer's inventory, returning its instance id
    pub async fn add_item(&self, item: Item) -> Result<String, TableError> {
        self.edit_character(|c| Ok(c.add_item(item))).await
    }

    pub async fn remove_item(&self, instance_id: &str) -> Result<InventoryItem, TableError> {
        self.edit_character(|c| {
            c.remove_item(instance_id)
                .ok_or_else(|| TableError::UnknownItem(instance_id.to_string()))
        })
        .await
    }

    /// Replace the viewer's backstory
    pub async fn set_history(&self, history: &str) -> Result<(), TableError> {
        self.edit_character(|c| {
            c.set_history(history);
            Ok(())
        })
        .await
    }

    pub async fn rename_character(&self, name: &str) -> Result<(), TableError> {
        let name = name.trim().to_string();
        self.edit_character(|c| {
            if !name.is_empty() {
                c.name = name;
            }
            Ok(())
        })
        .await
    }

    pub async fn start_combat(&self) -> Result<(), TableError> {
        self.require_game_master().await?;
        self.state.write().await.combat.start()?;
        Ok(())
    }

    pub async fn end_combat(&self) -> Result<(), TableError> {
        self.require_game_master().await?;
        self.state.write().await.combat.end()?;
        Ok(())
    }

    /// Add `count` monsters of a catalog template
    pub async fn add_monsters(&self, name: &str, count: u32) -> Result<Vec<Combatant>, TableError> {
        self.require_game_master().await?;
        let template =
            rules::monster(name).ok_or_else(|| TableError::UnknownMonster(name.to_string()))?;
        let mut state = self.state.write().await;
        let added = state
            .combat
            .add_monsters(&template, count, &mut rand::rng())?;
        Ok(added)
    }

    /// Put every roster character into the encounter
    pub async fn import_players(&self) -> Result<usize, TableError> {
        self.require_game_master().await?;
        let mut state = self.state.write().await;
        let roster = state.roster.clone();
        let added = state.combat.import_players(&roster, &mut rand::rng())?;
        Ok(added)
    }

    /// Advance the turn, announcing a new round in chat
    pub async fn next_turn(&self) -> Result<Option<u32>, TableError> {
        self.require_game_master().await?;
        let new_round = {
            let mut state = self.state.write().await;
            if !state.combat.is_active() {
                return Err(CombatError::NotActive.into());
            }
            state.combat.advance_turn()
        };
        if let Some(round) = new_round {
            self.post(ChatMessage::round_start(round)).await;
        }
        Ok(new_round)
    }

    pub async fn remove_combatant(&self, id: &str) -> Result<Option<Combatant>, TableError> {
        self.require_game_master().await?;
        Ok(self.state.write().await.combat.remove(id))
    }

    pub async fn adjust_combatant_hp(&self, id: &str, delta: i32) -> Result<Option<i32>, TableError> {
        self.require_game_master().await?;
        Ok(self.state.write().await.combat.adjust_hp(id, delta))
    }
}

/// Context string handed to the Oracle with every question
fn oracle_context(state: &TableState) -> String {
    let mut context = format!("Game master: {}. ", state.session.gm_name);
    match (state.role, &state.character) {
        (Role::GameMaster, _) => context.push_str("The user is the game master."),
        (Role::Player, Some(c)) => {
            context.push_str(&format!("Player character: {}, {} {}.", c.name, c.race, c.class))
        }
        (Role::Player, None) => {}
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::tests::sample_character;
    use crate::chat::{MessageType, COMBAT_SENDER};
    use crate::session::reference_sessions;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Oracle that records what it was asked
    #[derive(Default)]
    struct EchoOracle {
        asked: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Oracle for EchoOracle {
        async fn ask(&self, question: &str, context: &str) -> String {
            self.asked
                .lock()
                .unwrap()
                .push((question.to_string(), context.to_string()));
            format!("echo: {}", question)
        }
    }

    fn gm() -> User {
        User {
            id: "gm1".to_string(),
            username: "Mestre Ancião".to_string(),
            email: None,
            avatar_url: String::new(),
        }
    }

    fn player() -> User {
        User {
            id: "p1".to_string(),
            username: "aria_player".to_string(),
            email: None,
            avatar_url: String::new(),
        }
    }

    fn od2_character() -> Character {
        let mut c = sample_character(10, 13, 10);
        c.session_id = "1".to_string();
        c
    }

    async fn open_as(
        store: Arc<MemoryStore>,
        viewer: User,
        character: Option<Character>,
    ) -> (Arc<TableController>, Arc<EchoOracle>) {
        let oracle = Arc::new(EchoOracle::default());
        let session = reference_sessions()[0].clone();
        let table = TableController::open(store, oracle.clone(), session, viewer, character).await;
        (table, oracle)
    }

    #[tokio::test]
    async fn test_gm_open_posts_welcome_once() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store.clone(), gm(), None).await;

        let state = table.snapshot().await;
        assert_eq!(state.role, Role::GameMaster);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].kind, MessageType::System);
        assert!(state.messages[0].content.contains("A Tumba do Rei Esqueleto"));
        assert!(state.messages[0].content.contains("Old Dragon 2e"));

        let (again, _) = open_as(store.clone(), gm(), None).await;
        assert_eq!(again.snapshot().await.messages.len(), 1);
        assert_eq!(store.fetch_chat_history("1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_player_open_has_no_welcome() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store, player(), Some(od2_character())).await;
        let state = table.snapshot().await;
        assert_eq!(state.role, Role::Player);
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_ignored() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store, player(), None).await;
        assert!(table.send_message("   ").await.is_empty());
        assert!(table.snapshot().await.messages.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_command_from_player() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, oracle) = open_as(store.clone(), player(), Some(od2_character())).await;

        let sent = table.send_message("/oracle how does AC work?").await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, MessageType::Text);
        assert_eq!(sent[0].content, "/oracle how does AC work?");
        assert_eq!(sent[1].kind, MessageType::Ai);
        assert_eq!(sent[1].content, "echo: how does AC work?");

        let asked = oracle.asked.lock().unwrap().clone();
        assert_eq!(asked[0].0, "how does AC work?");
        assert_eq!(
            asked[0].1,
            "Game master: Mestre Ancião. Player character: Aria, Humano Guerreiro."
        );

        assert_eq!(store.fetch_chat_history("1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_oracle_context_for_gm() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, oracle) = open_as(store, gm(), None).await;
        table.send_message("/oracle name a tavern").await;
        let asked = oracle.asked.lock().unwrap().clone();
        assert!(asked[0].1.ends_with("The user is the game master."));
    }

    #[tokio::test]
    async fn test_rolls_post_roll_messages() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store, player(), None).await;

        let msg = table.roll(20, 3).await;
        assert_eq!(msg.kind, MessageType::Roll);
        let data = msg.roll_data.unwrap();
        assert_eq!(data.formula, "1d20+3");
        assert_eq!(data.total, data.results[0] as i32 + 3);

        let msg = table.roll_formula("2d6 + 1").await;
        let data = msg.roll_data.unwrap();
        assert_eq!(data.formula, "2d6+1");
        assert_eq!(data.results.len(), 2);

        let msg = table.roll_formula("banana").await;
        assert_eq!(msg.roll_data.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_gm_adjusts_roster_character() {
        let store = Arc::new(MemoryStore::seeded());
        store.save_character(&od2_character()).await.unwrap();
        let (table, _) = open_as(store.clone(), gm(), None).await;

        let notice = table
            .adjust_stat("char-1", StatKind::Gold, 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.content, "Aria gained 5 gold.");

        let saved = store.fetch_characters("1").await.unwrap();
        assert_eq!(saved[0].gold, 35);

        assert!(table.adjust_stat("char-1", StatKind::Hp, 0).await.unwrap().is_none());
        assert!(matches!(
            table.adjust_stat("ghost", StatKind::Hp, 1).await,
            Err(TableError::CharacterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_players_cannot_run_gm_actions() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store, player(), Some(od2_character())).await;
        assert!(matches!(
            table.adjust_stat("char-1", StatKind::Hp, -1).await,
            Err(TableError::NotGameMaster)
        ));
        assert!(matches!(table.start_combat().await, Err(TableError::NotGameMaster)));
        assert!(matches!(table.next_turn().await, Err(TableError::NotGameMaster)));
    }

    #[tokio::test]
    async fn test_player_sheet_edits_persist() {
        let store = Arc::new(MemoryStore::seeded());
        let mut character = od2_character();
        let item = crate::character::InventoryItem::new(crate::character::Item::new(
            "Escudo",
            10,
            crate::character::ItemKind::Armor { ac: 1 },
        ));
        let instance = item.instance_id.clone();
        character.equipment.push(item);
        let (table, _) = open_as(store.clone(), player(), Some(character)).await;

        table.set_attribute("FOR", 17).await.unwrap();
        assert!(table.toggle_equipped(&instance).await.unwrap());
        table.rename_character("Aria the Bold").await.unwrap();

        let saved = store.fetch_characters("1").await.unwrap();
        assert_eq!(saved[0].modifier("FOR"), 3);
        assert_eq!(saved[0].name, "Aria the Bold");
        assert_eq!(crate::character::armor_class(&saved[0]), 12);

        assert!(matches!(
            table.set_attribute("XYZ", 3).await,
            Err(TableError::UnknownAttribute(_))
        ));
    }

    #[tokio::test]
    async fn test_inventory_and_history_edits_persist() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store.clone(), player(), Some(od2_character())).await;

        let rope = table
            .add_item(Item::new("Corda de seda", 0, crate::character::ItemKind::Gear))
            .await
            .unwrap();
        let dagger = table
            .add_item(Item::new("Adaga", 0, crate::character::ItemKind::weapon("1d4")))
            .await
            .unwrap();
        table.set_history("Raised by wolves.").await.unwrap();

        let saved = store.fetch_characters("1").await.unwrap();
        assert_eq!(saved[0].equipment.len(), 2);
        assert_eq!(saved[0].history, "Raised by wolves.");

        let removed = table.remove_item(&rope).await.unwrap();
        assert_eq!(removed.item.name, "Corda de seda");
        let saved = store.fetch_characters("1").await.unwrap();
        assert_eq!(saved[0].equipment.len(), 1);
        assert_eq!(saved[0].equipment[0].instance_id, dagger);

        assert!(matches!(
            table.remove_item(&rope).await,
            Err(TableError::UnknownItem(_))
        ));
    }

    /// Store whose reads fail and whose appends are counted
    #[derive(Default)]
    struct ReadFailingStore {
        appended: Mutex<usize>,
    }

    #[async_trait]
    impl GameStore for ReadFailingStore {
        async fn fetch_games(&self) -> Result<Vec<GameSession>, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn save_game(&self, _: &GameSession) -> Result<(), StoreError> {
            Ok(())
        }
        async fn fetch_characters(&self, _: &str) -> Result<Vec<Character>, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn save_character(&self, _: &Character) -> Result<(), StoreError> {
            Ok(())
        }
        async fn fetch_chat_history(&self, _: &str) -> Result<Vec<ChatMessage>, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn append_chat_message(&self, _: &str, _: &ChatMessage) -> Result<(), StoreError> {
            *self.appended.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_gm_open_without_history_posts_no_welcome() {
        let store = Arc::new(ReadFailingStore::default());
        let table = TableController::open(
            store.clone(),
            Arc::new(EchoOracle::default()),
            reference_sessions()[0].clone(),
            gm(),
            None,
        )
        .await;

        assert_eq!(table.role().await, Role::GameMaster);
        assert!(table.snapshot().await.messages.is_empty());
        assert_eq!(*store.appended.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sheet_edit_without_character() {
        let store = Arc::new(MemoryStore::seeded());
        let (table, _) = open_as(store, player(), None).await;
        assert!(matches!(
            table.toggle_equipped("x").await,
            Err(TableError::NoCharacter)
        ));
    }

    #[tokio::test]
    async fn test_combat_flow_posts_round_messages() {
        let store = Arc::new(MemoryStore::seeded());
        store.save_character(&od2_character()).await.unwrap();
        let (table, _) = open_as(store.clone(), gm(), None).await;

        assert!(matches!(
            table.add_monsters("Goblin", 1).await,
            Err(TableError::Combat(CombatError::NotActive))
        ));

        table.start_combat().await.unwrap();
        assert_eq!(table.add_monsters("goblin", 2).await.unwrap().len(), 2);
        assert!(matches!(
            table.add_monsters("Beholder", 1).await,
            Err(TableError::UnknownMonster(_))
        ));
        assert_eq!(table.import_players().await.unwrap(), 1);
        assert_eq!(table.import_players().await.unwrap(), 0);

        assert_eq!(table.next_turn().await.unwrap(), None);
        assert_eq!(table.next_turn().await.unwrap(), None);
        assert_eq!(table.next_turn().await.unwrap(), Some(2));

        let state = table.snapshot().await;
        assert_eq!(state.combat.round(), 2);
        let last = state.messages.last().unwrap();
        assert_eq!(last.sender_name, COMBAT_SENDER);
        assert_eq!(last.content, "--- Round 2 begins ---");

        let first = state.combat.combatants()[0].id.clone();
        assert!(table.adjust_combatant_hp(&first, -100).await.unwrap() == Some(0));
        assert!(table.remove_combatant(&first).await.unwrap().is_some());
        assert_eq!(table.snapshot().await.combat.combatants().len(), 2);

        table.end_combat().await.unwrap();
        assert!(table.snapshot().await.combat.combatants().is_empty());
    }
}
