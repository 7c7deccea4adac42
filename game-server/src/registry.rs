//! Process-wide client and game directories.
//!
//! Each `RwLock` here only ever protects map *structure* (inserting or
//! removing a whole client or game). Field-level access to a game's grids,
//! players and counters always goes through that game's own
//! [`crate::game::GameState`] mutex, never through these locks — see the
//! concurrency note in `SPEC_FULL.md` section 5 for why the original
//! implementation's mixed locking order is not repeated here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::game::Game;
use crate::ids::{GameId, UserId};
use crate::player::SendSink;

/// What the registry needs to know about a connected client outside of
/// whichever game currently owns their `Player` entity.
///
/// `username` lives here, not only on the per-game `Player`, because a
/// player's display name is set once by `authenticate` and must survive
/// every `leave_lobby` → `join_lobby` hop between games, each of which
/// constructs a brand new `Player` entity in the target game.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub current_game: GameId,
    pub username: String,
    pub sink: SendSink,
}

#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<UserId, ClientHandle>>,
}

impl ClientRegistry {
    pub async fn add(&self, user_id: UserId, handle: ClientHandle) {
        self.clients.write().await.insert(user_id, handle);
    }

    pub async fn remove(&self, user_id: &UserId) {
        self.clients.write().await.remove(user_id);
    }

    pub async fn exists(&self, user_id: &UserId) -> bool {
        self.clients.read().await.contains_key(user_id)
    }

    pub async fn current_game(&self, user_id: &UserId) -> Option<GameId> {
        self.clients
            .read()
            .await
            .get(user_id)
            .map(|h| h.current_game.clone())
    }

    pub async fn set_current_game(&self, user_id: &UserId, game_id: GameId) {
        if let Some(handle) = self.clients.write().await.get_mut(user_id) {
            handle.current_game = game_id;
        }
    }

    pub async fn sink(&self, user_id: &UserId) -> Option<SendSink> {
        self.clients.read().await.get(user_id).map(|h| h.sink.clone())
    }

    pub async fn username(&self, user_id: &UserId) -> Option<String> {
        self.clients.read().await.get(user_id).map(|h| h.username.clone())
    }

    pub async fn set_username(&self, user_id: &UserId, username: String) {
        if let Some(handle) = self.clients.write().await.get_mut(user_id) {
            handle.username = username;
        }
    }
}

#[derive(Default)]
pub struct GameRegistry {
    games: RwLock<HashMap<GameId, Arc<Game>>>,
}

impl GameRegistry {
    pub async fn add(&self, game: Arc<Game>) {
        self.games.write().await.insert(game.id.clone(), game);
    }

    pub async fn remove(&self, game_id: &GameId) {
        self.games.write().await.remove(game_id);
    }

    pub async fn get(&self, game_id: &GameId) -> Option<Arc<Game>> {
        self.games.read().await.get(game_id).cloned()
    }

    pub async fn exists(&self, game_id: &GameId) -> bool {
        self.games.read().await.contains_key(game_id)
    }

    pub async fn all(&self) -> Vec<Arc<Game>> {
        self.games.read().await.values().cloned().collect()
    }
}

/// Shared application state handed into every axum handler.
#[derive(Default)]
pub struct AppState {
    pub clients: ClientRegistry,
    pub games: GameRegistry,
}
