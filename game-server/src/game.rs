//! Game state, lobby lifecycle, and the snapshot that goes out over the wire.
//!
//! A player belongs to exactly one game at a time: every connection starts
//! in the permanent `"global"` chat lobby and moves into a real match on
//! join, always leaving its previous game first.

use std::sync::Arc;

use tokio::sync::Mutex;

use protocol::{Envelope, GameInfoDto, PixelPosition, UserDto, server_msg};

use crate::config::{self, GLOBAL_GAME_ID, MAX_PLAYERS};
use crate::grid::Grid;
use crate::ids::{self, GameId, UserId};
use crate::player::{Player, pick_color};
use crate::powerup::random_barrel_contents;
use crate::registry::{AppState, ClientHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InLobby,
    InGame,
    GameEnded,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::InLobby => "InLobby",
            Status::InGame => "InGame",
            Status::GameEnded => "GameEnded",
        }
    }
}

pub struct GameState {
    pub status: Status,
    pub grid: Grid,
    pub active_powerups: Vec<Vec<u8>>,
    pub active_explosions: Vec<Vec<bool>>,
    pub barrel_contents: Vec<crate::powerup::PowerupKind>,
    pub barrels_broken: usize,
    /// Join order, used to assign spawn corners in `start_game`.
    pub join_order: Vec<UserId>,
    pub players: std::collections::HashMap<UserId, Player>,
}

impl GameState {
    fn new() -> Self {
        let grid = Grid::generate();
        let barrel_contents = random_barrel_contents(grid.barrel_count());
        let active_powerups = vec![vec![0u8; grid.width as usize]; grid.height as usize];
        let active_explosions = vec![vec![false; grid.width as usize]; grid.height as usize];
        GameState {
            status: Status::InLobby,
            grid,
            active_powerups,
            active_explosions,
            barrel_contents,
            barrels_broken: 0,
            join_order: Vec::new(),
            players: std::collections::HashMap::new(),
        }
    }

    pub fn alive_players(&self) -> Vec<&Player> {
        self.players.values().filter(|p| p.is_alive()).collect()
    }
}

pub struct Game {
    pub id: GameId,
    pub state: Mutex<GameState>,
}

impl Game {
    pub fn new(id: GameId) -> Arc<Game> {
        Arc::new(Game {
            id,
            state: Mutex::new(GameState::new()),
        })
    }

    pub fn is_global(&self) -> bool {
        self.id == GLOBAL_GAME_ID
    }

    /// Snapshot for the wire: terrain grid with any revealed power-up icon
    /// overlaid, current status, and the player list. `ActiveExplosions` is
    /// deliberately left off; clients animate explosions from `bombExploded`.
    pub async fn snapshot(&self) -> GameInfoDto {
        let state = self.state.lock().await;
        let mut grid = state.grid.to_wire();
        for (y, row) in state.active_powerups.iter().enumerate() {
            for (x, icon) in row.iter().enumerate() {
                if *icon != 0 {
                    grid[y][x] = *icon;
                }
            }
        }
        let players = state.players.values().map(user_dto).collect();
        GameInfoDto {
            game_id: self.id.clone(),
            status: state.status.as_str().to_string(),
            players,
            grid,
        }
    }

    pub async fn broadcast(&self, envelope: Envelope) {
        let state = self.state.lock().await;
        for player in state.players.values() {
            player.send(envelope.clone());
        }
    }

    pub async fn broadcast_except(&self, exclude: &UserId, envelope: Envelope) {
        let state = self.state.lock().await;
        for player in state.players.values() {
            if &player.user_id != exclude {
                player.send(envelope.clone());
            }
        }
    }

    pub async fn send_to(&self, user_id: &UserId, envelope: Envelope) {
        let state = self.state.lock().await;
        if let Some(player) = state.players.get(user_id) {
            player.send(envelope);
        }
    }

    async fn users_dto(&self) -> Vec<UserDto> {
        let state = self.state.lock().await;
        state.players.values().map(user_dto).collect()
    }
}

fn user_dto(p: &Player) -> UserDto {
    UserDto {
        user_id: p.user_id.clone(),
        username: p.username.clone(),
        color: p.color.clone(),
        position: PixelPosition { x: p.position.x, y: p.position.y },
        lives: p.lives,
        ready_state: p.ready,
    }
}

/// A `"%Y-%m-%d %H:%M:%S"` timestamp for chat and game-event dates.
pub(crate) fn now_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The moment the current match's timer is due to expire, formatted the same
/// way as `now_string`, for clients that want a countdown deadline.
fn match_end_timestamp() -> String {
    let end = chrono::Utc::now()
        + chrono::Duration::from_std(config::MATCH_DURATION).unwrap_or_else(|_| chrono::Duration::zero());
    end.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Creates a new lobby, moves `user_id` out of whatever game it is currently
/// in and into the fresh one.
pub async fn create_lobby(state: &Arc<AppState>, user_id: &UserId) {
    let mut game_id = ids::new_game_id();
    while state.games.exists(&game_id).await {
        game_id = ids::new_game_id();
    }
    let game = Game::new(game_id.clone());
    state.games.add(game).await;

    leave_lobby(state, user_id).await;
    join_lobby(state, user_id, &game_id).await;
}

/// Joins the first non-global, non-full, non-in-game lobby; creates a new
/// one if every existing lobby is full, in-game, or only `"global"` exists.
pub async fn quick_play(state: &Arc<AppState>, user_id: &UserId) {
    let games = state.games.all().await;
    if games.len() == 1 {
        create_lobby(state, user_id).await;
        return;
    }

    for game in games {
        if game.is_global() {
            continue;
        }
        let fits = {
            let s = game.state.lock().await;
            s.players.len() < MAX_PLAYERS && s.status != Status::InGame
        };
        if fits {
            leave_lobby(state, user_id).await;
            join_lobby(state, user_id, &game.id).await;
            return;
        }
    }

    create_lobby(state, user_id).await;
}

/// Adds `user_id` to `game_id`. Returns early (after emitting `lobbyError`)
/// if the lobby is full or already in-game, rather than falling through and
/// adding the player anyway, which the original implementation failed to do.
pub async fn join_lobby(state: &Arc<AppState>, user_id: &UserId, game_id: &GameId) {
    let Some(game) = state.games.get(game_id).await else {
        return;
    };
    let Some(sink) = state.clients.sink(user_id).await else {
        return;
    };

    let full_or_in_game = {
        let s = game.state.lock().await;
        (s.players.len() >= MAX_PLAYERS && !game.is_global()) || s.status == Status::InGame
    };
    if full_or_in_game {
        let mut err = Envelope::new(server_msg::LOBBY_ERROR);
        err.message = Some("Lobby is full or already in game!".to_string());
        let _ = sink.send(err);
        return;
    }

    let color_taken: Vec<String> = {
        let s = game.state.lock().await;
        s.players.values().map(|p| p.color.clone()).collect()
    };
    let color = pick_color(&color_taken);

    // The display name set by `authenticate` lives on the `ClientHandle` in
    // the client registry, not on the `Player` entity being replaced here —
    // `leave_lobby` always runs before `join_lobby` and removes the old
    // `Player` (and its `username` field) from its previous game first, so
    // reading the name back from that game would just see `None`. Color is
    // always repicked against the new game's taken set rather than carried
    // over, since the old color may collide.
    let username_for_msg = state.clients.username(user_id).await.unwrap_or_default();

    let mut player = Player::new(user_id.clone(), sink);
    player.color = color.clone();
    player.username = username_for_msg.clone();
    player.ready = false;
    player.lives = config::DEFAULT_LIVES;

    {
        let mut s = game.state.lock().await;
        s.join_order.push(user_id.clone());
        s.players.insert(user_id.clone(), player);
    }
    state.clients.set_current_game(user_id, game_id.clone()).await;

    let chat_name = if game.is_global() { "global" } else { "lobby" };

    let mut joined = Envelope::new(server_msg::JOIN_CHAT);
    joined.username = Some(username_for_msg.clone());
    joined.color = Some(color.clone());
    joined.message = Some(format!("Joined {chat_name} chat"));
    joined.date = Some(now_string());
    game.send_to(user_id, joined).await;

    if game.is_global() {
        return;
    }

    let users = game.users_dto().await;

    let mut to_others = Envelope::new(server_msg::USER_JOINED_LOBBY);
    to_others.username = Some(username_for_msg.clone());
    to_others.user_id = Some(user_id.clone());
    to_others.game_id = Some(game_id.clone());
    to_others.message = Some(format!("{username_for_msg} joined the lobby"));
    to_others.color = Some(color.clone());
    to_others.users = Some(users.clone());
    game.broadcast_except(user_id, to_others).await;

    let mut to_joiner = Envelope::new(server_msg::JOIN_LOBBY);
    to_joiner.username = Some(username_for_msg);
    to_joiner.game_id = Some(game_id.clone());
    to_joiner.color = Some(color);
    to_joiner.user_id = Some(user_id.clone());
    to_joiner.users = Some(users);
    to_joiner.game_info = Some(game.snapshot().await);
    game.send_to(user_id, to_joiner).await;
}

/// Removes `user_id` from its current game, acknowledging the departure to
/// `user_id` itself with `leaveLobby`/`leaveGame`, deleting the game if it is
/// now empty (unless it is `"global"`, which is permanent), and otherwise
/// announcing the departure to the rest of the game and re-checking
/// ready/win-by-default state.
pub async fn leave_lobby(state: &Arc<AppState>, user_id: &UserId) {
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };

    let (username, color, now_empty, status) = {
        let mut s = game.state.lock().await;
        let removed = s.players.remove(user_id);
        s.join_order.retain(|u| u != user_id);
        let (username, color) = removed.map(|p| (p.username, p.color)).unwrap_or_default();
        (username, color, s.players.is_empty(), s.status)
    };

    if game.is_global() {
        return;
    }

    let left_type = if status == Status::InGame {
        server_msg::USER_LEFT_GAME
    } else {
        server_msg::USER_LEFT_LOBBY
    };
    let leave_type = if status == Status::InGame {
        server_msg::LEAVE_GAME
    } else {
        server_msg::LEAVE_LOBBY
    };
    if let Some(sink) = state.clients.sink(user_id).await {
        let mut left_ack = Envelope::new(leave_type);
        left_ack.game_id = Some(game_id.clone());
        left_ack.date = Some(now_string());
        let _ = sink.send(left_ack);
    }

    if now_empty {
        state.games.remove(&game_id).await;
        return;
    }

    let users = game.users_dto().await;
    let mut left = Envelope::new(left_type);
    left.user_id = Some(user_id.clone());
    left.message = Some(format!("{username} left the chat"));
    left.username = Some(username.clone());
    left.game_id = Some(game_id.clone());
    left.date = Some(now_string());
    left.color = Some(color);
    left.users = Some(users);
    game.broadcast(left).await;

    announce_ready_state(&game).await;

    if status == Status::InGame {
        let alive = { game.state.lock().await.alive_players().len() };
        if alive == 1 {
            game_over(state, &game_id).await;
        }
    }
}

/// Flips `user_id`'s ready flag and re-broadcasts the aggregate message.
pub async fn toggle_user_ready(state: &Arc<AppState>, user_id: &UserId) {
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };
    {
        let mut s = game.state.lock().await;
        if let Some(p) = s.players.get_mut(user_id) {
            p.ready = !p.ready;
        }
    }
    announce_ready_state(&game).await;
}

/// Recomputes the aggregate "ready to play" message and broadcasts one
/// `userToggleReady` envelope per current game member, so every client's own
/// `readyState` line stays accurate without a second round trip.
async fn announce_ready_state(game: &Arc<Game>) {
    let (message, members) = {
        let s = game.state.lock().await;
        let message = if s.players.len() == 1 {
            "You need one more player to start the game!".to_string()
        } else if s.players.values().all(|p| p.ready) {
            "All players are ready to play".to_string()
        } else {
            "All players must be ready to play".to_string()
        };
        let members: Vec<(UserId, String, String, bool)> = s
            .players
            .values()
            .map(|p| (p.user_id.clone(), p.username.clone(), p.color.clone(), p.ready))
            .collect();
        (message, members)
    };

    for (user_id, username, color, ready) in members {
        let mut env = Envelope::new(server_msg::USER_TOGGLE_READY);
        env.username = Some(username);
        env.game_id = Some(game.id.clone());
        env.user_id = Some(user_id);
        env.ready_state = Some(ready);
        env.message = Some(message.clone());
        env.color = Some(color);
        game.broadcast(env).await;
    }
}

/// Transitions a lobby into `InGame`, assigns spawn positions, and arms the
/// match timer. A no-op if the game is already running.
pub async fn start_game(state: &Arc<AppState>, user_id: &UserId) {
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };
    if game.is_global() {
        return;
    }

    {
        let mut s = game.state.lock().await;
        if s.status == Status::InGame {
            return;
        }
        s.status = Status::InGame;
        assign_spawn_positions(&mut s);
    }

    let mut env = Envelope::new(server_msg::START_GAME);
    env.game_info = Some(game.snapshot().await);
    env.date = Some(match_end_timestamp());
    game.broadcast(env).await;

    crate::shrink::arm_match_timer(Arc::clone(state), Arc::clone(&game));
}

fn assign_spawn_positions(state: &mut GameState) {
    const PADDING: i32 = 6;
    let tile_size = config::TILE_SIZE;
    let width = state.grid.width;
    let height = state.grid.height;
    for (index, user_id) in state.join_order.clone().iter().enumerate() {
        let mut x = tile_size + PADDING;
        let mut y = tile_size + PADDING;
        match index {
            1 => {
                x += (width - 3) * tile_size;
                y += (height - 3) * tile_size;
            }
            2 => {
                y += (height - 3) * tile_size;
            }
            3 => {
                x += (width - 3) * tile_size;
            }
            _ => {}
        }
        if let Some(p) = state.players.get_mut(user_id) {
            p.position = crate::position::AbsolutePosition::new(x, y);
        }
    }
}

/// Idempotently ends the game, announces the winner(s), and schedules
/// rollover into a fresh lobby after a delay.
pub async fn game_over(state: &Arc<AppState>, game_id: &GameId) {
    let Some(game) = state.games.get(game_id).await else {
        return;
    };

    let already_ended = {
        let mut s = game.state.lock().await;
        if s.status == Status::GameEnded {
            true
        } else {
            s.status = Status::GameEnded;
            false
        }
    };
    if already_ended {
        return;
    }

    let alive: Vec<UserDto> = {
        let s = game.state.lock().await;
        s.alive_players().into_iter().map(user_dto).collect()
    };

    if alive.is_empty() {
        tracing::error!(game_id = %game_id, "game over with no alive players left");
        return;
    }
    let result = if alive.len() > 1 { "tie" } else { "win" };

    let mut env = Envelope::new(server_msg::GAME_OVER);
    env.result = Some(result.to_string());
    env.users = Some(alive);
    env.game_info = Some(game.snapshot().await);
    game.broadcast(env).await;

    let state = Arc::clone(state);
    let game_id = game_id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(config::ROLLOVER_DELAY).await;
        if !state.games.exists(&game_id).await {
            return;
        }

        let mut new_id = ids::new_game_id();
        while state.games.exists(&new_id).await {
            new_id = ids::new_game_id();
        }
        let new_game = Game::new(new_id.clone());
        state.games.add(new_game).await;

        let Some(old_game) = state.games.get(&game_id).await else {
            return;
        };
        let members: Vec<UserId> = {
            let s = old_game.state.lock().await;
            s.players.keys().cloned().collect()
        };
        for member in members {
            leave_lobby(&state, &member).await;
            state.clients.set_current_game(&member, GLOBAL_GAME_ID.to_string()).await;
            join_lobby(&state, &member, &new_id).await;
        }
    });
}

/// Registers a freshly connected user in `"global"`.
pub async fn register_new_connection(state: &Arc<AppState>, user_id: UserId, sink: crate::player::SendSink) {
    state
        .clients
        .add(
            user_id.clone(),
            ClientHandle {
                current_game: GLOBAL_GAME_ID.to_string(),
                username: String::new(),
                sink,
            },
        )
        .await;
    join_lobby(state, &user_id, &GLOBAL_GAME_ID.to_string()).await;
}

/// Full disconnect cleanup: leave the current game, fall back to leaving
/// `"global"` too (harmless no-op if the player had already left it), and
/// drop the client record.
pub async fn disconnect(state: &Arc<AppState>, user_id: &UserId) {
    leave_lobby(state, user_id).await;
    state.clients.set_current_game(user_id, GLOBAL_GAME_ID.to_string()).await;
    leave_lobby(state, user_id).await;
    state.clients.remove(user_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign_positions_for(n: usize) -> Vec<(i32, i32)> {
        let mut state = GameState::new();
        let mut positions = Vec::new();
        for i in 0..n {
            let uid = format!("u{i}");
            let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
            state.players.insert(uid.clone(), Player::new(uid.clone(), tx));
            state.join_order.push(uid);
        }
        assign_spawn_positions(&mut state);
        for i in 0..n {
            let p = &state.players[&format!("u{i}")];
            positions.push((p.position.x, p.position.y));
        }
        positions
    }

    #[test]
    fn spawn_positions_land_in_distinct_corners() {
        let positions = assign_positions_for(4);
        let mut unique = positions.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }
}
