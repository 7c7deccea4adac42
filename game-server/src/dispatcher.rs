//! The single switch over incoming message kinds: one async function per
//! client intent, invoked on behalf of whichever connection sent it.

use std::sync::Arc;

use protocol::{Envelope, client_msg, server_msg};

use crate::bomb;
use crate::config::GLOBAL_GAME_ID;
use crate::game;
use crate::ids::UserId;
use crate::movement::{self, Direction};
use crate::registry::AppState;

/// Parses and routes one inbound envelope on behalf of `user_id`. Unknown
/// types are logged and dropped; nothing here ever terminates the
/// connection — that's reserved for transport errors in the caller.
pub async fn dispatch(state: &Arc<AppState>, user_id: &UserId, envelope: Envelope) {
    match envelope.msg_type.as_str() {
        client_msg::AUTHENTICATE => authenticate(state, user_id, envelope).await,
        client_msg::SEND_MESSAGE => send_message(state, user_id, envelope).await,
        client_msg::JOIN_LOBBY => join_lobby(state, user_id, envelope).await,
        client_msg::CREATE_LOBBY => game::create_lobby(state, user_id).await,
        client_msg::QUICK_PLAY => game::quick_play(state, user_id).await,
        client_msg::USER_TOGGLE_READY => game::toggle_user_ready(state, user_id).await,
        client_msg::START_GAME => game::start_game(state, user_id).await,
        client_msg::LEAVE_LOBBY | client_msg::LEAVE_GAME => leave_and_rejoin_global(state, user_id).await,
        client_msg::MOVE => handle_move(state, user_id, envelope).await,
        client_msg::BOMB_PLACED => handle_bomb_placed(state, user_id).await,
        other => {
            tracing::debug!(msg_type = other, %user_id, "ignoring unknown intent type");
        }
    }
}

/// Sets the player's display name and color (on their current game, which
/// is `"global"` right after connecting) and replies with `createUser`.
///
/// The name is also stashed on the client registry's `ClientHandle`, since
/// every later `leave_lobby`/`join_lobby` hop replaces the per-game `Player`
/// entity this handler just updated — the registry copy is what survives.
async fn authenticate(state: &Arc<AppState>, user_id: &UserId, envelope: Envelope) {
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };

    let username = envelope.username.unwrap_or_default();
    let color = envelope.color;
    state.clients.set_username(user_id, username.clone()).await;
    {
        let mut s = game.state.lock().await;
        if let Some(player) = s.players.get_mut(user_id) {
            player.username = username.clone();
            if let Some(color) = color.clone() {
                player.color = color;
            }
        }
    }

    let mut reply = Envelope::new(server_msg::CREATE_USER);
    reply.user_id = Some(user_id.clone());
    reply.username = Some(username);
    reply.color = color;
    game.send_to(user_id, reply).await;
}

async fn send_message(state: &Arc<AppState>, user_id: &UserId, envelope: Envelope) {
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };
    let username = {
        let s = game.state.lock().await;
        s.players.get(user_id).map(|p| p.username.clone()).unwrap_or_default()
    };

    let mut msg = Envelope::new(server_msg::MESSAGE);
    msg.user_id = Some(user_id.clone());
    msg.username = Some(username);
    msg.message = envelope.message;
    msg.date = Some(game::now_string());
    game.broadcast(msg).await;
}

/// Verifies the target lobby exists (sending `lobbyError` and returning if
/// not), then leaves the current game and joins the target.
async fn join_lobby(state: &Arc<AppState>, user_id: &UserId, envelope: Envelope) {
    let Some(target) = envelope.game_id else {
        return;
    };
    if !state.games.exists(&target).await {
        if let Some(sink) = state.clients.sink(user_id).await {
            let mut err = Envelope::new(server_msg::LOBBY_ERROR);
            err.message = Some(format!("Lobby {target} does not exist"));
            let _ = sink.send(err);
        }
        return;
    }
    game::leave_lobby(state, user_id).await;
    game::join_lobby(state, user_id, &target).await;
}

async fn leave_and_rejoin_global(state: &Arc<AppState>, user_id: &UserId) {
    game::leave_lobby(state, user_id).await;
    state.clients.set_current_game(user_id, GLOBAL_GAME_ID.to_string()).await;
    game::join_lobby(state, user_id, &GLOBAL_GAME_ID.to_string()).await;
}

async fn handle_move(state: &Arc<AppState>, user_id: &UserId, envelope: Envelope) {
    let Some(direction_str) = envelope.direction else {
        return;
    };
    let direction = match Direction::parse(&direction_str) {
        Ok(direction) => direction,
        Err(error) => {
            tracing::debug!(%error, %user_id, "rejecting move intent");
            return;
        }
    };
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };
    movement::move_player(state, &game, user_id, direction).await;
}

async fn handle_bomb_placed(state: &Arc<AppState>, user_id: &UserId) {
    let Some(game_id) = state.clients.current_game(user_id).await else {
        return;
    };
    let Some(game) = state.games.get(&game_id).await else {
        return;
    };
    bomb::place_bomb(state, &game, user_id).await;
}
