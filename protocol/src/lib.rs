//! The wire message shape shared between the server and any client.
//!
//! A single flat JSON object (`Envelope`) carries every message kind over the
//! websocket channel, discriminated by its `type` field, mirroring how the
//! original relay's postcard messages use one small fixed header regardless
//! of payload: here the payload is JSON text and the "header" is a string.

use serde::{Deserialize, Serialize};

/// Server -> client message type strings.
pub mod server_msg {
    pub const CREATE_USER: &str = "createUser";
    pub const JOIN_CHAT: &str = "joinChat";
    pub const JOIN_LOBBY: &str = "joinLobby";
    pub const USER_JOINED_LOBBY: &str = "userJoinedLobby";
    pub const USER_LEFT_LOBBY: &str = "userLeftLobby";
    pub const USER_LEFT_GAME: &str = "userLeftGame";
    pub const LEAVE_LOBBY: &str = "leaveLobby";
    pub const LEAVE_GAME: &str = "leaveGame";
    pub const LOBBY_ERROR: &str = "lobbyError";
    pub const USER_TOGGLE_READY: &str = "userToggleReady";
    pub const START_GAME: &str = "startGame";
    pub const MOVE: &str = "move";
    pub const BOMB_PLACED: &str = "bombPlaced";
    pub const BOMB_EXPLODED: &str = "bombExploded";
    pub const UPDATE_GRID: &str = "updateGrid";
    pub const LOSE_LIFE: &str = "loseLife";
    pub const SHRINK_MAP: &str = "shrinkMap";
    pub const GAME_OVER: &str = "gameOver";
    pub const MESSAGE: &str = "message";
}

/// Client -> server message type strings.
pub mod client_msg {
    pub const AUTHENTICATE: &str = "authenticate";
    pub const SEND_MESSAGE: &str = "sendMessage";
    pub const JOIN_LOBBY: &str = "joinLobby";
    pub const CREATE_LOBBY: &str = "createLobby";
    pub const QUICK_PLAY: &str = "quickPlay";
    pub const USER_TOGGLE_READY: &str = "userToggleReady";
    pub const START_GAME: &str = "startGame";
    pub const LEAVE_LOBBY: &str = "leaveLobby";
    pub const LEAVE_GAME: &str = "leaveGame";
    pub const MOVE: &str = "move";
    pub const BOMB_PLACED: &str = "bombPlaced";
}

/// A grid tile coordinate as it appears on the wire (a tile index, never a pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

/// A pixel position as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: i32,
    pub y: i32,
}

/// `explosion_area` holds one run per cardinal direction, `[right, left,
/// down, up]`, each a contiguous sequence of tiles walked outward from the
/// bomb; the bomb's own tile is not included in any run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BombDto {
    pub position: TileCoord,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "explosionArea")]
    pub explosion_area: Vec<Vec<TileCoord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub color: String,
    pub position: PixelPosition,
    pub lives: u8,
    #[serde(rename = "readyState")]
    pub ready_state: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfoDto {
    #[serde(rename = "gameId")]
    pub game_id: String,
    pub status: String,
    pub players: Vec<UserDto>,
    /// Terrain grid with any revealed power-up icon overlaid on its tile.
    pub grid: Vec<Vec<u8>>,
}

/// The single flat wire message. Every field besides `msg_type` is optional;
/// which ones are populated depends on `msg_type`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "gameId", skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(rename = "readyState", skip_serializing_if = "Option::is_none")]
    pub ready_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bomb: Option<BombDto>,
    #[serde(rename = "powerUp", skip_serializing_if = "Option::is_none")]
    pub power_up: Option<u8>,
    #[serde(rename = "gameInfo", skip_serializing_if = "Option::is_none")]
    pub game_info: Option<GameInfoDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserDto>>,
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PixelPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Envelope {
    pub fn new(msg_type: impl Into<String>) -> Self {
        Envelope {
            msg_type: msg_type.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips_through_json() {
        let env = Envelope {
            msg_type: server_msg::MOVE.to_string(),
            user_id: Some("abc".to_string()),
            position: Some(PixelPosition { x: 10, y: 20 }),
            ..Default::default()
        };
        let text = serde_json::to_string(&env).expect("serialize");
        assert!(text.contains("\"type\":\"move\""));
        let back: Envelope = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back.user_id.as_deref(), Some("abc"));
        assert_eq!(back.position.map(|p| (p.x, p.y)), Some((10, 20)));
    }

    #[test]
    fn omitted_fields_are_absent_from_json() {
        let env = Envelope::new(client_msg::QUICK_PLAY);
        let text = serde_json::to_string(&env).expect("serialize");
        assert_eq!(text, "{\"type\":\"quickPlay\"}");
    }

    #[test]
    fn bomb_explosion_area_serializes_as_nested_runs() {
        let bomb = BombDto {
            position: TileCoord { x: 1, y: 1 },
            user_id: "abc".to_string(),
            explosion_area: vec![vec![TileCoord { x: 2, y: 1 }], vec![], vec![TileCoord { x: 1, y: 2 }], vec![]],
        };
        let text = serde_json::to_string(&bomb).expect("serialize");
        assert_eq!(
            text,
            "{\"position\":{\"x\":1,\"y\":1},\"userId\":\"abc\",\"explosionArea\":[[{\"x\":2,\"y\":1}],[],[{\"x\":1,\"y\":2}],[]]}"
        );
    }
}
