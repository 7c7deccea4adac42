//! Directional movement: validated position updates, wall-hugging slide on
//! a blocked step, and power-up/explosion pickup on the tiles a move enters.

use std::sync::Arc;

use protocol::{Envelope, PixelPosition, server_msg};

use crate::bomb::lose_life;
use crate::config::TILE_SIZE;
use crate::error::GameError;
use crate::game::Game;
use crate::grid::TileKind;
use crate::ids::UserId;
use crate::position::{AbsolutePosition, GridPosition};
use crate::registry::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl Direction {
    pub fn parse(s: &str) -> Result<Self, GameError> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "stop" => Ok(Direction::Stop),
            other => Err(GameError::UnknownDirection(other.to_string())),
        }
    }
}

fn step(pos: AbsolutePosition, dir: Direction, distance: i32) -> AbsolutePosition {
    match dir {
        Direction::Up => AbsolutePosition::new(pos.x, pos.y - distance),
        Direction::Down => AbsolutePosition::new(pos.x, pos.y + distance),
        Direction::Left => AbsolutePosition::new(pos.x - distance, pos.y),
        Direction::Right => AbsolutePosition::new(pos.x + distance, pos.y),
        Direction::Stop => pos,
    }
}

/// Pixel distance from the relevant edge of the character AABB at `pos` to
/// the tile boundary in `dir`: `up`/`left` measure from the top-left corner,
/// `down`/`right` from the far corner. `stop` has no edge to measure, so it
/// reports zero distance (never worth a retry).
fn distance_to_tile_edge(pos: AbsolutePosition, dir: Direction) -> i32 {
    let (top_left, bottom_right) = pos.aabb();
    match dir {
        Direction::Up => top_left.y.rem_euclid(TILE_SIZE),
        Direction::Left => top_left.x.rem_euclid(TILE_SIZE),
        Direction::Down => TILE_SIZE - bottom_right.y.rem_euclid(TILE_SIZE),
        Direction::Right => TILE_SIZE - bottom_right.x.rem_euclid(TILE_SIZE),
        Direction::Stop => 0,
    }
}

/// The 2x2 tile set centered on the tentative top-left's grid cell, kept
/// only where it actually overlaps the character AABB — the collider is
/// smaller than a tile, so off-axis motion along an edge is possible.
fn colliding_tiles(new_pos: AbsolutePosition) -> Vec<GridPosition> {
    let anchor = new_pos.to_grid();
    let mut tiles = Vec::with_capacity(4);
    for dy in 0..2 {
        for dx in 0..2 {
            let tile = anchor.offset(dx, dy);
            if tile.in_bounds() && new_pos.overlaps_tile(tile) {
                tiles.push(tile);
            }
        }
    }
    tiles
}

/// Resolves a `move` intent: tries the full step at the player's current
/// speed; on failure, retries at the exact remaining distance to the tile
/// edge if that distance is smaller than both the attempted step and a
/// whole tile (the wall-hugging slide). Always broadcasts the resulting
/// position, whether or not the player actually moved.
pub async fn move_player(state: &Arc<AppState>, game: &Arc<Game>, user_id: &UserId, dir: Direction) {
    let snapshot = {
        let s = game.state.lock().await;
        s.players
            .get(user_id)
            .filter(|p| p.is_alive())
            .map(|p| (p.powerups.speed as i32, p.position))
    };
    let Some((speed, current)) = snapshot else {
        return;
    };

    if !try_move(state, game, user_id, dir, speed).await {
        let distance = distance_to_tile_edge(current, dir);
        if distance > 0 && distance < speed && distance < TILE_SIZE {
            try_move(state, game, user_id, dir, distance).await;
        }
    }

    let position = {
        let s = game.state.lock().await;
        s.players.get(user_id).map(|p| p.position)
    };
    if let Some(position) = position {
        let mut env = Envelope::new(server_msg::MOVE);
        env.user_id = Some(user_id.clone());
        env.position = Some(PixelPosition { x: position.x, y: position.y });
        env.game_info = Some(game.snapshot().await);
        game.broadcast(env).await;
    }
}

/// Attempts to move `distance` pixels in `dir`; on success, commits the
/// position and applies any power-up pickup / explosion damage on the newly
/// colliding tiles. Returns whether the move succeeded.
async fn try_move(state: &Arc<AppState>, game: &Arc<Game>, user_id: &UserId, dir: Direction, distance: i32) -> bool {
    if dir == Direction::Stop {
        return true;
    }

    let explosion_hit = {
        let mut s = game.state.lock().await;
        let Some(player) = s.players.get(user_id) else {
            return false;
        };
        if !player.is_alive() {
            return false;
        }
        let tentative = step(player.position, dir, distance);
        let tiles = colliding_tiles(tentative);

        for tile in &tiles {
            if s.grid.get(*tile) != TileKind::Empty {
                return false;
            }
        }

        if let Some(player) = s.players.get_mut(user_id) {
            player.position = tentative;
        }

        let mut pickups = Vec::new();
        let mut explosion_hit = false;
        for tile in &tiles {
            let icon = s.active_powerups[tile.y as usize][tile.x as usize];
            if icon != 0 {
                s.active_powerups[tile.y as usize][tile.x as usize] = 0;
                pickups.push(icon);
            }
            if s.active_explosions[tile.y as usize][tile.x as usize] {
                explosion_hit = true;
            }
        }
        if let Some(player) = s.players.get_mut(user_id) {
            for icon in pickups {
                player.powerups.apply_icon(icon);
            }
        }
        explosion_hit
    };

    if explosion_hit {
        lose_life(state, game, user_id, 1).await;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_edge_matches_the_wall_hug_example() {
        // S2: player at (50, 50), CharacterSize=35 so the far corner is at
        // (85, 85); a wall occupies the tile spanning X=88..131. Moving
        // right should report 3px remaining to that tile's left edge.
        let pos = AbsolutePosition::new(50, 50);
        assert_eq!(distance_to_tile_edge(pos, Direction::Right), 3);
    }

    #[test]
    fn distance_to_edge_up_uses_top_left_corner() {
        let pos = AbsolutePosition::new(50, 50);
        assert_eq!(distance_to_tile_edge(pos, Direction::Up), 6);
    }
}
