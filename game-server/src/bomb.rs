//! Bomb placement, fuse timer, and the four-direction flame propagation that
//! fires when a bomb detonates.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use protocol::{BombDto, Envelope, TileCoord, server_msg};

use crate::config::{self, INVINCIBILITY_WINDOW};
use crate::game::Game;
use crate::grid::TileKind;
use crate::ids::UserId;
use crate::position::GridPosition;
use crate::powerup::PowerupKind;
use crate::registry::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cardinal {
    Right,
    Left,
    Down,
    Up,
}

const DIRECTIONS: [Cardinal; 4] = [Cardinal::Right, Cardinal::Left, Cardinal::Down, Cardinal::Up];

fn offset(dir: Cardinal) -> (i32, i32) {
    match dir {
        Cardinal::Right => (1, 0),
        Cardinal::Left => (-1, 0),
        Cardinal::Down => (0, 1),
        Cardinal::Up => (0, -1),
    }
}

/// Anchors a bomb at the tile under the placing player's center and decrements
/// their bomb count; silently refuses if they have none left. Schedules the
/// 3-second fuse that detonates it.
pub async fn place_bomb(state: &Arc<AppState>, game: &Arc<Game>, user_id: &UserId) {
    let bomb_tile = {
        let mut s = game.state.lock().await;
        let Some(player) = s.players.get_mut(user_id) else {
            return;
        };
        if !player.is_alive() || player.powerups.bombs == 0 {
            return;
        }
        player.powerups.bombs -= 1;
        player.position.center_tile()
    };

    let mut env = Envelope::new(server_msg::BOMB_PLACED);
    env.user_id = Some(user_id.clone());
    env.bomb = Some(BombDto {
        position: TileCoord { x: bomb_tile.x, y: bomb_tile.y },
        user_id: user_id.clone(),
        explosion_area: Vec::new(),
    });
    game.broadcast(env).await;

    let state = Arc::clone(state);
    let game = Arc::clone(game);
    let owner = user_id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(config::BOMB_FUSE).await;
        if !state.games.exists(&game.id).await {
            return;
        }
        if state.clients.exists(&owner).await {
            explode(&state, &game, &owner, bomb_tile).await;
        }
    });
}

/// Walks outward from `origin` up to `flame` steps in one cardinal
/// direction, stopping at (and excluding) the first wall, including the
/// first barrel it meets and stopping right after.
async fn walk_direction(game: &Arc<Game>, origin: GridPosition, dir: Cardinal, flame: u32) -> Vec<GridPosition> {
    let (dx, dy) = offset(dir);
    let mut hits = Vec::new();
    let s = game.state.lock().await;
    for step in 1..=flame as i32 {
        let tile = origin.offset(dx * step, dy * step);
        if !tile.in_bounds() {
            break;
        }
        match s.grid.get(tile) {
            TileKind::Wall => break,
            TileKind::Barrel => {
                hits.push(tile);
                break;
            }
            TileKind::Empty => hits.push(tile),
        }
    }
    hits
}

/// Detonates the bomb `owner` placed at `bomb_tile`: computes the
/// four-direction footprint, converts any barrels hit (consuming
/// `BarrelContents` in encounter order), paints and later clears the flame,
/// damages every player standing in it, and refunds the owner's bomb count.
pub async fn explode(state: &Arc<AppState>, game: &Arc<Game>, owner: &UserId, bomb_tile: GridPosition) {
    if !state.games.exists(&game.id).await {
        return;
    }

    let flame = {
        let s = game.state.lock().await;
        s.players.get(owner).map(|p| p.powerups.flame).unwrap_or(1)
    };

    // The four walks only read the grid, so they can run concurrently; the
    // mutation that follows (barrel conversion, `barrels_broken`) happens
    // under a single lock acquisition afterward so the counter advances
    // atomically across all four directions.
    let walks = join_all(DIRECTIONS.iter().map(|dir| walk_direction(game, bomb_tile, *dir, flame))).await;

    let mut footprint = vec![bomb_tile];
    for hits in &walks {
        footprint.extend(hits.iter().copied());
    }

    let mut revealed = Vec::new();
    {
        let mut s = game.state.lock().await;
        for hits in &walks {
            for tile in hits {
                if s.grid.get(*tile) == TileKind::Barrel {
                    let kind = s.barrel_contents.get(s.barrels_broken).copied().unwrap_or(PowerupKind::Nothing);
                    s.barrels_broken += 1;
                    if kind != PowerupKind::Nothing {
                        s.active_powerups[tile.y as usize][tile.x as usize] = kind.icon();
                    }
                    revealed.push(*tile);
                }
            }
        }
        for tile in &footprint {
            s.active_explosions[tile.y as usize][tile.x as usize] = true;
        }
    }

    for tile in revealed {
        let state = Arc::clone(state);
        let game = Arc::clone(game);
        tokio::spawn(async move {
            tokio::time::sleep(config::BARREL_CLEAR_DELAY).await;
            if !state.games.exists(&game.id).await {
                return;
            }
            let mut s = game.state.lock().await;
            s.grid.set(tile, TileKind::Empty);
        });
    }

    {
        let state = Arc::clone(state);
        let game = Arc::clone(game);
        let footprint = footprint.clone();
        tokio::spawn(async move {
            tokio::time::sleep(config::EXPLOSION_RESIDENCY).await;
            if !state.games.exists(&game.id).await {
                return;
            }
            let mut s = game.state.lock().await;
            for tile in &footprint {
                s.active_explosions[tile.y as usize][tile.x as usize] = false;
            }
        });
    }

    let hit_users: Vec<UserId> = {
        let s = game.state.lock().await;
        s.players
            .values()
            .filter(|p| p.is_alive() && footprint.iter().any(|t| p.position.overlaps_tile(*t)))
            .map(|p| p.user_id.clone())
            .collect()
    };
    for user_id in hit_users {
        lose_life(state, game, &user_id, 1).await;
    }

    {
        let mut s = game.state.lock().await;
        if let Some(player) = s.players.get_mut(owner) {
            player.powerups.bombs += 1;
        }
    }

    let mut env = Envelope::new(server_msg::BOMB_EXPLODED);
    env.bomb = Some(BombDto {
        position: TileCoord { x: bomb_tile.x, y: bomb_tile.y },
        user_id: owner.clone(),
        explosion_area: walks
            .iter()
            .map(|run| run.iter().map(|t| TileCoord { x: t.x, y: t.y }).collect())
            .collect(),
    });
    game.broadcast(env).await;

    let state = Arc::clone(state);
    let game = Arc::clone(game);
    tokio::spawn(async move {
        tokio::time::sleep(config::GRID_UPDATE_DELAY).await;
        if !state.games.exists(&game.id).await {
            return;
        }
        let mut env = Envelope::new(server_msg::UPDATE_GRID);
        env.game_info = Some(game.snapshot().await);
        game.broadcast(env).await;
    });
}

/// Applies `amount` damage to `user_id` unless they're within their
/// invincibility window, in which case the hit is ignored entirely. On a
/// successful hit, arms a fresh 3s window, broadcasts `loseLife`, and ends
/// the game if only one player remains alive.
pub async fn lose_life(state: &Arc<AppState>, game: &Arc<Game>, user_id: &UserId, amount: u8) {
    let now = Instant::now();
    let outcome = {
        let mut s = game.state.lock().await;
        let Some(player) = s.players.get_mut(user_id) else {
            return;
        };
        if player.is_invincible(now) {
            None
        } else {
            player.invincible_until = now + INVINCIBILITY_WINDOW;
            player.lives = player.lives.saturating_sub(amount);
            Some(s.alive_players().len())
        }
    };
    let Some(alive_count) = outcome else {
        return;
    };

    let mut env = Envelope::new(server_msg::LOSE_LIFE);
    env.user_id = Some(user_id.clone());
    env.game_info = Some(game.snapshot().await);
    game.broadcast(env).await;

    if alive_count <= 1 {
        crate::game::game_over(state, &game.id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_the_four_cardinals() {
        assert_eq!(offset(Cardinal::Right), (1, 0));
        assert_eq!(offset(Cardinal::Left), (-1, 0));
        assert_eq!(offset(Cardinal::Down), (0, 1));
        assert_eq!(offset(Cardinal::Up), (0, -1));
    }
}
