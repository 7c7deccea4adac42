//! The match timer: arms the outer-ring and inner-ring shrink schedules when
//! a game starts, and ends the match once the grid has fully closed.

use std::sync::Arc;

use protocol::{Envelope, server_msg};

use crate::bomb::lose_life;
use crate::config;
use crate::game::{self, Game};
use crate::grid::{TileKind, shrink_order};
use crate::position::GridPosition;
use crate::registry::AppState;

/// Number of tiles in one concentric ring of the shrink spiral, `circle`
/// rings in from the permanent boundary wall.
fn ring_len(circle: i32) -> usize {
    let right_len = (config::GRID_WIDTH - 2 * circle).max(0) as usize;
    let down_len = (config::GRID_HEIGHT - 2 * circle).max(0) as usize;
    let trimmed = down_len.saturating_sub(2);
    2 * right_len + 2 * trimmed
}

/// Splits the shrink spiral into the outermost two rings (closed during the
/// outer-shrink phase) and everything else (closed tile-by-tile during the
/// inner-shrink phase).
fn split_shrink_order() -> (Vec<GridPosition>, Vec<GridPosition>) {
    let order = shrink_order();
    let outer_len = (ring_len(1) + ring_len(2)).min(order.len());
    let mut order = order;
    let inner = order.split_off(outer_len);
    (order, inner)
}

/// Arms both shrink schedules as independent concurrent tasks. Both
/// re-check game liveness before every tile closure and exit cleanly once
/// the game is gone.
pub fn arm_match_timer(state: Arc<AppState>, game: Arc<Game>) {
    let (outer, inner) = split_shrink_order();

    {
        let state = Arc::clone(&state);
        let game = Arc::clone(&game);
        tokio::spawn(async move {
            tokio::time::sleep(config::OUTER_SHRINK_START).await;
            if outer.is_empty() {
                return;
            }
            let tick = config::OUTER_SHRINK_WINDOW / outer.len() as u32;
            for tile in outer {
                if !state.games.exists(&game.id).await {
                    return;
                }
                close_outer_tile(&state, &game, tile).await;
                tokio::time::sleep(tick).await;
            }
        });
    }

    {
        let state = Arc::clone(&state);
        let game = Arc::clone(&game);
        tokio::spawn(async move {
            let lead = config::INNER_SHRINK_TICK * inner.len() as u32;
            let delay = config::MATCH_DURATION.checked_sub(lead).unwrap_or_default();
            tokio::time::sleep(delay).await;
            for tile in inner {
                if !state.games.exists(&game.id).await {
                    return;
                }
                close_inner_tile(&game, tile).await;
                tokio::time::sleep(config::INNER_SHRINK_TICK).await;
            }
            if state.games.exists(&game.id).await {
                game::game_over(&state, &game.id).await;
            }
        });
    }
}

/// Converts a single tile to Wall and clears any revealed power-up sitting
/// on it, leaving `Grid`/`ActivePowerUps` consistent for the next snapshot.
fn wall_off(state: &mut crate::game::GameState, tile: GridPosition) {
    state.grid.set(tile, TileKind::Wall);
    state.active_powerups[tile.y as usize][tile.x as usize] = 0;
}

/// Closes one outer-ring tile and drains the lives of any player whose
/// collider still overlaps it — only the outer ring kills stragglers.
async fn close_outer_tile(state: &Arc<AppState>, game: &Arc<Game>, tile: GridPosition) {
    let hit_users = {
        let mut s = game.state.lock().await;
        wall_off(&mut s, tile);
        s.players
            .values()
            .filter(|p| p.is_alive() && p.position.overlaps_tile(tile))
            .map(|p| p.user_id.clone())
            .collect::<Vec<_>>()
    };

    let mut env = Envelope::new(server_msg::SHRINK_MAP);
    env.game_info = Some(game.snapshot().await);
    game.broadcast(env).await;

    for user_id in hit_users {
        lose_life(state, game, &user_id, config::DEFAULT_LIVES).await;
    }
}

/// Closes one inner-ring tile. The inner ring only walls the tile and
/// broadcasts the updated snapshot; it never drains lives or clears a
/// standing player — `game_over` fires once every inner tile has closed,
/// regardless of who is still standing where.
async fn close_inner_tile(game: &Arc<Game>, tile: GridPosition) {
    {
        let mut s = game.state.lock().await;
        wall_off(&mut s, tile);
    }

    let mut env = Envelope::new(server_msg::SHRINK_MAP);
    env.game_info = Some(game.snapshot().await);
    game.broadcast(env).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_and_inner_cover_every_tile_exactly_once() {
        let (outer, inner) = split_shrink_order();
        let mut seen = std::collections::HashSet::new();
        for tile in outer.iter().chain(inner.iter()) {
            assert!(seen.insert(*tile), "duplicate {:?}", tile);
        }
        assert_eq!(seen.len(), shrink_order().len());
    }

    #[test]
    fn ring_len_matches_the_default_grid() {
        // 15x13 grid: ring 1 has 13+9+13+9=44 tiles, ring 2 has 11+7+11+7=36.
        assert_eq!(ring_len(1), 44);
        assert_eq!(ring_len(2), 36);
    }
}
