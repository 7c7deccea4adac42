//! Tunables for grid size, timing and starting loadouts.
//!
//! These mirror the constants the original game hard-coded in its `modules`
//! package; gathering them here keeps `grid.rs`/`bomb.rs`/`game.rs` free of
//! magic numbers.

use std::time::Duration;

/// Width and height of the playable grid, in tiles. Both must be odd so the
/// outer-ring + even-even-wall pattern in [`crate::grid`] tiles evenly.
pub const GRID_WIDTH: i32 = 15;
pub const GRID_HEIGHT: i32 = 13;

/// Pixel size of one grid tile.
pub const TILE_SIZE: i32 = 44;

/// Pixel size of a player's square collider. Smaller than `TILE_SIZE` so
/// diagonal-ish movement along a wall is possible without snapping.
pub const CHARACTER_SIZE: i32 = 35;

/// Side length, in tiles, of the wall/barrel-free pocket kept open around
/// each spawn corner.
pub const CORNER_AREA: i32 = 1;

/// Fraction of eligible empty interior tiles that become barrels.
pub const FILL_PERCENTAGE: f64 = 0.8;

/// Starting lives per player.
pub const DEFAULT_LIVES: u8 = 3;

/// Starting power-up counts.
pub const DEFAULT_BOMBS: u32 = 1;
pub const DEFAULT_FLAME: u32 = 1;
pub const DEFAULT_SPEED: u32 = 4;

/// How many extra copies of each non-empty power-up kind seed a barrel pool.
pub const POWERUP_BARREL_AMOUNT: u32 = 5;

/// Movement speed added per Speed power-up pickup.
pub const SPEED_INCREMENT: u32 = 2;
/// Flame reach added per Flame power-up pickup.
pub const FLAME_INCREMENT: u32 = 1;
/// Concurrent bomb count added per Bomb power-up pickup.
pub const BOMB_INCREMENT: u32 = 1;

/// Maximum players in a non-global game.
pub const MAX_PLAYERS: usize = 4;

/// Fuse time between `bombPlaced` and the explosion.
pub const BOMB_FUSE: Duration = Duration::from_secs(3);
/// How long a barrel lingers as rubble before disappearing from the grid.
pub const BARREL_CLEAR_DELAY: Duration = Duration::from_millis(1300);
/// How long flame tiles remain marked in `ActiveExplosions`.
pub const EXPLOSION_RESIDENCY: Duration = Duration::from_secs(1);
/// Delay between `bombExploded` and the follow-up `updateGrid` snapshot.
pub const GRID_UPDATE_DELAY: Duration = Duration::from_millis(1500);

/// Time after taking damage during which further damage is ignored.
pub const INVINCIBILITY_WINDOW: Duration = Duration::from_secs(3);

/// Total match duration.
pub const MATCH_DURATION: Duration = Duration::from_secs(180);
/// When, relative to match start, the outer-ring shrink begins.
pub const OUTER_SHRINK_START: Duration = Duration::from_secs(90);
/// How long the outer-ring shrink takes to fully close, once started.
pub const OUTER_SHRINK_WINDOW: Duration = Duration::from_secs(30);
/// Interval between successive inner-ring tile closures.
pub const INNER_SHRINK_TICK: Duration = Duration::from_millis(50);

/// Delay between game over and the creation of the replacement lobby.
pub const ROLLOVER_DELAY: Duration = Duration::from_secs(5);

/// Color pool assigned to joining players, removed from the pool per game as used.
pub const COLOR_POOL: [&str; 4] = ["#D72C41", "#A864CC", "#70C36D", "#4284EF"];

/// Reserved game id for the permanent, uncapped chat lobby.
pub const GLOBAL_GAME_ID: &str = "global";

/// Reads `VITE_BACKEND_PORT` from the environment, falling back to a
/// documented default for local development and warning (not panicking) if
/// the variable was unset, matching the tolerant behavior of the original
/// Go bootstrap.
pub fn backend_port() -> u16 {
    match std::env::var("VITE_BACKEND_PORT") {
        Ok(value) if value.trim().len() >= 2 => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value, "VITE_BACKEND_PORT is not a valid port, using default");
            8080
        }),
        _ => {
            tracing::warn!("VITE_BACKEND_PORT is empty or unset, is this intentional?");
            8080
        }
    }
}
