//! Two position types that share a shape but never a meaning.
//!
//! Pixels and tile indices are both `(i32, i32)` underneath, but mixing them
//! up is a real bug class in this kind of game (the original implementation
//! had exactly such a clamping bug — see [`GridPosition::clamp`]). Keeping
//! them as distinct newtypes makes the conversion explicit at every call site.

use crate::config::{CHARACTER_SIZE, GRID_HEIGHT, GRID_WIDTH, TILE_SIZE};

/// A pixel coordinate in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsolutePosition {
    pub x: i32,
    pub y: i32,
}

impl AbsolutePosition {
    pub fn new(x: i32, y: i32) -> Self {
        AbsolutePosition { x, y }
    }

    /// Converts to the grid tile containing this position's top-left
    /// corner, clamped to the grid bounds.
    pub fn to_grid(self) -> GridPosition {
        GridPosition::new(self.x / TILE_SIZE, self.y / TILE_SIZE).clamp()
    }

    /// The tile containing this position's center (used for bomb placement).
    pub fn center_tile(self) -> GridPosition {
        AbsolutePosition::new(self.x + CHARACTER_SIZE / 2, self.y + CHARACTER_SIZE / 2).to_grid()
    }

    /// Axis-aligned bounding box corners for this position's character collider.
    pub fn aabb(self) -> (AbsolutePosition, AbsolutePosition) {
        (
            self,
            AbsolutePosition::new(self.x + CHARACTER_SIZE, self.y + CHARACTER_SIZE),
        )
    }

    /// True if the character AABB anchored here overlaps the given tile.
    pub fn overlaps_tile(self, tile: GridPosition) -> bool {
        let (top_left, bottom_right) = self.aabb();
        let tile_left = tile.x * TILE_SIZE;
        let tile_top = tile.y * TILE_SIZE;
        let tile_right = tile_left + TILE_SIZE;
        let tile_bottom = tile_top + TILE_SIZE;
        top_left.x < tile_right
            && bottom_right.x > tile_left
            && top_left.y < tile_bottom
            && bottom_right.y > tile_top
    }
}

/// A tile index into a game's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        GridPosition { x, y }
    }

    /// Clamps both axes independently to `[0, Width-1]` / `[0, Height-1]`.
    ///
    /// The original server clamped `x` with an off-by-one (`x > Width`
    /// instead of `x >= Width`) and checked the wrong axis inside the `y`
    /// branch (testing `x < 0` there). Both are fixed here: each axis is
    /// clamped against its own bound with an inclusive-exclusive check.
    pub fn clamp(self) -> Self {
        GridPosition {
            x: self.x.clamp(0, GRID_WIDTH - 1),
            y: self.y.clamp(0, GRID_HEIGHT - 1),
        }
    }

    /// Converts back to the pixel position of this tile's top-left corner.
    pub fn to_absolute(self) -> AbsolutePosition {
        AbsolutePosition::new(self.x * TILE_SIZE, self.y * TILE_SIZE)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        GridPosition::new(self.x + dx, self.y + dy)
    }

    pub fn in_bounds(self) -> bool {
        self.x >= 0 && self.x < GRID_WIDTH && self.y >= 0 && self.y < GRID_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_in_range_positions_unchanged() {
        let p = GridPosition::new(5, 5).clamp();
        assert_eq!(p, GridPosition::new(5, 5));
    }

    #[test]
    fn clamp_fixes_out_of_range_x_and_y_independently() {
        let p = GridPosition::new(GRID_WIDTH + 3, -4).clamp();
        assert_eq!(p, GridPosition::new(GRID_WIDTH - 1, 0));
    }

    #[test]
    fn to_grid_divides_by_tile_size() {
        let abs = AbsolutePosition::new(TILE_SIZE * 2 + 5, TILE_SIZE * 3 + 1);
        assert_eq!(abs.to_grid(), GridPosition::new(2, 3));
    }
}
