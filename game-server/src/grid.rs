//! Static map generation: walls, barrels, and the shrink-order spiral.

use rand::seq::SliceRandom;

use crate::config::{CORNER_AREA, FILL_PERCENTAGE, GRID_HEIGHT, GRID_WIDTH};
use crate::position::GridPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Empty,
    Wall,
    Barrel,
}

/// Row-major terrain grid, `grid[y][x]`, `Height` rows of `Width` columns.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    tiles: Vec<Vec<TileKind>>,
}

impl Grid {
    pub fn get(&self, pos: GridPosition) -> TileKind {
        self.tiles[pos.y as usize][pos.x as usize]
    }

    pub fn set(&mut self, pos: GridPosition, kind: TileKind) {
        self.tiles[pos.y as usize][pos.x as usize] = kind;
    }

    /// Flattens to a row-major `u8` grid for wire transmission (0=empty, 1=wall, 2=barrel).
    pub fn to_wire(&self) -> Vec<Vec<u8>> {
        self.tiles
            .iter()
            .map(|row| {
                row.iter()
                    .map(|t| match t {
                        TileKind::Empty => 0,
                        TileKind::Wall => 1,
                        TileKind::Barrel => 2,
                    })
                    .collect()
            })
            .collect()
    }

    /// Generates a fresh grid: outer ring + interior pillars as walls, then a
    /// randomized scattering of barrels over the remaining interior tiles.
    pub fn generate() -> Self {
        let width = GRID_WIDTH;
        let height = GRID_HEIGHT;
        let mut grid = Grid {
            width,
            height,
            tiles: vec![vec![TileKind::Empty; width as usize]; height as usize],
        };
        grid.place_walls();
        grid.place_barrels();
        grid
    }

    fn place_walls(&mut self) {
        let (width, height) = (self.width, self.height);
        let mut y = 0;
        while y < height {
            let mut x = 0;
            while x < width {
                self.set(GridPosition::new(x, y), TileKind::Wall);
                x += 2;
            }
            y += 2;
        }
        for x in 0..width {
            self.set(GridPosition::new(x, 0), TileKind::Wall);
            self.set(GridPosition::new(x, height - 1), TileKind::Wall);
        }
        for y in 0..height {
            self.set(GridPosition::new(0, y), TileKind::Wall);
            self.set(GridPosition::new(width - 1, y), TileKind::Wall);
        }
    }

    fn empty_space_count(&self) -> i32 {
        let width = self.width;
        let height = self.height;
        let grid_no_surrounding_walls = (width - 2) * (height - 2);
        let corner_area = (1 + 2 * (CORNER_AREA + 1)) * 4;
        let filled_walls = ((width - 4) / 2 + 1) * ((height - 4) / 2 + 1);
        grid_no_surrounding_walls - corner_area - filled_walls
    }

    fn random_barrel_order(&self) -> Vec<TileKind> {
        let non_wall_amount = self.empty_space_count();
        let barrel_amount = (non_wall_amount as f64 * FILL_PERCENTAGE).round() as i32;
        let empty_amount = non_wall_amount - barrel_amount;

        let mut order = Vec::with_capacity(non_wall_amount as usize);
        order.extend(std::iter::repeat(TileKind::Barrel).take(barrel_amount.max(0) as usize));
        order.extend(std::iter::repeat(TileKind::Empty).take(empty_amount.max(0) as usize));
        order.shuffle(&mut rand::thread_rng());
        order
    }

    fn place_barrels(&mut self) {
        let order = self.random_barrel_order();
        let mut index = 0usize;
        let (width, height) = (self.width, self.height);

        // rows without walls in the center area
        let mut y = 3;
        while y < height - 2 {
            for x in 2..width - 2 {
                self.set(GridPosition::new(x, y), order[index]);
                index += 1;
            }
            y += 2;
        }

        // rows with walls in the center area, between the wall pillars
        let mut y = 2;
        while y < height - 2 {
            let mut x = 3;
            while x < width - 2 {
                self.set(GridPosition::new(x, y), order[index]);
                index += 1;
                x += 2;
            }
            y += 2;
        }

        let start = 2 + CORNER_AREA;
        let row_end = width - 2 - CORNER_AREA;
        let col_end = height - 2 - CORNER_AREA;

        for x in start..row_end {
            if x == start || x == row_end - 1 {
                self.set(GridPosition::new(x, 1), TileKind::Barrel);
                self.set(GridPosition::new(x, height - 2), TileKind::Barrel);
                continue;
            }
            self.set(GridPosition::new(x, 1), order[index]);
            index += 1;
            self.set(GridPosition::new(x, height - 2), order[index]);
            index += 1;
        }

        for y in start..col_end {
            if y == start || y == col_end - 1 {
                self.set(GridPosition::new(1, y), TileKind::Barrel);
                self.set(GridPosition::new(width - 2, y), TileKind::Barrel);
                continue;
            }
            self.set(GridPosition::new(1, y), order[index]);
            index += 1;
            self.set(GridPosition::new(width - 2, y), order[index]);
            index += 1;
        }
    }

    /// Count of barrel tiles currently on the grid; used to size `BarrelContents`.
    pub fn barrel_count(&self) -> usize {
        self.tiles
            .iter()
            .flatten()
            .filter(|t| **t == TileKind::Barrel)
            .count()
    }
}

/// Order in which tiles convert to Wall during the end-game shrink: a
/// clockwise spiral from the outermost non-boundary ring inward, ending with
/// whichever single row or column remains once the rings degenerate.
pub fn shrink_order() -> Vec<GridPosition> {
    let width = GRID_WIDTH;
    let height = GRID_HEIGHT;
    let mut order = Vec::new();
    let mut circle = 1;
    loop {
        let mut right = Vec::new();
        let mut down = Vec::new();
        let mut left = Vec::new();
        let mut up = Vec::new();

        let mut i = circle;
        while i < width - circle {
            right.push(GridPosition::new(i, circle));
            left.push(GridPosition::new(width - 1 - i, height - 1 - circle));
            i += 1;
        }

        let mut i = circle;
        while i < height - circle {
            down.push(GridPosition::new(width - 1 - circle, i));
            up.push(GridPosition::new(circle, height - 1 - i));
            i += 1;
        }

        if circle > width / 2 - 1 || circle > height / 2 - 1 {
            if width >= height {
                order.extend(right);
            } else {
                order.extend(down);
            }
            break;
        }

        order.extend(right);
        if down.len() > 2 {
            order.extend(down[1..down.len() - 1].iter().copied());
        }
        order.extend(left);
        if up.len() > 2 {
            order.extend(up[1..up.len() - 1].iter().copied());
        }
        circle += 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_ring_is_all_wall() {
        let grid = Grid::generate();
        for x in 0..grid.width {
            assert_eq!(grid.get(GridPosition::new(x, 0)), TileKind::Wall);
            assert_eq!(grid.get(GridPosition::new(x, grid.height - 1)), TileKind::Wall);
        }
        for y in 0..grid.height {
            assert_eq!(grid.get(GridPosition::new(0, y)), TileKind::Wall);
            assert_eq!(grid.get(GridPosition::new(grid.width - 1, y)), TileKind::Wall);
        }
    }

    #[test]
    fn interior_even_even_tiles_are_wall() {
        let grid = Grid::generate();
        let mut y = 0;
        while y < grid.height {
            let mut x = 0;
            while x < grid.width {
                assert_eq!(grid.get(GridPosition::new(x, y)), TileKind::Wall);
                x += 2;
            }
            y += 2;
        }
    }

    #[test]
    fn shrink_order_visits_each_interior_cell_once() {
        let order = shrink_order();
        let mut seen = std::collections::HashSet::new();
        for pos in &order {
            assert!(seen.insert(*pos), "duplicate position {:?}", pos);
        }
        assert!(!order.is_empty());
    }
}
