//! Tile collision for levels: a grid of passable, impassable and one-way
//! platform cells built from the level layout.
//!
//! The core algorithm is **axis-separable move-and-slide**: resolve X movement
//! first against the grid, then resolve Y using the already-corrected X position.
//! This prevents diagonal tunneling and produces the "slide along walls" behavior
//! players expect from platformers.
//!
//! World space is y-up with the origin at the bottom-left of the level. Cells
//! left or right of the level are walls; cells above or below it are open,
//! so the player can jump off the top of the screen and fall out the bottom.

use glam::Vec2;

pub const TILE_WIDTH: f32 = 40.0;
pub const TILE_HEIGHT: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCollision {
    Passable,
    Impassable,
    /// Blocks only an object landing on it from above.
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn from_bottom_center(bottom_center: Vec2, size: Vec2) -> Self {
        Self {
            center_x: bottom_center.x,
            center_y: bottom_center.y + size.y * 0.5,
            half_w: size.x * 0.5,
            half_h: size.y * 0.5,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.half_w * 2.0, self.half_h * 2.0)
    }

    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.half_h
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (self.center_x - other.center_x).abs() < self.half_w + other.half_w
            && (self.center_y - other.center_y).abs() < self.half_h + other.half_h
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        (point.x - self.center_x).abs() <= self.half_w
            && (point.y - self.center_y).abs() <= self.half_h
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionMoveResult {
    pub aabb: Aabb,
    pub collided_y: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_down: bool,
    pub blocked_up: bool,
}

#[derive(Debug, Clone)]
pub struct TileGrid {
    pub width: i32,
    pub height: i32,
    /// Row-major, row 0 at the bottom.
    cells: Vec<TileCollision>,
}

impl TileGrid {
    /// Build from rows listed top to bottom, as they appear in a level file.
    pub fn from_rows_top_down(rows: &[Vec<TileCollision>]) -> Result<Self, String> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err("Tile grid must be at least 1x1".to_string());
        }
        let mut cells = Vec::with_capacity(width * height);
        for (index, row) in rows.iter().rev().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "Tile grid row {} has {} cells, expected {width}",
                    height - 1 - index,
                    row.len()
                ));
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            width: width as i32,
            height: height as i32,
            cells,
        })
    }

    pub fn collision(&self, x: i32, y: i32) -> TileCollision {
        if x < 0 || x >= self.width {
            return TileCollision::Impassable;
        }
        if y < 0 || y >= self.height {
            return TileCollision::Passable;
        }
        self.cells[(y * self.width + x) as usize]
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.collision(x, y) == TileCollision::Impassable
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * TILE_WIDTH,
            self.height as f32 * TILE_HEIGHT,
        )
    }

    /// Cells in the level, bottom row first.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, TileCollision)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &c)| {
            let i = i as i32;
            (i % self.width, i / self.width, c)
        })
    }

    pub fn cell_bounds(&self, x: i32, y: i32) -> Aabb {
        Aabb {
            center_x: (x as f32 + 0.5) * TILE_WIDTH,
            center_y: (y as f32 + 0.5) * TILE_HEIGHT,
            half_w: TILE_WIDTH * 0.5,
            half_h: TILE_HEIGHT * 0.5,
        }
    }

    pub fn move_and_collide_detailed(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult {
        const EPS: f32 = 0.0001;

        // Axis-separable move-and-slide:
        // resolve X first, then resolve Y using updated X position.
        let resolved_x = self.resolve_axis_x(aabb, dx);
        let x_expected = aabb.center_x + dx;
        let collided_x = (resolved_x - x_expected).abs() > EPS;

        let mut moved = aabb;
        moved.center_x = resolved_x;
        let resolved_y = self.resolve_axis_y(moved, dy);
        let y_expected = aabb.center_y + dy;
        let collided_y = (resolved_y - y_expected).abs() > EPS;
        moved.center_y = resolved_y;

        CollisionMoveResult {
            aabb: moved,
            collided_y,
            blocked_left: collided_x && dx < 0.0,
            blocked_right: collided_x && dx > 0.0,
            blocked_down: collided_y && dy < 0.0,
            blocked_up: collided_y && dy > 0.0,
        }
    }

    /// Whether `aabb` rests on something that would stop it falling.
    pub fn is_supported(&self, aabb: Aabb) -> bool {
        self.move_and_collide_detailed(aabb, 0.0, -0.5).blocked_down
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> f32 {
        if dx == 0.0 {
            return aabb.center_x;
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let y0 = cell_y(aabb.bottom() + EPS);
        let y1 = cell_y(aabb.top() - EPS);

        if dx > 0.0 {
            let x_cell = cell_x(candidate_x + aabb.half_w - EPS);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    candidate_x = candidate_x.min(x_cell as f32 * TILE_WIDTH - aabb.half_w);
                }
            }
            // Guardrail: never push opposite direction during resolution.
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let x_cell = cell_x(candidate_x - aabb.half_w + EPS);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    candidate_x = candidate_x.max((x_cell + 1) as f32 * TILE_WIDTH + aabb.half_w);
                }
            }
            candidate_x = candidate_x.min(aabb.center_x);
        }

        candidate_x
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> f32 {
        if dy == 0.0 {
            return aabb.center_y;
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let x0 = cell_x(aabb.center_x - aabb.half_w + EPS);
        let x1 = cell_x(aabb.center_x + aabb.half_w - EPS);

        if dy > 0.0 {
            let y_cell = cell_y(candidate_y + aabb.half_h - EPS);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    candidate_y = candidate_y.min(y_cell as f32 * TILE_HEIGHT - aabb.half_h);
                }
            }
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            let y_cell = cell_y(candidate_y - aabb.half_h + EPS);
            let cell_top = (y_cell + 1) as f32 * TILE_HEIGHT;
            // Platforms only catch a box that started the move above them.
            let was_above = aabb.bottom() >= cell_top - EPS;
            for x in x0..=x1 {
                let blocks = match self.collision(x, y_cell) {
                    TileCollision::Impassable => true,
                    TileCollision::Platform => was_above,
                    TileCollision::Passable => false,
                };
                if blocks {
                    candidate_y = candidate_y.max(cell_top + aabb.half_h);
                }
            }
            candidate_y = candidate_y.min(aabb.center_y);
        }

        candidate_y
    }
}

pub fn cell_x(world_x: f32) -> i32 {
    (world_x / TILE_WIDTH).floor() as i32
}

pub fn cell_y(world_y: f32) -> i32 {
    (world_y / TILE_HEIGHT).floor() as i32
}
