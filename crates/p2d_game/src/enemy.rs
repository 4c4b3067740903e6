use glam::Vec2;

use crate::collision::{cell_x, cell_y, Aabb, TileCollision, TileGrid, TILE_HEIGHT, TILE_WIDTH};

const WALK_SPEED: f32 = 64.0;
const MAX_WAIT_SECS: f32 = 0.5;
pub const ENEMY_SIZE: Vec2 = Vec2::new(28.0, 28.0);

/// Walks back and forth along its ledge, pausing at each end.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub aabb: Aabb,
    direction: f32,
    wait_secs: f32,
}

impl Enemy {
    /// Spawn standing on the bottom of `cell`.
    pub fn spawn(cell: (i32, i32)) -> Self {
        let bottom_center = Vec2::new(
            (cell.0 as f32 + 0.5) * TILE_WIDTH,
            cell.1 as f32 * TILE_HEIGHT,
        );
        Self {
            aabb: Aabb::from_bottom_center(bottom_center, ENEMY_SIZE),
            direction: -1.0,
            wait_secs: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32, grid: &TileGrid) {
        if dt <= 0.0 {
            return;
        }
        if self.wait_secs > 0.0 {
            self.wait_secs = (self.wait_secs - dt).max(0.0);
            if self.wait_secs == 0.0 {
                self.direction = -self.direction;
            }
            return;
        }

        // Look at the tile just ahead of the leading edge.
        let lead_x = self.aabb.center_x + self.direction * (self.aabb.half_w + 1.0);
        let tile_x = cell_x(lead_x);
        let tile_y = cell_y(self.aabb.bottom() + 1.0);
        let wall_ahead = grid.collision(tile_x, tile_y) == TileCollision::Impassable;
        let floor_ahead = grid.collision(tile_x, tile_y - 1) != TileCollision::Passable;

        if wall_ahead || !floor_ahead {
            self.wait_secs = MAX_WAIT_SECS;
        } else {
            self.aabb.center_x += self.direction * WALK_SPEED * dt;
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::TileCollision::{Impassable as S, Passable as O};

    #[test]
    fn enemy_turns_at_ledge_after_waiting() {
        // Ledge three tiles wide with open space on both sides.
        let grid = TileGrid::from_rows_top_down(&[
            vec![O, O, O, O, O],
            vec![O, S, S, S, O],
        ])
        .expect("grid");
        let mut enemy = Enemy::spawn((2, 1));
        let start_x = enemy.aabb.center_x;

        for _ in 0..60 {
            enemy.update(1.0 / 60.0, &grid);
        }
        assert!(enemy.aabb.center_x - enemy.aabb.half_w >= 40.0 - 1.5);
        assert!(enemy.aabb.center_x < start_x);

        for _ in 0..110 {
            enemy.update(1.0 / 60.0, &grid);
        }
        assert_eq!(enemy.direction(), 1.0);
        assert!(enemy.aabb.center_x + enemy.aabb.half_w <= 160.0 + 1.5);
    }

    #[test]
    fn zero_dt_leaves_enemy_in_place() {
        let grid = TileGrid::from_rows_top_down(&[vec![O; 3], vec![S; 3]]).expect("grid");
        let mut enemy = Enemy::spawn((1, 1));
        let before = enemy.aabb;
        enemy.update(0.0, &grid);
        assert_eq!(enemy.aabb, before);
    }
}
