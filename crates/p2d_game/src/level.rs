//! Playable tile level: player, gems, enemies, exit and the level clock.

use std::collections::BTreeSet;
use std::time::Duration;

use glam::Vec2;
use p2d_core::aggregator::InputSnapshot;
use p2d_core::edge::RisingEdge;
use p2d_core::level::{Level, LevelRuntime};
use p2d_core::render::{Quad, WorldBounds};
use p2d_core::session::LevelProgress;

use crate::collision::{Aabb, TileCollision, TileGrid, TILE_HEIGHT, TILE_WIDTH};
use crate::controller::{CharacterController, ControllerInput};
use crate::enemy::{Enemy, ENEMY_SIZE};
use crate::layout::{Cell, LevelLayout};

pub const GEM_POINTS: u32 = 30;
/// Score awarded per second left on the clock once the exit is reached.
pub const POINTS_PER_SECOND: u32 = 5;
/// Speed at which the clock drains after the exit is reached.
const EXIT_DRAIN_RATE: f32 = 100.0;

const PLAYER_SIZE: Vec2 = Vec2::new(24.0, 30.0);
const GEM_SIZE: Vec2 = Vec2::new(16.0, 16.0);
const PLATFORM_THICKNESS: f32 = 8.0;

const SOLID_COLOR: [f32; 4] = [0.45, 0.30, 0.18, 1.0];
const PLATFORM_COLOR: [f32; 4] = [0.72, 0.56, 0.32, 1.0];
const EXIT_COLOR: [f32; 4] = [0.15, 0.75, 0.25, 1.0];
const GEM_COLOR: [f32; 4] = [1.0, 0.85, 0.10, 1.0];
const ENEMY_COLOR: [f32; 4] = [0.85, 0.15, 0.15, 1.0];
const PLAYER_COLOR: [f32; 4] = [0.20, 0.35, 0.90, 1.0];
const DEAD_PLAYER_COLOR: [f32; 4] = [0.40, 0.40, 0.40, 1.0];

#[derive(Debug, Clone)]
struct Gem {
    cell: Cell,
    aabb: Aabb,
    collected: bool,
}

pub struct TileLevel {
    grid: TileGrid,
    start: Aabb,
    exit: Aabb,
    gems: Vec<Gem>,
    enemies: Vec<Enemy>,
    player: CharacterController,
    jump_edge: RisingEdge,
    time_remaining: Duration,
    reached_exit: bool,
    player_alive: bool,
    score: u32,
}

impl TileLevel {
    /// Build a fresh level, with gems already listed in `progress` removed.
    pub fn new(layout: LevelLayout, progress: &LevelProgress, time_limit: Duration) -> Self {
        let LevelLayout {
            grid,
            start,
            exit,
            gems,
            enemies,
        } = layout;

        let start = Aabb::from_bottom_center(
            Vec2::new(
                (start.0 as f32 + 0.5) * TILE_WIDTH,
                start.1 as f32 * TILE_HEIGHT,
            ),
            PLAYER_SIZE,
        );
        let mut player = CharacterController::new(start);
        player.reset(start, &grid);

        let gems = gems
            .into_iter()
            .map(|cell| Gem {
                cell,
                aabb: Aabb {
                    half_w: GEM_SIZE.x * 0.5,
                    half_h: GEM_SIZE.y * 0.5,
                    ..grid.cell_bounds(cell.0, cell.1)
                },
                collected: progress.collected_gems.contains(&cell),
            })
            .collect();

        Self {
            exit: grid.cell_bounds(exit.0, exit.1),
            enemies: enemies.into_iter().map(Enemy::spawn).collect(),
            grid,
            start,
            gems,
            player,
            jump_edge: held_jump_edge(),
            time_remaining: time_limit,
            reached_exit: false,
            player_alive: true,
            score: progress.score,
        }
    }

    pub fn player(&self) -> &CharacterController {
        &self.player
    }

    pub fn gems_remaining(&self) -> usize {
        self.gems.iter().filter(|g| !g.collected).count()
    }

    fn collect_gems(&mut self) {
        let player = self.player.aabb;
        for gem in self.gems.iter_mut().filter(|g| !g.collected) {
            if gem.aabb.intersects(&player) {
                gem.collected = true;
                self.score += GEM_POINTS;
                log::debug!("Gem collected at {:?}", gem.cell);
            }
        }
    }

    fn kill_player(&mut self, cause: &str) {
        if self.player_alive {
            self.player_alive = false;
            log::info!("Player killed: {cause}");
        }
    }

    /// Convert remaining time into score at an accelerated rate.
    fn drain_clock(&mut self, dt: f32) {
        let ceil_secs = self.time_remaining.as_secs_f32().ceil() as u64;
        let drained = ((dt * EXIT_DRAIN_RATE).round() as u64).min(ceil_secs);
        self.time_remaining = self
            .time_remaining
            .saturating_sub(Duration::from_secs(drained));
        self.score += drained as u32 * POINTS_PER_SECOND;
    }

    fn update_playing(&mut self, input: &InputSnapshot, jump_pressed: bool, dt: f32) {
        self.time_remaining = self
            .time_remaining
            .saturating_sub(Duration::from_secs_f32(dt));

        self.player.step(
            ControllerInput {
                move_x: input.move_x,
                jump_pressed,
            },
            dt,
            &self.grid,
        );
        self.collect_gems();

        if self.player.aabb.top() < 0.0 {
            self.kill_player("fell out of the level");
        }

        for enemy in &mut self.enemies {
            enemy.update(dt, &self.grid);
        }
        if self
            .enemies
            .iter()
            .any(|e| e.aabb.intersects(&self.player.aabb))
        {
            self.kill_player("touched an enemy");
        }

        if self.player_alive
            && self.player.grounded
            && self.exit.contains_point(self.player.aabb.center())
        {
            self.reached_exit = true;
            log::info!(
                "Exit reached with {:.1}s left",
                self.time_remaining.as_secs_f32()
            );
        }
    }
}

impl Level for TileLevel {
    fn update(&mut self, input: &InputSnapshot, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let jump_pressed = self.jump_edge.sample(input.jump_held);

        if !self.player_alive || self.time_remaining.is_zero() {
            // Finished levels keep simulating the body, without control.
            self.player.step(ControllerInput::default(), dt, &self.grid);
        } else if self.reached_exit {
            self.drain_clock(dt);
        } else {
            self.update_playing(input, jump_pressed, dt);
        }
    }

    fn runtime(&self) -> LevelRuntime {
        LevelRuntime {
            time_remaining: self.time_remaining,
            reached_exit: self.reached_exit,
            player_alive: self.player_alive,
            player_velocity: self.player.observed_velocity(),
            score: self.score,
        }
    }

    fn start_new_life(&mut self) {
        self.player.reset(self.start, &self.grid);
        self.player_alive = true;
        self.jump_edge = held_jump_edge();
    }

    fn progress(&self) -> LevelProgress {
        LevelProgress {
            score: self.score,
            collected_gems: self
                .gems
                .iter()
                .filter(|g| g.collected)
                .map(|g| g.cell)
                .collect::<BTreeSet<_>>(),
        }
    }

    fn emit_world(&self, out: &mut Vec<Quad>) {
        for (x, y, collision) in self.grid.cells() {
            let cell = self.grid.cell_bounds(x, y);
            match collision {
                TileCollision::Passable => {}
                TileCollision::Impassable => {
                    out.push(Quad::new(cell.center(), cell.size(), SOLID_COLOR));
                }
                TileCollision::Platform => {
                    let center = Vec2::new(cell.center_x, cell.top() - PLATFORM_THICKNESS * 0.5);
                    out.push(Quad::new(
                        center,
                        Vec2::new(TILE_WIDTH, PLATFORM_THICKNESS),
                        PLATFORM_COLOR,
                    ));
                }
            }
        }

        out.push(Quad::new(self.exit.center(), self.exit.size(), EXIT_COLOR));
        for gem in self.gems.iter().filter(|g| !g.collected) {
            out.push(Quad::new(gem.aabb.center(), GEM_SIZE, GEM_COLOR));
        }
        for enemy in &self.enemies {
            out.push(Quad::new(enemy.aabb.center(), ENEMY_SIZE, ENEMY_COLOR));
        }

        let color = if self.player_alive {
            PLAYER_COLOR
        } else {
            DEAD_PLAYER_COLOR
        };
        out.push(Quad::new(self.player.aabb.center(), PLAYER_SIZE, color));
    }

    fn camera_focus(&self) -> Vec2 {
        self.player.aabb.center()
    }

    fn bounds(&self) -> WorldBounds {
        WorldBounds {
            min: Vec2::ZERO,
            max: self.grid.world_size(),
        }
    }
}

/// Jump edge that treats the button as already down, so the press that
/// started or restarted the level does not also jump.
fn held_jump_edge() -> RisingEdge {
    let mut edge = RisingEdge::new();
    edge.sample(true);
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parse_layout;
    use p2d_core::level::LevelPhase;

    const DT: f32 = 1.0 / 60.0;
    const LIMIT: Duration = Duration::from_secs(120);

    fn level(text: &str) -> TileLevel {
        level_with(text, &LevelProgress::default(), LIMIT)
    }

    fn level_with(text: &str, progress: &LevelProgress, limit: Duration) -> TileLevel {
        TileLevel::new(parse_layout(text).expect("layout"), progress, limit)
    }

    fn moving(move_x: f32) -> InputSnapshot {
        InputSnapshot {
            move_x,
            ..Default::default()
        }
    }

    fn run(level: &mut TileLevel, input: &InputSnapshot, frames: u32) {
        for _ in 0..frames {
            level.update(input, DT);
        }
    }

    fn phase(level: &TileLevel) -> LevelPhase {
        LevelPhase::from_runtime(&level.runtime())
    }

    #[test]
    fn new_level_starts_alive_with_full_clock() {
        let level = level("1...X\n#####\n");
        let runtime = level.runtime();
        assert!(runtime.player_alive);
        assert!(!runtime.reached_exit);
        assert_eq!(runtime.time_remaining, LIMIT);
        assert_eq!(runtime.player_velocity, Vec2::ZERO);
        assert!(level.player().grounded);
    }

    #[test]
    fn zero_elapsed_update_changes_nothing() {
        let mut level = level("1...X\n#####\n");
        run(&mut level, &moving(1.0), 10);
        let before = level.runtime();
        let position = level.player().aabb;
        level.update(&moving(1.0), 0.0);
        assert_eq!(level.runtime(), before);
        assert_eq!(level.player().aabb, position);
    }

    #[test]
    fn falling_below_the_level_kills() {
        let mut level = level("....X\n1....\n.####\n");
        run(&mut level, &InputSnapshot::default(), 60);
        assert_eq!(phase(&level), LevelPhase::PlayerDead);
    }

    #[test]
    fn touching_an_enemy_kills() {
        let mut level = level("1A...X\n######\n");
        run(&mut level, &InputSnapshot::default(), 60);
        assert!(!level.runtime().player_alive);
    }

    #[test]
    fn gems_add_score_and_are_remembered() {
        let mut level = level("......\n1G...X\n######\n");
        run(&mut level, &moving(1.0), 30);
        assert_eq!(level.runtime().score, GEM_POINTS);
        assert_eq!(level.gems_remaining(), 0);

        let progress = level.progress();
        assert!(progress.collected_gems.contains(&(1, 1)));

        let reloaded = level_with("......\n1G...X\n######\n", &progress, LIMIT);
        assert_eq!(reloaded.gems_remaining(), 0);
        assert_eq!(reloaded.runtime().score, GEM_POINTS);
    }

    #[test]
    fn reaching_exit_drains_clock_into_score() {
        let mut level = level("1X\n##\n");
        let mut frames = 0;
        while !level.runtime().reached_exit && frames < 60 {
            level.update(&moving(1.0), DT);
            frames += 1;
        }
        assert!(level.runtime().reached_exit);
        assert_eq!(phase(&level), LevelPhase::Playing);

        run(&mut level, &InputSnapshot::default(), 70);
        let runtime = level.runtime();
        assert!(runtime.time_remaining.is_zero());
        assert_eq!(runtime.score, 120 * POINTS_PER_SECOND);
        assert_eq!(phase(&level), LevelPhase::TimeExpiredWin);
    }

    #[test]
    fn running_out_of_time_loses() {
        let mut level = level_with(
            "1...X\n#####\n",
            &LevelProgress::default(),
            Duration::from_secs(1),
        );
        run(&mut level, &InputSnapshot::default(), 70);
        assert_eq!(phase(&level), LevelPhase::TimeExpiredLose);
    }

    #[test]
    fn new_life_respawns_at_start_with_progress() {
        let mut level = level("......\n1G..AX\n######\n");
        run(&mut level, &moving(1.0), 20);
        assert_eq!(level.runtime().score, GEM_POINTS);
        run(&mut level, &moving(1.0), 120);
        assert!(!level.runtime().player_alive);

        level.start_new_life();
        let runtime = level.runtime();
        assert!(runtime.player_alive);
        assert_eq!(runtime.score, GEM_POINTS);
        assert!((level.player().aabb.center_x - 20.0).abs() < 0.001);
        assert_eq!(level.gems_remaining(), 0);
    }

    #[test]
    fn continue_press_does_not_jump_on_a_fresh_level() {
        let mut level = level("1...X\n#####\n");
        let press = InputSnapshot {
            jump_held: true,
            continue_held: true,
            ..Default::default()
        };
        level.update(&press, DT);
        assert!(level.player().grounded);
        assert!(level.player().velocity.y <= 0.0);

        level.update(&InputSnapshot::default(), DT);
        level.update(&press, DT);
        assert!(level.player().velocity.y > 0.0);
    }

    #[test]
    fn continue_press_does_not_jump_after_a_new_life() {
        let mut level = level("1A...X\n######\n");
        run(&mut level, &InputSnapshot::default(), 60);
        assert!(!level.runtime().player_alive);

        level.start_new_life();
        let press = InputSnapshot {
            jump_held: true,
            continue_held: true,
            ..Default::default()
        };
        level.update(&press, DT);
        assert!(level.player().velocity.y <= 0.0);
    }

    #[test]
    fn world_quads_cover_tiles_and_actors() {
        let level = level("1G-AX\n#####\n");
        let mut quads = Vec::new();
        level.emit_world(&mut quads);
        // 5 solids + 1 platform + exit + gem + enemy + player
        assert_eq!(quads.len(), 10);
        assert_eq!(level.bounds().max, Vec2::new(200.0, 64.0));
    }
}
