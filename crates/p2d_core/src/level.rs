//! Contract between the session state machine and a playable level.
//!
//! The state machine never looks inside a level; it drives it through the
//! `Level` trait and reads back a `LevelRuntime` snapshot each frame.

use std::time::Duration;

use glam::Vec2;

use crate::aggregator::InputSnapshot;
use crate::render::{Quad, WorldBounds};
use crate::session::LevelProgress;

/// Observable state of the live level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRuntime {
    pub time_remaining: Duration,
    pub reached_exit: bool,
    pub player_alive: bool,
    pub player_velocity: Vec2,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    Playing,
    TimeExpiredWin,
    TimeExpiredLose,
    PlayerDead,
}

impl LevelPhase {
    /// Death takes precedence over the clock, so a player killed on the last
    /// tick restarts the level instead of losing it.
    pub fn from_runtime(runtime: &LevelRuntime) -> Self {
        if !runtime.player_alive {
            Self::PlayerDead
        } else if runtime.time_remaining.is_zero() {
            if runtime.reached_exit {
                Self::TimeExpiredWin
            } else {
                Self::TimeExpiredLose
            }
        } else {
            Self::Playing
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Playing
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::TimeExpiredWin => "won",
            Self::TimeExpiredLose => "out of time",
            Self::PlayerDead => "died",
        }
    }
}

impl std::fmt::Display for LevelPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub trait Level {
    /// Advance gameplay by `dt` seconds. A non-positive `dt` must leave the
    /// observable runtime unchanged.
    fn update(&mut self, input: &InputSnapshot, dt: f32);

    fn runtime(&self) -> LevelRuntime;

    /// Respawn the player at the level start, keeping collected progress.
    fn start_new_life(&mut self);

    /// Progress to persist if the session is saved now.
    fn progress(&self) -> LevelProgress;

    /// World-space quads for the current frame, back to front.
    fn emit_world(&self, out: &mut Vec<Quad>);

    /// Point the camera should try to keep centred.
    fn camera_focus(&self) -> Vec2;

    fn bounds(&self) -> WorldBounds;
}

/// Builds levels from their index. Content is expected to exist for every
/// index below the session's level count; a failure is fatal for the caller.
pub trait LevelLoader {
    type Level: Level;

    fn load(&mut self, index: usize, progress: &LevelProgress) -> Result<Self::Level, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(time_secs: u64, reached_exit: bool, player_alive: bool) -> LevelRuntime {
        LevelRuntime {
            time_remaining: Duration::from_secs(time_secs),
            reached_exit,
            player_alive,
            player_velocity: Vec2::ZERO,
            score: 0,
        }
    }

    #[test]
    fn phase_follows_runtime_flags() {
        assert_eq!(LevelPhase::from_runtime(&runtime(10, false, true)), LevelPhase::Playing);
        assert_eq!(LevelPhase::from_runtime(&runtime(10, true, true)), LevelPhase::Playing);
        assert_eq!(
            LevelPhase::from_runtime(&runtime(0, true, true)),
            LevelPhase::TimeExpiredWin
        );
        assert_eq!(
            LevelPhase::from_runtime(&runtime(0, false, true)),
            LevelPhase::TimeExpiredLose
        );
        assert_eq!(LevelPhase::from_runtime(&runtime(10, false, false)), LevelPhase::PlayerDead);
    }

    #[test]
    fn death_wins_over_expired_clock() {
        assert_eq!(LevelPhase::from_runtime(&runtime(0, false, false)), LevelPhase::PlayerDead);
    }

    #[test]
    fn only_playing_is_non_terminal() {
        assert!(!LevelPhase::Playing.is_terminal());
        assert!(LevelPhase::PlayerDead.is_terminal());
        assert!(LevelPhase::TimeExpiredWin.is_terminal());
        assert!(LevelPhase::TimeExpiredLose.is_terminal());
    }
}
