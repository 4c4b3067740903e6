//! HUD notification contract and the text it displays.

use std::time::Duration;

use crate::level::{LevelPhase, LevelRuntime};

/// Receives the live level state once per frame.
pub trait HudPresenter {
    fn on_level_update(&mut self, runtime: &LevelRuntime);
}

/// Presenter that ignores every update, for headless runs.
pub struct NullHud;

impl HudPresenter for NullHud {
    fn on_level_update(&mut self, _runtime: &LevelRuntime) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColor {
    Normal,
    Warning,
}

impl TimeColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Normal => [255, 255, 0],
            Self::Warning => [255, 0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudText {
    pub time: String,
    pub time_color: TimeColor,
    pub score: String,
    pub status: Option<&'static str>,
}

impl HudText {
    /// Below `warning_time` the clock blinks red on odd seconds, unless the
    /// exit has already been reached.
    pub fn from_runtime(runtime: &LevelRuntime, warning_time: Duration) -> Self {
        let secs = runtime.time_remaining.as_secs();
        let calm = runtime.time_remaining > warning_time || runtime.reached_exit || secs % 2 == 0;
        let status = match LevelPhase::from_runtime(runtime) {
            LevelPhase::Playing => None,
            LevelPhase::TimeExpiredWin => Some("YOU WIN! Press Space or tap to continue"),
            LevelPhase::TimeExpiredLose => Some("TIME'S UP! Press Space or tap to retry"),
            LevelPhase::PlayerDead => Some("YOU DIED! Press Space or tap to try again"),
        };
        Self {
            time: format_time(runtime.time_remaining),
            time_color: if calm {
                TimeColor::Normal
            } else {
                TimeColor::Warning
            },
            score: format!("SCORE: {}", runtime.score),
            status,
        }
    }
}

/// `TIME: mm:ss`, truncating partial seconds.
pub fn format_time(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("TIME: {:02}:{:02}", secs / 60, secs % 60)
}
