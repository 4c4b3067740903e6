//! Durable cross-session progress.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Carry-over state for the level currently being played.
///
/// Survives a death restart; reset when the level is won or lost on time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    #[serde(default)]
    pub score: u32,
    /// Tile coordinates (column, row) of gems already picked up.
    #[serde(default)]
    pub collected_gems: BTreeSet<(i32, i32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub level_index: usize,
    #[serde(default)]
    pub level_progress: LevelProgress,
}

impl SessionState {
    pub fn is_valid_for(&self, level_count: usize) -> bool {
        self.level_index < level_count
    }
}

/// Next level index, wrapping back to the first level after the last one.
pub fn advance_index(level_index: usize, level_count: usize) -> usize {
    if level_count == 0 {
        return 0;
    }
    (level_index + 1) % level_count
}
