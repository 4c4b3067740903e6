use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use p2d_core::level::LevelLoader;
use p2d_core::session::LevelProgress;

use crate::layout::parse_layout;
use crate::level::TileLevel;

/// Number of level files shipped with the game: `0.txt` through `2.txt`.
pub const LEVEL_COUNT: usize = 3;

/// Reads `<level_dir>/<index>.txt` and builds a playable level from it.
pub struct TileLevelLoader {
    level_dir: PathBuf,
    time_limit: Duration,
}

impl TileLevelLoader {
    pub fn new(level_dir: impl Into<PathBuf>, time_limit: Duration) -> Self {
        Self {
            level_dir: level_dir.into(),
            time_limit,
        }
    }

    pub fn level_path(&self, index: usize) -> PathBuf {
        self.level_dir.join(format!("{index}.txt"))
    }
}

pub fn load_level_from_path(
    path: &Path,
    progress: &LevelProgress,
    time_limit: Duration,
) -> Result<TileLevel, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let layout =
        parse_layout(&raw).map_err(|e| format!("Invalid level {}: {e}", path.display()))?;
    Ok(TileLevel::new(layout, progress, time_limit))
}

impl LevelLoader for TileLevelLoader {
    type Level = TileLevel;

    fn load(&mut self, index: usize, progress: &LevelProgress) -> Result<TileLevel, String> {
        load_level_from_path(&self.level_path(index), progress, self.time_limit)
    }
}
