//! Recorded input sequences for deterministic level playback.

use p2d_core::aggregator::InputSnapshot;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    /// Jump held during these frames.
    #[serde(default)]
    pub jump: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<InputSnapshot> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(InputSnapshot {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                    jump_held: frame.jump,
                    ..Default::default()
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parse_layout;
    use crate::level::TileLevel;
    use p2d_core::level::{Level, LevelPhase};
    use p2d_core::session::LevelProgress;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const COURSE: &str = "\
..........................
..........G.G.............
.........-----........G...
.....................---..
.1........................
######..######..#####....X
######..######..##########
";

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "p2d_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_replay(name_hint: &str, json: &str) -> ReplaySequence {
        let path = temp_file_path(name_hint);
        fs::write(&path, json).expect("write replay file");
        let replay = load_replay_from_path(&path).expect("replay should load");
        let _ = fs::remove_file(path);
        replay
    }

    fn play(replay: &ReplaySequence) -> TileLevel {
        let layout = parse_layout(COURSE).expect("course layout");
        let mut level = TileLevel::new(layout, &LevelProgress::default(), Duration::from_secs(120));
        for input in replay.expanded_inputs() {
            level.update(&input, replay.fixed_dt);
        }
        level
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let replay = write_replay(
            "parse",
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 3 },
                { "jump": true, "repeat": 1 }
              ]
            }"#,
        );
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].move_x, 1.0);
        assert!(expanded[3].jump_held);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let replay = write_replay(
            "deterministic",
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 20 },
                { "move_x": 1.0, "jump": true, "repeat": 12 },
                { "move_x": 1.0, "repeat": 40 },
                { "move_x": -1.0, "repeat": 30 },
                { "repeat": 30 }
              ]
            }"#,
        );

        let run_a = play(&replay);
        let run_b = play(&replay);

        let (a, b) = (run_a.player(), run_b.player());
        assert!((a.aabb.center_x - b.aabb.center_x).abs() < 0.0001);
        assert!((a.aabb.center_y - b.aabb.center_y).abs() < 0.0001);
        assert!((a.velocity - b.velocity).length() < 0.0001);
        assert_eq!(a.grounded, b.grounded);
        assert_eq!(run_a.runtime(), run_b.runtime());
        assert_eq!(run_a.progress(), run_b.progress());
    }

    #[test]
    fn standing_still_keeps_playing() {
        let replay = write_replay("idle", r#"{ "frames": [ { "repeat": 120 } ] }"#);
        let level = play(&replay);
        assert_eq!(LevelPhase::from_runtime(&level.runtime()), LevelPhase::Playing);
        assert!(level.player().grounded);
    }
}
