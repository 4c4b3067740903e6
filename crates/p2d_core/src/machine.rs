//! Level/session state machine.
//!
//! Owns the single live level and the durable `SessionState`. Each frame it
//! first reacts to a continue edge (restart, advance or reload depending on
//! the phase the level ended in), then advances the level.
//!
//! The live level sits in a one-element slot that is emptied before the
//! loader builds the replacement, so two levels never exist at once.

use crate::aggregator::InputSnapshot;
use crate::level::{Level, LevelLoader, LevelPhase, LevelRuntime};
use crate::session::{advance_index, LevelProgress, SessionState};

/// What the continue edge did this frame, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    None,
    /// Player respawned in the same level with progress intact.
    Restarted,
    /// Level won; the next level (wrapping) was loaded.
    Advanced { level_index: usize },
    /// Level lost on time; the same level was reloaded from scratch.
    Reloaded { level_index: usize },
}

pub struct LevelSession<Lo: LevelLoader> {
    loader: Lo,
    state: SessionState,
    level_count: usize,
    level: Option<Lo::Level>,
}

impl<Lo: LevelLoader> LevelSession<Lo> {
    /// Load the level the session points at. A saved index outside the level
    /// range restarts from the first level.
    pub fn new(loader: Lo, state: SessionState, level_count: usize) -> Result<Self, String> {
        if level_count == 0 {
            return Err("Session requires at least one level".to_string());
        }
        let state = if state.is_valid_for(level_count) {
            state
        } else {
            log::warn!(
                "Saved level index {} is out of range (0..{}), starting fresh",
                state.level_index,
                level_count
            );
            SessionState::default()
        };

        let mut session = Self {
            loader,
            state,
            level_count,
            level: None,
        };
        session.load_level()?;
        Ok(session)
    }

    fn load_level(&mut self) -> Result<(), String> {
        // Release the old level before its replacement is built.
        drop(self.level.take());

        let index = self.state.level_index;
        let level = self
            .loader
            .load(index, &self.state.level_progress)
            .map_err(|e| format!("Failed to load level {index}: {e}"))?;
        self.level = Some(level);
        log::info!("Level {} loaded", index);
        Ok(())
    }

    /// React to the continue edge, then advance the live level by `dt`.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        continue_edge: bool,
        dt: f32,
    ) -> Result<SessionEvent, String> {
        let mut event = SessionEvent::None;

        if continue_edge {
            let level = self
                .level
                .as_mut()
                .ok_or_else(|| "No level is loaded".to_string())?;
            let phase = LevelPhase::from_runtime(&level.runtime());
            match phase {
                LevelPhase::Playing => {}
                LevelPhase::PlayerDead => {
                    level.start_new_life();
                    self.state.level_progress = level.progress();
                    log::info!("Level {}: new life", self.state.level_index);
                    event = SessionEvent::Restarted;
                }
                LevelPhase::TimeExpiredWin => {
                    self.state.level_index = advance_index(self.state.level_index, self.level_count);
                    self.state.level_progress = LevelProgress::default();
                    self.load_level()?;
                    event = SessionEvent::Advanced {
                        level_index: self.state.level_index,
                    };
                }
                LevelPhase::TimeExpiredLose => {
                    self.state.level_progress = LevelProgress::default();
                    self.load_level()?;
                    event = SessionEvent::Reloaded {
                        level_index: self.state.level_index,
                    };
                }
            }
        }

        let level = self
            .level
            .as_mut()
            .ok_or_else(|| "No level is loaded".to_string())?;
        level.update(input, dt);
        Ok(event)
    }

    pub fn level(&self) -> Option<&Lo::Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Lo::Level> {
        self.level.as_mut()
    }

    pub fn runtime(&self) -> Option<LevelRuntime> {
        self.level.as_ref().map(Level::runtime)
    }

    pub fn phase(&self) -> Option<LevelPhase> {
        self.runtime().map(|r| LevelPhase::from_runtime(&r))
    }

    pub fn level_index(&self) -> usize {
        self.state.level_index
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Session state with the live level's progress folded in, ready to save.
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            level_index: self.state.level_index,
            level_progress: self
                .level
                .as_ref()
                .map(Level::progress)
                .unwrap_or_else(|| self.state.level_progress.clone()),
        }
    }
}
