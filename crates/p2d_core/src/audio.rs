//! Background music hook.
//!
//! Playback is cosmetic: a backend that cannot start (no device, missing
//! track, platform refusing media while a debugger is attached) must never
//! stop the game.

pub trait MusicPlayer {
    fn play_looping(&mut self, track: &str) -> Result<(), String>;
}

/// Backend for builds without an audio device.
pub struct NoMusic;

impl MusicPlayer for NoMusic {
    fn play_looping(&mut self, track: &str) -> Result<(), String> {
        Err(format!("no audio backend available for '{track}'"))
    }
}

/// Start looping `track`, ignoring any failure. Returns whether it started.
pub fn start_music(player: &mut dyn MusicPlayer, track: &str) -> bool {
    match player.play_looping(track) {
        Ok(()) => {
            log::info!("Music started: {track}");
            true
        }
        Err(err) => {
            log::debug!("Music playback skipped: {err}");
            false
        }
    }
}
