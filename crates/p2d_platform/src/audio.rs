//! Background music through rodio.
//!
//! The output stream must outlive every sink created from it, so the player
//! owns both. When no output device can be opened the game falls back to
//! `NoMusic`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use p2d_core::audio::{MusicPlayer, NoMusic};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

const MUSIC_VOLUME: f32 = 0.5;

pub struct RodioMusic {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioMusic {
    pub fn new() -> Result<Self, String> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {e}"))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl MusicPlayer for RodioMusic {
    fn play_looping(&mut self, track: &str) -> Result<(), String> {
        let source = open_track(Path::new(track))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| format!("Failed to create audio sink: {e}"))?;
        sink.set_volume(MUSIC_VOLUME);
        sink.append(source.repeat_infinite());
        // Replacing the sink stops the previous track.
        self.sink = Some(sink);
        Ok(())
    }
}

pub fn open_track(path: &Path) -> Result<Decoder<BufReader<File>>, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| format!("Failed to decode {}: {e}", path.display()))
}

/// rodio on the default output device, or silence when there is none.
pub fn open_music_player() -> Box<dyn MusicPlayer> {
    match RodioMusic::new() {
        Ok(player) => Box::new(player),
        Err(err) => {
            log::warn!("{err}. Music disabled.");
            Box::new(NoMusic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shipped_track() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/sounds/music.wav")
    }

    #[test]
    fn shipped_track_decodes() {
        let source = open_track(&shipped_track()).expect("shipped track should decode");
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 22050);
    }

    #[test]
    fn missing_track_is_an_error() {
        let err = open_track(Path::new("no/such/track.wav")).err().expect("missing track");
        assert!(err.contains("Failed to open"));
    }
}
