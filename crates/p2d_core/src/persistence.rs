//! Session save/load.
//!
//! Loading happens once at startup and never fails outward: a missing,
//! unreadable, corrupt or out-of-range save simply means "no prior session".
//!
//! Saving is fire-and-forget on a background thread. A `SessionSaver` allows
//! one write at a time; a request made while a write is still running is
//! dropped and reported as `SaveOutcome::SkippedInFlight` rather than queued,
//! so two writers never race on the same file. A process killed mid-save may
//! lose that save.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::session::SessionState;

pub const SAVE_FILE_NAME: &str = "save.json";

/// Durable storage for the serialized session document.
pub trait SessionStore: Send + Sync + 'static {
    fn read(&self) -> Result<String, String>;
    fn write(&self, contents: &str) -> Result<(), String>;
}

/// Stores the session as `save.json` inside an application-private directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SAVE_FILE_NAME)
    }
}

impl SessionStore for FileStore {
    fn read(&self) -> Result<String, String> {
        let path = self.path();
        fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
    }

    /// Writes a sibling temp file and renames it over the save, so a torn
    /// write never replaces a good save with half a document.
    fn write(&self, contents: &str) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create {}: {e}", self.dir.display()))?;
        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|e| format!("Failed to write {}: {e}", tmp.display()))?;
        fs::rename(&tmp, &path).map_err(|e| {
            format!(
                "Failed to move {} over {}: {e}",
                tmp.display(),
                path.display()
            )
        })
    }
}

pub fn encode_session(state: &SessionState) -> Result<String, String> {
    serde_json::to_string_pretty(state).map_err(|e| format!("Failed to encode session: {e}"))
}

pub fn decode_session(raw: &str) -> Result<SessionState, String> {
    serde_json::from_str(raw).map_err(|e| format!("Failed to parse session JSON: {e}"))
}

/// Read the saved session, falling back to a fresh one on any problem.
pub fn load_session(store: &dyn SessionStore, level_count: usize) -> SessionState {
    let raw = match store.read() {
        Ok(raw) => raw,
        Err(err) => {
            log::info!("No saved session ({err}), starting fresh");
            return SessionState::default();
        }
    };
    match decode_session(&raw) {
        Ok(state) if state.is_valid_for(level_count) => {
            log::info!(
                "Resuming session at level {} (score {})",
                state.level_index,
                state.level_progress.score
            );
            state
        }
        Ok(state) => {
            log::warn!(
                "Saved level index {} is out of range, starting fresh",
                state.level_index
            );
            SessionState::default()
        }
        Err(err) => {
            log::warn!("Ignoring unreadable save: {err}");
            SessionState::default()
        }
    }
}

/// Result of a save request.
#[derive(Debug)]
pub enum SaveOutcome {
    /// A background write was started.
    Started(SaveTicket),
    /// Another save was still running; this request was dropped.
    SkippedInFlight,
    /// The request could not be started at all.
    Failed(String),
}

/// Handle on a running background save.
#[derive(Debug)]
pub struct SaveTicket {
    handle: JoinHandle<Result<(), String>>,
}

impl SaveTicket {
    /// Block until the write finishes and return its result.
    pub fn wait(self) -> Result<(), String> {
        self.handle
            .join()
            .map_err(|_| "Session save thread panicked".to_string())?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Clears the in-flight flag when the save thread ends, panics included.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SessionSaver<S: SessionStore> {
    store: Arc<S>,
    in_flight: Arc<AtomicBool>,
}

impl<S: SessionStore> SessionSaver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn request_save(&self, state: &SessionState) -> SaveOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::info!("Session save already in progress, request dropped");
            return SaveOutcome::SkippedInFlight;
        }
        let guard = InFlightGuard(self.in_flight.clone());

        let contents = match encode_session(state) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("{err}");
                return SaveOutcome::Failed(err);
            }
        };

        let store = self.store.clone();
        let spawned = std::thread::Builder::new()
            .name("session-save".to_string())
            .spawn(move || {
                let _guard = guard;
                let result = store.write(&contents);
                match &result {
                    Ok(()) => log::info!("Session saved"),
                    Err(err) => log::warn!("Session save failed: {err}"),
                }
                result
            });

        match spawned {
            Ok(handle) => SaveOutcome::Started(SaveTicket { handle }),
            Err(e) => {
                // The closure (and its guard) was dropped with the failed spawn.
                let err = format!("Failed to start session save thread: {e}");
                log::warn!("{err}");
                SaveOutcome::Failed(err)
            }
        }
    }
}

/// Request a save and wait for it. A skipped or failed request returns at once.
pub fn save_blocking<S: SessionStore>(saver: &SessionSaver<S>, state: &SessionState) {
    match saver.request_save(state) {
        SaveOutcome::Started(ticket) => {
            if let Err(err) = ticket.wait() {
                log::warn!("{err}");
            }
        }
        SaveOutcome::SkippedInFlight | SaveOutcome::Failed(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LevelProgress;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "p2d_save_test_{}_{}_{}",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn sample_state() -> SessionState {
        SessionState {
            level_index: 2,
            level_progress: LevelProgress {
                score: 150,
                collected_gems: [(3, 4), (10, 2)].into_iter().collect(),
            },
        }
    }

    /// Store whose writes block until the test releases them.
    struct GatedStore {
        gate: Mutex<mpsc::Receiver<()>>,
        completed: AtomicUsize,
        last: Mutex<Option<String>>,
    }

    impl SessionStore for GatedStore {
        fn read(&self) -> Result<String, String> {
            self.last
                .lock()
                .map_err(|_| "poisoned".to_string())?
                .clone()
                .ok_or_else(|| "empty".to_string())
        }

        fn write(&self, contents: &str) -> Result<(), String> {
            self.gate
                .lock()
                .map_err(|_| "poisoned".to_string())?
                .recv()
                .map_err(|e| e.to_string())?;
            *self.last.lock().map_err(|_| "poisoned".to_string())? = Some(contents.to_string());
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn file_round_trip_preserves_session() {
        let dir = temp_dir("round_trip");
        let saver = SessionSaver::new(FileStore::new(&dir));
        save_blocking(&saver, &sample_state());

        let loaded = load_session(saver.store(), 3);
        assert_eq!(loaded, sample_state());
        assert!(!saver.store().path().with_extension("json.tmp").exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_loads_default() {
        let store = FileStore::new(temp_dir("missing"));
        assert_eq!(load_session(&store, 3), SessionState::default());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).expect("create temp dir");
        let store = FileStore::new(&dir);
        fs::write(store.path(), "{ \"level_index\": 1, \"level_progress\": ").expect("write");

        assert_eq!(load_session(&store, 3), SessionState::default());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn out_of_range_index_loads_default() {
        let dir = temp_dir("range");
        let store = FileStore::new(&dir);
        store
            .write(r#"{ "level_index": 9, "level_progress": { "score": 5 } }"#)
            .expect("write");

        assert_eq!(load_session(&store, 3), SessionState::default());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn second_save_while_in_flight_is_skipped() {
        let (release, gate) = mpsc::channel();
        let saver = SessionSaver::new(GatedStore {
            gate: Mutex::new(gate),
            completed: AtomicUsize::new(0),
            last: Mutex::new(None),
        });

        let first = saver.request_save(&sample_state());
        assert!(saver.is_saving());
        let second = saver.request_save(&SessionState::default());
        assert!(matches!(second, SaveOutcome::SkippedInFlight));

        release.send(()).expect("release first write");
        match first {
            SaveOutcome::Started(ticket) => ticket.wait().expect("first write succeeds"),
            other => panic!("first save should start, got {other:?}"),
        }

        assert_eq!(saver.store().completed.load(Ordering::SeqCst), 1);
        assert!(!saver.is_saving());
        assert_eq!(load_session(saver.store(), 3), sample_state());
    }

    #[test]
    fn saver_accepts_new_request_after_completion() {
        let (release, gate) = mpsc::channel();
        let saver = SessionSaver::new(GatedStore {
            gate: Mutex::new(gate),
            completed: AtomicUsize::new(0),
            last: Mutex::new(None),
        });
        release.send(()).expect("pre-release");
        release.send(()).expect("pre-release");

        save_blocking(&saver, &SessionState::default());
        save_blocking(&saver, &sample_state());

        assert_eq!(saver.store().completed.load(Ordering::SeqCst), 2);
        assert_eq!(load_session(saver.store(), 3), sample_state());
    }
}
