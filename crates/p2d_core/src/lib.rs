pub mod aggregator;
pub mod audio;
pub mod config;
pub mod edge;
pub mod frame;
pub mod hud;
pub mod input;
pub mod level;
pub mod machine;
pub mod persistence;
pub mod render;
pub mod session;
pub mod time;
pub mod virtual_pad;

pub use aggregator::{InputAggregator, InputSnapshot};
pub use config::GameConfig;
pub use edge::RisingEdge;
pub use frame::{FrameLoop, FrameReport};
pub use hud::{HudPresenter, HudText};
pub use input::{InputState, Key};
pub use level::{Level, LevelLoader, LevelPhase, LevelRuntime};
pub use machine::{LevelSession, SessionEvent};
pub use persistence::{FileStore, SaveOutcome, SaveTicket, SessionSaver, SessionStore};
pub use render::{FrameRenderer, MagnifierParams, Quad, WorldBounds};
pub use session::{LevelProgress, SessionState};
pub use time::FrameClock;
