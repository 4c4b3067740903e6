pub mod hud_overlay;

pub use hud_overlay::{DebugStats, HudModel, HudOverlay};
