pub mod audio;
pub mod gamepad;
pub mod window;

pub use audio::{open_music_player, RodioMusic};
pub use gamepad::{GamepadPoller, PadReading};
pub use window::{create_window, PlatformConfig};
