pub mod display_driver;
pub mod display_timer;
pub mod geometry;
pub mod path_renderer;
pub mod spectrogram;

pub use display_driver::DisplayDriver;
pub use display_timer::DisplayTimer;
pub use geometry::{Point, Rect};
pub use spectrogram::{Rgb, SpectrogramImage};
