//! Audio-reactive visualisation core: seven drawing styles composited onto
//! software raster surfaces, driven by a cancellable tick loop.

pub mod audio;
pub mod compositor;
pub mod error;
pub mod frame;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod styles;

pub use compositor::{Compositor, RenderReport};
pub use error::{Result, VizError};
pub use frame::{PlaybackProgress, SampleFrame};
pub use render::color::Rgb;
pub use render::surface::{Surface, Viewport};
pub use scheduler::{ManualScheduler, RenderLoop, TickOutcome, TickScheduler};
pub use state::{LayoutMode, VisualConfig};
pub use styles::{StyleId, StyleSettings};
