//! Gaussian splat viewer core: camera, per-splat quads, back to front ordering and
//! the per-frame state a wgpu renderer uploads.

pub mod camera;
pub mod config;
mod error;
pub mod footprint;
pub mod frame;
pub mod input;
pub mod pipeline;
pub mod quad;
pub mod scene;
pub mod sort;

pub use camera::{Camera, CameraSnapshot};
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use footprint::{ColorMode, QuadVertex};
pub use frame::{FrameState, FrameUniforms};
pub use input::{InputState, NavigationDelta};
pub use scene::SplatScene;
pub use sort::{DrawOrder, DrawOrderSwap, SortTicket, VisibilityOrderer};
