//! Camera poses and path sampling.
//!
//! Predicts the poses a map camera passes through during an animated
//! movement. The prediction mirrors the host renderer's own animation so
//! the tiles resolved for each pose are the tiles the renderer will ask for.

mod animation;
mod fly;
mod pose;
mod sampler;

pub use animation::{
    AnimationKind, AnimationOptions, AnimationParams, DEFAULT_CURVE, DEFAULT_DURATION_MS,
    DEFAULT_FPS, DEFAULT_PADDING, MAX_FRAMES,
};
pub use fly::FlyCurve;
pub use pose::{lerp, CameraPose, LngLat};
pub use sampler::{fly_curve, sample_path};
