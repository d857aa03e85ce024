//! Parameter definitions with physical units and documented semantics.
//!
//! Road geometry, camera rig, window and scene selection live here with:
//! - Physical units (meters, seconds, degrees)
//! - Defaults matching the shipped highway scene

mod camera;
mod render;
mod road;
mod scene;

// Re-export all types
pub use camera::RoadCamera;
pub use render::RenderConfig;
pub use road::RoadOptions;
pub use scene::SceneConfig;
