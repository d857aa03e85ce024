//! Road geometry bent by the active distortion profile.

pub mod mesh;

pub use mesh::{RoadMesh, Vertex};
