//! Highway Lights library - shader-driven road distortion
//!
//! Distortion profiles describe how a straight highway bends over time. Each
//! profile is written once as expression trees; the same trees generate the
//! WGSL the road is drawn with and the host formula the camera follows.

pub mod binder;
pub mod camera;
pub mod cli;
pub mod curve;
pub mod error;
pub mod gpu_probe;
pub mod parity;
pub mod params;
pub mod profile;
pub mod rendering;
pub mod road;
pub mod scene;
pub mod shader;

pub use error::{DistortionError, Result};
