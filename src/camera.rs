//! Camera that leans into the road's bends.
//!
//! Animated profiles carry a look-at transform: the host evaluates the same
//! displacement the vertex shader applies, scales and offsets it, and aims
//! the camera at the result. Still profiles keep the camera looking straight
//! down the road.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::error::{DistortionError, Result};
use crate::params::{RenderConfig, RoadCamera};
use crate::profile::DistortionProfile;

/// Host-side evaluation of an animated profile at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    /// Road displacement at the sampled progress (meters)
    pub displacement: Vec3,

    /// Look-at offset relative to the eye (meters)
    pub look_at: Vec3,
}

/// Evaluate the profile's host formula and look-at transform
pub fn evaluate(profile: &DistortionProfile, progress: f32, time: f32) -> Result<CameraSample> {
    let (formula, transform) = match (profile.host_formula(), profile.look_at()) {
        (Some(formula), Some(transform)) => (formula, transform),
        _ => {
            return Err(DistortionError::invalid(
                profile.id(),
                "still profiles have no camera path",
            ))
        }
    };

    let displacement = formula.eval(progress, time);
    Ok(CameraSample {
        displacement,
        look_at: transform.apply(displacement),
    })
}

/// Camera system following the active distortion profile
pub struct CameraSystem {
    profile: Arc<DistortionProfile>,
    params: RoadCamera,
}

impl CameraSystem {
    pub fn new(profile: Arc<DistortionProfile>, params: RoadCamera) -> Self {
        Self { profile, params }
    }

    pub fn set_profile(&mut self, profile: Arc<DistortionProfile>) {
        self.profile = profile;
    }

    pub fn profile(&self) -> &Arc<DistortionProfile> {
        &self.profile
    }

    pub fn params(&self) -> &RoadCamera {
        &self.params
    }

    /// Compute camera position and look-at target for given time
    ///
    /// # Arguments
    /// * `time_s` - Distortion time in seconds, the value pushed as `uTime`
    ///
    /// # Returns
    /// Tuple of (eye_position, target_position)
    pub fn compute_position_and_target(&self, time_s: f32) -> Result<(Vec3, Vec3)> {
        let eye = Vec3::from_array(self.params.position);

        if !self.profile.is_animated() {
            return Ok((eye, eye + Vec3::from_array(self.params.rest_direction)));
        }

        let sample = evaluate(&self.profile, self.params.look_progress, time_s)?;
        Ok((eye, eye + sample.look_at))
    }

    /// Create view-projection matrix for rendering
    ///
    /// # Returns
    /// Tuple of (view_proj_matrix, camera_position)
    pub fn create_view_proj_matrix(
        &self,
        time_s: f32,
        fov_degrees: f32,
        render_config: &RenderConfig,
    ) -> Result<(Mat4, Vec3)> {
        let (eye, target) = self.compute_position_and_target(time_s)?;

        // Camera never rolls
        let up = Vec3::Y;

        let view = Mat4::look_at_rh(eye, target, up);
        let proj = Mat4::perspective_rh(
            fov_degrees.to_radians(),
            render_config.aspect_ratio(),
            render_config.near_plane_m,
            render_config.far_plane_m,
        );

        Ok((proj * view, eye))
    }
}
