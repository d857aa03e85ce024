//! Per-frame state of the highway scene.
//!
//! One time value is produced per frame and handed both to the shader (as
//! `uTime`) and to the camera, so the road and the camera bend together.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use log::info;

use crate::binder::{UniformBinder, UniformTarget};
use crate::camera::CameraSystem;
use crate::error::Result;
use crate::params::{RenderConfig, RoadCamera};
use crate::profile::DistortionProfile;

/// Fraction of the remaining gap closed per 60 Hz frame
const EASE_PER_FRAME: f32 = 0.1;
/// Below this the clock speed snaps to its target
const SPEED_SNAP: f32 = 1e-5;
/// Below this the field of view snaps to its target
const FOV_SNAP: f32 = 0.001;
/// Field of view follows its target this many times faster than `dt`
const FOV_RATE: f32 = 6.0;

/// Step from `current` toward `target`, snapping when the step is tiny
pub fn lerp_step(current: f32, target: f32, speed: f32, limit: f32) -> f32 {
    let change = (target - current) * speed;
    if change.abs() < limit {
        target - current
    } else {
        change
    }
}

/// Frame-rate independent easing factor for a frame lasting `dt_s`
pub fn ease_factor(dt_s: f32) -> f32 {
    let coefficient = -60.0 * (1.0 - EASE_PER_FRAME).log2();
    (-coefficient * dt_s).exp()
}

/// Wall-clock time plus the extra time gained while speeding up
#[derive(Debug, Clone)]
pub struct FrameClock {
    elapsed_s: f32,
    offset_s: f32,
    speed: f32,
    speed_up: f32,
    boosted: bool,
}

impl FrameClock {
    pub fn new(speed_up: f32) -> Self {
        Self {
            elapsed_s: 0.0,
            offset_s: 0.0,
            speed: 0.0,
            speed_up,
            boosted: false,
        }
    }

    pub fn set_boost(&mut self, boosted: bool) {
        self.boosted = boosted;
    }

    pub fn is_boosted(&self) -> bool {
        self.boosted
    }

    /// Advance by one frame and return the new distortion time
    pub fn advance(&mut self, dt_s: f32) -> f32 {
        let target = if self.boosted { self.speed_up } else { 0.0 };
        self.speed += lerp_step(self.speed, target, ease_factor(dt_s), SPEED_SNAP);
        self.offset_s += self.speed * dt_s;
        self.elapsed_s += dt_s;
        self.time()
    }

    /// Distortion time (seconds)
    pub fn time(&self) -> f32 {
        self.elapsed_s + self.offset_s
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameState {
    pub time_s: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub view_proj: Mat4,
}

/// Active profile, clock, camera and uniform bookkeeping
pub struct RoadScene {
    camera: CameraSystem,
    clock: FrameClock,
    binder: UniformBinder,
    render_config: RenderConfig,
    fov_degrees: f32,
}

impl RoadScene {
    pub fn new(
        profile: Arc<DistortionProfile>,
        params: RoadCamera,
        render_config: RenderConfig,
    ) -> Self {
        let clock = FrameClock::new(params.speed_up);
        let fov_degrees = params.fov_degrees;
        Self {
            camera: CameraSystem::new(profile, params),
            clock,
            binder: UniformBinder::new(),
            render_config,
            fov_degrees,
        }
    }

    pub fn profile(&self) -> &Arc<DistortionProfile> {
        self.camera.profile()
    }

    /// Swap the active profile; its uniforms are uploaded on the next frame
    pub fn set_profile(&mut self, profile: Arc<DistortionProfile>) {
        info!("switching distortion to '{}'", profile.id());
        self.camera.set_profile(profile);
        self.binder.invalidate();
    }

    pub fn set_boost(&mut self, boosted: bool) {
        self.clock.set_boost(boosted);
    }

    pub fn toggle_boost(&mut self) {
        self.clock.set_boost(!self.clock.is_boosted());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.render_config.window_width = width;
        self.render_config.window_height = height;
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    pub fn binder(&self) -> &UniformBinder {
        &self.binder
    }

    /// Advance the clock by `dt_s`, push uniforms and time into `target`,
    /// and aim the camera at the same time
    pub fn advance(&mut self, dt_s: f32, target: &mut dyn UniformTarget) -> Result<FrameState> {
        let time_s = self.clock.advance(dt_s);

        let params = self.camera.params();
        let fov_target = if self.clock.is_boosted() {
            params.fov_speed_up_degrees
        } else {
            params.fov_degrees
        };
        let fov_change = lerp_step(self.fov_degrees, fov_target, ease_factor(dt_s), FOV_SNAP);
        if fov_change != 0.0 {
            self.fov_degrees += fov_change * dt_s * FOV_RATE;
        }

        let profile = Arc::clone(self.camera.profile());
        self.binder.ensure_bound(&profile, target)?;
        self.binder.tick(time_s, target);

        let (eye, look) = self.camera.compute_position_and_target(time_s)?;
        let (view_proj, _) =
            self.camera
                .create_view_proj_matrix(time_s, self.fov_degrees, &self.render_config)?;

        Ok(FrameState {
            time_s,
            eye,
            target: look,
            fov_degrees: self.fov_degrees,
            view_proj,
        })
    }
}
