//! Camera rig configuration.

/// Camera riding above the near end of the road
#[derive(Debug, Clone)]
pub struct RoadCamera {
    /// Eye position (meters)
    pub position: [f32; 3],

    /// Progress at which the look-at displacement is sampled
    /// Slightly ahead of the eye so the camera leans into upcoming turns
    pub look_progress: f32,

    /// Resting field of view (degrees)
    pub fov_degrees: f32,

    /// Field of view while speeding up (degrees)
    pub fov_speed_up_degrees: f32,

    /// Extra seconds of distortion time gained per second while speeding up
    pub speed_up: f32,

    /// Look direction for profiles that do not steer the camera
    pub rest_direction: [f32; 3],
}

impl Default for RoadCamera {
    fn default() -> Self {
        Self {
            position: [0.0, 8.0, -5.0],
            look_progress: 0.025,
            fov_degrees: 90.0,
            fov_speed_up_degrees: 150.0,
            speed_up: 3.0,
            rest_direction: [0.0, 0.0, -1.0],
        }
    }
}
