//! Scene composition: which profile drives the road, plus the rig around it.

use super::{RenderConfig, RoadCamera, RoadOptions};

/// Everything needed to start the highway scene
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Id of the distortion profile bending the road
    pub distortion: String,

    pub road: RoadOptions,

    pub camera: RoadCamera,

    pub render: RenderConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            distortion: "xy".to_string(),
            road: RoadOptions::default(),
            camera: RoadCamera::default(),
            render: RenderConfig::default(),
        }
    }
}
