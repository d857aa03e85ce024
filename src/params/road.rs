//! Road geometry configuration.

/// Dimensions of the highway: two roadways separated by an island
#[derive(Debug, Clone)]
pub struct RoadOptions {
    /// Length of the visible road (meters); progress 1.0 is this far ahead
    pub length_m: f32,

    /// Width of a single roadway (meters)
    pub road_width_m: f32,

    /// Width of the central island between the two roadways (meters)
    pub island_width_m: f32,

    /// Lanes painted on each roadway
    pub lanes_per_road: u32,

    /// Mesh subdivisions along the road
    /// Enough that the steepest profile still bends smoothly
    pub length_segments: u32,

    /// Mesh subdivisions across both roadways and the island
    pub width_segments: u32,
}

impl Default for RoadOptions {
    fn default() -> Self {
        Self {
            length_m: 400.0,
            road_width_m: 9.0,
            island_width_m: 2.0,
            lanes_per_road: 3,
            length_segments: 200,
            width_segments: 24,
        }
    }
}

impl RoadOptions {
    /// Total width from the outer edge of one roadway to the other (meters)
    pub fn total_width_m(&self) -> f32 {
        self.road_width_m * 2.0 + self.island_width_m
    }
}
