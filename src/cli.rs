//! Command-line argument parsing.

use clap::Parser;

use crate::parity::ParityGrid;
use crate::params::SceneConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "highway-lights")]
#[command(about = "Night highway bent by shader-driven distortion curves", long_about = None)]
pub struct Args {
    /// Distortion profile bending the road
    #[arg(long, value_name = "ID", default_value = "xy")]
    pub distortion: String,

    /// List the built-in distortion profiles and exit
    #[arg(long)]
    pub list: bool,

    /// Print the composed road shader for the selected profile and exit
    #[arg(long)]
    pub dump_shader: bool,

    /// Check host formulas against the generated shaders for every profile
    #[arg(long)]
    pub verify: bool,

    /// With --verify, also run the shaders on the GPU
    #[arg(long, requires = "verify")]
    pub gpu: bool,

    /// Parity tolerance (defaults to 1e-4, or 1e-2 on the GPU)
    #[arg(long, value_name = "TOLERANCE")]
    pub tolerance: Option<f32>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,
}

/// Driver math libraries are allowed this much slack
const GPU_TOLERANCE: f32 = 1e-2;

impl Args {
    /// Scene configuration from the selected profile and window size
    pub fn scene_config(&self) -> SceneConfig {
        let mut config = SceneConfig {
            distortion: self.distortion.clone(),
            ..Default::default()
        };
        config.render.window_width = self.width;
        config.render.window_height = self.height;
        config
    }

    /// Sample grid for the interpreted shader check
    pub fn parity_grid(&self) -> ParityGrid {
        let mut grid = ParityGrid::default();
        if let Some(tolerance) = self.tolerance {
            grid.tolerance = tolerance;
        }
        grid
    }

    /// Sample grid for the GPU check
    pub fn gpu_parity_grid(&self) -> ParityGrid {
        ParityGrid {
            tolerance: self.tolerance.unwrap_or(GPU_TOLERANCE),
            ..Default::default()
        }
    }
}
