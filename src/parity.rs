//! Checks that the host formula and the generated shader agree.
//!
//! The host side evaluates the profile's expression trees directly. The
//! shader side runs the generated WGSL through naga and interprets the
//! resulting IR, so a bug in code generation shows up as a mismatch.

use std::f32::consts::PI;

use glam::Vec3;
use log::{debug, info};

use crate::error::{DistortionError, Result};
use crate::profile::DistortionProfile;
use crate::shader::{ShaderBindings, ShaderEvaluator};

/// Sample grid over progress and time
#[derive(Debug, Clone)]
pub struct ParityGrid {
    /// Samples across progress 0..=1
    pub progress_samples: usize,

    /// Samples across time 0..=time_max_s
    pub time_samples: usize,

    /// Last sampled time (seconds)
    pub time_max_s: f32,

    /// Allowed absolute difference per component
    pub tolerance: f32,
}

impl Default for ParityGrid {
    fn default() -> Self {
        Self {
            progress_samples: 33,
            time_samples: 17,
            time_max_s: 4.0 * PI,
            tolerance: 1e-4,
        }
    }
}

impl ParityGrid {
    pub fn progress_values(&self) -> Vec<f32> {
        spread(self.progress_samples, 1.0)
    }

    pub fn time_values(&self) -> Vec<f32> {
        spread(self.time_samples, self.time_max_s)
    }

    /// Every (progress, time) pair on the grid
    pub fn samples(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let progress = self.progress_values();
        self.time_values()
            .into_iter()
            .flat_map(move |t| progress.clone().into_iter().map(move |p| (p, t)))
    }

    /// Whether a shader result is close enough to the host result
    pub fn accepts(&self, host: Vec3, shader: Vec3) -> bool {
        error(host, shader) <= self.tolerance
    }
}

fn spread(count: usize, max: f32) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| max * i as f32 / (n - 1) as f32).collect(),
    }
}

fn error(host: Vec3, shader: Vec3) -> f32 {
    (host - shader).abs().max_element()
}

/// Outcome of a passing check
#[derive(Debug, Clone)]
pub struct ParityReport {
    pub id: String,
    pub samples: usize,
    pub max_error: f32,
}

/// Compare the profile's host formula with its generated shader
pub fn check_profile(profile: &DistortionProfile, grid: &ParityGrid) -> Result<ParityReport> {
    let evaluator = ShaderEvaluator::for_profile(profile)?;
    check_evaluator(profile, &evaluator, grid)
}

/// Compare the profile's host formula with an arbitrary shader source
pub fn check_source(
    profile: &DistortionProfile,
    source: &str,
    grid: &ParityGrid,
) -> Result<ParityReport> {
    let evaluator = ShaderEvaluator::new(source)?;
    check_evaluator(profile, &evaluator, grid)
}

fn check_evaluator(
    profile: &DistortionProfile,
    evaluator: &ShaderEvaluator,
    grid: &ParityGrid,
) -> Result<ParityReport> {
    let mut bindings = ShaderBindings::for_profile(profile, 0.0);
    let mut report = ParityReport {
        id: profile.id().to_string(),
        samples: 0,
        max_error: 0.0,
    };

    for (progress, time) in grid.samples() {
        bindings.set_time(time);
        let host = profile.displacement(progress, time);
        let shader = evaluator.get_distortion(progress, &bindings)?;

        if !grid.accepts(host, shader) {
            return Err(DistortionError::ParityMismatch {
                id: report.id,
                progress,
                time,
                host,
                shader,
                tolerance: grid.tolerance,
            });
        }
        report.samples += 1;
        report.max_error = report.max_error.max(error(host, shader));
    }

    debug!(
        "parity '{}': {} samples, max error {:e}",
        report.id, report.samples, report.max_error
    );
    Ok(report)
}

/// Run [`check_profile`] for every profile, stopping at the first failure
pub fn check_all<'a>(
    profiles: impl IntoIterator<Item = &'a DistortionProfile>,
    grid: &ParityGrid,
) -> Result<Vec<ParityReport>> {
    let mut reports = Vec::new();
    for profile in profiles {
        let report = check_profile(profile, grid)?;
        info!(
            "{}: host and shader agree on {} samples (max error {:e})",
            report.id, report.samples, report.max_error
        );
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRegistry;
    use crate::shader::module_source;

    #[test]
    fn test_default_grid_covers_range() {
        let grid = ParityGrid::default();
        let progress = grid.progress_values();
        let time = grid.time_values();

        assert_eq!(progress.first(), Some(&0.0));
        assert_eq!(progress.last(), Some(&1.0));
        assert_eq!(time.last(), Some(&(4.0 * PI)));
        assert_eq!(grid.samples().count(), 33 * 17);
    }

    #[test]
    fn test_every_builtin_profile_has_parity() {
        let registry = ProfileRegistry::builtin().unwrap();
        let grid = ParityGrid::default();

        let reports = check_all(registry.iter().map(|p| p.as_ref()), &grid).unwrap();

        assert_eq!(reports.len(), registry.len());
        for report in reports {
            assert_eq!(report.samples, 33 * 17);
            assert!(report.max_error <= grid.tolerance, "{:?}", report);
        }
    }

    #[test]
    fn test_detects_diverging_shader() {
        let registry = ProfileRegistry::builtin().unwrap();
        let xy = registry.select("xy").unwrap();

        // Same shader with the x anchor moved
        let source = module_source(&xy).replace(
            "getDistortionX(progress) - getDistortionX(0.02)",
            "getDistortionX(progress) - getDistortionX(0.0125)",
        );
        assert_ne!(source, module_source(&xy));

        let result = check_source(&xy, &source, &ParityGrid::default());
        match result {
            Err(DistortionError::ParityMismatch { id, progress, time, .. }) => {
                assert_eq!(id, "xy");
                assert_eq!((progress, time), (0.0, 0.0));
            }
            other => panic!("expected a parity mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_small_amplitude_drift() {
        let registry = ProfileRegistry::builtin().unwrap();
        let mountain = registry.select("mountain").unwrap();

        // x amplitude off by 0.009%: a few millimetres on a 60 m swing
        let source =
            module_source(&mountain).replacen("* uAmp.x)", "* (uAmp.x * 1.00009))", 1);
        assert_ne!(source, module_source(&mountain));

        let result = check_source(&mountain, &source, &ParityGrid::default());
        assert!(
            matches!(result, Err(DistortionError::ParityMismatch { ref id, .. }) if id == "mountain"),
            "{:?}",
            result
        );
    }

    #[test]
    fn test_tolerance_is_absolute() {
        let grid = ParityGrid::default();
        let host = Vec3::new(60.0, 0.0, 0.0);

        assert!(grid.accepts(host, host + Vec3::new(5e-5, 0.0, 0.0)));
        assert!(!grid.accepts(host, host + Vec3::new(5e-4, 0.0, 0.0)));
    }

    #[test]
    fn test_single_sample_grid() {
        let grid = ParityGrid {
            progress_samples: 1,
            time_samples: 1,
            ..Default::default()
        };
        assert_eq!(grid.samples().collect::<Vec<_>>(), vec![(0.0, 0.0)]);
    }
}
