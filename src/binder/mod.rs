//! Pushes a profile's uniform values and the shared `uTime` to the shader.
//!
//! The binder is backend-agnostic: anything implementing [`UniformTarget`]
//! can receive the values. [`GpuUniforms`] and [`QueueTarget`] are the wgpu
//! implementation used by the renderer and the GPU probe.

mod gpu;

use log::{debug, trace};

use crate::error::Result;
use crate::profile::{DistortionProfile, UniformValue};

pub use gpu::{GpuUniforms, QueueTarget};

/// Destination for uniform uploads
pub trait UniformTarget {
    /// Write one profile uniform; `slot` is its binding index in the
    /// distortion bind group
    fn write_uniform(&mut self, slot: u32, name: &str, value: &UniformValue) -> Result<()>;

    /// Write the shared time uniform (seconds)
    fn write_time(&mut self, time_s: f32);
}

/// Tracks which profile is bound and the time last pushed to the shader
#[derive(Debug, Default)]
pub struct UniformBinder {
    bound: Option<String>,
    last_time: Option<f32>,
}

impl UniformBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload every uniform of `profile` in declaration order
    pub fn bind(
        &mut self,
        profile: &DistortionProfile,
        target: &mut dyn UniformTarget,
    ) -> Result<()> {
        // A failed upload leaves nothing marked as bound
        self.bound = None;
        for (slot, (name, value)) in profile.uniforms().iter().enumerate() {
            target.write_uniform(slot as u32, name, value)?;
            debug!(
                "'{}' uniform {} -> binding {}: {:?}",
                profile.id(),
                name,
                slot,
                &value.to_padded()[..value.arity()]
            );
        }
        self.bound = Some(profile.id().to_string());
        Ok(())
    }

    /// Upload only when a different profile is currently bound.
    /// Returns whether an upload happened.
    pub fn ensure_bound(
        &mut self,
        profile: &DistortionProfile,
        target: &mut dyn UniformTarget,
    ) -> Result<bool> {
        if self.bound.as_deref() == Some(profile.id()) {
            return Ok(false);
        }
        self.bind(profile, target)?;
        Ok(true)
    }

    /// Forget the bound profile so the next `ensure_bound` uploads again
    pub fn invalidate(&mut self) {
        self.bound = None;
    }

    /// Push this frame's time; the host must evaluate at the same value
    pub fn tick(&mut self, time_s: f32, target: &mut dyn UniformTarget) {
        target.write_time(time_s);
        trace!("uTime = {}", time_s);
        self.last_time = Some(time_s);
    }

    pub fn last_time(&self) -> Option<f32> {
        self.last_time
    }

    pub fn bound_profile(&self) -> Option<&str> {
        self.bound.as_deref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DistortionError;
    use crate::profile::ProfileRegistry;

    /// Records every upload instead of touching a GPU
    #[derive(Default)]
    pub(crate) struct RecordingTarget {
        pub uniforms: Vec<(u32, String, [f32; 4])>,
        pub times: Vec<f32>,
        pub fail_on: Option<&'static str>,
    }

    impl UniformTarget for RecordingTarget {
        fn write_uniform(&mut self, slot: u32, name: &str, value: &UniformValue) -> Result<()> {
            if self.fail_on == Some(name) {
                return Err(DistortionError::Gpu(format!("rejected {}", name)));
            }
            self.uniforms.push((slot, name.to_string(), value.to_padded()));
            Ok(())
        }

        fn write_time(&mut self, time_s: f32) {
            self.times.push(time_s);
        }
    }

    #[test]
    fn test_bind_uploads_in_declaration_order() {
        let registry = ProfileRegistry::builtin().unwrap();
        let deep = registry.select("deep").unwrap();
        let mut binder = UniformBinder::new();
        let mut target = RecordingTarget::default();

        binder.bind(&deep, &mut target).unwrap();

        let names: Vec<_> = target
            .uniforms
            .iter()
            .map(|(slot, name, _)| (*slot, name.as_str()))
            .collect();
        assert_eq!(names, vec![(0, "uFreq"), (1, "uAmp"), (2, "uPowY")]);
        assert_eq!(target.uniforms[1].2, [10.0, 20.0, 0.0, 0.0]);
        assert_eq!(binder.bound_profile(), Some("deep"));
    }

    #[test]
    fn test_ensure_bound_skips_same_profile() {
        let registry = ProfileRegistry::builtin().unwrap();
        let xy = registry.select("xy").unwrap();
        let mountain = registry.select("mountain").unwrap();
        let mut binder = UniformBinder::new();
        let mut target = RecordingTarget::default();

        assert!(binder.ensure_bound(&xy, &mut target).unwrap());
        assert!(!binder.ensure_bound(&xy, &mut target).unwrap());
        assert_eq!(target.uniforms.len(), 2);

        assert!(binder.ensure_bound(&mountain, &mut target).unwrap());
        assert_eq!(target.uniforms.len(), 4);

        binder.invalidate();
        assert!(binder.ensure_bound(&mountain, &mut target).unwrap());
    }

    #[test]
    fn test_failed_bind_leaves_nothing_bound() {
        let registry = ProfileRegistry::builtin().unwrap();
        let xy = registry.select("xy").unwrap();
        let mut binder = UniformBinder::new();
        let mut target = RecordingTarget {
            fail_on: Some("uAmp"),
            ..Default::default()
        };

        assert!(binder.bind(&xy, &mut target).is_err());
        assert_eq!(binder.bound_profile(), None);
    }

    #[test]
    fn test_tick_records_time() {
        let mut binder = UniformBinder::new();
        let mut target = RecordingTarget::default();
        assert_eq!(binder.last_time(), None);

        binder.tick(1.5, &mut target);
        binder.tick(2.25, &mut target);

        assert_eq!(target.times, vec![1.5, 2.25]);
        assert_eq!(binder.last_time(), Some(2.25));
    }
}
