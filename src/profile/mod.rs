//! Distortion profiles: named curve bundles that bend the road on the GPU and
//! steer the camera on the host.
//!
//! A profile is built once from literal parameters and never mutated. Each
//! axis is an [`Expr`] plus a [`Baseline`]; the same pair produces both the
//! WGSL `getDistortion` fragment and the host formula.

mod presets;
mod registry;
mod uniforms;

use glam::Vec3;

use crate::curve::{EvalContext, Expr};
use crate::error::{DistortionError, Result};

pub use presets::builtin_profiles;
pub use registry::ProfileRegistry;
pub use uniforms::{UniformSet, UniformValue};

/// How a curve is shifted so the road start carries no net displacement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// Subtract the curve's value at a fixed progress
    Anchor(f32),
    /// Subtract the curve's value a fixed step further along the road
    ForwardStep(f32),
}

impl Baseline {
    /// Progress at which the baseline is sampled for a given progress
    pub fn reference(&self, progress: f32) -> f32 {
        match self {
            Self::Anchor(anchor) => *anchor,
            Self::ForwardStep(step) => progress + *step,
        }
    }

    pub fn epsilon(&self) -> f32 {
        match self {
            Self::Anchor(v) | Self::ForwardStep(v) => *v,
        }
    }

    /// Expression for the reference progress in WGSL
    pub fn reference_wgsl(&self) -> Expr {
        match self {
            Self::Anchor(anchor) => Expr::Const(*anchor),
            Self::ForwardStep(step) => Expr::Progress + *step,
        }
    }
}

/// Road axis a curve displaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Suffix of the per-axis helper in WGSL (`getDistortionX`, ...)
    pub fn suffix(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

/// One axis of a profile: raw curve plus baseline policy
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCurve {
    pub expr: Expr,
    pub baseline: Baseline,
}

impl AxisCurve {
    pub fn eval(&self, progress: f32, time: f32, uniforms: &UniformSet) -> f32 {
        let at = |p: f32| {
            self.expr.eval(&EvalContext {
                progress: p,
                time,
                uniforms,
            })
        };
        at(progress) - at(self.baseline.reference(progress))
    }
}

/// Host-only scale-then-translate from displacement to camera look-at delta
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAtTransform {
    pub amplitude: Vec3,
    pub offset: Vec3,
}

impl LookAtTransform {
    pub fn apply(&self, displacement: Vec3) -> Vec3 {
        displacement * self.amplitude + self.offset
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistortionProfile {
    id: String,
    uniforms: UniformSet,
    axes: [Option<AxisCurve>; 3],
    animated: bool,
    look_at: Option<LookAtTransform>,
}

impl DistortionProfile {
    pub fn builder(id: &str) -> ProfileBuilder {
        ProfileBuilder {
            id: id.to_string(),
            uniforms: UniformSet::new(),
            axes: [None, None, None],
            look_at: None,
            problems: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn axis(&self, axis: Axis) -> Option<&AxisCurve> {
        self.axes[axis.index()].as_ref()
    }

    /// Whether the curve moves with time and drives the camera
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    pub fn look_at(&self) -> Option<&LookAtTransform> {
        self.look_at.as_ref()
    }

    /// Per-axis baselines, `None` for axes the profile leaves at zero
    pub fn reference_offsets(&self) -> [Option<Baseline>; 3] {
        Axis::ALL.map(|axis| self.axis(axis).map(|curve| curve.baseline))
    }

    /// Host twin of the shader's `getDistortion`; absent for still profiles
    pub fn host_formula(&self) -> Option<HostFormula<'_>> {
        self.animated.then_some(HostFormula { profile: self })
    }

    /// WGSL fragment declaring this profile's uniforms and `getDistortion`
    pub fn shader_formula(&self) -> String {
        crate::shader::distortion_fragment(self)
    }

    /// Displacement exactly as the shader computes it, for any profile
    pub(crate) fn displacement(&self, progress: f32, time: f32) -> Vec3 {
        let component = |axis: Axis| {
            self.axis(axis)
                .map_or(0.0, |curve| curve.eval(progress, time, &self.uniforms))
        };
        Vec3::new(component(Axis::X), component(Axis::Y), component(Axis::Z))
    }
}

/// Host-side evaluation of an animated profile
#[derive(Debug, Clone, Copy)]
pub struct HostFormula<'a> {
    profile: &'a DistortionProfile,
}

impl HostFormula<'_> {
    pub fn eval(&self, progress: f32, time: f32) -> Vec3 {
        self.profile.displacement(progress, time)
    }
}

/// Collects a profile's parts and validates them as a whole in [`build`](Self::build)
pub struct ProfileBuilder {
    id: String,
    uniforms: UniformSet,
    axes: [Option<AxisCurve>; 3],
    look_at: Option<LookAtTransform>,
    problems: Vec<String>,
}

impl ProfileBuilder {
    pub fn uniform(mut self, name: &'static str, value: impl Into<UniformValue>) -> Self {
        if !self.uniforms.push(name, value.into()) {
            self.problems.push(format!("uniform '{}' declared twice", name));
        }
        self
    }

    pub fn axis(mut self, axis: Axis, expr: Expr, baseline: Baseline) -> Self {
        self.axes[axis.index()] = Some(AxisCurve { expr, baseline });
        self
    }

    pub fn x(self, expr: Expr, baseline: Baseline) -> Self {
        self.axis(Axis::X, expr, baseline)
    }

    pub fn y(self, expr: Expr, baseline: Baseline) -> Self {
        self.axis(Axis::Y, expr, baseline)
    }

    pub fn z(self, expr: Expr, baseline: Baseline) -> Self {
        self.axis(Axis::Z, expr, baseline)
    }

    /// Mark the profile as animated and give it a camera look-at transform
    pub fn camera(mut self, amplitude: Vec3, offset: Vec3) -> Self {
        self.look_at = Some(LookAtTransform { amplitude, offset });
        self
    }

    pub fn build(mut self) -> Result<DistortionProfile> {
        let animated = self.look_at.is_some();

        if self.axes.iter().all(Option::is_none) {
            self.problems.push("no axis curves".to_string());
        }

        for (name, value) in self.uniforms.iter() {
            if !value.to_padded().iter().all(|c| c.is_finite()) {
                self.problems
                    .push(format!("uniform '{}' has non-finite components", name));
            }
        }

        for axis in Axis::ALL {
            let Some(curve) = &self.axes[axis.index()] else {
                continue;
            };

            for r in curve.expr.uniform_refs() {
                match self.uniforms.get(r.name) {
                    None => self.problems.push(format!(
                        "axis {} reads undeclared uniform '{}'",
                        axis.suffix(),
                        r.name
                    )),
                    Some(value) if value.component(r.component).is_none() => {
                        self.problems.push(format!(
                            "axis {} reads {}.{} but '{}' has {} components",
                            axis.suffix(),
                            r.name,
                            r.component.swizzle(),
                            r.name,
                            value.arity()
                        ))
                    }
                    Some(_) => {}
                }
            }

            let finite = curve.expr.constants().iter().all(|c| c.is_finite())
                && curve.baseline.epsilon().is_finite();
            if !finite {
                self.problems
                    .push(format!("axis {} has a non-finite constant", axis.suffix()));
            }

            if !animated && curve.expr.uses_time() {
                self.problems.push(format!(
                    "axis {} depends on time but the profile has no camera transform",
                    axis.suffix()
                ));
            }
        }

        if let Some(look_at) = &self.look_at {
            if !(look_at.amplitude.is_finite() && look_at.offset.is_finite()) {
                self.problems
                    .push("look-at transform is not finite".to_string());
            }
        }

        if !self.problems.is_empty() {
            return Err(DistortionError::invalid(&self.id, self.problems.join("; ")));
        }

        Ok(DistortionProfile {
            id: self.id,
            uniforms: self.uniforms,
            axes: self.axes,
            animated,
            look_at: self.look_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{cos, Component};
    use glam::{Vec2, Vec3};

    fn wave(component: Component) -> Expr {
        cos(Expr::Progress * Expr::uniform("uFreq", component) + Expr::Time)
    }

    #[test]
    fn test_builder_rejects_component_beyond_arity() {
        let err = DistortionProfile::builder("broken")
            .uniform("uFreq", Vec2::new(1.0, 2.0))
            .x(wave(Component::Z), Baseline::Anchor(0.02))
            .camera(Vec3::ONE, Vec3::ZERO)
            .build()
            .unwrap_err();

        match err {
            DistortionError::InvalidProfile { id, reason } => {
                assert_eq!(id, "broken");
                assert!(reason.contains("uFreq.z"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_builder_rejects_undeclared_uniform_and_duplicates() {
        let err = DistortionProfile::builder("broken")
            .uniform("uAmp", Vec2::ONE)
            .uniform("uAmp", Vec2::ONE)
            .x(wave(Component::X), Baseline::Anchor(0.02))
            .camera(Vec3::ONE, Vec3::ZERO)
            .build()
            .unwrap_err();

        let DistortionError::InvalidProfile { reason, .. } = err else {
            panic!("expected InvalidProfile");
        };
        assert!(reason.contains("declared twice"));
        assert!(reason.contains("undeclared uniform 'uFreq'"));
    }

    #[test]
    fn test_still_profile_must_not_use_time() {
        let result = DistortionProfile::builder("still")
            .uniform("uFreq", Vec2::ONE)
            .x(wave(Component::X), Baseline::Anchor(0.02))
            .build();
        assert!(matches!(result, Err(DistortionError::InvalidProfile { .. })));
    }

    #[test]
    fn test_profile_without_axes_is_invalid() {
        let result = DistortionProfile::builder("empty")
            .uniform("uFreq", Vec2::ONE)
            .build();
        assert!(matches!(result, Err(DistortionError::InvalidProfile { .. })));
    }

    #[test]
    fn test_host_formula_only_for_animated_profiles() {
        let still = DistortionProfile::builder("still")
            .x(Expr::Progress * 2.0, Baseline::Anchor(0.5))
            .build()
            .unwrap();
        assert!(!still.is_animated());
        assert!(still.host_formula().is_none());
        assert!(still.look_at().is_none());

        let animated = DistortionProfile::builder("moving")
            .x(Expr::Progress + Expr::Time, Baseline::ForwardStep(0.25))
            .camera(Vec3::ONE, Vec3::ZERO)
            .build()
            .unwrap();
        let formula = animated.host_formula().unwrap();
        // Linear curve: f(p) - f(p + step) is -step everywhere
        assert_eq!(formula.eval(0.5, 3.0), Vec3::new(-0.25, 0.0, 0.0));
    }

    #[test]
    fn test_anchor_baseline_zeroes_curve_at_anchor() {
        let profile = DistortionProfile::builder("anchored")
            .uniform("uFreq", Vec2::new(3.0, 1.0))
            .y(wave(Component::X), Baseline::Anchor(0.3))
            .camera(Vec3::ONE, Vec3::ZERO)
            .build()
            .unwrap();
        for t in 0..20 {
            let d = profile.displacement(0.3, t as f32 * 0.7);
            assert_eq!(d, Vec3::ZERO);
        }
        assert_eq!(
            profile.reference_offsets(),
            [None, Some(Baseline::Anchor(0.3)), None]
        );
    }

    #[test]
    fn test_look_at_is_elementwise_scale_then_translate() {
        let transform = LookAtTransform {
            amplitude: Vec3::new(2.0, 0.4, 1.0),
            offset: Vec3::new(0.0, 0.0, -3.0),
        };
        assert_eq!(
            transform.apply(Vec3::new(1.0, 5.0, 2.0)),
            Vec3::new(2.0, 2.0, -1.0)
        );
    }
}
