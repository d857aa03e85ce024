//! WGSL generation for distortion profiles and composition of the programs
//! that use them.
//!
//! Every program starts with the shared prelude declaring `uTime`, followed
//! by the profile fragment (uniform declarations, `nsin`, per-axis helpers
//! and `getDistortion`), followed by the entry points of the consumer.

mod eval;

use crate::curve::primitives::NSIN_WGSL;
use crate::error::{DistortionError, Result};
use crate::profile::{Axis, DistortionProfile};

pub use eval::{ShaderBindings, ShaderEvaluator};

/// Bind group holding the shared time uniform
pub const TIME_GROUP: u32 = 0;
/// Binding of `uTime` inside [`TIME_GROUP`]
pub const TIME_BINDING: u32 = 0;
/// Bind group holding the profile's own uniforms, one binding per uniform
pub const DISTORTION_GROUP: u32 = 1;

/// Declarations every consumer of a distortion fragment provides
pub const PRELUDE: &str = "@group(0) @binding(0) var<uniform> uTime: f32;\n";

const ROAD_WGSL: &str = include_str!("road.wgsl");
const PROBE_WGSL: &str = include_str!("probe.wgsl");

/// Uniform declarations plus `getDistortion(progress) -> vec3<f32>`
pub fn distortion_fragment(profile: &DistortionProfile) -> String {
    let mut out = format!("// Distortion profile: {}\n", profile.id());

    for (slot, (name, value)) in profile.uniforms().iter().enumerate() {
        out.push_str(&format!(
            "@group({}) @binding({}) var<uniform> {}: {};\n",
            DISTORTION_GROUP,
            slot,
            name,
            value.wgsl_type()
        ));
    }

    out.push('\n');
    out.push_str(NSIN_WGSL);

    for axis in Axis::ALL {
        if let Some(curve) = profile.axis(axis) {
            out.push_str(&format!(
                "\nfn getDistortion{}(progress: f32) -> f32 {{\n    return {};\n}}\n",
                axis.suffix(),
                curve.expr.to_wgsl()
            ));
        }
    }

    let components: Vec<String> = Axis::ALL
        .iter()
        .map(|&axis| match profile.axis(axis) {
            Some(curve) => format!(
                "getDistortion{s}(progress) - getDistortion{s}({r})",
                s = axis.suffix(),
                r = curve.baseline.reference_wgsl().to_wgsl()
            ),
            None => "0.0".to_string(),
        })
        .collect();

    out.push_str("\nfn getDistortion(progress: f32) -> vec3<f32> {\n    return vec3<f32>(\n        ");
    out.push_str(&components.join(",\n        "));
    out.push_str("\n    );\n}\n");
    out
}

/// Prelude and fragment only: enough to evaluate `getDistortion`
pub fn module_source(profile: &DistortionProfile) -> String {
    format!("{}\n{}", PRELUDE, distortion_fragment(profile))
}

/// Full road program: displaces every road vertex by the profile's curve
pub fn road_program(profile: &DistortionProfile) -> String {
    format!("{}\n{}", module_source(profile), ROAD_WGSL)
}

/// Compute program writing `getDistortion` for a list of progress values
pub fn probe_program(profile: &DistortionProfile) -> String {
    format!("{}\n{}", module_source(profile), PROBE_WGSL)
}

/// Parse and validate WGSL with naga
pub fn validate(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| DistortionError::Shader(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| DistortionError::Shader(e.emit_to_string(source)))?;

    Ok(module)
}
