//! The shipped, hand-tuned distortion profiles.
//!
//! Constants, operation order and baseline policies are kept per
//! profile; they are not instances of a common law.

use glam::{Vec2, Vec3, Vec4};

use super::{Baseline, DistortionProfile};
use crate::curve::{cos, nsin, pow_abs, sin, Component, Expr};
use crate::error::Result;

pub const U_FREQ: &str = "uFreq";
pub const U_AMP: &str = "uAmp";
pub const U_POW_Y: &str = "uPowY";

fn p() -> Expr {
    Expr::Progress
}

fn t() -> Expr {
    Expr::Time
}

fn freq(c: Component) -> Expr {
    Expr::uniform(U_FREQ, c)
}

fn amp(c: Component) -> Expr {
    Expr::uniform(U_AMP, c)
}

fn pow_y(c: Component) -> Expr {
    Expr::uniform(U_POW_Y, c)
}

/// `progress * PI * uFreq.c`
fn phase(c: Component) -> Expr {
    p() * Expr::PI * freq(c)
}

/// `PI * progress * uFreq.c`, the order the turbulent family uses
fn phase_pi_first(c: Component) -> Expr {
    Expr::PI * p() * freq(c)
}

/// All built-in profiles, in catalogue order
pub fn builtin_profiles() -> Result<Vec<DistortionProfile>> {
    Ok(vec![
        mountain()?,
        xy()?,
        long_race()?,
        turbulent()?,
        turbulent_still()?,
        deep()?,
        deep_still()?,
    ])
}

pub fn mountain() -> Result<DistortionProfile> {
    use Component::{X, Y, Z};
    let anchor = Baseline::Anchor(0.02);

    DistortionProfile::builder("mountain")
        .uniform(U_FREQ, Vec3::new(3.0, 6.0, 10.0))
        .uniform(U_AMP, Vec3::new(30.0, 30.0, 20.0))
        .x(cos(phase(X) + t()) * amp(X), anchor)
        .y(nsin(phase(Y) + t()) * amp(Y), anchor)
        .z(nsin(phase(Z) + t()) * amp(Z), anchor)
        .camera(Vec3::new(2.0, 2.0, 2.0), Vec3::new(0.0, 0.0, -5.0))
        .build()
}

pub fn xy() -> Result<DistortionProfile> {
    use Component::{X, Y};
    let anchor = Baseline::Anchor(0.02);

    DistortionProfile::builder("xy")
        .uniform(U_FREQ, Vec2::new(5.0, 2.0))
        .uniform(U_AMP, Vec2::new(25.0, 15.0))
        .x(cos(phase(X) + t()) * amp(X), anchor)
        .y(sin(phase(Y) + Expr::PI / 2.0 + t()) * amp(Y), anchor)
        .camera(Vec3::new(2.0, 0.4, 1.0), Vec3::new(0.0, 0.0, -3.0))
        .build()
}

pub fn long_race() -> Result<DistortionProfile> {
    use Component::{X, Y};
    let anchor = Baseline::Anchor(0.0125);

    DistortionProfile::builder("longRace")
        .uniform(U_FREQ, Vec2::new(2.0, 3.0))
        .uniform(U_AMP, Vec2::new(35.0, 10.0))
        .x(sin(phase(X) + t()) * amp(X), anchor)
        .y(sin(phase(Y) + t()) * amp(Y), anchor)
        .camera(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -5.0))
        .build()
}

const TURBULENT_FREQ: Vec4 = Vec4::new(4.0, 8.0, 8.0, 1.0);
const TURBULENT_AMP: Vec4 = Vec4::new(25.0, 5.0, 10.0, 10.0);

pub fn turbulent() -> Result<DistortionProfile> {
    use Component::{W, X, Y, Z};
    let step = Baseline::ForwardStep(0.007);

    let x = cos(phase_pi_first(X) + t()) * amp(X)
        + pow_abs(cos(phase_pi_first(Y) + t() * (freq(Y) / freq(X))), 2.0) * amp(Y);
    let y = -nsin(phase_pi_first(Z) + t()) * amp(Z)
        - pow_abs(nsin(phase_pi_first(W) + t() / (freq(Z) / freq(W))), 5.0) * amp(W);

    DistortionProfile::builder("turbulent")
        .uniform(U_FREQ, TURBULENT_FREQ)
        .uniform(U_AMP, TURBULENT_AMP)
        .x(x, step)
        .y(y, step)
        .camera(Vec3::new(-2.0, -5.0, 0.0), Vec3::new(0.0, 0.0, -10.0))
        .build()
}

pub fn turbulent_still() -> Result<DistortionProfile> {
    use Component::{W, X, Y, Z};
    let anchor = Baseline::Anchor(0.02);

    let x = cos(phase_pi_first(X)) * amp(X)
        + pow_abs(cos(phase_pi_first(Y) * (freq(Y) / freq(X))), 2.0) * amp(Y);
    let y = -nsin(phase_pi_first(Z)) * amp(Z)
        - pow_abs(nsin(phase_pi_first(W) / (freq(Z) / freq(W))), 5.0) * amp(W);

    DistortionProfile::builder("turbulentStill")
        .uniform(U_FREQ, TURBULENT_FREQ)
        .uniform(U_AMP, TURBULENT_AMP)
        .x(x, anchor)
        .y(y, anchor)
        .build()
}

const DEEP_FREQ: Vec2 = Vec2::new(4.0, 8.0);
const DEEP_AMP: Vec2 = Vec2::new(10.0, 20.0);
const DEEP_POW_Y: Vec2 = Vec2::new(20.0, 2.0);

fn deep_elevation() -> Expr {
    use Component::{X, Y};
    pow_abs(p() * pow_y(X), pow_y(Y))
}

pub fn deep() -> Result<DistortionProfile> {
    use Component::{X, Y};
    let step = Baseline::ForwardStep(0.01);

    DistortionProfile::builder("deep")
        .uniform(U_FREQ, DEEP_FREQ)
        .uniform(U_AMP, DEEP_AMP)
        .uniform(U_POW_Y, DEEP_POW_Y)
        .x(sin(phase(X) + t()) * amp(X), step)
        .y(deep_elevation() + sin(phase(Y) + t()) * amp(Y), step)
        .camera(Vec3::new(-2.0, -4.0, 0.0), Vec3::new(0.0, 0.0, -10.0))
        .build()
}

pub fn deep_still() -> Result<DistortionProfile> {
    use Component::{X, Y};

    DistortionProfile::builder("deepStill")
        .uniform(U_FREQ, DEEP_FREQ)
        .uniform(U_AMP, DEEP_AMP)
        .uniform(U_POW_Y, DEEP_POW_Y)
        .x(sin(phase(X)) * amp(X) * 2.0, Baseline::Anchor(0.02))
        .y(
            deep_elevation() + sin(phase(Y)) * amp(Y),
            Baseline::Anchor(0.05),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Axis;
    use std::f32::consts::PI;

    const TOLERANCE: f32 = 1e-4;

    fn nsin_ref(v: f32) -> f32 {
        v.sin() * 0.5 + 0.5
    }

    /// Formulas transcribed by hand from the shader sources, one per profile
    fn reference(id: &str, p: f32, t: f32) -> Vec3 {
        match id {
            "mountain" => {
                let (f, a) = (Vec3::new(3.0, 6.0, 10.0), Vec3::new(30.0, 30.0, 20.0));
                let fix = 0.02;
                Vec3::new(
                    (p * PI * f.x + t).cos() * a.x - (fix * PI * f.x + t).cos() * a.x,
                    nsin_ref(p * PI * f.y + t) * a.y - nsin_ref(fix * PI * f.y + t) * a.y,
                    nsin_ref(p * PI * f.z + t) * a.z - nsin_ref(fix * PI * f.z + t) * a.z,
                )
            }
            "xy" => {
                let (f, a) = (Vec2::new(5.0, 2.0), Vec2::new(25.0, 15.0));
                let fix = 0.02;
                Vec3::new(
                    (p * PI * f.x + t).cos() * a.x - (fix * PI * f.x + t).cos() * a.x,
                    (p * PI * f.y + PI / 2.0 + t).sin() * a.y
                        - (fix * PI * f.y + PI / 2.0 + t).sin() * a.y,
                    0.0,
                )
            }
            "longRace" => {
                let (f, a) = (Vec2::new(2.0, 3.0), Vec2::new(35.0, 10.0));
                let cam = 0.0125;
                Vec3::new(
                    (p * PI * f.x + t).sin() * a.x - (cam * PI * f.x + t).sin() * a.x,
                    (p * PI * f.y + t).sin() * a.y - (cam * PI * f.y + t).sin() * a.y,
                    0.0,
                )
            }
            "turbulent" => {
                let (f, a) = (TURBULENT_FREQ, TURBULENT_AMP);
                let get_x = |p: f32| {
                    (PI * p * f.x + t).cos() * a.x
                        + (PI * p * f.y + t * (f.y / f.x)).cos().powf(2.0) * a.y
                };
                let get_y = |p: f32| {
                    -nsin_ref(PI * p * f.z + t) * a.z
                        - nsin_ref(PI * p * f.w + t / (f.z / f.w)).powf(5.0) * a.w
                };
                Vec3::new(get_x(p) - get_x(p + 0.007), get_y(p) - get_y(p + 0.007), 0.0)
            }
            "turbulentStill" => {
                let (f, a) = (TURBULENT_FREQ, TURBULENT_AMP);
                let get_x = |p: f32| {
                    (PI * p * f.x).cos() * a.x
                        + (PI * p * f.y * (f.y / f.x)).cos().powf(2.0) * a.y
                };
                let get_y = |p: f32| {
                    -nsin_ref(PI * p * f.z) * a.z
                        - nsin_ref(PI * p * f.w / (f.z / f.w)).powf(5.0) * a.w
                };
                Vec3::new(get_x(p) - get_x(0.02), get_y(p) - get_y(0.02), 0.0)
            }
            "deep" => {
                let (f, a, pw) = (DEEP_FREQ, DEEP_AMP, DEEP_POW_Y);
                let get_x = |p: f32| (p * PI * f.x + t).sin() * a.x;
                let get_y = |p: f32| (p * pw.x).powf(pw.y) + (p * PI * f.y + t).sin() * a.y;
                Vec3::new(get_x(p) - get_x(p + 0.01), get_y(p) - get_y(p + 0.01), 0.0)
            }
            "deepStill" => {
                let (f, a, pw) = (DEEP_FREQ, DEEP_AMP, DEEP_POW_Y);
                let get_x = |p: f32| (p * PI * f.x).sin() * a.x * 2.0;
                let get_y = |p: f32| (p * pw.x).abs().powf(pw.y) + (p * PI * f.y).sin() * a.y;
                Vec3::new(get_x(p) - get_x(0.02), get_y(p) - get_y(0.05), 0.0)
            }
            other => panic!("no reference formula for {}", other),
        }
    }

    #[test]
    fn test_catalogue_ids_and_animation_flags() {
        let profiles = builtin_profiles().unwrap();
        let ids: Vec<_> = profiles.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "mountain",
                "xy",
                "longRace",
                "turbulent",
                "turbulentStill",
                "deep",
                "deepStill"
            ]
        );

        for profile in &profiles {
            let still = profile.id().ends_with("Still");
            assert_eq!(profile.is_animated(), !still, "{}", profile.id());
        }
    }

    #[test]
    fn test_host_formula_matches_transcribed_references() {
        for profile in builtin_profiles().unwrap() {
            for pi in 0..=40 {
                for ti in 0..=12 {
                    let progress = pi as f32 / 40.0;
                    let time = ti as f32 * (4.0 * PI / 12.0);
                    let expected = reference(profile.id(), progress, time);
                    let actual = profile.displacement(progress, time);
                    assert!(
                        (actual - expected).abs().max_element() <= TOLERANCE,
                        "{} at ({}, {}): {:?} vs {:?}",
                        profile.id(),
                        progress,
                        time,
                        actual,
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn test_xy_scenario_at_origin() {
        let profile = xy().unwrap();
        let d = profile.host_formula().unwrap().eval(0.0, 0.0);

        let x = (0.0_f32).cos() * 25.0 - (0.02 * PI * 5.0).cos() * 25.0;
        let y = (PI / 2.0).sin() * 15.0 - (0.02 * PI * 2.0 + PI / 2.0).sin() * 15.0;
        assert!((d.x - x).abs() < 1e-5, "{} vs {}", d.x, x);
        assert!((d.y - y).abs() < 1e-5, "{} vs {}", d.y, y);
        assert_eq!(d.z, 0.0);
        assert!(d.x > 0.0 && d.y > 0.0);
    }

    #[test]
    fn test_deep_still_at_origin() {
        let profile = deep_still().unwrap();
        let d = profile.displacement(0.0, 0.0);

        let x = (0.0_f32).sin() * 10.0 * 2.0 - (0.02 * PI * 4.0).sin() * 10.0 * 2.0;
        let y = 0.0_f32.powf(2.0)
            - ((0.05_f32 * 20.0).powf(2.0) + (0.05 * PI * 8.0).sin() * 20.0);
        assert!((d.x - x).abs() < 1e-5, "{} vs {}", d.x, x);
        assert!((d.y - y).abs() < 1e-4, "{} vs {}", d.y, y);
        assert_eq!(d.z, 0.0);

        // Still: identical at every time
        assert_eq!(profile.displacement(0.0, 7.5), d);
    }

    #[test]
    fn test_anchored_axes_vanish_at_their_anchor() {
        for profile in builtin_profiles().unwrap() {
            for axis in Axis::ALL {
                let Some(curve) = profile.axis(axis) else {
                    continue;
                };
                let Baseline::Anchor(anchor) = curve.baseline else {
                    continue;
                };
                for ti in 0..32 {
                    let time = ti as f32 * 0.4;
                    let d = profile.displacement(anchor, time);
                    assert_eq!(
                        d.to_array()[axis.index()],
                        0.0,
                        "{} axis {} at t={}",
                        profile.id(),
                        axis.suffix(),
                        time
                    );
                }
            }
        }
    }

    #[test]
    fn test_forward_step_stays_local() {
        // |f(p) - f(p + s)| <= s * max|f'|
        let profile = turbulent().unwrap();
        let (f, a) = (TURBULENT_FREQ, TURBULENT_AMP);
        let s = 0.007;
        let bound_x = s * PI * (f.x * a.x + f.y * a.y) + 1e-4;
        let bound_y = s * PI * (f.z * a.z * 0.5 + f.w * a.w * 2.5) + 1e-4;

        for pi in 0..=100 {
            for ti in 0..=16 {
                let d = profile.displacement(pi as f32 / 100.0, ti as f32 * 0.8);
                assert!(d.x.abs() <= bound_x, "x {} > {}", d.x, bound_x);
                assert!(d.y.abs() <= bound_y, "y {} > {}", d.y, bound_y);
            }
        }
    }

    #[test]
    fn test_deep_forward_step_stays_local() {
        let profile = deep().unwrap();
        let (f, a, pw) = (DEEP_FREQ, DEEP_AMP, DEEP_POW_Y);
        let s = 0.01;
        let bound_x = s * PI * f.x * a.x + 1e-3;
        // pow term slope peaks at the far end of the step, p + s = 1 + s
        let pow_slope = pw.y * pw.x.powf(pw.y) * (1.0 + s);
        let bound_y = s * (pow_slope + PI * f.y * a.y) + 1e-3;

        for pi in 0..=100 {
            for ti in 0..=16 {
                let d = profile.displacement(pi as f32 / 100.0, ti as f32 * 0.8);
                assert!(d.x.abs() <= bound_x, "x {} > {}", d.x, bound_x);
                assert!(d.y.abs() <= bound_y, "y {} > {}", d.y, bound_y);
            }
        }
    }

    #[test]
    fn test_baselines_are_not_unified() {
        let offsets = |p: DistortionProfile| p.reference_offsets();
        assert_eq!(offsets(xy().unwrap())[0], Some(Baseline::Anchor(0.02)));
        assert_eq!(
            offsets(long_race().unwrap())[0],
            Some(Baseline::Anchor(0.0125))
        );
        assert_eq!(
            offsets(turbulent().unwrap())[1],
            Some(Baseline::ForwardStep(0.007))
        );
        assert_eq!(
            offsets(deep().unwrap())[0],
            Some(Baseline::ForwardStep(0.01))
        );
        assert_eq!(
            offsets(deep_still().unwrap()),
            [
                Some(Baseline::Anchor(0.02)),
                Some(Baseline::Anchor(0.05)),
                None
            ]
        );
    }
}
