// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Random geometric primitives shared by the bias volumes and the moves.
//
// Every sampler here is uniform over its target set (cube, shell, spherical
// cap or band, rotation group) so the acceptance ratios built on top of them
// only have to account for the volume of that set.

use glam::f64::{DQuat, DVec3};
use rand::{Rng, RngCore};
use std::f64::consts::TAU;

/// Uniform point on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> DVec3 {
    let z = 2.0 * rng.gen::<f64>() - 1.0;
    let phi = TAU * rng.gen::<f64>();
    let s = (1.0 - z * z).max(0.0).sqrt();
    DVec3::new(s * phi.cos(), s * phi.sin(), z)
}

/// Uniform unit vector `v` with `cos_lo <= v . axis <= cos_hi`.
///
/// The polar cosine is uniform on the band (Archimedes), the azimuth uniform
/// around `axis`, which must be normalized.
pub fn random_in_band(axis: DVec3, cos_lo: f64, cos_hi: f64, rng: &mut dyn RngCore) -> DVec3 {
    debug_assert!(cos_lo <= cos_hi, "empty band [{cos_lo}, {cos_hi}]");
    let cos_t = cos_lo + (cos_hi - cos_lo) * rng.gen::<f64>();
    let sin_t = (1.0 - cos_t * cos_t).max(0.0).sqrt();
    let phi = TAU * rng.gen::<f64>();
    let (u, v) = axis.any_orthonormal_pair();
    (axis * cos_t + (u * phi.cos() + v * phi.sin()) * sin_t).normalize()
}

/// Uniform unit vector inside the cap `v . axis >= cos_min`.
#[inline]
pub fn random_in_cone(axis: DVec3, cos_min: f64, rng: &mut dyn RngCore) -> DVec3 {
    random_in_band(axis, cos_min, 1.0, rng)
}

/// Uniform point in the cube `[-half, half]^3`.
pub fn random_in_cube(half: f64, rng: &mut dyn RngCore) -> DVec3 {
    DVec3::new(
        (2.0 * rng.gen::<f64>() - 1.0) * half,
        (2.0 * rng.gen::<f64>() - 1.0) * half,
        (2.0 * rng.gen::<f64>() - 1.0) * half,
    )
}

/// Uniform point in the shell `inner <= |r| <= outer`, by rejection from the
/// bounding cube.
pub fn random_shell_vector(inner: f64, outer: f64, rng: &mut dyn RngCore) -> DVec3 {
    let inner_sq = inner * inner;
    let outer_sq = outer * outer;
    loop {
        let r = random_in_cube(outer, rng);
        let r2 = r.length_squared();
        if r2 >= inner_sq && r2 <= outer_sq {
            return r;
        }
    }
}

/// Radius with density proportional to r^2 on `[inner, outer]`.
pub fn random_shell_radius(inner: f64, outer: f64, rng: &mut dyn RngCore) -> f64 {
    let lo = inner.powi(3);
    let hi = outer.powi(3);
    (lo + (hi - lo) * rng.gen::<f64>()).cbrt()
}

/// Uniformly distributed rotation (Shoemake's subgroup algorithm).
pub fn random_rotation(rng: &mut dyn RngCore) -> DQuat {
    let u1 = rng.gen::<f64>();
    let u2 = TAU * rng.gen::<f64>();
    let u3 = TAU * rng.gen::<f64>();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    DQuat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos()).normalize()
}

/// Rotation about a uniformly random axis by an angle uniform in
/// `[-max_angle, max_angle]`. The distribution is symmetric under inversion.
pub fn random_small_rotation(max_angle: f64, rng: &mut dyn RngCore) -> DQuat {
    let axis = random_unit_vector(rng);
    let angle = (2.0 * rng.gen::<f64>() - 1.0) * max_angle;
    DQuat::from_axis_angle(axis, angle)
}

/// A rotation mapping the body X axis onto `axis`, with a uniformly random spin
/// about `axis`.
pub fn orientation_with_axis(axis: DVec3, rng: &mut dyn RngCore) -> DQuat {
    let spin = DQuat::from_axis_angle(DVec3::X, TAU * rng.gen::<f64>());
    (DQuat::from_rotation_arc(DVec3::X, axis.normalize()) * spin).normalize()
}

/// Cosine of the angle between two (not necessarily normalized) vectors.
#[inline]
pub fn cos_between(a: DVec3, b: DVec3) -> f64 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom == 0.0 {
        return 1.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0)
}
