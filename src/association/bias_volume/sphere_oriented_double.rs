// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{cap_fraction, shell_volume, BiasVolume};
use crate::space::{sampling, ParticleSystem};
use rand::{Rng, RngCore};

/// Two antipodal sites per particle, at `+axis` and `-axis`.
///
/// `a` and `b` are bonded when their distance lies in `[inner, outer]`, one of
/// a's sites faces b and one of b's sites faces a, each to within `theta`.
/// `theta` must stay below 90 degrees so the two caps on a particle never
/// overlap.
#[derive(Debug, Clone)]
pub struct BiasVolumeSphereOrientedDoubleSites {
    inner: f64,
    outer: f64,
    cos_theta: f64,
}

impl BiasVolumeSphereOrientedDoubleSites {
    pub fn new(inner: f64, outer: f64, theta: f64) -> Self {
        assert!(
            0.0 <= inner && inner < outer,
            "invalid shell [{inner}, {outer}]"
        );
        assert!(
            theta > 0.0 && theta < std::f64::consts::FRAC_PI_2,
            "double-site cones must not overlap, got half-angle {theta}"
        );
        Self {
            inner,
            outer,
            cos_theta: theta.cos(),
        }
    }

    pub fn cos_theta(&self) -> f64 {
        self.cos_theta
    }
}

impl BiasVolume for BiasVolumeSphereOrientedDoubleSites {
    fn is_associated(&self, system: &ParticleSystem, a: usize, b: usize) -> bool {
        let dr = system.separation(a, b);
        let r2 = dr.length_squared();
        if r2 < self.inner * self.inner || r2 > self.outer * self.outer || r2 == 0.0 {
            return false;
        }
        let limit = self.cos_theta * r2.sqrt();
        system.particle(a).direction().dot(dr).abs() >= limit
            && system.particle(b).direction().dot(dr).abs() >= limit
    }

    fn bias_volume(&self) -> f64 {
        let f = 2.0 * cap_fraction(self.cos_theta);
        shell_volume(self.inner, self.outer) * f * f
    }

    fn bias_insert(&self, system: &mut ParticleSystem, a: usize, b: usize, rng: &mut dyn RngCore) {
        let partner = *system.particle(b);
        let site = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        let u = sampling::random_in_cone(partner.direction() * site, self.cos_theta, rng);
        let r = sampling::random_shell_radius(self.inner, self.outer, rng);
        let own_site = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        let axis = sampling::random_in_cone(-u, self.cos_theta, rng) * own_site;
        system.set_position(a, partner.position + u * r);
        system.set_orientation(a, sampling::orientation_with_axis(axis, rng));
    }

    fn capture_radius(&self) -> f64 {
        self.outer
    }
}
