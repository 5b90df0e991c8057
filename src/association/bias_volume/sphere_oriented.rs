// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{cap_fraction, shell_volume, BiasVolume};
use crate::space::{sampling, ParticleSystem};
use rand::RngCore;

/// Single-site directional bond.
///
/// Each particle carries one site along its axis. `a` and `b` are bonded when
/// their distance lies in `[inner, outer]` and each axis points at the other
/// particle to within the half-angle `theta`.
#[derive(Debug, Clone)]
pub struct BiasVolumeSphereOriented {
    inner: f64,
    outer: f64,
    cos_theta: f64,
}

impl BiasVolumeSphereOriented {
    pub fn new(inner: f64, outer: f64, theta: f64) -> Self {
        assert!(
            0.0 <= inner && inner < outer,
            "invalid shell [{inner}, {outer}]"
        );
        assert!(
            theta > 0.0 && theta <= std::f64::consts::PI,
            "cone half-angle out of range: {theta}"
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

impl BiasVolume for BiasVolumeSphereOriented {
    fn is_associated(&self, system: &ParticleSystem, a: usize, b: usize) -> bool {
        let dr = system.separation(a, b);
        let r2 = dr.length_squared();
        if r2 < self.inner * self.inner || r2 > self.outer * self.outer || r2 == 0.0 {
            return false;
        }
        let r = r2.sqrt();
        let ea = system.particle(a).direction();
        if ea.dot(dr) < self.cos_theta * r {
            return false;
        }
        let eb = system.particle(b).direction();
        -eb.dot(dr) >= self.cos_theta * r
    }

    fn bias_volume(&self) -> f64 {
        let f = cap_fraction(self.cos_theta);
        shell_volume(self.inner, self.outer) * f * f
    }

    fn bias_insert(&self, system: &mut ParticleSystem, a: usize, b: usize, rng: &mut dyn RngCore) {
        let partner = *system.particle(b);
        let u = sampling::random_in_cone(partner.direction(), self.cos_theta, rng);
        let r = sampling::random_shell_radius(self.inner, self.outer, rng);
        let axis = sampling::random_in_cone(-u, self.cos_theta, rng);
        system.set_position(a, partner.position + u * r);
        system.set_orientation(a, sampling::orientation_with_axis(axis, rng));
    }

    fn capture_radius(&self) -> f64 {
        self.outer
    }
}
