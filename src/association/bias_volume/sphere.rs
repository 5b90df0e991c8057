// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{shell_volume, BiasVolume};
use crate::space::{sampling, ParticleSystem};
use rand::RngCore;

/// Isotropic bonding shell: two particles are bonded when their distance lies
/// in `[inner, outer]`.
#[derive(Debug, Clone)]
pub struct BiasVolumeSphere {
    inner: f64,
    outer: f64,
}

impl BiasVolumeSphere {
    pub fn new(inner: f64, outer: f64) -> Self {
        assert!(
            0.0 <= inner && inner < outer,
            "invalid shell [{inner}, {outer}]"
        );
        Self { inner, outer }
    }

    pub fn inner(&self) -> f64 {
        self.inner
    }

    pub fn outer(&self) -> f64 {
        self.outer
    }
}

impl BiasVolume for BiasVolumeSphere {
    fn is_associated(&self, system: &ParticleSystem, a: usize, b: usize) -> bool {
        let r2 = system.separation(b, a).length_squared();
        r2 >= self.inner * self.inner && r2 <= self.outer * self.outer
    }

    fn bias_volume(&self) -> f64 {
        shell_volume(self.inner, self.outer)
    }

    fn bias_insert(&self, system: &mut ParticleSystem, a: usize, b: usize, rng: &mut dyn RngCore) {
        let dr = sampling::random_shell_vector(self.inner, self.outer, rng);
        let target = system.particle(b).position + dr;
        system.set_position(a, target);
    }

    fn capture_radius(&self) -> f64 {
        self.outer
    }
}
