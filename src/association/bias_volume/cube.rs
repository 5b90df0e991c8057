// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::BiasVolume;
use crate::space::{sampling, ParticleSystem};
use glam::f64::DVec3;
use rand::{Rng, RngCore};

/// Axis-aligned cubic bonding region.
///
/// The cube of edge `edge` is centered at `b + offset`. The bond is symmetric:
/// `a` and `b` are bonded when either one lies in the other's cube, so the
/// region around a partner is the union of the cubes at `+offset` and
/// `-offset`. Insertion samples that union uniformly.
#[derive(Debug, Clone)]
pub struct BiasVolumeCube {
    edge: f64,
    offset: DVec3,
}

impl BiasVolumeCube {
    pub fn new(edge: f64, offset: DVec3) -> Self {
        assert!(edge > 0.0, "cube edge must be positive, got {edge}");
        Self { edge, offset }
    }

    /// A cube centered on the partner.
    pub fn centered(edge: f64) -> Self {
        Self::new(edge, DVec3::ZERO)
    }

    pub fn edge(&self) -> f64 {
        self.edge
    }

    pub fn offset(&self) -> DVec3 {
        self.offset
    }

    #[inline]
    fn in_cube(&self, dr: DVec3, center: DVec3) -> bool {
        (dr - center).abs().max_element() <= 0.5 * self.edge
    }

    fn in_union(&self, dr: DVec3) -> (bool, bool) {
        (self.in_cube(dr, self.offset), self.in_cube(dr, -self.offset))
    }

    fn overlap_volume(&self) -> f64 {
        let gap = (DVec3::splat(self.edge) - 2.0 * self.offset.abs()).max(DVec3::ZERO);
        gap.x * gap.y * gap.z
    }
}

impl BiasVolume for BiasVolumeCube {
    fn is_associated(&self, system: &ParticleSystem, a: usize, b: usize) -> bool {
        let (plus, minus) = self.in_union(system.separation(b, a));
        plus || minus
    }

    fn bias_volume(&self) -> f64 {
        2.0 * self.edge.powi(3) - self.overlap_volume()
    }

    fn bias_insert(&self, system: &mut ParticleSystem, a: usize, b: usize, rng: &mut dyn RngCore) {
        let half = 0.5 * self.edge;
        let dr = if self.offset == DVec3::ZERO {
            sampling::random_in_cube(half, rng)
        } else {
            loop {
                let center = if rng.gen::<bool>() {
                    self.offset
                } else {
                    -self.offset
                };
                let dr = center + sampling::random_in_cube(half, rng);
                let (plus, minus) = self.in_union(dr);
                // Points in both cubes are proposed from either side.
                if !(plus && minus) || rng.gen::<bool>() {
                    break dr;
                }
            }
        };
        let target = system.particle(b).position + dr;
        system.set_position(a, target);
    }

    fn capture_radius(&self) -> f64 {
        self.offset.length() + 0.5 * self.edge * 3f64.sqrt()
    }
}
