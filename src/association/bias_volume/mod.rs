// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Geometric bonding regions.
//
// A bias volume answers two questions about a pair of particles: are they
// bonded (`is_associated`), and how large is the region of configuration space
// (position times orientation fraction) in which they would be. It can also
// place a particle inside its partner's bonding region (`bias_insert`), which is
// the proposal the bonding half of the UB move is built on.

pub mod cube;
pub mod docking;
pub mod sphere;
pub mod sphere_oriented;
pub mod sphere_oriented_double;

pub use cube::BiasVolumeCube;
pub use docking::{BiasVolumeDocking, DockingSites};
pub use sphere::BiasVolumeSphere;
pub use sphere_oriented::BiasVolumeSphereOriented;
pub use sphere_oriented_double::BiasVolumeSphereOrientedDoubleSites;

use crate::space::ParticleSystem;
use rand::RngCore;
use std::f64::consts::PI;

/// Bonding predicate plus a sampler for the matching region.
pub trait BiasVolume {
    /// Whether particles `a` and `b` are bonded in the current configuration.
    /// Must be symmetric in `a` and `b`.
    fn is_associated(&self, system: &ParticleSystem, a: usize, b: usize) -> bool;

    /// Volume of the bonding region around one partner, including the
    /// orientational fraction for oriented variants.
    fn bias_volume(&self) -> f64;

    /// Moves `a` (position, and orientation where it matters) to a uniformly
    /// random configuration inside the bonding region of `b`.
    fn bias_insert(&self, system: &mut ParticleSystem, a: usize, b: usize, rng: &mut dyn RngCore);

    /// Largest center-to-center distance at which two particles can be bonded.
    fn capture_radius(&self) -> f64;

    /// [`bias_insert`](Self::bias_insert) followed by a check of its
    /// postcondition in debug builds.
    fn insert_associated(
        &self,
        system: &mut ParticleSystem,
        a: usize,
        b: usize,
        rng: &mut dyn RngCore,
    ) {
        self.bias_insert(system, a, b, rng);
        debug_assert!(
            self.is_associated(system, a, b),
            "bias_insert left {a} unbonded to {b}: {:?} vs {:?}",
            system.particle(a),
            system.particle(b)
        );
    }
}

/// Volume of the spherical shell `inner <= r <= outer`.
#[inline]
pub fn shell_volume(inner: f64, outer: f64) -> f64 {
    4.0 / 3.0 * PI * (outer.powi(3) - inner.powi(3))
}

/// Fraction of the unit sphere covered by the cap `cos >= cos_theta`.
#[inline]
pub fn cap_fraction(cos_theta: f64) -> f64 {
    0.5 * (1.0 - cos_theta)
}
