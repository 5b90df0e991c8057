// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Hydrogen-bond docking of rigid multi-atom molecules.
//
// Each molecule carries a donor oxygen with its hydrogen and an acceptor
// oxygen bonded to a carbon, as in a carboxylic acid. Molecule D donates to
// molecule A when
//
//   |O_A - H_D|                 in [inner, outer]
//   cos(O_D - H_D ... O_A)      <= max_cos_oho
//   cos(H_D ... O_A - C_A)      in [min_cos_hoc, max_cos_hoc]
//
// and two molecules are bonded when either donates to the other. Insertion is
// constructive: the anchor atom is placed in its shell and angular window, the
// molecule is rotated so a second body vector lands in its window, and a free
// spin about that vector is drawn. The result is checked against the full
// constraint set.

use super::{shell_volume, BiasVolume};
use crate::association::error::GeometryError;
use crate::space::{sampling, ParticleSystem};
use glam::f64::{DQuat, DVec3};
use log::debug;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;

const OVERLAP_SAMPLES: usize = 20_000;
const OVERLAP_SEED: u64 = 0x5eed_d0c4;

/// Body-frame site layout of a docking molecule, relative to the particle
/// position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockingSites {
    pub donor_oxygen: DVec3,
    pub hydrogen: DVec3,
    pub acceptor_oxygen: DVec3,
    /// Atom bonded to the acceptor oxygen.
    pub carbon: DVec3,
}

impl DockingSites {
    /// Planar carboxyl group with the carbonyl carbon at the origin, in
    /// Angstroms (C=O 1.20, C-O 1.34, O-H 0.97; C-C=O 126, C-C-O 111 and
    /// C-O-H 107 degrees, syn hydrogen).
    pub fn carboxylic_acid() -> Self {
        let deg = std::f64::consts::PI / 180.0;
        let acceptor_oxygen = DVec3::new((54.0 * deg).cos(), (54.0 * deg).sin(), 0.0) * 1.20;
        let donor_oxygen = DVec3::new((69.0 * deg).cos(), -(69.0 * deg).sin(), 0.0) * 1.34;
        let to_carbon = (-donor_oxygen).normalize();
        let hydrogen =
            donor_oxygen + DQuat::from_rotation_z(-107.0 * deg) * to_carbon * 0.97;
        Self {
            donor_oxygen,
            hydrogen,
            acceptor_oxygen,
            carbon: DVec3::ZERO,
        }
    }

    /// Distance from the particle position to its farthest site.
    pub fn extent(&self) -> f64 {
        [
            self.donor_oxygen,
            self.hydrogen,
            self.acceptor_oxygen,
            self.carbon,
        ]
        .iter()
        .map(|v| v.length())
        .fold(0.0, f64::max)
    }
}

/// Lab-frame site positions of one molecule.
struct Placed {
    donor_oxygen: DVec3,
    hydrogen: DVec3,
    acceptor_oxygen: DVec3,
    carbon: DVec3,
}

impl Placed {
    fn new(sites: &DockingSites, origin: DVec3, orientation: DQuat) -> Self {
        Self {
            donor_oxygen: origin + orientation * sites.donor_oxygen,
            hydrogen: origin + orientation * sites.hydrogen,
            acceptor_oxygen: origin + orientation * sites.acceptor_oxygen,
            carbon: origin + orientation * sites.carbon,
        }
    }
}

/// Hydrogen-bond docking between rigid carboxylic-acid-like molecules.
#[derive(Debug, Clone)]
pub struct BiasVolumeDocking {
    sites: DockingSites,
    inner: f64,
    outer: f64,
    max_cos_oho: f64,
    min_cos_hoc: f64,
    max_cos_hoc: f64,
    /// Fraction of one donation region that also satisfies the reverse donation.
    overlap_fraction: f64,
}

impl BiasVolumeDocking {
    pub fn new(
        sites: DockingSites,
        inner: f64,
        outer: f64,
        max_cos_oho: f64,
        min_cos_hoc: f64,
        max_cos_hoc: f64,
    ) -> Self {
        assert!(
            0.0 <= inner && inner < outer,
            "invalid O-H shell [{inner}, {outer}]"
        );
        assert!(
            (-1.0..1.0).contains(&max_cos_oho),
            "max_cos_oho out of range: {max_cos_oho}"
        );
        assert!(
            -1.0 <= min_cos_hoc && min_cos_hoc < max_cos_hoc && max_cos_hoc <= 1.0,
            "invalid HOC window [{min_cos_hoc}, {max_cos_hoc}]"
        );
        let mut volume = Self {
            sites,
            inner,
            outer,
            max_cos_oho,
            min_cos_hoc,
            max_cos_hoc,
            overlap_fraction: 0.0,
        };
        volume.overlap_fraction = volume.estimate_overlap();
        debug!(
            "docking bias volume {:.4} (single-direction {:.4}, overlap fraction {:.4})",
            volume.bias_volume(),
            volume.single_direction_volume(),
            volume.overlap_fraction
        );
        volume
    }

    /// Acetic acid parameters: O...H in [1.8, 2.3], cos(OHO) <= -0.7 and
    /// cos(HOC) in [-0.9, -0.4].
    pub fn acetic_acid() -> Self {
        Self::new(DockingSites::carboxylic_acid(), 1.8, 2.3, -0.7, -0.9, -0.4)
    }

    pub fn sites(&self) -> &DockingSites {
        &self.sites
    }

    pub fn overlap_fraction(&self) -> f64 {
        self.overlap_fraction
    }

    /// Region volume for one fixed donation direction.
    pub fn single_direction_volume(&self) -> f64 {
        let oho_fraction = 0.5 * (1.0 + self.max_cos_oho);
        let hoc_fraction = 0.5 * (self.max_cos_hoc - self.min_cos_hoc);
        shell_volume(self.inner, self.outer) * oho_fraction * hoc_fraction
    }

    fn donates(&self, donor: &Placed, acceptor: &Placed) -> bool {
        let h_to_o = acceptor.acceptor_oxygen - donor.hydrogen;
        let r2 = h_to_o.length_squared();
        if r2 < self.inner * self.inner || r2 > self.outer * self.outer {
            return false;
        }
        let cos_oho = sampling::cos_between(donor.donor_oxygen - donor.hydrogen, h_to_o);
        if cos_oho > self.max_cos_oho {
            return false;
        }
        let cos_hoc = sampling::cos_between(-h_to_o, acceptor.carbon - acceptor.acceptor_oxygen);
        cos_hoc >= self.min_cos_hoc && cos_hoc <= self.max_cos_hoc
    }

    /// Both molecules placed in a frame where `b` sits at the origin.
    fn place_pair(&self, system: &ParticleSystem, a: usize, b: usize) -> (Placed, Placed) {
        let pa = system.particle(a);
        let pb = system.particle(b);
        let dr = system.separation(b, a);
        (
            Placed::new(&self.sites, dr, pa.orientation),
            Placed::new(&self.sites, DVec3::ZERO, pb.orientation),
        )
    }

    /// Returns (a donates to b, b donates to a).
    fn donations(&self, system: &ParticleSystem, a: usize, b: usize) -> (bool, bool) {
        let (pa, pb) = self.place_pair(system, a, b);
        (self.donates(&pa, &pb), self.donates(&pb, &pa))
    }

    /// A rotation taking `body` onto the lab direction `lab`, with a uniform
    /// spin about `lab`.
    fn align(body: DVec3, lab: DVec3, rng: &mut dyn RngCore) -> DQuat {
        let body = body.normalize();
        let spin = DQuat::from_axis_angle(body, TAU * rng.gen::<f64>());
        (DQuat::from_rotation_arc(body, lab.normalize()) * spin).normalize()
    }

    /// Builds a placement of `a` (relative to `partner`, whose position is the
    /// frame origin for the returned offset) in which one molecule donates to
    /// the other. Returns the new position and orientation of `a`.
    fn construct(
        &self,
        partner: &Placed,
        a_donates: bool,
        rng: &mut dyn RngCore,
    ) -> (DVec3, DQuat) {
        let r = sampling::random_shell_radius(self.inner, self.outer, rng);
        if a_donates {
            // Hydrogen of `a` around the partner's acceptor oxygen.
            let axis = (partner.carbon - partner.acceptor_oxygen).normalize();
            let u = sampling::random_in_band(axis, self.min_cos_hoc, self.max_cos_hoc, rng);
            let hydrogen = partner.acceptor_oxygen + u * r;
            let oh = sampling::random_in_band(-u, -1.0, self.max_cos_oho, rng);
            let orientation =
                Self::align(self.sites.donor_oxygen - self.sites.hydrogen, oh, rng);
            (hydrogen - orientation * self.sites.hydrogen, orientation)
        } else {
            // Acceptor oxygen of `a` around the partner's hydrogen.
            let axis = (partner.donor_oxygen - partner.hydrogen).normalize();
            let u = sampling::random_in_band(axis, -1.0, self.max_cos_oho, rng);
            let oxygen = partner.hydrogen + u * r;
            let oc = sampling::random_in_band(-u, self.min_cos_hoc, self.max_cos_hoc, rng);
            let orientation =
                Self::align(self.sites.carbon - self.sites.acceptor_oxygen, oc, rng);
            (oxygen - orientation * self.sites.acceptor_oxygen, orientation)
        }
    }

    /// Fraction of single-direction samples that also satisfy the reverse
    /// donation. Estimated with a fixed seed so the volume is reproducible.
    fn estimate_overlap(&self) -> f64 {
        let mut rng = ChaCha8Rng::seed_from_u64(OVERLAP_SEED);
        let partner = Placed::new(&self.sites, DVec3::ZERO, DQuat::IDENTITY);
        let mut both = 0usize;
        for _ in 0..OVERLAP_SAMPLES {
            let (position, orientation) = self.construct(&partner, false, &mut rng);
            let placed = Placed::new(&self.sites, position, orientation);
            if self.donates(&placed, &partner) {
                both += 1;
            }
        }
        both as f64 / OVERLAP_SAMPLES as f64
    }

    fn verify(
        &self,
        system: &ParticleSystem,
        a: usize,
        b: usize,
        a_donates: bool,
    ) -> Result<(bool, bool), GeometryError> {
        let (forward, reverse) = self.donations(system, a, b);
        let satisfied = if a_donates { forward } else { reverse };
        if satisfied {
            Ok((forward, reverse))
        } else {
            Err(GeometryError::DockingFailed {
                molecule: a,
                partner: b,
                detail: format!(
                    "{} donation unsatisfied: {:?} onto {:?}",
                    if a_donates { "forward" } else { "reverse" },
                    system.particle(a),
                    system.particle(b)
                ),
            })
        }
    }
}

impl BiasVolume for BiasVolumeDocking {
    fn is_associated(&self, system: &ParticleSystem, a: usize, b: usize) -> bool {
        let (forward, reverse) = self.donations(system, a, b);
        forward || reverse
    }

    fn bias_volume(&self) -> f64 {
        self.single_direction_volume() * (2.0 - self.overlap_fraction)
    }

    fn bias_insert(&self, system: &mut ParticleSystem, a: usize, b: usize, rng: &mut dyn RngCore) {
        let anchor = *system.particle(b);
        let partner = Placed::new(&self.sites, DVec3::ZERO, anchor.orientation);
        loop {
            let a_donates = rng.gen::<bool>();
            let (offset, orientation) = self.construct(&partner, a_donates, rng);
            system.set_position(a, anchor.position + offset);
            system.set_orientation(a, orientation);
            let (forward, reverse) = match self.verify(system, a, b, a_donates) {
                Ok(donations) => donations,
                Err(err) => panic!("{err}"),
            };
            // Configurations in both donation regions are proposed from either
            // direction; thin them so the union is sampled uniformly.
            if !(forward && reverse) || rng.gen::<bool>() {
                return;
            }
        }
    }

    fn capture_radius(&self) -> f64 {
        self.outer + self.sites.hydrogen.length() + self.sites.acceptor_oxygen.length()
    }
}
