// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Bonding/unbonding bias move.
//
// Half of the trials insert a random particle into the bonding region of a
// random partner; the other half take a random bonded particle and drop it at
// a uniformly random position and orientation. The two proposals are each
// other's reverse, and `ub_acceptance` cancels their very different densities.

use super::{McMove, PotentialEnergy};
use crate::association::bond_graph::{Affected, BondGraph};
use crate::association::topology::TopologyValidator;
use crate::space::{sampling, Particle, ParticleSystem};
use rand::{Rng, RngCore};
use std::rc::Rc;

/// Acceptance factor of a UB trial.
///
/// `ni`/`nai` are the moved particle's bond count and the associated-set size
/// before the trial, `nj`/`naj` the same after it. `phi` is the expected
/// number of particles inside one bonding region, `bias_volume / V * n`.
///
/// # Panics
///
/// If `n < 2`: a bond needs two particles.
pub fn ub_acceptance(n: usize, phi: f64, ni: usize, nai: usize, nj: usize, naj: usize) -> f64 {
    assert!(n >= 2, "UB acceptance needs at least two particles, got {n}");
    let scaled = (n - 1) as f64 * phi;
    let (ni, nai, nj, naj) = (ni as f64, nai as f64, nj as f64, naj as f64);
    if naj == 0.0 {
        return ni * nai / scaled;
    }
    if nai == 0.0 {
        return scaled / (nj * naj);
    }
    let delta_i = if ni > 0.0 { 1.0 } else { 0.0 };
    let delta_j = if nj > 0.0 { 1.0 } else { 0.0 };
    (scaled * delta_j / naj + ni) / (scaled * delta_i / nai + nj)
}

/// Which half of the move the current trial is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UbKind {
    Bond,
    Unbond,
}

pub struct BiasUbMove {
    validator: Rc<dyn TopologyValidator>,
    max_cluster_length: usize,
    moved: [usize; 1],
    saved: Particle,
    kind: UbKind,
    ni: usize,
    nai: usize,
    old_energy: f64,
    cluster: Vec<usize>,
}

impl BiasUbMove {
    pub fn new(validator: Rc<dyn TopologyValidator>, max_cluster_length: usize) -> Self {
        Self {
            validator,
            max_cluster_length,
            moved: [0],
            saved: Particle::new(glam::f64::DVec3::ZERO),
            kind: UbKind::Bond,
            ni: 0,
            nai: 0,
            old_energy: 0.0,
            cluster: Vec::new(),
        }
    }

    pub fn max_cluster_length(&self) -> usize {
        self.max_cluster_length
    }

    /// Kind of the most recent trial.
    pub fn last_kind(&self) -> UbKind {
        self.kind
    }

    /// Particle moved by the most recent trial.
    pub fn moved_particle(&self) -> usize {
        self.moved[0]
    }

    fn phi(system: &ParticleSystem, graph: &BondGraph) -> f64 {
        graph.volume().bias_volume() / system.boundary().volume() * system.len() as f64
    }
}

impl McMove for BiasUbMove {
    fn name(&self) -> &str {
        "bias_ub"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        let n = system.len();
        if n < 2 {
            return false;
        }
        self.kind = if rng.gen::<bool>() {
            UbKind::Bond
        } else {
            UbKind::Unbond
        };
        let (a, partner) = match self.kind {
            UbKind::Bond => {
                let a = rng.gen_range(0..n);
                let mut b = rng.gen_range(0..n - 1);
                if b >= a {
                    b += 1;
                }
                (a, Some(b))
            }
            UbKind::Unbond => match graph.random_associated(rng) {
                Some(a) => (a, None),
                None => return false,
            },
        };

        self.moved = [a];
        self.ni = graph.degree(a);
        self.nai = graph.associated_set().len();
        self.saved = *system.particle(a);
        self.old_energy = potential.energy(system, graph, Affected::Particles(&self.moved));

        match partner {
            Some(b) => graph.volume().insert_associated(system, a, b, rng),
            None => {
                let position = system.boundary().random_position(rng);
                system.set_position(a, position);
                system.set_orientation(a, sampling::random_rotation(rng));
            }
        }
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::Particles(&self.moved)
    }

    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        let a = self.moved[0];
        if self
            .validator
            .populate(graph, system, a, &mut self.cluster, true)
            || self.cluster.len() > self.max_cluster_length
        {
            return 0.0;
        }
        ub_acceptance(
            system.len(),
            Self::phi(system, graph),
            self.ni,
            self.nai,
            graph.degree(a),
            graph.associated_set().len(),
        )
    }

    fn energy_change(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        potential.energy(system, graph, Affected::Particles(&self.moved)) - self.old_energy
    }

    fn reject_notify(&mut self, system: &mut ParticleSystem) {
        system.set_particle(self.moved[0], self.saved);
    }
}
