// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Energy evaluation consumed by the moves.
//
// Force fields are outside this crate; these two models are just enough to
// run the association machinery: no interactions at all, and hard spheres
// with a square-well bond energy read off the bond graph.

use crate::association::bond_graph::{Affected, BondGraph};
use crate::space::ParticleSystem;

pub trait PotentialEnergy {
    /// Energy of every interaction involving `targets`, each pair counted once.
    /// For [`Affected::All`] this is the total energy.
    ///
    /// Bond terms read `graph`, which must reflect the current configuration.
    fn energy(&self, system: &ParticleSystem, graph: &BondGraph, targets: Affected<'_>) -> f64;
}

/// No interactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdealGas;

impl PotentialEnergy for IdealGas {
    fn energy(&self, _system: &ParticleSystem, _graph: &BondGraph, _targets: Affected<'_>) -> f64 {
        0.0
    }
}

/// Hard spheres of diameter `sigma` plus `-epsilon` per bond.
#[derive(Debug, Clone, Copy)]
pub struct AssociationWell {
    pub sigma: f64,
    pub epsilon: f64,
}

impl AssociationWell {
    pub fn new(sigma: f64, epsilon: f64) -> Self {
        Self { sigma, epsilon }
    }

    fn overlaps(&self, system: &ParticleSystem, i: usize, j: usize) -> bool {
        system.separation(i, j).length_squared() < self.sigma * self.sigma
    }
}

impl PotentialEnergy for AssociationWell {
    fn energy(&self, system: &ParticleSystem, graph: &BondGraph, targets: Affected<'_>) -> f64 {
        let n = system.len();
        match targets {
            Affected::All => {
                for i in 0..n {
                    for j in i + 1..n {
                        if self.overlaps(system, i, j) {
                            return f64::INFINITY;
                        }
                    }
                }
                -self.epsilon * graph.num_bonds() as f64
            }
            Affected::Particles(ids) => {
                let mut bonds = 0usize;
                for (k, &i) in ids.iter().enumerate() {
                    for j in 0..n {
                        // Pairs inside `ids` are visited from their first member only.
                        if j == i || ids[..k].contains(&j) {
                            continue;
                        }
                        if self.overlaps(system, i, j) {
                            return f64::INFINITY;
                        }
                    }
                    bonds += graph
                        .bonds_of(i)
                        .iter()
                        .filter(|&&j| !ids[..k].contains(&j))
                        .count();
                }
                -self.epsilon * bonds as f64
            }
        }
    }
}
