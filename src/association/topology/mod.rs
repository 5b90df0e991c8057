// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Cluster walks over the bond graph.
//
// A validator expands a seed particle into its connected cluster ("smer") and
// checks per-site constraints on the way: symmetric bonds, bounded degree and
// distinct bonding sites. Under the must-be-valid contract a violation is a
// simulation bug and aborts with the offending state. Mid-trial, where the
// graph reflects a tentative configuration, the same violation just marks the
// trial as invalid.

pub mod branched;
pub mod double;
pub mod single;

pub use branched::BranchedValidator;
pub use double::DoubleSiteValidator;
pub use single::SingleSiteValidator;

use crate::association::bond_graph::BondGraph;
use crate::association::error::TopologyError;
use crate::space::ParticleSystem;
use log::trace;

/// Shape of a walked cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterShape {
    Monomer,
    /// Open chain, including a dimer.
    Chain,
    Ring,
    Branched,
}

pub trait TopologyValidator {
    /// Largest degree any particle may have.
    fn max_bonds(&self) -> usize;

    /// Fills `cluster` with the particles reachable from `seed`, seed first,
    /// and reports the cluster shape.
    fn walk(
        &self,
        graph: &BondGraph,
        system: &ParticleSystem,
        seed: usize,
        cluster: &mut Vec<usize>,
    ) -> Result<ClusterShape, TopologyError>;

    /// Fills `cluster` from `seed` and returns true if the topology is invalid.
    ///
    /// # Panics
    ///
    /// If the topology is invalid and `might_be_broken` is false.
    fn populate(
        &self,
        graph: &BondGraph,
        system: &ParticleSystem,
        seed: usize,
        cluster: &mut Vec<usize>,
        might_be_broken: bool,
    ) -> bool {
        match self.walk(graph, system, seed, cluster) {
            Ok(_) => false,
            Err(err) if might_be_broken => {
                trace!("tentative topology rejected: {err}");
                true
            }
            Err(err) => panic!("invalid cluster topology: {err}"),
        }
    }
}

/// Fails unless every partner of `p` lists `p` back.
pub(crate) fn check_symmetric(graph: &BondGraph, p: usize) -> Result<(), TopologyError> {
    for &partner in graph.bonds_of(p) {
        if !graph.bonds_of(partner).contains(&p) {
            return Err(TopologyError::AsymmetricBond {
                particle: p,
                partner,
                partner_bonds: graph.bonds_of(partner).to_vec(),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_degree(graph: &BondGraph, p: usize, max: usize) -> Result<(), TopologyError> {
    let bonds = graph.bonds_of(p);
    if bonds.len() > max {
        return Err(TopologyError::TooManyBonds {
            particle: p,
            max,
            bonds: bonds.to_vec(),
        });
    }
    Ok(())
}

/// Fails if two partners of `p` sit closer than `min_distance`, which means
/// they occupy the same bonding site.
pub(crate) fn check_separation(
    graph: &BondGraph,
    system: &ParticleSystem,
    p: usize,
    min_distance: f64,
) -> Result<(), TopologyError> {
    let bonds = graph.bonds_of(p);
    if bonds.len() < 2 || min_distance <= 0.0 {
        return Ok(());
    }
    let min_sq = min_distance * min_distance;
    for (i, &first) in bonds.iter().enumerate() {
        for &second in &bonds[i + 1..] {
            let d2 = system.separation(first, second).length_squared();
            if d2 < min_sq {
                return Err(TopologyError::CollapsedSites {
                    particle: p,
                    first,
                    second,
                    distance: d2.sqrt(),
                    bonds: bonds.to_vec(),
                });
            }
        }
    }
    Ok(())
}
