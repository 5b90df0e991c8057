// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{check_degree, check_separation, check_symmetric, ClusterShape, TopologyValidator};
use crate::association::bond_graph::BondGraph;
use crate::association::error::TopologyError;
use crate::space::ParticleSystem;

/// Two sites per particle: clusters are open chains or rings.
///
/// The walk leaves the seed through its first partner and keeps stepping to
/// whichever partner it did not come from. It stops at a chain end, or at the
/// seed when the chain closes into a ring. For an open chain it then walks
/// out through the seed's second partner.
#[derive(Debug, Clone, Copy)]
pub struct DoubleSiteValidator {
    min_partner_distance: f64,
}

enum Leg {
    Open,
    Closed,
}

impl DoubleSiteValidator {
    /// `min_partner_distance` is the smallest allowed distance between the two
    /// partners of a particle.
    pub fn new(min_partner_distance: f64) -> Self {
        Self {
            min_partner_distance,
        }
    }

    pub fn min_partner_distance(&self) -> f64 {
        self.min_partner_distance
    }

    fn check_node(
        &self,
        graph: &BondGraph,
        system: &ParticleSystem,
        p: usize,
    ) -> Result<(), TopologyError> {
        check_degree(graph, p, 2)?;
        check_symmetric(graph, p)?;
        check_separation(graph, system, p, self.min_partner_distance)
    }

    fn walk_leg(
        &self,
        graph: &BondGraph,
        system: &ParticleSystem,
        seed: usize,
        first: usize,
        cluster: &mut Vec<usize>,
    ) -> Result<Leg, TopologyError> {
        let limit = graph.len();
        let mut prev = seed;
        let mut current = first;
        for _ in 0..limit {
            if current == seed {
                return Ok(Leg::Closed);
            }
            self.check_node(graph, system, current)?;
            cluster.push(current);
            let bonds = graph.bonds_of(current);
            if bonds.len() < 2 {
                return Ok(Leg::Open);
            }
            let next = if bonds[0] == prev { bonds[1] } else { bonds[0] };
            prev = current;
            current = next;
        }
        Err(TopologyError::WalkOverflow { seed, steps: limit })
    }
}

impl TopologyValidator for DoubleSiteValidator {
    fn max_bonds(&self) -> usize {
        2
    }

    fn walk(
        &self,
        graph: &BondGraph,
        system: &ParticleSystem,
        seed: usize,
        cluster: &mut Vec<usize>,
    ) -> Result<ClusterShape, TopologyError> {
        cluster.clear();
        cluster.push(seed);
        self.check_node(graph, system, seed)?;
        let bonds = graph.bonds_of(seed);
        let Some(&first) = bonds.first() else {
            return Ok(ClusterShape::Monomer);
        };
        let second = bonds.get(1).copied();

        if let Leg::Closed = self.walk_leg(graph, system, seed, first, cluster)? {
            return Ok(ClusterShape::Ring);
        }
        if let Some(second) = second {
            if let Leg::Closed = self.walk_leg(graph, system, seed, second, cluster)? {
                // An open first leg cannot end in a ring unless the graph
                // changed underneath the walk.
                return Err(TopologyError::WalkOverflow {
                    seed,
                    steps: cluster.len(),
                });
            }
        }
        Ok(ClusterShape::Chain)
    }
}
