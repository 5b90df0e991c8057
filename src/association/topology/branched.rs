// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{check_degree, check_separation, check_symmetric, ClusterShape, TopologyValidator};
use crate::association::bond_graph::BondGraph;
use crate::association::error::TopologyError;
use crate::space::ParticleSystem;
use rustc_hash::FxHashSet;

/// Any number of sites up to `max_bonds`: clusters may branch.
#[derive(Debug, Clone, Copy)]
pub struct BranchedValidator {
    max_bonds: usize,
    min_partner_distance: f64,
}

impl BranchedValidator {
    pub fn new(max_bonds: usize, min_partner_distance: f64) -> Self {
        assert!(max_bonds > 0, "max_bonds must be positive");
        Self {
            max_bonds,
            min_partner_distance,
        }
    }

    pub fn min_partner_distance(&self) -> f64 {
        self.min_partner_distance
    }
}

impl TopologyValidator for BranchedValidator {
    fn max_bonds(&self) -> usize {
        self.max_bonds
    }

    fn walk(
        &self,
        graph: &BondGraph,
        system: &ParticleSystem,
        seed: usize,
        cluster: &mut Vec<usize>,
    ) -> Result<ClusterShape, TopologyError> {
        cluster.clear();
        let mut visited = FxHashSet::default();
        let mut stack = vec![seed];
        visited.insert(seed);
        let mut degree_sum = 0;
        let mut max_degree = 0;

        // Depth-first, visiting partners in bond-list order.
        while let Some(p) = stack.pop() {
            check_degree(graph, p, self.max_bonds)?;
            check_symmetric(graph, p)?;
            check_separation(graph, system, p, self.min_partner_distance)?;
            cluster.push(p);

            let bonds = graph.bonds_of(p);
            degree_sum += bonds.len();
            max_degree = max_degree.max(bonds.len());
            for &partner in bonds.iter().rev() {
                if visited.insert(partner) {
                    stack.push(partner);
                }
            }
        }

        let nodes = cluster.len();
        let edges = degree_sum / 2;
        Ok(match nodes {
            1 => ClusterShape::Monomer,
            _ if max_degree <= 2 && edges + 1 == nodes => ClusterShape::Chain,
            _ if max_degree == 2 && edges == nodes => ClusterShape::Ring,
            _ => ClusterShape::Branched,
        })
    }
}
