// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{check_degree, ClusterShape, TopologyValidator};
use crate::association::bond_graph::BondGraph;
use crate::association::error::TopologyError;
use crate::space::ParticleSystem;

/// One site per particle: clusters are monomers or dimers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSiteValidator;

impl TopologyValidator for SingleSiteValidator {
    fn max_bonds(&self) -> usize {
        1
    }

    fn walk(
        &self,
        graph: &BondGraph,
        _system: &ParticleSystem,
        seed: usize,
        cluster: &mut Vec<usize>,
    ) -> Result<ClusterShape, TopologyError> {
        cluster.clear();
        cluster.push(seed);
        check_degree(graph, seed, 1)?;
        let Some(&partner) = graph.bonds_of(seed).first() else {
            return Ok(ClusterShape::Monomer);
        };
        if graph.bonds_of(partner) != [seed] {
            return Err(TopologyError::DimerMismatch {
                particle: seed,
                partner,
                partner_bonds: graph.bonds_of(partner).to_vec(),
            });
        }
        cluster.push(partner);
        Ok(ClusterShape::Chain)
    }
}
