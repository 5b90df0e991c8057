// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use thiserror::Error;

/// Structural inconsistency found while walking the bond graph.
///
/// Every variant names the offending particle and its bond list so the
/// diagnostic can be acted on without re-running the simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("particle {particle} has {} bonds (max {max}): {bonds:?}", bonds.len())]
    TooManyBonds {
        particle: usize,
        max: usize,
        bonds: Vec<usize>,
    },

    #[error("particle {particle} lists {partner} as a partner but {partner}'s bonds are {partner_bonds:?}")]
    AsymmetricBond {
        particle: usize,
        partner: usize,
        partner_bonds: Vec<usize>,
    },

    #[error("partners {first} and {second} of particle {particle} are only {distance:.4} apart (bonds {bonds:?})")]
    CollapsedSites {
        particle: usize,
        first: usize,
        second: usize,
        distance: f64,
        bonds: Vec<usize>,
    },

    #[error("particle {particle} is bonded to {partner}, whose bonds are {partner_bonds:?}")]
    DimerMismatch {
        particle: usize,
        partner: usize,
        partner_bonds: Vec<usize>,
    },

    #[error("associated set disagrees with particle {particle} (listed: {listed}, bonds {bonds:?})")]
    StaleAssociation {
        particle: usize,
        bonds: Vec<usize>,
        listed: bool,
    },

    #[error("walk from particle {seed} did not terminate after {steps} steps")]
    WalkOverflow { seed: usize, steps: usize },
}

/// The docking solver failed to satisfy its own constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("docking of molecule {molecule} onto {partner} failed: {detail}")]
    DockingFailed {
        molecule: usize,
        partner: usize,
        detail: String,
    },
}
