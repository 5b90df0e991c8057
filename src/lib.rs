// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Association bond graph and bias-sampling Monte Carlo moves for associating fluids.
//!
//! Associating fluids are made of particles (or rigid molecules) that form transient,
//! hydrogen-bond-like links: dimers, chains, rings and branched clusters ("smers").
//! This crate tracks who is bonded to whom and samples those bonded states efficiently:
//!
//! - [`association::bias_volume`] - geometric bonding regions: a membership predicate,
//!   the analytic region volume, and a sampler that inserts a particle into the region.
//! - [`association::bond_graph`] - the incremental bond graph built from that predicate,
//!   together with the set of currently bonded particles.
//! - [`association::topology`] - validators that walk the bond graph from a seed into a
//!   cluster while enforcing per-site bonding constraints.
//! - [`mc`] - the Monte Carlo driver and the association-aware moves, most notably the
//!   bonding/unbonding bias move ([`mc::bias_ub::BiasUbMove`]).
//!
//! The particle/box model, neighbor cells, and the energy evaluator live in [`space`] and
//! [`mc::potential`]. They are intentionally thin: just enough to drive the engine.
//!
//! # Trial ordering
//!
//! Every trial follows the same pipeline, implemented by [`mc::integrator::IntegratorMc`]:
//!
//! 1. the move mutates particles tentatively (`do_trial`),
//! 2. the bond graph rescans the affected particles (`on_trial`),
//! 3. the move computes its acceptance factor and energy change against the tentative graph,
//! 4. accept, or reject and restore the saved particles, then rescan again.

pub mod association;
pub mod config;
pub mod mc;
pub mod meter;
pub mod space;

pub use association::bias_volume::BiasVolume;
pub use association::bond_graph::{Affected, BondGraph};
pub use association::error::{GeometryError, TopologyError};
pub use association::topology::{ClusterShape, TopologyValidator};
pub use config::{ConfigError, SimulationConfig};
pub use mc::integrator::IntegratorMc;
pub use mc::McMove;
pub use space::{Particle, ParticleSystem, PeriodicBoundary};
