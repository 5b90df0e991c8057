// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Monte Carlo moves and the driver that runs them.
//
// A move proposes a tentative change to the system, reports which particles
// it touched, and once the bond graph has caught up with the tentative state
// supplies its acceptance factor and energy change. The driver combines them
// with the Metropolis factor and either keeps the change or asks the move to
// restore what it saved.

pub mod atom;
pub mod bias_ub;
pub mod integrator;
pub mod potential;
pub mod smer;
pub mod tracker;
pub mod volume;

pub use atom::{BondedDisplaceMove, MonomerDisplaceMove, RotateAssociatedMove};
pub use bias_ub::BiasUbMove;
pub use integrator::IntegratorMc;
pub use potential::{AssociationWell, IdealGas, PotentialEnergy};
pub use smer::{SmerRotateMove, SmerTranslateMove};
pub use tracker::StepTracker;
pub use volume::VolumeAssociatedMove;

use crate::association::bond_graph::{Affected, BondGraph};
use crate::space::ParticleSystem;
use rand::RngCore;

/// A Monte Carlo trial move.
///
/// The driver calls, in order: [`do_trial`](Self::do_trial), the bond graph's
/// `on_trial` with [`affected_particles`](Self::affected_particles), then
/// [`acceptance`](Self::acceptance) and [`energy_change`](Self::energy_change),
/// and finally one of the notify methods.
pub trait McMove {
    fn name(&self) -> &str;

    /// Tentatively mutates the system. Returns false if no trial could be
    /// made, in which case nothing was changed.
    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool;

    /// Particles changed by the last successful `do_trial`.
    fn affected_particles(&self) -> Affected<'_>;

    /// Proposal-correction and topology factor. Zero rejects the trial
    /// outright. Called after the bond graph reflects the trial state.
    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64;

    /// Energy of the trial state minus the energy before the trial.
    fn energy_change(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64;

    /// Pressure-volume work of the trial at `pressure`.
    fn pv_work(&self, _pressure: f64) -> f64 {
        0.0
    }

    fn accept_notify(&mut self) {}

    /// Restores everything the last trial changed.
    fn reject_notify(&mut self, system: &mut ParticleSystem);

    fn tracker(&self) -> Option<&StepTracker> {
        None
    }

    fn tracker_mut(&mut self) -> Option<&mut StepTracker> {
        None
    }
}

/// Minimum-image center of `cluster`, accumulated one member at a time so the
/// result stays consistent for clusters that straddle the periodic boundary.
pub fn cluster_center(system: &ParticleSystem, cluster: &[usize]) -> glam::f64::DVec3 {
    let boundary = system.boundary();
    let mut center = system.particle(cluster[0]).position;
    for (j, &p) in cluster.iter().enumerate().skip(1) {
        let dr = boundary.nearest_image(system.particle(p).position - center);
        center += dr / (j + 1) as f64;
    }
    center
}

/// Same members, ignoring order.
pub(crate) fn same_members(a: &[usize], b: &[usize]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
