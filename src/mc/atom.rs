// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Single-particle moves that respect the bonding state.

use super::{McMove, PotentialEnergy, StepTracker};
use crate::association::bond_graph::{Affected, BondGraph};
use crate::association::topology::TopologyValidator;
use crate::space::{sampling, Particle, ParticleSystem};
use glam::f64::DVec3;
use rand::{Rng, RngCore};
use std::rc::Rc;

/// Saved state of the one particle a trial moved.
struct SingleTrial {
    moved: [usize; 1],
    saved: Particle,
    old_energy: f64,
}

impl SingleTrial {
    fn new() -> Self {
        Self {
            moved: [0],
            saved: Particle::new(DVec3::ZERO),
            old_energy: 0.0,
        }
    }

    fn begin(
        &mut self,
        p: usize,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) {
        self.moved = [p];
        self.saved = *system.particle(p);
        self.old_energy = potential.energy(system, graph, Affected::Particles(&self.moved));
    }

    fn id(&self) -> usize {
        self.moved[0]
    }

    fn energy_change(
        &self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        potential.energy(system, graph, Affected::Particles(&self.moved)) - self.old_energy
    }

    fn restore(&self, system: &mut ParticleSystem) {
        system.set_particle(self.moved[0], self.saved);
    }
}

/// Displaces an unbonded particle. Bond formation is left to the UB move, so
/// the trial is rejected if the particle ends up bonded.
pub struct MonomerDisplaceMove {
    trial: SingleTrial,
    tracker: StepTracker,
}

impl MonomerDisplaceMove {
    pub fn new(step: f64, max_step: f64) -> Self {
        Self {
            trial: SingleTrial::new(),
            tracker: StepTracker::new(step, 1e-6 * max_step, max_step),
        }
    }
}

impl McMove for MonomerDisplaceMove {
    fn name(&self) -> &str {
        "monomer_displace"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        if system.is_empty() {
            return false;
        }
        let p = rng.gen_range(0..system.len());
        if graph.is_bonded(p) {
            return false;
        }
        self.trial.begin(p, system, graph, potential);
        let position = system.particle(p).position
            + sampling::random_in_cube(self.tracker.step_size(), rng);
        system.set_position(p, position);
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::Particles(&self.trial.moved)
    }

    fn acceptance(&mut self, _system: &ParticleSystem, graph: &BondGraph) -> f64 {
        if graph.is_bonded(self.trial.id()) {
            0.0
        } else {
            1.0
        }
    }

    fn energy_change(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        self.trial.energy_change(system, graph, potential)
    }

    fn reject_notify(&mut self, system: &mut ParticleSystem) {
        self.trial.restore(system);
    }

    fn tracker(&self) -> Option<&StepTracker> {
        Some(&self.tracker)
    }

    fn tracker_mut(&mut self) -> Option<&mut StepTracker> {
        Some(&mut self.tracker)
    }
}

/// Displaces a bonded particle, which must still be bonded afterwards.
///
/// The particle is drawn from the associated set, so the acceptance carries
/// the ratio of that set's size before and after the trial.
pub struct BondedDisplaceMove {
    trial: SingleTrial,
    tracker: StepTracker,
    validator: Rc<dyn TopologyValidator>,
    max_cluster_length: usize,
    associated_before: usize,
    cluster: Vec<usize>,
}

impl BondedDisplaceMove {
    pub fn new(
        validator: Rc<dyn TopologyValidator>,
        max_cluster_length: usize,
        step: f64,
        max_step: f64,
    ) -> Self {
        Self {
            trial: SingleTrial::new(),
            tracker: StepTracker::new(step, 1e-6 * max_step, max_step),
            validator,
            max_cluster_length,
            associated_before: 0,
            cluster: Vec::new(),
        }
    }
}

impl McMove for BondedDisplaceMove {
    fn name(&self) -> &str {
        "bonded_displace"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        let Some(p) = graph.random_associated(rng) else {
            return false;
        };
        self.associated_before = graph.associated_set().len();
        self.trial.begin(p, system, graph, potential);
        let position = system.particle(p).position
            + sampling::random_in_cube(self.tracker.step_size(), rng);
        system.set_position(p, position);
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::Particles(&self.trial.moved)
    }

    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        let p = self.trial.id();
        if !graph.is_bonded(p)
            || self
                .validator
                .populate(graph, system, p, &mut self.cluster, true)
            || self.cluster.len() > self.max_cluster_length
        {
            return 0.0;
        }
        self.associated_before as f64 / graph.associated_set().len() as f64
    }

    fn energy_change(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        self.trial.energy_change(system, graph, potential)
    }

    fn reject_notify(&mut self, system: &mut ParticleSystem) {
        self.trial.restore(system);
    }

    fn tracker(&self) -> Option<&StepTracker> {
        Some(&self.tracker)
    }

    fn tracker_mut(&mut self) -> Option<&mut StepTracker> {
        Some(&mut self.tracker)
    }
}

/// Rotates one random particle by a small random angle.
pub struct RotateAssociatedMove {
    trial: SingleTrial,
    tracker: StepTracker,
    validator: Rc<dyn TopologyValidator>,
    max_cluster_length: usize,
    cluster: Vec<usize>,
}

impl RotateAssociatedMove {
    pub fn new(validator: Rc<dyn TopologyValidator>, max_cluster_length: usize, step: f64) -> Self {
        Self {
            trial: SingleTrial::new(),
            tracker: StepTracker::new(step, 1e-6, std::f64::consts::PI),
            validator,
            max_cluster_length,
            cluster: Vec::new(),
        }
    }
}

impl McMove for RotateAssociatedMove {
    fn name(&self) -> &str {
        "rotate_associated"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        if system.is_empty() {
            return false;
        }
        let p = rng.gen_range(0..system.len());
        self.trial.begin(p, system, graph, potential);
        let rotation = sampling::random_small_rotation(self.tracker.step_size(), rng);
        let orientation = rotation * system.particle(p).orientation;
        system.set_orientation(p, orientation);
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::Particles(&self.trial.moved)
    }

    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        let p = self.trial.id();
        if self
            .validator
            .populate(graph, system, p, &mut self.cluster, true)
            || self.cluster.len() > self.max_cluster_length
        {
            return 0.0;
        }
        1.0
    }

    fn energy_change(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        self.trial.energy_change(system, graph, potential)
    }

    fn reject_notify(&mut self, system: &mut ParticleSystem) {
        self.trial.restore(system);
    }

    fn tracker(&self) -> Option<&StepTracker> {
        Some(&self.tracker)
    }

    fn tracker_mut(&mut self) -> Option<&mut StepTracker> {
        Some(&mut self.tracker)
    }
}
