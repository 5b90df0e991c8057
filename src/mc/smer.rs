// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Rigid moves of whole clusters.
//
// Both moves pick a random bonded particle, walk its cluster, and apply one
// rigid transform to every member. The trial only stands if the same cluster
// comes back afterwards: no bond broken, none formed with outsiders.

use super::{cluster_center, same_members, McMove, PotentialEnergy, StepTracker};
use crate::association::bond_graph::{Affected, BondGraph};
use crate::association::topology::TopologyValidator;
use crate::space::{sampling, Particle, ParticleSystem};
use log::trace;
use rand::RngCore;
use std::rc::Rc;

/// State shared by the cluster moves: the walked cluster and its saved
/// particles.
struct SmerTrial {
    validator: Rc<dyn TopologyValidator>,
    cluster: Vec<usize>,
    saved: Vec<Particle>,
    check: Vec<usize>,
    old_energy: f64,
}

impl SmerTrial {
    fn new(validator: Rc<dyn TopologyValidator>) -> Self {
        Self {
            validator,
            cluster: Vec::new(),
            saved: Vec::new(),
            check: Vec::new(),
            old_energy: 0.0,
        }
    }

    /// Picks a bonded seed, walks its cluster and saves the members.
    fn begin(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        let Some(seed) = graph.random_associated(rng) else {
            return false;
        };
        if self
            .validator
            .populate(graph, system, seed, &mut self.cluster, true)
        {
            trace!("cluster of {seed} is not a valid starting point");
            return false;
        }
        self.saved.clear();
        self.saved
            .extend(self.cluster.iter().map(|&p| *system.particle(p)));
        self.old_energy = potential.energy(system, graph, Affected::Particles(&self.cluster));
        true
    }

    /// 1 if walking from the seed reproduces exactly the same cluster.
    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        let seed = self.cluster[0];
        if self
            .validator
            .populate(graph, system, seed, &mut self.check, true)
        {
            return 0.0;
        }
        if same_members(&self.cluster, &self.check) {
            1.0
        } else {
            0.0
        }
    }

    fn energy_change(
        &self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        potential.energy(system, graph, Affected::Particles(&self.cluster)) - self.old_energy
    }

    fn restore(&self, system: &mut ParticleSystem) {
        for (&p, &particle) in self.cluster.iter().zip(&self.saved) {
            system.set_particle(p, particle);
        }
    }
}

/// Translates a whole cluster by a uniform random offset.
pub struct SmerTranslateMove {
    trial: SmerTrial,
    tracker: StepTracker,
}

impl SmerTranslateMove {
    /// `step` is the half-edge of the displacement cube.
    pub fn new(validator: Rc<dyn TopologyValidator>, step: f64, max_step: f64) -> Self {
        Self {
            trial: SmerTrial::new(validator),
            tracker: StepTracker::new(step, 1e-6 * max_step, max_step),
        }
    }

    /// Members of the last trial's cluster, seed first.
    pub fn cluster(&self) -> &[usize] {
        &self.trial.cluster
    }
}

impl McMove for SmerTranslateMove {
    fn name(&self) -> &str {
        "smer_translate"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        if !self.trial.begin(system, graph, potential, rng) {
            return false;
        }
        let dr = sampling::random_in_cube(self.tracker.step_size(), rng);
        for &p in &self.trial.cluster {
            let position = system.particle(p).position + dr;
            system.set_position(p, position);
        }
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::Particles(&self.trial.cluster)
    }

    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        self.trial.acceptance(system, graph)
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

/// Rotates a whole cluster about its own center.
pub struct SmerRotateMove {
    trial: SmerTrial,
    tracker: StepTracker,
}

impl SmerRotateMove {
    /// `step` is the largest rotation angle in radians.
    pub fn new(validator: Rc<dyn TopologyValidator>, step: f64) -> Self {
        Self {
            trial: SmerTrial::new(validator),
            tracker: StepTracker::new(step, 1e-6, std::f64::consts::PI),
        }
    }

    pub fn cluster(&self) -> &[usize] {
        &self.trial.cluster
    }
}

impl McMove for SmerRotateMove {
    fn name(&self) -> &str {
        "smer_rotate"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        if !self.trial.begin(system, graph, potential, rng) {
            return false;
        }
        let center = cluster_center(system, &self.trial.cluster);
        let rotation = sampling::random_small_rotation(self.tracker.step_size(), rng);
        let boundary = *system.boundary();
        for &p in &self.trial.cluster {
            let particle = *system.particle(p);
            let arm = boundary.nearest_image(particle.position - center);
            system.set_position(p, center + rotation * arm);
            system.set_orientation(p, rotation * particle.orientation);
        }
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::Particles(&self.trial.cluster)
    }

    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        self.trial.acceptance(system, graph)
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
