// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Isobaric volume move that keeps clusters rigid.
//
// A plain volume move scales every coordinate and so stretches every bond.
// Here each cluster moves as a unit: its center scales with the box and its
// members follow by the same translation, while monomers scale directly. All
// clusters are found in one pass over the particles using a per-particle
// cluster size (zero until visited) and `next` links that thread the members
// of each cluster together.

use super::{cluster_center, McMove, PotentialEnergy, StepTracker};
use crate::association::bond_graph::{Affected, BondGraph};
use crate::association::topology::TopologyValidator;
use crate::space::{Particle, ParticleSystem};
use glam::f64::DVec3;
use log::trace;
use rand::{Rng, RngCore};
use std::rc::Rc;

pub struct VolumeAssociatedMove {
    validator: Rc<dyn TopologyValidator>,
    tracker: StepTracker,
    /// Cluster size per particle for the current trial, zero if unvisited.
    cluster_size: Vec<usize>,
    /// Next member of the same cluster.
    next: Vec<Option<usize>>,
    /// First member of every cluster.
    heads: Vec<usize>,
    cluster: Vec<usize>,
    saved: Vec<Particle>,
    saved_size: DVec3,
    v_old: f64,
    v_new: f64,
    ln_scale: f64,
    old_energy: f64,
}

impl VolumeAssociatedMove {
    /// `step` bounds the change of ln V per trial.
    pub fn new(validator: Rc<dyn TopologyValidator>, step: f64) -> Self {
        Self {
            validator,
            tracker: StepTracker::new(step, 1e-6, 1.0),
            cluster_size: Vec::new(),
            next: Vec::new(),
            heads: Vec::new(),
            cluster: Vec::new(),
            saved: Vec::new(),
            saved_size: DVec3::ONE,
            v_old: 0.0,
            v_new: 0.0,
            ln_scale: 0.0,
            old_energy: 0.0,
        }
    }

    /// Number of independent units (monomers plus clusters) in the last trial.
    pub fn num_units(&self) -> usize {
        self.heads.len()
    }

    /// Change of ln V proposed by the last trial.
    pub fn ln_scale(&self) -> f64 {
        self.ln_scale
    }

    /// Threads every cluster into `next` and records its size. Returns false
    /// if some cluster is not valid.
    fn collect_clusters(&mut self, system: &ParticleSystem, graph: &BondGraph) -> bool {
        let n = system.len();
        self.cluster_size.clear();
        self.cluster_size.resize(n, 0);
        self.next.clear();
        self.next.resize(n, None);
        self.heads.clear();
        for p in 0..n {
            if self.cluster_size[p] != 0 {
                continue;
            }
            if self
                .validator
                .populate(graph, system, p, &mut self.cluster, true)
            {
                trace!("volume trial skipped: cluster of {p} is invalid");
                return false;
            }
            let size = self.cluster.len();
            for (k, &member) in self.cluster.iter().enumerate() {
                self.cluster_size[member] = size;
                self.next[member] = self.cluster.get(k + 1).copied();
            }
            self.heads.push(p);
        }
        true
    }
}

/// Members of the cluster starting at `head`, following `next` links.
fn threaded(next: &[Option<usize>], head: usize) -> impl Iterator<Item = usize> + '_ {
    std::iter::successors(Some(head), move |&p| next[p])
}

impl McMove for VolumeAssociatedMove {
    fn name(&self) -> &str {
        "volume_associated"
    }

    fn do_trial(
        &mut self,
        system: &mut ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
        rng: &mut dyn RngCore,
    ) -> bool {
        if !self.collect_clusters(system, graph) {
            return false;
        }
        self.old_energy = potential.energy(system, graph, Affected::All);
        self.saved.clear();
        self.saved.extend_from_slice(system.particles());
        self.saved_size = system.boundary().size();
        self.v_old = system.boundary().volume();

        self.ln_scale = (2.0 * rng.gen::<f64>() - 1.0) * self.tracker.step_size();
        let r_scale = (self.ln_scale / 3.0).exp();

        // Compute every new position against the old box, then resize.
        let mut targets = Vec::with_capacity(system.len());
        for &head in &self.heads {
            if self.cluster_size[head] == 1 {
                targets.push((head, system.particle(head).position * r_scale));
                continue;
            }
            self.cluster.clear();
            self.cluster.extend(threaded(&self.next, head));
            let shift = cluster_center(system, &self.cluster) * (r_scale - 1.0);
            for &p in &self.cluster {
                targets.push((p, system.particle(p).position + shift));
            }
        }
        system.set_box_size(self.saved_size * r_scale);
        for (p, position) in targets {
            system.set_position(p, position);
        }
        self.v_new = system.boundary().volume();
        true
    }

    fn affected_particles(&self) -> Affected<'_> {
        Affected::All
    }

    fn acceptance(&mut self, system: &ParticleSystem, graph: &BondGraph) -> f64 {
        for i in 0..self.heads.len() {
            let head = self.heads[i];
            if self
                .validator
                .populate(graph, system, head, &mut self.cluster, true)
            {
                return 0.0;
            }
            let expected = self.cluster_size[head];
            if self.cluster.len() != expected {
                return 0.0;
            }
            // Same size and every member threaded from the same head.
            let mut count = 0;
            for p in threaded(&self.next, head) {
                if !self.cluster.contains(&p) {
                    return 0.0;
                }
                count += 1;
            }
            if count != expected {
                return 0.0;
            }
        }
        ((self.heads.len() + 1) as f64 * self.ln_scale).exp()
    }

    fn energy_change(
        &mut self,
        system: &ParticleSystem,
        graph: &BondGraph,
        potential: &dyn PotentialEnergy,
    ) -> f64 {
        potential.energy(system, graph, Affected::All) - self.old_energy
    }

    fn pv_work(&self, pressure: f64) -> f64 {
        pressure * (self.v_new - self.v_old)
    }

    fn reject_notify(&mut self, system: &mut ParticleSystem) {
        system.set_box_size(self.saved_size);
        for (p, &particle) in self.saved.iter().enumerate() {
            system.set_particle(p, particle);
        }
    }

    fn tracker(&self) -> Option<&StepTracker> {
        Some(&self.tracker)
    }

    fn tracker_mut(&mut self) -> Option<&mut StepTracker> {
        Some(&mut self.tracker)
    }
}
