// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Metropolis Monte Carlo driver.
//
// Owns the system, its bond graph and the moves, and runs the trial pipeline:
//
//   1. pick a move by weight and let it mutate the system tentatively
//   2. rescan the bond graph around the affected particles
//   3. combine the move's acceptance factor with exp(-(dU + P dV) / T)
//   4. accept, or restore the saved state and rescan again
//
// Bonds are a function of geometry, so the second rescan after a restore
// returns the graph to exactly its pre-trial bond set.

use super::{McMove, PotentialEnergy};
use crate::association::bias_volume::BiasVolume;
use crate::association::bond_graph::BondGraph;
use crate::space::ParticleSystem;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::rc::Rc;

struct MoveEntry {
    mv: Box<dyn McMove>,
    weight: f64,
    attempts: u64,
    accepted: u64,
}

/// Per-move acceptance summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveStats {
    pub name: String,
    pub attempts: u64,
    pub accepted: u64,
    pub step_size: Option<f64>,
}

impl MoveStats {
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempts == 0 {
            return f64::NAN;
        }
        self.accepted as f64 / self.attempts as f64
    }
}

pub struct IntegratorMc {
    system: ParticleSystem,
    graph: BondGraph,
    potential: Box<dyn PotentialEnergy>,
    rng: ChaCha8Rng,
    temperature: f64,
    pressure: f64,
    moves: Vec<MoveEntry>,
    steps: u64,
}

impl IntegratorMc {
    /// Builds the bond graph for `system` and seeds the random stream.
    pub fn new(
        system: ParticleSystem,
        volume: Rc<dyn BiasVolume>,
        potential: Box<dyn PotentialEnergy>,
        temperature: f64,
        seed: u64,
    ) -> Self {
        assert!(temperature > 0.0, "temperature must be positive");
        let graph = BondGraph::from_system(volume, &system);
        Self {
            system,
            graph,
            potential,
            rng: ChaCha8Rng::seed_from_u64(seed),
            temperature,
            pressure: 0.0,
            moves: Vec::new(),
            steps: 0,
        }
    }

    pub fn add_move(&mut self, mv: Box<dyn McMove>, weight: f64) {
        assert!(weight > 0.0, "move weight must be positive");
        self.moves.push(MoveEntry {
            mv,
            weight,
            attempts: 0,
            accepted: 0,
        });
    }

    pub fn set_pressure(&mut self, pressure: f64) {
        self.pressure = pressure;
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn graph(&self) -> &BondGraph {
        &self.graph
    }

    pub fn potential(&self) -> &dyn PotentialEnergy {
        self.potential.as_ref()
    }

    /// Trials attempted so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn move_stats(&self) -> Vec<MoveStats> {
        self.moves
            .iter()
            .map(|entry| MoveStats {
                name: entry.mv.name().to_string(),
                attempts: entry.attempts,
                accepted: entry.accepted,
                step_size: entry.mv.tracker().map(|t| t.step_size()),
            })
            .collect()
    }

    fn pick_move(&mut self) -> usize {
        let total: f64 = self.moves.iter().map(|m| m.weight).sum();
        let mut target = self.rng.gen::<f64>() * total;
        for (i, entry) in self.moves.iter().enumerate() {
            if target < entry.weight {
                return i;
            }
            target -= entry.weight;
        }
        self.moves.len() - 1
    }

    /// Runs one trial. Returns whether it was accepted.
    pub fn step(&mut self) -> bool {
        assert!(!self.moves.is_empty(), "no moves registered");
        let index = self.pick_move();
        self.steps += 1;
        let entry = &mut self.moves[index];
        entry.attempts += 1;
        let mv = entry.mv.as_mut();

        if !mv.do_trial(
            &mut self.system,
            &self.graph,
            self.potential.as_ref(),
            &mut self.rng,
        ) {
            if let Some(tracker) = mv.tracker_mut() {
                tracker.update(false);
            }
            return false;
        }
        self.graph.on_trial(&self.system, mv.affected_particles());

        let a = mv.acceptance(&self.system, &self.graph);
        let accepted = if a <= 0.0 {
            false
        } else {
            let du = mv.energy_change(&self.system, &self.graph, self.potential.as_ref());
            let chi = a * (-(du + mv.pv_work(self.pressure)) / self.temperature).exp();
            chi >= 1.0 || self.rng.gen::<f64>() < chi
        };

        if accepted {
            mv.accept_notify();
            entry.accepted += 1;
        } else {
            mv.reject_notify(&mut self.system);
            self.graph.on_trial(&self.system, mv.affected_particles());
        }
        if let Some(tracker) = mv.tracker_mut() {
            tracker.update(accepted);
        }
        accepted
    }

    /// Runs `n` trials and logs a summary.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
        info!(
            "{} trials done: {} particles, {} bonds, density {:.5}",
            self.steps,
            self.system.len(),
            self.graph.num_bonds(),
            self.system.density()
        );
        for stats in self.move_stats() {
            debug!(
                "  {:<18} {:>9} attempts, acceptance {:.3}, step {:?}",
                stats.name,
                stats.attempts,
                stats.acceptance_ratio(),
                stats.step_size
            );
        }
    }

    /// Runs `n` trials with step-size tuning enabled, then resets the move
    /// statistics for production.
    pub fn equilibrate(&mut self, n: u64) {
        self.set_tuning(true);
        self.run(n);
        self.set_tuning(false);
        for entry in &mut self.moves {
            entry.attempts = 0;
            entry.accepted = 0;
            if let Some(tracker) = entry.mv.tracker_mut() {
                tracker.reset();
            }
        }
    }

    fn set_tuning(&mut self, tuning: bool) {
        for entry in &mut self.moves {
            if let Some(tracker) = entry.mv.tracker_mut() {
                tracker.set_tuning(tuning);
            }
        }
    }
}
