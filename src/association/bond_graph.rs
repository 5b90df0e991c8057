// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Incremental bond graph over the particles of a system.
//
// Bonds are a pure function of geometry: two particles are bonded exactly when
// the bias volume says they are. The graph caches that relation as per-particle
// partner lists and keeps the set of bonded particles in a dense array with a
// reverse index, so insertion, removal and uniform sampling are all O(1).

use crate::association::bias_volume::BiasVolume;
use crate::association::error::TopologyError;
use crate::space::cell_list::CellList;
use crate::space::ParticleSystem;
use log::debug;
use rand::{Rng, RngCore};
use smallvec::SmallVec;
use std::rc::Rc;

// Neighbor queries use a strict distance bound; contact at exactly the capture
// radius must still be found.
const CAPTURE_SLACK: f64 = 1.0 + 1e-9;

/// Partner list of one particle.
pub type BondList = SmallVec<[usize; 4]>;

/// The particles a trial has (tentatively) moved.
#[derive(Debug, Clone, Copy)]
pub enum Affected<'a> {
    /// Every particle, e.g. after a box resize.
    All,
    Particles(&'a [usize]),
}

/// Who is bonded to whom, plus the set of bonded particles.
pub struct BondGraph {
    volume: Rc<dyn BiasVolume>,
    bonds: Vec<BondList>,
    associated: Vec<usize>,
    /// Position of each particle in `associated`, if bonded.
    associated_slot: Vec<Option<usize>>,
    cells: Option<CellList>,
}

impl BondGraph {
    /// Creates an empty graph. Call [`initialize`](Self::initialize) before use.
    pub fn new(volume: Rc<dyn BiasVolume>) -> Self {
        Self {
            volume,
            bonds: Vec::new(),
            associated: Vec::new(),
            associated_slot: Vec::new(),
            cells: None,
        }
    }

    /// Creates a graph and builds it from `system`.
    pub fn from_system(volume: Rc<dyn BiasVolume>, system: &ParticleSystem) -> Self {
        let mut graph = Self::new(volume);
        graph.initialize(system);
        graph
    }

    pub fn volume(&self) -> &Rc<dyn BiasVolume> {
        &self.volume
    }

    /// Rebuilds every bond from scratch.
    pub fn initialize(&mut self, system: &ParticleSystem) {
        let n = system.len();
        self.bonds.clear();
        self.bonds.resize_with(n, BondList::new);
        self.associated.clear();
        self.associated_slot.clear();
        self.associated_slot.resize(n, None);
        self.cells = Some(CellList::from_system(
            system,
            self.volume.capture_radius() * CAPTURE_SLACK,
        ));

        for a in 0..n {
            let mut found = BondList::new();
            self.for_each_neighbor(system, a, |b| {
                if b > a && self.volume.is_associated(system, a, b) {
                    found.push(b);
                }
            });
            for b in found {
                self.link(a, b);
            }
        }
        debug!(
            "bond graph initialized: {} particles, {} bonds, {} associated",
            n,
            self.num_bonds(),
            self.associated.len()
        );
    }

    /// Brings the graph up to date after a trial moved `affected`.
    ///
    /// Must run after the move has mutated the particles and before anything
    /// that reads bonding state is evaluated.
    pub fn on_trial(&mut self, system: &ParticleSystem, affected: Affected<'_>) {
        let ids = match affected {
            Affected::Particles(ids) if system.len() == self.bonds.len() && self.cells.is_some() => {
                ids
            }
            _ => {
                self.initialize(system);
                return;
            }
        };

        if let Some(cells) = self.cells.as_mut() {
            for &id in ids {
                cells.relocate(id, system.particle(id).position);
            }
        }
        for &id in ids {
            while let Some(&partner) = self.bonds[id].last() {
                self.unlink(id, partner);
            }
        }
        for &id in ids {
            let mut found = BondList::new();
            self.for_each_neighbor(system, id, |j| {
                if self.volume.is_associated(system, id, j) {
                    found.push(j);
                }
            });
            for j in found {
                if !self.bonds[id].contains(&j) {
                    self.link(id, j);
                }
            }
        }
    }

    /// Current partners of `p`.
    #[inline]
    pub fn bonds_of(&self, p: usize) -> &[usize] {
        &self.bonds[p]
    }

    #[inline]
    pub fn degree(&self, p: usize) -> usize {
        self.bonds[p].len()
    }

    #[inline]
    pub fn is_bonded(&self, p: usize) -> bool {
        self.associated_slot[p].is_some()
    }

    /// Every particle with at least one bond, in no particular order.
    #[inline]
    pub fn associated_set(&self) -> &[usize] {
        &self.associated
    }

    /// A uniformly random bonded particle, or `None` when nothing is bonded.
    pub fn random_associated(&self, rng: &mut dyn RngCore) -> Option<usize> {
        if self.associated.is_empty() {
            return None;
        }
        Some(self.associated[rng.gen_range(0..self.associated.len())])
    }

    /// Number of particles the graph was built for.
    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Total number of bonds (each counted once).
    pub fn num_bonds(&self) -> usize {
        self.bonds.iter().map(|b| b.len()).sum::<usize>() / 2
    }

    /// Declares a bond regardless of geometry. Returns false if it already
    /// existed. The next rescan of either particle replaces it with the
    /// geometric truth.
    pub fn add_bond(&mut self, a: usize, b: usize) -> bool {
        assert_ne!(a, b, "particle {a} cannot bond to itself");
        if self.bonds[a].contains(&b) {
            return false;
        }
        self.link(a, b);
        true
    }

    /// Removes a bond. Returns false if it did not exist.
    pub fn remove_bond(&mut self, a: usize, b: usize) -> bool {
        if !self.bonds[a].contains(&b) {
            return false;
        }
        self.unlink(a, b);
        true
    }

    /// Calls `f(j)` for every particle within the capture radius of `p`.
    pub fn for_each_neighbor<F: FnMut(usize)>(&self, system: &ParticleSystem, p: usize, mut f: F) {
        let radius = self.volume.capture_radius() * CAPTURE_SLACK;
        match &self.cells {
            Some(cells) => cells.for_each_neighbor(system, p, radius, f),
            None => {
                for j in 0..system.len() {
                    if j != p && system.separation(p, j).length() < radius {
                        f(j);
                    }
                }
            }
        }
    }

    /// Verifies bond symmetry and that the associated set matches the
    /// bonded particles exactly.
    pub fn check_invariants(&self) -> Result<(), TopologyError> {
        for (a, partners) in self.bonds.iter().enumerate() {
            for &b in partners {
                if !self.bonds[b].contains(&a) {
                    return Err(TopologyError::AsymmetricBond {
                        particle: a,
                        partner: b,
                        partner_bonds: self.bonds[b].to_vec(),
                    });
                }
            }
            let listed = self.associated_slot[a]
                .map(|slot| self.associated.get(slot) == Some(&a))
                .unwrap_or(false);
            if listed == partners.is_empty() {
                return Err(TopologyError::StaleAssociation {
                    particle: a,
                    bonds: partners.to_vec(),
                    listed,
                });
            }
        }
        if self.associated.len() != self.bonds.iter().filter(|b| !b.is_empty()).count() {
            let particle = self
                .associated
                .iter()
                .copied()
                .find(|&p| self.bonds[p].is_empty())
                .unwrap_or_default();
            return Err(TopologyError::StaleAssociation {
                particle,
                bonds: Vec::new(),
                listed: true,
            });
        }
        Ok(())
    }

    fn link(&mut self, a: usize, b: usize) {
        self.bonds[a].push(b);
        self.bonds[b].push(a);
        self.mark_associated(a);
        self.mark_associated(b);
    }

    fn unlink(&mut self, a: usize, b: usize) {
        Self::drop_partner(&mut self.bonds[a], b);
        Self::drop_partner(&mut self.bonds[b], a);
        if self.bonds[a].is_empty() {
            self.unmark_associated(a);
        }
        if self.bonds[b].is_empty() {
            self.unmark_associated(b);
        }
    }

    // Keeps the remaining partners in order so cluster walks stay deterministic.
    fn drop_partner(list: &mut BondList, partner: usize) {
        if let Some(pos) = list.iter().position(|&x| x == partner) {
            list.remove(pos);
        }
    }

    fn mark_associated(&mut self, p: usize) {
        if self.associated_slot[p].is_none() {
            self.associated_slot[p] = Some(self.associated.len());
            self.associated.push(p);
        }
    }

    fn unmark_associated(&mut self, p: usize) {
        if let Some(slot) = self.associated_slot[p].take() {
            self.associated.swap_remove(slot);
            if let Some(&moved) = self.associated.get(slot) {
                self.associated_slot[moved] = Some(slot);
            }
        }
    }
}

impl std::fmt::Debug for BondGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BondGraph")
            .field("bonds", &self.bonds)
            .field("associated", &self.associated)
            .finish()
    }
}
