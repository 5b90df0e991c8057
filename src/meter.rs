// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Cluster-size distribution.
//
// Every particle belongs to exactly one cluster. A sample walks each cluster
// once, marking its members, and histograms the cluster sizes; the meter
// averages those histograms over many samples.

use crate::association::bond_graph::BondGraph;
use crate::association::error::TopologyError;
use crate::association::topology::TopologyValidator;
use crate::space::ParticleSystem;
use rustc_hash::FxHashMap;

/// Cluster sizes of one configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmerSample {
    /// Number of clusters of each size.
    pub counts: FxHashMap<usize, usize>,
    pub particles: usize,
}

impl SmerSample {
    /// Walks every cluster of the current configuration.
    pub fn measure(
        validator: &dyn TopologyValidator,
        graph: &BondGraph,
        system: &ParticleSystem,
    ) -> Result<Self, TopologyError> {
        let n = system.len();
        let mut visited = vec![false; n];
        let mut cluster = Vec::new();
        let mut counts = FxHashMap::default();
        for p in 0..n {
            if visited[p] {
                continue;
            }
            validator.walk(graph, system, p, &mut cluster)?;
            for &member in &cluster {
                visited[member] = true;
            }
            *counts.entry(cluster.len()).or_insert(0) += 1;
        }
        Ok(Self {
            counts,
            particles: n,
        })
    }

    pub fn count(&self, size: usize) -> usize {
        self.counts.get(&size).copied().unwrap_or(0)
    }

    pub fn num_smers(&self) -> usize {
        self.counts.values().sum()
    }

    /// Mole fraction of `size`-mers among all clusters.
    pub fn mole_fraction(&self, size: usize) -> f64 {
        let total = self.num_smers();
        if total == 0 {
            return 0.0;
        }
        self.count(size) as f64 / total as f64
    }

    pub fn mean_size(&self) -> f64 {
        let total = self.num_smers();
        if total == 0 {
            return 0.0;
        }
        self.particles as f64 / total as f64
    }

    /// Fraction of particles with at least one bond.
    pub fn bonded_fraction(&self) -> f64 {
        if self.particles == 0 {
            return 0.0;
        }
        (self.particles - self.count(1)) as f64 / self.particles as f64
    }
}

/// Running averages of [`SmerSample`] observables.
#[derive(Debug, Clone, Default)]
pub struct SmerDistribution {
    samples: usize,
    fraction_sums: FxHashMap<usize, f64>,
    mean_size_sum: f64,
    bonded_fraction_sum: f64,
}

impl SmerDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measures the current configuration and folds it into the averages.
    pub fn sample(
        &mut self,
        validator: &dyn TopologyValidator,
        graph: &BondGraph,
        system: &ParticleSystem,
    ) -> Result<SmerSample, TopologyError> {
        let sample = SmerSample::measure(validator, graph, system)?;
        self.add(&sample);
        Ok(sample)
    }

    pub fn add(&mut self, sample: &SmerSample) {
        self.samples += 1;
        for &size in sample.counts.keys() {
            *self.fraction_sums.entry(size).or_insert(0.0) += sample.mole_fraction(size);
        }
        self.mean_size_sum += sample.mean_size();
        self.bonded_fraction_sum += sample.bonded_fraction();
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn mole_fraction(&self, size: usize) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.fraction_sums.get(&size).copied().unwrap_or(0.0) / self.samples as f64
    }

    pub fn mean_size(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.mean_size_sum / self.samples as f64
    }

    pub fn bonded_fraction(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.bonded_fraction_sum / self.samples as f64
    }

    /// Average mole fraction per cluster size, smallest size first.
    pub fn histogram(&self) -> Vec<(usize, f64)> {
        let mut sizes: Vec<usize> = self.fraction_sums.keys().copied().collect();
        sizes.sort_unstable();
        sizes
            .into_iter()
            .map(|size| (size, self.mole_fraction(size)))
            .collect()
    }
}
