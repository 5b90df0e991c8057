// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Particle and box model consumed by the association engine.
//
// Positions live in the primary cell [0, L) of a rectangular periodic box.
// Orientations are full rotations: uniaxial particles read their axis as
// `orientation * X`, rigid molecules map body-frame sites through it.

pub mod cell_list;
pub mod sampling;

use glam::f64::{DQuat, DVec3};
use rand::{Rng, RngCore};

/// A single particle or rigid molecule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Particle {
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            orientation: DQuat::IDENTITY,
        }
    }

    pub fn with_orientation(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Unit axis of a uniaxial particle.
    #[inline]
    pub fn direction(&self) -> DVec3 {
        self.orientation * DVec3::X
    }

    /// Maps a body-frame site offset into the lab frame (not wrapped).
    #[inline]
    pub fn site_position(&self, body_offset: DVec3) -> DVec3 {
        self.position + self.orientation * body_offset
    }
}

/// Rectangular periodic boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBoundary {
    size: DVec3,
}

impl PeriodicBoundary {
    pub fn new(size: DVec3) -> Self {
        debug_assert!(size.min_element() > 0.0, "box edges must be positive");
        Self { size }
    }

    pub fn cubic(edge: f64) -> Self {
        Self::new(DVec3::splat(edge))
    }

    #[inline]
    pub fn size(&self) -> DVec3 {
        self.size
    }

    pub fn set_size(&mut self, size: DVec3) {
        debug_assert!(size.min_element() > 0.0, "box edges must be positive");
        self.size = size;
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }

    /// Minimum-image convention applied to a separation vector.
    #[inline]
    pub fn nearest_image(&self, dr: DVec3) -> DVec3 {
        dr - self.size * (dr / self.size).round()
    }

    /// Folds a position back into the primary cell.
    #[inline]
    pub fn wrap(&self, position: DVec3) -> DVec3 {
        position - self.size * (position / self.size).floor()
    }

    pub fn random_position(&self, rng: &mut dyn RngCore) -> DVec3 {
        DVec3::new(
            rng.gen::<f64>() * self.size.x,
            rng.gen::<f64>() * self.size.y,
            rng.gen::<f64>() * self.size.z,
        )
    }
}

/// The box: every particle plus the periodic boundary they live in.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    boundary: PeriodicBoundary,
}

impl ParticleSystem {
    pub fn new(boundary: PeriodicBoundary) -> Self {
        Self {
            particles: Vec::new(),
            boundary,
        }
    }

    pub fn from_particles(boundary: PeriodicBoundary, particles: Vec<Particle>) -> Self {
        let mut system = Self {
            particles,
            boundary,
        };
        for p in &mut system.particles {
            p.position = boundary.wrap(p.position);
        }
        system
    }

    /// Places `count` particles on a simple cubic lattice that fills the box,
    /// each with an independent uniformly random orientation.
    pub fn simple_cubic(boundary: PeriodicBoundary, count: usize, rng: &mut dyn RngCore) -> Self {
        let mut system = Self::new(boundary);
        if count == 0 {
            return system;
        }
        let per_edge = (count as f64).cbrt().ceil() as usize;
        let spacing = boundary.size() / per_edge as f64;
        'fill: for i in 0..per_edge {
            for j in 0..per_edge {
                for k in 0..per_edge {
                    if system.len() == count {
                        break 'fill;
                    }
                    let lattice = DVec3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5);
                    let orientation = sampling::random_rotation(rng);
                    system.push(Particle::with_orientation(lattice * spacing, orientation));
                }
            }
        }
        system
    }

    /// Adds a particle (wrapped into the box) and returns its id.
    pub fn push(&mut self, particle: Particle) -> usize {
        let id = self.particles.len();
        self.particles.push(Particle {
            position: self.boundary.wrap(particle.position),
            orientation: particle.orientation,
        });
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn particle(&self, id: usize) -> &Particle {
        &self.particles[id]
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Overwrites a particle, e.g. when restoring a saved trial state.
    pub fn set_particle(&mut self, id: usize, particle: Particle) {
        self.particles[id] = particle;
    }

    pub fn set_position(&mut self, id: usize, position: DVec3) {
        self.particles[id].position = self.boundary.wrap(position);
    }

    pub fn set_orientation(&mut self, id: usize, orientation: DQuat) {
        self.particles[id].orientation = orientation.normalize();
    }

    #[inline]
    pub fn boundary(&self) -> &PeriodicBoundary {
        &self.boundary
    }

    /// Resizes the box without touching particle coordinates.
    pub fn set_box_size(&mut self, size: DVec3) {
        self.boundary.set_size(size);
    }

    /// Minimum-image vector pointing from particle `from` to particle `to`.
    #[inline]
    pub fn separation(&self, from: usize, to: usize) -> DVec3 {
        self.boundary
            .nearest_image(self.particles[to].position - self.particles[from].position)
    }

    /// Number density N/V.
    pub fn density(&self) -> f64 {
        self.particles.len() as f64 / self.boundary.volume()
    }
}
