// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Periodic cell list for bounded-range neighbor queries.
//
// Partitions the periodic box into a dense grid of cells whose edges are at
// least `cell_size`. Each cell stores the ids of the particles inside it and
// each particle remembers its cell, so moving one particle is O(1). Neighbor
// queries visit the cells covering the query sphere (with periodic wrap of the
// cell indices) and apply an exact minimum-image distance check.

use super::ParticleSystem;
use glam::f64::DVec3;

/// Upper bound on cells per axis; tiny query radii get wider cells instead of
/// an enormous grid.
const MAX_CELLS_PER_AXIS: usize = 64;

/// A uniform periodic grid for spatial neighbor queries.
#[derive(Debug, Clone)]
pub struct CellList {
    cell_size: f64,
    dims: [usize; 3],
    cell_edge: DVec3,
    cells: Vec<Vec<usize>>,
    cell_of: Vec<usize>,
}

impl CellList {
    /// Builds a cell list over every particle of `system`.
    ///
    /// `cell_size` should typically equal the largest query radius so that a
    /// query only visits the 27 surrounding cells.
    pub fn from_system(system: &ParticleSystem, cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell_size must be positive");
        let size = system.boundary().size();
        let per_axis = |extent: f64| ((extent / cell_size).floor() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        let dims = [per_axis(size.x), per_axis(size.y), per_axis(size.z)];
        let cell_edge = DVec3::new(
            size.x / dims[0] as f64,
            size.y / dims[1] as f64,
            size.z / dims[2] as f64,
        );
        let mut list = Self {
            cell_size,
            dims,
            cell_edge,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
            cell_of: Vec::with_capacity(system.len()),
        };
        for (id, particle) in system.particles().iter().enumerate() {
            let cell = list.cell_index(particle.position);
            list.cells[cell].push(id);
            list.cell_of.push(cell);
        }
        list
    }

    fn cell_coords(&self, position: DVec3) -> [usize; 3] {
        let scaled = position / self.cell_edge;
        [
            (scaled.x.floor() as i64).rem_euclid(self.dims[0] as i64) as usize,
            (scaled.y.floor() as i64).rem_euclid(self.dims[1] as i64) as usize,
            (scaled.z.floor() as i64).rem_euclid(self.dims[2] as i64) as usize,
        ]
    }

    #[inline]
    fn flatten(&self, c: [usize; 3]) -> usize {
        (c[0] * self.dims[1] + c[1]) * self.dims[2] + c[2]
    }

    fn cell_index(&self, position: DVec3) -> usize {
        self.flatten(self.cell_coords(position))
    }

    /// Moves particle `id` to the cell matching `position`.
    pub fn relocate(&mut self, id: usize, position: DVec3) {
        let new_cell = self.cell_index(position);
        let old_cell = self.cell_of[id];
        if new_cell == old_cell {
            return;
        }
        let members = &mut self.cells[old_cell];
        if let Some(slot) = members.iter().position(|&j| j == id) {
            members.swap_remove(slot);
        }
        self.cells[new_cell].push(id);
        self.cell_of[id] = new_cell;
    }

    /// Calls `f(j)` for each particle `j != center` whose minimum-image
    /// distance to `center` is strictly below `radius`.
    ///
    /// Each neighbor is reported once, even when the query sphere wraps
    /// around a box that is only a few cells wide.
    pub fn for_each_neighbor<F: FnMut(usize)>(
        &self,
        system: &ParticleSystem,
        center: usize,
        radius: f64,
        mut f: F,
    ) {
        let origin = system.particle(center).position;
        let boundary = system.boundary();
        let radius_sq = radius * radius;
        let home = self.cell_coords(origin);

        let axis_cells = |axis: usize, edge: f64| -> Vec<usize> {
            let n = self.dims[axis];
            let reach = (radius / edge).ceil() as i64;
            if 2 * reach + 1 >= n as i64 {
                return (0..n).collect();
            }
            (-reach..=reach)
                .map(|offset| (home[axis] as i64 + offset).rem_euclid(n as i64) as usize)
                .collect()
        };
        let xs = axis_cells(0, self.cell_edge.x);
        let ys = axis_cells(1, self.cell_edge.y);
        let zs = axis_cells(2, self.cell_edge.z);

        for &gx in &xs {
            for &gy in &ys {
                for &gz in &zs {
                    for &j in &self.cells[self.flatten([gx, gy, gz])] {
                        if j == center {
                            continue;
                        }
                        let dr = boundary.nearest_image(system.particle(j).position - origin);
                        if dr.length_squared() < radius_sq {
                            f(j);
                        }
                    }
                }
            }
        }
    }

    /// Returns the requested minimum cell edge.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of cells along each axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }
}
