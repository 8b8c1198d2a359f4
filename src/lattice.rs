use nalgebra::Vector2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::{
    datatypes::{Boundary, LatticeMetadata},
    error::FissureError,
};

/// Node index sets for the four edges of the grid. Corners appear in two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySets {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub top: Vec<usize>,
    pub bottom: Vec<usize>,
}

impl BoundarySets {
    /// Derives the edge sets of an `nx` by `ny` grid stored row by row,
    /// bottom row first. A grid with no nodes has empty sets.
    pub fn for_grid(nx: usize, ny: usize) -> BoundarySets {
        if nx == 0 || ny == 0 {
            return BoundarySets {
                left: Vec::new(),
                right: Vec::new(),
                top: Vec::new(),
                bottom: Vec::new(),
            };
        }
        BoundarySets {
            left: (0..ny).map(|row| row * nx).collect(),
            right: (0..ny).map(|row| row * nx + nx - 1).collect(),
            top: ((ny - 1) * nx..ny * nx).collect(),
            bottom: (0..nx).collect(),
        }
    }

    pub fn get(&self, boundary: Boundary) -> &[usize] {
        match boundary {
            Boundary::Left => &self.left,
            Boundary::Right => &self.right,
            Boundary::Top => &self.top,
            Boundary::Bottom => &self.bottom,
        }
    }
}

/// Node positions and spring connectivity of the lattice.
///
/// Immutable once built. Nodes are numbered `row * nx + column`, with row 0
/// at the bottom (`yi`) and column 0 on the left (`xi`).
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeTopology {
    nx: usize,
    ny: usize,
    positions: Vec<Vector2<f64>>,
    connections: Vec<[usize; 2]>,
    boundaries: BoundarySets,
}

/// Lists every nearest-neighbour pair of an `nx` by `ny` grid once.
///
/// Walks nodes in index order and links each one to its right, upper,
/// upper-right and upper-left neighbours where they exist, which covers the
/// horizontal, vertical and both diagonal bonds without duplicates. A grid
/// with no nodes has no connections.
pub fn stencil_connections(nx: usize, ny: usize) -> Vec<[usize; 2]> {
    if nx == 0 || ny == 0 {
        return Vec::new();
    }
    let capacity = (nx - 1) * ny + nx * (ny - 1) + 2 * (nx - 1) * (ny - 1);
    let mut connections: Vec<[usize; 2]> = Vec::with_capacity(capacity);

    for row in 0..ny {
        for col in 0..nx {
            let node = row * nx + col;
            let has_right = col + 1 < nx;
            let has_up = row + 1 < ny;

            if has_right {
                connections.push([node, node + 1]);
            }
            if has_up {
                connections.push([node, node + nx]);
            }
            if has_right && has_up {
                connections.push([node, node + nx + 1]);
            }
            if col > 0 && has_up {
                connections.push([node, node + nx - 1]);
            }
        }
    }

    connections
}

impl LatticeTopology {
    /// Lays out the jittered grid and its springs.
    ///
    /// Offsets are drawn per node and per axis from `N(0, jitter²)` using a
    /// ChaCha8 generator seeded with `lattice.seed`, so a given seed always
    /// yields the same lattice.
    pub fn new(lattice: &LatticeMetadata) -> Result<LatticeTopology, FissureError> {
        let LatticeMetadata {
            nx,
            ny,
            xi,
            yi,
            xe,
            ye,
            jitter,
            seed,
        } = *lattice;

        if nx < 2 || ny < 2 {
            return Err(FissureError::Configuration(format!(
                "cannot form a lattice from {nx}x{ny} nodes, need at least 2x2"
            )));
        }

        if !(jitter >= 0.0 && jitter.is_finite()) {
            return Err(FissureError::Configuration(format!(
                "jitter must be a finite non-negative standard deviation, got {jitter}"
            )));
        }

        let offsets = match Normal::new(0.0, jitter) {
            Ok(n) => n,
            Err(err) => {
                return Err(FissureError::Configuration(format!(
                    "invalid jitter magnitude {jitter}: {err}"
                )))
            }
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let dx = (xe - xi) / (nx - 1) as f64;
        let dy = (ye - yi) / (ny - 1) as f64;

        let mut positions: Vec<Vector2<f64>> = Vec::with_capacity(nx * ny);
        for row in 0..ny {
            for col in 0..nx {
                positions.push(Vector2::new(xi + col as f64 * dx, yi + row as f64 * dy));
            }
        }
        // x offsets for every node first, then y, so each axis is an
        // independent stream
        for p in positions.iter_mut() {
            p.x += offsets.sample(&mut rng);
        }
        for p in positions.iter_mut() {
            p.y += offsets.sample(&mut rng);
        }

        let connections = stencil_connections(nx, ny);

        info!(
            nodes = positions.len(),
            springs = connections.len(),
            seed,
            "built {nx}x{ny} lattice"
        );

        Ok(LatticeTopology {
            nx,
            ny,
            positions,
            connections,
            boundaries: BoundarySets::for_grid(nx, ny),
        })
    }

    /// Builds a topology from explicit positions and connections, for
    /// lattices that were not laid out by [`LatticeTopology::new`].
    ///
    /// `positions` must hold `nx * ny` entries in row-major order.
    pub fn from_parts(
        nx: usize,
        ny: usize,
        positions: Vec<Vector2<f64>>,
        connections: Vec<[usize; 2]>,
    ) -> Result<LatticeTopology, FissureError> {
        if nx < 2 || ny < 2 {
            return Err(FissureError::Configuration(format!(
                "cannot form a lattice from {nx}x{ny} nodes, need at least 2x2"
            )));
        }
        if positions.len() != nx * ny {
            return Err(FissureError::Configuration(format!(
                "expected {} node positions for a {nx}x{ny} lattice, got {}",
                nx * ny,
                positions.len()
            )));
        }
        for (i, [a, b]) in connections.iter().enumerate() {
            if *a >= positions.len() || *b >= positions.len() || a == b {
                return Err(FissureError::Configuration(format!(
                    "connection {i} ({a}, {b}) does not join two distinct nodes"
                )));
            }
        }

        Ok(LatticeTopology {
            nx,
            ny,
            positions,
            connections,
            boundaries: BoundarySets::for_grid(nx, ny),
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn node_index(&self, col: usize, row: usize) -> usize {
        row * self.nx + col
    }

    pub fn positions(&self) -> &[Vector2<f64>] {
        &self.positions
    }

    pub fn connections(&self) -> &[[usize; 2]] {
        &self.connections
    }

    pub fn boundaries(&self) -> &BoundarySets {
        &self.boundaries
    }
}
