//! Periodic-channel mesh generator
//!
//! Builds the rotated channel used by the Soufflet experiments: a rectangle
//! turned by 45°, filled with right-angled isosceles triangles whose legs run
//! along the rectangle's sides.
//!
//! ```text
//!              top
//!             /   \
//!         left     right
//!             \   /
//!             bottom
//! ```
//!
//! Grid index `i` walks from `left` towards `bottom`, `j` from `left` towards
//! `top`. Nodes are numbered with `i` as the slow index.

use crate::config::OverwritePolicy;
use crate::errors::{Result, RuFeDiagError};
use crate::mesh::{DepthLevels, Mesh2D, MeshNode};
use log::info;
use std::path::Path;

/// Depths (m) of the 41 layer interfaces of the standard channel set-up
pub const SOUFFLET_ZBAR: [f64; 41] = [
    0.0, 9.03766, 18.9791, 29.9146, 41.9438, 55.1758, 69.731, 85.7418, 103.354, 122.727, 144.037,
    167.478, 193.264, 221.628, 252.828, 287.149, 324.901, 366.429, 412.11, 462.358, 517.632,
    578.433, 645.314, 718.883, 799.809, 888.827, 986.747, 1094.46, 1212.94, 1343.28, 1486.64,
    1644.34, 1817.81, 2008.63, 2218.53, 2449.43, 2703.41, 2982.78, 3290.1, 3628.15, 4000.0,
];

/// Tolerance subtracted from the triangle side when flagging boundary nodes
const BOUNDARY_EPS: f64 = 0.001;

/// The four corners of the rotated channel, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCorners {
    pub left: [f64; 2],
    pub bottom: [f64; 2],
    pub right: [f64; 2],
    pub top: [f64; 2],
}

impl Default for ChannelCorners {
    fn default() -> Self {
        Self {
            left: [0.0, 30.0],
            bottom: [15.0, 15.0],
            right: [35.0, 35.0],
            top: [20.0, 50.0],
        }
    }
}

impl ChannelCorners {
    /// Sides as (start, end) pairs: left–top, left–bottom, right–bottom, right–top
    fn sides(&self) -> [([f64; 2], [f64; 2]); 4] {
        [
            (self.left, self.top),
            (self.left, self.bottom),
            (self.right, self.bottom),
            (self.right, self.top),
        ]
    }

    /// Distance from `p` to the nearest side line
    fn distance_to_sides(&self, p: [f64; 2]) -> f64 {
        self.sides()
            .iter()
            .map(|&(a, b)| distance_to_line(a, b, p))
            .fold(f64::INFINITY, f64::min)
    }
}

/// A generated mesh with its vertical levels
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMesh {
    pub mesh: Mesh2D,
    pub depths: DepthLevels,
}

impl GeneratedMesh {
    /// Write `nod2d.out`, `elem2d.out` and `aux3d.out` into `dir`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::OutputExists`] if a file exists and `policy`
    /// forbids replacing it, or an I/O error.
    pub fn write(&self, dir: &Path, policy: OverwritePolicy) -> Result<()> {
        policy.check(&dir.join(crate::mesh::DEPTHS_FILE))?;
        self.mesh.write(dir, policy)?;
        self.depths.write(dir, policy)
    }
}

/// Builder for the rotated channel mesh
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeshBuilder {
    corners: ChannelCorners,
    dx: f64,
    levels: Vec<f64>,
}

impl Default for ChannelMeshBuilder {
    fn default() -> Self {
        Self {
            corners: ChannelCorners::default(),
            dx: 0.2,
            levels: SOUFFLET_ZBAR.to_vec(),
        }
    }
}

impl ChannelMeshBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn corners(mut self, corners: ChannelCorners) -> Self {
        self.corners = corners;
        self
    }

    /// Length of the triangles' legs, in degrees
    #[must_use]
    pub fn dx(mut self, dx: f64) -> Self {
        self.dx = dx;
        self
    }

    /// Interface depths (positive, m)
    #[must_use]
    pub fn levels(mut self, levels: Vec<f64>) -> Self {
        self.levels = levels;
        self
    }

    /// Diagonal step between neighbouring nodes along either axis
    #[must_use]
    pub fn diagonal_step(&self) -> f64 {
        (self.dx / std::f64::consts::SQRT_2 * 1e4).round() / 1e4
    }

    /// Nodes along `i` (left→bottom) and `j` (left→top), before corner removal
    #[must_use]
    pub fn grid_counts(&self) -> (usize, usize) {
        let ChannelCorners { left, bottom, top, .. } = self.corners;
        let count = |extent: f64| {
            let steps = (std::f64::consts::SQRT_2 * extent / self.dx).floor();
            if steps.is_finite() && steps >= 0.0 {
                steps as usize + 1
            } else {
                0
            }
        };
        (count(bottom[0] - left[0]), count(top[1] - left[1]))
    }

    /// Generate the mesh
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::InvalidConfig`] if `dx` is not a positive
    /// number, the corners give fewer than two nodes along either axis, or no
    /// levels are set.
    pub fn build(&self) -> Result<GeneratedMesh> {
        if !(self.dx.is_finite() && self.dx > 0.0) {
            return Err(RuFeDiagError::InvalidConfig {
                message: format!("triangle side must be positive, got {}", self.dx),
            });
        }
        if self.levels.is_empty() {
            return Err(RuFeDiagError::InvalidConfig {
                message: "at least one vertical level is required".to_string(),
            });
        }
        let (n_i, n_j) = self.grid_counts();
        if n_i < 2 || n_j < 2 {
            return Err(RuFeDiagError::InvalidConfig {
                message: format!("corners give a {n_i} x {n_j} node grid, need at least 2 x 2"),
            });
        }

        let d = self.diagonal_step();
        let left = self.corners.left;
        let dropped = |i: usize, j: usize| (i, j) == (0, n_j - 1) || (i, j) == (n_i - 1, 0);

        // 0-based node number of grid position (i, j)
        let mut numbering: Vec<Option<usize>> = vec![None; n_i * n_j];
        let mut nodes = Vec::with_capacity(n_i * n_j - 2);
        for i in 0..n_i {
            for j in 0..n_j {
                if dropped(i, j) {
                    continue;
                }
                let (fi, fj) = (i as f64, j as f64);
                let p = [left[0] + (fi + fj) * d, left[1] + (fj - fi) * d];
                numbering[i * n_j + j] = Some(nodes.len());
                nodes.push(MeshNode {
                    lon: p[0],
                    lat: p[1],
                    boundary: self.corners.distance_to_sides(p) < self.dx - BOUNDARY_EPS,
                });
            }
        }

        let node_at = |i: usize, j: usize| -> Option<usize> {
            (i < n_i && j < n_j).then(|| numbering[i * n_j + j]).flatten()
        };

        let mut elements = Vec::new();
        for i in 0..n_i {
            for j in 0..n_j {
                let Some(n) = node_at(i, j) else { continue };
                if let (Some(n1), Some(n2)) = (node_at(i, j + 1), node_at(i + 1, j + 1)) {
                    elements.push([n, n1, n2]);
                }
                if let (Some(n1), Some(n2)) = (node_at(i + 1, j + 1), node_at(i + 1, j)) {
                    elements.push([n, n1, n2]);
                }
            }
        }

        info!(
            "🔺 Generated channel mesh: {n_i} x {n_j} grid, {} nodes, {} elements, {} levels",
            nodes.len(),
            elements.len(),
            self.levels.len()
        );

        let depths = DepthLevels::flat_bottom(&self.levels, nodes.len());
        Ok(GeneratedMesh {
            mesh: Mesh2D { nodes, elements },
            depths,
        })
    }
}

/// Distance from `p` to the infinite line through `a` and `b`
fn distance_to_line(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    let (ex, ey) = (a[0] - b[0], a[1] - b[1]);
    let (qx, qy) = (b[0] - p[0], b[1] - p[1]);
    let length = ex.hypot(ey);
    if length == 0.0 {
        return (p[0] - a[0]).hypot(p[1] - a[1]);
    }
    (ex * qy - ey * qx).abs() / length
}
