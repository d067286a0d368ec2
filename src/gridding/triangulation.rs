//! Delaunay triangulation of scattered source points with R-tree lookup
//!
//! The triangulation is built once per set of source coordinates. Queries go
//! through two R-trees: one over triangle bounding boxes to find the triangle
//! containing a target, one over the points for nearest-neighbour lookup.

use crate::errors::{Result, RuFeDiagError};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation as _};

/// Barycentric coordinates down to this (negative) value still count as inside
const INSIDE_TOLERANCE: f64 = -1e-10;

type TriangleBox = GeomWithData<Rectangle<[f64; 2]>, usize>;
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Source point carrying its position in the input arrays
#[derive(Debug, Clone, Copy)]
struct SourcePoint {
    x: f64,
    y: f64,
    index: usize,
}

impl HasPosition for SourcePoint {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// A triangle containing a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Index into [`Triangulation::triangles`]
    pub triangle: usize,
    /// Weights of the triangle's three vertices, summing to one
    pub barycentric: [f64; 3],
}

/// Triangulated source points
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    triangles: Vec<[usize; 3]>,
    triangle_index: RTree<TriangleBox>,
    point_index: RTree<IndexedPoint>,
}

impl Triangulation {
    /// Triangulate the points `(xs[i], ys[i])`
    ///
    /// Coincident points are merged by the triangulation; only one of them
    /// becomes a triangle vertex.
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::InterpolationError`] if the coordinate arrays
    /// differ in length, are empty or hold non-finite values.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(RuFeDiagError::InterpolationError(format!(
                "{} x coordinates but {} y coordinates",
                xs.len(),
                ys.len()
            )));
        }
        if xs.is_empty() {
            return Err(RuFeDiagError::InterpolationError(
                "no source points to triangulate".to_string(),
            ));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(RuFeDiagError::InterpolationError(
                "source coordinates must be finite".to_string(),
            ));
        }

        let points: Vec<[f64; 2]> = xs.iter().zip(ys).map(|(&x, &y)| [x, y]).collect();
        let vertices: Vec<SourcePoint> = points
            .iter()
            .enumerate()
            .map(|(index, p)| SourcePoint {
                x: p[0],
                y: p[1],
                index,
            })
            .collect();

        let delaunay = DelaunayTriangulation::<SourcePoint>::bulk_load(vertices)
            .map_err(|e| RuFeDiagError::InterpolationError(format!("Delaunay triangulation failed: {e}")))?;

        let triangles: Vec<[usize; 3]> = delaunay
            .inner_faces()
            .map(|face| face.vertices().map(|v| v.data().index))
            .collect();

        let triangle_index = RTree::bulk_load(
            triangles
                .iter()
                .enumerate()
                .map(|(t, tri)| {
                    let [a, b, c] = tri.map(|i| points[i]);
                    let lower = [a[0].min(b[0]).min(c[0]), a[1].min(b[1]).min(c[1])];
                    let upper = [a[0].max(b[0]).max(c[0]), a[1].max(b[1]).max(c[1])];
                    GeomWithData::new(Rectangle::from_corners(lower, upper), t)
                })
                .collect(),
        );
        let point_index = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(i, &p)| GeomWithData::new(p, i))
                .collect(),
        );

        log::debug!(
            "Triangulated {} points into {} triangles",
            points.len(),
            triangles.len()
        );

        Ok(Self {
            points,
            triangles,
            triangle_index,
            point_index,
        })
    }

    #[must_use]
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Triangles as indices into [`Triangulation::points`], counter-clockwise
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Vertex positions of triangle `t`
    #[must_use]
    pub fn corners(&self, t: usize) -> [[f64; 2]; 3] {
        self.triangles[t].map(|i| self.points[i])
    }

    /// The triangle containing `p`, or `None` outside the convex hull
    #[must_use]
    pub fn locate(&self, p: [f64; 2]) -> Option<Location> {
        self.triangle_index
            .locate_all_at_point(&p)
            .find_map(|candidate| {
                let barycentric = barycentric(self.corners(candidate.data), p)?;
                barycentric
                    .iter()
                    .all(|&l| l >= INSIDE_TOLERANCE)
                    .then_some(Location {
                        triangle: candidate.data,
                        barycentric,
                    })
            })
    }

    /// Index of the source point closest to `p`
    #[must_use]
    pub fn nearest(&self, p: [f64; 2]) -> Option<usize> {
        self.point_index.nearest_neighbor(&p).map(|point| point.data)
    }
}

/// Barycentric coordinates of `p` in triangle `[a, b, c]`; `None` if degenerate
#[must_use]
pub fn barycentric([a, b, c]: [[f64; 2]; 3], p: [f64; 2]) -> Option<[f64; 3]> {
    let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
    if det == 0.0 {
        return None;
    }
    let l0 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
    let l1 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
    Some([l0, l1, 1.0 - l0 - l1])
}
