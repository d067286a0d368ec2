//! Clough–Tocher cubic interpolation on a triangulation
//!
//! Each triangle is split at its centroid into three cubic Bézier patches.
//! Control points follow from the vertex values and gradients; the points next
//! to an outer edge are chosen so the derivative across that edge is linear
//! along it, which makes the interpolant C¹ across neighbouring triangles
//! sharing the same vertex gradients. Linear data is reproduced exactly.

use super::triangulation::Triangulation;

type Vec2 = [f64; 2];

/// Area-weighted average of the plane gradients of a vertex's triangles
///
/// Triangles with a missing (NaN) vertex value or zero area are skipped; a
/// vertex with no usable triangle gets a zero gradient.
#[must_use]
pub fn vertex_gradients(tri: &Triangulation, values: &[f64]) -> Vec<Vec2> {
    let n = tri.points().len();
    let mut sums = vec![[0.0_f64; 2]; n];
    let mut weights = vec![0.0_f64; n];

    for (t, triangle) in tri.triangles().iter().enumerate() {
        let f = triangle.map(|i| values[i]);
        if f.iter().any(|v| v.is_nan()) {
            continue;
        }
        let [a, b, c] = tri.corners(t);
        let (e1, e2) = (sub(b, a), sub(c, a));
        let det = e1[0] * e2[1] - e1[1] * e2[0];
        if det == 0.0 {
            continue;
        }
        let (df1, df2) = (f[1] - f[0], f[2] - f[0]);
        let gradient = [
            (df1 * e2[1] - df2 * e1[1]) / det,
            (df2 * e1[0] - df1 * e2[0]) / det,
        ];
        let area = 0.5 * det.abs();

        for &i in triangle {
            sums[i][0] += area * gradient[0];
            sums[i][1] += area * gradient[1];
            weights[i] += area;
        }
    }

    sums.iter()
        .zip(&weights)
        .map(|(s, &w)| if w > 0.0 { [s[0] / w, s[1] / w] } else { [0.0, 0.0] })
        .collect()
}

/// Evaluate the Clough–Tocher patch of one triangle
///
/// `vertices`, `f` and `grad` describe the triangle's corners; `bary` are the
/// target's barycentric coordinates in that triangle.
#[must_use]
pub fn evaluate(vertices: [Vec2; 3], f: [f64; 3], grad: [Vec2; 3], bary: [f64; 3]) -> f64 {
    let centroid = [
        (vertices[0][0] + vertices[1][0] + vertices[2][0]) / 3.0,
        (vertices[0][1] + vertices[1][1] + vertices[2][1]) / 3.0,
    ];

    // Points next to each corner, towards the next corner, the previous corner
    // and the centroid.
    let towards = |k: usize, target: Vec2| f[k] + dot(grad[k], sub(target, vertices[k])) / 3.0;
    let forward: [f64; 3] = std::array::from_fn(|k| towards(k, vertices[(k + 1) % 3]));
    let backward: [f64; 3] = std::array::from_fn(|k| towards(k, vertices[(k + 2) % 3]));
    let inner: [f64; 3] = std::array::from_fn(|k| towards(k, centroid));

    // Point in the middle of each outer-edge patch, edge k runs from corner k to k + 1.
    let edge: [f64; 3] = std::array::from_fn(|k| {
        let next = (k + 1) % 3;
        let (a, b) = (vertices[k], vertices[next]);
        let ab = sub(b, a);
        let alpha = dot(sub(centroid, a), ab) / dot(ab, ab);

        let t0 = 3.0 * (forward[k] - f[k]);
        let t1 = 3.0 * (backward[next] - forward[k]);
        let t2 = 3.0 * (f[next] - backward[next]);
        let c0 = 3.0 * (inner[k] - f[k]);
        let c2 = 3.0 * (inner[next] - backward[next]);

        let d1 = alpha * t1 + 0.5 * (c0 + c2 - alpha * (t0 + t2));
        forward[k] + d1 / 3.0
    });

    let near_centre: [f64; 3] =
        std::array::from_fn(|k| (inner[k] + edge[k] + edge[(k + 2) % 3]) / 3.0);
    let centre = (near_centre[0] + near_centre[1] + near_centre[2]) / 3.0;

    // Sub-triangle (corner k, corner k + 1, centroid) holds the target when the
    // remaining corner has the smallest weight.
    let far = (0..3)
        .min_by(|&i, &j| bary[i].total_cmp(&bary[j]))
        .unwrap_or(0);
    let k = (far + 1) % 3;
    let next = (k + 1) % 3;
    let m = bary[far];
    let (a, b, c) = (bary[k] - m, bary[next] - m, 3.0 * m);

    f[k] * a.powi(3)
        + f[next] * b.powi(3)
        + centre * c.powi(3)
        + 3.0 * forward[k] * a * a * b
        + 3.0 * backward[next] * a * b * b
        + 3.0 * inner[k] * a * a * c
        + 3.0 * inner[next] * b * b * c
        + 3.0 * near_centre[k] * a * c * c
        + 3.0 * near_centre[next] * b * c * c
        + 6.0 * edge[k] * a * b * c
}

fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn dot(a: Vec2, b: Vec2) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}
