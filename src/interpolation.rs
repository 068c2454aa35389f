//! Scattered data linear interpolation
//!
//! The nodes are triangulated with a Delaunay triangulation and the values are
//! linearly interpolated inside each triangle using the barycentric coordinates
//! of the query point. Query points outside the convex hull of the nodes are
//! given the `NaN` fill value.

use nalgebra::DMatrix;
use rayon::prelude::*;
use rstar::{
    primitives::{GeomWithData, Rectangle},
    RTree,
};

#[derive(Debug, thiserror::Error)]
pub enum InterpolationError {
    #[error("found {0} nodes but {1} values")]
    Mismatch(usize, usize),
    #[error("at least 3 nodes are required, found {0}")]
    TooFewNodes(usize),
    #[error("the Delaunay triangulation of the nodes is empty")]
    EmptyTriangulation,
    #[error("query coordinates shapes differ: {0:?} and {1:?}")]
    QueryShape((usize, usize), (usize, usize)),
}
type Result<T> = std::result::Result<T, InterpolationError>;

// relative tolerance on the barycentric coordinates for points on triangle edges
const EDGE_TOLERANCE: f64 = 1e-10;

type TriangleBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Linear interpolant over a Delaunay triangulation
pub struct LinearInterpolator {
    nodes: Vec<[f64; 2]>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    tree: RTree<TriangleBox>,
}
impl LinearInterpolator {
    /// Triangulates the `nodes` holding the `values`
    pub fn new(nodes: Vec<[f64; 2]>, values: Vec<f64>) -> Result<Self> {
        if nodes.len() != values.len() {
            return Err(InterpolationError::Mismatch(nodes.len(), values.len()));
        }
        if nodes.len() < 3 {
            return Err(InterpolationError::TooFewNodes(nodes.len()));
        }
        let del = triangle_rs::Delaunay::builder()
            .add_nodes(&nodes.iter().flat_map(|xy| xy.to_vec()).collect::<Vec<f64>>())
            .set_switches("Q")
            .build();
        let triangles: Vec<[usize; 3]> = del
            .triangle_iter()
            .map(|t| {
                let t: Vec<usize> = t.iter().cloned().collect();
                [t[0], t[1], t[2]]
            })
            .collect();
        if triangles.is_empty() {
            return Err(InterpolationError::EmptyTriangulation);
        }
        let tree = RTree::bulk_load(
            triangles
                .iter()
                .enumerate()
                .map(|(k, t)| {
                    let (lower, upper) = t.iter().map(|&i| nodes[i]).fold(
                        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
                        |(mut lo, mut up), p| {
                            for a in 0..2 {
                                lo[a] = lo[a].min(p[a]);
                                up[a] = up[a].max(p[a]);
                            }
                            (lo, up)
                        },
                    );
                    GeomWithData::new(Rectangle::from_corners(lower, upper), k)
                })
                .collect(),
        );
        log::debug!(
            "triangulated {} nodes into {} triangles",
            nodes.len(),
            triangles.len()
        );
        Ok(Self {
            nodes,
            values,
            triangles,
            tree,
        })
    }
    /// Creates the interpolant from the nodes of a coordinate grid and the grid values
    pub fn from_grid(x: &DMatrix<f64>, y: &DMatrix<f64>, values: &DMatrix<f64>) -> Result<Self> {
        if x.shape() != y.shape() {
            return Err(InterpolationError::QueryShape(x.shape(), y.shape()));
        }
        Self::new(
            x.iter().zip(y.iter()).map(|(&x, &y)| [x, y]).collect(),
            values.iter().cloned().collect(),
        )
    }
    /// Returns the number of triangles
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }
    /// Returns the barycentric coordinates of `point` in triangle `k` if the point is inside
    fn barycentric(&self, k: usize, point: [f64; 2]) -> Option<[f64; 3]> {
        let [a, b, c] = self.triangles[k].map(|i| self.nodes[i]);
        let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
        if det == 0f64 {
            return None;
        }
        let l1 = ((b[1] - c[1]) * (point[0] - c[0]) + (c[0] - b[0]) * (point[1] - c[1])) / det;
        let l2 = ((c[1] - a[1]) * (point[0] - c[0]) + (a[0] - c[0]) * (point[1] - c[1])) / det;
        let l3 = 1f64 - l1 - l2;
        [l1, l2, l3]
            .iter()
            .all(|&l| l >= -EDGE_TOLERANCE)
            .then_some([l1, l2, l3])
    }
    /// Interpolates the values at `point`
    ///
    /// Returns `NaN` if `point` lies outside the convex hull of the nodes.
    pub fn interpolate(&self, point: [f64; 2]) -> f64 {
        if !(point[0].is_finite() && point[1].is_finite()) {
            return f64::NAN;
        }
        self.tree
            .locate_all_at_point(&point)
            .find_map(|t| {
                self.barycentric(t.data, point).map(|w| {
                    self.triangles[t.data]
                        .iter()
                        .zip(w)
                        .map(|(&i, w)| w * self.values[i])
                        .sum::<f64>()
                })
            })
            .unwrap_or(f64::NAN)
    }
    /// Interpolates the values at the query points `(xq, yq)`
    pub fn interpolate_map(&self, xq: &DMatrix<f64>, yq: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if xq.shape() != yq.shape() {
            return Err(InterpolationError::QueryShape(xq.shape(), yq.shape()));
        }
        let (nrows, ncols) = xq.shape();
        let data: Vec<f64> = xq
            .as_slice()
            .par_iter()
            .zip(yq.as_slice().par_iter())
            .map(|(&x, &y)| self.interpolate([x, y]))
            .collect();
        Ok(DMatrix::from_vec(nrows, ncols, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid;

    fn plane(x: f64, y: f64) -> f64 {
        3. * x - 2. * y + 0.5
    }

    fn plane_interpolator() -> LinearInterpolator {
        let (x, y) = grid::centered(1., 11, 9);
        let values = x.zip_map(&y, plane);
        LinearInterpolator::from_grid(&x, &y, &values).unwrap()
    }

    #[test]
    fn reproduces_linear_function() {
        let interp = plane_interpolator();
        for &(x, y) in &[(0.13, -0.77), (-0.95, 0.42), (0.5, 0.5), (0.999, -0.999)] {
            let z = interp.interpolate([x, y]);
            assert!((z - plane(x, y)).abs() < 1e-9, "({},{}): {}", x, y, z);
        }
    }

    #[test]
    fn reproduces_node_values() {
        let interp = plane_interpolator();
        for &(x, y) in &[(-1., -1.), (1., 1.), (0.2, 0.25), (-1., 0.)] {
            let z = interp.interpolate([x, y]);
            assert!((z - plane(x, y)).abs() < 1e-9);
        }
    }

    #[test]
    fn nan_outside_convex_hull() {
        let interp = plane_interpolator();
        assert!(interp.interpolate([1.01, 0.]).is_nan());
        assert!(interp.interpolate([0., -1.5]).is_nan());
        assert!(interp.interpolate([f64::NAN, 0.]).is_nan());
        assert!(interp.interpolate([f64::INFINITY, 0.]).is_nan());
    }

    #[test]
    fn scattered_nodes() {
        let nodes = vec![[0., 0.], [2., 0.], [0., 2.], [2., 2.], [0.7, 1.1]];
        let values: Vec<f64> = nodes.iter().map(|p| plane(p[0], p[1])).collect();
        let interp = LinearInterpolator::new(nodes, values).unwrap();
        assert!(interp.n_triangles() >= 4);
        let z = interp.interpolate([1.5, 0.3]);
        assert!((z - plane(1.5, 0.3)).abs() < 1e-9);
    }

    #[test]
    fn map_keeps_query_shape() {
        let interp = plane_interpolator();
        let (xq, yq) = grid::centered(1.2, 7, 5);
        let z = interp.interpolate_map(&xq, &yq).unwrap();
        assert_eq!(z.shape(), (5, 7));
        assert!(z[(0, 0)].is_nan());
        assert!((z[(2, 3)] - plane(0., 0.)).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(matches!(
            LinearInterpolator::new(vec![[0., 0.], [1., 0.]], vec![0., 1.]),
            Err(InterpolationError::TooFewNodes(2))
        ));
        assert!(matches!(
            LinearInterpolator::new(vec![[0., 0.], [1., 0.], [0., 1.]], vec![0.]),
            Err(InterpolationError::Mismatch(3, 1))
        ));
    }
}
