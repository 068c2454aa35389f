//! Sampling grids
//!
//! Evenly spaced coordinates and their Cartesian products, laid out as
//! [`DMatrix`] with the y coordinate along the rows and the x coordinate along
//! the columns.

use nalgebra::DMatrix;

/// Returns `n` evenly spaced samples over `[start, end]`, end points included
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        start + i as f64 * step
                    }
                })
                .collect()
        }
    }
}

/// Returns the `(x, y)` coordinate matrices of the grid spanned by `x` and `y`
///
/// Both matrices have `y.len()` rows and `x.len()` columns.
pub fn meshgrid(x: &[f64], y: &[f64]) -> (DMatrix<f64>, DMatrix<f64>) {
    let (nrows, ncols) = (y.len(), x.len());
    (
        DMatrix::from_fn(nrows, ncols, |_, j| x[j]),
        DMatrix::from_fn(nrows, ncols, |i, _| y[i]),
    )
}

/// Square grid over `[-half_width, half_width]` with `n` columns and `m` rows
pub fn centered(half_width: f64, n: usize, m: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    meshgrid(
        &linspace(-half_width, half_width, n),
        &linspace(-half_width, half_width, m),
    )
}
