//! Dense linear algebra for building spectral operators.
//!
//! The matrices involved are `nZone × nZone`, so plain dense routines are
//! enough.

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

/// Errors that can occur in the dense matrix routines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix is empty")]
    Empty,

    #[error("matrix contains non-finite entries")]
    NonFinite,

    #[error("matrix is singular: pivot {pivot:e} in column {column}")]
    Singular { column: usize, pivot: f64 },

    #[error("cannot multiply a {}x{} matrix by a {}x{} matrix", .left.0, .left.1, .right.0, .right.1)]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// Returns the dense product `a · b`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if `a` has a different number of columns
/// than `b` has rows.
pub fn matrix_product(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>, Error> {
    if a.ncols() != b.nrows() {
        return Err(Error::ShapeMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(a.dot(&b))
}

/// Inverts a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// A pivot is accepted only if its magnitude exceeds `tol · max|M|`, so the
/// threshold scales with the matrix.
///
/// # Errors
///
/// Returns an error if the matrix is not square, is empty, contains
/// non-finite entries, or has no acceptable pivot in some column.
pub fn inverse_block(m: ArrayView2<'_, f64>, tol: f64) -> Result<Array2<f64>, Error> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(Error::NotSquare { rows, cols });
    }
    if rows == 0 {
        return Err(Error::Empty);
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(Error::NonFinite);
    }

    let n = rows;
    let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = tol * scale;

    let mut a = m.to_owned();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        let mut pivot_row = col;
        for row in (col + 1)..n {
            if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }

        let pivot = a[[pivot_row, col]];
        if pivot == 0.0 || pivot.abs() <= threshold || !pivot.is_finite() {
            return Err(Error::Singular { column: col, pivot });
        }

        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
                inv.swap([col, k], [pivot_row, k]);
            }
        }

        let scale = 1.0 / pivot;
        a.row_mut(col).mapv_inplace(|v| v * scale);
        inv.row_mut(col).mapv_inplace(|v| v * scale);

        let pivot_a = a.row(col).to_owned();
        let pivot_inv = inv.row(col).to_owned();
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor != 0.0 {
                a.row_mut(row).scaled_add(-factor, &pivot_a);
                inv.row_mut(row).scaled_add(-factor, &pivot_inv);
            }
        }
    }

    Ok(inv)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = array![[4.0, 7.0, 2.0], [3.0, 6.0, 1.0], [2.0, 5.0, 3.0]];

        let inv = inverse_block(m.view(), 1e-12).unwrap();
        let product = matrix_product(m.view(), inv.view()).unwrap();

        for ((i, j), value) in product.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn pivots_past_a_zero_diagonal() {
        let m = array![[0.0, 2.0], [3.0, 0.0]];

        let inv = inverse_block(m.view(), 1e-12).unwrap();

        assert_abs_diff_eq!(inv[[0, 1]], 1.0 / 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(inv[[1, 0]], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(inv[[0, 0]], 0.0);
        assert_abs_diff_eq!(inv[[1, 1]], 0.0);
    }

    #[test]
    fn detects_singular_matrix() {
        let m = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 0.0, 1.0]];

        let err = inverse_block(m.view(), 1e-12).unwrap_err();

        assert!(matches!(err, Error::Singular { .. }));
    }

    #[test]
    fn threshold_scales_with_matrix() {
        let m = array![[1.0, 0.0], [0.0, 1e-9]];

        assert!(inverse_block(m.view(), 1e-12).is_ok());
        assert!(matches!(
            inverse_block(m.view(), 1e-6),
            Err(Error::Singular { column: 1, .. })
        ));
    }

    #[test]
    fn rejects_bad_input() {
        let rect = Array2::<f64>::zeros((2, 3));
        assert_eq!(
            inverse_block(rect.view(), 1e-12),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        );

        let empty = Array2::<f64>::zeros((0, 0));
        assert_eq!(inverse_block(empty.view(), 1e-12), Err(Error::Empty));

        let nan = array![[1.0, f64::NAN], [0.0, 1.0]];
        assert_eq!(inverse_block(nan.view(), 1e-12), Err(Error::NonFinite));
    }

    #[test]
    fn product_checks_shapes() {
        let a = Array2::<f64>::ones((2, 3));
        let b = Array2::<f64>::ones((2, 3));

        let err = matrix_product(a.view(), b.view()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot multiply a 2x3 matrix by a 2x3 matrix"
        );
    }
}
