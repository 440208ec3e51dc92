//! Utilities for covariance matrix manipulation
//!
//! This module provides eigenvalue decomposition, conditioning diagnostics and
//! the inversion routines used by the frontier optimizer. Inversion tries a
//! Cholesky factorization first and falls back to an eigendecomposition with
//! floored eigenvalues when the matrix is singular or nearly so.

use super::EstimationError;
use ndarray::{Array1, Array2};

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Relative convergence tolerance for off-diagonal elements in Jacobi sweeps.
pub const JACOBI_TOLERANCE: f64 = 1e-15;

/// Rotation budget for a Jacobi decomposition of an `n x n` matrix.
pub const fn jacobi_rotations(n: usize) -> usize {
    50 * n * n + 100
}

/// Inverse of a symmetric positive semi-definite matrix
#[derive(Debug, Clone)]
pub struct SymmetricInverse {
    /// The (possibly regularized) inverse
    pub inverse: Array2<f64>,
    /// Whether the eigenvalue floor had to be applied
    pub regularized: bool,
}

impl SymmetricInverse {
    /// Invert a symmetric matrix, regularizing when it is near-singular.
    ///
    /// Cholesky is used when every pivot exceeds `regularization * max(diag)`.
    /// Otherwise the matrix is eigendecomposed and every eigenvalue below
    /// `regularization * λ_max` is raised to that floor before inverting, so the
    /// result is the exact inverse of a nearby positive definite matrix.
    ///
    /// # Arguments
    /// * `matrix` - Symmetric matrix to invert
    /// * `regularization` - Relative eigenvalue / pivot floor (e.g. 1e-10)
    pub fn compute(matrix: &Array2<f64>, regularization: f64) -> Result<Self, EstimationError> {
        check_square(matrix)?;
        if !(regularization > 0.0 && regularization < 1.0) {
            return Err(EstimationError::InvalidParameter(format!(
                "regularization must be in (0, 1), got {}",
                regularization
            )));
        }

        let max_diag = matrix.diag().iter().cloned().fold(0.0_f64, f64::max);
        if max_diag > 0.0 {
            if let Some(l) = cholesky(matrix, regularization * max_diag) {
                return Ok(Self {
                    inverse: cholesky_inverse(&l),
                    regularized: false,
                });
            }
        }

        Ok(Self {
            inverse: regularized_inverse(matrix, regularization)?,
            regularized: true,
        })
    }
}

/// Compute the condition number of a symmetric matrix
///
/// The condition number is the ratio of the largest to smallest eigenvalue.
/// A large condition number indicates numerical instability.
///
/// # Returns
/// * Condition number (infinity if the smallest eigenvalue is zero or negative
///   relative to machine precision)
pub fn condition_number(cov: &Array2<f64>) -> f64 {
    match jacobi_eigendecomp(cov, jacobi_rotations(cov.nrows()), JACOBI_TOLERANCE) {
        Ok(decomp) => {
            let max_eig = decomp
                .eigenvalues
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let min_eig = decomp
                .eigenvalues
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);

            if max_eig <= 0.0 || min_eig <= f64::EPSILON * max_eig {
                f64::INFINITY
            } else {
                max_eig / min_eig
            }
        }
        Err(_) => f64::INFINITY,
    }
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// This implementation uses the classical Jacobi algorithm, which is stable and
/// simple. It is well suited to the small matrices of a mean-variance problem.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_iterations` - Maximum number of rotations
/// * `tolerance` - Convergence tolerance for off-diagonal elements, relative to
///   the largest absolute entry of the matrix
///
/// # Returns
/// * Eigenvalues and eigenvectors
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, EstimationError> {
    let n = check_square(matrix)?;
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(EstimationError::NonFinite("matrix"));
    }

    let scale = matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = tolerance * if scale > 0.0 { scale } else { 1.0 };

    // Initialize: A = copy of input matrix, V = identity
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    if n > 1 {
        for _iter in 0..max_iterations {
            let (p, q, max_val) = find_largest_off_diagonal(&a);

            if max_val.abs() <= threshold {
                break;
            }

            let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
            apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
        }
    }

    let eigenvalues: Array1<f64> = a.diag().to_owned();

    // Sort eigenvalues and eigenvectors in descending order
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| eigenvalues[j].total_cmp(&eigenvalues[i]));

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_eigenvectors
            .column_mut(new_idx)
            .assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues: sorted_eigenvalues,
        eigenvectors: sorted_eigenvectors,
    })
}

/// Lower-triangular Cholesky factor `L` with `L * L^T = matrix`.
///
/// Returns `None` when a pivot is not strictly above `min_pivot`, i.e. the
/// matrix is not (numerically) positive definite.
pub fn cholesky(matrix: &Array2<f64>, min_pivot: f64) -> Option<Array2<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut pivot = matrix[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !pivot.is_finite() || pivot <= min_pivot {
            return None;
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / diag;
        }
    }

    Some(l)
}

/// Inverse of `L * L^T` from its Cholesky factor.
fn cholesky_inverse(l: &Array2<f64>) -> Array2<f64> {
    let n = l.nrows();
    let mut inverse = Array2::<f64>::zeros((n, n));

    for col in 0..n {
        // Forward substitution: L y = e_col
        let mut y = Array1::<f64>::zeros(n);
        for i in 0..n {
            let mut sum = if i == col { 1.0 } else { 0.0 };
            for k in 0..i {
                sum -= l[[i, k]] * y[k];
            }
            y[i] = sum / l[[i, i]];
        }

        // Back substitution: L^T x = y
        for i in (0..n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..n {
                sum -= l[[k, i]] * inverse[[k, col]];
            }
            inverse[[i, col]] = sum / l[[i, i]];
        }
    }

    // Clean up rounding asymmetry
    (&inverse + &inverse.t()) / 2.0
}

/// Inverse of a symmetric matrix after flooring its eigenvalues
///
/// Eigenvalues below `floor_ratio * λ_max` (or below `floor_ratio` itself when
/// the matrix has no positive eigenvalue) are raised to that floor.
///
/// # Returns
/// * `V * Λ_floor^-1 * V^T`
pub fn regularized_inverse(
    matrix: &Array2<f64>,
    floor_ratio: f64,
) -> Result<Array2<f64>, EstimationError> {
    let n = check_square(matrix)?;
    let symmetric = (matrix + &matrix.t()) / 2.0;
    let decomp = jacobi_eigendecomp(&symmetric, jacobi_rotations(n), JACOBI_TOLERANCE)?;

    let max_eig = decomp
        .eigenvalues
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = if max_eig > 0.0 {
        floor_ratio * max_eig
    } else {
        floor_ratio
    };

    let reciprocal = decomp.eigenvalues.mapv(|v| 1.0 / v.max(floor));
    let inverse = reconstruct_from_eigen(&reciprocal, &decomp.eigenvectors)?;

    Ok((&inverse + &inverse.t()) / 2.0)
}

/// Find the largest off-diagonal element in a symmetric matrix
fn find_largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    let mut max_val = 0.0;
    let mut p = 0;
    let mut q = 1;

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, matrix[[p, q]])
}

/// Compute the rotation (cos, sin) for Jacobi rotation
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq == 0.0 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply a Jacobi rotation to matrix A and eigenvector matrix V
fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

/// Reconstruct a matrix from eigenvalues and eigenvectors
///
/// Computes: M = V * Λ * V^T
fn reconstruct_from_eigen(
    eigenvalues: &Array1<f64>,
    eigenvectors: &Array2<f64>,
) -> Result<Array2<f64>, EstimationError> {
    let n = eigenvalues.len();
    if eigenvectors.nrows() != n || eigenvectors.ncols() != n {
        return Err(EstimationError::DimensionMismatch {
            expected: n,
            actual: eigenvectors.nrows(),
        });
    }

    let mut v_lambda = eigenvectors.clone();
    for (j, mut column) in v_lambda.columns_mut().into_iter().enumerate() {
        column *= eigenvalues[j];
    }

    Ok(v_lambda.dot(&eigenvectors.t()))
}

fn check_square(matrix: &Array2<f64>) -> Result<usize, EstimationError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(EstimationError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    Ok(n)
}
