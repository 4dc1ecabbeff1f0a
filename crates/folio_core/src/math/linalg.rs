//! Dense symmetric matrices.
//!
//! Covariance and correlation matrices are small (one row per asset) and
//! dense, so they are stored row-major in a flat `Vec<f64>`.
//!
//! ## Mathematical Background
//!
//! For a symmetric positive definite matrix `Σ` the Cholesky factor `L`
//! satisfies `Σ = L Lᵀ`. Given independent standard normals `z`, the vector
//! `L z` has covariance `Σ`.
//!
//! Eigenvalues are computed with the cyclic Jacobi method, which is exact to
//! machine precision for symmetric matrices and needs no external LAPACK.
//!
//! ```
//! use folio_core::math::linalg::SymmetricMatrix;
//!
//! let m = SymmetricMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
//! let eig = m.eigenvalues();
//! assert!((eig[0] - 1.0).abs() < 1e-12);
//! assert!((eig[1] - 3.0).abs() < 1e-12);
//! assert!((m.condition_number() - 3.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYMMETRY_TOLERANCE: f64 = 1e-10;
const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-14;

/// Errors from matrix construction and factorisation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    /// Matrix has no rows.
    #[error("matrix must have at least one row")]
    Empty,

    /// Data length or vector length does not match the dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Required length
        expected: usize,
        /// Supplied length
        got: usize,
    },

    /// Off-diagonal entries differ beyond tolerance.
    #[error("matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row index
        i: usize,
        /// Column index
        j: usize,
    },

    /// Matrix contains NaN or infinite entries.
    #[error("matrix contains non-finite entries")]
    NonFinite,

    /// Cholesky pivot was not strictly positive.
    #[error("matrix is not positive definite (pivot {pivot})")]
    NotPositiveDefinite {
        /// Index of the failing pivot
        pivot: usize,
    },
}

/// Dense symmetric `n × n` matrix.
///
/// Symmetry is enforced at construction: entries are averaged with their
/// transpose so that downstream algorithms see an exactly symmetric matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<f64>>", try_from = "Vec<Vec<f64>>")]
pub struct SymmetricMatrix {
    data: Vec<f64>,
    dim: usize,
}

impl SymmetricMatrix {
    /// Creates a matrix from row-major data.
    ///
    /// # Errors
    ///
    /// Fails on a length mismatch, non-finite entries or asymmetry beyond
    /// a relative tolerance of `1e-10`.
    pub fn new(data: Vec<f64>, dim: usize) -> Result<Self, LinalgError> {
        if dim == 0 {
            return Err(LinalgError::Empty);
        }
        if data.len() != dim * dim {
            return Err(LinalgError::DimensionMismatch {
                expected: dim * dim,
                got: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(LinalgError::NonFinite);
        }

        let scale = data.iter().fold(1.0_f64, |m, x| m.max(x.abs()));
        let mut data = data;
        for i in 0..dim {
            for j in (i + 1)..dim {
                let a = data[i * dim + j];
                let b = data[j * dim + i];
                if (a - b).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(LinalgError::NotSymmetric { i, j });
                }
                let avg = 0.5 * (a + b);
                data[i * dim + j] = avg;
                data[j * dim + i] = avg;
            }
        }
        Ok(Self { data, dim })
    }

    /// Creates a matrix from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, LinalgError> {
        let dim = rows.len();
        let mut data = Vec::with_capacity(dim * dim);
        for row in rows {
            if row.len() != dim {
                return Err(LinalgError::DimensionMismatch {
                    expected: dim,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(data, dim)
    }

    /// Builds a matrix from the lower triangle given by `f(i, j)` for
    /// `j <= i`, mirroring it to the upper triangle.
    pub fn from_lower_fn<F>(dim: usize, mut f: F) -> Result<Self, LinalgError>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..=i {
                let v = f(i, j);
                data[i * dim + j] = v;
                data[j * dim + i] = v;
            }
        }
        Self::new(data, dim)
    }

    /// Zero matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim * dim],
            dim,
        }
    }

    /// Identity matrix.
    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim);
        for i in 0..dim {
            m.data[i * dim + i] = 1.0;
        }
        m
    }

    /// Diagonal matrix with the given entries.
    pub fn diagonal(values: &[f64]) -> Self {
        let dim = values.len();
        let mut m = Self::zeros(dim);
        for (i, v) in values.iter().enumerate() {
            m.data[i * dim + i] = *v;
        }
        m
    }

    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Row-major storage.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy of the diagonal.
    pub fn diag(&self) -> Vec<f64> {
        (0..self.dim).map(|i| self.get(i, i)).collect()
    }

    /// Nested-row copy of the matrix.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.dim).map(|i| self.row(i).to_vec()).collect()
    }

    /// Computes `xᵀ A x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != dim()`.
    pub fn quadratic_form(&self, x: &[f64]) -> f64 {
        assert_eq!(x.len(), self.dim, "vector length must match dimension");
        (0..self.dim)
            .map(|i| x[i] * dot(self.row(i), x))
            .sum()
    }

    /// Computes `A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        (0..self.dim).map(|i| dot(self.row(i), x)).collect()
    }

    /// Returns `A + δI`.
    pub fn diagonal_loaded(&self, delta: f64) -> Self {
        let mut m = self.clone();
        for i in 0..self.dim {
            m.data[i * self.dim + i] += delta;
        }
        m
    }

    /// Eigenvalues in ascending order (cyclic Jacobi).
    pub fn eigenvalues(&self) -> Vec<f64> {
        let n = self.dim;
        let mut a = self.data.clone();
        let frobenius = a.iter().map(|x| x * x).sum::<f64>().sqrt();

        for _ in 0..JACOBI_MAX_SWEEPS {
            let off: f64 = (0..n)
                .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
                .map(|(i, j)| a[i * n + j] * a[i * n + j])
                .sum::<f64>()
                .sqrt();
            if off <= JACOBI_TOLERANCE * frobenius {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = a[p * n + q];
                    if apq == 0.0 {
                        continue;
                    }
                    let app = a[p * n + p];
                    let aqq = a[q * n + q];
                    let theta = (aqq - app) / (2.0 * apq);
                    let t = if theta.abs() > 1e150 {
                        0.5 / theta
                    } else {
                        theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                    };
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;

                    for r in 0..n {
                        if r == p || r == q {
                            continue;
                        }
                        let arp = a[r * n + p];
                        let arq = a[r * n + q];
                        let new_rp = c * arp - s * arq;
                        let new_rq = s * arp + c * arq;
                        a[r * n + p] = new_rp;
                        a[p * n + r] = new_rp;
                        a[r * n + q] = new_rq;
                        a[q * n + r] = new_rq;
                    }
                    a[p * n + p] = app - t * apq;
                    a[q * n + q] = aqq + t * apq;
                    a[p * n + q] = 0.0;
                    a[q * n + p] = 0.0;
                }
            }
        }

        let mut eig: Vec<f64> = (0..n).map(|i| a[i * n + i]).collect();
        eig.sort_by(|x, y| x.total_cmp(y));
        eig
    }

    /// Ratio of largest to smallest eigenvalue.
    ///
    /// Returns `f64::INFINITY` when the smallest eigenvalue is not strictly
    /// positive.
    pub fn condition_number(&self) -> f64 {
        let eig = self.eigenvalues();
        condition_from_eigenvalues(&eig)
    }

    /// Lower-triangular Cholesky factor.
    ///
    /// # Errors
    ///
    /// [`LinalgError::NotPositiveDefinite`] if a pivot is not strictly
    /// positive.
    pub fn cholesky(&self) -> Result<CholeskyFactor, LinalgError> {
        let n = self.dim;
        let mut lower = vec![0.0; n * n];

        for i in 0..n {
            for j in 0..=i {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += lower[i * n + k] * lower[j * n + k];
                }
                if i == j {
                    let diag = self.get(i, i) - sum;
                    if !(diag > 0.0) {
                        return Err(LinalgError::NotPositiveDefinite { pivot: i });
                    }
                    lower[i * n + i] = diag.sqrt();
                } else {
                    lower[i * n + j] = (self.get(i, j) - sum) / lower[j * n + j];
                }
            }
        }

        if lower.iter().any(|x| !x.is_finite()) {
            return Err(LinalgError::NonFinite);
        }
        Ok(CholeskyFactor {
            data: lower,
            dim: n,
        })
    }
}

/// Condition number from ascending eigenvalues.
pub fn condition_from_eigenvalues(eigenvalues: &[f64]) -> f64 {
    match (eigenvalues.first(), eigenvalues.last()) {
        (Some(&min), Some(&max)) if min > 0.0 => max / min,
        _ => f64::INFINITY,
    }
}

impl From<SymmetricMatrix> for Vec<Vec<f64>> {
    fn from(m: SymmetricMatrix) -> Self {
        m.to_rows()
    }
}

impl TryFrom<Vec<Vec<f64>>> for SymmetricMatrix {
    type Error = LinalgError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

/// Lower-triangular Cholesky factor `L` with `A = L Lᵀ`.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    data: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at `(i, j)`; zero above the diagonal.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Writes `L z` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `z` or `out` has the wrong length.
    #[inline]
    pub fn transform_into(&self, z: &[f64], out: &mut [f64]) {
        assert_eq!(z.len(), self.dim, "input length must match dimension");
        assert_eq!(out.len(), self.dim, "output length must match dimension");
        let n = self.dim;
        for (i, o) in out.iter_mut().enumerate() {
            *o = dot(&self.data[i * n..i * n + i + 1], &z[..=i]);
        }
    }
}

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> SymmetricMatrix {
        SymmetricMatrix::from_rows(&[
            vec![0.04, 0.006, 0.002],
            vec![0.006, 0.09, -0.01],
            vec![0.002, -0.01, 0.0225],
        ])
        .unwrap()
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            SymmetricMatrix::new(vec![], 0).unwrap_err(),
            LinalgError::Empty
        );
        assert!(matches!(
            SymmetricMatrix::new(vec![1.0; 3], 2),
            Err(LinalgError::DimensionMismatch { .. })
        ));
        assert_eq!(
            SymmetricMatrix::from_rows(&[vec![1.0, 0.5], vec![0.4, 1.0]]).unwrap_err(),
            LinalgError::NotSymmetric { i: 0, j: 1 }
        );
        assert_eq!(
            SymmetricMatrix::from_rows(&[vec![f64::NAN]]).unwrap_err(),
            LinalgError::NonFinite
        );
    }

    #[test]
    fn test_cholesky_reconstructs() {
        let m = sample();
        let l = m.cholesky().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let v: f64 = (0..3).map(|k| l.get(i, k) * l.get(j, k)).sum();
                assert_relative_eq!(v, m.get(i, j), epsilon = 1e-14);
            }
        }
        assert_eq!(l.get(0, 2), 0.0);
    }

    #[test]
    fn test_cholesky_not_positive_definite() {
        let m = SymmetricMatrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert_eq!(
            m.cholesky().unwrap_err(),
            LinalgError::NotPositiveDefinite { pivot: 1 }
        );
    }

    #[test]
    fn test_transform() {
        let m = SymmetricMatrix::from_rows(&[vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let l = m.cholesky().unwrap();
        let mut w = [0.0; 2];
        l.transform_into(&[1.0, 1.0], &mut w);
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-15);
        assert_relative_eq!(w[1], 0.5 + 0.75_f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_eigenvalues_diagonal() {
        let m = SymmetricMatrix::diagonal(&[3.0, 1.0, 2.0]);
        assert_eq!(m.eigenvalues(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_eigenvalues_trace_and_determinant() {
        let m = sample();
        let eig = m.eigenvalues();
        let trace: f64 = m.diag().iter().sum();
        assert_relative_eq!(eig.iter().sum::<f64>(), trace, epsilon = 1e-14);

        // Every eigenvalue must annihilate det(A - λI)
        for &lambda in &eig {
            let shifted = m.diagonal_loaded(-lambda);
            let r = shifted.to_rows();
            let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
                - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
                + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);
            assert!(det.abs() < 1e-12, "det = {}", det);
        }
    }

    #[test]
    fn test_condition_number_singular() {
        let m = SymmetricMatrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert!(m.condition_number().is_infinite() || m.condition_number() > 1e14);
        assert_eq!(condition_from_eigenvalues(&[0.0, 2.0]), f64::INFINITY);
        assert_eq!(condition_from_eigenvalues(&[-1.0, 2.0]), f64::INFINITY);
    }

    #[test]
    fn test_quadratic_form_and_mul_vec() {
        let m = SymmetricMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let x = [1.0, 2.0];
        assert_relative_eq!(m.quadratic_form(&x), 2.0 + 4.0 + 12.0);
        assert_eq!(m.mul_vec(&x), vec![4.0, 7.0]);
    }

    #[test]
    fn test_serde_as_rows() {
        let m = SymmetricMatrix::from_rows(&[vec![1.0, 0.5], vec![0.5, 2.0]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[1.0,0.5],[0.5,2.0]]");
        let back: SymmetricMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<SymmetricMatrix>("[[1.0,0.5],[0.0,2.0]]").is_err());
    }
}
