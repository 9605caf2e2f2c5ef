use ndarray::{Array2, Array3, ArrayView3};

use crate::core::matfun::{
    congruence, expm, invsqrtm, is_spd, logm, spd_map, sqrtm, sum_squared_log_eigenvalues,
    symmetrize,
};
use crate::core::{Error, Manifold, Result, SpdGeometry};

/// Manifold of Symmetric Positive Definite (SPD) matrices
/// with the affine-invariant Riemannian metric
///
/// SPD(n) = {P ∈ R^{n×n} : P = P^T, P ≻ 0}
///
/// The affine-invariant metric makes it invariant under congruence transformations:
/// if P is SPD, then so is A^T P A for any invertible A. Re-centering a domain
/// is exactly such a congruence, with A = M^{-1/2} for the domain mean M.
pub struct AffineInvariant {
    /// Dimension of the matrices (n x n)
    dim: usize,
}

impl AffineInvariant {
    pub fn new(dim: usize) -> Self {
        AffineInvariant { dim }
    }
}

impl Manifold for AffineInvariant {
    type Point = Array2<f64>;
    type Vector = Array2<f64>;
    type Scalar = f64;

    /// exp_P(X) = P^{1/2} exp(P^{-1/2} X P^{-1/2}) P^{1/2}
    fn exp_unchecked(&self, p: &Self::Point, x: &Self::Vector) -> Result<Self::Point> {
        let p_sqrt = sqrtm(p)?;
        let p_inv_sqrt = invsqrtm(p)?;

        let y = p_inv_sqrt.dot(&symmetrize(x)).dot(&p_inv_sqrt);
        let exp_y = expm(&y)?;

        Ok(symmetrize(&p_sqrt.dot(&exp_y).dot(&p_sqrt)))
    }

    /// log_P(Q) = P^{1/2} log(P^{-1/2} Q P^{-1/2}) P^{1/2}
    fn log_unchecked(&self, p: &Self::Point, q: &Self::Point) -> Result<Self::Vector> {
        let p_sqrt = sqrtm(p)?;
        let p_inv_sqrt = invsqrtm(p)?;

        let y = p_inv_sqrt.dot(q).dot(&p_inv_sqrt);
        let log_y = logm(&y)?;

        Ok(symmetrize(&p_sqrt.dot(&log_y).dot(&p_sqrt)))
    }

    /// Affine-invariant metric: g_P(X, Y) = tr(P^{-1} X P^{-1} Y)
    fn metric(&self, p: &Self::Point, x: &Self::Vector, y: &Self::Vector) -> Self::Scalar {
        let p_inv = match spd_map(p, |lambda| 1.0 / lambda) {
            Ok(inv) => inv,
            Err(_) => return f64::NAN,
        };

        p_inv.dot(x).dot(&p_inv).dot(y).diag().sum()
    }

    fn validate_point(&self, p: &Self::Point) -> Result<()> {
        if p.nrows() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                got: p.nrows(),
            });
        }
        if !is_spd(p, 1e-10) {
            return Err(Error::NotPositiveDefinite(
                "matrix is not symmetric positive definite".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_vector(&self, _p: &Self::Point, x: &Self::Vector) -> Result<()> {
        // Tangent space of SPD is the symmetric matrices
        for i in 0..x.nrows() {
            for j in i + 1..x.ncols() {
                if (x[[i, j]] - x[[j, i]]).abs() > 1e-10 {
                    return Err(Error::InvalidParameter(
                        "tangent vector must be symmetric".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl SpdGeometry for AffineInvariant {
    fn name(&self) -> &'static str {
        "riemann"
    }

    /// d²(P, Q) = Σ log²(λ_i), λ the eigenvalues of P^{-1/2} Q P^{-1/2}
    fn distance_squared(&self, p: &Array2<f64>, q: &Array2<f64>) -> Result<f64> {
        sum_squared_log_eigenvalues(p, q)
    }

    fn recenter(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
        congruence(&invsqrtm(center)?, x)
    }

    fn restore(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
        congruence(&sqrtm(center)?, x)
    }
}
