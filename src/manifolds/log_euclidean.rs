use ndarray::{Array2, Array3, ArrayView3};

use crate::algorithms::mean::{arithmetic_mean, Convergence};
use crate::core::matfun::{expm, is_spd, logm, map_matrices};
use crate::core::{Error, Manifold, Result, SpdGeometry};

/// SPD(n) with the log-Euclidean metric
///
/// The matrix logarithm is a diffeomorphism from SPD(n) onto the symmetric
/// matrices, and this metric is the Frobenius metric pulled back through it:
/// d(P, Q) = ‖log P − log Q‖_F. Tangent vectors are represented in the
/// log domain, so exp_P(X) = exp(log P + X) and log_P(Q) = log Q − log P.
pub struct LogEuclidean {
    dim: usize,
}

impl LogEuclidean {
    pub fn new(dim: usize) -> Self {
        LogEuclidean { dim }
    }
}

impl Manifold for LogEuclidean {
    type Point = Array2<f64>;
    type Vector = Array2<f64>;
    type Scalar = f64;

    fn exp_unchecked(&self, p: &Self::Point, x: &Self::Vector) -> Result<Self::Point> {
        expm(&(logm(p)? + x))
    }

    fn log_unchecked(&self, p: &Self::Point, q: &Self::Point) -> Result<Self::Vector> {
        Ok(logm(q)? - logm(p)?)
    }

    fn metric(&self, _p: &Self::Point, x: &Self::Vector, y: &Self::Vector) -> Self::Scalar {
        (x * y).sum()
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
}

impl SpdGeometry for LogEuclidean {
    fn name(&self) -> &'static str {
        "logeuclid"
    }

    /// Closed form: exp of the arithmetic mean of the logarithms
    fn barycenter(&self, points: &[Array2<f64>], _convergence: &Convergence) -> Result<Array2<f64>> {
        let logs = points.iter().map(logm).collect::<Result<Vec<_>>>()?;
        expm(&arithmetic_mean(&logs)?)
    }

    /// exp(log S − log M): a translation in the log domain, so the
    /// log-Euclidean mean lands exactly on the identity
    fn recenter(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
        let log_center = logm(center)?;
        map_matrices(x, |s| expm(&(logm(&s.to_owned())? - &log_center)))
    }

    fn restore(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
        let log_center = logm(center)?;
        map_matrices(x, |s| expm(&(logm(&s.to_owned())? + &log_center)))
    }
}
