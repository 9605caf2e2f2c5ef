use ndarray::{Array2, Array3, ArrayView3};

use crate::algorithms::mean::{arithmetic_mean, Convergence};
use crate::core::matfun::{congruence, invsqrtm, is_spd, powm, sqrtm};
use crate::core::{Error, Manifold, Result, SpdGeometry};

/// SPD(n) with the flat Frobenius metric inherited from R^{n×n}
pub struct Euclidean {
    dim: usize,
}

impl Euclidean {
    pub fn new(dim: usize) -> Self {
        Euclidean { dim }
    }
}

impl Manifold for Euclidean {
    type Point = Array2<f64>;
    type Vector = Array2<f64>;
    type Scalar = f64;

    /// Exponential map: simple addition in Euclidean space (unchecked)
    fn exp_unchecked(&self, p: &Self::Point, x: &Self::Vector) -> Result<Self::Point> {
        Ok(p + x)
    }

    /// Logarithmic map: simple subtraction in Euclidean space (unchecked)
    fn log_unchecked(&self, p: &Self::Point, q: &Self::Point) -> Result<Self::Vector> {
        Ok(q - p)
    }

    /// Frobenius inner product: g(X, Y) = tr(X^T Y)
    fn metric(&self, _p: &Self::Point, x: &Self::Vector, y: &Self::Vector) -> Self::Scalar {
        (x * y).sum()
    }

    /// Validate dimension and positive definiteness
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

impl SpdGeometry for Euclidean {
    fn name(&self) -> &'static str {
        "euclid"
    }

    /// Closed form: the arithmetic mean
    fn barycenter(&self, points: &[Array2<f64>], _convergence: &Convergence) -> Result<Array2<f64>> {
        arithmetic_mean(points)
    }

    /// Straight line I + t(P - I) for t <= 1, matrix power P^t beyond.
    ///
    /// The line leaves the SPD cone when extrapolating; P^t stays SPD for every t.
    fn stretch(&self, p: &Array2<f64>, t: f64) -> Result<Array2<f64>> {
        if t <= 1.0 {
            self.geodesic(&Array2::eye(p.nrows()), p, t)
        } else {
            powm(p, t)
        }
    }

    /// Congruence by M^{-1/2}; linear, so it maps the arithmetic mean to I exactly
    fn recenter(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
        congruence(&invsqrtm(center)?, x)
    }

    fn restore(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
        congruence(&sqrtm(center)?, x)
    }
}
