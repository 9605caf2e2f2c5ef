use ndarray::{Array2, Array3, ArrayView3};
use num_traits::Float;

use crate::algorithms::mean::{karcher_mean, Convergence};
use crate::core::error::Result;

/// Core trait for a Riemannian manifold
/// All manifolds are assumed to be smooth
pub trait Manifold {
    /// Point on the manifold
    type Point;

    /// Tangent vector at a point
    type Vector;

    /// Scalar field (f64 or f32)
    type Scalar: Float;

    /// Exponential map: TpM → M (unchecked, assumes valid input)
    ///
    /// Maps tangent vector x at point p to a point on the manifold.
    /// Only the numerical decomposition can fail here.
    fn exp_unchecked(&self, p: &Self::Point, x: &Self::Vector) -> Result<Self::Point>;

    /// Exponential map with validation
    fn exp(&self, p: &Self::Point, x: &Self::Vector) -> Result<Self::Point> {
        self.validate_point(p)?;
        self.validate_vector(p, x)?;
        self.exp_unchecked(p, x)
    }

    /// Logarithmic map: M → TpM (unchecked, assumes valid input)
    ///
    /// Inverse of exp: finds tangent vector from p to q.
    fn log_unchecked(&self, p: &Self::Point, q: &Self::Point) -> Result<Self::Vector>;

    /// Logarithmic map with validation
    fn log(&self, p: &Self::Point, q: &Self::Point) -> Result<Self::Vector> {
        self.validate_point(p)?;
        self.validate_point(q)?;
        self.log_unchecked(p, q)
    }

    /// Riemannian metric: g_p(x, y) for x, y ∈ TpM
    fn metric(&self, p: &Self::Point, x: &Self::Vector, y: &Self::Vector) -> Self::Scalar;

    /// Riemannian distance between two points
    fn distance(&self, p: &Self::Point, q: &Self::Point) -> Result<Self::Scalar> {
        let x = self.log(p, q)?;
        Ok(self.metric(p, &x, &x).sqrt())
    }

    /// Validate that a point lies on the manifold
    ///
    /// Default implementation is optimistic (always returns Ok).
    fn validate_point(&self, _p: &Self::Point) -> Result<()> {
        Ok(())
    }

    /// Validate that a vector is in the tangent space at p
    ///
    /// Default implementation is optimistic (always returns Ok).
    fn validate_vector(&self, _p: &Self::Point, _x: &Self::Vector) -> Result<()> {
        Ok(())
    }
}

/// A metric on SPD(n) with the operations needed to align domains:
/// barycenter, squared distance, re-centering to the identity and
/// geodesic stretching.
pub trait SpdGeometry: Manifold<Point = Array2<f64>, Vector = Array2<f64>, Scalar = f64> {
    /// Name accepted by [`crate::manifolds::Metric`]'s parser
    fn name(&self) -> &'static str;

    /// Squared geodesic distance d²(p, q)
    fn distance_squared(&self, p: &Array2<f64>, q: &Array2<f64>) -> Result<f64> {
        let x = self.log_unchecked(p, q)?;
        Ok(self.metric(p, &x, &x))
    }

    /// Point at parameter t on the geodesic from p through q
    ///
    /// t outside [0, 1] extrapolates.
    fn geodesic(&self, p: &Array2<f64>, q: &Array2<f64>, t: f64) -> Result<Array2<f64>> {
        let x = self.log_unchecked(p, q)?;
        self.exp_unchecked(p, &(x * t))
    }

    /// Barycenter of a set of points
    fn barycenter(&self, points: &[Array2<f64>], convergence: &Convergence) -> Result<Array2<f64>> {
        karcher_mean(self, points, convergence)
    }

    /// Stretch an identity-centered point by t along its geodesic from the identity
    fn stretch(&self, p: &Array2<f64>, t: f64) -> Result<Array2<f64>> {
        self.geodesic(&Array2::eye(p.nrows()), p, t)
    }

    /// Move every matrix of the stack by the transform that takes `center` to the identity
    fn recenter(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>>;

    /// Inverse of [`SpdGeometry::recenter`]
    fn restore(&self, center: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>>;
}
