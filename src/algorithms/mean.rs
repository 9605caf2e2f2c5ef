use ndarray::Array2;
use tracing::{debug, trace, warn};

use crate::core::error::{Error, Result};
use crate::core::traits::SpdGeometry;

/// Convergence criteria for the iterative barycenter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Tolerance on the norm of the mean tangent vector, and floor on the step size
    pub tol: f64,
}

impl Default for Convergence {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tol: 1e-8,
        }
    }
}

/// Arithmetic mean of a non-empty set of matrices
pub fn arithmetic_mean(points: &[Array2<f64>]) -> Result<Array2<f64>> {
    let first = points
        .first()
        .ok_or_else(|| Error::InvalidParameter("cannot average an empty set".to_string()))?;

    let sum = points
        .iter()
        .skip(1)
        .fold(first.clone(), |acc, p| acc + p);

    Ok(sum / points.len() as f64)
}

/// Karcher (Fréchet) mean by Riemannian gradient descent
///
/// Starts from the arithmetic mean. Each iteration averages the log maps of
/// all points at the current estimate and moves along that tangent vector:
///
/// ```text
/// J_k     = (1/N) Σ log_{M_k}(P_i)
/// M_{k+1} = exp_{M_k}(ν_k J_k)
/// ```
///
/// The step ν starts at 1, shrinks by 0.95 while ν‖J‖ keeps decreasing and
/// halves otherwise. Iteration stops when ‖J‖ or ν falls below `tol`.
pub fn karcher_mean<G>(
    geometry: &G,
    points: &[Array2<f64>],
    convergence: &Convergence,
) -> Result<Array2<f64>>
where
    G: SpdGeometry + ?Sized,
{
    let mut mean = arithmetic_mean(points)?;
    let n = points.len() as f64;

    let mut step = 1.0;
    let mut best = f64::INFINITY;
    let mut criterion = f64::INFINITY;

    for iter in 0..convergence.max_iterations {
        let mut tangent = Array2::<f64>::zeros(mean.raw_dim());
        for p in points {
            tangent += &geometry.log_unchecked(&mean, p)?;
        }
        tangent /= n;

        criterion = geometry.metric(&mean, &tangent, &tangent).sqrt();
        if !criterion.is_finite() {
            return Err(Error::ComputationFailed(format!(
                "non-finite gradient norm at iteration {}",
                iter
            )));
        }

        mean = geometry.exp_unchecked(&mean, &(tangent * step))?;
        trace!(iteration = iter, criterion, step, "karcher step");

        let h = step * criterion;
        if h < best {
            step *= 0.95;
            best = h;
        } else {
            step *= 0.5;
        }

        if criterion <= convergence.tol || step <= convergence.tol {
            debug!(
                metric = geometry.name(),
                iterations = iter + 1,
                criterion,
                "barycenter converged"
            );
            return Ok(mean);
        }
    }

    warn!(
        metric = geometry.name(),
        iterations = convergence.max_iterations,
        criterion,
        "barycenter did not converge"
    );
    Err(Error::NotConverged {
        iterations: convergence.max_iterations,
        criterion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Manifold;
    use crate::manifolds::{AffineInvariant, Euclidean, LogEuclidean};
    use approx::assert_relative_eq;
    use ndarray::arr2;

    fn sample() -> Vec<Array2<f64>> {
        vec![
            arr2(&[[2.0, 0.3], [0.3, 1.0]]),
            arr2(&[[1.0, -0.2], [-0.2, 3.0]]),
            arr2(&[[4.0, 0.5], [0.5, 2.0]]),
        ]
    }

    #[test]
    fn test_arithmetic_mean() {
        let mean = arithmetic_mean(&sample()).unwrap();
        assert_relative_eq!(mean[[0, 0]], 7.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(mean[[0, 1]], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            arithmetic_mean(&[]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_riemannian_mean_zeroes_gradient() {
        let geometry = AffineInvariant::new(2);
        let points = sample();
        let mean = karcher_mean(&geometry, &points, &Convergence::default()).unwrap();

        let mut tangent = Array2::<f64>::zeros((2, 2));
        for p in &points {
            tangent += &geometry.log_unchecked(&mean, p).unwrap();
        }
        assert!(geometry.metric(&mean, &tangent, &tangent).sqrt() < 1e-6);
    }

    #[test]
    fn test_riemannian_mean_of_commuting_matrices_is_geometric() {
        // diagonal matrices commute: the mean is the elementwise geometric mean
        let geometry = AffineInvariant::new(2);
        let points = vec![
            arr2(&[[1.0, 0.0], [0.0, 4.0]]),
            arr2(&[[4.0, 0.0], [0.0, 1.0]]),
        ];
        let mean = karcher_mean(&geometry, &points, &Convergence::default()).unwrap();
        assert_relative_eq!(mean[[0, 0]], 2.0, epsilon = 1e-8);
        assert_relative_eq!(mean[[1, 1]], 2.0, epsilon = 1e-8);
        assert_relative_eq!(mean[[0, 1]], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_karcher_on_flat_geometries_matches_closed_form() {
        let points = sample();
        let convergence = Convergence::default();

        let euclid = Euclidean::new(2);
        let iterated = karcher_mean(&euclid, &points, &convergence).unwrap();
        let closed = euclid.barycenter(&points, &convergence).unwrap();
        for (a, b) in iterated.iter().zip(closed.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }

        let log_euclid = LogEuclidean::new(2);
        let iterated = karcher_mean(&log_euclid, &points, &convergence).unwrap();
        let closed = log_euclid.barycenter(&points, &convergence).unwrap();
        for (a, b) in iterated.iter().zip(closed.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let geometry = AffineInvariant::new(2);
        let convergence = Convergence {
            max_iterations: 1,
            tol: 1e-15,
        };
        let result = karcher_mean(&geometry, &sample(), &convergence);
        assert!(matches!(
            result,
            Err(Error::NotConverged { iterations: 1, .. })
        ));
    }
}
