use std::collections::BTreeMap;

use ndarray::{Array2, Array3, ArrayView3, Axis};
use tracing::debug;

use crate::algorithms::mean::Convergence;
use crate::core::error::{Error, Result};
use crate::core::matfun::map_matrices;
use crate::core::SpdGeometry;
use crate::estimators::{
    domain_groups, n_channels, scatter, select_matrices, validate_matrices, DomainLabel,
};
use crate::manifolds::Metric;

/// Statistics of one fit
#[derive(Debug, Clone)]
struct StretchState {
    dispersions: BTreeMap<String, f64>,
    centers: BTreeMap<String, Array2<f64>>,
}

/// Rescales the matrices of each domain so that their dispersion around the
/// domain center equals `final_dispersion`
///
/// The dispersion of a domain is the mean squared geodesic distance of its
/// matrices to its center. With `centered_data` the center is taken to be the
/// identity; otherwise it is the domain barycenter, and matrices are moved to
/// the identity, stretched and moved back.
#[derive(Debug, Clone)]
pub struct StretchEstimator {
    target_domain: String,
    metric: Metric,
    centered_data: bool,
    final_dispersion: f64,
    convergence: Convergence,
    fitted: Option<StretchState>,
}

impl StretchEstimator {
    /// Fails with [`Error::UnknownMetric`] if `metric` does not name a metric
    pub fn new(target_domain: impl Into<String>, metric: &str, centered_data: bool) -> Result<Self> {
        Ok(StretchEstimator {
            target_domain: target_domain.into(),
            metric: metric.parse()?,
            centered_data,
            final_dispersion: 1.0,
            convergence: Convergence::default(),
            fitted: None,
        })
    }

    /// Dispersion every domain is stretched to (default 1)
    pub fn with_final_dispersion(mut self, final_dispersion: f64) -> Self {
        self.final_dispersion = final_dispersion;
        self
    }

    /// Set convergence criteria for the iterative mean
    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn target_domain(&self) -> &str {
        &self.target_domain
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Dispersion of each domain seen by the last fit
    pub fn dispersions(&self) -> Result<&BTreeMap<String, f64>> {
        self.state().map(|state| &state.dispersions)
    }

    /// Center of each domain seen by the last fit (the identity for centered data)
    pub fn centers(&self) -> Result<&BTreeMap<String, Array2<f64>>> {
        self.state().map(|state| &state.centers)
    }

    fn state(&self) -> Result<&StretchState> {
        self.fitted
            .as_ref()
            .ok_or(Error::NotFitted("StretchEstimator"))
    }

    /// Compute the center and dispersion of every domain in `keys`
    pub fn fit(&mut self, x: &Array3<f64>, keys: &[DomainLabel]) -> Result<&mut Self> {
        if !(self.final_dispersion.is_finite() && self.final_dispersion > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "final dispersion must be positive, got {}",
                self.final_dispersion
            )));
        }

        let groups = domain_groups(x, keys)?;
        let dim = n_channels(x)?;
        let geometry = self.metric.geometry(dim);
        validate_matrices(geometry.as_ref(), x)?;

        let mut state = StretchState {
            dispersions: BTreeMap::new(),
            centers: BTreeMap::new(),
        };
        for (domain, indices) in groups {
            let matrices = select_matrices(x, &indices);
            let center = if self.centered_data {
                Array2::eye(dim)
            } else {
                geometry.barycenter(&matrices, &self.convergence)?
            };

            let mut total = 0.0;
            for matrix in &matrices {
                total += geometry.distance_squared(matrix, &center)?;
            }
            let dispersion = total / matrices.len() as f64;

            debug!(
                domain = %domain,
                n_matrices = indices.len(),
                metric = %self.metric,
                dispersion,
                "fitted domain dispersion"
            );
            state.dispersions.insert(domain.clone(), dispersion);
            state.centers.insert(domain, center);
        }

        self.fitted = Some(state);
        Ok(self)
    }

    /// Stretch every matrix of `x` with the statistics of the target domain
    pub fn transform(&self, x: &Array3<f64>) -> Result<Array3<f64>> {
        let state = self.state()?;
        let dispersion = state
            .dispersions
            .get(&self.target_domain)
            .copied()
            .ok_or_else(|| Error::UnknownDomain(self.target_domain.clone()))?;
        let center = &state.centers[&self.target_domain];
        let geometry = self.metric.geometry(center.nrows());
        validate_matrices(geometry.as_ref(), x)?;
        self.stretch_block(geometry.as_ref(), center, dispersion, x.view())
    }

    /// Fit, then stretch every matrix with the statistics of its own domain
    pub fn fit_transform(&mut self, x: &Array3<f64>, keys: &[DomainLabel]) -> Result<Array3<f64>> {
        self.fit(x, keys)?;
        let state = self.state()?;
        let geometry = self.metric.geometry(n_channels(x)?);

        let mut out = Array3::zeros(x.raw_dim());
        for (domain, indices) in domain_groups(x, keys)? {
            let block = self.stretch_block(
                geometry.as_ref(),
                &state.centers[&domain],
                state.dispersions[&domain],
                x.select(Axis(0), &indices).view(),
            )?;
            scatter(&mut out, &indices, &block);
        }
        Ok(out)
    }

    /// Geodesic factor taking `dispersion` to `final_dispersion`
    fn stretch_factor(&self, dispersion: f64) -> Result<f64> {
        if !(dispersion.is_finite() && dispersion > 0.0) {
            return Err(Error::ComputationFailed(format!(
                "cannot stretch a domain with dispersion {}",
                dispersion
            )));
        }
        Ok((self.final_dispersion / dispersion).sqrt())
    }

    fn stretch_block(
        &self,
        geometry: &dyn SpdGeometry,
        center: &Array2<f64>,
        dispersion: f64,
        x: ArrayView3<f64>,
    ) -> Result<Array3<f64>> {
        let t = self.stretch_factor(dispersion)?;

        if self.centered_data {
            return map_matrices(x, |s| geometry.stretch(&s.to_owned(), t));
        }

        let centered = geometry.recenter(center, x)?;
        let stretched = map_matrices(centered.view(), |s| geometry.stretch(&s.to_owned(), t))?;
        geometry.restore(center, stretched.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::encode_domains;
    use approx::assert_relative_eq;
    use ndarray::arr3;

    fn centered_domains() -> (Array3<f64>, Vec<DomainLabel>) {
        let e = std::f64::consts::E;
        let x = arr3(&[
            [[e, 0.0], [0.0, 1.0 / e]],
            [[1.0 / e, 0.0], [0.0, e]],
            [[e * e, 0.0], [0.0, 1.0]],
            [[1.0 / (e * e), 0.0], [0.0, 1.0]],
        ]);
        let keys = encode_domains(&x, &[0, 1, 0, 1], &["a", "a", "b", "b"]).unwrap();
        (x, keys)
    }

    #[test]
    fn test_fit_dispersion_around_identity() {
        let (x, keys) = centered_domains();
        let mut estimator = StretchEstimator::new("a", "riemann", true).unwrap();
        estimator.fit(&x, &keys).unwrap();

        let dispersions = estimator.dispersions().unwrap();
        // a: log-eigenvalues (±1, ∓1) -> 2; b: (±2, 0) -> 4
        assert_relative_eq!(dispersions["a"], 2.0, epsilon = 1e-10);
        assert_relative_eq!(dispersions["b"], 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fit_transform_reaches_final_dispersion() {
        let (x, keys) = centered_domains();
        let mut estimator = StretchEstimator::new("a", "riemann", true)
            .unwrap()
            .with_final_dispersion(1.0);
        let out = estimator.fit_transform(&x, &keys).unwrap();

        let mut refit = StretchEstimator::new("a", "riemann", true).unwrap();
        refit.fit(&out, &keys).unwrap();
        for dispersion in refit.dispersions().unwrap().values() {
            assert_relative_eq!(*dispersion, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_transform_uses_target_dispersion() {
        let (x, keys) = centered_domains();
        let mut estimator = StretchEstimator::new("b", "riemann", true).unwrap();
        estimator.fit(&x, &keys).unwrap();

        let out = estimator.transform(&x).unwrap();
        // t = sqrt(1/4): e^2 -> e
        assert_relative_eq!(out[[2, 0, 0]], std::f64::consts::E, epsilon = 1e-10);
    }

    #[test]
    fn test_uncentered_data_stretches_around_domain_mean() {
        // domain mean 4I, matrices 2I and 8I
        let x = arr3(&[[[2.0, 0.0], [0.0, 2.0]], [[8.0, 0.0], [0.0, 8.0]]]);
        let keys = encode_domains(&x, &[0, 0], &["a", "a"]).unwrap();
        let mut estimator = StretchEstimator::new("a", "riemann", false).unwrap();
        let out = estimator.fit_transform(&x, &keys).unwrap();

        let center = &estimator.centers().unwrap()["a"];
        assert_relative_eq!(center[[0, 0]], 4.0, epsilon = 1e-8);

        // dispersion 2 ln²2 -> each matrix ends at distance 1 from 4I
        let geometry = Metric::Riemann.geometry(2);
        for matrix in out.outer_iter() {
            let d2 = geometry
                .distance_squared(&matrix.to_owned(), center)
                .unwrap();
            assert_relative_eq!(d2, 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_euclid_shrinking_reaches_unit_dispersion() {
        // Frobenius dispersion around I is 4, so t = 1/2 along the straight line
        let x = arr3(&[[[3.0, 0.0], [0.0, 1.0]], [[1.0, 0.0], [0.0, 3.0]]]);
        let keys = encode_domains(&x, &[0, 1], &["a", "a"]).unwrap();
        let mut estimator = StretchEstimator::new("a", "euclid", true).unwrap();
        let out = estimator.fit_transform(&x, &keys).unwrap();

        assert_relative_eq!(out[[0, 0, 0]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(out[[1, 1, 1]], 2.0, epsilon = 1e-12);

        let mut check = StretchEstimator::new("a", "euclid", true).unwrap();
        check.fit(&out, &keys).unwrap();
        assert_relative_eq!(check.dispersions().unwrap()["a"], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_euclid_expanding_uses_matrix_power() {
        // dispersion 1/4, t = 2: P^2 instead of the straight line
        let x = arr3(&[[[1.5, 0.0], [0.0, 1.0]], [[1.0, 0.0], [0.0, 1.5]]]);
        let keys = encode_domains(&x, &[0, 1], &["a", "a"]).unwrap();
        let mut estimator = StretchEstimator::new("a", "euclid", true).unwrap();
        let out = estimator.fit_transform(&x, &keys).unwrap();

        assert_relative_eq!(out[[0, 0, 0]], 2.25, epsilon = 1e-12);
        assert_relative_eq!(out[[0, 1, 1]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(out[[1, 1, 1]], 2.25, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_rejects_indefinite_matrix() {
        let x = arr3(&[[[2.0, 0.0], [0.0, 2.0]], [[1.0, 2.0], [2.0, 1.0]]]);
        let keys = encode_domains(&x, &[0, 0], &["a", "a"]).unwrap();
        let mut estimator = StretchEstimator::new("a", "euclid", true).unwrap();

        assert!(matches!(
            estimator.fit(&x, &keys),
            Err(Error::NotPositiveDefinite(_))
        ));
    }

    #[test]
    fn test_zero_dispersion_rejected() {
        let x = arr3(&[[[1.0, 0.0], [0.0, 1.0]], [[1.0, 0.0], [0.0, 1.0]]]);
        let keys = encode_domains(&x, &[0, 0], &["a", "a"]).unwrap();
        let mut estimator = StretchEstimator::new("a", "riemann", true).unwrap();

        assert!(matches!(
            estimator.fit_transform(&x, &keys),
            Err(Error::ComputationFailed(_))
        ));
    }

    #[test]
    fn test_invalid_final_dispersion() {
        let (x, keys) = centered_domains();
        let mut estimator = StretchEstimator::new("a", "riemann", true)
            .unwrap()
            .with_final_dispersion(0.0);

        assert!(matches!(
            estimator.fit(&x, &keys),
            Err(Error::InvalidParameter(_))
        ));
    }
}
