use std::collections::BTreeMap;

use ndarray::{Array2, Array3};
use tracing::debug;

use crate::algorithms::mean::Convergence;
use crate::core::error::{Error, Result};
use crate::estimators::{encode_domains, encode_target_domain, CenterEstimator, TARGET_DOMAIN};
use crate::manifolds::Metric;
use crate::transfer::input::{normalize_input, MatrixInput};
use crate::transfer::Transformer;

/// Configuration of a [`DomainRecenterer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecenterConfig {
    /// Domain tag of every training sample
    pub domains: Vec<String>,
    /// Metric name, parsed when the estimator is built
    pub metric: String,
    /// Convergence criteria for the iterative mean
    pub convergence: Convergence,
}

impl Default for RecenterConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            metric: Metric::default().to_string(),
            convergence: Convergence::default(),
        }
    }
}

impl RecenterConfig {
    /// `domains` holds one tag per training sample; any displayable identifier works
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            domains: domains.into_iter().map(|domain| domain.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Set the metric by name ("riemann", "logeuclid", "euclid")
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    /// Set convergence criteria
    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }
}

/// State derived by `fit` or `fit_transform`
#[derive(Debug, Clone)]
pub struct RecenterState {
    /// Mean of each training domain
    pub means: BTreeMap<String, Array2<f64>>,
}

/// Re-centers each domain of SPD matrices to the identity for transfer learning
///
/// Training data is re-centered domain by domain, using the domain tags of
/// the configuration. Test data is assumed to come entirely from one domain
/// that was not part of training: `transform` computes the mean of its own
/// input and re-centers with it, so nothing learned in `fit` is reused.
#[derive(Debug, Clone)]
pub struct DomainRecenterer {
    config: RecenterConfig,
    fitted: Option<RecenterState>,
    estimator: Option<CenterEstimator>,
}

impl DomainRecenterer {
    pub fn new(config: RecenterConfig) -> Self {
        DomainRecenterer {
            config,
            fitted: None,
            estimator: None,
        }
    }

    pub fn config(&self) -> &RecenterConfig {
        &self.config
    }

    pub fn state(&self) -> Result<&RecenterState> {
        self.fitted
            .as_ref()
            .ok_or(Error::NotFitted("DomainRecenterer"))
    }

    /// Mean of each training domain
    pub fn means(&self) -> Result<&BTreeMap<String, Array2<f64>>> {
        self.state().map(|state| &state.means)
    }

    /// Estimator of the last fit, fit_transform or transform call
    pub fn estimator(&self) -> Option<&CenterEstimator> {
        self.estimator.as_ref()
    }

    fn build_estimator(&self) -> Result<CenterEstimator> {
        Ok(CenterEstimator::new(TARGET_DOMAIN, &self.config.metric)?
            .with_convergence(self.config.convergence))
    }
}

impl Transformer for DomainRecenterer {
    fn fit<L: ToString>(&mut self, x: impl Into<MatrixInput>, y: &[L]) -> Result<&mut Self> {
        let x = normalize_input(x)?;
        let keys = encode_domains(&x, y, &self.config.domains)?;

        let mut estimator = self.build_estimator()?;
        estimator.fit(&x, &keys)?;

        self.fitted = Some(RecenterState {
            means: estimator.means()?.clone(),
        });
        self.estimator = Some(estimator);
        Ok(self)
    }

    fn transform(&mut self, x: impl Into<MatrixInput>) -> Result<Array3<f64>> {
        let x = normalize_input(x)?;
        let keys = encode_target_domain(&x)?;

        let mut estimator = self.build_estimator()?;
        let out = estimator.fit_transform(&x, &keys)?;
        debug!(
            n_matrices = keys.len(),
            metric = %estimator.metric(),
            "re-centered input as unseen target domain"
        );

        self.estimator = Some(estimator);
        Ok(out)
    }

    fn fit_transform<L: ToString>(
        &mut self,
        x: impl Into<MatrixInput>,
        y: &[L],
    ) -> Result<Array3<f64>> {
        let x = normalize_input(x)?;
        let keys = encode_domains(&x, y, &self.config.domains)?;

        let mut estimator = self.build_estimator()?;
        let out = estimator.fit_transform(&x, &keys)?;

        self.fitted = Some(RecenterState {
            means: estimator.means()?.clone(),
        });
        self.estimator = Some(estimator);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr3;

    fn training_set() -> Array3<f64> {
        arr3(&[
            [[2.0, 0.0], [0.0, 2.0]],
            [[8.0, 0.0], [0.0, 8.0]],
            [[1.0, 0.0], [0.0, 9.0]],
            [[1.0, 0.0], [0.0, 1.0]],
        ])
    }

    #[test]
    fn test_fit_stores_domain_means() {
        let config = RecenterConfig::new(["a", "a", "b", "b"]);
        let mut recenterer = DomainRecenterer::new(config);
        recenterer.fit(training_set(), &[0, 1, 0, 1]).unwrap();

        let means = recenterer.means().unwrap();
        assert_relative_eq!(means["a"][[0, 0]], 4.0, epsilon = 1e-8);
        assert_relative_eq!(means["b"][[1, 1]], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_integer_domain_tags() {
        let config = RecenterConfig::new([7, 7, 9, 9]);
        assert_eq!(config.domains, vec!["7", "7", "9", "9"]);

        let mut recenterer = DomainRecenterer::new(config);
        recenterer.fit(training_set(), &[0, 1, 0, 1]).unwrap();
        assert_relative_eq!(recenterer.means().unwrap()["7"][[0, 0]], 4.0, epsilon = 1e-8);
    }

    #[test]
    fn test_means_before_fit() {
        let recenterer = DomainRecenterer::new(RecenterConfig::default());
        assert!(matches!(recenterer.means(), Err(Error::NotFitted(_))));
    }

    #[test]
    fn test_transform_ignores_fitted_means() {
        let mut recenterer = DomainRecenterer::new(RecenterConfig::new(["a", "a", "b", "b"]));
        recenterer.fit(training_set(), &[0, 1, 0, 1]).unwrap();

        let test = arr3(&[[[3.0, 0.0], [0.0, 3.0]], [[12.0, 0.0], [0.0, 12.0]]]);
        let out = recenterer.transform(test).unwrap();

        // own mean 6I: 3I -> I/2, 12I -> 2I
        assert_relative_eq!(out[[0, 0, 0]], 0.5, epsilon = 1e-8);
        assert_relative_eq!(out[[1, 1, 1]], 2.0, epsilon = 1e-8);
        // training means are untouched
        assert_eq!(recenterer.means().unwrap().len(), 2);
        assert!(recenterer.estimator().unwrap().means().unwrap().contains_key(TARGET_DOMAIN));
    }

    #[test]
    fn test_unknown_metric_surfaces_at_fit() {
        let config = RecenterConfig::new(["a", "a"]).with_metric("manhattan");
        let mut recenterer = DomainRecenterer::new(config);
        let x = arr3(&[[[1.0, 0.0], [0.0, 1.0]], [[2.0, 0.0], [0.0, 2.0]]]);

        assert!(matches!(
            recenterer.fit(x, &[0, 1]),
            Err(Error::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_label_count_checked() {
        let mut recenterer = DomainRecenterer::new(RecenterConfig::new(["a", "a", "b", "b"]));
        assert!(matches!(
            recenterer.fit_transform(training_set(), &[0, 1, 0]),
            Err(Error::LengthMismatch { what: "labels", .. })
        ));
    }
}
