use std::collections::BTreeMap;

use ndarray::Array3;
use tracing::debug;

use crate::algorithms::mean::Convergence;
use crate::core::error::{Error, Result};
use crate::estimators::{encode_domains, encode_target_domain, StretchEstimator, TARGET_DOMAIN};
use crate::manifolds::Metric;
use crate::transfer::input::{normalize_input, MatrixInput};
use crate::transfer::Transformer;

/// Configuration of a [`DomainRescaler`]
#[derive(Debug, Clone, PartialEq)]
pub struct RescaleConfig {
    /// Domain tag of every training sample
    pub domains: Vec<String>,
    /// Metric name, parsed when the estimator is built
    pub metric: String,
    /// Input was re-centered beforehand: dispersions are measured around the identity
    pub centered_data: bool,
    /// Dispersion every domain is rescaled to
    pub final_dispersion: f64,
    /// Convergence criteria for the iterative mean (uncentered data only)
    pub convergence: Convergence,
}

impl Default for RescaleConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            metric: Metric::default().to_string(),
            centered_data: true,
            final_dispersion: 1.0,
            convergence: Convergence::default(),
        }
    }
}

impl RescaleConfig {
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

    /// Measure dispersions around each domain's own mean instead of the identity
    pub fn uncentered(mut self) -> Self {
        self.centered_data = false;
        self
    }

    pub fn with_final_dispersion(mut self, final_dispersion: f64) -> Self {
        self.final_dispersion = final_dispersion;
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
pub struct RescaleState {
    /// Dispersion of each training domain
    pub dispersions: BTreeMap<String, f64>,
}

/// Rescales each domain of re-centered SPD matrices to unit dispersion
///
/// Mirrors [`crate::transfer::DomainRecenterer`]: training data is stretched
/// domain by domain, while `transform` treats its whole input as one unseen
/// domain, fits that domain's dispersion and then stretches with it.
/// The input is expected to be re-centered already; this is not checked.
#[derive(Debug, Clone)]
pub struct DomainRescaler {
    config: RescaleConfig,
    fitted: Option<RescaleState>,
    estimator: Option<StretchEstimator>,
}

impl DomainRescaler {
    pub fn new(config: RescaleConfig) -> Self {
        DomainRescaler {
            config,
            fitted: None,
            estimator: None,
        }
    }

    pub fn config(&self) -> &RescaleConfig {
        &self.config
    }

    pub fn state(&self) -> Result<&RescaleState> {
        self.fitted
            .as_ref()
            .ok_or(Error::NotFitted("DomainRescaler"))
    }

    /// Dispersion of each training domain
    pub fn dispersions(&self) -> Result<&BTreeMap<String, f64>> {
        self.state().map(|state| &state.dispersions)
    }

    /// Estimator of the last fit, fit_transform or transform call
    pub fn estimator(&self) -> Option<&StretchEstimator> {
        self.estimator.as_ref()
    }

    fn build_estimator(&self) -> Result<StretchEstimator> {
        Ok(
            StretchEstimator::new(TARGET_DOMAIN, &self.config.metric, self.config.centered_data)?
                .with_final_dispersion(self.config.final_dispersion)
                .with_convergence(self.config.convergence),
        )
    }
}

impl Transformer for DomainRescaler {
    fn fit<L: ToString>(&mut self, x: impl Into<MatrixInput>, y: &[L]) -> Result<&mut Self> {
        let x = normalize_input(x)?;
        let keys = encode_domains(&x, y, &self.config.domains)?;

        let mut estimator = self.build_estimator()?;
        estimator.fit(&x, &keys)?;

        self.fitted = Some(RescaleState {
            dispersions: estimator.dispersions()?.clone(),
        });
        self.estimator = Some(estimator);
        Ok(self)
    }

    fn transform(&mut self, x: impl Into<MatrixInput>) -> Result<Array3<f64>> {
        let x = normalize_input(x)?;
        let keys = encode_target_domain(&x)?;

        let mut estimator = self.build_estimator()?;
        estimator.fit(&x, &keys)?;
        let out = estimator.transform(&x)?;
        debug!(
            n_matrices = keys.len(),
            metric = %estimator.metric(),
            "rescaled input as unseen target domain"
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

        self.fitted = Some(RescaleState {
            dispersions: estimator.dispersions()?.clone(),
        });
        self.estimator = Some(estimator);
        Ok(out)
    }
}
