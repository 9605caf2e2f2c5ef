use std::collections::BTreeMap;

use ndarray::{Array2, Array3, Axis};
use tracing::debug;

use crate::algorithms::mean::Convergence;
use crate::core::error::{Error, Result};
use crate::estimators::{
    domain_groups, n_channels, scatter, select_matrices, validate_matrices, DomainLabel,
};
use crate::manifolds::Metric;

/// Re-centers the matrices of each domain so that the domain mean becomes the identity
///
/// `fit` computes one barycenter per domain. `fit_transform` moves every
/// matrix by the mean of its own domain, while `transform` moves all matrices
/// by the mean of the target domain.
#[derive(Debug, Clone)]
pub struct CenterEstimator {
    target_domain: String,
    metric: Metric,
    convergence: Convergence,
    means: Option<BTreeMap<String, Array2<f64>>>,
}

impl CenterEstimator {
    /// Fails with [`Error::UnknownMetric`] if `metric` does not name a metric
    pub fn new(target_domain: impl Into<String>, metric: &str) -> Result<Self> {
        Ok(CenterEstimator {
            target_domain: target_domain.into(),
            metric: metric.parse()?,
            convergence: Convergence::default(),
            means: None,
        })
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

    /// Mean of each domain seen by the last fit
    pub fn means(&self) -> Result<&BTreeMap<String, Array2<f64>>> {
        self.means
            .as_ref()
            .ok_or(Error::NotFitted("CenterEstimator"))
    }

    /// Compute the mean of every domain in `keys`
    pub fn fit(&mut self, x: &Array3<f64>, keys: &[DomainLabel]) -> Result<&mut Self> {
        let groups = domain_groups(x, keys)?;
        let geometry = self.metric.geometry(n_channels(x)?);
        validate_matrices(geometry.as_ref(), x)?;

        let mut means = BTreeMap::new();
        for (domain, indices) in groups {
            let mean = geometry.barycenter(&select_matrices(x, &indices), &self.convergence)?;
            debug!(
                domain = %domain,
                n_matrices = indices.len(),
                metric = %self.metric,
                "fitted domain mean"
            );
            means.insert(domain, mean);
        }

        self.means = Some(means);
        Ok(self)
    }

    /// Re-center every matrix of `x` with the mean of the target domain
    pub fn transform(&self, x: &Array3<f64>) -> Result<Array3<f64>> {
        let mean = self
            .means()?
            .get(&self.target_domain)
            .ok_or_else(|| Error::UnknownDomain(self.target_domain.clone()))?;
        let geometry = self.metric.geometry(mean.nrows());
        validate_matrices(geometry.as_ref(), x)?;
        geometry.recenter(mean, x.view())
    }

    /// Fit, then re-center every matrix with the mean of its own domain
    pub fn fit_transform(&mut self, x: &Array3<f64>, keys: &[DomainLabel]) -> Result<Array3<f64>> {
        self.fit(x, keys)?;
        let means = self.means()?;
        let geometry = self.metric.geometry(n_channels(x)?);

        let mut out = Array3::zeros(x.raw_dim());
        for (domain, indices) in domain_groups(x, keys)? {
            let mean = &means[&domain];
            let block = geometry.recenter(mean, x.select(Axis(0), &indices).view())?;
            scatter(&mut out, &indices, &block);
        }
        Ok(out)
    }
}
