pub mod euclidean;
pub mod log_euclidean;
pub mod spd;

use std::fmt;
use std::str::FromStr;

pub use euclidean::Euclidean;
pub use log_euclidean::LogEuclidean;
pub use spd::AffineInvariant;

use crate::core::{Error, SpdGeometry};

/// Metric used for means, distances and transforms on SPD(n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// Affine-invariant Riemannian metric
    #[default]
    Riemann,
    /// Log-Euclidean metric
    LogEuclid,
    /// Frobenius metric of the ambient matrix space
    Euclid,
}

impl Metric {
    /// Geometry of n×n SPD matrices under this metric
    pub fn geometry(self, dim: usize) -> Box<dyn SpdGeometry> {
        match self {
            Metric::Riemann => Box::new(AffineInvariant::new(dim)),
            Metric::LogEuclid => Box::new(LogEuclidean::new(dim)),
            Metric::Euclid => Box::new(Euclidean::new(dim)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Riemann => "riemann",
            Metric::LogEuclid => "logeuclid",
            Metric::Euclid => "euclid",
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "riemann" | "affine" => Ok(Metric::Riemann),
            "logeuclid" | "log-euclidean" => Ok(Metric::LogEuclid),
            "euclid" | "euclidean" => Ok(Metric::Euclid),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
