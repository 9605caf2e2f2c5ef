pub mod algorithms;
pub mod core;
pub mod estimators;
pub mod manifolds;
pub mod transfer;

// Flat re-exports for convenience
pub use crate::core::{Error, Manifold, Result, SpdGeometry};

// Re-export metric types
pub use manifolds::{AffineInvariant, Euclidean, LogEuclidean, Metric};

pub use algorithms::mean::Convergence;

pub use estimators::{encode_domains, CenterEstimator, DomainLabel, StretchEstimator};

pub use transfer::{
    normalize_input, DomainRecenterer, DomainRescaler, MatrixInput, ObjectTable, RecenterConfig,
    RescaleConfig, Transformer,
};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::algorithms::mean::Convergence;
    pub use crate::core::{Error, Result};
    pub use crate::manifolds::Metric;
    pub use crate::transfer::{
        normalize_input, DomainRecenterer, DomainRescaler, MatrixInput, ObjectTable,
        RecenterConfig, RescaleConfig, Transformer,
    };
}
