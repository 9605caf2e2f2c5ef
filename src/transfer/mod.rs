pub mod input;
pub mod recenter;
pub mod rescale;

use ndarray::Array3;

pub use input::{normalize_input, MatrixInput, ObjectTable};
pub use recenter::{DomainRecenterer, RecenterConfig, RecenterState};
pub use rescale::{DomainRescaler, RescaleConfig, RescaleState};

use crate::core::error::Result;

/// fit / transform / fit_transform lifecycle of a transformer stage
///
/// `y` holds one opaque label per matrix. `transform` takes `&mut self`
/// because it refits on its own input. The two stages are chained,
/// re-centering first:
///
/// ```no_run
/// use spd_transfer::prelude::*;
/// use ndarray::Array3;
///
/// # fn run(x_train: Array3<f64>, y_train: Vec<u8>, x_test: Array3<f64>) -> Result<()> {
/// let domains = ["s1", "s1", "s2", "s2"];
/// let mut recenter = DomainRecenterer::new(RecenterConfig::new(domains));
/// let mut rescale = DomainRescaler::new(RescaleConfig::new(domains));
///
/// let train = recenter.fit_transform(x_train, &y_train)?;
/// let train = rescale.fit_transform(train, &y_train)?;
///
/// // the test set is treated as one unseen domain
/// let test = recenter.transform(x_test)?;
/// let test = rescale.transform(test)?;
/// # Ok(())
/// # }
/// ```
pub trait Transformer {
    /// Learn statistics from training data without transforming it
    fn fit<L: ToString>(&mut self, x: impl Into<MatrixInput>, y: &[L]) -> Result<&mut Self>;

    /// Transform data from one unseen domain
    fn transform(&mut self, x: impl Into<MatrixInput>) -> Result<Array3<f64>>;

    /// Learn statistics and transform training data in one pass
    fn fit_transform<L: ToString>(
        &mut self,
        x: impl Into<MatrixInput>,
        y: &[L],
    ) -> Result<Array3<f64>>;
}
