pub mod center;
pub mod encoding;
pub mod stretch;

use std::collections::BTreeMap;

use ndarray::{Array2, Array3, Axis};

pub use center::CenterEstimator;
pub use encoding::{
    decode_domains, encode_domains, encode_target_domain, group_by_domain, DomainLabel,
    PLACEHOLDER_LABEL, TARGET_DOMAIN,
};
pub use stretch::StretchEstimator;

use crate::core::error::{Error, Result};
use crate::core::SpdGeometry;

/// Fewest matrices for which a domain mean and dispersion are defined
pub const MIN_DOMAIN_SIZE: usize = 2;

/// Number of channels of a (n_matrices, n_channels, n_channels) stack
pub(crate) fn n_channels(x: &Array3<f64>) -> Result<usize> {
    let (_, rows, cols) = x.dim();
    if rows != cols {
        return Err(Error::DimensionMismatch {
            expected: rows,
            got: cols,
        });
    }
    Ok(rows)
}

/// Group samples by domain, checking key count and domain sizes
pub(crate) fn domain_groups(
    x: &Array3<f64>,
    keys: &[DomainLabel],
) -> Result<BTreeMap<String, Vec<usize>>> {
    let n_matrices = x.len_of(Axis(0));
    if keys.len() != n_matrices {
        return Err(Error::LengthMismatch {
            what: "domain labels",
            expected: n_matrices,
            got: keys.len(),
        });
    }

    let groups = group_by_domain(keys);
    for (domain, indices) in &groups {
        if indices.len() < MIN_DOMAIN_SIZE {
            return Err(Error::TooFewSamples {
                domain: domain.clone(),
                min: MIN_DOMAIN_SIZE,
                got: indices.len(),
            });
        }
    }
    Ok(groups)
}

/// Owned copies of the selected matrices
pub(crate) fn select_matrices(x: &Array3<f64>, indices: &[usize]) -> Vec<Array2<f64>> {
    indices
        .iter()
        .map(|&i| x.index_axis(Axis(0), i).to_owned())
        .collect()
}

/// Write the k-th matrix of `block` to position `indices[k]` of `out`
pub(crate) fn scatter(out: &mut Array3<f64>, indices: &[usize], block: &Array3<f64>) {
    for (&i, matrix) in indices.iter().zip(block.outer_iter()) {
        out.index_axis_mut(Axis(0), i).assign(&matrix);
    }
}

/// Check every matrix of the stack is a point of `geometry`
///
/// The geometry carries the expected channel count, so this also rejects data
/// whose size differs from the fitted statistics.
pub(crate) fn validate_matrices(geometry: &dyn SpdGeometry, x: &Array3<f64>) -> Result<()> {
    n_channels(x)?;
    for matrix in x.outer_iter() {
        geometry.validate_point(&matrix.to_owned())?;
    }
    Ok(())
}
