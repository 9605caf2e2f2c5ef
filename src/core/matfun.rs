use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use ndarray_linalg::{Cholesky, Eigh, UPLO};

use crate::core::error::{Error, Result};

/// Symmetric part `(A + Aᵀ) / 2`
pub fn symmetrize(a: &Array2<f64>) -> Array2<f64> {
    0.5 * (a + &a.t())
}

/// Rebuild `Q diag(λ) Qᵀ`
fn compose(eigenvalues: &Array1<f64>, eigenvectors: &Array2<f64>) -> Array2<f64> {
    let scaled = eigenvectors * &eigenvalues.view().insert_axis(Axis(0));
    symmetrize(&scaled.dot(&eigenvectors.t()))
}

/// Fails unless every eigenvalue is finite and positive
fn check_spectrum(eigenvalues: &Array1<f64>) -> Result<()> {
    if eigenvalues.iter().any(|lambda| !lambda.is_finite()) {
        return Err(Error::NotPositiveDefinite(
            "non-finite eigenvalue".to_string(),
        ));
    }
    let smallest = eigenvalues.iter().cloned().fold(f64::INFINITY, f64::min);
    if smallest <= 0.0 {
        return Err(Error::NotPositiveDefinite(format!(
            "smallest eigenvalue is {:.3e}",
            smallest
        )));
    }
    Ok(())
}

/// Eigendecomposition of an SPD matrix
fn spd_eigh(p: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let (eigenvalues, eigenvectors) = symmetrize(p).eigh(UPLO::Lower)?;
    check_spectrum(&eigenvalues)?;
    Ok((eigenvalues, eigenvectors))
}

/// Apply a scalar function to the spectrum of an SPD matrix
pub fn spd_map<F>(p: &Array2<f64>, f: F) -> Result<Array2<f64>>
where
    F: Fn(f64) -> f64,
{
    let (eigenvalues, eigenvectors) = spd_eigh(p)?;
    Ok(compose(&eigenvalues.mapv(f), &eigenvectors))
}

/// Principal square root `P^{1/2}`
pub fn sqrtm(p: &Array2<f64>) -> Result<Array2<f64>> {
    spd_map(p, f64::sqrt)
}

/// Inverse square root `P^{-1/2}`
pub fn invsqrtm(p: &Array2<f64>) -> Result<Array2<f64>> {
    spd_map(p, |lambda| 1.0 / lambda.sqrt())
}

/// Principal logarithm; the result is symmetric but not necessarily SPD
pub fn logm(p: &Array2<f64>) -> Result<Array2<f64>> {
    spd_map(p, f64::ln)
}

/// Real power `P^t`
pub fn powm(p: &Array2<f64>, t: f64) -> Result<Array2<f64>> {
    spd_map(p, |lambda| lambda.powf(t))
}

/// Exponential of a symmetric matrix, always SPD
pub fn expm(x: &Array2<f64>) -> Result<Array2<f64>> {
    let (eigenvalues, eigenvectors) = symmetrize(x).eigh(UPLO::Lower)?;
    Ok(compose(&eigenvalues.mapv(f64::exp), &eigenvectors))
}

/// Squared eigenvalue logs of `P^{-1/2} Q P^{-1/2}`, summed
///
/// This is the squared affine-invariant distance between P and Q.
pub fn sum_squared_log_eigenvalues(p: &Array2<f64>, q: &Array2<f64>) -> Result<f64> {
    let p_inv_sqrt = invsqrtm(p)?;
    let whitened = symmetrize(&p_inv_sqrt.dot(q).dot(&p_inv_sqrt));
    let (eigenvalues, _) = spd_eigh(&whitened)?;
    Ok(eigenvalues.iter().map(|lambda| lambda.ln().powi(2)).sum())
}

/// Apply `f` to every matrix of a (n_matrices, n, n) stack
pub fn map_matrices<F>(x: ArrayView3<f64>, mut f: F) -> Result<Array3<f64>>
where
    F: FnMut(ArrayView2<f64>) -> Result<Array2<f64>>,
{
    let mut out = Array3::zeros(x.raw_dim());
    for (mut dst, src) in out.outer_iter_mut().zip(x.outer_iter()) {
        dst.assign(&f(src)?);
    }
    Ok(out)
}

/// Congruence `W S Wᵀ` for every matrix of the stack (W symmetric)
pub fn congruence(w: &Array2<f64>, x: ArrayView3<f64>) -> Result<Array3<f64>> {
    map_matrices(x, |s| Ok(symmetrize(&w.dot(&s).dot(w))))
}

/// Check if a matrix is symmetric positive definite
///
/// `tolerance` bounds the asymmetry relative to the largest entry (at least 1).
pub fn is_spd(p: &Array2<f64>, tolerance: f64) -> bool {
    let n = p.nrows();
    if p.ncols() != n {
        return false;
    }

    let scale = p.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = tolerance * scale;

    for i in 0..n {
        for j in i + 1..n {
            if (p[[i, j]] - p[[j, i]]).abs() > tolerance {
                return false;
            }
        }
    }

    // Check positive definiteness via Cholesky
    p.cholesky(UPLO::Lower).is_ok()
}
