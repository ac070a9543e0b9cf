//! Canonical Correlation Analysis estimator.
//!
//! Classical CCA on standardized columns:
//!
//! 1. Standardize X and Y (column mean, sample std with ddof = 1).
//! 2. Covariances Cxx, Cyy, Cxy with divisor N−1.
//! 3. Whiten with Cholesky factors Lx, Ly and take the SVD of
//!    `M = Lx⁻¹ Cxy Ly⁻ᵀ`. Singular values are the canonical correlations.
//! 4. Weights `Wx = Lx⁻ᵀ U`, `Wy = Ly⁻ᵀ V`, truncated to `n_components`.
//!
//! Each side needs more rows than features (N > max(P, Q)); wider inputs
//! are rejected by [`Cca::validate`] before any fitting.
//!
//! [`Cca`] is plain configuration; every [`Cca::fit`] returns a fresh
//! [`FittedCca`] so no state carries over between fits.

use nalgebra::{DMatrix, DVector, SVD};

use crate::dataset::Dataset;
use crate::error::{CcaError, Result, Side};

/// Columns with a standard deviation below this are left unscaled.
const STD_EPSILON: f64 = 1e-12;
/// Smallest accepted Cholesky pivot. Standardized covariances have unit
/// diagonal, so this bounds the residual variance of each column at 1e-12.
const MIN_PIVOT: f64 = 1e-6;
const SVD_MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cca {
    n_components: usize,
}

impl Cca {
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Shape checks performed before any numerical work.
    pub fn validate(&self, x: &Dataset, y: &Dataset) -> Result<()> {
        if x.n_rows() != y.n_rows() {
            return Err(CcaError::RowCountMismatch {
                x_rows: x.n_rows(),
                y_rows: y.n_rows(),
            });
        }
        if self.n_components == 0 {
            return Err(CcaError::ZeroComponents);
        }
        let available = x.n_cols().min(y.n_cols());
        if self.n_components > available {
            return Err(CcaError::TooManyComponents {
                requested: self.n_components,
                available,
            });
        }
        // Cxx and Cyy are only positive definite with more rows than features.
        for (side, features) in [(Side::X, x.n_cols()), (Side::Y, y.n_cols())] {
            if x.n_rows() <= features {
                return Err(CcaError::TooFewRows {
                    side,
                    rows: x.n_rows(),
                    features,
                });
            }
        }
        Ok(())
    }

    pub fn fit(&self, x: &Dataset, y: &Dataset) -> Result<FittedCca> {
        self.validate(x, y)?;

        let n = x.n_rows();
        let (x_mean, x_std) = column_moments(x.matrix());
        let (y_mean, y_std) = column_moments(y.matrix());
        let xs = standardize(x.matrix(), &x_mean, &x_std);
        let ys = standardize(y.matrix(), &y_mean, &y_std);

        let denom = (n - 1) as f64;
        let cxx = xs.tr_mul(&xs) / denom;
        let cyy = ys.tr_mul(&ys) / denom;
        let cxy = xs.tr_mul(&ys) / denom;

        let lx = cholesky_lower(cxx, Side::X)?;
        let ly = cholesky_lower(cyy, Side::Y)?;

        // M = Lx⁻¹ Cxy Ly⁻ᵀ, built as (Ly⁻¹ (Lx⁻¹ Cxy)ᵀ)ᵀ.
        let a = lx
            .solve_lower_triangular(&cxy)
            .ok_or(CcaError::SingularCovariance { side: Side::X })?;
        let b = ly
            .solve_lower_triangular(&a.transpose())
            .ok_or(CcaError::SingularCovariance { side: Side::Y })?;
        let m = b.transpose();

        let svd = SVD::try_new(m, true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or(CcaError::Decomposition("SVD did not converge"))?;
        let u = svd
            .u
            .ok_or(CcaError::Decomposition("SVD returned no left vectors"))?;
        let v_t = svd
            .v_t
            .ok_or(CcaError::Decomposition("SVD returned no right vectors"))?;

        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&i, &j| svd.singular_values[j].total_cmp(&svd.singular_values[i]));
        let correlations: Vec<f64> = order
            .iter()
            .map(|&i| svd.singular_values[i].clamp(0.0, 1.0))
            .collect();

        let k = self.n_components;
        let u_k = DMatrix::from_fn(x.n_cols(), k, |row, c| u[(row, order[c])]);
        let v_k = DMatrix::from_fn(y.n_cols(), k, |row, c| v_t[(order[c], row)]);

        let mut x_weights = lx
            .transpose()
            .solve_upper_triangular(&u_k)
            .ok_or(CcaError::SingularCovariance { side: Side::X })?;
        let mut y_weights = ly
            .transpose()
            .solve_upper_triangular(&v_k)
            .ok_or(CcaError::SingularCovariance { side: Side::Y })?;
        orient_signs(&mut x_weights, &mut y_weights);

        log::debug!(
            "fitted CCA on {}x{} / {}x{}: leading correlation {:.4}",
            n,
            x.n_cols(),
            n,
            y.n_cols(),
            correlations.first().copied().unwrap_or(0.0)
        );

        Ok(FittedCca {
            x_mean,
            x_std,
            y_mean,
            y_std,
            x_weights,
            y_weights,
            correlations,
            n_obs: n,
        })
    }
}

/// Result of [`Cca::fit`]: everything needed to project new rows.
#[derive(Debug, Clone)]
pub struct FittedCca {
    x_mean: DVector<f64>,
    x_std: DVector<f64>,
    y_mean: DVector<f64>,
    y_std: DVector<f64>,
    x_weights: DMatrix<f64>,
    y_weights: DMatrix<f64>,
    correlations: Vec<f64>,
    n_obs: usize,
}

impl FittedCca {
    /// Project X and Y into the k-dimensional latent space.
    ///
    /// Uses the means and standard deviations from the fit; the inputs only
    /// need matching column counts.
    pub fn transform(&self, x: &Dataset, y: &Dataset) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        if x.n_rows() != y.n_rows() {
            return Err(CcaError::RowCountMismatch {
                x_rows: x.n_rows(),
                y_rows: y.n_rows(),
            });
        }
        Ok((self.transform_x(x)?, self.transform_y(y)?))
    }

    /// Project X alone (N×k).
    pub fn transform_x(&self, x: &Dataset) -> Result<DMatrix<f64>> {
        if x.n_cols() != self.x_mean.len() {
            return Err(CcaError::ColumnCountMismatch {
                side: Side::X,
                expected: self.x_mean.len(),
                found: x.n_cols(),
            });
        }
        Ok(standardize(x.matrix(), &self.x_mean, &self.x_std) * &self.x_weights)
    }

    /// Project Y alone (N×k).
    pub fn transform_y(&self, y: &Dataset) -> Result<DMatrix<f64>> {
        if y.n_cols() != self.y_mean.len() {
            return Err(CcaError::ColumnCountMismatch {
                side: Side::Y,
                expected: self.y_mean.len(),
                found: y.n_cols(),
            });
        }
        Ok(standardize(y.matrix(), &self.y_mean, &self.y_std) * &self.y_weights)
    }

    pub fn n_components(&self) -> usize {
        self.x_weights.ncols()
    }

    /// All min(P, Q) canonical correlations, descending.
    pub fn canonical_correlations(&self) -> &[f64] {
        &self.correlations
    }

    pub fn x_weights(&self) -> &DMatrix<f64> {
        &self.x_weights
    }

    pub fn y_weights(&self) -> &DMatrix<f64> {
        &self.y_weights
    }

    /// Number of rows the model was fitted on.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn n_x_features(&self) -> usize {
        self.x_mean.len()
    }

    pub fn n_y_features(&self) -> usize {
        self.y_mean.len()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn column_moments(m: &DMatrix<f64>) -> (DVector<f64>, DVector<f64>) {
    let n = m.nrows() as f64;
    let mut mean = DVector::zeros(m.ncols());
    let mut std = DVector::zeros(m.ncols());
    for (j, col) in m.column_iter().enumerate() {
        let mu = col.sum() / n;
        let var = col.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (n - 1.0);
        let sd = var.sqrt();
        mean[j] = mu;
        std[j] = if sd > STD_EPSILON { sd } else { 1.0 };
    }
    (mean, std)
}

fn standardize(m: &DMatrix<f64>, mean: &DVector<f64>, std: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| (m[(i, j)] - mean[j]) / std[j])
}

/// Lower Cholesky factor, rejecting (near-)singular covariance.
///
/// nalgebra accepts a zero pivot, so the diagonal is checked explicitly.
fn cholesky_lower(cov: DMatrix<f64>, side: Side) -> Result<DMatrix<f64>> {
    let l = cov
        .cholesky()
        .ok_or(CcaError::SingularCovariance { side })?
        .l();
    if l.diagonal().iter().any(|&d| d.is_nan() || d <= MIN_PIVOT) {
        return Err(CcaError::SingularCovariance { side });
    }
    Ok(l)
}

/// Flip each weight pair so the largest-magnitude X loading is positive.
/// Flipping both sides together leaves every canonical correlation unchanged.
fn orient_signs(x_weights: &mut DMatrix<f64>, y_weights: &mut DMatrix<f64>) {
    for c in 0..x_weights.ncols() {
        let pivot = x_weights
            .column(c)
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            x_weights.column_mut(c).neg_mut();
            y_weights.column_mut(c).neg_mut();
        }
    }
}
