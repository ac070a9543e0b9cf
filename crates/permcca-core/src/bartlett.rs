//! Bartlett's chi-square approximation to Wilks' lambda.
//!
//! A parametric companion to the permutation test. For component i
//! (zero-based) over canonical correlations r:
//!
//! ```text
//! Λ_i  = Π_{j ≥ i} (1 − r_j²)
//! χ²_i = −(N − 1 − (P + Q + 1) / 2) · ln Λ_i
//! df_i = (P − i)(Q − i)
//! ```
//!
//! The p-value tests whether the i-th and all later correlations are zero.
//! It assumes multivariate normality, which the permutation test does not.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Bartlett test for one canonical component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BartlettTest {
    pub component_index: usize,
    pub wilks_lambda: f64,
    pub chi_squared: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
}

/// Run the test for the first `n_components` canonical correlations.
///
/// `correlations` must be the full descending set of min(P, Q) values from
/// the fit; truncating it would inflate every lambda.
pub fn bartlett_tests(
    correlations: &[f64],
    n_obs: usize,
    n_x_features: usize,
    n_y_features: usize,
    n_components: usize,
) -> Vec<BartlettTest> {
    let p = n_x_features as f64;
    let q = n_y_features as f64;
    let multiplier = n_obs as f64 - 1.0 - (p + q + 1.0) / 2.0;
    let limit = n_components
        .min(correlations.len())
        .min(n_x_features.min(n_y_features));

    (0..limit)
        .map(|i| {
            let wilks_lambda: f64 = correlations[i..]
                .iter()
                .map(|&r| 1.0 - r * r)
                .product::<f64>()
                .max(f64::MIN_POSITIVE);
            let chi_squared = (-multiplier * wilks_lambda.ln()).max(0.0);
            let degrees_of_freedom = (n_x_features - i) * (n_y_features - i);
            let p_value = ChiSquared::new(degrees_of_freedom as f64)
                .map(|dist| dist.sf(chi_squared))
                .unwrap_or(f64::NAN);
            BartlettTest {
                component_index: i,
                wilks_lambda,
                chi_squared,
                degrees_of_freedom,
                p_value,
            }
        })
        .collect()
}
