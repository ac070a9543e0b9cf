//! Permutation-tested CCA evaluation.
//!
//! For every requested component the evaluator takes the observed canonical
//! correlation from the fit on the true data, then builds a null
//! distribution from `n_permutations` trials on row-shuffled copies of Y.
//! Trial `j` always shuffles with seed `j`, so a run is reproducible
//! bit-for-bit and every component sees the same set of permutations.
//! X is never permuted.
//!
//! The empirical p-value is `(#{score >= observed} + 1) / (m + 1)` and is
//! therefore never below `1 / (m + 1)`.

use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::bartlett::bartlett_tests;
use crate::cca::{Cca, FittedCca};
use crate::dataset::Dataset;
use crate::error::{CcaError, Result};
use crate::report::{ComponentResult, PermutationReport};
use crate::stats::{ScoreRange, empirical_p_value, pearson};

/// How each permutation trial scores the shuffled data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullModel {
    /// Refit CCA on (X, shuffled Y) and score that fit's i-th component.
    /// The null then accounts for CCA maximising correlation on any data.
    #[default]
    Refit,
    /// Keep the true-data fit and only re-project the shuffled Y.
    /// Cheaper, but the null ignores the optimisation step, so leading
    /// components look significant even on independent noise.
    Transform,
}

impl NullModel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "refit" => Some(Self::Refit),
            "transform" => Some(Self::Transform),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refit => "refit",
            Self::Transform => "transform",
        }
    }
}

impl fmt::Display for NullModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationConfig {
    pub n_components: usize,
    pub n_permutations: usize,
    pub null_model: NullModel,
    /// Attach Bartlett chi-square tests to the report.
    pub include_bartlett: bool,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            n_components: 3,
            n_permutations: 1000,
            null_model: NullModel::Refit,
            include_bartlett: false,
        }
    }
}

/// Component × trial score grid. Sized once; each cell written once.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    n_permutations: usize,
    cells: Vec<f64>,
}

impl ScoreMatrix {
    pub fn new(n_components: usize, n_permutations: usize) -> Self {
        Self {
            n_permutations,
            cells: vec![0.0; n_components * n_permutations],
        }
    }

    pub fn n_components(&self) -> usize {
        self.cells.len().checked_div(self.n_permutations).unwrap_or(0)
    }

    pub fn n_permutations(&self) -> usize {
        self.n_permutations
    }

    pub fn set(&mut self, component: usize, trial: usize, score: f64) {
        self.cells[component * self.n_permutations + trial] = score;
    }

    pub fn get(&self, component: usize, trial: usize) -> f64 {
        self.cells[component * self.n_permutations + trial]
    }

    pub fn row(&self, component: usize) -> &[f64] {
        let start = component * self.n_permutations;
        &self.cells[start..start + self.n_permutations]
    }
}

/// Explicit evaluator: owns the estimator configuration for one run.
#[derive(Debug, Clone)]
pub struct Evaluator {
    cca: Cca,
    config: PermutationConfig,
}

impl Evaluator {
    pub fn new(config: PermutationConfig) -> Self {
        Self {
            cca: Cca::new(config.n_components),
            config,
        }
    }

    pub fn config(&self) -> &PermutationConfig {
        &self.config
    }

    /// Check parameters and shapes. Runs before any fitting.
    pub fn validate(&self, x: &Dataset, y: &Dataset) -> Result<()> {
        if self.config.n_permutations == 0 {
            return Err(CcaError::ZeroPermutations);
        }
        self.cca.validate(x, y)
    }

    pub fn run(&self, x: &Dataset, y: &Dataset) -> Result<PermutationReport> {
        self.run_with(x, y, |_| {})
    }

    /// Like [`Evaluator::run`], but hands each [`ComponentResult`] to
    /// `on_component` as soon as its permutations finish.
    pub fn run_with<F>(
        &self,
        x: &Dataset,
        y: &Dataset,
        mut on_component: F,
    ) -> Result<PermutationReport>
    where
        F: FnMut(&ComponentResult),
    {
        self.validate(x, y)?;
        let k = self.config.n_components;
        let m = self.config.n_permutations;

        // One fit serves every component: the fit is deterministic and
        // already yields all k components.
        let fitted = self.cca.fit(x, y)?;
        let (x_latent, y_latent) = fitted.transform(x, y)?;
        log::info!(
            "CCA fitted on {} rows ({} x {} features), {} component(s), {} permutation(s), null model {}",
            x.n_rows(),
            x.n_cols(),
            y.n_cols(),
            k,
            m,
            self.config.null_model
        );

        let mut scores = ScoreMatrix::new(k, m);
        let mut range = ScoreRange::empty();
        let mut components = Vec::with_capacity(k);

        for i in 0..k {
            let observed = pearson(&column(&x_latent, i), &column(&y_latent, i))?;

            for trial in 0..m {
                let y_shuffled = y.shuffled_rows(trial as u64);
                let score = self.permuted_score(&fitted, &x_latent, x, &y_shuffled, i)?;
                log::trace!("component {} trial {}: {:.6}", i + 1, trial, score);
                scores.set(i, trial, score);
            }

            let row = scores.row(i);
            let p_value = empirical_p_value(row, observed);
            range.extend(row);

            let result = ComponentResult {
                component_index: i,
                observed_correlation: observed,
                p_value,
                range_min: range.min,
                range_max: range.max,
                permutation_scores: row.to_vec(),
            };
            log::debug!(
                "component {}: r = {:.4}, p = {:.4}, null range [{:.4}, {:.4}]",
                i + 1,
                observed,
                p_value,
                range.min,
                range.max
            );
            on_component(&result);
            components.push(result);
        }

        let bartlett = self.config.include_bartlett.then(|| {
            bartlett_tests(
                fitted.canonical_correlations(),
                fitted.n_obs(),
                fitted.n_x_features(),
                fitted.n_y_features(),
                k,
            )
        });

        Ok(PermutationReport {
            config: self.config,
            n_rows: x.n_rows(),
            n_x_features: x.n_cols(),
            n_y_features: y.n_cols(),
            canonical_correlations: fitted.canonical_correlations().to_vec(),
            components,
            bartlett,
        })
    }

    fn permuted_score(
        &self,
        fitted: &FittedCca,
        x_latent: &DMatrix<f64>,
        x: &Dataset,
        y_shuffled: &Dataset,
        component: usize,
    ) -> Result<f64> {
        match self.config.null_model {
            NullModel::Transform => {
                // X is untouched, so its projection is reused.
                let y_perm = fitted.transform_y(y_shuffled)?;
                pearson(&column(x_latent, component), &column(&y_perm, component))
            }
            NullModel::Refit => {
                let refit = self.cca.fit(x, y_shuffled)?;
                let (x_perm, y_perm) = refit.transform(x, y_shuffled)?;
                pearson(&column(&x_perm, component), &column(&y_perm, component))
            }
        }
    }
}

/// Evaluate with a freshly constructed [`Evaluator`].
pub fn evaluate(x: &Dataset, y: &Dataset, config: &PermutationConfig) -> Result<PermutationReport> {
    Evaluator::new(*config).run(x, y)
}

fn column(m: &DMatrix<f64>, c: usize) -> Vec<f64> {
    m.column(c).iter().copied().collect()
}
