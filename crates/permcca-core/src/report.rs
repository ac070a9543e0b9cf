//! Result records produced by the permutation evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bartlett::BartlettTest;
use crate::permutation::PermutationConfig;

/// Outcome for one canonical component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    /// Zero-based component index.
    pub component_index: usize,
    pub observed_correlation: f64,
    pub p_value: f64,
    /// Smallest permuted score over components `0..=component_index`.
    pub range_min: f64,
    /// Largest permuted score over components `0..=component_index`.
    pub range_max: f64,
    /// Null-distribution scores, indexed by trial (trial j used seed j).
    pub permutation_scores: Vec<f64>,
}

impl fmt::Display for ComponentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Component {}:", self.component_index + 1)?;
        writeln!(f, "Observed Correlation: {:.3}", self.observed_correlation)?;
        writeln!(
            f,
            "Permuted Correlation Range: {:.3} to {:.3}",
            self.range_min, self.range_max
        )?;
        write!(f, "P-value: {:.3}", self.p_value)
    }
}

/// Full evaluation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationReport {
    pub config: PermutationConfig,
    pub n_rows: usize,
    pub n_x_features: usize,
    pub n_y_features: usize,
    /// All min(P, Q) canonical correlations of the true-data fit, descending.
    pub canonical_correlations: Vec<f64>,
    pub components: Vec<ComponentResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bartlett: Option<Vec<BartlettTest>>,
}

impl PermutationReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Smallest p-value resolvable with this many permutations.
    pub fn min_p_value(&self) -> f64 {
        1.0 / (self.config.n_permutations + 1) as f64
    }
}

impl fmt::Display for PermutationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{c}")?;
        }
        Ok(())
    }
}
