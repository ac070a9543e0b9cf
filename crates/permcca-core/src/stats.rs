//! Correlation and empirical p-value primitives.

use serde::{Deserialize, Serialize};

use crate::error::{CcaError, Result};

/// Variance floor below which a series is treated as constant.
const VARIANCE_EPSILON: f64 = 1e-24;

/// Pearson correlation coefficient between two equal-length series.
///
/// A constant series has no defined correlation; this returns
/// [`CcaError::DegenerateCorrelation`] instead of NaN.
pub fn pearson(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(CcaError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(CcaError::InsufficientRows {
            needed: 2,
            found: a.len(),
        });
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a <= VARIANCE_EPSILON || var_b <= VARIANCE_EPSILON {
        return Err(CcaError::DegenerateCorrelation);
    }
    Ok((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

/// One-sided empirical p-value with the +1 correction:
/// `(#{s >= observed} + 1) / (len + 1)`.
///
/// Never returns zero; the smallest possible value is `1 / (len + 1)`.
pub fn empirical_p_value(scores: &[f64], observed: f64) -> f64 {
    let exceed = scores.iter().filter(|&&s| s >= observed).count();
    (exceed + 1) as f64 / (scores.len() + 1) as f64
}

/// Running min/max over every score seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn extend(&mut self, scores: &[f64]) {
        for &s in scores {
            self.min = self.min.min(s);
            self.max = self.max.max(s);
        }
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::empty()
    }
}
