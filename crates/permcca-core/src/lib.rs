//! # permcca-core
//!
//! Canonical Correlation Analysis between two row-aligned datasets, with the
//! significance of each canonical component assessed by permutation testing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use permcca_core::{CsvOptions, Dataset, PermutationConfig, evaluate};
//!
//! let opts = CsvOptions { has_headers: true, skip_columns: 8 };
//! let x = Dataset::from_csv_path("x.csv", &opts)?;
//! let y = Dataset::from_csv_path("y.csv", &opts)?;
//!
//! let report = evaluate(&x, &y, &PermutationConfig::default())?;
//! for component in &report.components {
//!     println!("{component}");
//! }
//! # Ok::<(), permcca_core::CcaError>(())
//! ```
//!
//! ## Pipeline
//!
//! Dataset (X, Y) → CCA fit → observed correlation per component →
//! m trials on Y shuffled with seed = trial index → empirical p-value.
//!
//! X is never permuted. The p-value is `(#{null >= observed} + 1) / (m + 1)`.

pub mod bartlett;
pub mod cca;
pub mod dataset;
pub mod error;
pub mod permutation;
pub mod report;
pub mod stats;

pub use bartlett::{BartlettTest, bartlett_tests};
pub use cca::{Cca, FittedCca};
pub use dataset::{CsvOptions, Dataset, row_permutation};
pub use error::{CcaError, Result, Side};
pub use permutation::{Evaluator, NullModel, PermutationConfig, ScoreMatrix, evaluate};
pub use report::{ComponentResult, PermutationReport};
pub use stats::{ScoreRange, empirical_p_value, pearson};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
