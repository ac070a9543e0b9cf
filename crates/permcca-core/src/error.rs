//! Error type shared by every fallible operation in the crate.

use std::fmt;

/// Which side of the analysis a matrix belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    X,
    Y,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CcaError {
    // -- shape ---------------------------------------------------------------
    #[error("row count mismatch: X has {x_rows} rows, Y has {y_rows}")]
    RowCountMismatch { x_rows: usize, y_rows: usize },

    #[error("{side} has {found} columns, model was fitted on {expected}")]
    ColumnCountMismatch {
        side: Side,
        expected: usize,
        found: usize,
    },

    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("dataset has no {0}")]
    EmptyDataset(&'static str),

    #[error("{found} column names given for {expected} columns")]
    ColumnNameCount { expected: usize, found: usize },

    #[error("n_components must be at least 1")]
    ZeroComponents,

    #[error(
        "requested {requested} components but only {available} are available (min of X and Y feature counts)"
    )]
    TooManyComponents { requested: usize, available: usize },

    #[error(
        "{side} has {features} features but only {rows} rows; CCA needs more rows than features on each side"
    )]
    TooFewRows {
        side: Side,
        rows: usize,
        features: usize,
    },

    #[error("need at least {needed} rows, got {found}")]
    InsufficientRows { needed: usize, found: usize },

    #[error("n_permutations must be at least 1")]
    ZeroPermutations,

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    // -- numerical -----------------------------------------------------------
    #[error("covariance of {side} is singular or not positive definite")]
    SingularCovariance { side: Side },

    #[error("decomposition failed: {0}")]
    Decomposition(&'static str),

    #[error("correlation undefined: zero-variance projection")]
    DegenerateCorrelation,

    // -- input ---------------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}, column {column}: cannot parse {value:?} as a number")]
    Parse {
        row: usize,
        column: usize,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, CcaError>;
