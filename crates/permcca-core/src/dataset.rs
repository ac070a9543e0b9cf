//! Row-aligned numeric tables fed to the CCA evaluator.
//!
//! A [`Dataset`] is a dense N×P matrix of `f64` with optional column names.
//! Datasets are read-only once built; the only derived copy the evaluator
//! ever makes is a row-shuffled one via [`Dataset::shuffled_rows`].

use std::io::Read;
use std::path::Path;

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::{CcaError, Result};

/// Options for reading a dataset from CSV.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// First record holds column names.
    pub has_headers: bool,
    /// Number of leading columns to drop (identifiers, metadata).
    pub skip_columns: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            skip_columns: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    matrix: DMatrix<f64>,
    column_names: Option<Vec<String>>,
}

impl Dataset {
    /// Wrap an existing matrix. Rejects matrices with no rows or no columns.
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        if matrix.nrows() == 0 {
            return Err(CcaError::EmptyDataset("rows"));
        }
        if matrix.ncols() == 0 {
            return Err(CcaError::EmptyDataset("columns"));
        }
        Ok(Self {
            matrix,
            column_names: None,
        })
    }

    /// Build from row vectors. Every row must have the length of the first.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_rows = rows.len();
        if n_rows == 0 {
            return Err(CcaError::EmptyDataset("rows"));
        }
        let n_cols = rows[0].len();
        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(CcaError::RaggedRows {
                    row: i,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Self::new(DMatrix::from_row_slice(n_rows, n_cols, &flat))
    }

    pub fn with_column_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.n_cols() {
            return Err(CcaError::ColumnNameCount {
                expected: self.n_cols(),
                found: names.len(),
            });
        }
        self.column_names = Some(names);
        Ok(self)
    }

    pub fn from_csv_path(path: impl AsRef<Path>, opts: &CsvOptions) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, opts)
    }

    /// Parse CSV from any reader. Row indices in errors count data records
    /// from zero, excluding the header.
    pub fn from_csv_reader<R: Read>(reader: R, opts: &CsvOptions) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(opts.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let names: Option<Vec<String>> = if opts.has_headers {
            Some(
                rdr.headers()?
                    .iter()
                    .skip(opts.skip_columns)
                    .map(str::to_string)
                    .collect(),
            )
        } else {
            None
        };

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let mut values = Vec::with_capacity(record.len().saturating_sub(opts.skip_columns));
            for (column, field) in record.iter().enumerate().skip(opts.skip_columns) {
                let v: f64 = field.parse().map_err(|_| CcaError::Parse {
                    row,
                    column,
                    value: field.to_string(),
                })?;
                values.push(v);
            }
            if let Some(expected) = rows.first().map(Vec::len) {
                if values.len() != expected {
                    return Err(CcaError::RaggedRows {
                        row,
                        expected,
                        found: values.len(),
                    });
                }
            }
            rows.push(values);
        }

        let dataset = Self::from_rows(&rows)?;
        match names {
            Some(names) if names.len() == dataset.n_cols() => dataset.with_column_names(names),
            Some(names) => {
                log::warn!(
                    "header has {} columns after skipping, data has {}; dropping names",
                    names.len(),
                    dataset.n_cols()
                );
                Ok(dataset)
            }
            None => Ok(dataset),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn column_names(&self) -> Option<&[String]> {
        self.column_names.as_deref()
    }

    /// Copy of this dataset with rows reordered by the permutation that
    /// [`row_permutation`] yields for `seed`. Columns are untouched.
    pub fn shuffled_rows(&self, seed: u64) -> Self {
        let order = row_permutation(self.n_rows(), seed);
        Self {
            matrix: self.matrix.select_rows(order.iter()),
            column_names: self.column_names.clone(),
        }
    }
}

/// Deterministic permutation of `0..n` for a given seed.
///
/// ChaCha8 is used rather than `StdRng` so the same seed yields the same
/// order across platforms and `rand` releases.
pub fn row_permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small() -> Dataset {
        Dataset::from_rows(&[
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
            vec![7.0, 8.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_from_rows_shape() {
        let d = small();
        assert_eq!(d.n_rows(), 4);
        assert_eq!(d.n_cols(), 2);
        assert_eq!(d.matrix()[(2, 1)], 6.0);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Dataset::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            CcaError::RaggedRows {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        assert!(matches!(
            Dataset::from_rows(&[]),
            Err(CcaError::EmptyDataset("rows"))
        ));
        assert!(matches!(
            Dataset::from_rows(&[vec![], vec![]]),
            Err(CcaError::EmptyDataset("columns"))
        ));
    }

    #[test]
    fn test_column_names_must_match() {
        let err = small().with_column_names(vec!["a".into()]).unwrap_err();
        assert!(matches!(err, CcaError::ColumnNameCount { .. }));
        let d = small()
            .with_column_names(vec!["a".into(), "b".into()])
            .unwrap();
        assert_eq!(d.column_names().unwrap(), &["a", "b"]);
    }

    #[test]
    fn test_shuffle_is_deterministic_per_seed() {
        let d = small();
        assert_eq!(d.shuffled_rows(7), d.shuffled_rows(7));
        assert_eq!(row_permutation(50, 3), row_permutation(50, 3));
        assert_ne!(row_permutation(50, 3), row_permutation(50, 4));
    }

    #[test]
    fn test_shuffle_keeps_rows_intact() {
        let d = small();
        let s = d.shuffled_rows(1);
        let order = row_permutation(d.n_rows(), 1);
        for (dst, &src) in order.iter().enumerate() {
            assert_eq!(s.matrix().row(dst), d.matrix().row(src));
        }
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_csv_with_headers_and_skip() {
        let text = "id,group,a,b\n1,x,0.5,1.5\n2,y,2.5,3.5\n";
        let opts = CsvOptions {
            has_headers: true,
            skip_columns: 2,
        };
        let d = Dataset::from_csv_reader(text.as_bytes(), &opts).unwrap();
        assert_eq!(d.n_rows(), 2);
        assert_eq!(d.n_cols(), 2);
        assert_eq!(d.matrix()[(1, 0)], 2.5);
        assert_eq!(d.column_names().unwrap(), &["a", "b"]);
    }

    #[test]
    fn test_csv_without_headers() {
        let text = "1,2,3\n4,5,6\n";
        let opts = CsvOptions {
            has_headers: false,
            skip_columns: 0,
        };
        let d = Dataset::from_csv_reader(text.as_bytes(), &opts).unwrap();
        assert_eq!(d.n_rows(), 2);
        assert_eq!(d.n_cols(), 3);
        assert!(d.column_names().is_none());
    }

    #[test]
    fn test_csv_parse_error_names_cell() {
        let text = "a,b\n1,2\n3,oops\n";
        let err = Dataset::from_csv_reader(text.as_bytes(), &CsvOptions::default()).unwrap_err();
        match err {
            CcaError::Parse { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, 1);
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_csv_ragged_rows() {
        let text = "a,b\n1,2\n3\n";
        let err = Dataset::from_csv_reader(text.as_bytes(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, CcaError::RaggedRows { row: 1, .. }));
    }

    #[test]
    fn test_csv_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1.0,2.0").unwrap();
        writeln!(file, "3.0,4.0").unwrap();
        file.flush().unwrap();
        let d = Dataset::from_csv_path(file.path(), &CsvOptions::default()).unwrap();
        assert_eq!(d.n_rows(), 2);
    }

    #[test]
    fn test_csv_missing_file_is_io_error() {
        let err = Dataset::from_csv_path("/nonexistent/permcca.csv", &CsvOptions::default())
            .unwrap_err();
        assert!(matches!(err, CcaError::Io(_)));
    }
}
