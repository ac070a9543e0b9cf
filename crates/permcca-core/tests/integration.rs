//! Integration tests for permcca-core.
//!
//! These exercise the whole path: dataset construction → CCA fit →
//! permutation trials → report.

use std::io::Write;

use permcca_core::{
    CcaError, CsvOptions, Dataset, NullModel, PermutationConfig, Side, evaluate,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn noise_rows(rows: usize, cols: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect())
        .collect()
}

fn noise(rows: usize, cols: usize, seed: u64) -> Dataset {
    Dataset::from_rows(&noise_rows(rows, cols, seed)).unwrap()
}

fn config(k: usize, m: usize) -> PermutationConfig {
    PermutationConfig {
        n_components: k,
        n_permutations: m,
        ..PermutationConfig::default()
    }
}

#[test]
fn hundred_by_ten_single_component() {
    let x = noise(100, 10, 1);
    let y = noise(100, 10, 2);
    let report = evaluate(&x, &y, &config(1, 10)).unwrap();

    assert_eq!(report.components.len(), 1);
    let c = &report.components[0];
    assert!((-1.0..=1.0).contains(&c.observed_correlation));
    assert_eq!(c.permutation_scores.len(), 10);

    let steps = c.p_value * 11.0;
    assert!((steps - steps.round()).abs() < 1e-12, "p = {}", c.p_value);
    assert!(c.p_value >= 1.0 / 11.0 && c.p_value <= 1.0);

    let text = c.to_string();
    assert!(text.starts_with("Component 1:\nObserved Correlation: "));
    assert!(text.contains("Permuted Correlation Range: "));
    assert!(text.contains("P-value: "));
}

#[test]
fn identical_datasets_are_maximally_significant() {
    let x = noise(100, 5, 3);
    for null_model in [NullModel::Refit, NullModel::Transform] {
        let cfg = PermutationConfig {
            null_model,
            ..config(1, 20)
        };
        let report = evaluate(&x, &x, &cfg).unwrap();
        let c = &report.components[0];
        assert!(c.observed_correlation > 0.999_999, "{null_model}: r = {}", c.observed_correlation);
        assert_eq!(c.p_value, 1.0 / 21.0, "{null_model}");
    }
}

#[test]
fn linked_signal_is_detected() {
    let xr = noise_rows(100, 3, 4);
    let er = noise_rows(100, 3, 5);
    let yr: Vec<Vec<f64>> = xr
        .iter()
        .zip(&er)
        .map(|(a, e)| vec![a[0] + 0.2 * e[0], e[1], e[2]])
        .collect();
    let x = Dataset::from_rows(&xr).unwrap();
    let y = Dataset::from_rows(&yr).unwrap();

    let report = evaluate(&x, &y, &config(2, 50)).unwrap();
    assert!(report.components[0].observed_correlation > 0.9);
    assert_eq!(report.components[0].p_value, report.min_p_value());
    assert!(report.canonical_correlations[0] >= report.canonical_correlations[1]);
}

#[test]
fn independent_noise_is_not_systematically_significant() {
    let m = 39;
    let p_values: Vec<f64> = (0..5)
        .map(|s| {
            let x = noise(60, 4, 100 + s);
            let y = noise(60, 4, 200 + s);
            evaluate(&x, &y, &config(1, m)).unwrap().components[0].p_value
        })
        .collect();

    let mean = p_values.iter().sum::<f64>() / p_values.len() as f64;
    assert!(mean > 0.1, "p-values {p_values:?}");
    assert!(p_values.iter().any(|&p| p > 1.0 / (m + 1) as f64));
}

#[test]
fn reruns_are_bit_identical() {
    let x = noise(50, 4, 6);
    let y = noise(50, 3, 7);
    for null_model in [NullModel::Refit, NullModel::Transform] {
        let cfg = PermutationConfig {
            null_model,
            ..config(3, 25)
        };
        let a = evaluate(&x, &y, &cfg).unwrap();
        let b = evaluate(&x, &y, &cfg).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn every_p_value_is_in_bounds() {
    let x = noise(40, 3, 8);
    let y = noise(40, 3, 9);
    let report = evaluate(&x, &y, &config(3, 30)).unwrap();
    for c in &report.components {
        assert!(c.p_value >= 1.0 / 31.0);
        assert!(c.p_value <= 1.0);
    }
}

#[test]
fn invalid_parameters_abort_early() {
    let x = noise(30, 3, 10);
    let y = noise(30, 2, 11);

    assert!(matches!(
        evaluate(&x, &y, &config(3, 10)),
        Err(CcaError::TooManyComponents {
            requested: 3,
            available: 2
        })
    ));
    assert!(matches!(
        evaluate(&x, &y, &config(0, 10)),
        Err(CcaError::ZeroComponents)
    ));
    assert!(matches!(
        evaluate(&x, &y, &config(1, 0)),
        Err(CcaError::ZeroPermutations)
    ));
    assert!(evaluate(&x, &y, &config(1, 1)).is_ok());
}

#[test]
fn constant_feature_is_a_numerical_error() {
    let x = noise(30, 3, 12);
    let mut yr = noise_rows(30, 2, 13);
    for r in &mut yr {
        r[0] = 1.5;
    }
    let y = Dataset::from_rows(&yr).unwrap();
    assert!(matches!(
        evaluate(&x, &y, &config(1, 5)),
        Err(CcaError::SingularCovariance { side: Side::Y })
    ));
}

#[test]
fn csv_inputs_with_leading_metadata_columns() {
    let xr = noise_rows(40, 3, 14);
    let yr = noise_rows(40, 2, 15);

    let write = |rows: &[Vec<f64>], prefix: &str| {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let names: Vec<String> = (0..rows[0].len()).map(|i| format!("{prefix}{i}")).collect();
        writeln!(file, "id,site,{}", names.join(",")).unwrap();
        for (i, r) in rows.iter().enumerate() {
            let vals: Vec<String> = r.iter().map(|v| format!("{v:.17e}")).collect();
            writeln!(file, "{i},north,{}", vals.join(",")).unwrap();
        }
        file.flush().unwrap();
        file
    };
    let fx = write(&xr, "x");
    let fy = write(&yr, "y");

    let opts = CsvOptions {
        has_headers: true,
        skip_columns: 2,
    };
    let x = Dataset::from_csv_path(fx.path(), &opts).unwrap();
    let y = Dataset::from_csv_path(fy.path(), &opts).unwrap();
    assert_eq!((x.n_rows(), x.n_cols()), (40, 3));
    assert_eq!(y.column_names().unwrap(), &["y0", "y1"]);

    let from_csv = evaluate(&x, &y, &config(2, 8)).unwrap();
    let direct = evaluate(
        &Dataset::from_rows(&xr).unwrap(),
        &Dataset::from_rows(&yr).unwrap(),
        &config(2, 8),
    )
    .unwrap();
    assert_eq!(from_csv.components, direct.components);
}
