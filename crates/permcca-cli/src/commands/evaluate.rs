use std::io::{self, Write};
use std::time::Instant;

use permcca_core::{BartlettTest, ComponentResult, Evaluator, PermutationConfig, PermutationReport};

use super::InputArgs;

pub struct EvaluateCommandConfig<'a> {
    pub input: &'a InputArgs,
    pub components: usize,
    pub permutations: usize,
    pub null_model: &'a str,
    pub bartlett: bool,
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: EvaluateCommandConfig<'_>) {
    let (x, y) = super::load_pair(cfg.input);
    let config = PermutationConfig {
        n_components: cfg.components,
        n_permutations: cfg.permutations,
        null_model: super::parse_null_model(cfg.null_model),
        include_bartlett: cfg.bartlett,
    };

    let evaluator = Evaluator::new(config);
    if let Err(e) = evaluator.validate(&x, &y) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    println!(
        "Evaluating {} rows: X {} features, Y {} features, {} component(s), {} permutation(s), null model {}\n",
        x.n_rows(),
        x.n_cols(),
        y.n_cols(),
        config.n_components,
        config.n_permutations,
        config.null_model
    );

    // Each block is printed as soon as its component's permutations finish.
    let t0 = Instant::now();
    let streamed = evaluator.run_with(&x, &y, |c| {
        if let Err(e) = write_component_block(&mut io::stdout(), c) {
            log::warn!("failed to print component {}: {e}", c.component_index + 1);
        }
    });
    let report = match streamed {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    log::info!("evaluation finished in {:.2}s", t0.elapsed().as_secs_f64());

    if let Some(tests) = &report.bartlett {
        println!();
        print_bartlett_table(tests);
    }

    if let Some(path) = cfg.output_path {
        write_report(path, &report);
    }
}

/// One component block, preceded by a blank line after the first, so the
/// streamed output matches the report's `Display`.
fn write_component_block<W: Write>(out: &mut W, c: &ComponentResult) -> io::Result<()> {
    if c.component_index > 0 {
        writeln!(out)?;
    }
    writeln!(out, "{c}")?;
    out.flush()
}

pub(super) fn print_bartlett_table(tests: &[BartlettTest]) {
    println!("Bartlett chi-square (H0: this and later correlations are zero)");
    println!(
        "  {:>9}  {:>10}  {:>12}  {:>5}  {:>9}",
        "component", "wilks", "chi2", "df", "p-value"
    );
    for t in tests {
        println!(
            "  {:>9}  {:>10.4}  {:>12.3}  {:>5}  {:>9.3e}",
            t.component_index + 1,
            t.wilks_lambda,
            t.chi_squared,
            t.degrees_of_freedom,
            t.p_value
        );
    }
}

fn write_report(path: &str, report: &PermutationReport) {
    let json = match report.to_json_pretty() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("\nFailed to serialize report: {e}");
            return;
        }
    };
    match std::fs::write(path, json) {
        Ok(()) => println!("\nResults written to {path}"),
        Err(e) => eprintln!("\nFailed to write {path}: {e}"),
    }
}
