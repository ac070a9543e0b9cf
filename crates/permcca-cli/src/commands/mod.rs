pub mod evaluate;
pub mod fit;

use clap::Args;
use permcca_core::{CsvOptions, Dataset, NullModel};

/// Input files shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV file holding the X dataset
    #[arg(long = "x")]
    pub x_path: String,

    /// CSV file holding the Y dataset (rows aligned with X)
    #[arg(long = "y")]
    pub y_path: String,

    /// Leading columns to drop from both files (identifiers, metadata)
    #[arg(long, default_value = "0")]
    pub skip_columns: usize,

    /// Files have no header row
    #[arg(long)]
    pub no_headers: bool,
}

impl InputArgs {
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            has_headers: !self.no_headers,
            skip_columns: self.skip_columns,
        }
    }
}

/// Initialise `env_logger`; `RUST_LOG` overrides the default `warn` level.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}

/// Load both datasets or exit with a message naming the failing file.
pub fn load_pair(input: &InputArgs) -> (Dataset, Dataset) {
    let opts = input.csv_options();
    let load = |path: &str| match Dataset::from_csv_path(path, &opts) {
        Ok(d) => {
            log::info!("loaded {path}: {} rows x {} columns", d.n_rows(), d.n_cols());
            d
        }
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };
    (load(&input.x_path), load(&input.y_path))
}

/// Parse a null model string into the enum.
pub fn parse_null_model(s: &str) -> NullModel {
    NullModel::parse(s).unwrap_or_else(|| {
        eprintln!("Unknown null model '{s}', using refit");
        NullModel::Refit
    })
}
