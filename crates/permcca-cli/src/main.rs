//! CLI for permcca — permutation-tested canonical correlation analysis.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "permcca")]
#[command(about = "permcca — canonical correlation analysis with permutation-tested significance")]
#[command(version = permcca_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit CCA and test each component against a permutation null
    Evaluate {
        #[command(flatten)]
        input: commands::InputArgs,

        /// Number of canonical components to test
        #[arg(long, default_value = "3")]
        components: usize,

        /// Number of permutation trials per component (trial j uses seed j)
        #[arg(long, default_value = "1000")]
        permutations: usize,

        /// Null model: refit (CCA refit on every shuffle) or transform (reuse the true-data fit)
        #[arg(long, default_value = "refit", value_parser = ["refit", "transform"])]
        null_model: String,

        /// Also report Bartlett's chi-square test per component
        #[arg(long)]
        bartlett: bool,

        /// Write the full report, including every permutation score, as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Fit CCA once and print all canonical correlations with Bartlett tests
    Fit {
        #[command(flatten)]
        input: commands::InputArgs,

        /// Number of canonical components to report
        #[arg(long, default_value = "3")]
        components: usize,
    },
}

fn main() {
    commands::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            input,
            components,
            permutations,
            null_model,
            bartlett,
            output,
        } => commands::evaluate::run(commands::evaluate::EvaluateCommandConfig {
            input: &input,
            components,
            permutations,
            null_model: &null_model,
            bartlett,
            output_path: output.as_deref(),
        }),
        Commands::Fit { input, components } => commands::fit::run(&input, components),
    }
}
