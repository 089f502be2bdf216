mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_compare, run_diff, run_resolve, CompareArgs, GlobalArgs};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    let globals = GlobalArgs {
        config: args.config,
        format: args.format,
        output: args.output,
    };

    match args.command {
        Commands::Resolve { link, out } => run_resolve(&globals, link, out).await,
        Commands::Diff {
            baseline,
            actual,
            threshold,
            diff_out,
        } => run_diff(&globals, baseline, actual, threshold, diff_out).await,
        Commands::Compare {
            page_id,
            page_name,
            page_url,
            link,
            screenshot,
            threshold,
            artifacts_dir,
        } => {
            let compare = CompareArgs {
                page_id,
                page_name,
                page_url,
                link,
                screenshot,
                threshold,
                artifacts_dir,
            };
            run_compare(&globals, compare).await
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,vdiff=debug,vdiff_lib=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
