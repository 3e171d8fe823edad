//! ferry: copy files between Kubernetes and cloud storage endpoints
//! addressed as `<scheme>://<path>` for schemes `k8s`, `s3`, `abs`, `gcs`.

mod commands;
mod exit_code;
mod output;
mod registry;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ferry",
    version,
    about = "Copy files or directories between Kubernetes and cloud storage"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy files or directories between two storage endpoints
    Cp(commands::cp::CpArgs),
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Cp(args) => args.verbose,
        Commands::Version => false,
    };
    init_tracing(verbose);

    let code = match cli.command {
        Commands::Cp(args) => commands::cp::execute(args).await,
        Commands::Version => commands::version::execute(),
    };
    std::process::exit(code.code());
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();
}
