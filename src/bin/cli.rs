use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use extension_bridge::{load_extension, serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "extension-bridge")]
#[command(about = "Serve extension functions, assertions, and hooks over JSON-RPC on stdin/stdout", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the extension library (cdylib) to load
    #[arg(short, long, value_name = "PATH")]
    extension: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is reserved for protocol envelopes; everything else goes to stderr.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = match load_extension(&cli.extension) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load extension");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(path = %cli.extension.display(), "Loaded extension");
    tracing::info!("  Functions: {}", summary(&registry.function_names()));
    tracing::info!("  Assertions: {}", summary(&registry.assertion_names()));
    tracing::info!("  Hooks: {}", summary(&registry.hook_names()));

    serve(registry);
    ExitCode::SUCCESS
}

fn summary(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
