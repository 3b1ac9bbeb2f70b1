//! formstate CLI - materialize form state from collection schemas.
//!
//! Commands:
//! - `formstate materialize`: Print a document's form state as JSON
//! - `formstate collections`: List collections in a fields directory
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use clap::Parser;
use tracing_subscriber::EnvFilter;

use formstate_cli::{run_collections, run_materialize, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level
    let filter = if cli.debug {
        EnvFilter::new("formstate=debug,formstate_fields=debug,formstate_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = dispatch_command(cli).await;
    std::process::exit(exit_code);
}

/// Dispatch a parsed CLI to the appropriate command handler.
async fn dispatch_command(cli: Cli) -> i32 {
    let config_dir = cli.config_dir.as_deref();
    match &cli.command {
        Commands::Materialize(args) => output_to_exit(run_materialize(args, config_dir).await),
        Commands::Collections { fields, strict } => {
            output_to_exit(run_collections(fields, *strict).await)
        }
    }
}

/// Print a command's output, or its error, and convert to an exit code.
fn output_to_exit<E: std::fmt::Display>(result: Result<String, E>) -> i32 {
    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}
