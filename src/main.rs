//! mlstep - Main Entry Point
//!
//! Serves the pipeline over HTTP or runs it once from the command line.

use clap::Parser;
use mlstep::cli::{cmd_run, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlstep=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { data, target, preprocess, ratio, model }) => {
            cmd_run(&data, &target, preprocess.as_deref(), ratio, &model)?;
        }
        Some(Commands::Serve { host, port }) => {
            cmd_serve(host, port).await?;
        }
        None => {
            // Default: serve with environment configuration
            cmd_serve(None, None).await?;
        }
    }

    Ok(())
}
