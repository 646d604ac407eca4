//! IMPACT CLI Entry Point
//!
//! This is the main entry point for the impact command-line tool.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use impact_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads env-backed flags
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let config = cli.global.resolve()?;
            impact_cli::serve::execute(config, args).await?;
        }
        Commands::Predict(args) => {
            let config = cli.global.resolve()?;
            impact_cli::predict::execute(&config, args)?;
        }
        Commands::Claims(cmd) => {
            let config = cli.global.resolve()?;
            impact_cli::claims::execute(&config, cmd)?;
        }
        Commands::Synth(args) => impact_cli::data::execute_synth(args)?,
        Commands::ConvertPhyphox(args) => impact_cli::data::execute_convert(args)?,
        Commands::Validate(args) => impact_cli::data::execute_validate(args)?,
        Commands::Version => {
            println!("impact {}", env!("CARGO_PKG_VERSION"));
            println!("claims engine version: {}", impact_claims::VERSION);
            println!("signal features version: {}", impact_signal::VERSION);
        }
    }

    Ok(())
}
