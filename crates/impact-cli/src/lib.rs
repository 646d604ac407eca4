//! IMPACT CLI
//!
//! Command-line interface for the IMPACT crash claim engine: runs the HTTP
//! service, classifies event directories offline, inspects stored claims
//! and prepares event data.
//!
//! # Usage
//!
//! ```bash
//! # Serve the claim API
//! impact serve --bind 0.0.0.0:8000
//!
//! # Classify one event directory without storing a claim
//! impact predict data/events/event_0042
//!
//! # Inspect stored claims
//! impact claims list
//! impact claims show 5c21f0e4-...
//!
//! # Generate a labelled synthetic dataset
//! impact synth --out-dir data/events --seed 7
//!
//! # Convert a phone sensor export
//! impact convert-phyphox export.zip data/events/ride/imu.csv
//!
//! # Check an event directory
//! impact validate data/events/ride
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use impact_claims::ImpactConfig;

pub mod claims;
pub mod data;
pub mod predict;
pub mod serve;

/// IMPACT Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "impact")]
#[command(author, version, about = "Crash detection and emergency claim engine")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command; flags override the environment
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Storage root for events and claims
    #[arg(long, global = true, env = "IMPACT_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Directory holding crash_detector.json and severity_model.json
    #[arg(long, global = true, env = "IMPACT_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// Environment configuration with command-line overrides applied
    pub fn resolve(&self) -> anyhow::Result<ImpactConfig> {
        let config = ImpactConfig::from_env()?;
        Ok(self.apply(config))
    }

    /// Apply overrides to an existing configuration
    pub fn apply(&self, config: ImpactConfig) -> ImpactConfig {
        let mut builder = impact_claims::ImpactConfigBuilder::from_config(config);
        if let Some(dir) = &self.storage_dir {
            builder = builder.storage_dir(dir);
        }
        if let Some(dir) = &self.models_dir {
            builder = builder.models_dir(dir);
        }
        builder.build()
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP claim service
    Serve(serve::ServeArgs),

    /// Classify an event directory and print the result
    Predict(predict::PredictArgs),

    /// Inspect stored claims
    #[command(subcommand)]
    Claims(claims::ClaimsCommand),

    /// Generate labelled synthetic events
    Synth(data::SynthArgs),

    /// Convert a Phyphox export archive to imu.csv
    ConvertPhyphox(data::ConvertArgs),

    /// Check an event directory for usable sensor data
    Validate(data::ValidateArgs),

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "impact",
            "--storage-dir",
            "/srv/impact",
            "claims",
            "list",
        ])
        .unwrap();
        let config = cli.global.apply(ImpactConfig::default());
        assert_eq!(config.storage_dir, PathBuf::from("/srv/impact"));
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert!(matches!(cli.command, Commands::Claims(claims::ClaimsCommand::List(_))));
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["impact", "predict", "ev", "--models-dir", "m2"]).unwrap();
        assert_eq!(cli.global.models_dir, Some(PathBuf::from("m2")));
    }
}
