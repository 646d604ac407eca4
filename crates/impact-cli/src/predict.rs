//! `impact predict`: classify an event directory offline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use impact_claims::{
    Classification, ClassifierGateway, ImpactConfig, InMemoryClaimStore, InferenceOrchestrator,
    Severity,
};

/// Arguments for the predict command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Event directory (imu.csv at its root or inside one folder)
    pub event_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: PredictFormat,
}

/// Output format for predictions
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictFormat {
    Json,
    Text,
}

/// Execute the predict command
pub fn execute(config: &ImpactConfig, args: PredictArgs) -> Result<()> {
    let classification = classify(config, &args.event_dir)?;
    match args.format {
        PredictFormat::Json => println!("{}", serde_json::to_string_pretty(&classification)?),
        PredictFormat::Text => println!("{}", format_classification(&classification)),
    }
    Ok(())
}

/// Classify without persisting or escalating
pub fn classify(config: &ImpactConfig, event_dir: &std::path::Path) -> Result<Classification> {
    let gateway = Arc::new(ClassifierGateway::from_models_dir(&config.models_dir));
    let orchestrator =
        InferenceOrchestrator::new(config, gateway, Arc::new(InMemoryClaimStore::new()));
    orchestrator
        .classify_event_dir(event_dir)
        .with_context(|| format!("classifying {}", event_dir.display()))
}

/// Human-readable verdict with color
pub fn format_classification(classification: &Classification) -> String {
    match classification.severity() {
        None => "NO CRASH".green().bold().to_string(),
        Some(Severity::Light) => "CRASH (light)".yellow().bold().to_string(),
        Some(Severity::Heavy) => "CRASH (heavy)".red().bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_classification() {
        colored::control::set_override(false);
        assert_eq!(format_classification(&Classification::no_crash()), "NO CRASH");
        assert_eq!(
            format_classification(&Classification::crash(Severity::Heavy)),
            "CRASH (heavy)"
        );
    }
}
