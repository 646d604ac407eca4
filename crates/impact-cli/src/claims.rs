//! `impact claims`: inspect persisted claims.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use impact_claims::{Claim, ClaimId, ClaimStore, FileClaimStore, ImpactConfig, Severity};

/// Claims subcommand
#[derive(Subcommand, Debug)]
pub enum ClaimsCommand {
    /// List stored claims
    List(ListArgs),

    /// Show one claim
    Show(ShowArgs),
}

/// Arguments for `claims list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Only claims that required emergency escalation
    #[arg(long)]
    pub emergency_only: bool,

    /// Maximum number of claims to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for `claims show`
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Claim id
    pub claim_id: String,
}

/// Output format for listings
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Compact,
}

// ============================================================================
// Display Structs for Tables
// ============================================================================

/// Claim display row for tables
#[derive(Tabled, Serialize)]
struct ClaimRow {
    #[tabled(rename = "Claim ID")]
    claim_id: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Crash")]
    crash: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Emergency")]
    emergency: String,
}

impl ClaimRow {
    fn from_claim(claim: &Claim, colored: bool) -> Self {
        let result = &claim.result;
        let severity = result.severity();
        Self {
            claim_id: claim.claim_id.to_string(),
            created_at: claim.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            crash: if result.crash() { "yes" } else { "no" }.to_string(),
            severity: if colored {
                format_severity(severity)
            } else {
                severity.map(|s| s.to_string()).unwrap_or_else(|| "-".into())
            },
            emergency: if result.emergency_required() {
                if colored {
                    "REQUIRED".red().bold().to_string()
                } else {
                    "required".to_string()
                }
            } else {
                "-".to_string()
            },
        }
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a claims command
pub fn execute(config: &ImpactConfig, command: ClaimsCommand) -> Result<()> {
    let store = FileClaimStore::new(config.results_dir());
    match command {
        ClaimsCommand::List(args) => execute_list(&store, args),
        ClaimsCommand::Show(args) => execute_show(&store, args),
    }
}

/// Load claims in store order, applying filters
pub fn load_claims(
    store: &dyn ClaimStore,
    emergency_only: bool,
    limit: Option<usize>,
) -> Result<Vec<Claim>> {
    let mut claims = Vec::new();
    for id in store.list()? {
        let claim = store
            .get_claim(&id)
            .with_context(|| format!("reading claim {}", id))?;
        if emergency_only && !claim.result.emergency_required() {
            continue;
        }
        claims.push(claim);
        if limit.is_some_and(|n| claims.len() >= n) {
            break;
        }
    }
    Ok(claims)
}

fn execute_list(store: &dyn ClaimStore, args: ListArgs) -> Result<()> {
    let claims = load_claims(store, args.emergency_only, args.limit)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        OutputFormat::Compact => {
            for claim in &claims {
                let row = ClaimRow::from_claim(claim, false);
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.claim_id, row.created_at, row.crash, row.severity, row.emergency
                );
            }
        }
        OutputFormat::Table => {
            println!("{}", "Stored Claims".bold().cyan());
            println!("{}", "=".repeat(100));

            if claims.is_empty() {
                println!("No claims stored.");
            } else {
                let crashes = claims.iter().filter(|c| c.result.crash()).count();
                let emergencies = claims
                    .iter()
                    .filter(|c| c.result.emergency_required())
                    .count();
                println!(
                    "Total: {} | {} {} | {} {}",
                    claims.len().to_string().bold(),
                    "CRASHES:".yellow().bold(),
                    crashes,
                    "EMERGENCIES:".red().bold(),
                    emergencies
                );
                println!();

                let rows: Vec<ClaimRow> = claims
                    .iter()
                    .map(|c| ClaimRow::from_claim(c, true))
                    .collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
    }

    Ok(())
}

fn execute_show(store: &dyn ClaimStore, args: ShowArgs) -> Result<()> {
    let id = ClaimId::parse(&args.claim_id)
        .ok_or_else(|| anyhow!("claim not found: {}", args.claim_id))?;
    let claim = store
        .get_claim(&id)
        .with_context(|| format!("looking up claim {}", args.claim_id))?;
    println!("{}", serde_json::to_string_pretty(&claim)?);
    Ok(())
}

// ============================================================================
// Formatting Helpers
// ============================================================================

/// Format severity with color
fn format_severity(severity: Option<Severity>) -> String {
    match severity {
        Some(Severity::Heavy) => "HEAVY".red().bold().to_string(),
        Some(Severity::Light) => "LIGHT".yellow().to_string(),
        None => "-".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impact_claims::{
        Classification, ClassificationResult, EscalationRecord, InMemoryClaimStore,
    };

    fn store_with_claims() -> InMemoryClaimStore {
        let store = InMemoryClaimStore::new();
        store
            .create(ClassificationResult::new(
                Classification::no_crash(),
                EscalationRecord::inert(),
            ))
            .unwrap();
        store
            .create(ClassificationResult::new(
                Classification::crash(Severity::Heavy),
                EscalationRecord::required(vec!["112".into()], "help".into()),
            ))
            .unwrap();
        store
    }

    #[test]
    fn test_load_claims_filters() {
        let store = store_with_claims();
        assert_eq!(load_claims(&store, false, None).unwrap().len(), 2);
        assert_eq!(load_claims(&store, false, Some(1)).unwrap().len(), 1);

        let emergencies = load_claims(&store, true, None).unwrap();
        assert_eq!(emergencies.len(), 1);
        assert_eq!(emergencies[0].result.severity(), Some(Severity::Heavy));
    }

    #[test]
    fn test_plain_row() {
        let store = store_with_claims();
        let claims = load_claims(&store, true, None).unwrap();
        let row = ClaimRow::from_claim(&claims[0], false);
        assert_eq!(row.crash, "yes");
        assert_eq!(row.severity, "heavy");
        assert_eq!(row.emergency, "required");
    }
}
