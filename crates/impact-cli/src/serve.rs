//! `impact serve`: run the HTTP claim service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{info, warn};

use impact_claims::api::{create_router, ApiConfig, AppState};
use impact_claims::{
    ClassifierGateway, FileClaimStore, ImpactConfig, ImpactConfigBuilder, InferenceOrchestrator,
};

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen address
    #[arg(short, long, env = "IMPACT_BIND_ADDR")]
    pub bind: Option<SocketAddr>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "IMPACT_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Emergency contact (repeatable); replaces EMERGENCY_NUMBERS
    #[arg(long = "contact")]
    pub contacts: Vec<String>,

    /// Load both models before accepting requests
    #[arg(long)]
    pub preload: bool,
}

impl ServeArgs {
    /// Apply serve-specific overrides
    pub fn apply(&self, config: ImpactConfig) -> ImpactConfig {
        let mut builder = ImpactConfigBuilder::from_config(config);
        if let Some(addr) = self.bind {
            builder = builder.bind_addr(addr);
        }
        if let Some(limit) = self.max_upload_bytes {
            builder = builder.max_upload_bytes(limit);
        }
        if !self.contacts.is_empty() {
            builder = builder.emergency_contacts(self.contacts.iter().cloned());
        }
        builder.build()
    }
}

/// Execute the serve command
pub async fn execute(config: ImpactConfig, args: ServeArgs) -> Result<()> {
    let config = args.apply(config);

    std::fs::create_dir_all(config.events_dir())
        .with_context(|| format!("creating {}", config.events_dir().display()))?;
    std::fs::create_dir_all(config.results_dir())
        .with_context(|| format!("creating {}", config.results_dir().display()))?;

    if config.emergency_contacts.is_empty() {
        warn!("No emergency contacts configured; heavy crashes will escalate with an empty contact list");
    }

    let gateway = Arc::new(ClassifierGateway::from_models_dir(&config.models_dir));
    if args.preload {
        gateway
            .load()
            .with_context(|| format!("loading models from {}", config.models_dir.display()))?;
        info!("Models loaded");
    }

    let store = Arc::new(FileClaimStore::new(config.results_dir()));
    let orchestrator = Arc::new(InferenceOrchestrator::new(&config, gateway, store));
    let app = create_router(AppState::new(orchestrator, ApiConfig::from(&config)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    println!(
        "{} Claim service listening on {}",
        "[IMPACT]".bright_cyan().bold(),
        config.bind_addr.to_string().bold()
    );
    info!(
        addr = %config.bind_addr,
        storage = %config.storage_dir.display(),
        models = %config.models_dir.display(),
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
        .context("server error")?;

    Ok(())
}
