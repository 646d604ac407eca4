//! Service configuration.
//!
//! Values come from defaults, then environment variables (a `.env` file is
//! honoured via `dotenvy`), then explicit overrides through the builder.
//!
//! | Variable | Field |
//! |---|---|
//! | `EMERGENCY_NUMBERS` | `emergency_contacts` (comma separated) |
//! | `IMPACT_STORAGE_DIR` | `storage_dir` |
//! | `IMPACT_MODELS_DIR` | `models_dir` |
//! | `IMPACT_BIND_ADDR` | `bind_addr` |
//! | `IMPACT_MAX_UPLOAD_BYTES` | `max_upload_bytes` |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::alerting::DEFAULT_ESCALATION_TEMPLATE;
use crate::ingest::ArchiveLimits;
use crate::{ImpactError, Result};

pub const ENV_EMERGENCY_NUMBERS: &str = "EMERGENCY_NUMBERS";
pub const ENV_STORAGE_DIR: &str = "IMPACT_STORAGE_DIR";
pub const ENV_MODELS_DIR: &str = "IMPACT_MODELS_DIR";
pub const ENV_BIND_ADDR: &str = "IMPACT_BIND_ADDR";
pub const ENV_MAX_UPLOAD_BYTES: &str = "IMPACT_MAX_UPLOAD_BYTES";

/// Default upload limit (32 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Configuration for the claim service
#[derive(Debug, Clone)]
pub struct ImpactConfig {
    /// Root for extracted events and persisted results
    pub storage_dir: PathBuf,
    /// Directory holding the classifier artifacts
    pub models_dir: PathBuf,
    /// Contacts notified on heavy crashes
    pub emergency_contacts: Vec<String>,
    /// Escalation message; `{claim_id}` is substituted
    pub escalation_template: String,
    /// HTTP listen address
    pub bind_addr: SocketAddr,
    /// Largest accepted upload body
    pub max_upload_bytes: usize,
    /// Extraction limits for uploaded archives
    pub archive_limits: ArchiveLimits,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            models_dir: PathBuf::from("models"),
            emergency_contacts: Vec::new(),
            escalation_template: DEFAULT_ESCALATION_TEMPLATE.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            archive_limits: ArchiveLimits::default(),
        }
    }
}

impl ImpactConfig {
    /// Create a new configuration builder
    pub fn builder() -> ImpactConfigBuilder {
        ImpactConfigBuilder::default()
    }

    /// Load `.env` (if any) and read the process environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_env()
    }

    /// Read the process environment over defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_EMERGENCY_NUMBERS) {
            config.emergency_contacts = parse_contacts(&raw);
        }

        if let Some(dir) = lookup(ENV_STORAGE_DIR) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup(ENV_MODELS_DIR) {
            config.models_dir = PathBuf::from(dir);
        }

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = addr.trim().parse().map_err(|_| {
                ImpactError::Config(format!("Invalid {}: {}", ENV_BIND_ADDR, addr))
            })?;
        }

        if let Some(limit) = lookup(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = limit.trim().parse().map_err(|_| {
                ImpactError::Config(format!("Invalid {}: {}", ENV_MAX_UPLOAD_BYTES, limit))
            })?;
        }

        Ok(config)
    }

    /// `<storage>/events`: per-request workspaces and retained uploads
    pub fn events_dir(&self) -> PathBuf {
        self.storage_dir.join("events")
    }

    /// `<storage>/results`: persisted claims
    pub fn results_dir(&self) -> PathBuf {
        self.storage_dir.join("results")
    }
}

/// Split a comma-separated contact list, trimming entries and dropping
/// blanks.
pub fn parse_contacts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Builder for ImpactConfig
#[derive(Debug, Default)]
pub struct ImpactConfigBuilder {
    config: ImpactConfig,
}

impl ImpactConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: ImpactConfig) -> Self {
        Self { config }
    }

    /// Set storage root
    pub fn storage_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.storage_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set models directory
    pub fn models_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.models_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set emergency contacts
    pub fn emergency_contacts<I, S>(mut self, contacts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.emergency_contacts = contacts.into_iter().map(Into::into).collect();
        self
    }

    /// Set escalation message template
    pub fn escalation_template(mut self, template: impl Into<String>) -> Self {
        self.config.escalation_template = template.into();
        self
    }

    /// Set listen address
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Set upload size limit
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes.max(1);
        self
    }

    /// Set archive extraction limits
    pub fn archive_limits(mut self, limits: ArchiveLimits) -> Self {
        self.config.archive_limits = limits;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ImpactConfig {
        self.config
    }
}
