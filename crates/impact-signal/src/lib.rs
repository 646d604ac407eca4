//! IMPACT Signal Processing Library
//!
//! This crate turns raw inertial recordings into the fixed-shape feature
//! vectors consumed by the crash and severity classifiers.
//!
//! # Features
//!
//! - **Event Series**: Validated, time-ordered six-axis IMU samples
//! - **Feature Extraction**: Crash-detection (8) and severity (4) vectors
//! - **IMU Tables**: `imu.csv` reading/writing with column validation
//! - **Synthetic Events**: Seeded baseline + impact spike generator
//! - **Phyphox Alignment**: Accelerometer/gyroscope export merging
//!
//! # Example
//!
//! ```rust,no_run
//! use impact_signal::{FeatureExtractor, imu};
//!
//! let series = imu::read_imu_csv("event_0001/imu.csv")?;
//! let extractor = FeatureExtractor::inference();
//!
//! let crash = extractor.extract_crash_vector(series.samples())?;
//! let severity = extractor.extract_severity_vector(series.samples())?;
//! println!("max |a| = {:.2} m/s^2", crash.max_accel());
//! # let _ = severity;
//! # Ok::<(), impact_signal::SignalError>(())
//! ```

pub mod features;
pub mod imu;
pub mod phyphox;
pub mod sample;
pub mod synthetic;

// Re-export main types for convenience
pub use features::{
    CrashFeatures, EventFeatures, FeatureExtractor, SampleInterval, SeverityFeatures,
    CRASH_FEATURE_COUNT, MIN_SAMPLE_INTERVAL_S, SEVERITY_FEATURE_COUNT,
};
pub use imu::{EventLabel, EventMetadata, IMU_FILE, LABEL_FILE, META_FILE, REQUIRED_COLUMNS};
pub use phyphox::{PhyphoxExport, ACCELEROMETER_FILE, GYROSCOPE_FILE};
pub use sample::{RawEventSeries, RawSample, MIN_EVENT_SAMPLES};
pub use synthetic::{SyntheticEventConfig, SyntheticEventGenerator, SyntheticLabel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for signal processing operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Unified error type for signal processing operations
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Too few samples for the requested operation
    #[error("Insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples {
        /// Minimum number of samples required
        required: usize,
        /// Number of samples provided
        actual: usize,
    },

    /// Sensor table is missing columns or holds unusable values
    #[error("Malformed event data: {0}")]
    MalformedEventData(String),

    /// CSV encoding error while writing a sensor table
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Metadata (JSON) error
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignalError {
    /// Create a malformed-data error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        SignalError::MalformedEventData(msg.into())
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::features::{CrashFeatures, FeatureExtractor, SampleInterval, SeverityFeatures};
    pub use crate::sample::{RawEventSeries, RawSample};
    pub use crate::{Result, SignalError};
}
