//! Feature Extraction Module
//!
//! Reduces an IMU event series to the two fixed-order vectors the
//! classifiers were trained on.
//!
//! Crash vector (8 values, this order):
//! `[max|a|, mean|a|, std|a|, max jerk, max|gx|, max|gy|, max|gz|, energy]`
//!
//! Severity vector (4 values, this order):
//! `[max|a|, max jerk, max|gx|, energy]`
//!
//! where `|a| = sqrt(ax^2 + ay^2 + az^2)`, `dt` is the mean spacing of
//! consecutive timestamps, `jerk = |diff(|a|) / dt|` and
//! `energy = sum(|a|^2) * dt`. Standard deviation uses one degree of
//! freedom (sample std), matching the training pipeline.

use serde::{Deserialize, Serialize};

use crate::sample::{RawEventSeries, RawSample};
use crate::{Result, SignalError};

/// Number of values in a crash-detection vector
pub const CRASH_FEATURE_COUNT: usize = 8;

/// Number of values in a severity vector
pub const SEVERITY_FEATURE_COUNT: usize = 4;

/// Interval substituted for a non-positive mean timestep on the
/// inference path.
pub const MIN_SAMPLE_INTERVAL_S: f64 = 1e-3;

/// Minimum samples needed to form one timestamp difference.
const MIN_EXTRACTION_SAMPLES: usize = 2;

/// How the mean timestep is treated before it is used as a divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleInterval {
    /// Replace `dt <= 0` with [`MIN_SAMPLE_INTERVAL_S`] (inference path)
    #[default]
    Floored,
    /// Use `dt` as computed; degenerate timing yields non-finite values
    /// (training-time behaviour)
    Raw,
}

impl SampleInterval {
    fn resolve(self, dt: f64) -> f64 {
        match self {
            SampleInterval::Floored if dt <= 0.0 => MIN_SAMPLE_INTERVAL_S,
            _ => dt,
        }
    }
}

/// Crash-detection feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrashFeatures([f64; CRASH_FEATURE_COUNT]);

impl CrashFeatures {
    /// Wrap a raw vector in training order
    pub fn from_array(values: [f64; CRASH_FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Values in training order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Values in training order
    pub fn to_array(&self) -> [f64; CRASH_FEATURE_COUNT] {
        self.0
    }

    pub fn max_accel(&self) -> f64 {
        self.0[0]
    }

    pub fn mean_accel(&self) -> f64 {
        self.0[1]
    }

    pub fn std_accel(&self) -> f64 {
        self.0[2]
    }

    pub fn max_jerk(&self) -> f64 {
        self.0[3]
    }

    /// Peak absolute angular rate per axis `[gx, gy, gz]`
    pub fn max_abs_gyro(&self) -> [f64; 3] {
        [self.0[4], self.0[5], self.0[6]]
    }

    pub fn energy(&self) -> f64 {
        self.0[7]
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Severity feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityFeatures([f64; SEVERITY_FEATURE_COUNT]);

impl SeverityFeatures {
    /// Wrap a raw vector in training order
    pub fn from_array(values: [f64; SEVERITY_FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Values in training order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Values in training order
    pub fn to_array(&self) -> [f64; SEVERITY_FEATURE_COUNT] {
        self.0
    }

    pub fn max_accel(&self) -> f64 {
        self.0[0]
    }

    pub fn max_jerk(&self) -> f64 {
        self.0[1]
    }

    pub fn max_abs_gx(&self) -> f64 {
        self.0[2]
    }

    pub fn energy(&self) -> f64 {
        self.0[3]
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Both vectors for one event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventFeatures {
    pub crash: CrashFeatures,
    pub severity: SeverityFeatures,
}

/// Pure, stateless feature extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    interval: SampleInterval,
}

impl FeatureExtractor {
    /// Create an extractor with an explicit timestep policy
    pub fn new(interval: SampleInterval) -> Self {
        Self { interval }
    }

    /// Extractor used when classifying uploads (floored `dt`)
    pub fn inference() -> Self {
        Self::new(SampleInterval::Floored)
    }

    /// Extractor that reproduces training-time arithmetic exactly
    pub fn training_parity() -> Self {
        Self::new(SampleInterval::Raw)
    }

    /// Timestep policy in effect
    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    /// Compute the 8-value crash-detection vector.
    pub fn extract_crash_vector(&self, samples: &[RawSample]) -> Result<CrashFeatures> {
        let signal = Kinematics::compute(samples, self.interval)?;
        let mean = mean(&signal.accel);

        Ok(CrashFeatures([
            nan_max(signal.accel.iter().copied()),
            mean,
            sample_std(&signal.accel, mean),
            nan_max(signal.jerk.iter().copied()),
            nan_max(samples.iter().map(|s| s.gx.abs())),
            nan_max(samples.iter().map(|s| s.gy.abs())),
            nan_max(samples.iter().map(|s| s.gz.abs())),
            signal.energy(),
        ]))
    }

    /// Compute the 4-value severity vector.
    ///
    /// Independent of [`extract_crash_vector`](Self::extract_crash_vector);
    /// shared quantities are recomputed.
    pub fn extract_severity_vector(&self, samples: &[RawSample]) -> Result<SeverityFeatures> {
        let signal = Kinematics::compute(samples, self.interval)?;

        Ok(SeverityFeatures([
            nan_max(signal.accel.iter().copied()),
            nan_max(signal.jerk.iter().copied()),
            nan_max(samples.iter().map(|s| s.gx.abs())),
            signal.energy(),
        ]))
    }

    /// Compute both vectors for a validated series
    pub fn extract(&self, series: &RawEventSeries) -> Result<EventFeatures> {
        Ok(EventFeatures {
            crash: self.extract_crash_vector(series.samples())?,
            severity: self.extract_severity_vector(series.samples())?,
        })
    }
}

/// Intermediate quantities shared by both vectors
struct Kinematics {
    accel: Vec<f64>,
    jerk: Vec<f64>,
    dt: f64,
}

impl Kinematics {
    fn compute(samples: &[RawSample], interval: SampleInterval) -> Result<Self> {
        if samples.len() < MIN_EXTRACTION_SAMPLES {
            return Err(SignalError::InsufficientSamples {
                required: MIN_EXTRACTION_SAMPLES,
                actual: samples.len(),
            });
        }

        let accel: Vec<f64> = samples.iter().map(RawSample::accel_magnitude).collect();
        let dt = interval.resolve(mean_interval(samples));
        let jerk = accel.windows(2).map(|w| ((w[1] - w[0]) / dt).abs()).collect();

        Ok(Self { accel, jerk, dt })
    }

    fn energy(&self) -> f64 {
        self.accel.iter().map(|a| a * a).sum::<f64>() * self.dt
    }
}

/// Mean of consecutive timestamp differences
fn mean_interval(samples: &[RawSample]) -> f64 {
    let n = samples.len() - 1;
    samples.windows(2).map(|w| w[1].t - w[0].t).sum::<f64>() / n as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with one delta degree of freedom
fn sample_std(values: &[f64], mean: f64) -> f64 {
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Maximum that propagates NaN instead of skipping it
fn nan_max<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(f64::NEG_INFINITY, |acc, v| {
        if acc.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            acc.max(v)
        }
    })
}
