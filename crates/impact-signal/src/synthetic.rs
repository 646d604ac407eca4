//! Synthetic crash-event generator.
//!
//! Produces a gravity-plus-noise baseline and, for crash labels, injects a
//! Hann-shaped spike into `ax` and `gx`. Used to create labelled fixtures
//! and smoke-test data.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::imu::{self, EventLabel, EventMetadata};
use crate::sample::{RawEventSeries, RawSample};
use crate::Result;

/// Standard gravity used for the `az` baseline (m/s^2)
pub const GRAVITY: f64 = 9.81;

/// Class of event to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticLabel {
    NoCrash,
    Light,
    Heavy,
}

impl SyntheticLabel {
    /// Peak acceleration added to `ax` at the impact (m/s^2)
    pub fn spike_amplitude(&self) -> f64 {
        match self {
            SyntheticLabel::NoCrash => 0.0,
            SyntheticLabel::Light => 6.0,
            SyntheticLabel::Heavy => 18.0,
        }
    }

    /// Ground-truth label as written to `label.json`
    pub fn label(&self) -> EventLabel {
        let (crash, severity) = match self {
            SyntheticLabel::NoCrash => (0, "none"),
            SyntheticLabel::Light => (1, "light"),
            SyntheticLabel::Heavy => (1, "heavy"),
        };
        EventLabel {
            crash,
            severity: severity.to_string(),
        }
    }
}

/// Generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticEventConfig {
    /// Sampling rate (Hz)
    pub sampling_hz: f64,
    /// Recording length (s)
    pub duration_s: f64,
    /// Impact onset (s)
    pub impact_at_s: f64,
    /// Accelerometer noise standard deviation (m/s^2)
    pub accel_noise_std: f64,
    /// Gyroscope noise standard deviation (rad/s)
    pub gyro_noise_std: f64,
    /// Length of the acceleration spike window (samples)
    pub accel_spike_len: usize,
    /// Length of the angular-rate spike window (samples)
    pub gyro_spike_len: usize,
}

impl Default for SyntheticEventConfig {
    fn default() -> Self {
        Self {
            sampling_hz: 200.0,
            duration_s: 5.0,
            impact_at_s: 2.5,
            accel_noise_std: 0.2,
            gyro_noise_std: 0.5,
            accel_spike_len: 10,
            gyro_spike_len: 20,
        }
    }
}

impl SyntheticEventConfig {
    /// Disable all noise; output becomes a pure function of the label
    pub fn noiseless(mut self) -> Self {
        self.accel_noise_std = 0.0;
        self.gyro_noise_std = 0.0;
        self
    }

    /// Number of samples on the `[0, duration)` grid
    pub fn sample_count(&self) -> usize {
        (self.duration_s * self.sampling_hz).ceil().max(0.0) as usize
    }
}

/// Seedable event generator
pub struct SyntheticEventGenerator {
    config: SyntheticEventConfig,
    rng: StdRng,
}

impl SyntheticEventGenerator {
    /// Create a generator; `None` seeds from entropy
    pub fn new(config: SyntheticEventConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Generator settings
    pub fn config(&self) -> &SyntheticEventConfig {
        &self.config
    }

    /// Generate one event
    pub fn generate(&mut self, label: SyntheticLabel) -> Result<RawEventSeries> {
        let n = self.config.sample_count();
        let dt = 1.0 / self.config.sampling_hz;
        let (a_std, g_std) = (self.config.accel_noise_std, self.config.gyro_noise_std);

        let mut samples: Vec<RawSample> = (0..n)
            .map(|i| {
                RawSample::new(
                    i as f64 * dt,
                    [
                        self.noise(a_std),
                        self.noise(a_std),
                        GRAVITY + self.noise(a_std),
                    ],
                    [self.noise(g_std), self.noise(g_std), self.noise(g_std)],
                )
            })
            .collect();

        let amp = label.spike_amplitude();
        if amp > 0.0 {
            let start = (self.config.impact_at_s * self.config.sampling_hz) as usize;
            add_window(&mut samples, start, self.config.accel_spike_len, amp, |s| &mut s.ax);
            add_window(&mut samples, start, self.config.gyro_spike_len, amp / 3.0, |s| &mut s.gx);
        }

        RawEventSeries::new(samples)
    }

    /// Generate one event and write `imu.csv`, `meta.json` and
    /// `label.json` into `dir` (created if needed).
    pub fn write_event<P: AsRef<Path>>(
        &mut self,
        dir: P,
        label: SyntheticLabel,
    ) -> Result<RawEventSeries> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let series = self.generate(label)?;
        imu::write_imu_csv(dir.join(imu::IMU_FILE), series.samples())?;

        EventMetadata {
            sampling_hz: Some(self.config.sampling_hz),
            duration_s: Some(self.config.duration_s),
            source: Some("synthetic".to_string()),
            ..Default::default()
        }
        .write_to_dir(dir)?;
        label.label().write_to_dir(dir)?;

        tracing::debug!(dir = %dir.display(), ?label, "Wrote synthetic event");
        Ok(series)
    }

    fn noise(&mut self, std: f64) -> f64 {
        if std > 0.0 {
            let z: f64 = self.rng.sample(StandardNormal);
            std * z
        } else {
            0.0
        }
    }
}

/// Symmetric Hann window of length `n` (endpoints are zero)
pub fn hann_window(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n)
            .map(|k| {
                0.5 - 0.5 * (2.0 * std::f64::consts::PI * k as f64 / (n - 1) as f64).cos()
            })
            .collect(),
    }
}

fn add_window<F>(samples: &mut [RawSample], start: usize, len: usize, amp: f64, channel: F)
where
    F: Fn(&mut RawSample) -> &mut f64,
{
    for (sample, w) in samples.iter_mut().skip(start).zip(hann_window(len)) {
        *channel(sample) += amp * w;
    }
}
