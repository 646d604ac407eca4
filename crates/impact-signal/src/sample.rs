//! Raw inertial samples and validated event series.

use serde::{Deserialize, Serialize};

use crate::{Result, SignalError};

/// Minimum number of samples an event recording must contain.
pub const MIN_EVENT_SAMPLES: usize = 10;

/// One timestamped six-axis IMU reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Time in seconds
    pub t: f64,
    /// Linear acceleration, x axis (m/s^2)
    pub ax: f64,
    /// Linear acceleration, y axis (m/s^2)
    pub ay: f64,
    /// Linear acceleration, z axis (m/s^2)
    pub az: f64,
    /// Angular rate, x axis (rad/s)
    pub gx: f64,
    /// Angular rate, y axis (rad/s)
    pub gy: f64,
    /// Angular rate, z axis (rad/s)
    pub gz: f64,
}

impl RawSample {
    /// Create a new sample
    pub fn new(t: f64, accel: [f64; 3], gyro: [f64; 3]) -> Self {
        Self {
            t,
            ax: accel[0],
            ay: accel[1],
            az: accel[2],
            gx: gyro[0],
            gy: gyro[1],
            gz: gyro[2],
        }
    }

    /// Euclidean norm of the linear-acceleration channels
    #[inline]
    pub fn accel_magnitude(&self) -> f64 {
        (self.ax * self.ax + self.ay * self.ay + self.az * self.az).sqrt()
    }

    /// All seven channels in column order `t, ax, ay, az, gx, gy, gz`
    pub fn channels(&self) -> [f64; 7] {
        [self.t, self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }

    fn is_finite(&self) -> bool {
        self.channels().iter().all(|v| v.is_finite())
    }
}

/// An ordered, validated recording of one candidate impact event.
///
/// Invariants, checked on construction:
/// - at least [`MIN_EVENT_SAMPLES`] samples
/// - timestamps are non-decreasing
/// - every channel value is finite
#[derive(Debug, Clone, PartialEq)]
pub struct RawEventSeries {
    samples: Vec<RawSample>,
}

impl RawEventSeries {
    /// Validate and wrap a sample sequence.
    pub fn new(samples: Vec<RawSample>) -> Result<Self> {
        if samples.len() < MIN_EVENT_SAMPLES {
            return Err(SignalError::InsufficientSamples {
                required: MIN_EVENT_SAMPLES,
                actual: samples.len(),
            });
        }

        if let Some(row) = samples.iter().position(|s| !s.is_finite()) {
            return Err(SignalError::malformed(format!(
                "non-finite value in sample {}",
                row
            )));
        }

        if let Some(i) = samples.windows(2).position(|w| w[1].t < w[0].t) {
            return Err(SignalError::malformed(format!(
                "timestamps decrease between samples {} and {} ({} -> {})",
                i,
                i + 1,
                samples[i].t,
                samples[i + 1].t
            )));
        }

        Ok(Self { samples })
    }

    /// Borrow the samples in time order
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a validated series; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording span from first to last timestamp, in seconds
    pub fn duration_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }

    /// Nominal sampling rate derived from the span; `None` when all
    /// timestamps coincide.
    pub fn nominal_rate_hz(&self) -> Option<f64> {
        let span = self.duration_s();
        if span > 0.0 {
            Some((self.samples.len() - 1) as f64 / span)
        } else {
            None
        }
    }
}

impl AsRef<[RawSample]> for RawEventSeries {
    fn as_ref(&self) -> &[RawSample] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(n: usize, rate_hz: f64) -> Vec<RawSample> {
        (0..n)
            .map(|i| RawSample::new(i as f64 / rate_hz, [0.0, 0.0, 9.81], [0.0; 3]))
            .collect()
    }

    #[test]
    fn test_accel_magnitude() {
        let s = RawSample::new(0.0, [3.0, 4.0, 0.0], [0.0; 3]);
        assert!((s.accel_magnitude() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_requires_minimum_samples() {
        let err = RawEventSeries::new(quiet(9, 100.0)).unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientSamples { required: 10, actual: 9 }
        ));
        assert!(RawEventSeries::new(quiet(10, 100.0)).is_ok());
    }

    #[test]
    fn test_series_rejects_decreasing_time() {
        let mut samples = quiet(20, 100.0);
        samples[7].t = 0.0;
        let err = RawEventSeries::new(samples).unwrap_err();
        assert!(matches!(err, SignalError::MalformedEventData(_)));
    }

    #[test]
    fn test_series_accepts_repeated_timestamps() {
        let samples: Vec<_> = (0..12)
            .map(|_| RawSample::new(1.0, [0.0, 0.0, 9.81], [0.0; 3]))
            .collect();
        let series = RawEventSeries::new(samples).unwrap();
        assert_eq!(series.duration_s(), 0.0);
        assert!(series.nominal_rate_hz().is_none());
    }

    #[test]
    fn test_series_rejects_non_finite() {
        let mut samples = quiet(15, 100.0);
        samples[3].gy = f64::NAN;
        assert!(matches!(
            RawEventSeries::new(samples),
            Err(SignalError::MalformedEventData(_))
        ));
    }

    #[test]
    fn test_nominal_rate() {
        let series = RawEventSeries::new(quiet(201, 200.0)).unwrap();
        let rate = series.nominal_rate_hz().unwrap();
        assert!((rate - 200.0).abs() < 1e-9);
        assert!((series.duration_s() - 1.0).abs() < 1e-12);
    }
}
