//! Phyphox sensor export alignment.
//!
//! Phyphox writes one CSV per sensor. The accelerometer timeline becomes
//! the event timeline (rebased to zero) and gyroscope channels are
//! linearly interpolated onto it, holding endpoint values outside the
//! gyroscope's time range.

use std::io::Read;

use crate::sample::RawSample;
use crate::{Result, SignalError};

/// Accelerometer export entry name
pub const ACCELEROMETER_FILE: &str = "Accelerometer.csv";

/// Gyroscope export entry name
pub const GYROSCOPE_FILE: &str = "Gyroscope.csv";

const TIME_COLUMN: &str = "Time (s)";
const ACCEL_COLUMNS: [&str; 3] = [
    "Acceleration x (m/s^2)",
    "Acceleration y (m/s^2)",
    "Acceleration z (m/s^2)",
];
const GYRO_COLUMNS: [&str; 3] = [
    "Gyroscope x (rad/s)",
    "Gyroscope y (rad/s)",
    "Gyroscope z (rad/s)",
];

/// One sensor stream: time plus three channels, sorted and de-duplicated
#[derive(Debug, Clone, PartialEq)]
pub struct SensorStream {
    pub time: Vec<f64>,
    pub channels: [Vec<f64>; 3],
}

impl SensorStream {
    fn parse<R: Read>(reader: R, source: &str, columns: &[&str; 3]) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| SignalError::malformed(format!("{}: unreadable header: {}", source, e)))?
            .clone();

        let wanted = [TIME_COLUMN, columns[0], columns[1], columns[2]];
        let mut index = [0usize; 4];
        for (slot, name) in index.iter_mut().zip(wanted) {
            *slot = headers.iter().position(|h| h == name).ok_or_else(|| {
                SignalError::malformed(format!("{}: missing column '{}'", source, name))
            })?;
        }

        let mut rows: Vec<[f64; 4]> = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| SignalError::malformed(format!("{}: row {}: {}", source, row + 1, e)))?;
            let mut values = [0.0; 4];
            for (value, &col) in values.iter_mut().zip(index.iter()) {
                let raw = record.get(col).unwrap_or_default();
                *value = raw.parse().map_err(|_| {
                    SignalError::malformed(format!(
                        "{}: row {}: '{}' is not a number",
                        source,
                        row + 1,
                        raw
                    ))
                })?;
            }
            rows.push(values);
        }

        // Stable sort keeps the first occurrence of each timestamp first.
        rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
        rows.dedup_by(|b, a| a[0] == b[0]);

        if rows.is_empty() {
            return Err(SignalError::malformed(format!("{}: no samples", source)));
        }

        Ok(Self {
            time: rows.iter().map(|r| r[0]).collect(),
            channels: [
                rows.iter().map(|r| r[1]).collect(),
                rows.iter().map(|r| r[2]).collect(),
                rows.iter().map(|r| r[3]).collect(),
            ],
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Parsed accelerometer and gyroscope exports
#[derive(Debug, Clone)]
pub struct PhyphoxExport {
    pub accelerometer: SensorStream,
    pub gyroscope: SensorStream,
}

impl PhyphoxExport {
    /// Parse both sensor tables
    pub fn from_readers<A: Read, G: Read>(accelerometer: A, gyroscope: G) -> Result<Self> {
        Ok(Self {
            accelerometer: SensorStream::parse(accelerometer, ACCELEROMETER_FILE, &ACCEL_COLUMNS)?,
            gyroscope: SensorStream::parse(gyroscope, GYROSCOPE_FILE, &GYRO_COLUMNS)?,
        })
    }

    /// Merge onto the accelerometer timeline, rebased so the first sample
    /// is at `t = 0`.
    pub fn align(&self) -> Vec<RawSample> {
        let acc = &self.accelerometer;
        let gyro = &self.gyroscope;
        let t0 = acc.time[0];
        let gyro_t: Vec<f64> = gyro.time.iter().map(|t| t - t0).collect();

        acc.time
            .iter()
            .enumerate()
            .map(|(i, &t_abs)| {
                let t = t_abs - t0;
                RawSample::new(
                    t,
                    [acc.channels[0][i], acc.channels[1][i], acc.channels[2][i]],
                    [
                        interp_clamped(t, &gyro_t, &gyro.channels[0]),
                        interp_clamped(t, &gyro_t, &gyro.channels[1]),
                        interp_clamped(t, &gyro_t, &gyro.channels[2]),
                    ],
                )
            })
            .collect()
    }
}

/// Piecewise-linear interpolation over increasing `xp`, holding the first
/// and last `fp` values outside the range.
pub fn interp_clamped(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let (Some(&x_first), Some(&x_last)) = (xp.first(), xp.last()) else {
        return f64::NAN;
    };
    if x <= x_first {
        return fp[0];
    }
    if x >= x_last {
        return fp[fp.len() - 1];
    }

    // First index with xp[hi] > x; guaranteed in 1..len by the checks above.
    let hi = xp.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let frac = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + frac * (fp[hi] - fp[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ACC: &str = "Time (s),Acceleration x (m/s^2),Acceleration y (m/s^2),Acceleration z (m/s^2)\n\
        10.2,3,0,9.8\n\
        10.0,1,0,9.8\n\
        10.1,2,0,9.8\n\
        10.1,99,99,99\n\
        10.3,4,0,9.8\n";

    const GYRO: &str = "Time (s),Gyroscope x (rad/s),Gyroscope y (rad/s),Gyroscope z (rad/s)\n\
        10.05,0,1,5\n\
        10.25,2,1,7\n";

    #[test]
    fn test_sort_and_dedup() {
        let export = PhyphoxExport::from_readers(ACC.as_bytes(), GYRO.as_bytes()).unwrap();
        assert_eq!(export.accelerometer.time, vec![10.0, 10.1, 10.2, 10.3]);
        assert_eq!(export.accelerometer.channels[0], vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_align_rebases_and_interpolates() {
        let export = PhyphoxExport::from_readers(ACC.as_bytes(), GYRO.as_bytes()).unwrap();
        let samples = export.align();

        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].t, 0.0);
        // before gyro range: held at first value
        assert_eq!(samples[0].gx, 0.0);
        assert_eq!(samples[0].gz, 5.0);
        // 10.1 is a quarter of the way from 10.05 to 10.25
        assert_relative_eq!(samples[1].gx, 0.5, epsilon = 1e-9);
        assert_relative_eq!(samples[2].gz, 6.5, epsilon = 1e-9);
        // after gyro range: held at last value
        assert_eq!(samples[3].gx, 2.0);
        assert_relative_eq!(samples[3].t, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_column() {
        let gyro = "Time (s),Gyroscope x (rad/s)\n0,1\n";
        let err = PhyphoxExport::from_readers(ACC.as_bytes(), gyro.as_bytes()).unwrap_err();
        assert!(matches!(err, SignalError::MalformedEventData(ref m) if m.contains("Gyroscope y")));
    }

    #[test]
    fn test_interp_clamped() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 0.0];
        assert_eq!(interp_clamped(-1.0, &xp, &fp), 0.0);
        assert_eq!(interp_clamped(1.0, &xp, &fp), 10.0);
        assert_relative_eq!(interp_clamped(1.5, &xp, &fp), 5.0);
        assert_eq!(interp_clamped(3.0, &xp, &fp), 0.0);
    }
}
