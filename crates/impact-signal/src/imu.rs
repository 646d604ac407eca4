//! Event directory files: `imu.csv`, `meta.json` and `label.json`.
//!
//! `imu.csv` must carry a header with at least the columns in
//! [`REQUIRED_COLUMNS`]; column order is free and extra columns are
//! ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sample::{RawEventSeries, RawSample};
use crate::{Result, SignalError};

/// Sensor table inside an event directory
pub const IMU_FILE: &str = "imu.csv";

/// Optional recording metadata inside an event directory
pub const META_FILE: &str = "meta.json";

/// Ground-truth label written alongside synthetic events
pub const LABEL_FILE: &str = "label.json";

/// Columns every sensor table must contain
pub const REQUIRED_COLUMNS: [&str; 7] = ["t", "ax", "ay", "az", "gx", "gy", "gz"];

/// Read and validate `imu.csv` from a path.
pub fn read_imu_csv<P: AsRef<Path>>(path: P) -> Result<RawEventSeries> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let samples = parse_imu_csv(file)?;
    tracing::debug!(path = %path.display(), samples = samples.len(), "Read sensor table");
    RawEventSeries::new(samples)
}

/// Parse sensor rows from any reader without applying series invariants.
pub fn parse_imu_csv<R: Read>(reader: R) -> Result<Vec<RawSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| SignalError::malformed(format!("unreadable header: {}", e)))?
        .clone();

    let mut index = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h == column) {
            Some(pos) => *slot = pos,
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        return Err(SignalError::malformed(format!(
            "{} missing columns: [{}]; found [{}]",
            IMU_FILE,
            missing.join(", "),
            headers.iter().collect::<Vec<_>>().join(", ")
        )));
    }

    let mut samples = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record =
            record.map_err(|e| SignalError::malformed(format!("row {}: {}", row + 1, e)))?;

        let mut values = [0.0f64; REQUIRED_COLUMNS.len()];
        for (value, (&col, name)) in values.iter_mut().zip(index.iter().zip(REQUIRED_COLUMNS)) {
            let raw = record.get(col).unwrap_or_default();
            *value = raw.parse::<f64>().map_err(|_| {
                SignalError::malformed(format!(
                    "row {}: column '{}' value '{}' is not a number",
                    row + 1,
                    name,
                    raw
                ))
            })?;
        }

        let [t, ax, ay, az, gx, gy, gz] = values;
        samples.push(RawSample { t, ax, ay, az, gx, gy, gz });
    }

    Ok(samples)
}

/// Write samples as `imu.csv` with the canonical column order.
pub fn write_imu_csv<P: AsRef<Path>>(path: P, samples: &[RawSample]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for sample in samples {
        wtr.serialize(sample)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Recording metadata stored as `meta.json`.
///
/// Informational only; it never changes classification. Unknown keys are
/// preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_hz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EventMetadata {
    /// Read `meta.json` from an event directory, if present.
    pub fn read_from_dir<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let path = dir.as_ref().join(META_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let meta = serde_json::from_reader(File::open(&path)?)?;
        Ok(Some(meta))
    }

    /// Write `meta.json` into an event directory
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let file = File::create(dir.as_ref().join(META_FILE))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Ground-truth label stored as `label.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLabel {
    /// 1 for a crash, 0 otherwise
    pub crash: u8,
    /// `"none"`, `"light"` or `"heavy"`
    pub severity: String,
}

impl EventLabel {
    /// Read `label.json` from an event directory, if present.
    pub fn read_from_dir<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let path = dir.as_ref().join(LABEL_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_reader(File::open(&path)?)?))
    }

    /// Write `label.json` into an event directory
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let file = File::create(dir.as_ref().join(LABEL_FILE))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
