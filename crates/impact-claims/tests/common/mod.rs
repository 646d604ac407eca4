//! Shared fixtures for the impact-claims integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use impact_claims::{
    ClassifierGateway, FileClaimStore, ImpactConfig, InferenceOrchestrator,
};
use impact_claims::ml::{CRASH_MODEL_FILE, SEVERITY_MODEL_FILE};
use impact_signal::{
    SyntheticEventConfig, SyntheticEventGenerator, SyntheticLabel, IMU_FILE, META_FILE,
};
use serde_json::json;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Emergency contact configured for every test service
pub const CONTACT: &str = "112";

/// Single-stump forest over `max_accel`: quiet events sit at 9.81, light
/// crashes peak near 11.4 and heavy crashes near 20.
pub fn crash_forest() -> serde_json::Value {
    json!({
        "classes": [0, 1],
        "n_features": 8,
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 10.8, "left": 1, "right": 2 },
                { "value": [40.0, 0.0] },
                { "value": [0.0, 35.0] }
            ] }
        ]
    })
}

/// Single-stump severity forest over `max_accel`
pub fn severity_forest() -> serde_json::Value {
    json!({
        "classes": [0, 1],
        "n_features": 4,
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 15.0, "left": 1, "right": 2 },
                { "value": [20.0, 0.0] },
                { "value": [0.0, 15.0] }
            ] }
        ]
    })
}

/// Write both artifacts into `dir`
pub fn write_models(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join(CRASH_MODEL_FILE),
        serde_json::to_vec_pretty(&crash_forest()).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join(SEVERITY_MODEL_FILE),
        serde_json::to_vec_pretty(&severity_forest()).unwrap(),
    )
    .unwrap();
}

/// A storage root plus models directory for one test
pub struct TestService {
    pub root: TempDir,
    pub config: ImpactConfig,
    pub orchestrator: Arc<InferenceOrchestrator>,
}

impl TestService {
    /// Service with valid models installed
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Service whose models directory is empty
    pub fn without_models() -> Self {
        Self::build(false)
    }

    fn build(with_models: bool) -> Self {
        let root = tempfile::tempdir().unwrap();
        let models = root.path().join("models");
        if with_models {
            write_models(&models);
        }

        let config = ImpactConfig::builder()
            .storage_dir(root.path().join("storage"))
            .models_dir(&models)
            .emergency_contacts([CONTACT])
            .build();

        let gateway = Arc::new(ClassifierGateway::from_models_dir(&config.models_dir));
        let store = Arc::new(FileClaimStore::new(config.results_dir()));
        let orchestrator = Arc::new(InferenceOrchestrator::new(&config, gateway, store));

        Self {
            root,
            config,
            orchestrator,
        }
    }

    /// Entries currently under `<storage>/events`
    pub fn event_dirs(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.config.events_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// `imu.csv` and `meta.json` contents for a noiseless synthetic event
pub fn event_files(label: SyntheticLabel) -> (Vec<u8>, Vec<u8>) {
    let dir = tempfile::tempdir().unwrap();
    let mut gen = SyntheticEventGenerator::new(SyntheticEventConfig::default().noiseless(), Some(0));
    gen.write_event(dir.path(), label).unwrap();
    (
        std::fs::read(dir.path().join(IMU_FILE)).unwrap(),
        std::fs::read(dir.path().join(META_FILE)).unwrap(),
    )
}

/// Zip with the event files at the archive root
pub fn flat_event_zip(label: SyntheticLabel) -> Vec<u8> {
    let (imu, meta) = event_files(label);
    build_zip(&[(IMU_FILE, &imu), (META_FILE, &meta)])
}

/// Zip with the event files inside one folder
pub fn nested_event_zip(folder: &str, label: SyntheticLabel) -> Vec<u8> {
    let (imu, meta) = event_files(label);
    let imu_name = format!("{}/{}", folder, IMU_FILE);
    let meta_name = format!("{}/{}", folder, META_FILE);
    build_zip(&[(&imu_name, &imu), (&meta_name, &meta)])
}

/// Build an archive from `(name, contents)` pairs; names ending in `/`
/// become directory entries.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, FileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
