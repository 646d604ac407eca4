//! Event directory resolution.
//!
//! An extracted upload holds either the event files at its root, or one
//! folder containing them. Anything else is ambiguous.

use std::fs;
use std::path::{Path, PathBuf};

use impact_signal::IMU_FILE;

use crate::{ImpactError, Result};

/// How the event directory was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLayout {
    /// Data file at the extraction root
    Flat,
    /// Data file inside the single top-level folder
    Nested { folder: String },
}

/// Resolved event directory, guaranteed to contain the data file at the
/// time of resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRoot {
    path: PathBuf,
    layout: EventLayout,
}

impl EventRoot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &EventLayout {
        &self.layout
    }

    /// Path of the sensor table
    pub fn imu_path(&self) -> PathBuf {
        self.path.join(IMU_FILE)
    }
}

/// Resolver states
enum Resolution {
    CheckRoot,
    ScanFolders,
    Found(EventRoot),
    Ambiguous(String),
}

/// Finds the event directory inside an extraction root
#[derive(Debug, Clone)]
pub struct EventLocator {
    data_file: String,
}

impl Default for EventLocator {
    fn default() -> Self {
        Self {
            data_file: IMU_FILE.to_string(),
        }
    }
}

impl EventLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the event directory.
    ///
    /// 1. data file at `root` → [`EventLayout::Flat`]
    /// 2. exactly one immediate subdirectory, containing the data file →
    ///    [`EventLayout::Nested`]
    /// 3. otherwise [`ImpactError::EventLayoutAmbiguous`]
    pub fn resolve(&self, root: &Path) -> Result<EventRoot> {
        let mut state = Resolution::CheckRoot;
        loop {
            state = match state {
                Resolution::CheckRoot => {
                    if root.join(&self.data_file).is_file() {
                        Resolution::Found(EventRoot {
                            path: root.to_path_buf(),
                            layout: EventLayout::Flat,
                        })
                    } else {
                        Resolution::ScanFolders
                    }
                }
                Resolution::ScanFolders => self.scan_folders(root)?,
                Resolution::Found(event) => {
                    tracing::debug!(path = %event.path.display(), layout = ?event.layout, "Event located");
                    return Ok(event);
                }
                Resolution::Ambiguous(reason) => {
                    return Err(ImpactError::EventLayoutAmbiguous(reason));
                }
            };
        }
    }

    fn scan_folders(&self, root: &Path) -> Result<Resolution> {
        let mut folders: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(entry.path());
            }
        }
        folders.sort();

        Ok(match folders.as_slice() {
            [] => Resolution::Ambiguous(format!(
                "{} not found at archive root and no folder present",
                self.data_file
            )),
            [only] => {
                let folder = only
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if only.join(&self.data_file).is_file() {
                    Resolution::Found(EventRoot {
                        path: only.clone(),
                        layout: EventLayout::Nested { folder },
                    })
                } else {
                    Resolution::Ambiguous(format!(
                        "folder '{}' does not contain {}",
                        folder, self.data_file
                    ))
                }
            }
            many => Resolution::Ambiguous(format!(
                "{} not found at archive root and {} folders present ({})",
                self.data_file,
                many.len(),
                many.iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        })
    }
}
