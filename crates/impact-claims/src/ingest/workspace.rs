//! Per-request workspace under `<storage>/events/`.
//!
//! Each upload gets `<events>/<request-id>/` holding the raw upload and an
//! `extracted/` tree. The directory is removed when the workspace is
//! dropped, unless it was retained under a claim id.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Name of the stored upload inside a workspace
pub const UPLOAD_FILE: &str = "event.zip";

/// Name of the extraction root inside a workspace
pub const EXTRACTED_DIR: &str = "extracted";

/// Workspace directory owned by one request
#[derive(Debug)]
pub struct RequestWorkspace {
    request_id: Uuid,
    events_dir: PathBuf,
    dir: PathBuf,
    retained: bool,
}

impl RequestWorkspace {
    /// Create a fresh workspace below `events_dir`
    pub fn create<P: AsRef<Path>>(events_dir: P) -> io::Result<Self> {
        let events_dir = events_dir.as_ref().to_path_buf();
        let request_id = Uuid::new_v4();
        let dir = events_dir.join(request_id.to_string());

        fs::create_dir_all(dir.join(EXTRACTED_DIR)).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to create workspace directory {}: {}", dir.display(), e),
            )
        })?;

        Ok(Self {
            request_id,
            events_dir,
            dir,
            retained: false,
        })
    }

    pub fn request_id(&self) -> &Uuid {
        &self.request_id
    }

    /// Workspace directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where archive contents are extracted
    pub fn extraction_root(&self) -> PathBuf {
        self.dir.join(EXTRACTED_DIR)
    }

    /// Store the raw upload
    pub fn write_upload(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.join(UPLOAD_FILE);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Keep the workspace, renamed to `<events>/<name>`.
    ///
    /// Returns the new location. If the rename fails the workspace is
    /// still retained at its request-id path.
    pub fn retain_as(mut self, name: &str) -> io::Result<PathBuf> {
        self.retained = true;
        let target = self.events_dir.join(name);
        fs::rename(&self.dir, &target)?;
        Ok(target)
    }

    /// Remove the workspace now (idempotent)
    pub fn cleanup(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        if !self.retained {
            if let Err(e) = self.cleanup() {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to remove workspace");
            }
        }
    }
}
