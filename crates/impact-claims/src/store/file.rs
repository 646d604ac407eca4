//! File-backed claim store: one JSON document per claim.
//!
//! Layout: `<results>/<claim-id>.json`. Writes go to a hidden temp file
//! that is fsynced and renamed into place, so readers never observe a
//! partial claim.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{ClaimReservation, ClaimStore};
use crate::domain::{Claim, ClaimId, ClassificationResult};
use crate::{ImpactError, Result};

const CLAIM_EXT: &str = "json";

/// Claim store persisting to a results directory
#[derive(Debug, Clone)]
pub struct FileClaimStore {
    dir: PathBuf,
}

impl FileClaimStore {
    /// Store rooted at `dir` (created lazily on first commit)
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn claim_path(&self, id: &ClaimId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, CLAIM_EXT))
    }

    fn temp_path(&self, id: &ClaimId) -> PathBuf {
        self.dir.join(format!(".{}.{}.tmp", id, CLAIM_EXT))
    }

    fn write_atomically(&self, claim: &Claim) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let final_path = self.claim_path(&claim.claim_id);
        if final_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", final_path.display()),
            ));
        }

        let tmp_path = self.temp_path(&claim.claim_id);
        let body = serde_json::to_vec_pretty(claim)?;

        let written = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp_path)?;
            file.write_all(&body)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &final_path)?;
            sync_dir(&self.dir)
        })();

        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl ClaimStore for FileClaimStore {
    fn commit(&self, reservation: ClaimReservation, result: ClassificationResult) -> Result<Claim> {
        let claim = Claim::new(reservation.into_id(), result);
        self.write_atomically(&claim).map_err(|e| {
            ImpactError::PersistenceFailed(format!("claim {}: {}", claim.claim_id, e))
        })?;
        debug!(claim_id = %claim.claim_id, "Claim committed");
        Ok(claim)
    }

    fn get_claim(&self, claim_id: &ClaimId) -> Result<Claim> {
        let path = self.claim_path(claim_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ImpactError::NotFound(claim_id.to_string()))
            }
            Err(e) => return Err(ImpactError::Io(e)),
        };
        serde_json::from_reader(io::BufReader::new(file)).map_err(|e| {
            ImpactError::PersistenceFailed(format!("claim {} unreadable: {}", claim_id, e))
        })
    }

    fn list(&self) -> Result<Vec<ClaimId>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ImpactError::Io(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CLAIM_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            match ClaimId::parse(stem) {
                Some(id) => ids.push(id),
                None => warn!(file = %path.display(), "Ignoring unrecognised file in results directory"),
            }
        }

        ids.sort_by_key(|id| id.to_string());
        Ok(ids)
    }
}
