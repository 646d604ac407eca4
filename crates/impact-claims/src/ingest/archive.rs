//! Zip extraction with path confinement.
//!
//! Every entry is checked before anything is written: destinations are
//! normalized lexically against the extraction root and must stay below
//! it; symlink entries and archives over the configured limits are
//! rejected.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::{ImpactError, Result};

/// Unix file-type bits for a symbolic link
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Upper bounds on archive contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Maximum number of entries (files and directories)
    pub max_entries: usize,
    /// Maximum total uncompressed size in bytes
    pub max_uncompressed_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_uncompressed_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Summary of a completed extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Validating zip extractor
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    limits: ArchiveLimits,
}

/// Destination resolved for one entry during validation
struct PlannedEntry {
    index: usize,
    dest: PathBuf,
    is_dir: bool,
}

impl ArchiveExtractor {
    pub fn new(limits: ArchiveLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ArchiveLimits {
        &self.limits
    }

    /// Extract an in-memory archive into `root`
    pub fn extract_bytes(&self, bytes: &[u8], root: &Path) -> Result<ExtractionReport> {
        self.extract_reader(Cursor::new(bytes), root)
    }

    /// Validate all entries of `reader`, then extract them into `root`.
    ///
    /// On error nothing is written if validation failed; a failure during
    /// extraction may leave partial files, which the caller's workspace
    /// cleans up.
    pub fn extract_reader<R: Read + Seek>(&self, reader: R, root: &Path) -> Result<ExtractionReport> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| ImpactError::InvalidArchive(e.to_string()))?;

        let plan = self.validate(&mut archive, root)?;

        fs::create_dir_all(root)?;
        let mut report = ExtractionReport::default();
        let mut budget = self.limits.max_uncompressed_bytes;

        for entry in plan {
            if entry.is_dir {
                fs::create_dir_all(&entry.dest)?;
                report.directories += 1;
                continue;
            }

            if let Some(parent) = entry.dest.parent() {
                fs::create_dir_all(parent)?;
            }

            let file = archive
                .by_index(entry.index)
                .map_err(|e| ImpactError::InvalidArchive(e.to_string()))?;
            let mut out = File::create(&entry.dest)?;
            // Declared sizes can lie; cap what is actually inflated.
            let written = io::copy(&mut file.take(budget + 1), &mut out).map_err(|e| {
                if e.kind() == io::ErrorKind::InvalidData {
                    ImpactError::InvalidArchive(e.to_string())
                } else {
                    ImpactError::Io(e)
                }
            })?;
            if written > budget {
                return Err(ImpactError::UnsafeArchiveContent(format!(
                    "archive inflates beyond {} bytes",
                    self.limits.max_uncompressed_bytes
                )));
            }
            budget -= written;
            report.files += 1;
            report.bytes += written;
        }

        debug!(
            files = report.files,
            directories = report.directories,
            bytes = report.bytes,
            root = %root.display(),
            "Archive extracted"
        );
        Ok(report)
    }

    fn validate<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        root: &Path,
    ) -> Result<Vec<PlannedEntry>> {
        if archive.len() > self.limits.max_entries {
            return Err(ImpactError::UnsafeArchiveContent(format!(
                "archive has {} entries (limit {})",
                archive.len(),
                self.limits.max_entries
            )));
        }

        let mut declared: u64 = 0;
        let mut plan = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| ImpactError::InvalidArchive(e.to_string()))?;
            let name = entry.name().to_string();

            if entry
                .unix_mode()
                .map_or(false, |mode| mode & S_IFMT == S_IFLNK)
            {
                warn!(entry = %name, "Rejected symlink archive entry");
                return Err(ImpactError::UnsafeArchiveContent(format!(
                    "symlink entry '{}'",
                    name
                )));
            }

            let dest = resolve_entry_path(root, &name).ok_or_else(|| {
                warn!(entry = %name, "Rejected archive entry outside extraction root");
                ImpactError::UnsafeArchiveContent(format!(
                    "entry '{}' escapes the extraction root",
                    name
                ))
            })?;

            declared = declared.saturating_add(entry.size());
            if declared > self.limits.max_uncompressed_bytes {
                return Err(ImpactError::UnsafeArchiveContent(format!(
                    "archive declares more than {} uncompressed bytes",
                    self.limits.max_uncompressed_bytes
                )));
            }

            // The root itself ("./" style entries) needs no action.
            if dest == root {
                continue;
            }

            plan.push(PlannedEntry {
                index,
                is_dir: entry.is_dir(),
                dest,
            });
        }

        check_path_conflicts(&plan, root)?;
        Ok(plan)
    }
}

/// Reject plans where a file entry would have to double as a directory,
/// either as a parent of another entry or as an explicit directory entry.
fn check_path_conflicts(plan: &[PlannedEntry], root: &Path) -> Result<()> {
    let files: HashSet<&Path> = plan
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.dest.as_path())
        .collect();

    for entry in plan {
        if entry.is_dir && files.contains(entry.dest.as_path()) {
            return Err(ImpactError::InvalidArchive(format!(
                "'{}' is both a file and a directory",
                display_relative(&entry.dest, root)
            )));
        }

        let clash = entry
            .dest
            .ancestors()
            .skip(1)
            .take_while(|a| *a != root)
            .find(|a| files.contains(a));
        if let Some(parent) = clash {
            return Err(ImpactError::InvalidArchive(format!(
                "'{}' is a file but '{}' needs it as a directory",
                display_relative(parent, root),
                display_relative(&entry.dest, root)
            )));
        }
    }
    Ok(())
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Lexically resolve an entry name against `root`.
///
/// Returns `None` for absolute names, drive or root prefixes, and any name
/// whose `..` components climb above `root`. Backslashes are treated as
/// separators.
pub fn resolve_entry_path(root: &Path, name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => {
                let mut components = Path::new(other).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => parts.push(other),
                    _ => return None,
                }
            }
        }
    }

    let dest = parts.iter().fold(root.to_path_buf(), |acc, p| acc.join(p));
    dest.starts_with(root).then_some(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
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

    #[test]
    fn test_resolve_entry_path() {
        let root = Path::new("/srv/req");
        assert_eq!(resolve_entry_path(root, "imu.csv"), Some(root.join("imu.csv")));
        assert_eq!(
            resolve_entry_path(root, "event/./imu.csv"),
            Some(root.join("event/imu.csv"))
        );
        assert_eq!(resolve_entry_path(root, "a/../b.csv"), Some(root.join("b.csv")));
        assert_eq!(resolve_entry_path(root, "./"), Some(root.to_path_buf()));

        assert_eq!(resolve_entry_path(root, "../evil"), None);
        assert_eq!(resolve_entry_path(root, "a/../../evil"), None);
        assert_eq!(resolve_entry_path(root, "/etc/passwd"), None);
        assert_eq!(resolve_entry_path(root, "..\\..\\evil"), None);
    }

    #[test]
    fn test_extracts_nested_files() {
        let dir = tempdir().unwrap();
        let bytes = build_zip(&[("event/", b""), ("event/imu.csv", b"t,ax\n"), ("readme.txt", b"hi")]);
        let report = ArchiveExtractor::default()
            .extract_bytes(&bytes, dir.path())
            .unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 1);
        assert_eq!(fs::read(dir.path().join("event/imu.csv")).unwrap(), b"t,ax\n");
    }

    #[test]
    fn test_traversal_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let bytes = build_zip(&[("ok.txt", b"fine"), ("../escape.txt", b"bad")]);

        let err = ArchiveExtractor::default()
            .extract_bytes(&bytes, &root)
            .unwrap_err();
        assert!(matches!(err, ImpactError::UnsafeArchiveContent(_)));
        assert!(!root.join("ok.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempdir().unwrap();
        let err = ArchiveExtractor::default()
            .extract_bytes(b"definitely not a zip", dir.path())
            .unwrap_err();
        assert!(matches!(err, ImpactError::InvalidArchive(_)));
    }

    #[test]
    fn test_entry_limit() {
        let dir = tempdir().unwrap();
        let bytes = build_zip(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
        let extractor = ArchiveExtractor::new(ArchiveLimits {
            max_entries: 2,
            ..Default::default()
        });
        assert!(matches!(
            extractor.extract_bytes(&bytes, dir.path()),
            Err(ImpactError::UnsafeArchiveContent(_))
        ));
    }

    #[test]
    fn test_size_limit() {
        let dir = tempdir().unwrap();
        let big = vec![b'x'; 4096];
        let bytes = build_zip(&[("big.bin", &big)]);
        let extractor = ArchiveExtractor::new(ArchiveLimits {
            max_uncompressed_bytes: 1024,
            ..Default::default()
        });
        assert!(matches!(
            extractor.extract_bytes(&bytes, dir.path()),
            Err(ImpactError::UnsafeArchiveContent(_))
        ));
    }

    #[test]
    fn test_symlink_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_symlink("link", "/etc/passwd", FileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            ArchiveExtractor::default().extract_bytes(&bytes, dir.path()),
            Err(ImpactError::UnsafeArchiveContent(_))
        ));
    }

    #[test]
    fn test_file_used_as_directory_rejected() {
        let dir = tempdir().unwrap();
        let bytes = build_zip(&[("a", b"x"), ("a/imu.csv", b"t,ax\n")]);
        let err = ArchiveExtractor::default()
            .extract_bytes(&bytes, dir.path())
            .unwrap_err();
        assert!(matches!(err, ImpactError::InvalidArchive(ref m) if m.contains("'a'")));
        assert!(err.is_client_error());
        // rejected during validation, so nothing was written
        assert!(!dir.path().join("a").exists());

        let bytes = build_zip(&[("event/imu.csv", b"t\n"), ("event/imu.csv/", b"")]);
        let err = ArchiveExtractor::default()
            .extract_bytes(&bytes, dir.path())
            .unwrap_err();
        assert!(matches!(err, ImpactError::InvalidArchive(_)));
    }
}
