//! Archive ingestion and event directory resolution.
//!
//! An upload flows through three collaborators:
//!
//! 1. [`RequestWorkspace`] creates a private directory for the request
//! 2. [`ArchiveExtractor`] validates every entry, then extracts
//! 3. [`EventLocator`] resolves the directory holding `imu.csv`

mod archive;
mod locator;
mod workspace;

pub use archive::{resolve_entry_path, ArchiveExtractor, ArchiveLimits, ExtractionReport};
pub use locator::{EventLayout, EventLocator, EventRoot};
pub use workspace::{RequestWorkspace, EXTRACTED_DIR, UPLOAD_FILE};
