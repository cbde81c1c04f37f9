// crates/gatekeeper-core/src/interfaces/fs_store.rs
// ============================================================================
// Module: Gatekeeper Filesystem Artifact Store
// Description: Path-safe filesystem-backed ArtifactSink/ArtifactReader pair.
// Purpose: Let the CLI and HTTP surfaces materialize a Proof Pack on disk.
// Dependencies: crate::interfaces::{ArtifactSink, ArtifactReader}, std::fs
// ============================================================================

//! ## Overview
//! Both types resolve every relative artifact path against a validated root
//! and refuse anything that would escape it (absolute paths, `..` segments).
//! This is the only filesystem-touching code in `gatekeeper-core`; every
//! other component is backend-agnostic through [`crate::interfaces::ArtifactSink`]
//! and [`crate::interfaces::ArtifactReader`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::interfaces::ArtifactIoError;
use crate::interfaces::ArtifactReader;
use crate::interfaces::ArtifactSink;

// ============================================================================
// SECTION: Path Safety
// ============================================================================

/// Rejects absolute paths and `..` segments; returns the path unchanged
/// otherwise.
fn ensure_relative(path: &str) -> Result<&Path, ArtifactIoError> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Err(ArtifactIoError::Io(format!("artifact path {path} must be relative")));
    }
    for component in candidate.components() {
        match component {
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(ArtifactIoError::Io(format!("artifact path {path} escapes its root")));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(candidate)
}

// ============================================================================
// SECTION: File Artifact Sink
// ============================================================================

/// Writes Proof Pack artifact bytes under a root directory, creating parent
/// directories as needed.
pub struct FileArtifactSink {
    root: PathBuf,
}

impl FileArtifactSink {
    /// Builds a sink rooted at `root`. Does not require `root` to exist yet;
    /// [`ArtifactSink::write`] creates it (and every parent directory) on
    /// first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the root directory this sink writes under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for FileArtifactSink {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), ArtifactIoError> {
        let relative = ensure_relative(path)?;
        let full_path = self.root.join(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|err| ArtifactIoError::Io(err.to_string()))?;
        }
        fs::write(&full_path, bytes).map_err(|err| ArtifactIoError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: File Artifact Reader
// ============================================================================

/// Reads Proof Pack artifact bytes back from a root directory.
pub struct FileArtifactReader {
    root: PathBuf,
}

impl FileArtifactReader {
    /// Builds a reader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }
}

impl ArtifactReader for FileArtifactReader {
    fn read(&self, path: &str) -> Result<Vec<u8>, ArtifactIoError> {
        let relative = ensure_relative(path)?;
        let full_path = self.root.join(relative);
        fs::read(&full_path).map_err(|err| ArtifactIoError::Io(format!("{path}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileArtifactSink::new(dir.path());
        sink.write("runs/run-1/artifacts/plan.json", b"{}").expect("write");
        let reader = FileArtifactReader::new(dir.path());
        let bytes = reader.read("runs/run-1/artifacts/plan.json").expect("read");
        assert_eq!(bytes, b"{}");
    }

    #[test]
    fn absolute_path_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileArtifactSink::new(dir.path());
        assert!(sink.write("/etc/passwd", b"x").is_err());
    }

    #[test]
    fn parent_dir_escape_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileArtifactSink::new(dir.path());
        assert!(sink.write("../escape.json", b"x").is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = FileArtifactReader::new(dir.path());
        assert!(reader.read("missing.json").is_err());
    }
}
