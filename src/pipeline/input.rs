//! Upload intake: format inference, size guard and temporary staging.
//!
//! The document libraries are driven from a file path, so an upload is
//! written into a private `TempDir` first. The directory lives inside
//! [`StagedUpload`] and is removed when the guard drops, which covers the
//! success path, every `?` early return and a panic unwinding through the
//! extractor alike.

use crate::config::{DocumentFormat, SupportedFormats};
use crate::error::StyleCopyError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A file received from a caller, held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Infer the document format from a filename, case-insensitively.
///
/// Fails with a client error for an empty filename, a name without an
/// extension, or an extension outside `supported`.
pub fn detect_format(
    filename: &str,
    supported: &SupportedFormats,
) -> Result<DocumentFormat, StyleCopyError> {
    if filename.trim().is_empty() {
        return Err(StyleCopyError::MissingFilename);
    }

    let unsupported = || StyleCopyError::UnsupportedFormat {
        filename: filename.to_string(),
        supported: supported.to_string(),
    };

    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(unsupported)?;

    match DocumentFormat::from_extension(&ext) {
        Some(format) if supported.contains(format) => Ok(format),
        _ => Err(unsupported()),
    }
}

/// Reject a payload of `size` bytes when it exceeds `limit`.
pub fn check_size(size: u64, limit: u64) -> Result<(), StyleCopyError> {
    if size > limit {
        return Err(StyleCopyError::FileTooLarge { size, limit });
    }
    Ok(())
}

/// An upload written to disk for the duration of one extraction.
pub struct StagedUpload {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl StagedUpload {
    /// Write `bytes` into a fresh temporary directory.
    ///
    /// The on-disk name is derived from the format only; the caller-supplied
    /// filename never reaches the file system.
    pub async fn stage(bytes: &[u8], format: DocumentFormat) -> Result<Self, StyleCopyError> {
        let temp_dir = TempDir::with_prefix("style-copier-")?;
        let path = temp_dir.path().join(format!("upload{}", format.extension()));

        tokio::fs::write(&path, bytes).await?;
        debug!("Staged {} bytes at {}", bytes.len(), path.display());

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
