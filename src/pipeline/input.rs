//! Input handling: the file-like object the pipeline ingests.
//!
//! A [`SourceFile`] is a filename plus an immutable, shareable byte buffer.
//! The buffer sits behind an `Arc<[u8]>` so a document, the resolver's
//! blocking extraction task, and the PDF renderer can all hold it without
//! copying.

use crate::error::{DocviewError, ExtractError};
use crate::model::DocumentFormat;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Raw uploaded file: name, length, and bytes readable as text or binary.
#[derive(Clone)]
pub struct SourceFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl SourceFile {
    /// Wrap bytes already in memory (drag-and-drop upload, tests).
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Read a local file. The display name is the path's final component.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DocviewError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocviewError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => DocviewError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => DocviewError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap shared handle for moving the buffer into a blocking task.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// The bytes as UTF-8 text, verbatim.
    pub fn text(&self) -> Result<&str, ExtractError> {
        std::str::from_utf8(&self.bytes).map_err(|e| ExtractError::InvalidUtf8 {
            detail: e.to_string(),
        })
    }

    /// Whether the leading bytes look like `format`. Plain text has no magic.
    ///
    /// Only advisory: the declared format always comes from the extension.
    pub fn magic_matches(&self, format: DocumentFormat) -> bool {
        match format {
            DocumentFormat::Pdf => self.bytes.starts_with(b"%PDF"),
            DocumentFormat::Docx => self.bytes.starts_with(b"PK\x03\x04"),
            DocumentFormat::Txt => true,
        }
    }
}
