//! Error types for the docview library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocviewError`]: **Fatal** for the operation that returned it: the
//!   file could not be read, its format is not supported, the PDF engine is
//!   missing. Returned as `Err(DocviewError)` from the public entry points.
//!
//! * [`ExtractError`]: **Non-fatal**: content extraction for one document
//!   failed (invalid UTF-8, corrupt DOCX archive). The document is still
//!   created with [`crate::model::DocumentStatus::Error`], and the resolver
//!   turns the error into an inline fragment instead of propagating it.
//!
//! Keeping them apart lets batch callers tolerate partial failure: one bad
//! file never costs the rest of the upload.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docview library.
#[derive(Debug, Error)]
pub enum DocviewError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading its bytes failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filename extension is not one of docx, pdf, txt.
    #[error("Unsupported file type for '{file_name}' (extension: {extension:?}); expected .docx, .pdf or .txt")]
    UnsupportedFormat {
        file_name: String,
        extension: Option<String>,
    },

    // ── Workspace errors ──────────────────────────────────────────────────
    /// No document with this id belongs to the workspace.
    #[error("Document '{id}' not found in project '{project_id}'")]
    DocumentNotFound { id: String, project_id: String },

    /// A health report carried a score outside 0–100.
    #[error("Invalid document health: {0}")]
    InvalidHealth(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt or encrypted: {detail}")]
    CorruptPdf { detail: String },

    /// Requested page exceeds the document's page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal content-extraction error for a single document.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractError {
    /// Plain-text bytes are not valid UTF-8.
    #[error("text is not valid UTF-8: {detail}")]
    InvalidUtf8 { detail: String },

    /// The rich-document container (zip) could not be opened or read.
    #[error("DOCX archive error: {detail}")]
    Archive { detail: String },

    /// A required part is absent from the archive.
    #[error("DOCX part '{part}' not found")]
    MissingPart { part: String },

    /// A part decompresses beyond the configured limit.
    #[error("DOCX part '{part}' exceeds size limit ({limit} bytes)")]
    PartTooLarge { part: String, limit: u64 },

    /// A part is not well-formed XML.
    #[error("DOCX XML error in '{part}': {detail}")]
    Xml { part: String, detail: String },

    /// The blocking extraction task panicked or was aborted.
    #[error("extraction task failed: {detail}")]
    TaskFailed { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = DocviewError::UnsupportedFormat {
            file_name: "slides.pptx".into(),
            extension: Some("pptx".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("slides.pptx"), "got: {msg}");
        assert!(msg.contains("pptx"), "got: {msg}");
    }

    #[test]
    fn document_not_found_display() {
        let e = DocviewError::DocumentNotFound {
            id: "doc-1".into(),
            project_id: "demo".into(),
        };
        assert!(e.to_string().contains("doc-1"));
        assert!(e.to_string().contains("demo"));
    }

    #[test]
    fn page_out_of_range_display() {
        let e = DocviewError::PageOutOfRange { page: 7, total: 5 };
        assert!(e.to_string().contains("Page 7"));
        assert!(e.to_string().contains("5 pages"));
    }

    #[test]
    fn part_too_large_display() {
        let e = ExtractError::PartTooLarge {
            part: "word/document.xml".into(),
            limit: 1024,
        };
        assert!(e.to_string().contains("word/document.xml"));
        assert!(e.to_string().contains("1024"));
    }

    #[test]
    fn extract_error_roundtrips_through_json() {
        let e = ExtractError::MissingPart {
            part: "word/document.xml".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        let back: ExtractError = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, e);
    }
}
