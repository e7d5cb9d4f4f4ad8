//! Content resolution: turn a [`Document`] into display-ready text.
//!
//! ## Priority order (first match wins)
//!
//! 1. Cached content on the record, returned unchanged
//! 2. Plain-text bytes, decoded as UTF-8 verbatim
//! 3. Rich-document bytes, run through the [`RichTextDecoder`]
//! 4. Portable-paper format, answered with [`PORTABLE_PAPER_SENTINEL`]
//! 5. Anything else, answered with the configured placeholder
//!
//! Extraction goes through the document's shared `OnceCell`, so concurrent
//! callers for the same record converge on a single run. Only successes are
//! stored: a failed extraction leaves the cell empty and the next call tries
//! again.

use crate::config::IngestConfig;
use crate::error::ExtractError;
use crate::model::{Document, DocumentFormat};
use crate::pipeline::docx::{DocxDecoder, RichTextDecoder};
use crate::pipeline::input::SourceFile;
use crate::pipeline::style::StyleMap;
use quick_xml::escape::partial_escape;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker returned for PDFs. The viewer renders their bytes directly.
pub const PORTABLE_PAPER_SENTINEL: &str = "PDF_CONTENT";

/// Resolves documents to text. Cheap to clone.
#[derive(Clone)]
pub struct ContentResolver {
    decoder: Arc<dyn RichTextDecoder>,
    style_map: Arc<StyleMap>,
    placeholder: Arc<str>,
}

impl fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentResolver")
            .field("decoder", &"<dyn RichTextDecoder>")
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl ContentResolver {
    pub fn new(config: &IngestConfig) -> Self {
        let decoder = DocxDecoder::new(config.max_part_bytes, config.embed_images);
        Self::with_decoder(config, Arc::new(decoder))
    }

    /// Use a custom rich-text decoder instead of [`DocxDecoder`].
    pub fn with_decoder(config: &IngestConfig, decoder: Arc<dyn RichTextDecoder>) -> Self {
        Self {
            decoder,
            style_map: Arc::clone(&config.style_map),
            placeholder: Arc::from(config.placeholder.as_str()),
        }
    }

    /// Display content for `document`. Never fails.
    ///
    /// Extraction errors become an inline error fragment for rich documents
    /// and an empty string for plain text. Neither is cached.
    pub async fn resolve(&self, document: &Document) -> String {
        match self.extract(document).await {
            Ok(Some(content)) => content,
            Ok(None) => match document.format() {
                DocumentFormat::Pdf => PORTABLE_PAPER_SENTINEL.to_string(),
                DocumentFormat::Docx | DocumentFormat::Txt => {
                    debug!("No bytes for '{}', using placeholder", document.title());
                    self.placeholder.to_string()
                }
            },
            Err(e) => {
                warn!("Failed to resolve '{}': {}", document.title(), e);
                match document.format() {
                    DocumentFormat::Docx => error_fragment(&e),
                    DocumentFormat::Txt | DocumentFormat::Pdf => String::new(),
                }
            }
        }
    }

    /// Fallible resolution used by the uploader to derive status.
    ///
    /// `Ok(None)` means there is nothing to extract: the format is PDF, or
    /// the record holds no bytes.
    pub async fn extract(&self, document: &Document) -> Result<Option<String>, ExtractError> {
        if let Some(cached) = document.resolved_content() {
            debug!("Cache hit for '{}'", document.title());
            return Ok(Some(cached.to_string()));
        }
        if !document.format().needs_extraction() {
            return Ok(None);
        }
        let Some(source) = document.source() else {
            return Ok(None);
        };

        let content = document
            .content_cell()
            .get_or_try_init(|| self.run_extraction(document.format(), source))
            .await?;
        Ok(Some(content.clone()))
    }

    async fn run_extraction(
        &self,
        format: DocumentFormat,
        source: &SourceFile,
    ) -> Result<String, ExtractError> {
        debug!("Extracting '{}' ({} bytes)", source.name(), source.size());
        match format {
            DocumentFormat::Txt => source.text().map(str::to_string),
            DocumentFormat::Docx => {
                let bytes = source.shared_bytes();
                let decoder = Arc::clone(&self.decoder);
                let style_map = Arc::clone(&self.style_map);
                tokio::task::spawn_blocking(move || decoder.decode(&bytes, &style_map))
                    .await
                    .map_err(|e| ExtractError::TaskFailed {
                        detail: e.to_string(),
                    })?
            }
            DocumentFormat::Pdf => Ok(PORTABLE_PAPER_SENTINEL.to_string()),
        }
    }
}

/// Inline fragment shown in place of a rich document that failed to decode.
pub fn error_fragment(error: &ExtractError) -> String {
    format!(
        "<p class=\"docview-error\" style=\"color: #dc2626;\">Failed to load document: {}</p>",
        partial_escape(error.to_string().as_str())
    )
}
