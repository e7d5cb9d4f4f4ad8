//! Configuration types for document ingestion and resolution.
//!
//! All pipeline behaviour is controlled through [`IngestConfig`], built via
//! its [`IngestConfigBuilder`]. One struct holds every knob so the same
//! config can be shared by the [`crate::Ingestor`] and its
//! [`crate::ContentResolver`].

use crate::error::DocviewError;
use crate::pipeline::style::StyleMap;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Text shown when a document has neither cached content nor readable bytes.
pub const DEFAULT_PLACEHOLDER: &str = "Sample document content...";

/// Upper bound on the decompressed size of one DOCX part (50 MiB).
pub const DEFAULT_MAX_PART_BYTES: u64 = 50 * 1024 * 1024;

const MIN_PART_BYTES: u64 = 1024;

/// Configuration for ingesting and resolving documents.
///
/// Built via [`IngestConfig::builder()`] or using
/// [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use docview::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .concurrency(8)
///     .placeholder("Nothing to show yet")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// Files of one batch processed at the same time. Default: 4.
    ///
    /// Extraction runs on tokio's blocking pool, so values far above the
    /// number of cores only queue up there.
    pub concurrency: usize,

    /// Content returned when nothing better can be resolved.
    pub placeholder: String,

    /// Per-part decompression limit for DOCX archives. Default: 50 MiB.
    pub max_part_bytes: u64,

    /// Inline `word/media/*` images as data URIs. When false, images are
    /// dropped from the HTML.
    pub embed_images: bool,

    /// Paragraph and run style mapping used by the rich-text transform.
    pub style_map: Arc<StyleMap>,

    /// Optional per-file progress callback for batch ingestion.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            embed_images: true,
            style_map: Arc::new(StyleMap::default()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("concurrency", &self.concurrency)
            .field("placeholder", &self.placeholder)
            .field("max_part_bytes", &self.max_part_bytes)
            .field("embed_images", &self.embed_images)
            .field("style_map", &self.style_map.len())
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.config.placeholder = text.into();
        self
    }

    pub fn max_part_bytes(mut self, bytes: u64) -> Self {
        self.config.max_part_bytes = bytes;
        self
    }

    pub fn embed_images(mut self, v: bool) -> Self {
        self.config.embed_images = v;
        self
    }

    pub fn style_map(mut self, map: StyleMap) -> Self {
        self.config.style_map = Arc::new(map);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, DocviewError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(DocviewError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_part_bytes < MIN_PART_BYTES {
            return Err(DocviewError::InvalidConfig(format!(
                "max_part_bytes must be at least {MIN_PART_BYTES}, got {}",
                c.max_part_bytes
            )));
        }
        Ok(self.config)
    }
}
