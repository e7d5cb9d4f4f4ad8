//! Uploader: turn raw files into [`Document`] records.
//!
//! [`Ingestor::ingest`] derives the format from the extension, extracts
//! content eagerly, and returns a `ready` or `error` record. Only an
//! unsupported extension is an `Err`. [`Ingestor::ingest_batch`] runs that
//! over many files with bounded concurrency and reports every file, in the
//! order submitted.

use crate::config::IngestConfig;
use crate::error::DocviewError;
use crate::model::{Document, DocumentRole, DocumentStatus};
use crate::pipeline::docx::RichTextDecoder;
use crate::pipeline::input::SourceFile;
use crate::pipeline::resolve::ContentResolver;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BatchEntry {
    Ingested(Document),
    #[serde(rename_all = "camelCase")]
    Skipped { file_name: String, reason: String },
}

impl BatchEntry {
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Ingested(doc) => Some(doc),
            Self::Skipped { .. } => None,
        }
    }
}

/// All outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Documents created, ready or error.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().filter_map(BatchEntry::document)
    }

    /// `(file_name, reason)` of every file left out.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|e| match e {
            BatchEntry::Skipped { file_name, reason } => Some((file_name.as_str(), reason.as_str())),
            BatchEntry::Ingested(_) => None,
        })
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.entries
            .into_iter()
            .filter_map(|e| match e {
                BatchEntry::Ingested(doc) => Some(doc),
                BatchEntry::Skipped { .. } => None,
            })
            .collect()
    }
}

/// Creates documents from uploaded files. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: Arc<IngestConfig>,
    resolver: ContentResolver,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        let resolver = ContentResolver::new(&config);
        Self {
            config: Arc::new(config),
            resolver,
        }
    }

    pub fn with_decoder(config: IngestConfig, decoder: Arc<dyn RichTextDecoder>) -> Self {
        let resolver = ContentResolver::with_decoder(&config, decoder);
        Self {
            config: Arc::new(config),
            resolver,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// The resolver sharing this ingestor's decoder and settings.
    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Ingest one file with the default [`DocumentRole::Document`] role.
    pub async fn ingest(&self, project_id: &str, file: SourceFile) -> Result<Document, DocviewError> {
        self.ingest_as(project_id, file, DocumentRole::Document).await
    }

    /// Ingest one file.
    ///
    /// # Errors
    /// [`DocviewError::UnsupportedFormat`] when the extension is not docx,
    /// pdf or txt. Extraction failures are not errors: the document comes
    /// back with [`DocumentStatus::Error`].
    pub async fn ingest_as(
        &self,
        project_id: &str,
        file: SourceFile,
        role: DocumentRole,
    ) -> Result<Document, DocviewError> {
        let mut document = Document::pending(project_id, file, role)?;

        if let Some(source) = document.source() {
            if !source.magic_matches(document.format()) {
                debug!(
                    "'{}' does not start with {} magic bytes",
                    document.title(),
                    document.format()
                );
            }
        }

        let status = match self.resolver.extract(&document).await {
            Ok(_) => DocumentStatus::Ready,
            Err(e) => {
                warn!("Extraction failed for '{}': {}", document.title(), e);
                DocumentStatus::Error
            }
        };
        document.set_status(status);

        info!(
            "Ingested '{}' as {} ({} bytes, {})",
            document.title(),
            document.id(),
            document.size(),
            status
        );
        Ok(document)
    }

    /// Ingest many files as [`DocumentRole::Document`]. Never fails as a whole.
    ///
    /// Up to `config.concurrency` files are in flight at once; entries are
    /// reported in input order regardless of completion order.
    pub async fn ingest_batch(&self, project_id: &str, files: Vec<SourceFile>) -> BatchReport {
        self.ingest_batch_as(project_id, files, DocumentRole::Document)
            .await
    }

    /// [`Self::ingest_batch`] with every file given `role`.
    pub async fn ingest_batch_as(
        &self,
        project_id: &str,
        files: Vec<SourceFile>,
        role: DocumentRole,
    ) -> BatchReport {
        let total = files.len();
        info!(
            "Ingesting {} file(s) into '{}' (concurrency {})",
            total, project_id, self.config.concurrency
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let entries: Vec<BatchEntry> = stream::iter(files.into_iter().enumerate())
            .map(|(index, file)| self.ingest_entry(project_id, index, total, file, role))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let report = BatchReport { entries };
        let ingested = report.documents().count();
        info!(
            "Batch complete: {}/{} file(s) ingested into '{}'",
            ingested, total, project_id
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, ingested);
        }
        report
    }

    /// One batch slot: ingest, log, fire callbacks, never fail.
    pub(crate) async fn ingest_entry(
        &self,
        project_id: &str,
        index: usize,
        total: usize,
        file: SourceFile,
        role: DocumentRole,
    ) -> BatchEntry {
        let file_name = file.name().to_string();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_file_start(index, total, &file_name);
        }

        match self.ingest_as(project_id, file, role).await {
            Ok(document) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_file_ingested(index, total, &document);
                }
                BatchEntry::Ingested(document)
            }
            Err(e) => {
                warn!("Skipping '{}': {}", file_name, e);
                let reason = e.to_string();
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_file_skipped(index, total, &file_name, &reason);
                }
                BatchEntry::Skipped { file_name, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentFormat;
    use crate::progress::IngestProgressCallback;
    use std::sync::Mutex;

    #[tokio::test]
    async fn txt_is_ready_with_content() {
        let ingestor = Ingestor::default();
        let doc = ingestor
            .ingest("demo", SourceFile::from_bytes("Notes.TXT", b"hi".to_vec()))
            .await
            .unwrap();
        assert_eq!(doc.format(), DocumentFormat::Txt);
        assert_eq!(doc.status(), DocumentStatus::Ready);
        assert_eq!(doc.resolved_content(), Some("hi"));
        assert_eq!(doc.title(), "Notes.TXT");
        assert_eq!(doc.size(), 2);
        assert!(doc.is_consistent());
    }

    #[tokio::test]
    async fn pdf_is_ready_without_content() {
        let ingestor = Ingestor::default();
        let doc = ingestor
            .ingest_as(
                "demo",
                SourceFile::from_bytes("guide.pdf", b"%PDF-1.4".to_vec()),
                DocumentRole::Standard,
            )
            .await
            .unwrap();
        assert_eq!(doc.status(), DocumentStatus::Ready);
        assert_eq!(doc.role(), DocumentRole::Standard);
        assert!(doc.resolved_content().is_none());
        assert!(doc.is_consistent());
    }

    #[tokio::test]
    async fn corrupt_docx_is_error_not_err() {
        let ingestor = Ingestor::default();
        let doc = ingestor
            .ingest("demo", SourceFile::from_bytes("broken.docx", b"garbage".to_vec()))
            .await
            .unwrap();
        assert_eq!(doc.status(), DocumentStatus::Error);
        assert!(doc.resolved_content().is_none());
    }

    #[tokio::test]
    async fn unsupported_extension_is_err() {
        let ingestor = Ingestor::default();
        let err = ingestor
            .ingest("demo", SourceFile::from_bytes("deck.pptx", b"x".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocviewError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let ingestor = Ingestor::default();
        let a = ingestor
            .ingest("demo", SourceFile::from_bytes("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        let b = ingestor
            .ingest("demo", SourceFile::from_bytes("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl IngestProgressCallback for Recorder {
        fn on_batch_start(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start:{total}"));
        }
        fn on_file_skipped(&self, index: usize, _total: usize, name: &str, _reason: &str) {
            self.events.lock().unwrap().push(format!("skip:{index}:{name}"));
        }
        fn on_batch_complete(&self, total: usize, ingested: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{ingested}/{total}"));
        }
    }

    #[tokio::test]
    async fn batch_keeps_order_and_isolates_failures() {
        let recorder = Arc::new(Recorder::default());
        let config = IngestConfig::builder()
            .concurrency(3)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let ingestor = Ingestor::new(config);

        let files = vec![
            SourceFile::from_bytes("one.txt", b"1".to_vec()),
            SourceFile::from_bytes("photo.png", b"x".to_vec()),
            SourceFile::from_bytes("bad.docx", b"nope".to_vec()),
            SourceFile::from_bytes("two.txt", b"2".to_vec()),
        ];
        let report = ingestor.ingest_batch("demo", files).await;

        assert_eq!(report.entries.len(), 4);
        let titles: Vec<&str> = report.documents().map(Document::title).collect();
        assert_eq!(titles, ["one.txt", "bad.docx", "two.txt"]);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, "photo.png");
        assert!(matches!(report.entries[1], BatchEntry::Skipped { .. }));

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(events.first().map(String::as_str), Some("start:4"));
        assert!(events.contains(&"skip:1:photo.png".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("done:3/4"));
    }

    #[tokio::test]
    async fn batch_role_applies_to_every_document() {
        let ingestor = Ingestor::default();
        let report = ingestor
            .ingest_batch_as(
                "demo",
                vec![
                    SourceFile::from_bytes("iso.pdf", b"%PDF".to_vec()),
                    SourceFile::from_bytes("guide.txt", b"g".to_vec()),
                ],
                DocumentRole::Standard,
            )
            .await;
        assert!(report.documents().all(|d| d.role() == DocumentRole::Standard));
    }

    #[tokio::test]
    async fn batch_report_serialises_with_outcome_tag() {
        let ingestor = Ingestor::default();
        let report = ingestor
            .ingest_batch(
                "demo",
                vec![
                    SourceFile::from_bytes("a.txt", b"a".to_vec()),
                    SourceFile::from_bytes("b.zip", b"b".to_vec()),
                ],
            )
            .await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["outcome"], "ingested");
        assert_eq!(json["entries"][0]["type"], "txt");
        assert_eq!(json["entries"][0]["processedContent"], "a");
        assert_eq!(json["entries"][1]["outcome"], "skipped");
        assert_eq!(json["entries"][1]["fileName"], "b.zip");
    }
}
