//! Progress-callback trait for per-file batch ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::IngestConfigBuilder::progress_callback`] to receive
//! events as [`crate::pipeline::ingest::Ingestor::ingest_batch`] works
//! through an upload.
//!
//! # Why callbacks instead of channels?
//!
//! Callers can forward events to a progress bar, a log, or a UI store
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because files in a batch are processed
//! concurrently.
//!
//! # Example
//!
//! ```rust
//! use docview::{IngestConfig, IngestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     skipped: AtomicUsize,
//! }
//!
//! impl IngestProgressCallback for CountingCallback {
//!     fn on_file_skipped(&self, _index: usize, _total: usize, file_name: &str, _reason: &str) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("skipped {file_name}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { skipped: AtomicUsize::new(0) });
//!
//! let config = IngestConfig::builder()
//!     .progress_callback(counter as Arc<dyn IngestProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::model::Document;
use std::sync::Arc;

/// Called by the ingestion pipeline as it processes each file of a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is the 0-based position of the file in the
/// batch as submitted.
///
/// # Thread safety
///
/// With `concurrency > 1`, `on_file_start`, `on_file_ingested`, and
/// `on_file_skipped` may be called from several tasks at once and in
/// completion order. Protect shared mutable state accordingly.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once before any file is read.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file's extension is checked and its content
    /// extracted.
    fn on_file_start(&self, index: usize, total_files: usize, file_name: &str) {
        let _ = (index, total_files, file_name);
    }

    /// Called when a document record has been created, whatever its status.
    fn on_file_ingested(&self, index: usize, total_files: usize, document: &Document) {
        let _ = (index, total_files, document);
    }

    /// Called when a file is left out of the batch (unsupported type).
    fn on_file_skipped(&self, index: usize, total_files: usize, file_name: &str, reason: &str) {
        let _ = (index, total_files, file_name, reason);
    }

    /// Called once after every file has been attempted.
    ///
    /// # Arguments
    /// * `total_files`: files submitted
    /// * `ingested`: documents created (ready or error)
    fn on_batch_complete(&self, total_files: usize, ingested: usize) {
        let _ = (total_files, ingested);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::IngestConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentRole, DocumentStatus};
    use crate::pipeline::input::SourceFile;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        ingested: AtomicUsize,
        skipped: AtomicUsize,
        batch_total: AtomicUsize,
        batch_ingested: AtomicUsize,
    }

    impl IngestProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.batch_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_ingested(&self, _index: usize, _total: usize, _doc: &Document) {
            self.ingested.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, _index: usize, _total: usize, _name: &str, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, ingested: usize) {
            self.batch_ingested.store(ingested, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let doc = Document::pending(
            "demo",
            SourceFile::from_bytes("notes.txt", b"hi".to_vec()),
            DocumentRole::Document,
        )
        .expect("txt is supported");
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(0, 2, "notes.txt");
        cb.on_file_ingested(0, 2, &doc);
        cb.on_file_skipped(1, 2, "deck.pptx", "unsupported");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let doc = Document::pending(
            "demo",
            SourceFile::from_bytes("a.txt", b"a".to_vec()),
            DocumentRole::Document,
        )
        .expect("txt is supported");
        assert_eq!(doc.status(), DocumentStatus::Processing);

        tracker.on_batch_start(3);
        tracker.on_file_start(0, 3, "a.txt");
        tracker.on_file_ingested(0, 3, &doc);
        tracker.on_file_start(1, 3, "b.zip");
        tracker.on_file_skipped(1, 3, "b.zip", "unsupported");
        tracker.on_file_start(2, 3, "c.txt");
        tracker.on_file_ingested(2, 3, &doc);
        tracker.on_batch_complete(3, 2);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.ingested.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.batch_ingested.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_file_start(0, 10, "x.pdf");
        cb.on_batch_complete(10, 10);
    }
}
