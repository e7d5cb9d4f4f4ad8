//! Streaming ingestion API: emit batch entries as they complete.
//!
//! ## Why stream?
//!
//! A large upload takes a while when DOCX files need decoding. A stream lets
//! callers show each document as soon as its record exists instead of
//! waiting for the slowest file.
//!
//! Unlike [`crate::pipeline::ingest::Ingestor::ingest_batch`], which returns
//! only after every file is done, [`ingest_stream`] yields one
//! [`BatchEntry`] per file. Entries still arrive in input order: up to
//! `concurrency` files are processed ahead, but a finished file waits for
//! the ones before it.
//!
//! Per-file progress callbacks fire as usual. `on_batch_start` and
//! `on_batch_complete` do not, since the stream has no natural end from the
//! library's point of view.

use crate::model::DocumentRole;
use crate::pipeline::ingest::{BatchEntry, Ingestor};
use crate::pipeline::input::SourceFile;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of batch entries.
pub type BatchStream = Pin<Box<dyn Stream<Item = BatchEntry> + Send>>;

/// Ingest `files` into `project_id`, yielding entries in input order.
///
/// # Example
/// ```rust,no_run
/// use docview::{ingest_stream, BatchEntry, Ingestor, SourceFile};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![SourceFile::open("thesis.docx").await?];
/// let mut entries = ingest_stream(Ingestor::default(), "demo", files);
/// while let Some(entry) = entries.next().await {
///     match entry {
///         BatchEntry::Ingested(doc) => println!("{} → {}", doc.title(), doc.status()),
///         BatchEntry::Skipped { file_name, reason } => eprintln!("{file_name}: {reason}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn ingest_stream(
    ingestor: Ingestor,
    project_id: impl Into<String>,
    files: Vec<SourceFile>,
) -> BatchStream {
    let total = files.len();
    let concurrency = ingestor.config().concurrency;
    let project_id: Arc<str> = Arc::from(project_id.into());
    info!(
        "Streaming {} file(s) into '{}' (concurrency {})",
        total, project_id, concurrency
    );

    let s = stream::iter(files.into_iter().enumerate().map(move |(index, file)| {
        let ingestor = ingestor.clone();
        let project_id = Arc::clone(&project_id);
        async move {
            ingestor
                .ingest_entry(&project_id, index, total, file, DocumentRole::Document)
                .await
        }
    }))
    .buffered(concurrency);

    Box::pin(s)
}
