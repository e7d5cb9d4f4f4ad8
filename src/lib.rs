//! # docview
//!
//! Ingest DOCX, PDF and plain-text files into a project and resolve each one
//! into something a viewer can show.
//!
//! ## Why this crate?
//!
//! An authoring workspace accepts whatever its users drag in. Each format
//! needs its own display path: DOCX must become HTML with enough structure
//! and element identifiers for a compliance checklist to point into it, PDFs
//! must be paged and zoomed without re-parsing their content, and plain text
//! should reach the screen untouched. This crate owns those paths so the UI
//! layer only asks "what do I render?".
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Ingest   extension → format, uuid v7 id, eager extraction
//!  ├─ 2. Resolve  cache → txt → docx (zip + quick-xml, spawn_blocking)
//!  │              → PDF sentinel → placeholder
//!  ├─ 3. Style    style-name map, inline presentation, element ids
//!  ├─ 4. Select   RichText | PlainText | PaginatedBinary
//!  └─ 5. Page     PageNavigator state + pdfium rendering (spawn_blocking)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docview::{select_renderer, Ingestor, RenderPlan, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ingestor = Ingestor::default();
//!     let file = SourceFile::open("thesis.docx").await?;
//!     let doc = ingestor.ingest("new-project-demo", file).await?;
//!
//!     let content = ingestor.resolver().resolve(&doc).await;
//!     if let RenderPlan::RichText(view) = select_renderer(&doc, content) {
//!         println!("{}", view.html);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docview` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docview = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDF engine
//!
//! Paged rendering binds pdfium at call time: `PDFIUM_LIB_PATH` first, then
//! the system library. Ingestion and content resolution never touch it, so
//! a machine without pdfium can still ingest and show DOCX and text files.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod viewer;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{IngestConfig, IngestConfigBuilder, DEFAULT_PLACEHOLDER};
pub use error::{DocviewError, ExtractError};
pub use model::{
    ComplianceItem, ComplianceStatus, Document, DocumentFormat, DocumentHealth, DocumentId,
    DocumentRole, DocumentStatus, HealthCategory, Project, ProjectStatus, ScoreBand,
};
pub use pipeline::docx::{DocxDecoder, RichTextDecoder};
pub use pipeline::encode::EncodedImage;
pub use pipeline::ingest::{BatchEntry, BatchReport, Ingestor};
pub use pipeline::input::SourceFile;
pub use pipeline::render::{PageRenderer, PageRequest, PdfiumRenderer, RenderedPage, Rotation};
pub use pipeline::resolve::{ContentResolver, PORTABLE_PAPER_SENTINEL};
pub use pipeline::style::{StyleMap, StyleTarget};
pub use progress::{IngestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{ingest_stream, BatchStream};
pub use viewer::{
    select_renderer, LoadState, PageNavigator, PaginatedView, PlainTextView, RenderPlan,
    RichTextView,
};
pub use workspace::ProjectWorkspace;
