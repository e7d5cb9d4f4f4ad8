//! Core data types: documents, projects, and the compliance health report.
//!
//! A [`Document`] is created once per upload and afterwards only gains its
//! resolved content. The content cache lives behind an `Arc<OnceCell>` so
//! every clone of a record (the workspace list, the current selection, an
//! in-flight resolver task) observes the same single extraction result.

use crate::error::DocviewError;
use crate::pipeline::input::SourceFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

// ── Identity ─────────────────────────────────────────────────────────────

/// Opaque document identifier, `doc-<uuid v7>`.
///
/// UUIDv7 embeds a millisecond timestamp, so ids sort by ingestion time and
/// are never reused within or across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Allocate a fresh id.
    pub fn generate() -> Self {
        Self(format!("doc-{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Declared format of an ingested file, fixed at ingestion from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Rich document (`.docx`): converted to HTML for display.
    Docx,
    /// Portable paper (`.pdf`): rendered page by page from raw bytes.
    Pdf,
    /// Plain text (`.txt`): shown verbatim.
    Txt,
}

impl DocumentFormat {
    /// Match an extension (without the dot), ignoring ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Derive the format from the last `.`-separated segment of a filename.
    pub fn from_file_name(name: &str) -> Option<Self> {
        file_extension(name).and_then(Self::from_extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }

    /// Whether display goes through extracted text rather than raw bytes.
    pub fn needs_extraction(self) -> bool {
        match self {
            Self::Docx | Self::Txt => true,
            Self::Pdf => false,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Text after the last dot of `name` (`"a.b.DOCX"` → `"DOCX"`).
///
/// A bare dotfile counts: `".txt"` has extension `"txt"`.
pub fn file_extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Whether the document is the user's work or a reference standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRole {
    #[default]
    Document,
    Standard,
}

/// Lifecycle status of a document record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Ready,
    Error,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// ── Document ─────────────────────────────────────────────────────────────

/// One ingested file bound to a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    id: DocumentId,
    project_id: String,
    title: String,
    #[serde(rename = "type")]
    format: DocumentFormat,
    role: DocumentRole,
    size: u64,
    uploaded_at: DateTime<Utc>,
    status: DocumentStatus,
    #[serde(rename = "processedContent", serialize_with = "serialize_cache")]
    content: Arc<OnceCell<String>>,
    #[serde(skip)]
    source: Option<SourceFile>,
}

fn serialize_cache<S: Serializer>(cell: &Arc<OnceCell<String>>, s: S) -> Result<S::Ok, S::Error> {
    cell.get().serialize(s)
}

impl Document {
    /// Build a `processing` record for `file` without extracting anything.
    ///
    /// # Errors
    /// [`DocviewError::UnsupportedFormat`] when the extension is not
    /// docx, pdf or txt.
    pub fn pending(
        project_id: impl Into<String>,
        file: SourceFile,
        role: DocumentRole,
    ) -> Result<Self, DocviewError> {
        let format = format_of(file.name())?;
        Ok(Self {
            id: DocumentId::generate(),
            project_id: project_id.into(),
            title: file.name().to_string(),
            format,
            role,
            size: file.size(),
            uploaded_at: Utc::now(),
            status: DocumentStatus::Processing,
            content: Arc::new(OnceCell::new()),
            source: Some(file),
        })
    }

    /// A record known only by its metadata (e.g. listed by a project store)
    /// whose bytes were never loaded in this process.
    pub fn from_metadata(
        project_id: impl Into<String>,
        title: impl Into<String>,
        size: u64,
        role: DocumentRole,
    ) -> Result<Self, DocviewError> {
        let title = title.into();
        let format = format_of(&title)?;
        Ok(Self {
            id: DocumentId::generate(),
            project_id: project_id.into(),
            title,
            format,
            role,
            size,
            uploaded_at: Utc::now(),
            status: DocumentStatus::Processing,
            content: Arc::new(OnceCell::new()),
            source: None,
        })
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn role(&self) -> DocumentRole {
        self.role
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Raw bytes the document was ingested from, if still held.
    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    /// Cached display content, if resolution already succeeded.
    pub fn resolved_content(&self) -> Option<&str> {
        self.content.get().map(String::as_str)
    }

    /// `false` when the record claims `ready` without content it can show.
    pub fn is_consistent(&self) -> bool {
        self.status != DocumentStatus::Ready
            || self.content.initialized()
            || self.format == DocumentFormat::Pdf
    }

    pub(crate) fn content_cell(&self) -> &OnceCell<String> {
        &self.content
    }

    pub(crate) fn set_status(&mut self, status: DocumentStatus) {
        self.status = status;
    }
}

fn format_of(file_name: &str) -> Result<DocumentFormat, DocviewError> {
    DocumentFormat::from_file_name(file_name).ok_or_else(|| DocviewError::UnsupportedFormat {
        file_name: file_name.to_string(),
        extension: file_extension(file_name).map(str::to_string),
    })
}

// ── Project ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Draft,
}

/// The project a workspace operates on. Owns its documents via
/// [`crate::workspace::ProjectWorkspace`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub compliance_score: u8,
    pub last_modified: DateTime<Utc>,
    pub collaborators: Vec<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: ProjectStatus::Active,
            compliance_score: 0,
            last_modified: Utc::now(),
            collaborators: Vec::new(),
        }
    }
}

// ── Document health ──────────────────────────────────────────────────────

/// Named score categories of a health report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCategory {
    Formatting,
    Style,
    Structure,
    Compliance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Pass,
    Fail,
    Warning,
}

/// One checklist entry. `element_id` links it to a `data-doc-element-id`
/// in the rich-text rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ComplianceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    pub fixable: bool,
}

/// Score band used to colour scores in the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Good,
            70..=89 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

/// Compliance report for one document, produced by an external checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHealth {
    overall_score: u8,
    categories: BTreeMap<HealthCategory, u8>,
    items: Vec<ComplianceItem>,
}

impl DocumentHealth {
    /// # Errors
    /// [`DocviewError::InvalidHealth`] if any score exceeds 100.
    pub fn new(
        overall_score: u8,
        categories: BTreeMap<HealthCategory, u8>,
        items: Vec<ComplianceItem>,
    ) -> Result<Self, DocviewError> {
        if overall_score > 100 {
            return Err(DocviewError::InvalidHealth(format!(
                "overall score {overall_score} exceeds 100"
            )));
        }
        if let Some((cat, score)) = categories.iter().find(|(_, s)| **s > 100) {
            return Err(DocviewError::InvalidHealth(format!(
                "{cat:?} score {score} exceeds 100"
            )));
        }
        Ok(Self {
            overall_score,
            categories,
            items,
        })
    }

    pub fn overall_score(&self) -> u8 {
        self.overall_score
    }

    pub fn categories(&self) -> &BTreeMap<HealthCategory, u8> {
        &self.categories
    }

    pub fn items(&self) -> &[ComplianceItem] {
        &self.items
    }

    /// Failing items the checker can fix automatically.
    pub fn fixable_issues(&self) -> impl Iterator<Item = &ComplianceItem> {
        self.items
            .iter()
            .filter(|i| i.fixable && i.status == ComplianceStatus::Fail)
    }

    /// The checklist item attached to a clicked document element.
    pub fn item_for_element(&self, element_id: &str) -> Option<&ComplianceItem> {
        self.items
            .iter()
            .find(|i| i.element_id.as_deref() == Some(element_id))
    }
}
