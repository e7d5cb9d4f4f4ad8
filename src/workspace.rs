//! Per-project application context.
//!
//! [`ProjectWorkspace`] holds what a single open project needs: its document
//! list, the current selection, the health reports delivered by an external
//! checker, and the render plan of the open viewer. Every change goes through
//! a method, so the rule that selecting a document closes the old viewer
//! lives in one place.

use crate::error::DocviewError;
use crate::model::{Document, DocumentHealth, DocumentId, DocumentRole, Project};
use crate::pipeline::ingest::{BatchReport, Ingestor};
use crate::pipeline::input::SourceFile;
use crate::pipeline::resolve::ContentResolver;
use crate::viewer::{select_renderer, RenderPlan};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug)]
pub struct ProjectWorkspace {
    project: Project,
    documents: Vec<Document>,
    current: Option<DocumentId>,
    health: HashMap<DocumentId, DocumentHealth>,
    viewer: Option<RenderPlan>,
}

impl ProjectWorkspace {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            documents: Vec::new(),
            current: None,
            health: HashMap::new(),
            viewer: None,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Documents in upload order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id() == id)
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.current.as_ref().and_then(|id| self.document(id))
    }

    /// Plan of the open viewer, if [`Self::open_current`] has run since the
    /// last selection change.
    pub fn viewer(&self) -> Option<&RenderPlan> {
        self.viewer.as_ref()
    }

    pub fn viewer_mut(&mut self) -> Option<&mut RenderPlan> {
        self.viewer.as_mut()
    }

    /// Ingest `files` into this project.
    ///
    /// New documents are appended in input order and the last one becomes
    /// the current document. Skipped files only appear in the report.
    pub async fn upload(&mut self, ingestor: &Ingestor, files: Vec<SourceFile>) -> BatchReport {
        self.upload_as(ingestor, files, DocumentRole::Document).await
    }

    /// [`Self::upload`] with every new document given `role`.
    pub async fn upload_as(
        &mut self,
        ingestor: &Ingestor,
        files: Vec<SourceFile>,
        role: DocumentRole,
    ) -> BatchReport {
        let report = ingestor
            .ingest_batch_as(&self.project.id, files, role)
            .await;
        let before = self.documents.len();
        self.documents.extend(report.documents().cloned());

        if let Some(last) = self.documents[before..].last() {
            let id = last.id().clone();
            self.select(id);
            self.project.last_modified = Utc::now();
        }
        info!(
            "Project '{}' now holds {} document(s)",
            self.project.id,
            self.documents.len()
        );
        report
    }

    /// Make `id` the current document and close the open viewer.
    ///
    /// # Errors
    /// [`DocviewError::DocumentNotFound`] when `id` is not in this project.
    pub fn select_document(&mut self, id: &DocumentId) -> Result<&Document, DocviewError> {
        if self.document(id).is_none() {
            return Err(self.not_found(id));
        }
        self.select(id.clone());
        self.document(id).ok_or_else(|| self.not_found(id))
    }

    fn select(&mut self, id: DocumentId) {
        debug!("Selecting document {}", id);
        self.current = Some(id);
        self.viewer = None;
    }

    fn not_found(&self, id: &DocumentId) -> DocviewError {
        DocviewError::DocumentNotFound {
            id: id.to_string(),
            project_id: self.project.id.clone(),
        }
    }

    /// Attach a checker's report to a document, replacing any earlier one.
    pub fn set_document_health(
        &mut self,
        id: &DocumentId,
        health: DocumentHealth,
    ) -> Result<(), DocviewError> {
        if self.document(id).is_none() {
            return Err(self.not_found(id));
        }
        self.health.insert(id.clone(), health);
        Ok(())
    }

    pub fn document_health(&self, id: &DocumentId) -> Option<&DocumentHealth> {
        self.health.get(id)
    }

    pub fn current_health(&self) -> Option<&DocumentHealth> {
        self.current.as_ref().and_then(|id| self.health.get(id))
    }

    /// Resolve the current document and build a fresh render plan for it.
    ///
    /// Returns `None` when nothing is selected. Paginated views always start
    /// from a new navigator.
    pub async fn open_current(&mut self, resolver: &ContentResolver) -> Option<&RenderPlan> {
        let document = self.current_document()?.clone();
        let content = resolver.resolve(&document).await;
        let plan = select_renderer(&document, content);
        debug!("Opened '{}' as {}", document.title(), plan.kind());
        self.viewer = Some(plan);
        self.viewer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentStatus, HealthCategory};
    use std::collections::BTreeMap;

    fn workspace() -> ProjectWorkspace {
        ProjectWorkspace::new(Project::new("new-project-demo", "Demo"))
    }

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::from_bytes("a.txt", b"alpha".to_vec()),
            SourceFile::from_bytes("skip.bmp", b"x".to_vec()),
            SourceFile::from_bytes("b.pdf", b"%PDF-1.4".to_vec()),
        ]
    }

    #[tokio::test]
    async fn upload_appends_and_selects_last_new_document() {
        let mut ws = workspace();
        let ingestor = Ingestor::default();
        let report = ws.upload(&ingestor, files()).await;

        assert_eq!(report.entries.len(), 3);
        let titles: Vec<&str> = ws.documents().iter().map(Document::title).collect();
        assert_eq!(titles, ["a.txt", "b.pdf"]);
        assert_eq!(ws.current_document().map(Document::title), Some("b.pdf"));
        assert!(ws.documents().iter().all(|d| d.project_id() == "new-project-demo"));

        ws.upload(&ingestor, vec![SourceFile::from_bytes("c.txt", b"c".to_vec())])
            .await;
        assert_eq!(ws.document_count(), 3);
        assert_eq!(ws.current_document().map(Document::title), Some("c.txt"));
    }

    #[tokio::test]
    async fn upload_of_only_skipped_files_keeps_selection() {
        let mut ws = workspace();
        let ingestor = Ingestor::default();
        ws.upload(&ingestor, vec![SourceFile::from_bytes("a.txt", b"a".to_vec())])
            .await;
        let before = ws.current_document().map(|d| d.id().clone());
        ws.upload(&ingestor, vec![SourceFile::from_bytes("x.zip", b"z".to_vec())])
            .await;
        assert_eq!(ws.current_document().map(|d| d.id().clone()), before);
    }

    #[tokio::test]
    async fn select_clears_viewer() {
        let mut ws = workspace();
        let ingestor = Ingestor::default();
        ws.upload(&ingestor, files()).await;
        let first = ws.documents()[0].id().clone();

        assert!(ws.open_current(ingestor.resolver()).await.is_some());
        assert!(ws.viewer().is_some());

        let doc = ws.select_document(&first).unwrap();
        assert_eq!(doc.title(), "a.txt");
        assert!(ws.viewer().is_none());

        match ws.open_current(ingestor.resolver()).await {
            Some(RenderPlan::PlainText(view)) => assert_eq!(view.text, "alpha"),
            other => panic!("unexpected plan: {:?}", other.map(RenderPlan::kind)),
        }
    }

    #[tokio::test]
    async fn pdf_opens_with_fresh_navigator() {
        let mut ws = workspace();
        ws.upload(&Ingestor::default(), files()).await;
        let resolver = Ingestor::default().resolver().clone();

        ws.open_current(&resolver).await;
        if let Some(RenderPlan::PaginatedBinary(view)) = ws.viewer_mut() {
            view.navigator_mut().on_document_loaded(4);
            view.navigator_mut().next_page();
        }
        let plan = ws.open_current(&resolver).await;
        match plan {
            Some(RenderPlan::PaginatedBinary(view)) => {
                assert_eq!(view.navigator().page_number(), 1);
                assert_eq!(view.navigator().total_pages(), 0);
            }
            other => panic!("unexpected plan: {:?}", other.map(RenderPlan::kind)),
        }
    }

    #[test]
    fn unknown_document_is_not_found() {
        let mut ws = workspace();
        let err = ws.select_document(&DocumentId::from("doc-missing")).unwrap_err();
        assert!(matches!(err, DocviewError::DocumentNotFound { .. }));
        assert!(ws.current_document().is_none());
        assert!(ws.viewer().is_none());
    }

    #[tokio::test]
    async fn health_is_tracked_per_document() {
        let mut ws = workspace();
        ws.upload(&Ingestor::default(), files()).await;
        let id = ws.current_document().unwrap().id().clone();
        assert_eq!(ws.current_document().unwrap().status(), DocumentStatus::Ready);

        let mut cats = BTreeMap::new();
        cats.insert(HealthCategory::Formatting, 92);
        let health = DocumentHealth::new(85, cats, Vec::new()).unwrap();
        ws.set_document_health(&id, health).unwrap();

        assert_eq!(ws.current_health().map(DocumentHealth::overall_score), Some(85));
        assert!(ws
            .set_document_health(
                &DocumentId::from("doc-missing"),
                DocumentHealth::new(1, BTreeMap::new(), Vec::new()).unwrap()
            )
            .is_err());
    }
}
