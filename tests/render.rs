//! pdfium-backed rendering tests.
//!
//! These need a pdfium shared library and are gated behind the `PDFIUM_E2E`
//! environment variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   PDFIUM_E2E=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test render -- --nocapture

use docview::{
    select_renderer, Document, DocumentRole, LoadState, PageRenderer, PdfiumRenderer, RenderPlan,
    SourceFile,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("PDFIUM_E2E").is_err() {
            println!("SKIP: set PDFIUM_E2E=1 to run pdfium tests");
            return;
        }
        init_logging();
    }};
}

/// Route library logs to the test harness; `RUST_LOG` overrides the default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docview=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A valid PDF with `pages` blank 200x100 pt pages and a correct xref table.
fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..pages)
                .map(|i| format!("{} 0 R", i + 3))
                .collect::<Vec<_>>()
                .join(" "),
            pages
        ),
    ];
    for _ in 0..pages {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >>".to_string());
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}

fn pdf_document(pages: usize) -> Document {
    Document::pending(
        "demo",
        SourceFile::from_bytes("blank.pdf", blank_pdf(pages)),
        DocumentRole::Document,
    )
    .unwrap()
}

fn renderer() -> Arc<dyn PageRenderer> {
    Arc::new(PdfiumRenderer::from_env())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_reports_page_count() {
    e2e_skip_unless_enabled!();
    let doc = pdf_document(3);
    let RenderPlan::PaginatedBinary(mut view) = select_renderer(&doc, String::new()) else {
        panic!("pdf must select the paginated view");
    };
    assert_eq!(view.load(renderer()).await, &LoadState::Loaded);
    assert_eq!(view.navigator().total_pages(), 3);

    let nav = view.navigator_mut();
    for _ in 0..5 {
        nav.next_page();
    }
    assert_eq!(nav.page_number(), 3);
}

#[tokio::test]
async fn test_render_respects_rotation() {
    e2e_skip_unless_enabled!();
    let doc = pdf_document(1);
    let RenderPlan::PaginatedBinary(mut view) = select_renderer(&doc, String::new()) else {
        panic!("pdf must select the paginated view");
    };
    view.load(renderer()).await;

    let upright = view.render_current(renderer()).await.unwrap();
    assert!(upright.width > upright.height, "{}x{}", upright.width, upright.height);
    assert_eq!(upright.image.mime_type, "image/png");
    assert!(upright.image.decode().unwrap().starts_with(b"\x89PNG"));

    view.navigator_mut().rotate();
    let turned = view.render_current(renderer()).await.unwrap();
    assert!(turned.height > turned.width, "{}x{}", turned.width, turned.height);
}

#[tokio::test]
async fn test_garbage_bytes_fail_to_load() {
    e2e_skip_unless_enabled!();
    let doc = Document::pending(
        "demo",
        SourceFile::from_bytes("junk.pdf", b"definitely not a pdf".to_vec()),
        DocumentRole::Document,
    )
    .unwrap();
    let RenderPlan::PaginatedBinary(mut view) = select_renderer(&doc, String::new()) else {
        panic!("pdf must select the paginated view");
    };
    let state = view.load(renderer()).await.clone();
    assert_eq!(state, LoadState::Failed("Failed to load PDF".into()));
    assert_eq!(view.navigator().total_pages(), 0);
}
