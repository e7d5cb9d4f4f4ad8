//! Viewer strategy selection and paginated navigation state.
//!
//! [`select_renderer`] picks a [`RenderPlan`] from the document format alone.
//! Rich text is sanitised before it reaches a view; plain text passes
//! through untouched; PDFs get a fresh [`PageNavigator`] every time, so
//! switching documents always starts at page 1, 100 %, upright.

use crate::error::DocviewError;
use crate::model::{Document, DocumentFormat};
use crate::pipeline::input::SourceFile;
use crate::pipeline::render::{self, PageRenderer, PageRequest, RenderedPage, Rotation};
use once_cell::sync::Lazy;
use quick_xml::escape::unescape;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Shown when the renderer cannot open the PDF.
pub const PDF_LOAD_ERROR: &str = "Failed to load PDF";
/// Shown when the record holds no PDF bytes.
pub const PDF_UNAVAILABLE: &str = "PDF file not available";

// ── Render plan ──────────────────────────────────────────────────────────

/// How a document's content should be displayed.
#[derive(Debug, Clone)]
pub enum RenderPlan {
    RichText(RichTextView),
    PlainText(PlainTextView),
    PaginatedBinary(PaginatedView),
}

impl RenderPlan {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RichText(_) => "rich-text",
            Self::PlainText(_) => "plain-text",
            Self::PaginatedBinary(_) => "paginated-binary",
        }
    }
}

/// Pick the rendering strategy for `document`.
///
/// A pure function of `document.format()`. For PDFs `content` is ignored
/// and the raw bytes are handed to the paginated view instead.
pub fn select_renderer(document: &Document, content: String) -> RenderPlan {
    match document.format() {
        DocumentFormat::Docx => RenderPlan::RichText(RichTextView {
            html: sanitize_html(&content),
        }),
        DocumentFormat::Txt => RenderPlan::PlainText(PlainTextView { text: content }),
        DocumentFormat::Pdf => RenderPlan::PaginatedBinary(PaginatedView::new(
            document.source().map(SourceFile::shared_bytes),
        )),
    }
}

// ── Rich text ────────────────────────────────────────────────────────────

/// Sanitised HTML plus element-identifier lookups for the compliance
/// highlighter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichTextView {
    pub html: String,
}

static RE_ELEMENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-doc-element-id\s*=\s*"([^"]*)""#).unwrap());

impl RichTextView {
    /// Identifier carried by a clicked element, given its markup. Only the
    /// outermost (first) identifier counts.
    pub fn element_id_at(element_html: &str) -> Option<String> {
        RE_ELEMENT_ID
            .captures(element_html)
            .map(|caps| caps[1].to_string())
    }

    /// Every identifier in document order.
    pub fn element_ids(&self) -> Vec<String> {
        RE_ELEMENT_ID
            .captures_iter(&self.html)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// Verbatim text for a fixed-width layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainTextView {
    pub text: String,
}

// ── Sanitising ───────────────────────────────────────────────────────────

static RE_DANGEROUS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<iframe\b[^>]*>.*?</iframe\s*>|<object\b[^>]*>.*?</object\s*>|<embed\b[^>]*>.*?</embed\s*>",
    )
    .unwrap()
});

static RE_DANGEROUS_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(script|style|iframe|object|embed)\b[^>]*>").unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap()
});

static RE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s>]+))?"#).unwrap()
});

/// Attributes whose value is fetched or navigated to.
const URL_ATTRS: &[&str] = &["href", "src", "action", "formaction", "xlink:href", "poster"];

/// Strip active content from HTML before display.
///
/// Removes `script`, `style`, `iframe`, `object` and `embed` elements and
/// `on*` event attributes. URL attributes outside [`is_safe_url`] become
/// `"#"`. Everything else, including inline `style` attributes, is kept.
pub fn sanitize_html(html: &str) -> String {
    let s = RE_DANGEROUS_BLOCK.replace_all(html, "");
    let s = RE_DANGEROUS_TAG.replace_all(&s, "");
    RE_TAG
        .replace_all(&s, |caps: &Captures| clean_tag(&caps[1], &caps[2]))
        .into_owned()
}

fn clean_tag(name: &str, attrs: &str) -> String {
    let mut out = format!("<{name}");
    for attr in RE_ATTR.captures_iter(attrs) {
        let attr_name = attr[1].to_ascii_lowercase();
        if attr_name.starts_with("on") {
            continue;
        }
        if URL_ATTRS.contains(&attr_name.as_str()) {
            let raw = attr
                .get(2)
                .map(|v| v.as_str().trim_matches(|c| c == '"' || c == '\''))
                .unwrap_or_default();
            let keep = unescape(raw)
                .map(|url| is_safe_url(&url, attr_name == "src"))
                .unwrap_or(false);
            if !keep {
                debug!("Dropping {attr_name} URL from <{name}>");
                out.push_str(&format!(" {}=\"#\"", &attr[1]));
                continue;
            }
        }
        out.push(' ');
        out.push_str(&attr[0]);
    }
    if attrs.trim_end().ends_with('/') {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Whether a decoded URL may appear in displayed rich text.
///
/// ASCII whitespace and control characters are ignored, as browsers do.
/// Relative references and `#` fragments pass; absolute URLs must use
/// `http`, `https` or `mailto`, or `data:image/` when `allow_image_data`.
pub fn is_safe_url(url: &str, allow_image_data: bool) -> bool {
    let url: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    match url.find([':', '/', '?', '#']) {
        Some(i) if url[i..].starts_with(':') => match &url[..i] {
            "http" | "https" | "mailto" => true,
            "data" => allow_image_data && url[i + 1..].starts_with("image/"),
            _ => false,
        },
        _ => true,
    }
}

// ── Paginated navigation ─────────────────────────────────────────────────

/// Navigation state for a paginated document.
///
/// `page_number` stays within `[1, total_pages]`, `scale` within
/// `[MIN_SCALE, MAX_SCALE]`. Until [`PageNavigator::on_document_loaded`]
/// reports a page count, `total_pages` is 0 and paging is inert. No
/// transition ever fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNavigator {
    page_number: usize,
    scale: f32,
    rotation: Rotation,
    total_pages: usize,
}

impl Default for PageNavigator {
    fn default() -> Self {
        Self {
            page_number: 1,
            scale: 1.0,
            rotation: Rotation::Deg0,
            total_pages: 0,
        }
    }
}

impl PageNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Scale as a whole percentage, for labels.
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn can_go_prev(&self) -> bool {
        self.page_number > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    /// Page controls are only worth showing for multi-page documents.
    pub fn shows_pagination(&self) -> bool {
        self.total_pages > 1
    }

    /// The renderer reported `total` pages. Resets to page 1.
    pub fn on_document_loaded(&mut self, total: usize) {
        self.total_pages = total;
        self.page_number = 1;
    }

    pub fn next_page(&mut self) {
        self.change_page(1);
    }

    pub fn prev_page(&mut self) {
        self.change_page(-1);
    }

    /// Jump to `page`, clamped to the document.
    pub fn go_to_page(&mut self, page: usize) {
        if self.total_pages == 0 {
            return;
        }
        self.page_number = page.clamp(1, self.total_pages);
    }

    fn change_page(&mut self, offset: isize) {
        if self.total_pages == 0 {
            return;
        }
        let target = self.page_number.saturating_add_signed(offset);
        self.page_number = target.clamp(1, self.total_pages);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    /// Set scale directly, rounded to two decimals and clamped.
    pub fn set_scale(&mut self, scale: f32) {
        let rounded = (scale * 100.0).round() / 100.0;
        self.scale = rounded.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn rotate(&mut self) {
        self.rotation = self.rotation.next();
    }

    /// Current page, scale and rotation as a render request.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page_number: self.page_number,
            scale: self.scale,
            rotation: self.rotation,
        }
    }
}

/// Whether the page count has been discovered yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    Pending,
    Loaded,
    Failed(String),
    Unavailable,
}

/// Raw PDF bytes plus their navigation state.
#[derive(Clone)]
pub struct PaginatedView {
    source: Option<Arc<[u8]>>,
    navigator: PageNavigator,
    load_state: LoadState,
}

impl fmt::Debug for PaginatedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedView")
            .field("source", &self.source.as_ref().map(|b| b.len()))
            .field("navigator", &self.navigator)
            .field("load_state", &self.load_state)
            .finish()
    }
}

impl PaginatedView {
    pub fn new(source: Option<Arc<[u8]>>) -> Self {
        Self {
            source,
            navigator: PageNavigator::new(),
            load_state: LoadState::Pending,
        }
    }

    pub fn source(&self) -> Option<&[u8]> {
        self.source.as_deref()
    }

    pub fn navigator(&self) -> &PageNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut PageNavigator {
        &mut self.navigator
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Ask `renderer` for the page count.
    ///
    /// On failure the view shows [`PDF_LOAD_ERROR`] and navigation stays
    /// as it was.
    pub async fn load(&mut self, renderer: Arc<dyn PageRenderer>) -> &LoadState {
        let Some(bytes) = self.source.clone() else {
            self.load_state = LoadState::Unavailable;
            return &self.load_state;
        };
        match render::page_count(renderer, bytes).await {
            Ok(total) => {
                debug!("Paginated view loaded: {} pages", total);
                self.navigator.on_document_loaded(total);
                self.load_state = LoadState::Loaded;
            }
            Err(e) => {
                warn!("PDF load failed: {}", e);
                self.load_state = LoadState::Failed(PDF_LOAD_ERROR.to_string());
            }
        }
        &self.load_state
    }

    /// Render the current page at the navigator's scale and rotation.
    pub async fn render_current(
        &self,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<RenderedPage, DocviewError> {
        let request = self.navigator.request();
        let bytes = match (&self.source, self.navigator.total_pages()) {
            (Some(bytes), total) if total > 0 => Arc::clone(bytes),
            (_, total) => {
                return Err(DocviewError::PageOutOfRange {
                    page: request.page_number,
                    total,
                })
            }
        };
        render::render_page(renderer, bytes, request).await
    }
}
