//! Paginated rendering of portable-paper (PDF) documents via pdfium.
//!
//! The viewer only owns navigation state; page counting and rasterising go
//! through the [`PageRenderer`] boundary. [`PdfiumRenderer`] is the default
//! implementation.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and CPU-heavy rendering.
//! [`page_count`] and [`render_page`] move each call onto tokio's blocking
//! pool so async worker threads never stall.
//!
//! ## Binding
//!
//! `PDFIUM_LIB_PATH` names an explicit library file. Without it the system
//! library is used. Binding happens per call, so a missing library surfaces
//! as [`DocviewError::PdfiumBindingFailed`] rather than a panic at startup.

use crate::error::DocviewError;
use crate::pipeline::encode::{self, EncodedImage};
use pdfium_render::prelude::*;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// PDF points are 1/72 inch; the viewer's unit scale is 96 px per inch.
const POINTS_TO_PIXELS: f32 = 96.0 / 72.0;

/// Clockwise page rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Advance by 90° modulo 360.
    pub fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// Nearest quarter turn at or below `degrees` (mod 360).
    pub fn from_degrees(degrees: u16) -> Self {
        match (degrees % 360) / 90 {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    fn to_pdfium(self) -> PdfPageRenderRotation {
        match self {
            Self::Deg0 => PdfPageRenderRotation::None,
            Self::Deg90 => PdfPageRenderRotation::Degrees90,
            Self::Deg180 => PdfPageRenderRotation::Degrees180,
            Self::Deg270 => PdfPageRenderRotation::Degrees270,
        }
    }
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u16(self.degrees())
    }
}

/// One page to render. `page_number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: usize,
    pub scale: f32,
    pub rotation: Rotation,
}

/// A rasterised page as base64 PNG.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub page_number: usize,
    pub width: u32,
    pub height: u32,
    pub image: EncodedImage,
}

/// Paginated binary-rendering boundary.
///
/// Calls are blocking; use [`page_count`] and [`render_page`] from async code.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self, bytes: &[u8]) -> Result<usize, DocviewError>;

    fn render_page(&self, bytes: &[u8], request: PageRequest) -> Result<RenderedPage, DocviewError>;
}

/// [`PageRenderer`] backed by `pdfium-render`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Honour `PDFIUM_LIB_PATH`, falling back to the system library.
    pub fn from_env() -> Self {
        Self {
            library_path: std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from),
        }
    }

    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, DocviewError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path).map_err(|e| {
                DocviewError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
            })?,
            None => Pdfium::bind_to_system_library()
                .map_err(|e| DocviewError::PdfiumBindingFailed(format!("{:?}", e)))?,
        };
        Ok(Pdfium::new(bindings))
    }
}

fn load<'a>(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<PdfDocument<'a>, DocviewError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| DocviewError::CorruptPdf {
            detail: format!("{:?}", e),
        })
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self, bytes: &[u8]) -> Result<usize, DocviewError> {
        let pdfium = self.bind()?;
        let document = load(&pdfium, bytes)?;
        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        Ok(total)
    }

    fn render_page(&self, bytes: &[u8], request: PageRequest) -> Result<RenderedPage, DocviewError> {
        let pdfium = self.bind()?;
        let document = load(&pdfium, bytes)?;
        let pages = document.pages();
        let total = pages.len() as usize;
        let page_number = request.page_number;
        if page_number == 0 || page_number > total {
            return Err(DocviewError::PageOutOfRange {
                page: page_number,
                total,
            });
        }

        let page = pages
            .get((page_number - 1) as u16)
            .map_err(|e| DocviewError::RenderFailed {
                page: page_number,
                detail: format!("{:?}", e),
            })?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(request.scale * POINTS_TO_PIXELS)
            .rotate(request.rotation.to_pdfium(), true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| DocviewError::RenderFailed {
                page: page_number,
                detail: format!("{:?}", e),
            })?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_number,
            image.width(),
            image.height()
        );

        let encoded = encode::encode_page(&image).map_err(|e| DocviewError::RenderFailed {
            page: page_number,
            detail: e.to_string(),
        })?;
        Ok(RenderedPage {
            page_number,
            width: image.width(),
            height: image.height(),
            image: encoded,
        })
    }
}

/// Count pages on the blocking pool.
pub async fn page_count(
    renderer: Arc<dyn PageRenderer>,
    bytes: Arc<[u8]>,
) -> Result<usize, DocviewError> {
    tokio::task::spawn_blocking(move || renderer.page_count(&bytes))
        .await
        .map_err(|e| DocviewError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Render one page on the blocking pool.
pub async fn render_page(
    renderer: Arc<dyn PageRenderer>,
    bytes: Arc<[u8]>,
    request: PageRequest,
) -> Result<RenderedPage, DocviewError> {
    tokio::task::spawn_blocking(move || renderer.render_page(&bytes, request))
        .await
        .map_err(|e| DocviewError::Internal(format!("Render task panicked: {}", e)))?
}
