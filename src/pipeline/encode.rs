//! Image encoding: raw bytes or a rendered `DynamicImage` → base64.
//!
//! Rich-text HTML never references external files. Pictures embedded in a
//! DOCX (`word/media/*`) are inlined as `data:` URIs, and rendered PDF pages
//! travel as base64 PNG so a viewer can show them without touching disk.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

/// Base64 payload plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decoded payload bytes, e.g. to write a rendered page to disk.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Encode raw bytes as a `data:` URI.
pub fn data_uri(bytes: &[u8], mime_type: &str) -> String {
    EncodedImage::from_bytes(bytes, mime_type).data_uri()
}

/// MIME type for a media part, chosen by extension.
pub fn mime_for_path(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

/// Encode a rasterised page as a base64 PNG.
///
/// PNG keeps rendered text crisp; JPEG artefacts are visible on glyph edges.
pub fn encode_page(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let encoded = EncodedImage::from_bytes(&buf, "image/png");
    debug!("Encoded page → {} bytes base64", encoded.data.len());
    Ok(encoded)
}
