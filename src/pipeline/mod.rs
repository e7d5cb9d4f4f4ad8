//! Pipeline stages from uploaded file to displayable content.
//!
//! Each submodule implements one step, so each is testable on its own and
//! a backend (DOCX decoder, page renderer) can be swapped behind its trait
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ingest ──▶ resolve ──▶ docx ──▶ style
//! (bytes)   (record)   (cache)     (XML)    (post-pass)
//!
//! render ──▶ encode
//! (pdfium)   (base64 PNG)
//! ```
//!
//! 1. [`input`]: the uploaded file: name, size, bytes
//! 2. [`ingest`]: format detection, eager extraction, batch ordering
//! 3. [`resolve`]: cache-first content resolution with single-flight
//!    extraction per document
//! 4. [`docx`]: OOXML → HTML; runs in `spawn_blocking`
//! 5. [`style`]: style-name mapping and the presentation post-pass
//! 6. [`render`]: PDF page counting and rasterising through pdfium
//! 7. [`encode`]: data URIs for embedded images and rendered pages

pub mod docx;
pub mod encode;
pub mod ingest;
pub mod input;
pub mod render;
pub mod resolve;
pub mod style;
