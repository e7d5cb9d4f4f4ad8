//! Rich-text extraction: DOCX (OOXML zip) → styled HTML fragment.
//!
//! ## Parts read
//!
//! | Part | Use |
//! |------|-----|
//! | `word/document.xml` | body (required) |
//! | `word/styles.xml` | style id → display name |
//! | `word/_rels/document.xml.rels` | hyperlink and image targets |
//! | `word/numbering.xml` | bullet vs ordered lists |
//! | `word/media/*` | embedded pictures |
//!
//! Every part read is capped at `max_part_bytes` after decompression, so a
//! zip bomb fails with [`ExtractError::PartTooLarge`] instead of exhausting
//! memory.
//!
//! Decoding is two passes: the XML is parsed into a small block model, then
//! the model is emitted as HTML and handed to
//! [`crate::pipeline::style::apply_presentation`]. The decoder holds no state
//! between calls, so the same bytes always produce the same HTML.

use crate::config::DEFAULT_MAX_PART_BYTES;
use crate::error::ExtractError;
use crate::pipeline::encode;
use crate::pipeline::style::{apply_presentation, StyleMap, StyleTarget};
use crate::viewer::is_safe_url;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tracing::debug;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const NUMBERING_PART: &str = "word/numbering.xml";

/// Deepest list level OOXML defines (`w:ilvl` runs 0..=8).
const MAX_LIST_LEVEL: u32 = 8;

/// Converts rich-document bytes into an HTML fragment.
///
/// Implementations must be pure: no dependency on earlier calls.
pub trait RichTextDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], style_map: &StyleMap) -> Result<String, ExtractError>;
}

/// Default [`RichTextDecoder`] backed by `zip` + `quick-xml`.
#[derive(Debug, Clone)]
pub struct DocxDecoder {
    max_part_bytes: u64,
    embed_images: bool,
}

impl Default for DocxDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PART_BYTES, true)
    }
}

impl DocxDecoder {
    pub fn new(max_part_bytes: u64, embed_images: bool) -> Self {
        Self {
            max_part_bytes,
            embed_images,
        }
    }
}

impl RichTextDecoder for DocxDecoder {
    fn decode(&self, bytes: &[u8], style_map: &StyleMap) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            ExtractError::Archive {
                detail: e.to_string(),
            }
        })?;

        let document = read_part(&mut archive, DOCUMENT_PART, self.max_part_bytes)?.ok_or_else(
            || ExtractError::MissingPart {
                part: DOCUMENT_PART.to_string(),
            },
        )?;

        let mut styles = StyleNames::default();
        if let Some(xml) = read_part(&mut archive, STYLES_PART, self.max_part_bytes)? {
            walk(&xml, STYLES_PART, &mut styles)?;
        }
        let mut rels = Relationships::default();
        if let Some(xml) = read_part(&mut archive, RELS_PART, self.max_part_bytes)? {
            walk(&xml, RELS_PART, &mut rels)?;
        }
        let mut numbering = Numbering::default();
        if let Some(xml) = read_part(&mut archive, NUMBERING_PART, self.max_part_bytes)? {
            walk(&xml, NUMBERING_PART, &mut numbering)?;
        }

        let mut parser = DocumentParser::new(&rels);
        walk(&document, DOCUMENT_PART, &mut parser)?;
        let blocks = parser.finish();
        debug!(
            "Parsed {} top-level blocks ({} styles, {} relationships)",
            blocks.len(),
            styles.names.len(),
            rels.targets.len()
        );

        let mut emitter = HtmlEmitter {
            style_map,
            styles: &styles,
            numbering: &numbering,
            rels: &rels,
            media: self.embed_images.then_some(&mut archive),
            max_part_bytes: self.max_part_bytes,
            images: HashMap::new(),
            out: String::with_capacity(document.len() / 2),
        };
        emitter.blocks(&blocks)?;

        Ok(apply_presentation(&emitter.out))
    }
}

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// Read one zip entry, at most `max_bytes` after decompression.
/// `Ok(None)` when the entry is absent.
fn read_part(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Option<Vec<u8>>, ExtractError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(ExtractError::Archive {
                detail: e.to_string(),
            })
        }
    };
    let mut out = Vec::new();
    entry
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Archive {
            detail: format!("{name}: {e}"),
        })?;
    if out.len() as u64 > max_bytes {
        return Err(ExtractError::PartTooLarge {
            part: name.to_string(),
            limit: max_bytes,
        });
    }
    Ok(Some(out))
}

// ── XML walking ──────────────────────────────────────────────────────────

trait XmlVisitor {
    fn open(&mut self, e: &BytesStart<'_>);

    fn close(&mut self, _name: QName<'_>) {}

    fn wants_text(&self) -> bool {
        false
    }

    fn text(&mut self, _text: &str) {}
}

/// Drive `visitor` over every event of `xml`. Self-closing elements are
/// reported as an open immediately followed by a close.
fn walk(xml: &[u8], part: &str, visitor: &mut impl XmlVisitor) -> Result<(), ExtractError> {
    let xml_error = |e: quick_xml::Error| ExtractError::Xml {
        part: part.to_string(),
        detail: e.to_string(),
    };

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => visitor.open(&e),
            Ok(Event::Empty(e)) => {
                visitor.open(&e);
                visitor.close(e.name());
            }
            Ok(Event::End(e)) => visitor.close(e.name()),
            Ok(Event::Text(te)) if visitor.wants_text() => {
                let text = te.unescape().map_err(xml_error)?;
                visitor.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn list_level(raw: Option<String>) -> u32 {
    raw.and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0)
        .min(MAX_LIST_LEVEL)
}

/// Local name of a WordprocessingML element (`w:` or unprefixed).
/// DrawingML text (`a:r`, `a:t`) is filtered out here.
fn word_local<'n>(name: QName<'n>) -> Option<&'n [u8]> {
    match name.prefix() {
        Some(p) if p.as_ref() != b"w" => None,
        _ => Some(name.local_name().into_inner()),
    }
}

/// `<w:b/>` is on; `<w:b w:val="0"/>` and `"false"` are off.
fn toggle_on(e: &BytesStart<'_>) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("0" | "false" | "off"))
}

// ── Auxiliary parts ──────────────────────────────────────────────────────

#[derive(Default)]
struct StyleNames {
    names: HashMap<String, String>,
    current: Option<String>,
}

impl StyleNames {
    fn display_name(&self, style_id: &str) -> Option<&str> {
        self.names.get(style_id).map(String::as_str)
    }
}

impl XmlVisitor for StyleNames {
    fn open(&mut self, e: &BytesStart<'_>) {
        match word_local(e.name()) {
            Some(b"style") => self.current = attr(e, b"styleId"),
            Some(b"name") => {
                if let (Some(id), Some(name)) = (self.current.as_ref(), attr(e, b"val")) {
                    self.names.insert(id.clone(), name);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: QName<'_>) {
        if matches!(word_local(name), Some(b"style")) {
            self.current = None;
        }
    }
}

#[derive(Default)]
struct Relationships {
    targets: HashMap<String, String>,
}

impl Relationships {
    fn target(&self, id: &str) -> Option<&str> {
        self.targets.get(id).map(String::as_str)
    }
}

impl XmlVisitor for Relationships {
    fn open(&mut self, e: &BytesStart<'_>) {
        if e.local_name().as_ref() == b"Relationship" {
            if let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) {
                self.targets.insert(id, target);
            }
        }
    }
}

/// numId → abstractNumId → per-level ordered flag.
#[derive(Default)]
struct Numbering {
    ordered: HashMap<(String, u32), bool>,
    abstract_of: HashMap<String, String>,
    current_abstract: Option<String>,
    current_level: u32,
    current_num: Option<String>,
}

impl Numbering {
    fn is_ordered(&self, num_id: &str, level: u32) -> bool {
        self.abstract_of
            .get(num_id)
            .and_then(|abs| self.ordered.get(&(abs.clone(), level)))
            .copied()
            .unwrap_or(false)
    }
}

impl XmlVisitor for Numbering {
    fn open(&mut self, e: &BytesStart<'_>) {
        match word_local(e.name()) {
            Some(b"abstractNum") => self.current_abstract = attr(e, b"abstractNumId"),
            Some(b"lvl") => {
                self.current_level = list_level(attr(e, b"ilvl"))
            }
            Some(b"numFmt") => {
                if let (Some(abs), Some(fmt)) = (self.current_abstract.as_ref(), attr(e, b"val")) {
                    self.ordered
                        .insert((abs.clone(), self.current_level), fmt != "bullet" && fmt != "none");
                }
            }
            Some(b"num") => self.current_num = attr(e, b"numId"),
            Some(b"abstractNumId") => {
                if let (Some(num), Some(abs)) = (self.current_num.as_ref(), attr(e, b"val")) {
                    self.abstract_of.insert(num.clone(), abs);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: QName<'_>) {
        match word_local(name) {
            Some(b"abstractNum") => self.current_abstract = None,
            Some(b"num") => self.current_num = None,
            _ => {}
        }
    }
}

// ── Block model ──────────────────────────────────────────────────────────

#[derive(Debug)]
enum Block {
    Paragraph(Paragraph),
    /// rows → cells → cell content
    Table(Vec<Vec<Vec<Block>>>),
}

#[derive(Debug, Default)]
struct Paragraph {
    style_id: Option<String>,
    num_id: Option<String>,
    level: u32,
    inlines: Vec<Inline>,
}

#[derive(Debug)]
enum Inline {
    Text(Run),
    Break,
    Image { rel_id: String, alt: String },
}

#[derive(Debug, Clone, Default)]
struct RunProps {
    bold: bool,
    italic: bool,
    style_id: Option<String>,
}

#[derive(Debug)]
struct Run {
    text: String,
    props: RunProps,
    link: Option<String>,
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<Vec<Block>>>,
    row: Vec<Vec<Block>>,
}

struct DocumentParser<'r> {
    rels: &'r Relationships,
    /// Block containers: the body at index 0, open table cells above it.
    containers: Vec<Vec<Block>>,
    tables: Vec<TableBuilder>,
    paragraphs: Vec<Paragraph>,
    in_run: bool,
    in_text: bool,
    run: RunProps,
    link: Option<String>,
    pending_alt: Option<String>,
}

impl<'r> DocumentParser<'r> {
    fn new(rels: &'r Relationships) -> Self {
        Self {
            rels,
            containers: vec![Vec::new()],
            tables: Vec::new(),
            paragraphs: Vec::new(),
            in_run: false,
            in_text: false,
            run: RunProps::default(),
            link: None,
            pending_alt: None,
        }
    }

    fn push_block(&mut self, block: Block) {
        if let Some(container) = self.containers.last_mut() {
            container.push(block);
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        if let Some(p) = self.paragraphs.last_mut() {
            p.inlines.push(inline);
        }
    }

    fn push_text(&mut self, text: &str) {
        let run = Run {
            text: text.to_string(),
            props: self.run.clone(),
            link: self.link.clone(),
        };
        self.push_inline(Inline::Text(run));
    }

    fn finish(mut self) -> Vec<Block> {
        while let Some(p) = self.paragraphs.pop() {
            self.push_block(Block::Paragraph(p));
        }
        self.containers.swap_remove(0)
    }
}

impl XmlVisitor for DocumentParser<'_> {
    fn open(&mut self, e: &BytesStart<'_>) {
        let local = e.local_name();
        // Drawing elements live outside the w: namespace.
        match local.as_ref() {
            b"docPr" => {
                self.pending_alt = attr(e, b"descr");
                return;
            }
            b"blip" => {
                if let Some(rel_id) = attr(e, b"embed") {
                    let alt = self.pending_alt.take().unwrap_or_default();
                    self.push_inline(Inline::Image { rel_id, alt });
                }
                return;
            }
            _ => {}
        }

        let Some(name) = word_local(e.name()) else {
            return;
        };
        match name {
            b"p" => self.paragraphs.push(Paragraph::default()),
            b"pStyle" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.style_id = attr(e, b"val");
                }
            }
            b"numId" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.num_id = attr(e, b"val").filter(|v| v != "0");
                }
            }
            b"ilvl" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.level = list_level(attr(e, b"val"));
                }
            }
            b"r" => {
                self.in_run = true;
                self.run = RunProps::default();
            }
            b"rStyle" if self.in_run => self.run.style_id = attr(e, b"val"),
            b"b" if self.in_run => self.run.bold = toggle_on(e),
            b"i" if self.in_run => self.run.italic = toggle_on(e),
            b"t" if self.in_run => self.in_text = true,
            b"tab" if self.in_run => self.push_text("\t"),
            b"br" | b"cr" if self.in_run => self.push_inline(Inline::Break),
            b"hyperlink" => {
                self.link = attr(e, b"id")
                    .and_then(|id| self.rels.target(&id).map(str::to_string))
                    .or_else(|| attr(e, b"anchor").map(|a| format!("#{a}")));
            }
            b"tbl" => self.tables.push(TableBuilder::default()),
            b"tr" => {
                if let Some(t) = self.tables.last_mut() {
                    t.row = Vec::new();
                }
            }
            b"tc" if !self.tables.is_empty() => self.containers.push(Vec::new()),
            _ => {}
        }
    }

    fn close(&mut self, name: QName<'_>) {
        let Some(name) = word_local(name) else {
            return;
        };
        match name {
            b"p" => {
                if let Some(p) = self.paragraphs.pop() {
                    self.push_block(Block::Paragraph(p));
                }
            }
            b"r" => self.in_run = false,
            b"t" => self.in_text = false,
            b"hyperlink" => self.link = None,
            b"tc" if !self.tables.is_empty() && self.containers.len() > 1 => {
                if let (Some(cell), Some(t)) = (self.containers.pop(), self.tables.last_mut()) {
                    t.row.push(cell);
                }
            }
            b"tr" => {
                if let Some(t) = self.tables.last_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                }
            }
            b"tbl" => {
                if let Some(t) = self.tables.pop() {
                    self.push_block(Block::Table(t.rows));
                }
            }
            _ => {}
        }
    }

    fn wants_text(&self) -> bool {
        self.in_text
    }

    fn text(&mut self, text: &str) {
        self.push_text(text);
    }
}

// ── HTML emission ────────────────────────────────────────────────────────

struct ListFrame {
    tag: &'static str,
    has_open_li: bool,
}

struct HtmlEmitter<'a, 'z> {
    style_map: &'a StyleMap,
    styles: &'a StyleNames,
    numbering: &'a Numbering,
    rels: &'a Relationships,
    media: Option<&'a mut Archive<'z>>,
    max_part_bytes: u64,
    /// rel id → data URI (None when the media part is missing)
    images: HashMap<String, Option<String>>,
    out: String,
}

impl HtmlEmitter<'_, '_> {
    fn blocks(&mut self, blocks: &[Block]) -> Result<(), ExtractError> {
        let mut lists: Vec<ListFrame> = Vec::new();
        for block in blocks {
            match block {
                Block::Paragraph(p) if p.num_id.is_some() => self.list_item(&mut lists, p)?,
                Block::Paragraph(p) => {
                    self.close_lists(&mut lists, 0);
                    self.paragraph(p)?;
                }
                Block::Table(rows) => {
                    self.close_lists(&mut lists, 0);
                    self.table(rows)?;
                }
            }
        }
        self.close_lists(&mut lists, 0);
        Ok(())
    }

    fn close_lists(&mut self, lists: &mut Vec<ListFrame>, depth: usize) {
        while lists.len() > depth {
            if let Some(frame) = lists.pop() {
                if frame.has_open_li {
                    self.out.push_str("</li>");
                }
                self.out.push_str(&format!("</{}>", frame.tag));
            }
        }
    }

    fn list_item(&mut self, lists: &mut Vec<ListFrame>, p: &Paragraph) -> Result<(), ExtractError> {
        let num_id = p.num_id.as_deref().unwrap_or_default();
        let tag = if self.numbering.is_ordered(num_id, p.level) {
            "ol"
        } else {
            "ul"
        };
        let depth = p.level as usize + 1;

        self.close_lists(lists, depth);
        if lists.len() == depth && lists.last().map(|f| f.tag) != Some(tag) {
            self.close_lists(lists, depth - 1);
        }
        while lists.len() < depth {
            if let Some(parent) = lists.last_mut() {
                if !parent.has_open_li {
                    self.out.push_str("<li>");
                    parent.has_open_li = true;
                }
            }
            let frame_tag = if lists.len() + 1 == depth { tag } else { "ul" };
            self.out.push_str(&format!("<{frame_tag}>"));
            lists.push(ListFrame {
                tag: frame_tag,
                has_open_li: false,
            });
        }

        if let Some(frame) = lists.last_mut() {
            if frame.has_open_li {
                self.out.push_str("</li>");
            }
            frame.has_open_li = true;
        }
        self.out.push_str("<li>");
        self.inlines(&p.inlines)
    }

    fn paragraph(&mut self, p: &Paragraph) -> Result<(), ExtractError> {
        let target = p
            .style_id
            .as_deref()
            .and_then(|id| self.style_map.paragraph(id, self.styles.display_name(id)))
            .cloned()
            .unwrap_or_else(|| StyleTarget::new("p"));
        self.out.push_str(&target.open_tag());
        self.inlines(&p.inlines)?;
        self.out.push_str(&target.close_tag());
        Ok(())
    }

    fn table(&mut self, rows: &[Vec<Vec<Block>>]) -> Result<(), ExtractError> {
        self.out.push_str("<table>");
        for row in rows {
            self.out.push_str("<tr>");
            for cell in row {
                self.out.push_str("<td>");
                self.blocks(cell)?;
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
        Ok(())
    }

    fn inlines(&mut self, inlines: &[Inline]) -> Result<(), ExtractError> {
        let mut open_link: Option<&str> = None;
        for inline in inlines {
            let link = match inline {
                Inline::Text(run) => run.link.as_deref().filter(|href| is_safe_url(href, false)),
                _ => None,
            };
            if link != open_link {
                if open_link.is_some() {
                    self.out.push_str("</a>");
                }
                if let Some(href) = link {
                    self.out.push_str(&format!("<a href=\"{}\">", escape(href)));
                }
                open_link = link;
            }

            match inline {
                Inline::Text(run) => self.run(run),
                Inline::Break => self.out.push_str("<br>"),
                Inline::Image { rel_id, alt } => self.image(rel_id, alt)?,
            }
        }
        if open_link.is_some() {
            self.out.push_str("</a>");
        }
        Ok(())
    }

    fn run(&mut self, run: &Run) {
        if run.text.is_empty() {
            return;
        }
        let mut wrappers: Vec<StyleTarget> = Vec::new();
        if let Some(target) = run
            .props
            .style_id
            .as_deref()
            .and_then(|id| self.style_map.run(id, self.styles.display_name(id)))
        {
            wrappers.push(target.clone());
        }
        if run.props.bold && !wrappers.iter().any(|w| w.tag == "strong") {
            wrappers.push(StyleTarget::new("strong"));
        }
        if run.props.italic && !wrappers.iter().any(|w| w.tag == "em") {
            wrappers.push(StyleTarget::new("em"));
        }

        for w in &wrappers {
            self.out.push_str(&w.open_tag());
        }
        self.out.push_str(&partial_escape(run.text.as_str()));
        for w in wrappers.iter().rev() {
            self.out.push_str(&w.close_tag());
        }
    }

    fn image(&mut self, rel_id: &str, alt: &str) -> Result<(), ExtractError> {
        if self.media.is_none() {
            return Ok(());
        }
        if !self.images.contains_key(rel_id) {
            let uri = self.load_image(rel_id)?;
            self.images.insert(rel_id.to_string(), uri);
        }
        if let Some(Some(uri)) = self.images.get(rel_id) {
            let tag = format!("<img src=\"{}\" alt=\"{}\">", uri, escape(alt));
            self.out.push_str(&tag);
        }
        Ok(())
    }

    fn load_image(&mut self, rel_id: &str) -> Result<Option<String>, ExtractError> {
        let Some(target) = self.rels.target(rel_id) else {
            debug!("Image relationship {rel_id} has no target, skipping");
            return Ok(None);
        };
        let path = match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("word/{target}"),
        };
        let Some(archive) = self.media.as_deref_mut() else {
            return Ok(None);
        };
        match read_part(archive, &path, self.max_part_bytes)? {
            Some(bytes) => Ok(Some(encode::data_uri(&bytes, encode::mime_for_path(&path)))),
            None => {
                debug!("Media part {path} missing, skipping image");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#;

    fn docx(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            for (name, body) in parts {
                zip.start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(body).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    fn document(body: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {W_NS}><w:body>{body}</w:body></w:document>"#)
    }

    fn decode_body(body: &str) -> String {
        let xml = document(body);
        let bytes = docx(&[(DOCUMENT_PART, xml.as_bytes())]);
        DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap()
    }

    /// Strip `style` and `data-doc-element-id` decoration for structural asserts.
    fn bare(html: &str) -> String {
        let re = regex::Regex::new(r#" (style|data-doc-element-id)="[^"]*""#).unwrap();
        re.replace_all(html, "").into_owned()
    }

    const NUMBERING: &str = r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
        <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl><w:lvl w:ilvl="1"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
        <w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
        <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
        <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
    </w:numbering>"#;

    fn list_para(num: &str, level: u32, text: &str) -> String {
        format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{level}"/><w:numId w:val="{num}"/></w:numPr></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
        )
    }

    #[test]
    fn heading_by_style_id() {
        let html = decode_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>"#,
        );
        assert_eq!(bare(&html), "<h1>Intro</h1>");
        assert!(html.contains("data-doc-element-id=\"el-0\""));
    }

    #[test]
    fn heading_by_display_name_from_styles_part() {
        let styles = format!(
            r#"<w:styles {W_NS}><w:style w:type="paragraph" w:styleId="Berschrift2"><w:name w:val="heading 2"/></w:style></w:styles>"#
        );
        let xml = document(
            r#"<w:p><w:pPr><w:pStyle w:val="Berschrift2"/></w:pPr><w:r><w:t>Methods</w:t></w:r></w:p>"#,
        );
        let bytes = docx(&[
            (DOCUMENT_PART, xml.as_bytes()),
            (STYLES_PART, styles.as_bytes()),
        ]);
        let html = DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap();
        assert_eq!(bare(&html), "<h2>Methods</h2>");
    }

    #[test]
    fn bold_italic_and_merge() {
        let html = decode_body(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Bold </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>text</w:t></w:r><w:r><w:rPr><w:i/><w:b w:val="0"/></w:rPr><w:t> it</w:t></w:r></w:p>"#,
        );
        assert_eq!(bare(&html), "<p><strong>Bold text</strong><em> it</em></p>");
    }

    #[test]
    fn text_is_escaped() {
        let html = decode_body(r#"<w:p><w:r><w:t>a &lt; b &amp; c</w:t></w:r></w:p>"#);
        assert_eq!(bare(&html), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn empty_paragraph_is_br_and_break_and_tab() {
        let html = decode_body(
            r#"<w:p/><w:p><w:r><w:t>a</w:t><w:br/><w:t>b</w:t><w:tab/><w:t>c</w:t></w:r></w:p>"#,
        );
        assert_eq!(bare(&html), "<br><p>a<br>b\tc</p>");
    }

    #[test]
    fn nested_lists_by_numbering() {
        let body = [
            list_para("1", 0, "one"),
            list_para("1", 1, "one.a"),
            list_para("1", 0, "two"),
            r#"<w:p><w:r><w:t>after</w:t></w:r></w:p>"#.to_string(),
            list_para("2", 0, "first"),
        ]
        .concat();
        let xml = document(&body);
        let bytes = docx(&[
            (DOCUMENT_PART, xml.as_bytes()),
            (NUMBERING_PART, NUMBERING.as_bytes()),
        ]);
        let html = DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap();
        assert_eq!(
            bare(&html),
            "<ul><li>one<ol><li>one.a</li></ol></li><li>two</li></ul><p>after</p><ol><li>first</li></ol>"
        );
    }

    #[test]
    fn list_depth_is_capped_at_the_deepest_ooxml_level() {
        let body = [list_para("1", 200_000, "deep"), list_para("1", 4_294_967_295, "deeper")].concat();
        let html = decode_body(&body);
        assert_eq!(html.matches("<ul").count(), 9, "got: {html}");
        assert_eq!(html.matches("<li").count(), 10);
        assert!(html.contains(">deeper</li>"));
    }

    #[test]
    fn unknown_numbering_defaults_to_bullets() {
        let html = decode_body(&list_para("9", 0, "x"));
        assert_eq!(bare(&html), "<ul><li>x</li></ul>");
    }

    #[test]
    fn table_cells_hold_paragraphs() {
        let html = decode_body(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B1</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        assert_eq!(
            bare(&html),
            "<table><tr><td><p>A1</p></td><td><p>B1</p></td></tr></table>"
        );
    }

    #[test]
    fn hyperlink_resolves_through_rels() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/></Relationships>"#;
        let xml = document(
            r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId7"><w:r><w:t>site</w:t></w:r></w:hyperlink></w:p>"#,
        );
        let bytes = docx(&[(DOCUMENT_PART, xml.as_bytes()), (RELS_PART, rels.as_bytes())]);
        let html = DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap();
        assert_eq!(
            bare(&html),
            "<p>See <a href=\"https://example.com/?a=1&amp;b=2\">site</a></p>"
        );
    }

    #[test]
    fn script_hyperlink_keeps_text_but_drops_anchor() {
        for target in ["javascript:alert(1)", "java&#9;script:alert(1)", "JaVaScRiPt&#x0A;:alert(1)", "vbscript:msgbox(1)"] {
            let rels = format!(
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="{target}" TargetMode="External"/></Relationships>"#
            );
            let xml = document(
                r#"<w:p><w:hyperlink r:id="rId3"><w:r><w:t>click</w:t></w:r></w:hyperlink></w:p>"#,
            );
            let bytes = docx(&[(DOCUMENT_PART, xml.as_bytes()), (RELS_PART, rels.as_bytes())]);
            let html = DocxDecoder::default()
                .decode(&bytes, &StyleMap::default())
                .unwrap();
            assert_eq!(bare(&html), "<p>click</p>", "target {target}");
        }
    }

    #[test]
    fn image_becomes_data_uri() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/></Relationships>"#;
        let xml = document(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1" descr="Logo"/><a:graphic><a:graphicData><a:blip r:embed="rId9"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        );
        let bytes = docx(&[
            (DOCUMENT_PART, xml.as_bytes()),
            (RELS_PART, rels.as_bytes()),
            ("word/media/image1.png", b"PNGDATA"),
        ]);
        let html = DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap();
        assert_eq!(
            bare(&html),
            "<p><img src=\"data:image/png;base64,UE5HREFUQQ==\" alt=\"Logo\"></p>"
        );

        let without = DocxDecoder::new(DEFAULT_MAX_PART_BYTES, false)
            .decode(&bytes, &StyleMap::default())
            .unwrap();
        assert!(!without.contains("<img"));
    }

    #[test]
    fn drawingml_text_is_ignored() {
        let html = decode_body(
            r#"<w:p><w:r><w:t>body</w:t><w:drawing><a:r><a:t>shape text</a:t></a:r></w:drawing></w:r></w:p>"#,
        );
        assert_eq!(bare(&html), "<p>body</p>");
    }

    #[test]
    fn not_a_zip_is_archive_error() {
        let err = DocxDecoder::default()
            .decode(b"not a zip", &StyleMap::default())
            .unwrap_err();
        assert!(matches!(err, ExtractError::Archive { .. }));
    }

    #[test]
    fn missing_document_part() {
        let bytes = docx(&[("word/styles.xml", b"<w:styles/>")]);
        let err = DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::MissingPart {
                part: DOCUMENT_PART.into()
            }
        );
    }

    #[test]
    fn oversized_part_rejected() {
        let xml = document(&"<w:p><w:r><w:t>padding</w:t></w:r></w:p>".repeat(100));
        let bytes = docx(&[(DOCUMENT_PART, xml.as_bytes())]);
        let err = DocxDecoder::new(1024, true)
            .decode(&bytes, &StyleMap::default())
            .unwrap_err();
        assert!(matches!(err, ExtractError::PartTooLarge { limit: 1024, .. }));
    }

    #[test]
    fn malformed_xml_is_xml_error() {
        let bytes = docx(&[(DOCUMENT_PART, b"<w:document><w:body></w:p></w:document>")]);
        let err = DocxDecoder::default()
            .decode(&bytes, &StyleMap::default())
            .unwrap_err();
        assert!(matches!(err, ExtractError::Xml { .. }));
    }

    #[test]
    fn same_bytes_same_html() {
        let xml = document(r#"<w:p><w:r><w:t>x</w:t></w:r></w:p>"#);
        let bytes = docx(&[(DOCUMENT_PART, xml.as_bytes())]);
        let decoder = DocxDecoder::default();
        let a = decoder.decode(&bytes, &StyleMap::default()).unwrap();
        let b = decoder.decode(&bytes, &StyleMap::default()).unwrap();
        assert_eq!(a, b);
    }
}
