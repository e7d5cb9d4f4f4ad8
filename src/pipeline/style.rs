//! Style mapping and the presentation post-pass for rich-text HTML.
//!
//! The DOCX decoder asks a [`StyleMap`] which element a named paragraph or
//! run style becomes. Once the HTML is assembled, [`apply_presentation`]
//! runs a fixed sequence of pure rewrite rules over it.
//!
//! ## Rule Order
//!
//! Inline merging runs first so the empty-paragraph rule sees the final
//! markup. Decoration runs last because it numbers elements, and the
//! numbering must match what the viewer finally shows.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Target element (and optional class) for a named style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTarget {
    pub tag: String,
    pub class: Option<String>,
}

impl StyleTarget {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// `<tag>` or `<tag class="…">`.
    pub fn open_tag(&self) -> String {
        match &self.class {
            Some(class) => format!("<{} class=\"{}\">", self.tag, class),
            None => format!("<{}>", self.tag),
        }
    }

    pub fn close_tag(&self) -> String {
        format!("</{}>", self.tag)
    }
}

/// Mapping from DOCX style names to HTML elements.
///
/// Keys are matched case- and whitespace-insensitively, so `"Heading 1"`,
/// `"heading1"` and the style id `"Heading1"` all hit the same entry.
#[derive(Debug, Clone)]
pub struct StyleMap {
    paragraph: HashMap<String, StyleTarget>,
    run: HashMap<String, StyleTarget>,
}

impl Default for StyleMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for level in 1..=6 {
            map = map.paragraph_style(format!("Heading {level}"), StyleTarget::new(format!("h{level}")));
        }
        map.paragraph_style("Title", StyleTarget::new("h1").with_class("title"))
            .paragraph_style("Subtitle", StyleTarget::new("h2").with_class("subtitle"))
            .paragraph_style("Quote", StyleTarget::new("blockquote"))
            .paragraph_style(
                "Intense Quote",
                StyleTarget::new("blockquote").with_class("intense"),
            )
            .run_style("Strong", StyleTarget::new("strong"))
            .run_style("Emphasis", StyleTarget::new("em"))
    }
}

impl StyleMap {
    /// A map with no entries: every paragraph becomes `<p>`.
    pub fn empty() -> Self {
        Self {
            paragraph: HashMap::new(),
            run: HashMap::new(),
        }
    }

    pub fn paragraph_style(mut self, name: impl AsRef<str>, target: StyleTarget) -> Self {
        self.paragraph.insert(normalize(name.as_ref()), target);
        self
    }

    pub fn run_style(mut self, name: impl AsRef<str>, target: StyleTarget) -> Self {
        self.run.insert(normalize(name.as_ref()), target);
        self
    }

    /// Resolve a paragraph style by display name first, then by id.
    pub fn paragraph(&self, style_id: &str, display_name: Option<&str>) -> Option<&StyleTarget> {
        lookup(&self.paragraph, style_id, display_name)
    }

    pub fn run(&self, style_id: &str, display_name: Option<&str>) -> Option<&StyleTarget> {
        lookup(&self.run, style_id, display_name)
    }

    pub fn len(&self) -> usize {
        self.paragraph.len() + self.run.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lookup<'a>(
    table: &'a HashMap<String, StyleTarget>,
    style_id: &str,
    display_name: Option<&str>,
) -> Option<&'a StyleTarget> {
    display_name
        .and_then(|name| table.get(&normalize(name)))
        .or_else(|| table.get(&normalize(style_id)))
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Presentation table ───────────────────────────────────────────────────

/// Fixed inline presentation for a decorated block element.
pub fn presentation_for(tag: &str, class: Option<&str>) -> Option<&'static str> {
    let css = match (tag, class) {
        ("h1", Some("title")) => {
            "font-size: 2.25em; font-weight: 700; text-align: center; margin: 0 0 0.5em 0;"
        }
        ("h1", _) => "font-size: 2em; font-weight: 700; margin: 0.67em 0 0.5em 0;",
        ("h2", Some("subtitle")) => {
            "font-size: 1.25em; font-weight: 400; color: #4b5563; text-align: center; margin: 0 0 1em 0;"
        }
        ("h2", _) => "font-size: 1.5em; font-weight: 700; margin: 0.83em 0 0.5em 0;",
        ("h3", _) => "font-size: 1.25em; font-weight: 600; margin: 1em 0 0.5em 0;",
        ("h4", _) => "font-size: 1.1em; font-weight: 600; margin: 1em 0 0.5em 0;",
        ("h5", _) => "font-size: 1em; font-weight: 600; margin: 1em 0 0.5em 0;",
        ("h6", _) => "font-size: 0.9em; font-weight: 600; color: #4b5563; margin: 1em 0 0.5em 0;",
        ("p", _) => "margin: 0 0 1em 0; line-height: 1.6;",
        ("ul", _) => "margin: 0 0 1em 0; padding-left: 1.5em; list-style-type: disc;",
        ("ol", _) => "margin: 0 0 1em 0; padding-left: 1.5em; list-style-type: decimal;",
        ("li", _) => "margin: 0.25em 0; line-height: 1.6;",
        ("blockquote", Some("intense")) => {
            "margin: 1em 0; padding: 0.5em 1em; border-left: 4px solid #2563eb; color: #1e3a8a; font-weight: 600; font-style: italic;"
        }
        ("blockquote", _) => {
            "margin: 1em 0; padding-left: 1em; border-left: 4px solid #d1d5db; color: #4b5563; font-style: italic;"
        }
        ("table", _) => "border-collapse: collapse; width: 100%; margin: 0 0 1em 0;",
        ("td", _) => "border: 1px solid #d1d5db; padding: 0.25em 0.5em; vertical-align: top;",
        _ => return None,
    };
    Some(css)
}

// ── Post-pass ────────────────────────────────────────────────────────────

/// Apply all presentation rules to assembled HTML.
///
/// Rules (applied in order):
/// 1. Merge adjacent identical `strong` / `em` runs
/// 2. Collapse empty paragraphs to `<br>`
/// 3. Decorate block elements with inline style and `data-doc-element-id`
pub fn apply_presentation(html: &str) -> String {
    let s = merge_adjacent_inline(html);
    let s = collapse_empty_paragraphs(&s);
    decorate_elements(&s)
}

// ── Rule 1: Merge adjacent inline runs ───────────────────────────────────

fn merge_adjacent_inline(input: &str) -> String {
    input.replace("</strong><strong>", "").replace("</em><em>", "")
}

// ── Rule 2: Empty paragraphs ─────────────────────────────────────────────

static RE_EMPTY_P: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<p(?:\s+class="[^"]*")?>\s*</p>"#).unwrap());

fn collapse_empty_paragraphs(input: &str) -> String {
    RE_EMPTY_P.replace_all(input, "<br>").into_owned()
}

// ── Rule 3: Decorate ─────────────────────────────────────────────────────

static RE_BLOCK_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(p|h[1-6]|ul|ol|li|blockquote|table|td)(?:\s+class="([^"]*)")?>"#).unwrap()
});

fn decorate_elements(input: &str) -> String {
    let mut next_id = 0usize;
    RE_BLOCK_OPEN
        .replace_all(input, |caps: &Captures| {
            let tag = &caps[1];
            let class = caps.get(2).map(|m| m.as_str());
            let id = next_id;
            next_id += 1;

            let mut out = format!("<{tag}");
            if let Some(class) = class {
                out.push_str(&format!(" class=\"{class}\""));
            }
            if let Some(css) = presentation_for(tag, class) {
                out.push_str(&format!(" style=\"{css}\""));
            }
            out.push_str(&format!(" data-doc-element-id=\"el-{id}\">"));
            out
        })
        .into_owned()
}
