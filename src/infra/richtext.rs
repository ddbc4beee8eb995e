//! Default rich-text renderer: CMS editor node trees to sanitized HTML.

use ammonia::Builder;
use folio_api_types::RichText;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::application::richtext::{RichTextError, RichTextRenderer};

static SANITIZER: Lazy<Builder<'static>> = Lazy::new(Builder::default);

// Lexical-style text format bit flags.
const FORMAT_BOLD: u64 = 1;
const FORMAT_ITALIC: u64 = 1 << 1;

/// Walks the editor's node tree (root → block nodes → inline nodes) and
/// emits conservative HTML. The result is sanitized before it leaves, so a
/// hostile document cannot smuggle markup through text or URLs.
#[derive(Debug, Default)]
pub struct HtmlRichTextRenderer;

impl HtmlRichTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RichTextRenderer for HtmlRichTextRenderer {
    fn render(&self, document: &RichText) -> Result<String, RichTextError> {
        let root = document
            .0
            .get("root")
            .ok_or_else(|| RichTextError::Malformed("document has no root node".to_string()))?;

        let mut html = String::new();
        render_children(root, &mut html);
        Ok(SANITIZER.clean(&html).to_string())
    }
}

fn render_children(node: &Value, out: &mut String) {
    let Some(children) = node.get("children").and_then(Value::as_array) else {
        return;
    };
    for child in children {
        render_node(child, out);
    }
}

fn render_node(node: &Value, out: &mut String) {
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "paragraph" => {
            out.push_str("<p>");
            render_children(node, out);
            out.push_str("</p>");
        }
        "heading" => {
            let tag = heading_tag(node);
            out.push('<');
            out.push_str(tag);
            out.push('>');
            render_children(node, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        "text" => {
            let format = node.get("format").and_then(Value::as_u64).unwrap_or(0);
            let bold = format & FORMAT_BOLD != 0;
            let italic = format & FORMAT_ITALIC != 0;
            if bold {
                out.push_str("<strong>");
            }
            if italic {
                out.push_str("<em>");
            }
            push_escaped(node.get("text").and_then(Value::as_str).unwrap_or_default(), out);
            if italic {
                out.push_str("</em>");
            }
            if bold {
                out.push_str("</strong>");
            }
        }
        "linebreak" => out.push_str("<br>"),
        "link" => {
            let url = node
                .get("fields")
                .and_then(|fields| fields.get("url"))
                .and_then(Value::as_str)
                .or_else(|| node.get("url").and_then(Value::as_str))
                .unwrap_or("#");
            out.push_str("<a href=\"");
            push_escaped(url, out);
            out.push_str("\">");
            render_children(node, out);
            out.push_str("</a>");
        }
        // Containers this renderer does not style still contribute their
        // children; unknown leaf nodes contribute nothing.
        _ => render_children(node, out),
    }
}

fn heading_tag(node: &Value) -> &'static str {
    match node.get("tag").and_then(Value::as_str) {
        Some("h1") => "h1",
        Some("h2") => "h2",
        Some("h3") => "h3",
        Some("h4") => "h4",
        Some("h5") => "h5",
        Some("h6") => "h6",
        _ => "h2",
    }
}

fn push_escaped(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
