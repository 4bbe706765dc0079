//! HTML serialization of an assembled contract document.
//!
//! Every piece of user- or generator-supplied text passes through
//! [`escape_html`] before it reaches the page, and escaping is idempotent so
//! content that already carries entities is never double-escaped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use contractforge_shared::{Document, SectionBody};

/// Page-level metadata for the rendered contract.
#[derive(Debug, Clone)]
pub struct RenderMeta {
    /// Document title shown in the page header and `<title>`.
    pub title: String,
    /// Human-readable generation date for the header line.
    pub generated_on: String,
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

// Alternation is first-match: a known entity wins over the bare `&` branch.
static AMP_OR_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:amp|lt|gt|quot|#39);|&").expect("valid regex"));

/// Escape text for HTML. Idempotent: already-escaped entities pass through
/// unchanged, so escaping twice never yields `&amp;amp;`.
pub fn escape_html(text: &str) -> String {
    let text = AMP_OR_ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        if matched == "&" {
            "&amp;".to_string()
        } else {
            matched.to_string()
        }
    });
    text.replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

const STYLESHEET: &str = "\
body { font-family: Georgia, 'Times New Roman', serif; margin: 2.5em 3em; color: #1a1a1a; }\n\
h1 { font-size: 1.6em; border-bottom: 2px solid #333; padding-bottom: 0.3em; }\n\
h2 { font-size: 1.25em; margin-top: 1.8em; }\n\
h3 { font-size: 1.05em; }\n\
p.meta { color: #555; font-size: 0.9em; }\n\
table { border-collapse: collapse; width: 100%; margin: 1em 0; }\n\
th, td { border: 1px solid #444; padding: 6px 10px; text-align: left; }\n\
th { background: #e8e8e8; }\n\
ul { margin: 1em 0; }\n\
footer { margin-top: 3em; font-size: 0.8em; color: #777; }\n";

/// Serialize a validated [`Document`] to a standalone HTML page.
#[instrument(skip_all, fields(title = %meta.title))]
pub fn render_html(document: &Document, meta: &RenderMeta) -> String {
    let mut out = String::with_capacity(8 * 1024);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(&meta.title)));
    out.push_str(&format!("<style>\n{STYLESHEET}</style>\n</head>\n<body>\n"));

    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&meta.title)));
    out.push_str(&format!(
        "<p class=\"meta\">Generated: {}</p>\n",
        escape_html(&meta.generated_on)
    ));

    for section in &document.sections {
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
        render_body(&mut out, &section.body);
    }

    out.push_str("<footer>Confidential and Proprietary</footer>\n</body>\n</html>\n");

    debug!(bytes = out.len(), "HTML rendered");
    out
}

fn render_body(out: &mut String, body: &SectionBody) {
    match body {
        SectionBody::Prose(text) => render_prose(out, text),
        SectionBody::Table {
            intro,
            headers,
            rows,
        } => {
            if let Some(intro) = intro {
                render_prose(out, intro);
            }
            out.push_str("<table>\n<thead>\n<tr>");
            for header in headers {
                out.push_str(&format!("<th>{}</th>", escape_html(header)));
            }
            out.push_str("</tr>\n</thead>\n<tbody>\n");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str(&format!("<td>{}</td>", escape_html(cell)));
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</tbody>\n</table>\n");
        }
        SectionBody::List { intro, items } => {
            if let Some(intro) = intro {
                render_prose(out, intro);
            }
            out.push_str("<ul>\n");
            for area in items {
                out.push_str(&format!(
                    "<li><strong>{}</strong>: {}</li>\n",
                    escape_html(&area.region),
                    escape_html(&area.coverage)
                ));
            }
            out.push_str("</ul>\n");
        }
    }
}

/// Prose paragraphs: blank-line separated, with `## `-marked lines rendered
/// as sub-headings (the generator normalizes all heading levels to `## `).
fn render_prose(out: &mut String, text: &str) {
    for block in text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        for line in block.lines() {
            if let Some(heading) = line.strip_prefix("## ") {
                out.push_str(&format!("<h3>{}</h3>\n", escape_html(heading.trim())));
            } else {
                out.push_str(&format!("<p>{}</p>\n", escape_html(line.trim())));
            }
        }
    }
}
