//! # Placeholder Resolver
//!
//! Pure substitution pass: `(Template, Record) → resolved Template`.
//!
//! Two binding mechanisms exist, unified here with defined precedence:
//!
//! 1. **Explicit field binding** (`frame.field`): the node's displayed
//!    content is replaced wholesale with the record value. An atomic
//!    override — a node with an explicit binding never also gets marker
//!    substitution, and a binding whose field is absent from the record
//!    leaves the node untouched (no blanking).
//! 2. **Marker substitution**: each `{{field}}` occurrence in a text
//!    node's content is replaced independently. Markers whose field the
//!    record lacks stay as literal text, so unresolved bindings remain
//!    visible on the card instead of silently disappearing.
//!
//! Photo placeholders pass through untouched; photo resolution needs
//! network and image decode, which belongs to the renderer.
//!
//! This stage cannot fail.

use super::{Node, Record, Template};

/// Resolve a template against one record.
pub fn resolve(template: &Template, record: &Record) -> Template {
    let mut resolved = template.clone();
    for node in &mut resolved.nodes {
        resolve_node(node, record);
    }
    resolved
}

fn resolve_node(node: &mut Node, record: &Record) {
    match node {
        Node::Text(text) => {
            if let Some(field) = &text.frame.field {
                if let Some(value) = record.get(field) {
                    text.content = value;
                }
            } else {
                text.content = substitute_markers(&text.content, record);
            }
        }
        Node::ImagePlaceholder(image) => {
            // The image's "displayed content" is its source reference.
            if let Some(field) = &image.frame.field {
                if let Some(value) = record.get(field) {
                    image.src = value;
                }
            }
        }
        // Shapes display nothing substitutable; photos resolve at render.
        Node::Shape(_) | Node::PhotoPlaceholder(_) => {}
    }
}

/// Replace every `{{field}}` occurrence that the record can resolve.
/// Single left-to-right scan; substituted values are never re-scanned, so
/// a record value containing `{{...}}` stays literal.
fn substitute_markers(content: &str, record: &Record) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(close) = after_open.find("}}") else {
            // Unterminated marker: everything from here on is literal.
            break;
        };
        out.push_str(&rest[..start]);
        let field = &after_open[..close];
        match record.get(field) {
            Some(value) => out.push_str(&value),
            // Keep the marker literally inspectable.
            None => {
                out.push_str("{{");
                out.push_str(field);
                out.push_str("}}");
            }
        }
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);
    out
}
