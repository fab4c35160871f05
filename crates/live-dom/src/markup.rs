//! Outer-markup serialization, used for fuzzy structural comparison.

use crate::document::{Document, NodeId, NodeKind};
use crate::text::truncate_chars;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

impl Document {
    /// Serialize `node` and its subtree, like `outerHTML`.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    /// Outer markup cut to `max_chars`.
    pub fn markup_snippet(&self, node: NodeId, max_chars: usize) -> String {
        truncate_chars(&self.outer_html(node), max_chars)
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(content) => out.push_str(&escape_text(content)),
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(data.tag());
                for (name, value) in data.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&data.tag()) {
                    return;
                }
                for child in &entry.children {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(data.tag());
                out.push('>');
            }
        }
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
