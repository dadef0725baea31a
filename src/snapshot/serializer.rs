//! The style-snapshot serializer: live tree → self-contained SVG document.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::view::{GradientSpec, StyleResolver, ViewTree};

use super::clone::{inline_resolved_styles, structural_clone, SnapshotNode};
use super::embed::{self, ImageFetcher};
use super::SerializedDocument;

/// Serializes a live view tree into a [`SerializedDocument`].
///
/// The fetcher is injected so embedding can be exercised (and failed)
/// deterministically; the global style collector is injected per call.
pub struct StyleSnapshotSerializer {
    fetcher: Box<dyn ImageFetcher>,
}

impl StyleSnapshotSerializer {
    pub fn new(fetcher: Box<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Produce a self-contained SVG snapshot of the tree.
    ///
    /// Suspends on each image fetch; fetches run sequentially to bound peak
    /// memory, since embedded images are held as large in-memory text.
    pub async fn serialize(
        &self,
        tree: &ViewTree,
        collect_global_style: &(dyn Fn() -> String + Send + Sync),
    ) -> Result<SerializedDocument> {
        // 1. measure
        let (width, height) = tree.measure();
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::Serialization(format!(
                "card measured {width}x{height}; content is not laid out yet"
            )));
        }

        // 2. structural clone
        let mut clone = structural_clone(tree)
            .ok_or_else(|| Error::Serialization("view tree is empty".into()))?;

        // 3. paired traversal, inlining resolved styles
        inline_resolved_styles(tree, tree as &dyn StyleResolver, &mut clone)?;

        // 4. document-wide style text, collected once
        let style_blob = collect_global_style();

        // 5. best-effort image embedding
        self.embed_images(&mut clone).await;

        // 6 + 7. emit the document with everything escaped
        let svg = emit_document(&clone, tree.gradients(), &style_blob, width, height);
        Ok(SerializedDocument { svg, width, height })
    }

    async fn embed_images(&self, clone: &mut SnapshotNode) {
        let mut pending: Vec<String> = Vec::new();
        collect_remote_refs(clone, &mut pending);

        let mut embedded: HashMap<String, String> = HashMap::new();
        for uri in pending {
            match self.fetcher.fetch(&uri).await {
                Ok(fetched) => match embed::resolve_image_mime(&fetched) {
                    Some(mime) => {
                        embedded.insert(uri, embed::data_uri(&mime, &fetched.bytes));
                    }
                    None => {
                        log::warn!("unrecognized image payload for {uri}; keeping remote reference");
                    }
                },
                Err(soft) => {
                    log::warn!("{soft}; keeping remote reference");
                }
            }
        }
        if !embedded.is_empty() {
            rewrite_image_refs(clone, &embedded);
        }
    }
}

/// Collect remote hrefs in document order, deduplicated so each URL is
/// fetched once.
fn collect_remote_refs(node: &SnapshotNode, out: &mut Vec<String>) {
    if node.tag == "image" {
        if let Some(href) = node.attrs.get("href") {
            if !href.starts_with("data:") && !out.iter().any(|u| u == href) {
                out.push(href.clone());
            }
        }
    }
    for child in &node.children {
        collect_remote_refs(child, out);
    }
}

fn rewrite_image_refs(node: &mut SnapshotNode, embedded: &HashMap<String, String>) {
    if node.tag == "image" {
        if let Some(href) = node.attrs.get("href") {
            if let Some(data) = embedded.get(href) {
                node.attrs.insert("href".into(), data.clone());
            }
        }
    }
    for child in &mut node.children {
        rewrite_image_refs(child, embedded);
    }
}

/// Escape text content (and the style blob) for XML element context.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape attribute values: element escaping plus quotes.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn emit_document(
    clone: &SnapshotNode,
    gradients: &[GradientSpec],
    style_blob: &str,
    width: f32,
    height: f32,
) -> String {
    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    if !gradients.is_empty() {
        svg.push_str("<defs>\n");
        for gradient in gradients {
            svg.push_str(&format!(
                "<linearGradient id=\"{}\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">\n",
                escape_attr(&gradient.id)
            ));
            for (offset, color) in &gradient.stops {
                svg.push_str(&format!(
                    "<stop offset=\"{}\" stop-color=\"{}\"/>\n",
                    offset,
                    escape_attr(color)
                ));
            }
            svg.push_str("</linearGradient>\n");
        }
        svg.push_str("</defs>\n");
    }
    if !style_blob.is_empty() {
        svg.push_str("<style>\n");
        svg.push_str(&escape_text(style_blob));
        svg.push_str("\n</style>\n");
    }
    // bridge element carrying the cloned tree into the document space
    svg.push_str("<g data-bridge=\"view-tree\">\n");
    emit_node(&mut svg, clone);
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn emit_node(out: &mut String, node: &SnapshotNode) {
    let grouped = !node.children.is_empty();
    if grouped {
        out.push_str("<g>\n");
    }
    out.push('<');
    out.push_str(node.tag);
    if !node.role.is_empty() {
        out.push_str(&format!(" data-role=\"{}\"", escape_attr(&node.role)));
    }
    for (key, value) in &node.attrs {
        out.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
    }
    match &node.text {
        Some(text) => {
            out.push('>');
            out.push_str(&escape_text(text));
            out.push_str(&format!("</{}>\n", node.tag));
        }
        None => out.push_str("/>\n"),
    }
    if grouped {
        for child in &node.children {
            emit_node(out, child);
        }
        out.push_str("</g>\n");
    }
}
