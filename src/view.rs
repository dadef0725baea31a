//! Live view tree model.
//!
//! A [`ViewTree`] is the output of card composition: an arena of nodes with
//! absolute layout frames plus a resolved presentation-property map per node.
//! The snapshot serializer consumes it through the [`StyleResolver`]
//! capability so the paired-traversal algorithm can also be exercised against
//! synthetic resolvers in tests.

use std::collections::BTreeMap;

/// Index of a node inside a [`ViewTree`] arena.
pub type NodeId = usize;

/// Resolved presentation properties for one node, keyed by attribute name.
/// Ordered so snapshot output is deterministic.
pub type StyleMap = BTreeMap<String, String>;

/// Build a [`StyleMap`] from literal pairs.
pub fn style_map(pairs: &[(&str, &str)]) -> StyleMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// An axis-aligned layout rectangle in logical (device-independent) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// A rect with no paintable area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The raw content an image node points at.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Self-contained binary payload, already displayable without a fetch.
    Data { mime: String, bytes: Vec<u8> },
    /// A remotely hosted URL, subject to best-effort embedding at export time.
    Remote(String),
}

impl ImageSource {
    /// Whether the source needs no fetch to be embedded.
    pub fn is_embedded(&self) -> bool {
        matches!(self, ImageSource::Data { .. })
    }
}

/// What a node paints.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A rectangular container/box.
    Block,
    /// A text run.
    Text(String),
    /// A raster image.
    Image(ImageSource),
}

/// One node of the live view tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    /// What the node is for ("header", "rating-pill", ...). Carried into the
    /// snapshot as a `data-role` attribute.
    pub role: String,
    pub kind: NodeKind,
    /// Absolute frame within the card canvas.
    pub frame: Rect,
    pub children: Vec<NodeId>,
}

/// A gradient definition referenced by a node's `fill: url(#id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    pub id: String,
    /// `(offset, color)` pairs, offsets in `[0, 1]`.
    pub stops: Vec<(f32, String)>,
}

/// One contributor to the document-wide style text. Sources that cannot be
/// read are skipped silently when the global blob is collected.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRuleSource {
    pub name: String,
    /// `Err` carries the reason the source was unreadable.
    pub text: std::result::Result<String, String>,
}

/// Capability used by the snapshot serializer to read a node's resolved
/// presentation properties without knowing where they came from.
pub trait StyleResolver {
    fn resolved_style(&self, id: NodeId) -> Option<&StyleMap>;
}

/// Arena-backed view tree. Node 0 is the root; children hold arena indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewTree {
    nodes: Vec<ViewNode>,
    styles: Vec<StyleMap>,
    gradients: Vec<GradientSpec>,
    style_sources: Vec<StyleRuleSource>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as the root when `parent` is `None`),
    /// returning its id.
    pub fn push_node(
        &mut self,
        parent: Option<NodeId>,
        role: &str,
        kind: NodeKind,
        frame: Rect,
        style: StyleMap,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ViewNode {
            role: role.to_string(),
            kind,
            frame,
            children: Vec::new(),
        });
        self.styles.push(style);
        if let Some(p) = parent {
            if let Some(node) = self.nodes.get_mut(p) {
                node.children.push(id);
            }
        }
        id
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> Option<&ViewNode> {
        self.nodes.get(id)
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleMap> {
        self.styles.get(id)
    }

    /// Rendered width/height of the root frame, `(0, 0)` for an empty tree.
    pub fn measure(&self) -> (f32, f32) {
        self.nodes
            .first()
            .map(|n| (n.frame.width, n.frame.height))
            .unwrap_or((0.0, 0.0))
    }

    /// Pre-order node ids starting at the root. Children are pushed in
    /// reverse so the stack pops them in document order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(id) {
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// First node with the given role, in pre-order.
    pub fn find_role(&self, role: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|&id| self.nodes[id].role == role)
    }

    /// All nodes with the given role, in pre-order.
    pub fn roles(&self, role: &str) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.nodes[id].role == role)
            .collect()
    }

    pub fn add_gradient(&mut self, spec: GradientSpec) {
        self.gradients.push(spec);
    }

    pub fn gradients(&self) -> &[GradientSpec] {
        &self.gradients
    }

    pub fn set_style_sources(&mut self, sources: Vec<StyleRuleSource>) {
        self.style_sources = sources;
    }

    pub fn style_sources(&self) -> &[StyleRuleSource] {
        &self.style_sources
    }
}

impl StyleResolver for ViewTree {
    fn resolved_style(&self, id: NodeId) -> Option<&StyleMap> {
        self.styles.get(id)
    }
}
