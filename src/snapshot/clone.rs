//! Structural cloning and the paired style-inlining traversal.
//!
//! The clone mirrors the live tree 1:1 by pre-order. Inlining then walks
//! both sides in the same order and copies every resolved presentation
//! property onto the clone as node-local attributes, collapsing all
//! external style rules into context-free declarations. The rasterizer
//! never sees the live tree, so this is a requirement, not an optimization.

use crate::error::{Error, Result};
use crate::view::{ImageSource, NodeKind, StyleMap, StyleResolver, ViewTree};

use super::embed;

/// One node of the ephemeral snapshot tree. `tag` is the SVG element the
/// node serializes to; `attrs` starts as pure geometry and gains the
/// inlined style properties during the paired traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotNode {
    pub tag: &'static str,
    pub role: String,
    pub attrs: StyleMap,
    pub text: Option<String>,
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    fn count(&self) -> usize {
        1 + self.children.iter().map(SnapshotNode::count).sum::<usize>()
    }
}

/// Produce a structural clone of the live tree: same shape, geometry
/// attributes only, no styling. Returns `None` for an empty tree.
pub fn structural_clone(tree: &ViewTree) -> Option<SnapshotNode> {
    if tree.is_empty() {
        return None;
    }
    Some(clone_node(tree, tree.root()))
}

fn clone_node(tree: &ViewTree, id: usize) -> SnapshotNode {
    // node/style lookups cannot miss for ids produced by the arena itself
    let node = match tree.node(id) {
        Some(n) => n,
        None => {
            return SnapshotNode {
                tag: "g",
                role: String::new(),
                attrs: StyleMap::new(),
                text: None,
                children: Vec::new(),
            }
        }
    };
    let f = node.frame;
    let mut attrs = StyleMap::new();
    let (tag, text) = match &node.kind {
        NodeKind::Block => {
            attrs.insert("x".into(), format!("{}", f.x));
            attrs.insert("y".into(), format!("{}", f.y));
            attrs.insert("width".into(), format!("{}", f.width));
            attrs.insert("height".into(), format!("{}", f.height));
            ("rect", None)
        }
        NodeKind::Text(content) => {
            attrs.insert("x".into(), format!("{}", f.x));
            // approximate baseline within the text frame
            attrs.insert("y".into(), format!("{}", f.y + f.height * 0.78));
            ("text", Some(content.clone()))
        }
        NodeKind::Image(source) => {
            attrs.insert("x".into(), format!("{}", f.x));
            attrs.insert("y".into(), format!("{}", f.y));
            attrs.insert("width".into(), format!("{}", f.width));
            attrs.insert("height".into(), format!("{}", f.height));
            let href = match source {
                // already self-contained: embed directly, no fetch needed
                ImageSource::Data { mime, bytes } => embed::data_uri(mime, bytes),
                ImageSource::Remote(url) => url.clone(),
            };
            attrs.insert("href".into(), href);
            ("image", None)
        }
    };
    SnapshotNode {
        tag,
        role: node.role.clone(),
        attrs,
        text,
        children: node
            .children
            .iter()
            .map(|&child| clone_node(tree, child))
            .collect(),
    }
}

/// Walk the live tree and the clone in identical pre-order and copy every
/// resolved presentation property onto the clone, overriding any of its own
/// values. A node-count mismatch between the two sides aborts with a
/// serialization error; it cannot happen under correct cloning but is the
/// guard that keeps a bad snapshot from rasterizing silently wrong.
pub fn inline_resolved_styles(
    tree: &ViewTree,
    resolver: &dyn StyleResolver,
    clone: &mut SnapshotNode,
) -> Result<()> {
    let live = tree.preorder();
    if live.len() != clone.count() {
        return Err(Error::Serialization(format!(
            "live tree has {} nodes but the clone has {}",
            live.len(),
            clone.count()
        )));
    }
    let mut cursor = 0usize;
    inline_walk(clone, &live, &mut cursor, resolver)?;
    if cursor != live.len() {
        return Err(Error::Serialization(format!(
            "paired traversal consumed {cursor} of {} live nodes",
            live.len()
        )));
    }
    Ok(())
}

fn inline_walk(
    clone: &mut SnapshotNode,
    live: &[usize],
    cursor: &mut usize,
    resolver: &dyn StyleResolver,
) -> Result<()> {
    let id = match live.get(*cursor) {
        Some(&id) => id,
        None => {
            return Err(Error::Serialization(
                "clone has more nodes than the live tree".into(),
            ))
        }
    };
    *cursor += 1;
    if let Some(style) = resolver.resolved_style(id) {
        for (key, value) in style {
            clone.attrs.insert(key.clone(), value.clone());
        }
    }
    for child in &mut clone.children {
        inline_walk(child, live, cursor, resolver)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{style_map, NodeId, Rect};

    fn two_node_tree() -> ViewTree {
        let mut tree = ViewTree::new();
        let root = tree.push_node(
            None,
            "card",
            NodeKind::Block,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            style_map(&[("fill", "#112233")]),
        );
        tree.push_node(
            Some(root),
            "label",
            NodeKind::Text("hello".into()),
            Rect::new(10.0, 10.0, 80.0, 20.0),
            style_map(&[("fill", "#ffffff"), ("font-size", "14")]),
        );
        tree
    }

    #[test]
    fn clone_mirrors_shape_without_style() {
        let tree = two_node_tree();
        let clone = structural_clone(&tree).unwrap();
        assert_eq!(clone.tag, "rect");
        assert_eq!(clone.children.len(), 1);
        assert_eq!(clone.children[0].tag, "text");
        assert!(!clone.attrs.contains_key("fill"));
    }

    #[test]
    fn inlining_copies_resolved_properties() {
        let tree = two_node_tree();
        let mut clone = structural_clone(&tree).unwrap();
        inline_resolved_styles(&tree, &tree, &mut clone).unwrap();
        assert_eq!(clone.attrs.get("fill").map(String::as_str), Some("#112233"));
        assert_eq!(
            clone.children[0].attrs.get("font-size").map(String::as_str),
            Some("14")
        );
    }

    #[test]
    fn inlining_overrides_clone_local_values() {
        let tree = two_node_tree();
        let mut clone = structural_clone(&tree).unwrap();
        clone
            .attrs
            .insert("fill".into(), "#badbad".into());
        inline_resolved_styles(&tree, &tree, &mut clone).unwrap();
        assert_eq!(clone.attrs.get("fill").map(String::as_str), Some("#112233"));
    }

    #[test]
    fn shape_mismatch_is_a_serialization_error() {
        let tree = two_node_tree();
        let mut clone = structural_clone(&tree).unwrap();
        clone.children.push(SnapshotNode {
            tag: "rect",
            role: "stray".into(),
            attrs: StyleMap::new(),
            text: None,
            children: Vec::new(),
        });
        let err = inline_resolved_styles(&tree, &tree, &mut clone).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    struct EmptyResolver;
    impl StyleResolver for EmptyResolver {
        fn resolved_style(&self, _id: NodeId) -> Option<&StyleMap> {
            None
        }
    }

    #[test]
    fn synthetic_resolver_leaves_geometry_untouched() {
        let tree = two_node_tree();
        let mut clone = structural_clone(&tree).unwrap();
        inline_resolved_styles(&tree, &EmptyResolver, &mut clone).unwrap();
        assert!(!clone.attrs.contains_key("fill"));
        assert_eq!(clone.attrs.get("width").map(String::as_str), Some("100"));
    }
}
