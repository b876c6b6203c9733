//! Enrichment of declaratively built element trees.
//!
//! Trees are immutable and shared through `Arc`. When nothing needs to
//! change, the very same `Arc` comes back, so callers detect "no enrichment"
//! with `Arc::ptr_eq`.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::ENRICHMENT_MARK;

/// Node of a declaratively built element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
    /// Renders nothing.
    Empty,
    /// Text content.
    Text(String),
    /// Element with props and children.
    Element(VElement),
}

/// Element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VElement {
    /// Tag name.
    pub tag: String,
    /// Props.
    pub props: BTreeMap<String, String>,
    /// Children.
    pub children: Vec<Arc<VNode>>,
}

impl VElement {
    /// Create an element without props or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Add a prop.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Add a child.
    #[must_use]
    pub fn child(mut self, child: Arc<VNode>) -> Self {
        self.children.push(child);
        self
    }

    /// Wrap into a shared node.
    #[must_use]
    pub fn into_node(self) -> Arc<VNode> {
        Arc::new(VNode::Element(self))
    }

    fn is_image(&self) -> bool {
        self.tag.eq_ignore_ascii_case("img") || self.tag.eq_ignore_ascii_case("image")
    }
}

/// Enrich every image in a declarative tree.
///
/// Returns `node` itself when nothing changed; otherwise a new tree that
/// shares every untouched subtree with the input.
pub fn enrich_image_in_tree<F>(node: &Arc<VNode>, resolve: &F) -> Arc<VNode>
where
    F: Fn(&str) -> String + ?Sized,
{
    let VNode::Element(element) = node.as_ref() else {
        return Arc::clone(node);
    };

    if element.is_image() {
        if element.props.contains_key(ENRICHMENT_MARK) {
            return Arc::clone(node);
        }
        let Some(src) = element.props.get("src") else {
            return Arc::clone(node);
        };
        let resolved = resolve(src);
        if resolved == *src {
            return Arc::clone(node);
        }

        let mut props = element.props.clone();
        props.insert(ENRICHMENT_MARK.to_string(), src.clone());
        props.insert("src".to_string(), resolved);
        return Arc::new(VNode::Element(VElement {
            tag: element.tag.clone(),
            props,
            children: element.children.clone(),
        }));
    }

    let mut changed = false;
    let children: Vec<Arc<VNode>> = element
        .children
        .iter()
        .map(|child| {
            let next = enrich_image_in_tree(child, resolve);
            changed |= !Arc::ptr_eq(&next, child);
            next
        })
        .collect();

    if !changed {
        return Arc::clone(node);
    }

    Arc::new(VNode::Element(VElement {
        tag: element.tag.clone(),
        props: element.props.clone(),
        children,
    }))
}
