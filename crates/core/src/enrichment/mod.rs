//! URL enrichment.
//!
//! Two parallel paths share one resolver function:
//! - `element`: in-place mutation of already-rendered DOM image nodes
//! - `tree`: pure rewriting of declaratively built element trees
//!
//! Both record the pre-enrichment URL in the [`ENRICHMENT_MARK`] attribute,
//! which makes repeated render passes no-ops.

mod dom;
mod element;
mod tree;

pub use dom::{Document, NodeId};
pub use element::{enrich_image_by_src, enrich_image_element, enrich_images_in_container};
pub use tree::{VElement, VNode, enrich_image_in_tree};

/// Attribute recording the URL an element had before enrichment.
pub(crate) const ENRICHMENT_MARK: &str = "data-original-src";
