//! In-place enrichment of rendered image nodes.

use super::ENRICHMENT_MARK;
use super::dom::{Document, NodeId};

/// Enrich one rendered image node.
///
/// The source URL is the current `src`, unless the node carries a mark
/// whose resolution still equals the current `src`; then the node is already
/// enriched and nothing happens. Returns `true` iff the node was mutated.
pub fn enrich_image_element<F>(doc: &mut Document, image: NodeId, resolve: &F) -> bool
where
    F: Fn(&str) -> String + ?Sized,
{
    let Some(current) = doc.get_attribute(image, "src").map(str::to_owned) else {
        return false;
    };

    if let Some(original) = doc.get_attribute(image, ENRICHMENT_MARK)
        && resolve(original) == current
    {
        return false;
    }

    let resolved = resolve(&current);
    if resolved == current {
        return false;
    }

    doc.set_attribute(image, "src", resolved);
    doc.set_attribute(image, ENRICHMENT_MARK, current);
    true
}

/// Enrich every image inside `container`.
///
/// Images elsewhere in the document are skipped even though the lookup is
/// document-wide. Returns the number of mutated images.
pub fn enrich_images_in_container<F>(doc: &mut Document, container: NodeId, resolve: &F) -> usize
where
    F: Fn(&str) -> String + ?Sized,
{
    let images: Vec<NodeId> = doc
        .query_images()
        .into_iter()
        .filter(|img| doc.contains(container, *img))
        .collect();

    images
        .into_iter()
        .filter(|img| enrich_image_element(doc, *img, resolve))
        .count()
}

/// Enrich the image inside `container` whose current `src` is `target_src`.
///
/// No-op if nothing matches or if the match is already marked.
pub fn enrich_image_by_src<F>(
    doc: &mut Document,
    container: NodeId,
    target_src: &str,
    resolve: &F,
) -> bool
where
    F: Fn(&str) -> String + ?Sized,
{
    let found = doc.query_images().into_iter().find(|img| {
        doc.contains(container, *img) && doc.get_attribute(*img, "src") == Some(target_src)
    });

    match found {
        Some(img) if doc.get_attribute(img, ENRICHMENT_MARK).is_none() => {
            enrich_image_element(doc, img, resolve)
        }
        _ => false,
    }
}
