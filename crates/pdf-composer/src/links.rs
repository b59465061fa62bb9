//! Internal link annotations.

use crate::ComposerError;
use crate::pages::{page_id, page_size};
use folio_types::Rect;
use lopdf::{Document, Object, dictionary};

/// A clickable area that jumps to another page of the same document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkAnnotation {
    pub rect: Rect,
    /// Absolute, 1-based destination page.
    pub target_page: u32,
}

/// Appends `links` to the `/Annots` of page `on_page`.
///
/// Existing annotations are kept whether `/Annots` is an inline array or an
/// indirect one. Destinations open the target page viewed from the top.
/// Returns the number of annotations added.
pub fn append_link_annotations(
    doc: &mut Document,
    on_page: u32,
    links: &[LinkAnnotation],
) -> Result<usize, ComposerError> {
    let page = page_id(doc, on_page)?;

    let mut annotation_refs = Vec::with_capacity(links.len());
    for link in links {
        let target = page_id(doc, link.target_page)?;
        let top = page_size(doc, link.target_page)?.height;
        let [x1, y1, x2, y2] = link.rect.corners();
        let action = dictionary! {
            "Type" => "Action",
            "S" => "GoTo",
            "D" => vec![Object::Reference(target), "FitH".into(), top.into()],
        };
        let annotation = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![x1.into(), y1.into(), x2.into(), y2.into()],
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "A" => action,
        };
        annotation_refs.push(Object::Reference(doc.add_object(annotation)));
    }

    if annotation_refs.is_empty() {
        return Ok(0);
    }
    let added = annotation_refs.len();

    let existing = doc.get_dictionary(page)?.get(b"Annots").ok().cloned();
    match existing {
        Some(Object::Reference(array_id)) => match doc.get_object_mut(array_id)? {
            Object::Array(array) => array.extend(annotation_refs),
            other => {
                let mut array = vec![std::mem::replace(other, Object::Null)];
                array.extend(annotation_refs);
                *other = Object::Array(array);
            }
        },
        Some(Object::Array(mut array)) => {
            array.extend(annotation_refs);
            doc.get_dictionary_mut(page)?.set("Annots", array);
        }
        _ => {
            doc.get_dictionary_mut(page)?.set("Annots", annotation_refs);
        }
    }
    Ok(added)
}
