//! Two-level document outline (bookmarks).

use crate::pages::{page_id, page_size, text_string};
use crate::{ComposerError, catalog_id};
use folio_types::{BookmarkEntry, BookmarkLevel};
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

struct OutlineNode {
    id: ObjectId,
    dict: Dictionary,
    children: Vec<OutlineNode>,
}

/// Replaces the document outline with one built from `entries`.
///
/// Nested entries attach to the closest preceding top-level entry; a nested
/// entry with no top-level entry before it is promoted to the top level.
/// Each bookmark opens its target page viewed from the top. Returns the
/// number of outline items written.
pub fn set_outline(doc: &mut Document, entries: &[BookmarkEntry]) -> Result<usize, ComposerError> {
    let mut roots: Vec<OutlineNode> = Vec::new();
    for entry in entries {
        let target = page_id(doc, entry.page)?;
        let top = page_size(doc, entry.page)?.height;
        let dict = dictionary! {
            "Title" => text_string(&entry.title),
            "Dest" => vec![Object::Reference(target), "FitH".into(), top.into()],
        };
        let node = OutlineNode { id: doc.new_object_id(), dict, children: Vec::new() };

        match (entry.level, roots.last_mut()) {
            (BookmarkLevel::Nested, Some(parent)) => parent.children.push(node),
            _ => roots.push(node),
        }
    }

    let root_id = catalog_id(doc)?;
    if roots.is_empty() {
        doc.get_dictionary_mut(root_id)?.remove(b"Outlines");
        return Ok(0);
    }

    let written = roots.iter().map(|r| 1 + r.children.len()).sum();
    let outline_root_id = doc.add_object(dictionary! {
        "Type" => "Outlines",
        "First" => Object::Reference(roots[0].id),
        "Last" => Object::Reference(roots[roots.len() - 1].id),
        "Count" => roots.len() as i64,
    });
    add_outline_level(doc, roots, outline_root_id);

    let catalog = doc.get_dictionary_mut(root_id)?;
    catalog.set("Outlines", Object::Reference(outline_root_id));
    catalog.set("PageMode", "UseOutlines");
    Ok(written)
}

fn add_outline_level(doc: &mut Document, items: Vec<OutlineNode>, parent_id: ObjectId) {
    let ids: Vec<ObjectId> = items.iter().map(|item| item.id).collect();
    for (i, item) in items.into_iter().enumerate() {
        let mut dict = item.dict;
        dict.set("Parent", Object::Reference(parent_id));
        if i > 0 {
            dict.set("Prev", Object::Reference(ids[i - 1]));
        }
        if i + 1 < ids.len() {
            dict.set("Next", Object::Reference(ids[i + 1]));
        }
        if let (Some(first), Some(last)) = (item.children.first(), item.children.last()) {
            dict.set("First", Object::Reference(first.id));
            dict.set("Last", Object::Reference(last.id));
            // Negative: chapters start collapsed.
            dict.set("Count", -(item.children.len() as i64));
            add_outline_level(doc, item.children, item.id);
        }
        doc.objects.insert(item.id, Object::Dictionary(dict));
    }
}
