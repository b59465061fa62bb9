//! PDF composition utilities for assembling a manual from per-unit files.
//!
//! This crate provides low-level PDF manipulation using lopdf:
//! - Deep object copying with cycle detection
//! - Merging many documents into one, in order
//! - Document info (`/Info`) updates
//! - A two-level outline (bookmarks) tree
//! - Appending link annotations to an existing page

mod error;
pub mod info;
pub mod links;
pub mod outline;
pub mod pages;

pub use error::ComposerError;
pub use info::{InfoUpdate, set_document_info};
pub use links::{LinkAnnotation, append_link_annotations};
pub use outline::set_outline;
pub use pages::{page_id, page_size};

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::path::Path;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A helper struct to manage the state of copying objects between documents.
struct ObjectCopier<'a> {
    source_doc: &'a Document,
    target_doc: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source_doc: &'a Document, target_doc: &'a mut Document) -> Self {
        Self { source_doc, target_doc, id_map: HashMap::new() }
    }

    /// Reserves target ids for a set of source objects without copying them.
    /// References to reserved objects are remapped but never followed.
    fn reserve(&mut self, source_ids: impl IntoIterator<Item = ObjectId>) -> Vec<ObjectId> {
        source_ids
            .into_iter()
            .map(|source_id| {
                let new_id = self.target_doc.new_object_id();
                self.id_map.insert(source_id, new_id);
                new_id
            })
            .collect()
    }

    /// Deep copies an object from the source document to the target document.
    /// Each object is copied once; cycles are broken by mapping the id before
    /// recursing.
    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        let new_id = self.target_doc.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source_doc.get_object(source_id)?.clone();
        let new_obj = self.remap_references(obj)?;
        self.target_doc.objects.insert(new_id, new_obj);
        Ok(new_id)
    }

    /// Replaces every `Object::Reference` inside `obj` with its target-side id,
    /// copying referenced objects on first sight.
    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(arr) => Ok(Object::Array(
                arr.into_iter().map(|o| self.remap_references(o)).collect::<Result<_, _>>()?,
            )),
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.remap_dictionary(dict)?)),
            Object::Stream(mut stream) => {
                stream.dict = self.remap_dictionary(stream.dict)?;
                Ok(Object::Stream(stream))
            }
            _ => Ok(obj),
        }
    }

    fn remap_dictionary(&mut self, mut dict: Dictionary) -> Result<Dictionary, lopdf::Error> {
        for (_, value) in dict.iter_mut() {
            *value = self.remap_references(std::mem::replace(value, Object::Null))?;
        }
        Ok(dict)
    }

    /// Copies a page dictionary into its reserved id. The source `/Parent`
    /// is dropped (the caller re-parents the page) and inherited attributes
    /// are made explicit, since the source page tree is not copied.
    fn copy_page(&mut self, source_page: ObjectId, target_id: ObjectId) -> Result<(), lopdf::Error> {
        let mut dict = self.source_doc.get_dictionary(source_page)?.clone();
        for key in INHERITABLE {
            if !dict.has(key) {
                if let Some(value) = inherited_attribute(self.source_doc, source_page, key) {
                    dict.set(key.to_vec(), value);
                }
            }
        }
        dict.remove(b"Parent");
        let dict = self.remap_dictionary(dict)?;
        self.target_doc.objects.insert(target_id, Object::Dictionary(dict));
        Ok(())
    }
}

/// Looks up an inheritable page attribute on the ancestors of `page`.
fn inherited_attribute(doc: &Document, page: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page).ok()?.get(b"Parent").ok()?.as_reference().ok()?;
    // Bounded walk; malformed files can contain parent cycles.
    for _ in 0..64 {
        let node = doc.get_dictionary(current).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = node.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Appends every page of `source` to the end of `target`'s page tree.
///
/// Pages and everything they reference (content streams, resources, fonts,
/// annotations) are copied under fresh object ids. References between pages
/// of `source`, such as link destinations, are remapped to the copied pages.
/// Outlines and named destinations of `source` are not carried over.
///
/// Returns the number of pages appended.
pub fn append_document(target: &mut Document, source: &Document) -> Result<usize, ComposerError> {
    let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
    if source_pages.is_empty() {
        return Ok(0);
    }

    let pages_id = pages_root(target)?;
    let new_page_ids = {
        let mut copier = ObjectCopier::new(source, target);
        let new_ids = copier.reserve(source_pages.iter().copied());
        for (source_page, new_id) in source_pages.iter().zip(&new_ids) {
            copier.copy_page(*source_page, *new_id)?;
        }
        new_ids
    };

    for page_id in &new_page_ids {
        if let Ok(page) = target.get_dictionary_mut(*page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let pages_dict = target.get_dictionary_mut(pages_id)?;
    let mut kids = pages_dict.get(b"Kids")?.as_array()?.clone();
    let original_count = pages_dict.get(b"Count")?.as_i64()?;
    kids.extend(new_page_ids.iter().map(|id| Object::Reference(*id)));
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", original_count + new_page_ids.len() as i64);

    Ok(new_page_ids.len())
}

/// Merges `inputs` in order into one file at `output`.
///
/// The first input becomes the base document; the rest are appended to it.
/// Returns the page count of the merged document.
pub fn merge_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<usize, ComposerError> {
    let (first, rest) = inputs.split_first().ok_or(ComposerError::NoInputs)?;
    let mut merged = Document::load(first.as_ref())?;
    debug!("Loaded base document '{}'", first.as_ref().display());

    for input in rest {
        let source = Document::load(input.as_ref())?;
        let appended = append_document(&mut merged, &source)?;
        debug!("Appended {} pages from '{}'", appended, input.as_ref().display());
    }

    let total = merged.get_pages().len();
    merged.save(output)?;
    Ok(total)
}

/// The `/Pages` root of a document's catalog.
pub(crate) fn pages_root(doc: &Document) -> Result<ObjectId, ComposerError> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_dictionary(root_id)?.get(b"Pages")?.as_reference()?)
}

/// The catalog dictionary id.
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId, ComposerError> {
    Ok(doc.trailer.get(b"Root")?.as_reference()?)
}


#[cfg(test)]
mod tests {
    use super::test_support::{create_dummy_pdf, page_text};
    use super::*;

    #[test]
    fn test_append_document_preserves_order() {
        let mut target_doc = create_dummy_pdf(2, "Target Page");
        let source_doc = create_dummy_pdf(3, "Source Page");

        let appended = append_document(&mut target_doc, &source_doc).unwrap();

        assert_eq!(appended, 3);
        assert_eq!(target_doc.get_pages().len(), 5);
        assert!(page_text(&target_doc, 2).contains("Target Page 2"));
        assert!(page_text(&target_doc, 3).contains("Source Page 1"));
        assert!(page_text(&target_doc, 5).contains("Source Page 3"));
    }

    #[test]
    fn test_appended_pages_are_reparented_with_inherited_attributes() {
        let mut target_doc = create_dummy_pdf(1, "Target");
        let source_doc = create_dummy_pdf(1, "Source");
        append_document(&mut target_doc, &source_doc).unwrap();

        let pages_id = pages_root(&target_doc).unwrap();
        let copied = *target_doc.get_pages().get(&2).unwrap();
        let dict = target_doc.get_dictionary(copied).unwrap();
        assert_eq!(dict.get(b"Parent").unwrap().as_reference().unwrap(), pages_id);
        assert!(dict.has(b"MediaBox"));
        assert!(dict.has(b"Resources"));
    }

    #[test]
    fn test_source_page_tree_is_not_copied() {
        let mut target_doc = create_dummy_pdf(1, "Target");
        let source_doc = create_dummy_pdf(4, "Source");
        append_document(&mut target_doc, &source_doc).unwrap();

        let page_trees = target_doc
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| d.get(b"Type").and_then(|t| t.as_name()).ok() == Some(b"Pages".as_slice()))
            .count();
        assert_eq!(page_trees, 1);
    }

    #[test]
    fn test_merge_files_concatenates_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (i, pages) in [1u32, 2, 3].iter().enumerate() {
            let path = dir.path().join(format!("{i}.pdf"));
            create_dummy_pdf(*pages, &format!("Unit{i}")).save(&path).unwrap();
            paths.push(path);
        }
        let output = dir.path().join("merged.pdf");

        let total = merge_files(&paths, &output).unwrap();

        assert_eq!(total, 6);
        let merged = Document::load(&output).unwrap();
        assert!(page_text(&merged, 1).contains("Unit0 1"));
        assert!(page_text(&merged, 2).contains("Unit1 1"));
        assert!(page_text(&merged, 4).contains("Unit2 1"));
    }

    #[test]
    fn test_merge_files_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let none: [&Path; 0] = [];
        assert!(matches!(merge_files(&none, &dir.path().join("x.pdf")), Err(ComposerError::NoInputs)));
    }
}
