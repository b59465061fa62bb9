//! Page lookup and geometry helpers.

use crate::ComposerError;
use folio_types::Size;
use lopdf::{Document, Object, ObjectId, StringFormat};

/// The object id of the 1-based page `number`.
pub fn page_id(doc: &Document, number: u32) -> Result<ObjectId, ComposerError> {
    let pages = doc.get_pages();
    pages
        .get(&number)
        .copied()
        .ok_or(ComposerError::PageOutOfRange { page: number, total: pages.len() })
}

/// Width and height of page `number`, from its (possibly inherited) `/MediaBox`.
pub fn page_size(doc: &Document, number: u32) -> Result<Size, ComposerError> {
    let mut current = page_id(doc, number)?;
    for _ in 0..64 {
        let dict = doc.get_dictionary(current)?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let (_, media_box) = doc.dereference(media_box)?;
            let values = media_box
                .as_array()?
                .iter()
                .map(number_value)
                .collect::<Option<Vec<f32>>>()
                .filter(|v| v.len() == 4)
                .ok_or(ComposerError::MissingMediaBox(number))?;
            return Ok(Size::new((values[2] - values[0]).abs(), (values[3] - values[1]).abs()));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    Err(ComposerError::MissingMediaBox(number))
}

fn number_value(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Encodes a PDF text string: literal bytes for printable ASCII, UTF-16BE
/// with a byte-order mark for anything else.
pub(crate) fn text_string(s: &str) -> Object {
    if s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Object::String(s.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_dummy_pdf;

    #[test]
    fn size_is_inherited_from_page_tree() {
        let doc = create_dummy_pdf(2, "p");
        assert_eq!(page_size(&doc, 2).unwrap(), Size::new(612.0, 792.0));
    }

    #[test]
    fn size_prefers_the_page_own_media_box() {
        let mut doc = create_dummy_pdf(1, "p");
        let id = page_id(&doc, 1).unwrap();
        doc.get_dictionary_mut(id)
            .unwrap()
            .set("MediaBox", vec![0.into(), 0.into(), 595.5f32.into(), 842.into()]);
        assert_eq!(page_size(&doc, 1).unwrap(), Size::new(595.5, 842.0));
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let doc = create_dummy_pdf(1, "p");
        assert!(matches!(page_id(&doc, 3), Err(ComposerError::PageOutOfRange { page: 3, total: 1 })));
    }

    #[test]
    fn text_strings_use_utf16_only_when_needed() {
        assert_eq!(text_string("Intro"), Object::String(b"Intro".to_vec(), StringFormat::Literal));
        match text_string("Café") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(bytes.len(), 2 + 4 * 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
