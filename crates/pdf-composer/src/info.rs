//! Document information dictionary updates.

use crate::ComposerError;
use crate::pages::text_string;
use lopdf::{Dictionary, Document, Object};

/// Fields written into the document's `/Info` dictionary. Empty fields are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct InfoUpdate {
    pub title: String,
    pub author: String,
    pub producer: String,
    /// A PDF date string, e.g. `D:20240131120000Z`.
    pub modified: Option<String>,
}

/// Merges `update` into the document's `/Info`, creating it when absent.
/// Keys not named by `update` are preserved.
pub fn set_document_info(doc: &mut Document, update: &InfoUpdate) -> Result<(), ComposerError> {
    let existing = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let info_id = match existing {
        Some(id) if doc.get_dictionary(id).is_ok() => id,
        _ => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            id
        }
    };

    let info = doc.get_dictionary_mut(info_id)?;
    for (key, value) in [("Title", &update.title), ("Author", &update.author), ("Producer", &update.producer)] {
        if !value.is_empty() {
            info.set(key, text_string(value));
        }
    }
    if let Some(date) = &update.modified {
        info.set("ModDate", Object::string_literal(date.as_bytes().to_vec()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_dummy_pdf;
    use lopdf::dictionary;

    fn info_dict(doc: &Document) -> &Dictionary {
        let id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        doc.get_dictionary(id).unwrap()
    }

    #[test]
    fn creates_info_dictionary() {
        let mut doc = create_dummy_pdf(1, "p");
        let update = InfoUpdate {
            title: "Field Manual".into(),
            author: "Ops Team".into(),
            producer: "folio".into(),
            modified: Some("D:20240101000000Z".into()),
        };
        set_document_info(&mut doc, &update).unwrap();

        let info = info_dict(&doc);
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Field Manual");
        assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Ops Team");
        assert!(info.has(b"ModDate"));
    }

    #[test]
    fn preserves_unrelated_keys_and_skips_empty_fields() {
        let mut doc = create_dummy_pdf(1, "p");
        let id = doc.add_object(dictionary! {
            "Creator" => Object::string_literal("typst"),
            "Author" => Object::string_literal("Original"),
        });
        doc.trailer.set("Info", id);

        set_document_info(&mut doc, &InfoUpdate { title: "T".into(), ..Default::default() }).unwrap();

        let info = info_dict(&doc);
        assert_eq!(info.get(b"Creator").unwrap().as_str().unwrap(), b"typst");
        assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Original");
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"T");
    }
}
