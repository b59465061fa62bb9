use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;

fn page_numbers(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages().into_iter().map(|(number, id)| (id, number)).collect()
}

fn text(obj: &Object) -> String {
    let bytes = obj.as_str().unwrap_or_default();
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// One outline item: title, depth (1 = top level) and target page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub title: String,
    pub depth: u8,
    pub page: u32,
}

/// Flattens the document outline in reading order.
pub fn outline_items(doc: &Document) -> Vec<OutlineItem> {
    let pages = page_numbers(doc);
    let mut items = Vec::new();
    let Ok(catalog) = doc.catalog() else { return items };
    let Ok(root) = catalog.get(b"Outlines").and_then(Object::as_reference) else { return items };
    let Ok(first) = doc.get_dictionary(root).and_then(|d| d.get(b"First")).and_then(Object::as_reference) else {
        return items;
    };
    collect_level(doc, &pages, first, 1, &mut items);
    items
}

fn collect_level(doc: &Document, pages: &HashMap<ObjectId, u32>, first: ObjectId, depth: u8, out: &mut Vec<OutlineItem>) {
    let mut current = Some(first);
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else { return };
        let page = dict
            .get(b"Dest")
            .and_then(Object::as_array)
            .ok()
            .and_then(|dest| dest.first())
            .and_then(|target| target.as_reference().ok())
            .and_then(|target| pages.get(&target).copied())
            .unwrap_or(0);
        out.push(OutlineItem { title: dict.get(b"Title").map(text).unwrap_or_default(), depth, page });
        if let Ok(child) = dict.get(b"First").and_then(Object::as_reference) {
            collect_level(doc, pages, child, depth + 1, out);
        }
        current = dict.get(b"Next").and_then(Object::as_reference).ok();
    }
}

/// Destination pages of the GoTo link annotations on `page`, in order.
pub fn link_targets(doc: &Document, page: u32) -> Vec<u32> {
    let pages = page_numbers(doc);
    let Some(page_id) = doc.get_pages().get(&page).copied() else { return Vec::new() };
    let Ok(page_dict) = doc.get_dictionary(page_id) else { return Vec::new() };
    let Ok(annots) = page_dict.get(b"Annots") else { return Vec::new() };
    let Ok((_, annots)) = doc.dereference(annots) else { return Vec::new() };
    let Ok(annots) = annots.as_array() else { return Vec::new() };

    annots
        .iter()
        .filter_map(|a| doc.dereference(a).ok()?.1.as_dict().ok())
        .filter(|a| a.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Link".as_slice()))
        .filter_map(|a| {
            let action = a.get(b"A").ok()?.as_dict().ok()?;
            let target = action.get(b"D").ok()?.as_array().ok()?.first()?.as_reference().ok()?;
            pages.get(&target).copied()
        })
        .collect()
}

/// A string entry of the document `/Info` dictionary.
pub fn info_value(doc: &Document, key: &str) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let (_, info) = doc.dereference(info).ok()?;
    info.as_dict().ok()?.get(key.as_bytes()).ok().map(text)
}

/// Text drawn on `page`, decoded by lopdf.
pub fn page_text(doc: &Document, page: u32) -> String {
    doc.extract_text(&[page]).unwrap_or_default()
}
