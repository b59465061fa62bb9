//! The two-level bookmark outline derived from the hierarchy and page map.

use crate::hierarchy::Hierarchy;
use crate::page_map::PageMap;
use crate::unit::{UnitId, UnitKind, emission_order};
use serde::Serialize;
use std::fmt::Write as _;

/// Nesting depth of a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BookmarkLevel {
    /// Cover, preface, outline and chapter entries.
    Top = 1,
    /// Page entries nested under their chapter.
    Nested = 2,
}

impl BookmarkLevel {
    pub fn depth(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkEntry {
    pub unit: UnitId,
    pub title: String,
    pub level: BookmarkLevel,
    /// Absolute, 1-based target page.
    pub page: u32,
}

impl BookmarkEntry {
    pub fn is_front_matter(&self) -> bool {
        matches!(self.unit.as_str(), UnitId::COVER | UnitId::PREFACE | UnitId::OUTLINE)
    }
}

/// Builds bookmarks in emission order. Units missing from `page_map` are
/// left out.
pub fn build_bookmarks(hierarchy: &Hierarchy, page_map: &PageMap) -> Vec<BookmarkEntry> {
    emission_order(hierarchy)
        .into_iter()
        .filter_map(|unit| {
            let page = page_map.start(unit.id.as_str())?;
            let level = match unit.kind {
                UnitKind::Page { .. } => BookmarkLevel::Nested,
                _ => BookmarkLevel::Top,
            };
            Some(BookmarkEntry { unit: unit.id, title: unit.title, level, page })
        })
        .collect()
}

/// Serializes bookmarks into the repeating four-line record format
/// (`BookmarkBegin` / `BookmarkTitle` / `BookmarkLevel` / `BookmarkPageNumber`)
/// understood by metadata tools such as pdftk.
pub fn render_bookmark_records(entries: &[BookmarkEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let title = entry.title.replace(['\r', '\n'], " ");
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "BookmarkBegin\nBookmarkTitle: {}\nBookmarkLevel: {}\nBookmarkPageNumber: {}\n",
            title,
            entry.level.depth(),
            entry.page
        );
    }
    out
}
