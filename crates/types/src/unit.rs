//! Compilation units and their emission order.
//!
//! The emission order built here is the single source of truth for
//! pagination: page numbers, artifact merge order and bookmark order all
//! follow it, and it never changes between the two passes.

use crate::hierarchy::Hierarchy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one independently compiled unit (`cover`, `preface`,
/// `outline`, `chapter-<id>`, or a page id). Also the compiler's `target`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub const COVER: &'static str = "cover";
    pub const PREFACE: &'static str = "preface";
    pub const OUTLINE: &'static str = "outline";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn cover() -> Self {
        Self::new(Self::COVER)
    }

    pub fn preface() -> Self {
        Self::new(Self::PREFACE)
    }

    pub fn outline() -> Self {
        Self::new(Self::OUTLINE)
    }

    /// The key of a chapter-cover unit, e.g. `chapter-01`.
    pub fn chapter(chapter_id: &str) -> Self {
        Self(format!("chapter-{chapter_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for UnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a unit is, which decides how it takes part in each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Cover,
    Preface,
    Outline,
    /// The cover page of the chapter at this index in the hierarchy.
    ChapterCover { chapter: usize },
    /// A content page belonging to the chapter at this index.
    Page { chapter: usize },
}

/// One entry of the emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    /// Human-readable title used for progress output and bookmarks.
    pub title: String,
}

impl Unit {
    /// Whether the unit renders page numbers and is therefore recompiled in
    /// the resolution pass. Cover and preface are numberless.
    pub fn displays_page_numbers(&self) -> bool {
        !matches!(self.kind, UnitKind::Cover | UnitKind::Preface)
    }

    /// Whether the unit receives the complete page map in the resolution pass.
    pub fn receives_page_map(&self) -> bool {
        matches!(self.kind, UnitKind::Outline)
    }

    /// File name of this unit's artifact inside the scratch directory.
    pub fn artifact_file_name(&self) -> String {
        match self.kind {
            UnitKind::Cover => "00_cover.pdf".to_string(),
            UnitKind::Preface => "01_preface.pdf".to_string(),
            UnitKind::Outline => "02_outline.pdf".to_string(),
            UnitKind::ChapterCover { .. } => {
                let chapter_id = self.id.as_str().trim_start_matches("chapter-");
                format!("10_chapter_{chapter_id}_cover.pdf")
            }
            UnitKind::Page { .. } => format!("20_page_{}.pdf", self.id),
        }
    }
}

/// Derives the full emission order: cover, preface, outline, then for each
/// chapter its cover followed by its pages.
///
/// Assumes a hierarchy that passed [`Hierarchy::validate`]; a chapter without
/// a derivable id contributes only its pages.
pub fn emission_order(hierarchy: &Hierarchy) -> Vec<Unit> {
    let mut units = Vec::with_capacity(3 + hierarchy.chapter_count() + hierarchy.page_count());
    units.push(Unit { id: UnitId::cover(), kind: UnitKind::Cover, title: "Cover".into() });
    units.push(Unit { id: UnitId::preface(), kind: UnitKind::Preface, title: "Preface".into() });
    units.push(Unit {
        id: UnitId::outline(),
        kind: UnitKind::Outline,
        title: "Table of Contents".into(),
    });

    for (index, chapter) in hierarchy.chapters.iter().enumerate() {
        if let Some(chapter_id) = chapter.id() {
            units.push(Unit {
                id: UnitId::chapter(chapter_id),
                kind: UnitKind::ChapterCover { chapter: index },
                title: chapter.title.clone(),
            });
        }
        for page in &chapter.pages {
            let title = if page.title.is_empty() { page.id.clone() } else { page.title.clone() };
            units.push(Unit {
                id: UnitId::new(page.id.clone()),
                kind: UnitKind::Page { chapter: index },
                title,
            });
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Chapter, Page};

    fn sample() -> Hierarchy {
        Hierarchy::new(vec![
            Chapter::new("Intro", vec![Page::new("01a", "Welcome"), Page::new("01b", "")]),
            Chapter::new("Core", vec![Page::new("02a", "Basics")]),
        ])
    }

    #[test]
    fn emission_order_matches_document_order() {
        let ids: Vec<String> = emission_order(&sample()).into_iter().map(|u| u.id.to_string()).collect();
        assert_eq!(
            ids,
            ["cover", "preface", "outline", "chapter-01", "01a", "01b", "chapter-02", "02a"]
        );
    }

    #[test]
    fn only_cover_and_preface_skip_the_resolution_pass() {
        let units = emission_order(&sample());
        let skipped: Vec<&str> = units
            .iter()
            .filter(|u| !u.displays_page_numbers())
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(skipped, ["cover", "preface"]);
        assert_eq!(units.iter().filter(|u| u.receives_page_map()).count(), 1);
    }

    #[test]
    fn artifact_names_and_fallback_titles() {
        let units = emission_order(&sample());
        assert_eq!(units[3].artifact_file_name(), "10_chapter_01_cover.pdf");
        assert_eq!(units[5].artifact_file_name(), "20_page_01b.pdf");
        assert_eq!(units[5].title, "01b");
        assert_eq!(units[3].kind, UnitKind::ChapterCover { chapter: 0 });
    }
}
