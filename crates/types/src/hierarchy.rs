//! The ordered chapter/page structure read from the document configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Structural problems found while validating a [`Hierarchy`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("chapter {index} ('{title}') has no pages")]
    EmptyChapter { index: usize, title: String },

    #[error("page id '{0}' is shorter than the two characters needed to derive its chapter id")]
    PageIdTooShort(String),

    #[error("unit id '{0}' appears more than once")]
    DuplicateUnit(String),
}

/// A single content page of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl Page {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into() }
    }
}

/// A chapter and its pages, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, pages: Vec<Page>) -> Self {
        Self { title: title.into(), pages }
    }

    /// The chapter id: the first two characters of its first page's id.
    ///
    /// Returns `None` for a chapter without pages or whose first page id is
    /// too short; [`Hierarchy::validate`] rejects both.
    pub fn id(&self) -> Option<&str> {
        let first = &self.pages.first()?.id;
        if first.chars().count() < 2 {
            return None;
        }
        let end = first.char_indices().nth(2).map_or(first.len(), |(i, _)| i);
        Some(&first[..end])
    }
}

/// The full document structure. Serialized as a bare JSON array of chapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hierarchy {
    pub chapters: Vec<Chapter>,
}

impl Hierarchy {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn page_count(&self) -> usize {
        self.chapters.iter().map(|c| c.pages.len()).sum()
    }

    /// Checks the invariants every later stage relies on.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let mut seen: HashSet<String> = ["cover", "preface", "outline"]
            .into_iter()
            .map(String::from)
            .collect();

        for (index, chapter) in self.chapters.iter().enumerate() {
            if chapter.pages.is_empty() {
                return Err(HierarchyError::EmptyChapter { index, title: chapter.title.clone() });
            }
            for page in &chapter.pages {
                if page.id.chars().count() < 2 {
                    return Err(HierarchyError::PageIdTooShort(page.id.clone()));
                }
            }
            let chapter_key = format!("chapter-{}", chapter.id().unwrap_or_default());
            if !seen.insert(chapter_key.clone()) {
                return Err(HierarchyError::DuplicateUnit(chapter_key));
            }
            for page in &chapter.pages {
                if !seen.insert(page.id.clone()) {
                    return Err(HierarchyError::DuplicateUnit(page.id.clone()));
                }
            }
        }
        Ok(())
    }
}
