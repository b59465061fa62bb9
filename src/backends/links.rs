//! Clickable table-of-contents entries.
//!
//! The outline page's typesetting is not inspected. Entry positions are
//! estimated from [`LinkLayout`], so the constants must track the outline
//! template.

use super::write_staged;
use crate::pipeline::config::LinkLayout;
use folio_pdf_composer::{LinkAnnotation, append_link_annotations, page_size};
use folio_traits::{Attempt, Backend};
use folio_types::{BookmarkEntry, BookmarkLevel, Rect, Size};
use log::debug;
use lopdf::Document;
use std::path::PathBuf;

/// Annotate the outline pages of `pdf` in place.
#[derive(Debug, Clone)]
pub struct LinkJob {
    pub pdf: PathBuf,
    /// Absolute page the outline starts on.
    pub outline_start: u32,
    /// Number of pages the outline spans.
    pub outline_pages: u32,
    pub bookmarks: Vec<BookmarkEntry>,
    pub layout: LinkLayout,
}

/// One link and the outline page (0-based, relative to the outline start)
/// it sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPlacement {
    pub outline_page: u32,
    pub link: LinkAnnotation,
}

/// Lays entries out top to bottom, flowing onto the next outline page when
/// one fills up. Entries that do not fit on the last outline page are
/// dropped.
pub fn place_links(
    entries: &[BookmarkEntry],
    layout: &LinkLayout,
    page: Size,
    outline_pages: u32,
) -> Vec<LinkPlacement> {
    let mut placements = Vec::new();
    let mut outline_page = 0;
    let mut cursor = layout.top_offset;
    let mut first_on_page = true;
    let floor = page.height - layout.bottom_margin;

    for entry in entries.iter().filter(|e| !(layout.skip_front_matter && e.is_front_matter())) {
        let gap = if entry.level == BookmarkLevel::Top && !first_on_page { layout.chapter_gap } else { 0.0 };
        let mut top = cursor + gap;
        if !first_on_page && top + layout.line_height > floor {
            outline_page += 1;
            top = layout.top_offset;
        }
        if outline_page >= outline_pages {
            debug!("[LINKS] '{}' and later entries do not fit on the outline", entry.title);
            break;
        }

        let x = match entry.level {
            BookmarkLevel::Top => layout.chapter_indent,
            BookmarkLevel::Nested => layout.page_indent,
        };
        let width = (page.width - layout.right_margin - x).max(0.0);
        let rect = Rect::new(x, page.height - top - layout.line_height, width, layout.line_height);
        placements.push(LinkPlacement { outline_page, link: LinkAnnotation { rect, target_page: entry.page } });

        cursor = top + layout.line_height;
        first_on_page = false;
    }
    placements
}

/// In-process annotator using lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLinkAnnotator;

impl NativeLinkAnnotator {
    fn apply(job: &LinkJob) -> Result<usize, String> {
        let mut doc = Document::load(&job.pdf).map_err(|e| e.to_string())?;
        let size = page_size(&doc, job.outline_start).map_err(|e| e.to_string())?;
        let placements = place_links(&job.bookmarks, &job.layout, size, job.outline_pages);

        let mut written = 0;
        for page_offset in 0..job.outline_pages {
            let links: Vec<LinkAnnotation> = placements
                .iter()
                .filter(|p| p.outline_page == page_offset)
                .map(|p| p.link)
                .collect();
            written += append_link_annotations(&mut doc, job.outline_start + page_offset, &links)
                .map_err(|e| e.to_string())?;
        }

        write_staged(&job.pdf, |staged| doc.save(staged).map(|_| written).map_err(|e| e.to_string()))
    }
}

/// Succeeds with the number of links written.
impl Backend<LinkJob, usize> for NativeLinkAnnotator {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn attempt(&self, job: &LinkJob) -> Attempt<usize> {
        match Self::apply(job) {
            Ok(written) => Attempt::Success(written),
            Err(reason) => Attempt::Failed(reason),
        }
    }
}
