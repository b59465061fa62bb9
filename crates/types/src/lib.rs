//! Shared data model for the folio build pipeline.
//!
//! Everything here is plain data: the chapter/page [`Hierarchy`], the
//! [`Unit`]s derived from it in emission order, the [`PageMap`] produced by
//! the discovery pass, and the [`BookmarkEntry`] list derived from both.

pub mod artifact;
pub mod bookmark;
pub mod document;
pub mod geometry;
pub mod hierarchy;
pub mod page_map;
pub mod unit;

pub use artifact::CompiledArtifact;
pub use bookmark::{BookmarkEntry, BookmarkLevel, build_bookmarks, render_bookmark_records};
pub use document::DocumentInfo;
pub use geometry::{Rect, Size};
pub use hierarchy::{Chapter, Hierarchy, HierarchyError, Page};
pub use page_map::{PageMap, PageMapBuilder, PageMapError};
pub use unit::{Unit, UnitId, UnitKind, emission_order};
