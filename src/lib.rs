//! Assembles a multi-chapter manual from independently compiled units.
//!
//! Every unit (cover, preface, outline, chapter covers, pages) is compiled
//! on its own. A discovery pass measures each unit and fixes its starting
//! page; a resolution pass recompiles the units that print page numbers.
//! The results are merged, given bookmarks and metadata, and the table of
//! contents is made clickable.

pub mod archive;
pub mod backends;
pub mod compiler;
pub mod error;
pub mod hierarchy;
pub mod pipeline;
pub mod tools;

pub use error::BuildError;
pub use hierarchy::HierarchyProvider;
pub use pipeline::{
    BuildConfig, BuildContext, BuildPipeline, BuildPipelineBuilder, BuildReport, BuildStage, CleanupPolicy,
    LinkLayout, PageCounterKind, PageMapResolver,
};

pub use folio_traits as traits;
pub use folio_types as types;
