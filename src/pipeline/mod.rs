//! Build pipeline orchestration.
//!
//! - [`BuildPipelineBuilder`]: fluent builder for constructing a build
//! - [`BuildPipeline`]: runs the stages in order and returns a [`BuildReport`]
//! - [`PageMapResolver`]: the discovery and resolution passes
//! - [`BuildContext`]: scratch directory, artifacts and the frozen page map
//!
//! # Example
//!
//! ```ignore
//! use folio::BuildPipelineBuilder;
//!
//! let report = BuildPipelineBuilder::new()
//!     .with_root("manual")
//!     .with_leave_individual(true)
//!     .build()?
//!     .run()?;
//! println!("{} pages", report.total_pages);
//! ```

mod builder;
pub mod config;
pub mod context;
mod orchestrator;
pub mod resolver;

pub use builder::BuildPipelineBuilder;
pub use config::{BuildConfig, CleanupPolicy, LinkLayout, PageCounterKind};
pub use context::{BuildContext, BuildStage, Degradation};
pub use orchestrator::{BuildPipeline, BuildReport};
pub use resolver::{PAGE_MAP_FILE, PageMapResolver};
