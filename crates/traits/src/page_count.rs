//! PageCounter trait for introspecting compiled artifacts.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageCountError {
    #[error("'{tool}' could not inspect '{}': {message}", .path.display())]
    Tool { tool: String, path: PathBuf, message: String },

    #[error("no page count found for '{}' in output: {output}", .path.display())]
    Unparsable { path: PathBuf, output: String },
}

/// A trait for measuring how many pages a compiled artifact has.
///
/// Implementations must fail rather than guess: a wrong count silently
/// shifts every later unit's page numbers.
pub trait PageCounter: Debug {
    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError>;

    /// Returns a human-readable name for this counter (for logging).
    fn name(&self) -> &'static str;
}
