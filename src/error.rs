use folio_pdf_composer::ComposerError;
use folio_traits::{CompilerError, PageCountError};
use folio_types::{HierarchyError, UnitId};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a build. Anything that can degrade instead (merge,
/// metadata, links) is reported through the build report, never here.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to extract the document hierarchy: {0}")]
    HierarchyExtraction(String),

    #[error("Compiling '{target}' failed:\n{diagnostics}")]
    Compile { target: UnitId, diagnostics: String },

    #[error("Could not determine the page count of '{}': {detail}", .path.display())]
    PageCountParse { path: PathBuf, detail: String },

    #[error(
        "Pagination of '{unit}' changed after page numbers were injected ({discovered} pages in pass 1, {rendered} in pass 2); every later page number would be wrong"
    )]
    PaginationDrift { unit: UnitId, discovered: u32, rendered: u32 },

    #[error("Required tool '{tool}' was not found. {hint}")]
    ToolMissing { tool: String, hint: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to archive intermediate artifacts: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("PDF processing failed: {0}")]
    Pdf(#[from] ComposerError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BuildError {
    /// Maps a compiler failure for `target` onto the build taxonomy, keeping
    /// the compiler's own diagnostics.
    pub fn compile(target: &UnitId, err: CompilerError) -> Self {
        let diagnostics = match err {
            CompilerError::Failed { diagnostics, .. } if !diagnostics.trim().is_empty() => diagnostics,
            other => other.to_string(),
        };
        BuildError::Compile { target: target.clone(), diagnostics }
    }
}

impl From<HierarchyError> for BuildError {
    fn from(e: HierarchyError) -> Self {
        BuildError::HierarchyExtraction(e.to_string())
    }
}

impl From<PageCountError> for BuildError {
    fn from(e: PageCountError) -> Self {
        match e {
            PageCountError::Tool { path, message, tool } => {
                BuildError::PageCountParse { path, detail: format!("{tool}: {message}") }
            }
            PageCountError::Unparsable { path, output } => {
                BuildError::PageCountParse { path, detail: format!("no 'Pages:' line in {output:?}") }
            }
        }
    }
}
