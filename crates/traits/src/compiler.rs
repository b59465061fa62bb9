//! DocumentCompiler trait for abstracting the external document compiler.
//!
//! The pipeline never talks to a compiler binary directly. It goes through
//! this trait so tests can substitute an in-process compiler with scripted
//! page counts.

use folio_types::{PageMap, UnitId};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for compile and query invocations.
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}:\n{diagnostics}")]
    Failed { command: String, status: String, diagnostics: String },

    #[error("compiler produced unusable output: {0}")]
    InvalidOutput(String),

    #[error("failed to encode compiler input: {0}")]
    Input(String),
}

/// One compilation of one unit.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// The logical target, passed to the compiler as `target=<id>`.
    pub target: &'a UnitId,
    /// Where the compiled artifact is written.
    pub output: &'a Path,
    /// Absolute page the unit starts on; `None` during discovery.
    pub page_offset: Option<u32>,
    /// The finalized page map; only handed to units that render a full
    /// table of contents.
    pub page_map: Option<&'a PageMap>,
}

impl<'a> CompileRequest<'a> {
    /// A discovery-pass request: no offset, no page map.
    pub fn discovery(target: &'a UnitId, output: &'a Path) -> Self {
        Self { target, output, page_offset: None, page_map: None }
    }
}

/// A trait for invoking an external document compiler.
///
/// # Contract
///
/// Compiling the same target with the same offset and page map must be
/// deterministic: the two-pass page map is only correct if a unit's page
/// count does not change once numbers are injected.
pub trait DocumentCompiler: Debug {
    /// Compiles one target and writes the artifact to `request.output`.
    ///
    /// # Errors
    ///
    /// `CompilerError::Failed` carries the compiler's diagnostics when it
    /// exits with a nonzero status.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), CompilerError>;

    /// Runs the compiler's query mode against `source` and returns the raw
    /// JSON printed on stdout.
    fn query(&self, source: &Path, selector: &str) -> Result<String, CompilerError>;

    /// Directory the compiler resolves relative imports against. Probe
    /// sources are written here.
    fn root(&self) -> PathBuf;

    /// Returns a human-readable name for this compiler (for logging).
    fn name(&self) -> &str;
}
