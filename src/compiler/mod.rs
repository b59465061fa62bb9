//! Compiling one unit and measuring what came out.

mod page_count;
mod typst;

pub use page_count::{LopdfPageCounter, PdfInfoCounter, parse_pages};
pub use typst::TypstCompiler;

use crate::error::BuildError;
use folio_traits::{CompileRequest, DocumentCompiler, PageCounter};
use folio_types::{PageMap, UnitId};
use std::path::Path;

/// Compiles a single unit and reports the page count of the result.
///
/// This couples a [`DocumentCompiler`] with a [`PageCounter`]. Compile
/// failures and unreadable page counts are both fatal.
#[derive(Debug, Clone, Copy)]
pub struct UnitCompiler<'a> {
    compiler: &'a dyn DocumentCompiler,
    counter: &'a dyn PageCounter,
}

impl<'a> UnitCompiler<'a> {
    pub fn new(compiler: &'a dyn DocumentCompiler, counter: &'a dyn PageCounter) -> Self {
        Self { compiler, counter }
    }

    /// Compiles `target` into `output` and returns its page count.
    pub fn compile(
        &self,
        target: &UnitId,
        output: &Path,
        page_offset: Option<u32>,
        page_map: Option<&PageMap>,
    ) -> Result<u32, BuildError> {
        let request = CompileRequest { target, output, page_offset, page_map };
        self.compiler
            .compile(&request)
            .map_err(|e| BuildError::compile(target, e))?;
        Ok(self.counter.count_pages(output)?)
    }
}
