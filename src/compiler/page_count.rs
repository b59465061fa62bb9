use crate::tools::run_captured;
use folio_traits::{PageCountError, PageCounter};
use lopdf::Document;
use std::path::{Path, PathBuf};

/// Extracts the count from `pdfinfo` output: the first line of the form
/// `Pages: <n>`.
pub fn parse_pages(output: &str) -> Option<u32> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Counts pages with poppler's `pdfinfo`.
#[derive(Debug, Clone)]
pub struct PdfInfoCounter {
    program: PathBuf,
}

impl PdfInfoCounter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl PageCounter for PdfInfoCounter {
    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError> {
        let output = run_captured(&self.program, &[path]).map_err(|message| PageCountError::Tool {
            tool: self.name().to_string(),
            path: path.to_path_buf(),
            message,
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pages(&stdout).ok_or_else(|| PageCountError::Unparsable {
            path: path.to_path_buf(),
            output: stdout.into_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "pdfinfo"
    }
}

/// Counts pages in-process by loading the page tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfPageCounter;

impl PageCounter for LopdfPageCounter {
    fn count_pages(&self, path: &Path) -> Result<u32, PageCountError> {
        let doc = Document::load(path).map_err(|e| PageCountError::Tool {
            tool: self.name().to_string(),
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(doc.get_pages().len() as u32)
    }

    fn name(&self) -> &'static str {
        "lopdf"
    }
}
