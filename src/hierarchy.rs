//! Reading the chapter/page structure out of the document configuration.
//!
//! The configuration is a compiler source file, not data. To read it, a
//! short probe source is written next to it that re-exports the value as
//! queryable metadata, and the compiler's query mode prints it as JSON.

use crate::error::BuildError;
use folio_traits::DocumentCompiler;
use folio_types::{DocumentInfo, Hierarchy};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const HIERARCHY_PROBE: &str = "extract_hierarchy.typ";
const HIERARCHY_LABEL: &str = "<hierarchy>";
const INFO_PROBE: &str = "extract_document_info.typ";
const INFO_LABEL: &str = "<document-info>";

/// A transient source file, removed when dropped.
#[derive(Debug)]
struct ProbeFile {
    path: PathBuf,
}

impl ProbeFile {
    fn create(path: PathBuf, contents: &str) -> std::io::Result<Self> {
        fs::write(&path, contents)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProbeFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Could not remove probe file '{}': {}", self.path.display(), e);
        }
    }
}

/// Reads the hierarchy (and document title/author) from the configuration
/// source through the compiler's query mode.
#[derive(Debug)]
pub struct HierarchyProvider<'a> {
    compiler: &'a dyn DocumentCompiler,
    source: &'a Path,
}

impl<'a> HierarchyProvider<'a> {
    /// `source` is the configuration file, relative to the compiler root.
    pub fn new(compiler: &'a dyn DocumentCompiler, source: &'a Path) -> Self {
        Self { compiler, source }
    }

    /// Extracts and validates the hierarchy.
    ///
    /// # Errors
    ///
    /// `BuildError::HierarchyExtraction` when the query fails, its output is
    /// not the expected JSON, or the hierarchy is structurally invalid.
    pub fn extract(&self) -> Result<Hierarchy, BuildError> {
        info!("[HIERARCHY] Extracting document hierarchy from '{}'", self.source.display());
        let probe = format!("#import \"{}\": hierarchy\n#metadata(hierarchy) {HIERARCHY_LABEL}\n", self.import_path());
        let hierarchy: Hierarchy = self
            .query_value(HIERARCHY_PROBE, &probe, HIERARCHY_LABEL)
            .map_err(BuildError::HierarchyExtraction)?;
        hierarchy.validate()?;
        info!(
            "[HIERARCHY] Found {} chapters with {} pages",
            hierarchy.chapter_count(),
            hierarchy.page_count()
        );
        Ok(hierarchy)
    }

    /// Title and author declared by the configuration, if it declares both.
    /// Never fails; a missing declaration is logged and yields `None`.
    pub fn document_info(&self) -> Option<DocumentInfo> {
        let probe = format!(
            "#import \"{}\": title, author\n#metadata((title: title, author: author)) {INFO_LABEL}\n",
            self.import_path()
        );
        match self.query_value::<DocumentInfo>(INFO_PROBE, &probe, INFO_LABEL) {
            Ok(info) => Some(info),
            Err(reason) => {
                debug!("[HIERARCHY] No title/author in configuration ({reason}); using configured fallback");
                None
            }
        }
    }

    fn import_path(&self) -> String {
        self.source.to_string_lossy().replace('\\', "/")
    }

    fn query_value<T: DeserializeOwned>(&self, probe_name: &str, contents: &str, label: &str) -> Result<T, String> {
        let probe = ProbeFile::create(self.compiler.root().join(probe_name), contents)
            .map_err(|e| format!("could not write probe source: {e}"))?;
        let raw = self.compiler.query(probe.path(), label).map_err(|e| e.to_string())?;
        parse_query_output(&raw)
    }
}

/// Pulls `[0].value` out of the compiler's query output.
fn parse_query_output<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let records: Vec<Value> = serde_json::from_str(raw).map_err(|e| format!("malformed query output: {e}"))?;
    let value = records
        .into_iter()
        .next()
        .and_then(|mut record| record.get_mut("value").map(Value::take))
        .ok_or_else(|| "query returned no metadata record".to_string())?;
    serde_json::from_value(value).map_err(|e| format!("unexpected value shape: {e}"))
}
