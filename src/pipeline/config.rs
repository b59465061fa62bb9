use folio_types::DocumentInfo;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the compiler program or path.
pub const ENV_TYPST: &str = "FOLIO_TYPST";
/// Overrides the fallback document title.
pub const ENV_TITLE: &str = "FOLIO_TITLE";
/// Overrides the fallback document author.
pub const ENV_AUTHOR: &str = "FOLIO_AUTHOR";

/// How produced artifacts are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageCounterKind {
    /// `pdfinfo` when it is on `PATH`, the in-process counter otherwise.
    #[default]
    Auto,
    /// Always `pdfinfo`; a missing tool is fatal.
    PdfInfo,
    /// Always the in-process counter.
    Native,
}

/// What happens to the scratch directory after a successful build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupPolicy {
    /// Delete intermediates.
    #[default]
    RemoveOnSuccess,
    /// Zip intermediates into the archive, then delete them.
    Archive,
    /// Leave the scratch directory untouched.
    Keep,
}

/// Placement of clickable regions on the table-of-contents page.
///
/// Distances are in PDF points. Vertical distances are measured down from
/// the top edge of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkLayout {
    /// Top of the first entry.
    pub top_offset: f32,
    pub line_height: f32,
    /// Extra space above every chapter entry except the first on a page.
    pub chapter_gap: f32,
    /// Left edge of chapter and front matter entries.
    pub chapter_indent: f32,
    /// Left edge of page entries.
    pub page_indent: f32,
    pub right_margin: f32,
    /// Entries may not extend below this distance from the bottom edge.
    pub bottom_margin: f32,
    /// Leave cover, preface and outline entries without links, for outline
    /// templates that only list chapters.
    pub skip_front_matter: bool,
}

impl Default for LinkLayout {
    fn default() -> Self {
        Self {
            top_offset: 150.0,
            line_height: 22.0,
            chapter_gap: 12.0,
            chapter_indent: 72.0,
            page_indent: 96.0,
            right_margin: 72.0,
            bottom_margin: 72.0,
            skip_front_matter: false,
        }
    }
}

/// Settings for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project directory. Every other relative path is resolved against it.
    pub root: PathBuf,
    /// Source compiled once per unit.
    pub renderer: PathBuf,
    /// Source defining `hierarchy`, and optionally `title` and `author`.
    pub hierarchy_source: PathBuf,
    pub scratch_dir: PathBuf,
    pub output: PathBuf,
    pub archive: PathBuf,
    /// Compiler program name or path.
    pub compiler: String,
    pub page_counter: PageCounterKind,
    /// Fail when a unit's page count changes between passes.
    pub verify_pagination: bool,
    pub cleanup: CleanupPolicy,
    pub link_layout: LinkLayout,
    /// Used where the hierarchy source does not define title or author.
    pub document: DocumentInfo,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            renderer: PathBuf::from("renderer.typ"),
            hierarchy_source: PathBuf::from("config.typ"),
            scratch_dir: PathBuf::from("build"),
            output: PathBuf::from("output.pdf"),
            archive: PathBuf::from("build_pdfs.zip"),
            compiler: "typst".to_string(),
            page_counter: PageCounterKind::Auto,
            verify_pagination: true,
            cleanup: CleanupPolicy::RemoveOnSuccess,
            link_layout: LinkLayout::default(),
            document: DocumentInfo::new("Manual", ""),
        }
    }
}

impl BuildConfig {
    /// Applies `FOLIO_TITLE` and `FOLIO_AUTHOR`. `FOLIO_TYPST` is honoured
    /// when the compiler is located.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(title) = std::env::var(ENV_TITLE) {
            self.document.title = title;
        }
        if let Ok(author) = std::env::var(ENV_AUTHOR) {
            self.document.author = author;
        }
        self
    }

    /// Resolves `path` against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) }
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.resolve(&self.scratch_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.resolve(&self.archive)
    }
}
