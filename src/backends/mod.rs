//! Providers for the optional post-processing stages.
//!
//! Each stage has an ordered chain: external tools first, an in-process
//! `lopdf` implementation last. Chains are plain data; callers may replace
//! them, including with an empty chain.

pub mod links;
pub mod merge;
pub mod metadata;

pub use links::{LinkJob, LinkPlacement, NativeLinkAnnotator, place_links};
pub use merge::{Ghostscript as GhostscriptMerge, MergeJob, NativeMerge, PdfUnite};
pub use metadata::{
    BOOKMARKS_FILE, GhostscriptPdfmark, MetadataJob, NativeMetadata, PdftkMetadata, render_pdfmarks,
    write_bookmark_description,
};

use crate::tools::ExternalTool;
use folio_traits::{Attempt, BackendChain};
use std::fs;
use std::path::{Path, PathBuf};

/// `pdfunite`, then `gs`, then the in-process merge.
pub fn default_merge_chain() -> BackendChain<MergeJob> {
    BackendChain::empty().with(PdfUnite).with(GhostscriptMerge).with(NativeMerge)
}

/// `pdftk`, then `gs` pdfmarks, then the in-process writer.
pub fn default_metadata_chain() -> BackendChain<MetadataJob> {
    BackendChain::empty().with(PdftkMetadata).with(GhostscriptPdfmark).with(NativeMetadata)
}

pub fn default_link_chain() -> BackendChain<LinkJob, usize> {
    BackendChain::empty().with(NativeLinkAnnotator)
}

/// Runs `f` with the located tool, or reports the tool as unavailable.
pub(crate) fn with_tool(tool: ExternalTool, f: impl FnOnce(&Path) -> Result<(), String>) -> Attempt {
    match tool.locate() {
        Some(program) => match f(&program) {
            Ok(()) => Attempt::Success(()),
            Err(reason) => Attempt::Failed(reason),
        },
        None => Attempt::Unavailable(format!("'{}' not found on PATH", tool.name)),
    }
}

/// A sibling path used to write a new version of `path` before swapping it in.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Replaces `target` with `staged`.
pub(crate) fn commit(staged: &Path, target: &Path) -> Result<(), String> {
    fs::rename(staged, target).map_err(|e| format!("could not replace '{}': {e}", target.display()))
}

/// Has `write` produce the staging file for `target`, then swaps it in.
/// On failure the staging file is removed and `target` is left untouched.
pub(crate) fn write_staged<T>(target: &Path, write: impl FnOnce(&Path) -> Result<T, String>) -> Result<T, String> {
    let staged = staging_path(target);
    match write(&staged) {
        Ok(value) => {
            commit(&staged, target)?;
            Ok(value)
        }
        Err(reason) => {
            if staged.exists() {
                let _ = fs::remove_file(&staged);
            }
            Err(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_write_replaces_target_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("output.pdf");
        fs::write(&target, b"old").unwrap();

        let value = write_staged(&target, |staged| fs::write(staged, b"new").map(|_| 7).map_err(|e| e.to_string()));
        assert_eq!(value, Ok(7));
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!staging_path(&target).exists());
    }

    #[test]
    fn failed_write_leaves_no_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("output.pdf");

        let result: Result<(), String> = write_staged(&target, |staged| {
            fs::write(staged, b"half a pdf").unwrap();
            Err("tool crashed".into())
        });
        assert_eq!(result, Err("tool crashed".to_string()));
        assert!(!target.exists());
        assert!(!staging_path(&target).exists());
    }
}
