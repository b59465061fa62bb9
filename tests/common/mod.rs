pub mod fixtures;
pub mod pdf_assertions;

use folio::backends::{NativeLinkAnnotator, NativeMerge, NativeMetadata};
use folio::compiler::LopdfPageCounter;
use folio::traits::BackendChain;
use folio::{BuildPipelineBuilder, CleanupPolicy};
use std::path::Path;

pub use fixtures::{CompileCall, SyntheticCompiler};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A pipeline rooted at `root` that needs no external tools: in-process
/// page counting and in-process backends only.
pub fn offline_pipeline(root: &Path, compiler: SyntheticCompiler) -> BuildPipelineBuilder {
    BuildPipelineBuilder::new()
        .with_root(root)
        .with_compiler(compiler)
        .with_page_counter(LopdfPageCounter)
        .with_cleanup(CleanupPolicy::Keep)
        .with_merge_backends(BackendChain::empty().with(NativeMerge))
        .with_metadata_backends(BackendChain::empty().with(NativeMetadata))
        .with_link_backends(BackendChain::empty().with(NativeLinkAnnotator))
}
