use super::config::{BuildConfig, CleanupPolicy, ENV_TYPST, LinkLayout, PageCounterKind};
use super::orchestrator::BuildPipeline;
use crate::backends::{self, LinkJob, MergeJob, MetadataJob};
use crate::compiler::{LopdfPageCounter, PdfInfoCounter, TypstCompiler};
use crate::error::BuildError;
use crate::tools;
use folio_traits::{BackendChain, DocumentCompiler, PageCounter};
use folio_types::DocumentInfo;
use std::path::PathBuf;

/// A builder for creating a `BuildPipeline`.
///
/// Anything not injected explicitly is derived from the configuration when
/// [`build`](Self::build) runs: the compiler is located on `PATH` (or via
/// `FOLIO_TYPST`), the page counter is chosen from
/// [`PageCounterKind`], and every stage gets its default backend chain.
#[derive(Default)]
pub struct BuildPipelineBuilder {
    config: BuildConfig,
    compiler: Option<Box<dyn DocumentCompiler>>,
    counter: Option<Box<dyn PageCounter>>,
    merge: Option<BackendChain<MergeJob>>,
    metadata: Option<BackendChain<MetadataJob>>,
    links: Option<BackendChain<LinkJob, usize>>,
}

impl BuildPipelineBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: BuildConfig) -> Self {
        Self { config, ..Default::default() }
    }

    /// Sets the project directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Archives intermediates into the configured zip instead of discarding them.
    pub fn with_leave_individual(mut self, leave: bool) -> Self {
        if leave {
            self.config.cleanup = CleanupPolicy::Archive;
        }
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.config.cleanup = cleanup;
        self
    }

    pub fn with_link_layout(mut self, layout: LinkLayout) -> Self {
        self.config.link_layout = layout;
        self
    }

    /// When disabled, a unit whose page count changes between passes is
    /// only logged.
    pub fn with_verify_pagination(mut self, verify: bool) -> Self {
        self.config.verify_pagination = verify;
        self
    }

    pub fn with_page_counter_kind(mut self, kind: PageCounterKind) -> Self {
        self.config.page_counter = kind;
        self
    }

    /// Title and author used when the configuration source declares none.
    pub fn with_document_info(mut self, info: DocumentInfo) -> Self {
        self.config.document = info;
        self
    }

    /// Uses `compiler` instead of locating `typst`.
    pub fn with_compiler(mut self, compiler: impl DocumentCompiler + 'static) -> Self {
        self.compiler = Some(Box::new(compiler));
        self
    }

    /// Uses `counter` regardless of the configured [`PageCounterKind`].
    pub fn with_page_counter(mut self, counter: impl PageCounter + 'static) -> Self {
        self.counter = Some(Box::new(counter));
        self
    }

    pub fn with_merge_backends(mut self, chain: BackendChain<MergeJob>) -> Self {
        self.merge = Some(chain);
        self
    }

    pub fn with_metadata_backends(mut self, chain: BackendChain<MetadataJob>) -> Self {
        self.metadata = Some(chain);
        self
    }

    pub fn with_link_backends(mut self, chain: BackendChain<LinkJob, usize>) -> Self {
        self.links = Some(chain);
        self
    }

    /// Consumes the builder and creates the `BuildPipeline`.
    ///
    /// # Errors
    ///
    /// `BuildError::ToolMissing` when the compiler (or an explicitly
    /// requested `pdfinfo`) cannot be found.
    pub fn build(self) -> Result<BuildPipeline, BuildError> {
        let compiler = match self.compiler {
            Some(compiler) => compiler,
            None => {
                let program = tools::resolve_program(&self.config.compiler, ENV_TYPST).ok_or_else(|| {
                    BuildError::ToolMissing { tool: self.config.compiler.clone(), hint: tools::TYPST.hint.to_string() }
                })?;
                log::info!("Using compiler '{}'", program.display());
                Box::new(TypstCompiler::new(program, self.config.root.clone(), &self.config.renderer))
                    as Box<dyn DocumentCompiler>
            }
        };

        let counter = match self.counter {
            Some(counter) => counter,
            None => select_counter(self.config.page_counter)?,
        };
        log::info!("Measuring page counts with {}", counter.name());

        Ok(BuildPipeline::new(
            self.config,
            compiler,
            counter,
            self.merge.unwrap_or_else(backends::default_merge_chain),
            self.metadata.unwrap_or_else(backends::default_metadata_chain),
            self.links.unwrap_or_else(backends::default_link_chain),
        ))
    }
}

fn select_counter(kind: PageCounterKind) -> Result<Box<dyn PageCounter>, BuildError> {
    match (kind, tools::PDFINFO.locate()) {
        (PageCounterKind::Native, _) => Ok(Box::new(LopdfPageCounter)),
        (_, Some(program)) => Ok(Box::new(PdfInfoCounter::new(program))),
        (PageCounterKind::Auto, None) => {
            log::info!("'pdfinfo' not found; counting pages in-process");
            Ok(Box::new(LopdfPageCounter))
        }
        (PageCounterKind::PdfInfo, None) => Err(BuildError::ToolMissing {
            tool: tools::PDFINFO.name.to_string(),
            hint: tools::PDFINFO.hint.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_compiler_is_reported_before_any_work() {
        let config = BuildConfig { compiler: "/nonexistent/bin/typst".into(), ..Default::default() };
        let err = BuildPipelineBuilder::from_config(config)
            .with_page_counter(LopdfPageCounter)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::ToolMissing { ref tool, .. } if tool == "/nonexistent/bin/typst"));
    }

    #[test]
    fn leave_individual_selects_archive_cleanup() {
        let builder = BuildPipelineBuilder::new().with_leave_individual(true);
        assert_eq!(builder.config.cleanup, CleanupPolicy::Archive);
        let builder = BuildPipelineBuilder::new().with_leave_individual(false);
        assert_eq!(builder.config.cleanup, CleanupPolicy::RemoveOnSuccess);
    }
}
