use super::config::{BuildConfig, CleanupPolicy};
use super::context::{BuildContext, BuildStage, Degradation};
use super::resolver::PageMapResolver;
use crate::archive::archive_directory;
use crate::backends::{LinkJob, MergeJob, MetadataJob, write_bookmark_description};
use crate::compiler::UnitCompiler;
use crate::error::BuildError;
use crate::hierarchy::HierarchyProvider;
use folio_traits::{BackendChain, ChainOutcome, DocumentCompiler, PageCounter};
use folio_types::{BookmarkEntry, DocumentInfo, Hierarchy, PageMap, UnitId, build_bookmarks, emission_order};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// What a finished build produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub stage: BuildStage,
    pub total_pages: u32,
    pub chapter_count: usize,
    pub page_map: PageMap,
    /// The merged document, absent when no merge backend succeeded.
    pub output: Option<PathBuf>,
    pub metadata_backend: Option<&'static str>,
    pub links_written: usize,
    pub archive: Option<PathBuf>,
    /// Set when intermediates were left on disk.
    pub scratch_dir: Option<PathBuf>,
    pub degraded: Vec<Degradation>,
}

/// A configured build: compiler, page counter and the backend chains of the
/// optional stages. Create one with [`BuildPipelineBuilder`](super::BuildPipelineBuilder).
pub struct BuildPipeline {
    config: BuildConfig,
    compiler: Box<dyn DocumentCompiler>,
    counter: Box<dyn PageCounter>,
    merge: BackendChain<MergeJob>,
    metadata: BackendChain<MetadataJob>,
    links: BackendChain<LinkJob, usize>,
}

impl std::fmt::Debug for BuildPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("compiler", &self.compiler.name())
            .field("counter", &self.counter.name())
            .field("merge", &self.merge)
            .field("metadata", &self.metadata)
            .field("links", &self.links)
            .finish()
    }
}

impl BuildPipeline {
    pub(super) fn new(
        config: BuildConfig,
        compiler: Box<dyn DocumentCompiler>,
        counter: Box<dyn PageCounter>,
        merge: BackendChain<MergeJob>,
        metadata: BackendChain<MetadataJob>,
        links: BackendChain<LinkJob, usize>,
    ) -> Self {
        Self { config, compiler, counter, merge, metadata, links }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Runs the build from an empty scratch directory to `DONE`.
    ///
    /// Everything up to and including the resolution pass is all-or-nothing.
    /// Merge, metadata, links and cleanup degrade instead of failing; the
    /// report lists what was skipped. On a fatal error the scratch directory
    /// is left in place.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let scratch = self.config.scratch_path();
        let mut ctx = BuildContext::create(&scratch)?;
        match self.execute(&mut ctx) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Build failed at stage {}: {}", ctx.stage(), e);
                error!("Intermediate files were left in '{}'", scratch.display());
                Err(e)
            }
        }
    }

    fn execute(&self, ctx: &mut BuildContext) -> Result<BuildReport, BuildError> {
        let provider = HierarchyProvider::new(self.compiler.as_ref(), &self.config.hierarchy_source);
        let hierarchy = provider.extract()?;
        let info = provider
            .document_info()
            .map(|declared| declared.or(&self.config.document))
            .unwrap_or_else(|| self.config.document.clone());
        ctx.advance(BuildStage::HierarchyLoaded);

        let units = emission_order(&hierarchy);
        let resolver = PageMapResolver::new(
            UnitCompiler::new(self.compiler.as_ref(), self.counter.as_ref()),
            self.config.verify_pagination,
        );
        let page_map = resolver.plan(&units, ctx)?;
        resolver.render(&units, &page_map, ctx)?;

        let bookmarks = build_bookmarks(&hierarchy, &page_map);
        let merged = self.merge_stage(ctx);
        let metadata_backend = self.metadata_stage(ctx, merged.as_ref(), info, &bookmarks);
        let links_written = self.links_stage(ctx, merged.as_ref(), &page_map, bookmarks);

        Ok(self.finish(ctx, &hierarchy, page_map, merged, metadata_backend, links_written))
    }

    fn merge_stage(&self, ctx: &mut BuildContext) -> Option<PathBuf> {
        let output = self.config.output_path();
        if output.exists() {
            if let Err(e) = fs::remove_file(&output) {
                warn!("[MERGE] Could not remove stale '{}': {}", output.display(), e);
            }
        }
        let job = MergeJob { inputs: ctx.artifacts().iter().map(|a| a.path.clone()).collect(), output };
        info!("[MERGE] Merging {} files into '{}'", job.inputs.len(), job.output.display());

        let outcome = self.merge.run(&job);
        let merged = match outcome.applied_by() {
            Some(backend) if job.output.exists() => {
                info!("[MERGE] Merged with {backend}");
                Some(job.output)
            }
            Some(backend) => {
                warn!("[MERGE] {backend} reported success but wrote no output");
                ctx.degrade(BuildStage::Merged, format!("{backend} produced no output"), Vec::new());
                None
            }
            None => {
                warn!("[MERGE] No merge tool succeeded; individual files remain in '{}'", ctx.scratch_dir().display());
                record_exhausted(ctx, BuildStage::Merged, "[MERGE]", "no merged output", &outcome);
                None
            }
        };
        ctx.advance(BuildStage::Merged);
        merged
    }

    fn metadata_stage(
        &self,
        ctx: &mut BuildContext,
        merged: Option<&PathBuf>,
        info: DocumentInfo,
        bookmarks: &[BookmarkEntry],
    ) -> Option<&'static str> {
        match write_bookmark_description(ctx.scratch_dir(), bookmarks) {
            Ok(path) => debug!("[METADATA] Bookmark description written to '{}'", path.display()),
            Err(e) => warn!("[METADATA] Could not write the bookmark description: {e}"),
        }
        let applied = match merged {
            Some(pdf) => {
                let job = MetadataJob {
                    pdf: pdf.clone(),
                    info,
                    bookmarks: bookmarks.to_vec(),
                    work_dir: ctx.scratch_dir().to_path_buf(),
                };
                let outcome = self.metadata.run(&job);
                match outcome.applied_by() {
                    Some(backend) => {
                        info!("[METADATA] Applied title, author and {} bookmarks with {backend}", bookmarks.len());
                        Some(backend)
                    }
                    None => {
                        warn!("[METADATA] No metadata tool succeeded; the output has no bookmarks");
                        record_exhausted(ctx, BuildStage::MetadataApplied, "[METADATA]", "no bookmarks", &outcome);
                        None
                    }
                }
            }
            None => {
                ctx.degrade(BuildStage::MetadataApplied, "skipped: nothing was merged", Vec::new());
                None
            }
        };
        ctx.advance(BuildStage::MetadataApplied);
        applied
    }

    fn links_stage(
        &self,
        ctx: &mut BuildContext,
        merged: Option<&PathBuf>,
        page_map: &PageMap,
        bookmarks: Vec<BookmarkEntry>,
    ) -> usize {
        let outline = UnitId::outline();
        let written = match (merged, page_map.start(outline.as_str()), page_map.page_count(outline.as_str())) {
            (Some(pdf), Some(outline_start), Some(outline_pages)) => {
                let job = LinkJob {
                    pdf: pdf.clone(),
                    outline_start,
                    outline_pages,
                    bookmarks,
                    layout: self.config.link_layout,
                };
                let outcome = self.links.run(&job);
                match (outcome.applied_by(), outcome.value()) {
                    (Some(backend), Some(&written)) => {
                        info!("[LINKS] Added {written} outline links with {backend}");
                        written
                    }
                    _ => {
                        warn!("[LINKS] Outline entries are not clickable");
                        record_exhausted(ctx, BuildStage::LinksApplied, "[LINKS]", "outline not clickable", &outcome);
                        0
                    }
                }
            }
            _ => {
                ctx.degrade(BuildStage::LinksApplied, "skipped: nothing was merged", Vec::new());
                0
            }
        };
        ctx.advance(BuildStage::LinksApplied);
        written
    }

    fn finish(
        &self,
        ctx: &mut BuildContext,
        hierarchy: &Hierarchy,
        page_map: PageMap,
        merged: Option<PathBuf>,
        metadata_backend: Option<&'static str>,
        links_written: usize,
    ) -> BuildReport {
        let scratch = ctx.scratch_dir().to_path_buf();
        let mut archive = None;
        let mut keep = self.config.cleanup == CleanupPolicy::Keep || merged.is_none();
        if self.config.cleanup == CleanupPolicy::Archive {
            let path = self.config.archive_path();
            match archive_directory(&scratch, &path) {
                Ok(count) => {
                    info!("Archived {} intermediate files in '{}'", count, path.display());
                    archive = Some(path);
                }
                Err(e) => {
                    warn!("Could not archive '{}' to '{}': {}", scratch.display(), path.display(), e);
                    if path.is_file() {
                        let _ = fs::remove_file(&path);
                    }
                    ctx.degrade(BuildStage::Done, format!("archive not written: {e}"), Vec::new());
                    keep = true;
                }
            }
        }

        if keep {
            info!("Intermediate files kept in '{}'", scratch.display());
        } else if let Err(e) = fs::remove_dir_all(&scratch) {
            warn!("Could not remove '{}': {}", scratch.display(), e);
            ctx.degrade(BuildStage::Done, format!("scratch directory not removed: {e}"), Vec::new());
            keep = true;
        } else {
            info!("Build directory cleaned up");
        }
        ctx.advance(BuildStage::Done);

        BuildReport {
            stage: ctx.stage(),
            total_pages: page_map.total_pages(),
            chapter_count: hierarchy.chapter_count(),
            page_map,
            output: merged,
            metadata_backend,
            links_written,
            archive,
            scratch_dir: keep.then_some(scratch),
            degraded: ctx.degraded().to_vec(),
        }
    }
}

fn record_exhausted<T>(ctx: &mut BuildContext, stage: BuildStage, tag: &str, effect: &str, outcome: &ChainOutcome<T>) {
    for miss in outcome.misses() {
        warn!("{tag}   {}: {}", miss.backend, miss.reason);
    }
    let hints = outcome.hints();
    for hint in &hints {
        warn!("{tag}   {hint}");
    }
    ctx.degrade(stage, effect, hints);
}
