use crate::error::BuildError;
use folio_types::{CompiledArtifact, PageMap, Unit};
use log::debug;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a build is in its lifecycle. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BuildStage {
    Init,
    HierarchyLoaded,
    Pass1Compiled,
    PageMapFinalized,
    Pass2Compiled,
    Merged,
    MetadataApplied,
    LinksApplied,
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Init => "INIT",
            BuildStage::HierarchyLoaded => "HIERARCHY_LOADED",
            BuildStage::Pass1Compiled => "PASS1_COMPILED",
            BuildStage::PageMapFinalized => "PAGE_MAP_FINALIZED",
            BuildStage::Pass2Compiled => "PASS2_COMPILED",
            BuildStage::Merged => "MERGED",
            BuildStage::MetadataApplied => "METADATA_APPLIED",
            BuildStage::LinksApplied => "LINKS_APPLIED",
            BuildStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// An optional enhancement that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    /// The stage that was reached without the enhancement.
    pub stage: BuildStage,
    pub reason: String,
    /// Install hints for tools that would have made it work.
    pub hints: Vec<&'static str>,
}

/// Mutable state of one build, passed explicitly through every stage.
#[derive(Debug)]
pub struct BuildContext {
    scratch_dir: PathBuf,
    stage: BuildStage,
    artifacts: Vec<CompiledArtifact>,
    page_map: Option<PageMap>,
    degraded: Vec<Degradation>,
}

impl BuildContext {
    /// Starts a build in an emptied scratch directory.
    pub fn create(scratch_dir: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let scratch_dir = scratch_dir.into();
        if scratch_dir.exists() {
            debug!("Clearing scratch directory '{}'", scratch_dir.display());
            fs::remove_dir_all(&scratch_dir)?;
        }
        fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            scratch_dir,
            stage: BuildStage::Init,
            artifacts: Vec::new(),
            page_map: None,
            degraded: Vec::new(),
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Moves to `next`, which must lie ahead of the current stage.
    pub fn advance(&mut self, next: BuildStage) {
        debug_assert!(next > self.stage, "stage {} cannot follow {}", next, self.stage);
        debug!("Stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Where the artifact of `unit` lives.
    pub fn artifact_path(&self, unit: &Unit) -> PathBuf {
        self.scratch_dir.join(unit.artifact_file_name())
    }

    /// Records a compiled artifact, replacing an earlier one of the same unit.
    pub fn record_artifact(&mut self, artifact: CompiledArtifact) {
        match self.artifacts.iter_mut().find(|a| a.unit == artifact.unit) {
            Some(existing) => *existing = artifact,
            None => self.artifacts.push(artifact),
        }
    }

    /// Artifacts in emission order.
    pub fn artifacts(&self) -> &[CompiledArtifact] {
        &self.artifacts
    }

    /// Freezes the page map. It can be set exactly once.
    pub fn set_page_map(&mut self, page_map: PageMap) -> Result<(), BuildError> {
        if self.page_map.is_some() {
            return Err(BuildError::Config("page map was already finalized".into()));
        }
        self.page_map = Some(page_map);
        Ok(())
    }

    pub fn page_map(&self) -> Option<&PageMap> {
        self.page_map.as_ref()
    }

    pub fn degrade(&mut self, stage: BuildStage, reason: impl Into<String>, hints: Vec<&'static str>) {
        self.degraded.push(Degradation { stage, reason: reason.into(), hints });
    }

    pub fn degraded(&self) -> &[Degradation] {
        &self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{PageMapBuilder, UnitId};

    #[test]
    fn create_wipes_previous_scratch_contents() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("build");
        fs::create_dir_all(&scratch).unwrap();
        fs::write(scratch.join("stale.pdf"), b"old").unwrap();

        let ctx = BuildContext::create(&scratch).unwrap();

        assert_eq!(ctx.stage(), BuildStage::Init);
        assert!(scratch.is_dir());
        assert!(!scratch.join("stale.pdf").exists());
    }

    #[test]
    fn page_map_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = BuildContext::create(dir.path().join("b")).unwrap();
        let mut builder = PageMapBuilder::new();
        builder.record(UnitId::cover(), 1).unwrap();
        let map = builder.finalize();

        ctx.set_page_map(map.clone()).unwrap();
        assert!(ctx.set_page_map(map).is_err());
    }

    #[test]
    fn stages_are_ordered_and_display_in_upper_snake_case() {
        assert!(BuildStage::Pass2Compiled < BuildStage::Merged);
        assert_eq!(BuildStage::PageMapFinalized.to_string(), "PAGE_MAP_FINALIZED");
    }
}
