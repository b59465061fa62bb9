//! Two-pass page number resolution.
//!
//! Units are compiled once with no page information (discovery) to learn
//! how long each one is. The resulting page map is frozen, and every unit
//! that shows page numbers is compiled again with its starting page; the
//! outline additionally gets the whole map so it can print a complete table
//! of contents.

use super::context::{BuildContext, BuildStage};
use crate::compiler::UnitCompiler;
use crate::error::BuildError;
use folio_types::{CompiledArtifact, PageMap, PageMapBuilder, PageMapError, Unit};
use log::{info, warn};
use std::fs;

/// File the frozen page map is written to inside the scratch directory.
pub const PAGE_MAP_FILE: &str = "page_map.json";

/// Drives discovery and resolution over the emission order.
#[derive(Debug)]
pub struct PageMapResolver<'a> {
    compiler: UnitCompiler<'a>,
    verify_pagination: bool,
}

impl<'a> PageMapResolver<'a> {
    pub fn new(compiler: UnitCompiler<'a>, verify_pagination: bool) -> Self {
        Self { compiler, verify_pagination }
    }

    /// Discovery pass: compiles every unit in order, records its page count,
    /// then freezes the map into the context and writes it to the scratch
    /// directory.
    pub fn plan(&self, units: &[Unit], ctx: &mut BuildContext) -> Result<PageMap, BuildError> {
        info!("[PASS 1] Compiling {} units and tracking page counts", units.len());
        let mut builder = PageMapBuilder::new();

        for (index, unit) in units.iter().enumerate() {
            let output = ctx.artifact_path(unit);
            let page_count = self.compiler.compile(&unit.id, &output, None, None)?;
            let start = builder.record(unit.id.clone(), page_count).map_err(|e| match e {
                PageMapError::EmptyUnit(_) => BuildError::PageCountParse {
                    path: output.clone(),
                    detail: "artifact has no pages".into(),
                },
                other => BuildError::HierarchyExtraction(other.to_string()),
            })?;
            info!("[PASS 1]   {}: {} pages (starting at {})", unit.title, page_count, start);
            ctx.record_artifact(CompiledArtifact { index, unit: unit.id.clone(), path: output, page_count });
        }
        ctx.advance(BuildStage::Pass1Compiled);

        let page_map = builder.finalize();
        let map_path = ctx.scratch_dir().join(PAGE_MAP_FILE);
        fs::write(&map_path, page_map.to_json_pretty()?)?;
        info!("[PASS 1] Page map written to '{}'", map_path.display());
        info!("[PASS 1] Total pages: {}", page_map.total_pages());

        ctx.set_page_map(page_map.clone())?;
        ctx.advance(BuildStage::PageMapFinalized);
        Ok(page_map)
    }

    /// Resolution pass: recompiles every unit that displays page numbers with
    /// its resolved offset. Cover and preface keep their discovery artifact.
    ///
    /// Each recompiled artifact is measured again. A changed page count means
    /// the unit reflowed when numbers were injected; that is fatal unless
    /// verification is disabled.
    pub fn render(&self, units: &[Unit], page_map: &PageMap, ctx: &mut BuildContext) -> Result<(), BuildError> {
        info!("[PASS 2] Regenerating outline and chapters with page numbers");

        for (index, unit) in units.iter().enumerate().filter(|(_, u)| u.displays_page_numbers()) {
            let unit_id = unit.id.as_str();
            let (Some(offset), Some(discovered)) = (page_map.start(unit_id), page_map.page_count(unit_id)) else {
                return Err(BuildError::Config(format!("unit '{}' is missing from the page map", unit.id)));
            };
            let output = ctx.artifact_path(unit);
            let map = unit.receives_page_map().then_some(page_map);
            let rendered = self.compiler.compile(&unit.id, &output, Some(offset), map)?;

            if rendered != discovered {
                if self.verify_pagination {
                    return Err(BuildError::PaginationDrift { unit: unit.id.clone(), discovered, rendered });
                }
                warn!(
                    "[PASS 2] '{}' now has {} pages instead of {}; later page numbers are wrong",
                    unit.id, rendered, discovered
                );
            }

            if map.is_some() {
                info!("[PASS 2]   Regenerated {} with {} page map entries", unit.title, page_map.len());
            } else {
                info!("[PASS 2]   Recompiled {} (page {})", unit.title, offset);
            }
            ctx.record_artifact(CompiledArtifact { index, unit: unit.id.clone(), path: output, page_count: rendered });
        }

        ctx.advance(BuildStage::Pass2Compiled);
        Ok(())
    }
}
