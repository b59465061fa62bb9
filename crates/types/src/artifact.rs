use crate::unit::UnitId;
use std::path::PathBuf;

/// A per-unit output file produced by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    /// Position in the emission order.
    pub index: usize,
    pub unit: UnitId,
    pub path: PathBuf,
    /// Known only after compilation.
    pub page_count: u32,
}
