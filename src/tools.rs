//! Discovery and invocation of external command-line tools.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// A command-line tool the build can use when it is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalTool {
    pub name: &'static str,
    pub hint: &'static str,
}

pub const TYPST: ExternalTool = ExternalTool {
    name: "typst",
    hint: "Install typst from https://github.com/typst/typst or set FOLIO_TYPST to its path.",
};

pub const PDFINFO: ExternalTool = ExternalTool {
    name: "pdfinfo",
    hint: "Install poppler (macOS: brew install poppler, Linux: apt-get install poppler-utils).",
};

pub const PDFUNITE: ExternalTool = ExternalTool {
    name: "pdfunite",
    hint: "Install poppler (macOS: brew install poppler, Linux: apt-get install poppler-utils).",
};

pub const GHOSTSCRIPT: ExternalTool = ExternalTool {
    name: "gs",
    hint: "Install ghostscript (macOS: brew install ghostscript, Linux: apt-get install ghostscript).",
};

pub const PDFTK: ExternalTool = ExternalTool {
    name: "pdftk",
    hint: "Install pdftk (macOS: brew install pdftk-java, Linux: apt-get install pdftk).",
};

impl ExternalTool {
    /// Looks the tool up on `PATH`.
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(self.name).ok()
    }
}

/// Resolves a program given either as a bare name (looked up on `PATH`) or as
/// a path. An environment variable, when set, takes precedence over both.
pub fn resolve_program(program: &str, env_override: &str) -> Option<PathBuf> {
    if let Ok(value) = std::env::var(env_override) {
        let candidate = PathBuf::from(&value);
        if candidate.is_file() {
            return Some(candidate);
        }
        if let Ok(found) = which::which(&value) {
            return Some(found);
        }
        log::warn!("{env_override}={value} does not name an executable; ignoring it");
    }

    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    which::which(program).ok()
}

/// Renders a command line for diagnostics.
pub fn describe(program: &Path, args: &[impl AsRef<OsStr>]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Runs `program` to completion, capturing its output. A nonzero exit is
/// reported as `Err` carrying the tool's stderr.
pub fn run_captured(program: &Path, args: &[impl AsRef<OsStr>]) -> Result<Output, String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("failed to start '{}': {e}", program.display()))?;
    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("'{}' exited with {}: {}", describe(program, args), output.status, stderr.trim()))
    }
}
