use super::{with_tool, write_staged};
use crate::tools;
use folio_traits::{Attempt, Backend};
use log::debug;
use std::ffi::OsString;
use std::path::PathBuf;

/// Concatenate `inputs`, in order, into `output`.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// poppler's `pdfunite`: plain page concatenation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfUnite;

impl Backend<MergeJob> for PdfUnite {
    fn name(&self) -> &'static str {
        tools::PDFUNITE.name
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some(tools::PDFUNITE.hint)
    }

    fn attempt(&self, job: &MergeJob) -> Attempt {
        with_tool(tools::PDFUNITE, |program| {
            write_staged(&job.output, |staged| {
                let mut args: Vec<OsString> = job.inputs.iter().map(|p| p.clone().into_os_string()).collect();
                args.push(staged.as_os_str().to_os_string());
                tools::run_captured(program, &args).map(|_| ())
            })
        })
    }
}

/// Ghostscript's `pdfwrite` device. Re-distills every page, so it is slower
/// and may alter the files, but is widely installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ghostscript;

impl Backend<MergeJob> for Ghostscript {
    fn name(&self) -> &'static str {
        tools::GHOSTSCRIPT.name
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some(tools::GHOSTSCRIPT.hint)
    }

    fn attempt(&self, job: &MergeJob) -> Attempt {
        with_tool(tools::GHOSTSCRIPT, |program| {
            write_staged(&job.output, |staged| {
                let mut args: Vec<OsString> = ["-dBATCH", "-dNOPAUSE", "-q", "-sDEVICE=pdfwrite"]
                    .into_iter()
                    .map(OsString::from)
                    .collect();
                let mut out_arg = OsString::from("-sOutputFile=");
                out_arg.push(staged);
                args.push(out_arg);
                args.extend(job.inputs.iter().map(|p| p.clone().into_os_string()));
                tools::run_captured(program, &args).map(|_| ())
            })
        })
    }
}

/// In-process merge with lopdf. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMerge;

impl Backend<MergeJob> for NativeMerge {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn attempt(&self, job: &MergeJob) -> Attempt {
        match write_staged(&job.output, |staged| {
            folio_pdf_composer::merge_files(&job.inputs, staged).map_err(|e| e.to_string())
        }) {
            Ok(pages) => {
                debug!("[MERGE] lopdf wrote {} pages to '{}'", pages, job.output.display());
                Attempt::Success(())
            }
            Err(reason) => Attempt::Failed(reason),
        }
    }
}
