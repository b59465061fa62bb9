use super::{with_tool, write_staged};
use crate::tools;
use folio_pdf_composer::{InfoUpdate, set_document_info, set_outline};
use folio_traits::{Attempt, Backend};
use folio_types::{BookmarkEntry, BookmarkLevel, DocumentInfo, render_bookmark_records};
use lopdf::Document;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const PRODUCER: &str = "folio";

/// Bookmark description left in the scratch directory for inspection.
pub const BOOKMARKS_FILE: &str = "bookmarks.txt";

/// Writes the `BookmarkBegin` records for `bookmarks` into `dir`.
pub fn write_bookmark_description(dir: &Path, bookmarks: &[BookmarkEntry]) -> std::io::Result<PathBuf> {
    let path = dir.join(BOOKMARKS_FILE);
    fs::write(&path, render_bookmark_records(bookmarks))?;
    Ok(path)
}

/// Apply title, author and bookmarks to `pdf` in place.
#[derive(Debug, Clone)]
pub struct MetadataJob {
    pub pdf: PathBuf,
    pub info: DocumentInfo,
    pub bookmarks: Vec<BookmarkEntry>,
    /// Where auxiliary description files are written.
    pub work_dir: PathBuf,
}

/// `pdftk update_info_utf8`, run twice: document info first, then bookmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdftkMetadata;

impl PdftkMetadata {
    fn info_records(info: &DocumentInfo) -> String {
        let mut out = String::new();
        for (key, value) in [("Title", info.title.as_str()), ("Author", info.author.as_str()), ("Producer", PRODUCER)] {
            if !value.is_empty() {
                let _ = write!(out, "InfoBegin\nInfoKey: {key}\nInfoValue: {}\n", value.replace(['\r', '\n'], " "));
            }
        }
        out
    }

    fn update(program: &Path, input: &Path, data: &Path, output: &Path) -> Result<(), String> {
        let args: [OsString; 5] =
            [input.into(), "update_info_utf8".into(), data.into(), "output".into(), output.into()];
        tools::run_captured(program, &args).map(|_| ())
    }
}

impl Backend<MetadataJob> for PdftkMetadata {
    fn name(&self) -> &'static str {
        tools::PDFTK.name
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some(tools::PDFTK.hint)
    }

    fn attempt(&self, job: &MetadataJob) -> Attempt {
        with_tool(tools::PDFTK, |program| {
            let info_file = job.work_dir.join("metadata_info.txt");
            fs::write(&info_file, Self::info_records(&job.info)).map_err(|e| e.to_string())?;
            let bookmark_file =
                write_bookmark_description(&job.work_dir, &job.bookmarks).map_err(|e| e.to_string())?;

            let with_info = job.work_dir.join("with_info.pdf");
            Self::update(program, &job.pdf, &info_file, &with_info)?;
            let result = write_staged(&job.pdf, |staged| Self::update(program, &with_info, &bookmark_file, staged));
            let _ = fs::remove_file(&with_info);
            result
        })
    }
}

/// Ghostscript re-distilling the file together with a pdfmark program.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhostscriptPdfmark;

impl Backend<MetadataJob> for GhostscriptPdfmark {
    fn name(&self) -> &'static str {
        "gs-pdfmark"
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some(tools::GHOSTSCRIPT.hint)
    }

    fn attempt(&self, job: &MetadataJob) -> Attempt {
        with_tool(tools::GHOSTSCRIPT, |program| {
            let marks = job.work_dir.join("pdfmarks.ps");
            fs::write(&marks, render_pdfmarks(&job.info, &job.bookmarks)).map_err(|e| e.to_string())?;

            write_staged(&job.pdf, |staged| {
                let mut out_arg = OsString::from("-sOutputFile=");
                out_arg.push(staged);
                let args: Vec<OsString> = vec![
                    "-dBATCH".into(),
                    "-dNOPAUSE".into(),
                    "-q".into(),
                    "-sDEVICE=pdfwrite".into(),
                    out_arg,
                    job.pdf.clone().into(),
                    marks.into(),
                ];
                tools::run_captured(program, &args).map(|_| ())
            })
        })
    }
}

/// Renders document info and bookmarks as pdfmark operators.
///
/// A top-level entry followed by nested entries carries a negative `/Count`
/// so viewers show the chapter collapsed.
pub fn render_pdfmarks(info: &DocumentInfo, bookmarks: &[BookmarkEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[ /Title {} /Author {} /Producer {} /DOCINFO pdfmark",
        ps_string(&info.title),
        ps_string(&info.author),
        ps_string(PRODUCER)
    );

    for (i, entry) in bookmarks.iter().enumerate() {
        let children = match entry.level {
            BookmarkLevel::Top => bookmarks[i + 1..]
                .iter()
                .take_while(|b| b.level == BookmarkLevel::Nested)
                .count(),
            BookmarkLevel::Nested => 0,
        };
        let _ = write!(out, "[ ");
        if children > 0 {
            let _ = write!(out, "/Count -{children} ");
        }
        let _ = writeln!(
            out,
            "/Title {} /Page {} /View [/XYZ null null null] /OUT pdfmark",
            ps_string(&entry.title),
            entry.page
        );
    }
    out
}

/// A PostScript string: literal for printable ASCII, UTF-16BE hex otherwise.
fn ps_string(s: &str) -> String {
    if s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('(');
        for c in s.chars() {
            if matches!(c, '(' | ')' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push(')');
        return out;
    }
    let mut out = String::from("<FEFF");
    for unit in s.encode_utf16() {
        let _ = write!(out, "{unit:04X}");
    }
    out.push('>');
    out
}

/// In-process writer: `/Info` dictionary and `/Outlines` tree via lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMetadata;

impl NativeMetadata {
    fn apply(job: &MetadataJob) -> Result<(), String> {
        let mut doc = Document::load(&job.pdf).map_err(|e| e.to_string())?;
        let update = InfoUpdate {
            title: job.info.title.clone(),
            author: job.info.author.clone(),
            producer: PRODUCER.to_string(),
            modified: Some(chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
        };
        set_document_info(&mut doc, &update).map_err(|e| e.to_string())?;
        set_outline(&mut doc, &job.bookmarks).map_err(|e| e.to_string())?;

        write_staged(&job.pdf, |staged| doc.save(staged).map(|_| ()).map_err(|e| e.to_string()))
    }
}

impl Backend<MetadataJob> for NativeMetadata {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn attempt(&self, job: &MetadataJob) -> Attempt {
        match Self::apply(job) {
            Ok(()) => Attempt::Success(()),
            Err(reason) => Attempt::Failed(reason),
        }
    }
}
