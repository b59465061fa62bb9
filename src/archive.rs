//! Zipping the scratch directory before it is removed.

use crate::error::BuildError;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes every file under `dir` into a deflated zip at `archive`.
///
/// Entry names keep the directory's own name as their first component
/// (`build/00_cover.pdf`), so unpacking recreates the directory. Entries are
/// sorted. Returns the number of files archived.
pub fn archive_directory(dir: &Path, archive: &Path) -> Result<usize, BuildError> {
    let base = dir.parent().unwrap_or_else(|| Path::new(""));
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    let mut zip = ZipWriter::new(File::create(archive)?);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for path in &files {
        let relative = path.strip_prefix(base).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(name, deflated)?;
        io::copy(&mut File::open(path)?, &mut zip)?;
    }
    zip.finish()?;
    Ok(files.len())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
