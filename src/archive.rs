//! ZIP packaging of the wage slips kept in the output directory.

use log::info;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no PDF documents found in {0}")]
    NoDocuments(PathBuf),
    #[error("archive I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// `*.pdf` files directly inside `dir`, sorted by name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Write every document in `dir` into a deflated archive at `zip_path`.
/// Returns the number of documents packaged.
pub fn package_documents(dir: &Path, zip_path: &Path) -> Result<usize, ArchiveError> {
    let documents = list_documents(dir)?;
    if documents.is_empty() {
        return Err(ArchiveError::NoDocuments(dir.to_path_buf()));
    }

    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options: FileOptions<()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in &documents {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, "Invalid UTF-8 name")
            })?;
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(path)?)?;
    }
    zip.finish()?;

    info!(
        "Packaged {} payslips into {}",
        documents.len(),
        zip_path.display()
    );
    Ok(documents.len())
}
