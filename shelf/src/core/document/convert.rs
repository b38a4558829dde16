//! Conversion of binary documents into plain text files kept next to them.

use super::{
    parser::{docx::DocxParser, pdf::PdfParser},
    DocumentType,
};
use crate::{core::path_exists, err, error::ShelfError, map_err};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Convert the DOCX at `path` to a `.txt` file in the same directory,
/// one paragraph per line. Returns the path of the written file.
pub async fn convert_docx_to_text(path: &Path) -> Result<PathBuf, ShelfError> {
    let file = map_err!(tokio::fs::read(path).await);
    let text = DocxParser::default().parse(&file)?;
    write_text(path, &text).await
}

/// Extract the text of the PDF at `path` into a `.txt` file in the same directory,
/// one page after the other. Pages without text are omitted.
/// Returns the path of the written file.
pub async fn extract_text_from_pdf(path: &Path) -> Result<PathBuf, ShelfError> {
    let file = map_err!(tokio::fs::read(path).await);
    let text = PdfParser::default().parse(&file)?;
    write_text(path, &text).await
}

/// Walk `book_dir` recursively and convert every DOCX and PDF to text.
/// Other files are left alone. Entries are visited in name order.
///
/// Returns the paths of all written text files.
pub async fn process_documents(book_dir: &Path) -> Result<Vec<PathBuf>, ShelfError> {
    if !path_exists(book_dir).await? {
        return err!(
            NotFound,
            "The directory {} does not exist. Please check the path.",
            book_dir.display()
        );
    }

    let mut written = vec![];
    let mut dirs = vec![book_dir.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let mut files = vec![];
        let mut subdirs = vec![];
        let mut read_dir = map_err!(tokio::fs::read_dir(&dir).await);

        while let Some(entry) = map_err!(read_dir.next_entry().await) {
            let file_type = map_err!(entry.file_type().await);
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        subdirs.sort();

        // Reverse so popping keeps name order for subdirectories
        dirs.extend(subdirs.into_iter().rev());

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match DocumentType::from_path(&path) {
                Ok(DocumentType::Docx) => {
                    info!("Converting {name} to text");
                    written.push(convert_docx_to_text(&path).await?);
                }
                Ok(DocumentType::Pdf) => {
                    info!("Extracting text from {name}");
                    written.push(extract_text_from_pdf(&path).await?);
                }
                _ => debug!("Skipping {name}"),
            }
        }
    }

    Ok(written)
}

async fn write_text(source: &Path, text: &str) -> Result<PathBuf, ShelfError> {
    let out = source.with_extension("txt");
    debug!("Writing {}", out.display());
    map_err!(tokio::fs::write(&out, text).await);
    Ok(out)
}
