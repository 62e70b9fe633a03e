//! Loading source documents from the data directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::rag::core::errors::{RetrievalError, RetrievalResult};

/// Raw text of one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDocument {
    /// File name, used as document id and citation.
    pub id: String,
    /// Extracted text.
    pub text: String,
}

/// File formats the loader understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    /// PDF, text extracted with `pdf-extract`.
    Pdf,
    /// Plain text or markdown, read as UTF-8.
    Text,
}

impl DocumentFormat {
    /// Detect the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Outcome of scanning a directory.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    /// Documents with extractable text, sorted by id.
    pub documents: Vec<SourceDocument>,
    /// Supported files that yielded no text or failed to parse.
    pub skipped: Vec<PathBuf>,
}

/// Load one file.
///
/// # Errors
/// Returns an error if the file cannot be read, has an unsupported
/// extension, or contains no extractable text.
pub fn load_document(path: &Path) -> RetrievalResult<SourceDocument> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        RetrievalError::InvalidInput(format!("unsupported file type: {}", path.display()))
    })?;
    let id = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| RetrievalError::InvalidInput(format!("bad file name: {}", path.display())))?
        .to_string();

    let raw = match format {
        DocumentFormat::Pdf => {
            let bytes = std::fs::read(path)?;
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|err| RetrievalError::Pdf(format!("{id}: {err}")))?
        }
        DocumentFormat::Text => std::fs::read_to_string(path)?,
    };

    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(RetrievalError::InvalidInput(format!("{id}: no extractable text")));
    }
    debug!("Loaded {id}: {} chars", text.len());
    Ok(SourceDocument { id, text })
}

/// Load every supported file directly under `dir`.
///
/// Unreadable documents are skipped and reported, not fatal.
///
/// # Errors
/// Returns an error if the directory cannot be listed.
pub fn load_directory(dir: &Path) -> RetrievalResult<LoadedDocuments> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && DocumentFormat::from_path(path).is_some())
        .collect();
    paths.sort();

    let mut loaded = LoadedDocuments::default();
    for path in paths {
        match load_document(&path) {
            Ok(doc) => loaded.documents.push(doc),
            Err(err) => {
                warn!("Skipping {}: {err}", path.display());
                loaded.skipped.push(path);
            }
        }
    }
    info!(
        "Loaded {} documents from {} ({} skipped)",
        loaded.documents.len(),
        dir.display(),
        loaded.skipped.len()
    );
    Ok(loaded)
}

/// Trim lines and collapse runs of blank lines into one paragraph break.
fn clean_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_by_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/INTC.PDF")), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_path(Path::new("notes.md")), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_path(Path::new("data.csv")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn cleans_blank_runs() {
        assert_eq!(clean_text("\n  Title \n\n\n\nBody line\n  \n"), "Title\n\nBody line");
    }

    #[test]
    fn loads_text_files_sorted_and_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "Second file.").unwrap();
        std::fs::write(dir.path().join("a.md"), "First file.").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
        std::fs::write(dir.path().join("ignored.csv"), "x,y").unwrap();

        let loaded = load_directory(dir.path()).unwrap();
        let ids: Vec<&str> = loaded.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.txt"]);
        assert_eq!(loaded.skipped.len(), 1);
    }
}
