//! Writing the exported artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::Document;

/// File name of the exported artifact.
pub const EXPORT_FILE_NAME: &str = "document.html";
/// MIME type of the exported artifact.
pub const EXPORT_MIME_TYPE: &str = "text/html";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize the document and write it as `document.html` under the
/// given directory, creating the directory if needed. Returns the path
/// of the written file.
pub fn export_document(doc: &Document, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, doc.to_html())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::paragraph_doc;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_serialized_document() {
        let dir = TempDir::new().unwrap();
        let doc = paragraph_doc("Hello world");

        let path = export_document(&doc, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, doc.to_html());
    }

    #[test]
    fn test_export_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out").join("deep");

        let path = export_document(&paragraph_doc("x"), &nested).unwrap();

        assert!(path.exists());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_export_overwrites_existing_artifact() {
        let dir = TempDir::new().unwrap();
        export_document(&paragraph_doc("old"), dir.path()).unwrap();

        let path = export_document(&paragraph_doc("new"), dir.path()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "<p>new</p>");
    }
}
