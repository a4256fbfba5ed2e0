//! Hands a rendered attestation to the user by writing it to disk

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use attestation_core::RenderedDocument;

/// Write `document` as `<dir>/<file_name>`, creating `dir` if needed.
/// Returns the written path.
pub fn deliver(dir: &Path, document: &RenderedDocument) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(&document.file_name);
    fs::write(&path, &document.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = document.bytes.len(), "attestation saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestation_core::PDF_MEDIA_TYPE;

    #[test]
    fn test_deliver_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let document = RenderedDocument {
            bytes: b"%PDF-1.7".to_vec(),
            media_type: PDF_MEDIA_TYPE,
            file_name: "attestation-2020-11-02_07-45.pdf".into(),
            warnings: Vec::new(),
        };

        let path = deliver(&dir, &document).unwrap();
        assert_eq!(path, dir.join("attestation-2020-11-02_07-45.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.7");
    }
}
