//! Corpus loading.
//!
//! Walks a document directory and reads every text-like file. Individual
//! files that cannot be read are skipped; a single bad file never aborts
//! the load.

use crate::types::Document;
use cotrag_core::{AppError, AppResult};
use std::path::Path;
use walkdir::WalkDir;

/// File extensions eligible for indexing (compared case-insensitively).
pub const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Check whether a path has a text-like extension.
pub fn is_text_like(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            TEXT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Reject a document path that exists but is not a directory.
///
/// A missing directory is fine and loads as an empty corpus.
pub fn check_docs_dir(dir: &Path) -> AppResult<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Document path {:?} is not a directory",
            dir
        )));
    }
    Ok(())
}

/// Load every text-like document under `dir`, in sorted path order.
///
/// Bytes are decoded lossily as UTF-8. A missing directory yields an empty
/// corpus.
pub fn load_corpus(dir: &Path) -> Vec<Document> {
    if !dir.exists() {
        tracing::warn!("Document directory {:?} does not exist; corpus is empty", dir);
        return Vec::new();
    }

    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_text_like(path) {
            continue;
        }

        match std::fs::read(path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                documents.push(Document::new(path.display().to_string(), text));
            }
            Err(err) => {
                skipped += 1;
                tracing::debug!("Skipping {:?}: {}", path, err);
            }
        }
    }

    tracing::info!(
        "Loaded {} documents from {:?} ({} skipped)",
        documents.len(),
        dir,
        skipped
    );

    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_text_like() {
        assert!(is_text_like(Path::new("a.md")));
        assert!(is_text_like(Path::new("b.TXT")));
        assert!(is_text_like(Path::new("c.markdown")));
        assert!(!is_text_like(Path::new("d.rs")));
        assert!(!is_text_like(Path::new("README")));
    }

    #[test]
    fn test_load_corpus_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.md"), "bee").unwrap();
        fs::write(dir.path().join("a.txt"), "ay").unwrap();
        fs::write(dir.path().join("sub/c.markdown"), "see").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 159, 146, 150]).unwrap();

        let docs = load_corpus(dir.path());
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["ay", "bee", "see"]);
        assert!(docs[0].id.ends_with("a.txt"));
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.txt"), [b'o', b'k', 0xff, b'!']).unwrap();

        let docs = load_corpus(dir.path());
        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.starts_with("ok"));
        assert!(docs[0].text.ends_with('!'));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.md"), "readable").unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("bad.md"))
            .unwrap();

        let docs = load_corpus(dir.path());
        assert_eq!(docs.len(), 1);
        assert!(docs[0].id.ends_with("good.md"));
        assert_eq!(docs[0].text, "readable");
    }

    #[test]
    fn test_docs_path_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "text").unwrap();

        assert!(matches!(check_docs_dir(&file), Err(AppError::Knowledge(_))));
        assert!(check_docs_dir(dir.path()).is_ok());
        assert!(check_docs_dir(&dir.path().join("missing")).is_ok());
    }

    #[test]
    fn test_missing_directory_is_empty_corpus() {
        let dir = TempDir::new().unwrap();
        assert!(load_corpus(&dir.path().join("nope")).is_empty());
    }
}
