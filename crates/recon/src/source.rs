//! Reading report folders into [`Document`]s.

use std::path::Path;

use tracing::debug;

use crate::error::ReconError;
use crate::model::Document;

const UTF8_BOM: char = '\u{feff}';

/// Load every `*.{extension}` file directly inside `dir`, sorted by file name
/// so that row order is reproducible across runs and platforms.
///
/// A missing folder is fatal; an unreadable file is an IO error. Text is
/// decoded as UTF-8 with invalid bytes replaced.
pub fn load_documents(role: &str, dir: &Path, extension: &str) -> Result<Vec<Document>, ReconError> {
    if !dir.is_dir() {
        return Err(ReconError::MissingSource { role: role.to_string(), path: dir.to_path_buf() });
    }

    let wanted = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", dir.display())))?
            .path();
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&wanted));
        if path.is_file() && matches_ext {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(&path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        let text = String::from_utf8_lossy(&bytes);
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        documents.push(Document::new(source, text.trim_start_matches(UTF8_BOM)));
    }

    debug!(role, dir = %dir.display(), files = documents.len(), "loaded folder");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "second").unwrap();
        std::fs::write(dir.path().join("a.TXT"), "\u{feff}first").unwrap();
        std::fs::write(dir.path().join("notes.csv"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let docs = load_documents("z-read", dir.path(), "txt").unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(names, vec!["a.TXT", "b.txt"]);
        assert_eq!(docs[0].text, "first");
    }

    #[test]
    fn missing_folder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_documents("e-journal", &dir.path().join("nope"), "txt").unwrap_err();
        assert!(matches!(err, ReconError::MissingSource { .. }));
        assert!(err.to_string().starts_with("e-journal folder not found"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), b"NET SALES \xff 1.00").unwrap();
        let docs = load_documents("z-read", dir.path(), ".txt").unwrap();
        assert!(docs[0].text.contains('\u{fffd}'));
    }
}
