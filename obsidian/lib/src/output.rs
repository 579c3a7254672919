//! Atomic writes of generated documents.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::ObsidianError;
use crate::render::Document;

/// Writes `contents` to `path` through a temp file in the same directory.
///
/// The target is either left untouched or fully replaced.
///
/// ## Errors
/// Returns [`ObsidianError::Write`] if the directory, temp file or rename fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), ObsidianError> {
    let write_error = |source: std::io::Error| ObsidianError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(contents.as_bytes()).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.persist(path).map_err(|err| write_error(err.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Writes every document under `output_dir` and returns the written paths.
///
/// ## Errors
/// Stops at the first document that cannot be written.
pub fn write_documents(
    output_dir: &Path,
    documents: &[Document],
) -> Result<Vec<PathBuf>, ObsidianError> {
    let mut written = Vec::with_capacity(documents.len());
    for document in documents {
        let path = output_dir.join(&document.path);
        write_atomic(&path, &document.contents)?;
        written.push(path);
    }

    info!(
        output_dir = %output_dir.display(),
        files = written.len(),
        "generated reflection code"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reflection.hpp");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temp file should be renamed away");
    }

    #[test]
    fn write_documents_creates_nested_paths() {
        let dir = TempDir::new().unwrap();
        let documents = vec![
            Document {
                path: PathBuf::from("obs.h"),
                contents: "#pragma once\n".to_string(),
            },
            Document {
                path: PathBuf::from("nested/refl-A.hpp"),
                contents: "// A\n".to_string(),
            },
        ];

        let written = write_documents(dir.path(), &documents).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("nested/refl-A.hpp")).unwrap(),
            "// A\n"
        );
    }

    #[test]
    fn write_into_a_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let result = write_atomic(&blocker.join("reflection.hpp"), "x");
        assert!(matches!(result, Err(ObsidianError::Write { .. })));
    }
}
