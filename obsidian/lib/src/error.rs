use std::path::PathBuf;

use thiserror::Error;

use crate::shared::Diagnostic;

/// Errors emitted by obsidian operations.
#[derive(Debug, Error)]
pub enum ObsidianError {
    #[error("Failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input `{path}` does not exist")]
    InputNotFound { path: PathBuf },

    #[error("Input `{path}` is not a file")]
    InputNotAFile { path: PathBuf },

    #[error("Input `{path}` is not a directory")]
    InputNotADirectory { path: PathBuf },

    #[error("Output directory `{path}` could not be created: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No C++ headers found in `{path}`")]
    NoHeaders { path: PathBuf },

    #[error("Failed to load the C++ grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Failed to parse `{path}`")]
    ParseFailed { path: PathBuf },

    #[error("Translation of `{path}` failed: {}", summarize(diagnostics))]
    TranslationFailed {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("{} of {total} translation unit(s) failed: {}", failures.len(), list_paths(failures))]
    TranslationFailures { failures: Vec<PathBuf>, total: usize },

    #[error("Cannot evaluate the value of `{name}` ({path}:{line}): {reason}")]
    ConstantExpression {
        path: PathBuf,
        line: usize,
        name: String,
        reason: String,
    },

    #[error("Template placeholder `__{0}__` has no binding")]
    UnboundPlaceholder(String),

    #[error("Failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Ignore error: {0}")]
    Ignore(#[from] ignore::Error),
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics.first() {
        Some(first) if diagnostics.len() > 1 => {
            format!("{first} (and {} more)", diagnostics.len() - 1)
        }
        Some(first) => first.to_string(),
        None => "no usable syntax tree".to_string(),
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
