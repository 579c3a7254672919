//! Run configuration, built by the binary and validated before any parsing.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ObsidianError;
use crate::render::OutputLayout;

/// Where headers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A single header.
    File(PathBuf),
    /// Every `.h`/`.hpp` below a directory.
    Directory(PathBuf),
}

impl InputSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Directory(path) => path,
        }
    }
}

/// What to do when a translation unit fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort on the first failure; nothing is written.
    #[default]
    FailFast,
    /// Process every file, write output for the successful ones, then fail.
    KeepGoing,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub input: InputSource,
    pub output_dir: PathBuf,
    /// Compiler flags forwarded to the frontend.
    pub compile_options: Vec<String>,
    /// Print the extraction context as JSON to stdout.
    pub dump_metadata: bool,
    pub layout: OutputLayout,
    pub failure_policy: FailurePolicy,
}

impl GeneratorConfig {
    pub fn new(input: InputSource, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output_dir: output_dir.into(),
            compile_options: Vec::new(),
            dump_metadata: false,
            layout: OutputLayout::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Checks the input and creates the output directory if needed.
    ///
    /// ## Errors
    /// - [`ObsidianError::InputNotFound`] when the input does not exist
    /// - [`ObsidianError::InputNotAFile`] / [`ObsidianError::InputNotADirectory`]
    ///   when it has the wrong kind
    /// - [`ObsidianError::OutputDirectory`] when the output cannot be created
    pub fn validate(&self) -> Result<(), ObsidianError> {
        let path = self.input.path();
        if !path.exists() {
            return Err(ObsidianError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        match &self.input {
            InputSource::File(path) if !path.is_file() => {
                return Err(ObsidianError::InputNotAFile { path: path.clone() });
            }
            InputSource::Directory(path) if !path.is_dir() => {
                return Err(ObsidianError::InputNotADirectory { path: path.clone() });
            }
            _ => {}
        }

        if !self.output_dir.is_dir() {
            debug!(path = %self.output_dir.display(), "creating output directory");
            std::fs::create_dir_all(&self.output_dir).map_err(|source| {
                ObsidianError::OutputDirectory {
                    path: self.output_dir.clone(),
                    source,
                }
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = GeneratorConfig::new(
            InputSource::File(dir.path().join("missing.hpp")),
            dir.path().join("out"),
        );

        assert!(matches!(
            config.validate(),
            Err(ObsidianError::InputNotFound { .. })
        ));
    }

    #[test]
    fn input_kind_must_match() {
        let dir = TempDir::new().unwrap();
        let header = dir.path().join("types.hpp");
        fs::write(&header, "").unwrap();

        let as_dir = GeneratorConfig::new(InputSource::Directory(header.clone()), dir.path());
        assert!(matches!(
            as_dir.validate(),
            Err(ObsidianError::InputNotADirectory { .. })
        ));

        let as_file =
            GeneratorConfig::new(InputSource::File(dir.path().to_path_buf()), dir.path());
        assert!(matches!(
            as_file.validate(),
            Err(ObsidianError::InputNotAFile { .. })
        ));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("generated/reflection");
        let config = GeneratorConfig::new(InputSource::Directory(dir.path().to_path_buf()), &output);

        config.validate().unwrap();
        assert!(output.is_dir());
    }

    #[test]
    fn output_under_a_file_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let config = GeneratorConfig::new(
            InputSource::Directory(dir.path().to_path_buf()),
            blocker.join("out"),
        );

        assert!(matches!(
            config.validate(),
            Err(ObsidianError::OutputDirectory { .. })
        ));
    }
}
