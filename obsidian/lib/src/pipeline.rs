//! The generator run: discover, parse, extract, render, write.

use std::io::Write;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{error, info, instrument, warn};

use crate::config::{FailurePolicy, GeneratorConfig, InputSource};
use crate::error::ObsidianError;
use crate::extract::extract;
use crate::frontend::{ParseOptions, TranslationUnit};
use crate::output::write_documents;
use crate::render::{RenderOptions, render};
use crate::shared::ExtractionContext;

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub enums: usize,
    pub classes: usize,
    pub written: Vec<PathBuf>,
}

/// Runs the generator end to end.
///
/// ## Errors
/// - validation and discovery errors from [`GeneratorConfig::validate`] and
///   [`discover_headers`]
/// - the first translation failure under [`FailurePolicy::FailFast`]
/// - [`ObsidianError::TranslationFailures`] under [`FailurePolicy::KeepGoing`],
///   after output for the successful files has been written
#[instrument(skip_all, fields(input = %config.input.path().display()))]
pub fn run(config: &GeneratorConfig) -> Result<RunSummary, ObsidianError> {
    config.validate()?;

    let (headers, include_root) = match &config.input {
        InputSource::File(path) => (vec![path.clone()], None),
        InputSource::Directory(root) => {
            (discover_headers(root, &config.output_dir)?, Some(root.clone()))
        }
    };

    let options = ParseOptions {
        compile_options: config.compile_options.clone(),
    };
    let mut context = ExtractionContext::new(config.compile_options.clone());
    let mut failures = Vec::new();

    for header in &headers {
        match process_header(header, &options, &mut context) {
            Ok(()) => context.processed_input_files.push(header.clone()),
            Err(err) if config.failure_policy == FailurePolicy::KeepGoing => {
                error!(path = %header.display(), "{err}");
                failures.push(header.clone());
            }
            Err(err) => return Err(err),
        }
    }

    if config.dump_metadata {
        dump_metadata(&context, std::io::stdout().lock())?;
    }

    let documents = render(
        &context,
        &RenderOptions {
            layout: config.layout,
            include_root,
        },
    )?;
    let written = write_documents(&config.output_dir, &documents)?;

    if !failures.is_empty() {
        return Err(ObsidianError::TranslationFailures {
            failures,
            total: headers.len(),
        });
    }

    if context.is_empty() {
        warn!("no annotated enums or classes were found");
    }

    Ok(RunSummary {
        files_processed: context.processed_input_files.len(),
        enums: context.enums.len(),
        classes: context.classes.len(),
        written,
    })
}

fn process_header(
    header: &Path,
    options: &ParseOptions,
    context: &mut ExtractionContext,
) -> Result<(), ObsidianError> {
    let unit = TranslationUnit::parse(header, options)?;

    let diagnostics = unit.diagnostics();
    if diagnostics.iter().any(|diagnostic| diagnostic.severity.is_fatal()) {
        return Err(ObsidianError::TranslationFailed {
            path: header.to_path_buf(),
            diagnostics,
        });
    }

    extract(&unit, context)?;
    info!(path = %header.display(), "processed header");
    Ok(())
}

/// Finds every `.h`/`.hpp` below `root`, sorted by path.
///
/// Ignore files are respected and `output_dir` is skipped when it lies inside
/// `root`.
///
/// ## Errors
/// Returns [`ObsidianError::NoHeaders`] when nothing matches.
pub fn discover_headers(root: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, ObsidianError> {
    let skip = output_dir.canonicalize().ok();

    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .hidden(false)
        .filter_entry(move |entry| match (&skip, entry.path().canonicalize()) {
            (Some(skip), Ok(path)) => &path != skip,
            _ => true,
        })
        .build();

    let mut headers = Vec::new();
    for entry in walker {
        let entry = entry?;

        let is_file = entry
            .file_type()
            .map(|file| file.is_file())
            .unwrap_or(false);
        if is_file && is_header(entry.path()) {
            headers.push(entry.into_path());
        }
    }

    headers.sort();

    if headers.is_empty() {
        return Err(ObsidianError::NoHeaders {
            path: root.to_path_buf(),
        });
    }

    Ok(headers)
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case("h") || extension.eq_ignore_ascii_case("hpp")
        })
}

/// Writes the extraction context as pretty JSON followed by a newline.
///
/// ## Errors
/// Returns [`ObsidianError::Serialize`] if serialization or the write fails.
pub fn dump_metadata(context: &ExtractionContext, mut out: impl Write) -> Result<(), ObsidianError> {
    serde_json::to_writer_pretty(&mut out, context)?;
    writeln!(out).map_err(serde_json::Error::io)?;
    Ok(())
}
