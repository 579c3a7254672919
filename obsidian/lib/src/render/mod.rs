//! Generates C++ reflection headers from extracted metadata.
//!
//! Rendering is a pure function of the [`ExtractionContext`]: fixed skeletons
//! from [`skeleton`] are filled by literal placeholder substitution, and every
//! free-form string (descriptions, attribute values) is escaped first.

mod classes;
mod enums;
mod escape;
mod skeleton;
mod template;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ObsidianError;
use crate::shared::{Attribute, ExtractionContext, SourceLocation};

pub use escape::{escape_literal, string_literal};
pub use template::{Bindings, fill};

/// Header holding the specializations and collections.
pub const REFLECTION_HEADER: &str = "reflection.hpp";
/// Shared preamble in per-type mode.
pub const CORE_HEADER: &str = "reflection-core.hpp";
/// No-op marker definitions.
pub const MARKER_HEADER: &str = "obs.h";

/// How generated code is split into files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputLayout {
    /// `reflection.hpp` plus `obs.h`.
    #[default]
    SingleHeader,
    /// A core header, one header per type, and a collection header.
    PerType,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub layout: OutputLayout,
    /// Directory generated `#include`s are written relative to. Files outside
    /// it, or all files when unset, are included by file name.
    pub include_root: Option<PathBuf>,
}

/// One generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub contents: String,
}

impl Document {
    fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Renders every output document for `context`.
///
/// ## Errors
/// Returns [`ObsidianError::UnboundPlaceholder`] if a skeleton references a
/// placeholder the renderer does not bind.
pub fn render(
    context: &ExtractionContext,
    options: &RenderOptions,
) -> Result<Vec<Document>, ObsidianError> {
    let mut documents = match options.layout {
        OutputLayout::SingleHeader => vec![single_header(context, options)?],
        OutputLayout::PerType => per_type(context, options)?,
    };
    documents.push(Document::new(MARKER_HEADER, skeleton::MARKER_HEADER.to_string()));

    debug!(
        documents = documents.len(),
        layout = ?options.layout,
        "rendered reflection code"
    );
    Ok(documents)
}

fn single_header(
    context: &ExtractionContext,
    options: &RenderOptions,
) -> Result<Document, ObsidianError> {
    let mut specializations = String::new();
    for item in &context.enums {
        specializations.push_str(&enums::specialization(item)?);
        specializations.push('\n');
    }
    for item in &context.classes {
        specializations.push_str(&classes::specialization(item)?);
        specializations.push('\n');
    }

    let locations = context
        .enums
        .iter()
        .map(|item| &item.location)
        .chain(context.classes.iter().map(|item| &item.location));
    let includes = include_lines(&source_includes(locations, context, options));

    let bindings = Bindings::new()
        .bind("banner", skeleton::BANNER)
        .bind("core", skeleton::CORE)
        .bind("includes", includes)
        .bind("specializations", specializations)
        .bind("collections", collections(context)?);

    Ok(Document::new(
        REFLECTION_HEADER,
        fill(skeleton::SINGLE_HEADER, &bindings)?,
    ))
}

fn per_type(
    context: &ExtractionContext,
    options: &RenderOptions,
) -> Result<Vec<Document>, ObsidianError> {
    let core = Bindings::new()
        .bind("banner", skeleton::BANNER)
        .bind("core", skeleton::CORE);
    let mut documents = vec![Document::new(CORE_HEADER, fill(skeleton::CORE_HEADER, &core)?)];

    let mut type_headers = Vec::new();
    let mut add_type = |full_name: &str,
                        location: &SourceLocation,
                        specialization: String|
     -> Result<(), ObsidianError> {
        let path = type_header_name(full_name);
        let includes = source_includes(std::iter::once(location), context, options);
        let bindings = Bindings::new()
            .bind("banner", skeleton::BANNER)
            .bind("core_header", CORE_HEADER)
            .bind("includes", include_lines(&includes))
            .bind("specializations", specialization);

        documents.push(Document::new(path.clone(), fill(skeleton::TYPE_HEADER, &bindings)?));
        type_headers.push(path);
        Ok(())
    };

    for item in &context.enums {
        add_type(&item.full_name, &item.location, enums::specialization(item)?)?;
    }
    for item in &context.classes {
        add_type(&item.full_name, &item.location, classes::specialization(item)?)?;
    }

    let bindings = Bindings::new()
        .bind("banner", skeleton::BANNER)
        .bind(
            "includes",
            include_lines(&std::iter::once(CORE_HEADER.to_string()).chain(type_headers).collect::<Vec<_>>()),
        )
        .bind("collections", collections(context)?);
    documents.push(Document::new(
        REFLECTION_HEADER,
        fill(skeleton::COLLECTION_HEADER, &bindings)?,
    ));

    Ok(documents)
}

fn collections(context: &ExtractionContext) -> Result<String, ObsidianError> {
    Ok(format!(
        "{}\n{}",
        enums::collection(&context.enums)?,
        classes::collection(&context.classes)?
    ))
}

/// `refl-FirstNamespace_Vegetable.hpp` for `FirstNamespace::Vegetable`.
pub fn type_header_name(full_name: &str) -> String {
    let flattened = full_name.trim_start_matches("::").replace("::", "_");
    format!("refl-{flattened}.hpp")
}

/// Fully qualified C++ spelling, always anchored at the global namespace.
pub(crate) fn cpp_name(full_name: &str) -> String {
    if full_name.starts_with("::") {
        full_name.to_string()
    } else {
        format!("::{full_name}")
    }
}

/// `{"name", "value"}, ...` for a brace-initialized attribute vector.
pub(crate) fn attribute_list(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(|attribute| {
            format!(
                "{{{}, {}}}",
                string_literal(&attribute.name),
                string_literal(&attribute.value)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Include paths for the source files declaring reflected types.
///
/// Ordered like `processed_input_files`; files the context does not list
/// follow in first-seen order.
fn source_includes<'a>(
    locations: impl Iterator<Item = &'a SourceLocation>,
    context: &ExtractionContext,
    options: &RenderOptions,
) -> Vec<String> {
    let mut files: Vec<&Path> = Vec::new();
    for location in locations {
        if !files.contains(&location.file.as_path()) {
            files.push(&location.file);
        }
    }
    files.sort_by_key(|file| {
        context
            .processed_input_files
            .iter()
            .position(|processed| processed == file)
            .unwrap_or(usize::MAX)
    });

    files
        .into_iter()
        .map(|file| include_path(file, options.include_root.as_deref()))
        .collect()
}

fn include_path(file: &Path, root: Option<&Path>) -> String {
    let relative = root.and_then(|root| file.strip_prefix(root).ok());
    match relative {
        Some(relative) => relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        None => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string_lossy().into_owned()),
    }
}

fn include_lines(paths: &[String]) -> String {
    paths
        .iter()
        .map(|path| format!("#include \"{}\"\n", escape_literal(path)))
        .collect()
}
