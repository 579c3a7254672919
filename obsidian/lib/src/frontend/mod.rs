//! The C++ frontend: tree-sitter syntax tree plus a raw token stream.

pub mod token;

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use tree_sitter::{Node, Parser, Tree};

use crate::error::ObsidianError;
use crate::extract::annotation::Marker;
use crate::shared::{Diagnostic, DiagnosticSeverity, SourceRange};

pub use token::{Token, TokenKind, tokenize};

/// Options handed to the frontend for every translation unit.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Compiler-style flags (`-I`, `-D`, `-std=`) passed through unmodified.
    pub compile_options: Vec<String>,
}

/// A parsed header: the original text, its token stream and its syntax tree.
#[derive(Debug)]
pub struct TranslationUnit {
    pub path: PathBuf,
    source: String,
    tokens: Vec<Token>,
    line_starts: Vec<usize>,
    tree: Tree,
}

impl TranslationUnit {
    /// Reads and parses a header from disk.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or tree-sitter produces no tree.
    #[instrument(level = "debug", skip(options), fields(path = %path.as_ref().display()))]
    pub fn parse<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Self, ObsidianError> {
        let path = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&path).map_err(|source| ObsidianError::Io {
            path: path.clone(),
            source,
        })?;

        Self::from_source(path, source, options)
    }

    /// Parses in-memory source as if it had been read from `path`.
    ///
    /// ## Errors
    /// Returns an error if the grammar cannot be loaded or no tree is produced.
    pub fn from_source(
        path: impl Into<PathBuf>,
        source: impl Into<String>,
        options: &ParseOptions,
    ) -> Result<Self, ObsidianError> {
        let path = path.into();
        let source = source.into();

        if !options.compile_options.is_empty() {
            debug!(
                options = ?options.compile_options,
                "compile options recorded; the syntactic frontend does not preprocess"
            );
        }

        let tokens = tokenize(&source);
        let masked = mask_markers(&source, &tokens);

        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_cpp::LANGUAGE.into())?;
        let tree = parser
            .parse(&masked, None)
            .ok_or_else(|| ObsidianError::ParseFailed { path: path.clone() })?;

        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(index, _)| index + 1))
            .collect();

        Ok(Self {
            path,
            source,
            tokens,
            line_starts,
            tree,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text of a node, taken from the original source.
    pub fn text(&self, node: Node<'_>) -> &str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or_default()
    }

    /// Byte offset of the start of a 0-based line, clamped to the last line.
    pub fn line_start(&self, row: usize) -> usize {
        let index = row.min(self.line_starts.len().saturating_sub(1));
        self.line_starts.get(index).copied().unwrap_or(0)
    }

    /// Syntax diagnostics derived from tree-sitter error and missing nodes.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut stack = vec![self.root()];

        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                let message = if node.is_missing() {
                    format!("Missing `{}`", node.kind())
                } else {
                    let snippet: String = self.text(node).chars().take(40).collect();
                    format!("Syntax error near `{}`", snippet.trim())
                };

                diagnostics.push(Diagnostic {
                    message,
                    range: SourceRange::of(node),
                    severity: DiagnosticSeverity::Error,
                });
            }

            if node.has_error() {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    stack.push(child);
                }
            }
        }

        diagnostics.sort_by_key(|diagnostic| diagnostic.range.start_byte);
        diagnostics
    }

    /// Whether any diagnostic makes this unit unusable.
    pub fn has_errors(&self) -> bool {
        self.diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.severity.is_fatal())
    }
}

/// Replaces every marker invocation with spaces so the grammar never sees it.
///
/// Newlines are kept, so byte offsets and line numbers match the original.
fn mask_markers(source: &str, tokens: &[Token]) -> String {
    let mut bytes = source.as_bytes().to_vec();
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];
        if token.in_directive || Marker::from_identifier(token).is_none() {
            index += 1;
            continue;
        }

        let (end, next) = marker_extent(tokens, index);

        for byte in &mut bytes[token.start..end] {
            if *byte != b'\n' && *byte != b'\r' {
                *byte = b' ';
            }
        }
        index = next;
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// End byte and following token index of the marker at `index`.
///
/// An argument list that reaches `;`, `{` or `}` before its closing paren is
/// malformed. Only the identifier, the `(` and the literal arguments after it
/// are masked then, so the declaration the marker precedes still parses.
fn marker_extent(tokens: &[Token], index: usize) -> (usize, usize) {
    let open = index + 1;
    if !tokens.get(open).is_some_and(|token| token.is_punctuation("(")) {
        return (tokens[index].end, open);
    }

    let mut depth = 0usize;
    for (next, inner) in tokens.iter().enumerate().skip(open) {
        if inner.is_punctuation(";") || inner.is_punctuation("{") || inner.is_punctuation("}") {
            break;
        }
        if inner.is_punctuation("(") {
            depth += 1;
        } else if inner.is_punctuation(")") {
            depth -= 1;
            if depth == 0 {
                return (inner.end, next + 1);
            }
        }
    }

    let literal_arguments = tokens[open + 1..]
        .iter()
        .take_while(|token| {
            matches!(
                token.kind,
                TokenKind::StringLiteral | TokenKind::CharLiteral | TokenKind::Number
            ) || token.is_punctuation(",")
        })
        .count();
    let last = open + literal_arguments;
    (tokens[last].end, last + 1)
}
