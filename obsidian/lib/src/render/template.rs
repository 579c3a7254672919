use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::ObsidianError;

/// Matches `__name__` placeholders: lowercase, digits and single underscores.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__([a-z][a-z0-9_]*?)__").expect("Invalid placeholder regex")
});

/// Values substituted into a skeleton, keyed by placeholder name.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<&'static str, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }
}

/// Replaces every placeholder in `skeleton` in a single pass.
///
/// Substituted text is never scanned again, so values may contain anything,
/// including text that looks like a placeholder.
///
/// ## Errors
/// Returns [`ObsidianError::UnboundPlaceholder`] naming the first placeholder
/// without a binding.
pub fn fill(skeleton: &str, bindings: &Bindings) -> Result<String, ObsidianError> {
    let mut unbound: Option<String> = None;

    let rendered = PLACEHOLDER_RE.replace_all(skeleton, |captures: &Captures<'_>| {
        let key = &captures[1];
        match bindings.values.get(key) {
            Some(value) => value.clone(),
            None => {
                unbound.get_or_insert_with(|| key.to_string());
                captures[0].to_string()
            }
        }
    });

    match unbound {
        Some(key) => Err(ObsidianError::UnboundPlaceholder(key)),
        None => Ok(rendered.into_owned()),
    }
}
