use std::fmt;

use crate::frontend::Token;

/// The three recognized annotation markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Enum,
    Class,
    Property,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::Enum, Marker::Class, Marker::Property];

    /// The identifier written in source.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Enum => "OBS_ENUM",
            Self::Class => "OBS_CLASS",
            Self::Property => "OBS_PROP",
        }
    }

    /// Returns the marker a token spells, if any.
    pub fn from_identifier(token: &Token) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|marker| token.is_identifier(marker.keyword()))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Half-open byte range a marker must start in to belong to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: usize,
    pub end: usize,
}

/// Finds the index of the first `marker` token starting inside `window`.
///
/// Tokens on preprocessor directive lines never count.
pub fn locate(tokens: &[Token], marker: Marker, window: SearchWindow) -> Option<usize> {
    let first = tokens.partition_point(|token| token.start < window.start);

    tokens[first..]
        .iter()
        .take_while(|token| token.start < window.end)
        .position(|token| !token.in_directive && token.is_identifier(marker.keyword()))
        .map(|offset| first + offset)
}
