//! Raw C++ token stream.
//!
//! tree-sitter discards the text of blanked annotation markers, so the original
//! source is tokenized separately. Comments are dropped and every token keeps
//! its byte span and 1-based line so it can be matched against syntax nodes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    StringLiteral,
    CharLiteral,
    Punctuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based source line of the first byte.
    pub line: usize,
    pub start: usize,
    pub end: usize,
    /// Whether the token belongs to a preprocessor directive line.
    pub in_directive: bool,
}

impl Token {
    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }

    pub fn is_punctuation(&self, punctuation: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == punctuation
    }

    /// Decoded contents of a string literal, without prefix or quotes.
    ///
    /// Returns `None` for any other token kind.
    pub fn string_value(&self) -> Option<String> {
        if self.kind != TokenKind::StringLiteral {
            return None;
        }

        let quote = self.text.find('"')?;
        let prefix = &self.text[..quote];
        let body = &self.text[quote + 1..];

        if prefix.ends_with('R') {
            let open = body.find('(')?;
            let delimiter = &body[..open];
            let closing = format!("){delimiter}\"");
            let content = &body[open + 1..];
            let content = content.strip_suffix(closing.as_str()).unwrap_or(content);
            return Some(content.to_string());
        }

        let content = body.strip_suffix('"').unwrap_or(body);
        Some(decode_escapes(content))
    }
}

/// Tokenizes C++ source text.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        line: 1,
        at_line_start: true,
        in_directive: false,
        tokens: Vec::new(),
    };
    lexer.run();
    lexer.tokens
}

const STRING_PREFIXES: &[&str] = &["L", "u", "U", "u8", "R", "LR", "uR", "UR", "u8R"];
const CHAR_PREFIXES: &[&str] = &["L", "u", "U", "u8"];

const PUNCTUATORS: &[&str] = &[
    "<<=", ">>=", "<=>", "...", "->*", "::", "->", "++", "--", "<<", ">>", "<=", ">=", "==",
    "!=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "##", ".*",
];

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    at_line_start: bool,
    in_directive: bool,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn run(&mut self) {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\n' => {
                    self.newline();
                    self.in_directive = false;
                    self.at_line_start = true;
                }
                b'\\' if self.is_line_continuation() => {
                    self.pos += 1;
                    if self.peek(0) == Some(b'\r') {
                        self.pos += 1;
                    }
                    self.newline();
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'"' => self.lex_string(self.pos, false),
                b'\'' => self.lex_char(self.pos),
                b'0'..=b'9' => self.lex_number(),
                b'.' if self.peek(1).is_some_and(|next| next.is_ascii_digit()) => {
                    self.lex_number()
                }
                byte if is_identifier_start(byte) => self.lex_identifier(),
                _ => self.lex_punctuation(),
            }
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
    }

    fn is_line_continuation(&self) -> bool {
        match self.peek(1) {
            Some(b'\n') => true,
            Some(b'\r') => self.peek(2) == Some(b'\n'),
            _ => false,
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize) {
        if kind == TokenKind::Punctuation && self.at_line_start && &self.source[start..self.pos] == "#"
        {
            self.in_directive = true;
        }

        self.tokens.push(Token {
            kind,
            text: self.source[start..self.pos].to_string(),
            line,
            start,
            end: self.pos,
            in_directive: self.in_directive,
        });
        self.at_line_start = false;
    }

    fn skip_line_comment(&mut self) {
        while let Some(byte) = self.peek(0) {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(byte) = self.peek(0) {
            if byte == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            if byte == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn lex_identifier(&mut self) {
        let start = self.pos;
        let line = self.line;
        while self.peek(0).is_some_and(is_identifier_continue) {
            self.pos += 1;
        }

        let word = &self.source[start..self.pos];
        match self.peek(0) {
            Some(b'"') if STRING_PREFIXES.contains(&word) => {
                self.lex_string(start, word.ends_with('R'));
            }
            Some(b'\'') if CHAR_PREFIXES.contains(&word) => self.lex_char(start),
            _ => self.push(TokenKind::Identifier, start, line),
        }
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        let line = self.line;
        while let Some(byte) = self.peek(0) {
            let exponent_sign = matches!(byte, b'+' | b'-')
                && matches!(
                    self.bytes.get(self.pos.wrapping_sub(1)),
                    Some(b'e' | b'E' | b'p' | b'P')
                );
            let separator = byte == b'\''
                && self.peek(1).is_some_and(|next| next.is_ascii_alphanumeric());

            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.' || exponent_sign || separator
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, line);
    }

    /// Lexes a string literal whose opening quote is at `self.pos`.
    fn lex_string(&mut self, start: usize, raw: bool) {
        let line = self.line;
        self.pos += 1;

        if raw {
            let delimiter_start = self.pos;
            while let Some(byte) = self.peek(0) {
                if byte == b'(' || byte == b'"' || byte == b'\n' {
                    break;
                }
                self.pos += 1;
            }
            let delimiter = self.source[delimiter_start..self.pos].to_string();
            let closing = format!("){delimiter}\"");
            match self.source[self.pos..].find(closing.as_str()) {
                Some(offset) => {
                    let end = self.pos + offset + closing.len();
                    self.line += self.source[self.pos..end].matches('\n').count();
                    self.pos = end;
                }
                None => {
                    self.line += self.source[self.pos..].matches('\n').count();
                    self.pos = self.bytes.len();
                }
            }
            self.push(TokenKind::StringLiteral, start, line);
            return;
        }

        self.consume_quoted(b'"');
        self.push(TokenKind::StringLiteral, start, line);
    }

    fn lex_char(&mut self, start: usize) {
        let line = self.line;
        self.pos += 1;
        self.consume_quoted(b'\'');
        self.push(TokenKind::CharLiteral, start, line);
    }

    /// Consumes up to and including `quote`, stopping early at an unescaped newline.
    fn consume_quoted(&mut self, quote: u8) {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => {
                    if self.peek(1) == Some(b'\n') {
                        self.line += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                b'\n' => return,
                byte if byte == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_punctuation(&mut self) {
        let start = self.pos;
        let line = self.line;
        let rest = &self.source[start..];

        let length = PUNCTUATORS
            .iter()
            .find(|punctuator| rest.starts_with(**punctuator))
            .map(|punctuator| punctuator.len())
            .or_else(|| rest.chars().next().map(char::len_utf8))
            .unwrap_or(1);

        self.pos += length;
        self.push(TokenKind::Punctuation, start, line);
    }
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

fn is_identifier_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

/// Decodes C++ escape sequences inside a non-raw literal body.
pub(crate) fn decode_escapes(content: &str) -> String {
    let mut decoded = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }

        let Some(escape) = chars.next() else {
            decoded.push('\\');
            break;
        };

        match escape {
            'n' => decoded.push('\n'),
            't' => decoded.push('\t'),
            'r' => decoded.push('\r'),
            'a' => decoded.push('\u{07}'),
            'b' => decoded.push('\u{08}'),
            'f' => decoded.push('\u{0c}'),
            'v' => decoded.push('\u{0b}'),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|next| next.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                decoded.extend(char::from_u32(value));
            }
            'x' => {
                let mut value: u32 = 0;
                while let Some(digit) = chars.peek().and_then(|next| next.to_digit(16)) {
                    value = value.wrapping_mul(16).wrapping_add(digit);
                    chars.next();
                }
                decoded.extend(char::from_u32(value));
            }
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                let mut value: u32 = 0;
                for _ in 0..width {
                    match chars.peek().and_then(|next| next.to_digit(16)) {
                        Some(digit) => {
                            value = value * 16 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                decoded.extend(char::from_u32(value));
            }
            other => decoded.push(other),
        }
    }

    decoded
}
