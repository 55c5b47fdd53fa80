//! Syntax highlighting for example sources and result payloads.
//!
//! A [`SyntaxHighlighter`] turns text plus a [`Language`] into lines of
//! [`StyledToken`]s. Highlighting only tokenizes; it never validates, and it
//! never fails. Input the lexer cannot make sense of is returned as plain,
//! unstyled lines.
//!
//! # Example
//!
//! ```
//! use chaingraph_explorer::render::{DefaultHighlighter, Language, SyntaxHighlighter, TokenKind};
//!
//! let lines = DefaultHighlighter.highlight("{\n  \"count\": 25923\n}", Language::Json);
//! assert_eq!(lines.len(), 3);
//! assert_eq!(lines[1].text(), "  \"count\": 25923");
//! assert!(lines[1].tokens.iter().any(|t| t.kind == TokenKind::Property));
//! ```

mod graphql;
mod json;

use std::ops::Range;

use chaingraph_explorer_core::logging::targets;

/// Languages the highlighter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// GraphQL documents.
    GraphQL,
    /// JSON values.
    Json,
}

/// The style class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Reserved words such as `query`, `subscription` or `on`.
    Keyword,
    /// Operation and fragment names.
    Definition,
    /// Field names and JSON object keys.
    Property,
    /// `$variables`.
    Variable,
    /// `@directives`.
    Directive,
    /// String literals.
    String,
    /// Number literals.
    Number,
    /// `true` and `false`.
    Boolean,
    /// `null`.
    Null,
    /// Braces, brackets, parentheses and commas.
    Punctuation,
    /// `!`, `=`, `|`, `&`, `...` and the JSON `:`.
    Operator,
    /// `#` comments.
    Comment,
    /// Argument names.
    Attribute,
    /// Spaces and tabs.
    Whitespace,
    /// Everything else, including unstyled fallback output.
    Plain,
}

impl TokenKind {
    /// Prism-compatible class name, empty for unstyled text.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Definition => "definition",
            Self::Property => "property",
            Self::Variable => "variable",
            Self::Directive => "directive",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Punctuation => "punctuation",
            Self::Operator => "operator",
            Self::Comment => "comment",
            Self::Attribute => "attr-name",
            Self::Whitespace | Self::Plain => "",
        }
    }
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledToken {
    /// Style class.
    pub kind: TokenKind,
    /// The exact source text.
    pub text: String,
}

impl StyledToken {
    /// Create a token.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// One display line. Concatenating the token texts gives the input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedLine {
    /// Tokens in order. Empty for a blank line.
    pub tokens: Vec<StyledToken>,
}

impl RenderedLine {
    /// The line's text.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|token| token.text.as_str()).collect()
    }

    /// Whether no token carries a style.
    pub fn is_plain(&self) -> bool {
        self.tokens
            .iter()
            .all(|token| matches!(token.kind, TokenKind::Plain | TokenKind::Whitespace))
    }
}

/// Converts text into styled lines.
///
/// Implementations must be pure and must not panic on any input.
pub trait SyntaxHighlighter: Send + Sync {
    /// Highlight `text`, split on `\n`.
    fn highlight(&self, text: &str, language: Language) -> Vec<RenderedLine>;
}

/// The built-in GraphQL and JSON tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHighlighter;

impl SyntaxHighlighter for DefaultHighlighter {
    fn highlight(&self, text: &str, language: Language) -> Vec<RenderedLine> {
        let lexed = match language {
            Language::GraphQL => graphql::tokenize(text),
            Language::Json => json::tokenize(text),
        };
        match lexed {
            Ok(lexemes) => into_lines(text, &lexemes),
            Err(fault) => {
                tracing::debug!(target: targets::RENDER, ?language, %fault, "rendering unstyled");
                plain_lines(text)
            }
        }
    }
}

/// Why a lexer gave up on its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RenderFault {
    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),
    #[error("unexpected character {ch:?} at byte {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
}

/// A classified span of the input. Lexers emit spans that tile the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub(crate) kind: TokenKind,
    pub(crate) range: Range<usize>,
}

impl Lexeme {
    pub(crate) fn new(kind: TokenKind, range: Range<usize>) -> Self {
        Self { kind, range }
    }
}

/// Cursor over the input shared by both lexers.
pub(crate) struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub(crate) fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    pub(crate) fn eat_str(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn unexpected(&self) -> RenderFault {
        RenderFault::UnexpectedCharacter {
            ch: self.peek().unwrap_or('\0'),
            offset: self.pos,
        }
    }
}

/// Digits, an optional fraction and an optional exponent, after any sign.
pub(crate) fn eat_number(scanner: &mut Scanner<'_>) {
    scanner.eat_while(|c| c.is_ascii_digit());
    if scanner.peek() == Some('.') && scanner.peek_second().is_some_and(|c| c.is_ascii_digit()) {
        scanner.bump();
        scanner.eat_while(|c| c.is_ascii_digit());
    }
    if matches!(scanner.peek(), Some('e' | 'E')) {
        scanner.bump();
        if matches!(scanner.peek(), Some('+' | '-')) {
            scanner.bump();
        }
        scanner.eat_while(|c| c.is_ascii_digit());
    }
}

/// Kind of the next lexeme after `index` that is not whitespace or a comment.
pub(crate) fn next_significant<'l>(lexemes: &'l [Lexeme], index: usize) -> Option<&'l Lexeme> {
    lexemes[index + 1..]
        .iter()
        .find(|lexeme| !matches!(lexeme.kind, TokenKind::Whitespace | TokenKind::Comment))
}

fn into_lines(text: &str, lexemes: &[Lexeme]) -> Vec<RenderedLine> {
    let mut lines = vec![RenderedLine::default()];
    for lexeme in lexemes {
        let mut parts = text[lexeme.range.clone()].split('\n');
        if let Some(first) = parts.next() {
            push_part(&mut lines, lexeme.kind, first);
        }
        for part in parts {
            lines.push(RenderedLine::default());
            push_part(&mut lines, lexeme.kind, part);
        }
    }
    lines
}

fn push_part(lines: &mut [RenderedLine], kind: TokenKind, part: &str) {
    if part.is_empty() {
        return;
    }
    if let Some(line) = lines.last_mut() {
        line.tokens.push(StyledToken::new(kind, part));
    }
}

/// One unstyled token per line.
pub(crate) fn plain_lines(text: &str) -> Vec<RenderedLine> {
    text.split('\n')
        .map(|line| RenderedLine {
            tokens: if line.is_empty() {
                Vec::new()
            } else {
                vec![StyledToken::new(TokenKind::Plain, line)]
            },
        })
        .collect()
}
