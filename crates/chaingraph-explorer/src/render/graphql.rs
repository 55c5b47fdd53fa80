//! GraphQL tokenizer.

use super::{Lexeme, RenderFault, Scanner, TokenKind, eat_number, next_significant};

const KEYWORDS: &[&str] = &[
    "query",
    "mutation",
    "subscription",
    "fragment",
    "on",
    "schema",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "extend",
    "scalar",
    "directive",
    "implements",
    "repeatable",
];

/// Keywords that are followed by a definition name.
const DEFINING: &[&str] = &["query", "mutation", "subscription", "fragment"];

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn is_ignored(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{feff}')
}

/// Split `text` into lexemes, then classify names by position.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Lexeme>, RenderFault> {
    let mut lexemes = scan(text)?;
    classify_names(text, &mut lexemes);
    Ok(lexemes)
}

/// Lexical pass. Every name comes out as `Plain`.
fn scan(text: &str) -> Result<Vec<Lexeme>, RenderFault> {
    let mut scanner = Scanner::new(text);
    let mut lexemes = Vec::new();

    while let Some(ch) = scanner.peek() {
        let start = scanner.pos();
        let kind = match ch {
            c if is_ignored(c) => {
                scanner.eat_while(is_ignored);
                TokenKind::Whitespace
            }
            '#' => {
                scanner.eat_while(|c| c != '\n' && c != '\r');
                TokenKind::Comment
            }
            '"' => {
                scan_string(&mut scanner)?;
                TokenKind::String
            }
            '$' | '@' => {
                scanner.bump();
                if !scanner.peek().is_some_and(is_name_start) {
                    return Err(scanner.unexpected());
                }
                scanner.eat_while(is_name_continue);
                if ch == '$' {
                    TokenKind::Variable
                } else {
                    TokenKind::Directive
                }
            }
            '-' | '0'..='9' => {
                scanner.bump();
                if ch == '-' && !scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(scanner.unexpected());
                }
                eat_number(&mut scanner);
                TokenKind::Number
            }
            '.' => {
                if !scanner.eat_str("...") {
                    return Err(scanner.unexpected());
                }
                TokenKind::Operator
            }
            '!' | '=' | '|' | '&' => {
                scanner.bump();
                TokenKind::Operator
            }
            '{' | '}' | '(' | ')' | '[' | ']' | ':' | ',' => {
                scanner.bump();
                TokenKind::Punctuation
            }
            c if is_name_start(c) => {
                scanner.eat_while(is_name_continue);
                TokenKind::Plain
            }
            _ => return Err(scanner.unexpected()),
        };
        lexemes.push(Lexeme::new(kind, start..scanner.pos()));
    }
    Ok(lexemes)
}

fn scan_string(scanner: &mut Scanner<'_>) -> Result<(), RenderFault> {
    let start = scanner.pos();
    if scanner.eat_str("\"\"\"") {
        loop {
            if scanner.eat_str("\\\"\"\"") {
                continue;
            }
            if scanner.eat_str("\"\"\"") {
                return Ok(());
            }
            if scanner.bump().is_none() {
                return Err(RenderFault::UnterminatedString(start));
            }
        }
    }

    scanner.bump();
    loop {
        match scanner.bump() {
            Some('"') => return Ok(()),
            Some('\\') => {
                if scanner.bump().is_none() {
                    return Err(RenderFault::UnterminatedString(start));
                }
            }
            Some('\n' | '\r') | None => return Err(RenderFault::UnterminatedString(start)),
            Some(_) => {}
        }
    }
}

/// Positional pass over names: keywords and definitions at the top level,
/// argument names inside parentheses, fields inside selection sets.
fn classify_names(text: &str, lexemes: &mut [Lexeme]) {
    let mut braces = 0usize;
    let mut parens = 0usize;
    let mut expect_definition = false;
    let mut previous: Option<&str> = None;

    for index in 0..lexemes.len() {
        let lexeme = &lexemes[index];
        let word = &text[lexeme.range.clone()];

        match lexeme.kind {
            TokenKind::Whitespace | TokenKind::Comment => continue,
            TokenKind::Punctuation => {
                match word {
                    "{" => braces += 1,
                    "}" => braces = braces.saturating_sub(1),
                    "(" => parens += 1,
                    ")" => parens = parens.saturating_sub(1),
                    _ => {}
                }
                if matches!(word, "{" | "(") {
                    expect_definition = false;
                }
                previous = Some(word);
                continue;
            }
            TokenKind::Plain => {}
            _ => {
                previous = Some(word);
                continue;
            }
        }

        let colon_next = next_significant(lexemes, index)
            .is_some_and(|next| &text[next.range.clone()] == ":");

        let kind = if parens > 0 {
            if colon_next {
                TokenKind::Attribute
            } else {
                value_kind(word)
            }
        } else if braces == 0 {
            if KEYWORDS.contains(&word) {
                expect_definition = DEFINING.contains(&word);
                TokenKind::Keyword
            } else if expect_definition {
                expect_definition = false;
                TokenKind::Definition
            } else {
                TokenKind::Plain
            }
        } else {
            match previous {
                Some("...") if word == "on" => TokenKind::Keyword,
                Some("...") => TokenKind::Definition,
                Some("on") => TokenKind::Plain,
                _ => TokenKind::Property,
            }
        };

        lexemes[index].kind = kind;
        previous = Some(word);
    }
}

fn value_kind(word: &str) -> TokenKind {
    match word {
        "true" | "false" => TokenKind::Boolean,
        "null" => TokenKind::Null,
        _ => TokenKind::Plain,
    }
}
