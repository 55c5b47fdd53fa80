//! JSON tokenizer.

use super::{Lexeme, RenderFault, Scanner, TokenKind, eat_number, next_significant};

pub(crate) fn tokenize(text: &str) -> Result<Vec<Lexeme>, RenderFault> {
    let mut scanner = Scanner::new(text);
    let mut lexemes = Vec::new();

    while let Some(ch) = scanner.peek() {
        let start = scanner.pos();
        let kind = match ch {
            ' ' | '\t' | '\r' | '\n' => {
                scanner.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
                TokenKind::Whitespace
            }
            '{' | '}' | '[' | ']' | ',' => {
                scanner.bump();
                TokenKind::Punctuation
            }
            ':' => {
                scanner.bump();
                TokenKind::Operator
            }
            '"' => {
                scan_string(&mut scanner)?;
                TokenKind::String
            }
            '-' | '0'..='9' => {
                scanner.bump();
                if ch == '-' && !scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(scanner.unexpected());
                }
                eat_number(&mut scanner);
                TokenKind::Number
            }
            c if c.is_ascii_alphabetic() => {
                let word_start = scanner.pos();
                scanner.eat_while(|c| c.is_ascii_alphanumeric());
                match &text[word_start..scanner.pos()] {
                    "true" | "false" => TokenKind::Boolean,
                    "null" => TokenKind::Null,
                    _ => {
                        return Err(RenderFault::UnexpectedCharacter {
                            ch: c,
                            offset: word_start,
                        });
                    }
                }
            }
            _ => return Err(scanner.unexpected()),
        };
        lexemes.push(Lexeme::new(kind, start..scanner.pos()));
    }

    // A string followed by `:` is an object key.
    for index in 0..lexemes.len() {
        if lexemes[index].kind == TokenKind::String
            && next_significant(&lexemes, index)
                .is_some_and(|next| next.kind == TokenKind::Operator)
        {
            lexemes[index].kind = TokenKind::Property;
        }
    }
    Ok(lexemes)
}

fn scan_string(scanner: &mut Scanner<'_>) -> Result<(), RenderFault> {
    let start = scanner.pos();
    scanner.bump();
    loop {
        match scanner.bump() {
            Some('"') => return Ok(()),
            Some('\\') => {
                if scanner.bump().is_none() {
                    return Err(RenderFault::UnterminatedString(start));
                }
            }
            Some(c) if c.is_control() => return Err(RenderFault::UnterminatedString(start)),
            Some(_) => {}
            None => return Err(RenderFault::UnterminatedString(start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(text: &str) -> Vec<(&str, TokenKind)> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .filter(|l| l.kind != TokenKind::Whitespace)
            .map(|l| (&text[l.range], l.kind))
            .collect()
    }

    #[test]
    fn test_keys_and_values() {
        let text = r#"{"count": 44934, "avg": 517787.83064049494, "name": "bchn", "ok": true, "tip": null}"#;
        assert_eq!(
            significant(text),
            vec![
                ("{", TokenKind::Punctuation),
                ("\"count\"", TokenKind::Property),
                (":", TokenKind::Operator),
                ("44934", TokenKind::Number),
                (",", TokenKind::Punctuation),
                ("\"avg\"", TokenKind::Property),
                (":", TokenKind::Operator),
                ("517787.83064049494", TokenKind::Number),
                (",", TokenKind::Punctuation),
                ("\"name\"", TokenKind::Property),
                (":", TokenKind::Operator),
                ("\"bchn\"", TokenKind::String),
                (",", TokenKind::Punctuation),
                ("\"ok\"", TokenKind::Property),
                (":", TokenKind::Operator),
                ("true", TokenKind::Boolean),
                (",", TokenKind::Punctuation),
                ("\"tip\"", TokenKind::Property),
                (":", TokenKind::Operator),
                ("null", TokenKind::Null),
                ("}", TokenKind::Punctuation),
            ]
        );
    }

    #[test]
    fn test_escapes_in_strings() {
        let text = r#"["\\x00\"quoted\"", -1e-3]"#;
        let kinds: Vec<TokenKind> = significant(text).into_iter().map(|(_, k)| k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Punctuation,
                TokenKind::String,
                TokenKind::Punctuation,
                TokenKind::Number,
                TokenKind::Punctuation,
            ]
        );
    }

    #[test]
    fn test_faults() {
        assert_eq!(tokenize("\"open"), Err(RenderFault::UnterminatedString(0)));
        assert!(tokenize("{\"a\": undefined}").is_err());
        assert!(tokenize("{'a': 1}").is_err());
        assert!(tokenize("[-]").is_err());
    }
}
