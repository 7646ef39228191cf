// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tokenizer for permission rule expressions.

use crate::errors::CompileError;

/// Kinds of tokens produced by the [`Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Unquoted run of characters (matcher names, keywords, bare values).
    Word,
    /// Single or double quoted string. The span text holds the unescaped value.
    String,
    /// One of `( ) [ ] , = ! && ||`.
    Symbol,
    Eof,
}

/// Location and text of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    text: String,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(pub TokenKind, pub Span);

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | ',' | '=' | '\'' | '"' | '!' | '&' | '|')
}

pub struct Lexer<'source> {
    source: &'source str,
    pos: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn token(kind: TokenKind, offset: usize, text: impl Into<String>) -> Token {
        Token(
            kind,
            Span {
                offset,
                text: text.into(),
            },
        )
    }

    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }

        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Self::token(TokenKind::Eof, start, ""));
        };

        match c {
            '(' | ')' | '[' | ']' | ',' | '=' | '!' => {
                self.pos += 1;
                Ok(Self::token(TokenKind::Symbol, start, c.to_string()))
            }
            '&' | '|' => {
                let doubled = if c == '&' { "&&" } else { "||" };
                if self.source[start..].starts_with(doubled) {
                    self.pos += 2;
                    Ok(Self::token(TokenKind::Symbol, start, doubled))
                } else {
                    Err(CompileError::UnexpectedToken {
                        found: c.to_string(),
                        offset: start,
                    })
                }
            }
            '\'' | '"' => self.read_string(c),
            _ => {
                while let Some(c) = self.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                Ok(Self::token(
                    TokenKind::Word,
                    start,
                    &self.source[start..self.pos],
                ))
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, CompileError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.source[self.pos..].char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, e)) if e == quote || e == '\\' => value.push(e),
                    // Unknown escapes are kept so that regex classes survive.
                    Some((_, e)) => {
                        value.push('\\');
                        value.push(e);
                    }
                    None => break,
                },
                c if c == quote => {
                    self.pos += i + 1;
                    return Ok(Self::token(TokenKind::String, start, value));
                }
                c => value.push(c),
            }
        }

        Err(CompileError::UnterminatedString { offset: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(input: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let Token(kind, span) = lexer.next_token().expect("lex");
            if kind == TokenKind::Eof {
                break;
            }
            out.push((kind, span.text().to_string()));
        }
        out
    }

    #[test]
    fn splits_matchers_and_operators() {
        let tokens = kinds_and_texts("method(GET) && path-prefix[path='/api/']");
        let texts: Vec<&str> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec!["method", "(", "GET", ")", "&&", "path-prefix", "[", "path", "=", "/api/", "]"]
        );
        assert_eq!(tokens[9].0, TokenKind::String);
    }

    #[test]
    fn bare_paths_are_words() {
        let tokens = kinds_and_texts("path-glob(/docs/**/*.md)");
        assert_eq!(tokens[2], (TokenKind::Word, "/docs/**/*.md".to_string()));
    }

    #[test]
    fn string_escapes() {
        let tokens = kinds_and_texts(r#"regex('^/v\d+/it\'s')"#);
        assert_eq!(tokens[2], (TokenKind::String, r"^/v\d+/it's".to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("path('/api");
        lexer.next_token().expect("word");
        lexer.next_token().expect("paren");
        assert_eq!(
            lexer.next_token(),
            Err(CompileError::UnterminatedString { offset: 5 })
        );
    }

    #[test]
    fn lone_ampersand_is_rejected() {
        let mut lexer = Lexer::new("& x");
        assert!(matches!(
            lexer.next_token(),
            Err(CompileError::UnexpectedToken { offset: 0, .. })
        ));
    }
}
