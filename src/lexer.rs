use std::fmt;

use crate::token::{Keyword, Position, Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// String literal with no closing quote before end of input.
    UnterminatedString,
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// Digit run that does not form a valid number.
    InvalidNumber(String),
}

impl LexErrorKind {
    /// Stable identifier used by editor diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnterminatedString => "unterminated-string",
            Self::UnexpectedCharacter(_) => "unexpected-character",
            Self::InvalidNumber(_) => "invalid-number",
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnexpectedCharacter(ch) => write!(f, "unexpected character: {ch}"),
            Self::InvalidNumber(text) => write!(f, "invalid number literal: {text}"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.start.line, span.start.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize Note G source text.
///
/// The returned vector always ends with exactly one [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns the first `LexError` encountered; no partial token list
/// is produced.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(input).tokenize()?;
    tracing::trace!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let start = if input.starts_with('\u{FEFF}') {
            '\u{FEFF}'.len_utf8()
        } else {
            0
        };
        Self {
            input,
            pos: start,
            line: 1,
            col: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let start = self.position();

            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    tokens.push(self.token_from(TokenKind::Newline, start));
                }
                '/' if self.peek_at(1) == Some('/') => {
                    self.skip_comment();
                }
                '{' if self.peek_at(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    tokens.push(self.token_from(TokenKind::TemplateOpen, start));
                }
                '}' if self.peek_at(1) == Some('}') => {
                    self.advance();
                    self.advance();
                    tokens.push(self.token_from(TokenKind::TemplateClose, start));
                }
                '"' | '\'' => {
                    tokens.push(self.read_string(ch)?);
                }
                c if c.is_ascii_digit() => {
                    tokens.push(self.read_number()?);
                }
                c if c.is_alphabetic() || c == '_' => {
                    tokens.push(self.read_word());
                }
                _ => {
                    tokens.push(self.read_operator(ch)?);
                }
            }
        }

        let end = self.position();
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end),
            lexeme: String::new(),
        });

        Ok(tokens)
    }

    const fn position(&self) -> Position {
        Position::new(self.line, self.col, self.pos)
    }

    fn token_from(&self, kind: TokenKind, start: Position) -> Token {
        Token {
            kind,
            span: Span::new(start, self.position()),
            lexeme: self.input[start.offset..self.pos].to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        let start = self.position();
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedString,
                        span: Span::new(start, self.position()),
                    });
                }
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(LexError {
                            kind: LexErrorKind::UnterminatedString,
                            span: Span::new(start, self.position()),
                        });
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }

        Ok(self.token_from(TokenKind::String(value), start))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position();

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // A dot only belongs to the number when a digit follows it.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[start.offset..self.pos];
        let value: f64 = text.parse().map_err(|_| LexError {
            kind: LexErrorKind::InvalidNumber(text.to_string()),
            span: Span::new(start, self.position()),
        })?;

        Ok(self.token_from(TokenKind::Number(value), start))
    }

    fn read_word(&mut self) -> Token {
        let start = self.position();

        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let word = &self.input[start.offset..self.pos];
        let kind = match word {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            _ => Keyword::from_word(word)
                .map_or_else(|| TokenKind::Identifier(word.to_string()), TokenKind::Keyword),
        };

        self.token_from(kind, start)
    }

    fn read_operator(&mut self, ch: char) -> Result<Token, LexError> {
        let start = self.position();
        let next = self.peek_at(1);

        let (kind, width) = match (ch, next) {
            ('=', Some('=')) => (TokenKind::EqualEqual, 2),
            ('!', Some('=')) => (TokenKind::BangEqual, 2),
            ('<', Some('=')) => (TokenKind::LessEqual, 2),
            ('>', Some('=')) => (TokenKind::GreaterEqual, 2),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('=', _) => (TokenKind::Equal, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('<', _) => (TokenKind::Less, 1),
            ('>', _) => (TokenKind::Greater, 1),
            ('|', _) => (TokenKind::Pipe, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('(', _) => (TokenKind::LeftParen, 1),
            (')', _) => (TokenKind::RightParen, 1),
            ('{', _) => (TokenKind::LeftBrace, 1),
            ('}', _) => (TokenKind::RightBrace, 1),
            ('[', _) => (TokenKind::LeftBracket, 1),
            (']', _) => (TokenKind::RightBracket, 1),
            (',', _) => (TokenKind::Comma, 1),
            (':', _) => (TokenKind::Colon, 1),
            _ => {
                self.advance();
                return Err(LexError {
                    kind: LexErrorKind::UnexpectedCharacter(ch),
                    span: Span::new(start, self.position()),
                });
            }
        };

        for _ in 0..width {
            self.advance();
        }

        Ok(self.token_from(kind, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("should tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_input_is_single_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn let_statement() {
        assert_eq!(
            kinds("let x = 10 + 20"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Identifier("x".to_string()),
                TokenKind::Equal,
                TokenKind::Number(10.0),
                TokenKind::Plus,
                TokenKind::Number(20.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn template_markers_win_over_braces() {
        assert_eq!(
            kinds("{{ name }}"),
            vec![
                TokenKind::TemplateOpen,
                TokenKind::Identifier("name".to_string()),
                TokenKind::TemplateClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("== != <= >= && || | < > = !"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Pipe,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_without_trailing_dot() {
        let tokens = kinds("2.5 7");
        assert_eq!(tokens[0], TokenKind::Number(2.5));
        assert_eq!(tokens[1], TokenKind::Number(7.0));
        assert!(matches!(
            tokenize("7.").unwrap_err().kind,
            LexErrorKind::UnexpectedCharacter('.')
        ));
    }

    #[test]
    fn string_escapes_and_quotes() {
        let tokens = tokenize(r#"'it\'s' "a\tb\n""#).expect("should tokenize");
        assert_eq!(tokens[0].kind, TokenKind::String("it's".to_string()));
        assert_eq!(tokens[0].lexeme, r"'it\'s'");
        assert_eq!(tokens[1].kind, TokenKind::String("a\tb\n".to_string()));
    }

    #[test]
    fn unterminated_string_spans_from_quote() {
        let err = tokenize("let s = \"oops").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span.start.column, 9);
        assert_eq!(err.span.start.offset, 8);
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("let a = 1 @ 2").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
        assert_eq!(err.span.start.column, 11);
        assert_eq!(err.span.end.column, 12);
    }

    #[test]
    fn keywords_and_literals() {
        assert_eq!(
            kinds("bsl true null in"),
            vec![
                TokenKind::Keyword(Keyword::Bsl),
                TokenKind::Boolean(true),
                TokenKind::Null,
                TokenKind::Identifier("in".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a // note\nb"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Newline,
                TokenKind::Identifier("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn span_tracking() {
        let tokens = tokenize("a\nb c").expect("should tokenize");
        assert_eq!(tokens[0].span.start.line, 1);
        assert_eq!(tokens[0].span.start.column, 1);
        // newline token
        assert_eq!(tokens[1].span.start.line, 1);
        assert_eq!(tokens[2].span.start.line, 2);
        assert_eq!(tokens[2].span.start.column, 1);
        assert_eq!(tokens[3].span.start.column, 3);
        assert_eq!(tokens[3].span.start.offset, 4);
    }

    #[test]
    fn multibyte_columns_count_chars() {
        let tokens = tokenize("\"é\" x").expect("should tokenize");
        assert_eq!(tokens[1].span.start.column, 5);
        assert_eq!(tokens[1].span.start.offset, 5);
    }
}
