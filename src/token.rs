use std::fmt;

/// A point in the source text.
///
/// `line` and `column` are 1-based, `column` counts characters.
/// `offset` is the byte offset from the start of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

/// Source range for error reporting. `end` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.start.line, self.start.column)
    }
}

/// Reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Let,
    Const,
    If,
    Else,
    For,
    While,
    Function,
    Return,
    Import,
    Export,
    Template,
    Component,
    Accessibility,
    Bsl,
    Gsl,
    Asl,
    Makaton,
}

impl Keyword {
    /// Look up a keyword by its source spelling.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "let" => Self::Let,
            "const" => Self::Const,
            "if" => Self::If,
            "else" => Self::Else,
            "for" => Self::For,
            "while" => Self::While,
            "function" => Self::Function,
            "return" => Self::Return,
            "import" => Self::Import,
            "export" => Self::Export,
            "template" => Self::Template,
            "component" => Self::Component,
            "accessibility" => Self::Accessibility,
            "bsl" => Self::Bsl,
            "gsl" => Self::Gsl,
            "asl" => Self::Asl,
            "makaton" => Self::Makaton,
            _ => return None,
        };
        Some(keyword)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Const => "const",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::While => "while",
            Self::Function => "function",
            Self::Return => "return",
            Self::Import => "import",
            Self::Export => "export",
            Self::Template => "template",
            Self::Component => "component",
            Self::Accessibility => "accessibility",
            Self::Bsl => "bsl",
            Self::Gsl => "gsl",
            Self::Asl => "asl",
            Self::Makaton => "makaton",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// End of input. Always the last token.
    Eof,
    /// Line separator; statements end at newlines.
    Newline,
    /// String literal with escapes already decoded.
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Identifier(String),
    Keyword(Keyword),
    Plus,
    Minus,
    Star,
    Slash,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `|`
    Pipe,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    /// `{{`
    TemplateOpen,
    /// `}}`
    TemplateClose,
}

impl TokenKind {
    /// Short human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Eof => "end of input".to_string(),
            Self::Newline => "newline".to_string(),
            Self::String(_) => "string".to_string(),
            Self::Number(_) => "number".to_string(),
            Self::Boolean(_) => "boolean".to_string(),
            Self::Null => "'null'".to_string(),
            Self::Identifier(name) => format!("identifier '{name}'"),
            Self::Keyword(k) => format!("keyword '{k}'"),
            other => format!("'{}'", other.symbol()),
        }
    }

    const fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Equal => "=",
            Self::EqualEqual => "==",
            Self::Bang => "!",
            Self::BangEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Pipe => "|",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::TemplateOpen => "{{",
            Self::TemplateClose => "}}",
            _ => "",
        }
    }
}

/// A single token with its kind, source text, and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}
