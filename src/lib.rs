//! Note G lexer, parser, interpreter, compiler, and formatter.
//!
//! Note G is a small template-oriented language with first-class
//! accessibility annotations. Source text is tokenized, parsed into an
//! immutable AST, and then either evaluated by a tree-walking
//! interpreter or compiled to JavaScript, HTML, or accessibility-enhanced
//! HTML.
//!
//! # Quick start
//!
//! ## Evaluate a program
//!
//! ```
//! use noteg::{Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! interp.define("name", Value::from("World"));
//! let out = interp.render("\"Hello, \" {{ name | upper }} \"!\"").unwrap();
//! assert_eq!(out, "Hello, WORLD!");
//! ```
//!
//! ## Compile to a target
//!
//! ```
//! use noteg::{Target, compile};
//!
//! let html = compile("bsl \"hello\"", Target::AccessibleHtml).unwrap();
//! assert!(html.contains("lang=\"bfi\""));
//! ```
//!
//! ## Parse and re-format
//!
//! ```
//! use noteg::{format, parse_str};
//!
//! let program = parse_str("let   x=1+2").unwrap();
//! assert_eq!(format(&program), "let x = 1 + 2\n");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod builtins;
pub mod compiler;
pub mod diagnostics;
pub mod environment;
pub mod formatter;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod synth;
pub mod token;
pub mod value;

use std::fmt;

pub use ast::{
    AccessibilityKind, BinaryOp, Expr, Literal, Program, Stmt, TemplatePart, UnaryOp,
};
pub use compiler::{CompileOptions, Target, compile, compile_program, compile_with};
pub use diagnostics::{Diagnostic, check};
pub use formatter::format;
pub use interpreter::{Interpreter, RuntimeError, RuntimeErrorKind};
pub use lexer::{LexError, LexErrorKind, tokenize};
pub use parser::{ParseError, ParseErrorKind, parse};
pub use synth::{Synth, SynthError};
pub use token::{Keyword, Position, Span, Token, TokenKind};
pub use value::Value;

/// Unified error type covering every stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// A parser error.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Parse,
    Runtime,
    /// Reserved for accessibility validation; nothing produces it yet.
    Accessibility,
    /// Reserved for static type checks; nothing produces it yet.
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lex => "lex",
            Self::Parse => "parse",
            Self::Runtime => "runtime",
            Self::Accessibility => "accessibility",
            Self::Type => "type",
        };
        f.write_str(name)
    }
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Lex(_) => ErrorKind::Lex,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Source location, when the error has one.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::Lex(err) => Some(err.span),
            Self::Parse(err) => Some(err.span),
            Self::Runtime(err) => err.span,
        }
    }

    /// Stable per-kind identifier, e.g. `unterminated-string`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Lex(err) => err.kind.code(),
            Self::Parse(err) => err.kind.code(),
            Self::Runtime(err) => err.kind.code(),
        }
    }

    /// The message without its location suffix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Lex(err) => err.kind.to_string(),
            Self::Parse(err) => err.kind.to_string(),
            Self::Runtime(err) => err.kind.to_string(),
        }
    }
}

/// Tokenize and parse a Note G source string in one step.
pub fn parse_str(input: &str) -> Result<Program, Error> {
    let tokens = tokenize(input)?;
    Ok(parse(&tokens)?)
}
