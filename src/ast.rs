use std::fmt;
use std::rc::Rc;

use crate::token::{Keyword, Span};

/// Complete Note G program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = value` or `const name = value`.
    Let {
        name: String,
        mutable: bool,
        value: Expr,
    },
    /// Bare expression.
    Expr(Expr),
    If {
        condition: Expr,
        then_block: Vec<Self>,
        else_block: Option<Vec<Self>>,
    },
    /// `for var in iterable { body }`.
    For {
        var: String,
        iterable: Expr,
        body: Vec<Self>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Self>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Rc<[Self]>,
    },
    Return(Option<Expr>),
    /// `import { names } from "path"`.
    Import {
        path: String,
        names: Vec<String>,
    },
    Export {
        name: String,
        span: Span,
    },
    /// UI component; evaluates like a function.
    Component {
        name: String,
        props: Vec<String>,
        body: Rc<[Self]>,
    },
    /// `accessibility <kind> metadata`.
    Accessibility {
        kind: AccessibilityKind,
        metadata: Expr,
    },
}

impl Stmt {
    /// Whether the statement owns a brace-delimited block.
    #[must_use]
    pub const fn has_block(&self) -> bool {
        matches!(
            self,
            Self::If { .. }
                | Self::For { .. }
                | Self::While { .. }
                | Self::Function { .. }
                | Self::Component { .. }
        )
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier {
        name: String,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Self>,
        span: Span,
    },
    Call {
        callee: Box<Self>,
        args: Vec<Self>,
        span: Span,
    },
    Template(Vec<TemplatePart>),
    /// Content wrapped for a sign-language or Makaton rendering.
    Accessibility {
        kind: AccessibilityKind,
        content: Box<Self>,
    },
    Array(Vec<Self>),
    /// Object literal; keys keep their source order.
    Object(Vec<(String, Self)>),
}

/// Literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// One piece of a template expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Raw text copied verbatim.
    Text(String),
    /// `{{ expr }}`
    Expr(Expr),
    /// `{{ expr | filter }}`
    Filtered {
        expr: Expr,
        filter: String,
        span: Span,
    },
}

/// Binary operators, including the pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Pipe,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Pipe => "|",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq => 3,
            Self::Less | Self::LessEq | Self::Greater | Self::GreaterEq => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div => 6,
            Self::Pipe => 8,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Sign-language and symbol-system renderings.
///
/// The language code and CSS class are an external contract shared by the
/// compiler, the interpreter's accessible values, and the bounded template
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessibilityKind {
    /// British Sign Language.
    Bsl,
    /// German Sign Language.
    Gsl,
    /// American Sign Language.
    Asl,
    Makaton,
}

impl AccessibilityKind {
    pub const ALL: [Self; 4] = [Self::Bsl, Self::Gsl, Self::Asl, Self::Makaton];

    /// ISO 639-3 language code.
    #[must_use]
    pub const fn iso_code(self) -> &'static str {
        match self {
            Self::Bsl => "bfi",
            Self::Gsl => "gsg",
            Self::Asl => "ase",
            Self::Makaton => "en",
        }
    }

    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Bsl => "a11y-bsl",
            Self::Gsl => "a11y-gsl",
            Self::Asl => "a11y-asl",
            Self::Makaton => "a11y-makaton",
        }
    }

    /// Source keyword (`bsl`, `gsl`, `asl`, `makaton`).
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Bsl => "bsl",
            Self::Gsl => "gsl",
            Self::Asl => "asl",
            Self::Makaton => "makaton",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bsl => "British Sign Language",
            Self::Gsl => "German Sign Language",
            Self::Asl => "American Sign Language",
            Self::Makaton => "Makaton",
        }
    }

    #[must_use]
    pub const fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Bsl => Some(Self::Bsl),
            Keyword::Gsl => Some(Self::Gsl),
            Keyword::Asl => Some(Self::Asl),
            Keyword::Makaton => Some(Self::Makaton),
            _ => None,
        }
    }

    /// Wrap already-escaped markup in an element carrying this kind's
    /// language code and CSS class.
    #[must_use]
    pub fn wrap_html(self, tag: &str, inner: &str) -> String {
        format!(
            "<{tag} class=\"{}\" lang=\"{}\" aria-label=\"{}\">{inner}</{tag}>",
            self.css_class(),
            self.iso_code(),
            self.label(),
        )
    }
}

impl fmt::Display for AccessibilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
