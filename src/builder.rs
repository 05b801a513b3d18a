//! Fluent constructors for building Note G programs in code.
//!
//! Nodes built here carry [`Span::default()`] where the parser would record
//! a source location.

use std::rc::Rc;

use crate::ast::{
    AccessibilityKind, BinaryOp, Expr, Literal, Program, Stmt, TemplatePart, UnaryOp,
};
use crate::token::Span;

impl Program {
    /// Create an empty program.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Append a statement.
    #[must_use]
    pub fn statement(mut self, stmt: Stmt) -> Self {
        self.statements.push(stmt);
        self
    }

    /// Append `let name = value`.
    #[must_use]
    pub fn let_(self, name: &str, value: Expr) -> Self {
        self.statement(Stmt::let_(name, value))
    }

    /// Append an expression statement.
    #[must_use]
    pub fn expr(self, expr: Expr) -> Self {
        self.statement(Stmt::Expr(expr))
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Stmt {
    #[must_use]
    pub fn let_(name: &str, value: Expr) -> Self {
        Self::Let {
            name: name.to_string(),
            mutable: true,
            value,
        }
    }

    #[must_use]
    pub fn const_(name: &str, value: Expr) -> Self {
        Self::Let {
            name: name.to_string(),
            mutable: false,
            value,
        }
    }

    /// `if condition { then_block }`; chain [`Stmt::else_`] for a branch.
    #[must_use]
    pub const fn if_(condition: Expr, then_block: Vec<Self>) -> Self {
        Self::If {
            condition,
            then_block,
            else_block: None,
        }
    }

    /// Attach an else block to an `if`. Other statements are returned
    /// unchanged.
    #[must_use]
    pub fn else_(self, block: Vec<Self>) -> Self {
        match self {
            Self::If {
                condition,
                then_block,
                ..
            } => Self::If {
                condition,
                then_block,
                else_block: Some(block),
            },
            other => other,
        }
    }

    #[must_use]
    pub fn for_in(var: &str, iterable: Expr, body: Vec<Self>) -> Self {
        Self::For {
            var: var.to_string(),
            iterable,
            body,
            span: Span::default(),
        }
    }

    #[must_use]
    pub const fn while_(condition: Expr, body: Vec<Self>) -> Self {
        Self::While { condition, body }
    }

    #[must_use]
    pub fn function(name: &str, params: &[&str], body: Vec<Self>) -> Self {
        Self::Function {
            name: name.to_string(),
            params: params.iter().map(ToString::to_string).collect(),
            body: Rc::from(body),
        }
    }

    #[must_use]
    pub fn component(name: &str, props: &[&str], body: Vec<Self>) -> Self {
        Self::Component {
            name: name.to_string(),
            props: props.iter().map(ToString::to_string).collect(),
            body: Rc::from(body),
        }
    }

    #[must_use]
    pub const fn return_(value: Expr) -> Self {
        Self::Return(Some(value))
    }

    #[must_use]
    pub fn import(names: &[&str], path: &str) -> Self {
        Self::Import {
            path: path.to_string(),
            names: names.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn export(name: &str) -> Self {
        Self::Export {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    #[must_use]
    pub const fn accessibility(kind: AccessibilityKind, metadata: Expr) -> Self {
        Self::Accessibility { kind, metadata }
    }
}

impl Expr {
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    #[must_use]
    pub const fn bool(b: bool) -> Self {
        Self::Literal(Literal::Bool(b))
    }

    #[must_use]
    pub const fn number(n: f64) -> Self {
        Self::Literal(Literal::Number(n))
    }

    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::Literal(Literal::String(s.to_string()))
    }

    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::Identifier {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
            span: Span::default(),
        }
    }

    /// `self | function`
    #[must_use]
    pub fn pipe(self, function: Self) -> Self {
        Self::binary(BinaryOp::Pipe, self, function)
    }

    /// Call `self` with `args`.
    #[must_use]
    pub fn call(self, args: Vec<Self>) -> Self {
        Self::Call {
            callee: Box::new(self),
            args,
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn accessible(kind: AccessibilityKind, content: Self) -> Self {
        Self::Accessibility {
            kind,
            content: Box::new(content),
        }
    }

    #[must_use]
    pub const fn array(elements: Vec<Self>) -> Self {
        Self::Array(elements)
    }

    #[must_use]
    pub fn object(entries: Vec<(&str, Self)>) -> Self {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    #[must_use]
    pub const fn template(parts: Vec<TemplatePart>) -> Self {
        Self::Template(parts)
    }
}

impl TemplatePart {
    #[must_use]
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }

    #[must_use]
    pub fn filtered(expr: Expr, filter: &str) -> Self {
        Self::Filtered {
            expr,
            filter: filter.to_string(),
            span: Span::default(),
        }
    }
}
