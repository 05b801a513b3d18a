use std::fmt;
use std::rc::Rc;

use crate::ast::{
    AccessibilityKind, BinaryOp, Expr, Literal, Program, Stmt, TemplatePart, UnaryOp,
};
use crate::token::{Keyword, Span, Token, TokenKind};

static EOF: TokenKind = TokenKind::Eof;
static RIGHT_BRACE: TokenKind = TokenKind::RightBrace;

/// Deepest expression and block nesting the parser accepts.
pub const MAX_NESTING: usize = 48;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was required.
    ExpectedToken { expected: String, found: String },
    /// An expression was required.
    ExpectedExpression { found: String },
    /// A name was required (variable, parameter, function, filter...).
    ExpectedIdentifier { context: &'static str, found: String },
    /// `for x` not followed by `in`.
    ExpectedIn { found: String },
    /// `import { ... }` not followed by `from`.
    ExpectedFrom { found: String },
    /// `import { ... } from` not followed by a string path.
    ExpectedPath { found: String },
    /// `accessibility` not followed by `bsl`, `gsl`, `asl` or `makaton`.
    ExpectedAccessibilityKind { found: String },
    /// `template` not followed by a template expression.
    ExpectedTemplate { found: String },
    /// Object literal key that is neither a name nor a string.
    InvalidObjectKey { found: String },
    /// Trailing tokens after a complete statement.
    ExpectedStatementEnd { found: String },
    /// Brackets, blocks or prefix operators nested past [`MAX_NESTING`].
    NestingTooDeep,
}

impl ParseErrorKind {
    /// Stable identifier used by editor diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ExpectedToken { .. } => "expected-token",
            Self::ExpectedExpression { .. } => "expected-expression",
            Self::ExpectedIdentifier { .. } => "expected-identifier",
            Self::ExpectedIn { .. } => "expected-in",
            Self::ExpectedFrom { .. } => "expected-from",
            Self::ExpectedPath { .. } => "expected-path",
            Self::ExpectedAccessibilityKind { .. } => "expected-accessibility-kind",
            Self::ExpectedTemplate { .. } => "expected-template",
            Self::InvalidObjectKey { .. } => "invalid-object-key",
            Self::ExpectedStatementEnd { .. } => "expected-statement-end",
            Self::NestingTooDeep => "nesting-too-deep",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedToken { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Self::ExpectedExpression { found } => {
                write!(f, "expected expression, got {found}")
            }
            Self::ExpectedIdentifier { context, found } => {
                write!(f, "expected {context}, got {found}")
            }
            Self::ExpectedIn { found } => {
                write!(f, "expected 'in' after loop variable, got {found}")
            }
            Self::ExpectedFrom { found } => {
                write!(f, "expected 'from' after import list, got {found}")
            }
            Self::ExpectedPath { found } => {
                write!(f, "expected import path string, got {found}")
            }
            Self::ExpectedAccessibilityKind { found } => {
                write!(
                    f,
                    "expected one of 'bsl', 'gsl', 'asl', 'makaton', got {found}"
                )
            }
            Self::ExpectedTemplate { found } => {
                write!(f, "expected template after 'template', got {found}")
            }
            Self::InvalidObjectKey { found } => {
                write!(f, "expected object key, got {found}")
            }
            Self::ExpectedStatementEnd { found } => {
                write!(f, "expected newline after statement, got {found}")
            }
            Self::NestingTooDeep => {
                write!(f, "nesting deeper than {MAX_NESTING} levels")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.start.line, span.start.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse a token stream into a `Program`.
///
/// # Errors
///
/// Returns the first `ParseError`; no partial AST is produced.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let program = Parser::new(tokens).parse_program()?;
    tracing::trace!(statements = program.statements.len(), "parsed program");
    Ok(program)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// False inside `{{ ... }}` where `|` introduces a filter.
    allow_pipe: bool,
    /// Set after a `}}` token closed one block; the second brace is
    /// still owed to the enclosing construct.
    pending_brace: bool,
    /// Current expression and block nesting.
    depth: usize,
}

type ParseResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            allow_pipe: true,
            pending_brace: false,
            depth: 0,
        }
    }

    fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            if self.kind() == &TokenKind::Eof {
                break;
            }
            statements.push(self.statement()?);
            self.expect_statement_end()?;
        }

        Ok(Program { statements })
    }

    // -- Statements --

    fn statement(&mut self) -> ParseResult<Stmt> {
        let keyword = match self.kind() {
            TokenKind::Keyword(k) => Some(*k),
            _ => None,
        };

        match keyword {
            Some(Keyword::Let) => self.let_statement(true),
            Some(Keyword::Const) => self.let_statement(false),
            Some(Keyword::If) => self.if_statement(),
            Some(Keyword::For) => self.for_statement(),
            Some(Keyword::While) => self.while_statement(),
            Some(Keyword::Function) => {
                let (name, params, body) = self.callable()?;
                Ok(Stmt::Function { name, params, body })
            }
            Some(Keyword::Component) => {
                let (name, props, body) = self.callable()?;
                Ok(Stmt::Component { name, props, body })
            }
            Some(Keyword::Return) => self.return_statement(),
            Some(Keyword::Import) => self.import_statement(),
            Some(Keyword::Export) => self.export_statement(),
            Some(Keyword::Accessibility) => self.accessibility_statement(),
            _ => Ok(Stmt::Expr(self.expression()?)),
        }
    }

    fn let_statement(&mut self, mutable: bool) -> ParseResult<Stmt> {
        self.advance();
        let name = self.expect_identifier("variable name")?;
        self.expect(&TokenKind::Equal, "'='")?;
        let value = self.expression()?;
        Ok(Stmt::Let {
            name,
            mutable,
            value,
        })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let condition = self.expression()?;
        let then_block = self.block()?;

        let else_block = if self.kind() == &TokenKind::Keyword(Keyword::Else) {
            self.advance();
            if self.kind() == &TokenKind::Keyword(Keyword::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_block,
            else_block,
        })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.span();
        self.advance();
        let var = self.expect_identifier("loop variable")?;

        // `in` is an ordinary identifier, not a reserved word.
        match self.token() {
            Some(tok) if matches!(tok.kind, TokenKind::Identifier(_)) && tok.lexeme == "in" => {
                self.advance();
            }
            _ => {
                return Err(self.error(ParseErrorKind::ExpectedIn {
                    found: self.kind().describe(),
                }));
            }
        }

        let iterable = self.expression()?;
        let span = start.to(self.previous_span());
        let body = self.block()?;

        Ok(Stmt::For {
            var,
            iterable,
            body,
            span,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let condition = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::While { condition, body })
    }

    /// Shared shape of `function` and `component`.
    fn callable(&mut self) -> ParseResult<(String, Vec<String>, Rc<[Stmt]>)> {
        self.advance();
        let name = self.expect_identifier("function name")?;
        self.expect(&TokenKind::LeftParen, "'('")?;

        let mut params = Vec::new();
        loop {
            self.skip_newlines();
            if self.kind() == &TokenKind::RightParen {
                break;
            }
            params.push(self.expect_identifier("parameter name")?);
            self.skip_newlines();
            if self.kind() == &TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;

        let body = self.block()?;
        Ok((name, params, Rc::from(body)))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        match self.kind() {
            TokenKind::Newline
            | TokenKind::RightBrace
            | TokenKind::TemplateClose
            | TokenKind::Eof => Ok(Stmt::Return(None)),
            _ => Ok(Stmt::Return(Some(self.expression()?))),
        }
    }

    fn import_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect(&TokenKind::LeftBrace, "'{'")?;

        let mut names = Vec::new();
        loop {
            self.skip_newlines();
            if self.kind() == &TokenKind::RightBrace {
                break;
            }
            names.push(self.expect_identifier("imported name")?);
            self.skip_newlines();
            if self.kind() == &TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;

        match self.token() {
            Some(tok) if matches!(tok.kind, TokenKind::Identifier(_)) && tok.lexeme == "from" => {
                self.advance();
            }
            _ => {
                return Err(self.error(ParseErrorKind::ExpectedFrom {
                    found: self.kind().describe(),
                }));
            }
        }

        let TokenKind::String(path) = self.kind() else {
            return Err(self.error(ParseErrorKind::ExpectedPath {
                found: self.kind().describe(),
            }));
        };
        let path = path.clone();
        self.advance();

        Ok(Stmt::Import { path, names })
    }

    fn export_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let span = self.span();
        let name = self.expect_identifier("exported name")?;
        Ok(Stmt::Export { name, span })
    }

    fn accessibility_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let kind = match self.kind() {
            TokenKind::Keyword(k) => AccessibilityKind::from_keyword(*k),
            _ => None,
        };
        let Some(kind) = kind else {
            return Err(self.error(ParseErrorKind::ExpectedAccessibilityKind {
                found: self.kind().describe(),
            }));
        };
        self.advance();
        let metadata = self.expression()?;
        Ok(Stmt::Accessibility { kind, metadata })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let statements = self.nested(Self::block_body)?;
        self.close_brace()?;
        Ok(statements)
    }

    fn block_body(&mut self) -> ParseResult<Vec<Stmt>> {

        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            match self.kind() {
                TokenKind::RightBrace | TokenKind::TemplateClose => break,
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::ExpectedToken {
                        expected: "'}'".to_string(),
                        found: TokenKind::Eof.describe(),
                    }));
                }
                _ => {}
            }
            statements.push(self.statement()?);
            self.expect_statement_end()?;
        }
        Ok(statements)
    }

    // -- Expressions --

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::or)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::and, |kind| match kind {
            TokenKind::OrOr => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn and(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::equality, |kind| match kind {
            TokenKind::AndAnd => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::comparison, |kind| match kind {
            TokenKind::EqualEqual => Some(BinaryOp::Eq),
            TokenKind::BangEqual => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::term, |kind| match kind {
            TokenKind::Less => Some(BinaryOp::Less),
            TokenKind::LessEqual => Some(BinaryOp::LessEq),
            TokenKind::Greater => Some(BinaryOp::Greater),
            TokenKind::GreaterEqual => Some(BinaryOp::GreaterEq),
            _ => None,
        })
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::factor, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        })
    }

    fn left_assoc(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> ParseResult<Expr> {
        let start = self.span();
        let mut left = operand(self)?;

        while let Some(op) = operator(self.kind()) {
            self.advance();
            self.skip_newlines();
            let right = operand(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span: start.to(self.previous_span()),
            };
        }

        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.pipe(),
        };

        let start = self.span();
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span: start.to(self.previous_span()),
        })
    }

    fn pipe(&mut self) -> ParseResult<Expr> {
        let start = self.span();
        let mut left = self.call()?;

        while self.allow_pipe && self.kind() == &TokenKind::Pipe {
            self.advance();
            self.skip_newlines();
            let right = self.call()?;
            left = Expr::Binary {
                op: BinaryOp::Pipe,
                left: Box::new(left),
                right: Box::new(right),
                span: start.to(self.previous_span()),
            };
        }

        Ok(left)
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let start = self.span();
        let mut expr = self.primary()?;

        while self.kind() == &TokenKind::LeftParen {
            self.advance();
            let args = self.with_pipe(true, Self::arguments)?;
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
                span: start.to(self.previous_span()),
            };
        }

        Ok(expr)
    }

    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        loop {
            self.skip_newlines();
            if self.kind() == &TokenKind::RightParen {
                break;
            }
            args.push(self.expression()?);
            self.skip_newlines();
            if self.kind() == &TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(args)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let span = self.span();

        match self.kind() {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) => {
                if self.kind_at(1) == &TokenKind::TemplateOpen {
                    return self.template();
                }
                let s = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Boolean(b) => {
                let b = *b;
                self.advance();
                Ok(Expr::Literal(Literal::Bool(b)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::Identifier { name, span })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.with_pipe(true, |p| {
                    p.skip_newlines();
                    let expr = p.expression()?;
                    p.skip_newlines();
                    Ok(expr)
                })?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.array(),
            TokenKind::LeftBrace => self.object(),
            TokenKind::TemplateOpen => self.template(),
            TokenKind::Keyword(Keyword::Template) => {
                self.advance();
                match self.kind() {
                    TokenKind::String(_) | TokenKind::TemplateOpen => self.template(),
                    other => Err(self.error(ParseErrorKind::ExpectedTemplate {
                        found: other.describe(),
                    })),
                }
            }
            TokenKind::Keyword(k) => {
                let Some(kind) = AccessibilityKind::from_keyword(*k) else {
                    return Err(self.error(ParseErrorKind::ExpectedExpression {
                        found: self.kind().describe(),
                    }));
                };
                self.advance();
                let content = self.expression()?;
                Ok(Expr::Accessibility {
                    kind,
                    content: Box::new(content),
                })
            }
            other => Err(self.error(ParseErrorKind::ExpectedExpression {
                found: other.describe(),
            })),
        }
    }

    fn array(&mut self) -> ParseResult<Expr> {
        self.advance();

        let elements = self.with_pipe(true, |p| {
            let mut elements = Vec::new();
            loop {
                p.skip_newlines();
                if p.kind() == &TokenKind::RightBracket {
                    break;
                }
                elements.push(p.expression()?);
                p.skip_newlines();
                if p.kind() == &TokenKind::Comma {
                    p.advance();
                } else {
                    break;
                }
            }
            Ok(elements)
        })?;

        self.skip_newlines();
        self.expect(&TokenKind::RightBracket, "']'")?;
        Ok(Expr::Array(elements))
    }

    fn object(&mut self) -> ParseResult<Expr> {
        self.advance();

        let entries = self.with_pipe(true, |p| {
            let mut entries = Vec::new();
            loop {
                p.skip_newlines();
                let key = match p.kind() {
                    TokenKind::RightBrace | TokenKind::TemplateClose => break,
                    TokenKind::Identifier(k) | TokenKind::String(k) => k.clone(),
                    other => {
                        return Err(p.error(ParseErrorKind::InvalidObjectKey {
                            found: other.describe(),
                        }));
                    }
                };
                p.advance();
                p.expect(&TokenKind::Colon, "':'")?;
                p.skip_newlines();
                entries.push((key, p.expression()?));
                p.skip_newlines();
                if p.kind() == &TokenKind::Comma {
                    p.advance();
                } else {
                    break;
                }
            }
            Ok(entries)
        })?;

        self.skip_newlines();
        self.close_brace()?;
        Ok(Expr::Object(entries))
    }

    /// Collects raw-text and `{{ ... }}` parts until neither follows.
    fn template(&mut self) -> ParseResult<Expr> {
        let mut parts = Vec::new();

        loop {
            match self.kind() {
                TokenKind::String(text) => {
                    parts.push(TemplatePart::Text(text.clone()));
                    self.advance();
                }
                TokenKind::TemplateOpen => parts.push(self.template_group()?),
                _ => break,
            }
        }

        Ok(Expr::Template(parts))
    }

    fn template_group(&mut self) -> ParseResult<TemplatePart> {
        let start = self.span();
        self.advance();

        let expr = self.with_pipe(false, |p| {
            p.skip_newlines();
            let expr = p.expression()?;
            p.skip_newlines();
            Ok(expr)
        })?;

        if self.kind() == &TokenKind::Pipe {
            self.advance();
            let filter = self.expect_identifier("filter name")?;
            self.skip_newlines();
            self.expect(&TokenKind::TemplateClose, "'}}'")?;
            return Ok(TemplatePart::Filtered {
                expr,
                filter,
                span: start.to(self.previous_span()),
            });
        }

        self.expect(&TokenKind::TemplateClose, "'}}'")?;
        Ok(TemplatePart::Expr(expr))
    }

    // -- Token helpers --

    /// Run `f` one nesting level deeper, failing instead of recursing
    /// without bound.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(ParseErrorKind::NestingTooDeep));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn with_pipe<T>(
        &mut self,
        allow: bool,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.allow_pipe, allow);
        let result = f(self);
        self.allow_pipe = saved;
        result
    }

    fn token(&self) -> Option<&'a Token> {
        if self.pending_brace {
            return None;
        }
        self.tokens.get(self.pos)
    }

    fn kind(&self) -> &'a TokenKind {
        if self.pending_brace {
            return &RIGHT_BRACE;
        }
        self.kind_at(0)
    }

    fn kind_at(&self, n: usize) -> &'a TokenKind {
        self.tokens.get(self.pos + n).map_or(&EOF, |t| &t.kind)
    }

    fn advance(&mut self) {
        if self.pending_brace {
            self.pending_brace = false;
        } else if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or_else(Span::default, |t| t.span)
    }

    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or_else(|| self.span(), |t| t.span)
    }

    fn skip_newlines(&mut self) {
        while self.kind() == &TokenKind::Newline {
            self.advance();
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            span: self.span(),
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<()> {
        if self.kind() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::ExpectedToken {
                expected: expected.to_string(),
                found: self.kind().describe(),
            }))
        }
    }

    fn expect_identifier(&mut self, context: &'static str) -> ParseResult<String> {
        if let TokenKind::Identifier(name) = self.kind() {
            self.advance();
            Ok(name.clone())
        } else {
            Err(self.error(ParseErrorKind::ExpectedIdentifier {
                context,
                found: self.kind().describe(),
            }))
        }
    }

    /// Consume a closing `}`. A `}}` token closes this block and leaves
    /// one brace owed to the enclosing construct.
    fn close_brace(&mut self) -> ParseResult<()> {
        match self.kind() {
            TokenKind::RightBrace => {
                self.advance();
                Ok(())
            }
            TokenKind::TemplateClose => {
                self.pos += 1;
                self.pending_brace = true;
                Ok(())
            }
            other => Err(self.error(ParseErrorKind::ExpectedToken {
                expected: "'}'".to_string(),
                found: other.describe(),
            })),
        }
    }

    fn expect_statement_end(&self) -> ParseResult<()> {
        match self.kind() {
            TokenKind::Newline
            | TokenKind::Eof
            | TokenKind::RightBrace
            | TokenKind::TemplateClose => Ok(()),
            other => Err(self.error(ParseErrorKind::ExpectedStatementEnd {
                found: other.describe(),
            })),
        }
    }
}
