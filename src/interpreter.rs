//! Tree-walking evaluator.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{BinaryOp, Expr, Literal, Program, Stmt, TemplatePart, UnaryOp};
use crate::builtins;
use crate::environment::{Env, Environment, Frames};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::token::Span;
use crate::value::{Builtin, Function, Value};

/// Classifies a runtime error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedVariable(String),
    /// Binary operator applied to operand types it does not support.
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    /// Unary operator applied to an operand type it does not support.
    UnsupportedOperand {
        op: &'static str,
        operand: &'static str,
    },
    DivisionByZero,
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    NotCallable(&'static str),
    NotIterable(&'static str),
    UnknownFilter(String),
    BuiltinArity {
        name: &'static str,
        expected: &'static str,
        found: usize,
    },
    BuiltinType {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable(name) => write!(f, "Undefined variable: {name}"),
            Self::UnsupportedOperands { op, left, right } => {
                write!(f, "Cannot apply '{op}' to {left} and {right}")
            }
            Self::UnsupportedOperand { op, operand } => {
                write!(f, "Cannot apply '{op}' to {operand}")
            }
            Self::DivisionByZero => write!(f, "Division by zero"),
            Self::ArityMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Function '{name}' expects {expected} argument(s), got {found}"
            ),
            Self::NotCallable(type_name) => {
                write!(f, "Value of type {type_name} is not callable")
            }
            Self::NotIterable(type_name) => write!(f, "Cannot iterate over {type_name}"),
            Self::UnknownFilter(name) => write!(f, "Unknown filter: {name}"),
            Self::BuiltinArity {
                name,
                expected,
                found,
            } => write!(f, "{name} expects {expected}, got {found}"),
            Self::BuiltinType {
                name,
                expected,
                found,
            } => write!(f, "{name} expects {expected}, got {found}"),
        }
    }
}

impl RuntimeErrorKind {
    /// Stable identifier used by editor diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UndefinedVariable(_) => "undefined-variable",
            Self::UnsupportedOperands { .. } | Self::UnsupportedOperand { .. } => {
                "unsupported-operand"
            }
            Self::DivisionByZero => "division-by-zero",
            Self::ArityMismatch { .. } | Self::BuiltinArity { .. } => "arity-mismatch",
            Self::NotCallable(_) => "not-callable",
            Self::NotIterable(_) => "not-iterable",
            Self::UnknownFilter(_) => "unknown-filter",
            Self::BuiltinType { .. } => "builtin-type",
        }
    }
}

/// Error produced while evaluating a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", location(.span.as_ref()))]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Option<Span>,
}

fn location(span: Option<&Span>) -> String {
    span.map_or_else(String::new, |s| format!(" at {s}"))
}

impl RuntimeError {
    const fn at(kind: RuntimeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }
}

type EvalResult<T> = Result<T, RuntimeError>;

/// How a statement finished.
enum Flow {
    Normal(Value),
    Return(Value),
}

/// Evaluates Note G programs.
///
/// The interpreter owns a global environment that persists across calls
/// to [`Interpreter::run`], so bindings from one program are visible to
/// the next. Output from `print` is buffered, not written to stdout.
pub struct Interpreter {
    globals: Env,
    env: Env,
    builtins: HashMap<&'static str, Builtin>,
    output: String,
    exports: Vec<String>,
    frames: Frames,
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        let globals = Environment::global();
        Self {
            env: Rc::clone(&globals),
            globals,
            builtins: builtins::table(),
            output: String::new(),
            exports: Vec::new(),
            frames: Frames::new(),
        }
    }

    /// Bind a value in the global environment.
    pub fn define(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    /// Look up a name as the program would see it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.env
            .borrow()
            .get(name)
            .or_else(|| self.builtins.get(name).copied().map(Value::Builtin))
    }

    /// Text written by `print` so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Return and clear the buffered `print` output.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Names recorded by `export` statements, in order.
    #[must_use]
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// Tokenize, parse, and evaluate `source`.
    ///
    /// Returns the value of the final statement.
    ///
    /// # Errors
    ///
    /// Returns the first lexer, parser, or runtime error.
    pub fn run(&mut self, source: &str) -> Result<Value, Error> {
        let tokens = tokenize(source)?;
        let program = parse(&tokens)?;
        Ok(self.eval_program(&program)?)
    }

    /// Evaluate `source` and convert its result to a string.
    ///
    /// # Errors
    ///
    /// Returns the first lexer, parser, or runtime error.
    pub fn render(&mut self, source: &str) -> Result<String, Error> {
        self.run(source).map(|value| value.to_string())
    }

    /// Evaluate every statement of `program` in order.
    ///
    /// # Errors
    ///
    /// Returns the first runtime error; remaining statements are skipped.
    pub fn eval_program(&mut self, program: &Program) -> EvalResult<Value> {
        tracing::debug!(
            statements = program.statements.len(),
            "evaluating program"
        );
        let result = self.exec_block(&program.statements);
        self.frames.collect();
        match result? {
            Flow::Normal(value) | Flow::Return(value) => Ok(value),
        }
    }

    fn exec_block(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        let mut last = Value::Null;
        for statement in statements {
            match self.exec(statement)? {
                Flow::Normal(value) => last = value,
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec(&mut self, statement: &Stmt) -> EvalResult<Flow> {
        match statement {
            Stmt::Let { name, value, .. } => {
                let value = self.eval(value)?;
                self.env.borrow_mut().define(name, value);
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Expr(expr) => self.eval(expr).map(Flow::Normal),
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }
            Stmt::For {
                var,
                iterable,
                body,
                span,
            } => self.exec_for(var, iterable, body, *span),
            Stmt::While { condition, body } => {
                let mut last = Value::Null;
                while self.eval(condition)?.is_truthy() {
                    match self.exec_block(body)? {
                        Flow::Normal(value) => last = value,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal(last))
            }
            Stmt::Function { name, params, body } | Stmt::Component {
                name,
                props: params,
                body,
            } => {
                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(&self.env),
                };
                self.env
                    .borrow_mut()
                    .define(name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Import { path, names } => {
                tracing::debug!(%path, ?names, "import is not resolved");
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Export { name, span } => {
                if self.get(name).is_none() {
                    return Err(RuntimeError::at(
                        RuntimeErrorKind::UndefinedVariable(name.clone()),
                        *span,
                    ));
                }
                self.exports.push(name.clone());
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Accessibility { kind, metadata } => {
                let value = self.eval(metadata)?;
                Ok(Flow::Normal(Value::Accessible {
                    kind: *kind,
                    value: Box::new(value),
                }))
            }
        }
    }

    /// The loop variable is rebound in the enclosing environment on every
    /// iteration; closures created in the body see its final value.
    fn exec_for(
        &mut self,
        var: &str,
        iterable: &Expr,
        body: &[Stmt],
        span: Span,
    ) -> EvalResult<Flow> {
        let items = match self.eval(iterable)? {
            Value::Array(items) => items,
            other => {
                return Err(RuntimeError::at(
                    RuntimeErrorKind::NotIterable(other.type_name()),
                    span,
                ));
            }
        };

        let mut last = Value::Null;
        for item in items {
            self.env.borrow_mut().define(var, item);
            match self.exec_block(body)? {
                Flow::Normal(value) => last = value,
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Identifier { name, span } => self.get(name).ok_or_else(|| {
                RuntimeError::at(RuntimeErrorKind::UndefinedVariable(name.clone()), *span)
            }),
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                // Both operands are always evaluated, including for && and ||.
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                if *op == BinaryOp::Pipe {
                    return self.call_value(right, vec![left], *span);
                }
                binary(*op, &left, &right).map_err(|kind| RuntimeError::at(kind, *span))
            }
            Expr::Unary { op, operand, span } => {
                let operand = self.eval(operand)?;
                unary(*op, &operand).map_err(|kind| RuntimeError::at(kind, *span))
            }
            Expr::Call { callee, args, span } => {
                let callee = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call_value(callee, args, *span)
            }
            Expr::Template(parts) => self.eval_template(parts),
            Expr::Accessibility { kind, content } => Ok(Value::Accessible {
                kind: *kind,
                value: Box::new(self.eval(content)?),
            }),
            Expr::Array(elements) => elements
                .iter()
                .map(|element| self.eval(element))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),
            Expr::Object(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn eval_template(&mut self, parts: &[TemplatePart]) -> EvalResult<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Expr(expr) => out.push_str(&self.eval(expr)?.to_string()),
                TemplatePart::Filtered { expr, filter, span } => {
                    let value = self.eval(expr)?;
                    let Some(func) = self.get(filter) else {
                        return Err(RuntimeError::at(
                            RuntimeErrorKind::UnknownFilter(filter.clone()),
                            *span,
                        ));
                    };
                    out.push_str(&self.call_value(func, vec![value], *span)?.to_string());
                }
            }
        }
        Ok(Value::String(out))
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(&function, args, span),
            Value::Builtin(builtin) => {
                tracing::trace!(name = builtin.name, args = args.len(), "calling builtin");
                (builtin.func)(&args, &mut self.output).map_err(|kind| RuntimeError::at(kind, span))
            }
            other => Err(RuntimeError::at(
                RuntimeErrorKind::NotCallable(other.type_name()),
                span,
            )),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        if args.len() != function.params.len() {
            return Err(RuntimeError::at(
                RuntimeErrorKind::ArityMismatch {
                    name: function.name.clone(),
                    expected: function.params.len(),
                    found: args.len(),
                },
                span,
            ));
        }

        tracing::debug!(name = %function.name, args = args.len(), "calling function");

        // The call environment extends the closure, not the caller.
        let call_env = Environment::child(&function.closure);
        {
            let mut env = call_env.borrow_mut();
            for (param, arg) in function.params.iter().zip(args) {
                env.define(param, arg);
            }
        }

        self.frames.track(&call_env);
        let caller = std::mem::replace(&mut self.env, call_env);
        let result = self.exec_block(&function.body);
        self.env = caller;
        if self.frames.due() {
            self.frames.collect();
        }

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Null),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Functions stored in the globals hold the globals as their
        // closure; clearing breaks that cycle. Call frames that only
        // survived through the globals go next.
        self.globals.borrow_mut().clear();
        self.frames.collect();
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let unsupported = || RuntimeErrorKind::UnsupportedOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    };

    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::String(a), b) => Ok(Value::String(format!("{a}{b}"))),
            (a, Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => Err(unsupported()),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(unsupported());
            };
            match op {
                BinaryOp::Sub => Ok(Value::Number(a - b)),
                BinaryOp::Mul => Ok(Value::Number(a * b)),
                _ if *b == 0.0 => Err(RuntimeErrorKind::DivisionByZero),
                _ => Ok(Value::Number(a / b)),
            }
        }
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                // UTF-16 code unit order, matching the JavaScript target.
                (Value::String(a), Value::String(b)) => {
                    Some(a.encode_utf16().cmp(b.encode_utf16()))
                }
                _ => return Err(unsupported()),
            };
            let result = ordering.is_some_and(|ordering| match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::LessEq => ordering.is_le(),
                BinaryOp::Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            });
            Ok(Value::Bool(result))
        }
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOp::Pipe => Err(unsupported()),
    }
}

fn unary(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeErrorKind> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Neg, other) => Err(RuntimeErrorKind::UnsupportedOperand {
            op: op.symbol(),
            operand: other.type_name(),
        }),
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
    }
}
