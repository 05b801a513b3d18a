//! Pretty-printer that serializes a Note G AST back into canonical source.
//!
//! Produces tab-indented output with blank lines around block statements
//! and the minimum parentheses needed to parse back to the same tree.

use std::fmt::{self, Write as _};

use crate::ast::{Expr, Literal, Program, Stmt, TemplatePart};
use crate::value::format_number;

/// Format a `Program` into canonical Note G source.
///
/// Uses tab-based indentation, one statement per line, and blank lines
/// before and after statements that own a block.
#[must_use]
pub fn format(program: &Program) -> String {
    let mut out = String::new();
    format_statements(&mut out, &program.statements, 0);

    // Trailing newline
    if !out.ends_with('\n') {
        out.push('\n');
    }

    out
}

/// Format statements with blank lines around statements that have
/// blocks.
fn format_statements(out: &mut String, statements: &[Stmt], indent: usize) {
    let mut prev_had_block = false;

    for (i, stmt) in statements.iter().enumerate() {
        let has_block = stmt.has_block();

        if i > 0 && (has_block || prev_had_block) {
            out.push('\n');
        }

        format_statement(out, stmt, indent);
        prev_had_block = has_block;
    }
}

fn format_statement(out: &mut String, stmt: &Stmt, indent: usize) {
    let prefix = "\t".repeat(indent);
    out.push_str(&prefix);

    match stmt {
        Stmt::Let {
            name,
            mutable,
            value,
        } => {
            let keyword = if *mutable { "let" } else { "const" };
            let _ = writeln!(out, "{keyword} {name} = {value}");
        }
        Stmt::Expr(expr) => {
            let _ = writeln!(out, "{expr}");
        }
        Stmt::If {
            condition,
            then_block,
            else_block,
        } => {
            let _ = write!(out, "if {condition} ");
            format_block(out, then_block, indent);
            format_else(out, else_block.as_deref(), indent);
            out.push('\n');
        }
        Stmt::For {
            var,
            iterable,
            body,
            ..
        } => {
            let _ = write!(out, "for {var} in {iterable} ");
            format_block(out, body, indent);
            out.push('\n');
        }
        Stmt::While { condition, body } => {
            let _ = write!(out, "while {condition} ");
            format_block(out, body, indent);
            out.push('\n');
        }
        Stmt::Function { name, params, body } => {
            let _ = write!(out, "function {name}({}) ", params.join(", "));
            format_block(out, body, indent);
            out.push('\n');
        }
        Stmt::Component { name, props, body } => {
            let _ = write!(out, "component {name}({}) ", props.join(", "));
            format_block(out, body, indent);
            out.push('\n');
        }
        Stmt::Return(None) => out.push_str("return\n"),
        Stmt::Return(Some(expr)) => {
            let _ = writeln!(out, "return {expr}");
        }
        Stmt::Import { path, names } => {
            let _ = writeln!(
                out,
                "import {{ {} }} from {}",
                names.join(", "),
                quote(path)
            );
        }
        Stmt::Export { name, .. } => {
            let _ = writeln!(out, "export {name}");
        }
        Stmt::Accessibility { kind, metadata } => {
            let _ = writeln!(out, "accessibility {kind} {metadata}");
        }
    }
}

/// Writes `{ ... }` without a trailing newline.
fn format_block(out: &mut String, statements: &[Stmt], indent: usize) {
    out.push_str("{\n");
    format_statements(out, statements, indent + 1);
    out.push_str(&"\t".repeat(indent));
    out.push('}');
}

fn format_else(out: &mut String, else_block: Option<&[Stmt]>, indent: usize) {
    let Some(else_block) = else_block else {
        return;
    };

    // A lone nested `if` prints back as `else if`.
    if let [
        Stmt::If {
            condition,
            then_block,
            else_block,
        },
    ] = else_block
    {
        let _ = write!(out, " else if {condition} ");
        format_block(out, then_block, indent);
        format_else(out, else_block.as_deref(), indent);
        return;
    }

    out.push_str(" else ");
    format_block(out, else_block, indent);
}

/// Quote a string with `"`, escaping what the lexer unescapes.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Binding strength of an expression as an operand.
///
/// Accessibility expressions swallow everything to their right, so they
/// bind loosest of all.
const fn strength(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => 7,
        Expr::Accessibility { .. } => 0,
        _ => 10,
    }
}

/// Printing context: inside `{{ }}` a bare pipe would read as a filter.
#[derive(Clone, Copy)]
struct Ctx {
    in_group: bool,
}

impl Ctx {
    const TOP: Self = Self { in_group: false };
    const GROUP: Self = Self { in_group: true };
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr, ctx: Ctx) -> fmt::Result {
    match expr {
        Expr::Literal(literal) => write_literal(f, literal),
        Expr::Identifier { name, .. } => f.write_str(name),
        Expr::Binary {
            op, left, right, ..
        } => {
            let pipe_in_group = ctx.in_group && *op == crate::ast::BinaryOp::Pipe;
            if pipe_in_group {
                f.write_str("(")?;
            }
            let inner = if pipe_in_group { Ctx::TOP } else { ctx };
            let p = op.precedence();
            write_operand(f, left, strength(left) < p, inner)?;
            write!(f, " {op} ")?;
            write_operand(f, right, strength(right) <= p, inner)?;
            if pipe_in_group {
                f.write_str(")")?;
            }
            Ok(())
        }
        Expr::Unary { op, operand, .. } => {
            f.write_str(op.symbol())?;
            write_operand(f, operand, strength(operand) < 7, ctx)
        }
        Expr::Call { callee, args, .. } => {
            write_operand(f, callee, strength(callee) < 10, ctx)?;
            f.write_str("(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, arg, Ctx::TOP)?;
            }
            f.write_str(")")
        }
        Expr::Template(parts) => write_template(f, parts),
        Expr::Accessibility { kind, content } => {
            write!(f, "{kind} ")?;
            write_expr(f, content, ctx)
        }
        Expr::Array(elements) => {
            f.write_str("[")?;
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, element, Ctx::TOP)?;
            }
            f.write_str("]")
        }
        Expr::Object(entries) => {
            if entries.is_empty() {
                return f.write_str("{}");
            }
            // Spaces inside the braces keep `{{` and `}}` from forming.
            f.write_str("{ ")?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: ", quote_key(key))?;
                write_expr(f, value, Ctx::TOP)?;
            }
            f.write_str(" }")
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool, ctx: Ctx) -> fmt::Result {
    if parens {
        f.write_str("(")?;
        write_expr(f, expr, Ctx::TOP)?;
        f.write_str(")")
    } else {
        write_expr(f, expr, ctx)
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, literal: &Literal) -> fmt::Result {
    match literal {
        Literal::Null => f.write_str("null"),
        Literal::Bool(b) => write!(f, "{b}"),
        Literal::Number(n) => f.write_str(&number_literal(*n)),
        Literal::String(s) => f.write_str(&quote(s)),
    }
}

/// Source text for a number literal. The lexer has no exponent syntax,
/// so finite values are always written positionally.
fn number_literal(n: f64) -> String {
    if n.is_finite() && n != 0.0 {
        n.to_string()
    } else {
        format_number(n)
    }
}

fn write_template(f: &mut fmt::Formatter<'_>, parts: &[TemplatePart]) -> fmt::Result {
    if parts.is_empty() {
        return f.write_str("\"\"");
    }

    // Without a leading `{{` (or a string then `{{`) the parser would
    // not see a template; spell it out.
    let implicit = match parts {
        [TemplatePart::Text(_), TemplatePart::Expr(_) | TemplatePart::Filtered { .. }, ..]
        | [TemplatePart::Expr(_) | TemplatePart::Filtered { .. }, ..] => true,
        _ => false,
    };
    if !implicit {
        f.write_str("template ")?;
    }

    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        match part {
            TemplatePart::Text(text) => f.write_str(&quote(text))?,
            TemplatePart::Expr(expr) => {
                f.write_str("{{ ")?;
                write_expr(f, expr, Ctx::GROUP)?;
                f.write_str(" }}")?;
            }
            TemplatePart::Filtered { expr, filter, .. } => {
                f.write_str("{{ ")?;
                write_expr(f, expr, Ctx::GROUP)?;
                write!(f, " | {filter} }}}}")?;
            }
        }
    }
    Ok(())
}

fn quote_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_name = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && crate::token::Keyword::from_word(key).is_none()
        && !matches!(key, "true" | "false" | "null");
    if is_name { key.to_string() } else { quote(key) }
}

/// Canonical source form of an expression.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, Ctx::TOP)
    }
}
