//! Source-to-source compiler for the JavaScript and HTML targets.
//!
//! Compilation is pure text generation over the AST; the only failures
//! are the lexer and parser errors of the input.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::Error;
use crate::ast::{AccessibilityKind, BinaryOp, Expr, Literal, Program, Stmt, TemplatePart, UnaryOp};
use crate::builtins::{self, escape_html};
use crate::value::format_number;

/// Output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Target {
    #[default]
    JavaScript,
    Html,
    /// HTML with a stylesheet, skip link, `main` landmark, and every
    /// accessibility construct wrapped with its language code and class.
    AccessibleHtml,
}

impl Target {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "js",
            Self::Html => "html",
            Self::AccessibleHtml => "a11y",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" | "javascript" => Ok(Self::JavaScript),
            "html" => Ok(Self::Html),
            "a11y" | "accessible-html" => Ok(Self::AccessibleHtml),
            other => Err(format!(
                "unknown target '{other}' (expected js, html or a11y)"
            )),
        }
    }
}

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub target: Target,
    /// Document title for the HTML targets.
    pub title: String,
}

impl CompileOptions {
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: Target::default(),
            title: "Note G".to_string(),
        }
    }
}

/// Compile Note G source for `target` with default options.
///
/// # Errors
///
/// Returns the lexer or parser error of `source`.
pub fn compile(source: &str, target: Target) -> Result<String, Error> {
    compile_with(source, &CompileOptions::new(target))
}

/// Compile Note G source with explicit options.
///
/// # Errors
///
/// Returns the lexer or parser error of `source`.
pub fn compile_with(source: &str, options: &CompileOptions) -> Result<String, Error> {
    let program = crate::parse_str(source)?;
    Ok(compile_program(&program, options))
}

/// Generate target text for an already-parsed program.
#[must_use]
pub fn compile_program(program: &Program, options: &CompileOptions) -> String {
    tracing::debug!(
        target_dialect = %options.target,
        statements = program.statements.len(),
        "compiling program"
    );
    match options.target {
        Target::JavaScript => JsEmitter::default().program(program),
        Target::Html => HtmlEmitter::new(false).document(program, &options.title),
        Target::AccessibleHtml => HtmlEmitter::new(true).document(program, &options.title),
    }
}

// -- JavaScript --

/// Helpers mirroring the evaluator's operator and builtin semantics.
const JS_RUNTIME: &str = r#"var __ng = (function () {
	function fail(message) {
		throw new Error(message);
	}
	function type(v) {
		if (v === null || v === undefined) return "null";
		if (Array.isArray(v)) return "array";
		if (typeof v === "boolean") return "bool";
		if (typeof v === "object" && v.__a11y) return "accessible";
		return typeof v;
	}
	function str(v) {
		if (v === null || v === undefined) return "null";
		if (typeof v === "number") return v === 0 ? "0" : String(v);
		if (typeof v === "boolean") return v ? "true" : "false";
		if (typeof v === "string") return v;
		if (Array.isArray(v)) return "[" + v.map(str).join(", ") + "]";
		if (typeof v === "function") return "<function " + (v.ngName || v.name) + ">";
		if (v.__a11y) return str(v.value);
		return "{" + Object.keys(v).sort().map(function (k) {
			return k + ": " + str(v[k]);
		}).join(", ") + "}";
	}
	function get(v, name) {
		if (v === undefined) fail("Undefined variable: " + name);
		return v;
	}
	function truthy(v) {
		if (v === null || v === undefined || v === false || v === 0 || v === "") return false;
		if (Array.isArray(v)) return v.length > 0;
		return true;
	}
	function isObject(v) {
		return v !== null && typeof v === "object" && !Array.isArray(v) && !v.__a11y;
	}
	function eq(a, b) {
		if (a === b) return true;
		if (a === undefined) a = null;
		if (b === undefined) b = null;
		if (a === b) return true;
		if (Array.isArray(a) && Array.isArray(b)) {
			return a.length === b.length && a.every(function (x, i) { return eq(x, b[i]); });
		}
		if (isObject(a) && isObject(b)) {
			var ka = Object.keys(a).sort(), kb = Object.keys(b).sort();
			return eq(ka, kb) && ka.every(function (k) { return eq(a[k], b[k]); });
		}
		if (a && b && a.__a11y && b.__a11y) return a.kind === b.kind && eq(a.value, b.value);
		return false;
	}
	function operands(op, a, b) {
		fail("Cannot apply '" + op + "' to " + type(a) + " and " + type(b));
	}
	function numeric(op, a, b) {
		if (typeof a !== "number" || typeof b !== "number") operands(op, a, b);
	}
	function add(a, b) {
		if (typeof a === "number" && typeof b === "number") return a + b;
		if (typeof a === "string" || typeof b === "string") return str(a) + str(b);
		operands("+", a, b);
	}
	function sub(a, b) { numeric("-", a, b); return a - b; }
	function mul(a, b) { numeric("*", a, b); return a * b; }
	function div(a, b) {
		numeric("/", a, b);
		if (b === 0) fail("Division by zero");
		return a / b;
	}
	function cmp(op, a, b) {
		var ok = (typeof a === "number" && typeof b === "number") ||
			(typeof a === "string" && typeof b === "string");
		if (!ok) operands(op, a, b);
		switch (op) {
			case "<": return a < b;
			case "<=": return a <= b;
			case ">": return a > b;
			default: return a >= b;
		}
	}
	function neg(a) {
		if (typeof a !== "number") fail("Cannot apply '-' to " + type(a));
		return -a;
	}
	function and(a, b) { return truthy(a) && truthy(b); }
	function or(a, b) { return truthy(a) || truthy(b); }
	function call(f, args) {
		if (typeof f !== "function") fail("Value of type " + type(f) + " is not callable");
		var result = f.apply(null, args);
		return result === undefined ? null : result;
	}
	function pipe(v, f) { return call(f, [v]); }
	function filter(name, f, v) {
		if (typeof f !== "function") fail("Unknown filter: " + name);
		return call(f, [v]);
	}
	function iter(v) {
		if (!Array.isArray(v)) fail("Cannot iterate over " + type(v));
		return v;
	}
	function arity(name, expected, found) {
		if (expected !== found) {
			fail("Function '" + name + "' expects " + expected + " argument(s), got " + found);
		}
	}
	function a11y(kind, v) { return { __a11y: true, kind: kind, value: v }; }
	function escapeHtml(s) {
		return s.replace(/&/g, "&amp;").replace(/</g, "&lt;").replace(/>/g, "&gt;")
			.replace(/"/g, "&quot;").replace(/'/g, "&#39;");
	}
	function oneString(name, args) {
		if (args.length !== 1) fail(name + " expects 1 argument, got " + args.length);
		if (typeof args[0] !== "string") fail(name + " expects a string, got " + type(args[0]));
		return args[0];
	}
	var builtins = {
		print: function print() {
			console.log(Array.prototype.map.call(arguments, str).join(" "));
			return null;
		},
		len: function len(v) {
			if (arguments.length !== 1) fail("len expects 1 argument, got " + arguments.length);
			if (typeof v === "string") return Array.from(v).length;
			if (Array.isArray(v)) return v.length;
			fail("len expects a string or array, got " + type(v));
		},
		upper: function upper() { return oneString("upper", arguments).toUpperCase(); },
		lower: function lower() { return oneString("lower", arguments).toLowerCase(); },
		escape_html: function escape_html(v) {
			if (arguments.length !== 1) fail("escape_html expects 1 argument, got " + arguments.length);
			return escapeHtml(str(v));
		},
		date: function date() {
			if (arguments.length !== 0) fail("date expects no arguments, got " + arguments.length);
			return new Date().toISOString().slice(0, 10);
		},
		join: function join(items, sep) {
			if (arguments.length !== 2) fail("join expects 2 arguments, got " + arguments.length);
			if (!Array.isArray(items)) fail("join expects an array as first argument, got " + type(items));
			if (typeof sep !== "string") fail("join expects a string separator, got " + type(sep));
			return items.map(str).join(sep);
		}
	};
	return {
		get: get, str: str, truthy: truthy, eq: eq, add: add, sub: sub, mul: mul, div: div,
		cmp: cmp, neg: neg, and: and, or: or, call: call, pipe: pipe, filter: filter,
		iter: iter, arity: arity, a11y: a11y, builtins: builtins, exports: {}
	};
})();
"#;

/// Words that cannot be used as JavaScript binding names.
const JS_RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "with", "yield", "NaN", "Infinity",
];

/// Map a Note G name to a safe JavaScript identifier.
fn js_ident(name: &str) -> String {
    if JS_RESERVED.contains(&name) || name.starts_with("__ng") {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Read a variable, failing like the evaluator when it is unbound or
/// hoisted but not yet assigned.
fn js_read(name: &str) -> String {
    let ident = js_ident(name);
    format!(
        "__ng.get(typeof {ident} === \"undefined\" ? undefined : {ident}, {})",
        js_string(name)
    )
}

/// Quote a string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Keeps `</script>` from closing an enclosing script element.
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Default)]
struct JsEmitter {
    out: String,
    indent: usize,
}

impl JsEmitter {
    fn program(mut self, program: &Program) -> String {
        self.out.push_str(JS_RUNTIME);
        let names: Vec<_> = builtins::NAMES.iter().map(|name| js_ident(name)).collect();
        let _ = writeln!(self.out, "(function () {{");
        self.indent = 1;
        self.line(&format!("var {{ {} }} = __ng.builtins;", names.join(", ")));
        self.statements(&program.statements);
        self.out.push_str("})();\n");
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.statement(stmt);
        }
    }

    fn block(&mut self, header: &str, body: &[Stmt]) {
        self.line(&format!("{header} {{"));
        self.indent += 1;
        self.statements(body);
        self.indent -= 1;
    }

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let value = expr(value);
                self.line(&format!("var {} = {value};", js_ident(name)));
            }
            Stmt::Expr(e) => self.line(&format!("{};", expr(e))),
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                self.block(&format!("if (__ng.truthy({}))", expr(condition)), then_block);
                if let Some(else_block) = else_block {
                    self.line("} else {");
                    self.indent += 1;
                    self.statements(else_block);
                    self.indent -= 1;
                }
                self.line("}");
            }
            Stmt::For {
                var,
                iterable,
                body,
                ..
            } => {
                // `var` keeps one binding for the whole loop, so closures
                // see the final element.
                let header = format!(
                    "for (var {} of __ng.iter({}))",
                    js_ident(var),
                    expr(iterable)
                );
                self.block(&header, body);
                self.line("}");
            }
            Stmt::While { condition, body } => {
                self.block(&format!("while (__ng.truthy({}))", expr(condition)), body);
                self.line("}");
            }
            Stmt::Function { name, params, body } | Stmt::Component {
                name,
                props: params,
                body,
            } => self.function(name, params, body),
            Stmt::Return(value) => {
                let value = value.as_ref().map_or_else(|| "null".to_string(), expr);
                self.line(&format!("return {value};"));
            }
            Stmt::Import { path, names } => {
                self.line(&format!("// import {{ {} }} from {}", names.join(", "), js_string(path)));
            }
            Stmt::Export { name, .. } => {
                self.line(&format!(
                    "__ng.exports[{}] = {};",
                    js_string(name),
                    js_read(name)
                ));
            }
            Stmt::Accessibility { kind, metadata } => {
                self.line(&format!(
                    "__ng.a11y({}, {});",
                    js_string(kind.keyword()),
                    expr(metadata)
                ));
            }
        }
    }

    /// Functions are bound by assignment at their statement, not hoisted,
    /// so builtins stay visible until the definition runs.
    fn function(&mut self, name: &str, params: &[String], body: &[Stmt]) {
        let ident = js_ident(name);
        let params: Vec<_> = params.iter().map(|p| js_ident(p)).collect();
        self.line(&format!(
            "var {ident} = function {ident}({}) {{",
            params.join(", ")
        ));
        self.indent += 1;
        self.line(&format!(
            "__ng.arity({}, {}, arguments.length);",
            js_string(name),
            params.len()
        ));
        self.statements(body);
        self.line("return null;");
        self.indent -= 1;
        self.line("};");
        if ident != name {
            // Printed functions show the Note G name.
            self.line(&format!("{ident}.ngName = {};", js_string(name)));
        }
    }
}

fn expr(e: &Expr) -> String {
    match e {
        Expr::Literal(literal) => match literal {
            Literal::Null => "null".to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Number(n) if n.is_sign_negative() && *n != 0.0 => {
                format!("({})", format_number(*n))
            }
            Literal::Number(n) => format_number(*n),
            Literal::String(s) => js_string(s),
        },
        Expr::Identifier { name, .. } => js_read(name),
        Expr::Binary {
            op, left, right, ..
        } => {
            let (l, r) = (expr(left), expr(right));
            match op {
                BinaryOp::Add => format!("__ng.add({l}, {r})"),
                BinaryOp::Sub => format!("__ng.sub({l}, {r})"),
                BinaryOp::Mul => format!("__ng.mul({l}, {r})"),
                BinaryOp::Div => format!("__ng.div({l}, {r})"),
                BinaryOp::Eq => format!("__ng.eq({l}, {r})"),
                BinaryOp::NotEq => format!("!__ng.eq({l}, {r})"),
                BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
                    format!("__ng.cmp(\"{}\", {l}, {r})", op.symbol())
                }
                BinaryOp::And => format!("__ng.and({l}, {r})"),
                BinaryOp::Or => format!("__ng.or({l}, {r})"),
                BinaryOp::Pipe => format!("__ng.pipe({l}, {r})"),
            }
        }
        Expr::Unary { op, operand, .. } => match op {
            UnaryOp::Neg => format!("__ng.neg({})", expr(operand)),
            UnaryOp::Not => format!("!__ng.truthy({})", expr(operand)),
        },
        Expr::Call { callee, args, .. } => {
            let args: Vec<_> = args.iter().map(expr).collect();
            format!("__ng.call({}, [{}])", expr(callee), args.join(", "))
        }
        Expr::Template(parts) => template(parts),
        Expr::Accessibility { kind, content } => {
            format!("__ng.a11y({}, {})", js_string(kind.keyword()), expr(content))
        }
        Expr::Array(elements) => {
            let elements: Vec<_> = elements.iter().map(expr).collect();
            format!("[{}]", elements.join(", "))
        }
        Expr::Object(entries) => {
            let entries: Vec<_> = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", js_string(key), expr(value)))
                .collect();
            // Parenthesised so a statement-position object is not a block.
            format!("({{{}}})", entries.join(", "))
        }
    }
}

fn template(parts: &[TemplatePart]) -> String {
    if parts.is_empty() {
        return "\"\"".to_string();
    }
    let pieces: Vec<_> = parts
        .iter()
        .map(|part| match part {
            TemplatePart::Text(text) => js_string(text),
            TemplatePart::Expr(e) => format!("__ng.str({})", expr(e)),
            TemplatePart::Filtered { expr: e, filter, .. } => {
                let ident = js_ident(filter);
                format!(
                    "__ng.str(__ng.filter({}, typeof {ident} === \"undefined\" ? undefined : {ident}, {}))",
                    js_string(filter),
                    expr(e)
                )
            }
        })
        .collect();
    format!("({})", pieces.join(" + "))
}

// -- HTML --

const A11Y_STYLESHEET: &str = "\
.skip-link { position: absolute; left: -9999px; top: 0; padding: 0.5em; background: #fff; }
.skip-link:focus { left: 0; }
.a11y-bsl, .a11y-gsl, .a11y-asl, .a11y-makaton { border-left: 4px solid; padding-left: 0.5em; }
.a11y-bsl { border-color: #1d70b8; }
.a11y-gsl { border-color: #d4351c; }
.a11y-asl { border-color: #00703c; }
.a11y-makaton { border-color: #f47738; }
";

struct HtmlEmitter {
    accessible: bool,
    out: String,
    indent: usize,
}

/// Make text safe inside an HTML comment.
fn comment_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_dash = false;
    for ch in text.chars() {
        if ch == '-' && prev_dash {
            out.push(' ');
        }
        prev_dash = ch == '-';
        out.push(ch);
    }
    out.replace('>', "&gt;")
}

impl HtmlEmitter {
    const fn new(accessible: bool) -> Self {
        Self {
            accessible,
            out: String::new(),
            indent: 0,
        }
    }

    fn document(mut self, program: &Program, title: &str) -> String {
        self.out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        self.out.push_str("<meta charset=\"utf-8\">\n");
        self.out
            .push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        let _ = writeln!(self.out, "<title>{}</title>", escape_html(title));
        if self.accessible {
            let _ = write!(self.out, "<style>\n{A11Y_STYLESHEET}</style>\n");
        }
        self.out.push_str("</head>\n<body>\n");

        if self.accessible {
            self.out.push_str(
                "<a class=\"skip-link\" href=\"#main-content\">Skip to main content</a>\n",
            );
            self.out
                .push_str("<main id=\"main-content\" role=\"main\">\n");
            self.indent = 1;
        }

        self.statements(&program.statements);

        if self.accessible {
            self.out.push_str("</main>\n");
        }
        self.out.push_str("</body>\n</html>\n");
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn comment(&mut self, text: &str) {
        self.line(&format!("<!-- {} -->", comment_text(text)));
    }

    fn statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.statement(stmt);
        }
    }

    fn nested(&mut self, body: &[Stmt]) {
        self.indent += 1;
        self.statements(body);
        self.indent -= 1;
    }

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let {
                name,
                mutable,
                value,
            } => {
                let keyword = if *mutable { "let" } else { "const" };
                self.comment(&format!("{keyword} {name} = {value}"));
            }
            Stmt::Expr(e) => {
                let inner = self.inline(e);
                self.line(&format!("<p>{inner}</p>"));
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                self.comment(&format!("if {condition}"));
                self.nested(then_block);
                if let Some(else_block) = else_block {
                    self.comment("else");
                    self.nested(else_block);
                }
                self.comment("end if");
            }
            Stmt::For {
                var,
                iterable,
                body,
                ..
            } => {
                self.comment(&format!("for {var} in {iterable}"));
                self.nested(body);
                self.comment("end for");
            }
            Stmt::While { condition, body } => {
                self.comment(&format!("while {condition}"));
                self.nested(body);
                self.comment("end while");
            }
            Stmt::Function { name, params, body } => {
                self.comment(&format!("function {name}({})", params.join(", ")));
                self.nested(body);
                self.comment("end function");
            }
            Stmt::Component { name, props, body } => {
                self.line(&format!(
                    "<template id=\"{}\" data-props=\"{}\">",
                    escape_html(name),
                    escape_html(&props.join(","))
                ));
                self.nested(body);
                self.line("</template>");
            }
            Stmt::Return(None) => self.comment("return"),
            Stmt::Return(Some(value)) => self.comment(&format!("return {value}")),
            Stmt::Import { path, names } => {
                self.comment(&format!("import {{ {} }} from {path}", names.join(", ")));
            }
            Stmt::Export { name, .. } => self.comment(&format!("export {name}")),
            Stmt::Accessibility { kind, metadata } => {
                let inner = self.inline(metadata);
                let element = self.wrap(*kind, "div", &inner);
                self.line(&element);
            }
        }
    }

    fn wrap(&self, kind: AccessibilityKind, tag: &str, inner: &str) -> String {
        if self.accessible {
            kind.wrap_html(tag, inner)
        } else {
            format!("<{tag} data-accessibility=\"{kind}\">{inner}</{tag}>")
        }
    }

    /// Element content for an expression: literal text is escaped, anything
    /// computed is shown as a `{{ }}` interpolation.
    fn inline(&self, e: &Expr) -> String {
        match e {
            Expr::Literal(Literal::String(s)) => escape_html(s),
            Expr::Template(parts) => parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Text(text) => escape_html(text),
                    TemplatePart::Expr(e) => escape_html(&format!("{{{{ {e} }}}}")),
                    TemplatePart::Filtered { expr, filter, .. } => {
                        escape_html(&format!("{{{{ {expr} | {filter} }}}}"))
                    }
                })
                .collect(),
            Expr::Accessibility { kind, content } => {
                let inner = self.inline(content);
                self.wrap(*kind, "span", &inner)
            }
            other => escape_html(&format!("{{{{ {other} }}}}")),
        }
    }
}
