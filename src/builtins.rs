//! The fixed builtin catalog.
//!
//! | name          | arguments             | result          |
//! |---------------|-----------------------|-----------------|
//! | `print`       | any number of values  | null            |
//! | `len`         | string or array       | number          |
//! | `upper`       | string                | string          |
//! | `lower`       | string                | string          |
//! | `escape_html` | any value             | string          |
//! | `date`        | none                  | `YYYY-MM-DD`    |
//! | `join`        | array, string         | string          |

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::interpreter::RuntimeErrorKind;
use crate::value::{Builtin, Value};

/// Names of every builtin, in catalog order.
pub const NAMES: [&str; 7] = ["print", "len", "upper", "lower", "escape_html", "date", "join"];

/// Build the builtin table installed into every interpreter.
#[must_use]
pub fn table() -> HashMap<&'static str, Builtin> {
    let entries: [Builtin; 7] = [
        Builtin {
            name: "print",
            func: print,
        },
        Builtin {
            name: "len",
            func: len,
        },
        Builtin {
            name: "upper",
            func: upper,
        },
        Builtin {
            name: "lower",
            func: lower,
        },
        Builtin {
            name: "escape_html",
            func: escape_html_builtin,
        },
        Builtin {
            name: "date",
            func: date,
        },
        Builtin {
            name: "join",
            func: join,
        },
    ];
    entries.into_iter().map(|b| (b.name, b)).collect()
}

/// Escape text for inclusion in HTML element content or attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn arity(
    name: &'static str,
    args: &[Value],
    expected: usize,
    described: &'static str,
) -> Result<(), RuntimeErrorKind> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeErrorKind::BuiltinArity {
            name,
            expected: described,
            found: args.len(),
        })
    }
}

fn single_string<'v>(name: &'static str, args: &'v [Value]) -> Result<&'v str, RuntimeErrorKind> {
    arity(name, args, 1, "1 argument")?;
    match &args[0] {
        Value::String(s) => Ok(s),
        other => Err(RuntimeErrorKind::BuiltinType {
            name,
            expected: "a string",
            found: other.type_name(),
        }),
    }
}

fn print(args: &[Value], out: &mut String) -> Result<Value, RuntimeErrorKind> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{arg}");
    }
    out.push('\n');
    Ok(Value::Null)
}

#[allow(clippy::cast_precision_loss)]
fn len(args: &[Value], _out: &mut String) -> Result<Value, RuntimeErrorKind> {
    arity("len", args, 1, "1 argument")?;
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::Array(items) => Ok(Value::Number(items.len() as f64)),
        other => Err(RuntimeErrorKind::BuiltinType {
            name: "len",
            expected: "a string or array",
            found: other.type_name(),
        }),
    }
}

fn upper(args: &[Value], _out: &mut String) -> Result<Value, RuntimeErrorKind> {
    single_string("upper", args).map(|s| Value::String(s.to_uppercase()))
}

fn lower(args: &[Value], _out: &mut String) -> Result<Value, RuntimeErrorKind> {
    single_string("lower", args).map(|s| Value::String(s.to_lowercase()))
}

fn escape_html_builtin(args: &[Value], _out: &mut String) -> Result<Value, RuntimeErrorKind> {
    arity("escape_html", args, 1, "1 argument")?;
    Ok(Value::String(escape_html(&args[0].to_string())))
}

fn date(args: &[Value], _out: &mut String) -> Result<Value, RuntimeErrorKind> {
    arity("date", args, 0, "no arguments")?;
    Ok(Value::String(
        chrono::Utc::now().format("%Y-%m-%d").to_string(),
    ))
}

fn join(args: &[Value], _out: &mut String) -> Result<Value, RuntimeErrorKind> {
    arity("join", args, 2, "2 arguments")?;
    let Value::Array(items) = &args[0] else {
        return Err(RuntimeErrorKind::BuiltinType {
            name: "join",
            expected: "an array as first argument",
            found: args[0].type_name(),
        });
    };
    let Value::String(separator) = &args[1] else {
        return Err(RuntimeErrorKind::BuiltinType {
            name: "join",
            expected: "a string separator",
            found: args[1].type_name(),
        });
    };

    let joined = items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator);
    Ok(Value::String(joined))
}
