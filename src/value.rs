//! Runtime values produced by the interpreter.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{AccessibilityKind, Stmt};
use crate::environment::Env;
use crate::interpreter::RuntimeErrorKind;

/// Signature of a native builtin: arguments and the print buffer.
pub type NativeFn = fn(&[Value], &mut String) -> Result<Value, RuntimeErrorKind>;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Self>),
    /// String-keyed map, iterated in key order.
    Object(BTreeMap<String, Self>),
    Function(Rc<Function>),
    Builtin(Builtin),
    /// Content tagged with a sign-language or Makaton rendering.
    Accessible {
        kind: AccessibilityKind,
        value: Box<Self>,
    },
}

/// User-defined function (or component) together with the environment
/// it was defined in.
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<[Stmt]>,
    pub closure: Env,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure environment may contain this function; skip it.
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Native function from the fixed builtin catalog.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: NativeFn,
}

impl Value {
    /// Name of the value's type as shown in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) | Self::Builtin(_) => "function",
            Self::Accessible { .. } => "accessible",
        }
    }

    /// Null, false, 0, the empty string and the empty array are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => false,
            Self::Number(n) => *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a.name == b.name,
            (
                Self::Accessible { kind: ka, value: va },
                Self::Accessible { kind: kb, value: vb },
            ) => ka == kb && va == vb,
            _ => false,
        }
    }
}

/// Canonical string conversion used by `print`, templates and `+`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Function(func) => write!(f, "<function {}>", func.name),
            Self::Builtin(builtin) => write!(f, "<function {}>", builtin.name),
            Self::Accessible { value, .. } => write!(f, "{value}"),
        }
    }
}

/// Format a number the way JavaScript's `String(n)` does: the shortest
/// digits that round-trip, positional between 1e-7 and 1e21 and in
/// exponent form (`1e+21`, `1.5e-7`) outside that range.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }

    // `{:e}` yields the shortest round-trip digits as `d.ddde<exp>`.
    let sci = format!("{n:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let point = exp + 1;

    if k <= point && point <= 21 {
        let zeros = usize::try_from(point - k).unwrap_or(0);
        format!("{digits}{}", "0".repeat(zeros))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(usize::try_from(point).unwrap_or(0));
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        let zeros = usize::try_from(-point).unwrap_or(0);
        format!("0.{}{digits}", "0".repeat(zeros))
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exp.abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exp.abs())
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Array(Vec::new()).is_truthy());
        assert!(Value::Object(BTreeMap::new()).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn canonical_strings() {
        assert_eq!(Value::Number(14.0).to_string(), "14");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        let array = Value::from(vec![Value::from(1.0), Value::from("a"), Value::Null]);
        assert_eq!(array.to_string(), "[1, a, null]");
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::Bool(true));
        map.insert("a".to_string(), Value::from(1.0));
        assert_eq!(Value::Object(map).to_string(), "{a: 1, b: true}");
    }

    #[test]
    fn numbers_switch_to_exponent_form_like_javascript() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e300), "1.5e+300");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(123_456.789), "123456.789");
        assert_eq!(format_number(0.000_001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-2.5e-7), "-2.5e-7");
        assert_eq!(format_number(1.23e-18), "1.23e-18");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn accessible_displays_content() {
        let value = Value::Accessible {
            kind: AccessibilityKind::Bsl,
            value: Box::new(Value::from("hello")),
        };
        assert_eq!(value.to_string(), "hello");
        assert_eq!(value.type_name(), "accessible");
    }

    #[test]
    fn structural_equality() {
        let a = Value::from(vec![Value::from(1.0), Value::from("x")]);
        let b = Value::from(vec![Value::from(1.0), Value::from("x")]);
        assert_eq!(a, b);
        assert_ne!(Value::from(1.0), Value::from("1"));
    }
}
