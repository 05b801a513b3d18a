//! Bounded `{{ name }}` substitution engine.
//!
//! A deliberately small system next to the interpreter: it only replaces
//! variable names, never evaluates expressions, and enforces fixed size
//! caps so hostile input cannot grow memory without bound. Unknown names
//! are left in the output as `{{name}}`, unlike the interpreter, which
//! fails with an undefined-variable error.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::AccessibilityKind;

/// Longest accepted variable name, in bytes.
pub const MAX_NAME_LEN: usize = 256;
/// Largest accepted variable value, in bytes.
pub const MAX_VALUE_LEN: usize = 64 * 1024;
/// Most variables a single engine holds.
pub const MAX_VARIABLES: usize = 1024;
/// Largest accepted template, in bytes.
pub const MAX_TEMPLATE_LEN: usize = 1024 * 1024;

/// Numeric outcome of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    Syntax = 1,
    NameTooLong = 2,
    ValueTooLarge = 3,
    TooManyVariables = 4,
    TemplateTooLarge = 5,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Syntax => "syntax",
            Self::NameTooLong => "name-too-long",
            Self::ValueTooLarge => "value-too-large",
            Self::TooManyVariables => "too-many-variables",
            Self::TemplateTooLarge => "template-too-large",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// A `{{` with no matching `}}`.
    #[error("unterminated '{{{{' at byte {offset}")]
    Syntax { offset: usize },
    #[error("variable name is {len} bytes, limit is {}", MAX_NAME_LEN)]
    NameTooLong { len: usize },
    #[error("value of '{name}' is {len} bytes, limit is {}", MAX_VALUE_LEN)]
    ValueTooLarge { name: String, len: usize },
    #[error("more than {} variables", MAX_VARIABLES)]
    TooManyVariables,
    #[error("template is {len} bytes, limit is {}", MAX_TEMPLATE_LEN)]
    TemplateTooLarge { len: usize },
}

impl SynthError {
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Syntax { .. } => Status::Syntax,
            Self::NameTooLong { .. } => Status::NameTooLong,
            Self::ValueTooLarge { .. } => Status::ValueTooLarge,
            Self::TooManyVariables => Status::TooManyVariables,
            Self::TemplateTooLarge { .. } => Status::TemplateTooLarge,
        }
    }
}

/// Variable store plus renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synth {
    vars: BTreeMap<String, String>,
}

impl Synth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing an existing binding.
    ///
    /// # Errors
    ///
    /// Fails when the name or value exceeds its cap, or when a new name
    /// would exceed the variable cap.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SynthError> {
        if name.len() > MAX_NAME_LEN {
            return Err(SynthError::NameTooLong { len: name.len() });
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(SynthError::ValueTooLarge {
                name: name.to_string(),
                len: value.len(),
            });
        }
        if !self.vars.contains_key(name) && self.vars.len() >= MAX_VARIABLES {
            return Err(SynthError::TooManyVariables);
        }
        self.vars.insert(name.to_string(), value.to_string());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Substitute every `{{ name }}` in `template`.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::TemplateTooLarge`] for oversized input and
    /// [`SynthError::Syntax`] for an unterminated tag.
    pub fn render(&self, template: &str) -> Result<String, SynthError> {
        if template.len() > MAX_TEMPLATE_LEN {
            return Err(SynthError::TemplateTooLarge {
                len: template.len(),
            });
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                return Err(SynthError::Syntax {
                    offset: offset + open,
                });
            };

            let name = after[..close].trim();
            match self.vars.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push_str("{{");
                    out.push_str(name);
                    out.push_str("}}");
                }
            }

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);

        tracing::trace!(input = template.len(), output = out.len(), "rendered template");
        Ok(out)
    }

    /// Render and wrap the result in the accessibility element for `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`Synth::render`].
    pub fn render_accessible(
        &self,
        kind: AccessibilityKind,
        template: &str,
    ) -> Result<String, SynthError> {
        self.render(template)
            .map(|rendered| kind.wrap_html("div", &rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(vars: &[(&str, &str)]) -> Synth {
        let mut synth = Synth::new();
        for (name, value) in vars {
            synth.set(name, value).expect("set");
        }
        synth
    }

    #[test]
    fn substitutes_trimmed_names() {
        let synth = engine(&[("name", "World")]);
        assert_eq!(synth.render("Hello, {{ name }}!").expect("render"), "Hello, World!");
        assert_eq!(synth.render("{{name}}{{  name  }}").expect("render"), "WorldWorld");
    }

    #[test]
    fn missing_variable_stays_literal() {
        let synth = Synth::new();
        assert_eq!(synth.render("Hi {{  who }}.").expect("render"), "Hi {{who}}.");
    }

    #[test]
    fn unterminated_tag() {
        let err = Synth::new().render("ok {{ name").unwrap_err();
        assert_eq!(err, SynthError::Syntax { offset: 3 });
        assert_eq!(err.status(), Status::Syntax);
    }

    #[test]
    fn values_are_not_rescanned() {
        let synth = engine(&[("a", "{{b}}"), ("b", "no")]);
        assert_eq!(synth.render("{{a}}").expect("render"), "{{b}}");
    }

    #[test]
    fn caps_have_distinct_statuses() {
        let mut synth = Synth::new();
        let long_name = "n".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            synth.set(&long_name, "v").unwrap_err().status(),
            Status::NameTooLong
        );
        let big = "v".repeat(MAX_VALUE_LEN + 1);
        assert_eq!(
            synth.set("x", &big).unwrap_err().status(),
            Status::ValueTooLarge
        );
        let huge = "x".repeat(MAX_TEMPLATE_LEN + 1);
        assert_eq!(
            synth.render(&huge).unwrap_err().status(),
            Status::TemplateTooLarge
        );
    }

    #[test]
    fn variable_cap_counts_distinct_names() {
        let mut synth = Synth::new();
        for i in 0..MAX_VARIABLES {
            synth.set(&format!("v{i}"), "x").expect("set");
        }
        assert_eq!(synth.set("v0", "replaced"), Ok(()));
        assert_eq!(synth.set("extra", "x"), Err(SynthError::TooManyVariables));
        assert_eq!(synth.len(), MAX_VARIABLES);
    }

    #[test]
    fn rendering_is_deterministic() {
        let synth = engine(&[("a", "1"), ("b", "2")]);
        let template = "{{a}}-{{b}}-{{c}}";
        assert_eq!(synth.render(template), synth.render(template));
    }

    #[test]
    fn accessible_rendering_uses_shared_mapping() {
        let synth = engine(&[("sign", "hello")]);
        let out = synth
            .render_accessible(AccessibilityKind::Gsl, "{{ sign }}")
            .expect("render");
        assert_eq!(
            out,
            "<div class=\"a11y-gsl\" lang=\"gsg\" aria-label=\"German Sign Language\">hello</div>"
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(Status::Ok as i32, 0);
        assert_eq!(Status::TemplateTooLarge.to_string(), "template-too-large");
    }
}
