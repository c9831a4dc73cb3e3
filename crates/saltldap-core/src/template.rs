//! Template rendering
//!
//! Search filters and pillar config files are Jinja templates. Rendering
//! goes through [`TemplateRenderer`] so callers can substitute their own
//! engine; [`JinjaRenderer`] is backed by `minijinja`.

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_json::Value;
use thiserror::Error;

/// Template rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template syntax error: {0}")]
    Syntax(String),

    #[error("Undefined value: {0}")]
    Undefined(String),

    #[error("Template render failed: {0}")]
    Render(String),
}

impl From<minijinja::Error> for TemplateError {
    fn from(e: minijinja::Error) -> Self {
        match e.kind() {
            ErrorKind::SyntaxError => TemplateError::Syntax(e.to_string()),
            ErrorKind::UndefinedError => TemplateError::Undefined(e.to_string()),
            _ => TemplateError::Render(e.to_string()),
        }
    }
}

/// Renders template text against a variable mapping
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError>;
}

/// Jinja rendering with the builtin filters and tests
///
/// Undefined variables print as an empty string, as in Jinja, unless the
/// renderer is strict.
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaRenderer {
    strict: bool,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on undefined variables instead of rendering them empty
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        let mut env = Environment::new();
        if self.strict {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }

        let tmpl = env.template_from_str(template)?;
        Ok(tmpl.render(context)?)
    }
}
