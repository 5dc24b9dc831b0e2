//! Template engine for manifest rendering
//!
//! Uses minijinja with its standard `{{ ... }}` / `{% ... %}` syntax,
//! strict undefined handling and auto-escaping disabled (the output is YAML,
//! not HTML).

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use super::context::TemplateContext;
use super::error::TemplateError;

/// Template engine for manifest placeholder resolution
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Render a template string with the given context
    ///
    /// Rendering is deterministic: identical template and context always
    /// produce identical output.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if:
    /// - Template syntax is invalid
    /// - A referenced variable is undefined
    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        self.env
            .render_str(template, ctx.to_value())
            .map_err(TemplateError::from)
    }

    /// Check that a template parses, without rendering it
    pub fn validate_syntax(&self, template: &str) -> Result<(), TemplateError> {
        self.env
            .template_from_str(template)
            .map(|_| ())
            .map_err(TemplateError::from)
    }
}
