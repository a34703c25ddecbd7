//! Embedded scaffolding templates, rendered with handlebars
//!
//! Templates are plain text files, not HTML, so nothing is escaped on
//! render. Values that land inside a source-code string literal are passed
//! already quoted (see [`string_literal`]).

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

pub const BKITIGNORE: &str = "bkitignore";
pub const MAIN_TS: &str = "main.ts";
pub const MAIN_JS: &str = "main.js";
pub const TSCONFIG: &str = "tsconfig.json";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Failed to render template '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: handlebars::RenderError,
    },
}

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        // Embedded at compile time; a broken one shows up as TemplateNotFound
        let _ = handlebars.register_template_string(
            BKITIGNORE,
            include_str!("../../templates/bkitignore.template"),
        );
        let _ = handlebars
            .register_template_string(MAIN_TS, include_str!("../../templates/main.ts.template"));
        let _ = handlebars
            .register_template_string(MAIN_JS, include_str!("../../templates/main.js.template"));
        let _ = handlebars.register_template_string(
            TSCONFIG,
            include_str!("../../templates/tsconfig.json.template"),
        );

        Self { handlebars }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, TemplateError> {
        if !self.has_template(name) {
            return Err(TemplateError::TemplateNotFound {
                name: name.to_string(),
            });
        }
        self.handlebars
            .render(name, context)
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }
}

/// Quote `text` as a JavaScript string literal
///
/// A JSON string is a valid JS string literal, quotes and backslashes included.
pub fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    include!("templates.test.rs");
}
