//! Manifest templating
//!
//! Manifests are minijinja templates rendered against a flat
//! [`TemplateContext`]. Rendering is strict: a placeholder with no value in
//! the context fails the render instead of producing an empty string.
//!
//! Values are substituted verbatim, so anything that could break the
//! surrounding YAML must be prepared by the caller: binary or sensitive
//! material is base64-encoded, and multi-line text goes through
//! [`escape_multiline`] before it lands in a double-quoted scalar.

mod context;
mod engine;
mod error;

pub use context::{TemplateContext, TemplateContextBuilder};
pub use engine::TemplateEngine;
pub use error::TemplateError;

/// Escape text for embedding inside a YAML double-quoted scalar.
///
/// Newlines become a literal `\n` so the value stays on one line; quotes
/// and backslashes are escaped so the parsed value equals the input.
pub fn escape_multiline(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}
