//! HTML templates and page generation
//!
//! Pages are plain `format!` templates. Every value that originates from a
//! request or the resolver goes through [`escape_html`] before interpolation.

pub mod base;
pub mod landing;
pub mod selection;

pub use base::base_template;
pub use selection::SelectionView;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
