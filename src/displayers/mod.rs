//! Presentation: label templates and text rendering

pub mod template;
mod text;

pub use template::{Template, Token, DEFAULT_TEMPLATE};
pub use text::{render_info, render_label};
