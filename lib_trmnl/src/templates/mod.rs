//! # Templates Module
//!
//! Turning a normalized record into canvas-safe HTML.
//!
//! ## Contained Modules:
//!
//! - **`styles`**: the base stylesheet injected into every view.
//! - **`renderer`**: `TemplateRenderer`, binding records to view templates.
//! - **`validator`**: hard checks on rendered HTML and the advisory lint used
//!   by `validate-templates`.
//! - **`boilerplate`**: scaffolding for new views.

pub mod boilerplate;
pub mod renderer;
pub mod styles;
pub mod validator;

pub use boilerplate::{generate_template, GeneratedTemplate};
pub use renderer::TemplateRenderer;
pub use validator::{lint_view, TemplateValidator};
