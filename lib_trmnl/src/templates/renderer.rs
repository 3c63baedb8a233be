//! # Template Renderer
//!
//! Binds a [`DisplayRecord`] to a view's Jinja-style template and validates
//! the result. The template sees:
//!
//! | name        | content                                           |
//! |-------------|---------------------------------------------------|
//! | `title`     | record title                                      |
//! | `timestamp` | record timestamp                                  |
//! | `styles`    | base stylesheet, inserted without escaping        |
//! | `cards`     | 2 to 4 cards (`label`, `value`, `unit`, `trend`)  |
//! | `tasks`     | tasks (`text`, `completed`, `category`)           |
//! | `fields`    | free-form pass-through data                       |
//!
//! Everything else is HTML-escaped.

use std::path::Path;

use minijinja::{context, AutoEscape, Environment, Value};

use super::styles::base_stylesheet;
use super::validator::TemplateValidator;
use crate::configs::config_app::ViewDescriptor;
use crate::data::model::DisplayRecord;
use crate::errors::{RenderError, RenderResult};

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    validator: TemplateValidator,
    stylesheet: String,
}

impl TemplateRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            validator: TemplateValidator::new(width, height),
            stylesheet: base_stylesheet(width, height),
        }
    }

    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    /// Loads the view's template, binds `data` and validates the HTML.
    pub fn render(&self, view: &ViewDescriptor, data: &DisplayRecord) -> RenderResult<String> {
        let source = std::fs::read_to_string(&view.template_path).map_err(|e| {
            RenderError::TemplateLoad {
                path: view.template_path.clone(),
                reason: e.to_string(),
            }
        })?;
        self.render_source(&view.name, &view.template_path, &source, data)
    }

    /// Same as [`render`](Self::render) for a template already in memory.
    /// `origin` only labels load errors.
    pub fn render_source(
        &self,
        view: &str,
        origin: &Path,
        source: &str,
        data: &DisplayRecord,
    ) -> RenderResult<String> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let template = env
            .template_from_str(source)
            .map_err(|e| RenderError::TemplateLoad {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })?;

        let html = template
            .render(context! {
                title => &data.title,
                timestamp => &data.timestamp,
                styles => Value::from_safe_string(self.stylesheet.clone()),
                cards => &data.cards,
                tasks => &data.tasks,
                fields => &data.fields,
            })
            .map_err(|e| RenderError::TemplateExec {
                view: view.to_string(),
                reason: e.to_string(),
            })?;

        for warning in self.validator.validate(view, &html)? {
            log::warn!("Template '{}': {}", view, warning);
        }
        Ok(html)
    }
}
