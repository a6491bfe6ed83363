//! Site layout selection.
//!
//! Editors may replace the built-in askama layout with their own handlebars
//! template stored in the site preferences. A custom template that fails to
//! compile or render is logged and the built-in layout is used instead.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::application::error::HttpError;
use crate::domain::settings::SitePreferences;
use crate::presentation::views::{BaseTemplate, LayoutContext, render_template};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("custom template could not be compiled: {0}")]
    Malformed(#[from] Box<handlebars::TemplateError>),
    #[error("custom template failed to render: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Compiled handlebars templates keyed by a hash of their source.
///
/// Only the most recently used source stays registered; a site has one
/// custom layout at a time.
pub struct CustomTemplates {
    registry: RwLock<Handlebars<'static>>,
}

impl Default for CustomTemplates {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        Self {
            registry: RwLock::new(registry),
        }
    }
}

impl CustomTemplates {
    pub fn render<T: Serialize>(&self, source: &str, data: &T) -> Result<String, TemplateError> {
        let name = template_name(source);

        let registered = {
            let registry = self.registry.read().unwrap_or_else(|p| p.into_inner());
            registry.get_template(&name).is_some()
        };

        if !registered {
            let mut registry = self.registry.write().unwrap_or_else(|p| p.into_inner());
            if registry.get_template(&name).is_none() {
                registry.clear_templates();
                registry
                    .register_template_string(&name, source)
                    .map_err(Box::new)?;
            }
        }

        let registry = self.registry.read().unwrap_or_else(|p| p.into_inner());
        Ok(registry.render(&name, data)?)
    }
}

fn template_name(source: &str) -> String {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    format!("site_{:x}", hasher.finish())
}

/// Renders [`LayoutContext`] through the layout the preferences select.
#[derive(Default)]
pub struct LayoutRenderer {
    custom: CustomTemplates,
}

impl LayoutRenderer {
    pub fn render(
        &self,
        prefs: &SitePreferences,
        view: LayoutContext,
    ) -> Result<Html<String>, HttpError> {
        if let Some(source) = prefs.custom_template() {
            match self.custom.render(source, &view) {
                Ok(html) => return Ok(Html(html)),
                Err(err) => warn!(
                    target = "quill::application::render",
                    error = %err,
                    title = %view.title,
                    "custom template failed; falling back to built-in layout"
                ),
            }
        }

        render_template(BaseTemplate { view })
    }
}
