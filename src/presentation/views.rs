use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::application::error::HttpError;
use crate::domain::entities::{PageLink, PageRecord};
use crate::domain::settings::SitePreferences;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Page as exposed to layouts, both the built-in one and custom templates.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub key: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub draft: bool,
    pub created: String,
    pub edited: String,
}

impl From<&PageRecord> for PageView {
    fn from(page: &PageRecord) -> Self {
        Self {
            key: page.id.to_string(),
            title: page.title.clone(),
            slug: page.slug.clone(),
            content: page.content.clone(),
            draft: page.draft,
            created: format_timestamp(page.created_at),
            edited: format_timestamp(page.updated_at),
        }
    }
}

/// Everything a site layout can show.
///
/// `title` and `content` are always set: for a page they mirror the page,
/// for the not-found response they carry the error text.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutContext {
    pub site_title: String,
    pub description: String,
    pub title: String,
    pub content: String,
    pub page: Option<PageView>,
    pub subpages: Vec<PageView>,
    pub links: Vec<PageLink>,
}

impl LayoutContext {
    pub fn for_page(
        prefs: &SitePreferences,
        page: &PageRecord,
        subpages: &[PageRecord],
        links: Vec<PageLink>,
    ) -> Self {
        Self {
            site_title: prefs.title.clone(),
            description: prefs.description.clone(),
            title: page.title.clone(),
            content: page.content.clone(),
            page: Some(PageView::from(page)),
            subpages: subpages.iter().map(PageView::from).collect(),
            links,
        }
    }

    pub fn not_found(prefs: &SitePreferences, path: &str, links: Vec<PageLink>) -> Self {
        Self {
            site_title: prefs.title.clone(),
            description: prefs.description.clone(),
            title: "Not Found".to_string(),
            content: not_found_message(path),
            page: None,
            subpages: Vec::new(),
            links,
        }
    }
}

pub fn not_found_message(path: &str) -> String {
    format!("The requested URL {path} was not found on this server.")
}

/// Built-in site layout.
#[derive(Template)]
#[template(path = "base.html")]
pub struct BaseTemplate {
    pub view: LayoutContext,
}

pub(crate) fn format_timestamp(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}
