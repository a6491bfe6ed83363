use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    application::{admin::site::UpdateSiteCommand, error::HttpError},
    presentation::{
        admin::views::{AdminLayout, AdminSiteTemplate, AdminSiteView},
        views::render_template_response,
    },
};

use super::{AdminState, admin_chrome};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SiteForm {
    title: String,
    description: String,
    #[serde(rename = "templateText")]
    template_text: String,
    use_own_template: Option<String>,
}

impl From<SiteForm> for UpdateSiteCommand {
    fn from(form: SiteForm) -> Self {
        Self {
            title: form.title,
            description: form.description,
            template_text: form.template_text,
            use_own_template: form.use_own_template.is_some_and(|value| !value.is_empty()),
        }
    }
}

pub(super) async fn admin_site(State(state): State<AdminState>) -> Response {
    let chrome = match admin_chrome(&state).await {
        Ok(chrome) => chrome,
        Err(err) => return err.into_response(),
    };
    let prefs = match state.site.load().await {
        Ok(prefs) => prefs,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let content = AdminSiteView {
        use_own_template: !prefs.template_default,
        template_text: prefs.template_text.unwrap_or_default(),
        title: prefs.title,
        description: prefs.description,
    };
    let view = AdminLayout::new(chrome, content);
    render_template_response(AdminSiteTemplate { view }, StatusCode::OK)
}

pub(super) async fn admin_site_update(
    State(state): State<AdminState>,
    Form(form): Form<SiteForm>,
) -> Response {
    match state.site.update(form.into()).await {
        Ok(_) => Redirect::to("/admin?updated=true").into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}
