mod pages;
mod site;
mod uploads;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, State},
    http::Uri,
    middleware,
    response::Response,
    routing::{get, post},
};

use crate::{
    application::{
        admin::{pages::AdminPageService, site::AdminSiteService},
        error::HttpError,
    },
    presentation::admin::views::AdminChrome,
};

use super::{
    HttpState, db_health_response, media,
    middleware::{log_responses, set_request_context},
    render_not_found,
};

#[derive(Clone)]
pub struct AdminState {
    pub http: HttpState,
    pub pages: AdminPageService,
    pub site: AdminSiteService,
}

impl FromRef<AdminState> for HttpState {
    fn from_ref(state: &AdminState) -> Self {
        state.http.clone()
    }
}

pub fn build_admin_router(state: AdminState, upload_body_limit: usize) -> Router {
    Router::new()
        .route("/admin", get(pages::admin_dashboard))
        .route(
            "/admin/add",
            get(pages::admin_page_new).post(pages::admin_page_save),
        )
        .route(
            "/admin/edit",
            get(pages::admin_page_new).post(pages::admin_page_save),
        )
        .route(
            "/admin/edit/{slug}",
            get(pages::admin_page_edit).post(pages::admin_page_save),
        )
        .route("/admin/publish", get(pages::admin_page_publish))
        .route("/admin/unpublish", get(pages::admin_page_unpublish))
        .route("/admin/remove/{slug}", get(pages::admin_page_remove))
        .route(
            "/admin/site",
            get(site::admin_site).post(site::admin_site_update),
        )
        .route(
            "/admin/upload",
            post(uploads::admin_upload).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/admin/remove-media", post(uploads::admin_remove_media))
        .route("/_health/db", get(admin_health))
        .merge(media::routes())
        .fallback(admin_fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn_with_state("admin", set_request_context))
}

async fn admin_chrome(state: &AdminState) -> Result<AdminChrome, HttpError> {
    let prefs = state.http.site.load().await?;
    let links = state.http.pages.links(prefs.front.as_deref()).await?;
    Ok(AdminChrome {
        site_title: prefs.title,
        description: prefs.description,
        links,
    })
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.http.health.ping().await)
}

async fn admin_fallback(State(state): State<AdminState>, uri: Uri) -> Response {
    render_not_found(&state.http, uri.path(), "no route matched").await
}
