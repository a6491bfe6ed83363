mod admin;
mod media;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use public::{HttpState, build_router};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::error::{ErrorReport, HttpError};
use crate::application::repos::RepoError;
use crate::presentation::views::LayoutContext;

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Site-layout 404 shared by both listeners.
async fn render_not_found(state: &HttpState, path: &str, reason: &str) -> Response {
    let prefs = match state.site.load().await {
        Ok(prefs) => prefs,
        Err(err) => return HttpError::from(err).into_response(),
    };
    let links = match state.pages.links(prefs.front.as_deref()).await {
        Ok(links) => links,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let view = LayoutContext::not_found(&prefs, path, links);
    let mut response = match state.layout.render(&prefs, view) {
        Ok(html) => (StatusCode::NOT_FOUND, html).into_response(),
        Err(err) => return err.into_response(),
    };
    ErrorReport::from_message("infra::http::not_found", StatusCode::NOT_FOUND, reason)
        .attach(&mut response);
    response
}
