use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri, header::{CONTENT_TYPE, HOST}},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    application::{
        error::HttpError,
        feed::{FEED_CONTENT_TYPE, FeedService},
        media::MediaService,
        pages::PageService,
        render::LayoutRenderer,
        repos::HealthRepo,
        site::SiteService,
    },
    presentation::views::LayoutContext,
};

use super::{
    db_health_response, media,
    middleware::{log_responses, set_request_context},
    render_not_found,
};

#[derive(Clone)]
pub struct HttpState {
    pub site: SiteService,
    pub pages: PageService,
    pub feed: FeedService,
    pub media: MediaService,
    pub layout: Arc<LayoutRenderer>,
    pub health: Arc<dyn HealthRepo>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(front_page))
        .route("/page/{slug}", get(page))
        .route("/feed", get(feed))
        .route("/_health/db", get(public_health))
        .merge(media::routes())
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn_with_state("public", set_request_context))
}

async fn front_page(State(state): State<HttpState>, uri: Uri) -> Response {
    render_page(&state, None, uri.path()).await
}

async fn page(State(state): State<HttpState>, Path(slug): Path<String>, uri: Uri) -> Response {
    render_page(&state, Some(slug), uri.path()).await
}

/// Render a published page, or the front page when `slug` is `None`.
async fn render_page(state: &HttpState, slug: Option<String>, path: &str) -> Response {
    let prefs = match state.site.load().await {
        Ok(prefs) => prefs,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let Some(slug) = slug.or_else(|| prefs.front.clone()) else {
        return render_not_found(state, path, "no front page configured").await;
    };

    let page = match state.pages.resolve(&slug).await {
        Ok(Some(page)) if page.is_published() => page,
        Ok(Some(_)) => return render_not_found(state, path, "page is a draft").await,
        Ok(None) => return render_not_found(state, path, "unknown page").await,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let subpages = match state.pages.public_subpages(page.id).await {
        Ok(subpages) => subpages,
        Err(err) => return HttpError::from(err).into_response(),
    };
    let links = match state.pages.links(prefs.front.as_deref()).await {
        Ok(links) => links,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let view = LayoutContext::for_page(&prefs, &page, &subpages, links);
    match state.layout.render(&prefs, view) {
        Ok(html) => html.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn feed(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let host = headers.get(HOST).and_then(|value| value.to_str().ok());
    match state.feed.render(host).await {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, FEED_CONTENT_TYPE)
            .body(Body::from(body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

async fn fallback(State(state): State<HttpState>, uri: Uri) -> Response {
    render_not_found(&state, uri.path(), "no route matched").await
}
