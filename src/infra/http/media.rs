//! Stored media served to both listeners.

use axum::{
    Router,
    body::Body,
    extract::{FromRef, Path, State},
    http::{
        HeaderValue, StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::{
    application::error::HttpError,
    domain::{
        entities::MediaRecord,
        media::attachment_disposition,
        types::{ImageSize, MediaKind},
    },
};

use super::{HttpState, render_not_found};

pub(super) fn routes<S>() -> Router<S>
where
    HttpState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/image/{size}/{key}/{name}", get(serve_image))
        .route("/download/{key}/{name}", get(serve_download))
}

async fn serve_image(
    State(state): State<HttpState>,
    Path((size, key, _name)): Path<(String, String, String)>,
    uri: Uri,
) -> Response {
    let Some(size) = ImageSize::parse(&size) else {
        return render_not_found(&state, uri.path(), "unknown image size").await;
    };
    let media = match lookup(&state, &key).await {
        Ok(Some(media)) if media.kind == MediaKind::Image => media,
        Ok(_) => return render_not_found(&state, uri.path(), "unknown image").await,
        Err(err) => return err.into_response(),
    };

    let body = match size {
        ImageSize::Full => Some(media.file),
        ImageSize::Thumb => media.thumbnail,
    };
    match body {
        Some(bytes) => blob_response(bytes, "image/jpeg", None),
        None => render_not_found(&state, uri.path(), "image has no thumbnail").await,
    }
}

async fn serve_download(
    State(state): State<HttpState>,
    Path((key, _name)): Path<(String, String)>,
    uri: Uri,
) -> Response {
    match lookup(&state, &key).await {
        Ok(Some(media)) => {
            let disposition = attachment_disposition(&media.name);
            blob_response(media.file, "application/octet-stream", Some(&disposition))
        }
        Ok(None) => render_not_found(&state, uri.path(), "unknown media").await,
        Err(err) => err.into_response(),
    }
}

async fn lookup(state: &HttpState, key: &str) -> Result<Option<MediaRecord>, HttpError> {
    let Ok(id) = Uuid::parse_str(key) else {
        return Ok(None);
    };
    state.media.find(id).await.map_err(HttpError::from)
}

fn blob_response(bytes: Bytes, content_type: &'static str, disposition: Option<&str>) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    if let Some(value) = disposition.and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok())
    {
        headers.insert(CONTENT_DISPOSITION, value);
    }

    response
}
