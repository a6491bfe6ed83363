//! Media upload and removal handlers.

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        media::{UploadOutcome, UploadRejection},
    },
    presentation::{admin::views::AdminUploadResponseTemplate, views::render_template_response},
};

use super::AdminState;

const SOURCE_BASE: &str = "infra::http::admin_uploads";

#[derive(Debug, Default)]
struct UploadPayload {
    filename: String,
    description: String,
    bytes: Option<Bytes>,
}

enum PayloadError {
    TooLarge,
    Invalid,
}

async fn read_upload_payload(multipart: &mut Multipart) -> Result<UploadPayload, PayloadError> {
    let mut payload = UploadPayload::default();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name() {
                Some("file") => {
                    payload.filename = field.file_name().unwrap_or_default().to_string();
                    payload.bytes = Some(field.bytes().await.map_err(classify)?);
                }
                Some("description") => {
                    payload.description = field.text().await.map_err(classify)?;
                }
                _ => continue,
            },
            Ok(None) => return Ok(payload),
            Err(err) => return Err(classify(err)),
        }
    }
}

fn classify(err: axum_extra::extract::multipart::MultipartError) -> PayloadError {
    let status = err.status();
    error!(
        target = SOURCE_BASE,
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        PayloadError::TooLarge
    } else {
        PayloadError::Invalid
    }
}

pub(super) async fn admin_upload(State(state): State<AdminState>, mut multipart: Multipart) -> Response {
    let media = &state.http.media;
    let payload = match read_upload_payload(&mut multipart).await {
        Ok(payload) => payload,
        Err(PayloadError::TooLarge) => {
            let outcome = media.reject(UploadRejection::TooLarge, 0);
            return upload_response(&outcome);
        }
        Err(PayloadError::Invalid) => {
            return HttpError::new(
                SOURCE_BASE,
                StatusCode::BAD_REQUEST,
                "Invalid upload form",
                "multipart payload could not be parsed",
            )
            .into_response();
        }
    };

    let Some(bytes) = payload.bytes else {
        return upload_response(&media.reject(UploadRejection::Empty, 0));
    };

    match media
        .upload(&payload.filename, &payload.description, bytes)
        .await
    {
        Ok(outcome) => upload_response(&outcome),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn upload_response(outcome: &UploadOutcome) -> Response {
    let segment = path_segment(&outcome.name);
    let template = AdminUploadResponseTemplate {
        status: outcome.status.to_string(),
        kind: outcome.kind.clone(),
        key: outcome.key.clone(),
        name: outcome.name.clone(),
        width: outcome.width,
        height: outcome.height,
        description: outcome.description.clone(),
        image_href: format!("/image/full/{}/{segment}", outcome.key),
        thumb_href: format!("/image/thumb/{}/{segment}", outcome.key),
        download_href: format!("/download/{}/{segment}", outcome.key),
    };
    render_template_response(template, StatusCode::OK)
}

/// File name reduced to characters that need no escaping in a URL path.
/// Media routes ignore this segment; it only makes links readable.
fn path_segment(name: &str) -> String {
    let segment: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if segment.is_empty() {
        "file".to_string()
    } else {
        segment
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RemoveMediaForm {
    key: String,
}

/// Delete a media record. Unknown keys are ignored.
pub(super) async fn admin_remove_media(
    State(state): State<AdminState>,
    Form(form): Form<RemoveMediaForm>,
) -> Response {
    if let Ok(id) = Uuid::parse_str(form.key.trim())
        && let Err(err) = state.http.media.remove(id).await
    {
        return HttpError::from(err).into_response();
    }
    "deleted".into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_url_safe() {
        assert_eq!(path_segment("holiday photo.jpg"), "holiday_photo.jpg");
        assert_eq!(path_segment("naïve.txt"), "na_ve.txt");
        assert_eq!(path_segment(""), "file");
    }
}
