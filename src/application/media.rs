//! Media library: upload processing, lookups and removal.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageReader, codecs::jpeg::JpegEncoder};
use imagesize::ImageError as ProbeError;
use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::error::{HttpError, repo_error_to_http};
use crate::application::repos::{MediaRepo, MediaWriteRepo, RepoError};
use crate::cache::{Mutation, ObjectCache};
use crate::config::UploadSettings;
use crate::domain::entities::{MediaRecord, MediaSummary};
use crate::domain::error::DomainError;
use crate::domain::media::{check_invariants, client_file_name};
use crate::domain::types::MediaKind;

const SOURCE: &str = "application::media::MediaService";
const JPEG_QUALITY: u8 = 85;
/// Images with more pixels than this are stored as plain files.
const MAX_DECODE_PIXELS: u64 = 40_000_000;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<MediaError> for HttpError {
    fn from(err: MediaError) -> Self {
        match &err {
            MediaError::Repo(repo) => repo_error_to_http(SOURCE, repo),
            MediaError::Domain(_) => HttpError::from_error(
                SOURCE,
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

/// Why an upload was refused before anything was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    Empty,
    TooLarge,
}

impl UploadRejection {
    fn as_str(self) -> &'static str {
        match self {
            UploadRejection::Empty => "empty",
            UploadRejection::TooLarge => "too_large",
        }
    }
}

/// Result of an upload as reported back to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub description: String,
}

impl UploadOutcome {
    pub fn rejected() -> Self {
        Self {
            status: "ERROR",
            kind: String::new(),
            key: String::new(),
            name: String::new(),
            width: 0,
            height: 0,
            description: String::new(),
        }
    }

    fn stored(record: &MediaRecord) -> Self {
        Self {
            status: "OK",
            kind: record.kind.as_str().to_string(),
            key: record.id.to_string(),
            name: record.name.clone(),
            width: record.width,
            height: record.height,
            description: record.description.clone(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Payload ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMedia {
    pub kind: MediaKind,
    pub file: Bytes,
    pub thumbnail: Option<Bytes>,
    pub width: i32,
    pub height: i32,
}

impl ProcessedMedia {
    fn raw(bytes: Bytes) -> Self {
        Self {
            kind: MediaKind::File,
            file: bytes,
            thumbnail: None,
            width: 0,
            height: 0,
        }
    }
}

#[derive(Debug, Error)]
enum ImageProcessingError {
    #[error("unsupported or unrecognised image format")]
    Unsupported,
    #[error("image header is corrupted")]
    Corrupted,
    #[error("image of {width}x{height} exceeds the decode limit")]
    TooManyPixels { width: usize, height: usize },
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("processed image dimensions out of range")]
    Dimensions,
}

/// Decode `bytes` as an image, shrink it into the configured box and
/// re-encode it (plus a thumbnail) as JPEG. Anything that is not a decodable
/// image is kept verbatim as a FILE.
pub fn process_media(bytes: Bytes, limits: &UploadSettings) -> ProcessedMedia {
    match process_image(&bytes, limits) {
        Ok(processed) => processed,
        Err(err) => {
            debug!(
                target = "quill::application::media",
                error = %err,
                size = bytes.len(),
                "upload stored as plain file"
            );
            ProcessedMedia::raw(bytes)
        }
    }
}

fn process_image(bytes: &[u8], limits: &UploadSettings) -> Result<ProcessedMedia, ImageProcessingError> {
    let probed = imagesize::blob_size(bytes).map_err(|err| match err {
        ProbeError::NotSupported => ImageProcessingError::Unsupported,
        ProbeError::CorruptedImage => ImageProcessingError::Corrupted,
        ProbeError::IoError(err) => ImageProcessingError::Io(err),
    })?;
    if (probed.width as u64).saturating_mul(probed.height as u64) > MAX_DECODE_PIXELS {
        return Err(ImageProcessingError::TooManyPixels {
            width: probed.width,
            height: probed.height,
        });
    }

    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let (max_w, max_h) = (limits.image_max_width.get(), limits.image_max_height.get());
    let full = shrink_to_fit(decoded, max_w, max_h);
    let (width, height) = full.dimensions();
    let file = encode_jpeg(&full)?;

    let (thumb_w, thumb_h) = (limits.thumbnail_width.get(), limits.thumbnail_height.get());
    let thumbnail = encode_jpeg(&shrink_to_fit(full, thumb_w, thumb_h))?;

    Ok(ProcessedMedia {
        kind: MediaKind::Image,
        file,
        thumbnail: Some(thumbnail),
        width: i32::try_from(width).map_err(|_| ImageProcessingError::Dimensions)?,
        height: i32::try_from(height).map_err(|_| ImageProcessingError::Dimensions)?,
    })
}

/// Scale down, keeping the aspect ratio, until the image fits the box.
/// Smaller images are left alone.
fn shrink_to_fit(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max_width && height <= max_height {
        return image;
    }
    image.resize(max_width, max_height, image::imageops::FilterType::Triangle)
}

fn encode_jpeg(image: &DynamicImage) -> Result<Bytes, ImageProcessingError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(Bytes::from(out))
}

#[derive(Clone)]
pub struct MediaService {
    reader: Arc<dyn MediaRepo>,
    writer: Arc<dyn MediaWriteRepo>,
    cache: Option<Arc<ObjectCache>>,
    limits: UploadSettings,
}

impl MediaService {
    pub fn new(
        reader: Arc<dyn MediaRepo>,
        writer: Arc<dyn MediaWriteRepo>,
        cache: Option<Arc<ObjectCache>>,
        limits: UploadSettings,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            limits,
        }
    }

    /// Validate, process and store an upload.
    pub async fn upload(
        &self,
        client_name: &str,
        description: &str,
        bytes: Bytes,
    ) -> Result<UploadOutcome, MediaError> {
        if let Err(rejection) = self.check_size(bytes.len()) {
            return Ok(self.reject(rejection, bytes.len()));
        }

        let started = Instant::now();
        let processed = process_media(bytes, &self.limits);
        histogram!("quill_upload_process_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        let record = MediaRecord {
            id: Uuid::new_v4(),
            name: client_file_name(client_name).to_string(),
            kind: processed.kind,
            description: description.to_string(),
            file: processed.file,
            thumbnail: processed.thumbnail,
            width: processed.width,
            height: processed.height,
            uploaded_at: OffsetDateTime::now_utc(),
        };
        check_invariants(&record)?;

        self.writer.insert_media(record.clone()).await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.apply(&Mutation::MediaUploaded);
        }

        counter!("quill_upload_total", "outcome" => record.kind.as_str()).increment(1);
        Ok(UploadOutcome::stored(&record))
    }

    /// Record a refused upload and build the `ERROR` outcome for it.
    pub fn reject(&self, rejection: UploadRejection, size: usize) -> UploadOutcome {
        warn!(
            target = "quill::application::media",
            reason = rejection.as_str(),
            size,
            limit = self.limits.max_file_bytes.get(),
            "upload rejected"
        );
        counter!("quill_upload_total", "outcome" => rejection.as_str()).increment(1);
        UploadOutcome::rejected()
    }

    pub fn check_size(&self, len: usize) -> Result<(), UploadRejection> {
        if len == 0 {
            Err(UploadRejection::Empty)
        } else if len > self.limits.max_file_bytes.get() {
            Err(UploadRejection::TooLarge)
        } else {
            Ok(())
        }
    }

    /// Media record by id. Misses are not cached.
    pub async fn find(&self, id: Uuid) -> Result<Option<MediaRecord>, MediaError> {
        if let Some(media) = self.cache.as_ref().and_then(|cache| cache.media(id)) {
            return Ok(Some(media));
        }

        let media = self.reader.find_media(id).await?;
        if let (Some(cache), Some(media)) = (self.cache.as_ref(), media.as_ref()) {
            cache.set_media(media.clone());
        }
        Ok(media)
    }

    /// Summaries for the editor's file picker, newest first.
    pub async fn files(&self) -> Result<Vec<MediaSummary>, MediaError> {
        if let Some(files) = self.cache.as_ref().and_then(|cache| cache.files()) {
            return Ok(files);
        }

        let files = self.reader.list_summaries().await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.set_files(files.clone());
        }
        Ok(files)
    }

    /// Delete the media row if it exists. Unknown ids are not an error.
    pub async fn remove(&self, id: Uuid) -> Result<bool, MediaError> {
        let removed = self.writer.delete_media(id).await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.apply(&Mutation::MediaRemoved(id));
        }
        Ok(removed)
    }
}
