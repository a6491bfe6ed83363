//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

/// Storage class of a media record.
///
/// `Image` rows were successfully decoded and re-encoded as JPEG and always
/// carry a thumbnail; `File` rows hold the raw upload with zero dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "media_kind", rename_all = "UPPERCASE")]
pub enum MediaKind {
    Image,
    File,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "IMAGE",
            MediaKind::File => "FILE",
        }
    }
}

/// Variant of an image requested from the public image route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Full,
    Thumb,
}

impl ImageSize {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full" => Some(ImageSize::Full),
            "thumb" => Some(ImageSize::Thumb),
            _ => None,
        }
    }
}
