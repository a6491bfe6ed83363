//! Domain entities mirrored from persistent storage.

use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::MediaKind;

/// Raw name/value row of the settings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingRecord {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub draft: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PageRecord {
    pub fn is_published(&self) -> bool {
        !self.draft
    }

    pub fn is_root(&self) -> bool {
        self.owner_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaRecord {
    pub id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    pub description: String,
    pub file: Bytes,
    pub thumbnail: Option<Bytes>,
    pub width: i32,
    pub height: i32,
    pub uploaded_at: OffsetDateTime,
}

impl MediaRecord {
    pub fn summary(&self) -> MediaSummary {
        MediaSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            description: self.description.clone(),
            width: self.width,
            height: self.height,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Media row without its payloads, used for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    pub description: String,
    pub width: i32,
    pub height: i32,
    pub uploaded_at: OffsetDateTime,
}

/// Entry of the public navigation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

impl From<&PageRecord> for PageLink {
    fn from(page: &PageRecord) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            slug: page.slug.clone(),
        }
    }
}
