//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{MediaRecord, MediaSummary, PageRecord, SettingRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn find_setting(&self, name: &str) -> Result<Option<SettingRecord>, RepoError>;

    async fn upsert_setting(&self, record: SettingRecord) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PagesRepo: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError>;

    /// Every page, drafts included, ordered by title.
    async fn list_all(&self) -> Result<Vec<PageRecord>, RepoError>;

    /// Pages owned by `owner`, newest first, drafts included.
    async fn list_children(&self, owner: Uuid) -> Result<Vec<PageRecord>, RepoError>;

    /// Published root pages ordered by title.
    async fn list_published_roots(&self) -> Result<Vec<PageRecord>, RepoError>;

    /// Published pages, newest `created_at` first.
    async fn list_recent_published(&self, limit: usize) -> Result<Vec<PageRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePageParams {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub draft: bool,
    pub owner_id: Option<Uuid>,
}

/// Fields an edit may change. The slug is assigned once at creation.
#[derive(Debug, Clone)]
pub struct UpdatePageParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub draft: bool,
    pub owner_id: Option<Uuid>,
}

#[async_trait]
pub trait PagesWriteRepo: Send + Sync {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError>;

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError>;

    async fn set_draft(&self, id: Uuid, draft: bool) -> Result<PageRecord, RepoError>;

    /// Delete the page; pages it owned become root pages.
    async fn delete_page(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait MediaRepo: Send + Sync {
    async fn find_media(&self, id: Uuid) -> Result<Option<MediaRecord>, RepoError>;

    /// Every media row without payloads, newest first.
    async fn list_summaries(&self) -> Result<Vec<MediaSummary>, RepoError>;
}

#[async_trait]
pub trait MediaWriteRepo: Send + Sync {
    async fn insert_media(&self, record: MediaRecord) -> Result<(), RepoError>;

    /// Returns `false` when no row matched.
    async fn delete_media(&self, id: Uuid) -> Result<bool, RepoError>;
}
