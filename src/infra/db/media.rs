use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{MediaRepo, MediaWriteRepo, RepoError},
    domain::{
        entities::{MediaRecord, MediaSummary},
        types::MediaKind,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    name: String,
    kind: MediaKind,
    description: String,
    file: Vec<u8>,
    thumbnail: Option<Vec<u8>>,
    width: i32,
    height: i32,
    uploaded_at: OffsetDateTime,
}

impl From<MediaRow> for MediaRecord {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            kind: row.kind,
            description: row.description,
            file: Bytes::from(row.file),
            thumbnail: row.thumbnail.map(Bytes::from),
            width: row.width,
            height: row.height,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MediaSummaryRow {
    id: Uuid,
    name: String,
    kind: MediaKind,
    description: String,
    width: i32,
    height: i32,
    uploaded_at: OffsetDateTime,
}

impl From<MediaSummaryRow> for MediaSummary {
    fn from(row: MediaSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            kind: row.kind,
            description: row.description,
            width: row.width,
            height: row.height,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[async_trait]
impl MediaRepo for PostgresRepositories {
    async fn find_media(&self, id: Uuid) -> Result<Option<MediaRecord>, RepoError> {
        let row = sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT id, name, kind, description, file, thumbnail, width, height, uploaded_at
            FROM media
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MediaRecord::from))
    }

    async fn list_summaries(&self) -> Result<Vec<MediaSummary>, RepoError> {
        let rows = sqlx::query_as::<_, MediaSummaryRow>(
            r#"
            SELECT id, name, kind, description, width, height, uploaded_at
            FROM media
            ORDER BY uploaded_at DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MediaSummary::from).collect())
    }
}

#[async_trait]
impl MediaWriteRepo for PostgresRepositories {
    async fn insert_media(&self, record: MediaRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO media (id, name, kind, description, file, thumbnail, width, height, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(record.kind)
        .bind(&record.description)
        .bind(record.file.as_ref())
        .bind(record.thumbnail.as_deref())
        .bind(record.width)
        .bind(record.height)
        .bind(record.uploaded_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_media(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
