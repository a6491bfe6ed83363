use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreatePageParams, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
    },
    domain::entities::PageRecord,
};

use super::{PostgresRepositories, map_sqlx_error, util::sql_limit};

const PAGE_COLUMNS: &str = "id, title, slug, content, draft, owner_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PageRow {
    id: Uuid,
    title: String,
    slug: String,
    content: String,
    draft: bool,
    owner_id: Option<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PageRow> for PageRecord {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            draft: row.draft,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn fetch_pages(&self, sql: &str) -> Result<Vec<PageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PageRow>(sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PageRecord::from).collect())
    }
}

#[async_trait]
impl PagesRepo for PostgresRepositories {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError> {
        let row = sqlx::query_as::<_, PageRow>(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PageRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError> {
        let row = sqlx::query_as::<_, PageRow>(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PageRecord::from))
    }

    async fn list_all(&self) -> Result<Vec<PageRecord>, RepoError> {
        self.fetch_pages(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages ORDER BY title, slug"
        ))
        .await
    }

    async fn list_children(&self, owner: Uuid) -> Result<Vec<PageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PageRow>(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PageRecord::from).collect())
    }

    async fn list_published_roots(&self) -> Result<Vec<PageRecord>, RepoError> {
        self.fetch_pages(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages \
             WHERE owner_id IS NULL AND NOT draft \
             ORDER BY title, slug"
        ))
        .await
    }

    async fn list_recent_published(&self, limit: usize) -> Result<Vec<PageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PageRow>(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE NOT draft \
             ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PageRecord::from).collect())
    }
}

#[async_trait]
impl PagesWriteRepo for PostgresRepositories {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let row = sqlx::query_as::<_, PageRow>(&format!(
            "INSERT INTO pages (id, title, slug, content, draft, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.content)
        .bind(params.draft)
        .bind(params.owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
        let row = sqlx::query_as::<_, PageRow>(&format!(
            "UPDATE pages \
             SET title = $2, content = $3, draft = $4, owner_id = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.draft)
        .bind(params.owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }

    async fn set_draft(&self, id: Uuid, draft: bool) -> Result<PageRecord, RepoError> {
        let row = sqlx::query_as::<_, PageRow>(&format!(
            "UPDATE pages SET draft = $2, updated_at = now() WHERE id = $1 \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(draft)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }

    async fn delete_page(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
