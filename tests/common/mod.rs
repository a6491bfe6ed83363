#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use quill::{
    application::{
        admin::{pages::AdminPageService, site::AdminSiteService},
        feed::FeedService,
        media::MediaService,
        pages::PageService,
        render::LayoutRenderer,
        repos::{
            CreatePageParams, HealthRepo, MediaRepo, MediaWriteRepo, PagesRepo, PagesWriteRepo,
            RepoError, SettingsRepo, UpdatePageParams,
        },
        site::SiteService,
    },
    cache::{CacheConfig, ObjectCache},
    config::{FeedSettings, UploadSettings},
    domain::entities::{MediaRecord, MediaSummary, PageRecord, SettingRecord},
    infra::http::{AdminState, HttpState, build_admin_router, build_router},
};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

pub const UPLOAD_BODY_LIMIT: usize = 1024 * 1024 + 64 * 1024;

/// Storage shared by every repository trait, held in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub settings: Mutex<Vec<SettingRecord>>,
    pub pages: Mutex<Vec<PageRecord>>,
    pub media: Mutex<Vec<MediaRecord>>,
    pub media_finds: Mutex<usize>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("store lock")
}

impl MemoryStore {
    pub fn page(&self, slug: &str) -> Option<PageRecord> {
        guard(&self.pages)
            .iter()
            .find(|page| page.slug == slug)
            .cloned()
    }

    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<_> = guard(&self.pages)
            .iter()
            .map(|page| page.slug.clone())
            .collect();
        slugs.sort();
        slugs
    }

    /// Insert a page directly, bypassing services. Later calls get later
    /// creation times.
    pub fn seed_page(&self, title: &str, slug: &str, draft: bool, owner: Option<Uuid>) -> PageRecord {
        let mut pages = guard(&self.pages);
        let created = OffsetDateTime::now_utc() + Duration::seconds(pages.len() as i64);
        let page = PageRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            content: format!("<p>{title} body</p>"),
            draft,
            owner_id: owner,
            created_at: created,
            updated_at: created,
        };
        pages.push(page.clone());
        page
    }

    pub fn media_count(&self) -> usize {
        guard(&self.media).len()
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl SettingsRepo for MemoryStore {
    async fn find_setting(&self, name: &str) -> Result<Option<SettingRecord>, RepoError> {
        Ok(guard(&self.settings)
            .iter()
            .find(|row| row.name == name)
            .cloned())
    }

    async fn upsert_setting(&self, record: SettingRecord) -> Result<(), RepoError> {
        let mut rows = guard(&self.settings);
        rows.retain(|row| row.name != record.name);
        rows.push(record);
        Ok(())
    }
}

#[async_trait]
impl PagesRepo for MemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError> {
        Ok(self.page(slug))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError> {
        Ok(guard(&self.pages).iter().find(|page| page.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<PageRecord>, RepoError> {
        let mut pages = guard(&self.pages).clone();
        pages.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pages)
    }

    async fn list_children(&self, owner: Uuid) -> Result<Vec<PageRecord>, RepoError> {
        let mut pages: Vec<_> = guard(&self.pages)
            .iter()
            .filter(|page| page.owner_id == Some(owner))
            .cloned()
            .collect();
        pages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pages)
    }

    async fn list_published_roots(&self) -> Result<Vec<PageRecord>, RepoError> {
        let mut pages: Vec<_> = guard(&self.pages)
            .iter()
            .filter(|page| page.is_root() && page.is_published())
            .cloned()
            .collect();
        pages.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pages)
    }

    async fn list_recent_published(&self, limit: usize) -> Result<Vec<PageRecord>, RepoError> {
        let mut pages: Vec<_> = guard(&self.pages)
            .iter()
            .filter(|page| page.is_published())
            .cloned()
            .collect();
        pages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pages.truncate(limit);
        Ok(pages)
    }
}

#[async_trait]
impl PagesWriteRepo for MemoryStore {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let mut pages = guard(&self.pages);
        if pages.iter().any(|page| page.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "pages_slug_key".into(),
            });
        }
        let created = OffsetDateTime::now_utc() + Duration::seconds(pages.len() as i64);
        let page = PageRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            content: params.content,
            draft: params.draft,
            owner_id: params.owner_id,
            created_at: created,
            updated_at: created,
        };
        pages.push(page.clone());
        Ok(page)
    }

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
        let mut pages = guard(&self.pages);
        let page = pages
            .iter_mut()
            .find(|page| page.id == params.id)
            .ok_or(RepoError::NotFound)?;
        page.title = params.title;
        page.content = params.content;
        page.draft = params.draft;
        page.owner_id = params.owner_id;
        page.updated_at = OffsetDateTime::now_utc();
        Ok(page.clone())
    }

    async fn set_draft(&self, id: Uuid, draft: bool) -> Result<PageRecord, RepoError> {
        let mut pages = guard(&self.pages);
        let page = pages
            .iter_mut()
            .find(|page| page.id == id)
            .ok_or(RepoError::NotFound)?;
        page.draft = draft;
        Ok(page.clone())
    }

    async fn delete_page(&self, id: Uuid) -> Result<(), RepoError> {
        let mut pages = guard(&self.pages);
        pages.retain(|page| page.id != id);
        for page in pages.iter_mut().filter(|page| page.owner_id == Some(id)) {
            page.owner_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaRepo for MemoryStore {
    async fn find_media(&self, id: Uuid) -> Result<Option<MediaRecord>, RepoError> {
        *guard(&self.media_finds) += 1;
        Ok(guard(&self.media).iter().find(|row| row.id == id).cloned())
    }

    async fn list_summaries(&self) -> Result<Vec<MediaSummary>, RepoError> {
        Ok(guard(&self.media)
            .iter()
            .rev()
            .map(MediaRecord::summary)
            .collect())
    }
}

#[async_trait]
impl MediaWriteRepo for MemoryStore {
    async fn insert_media(&self, record: MediaRecord) -> Result<(), RepoError> {
        guard(&self.media).push(record);
        Ok(())
    }

    async fn delete_media(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut rows = guard(&self.media);
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() != before)
    }
}

/// Both listeners' routers over one store and one cache.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub public: Router,
    pub admin: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache(true)
    }

    pub fn with_cache(enabled: bool) -> Self {
        let store = Arc::new(MemoryStore::default());
        let config = CacheConfig {
            enabled,
            ..CacheConfig::default()
        };
        let cache = enabled.then(|| Arc::new(ObjectCache::new(&config)));

        let site = SiteService::new(store.clone(), cache.clone());
        let http = HttpState {
            site: site.clone(),
            pages: PageService::new(store.clone(), cache.clone()),
            feed: FeedService::new(
                store.clone(),
                site.clone(),
                cache.clone(),
                FeedSettings::default(),
            ),
            media: MediaService::new(
                store.clone(),
                store.clone(),
                cache.clone(),
                UploadSettings::default(),
            ),
            layout: Arc::new(LayoutRenderer::default()),
            health: store.clone(),
        };
        let admin = AdminState {
            http: http.clone(),
            pages: AdminPageService::new(store.clone(), store.clone(), site.clone(), cache),
            site: AdminSiteService::new(site),
        };

        Self {
            public: build_router(http),
            admin: build_admin_router(admin, UPLOAD_BODY_LIMIT),
            store,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(router, request).await
}

pub async fn post_form(router: &Router, uri: &str, form: &str) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request should build");
    send(router, request).await
}

const BOUNDARY: &str = "quill-test-boundary";

/// Multipart body with a `file` part and a `description` part.
pub fn multipart_body(file_name: &str, bytes: &[u8], description: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(router: &Router, file_name: &str, bytes: &[u8], description: &str) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri("/admin/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(file_name, bytes, description)))
        .expect("request should build");
    send(router, request).await
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Value of `data-<name>="..."` in an upload fragment.
pub fn data_attr(html: &str, name: &str) -> Option<String> {
    let marker = format!("data-{name}=\"");
    let start = html.find(&marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}
