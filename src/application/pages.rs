//! Page lookups for the public site.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::application::error::{HttpError, repo_error_to_http};
use crate::application::repos::{PagesRepo, RepoError};
use crate::cache::{Lookup, ObjectCache};
use crate::domain::entities::{PageLink, PageRecord};
use crate::domain::pages::is_public_link;
use crate::domain::slug::{SlugAsyncError, SlugError, base_slug, generate_unique_slug_async};

const SOURCE: &str = "application::pages::PageService";

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Slug(#[from] SlugError),
}

impl From<SlugAsyncError<RepoError>> for PageError {
    fn from(err: SlugAsyncError<RepoError>) -> Self {
        match err {
            SlugAsyncError::Slug(err) => Self::Slug(err),
            SlugAsyncError::Predicate(err) => Self::Repo(err),
        }
    }
}

impl From<PageError> for HttpError {
    fn from(err: PageError) -> Self {
        match &err {
            PageError::Repo(repo) => repo_error_to_http(SOURCE, repo),
            PageError::Slug(_) => HttpError::from_error(
                SOURCE,
                StatusCode::CONFLICT,
                "Could not allocate a page address",
                &err,
            ),
        }
    }
}

#[derive(Clone)]
pub struct PageService {
    pages: Arc<dyn PagesRepo>,
    cache: Option<Arc<ObjectCache>>,
}

impl PageService {
    pub fn new(pages: Arc<dyn PagesRepo>, cache: Option<Arc<ObjectCache>>) -> Self {
        Self { pages, cache }
    }

    /// Page by slug, drafts included. Confirmed misses are cached too.
    pub async fn resolve(&self, slug: &str) -> Result<Option<PageRecord>, PageError> {
        if let Some(lookup) = self.cache.as_ref().and_then(|cache| cache.page(slug)) {
            return Ok(lookup.into_option());
        }

        let page = self.pages.find_by_slug(slug).await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.set_page(slug, Lookup::from(page.clone()));
        }
        Ok(page)
    }

    /// Subpages of `owner`, newest first, drafts included.
    pub async fn subpages(&self, owner: Uuid) -> Result<Vec<PageRecord>, PageError> {
        if let Some(pages) = self.cache.as_ref().and_then(|cache| cache.subpages(owner)) {
            return Ok(pages);
        }

        let pages = self.pages.list_children(owner).await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.set_subpages(owner, pages.clone());
        }
        Ok(pages)
    }

    /// Published subpages only, for public rendering.
    pub async fn public_subpages(&self, owner: Uuid) -> Result<Vec<PageRecord>, PageError> {
        let mut pages = self.subpages(owner).await?;
        pages.retain(PageRecord::is_published);
        Ok(pages)
    }

    /// Navigation links: published root pages by title, minus the front page.
    pub async fn links(&self, front: Option<&str>) -> Result<Vec<PageLink>, PageError> {
        if let Some(links) = self.cache.as_ref().and_then(|cache| cache.links()) {
            return Ok(links);
        }

        let links: Vec<PageLink> = self
            .pages
            .list_published_roots()
            .await?
            .iter()
            .filter(|page| is_public_link(page, front))
            .map(PageLink::from)
            .collect();

        if let Some(cache) = self.cache.as_ref() {
            cache.set_links(links.clone());
        }
        Ok(links)
    }

    /// Every page, for the admin dashboard and owner pickers. Not cached.
    pub async fn list_all(&self) -> Result<Vec<PageRecord>, PageError> {
        Ok(self.pages.list_all().await?)
    }

    /// Slug for a new page: `requested` sanitized (or derived from `title`),
    /// suffixed with `-1`, `-2`, ... until unused.
    pub async fn unique_slug(&self, requested: &str, title: &str) -> Result<String, PageError> {
        let base = base_slug(requested, title);
        let slug = generate_unique_slug_async(&base, |candidate| {
            let candidate = candidate.to_string();
            async move { Ok::<bool, RepoError>(self.resolve_for_slug(&candidate).await?.is_none()) }
        })
        .await?;
        Ok(slug)
    }

    async fn resolve_for_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError> {
        match self.resolve(slug).await {
            Ok(page) => Ok(page),
            Err(PageError::Repo(err)) => Err(err),
            Err(PageError::Slug(err)) => Err(RepoError::from_persistence(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{CacheConfig, Mutation};
    use crate::domain::pages::tests::sample_page;

    #[derive(Default)]
    struct StubPagesRepo {
        pages: Mutex<Vec<PageRecord>>,
        slug_queries: Mutex<usize>,
    }

    impl StubPagesRepo {
        fn with(pages: Vec<PageRecord>) -> Self {
            Self {
                pages: Mutex::new(pages),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PagesRepo for StubPagesRepo {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError> {
            *self.slug_queries.lock().expect("lock") += 1;
            Ok(self
                .pages
                .lock()
                .expect("lock")
                .iter()
                .find(|page| page.slug == slug)
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError> {
            Ok(self
                .pages
                .lock()
                .expect("lock")
                .iter()
                .find(|page| page.id == id)
                .cloned())
        }

        async fn list_all(&self) -> Result<Vec<PageRecord>, RepoError> {
            Ok(self.pages.lock().expect("lock").clone())
        }

        async fn list_children(&self, owner: Uuid) -> Result<Vec<PageRecord>, RepoError> {
            Ok(self
                .pages
                .lock()
                .expect("lock")
                .iter()
                .filter(|page| page.owner_id == Some(owner))
                .cloned()
                .collect())
        }

        async fn list_published_roots(&self) -> Result<Vec<PageRecord>, RepoError> {
            let mut roots: Vec<_> = self
                .pages
                .lock()
                .expect("lock")
                .iter()
                .filter(|page| page.is_root() && page.is_published())
                .cloned()
                .collect();
            roots.sort_by(|a, b| a.title.cmp(&b.title));
            Ok(roots)
        }

        async fn list_recent_published(&self, _limit: usize) -> Result<Vec<PageRecord>, RepoError> {
            Ok(Vec::new())
        }
    }

    fn service(repo: Arc<StubPagesRepo>) -> (PageService, Arc<ObjectCache>) {
        let cache = Arc::new(ObjectCache::new(&CacheConfig::default()));
        (PageService::new(repo, Some(cache.clone())), cache)
    }

    #[tokio::test]
    async fn misses_are_cached_until_a_save_names_the_slug() {
        let repo = Arc::new(StubPagesRepo::default());
        let (service, cache) = service(repo.clone());

        assert!(service.resolve("ghost").await.expect("resolve").is_none());
        assert!(service.resolve("ghost").await.expect("resolve").is_none());
        assert_eq!(*repo.slug_queries.lock().expect("lock"), 1);

        repo.pages.lock().expect("lock").push(sample_page("ghost", "Ghost"));
        cache.apply(&Mutation::PageSaved {
            slug: "ghost".into(),
            previous_owner: None,
            owner: None,
        });

        assert!(service.resolve("ghost").await.expect("resolve").is_some());
    }

    #[tokio::test]
    async fn unique_slug_appends_first_free_suffix() {
        let repo = Arc::new(StubPagesRepo::with(vec![
            sample_page("about", "About"),
            sample_page("about-1", "About"),
        ]));
        let (service, _) = service(repo);

        assert_eq!(service.unique_slug("about", "About").await.expect("slug"), "about-2");
        assert_eq!(service.unique_slug("contact", "").await.expect("slug"), "contact");
        assert_eq!(service.unique_slug("", "").await.expect("slug"), "page");
    }

    #[tokio::test]
    async fn links_skip_front_drafts_and_subpages() {
        let about = sample_page("about", "About");
        let mut child = sample_page("team", "Team");
        child.owner_id = Some(about.id);
        let mut draft = sample_page("draft", "Draft");
        draft.draft = true;
        let contact = sample_page("contact", "Contact");

        let repo = Arc::new(StubPagesRepo::with(vec![about, child, draft, contact]));
        let (service, _) = service(repo);

        let links = service.links(Some("about")).await.expect("links");
        let slugs: Vec<_> = links.iter().map(|link| link.slug.as_str()).collect();
        assert_eq!(slugs, vec!["contact"]);
    }

    #[tokio::test]
    async fn public_subpages_hide_drafts() {
        let owner = sample_page("docs", "Docs");
        let mut visible = sample_page("install", "Install");
        visible.owner_id = Some(owner.id);
        let mut hidden = sample_page("wip", "WIP");
        hidden.owner_id = Some(owner.id);
        hidden.draft = true;

        let repo = Arc::new(StubPagesRepo::with(vec![owner.clone(), visible, hidden]));
        let (service, _) = service(repo);

        assert_eq!(service.subpages(owner.id).await.expect("all").len(), 2);
        let public = service.public_subpages(owner.id).await.expect("public");
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].slug, "install");
    }
}
