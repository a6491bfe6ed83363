use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::{HttpError, repo_error_to_http};
use crate::application::pages::{PageError, PageService};
use crate::application::repos::{
    CreatePageParams, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
};
use crate::application::site::{SiteError, SiteService};
use crate::cache::{Mutation, ObjectCache};
use crate::domain::entities::{PageLink, PageRecord};
use crate::domain::error::DomainError;
use crate::domain::pages::{PageTree, group_tree, validate_owner};

const SOURCE: &str = "application::admin::pages::AdminPageService";

#[derive(Debug, Error)]
pub enum AdminPageError {
    #[error("page not found")]
    NotFound,
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<AdminPageError> for HttpError {
    fn from(err: AdminPageError) -> Self {
        match err {
            AdminPageError::NotFound => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Page not found",
                "page not found",
            ),
            AdminPageError::Page(err) => err.into(),
            AdminPageError::Site(err) => err.into(),
            AdminPageError::Repo(err) => repo_error_to_http(SOURCE, &err),
        }
    }
}

/// Data behind the admin landing page.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub pages: Vec<PageTree>,
    pub front: Option<String>,
    pub links: Vec<PageLink>,
}

/// Data behind the page editor.
#[derive(Debug, Clone)]
pub struct EditForm {
    pub page: Option<PageRecord>,
    /// Root pages the edited page may be attached to.
    pub owners: Vec<PageRecord>,
    pub owner: Option<Uuid>,
    pub draft: bool,
    pub front: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SavePageCommand {
    /// Existing page to update. Unknown ids create a new page.
    pub key: Option<Uuid>,
    pub title: String,
    /// Requested slug, only used when the page is created.
    pub slug: String,
    pub content: String,
    pub draft: bool,
    pub front: bool,
    pub owner: Option<Uuid>,
}

#[derive(Clone)]
pub struct AdminPageService {
    reader: Arc<dyn PagesRepo>,
    writer: Arc<dyn PagesWriteRepo>,
    pages: PageService,
    site: SiteService,
    cache: Option<Arc<ObjectCache>>,
}

impl AdminPageService {
    pub fn new(
        reader: Arc<dyn PagesRepo>,
        writer: Arc<dyn PagesWriteRepo>,
        site: SiteService,
        cache: Option<Arc<ObjectCache>>,
    ) -> Self {
        Self {
            pages: PageService::new(reader.clone(), cache.clone()),
            reader,
            writer,
            site,
            cache,
        }
    }

    pub async fn dashboard(&self) -> Result<Dashboard, AdminPageError> {
        let prefs = self.site.load().await?;
        let pages = group_tree(self.pages.list_all().await?);
        let links = self.pages.links(prefs.front.as_deref()).await?;
        Ok(Dashboard {
            pages,
            front: prefs.front,
            links,
        })
    }

    /// Editor state for `slug`, or a blank form when there is no such page.
    pub async fn edit_form(&self, slug: Option<&str>) -> Result<EditForm, AdminPageError> {
        let page = match slug {
            Some(slug) => self.pages.resolve(slug).await?,
            None => None,
        };
        let prefs = self.site.load().await?;

        let own_id = page.as_ref().map(|page| page.id);
        let owners = self
            .pages
            .list_all()
            .await?
            .into_iter()
            .filter(|candidate| candidate.is_root() && Some(candidate.id) != own_id)
            .collect();

        Ok(EditForm {
            owner: page.as_ref().and_then(|page| page.owner_id),
            draft: page.as_ref().is_none_or(|page| page.draft),
            front: page.as_ref().is_some_and(|page| prefs.is_front(&page.slug)),
            page,
            owners,
        })
    }

    /// Create or update a page, then bring the front-page preference in line
    /// with the `front` flag.
    pub async fn save(&self, command: SavePageCommand) -> Result<PageRecord, AdminPageError> {
        let draft = command.draft && !command.front;
        let existing = match command.key {
            Some(id) => self.reader.find_by_id(id).await?,
            None => None,
        };
        let owner = self.accepted_owner(existing.as_ref(), command.owner).await?;

        let (page, previous_owner) = match existing {
            Some(existing) => {
                let page = self
                    .writer
                    .update_page(UpdatePageParams {
                        id: existing.id,
                        title: command.title,
                        content: command.content,
                        draft,
                        owner_id: owner,
                    })
                    .await?;
                (page, existing.owner_id)
            }
            None => {
                let slug = self.pages.unique_slug(&command.slug, &command.title).await?;
                let page = self
                    .writer
                    .create_page(CreatePageParams {
                        title: command.title,
                        slug,
                        content: command.content,
                        draft,
                        owner_id: owner,
                    })
                    .await?;
                (page, None)
            }
        };

        self.apply(Mutation::PageSaved {
            slug: page.slug.clone(),
            previous_owner,
            owner: page.owner_id,
        });

        let mut prefs = self.site.load().await?;
        if command.front && !prefs.is_front(&page.slug) {
            prefs.front = Some(page.slug.clone());
            self.site.save(prefs).await?;
        } else if !command.front && prefs.is_front(&page.slug) {
            prefs.front = None;
            self.site.save(prefs).await?;
        }

        info!(
            target = "quill::application::admin::pages",
            page_id = %page.id,
            slug = %page.slug,
            draft = page.draft,
            "page saved"
        );
        Ok(page)
    }

    pub async fn publish(&self, key: &str) -> Result<PageRecord, AdminPageError> {
        self.set_draft(key, false).await
    }

    pub async fn unpublish(&self, key: &str) -> Result<PageRecord, AdminPageError> {
        self.set_draft(key, true).await
    }

    /// Delete the page behind `slug`. Pages it owned become root pages and
    /// the front page is cleared when it pointed here.
    pub async fn remove(&self, slug: &str) -> Result<PageRecord, AdminPageError> {
        let page = self
            .pages
            .resolve(slug)
            .await?
            .ok_or(AdminPageError::NotFound)?;
        let orphaned = self
            .reader
            .list_children(page.id)
            .await?
            .into_iter()
            .map(|child| child.slug)
            .collect();

        self.writer.delete_page(page.id).await?;
        self.apply(Mutation::PageRemoved {
            id: page.id,
            slug: page.slug.clone(),
            owner: page.owner_id,
            orphaned,
        });

        let mut prefs = self.site.load().await?;
        if prefs.is_front(&page.slug) {
            prefs.front = None;
            self.site.save(prefs).await?;
        }

        info!(
            target = "quill::application::admin::pages",
            page_id = %page.id,
            slug = %page.slug,
            "page removed"
        );
        Ok(page)
    }

    async fn set_draft(&self, key: &str, draft: bool) -> Result<PageRecord, AdminPageError> {
        let id = Uuid::parse_str(key.trim()).map_err(|_| AdminPageError::NotFound)?;
        if self.reader.find_by_id(id).await?.is_none() {
            return Err(AdminPageError::NotFound);
        }

        let page = self.writer.set_draft(id, draft).await?;
        self.apply(Mutation::PagePublicationChanged {
            slug: page.slug.clone(),
            owner: page.owner_id,
        });
        Ok(page)
    }

    /// The requested owner when it may own the page, otherwise `None`.
    async fn accepted_owner(
        &self,
        page: Option<&PageRecord>,
        requested: Option<Uuid>,
    ) -> Result<Option<Uuid>, AdminPageError> {
        let Some(owner_id) = requested else {
            return Ok(None);
        };
        let Some(owner) = self.reader.find_by_id(owner_id).await? else {
            warn!(
                target = "quill::application::admin::pages",
                owner_id = %owner_id,
                "requested owner does not exist; saving as root page"
            );
            return Ok(None);
        };

        let mut verdict = validate_owner(page.map(|page| page.id), &owner);
        if verdict.is_ok()
            && let Some(page) = page
            && !self.reader.list_children(page.id).await?.is_empty()
        {
            verdict = Err(DomainError::owns_subpages(&page.slug));
        }

        match verdict {
            Ok(()) => Ok(Some(owner.id)),
            Err(err) => {
                warn!(
                    target = "quill::application::admin::pages",
                    owner_id = %owner_id,
                    error = %err,
                    "requested owner rejected; saving as root page"
                );
                Ok(None)
            }
        }
    }

    fn apply(&self, mutation: Mutation) {
        if let Some(cache) = self.cache.as_ref() {
            cache.apply(&mutation);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::SettingsRepo;
    use crate::cache::CacheConfig;
    use crate::domain::entities::SettingRecord;

    #[derive(Default)]
    struct MemoryPages {
        rows: Mutex<Vec<PageRecord>>,
    }

    impl MemoryPages {
        fn by_slug(&self, slug: &str) -> Option<PageRecord> {
            self.rows
                .lock()
                .expect("lock")
                .iter()
                .find(|page| page.slug == slug)
                .cloned()
        }
    }

    #[async_trait]
    impl PagesRepo for MemoryPages {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, RepoError> {
            Ok(self.by_slug(slug))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError> {
            Ok(self
                .rows
                .lock()
                .expect("lock")
                .iter()
                .find(|page| page.id == id)
                .cloned())
        }

        async fn list_all(&self) -> Result<Vec<PageRecord>, RepoError> {
            Ok(self.rows.lock().expect("lock").clone())
        }

        async fn list_children(&self, owner: Uuid) -> Result<Vec<PageRecord>, RepoError> {
            Ok(self
                .rows
                .lock()
                .expect("lock")
                .iter()
                .filter(|page| page.owner_id == Some(owner))
                .cloned()
                .collect())
        }

        async fn list_published_roots(&self) -> Result<Vec<PageRecord>, RepoError> {
            let mut roots: Vec<_> = self
                .rows
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

    #[async_trait]
    impl PagesWriteRepo for MemoryPages {
        async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
            let now = OffsetDateTime::now_utc();
            let page = PageRecord {
                id: Uuid::new_v4(),
                title: params.title,
                slug: params.slug,
                content: params.content,
                draft: params.draft,
                owner_id: params.owner_id,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().expect("lock").push(page.clone());
            Ok(page)
        }

        async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
            let mut rows = self.rows.lock().expect("lock");
            let page = rows
                .iter_mut()
                .find(|page| page.id == params.id)
                .ok_or(RepoError::NotFound)?;
            page.title = params.title;
            page.content = params.content;
            page.draft = params.draft;
            page.owner_id = params.owner_id;
            Ok(page.clone())
        }

        async fn set_draft(&self, id: Uuid, draft: bool) -> Result<PageRecord, RepoError> {
            let mut rows = self.rows.lock().expect("lock");
            let page = rows
                .iter_mut()
                .find(|page| page.id == id)
                .ok_or(RepoError::NotFound)?;
            page.draft = draft;
            Ok(page.clone())
        }

        async fn delete_page(&self, id: Uuid) -> Result<(), RepoError> {
            let mut rows = self.rows.lock().expect("lock");
            rows.retain(|page| page.id != id);
            for page in rows.iter_mut().filter(|page| page.owner_id == Some(id)) {
                page.owner_id = None;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySettings {
        value: Mutex<Option<String>>,
    }

    #[async_trait]
    impl SettingsRepo for MemorySettings {
        async fn find_setting(&self, name: &str) -> Result<Option<SettingRecord>, RepoError> {
            Ok(self.value.lock().expect("lock").clone().map(|value| SettingRecord {
                name: name.to_string(),
                value,
            }))
        }

        async fn upsert_setting(&self, record: SettingRecord) -> Result<(), RepoError> {
            *self.value.lock().expect("lock") = Some(record.value);
            Ok(())
        }
    }

    fn service() -> (AdminPageService, Arc<MemoryPages>, SiteService) {
        let pages = Arc::new(MemoryPages::default());
        let cache = Some(Arc::new(ObjectCache::new(&CacheConfig::default())));
        let site = SiteService::new(Arc::new(MemorySettings::default()), cache.clone());
        let service = AdminPageService::new(pages.clone(), pages.clone(), site.clone(), cache);
        (service, pages, site)
    }

    fn command(title: &str, slug: &str) -> SavePageCommand {
        SavePageCommand {
            title: title.to_string(),
            slug: slug.to_string(),
            content: format!("<p>{title}</p>"),
            ..SavePageCommand::default()
        }
    }

    #[tokio::test]
    async fn second_page_with_same_slug_gets_suffix() {
        let (service, _, _) = service();

        let first = service.save(command("About", "about")).await.expect("first");
        let second = service.save(command("About", "about")).await.expect("second");

        assert_eq!(first.slug, "about");
        assert_eq!(second.slug, "about-1");
    }

    #[tokio::test]
    async fn update_keeps_slug() {
        let (service, _, _) = service();
        let page = service.save(command("About", "about")).await.expect("create");

        let updated = service
            .save(SavePageCommand {
                key: Some(page.id),
                ..command("About us", "renamed")
            })
            .await
            .expect("update");

        assert_eq!(updated.id, page.id);
        assert_eq!(updated.slug, "about");
        assert_eq!(updated.title, "About us");
    }

    #[tokio::test]
    async fn front_flag_publishes_and_sets_preference() {
        let (service, _, site) = service();

        let page = service
            .save(SavePageCommand {
                draft: true,
                front: true,
                ..command("Home", "home")
            })
            .await
            .expect("save");

        assert!(!page.draft);
        assert_eq!(site.load().await.expect("prefs").front.as_deref(), Some("home"));

        service
            .save(SavePageCommand {
                key: Some(page.id),
                ..command("Home", "home")
            })
            .await
            .expect("unfront");
        assert_eq!(site.load().await.expect("prefs").front, None);
    }

    #[tokio::test]
    async fn invalid_owners_are_dropped() {
        let (service, _, _) = service();
        let root = service.save(command("Docs", "docs")).await.expect("root");
        let child = service
            .save(SavePageCommand {
                owner: Some(root.id),
                ..command("Install", "install")
            })
            .await
            .expect("child");
        assert_eq!(child.owner_id, Some(root.id));

        let grandchild = service
            .save(SavePageCommand {
                owner: Some(child.id),
                ..command("Deep", "deep")
            })
            .await
            .expect("grandchild");
        assert_eq!(grandchild.owner_id, None);

        let ghost = service
            .save(SavePageCommand {
                owner: Some(Uuid::new_v4()),
                ..command("Ghost", "ghost")
            })
            .await
            .expect("ghost");
        assert_eq!(ghost.owner_id, None);

        let other = service.save(command("Other", "other")).await.expect("other");
        let moved = service
            .save(SavePageCommand {
                key: Some(root.id),
                owner: Some(other.id),
                ..command("Docs", "docs")
            })
            .await
            .expect("move");
        assert_eq!(moved.owner_id, None);
    }

    #[tokio::test]
    async fn publish_toggles_links() {
        let (service, _, _) = service();
        let page = service
            .save(SavePageCommand {
                draft: true,
                ..command("News", "news")
            })
            .await
            .expect("save");
        assert!(service.dashboard().await.expect("dash").links.is_empty());

        service.publish(&page.id.to_string()).await.expect("publish");
        let links = service.dashboard().await.expect("dash").links;
        assert_eq!(links.len(), 1);

        service.unpublish(&page.id.to_string()).await.expect("unpublish");
        assert!(service.dashboard().await.expect("dash").links.is_empty());

        assert!(matches!(
            service.publish("not-a-key").await,
            Err(AdminPageError::NotFound)
        ));
        assert!(matches!(
            service.publish(&Uuid::new_v4().to_string()).await,
            Err(AdminPageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn remove_clears_front_and_orphans_children() {
        let (service, pages, site) = service();
        let root = service
            .save(SavePageCommand {
                front: true,
                ..command("Home", "home")
            })
            .await
            .expect("root");
        let child = service
            .save(SavePageCommand {
                owner: Some(root.id),
                ..command("Child", "child")
            })
            .await
            .expect("child");

        service.remove("home").await.expect("remove");

        assert_eq!(site.load().await.expect("prefs").front, None);
        assert!(pages.by_slug("home").is_none());
        let form = service.edit_form(Some("child")).await.expect("form");
        assert_eq!(form.page.map(|page| page.id), Some(child.id));
        assert_eq!(form.owner, None);
        assert!(matches!(
            service.remove("home").await,
            Err(AdminPageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn edit_form_excludes_self_and_subpages_from_owners() {
        let (service, _, _) = service();
        let root = service.save(command("Docs", "docs")).await.expect("root");
        service
            .save(SavePageCommand {
                owner: Some(root.id),
                ..command("Install", "install")
            })
            .await
            .expect("child");
        service.save(command("Blog", "blog")).await.expect("other");

        let form = service.edit_form(Some("docs")).await.expect("form");
        let owners: Vec<_> = form.owners.iter().map(|page| page.slug.as_str()).collect();
        assert_eq!(owners, vec!["blog"]);
        assert!(!form.draft);

        let blank = service.edit_form(None).await.expect("blank");
        assert!(blank.page.is_none());
        assert!(blank.draft);
        assert_eq!(blank.owners.len(), 2);
    }
}
