//! RSS feed of recently published pages.

use std::sync::Arc;

use axum::http::StatusCode;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc2822};

use crate::application::error::{HttpError, repo_error_to_http};
use crate::application::repos::{PagesRepo, RepoError};
use crate::application::site::{SiteError, SiteService};
use crate::cache::ObjectCache;
use crate::config::FeedSettings;
use crate::domain::entities::PageRecord;

const SOURCE: &str = "application::feed::FeedService";

pub const FEED_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error("failed to format feed date: {0}")]
    Date(#[from] time::error::Format),
}

impl From<FeedError> for HttpError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Repo(repo) => repo_error_to_http(SOURCE, &repo),
            FeedError::Site(site) => site.into(),
            FeedError::Date(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

#[derive(Clone)]
pub struct FeedService {
    pages: Arc<dyn PagesRepo>,
    site: SiteService,
    cache: Option<Arc<ObjectCache>>,
    settings: FeedSettings,
}

impl FeedService {
    pub fn new(
        pages: Arc<dyn PagesRepo>,
        site: SiteService,
        cache: Option<Arc<ObjectCache>>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            pages,
            site,
            cache,
            settings,
        }
    }

    /// Render the feed XML. Links point at `host`, or the configured
    /// fallback host when the request carried none.
    pub async fn render(&self, host: Option<&str>) -> Result<String, FeedError> {
        let prefs = self.site.load().await?;
        let items = self.items().await?;
        let host = host
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .unwrap_or(&self.settings.fallback_host);

        let pub_date = items
            .first()
            .map(|page| page.created_at)
            .unwrap_or_else(OffsetDateTime::now_utc);

        let rss_items = items
            .iter()
            .map(|page| feed_item(page, host))
            .collect::<Result<Vec<_>, _>>()?;

        let channel = ChannelBuilder::default()
            .title(prefs.title)
            .link(format!("http://{host}/"))
            .description(prefs.description)
            .pub_date(Some(rfc2822(pub_date)?))
            .items(rss_items)
            .build();

        Ok(channel.to_string())
    }

    async fn items(&self) -> Result<Vec<PageRecord>, FeedError> {
        if let Some(items) = self.cache.as_ref().and_then(|cache| cache.feed()) {
            return Ok(items);
        }

        let items = self
            .pages
            .list_recent_published(self.settings.item_limit.get())
            .await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.set_feed(items.clone());
        }
        Ok(items)
    }
}

fn feed_item(page: &PageRecord, host: &str) -> Result<rss::Item, FeedError> {
    let link = format!("http://{host}/page/{}", page.slug);
    Ok(ItemBuilder::default()
        .title(Some(page.title.clone()))
        .link(Some(link.clone()))
        .description(Some(page.content.clone()))
        .guid(Some(GuidBuilder::default().value(link).permalink(true).build()))
        .pub_date(Some(rfc2822(page.created_at)?))
        .build())
}

/// `Sat, 08 Aug 2009 12:57:53 +0000`
fn rfc2822(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(time::UtcOffset::UTC).format(&Rfc2822)
}
