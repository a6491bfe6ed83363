//! In-process object cache.
//!
//! Singleton collections live in `RwLock<Option<_>>`; keyed entries live in
//! bounded LRU maps. Reads on an LRU need a write lock because they update
//! recency.

use std::hash::Hash;
use std::sync::RwLock;

use lru::LruCache;
use metrics::counter;
use uuid::Uuid;

use crate::domain::entities::{MediaRecord, MediaSummary, PageLink, PageRecord};
use crate::domain::settings::SitePreferences;

use super::config::CacheConfig;
use super::keys::{CacheKey, Mutation};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Outcome of a cached lookup that may have confirmed absence.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::Missing, Lookup::Found)
    }
}

pub struct ObjectCache {
    site_preferences: RwLock<Option<SitePreferences>>,
    links: RwLock<Option<Vec<PageLink>>>,
    feed: RwLock<Option<Vec<PageRecord>>>,
    files: RwLock<Option<Vec<MediaSummary>>>,

    pages: RwLock<LruCache<String, Lookup<PageRecord>>>,
    subpages: RwLock<LruCache<Uuid, Vec<PageRecord>>>,
    media: RwLock<LruCache<Uuid, MediaRecord>>,
}

impl ObjectCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            site_preferences: RwLock::new(None),
            links: RwLock::new(None),
            feed: RwLock::new(None),
            files: RwLock::new(None),
            pages: RwLock::new(LruCache::new(config.page_limit)),
            subpages: RwLock::new(LruCache::new(config.subpage_limit)),
            media: RwLock::new(LruCache::new(config.media_limit)),
        }
    }

    pub fn site_preferences(&self) -> Option<SitePreferences> {
        record(
            "site_preferences",
            rw_read(&self.site_preferences, SOURCE, "site_preferences").clone(),
        )
    }

    pub fn set_site_preferences(&self, value: SitePreferences) {
        *rw_write(&self.site_preferences, SOURCE, "set_site_preferences") = Some(value);
    }

    pub fn links(&self) -> Option<Vec<PageLink>> {
        record("links", rw_read(&self.links, SOURCE, "links").clone())
    }

    pub fn set_links(&self, value: Vec<PageLink>) {
        *rw_write(&self.links, SOURCE, "set_links") = Some(value);
    }

    pub fn feed(&self) -> Option<Vec<PageRecord>> {
        record("feed", rw_read(&self.feed, SOURCE, "feed").clone())
    }

    pub fn set_feed(&self, value: Vec<PageRecord>) {
        *rw_write(&self.feed, SOURCE, "set_feed") = Some(value);
    }

    pub fn files(&self) -> Option<Vec<MediaSummary>> {
        record("files", rw_read(&self.files, SOURCE, "files").clone())
    }

    pub fn set_files(&self, value: Vec<MediaSummary>) {
        *rw_write(&self.files, SOURCE, "set_files") = Some(value);
    }

    pub fn page(&self, slug: &str) -> Option<Lookup<PageRecord>> {
        record("page", lru_get(&self.pages, slug, "page"))
    }

    pub fn set_page(&self, slug: &str, lookup: Lookup<PageRecord>) {
        rw_write(&self.pages, SOURCE, "set_page").put(slug.to_string(), lookup);
    }

    pub fn subpages(&self, owner: Uuid) -> Option<Vec<PageRecord>> {
        record("subpages", lru_get(&self.subpages, &owner, "subpages"))
    }

    pub fn set_subpages(&self, owner: Uuid, pages: Vec<PageRecord>) {
        rw_write(&self.subpages, SOURCE, "set_subpages").put(owner, pages);
    }

    pub fn media(&self, id: Uuid) -> Option<MediaRecord> {
        record("media", lru_get(&self.media, &id, "media"))
    }

    pub fn set_media(&self, media: MediaRecord) {
        rw_write(&self.media, SOURCE, "set_media").put(media.id, media);
    }

    /// Drop every entry the mutation made stale.
    pub fn apply(&self, mutation: &Mutation) {
        for key in mutation.affected_keys() {
            self.invalidate(&key);
        }
    }

    fn invalidate(&self, key: &CacheKey) {
        match key {
            CacheKey::SitePreferences => {
                *rw_write(&self.site_preferences, SOURCE, "invalidate.site_preferences") = None;
            }
            CacheKey::Links => *rw_write(&self.links, SOURCE, "invalidate.links") = None,
            CacheKey::Feed => *rw_write(&self.feed, SOURCE, "invalidate.feed") = None,
            CacheKey::Files => *rw_write(&self.files, SOURCE, "invalidate.files") = None,
            CacheKey::Page(slug) => {
                rw_write(&self.pages, SOURCE, "invalidate.page").pop(slug);
            }
            CacheKey::Subpages(owner) => {
                rw_write(&self.subpages, SOURCE, "invalidate.subpages").pop(owner);
            }
            CacheKey::Media(id) => {
                rw_write(&self.media, SOURCE, "invalidate.media").pop(id);
            }
        }
        counter!("quill_cache_invalidation_total", "kind" => key.kind()).increment(1);
    }
}

fn lru_get<K, Q, V>(lock: &RwLock<LruCache<K, V>>, key: &Q, op: &'static str) -> Option<V>
where
    K: Hash + Eq + std::borrow::Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
{
    rw_write(lock, SOURCE, op).get(key).cloned()
}

fn record<T>(kind: &'static str, value: Option<T>) -> Option<T> {
    if value.is_some() {
        counter!("quill_cache_hit_total", "kind" => kind).increment(1);
    } else {
        counter!("quill_cache_miss_total", "kind" => kind).increment(1);
    }
    value
}
