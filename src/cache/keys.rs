//! Cache keys and the mutations that invalidate them.
//!
//! [`Mutation::affected_keys`] is the only place that decides which cached
//! entries a write makes stale. Services report what they changed and the
//! cache drops the keys listed here.

use uuid::Uuid;

/// Identifies one cached entry (or one singleton collection).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    SitePreferences,
    /// Page lookup by slug. Holds confirmed misses as well as hits.
    Page(String),
    /// Public navigation list.
    Links,
    /// Subpages of the owner page, newest first.
    Subpages(Uuid),
    /// Published pages for the RSS feed.
    Feed,
    /// Media summaries offered by the editor's file picker.
    Files,
    Media(Uuid),
}

impl CacheKey {
    /// Metric label for this key's family.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::SitePreferences => "site_preferences",
            CacheKey::Page(_) => "page",
            CacheKey::Links => "links",
            CacheKey::Subpages(_) => "subpages",
            CacheKey::Feed => "feed",
            CacheKey::Files => "files",
            CacheKey::Media(_) => "media",
        }
    }
}

/// A write that may have made cached entries stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A page was created or edited.
    PageSaved {
        slug: String,
        previous_owner: Option<Uuid>,
        owner: Option<Uuid>,
    },
    /// A page moved between draft and published.
    PagePublicationChanged { slug: String, owner: Option<Uuid> },
    /// A page was deleted. `orphaned` lists the slugs of the subpages it
    /// owned; storage detaches them, so their cached records are stale.
    PageRemoved {
        id: Uuid,
        slug: String,
        owner: Option<Uuid>,
        orphaned: Vec<String>,
    },
    PreferencesSaved,
    MediaUploaded,
    MediaRemoved(Uuid),
}

impl Mutation {
    /// Keys to drop after this mutation.
    ///
    /// | mutation                 | page(slug) | links | feed | subpages        | prefs | files | media(id) |
    /// |--------------------------|------------|-------|------|-----------------|-------|-------|-----------|
    /// | `PageSaved`              | x          | x     | x    | old + new owner |       |       |           |
    /// | `PagePublicationChanged` | x          | x     | x    | owner           |       |       |           |
    /// | `PageRemoved`            | x + orphans| x     | x    | owner + itself  |       |       |           |
    /// | `PreferencesSaved`       |            | x     | x    |                 | x     |       |           |
    /// | `MediaUploaded`          |            |       |      |                 |       | x     |           |
    /// | `MediaRemoved`           |            |       |      |                 |       | x     | x         |
    pub fn affected_keys(&self) -> Vec<CacheKey> {
        match self {
            Mutation::PageSaved {
                slug,
                previous_owner,
                owner,
            } => {
                let mut keys = vec![CacheKey::Page(slug.clone()), CacheKey::Links, CacheKey::Feed];
                keys.extend(previous_owner.map(CacheKey::Subpages));
                if owner != previous_owner {
                    keys.extend(owner.map(CacheKey::Subpages));
                }
                keys
            }
            Mutation::PagePublicationChanged { slug, owner } => {
                let mut keys = vec![CacheKey::Page(slug.clone()), CacheKey::Links, CacheKey::Feed];
                keys.extend(owner.map(CacheKey::Subpages));
                keys
            }
            Mutation::PageRemoved {
                id,
                slug,
                owner,
                orphaned,
            } => {
                let mut keys = vec![
                    CacheKey::Page(slug.clone()),
                    CacheKey::Links,
                    CacheKey::Feed,
                    CacheKey::Subpages(*id),
                ];
                keys.extend(owner.map(CacheKey::Subpages));
                keys.extend(orphaned.iter().cloned().map(CacheKey::Page));
                keys
            }
            Mutation::PreferencesSaved => {
                vec![CacheKey::SitePreferences, CacheKey::Links, CacheKey::Feed]
            }
            Mutation::MediaUploaded => vec![CacheKey::Files],
            Mutation::MediaRemoved(id) => vec![CacheKey::Files, CacheKey::Media(*id)],
        }
    }
}
