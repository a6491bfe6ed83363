//! Cache configuration.

use std::num::NonZeroUsize;

const DEFAULT_PAGE_LIMIT: usize = 256;
const DEFAULT_MEDIA_LIMIT: usize = 64;
const DEFAULT_SUBPAGE_LIMIT: usize = 128;

/// Capacities of the object cache, resolved from `[cache]` settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Page lookups (hits and confirmed misses) keyed by slug.
    pub page_limit: NonZeroUsize,
    /// Media records keyed by id, including their payloads.
    pub media_limit: NonZeroUsize,
    /// Subpage lists keyed by owner id.
    pub subpage_limit: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_limit: NonZeroUsize::new(DEFAULT_PAGE_LIMIT).unwrap_or(NonZeroUsize::MIN),
            media_limit: NonZeroUsize::new(DEFAULT_MEDIA_LIMIT).unwrap_or(NonZeroUsize::MIN),
            subpage_limit: NonZeroUsize::new(DEFAULT_SUBPAGE_LIMIT).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            page_limit: settings.page_limit,
            media_limit: settings.media_limit,
            subpage_limit: settings.subpage_limit,
        }
    }
}
