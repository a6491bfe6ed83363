//! Site preferences accessor.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::warn;

use crate::application::error::{HttpError, repo_error_to_http};
use crate::application::repos::{RepoError, SettingsRepo};
use crate::cache::{Mutation, ObjectCache};
use crate::domain::entities::SettingRecord;
use crate::domain::settings::{SITE_PREFS_KEY, SitePreferences};

const SOURCE: &str = "application::site::SiteService";

#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to encode site preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<SiteError> for HttpError {
    fn from(err: SiteError) -> Self {
        match &err {
            SiteError::Repo(repo) => repo_error_to_http(SOURCE, repo),
            SiteError::Encode(_) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

#[derive(Clone)]
pub struct SiteService {
    settings: Arc<dyn SettingsRepo>,
    cache: Option<Arc<ObjectCache>>,
}

impl SiteService {
    pub fn new(settings: Arc<dyn SettingsRepo>, cache: Option<Arc<ObjectCache>>) -> Self {
        Self { settings, cache }
    }

    /// Current preferences. A missing row is created from defaults; a
    /// malformed one is served as defaults without being overwritten.
    pub async fn load(&self) -> Result<SitePreferences, SiteError> {
        if let Some(prefs) = self.cache.as_ref().and_then(|cache| cache.site_preferences()) {
            return Ok(prefs);
        }

        let prefs = match self.settings.find_setting(SITE_PREFS_KEY).await? {
            Some(record) if !record.value.trim().is_empty() => {
                SitePreferences::from_json(&record.value).unwrap_or_else(|err| {
                    warn!(
                        target = "quill::application::site",
                        setting = SITE_PREFS_KEY,
                        error = %err,
                        "stored site preferences are malformed; serving defaults"
                    );
                    SitePreferences::default()
                })
            }
            Some(_) => SitePreferences::default(),
            None => {
                let defaults = SitePreferences::default();
                self.persist(&defaults).await?;
                defaults
            }
        };

        if let Some(cache) = self.cache.as_ref() {
            cache.set_site_preferences(prefs.clone());
        }
        Ok(prefs)
    }

    /// Store the full preference map and refresh the cache.
    pub async fn save(&self, prefs: SitePreferences) -> Result<(), SiteError> {
        self.persist(&prefs).await?;
        if let Some(cache) = self.cache.as_ref() {
            cache.apply(&Mutation::PreferencesSaved);
            cache.set_site_preferences(prefs);
        }
        Ok(())
    }

    async fn persist(&self, prefs: &SitePreferences) -> Result<(), SiteError> {
        let record = SettingRecord {
            name: SITE_PREFS_KEY.to_string(),
            value: prefs.to_json()?,
        };
        self.settings.upsert_setting(record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::CacheConfig;

    #[derive(Default)]
    struct StubSettingsRepo {
        value: Mutex<Option<String>>,
        reads: Mutex<usize>,
        writes: Mutex<Vec<String>>,
    }

    impl StubSettingsRepo {
        fn with_value(value: &str) -> Self {
            Self {
                value: Mutex::new(Some(value.to_string())),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SettingsRepo for StubSettingsRepo {
        async fn find_setting(&self, name: &str) -> Result<Option<SettingRecord>, RepoError> {
            assert_eq!(name, SITE_PREFS_KEY);
            *self.reads.lock().expect("lock") += 1;
            Ok(self
                .value
                .lock()
                .expect("lock")
                .clone()
                .map(|value| SettingRecord {
                    name: name.to_string(),
                    value,
                }))
        }

        async fn upsert_setting(&self, record: SettingRecord) -> Result<(), RepoError> {
            self.writes.lock().expect("lock").push(record.value.clone());
            *self.value.lock().expect("lock") = Some(record.value);
            Ok(())
        }
    }

    fn service(repo: Arc<StubSettingsRepo>) -> SiteService {
        SiteService::new(repo, Some(Arc::new(ObjectCache::new(&CacheConfig::default()))))
    }

    #[tokio::test]
    async fn missing_row_is_created_from_defaults() {
        let repo = Arc::new(StubSettingsRepo::default());
        let prefs = service(repo.clone()).load().await.expect("load");

        assert_eq!(prefs, SitePreferences::default());
        assert_eq!(repo.writes.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn malformed_row_serves_defaults_without_writing() {
        let repo = Arc::new(StubSettingsRepo::with_value("{broken"));
        let prefs = service(repo.clone()).load().await.expect("load");

        assert_eq!(prefs.title, SitePreferences::default().title);
        assert!(repo.writes.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let repo = Arc::new(StubSettingsRepo::with_value(r#"{"title":"Cached"}"#));
        let service = service(repo.clone());

        assert_eq!(service.load().await.expect("load").title, "Cached");
        assert_eq!(service.load().await.expect("load").title, "Cached");
        assert_eq!(*repo.reads.lock().expect("lock"), 1);
    }

    #[tokio::test]
    async fn save_refreshes_cached_value() {
        let repo = Arc::new(StubSettingsRepo::default());
        let service = service(repo.clone());
        service.load().await.expect("load");

        let prefs = SitePreferences {
            title: "Renamed".into(),
            front: Some("about".into()),
            ..SitePreferences::default()
        };
        service.save(prefs).await.expect("save");

        let loaded = service.load().await.expect("load");
        assert_eq!(loaded.title, "Renamed");
        assert_eq!(loaded.front.as_deref(), Some("about"));
        assert_eq!(*repo.reads.lock().expect("lock"), 1);
    }

    #[tokio::test]
    async fn works_without_cache() {
        let repo = Arc::new(StubSettingsRepo::with_value(r#"{"title":"Direct"}"#));
        let service = SiteService::new(repo.clone(), None);

        service.load().await.expect("load");
        service.load().await.expect("load");
        assert_eq!(*repo.reads.lock().expect("lock"), 2);
    }
}
