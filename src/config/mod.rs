//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::Path,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{CliArgs, Command, MigrateArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "quill";
const ENV_PREFIX: &str = "QUILL";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_UPLOAD_MAX_FILE_BYTES: u64 = 1024 * 1024;
const DEFAULT_IMAGE_MAX_WIDTH: u32 = 800;
const DEFAULT_IMAGE_MAX_HEIGHT: u32 = 600;
const DEFAULT_THUMBNAIL_WIDTH: u32 = 80;
const DEFAULT_THUMBNAIL_HEIGHT: u32 = 60;
const DEFAULT_CACHE_PAGE_LIMIT: u64 = 256;
const DEFAULT_CACHE_MEDIA_LIMIT: u64 = 64;
const DEFAULT_CACHE_SUBPAGE_LIMIT: u64 = 128;
const DEFAULT_FEED_ITEM_LIMIT: u64 = 10;
const DEFAULT_FEED_FALLBACK_HOST: &str = "localhost";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub uploads: UploadSettings,
    pub cache: CacheSettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Required by `serve` and `migrate`; validated when the pool is built.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

/// Limits applied to media uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSettings {
    pub max_file_bytes: NonZeroUsize,
    pub image_max_width: NonZeroU32,
    pub image_max_height: NonZeroU32,
    pub thumbnail_width: NonZeroU32,
    pub thumbnail_height: NonZeroU32,
}

impl Default for UploadSettings {
    fn default() -> Self {
        let raw = RawUploadSettings::default();
        // Defaults are compile-time constants above zero.
        build_upload_settings(raw).unwrap_or(Self {
            max_file_bytes: NonZeroUsize::MIN,
            image_max_width: NonZeroU32::MIN,
            image_max_height: NonZeroU32::MIN,
            thumbnail_width: NonZeroU32::MIN,
            thumbnail_height: NonZeroU32::MIN,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub page_limit: NonZeroUsize,
    pub media_limit: NonZeroUsize,
    pub subpage_limit: NonZeroUsize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub item_limit: NonZeroUsize,
    /// Host used for feed links when the request carries no `Host` header.
    pub fallback_host: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            item_limit: NonZeroUsize::new(DEFAULT_FEED_ITEM_LIMIT as usize)
                .unwrap_or(NonZeroUsize::MIN),
            fallback_host: DEFAULT_FEED_FALLBACK_HOST.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut raw = load_raw(cli.config_file.as_deref())?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_url(args.database_url.as_ref()),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

fn load_raw(config_file: Option<&Path>) -> Result<RawSettings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    Ok(builder.build()?.try_deserialize()?)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    uploads: RawUploadSettings,
    cache: RawCacheSettings,
    feed: RawFeedSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(limit) = overrides.uploads_max_file_bytes {
            self.uploads.max_file_bytes = Some(limit);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        self.apply_database_url(overrides.database_url.as_ref());
    }

    fn apply_database_url(&mut self, url: Option<&String>) {
        if let Some(url) = url {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            uploads,
            cache,
            feed,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            uploads: build_upload_settings(uploads)?,
            cache: build_cache_settings(cache)?,
            feed: build_feed_settings(feed)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;
    if public_addr == admin_addr {
        return Err(LoadError::invalid(
            "server.admin_port",
            "admin listener must not share the public address",
        ));
    }

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

    Ok(DatabaseSettings {
        url,
        max_connections: non_zero_u32(max.into(), "database.max_connections")?,
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_file_bytes = non_zero_usize(
        uploads
            .max_file_bytes
            .unwrap_or(DEFAULT_UPLOAD_MAX_FILE_BYTES),
        "uploads.max_file_bytes",
    )?;

    let dimension = |value: Option<u32>, default: u32, key: &'static str| {
        non_zero_u32(value.unwrap_or(default).into(), key)
    };

    let settings = UploadSettings {
        max_file_bytes,
        image_max_width: dimension(
            uploads.image_max_width,
            DEFAULT_IMAGE_MAX_WIDTH,
            "uploads.image_max_width",
        )?,
        image_max_height: dimension(
            uploads.image_max_height,
            DEFAULT_IMAGE_MAX_HEIGHT,
            "uploads.image_max_height",
        )?,
        thumbnail_width: dimension(
            uploads.thumbnail_width,
            DEFAULT_THUMBNAIL_WIDTH,
            "uploads.thumbnail_width",
        )?,
        thumbnail_height: dimension(
            uploads.thumbnail_height,
            DEFAULT_THUMBNAIL_HEIGHT,
            "uploads.thumbnail_height",
        )?,
    };

    if settings.thumbnail_width > settings.image_max_width
        || settings.thumbnail_height > settings.image_max_height
    {
        return Err(LoadError::invalid(
            "uploads.thumbnail_width",
            "thumbnail box must fit inside the image box",
        ));
    }

    Ok(settings)
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        page_limit: non_zero_usize(
            cache.page_limit.unwrap_or(DEFAULT_CACHE_PAGE_LIMIT),
            "cache.page_limit",
        )?,
        media_limit: non_zero_usize(
            cache.media_limit.unwrap_or(DEFAULT_CACHE_MEDIA_LIMIT),
            "cache.media_limit",
        )?,
        subpage_limit: non_zero_usize(
            cache.subpage_limit.unwrap_or(DEFAULT_CACHE_SUBPAGE_LIMIT),
            "cache.subpage_limit",
        )?,
    })
}

fn build_feed_settings(feed: RawFeedSettings) -> Result<FeedSettings, LoadError> {
    let item_limit = non_zero_usize(
        feed.item_limit.unwrap_or(DEFAULT_FEED_ITEM_LIMIT),
        "feed.item_limit",
    )?;

    let fallback_host = feed
        .fallback_host
        .map(|host| host.trim().to_string())
        .unwrap_or_else(|| DEFAULT_FEED_FALLBACK_HOST.to_string());
    if fallback_host.is_empty() || fallback_host.contains('/') {
        return Err(LoadError::invalid(
            "feed.fallback_host",
            "must be a bare host name",
        ));
    }

    Ok(FeedSettings {
        item_limit,
        fallback_host,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_file_bytes: Option<u64>,
    image_max_width: Option<u32>,
    image_max_height: Option<u32>,
    thumbnail_width: Option<u32>,
    thumbnail_height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    page_limit: Option<u64>,
    media_limit: Option<u64>,
    subpage_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    item_limit: Option<u64>,
    fallback_host: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
