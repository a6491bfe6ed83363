use std::{future::IntoFuture, process, sync::Arc};

use quill::{
    application::{
        admin::{pages::AdminPageService, site::AdminSiteService},
        error::AppError,
        feed::FeedService,
        media::MediaService,
        pages::PageService,
        render::LayoutRenderer,
        repos::{HealthRepo, MediaRepo, MediaWriteRepo, PagesRepo, PagesWriteRepo, SettingsRepo},
        site::SiteService,
    },
    cache::{CacheConfig, ObjectCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        telemetry,
    },
};
use sqlx::PgPool;
use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

/// Room for multipart framing and the description field on top of the file itself.
const UPLOAD_FORM_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;
    info!(target = "quill::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let (http_state, admin_state) = build_states(repositories, &settings);
    serve_http(&settings, http_state, admin_state).await
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

fn build_states(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> (HttpState, AdminState) {
    let settings_repo: Arc<dyn SettingsRepo> = repositories.clone();
    let pages_repo: Arc<dyn PagesRepo> = repositories.clone();
    let pages_write_repo: Arc<dyn PagesWriteRepo> = repositories.clone();
    let media_repo: Arc<dyn MediaRepo> = repositories.clone();
    let media_write_repo: Arc<dyn MediaWriteRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = cache_config
        .enabled
        .then(|| Arc::new(ObjectCache::new(&cache_config)));
    info!(
        target = "quill::cache",
        enabled = cache.is_some(),
        "Object cache configured"
    );

    let site = SiteService::new(settings_repo, cache.clone());
    let pages = PageService::new(pages_repo.clone(), cache.clone());
    let feed = FeedService::new(
        pages_repo.clone(),
        site.clone(),
        cache.clone(),
        settings.feed.clone(),
    );
    let media = MediaService::new(media_repo, media_write_repo, cache.clone(), settings.uploads);

    let http_state = HttpState {
        site: site.clone(),
        pages,
        feed,
        media,
        layout: Arc::new(LayoutRenderer::default()),
        health: health_repo,
    };

    let admin_state = AdminState {
        http: http_state.clone(),
        pages: AdminPageService::new(pages_repo, pages_write_repo, site.clone(), cache),
        site: AdminSiteService::new(site),
    };

    (http_state, admin_state)
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let upload_body_limit = settings
        .uploads
        .max_file_bytes
        .get()
        .saturating_add(UPLOAD_FORM_OVERHEAD);
    let admin_router = http::build_admin_router(admin_state, upload_body_limit);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "quill::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "Listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()))
        .into_future();
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .into_future();

    let servers = async { try_join!(public_server, admin_server) };
    tokio::pin!(servers);

    tokio::select! {
        result = &mut servers => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            return Ok(());
        }
        () = shutdown_signal() => {
            info!(target = "quill::serve", "Shutdown requested; draining connections");
            let _ = shutdown_tx.send(true);
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, servers).await {
        Ok(result) => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        Err(_) => warn!(
            target = "quill::serve",
            timeout_secs = settings.server.graceful_shutdown.as_secs(),
            "Graceful shutdown timed out; dropping open connections"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "quill::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
