use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.public_addr.port(), DEFAULT_PUBLIC_PORT);
    assert_eq!(settings.server.admin_addr.port(), DEFAULT_ADMIN_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.uploads.max_file_bytes.get(), 1_048_576);
    assert_eq!(settings.uploads.image_max_width.get(), 800);
    assert_eq!(settings.uploads.thumbnail_height.get(), 60);
    assert!(settings.cache.enabled);
    assert_eq!(settings.feed.item_limit.get(), 10);
    assert_eq!(settings.feed.fallback_host, "localhost");
}

#[test]
fn upload_settings_default_matches_loader() {
    let loaded = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(UploadSettings::default(), loaded.uploads);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.public_port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.database.url = Some("postgres://file".to_string());

    let overrides = ServeOverrides {
        public_port: Some(4321),
        log_level: Some("debug".to_string()),
        database_url: Some("postgres://cli".to_string()),
        cache_enabled: Some(false),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.public_addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.database.url.as_deref(), Some("postgres://cli"));
    assert!(!settings.cache.enabled);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.admin_port = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero port");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.admin_port",
            ..
        }
    ));
}

#[test]
fn shared_listener_address_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.admin_port = Some(DEFAULT_PUBLIC_PORT);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn zero_upload_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.uploads.max_file_bytes = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero limit");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "uploads.max_file_bytes",
            ..
        }
    ));
}

#[test]
fn oversized_thumbnail_box_is_rejected() {
    let mut raw = RawSettings::default();
    raw.uploads.thumbnail_width = Some(1000);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["quill"]);
    assert!(args.command.is_none());
    assert!(args.config_file.is_none());
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "quill",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--uploads-max-file-bytes",
        "2048",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.uploads_max_file_bytes, Some(2048));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from(["quill", "migrate", "--database-url", "postgres://example"]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(migrate.database_url.as_deref(), Some("postgres://example"));
        }
        _ => panic!("wrong command parsed"),
    }
}
