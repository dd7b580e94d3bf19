use super::*;

fn args() -> CliArgs {
    CliArgs {
        config_file: None,
        host: None,
        port: None,
        database_url: None,
        in_memory: false,
    }
}

#[test]
fn defaults_cover_every_section() {
    let settings = Settings::load(&args()).unwrap();
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.catalog.allowed_page_sizes, vec![10, 20, 50]);
    assert_eq!(settings.cache.page_ttl_secs, 60);
    assert_eq!(settings.resilience.max_attempts, 3);
    assert_eq!(settings.resilience.failure_threshold, 5);
    assert_eq!(settings.logging.format, LogFormat::Compact);
}

#[test]
fn cli_overrides_win() {
    let mut cli = args();
    cli.port = Some(9090);
    cli.database_url = Some("postgres://db.internal/catalog".to_string());
    let settings = Settings::load(&cli).unwrap();
    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.database.url, "postgres://db.internal/catalog");
}

#[test]
fn guard_settings_reflect_resilience_section() {
    let settings = Settings::load(&args()).unwrap();
    let guard = settings.guard_settings();
    assert_eq!(guard.timeout, Duration::from_millis(2000));
    assert_eq!(guard.breaker.failure_threshold, 5);
    assert_eq!(guard.breaker.cooldown, Duration::from_secs(30));
}
