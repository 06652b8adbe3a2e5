// Service configuration loading

use std::time::Duration;
use talkbridge::Config;

fn write_config(dir: &tempfile::TempDir, contents: &str) -> String {
    let path = dir.path().join("talkbridge.toml");
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_load_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[service]
name = "talkbridge-test"
log_level = "debug"

[service.http]
bind = "0.0.0.0"
port = 9000

[backend]
base_url = "https://translate.example.com"
request_timeout_secs = 3

[session]
teardown_grace_ms = 250
"#,
    );

    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.service.name, "talkbridge-test");
    assert_eq!(cfg.service.log_level, "debug");
    assert_eq!(cfg.service.http.port, 9000);
    assert_eq!(cfg.backend.base_url, "https://translate.example.com");
    assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
    assert_eq!(
        cfg.controller_options().teardown_grace,
        Duration::from_millis(250)
    );
}

#[test]
fn test_optional_sections_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[service]
name = "talkbridge"

[service.http]
bind = "127.0.0.1"
port = 8787

[backend]
base_url = "http://localhost:8000"
"#,
    );

    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.service.log_level, "info");
    assert_eq!(cfg.backend.request_timeout_secs, 10);
    assert_eq!(cfg.session.teardown_grace_ms, 500);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent");
    assert!(Config::load(&path.to_string_lossy()).is_err());
}

#[test]
fn test_shipped_config_parses() {
    let cfg = Config::load("config/talkbridge").unwrap();
    assert_eq!(cfg.service.name, "talkbridge");
    assert!(cfg.backend.base_url.starts_with("http"));
}
