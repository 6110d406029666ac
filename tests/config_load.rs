// tests/config_load.rs
use fire_sentinel::config::{ConfigError, Region, SyntheticAlertPolicy};
use fire_sentinel::Config;
use serial_test::serial;
use std::{env, fs};

const VARS: &[&str] = &[
    "SENTINEL_CONFIG",
    "FIRMS_API_KEY",
    "TELEGRAM_TOKEN",
    "TELEGRAM_CHAT_ID",
    "SENTINEL_MODEL_PATH",
    "SENTINEL_INTERVAL_SECS",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[serial]
#[test]
fn env_path_and_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sentinel.toml");
    fs::write(
        &path,
        r#"
firms_api_key = "from-file"
interval_secs = 600
backoff_secs = 5

[region]
kind = "country"
code = "BOL"

[telegram]
chat_id = "-100200300"
"#,
    )
    .unwrap();

    env::set_var("SENTINEL_CONFIG", &path);
    env::set_var("FIRMS_API_KEY", "abc123");
    env::set_var("TELEGRAM_TOKEN", "123:xyz");
    env::set_var("SENTINEL_MODEL_PATH", "models/severity.json");

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.firms_api_key.as_deref(), Some("abc123"));
    assert_eq!(cfg.telegram.token.as_deref(), Some("123:xyz"));
    assert_eq!(cfg.telegram.chat_id.as_deref(), Some("-100200300"));
    assert_eq!(cfg.telegram.api_base, "https://api.telegram.org");
    assert_eq!(
        cfg.model_path.as_deref(),
        Some(std::path::Path::new("models/severity.json"))
    );
    assert_eq!(cfg.interval_secs, 600);
    assert_eq!(
        cfg.region,
        Region::Country {
            code: "BOL".into()
        }
    );
    assert_eq!(cfg.synthetic_alerts, SyntheticAlertPolicy::Suppress);

    clear_env();
}

#[serial]
#[test]
fn missing_env_path_is_an_error() {
    clear_env();
    env::set_var("SENTINEL_CONFIG", "/definitely/not/here.toml");
    assert!(matches!(Config::load(), Err(ConfigError::MissingFile(_))));
    clear_env();
}

#[serial]
#[test]
fn defaults_when_nothing_is_configured() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    let cfg = Config::load();

    env::set_current_dir(old).unwrap();
    let cfg = cfg.unwrap();
    assert_eq!(cfg.interval_secs, 10_800);
    assert_eq!(cfg.backoff_secs, 10);
    assert!(cfg.firms_api_key.is_none());
    assert!(cfg.severity_fallback);
    assert_eq!(
        cfg.batch_path,
        std::path::PathBuf::from("data/processed/live_monitor.csv")
    );
}

#[serial]
#[test]
fn default_path_is_read_from_cwd() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/sentinel.toml"),
        "interval_secs = 3600\nsynthetic_alerts = \"allow\"\n",
    )
    .unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    let cfg = Config::load();

    env::set_current_dir(old).unwrap();
    let cfg = cfg.unwrap();
    assert_eq!(cfg.interval_secs, 3600);
    assert_eq!(cfg.synthetic_alerts, SyntheticAlertPolicy::Allow);
}

#[serial]
#[test]
fn bad_interval_env_is_rejected() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();
    env::set_var("SENTINEL_CONFIG", &path);
    env::set_var("SENTINEL_INTERVAL_SECS", "three hours");

    let err = Config::load().unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidEnv { var: "SENTINEL_INTERVAL_SECS", .. }),
        "{err}"
    );
    clear_env();
}

#[serial]
#[test]
fn invalid_schedule_fails_validation() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "interval_secs = 5\nbackoff_secs = 30\n").unwrap();
    env::set_var("SENTINEL_CONFIG", &path);

    assert!(matches!(Config::load(), Err(ConfigError::Schedule(_))));
    clear_env();
}

#[serial]
#[test]
fn malformed_toml_is_a_parse_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "interval_secs = = 5").unwrap();
    env::set_var("SENTINEL_CONFIG", &path);

    assert!(matches!(Config::load(), Err(ConfigError::Parse { .. })));
    clear_env();
}
