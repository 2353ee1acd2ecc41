//! Configuration tests
//!
//! The default template must parse back into the same config, so adding a
//! field without serializing it shows up here.

use super::*;
use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed = Config::parse(&toml_str).unwrap_or_else(|e| {
        panic!("Default config should round-trip.\nTOML:\n{toml_str}\nError: {e:?}")
    });
    let loaded = Config::from_sources(parsed, no_env).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_config_roundtrip_custom() {
    let mut config = Config::default();
    config.logging.level = "debug".to_string();
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;
    config.console.owner_id = Some(42);
    config.console.modal_timeout_secs = 5;

    let parsed = Config::parse(&config.to_toml()).unwrap();
    let loaded = Config::from_sources(parsed, no_env).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_template_documents_unset_owner() {
    let toml_str = Config::default().to_toml();
    assert!(toml_str.contains("# owner_id ="));
    assert!(toml_str.contains("[console]"));
    assert!(toml_str.contains("[logging]"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_file_gives_defaults() {
    let parsed = Config::parse("").unwrap();
    let config = Config::from_sources(parsed, no_env).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_env_overrides_file() {
    let parsed = Config::parse(
        r#"
[logging]
level = "warn"

[console]
modal_timeout_secs = 30
owner_id = 7
"#,
    )
    .unwrap();

    let env = env_of(&[
        (ENV_LOG, "trace"),
        (ENV_MODAL_TIMEOUT, "3"),
        (ENV_OWNER, "99"),
    ]);
    let config = Config::from_sources(parsed, env).unwrap();

    assert_eq!(config.logging.level, "trace");
    assert_eq!(config.console.modal_timeout_secs, 3);
    assert_eq!(config.console.owner(), Some(crate::host::UserId(99)));
}

#[test]
fn test_file_overrides_defaults() {
    let parsed = Config::parse(
        r#"
[console]
channel_id = 5
"#,
    )
    .unwrap();
    let config = Config::from_sources(parsed, no_env).unwrap();

    assert_eq!(config.console.channel_id, 5);
    assert_eq!(config.console.message_id, ConsoleConfig::default().message_id);
    assert_eq!(config.logging, LoggingConfig::default());
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_env_value_is_an_error() {
    let env = env_of(&[(ENV_MODAL_TIMEOUT, "soon")]);
    let err = Config::from_sources(FileConfig::default(), env).unwrap_err();
    assert!(err.to_string().contains(ENV_MODAL_TIMEOUT));
}

#[test]
fn test_unknown_section_is_rejected() {
    assert!(Config::parse("[theme]\nname = \"dark\"\n").is_err());
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let path = std::env::temp_dir().join("pagetree-missing-config-test.toml");
    let _ = std::fs::remove_file(&path);

    let file = Config::read_file(&path).unwrap();
    let config = Config::from_sources(file, no_env).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_log_rotation_parse() {
    assert_eq!(LogRotation::parse("HOURLY"), Some(LogRotation::Hourly));
    assert_eq!(LogRotation::parse("never"), Some(LogRotation::Never));
    assert_eq!(LogRotation::parse("weekly"), None);
}

#[test]
fn test_unknown_rotation_is_rejected() {
    let parsed = Config::parse("[logging]\nfile_rotation = \"dialy\"\n").unwrap();
    let err = Config::from_sources(parsed, no_env).unwrap_err();
    assert!(format!("{err:#}").contains("dialy"));
}
