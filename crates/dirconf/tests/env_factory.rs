//! Environment-variable entry point.

use std::env;
use std::fs;
use std::path::Path;

use dirconf::{from_env, ConfigError, Options};

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_from_env_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("default/__config__.yml"), "version: 1");
    write(&dir.path().join("site/__config__.yml"), "version: 2");

    let joined =
        env::join_paths([dir.path().join("site")]).unwrap();
    unsafe {
        env::set_var("DIRCONF_TEST_CONFIG", dir.path().join("default"));
        env::set_var("DIRCONF_TEST_OVERRIDES", &joined);
    }

    let config = from_env(
        "DIRCONF_TEST_CONFIG",
        Some("DIRCONF_TEST_OVERRIDES"),
        &Options::default(),
    )
    .unwrap();
    assert_eq!(config.get("version").unwrap().as_i64(), Some(2));
}

#[test]
fn test_from_env_without_override_variable() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("default/__config__.yml"), "version: 1");

    unsafe {
        env::set_var("DIRCONF_TEST_CONFIG_ONLY", dir.path().join("default"));
    }

    let config =
        from_env("DIRCONF_TEST_CONFIG_ONLY", None, &Options::default()).unwrap();
    assert_eq!(config.get("version").unwrap().as_i64(), Some(1));
}

#[test]
fn test_from_env_missing_config_variable() {
    let err = from_env("DIRCONF_TEST_NEVER_SET", None, &Options::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "DIRCONF_TEST_NEVER_SET"));
}
