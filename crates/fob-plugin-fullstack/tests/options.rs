//! Tests for loading plugin options from `fob.toml` and the environment.

use fob_plugin_fullstack::{FullstackError, FullstackPluginOptions};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "FOB_FULLSTACK__SERVER_HANDLER",
    "FOB_FULLSTACK__SERVER_ENVIRONMENTS",
];

/// Clears the option environment variables on creation and drop.
struct EnvGuard;

impl EnvGuard {
    fn new() -> Self {
        clear_env();
        Self
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        clear_env();
    }
}

fn clear_env() {
    for var in ENV_VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
#[serial]
fn load_without_config_file_uses_defaults() {
    let _guard = EnvGuard::new();
    let temp = TempDir::new().unwrap();

    let options = FullstackPluginOptions::load(temp.path()).unwrap();

    assert_eq!(options, FullstackPluginOptions::default());
}

#[test]
#[serial]
fn load_reads_fullstack_table() {
    let _guard = EnvGuard::new();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob.toml"),
        r#"
[bundle]
minify = true

[fullstack]
server_environments = ["worker", "ssr"]
"#,
    )
    .unwrap();

    let options = FullstackPluginOptions::load(temp.path()).unwrap();

    assert!(options.server_handler);
    assert_eq!(options.primary_environment().unwrap(), "worker");
}

#[test]
#[serial]
fn environment_overrides_file() {
    let _guard = EnvGuard::new();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob.toml"),
        "[fullstack]\nserver_handler = true\n",
    )
    .unwrap();

    unsafe {
        std::env::set_var("FOB_FULLSTACK__SERVER_HANDLER", "false");
        std::env::set_var("FOB_FULLSTACK__SERVER_ENVIRONMENTS", "[\"edge\"]");
    }

    let options = FullstackPluginOptions::load(temp.path()).unwrap();

    assert!(!options.server_handler);
    assert_eq!(options.server_environments, Some(vec!["edge".to_string()]));
}

#[test]
#[serial]
fn empty_environment_list_in_file_rejected() {
    let _guard = EnvGuard::new();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob.toml"),
        "[fullstack]\nserver_environments = []\n",
    )
    .unwrap();

    let err = FullstackPluginOptions::load(temp.path()).unwrap_err();

    assert!(matches!(err, FullstackError::InvalidOption { .. }));
}

#[test]
#[serial]
fn malformed_file_reports_config_error() {
    let _guard = EnvGuard::new();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob.toml"),
        "[fullstack]\nserver_handler = \"sometimes\"\n",
    )
    .unwrap();

    let err = FullstackPluginOptions::load(temp.path()).unwrap_err();

    assert!(matches!(err, FullstackError::Config(_)));
}
