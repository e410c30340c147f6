//! Plugin options.
//!
//! Options come from code, or from the `[fullstack]` table of `fob.toml`
//! overridden by `FOB_FULLSTACK__*` environment variables.
//! Priority: environment > file > defaults.
//!
//! ```toml
//! [fullstack]
//! server_handler = true
//! server_environments = ["ssr"]
//! ```

use crate::error::{FullstackError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment used when `server_environments` is not set.
pub const DEFAULT_SERVER_ENVIRONMENT: &str = "ssr";

/// Options of the fullstack plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FullstackPluginOptions {
    /// Install the request bridge into the dev server
    #[serde(default = "default_server_handler", alias = "serverHandler")]
    pub server_handler: bool,

    /// Environments holding server code; the first one serves requests
    #[serde(
        default,
        alias = "serverEnvironments",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_environments: Option<Vec<String>>,
}

fn default_server_handler() -> bool {
    true
}

impl Default for FullstackPluginOptions {
    fn default() -> Self {
        Self {
            server_handler: default_server_handler(),
            server_environments: None,
        }
    }
}

impl FullstackPluginOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the request bridge.
    pub fn with_server_handler(mut self, enabled: bool) -> Self {
        self.server_handler = enabled;
        self
    }

    /// Set the server environments.
    pub fn with_server_environments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_environments = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Name of the environment that serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`FullstackError::InvalidOption`] when `server_environments` is
    /// set to an empty list.
    pub fn primary_environment(&self) -> Result<&str> {
        match self.server_environments.as_deref() {
            None => Ok(DEFAULT_SERVER_ENVIRONMENT),
            Some([first, ..]) => Ok(first.as_str()),
            Some([]) => Err(FullstackError::InvalidOption {
                field: "server_environments".to_string(),
                value: "[]".to_string(),
                hint: "List at least one environment, or omit the option to use \"ssr\""
                    .to_string(),
            }),
        }
    }

    /// Check the options without touching the dev server.
    pub fn validate(&self) -> Result<()> {
        if self.server_handler {
            self.primary_environment()?;
        }
        Ok(())
    }

    /// Load options for the project at `root`.
    ///
    /// Reads the `[fullstack]` table of `root/fob.toml` when the file exists,
    /// then applies `FOB_FULLSTACK__*` environment variables.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let config_path = root.as_ref().join("fob.toml");

        let mut figment = Figment::new().merge(Serialized::default("fullstack", Self::default()));
        if config_path.exists() {
            tracing::debug!("Loading fullstack options from {}", config_path.display());
            figment = figment.merge(Toml::file(config_path));
        }

        Self::extract(figment.merge(Env::prefixed("FOB_").split("__")))
    }

    /// Load options from a TOML string (the same layout as `fob.toml`).
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Self::extract(
            Figment::new()
                .merge(Serialized::default("fullstack", Self::default()))
                .merge(Toml::string(source)),
        )
    }

    fn extract(figment: Figment) -> Result<Self> {
        let options: Self = figment.extract_inner("fullstack")?;
        options.validate()?;
        Ok(options)
    }

    /// JSON Schema of the options table.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(FullstackPluginOptions);
        serde_json::to_value(schema).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FullstackPluginOptions::default();
        assert!(options.server_handler);
        assert_eq!(options.server_environments, None);
        assert_eq!(options.primary_environment().unwrap(), "ssr");
    }

    #[test]
    fn test_first_environment_wins() {
        let options = FullstackPluginOptions::new().with_server_environments(["edge", "ssr"]);
        assert_eq!(options.primary_environment().unwrap(), "edge");
    }

    #[test]
    fn test_empty_environment_list_rejected() {
        let options = FullstackPluginOptions::new().with_server_environments(Vec::<String>::new());
        let err = options.validate().unwrap_err();
        assert!(matches!(err, FullstackError::InvalidOption { ref field, .. } if field == "server_environments"));
    }

    #[test]
    fn test_empty_list_ignored_when_disabled() {
        let options = FullstackPluginOptions::new()
            .with_server_handler(false)
            .with_server_environments(Vec::<String>::new());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let options = FullstackPluginOptions::from_toml_str(
            r#"
[fullstack]
server_environments = ["worker"]
"#,
        )
        .unwrap();
        assert!(options.server_handler);
        assert_eq!(options.primary_environment().unwrap(), "worker");
    }

    #[test]
    fn test_camel_case_aliases() {
        let options: FullstackPluginOptions =
            serde_json::from_str(r#"{"serverHandler": false, "serverEnvironments": ["ssr"]}"#)
                .unwrap();
        assert!(!options.server_handler);
        assert_eq!(options.server_environments, Some(vec!["ssr".to_string()]));
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let options = FullstackPluginOptions::from_toml_str("[bundle]\nminify = true\n").unwrap();
        assert_eq!(options, FullstackPluginOptions::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FullstackPluginOptions::from_toml_str("[fullstack]\nserver_handlr = false\n");
        assert!(matches!(err, Err(FullstackError::Config(_))));
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = FullstackPluginOptions::json_schema();
        let properties = &schema["properties"];
        assert!(properties.get("server_handler").is_some());
        assert!(properties.get("server_environments").is_some());
    }
}
