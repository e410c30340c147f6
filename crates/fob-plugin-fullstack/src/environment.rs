//! Execution environments registered with the dev server.
//!
//! An environment is a named module-execution context (`ssr`, `client`,
//! `edge`, ...). Only some of them can import and evaluate modules while the
//! server is running; that capability is carried in the type rather than
//! discovered by inspection:
//!
//! ```text
//! DevEnvironment::Runnable(config + runner)   → can serve requests
//! DevEnvironment::Static(config)              → build-only
//! ```

use crate::entry::EntryInput;
use crate::error::{FullstackError, Result};
use crate::runner::ModuleRunner;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Who consumes an environment's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consumer {
    /// Code runs on the server
    #[default]
    Server,
    /// Code runs in the browser
    Client,
}

/// Static configuration of one environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Who runs the code built for this environment
    #[serde(default)]
    pub consumer: Consumer,

    /// Build input, used to find the server entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<EntryInput>,
}

impl EnvironmentConfig {
    /// Server-side config whose input is a single module.
    pub fn server(entry: impl Into<String>) -> Self {
        Self {
            consumer: Consumer::Server,
            input: Some(EntryInput::Single(entry.into())),
        }
    }

    /// Client-side config with the given input.
    pub fn client(input: EntryInput) -> Self {
        Self {
            consumer: Consumer::Client,
            input: Some(input),
        }
    }
}

/// An environment that can import modules at request time.
#[derive(Clone)]
pub struct RunnableEnvironment {
    /// Environment name
    pub name: String,
    /// Static configuration
    pub config: EnvironmentConfig,
    /// Module runner shared by every request served from this environment
    pub runner: Arc<dyn ModuleRunner>,
}

/// An environment without a module runner.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    /// Environment name
    pub name: String,
    /// Static configuration
    pub config: EnvironmentConfig,
}

/// A named execution environment.
#[derive(Debug, Clone)]
pub enum DevEnvironment {
    /// Supports on-demand module execution
    Runnable(RunnableEnvironment),
    /// Build-only
    Static(StaticEnvironment),
}

impl DevEnvironment {
    /// Create a runnable environment.
    pub fn runnable(
        name: impl Into<String>,
        config: EnvironmentConfig,
        runner: Arc<dyn ModuleRunner>,
    ) -> Self {
        DevEnvironment::Runnable(RunnableEnvironment {
            name: name.into(),
            config,
            runner,
        })
    }

    /// Create a static environment.
    pub fn static_env(name: impl Into<String>, config: EnvironmentConfig) -> Self {
        DevEnvironment::Static(StaticEnvironment {
            name: name.into(),
            config,
        })
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        match self {
            DevEnvironment::Runnable(env) => &env.name,
            DevEnvironment::Static(env) => &env.name,
        }
    }

    /// Static configuration.
    pub fn config(&self) -> &EnvironmentConfig {
        match self {
            DevEnvironment::Runnable(env) => &env.config,
            DevEnvironment::Static(env) => &env.config,
        }
    }

    /// Narrow to the runnable variant.
    pub fn as_runnable(&self) -> Option<&RunnableEnvironment> {
        match self {
            DevEnvironment::Runnable(env) => Some(env),
            DevEnvironment::Static(_) => None,
        }
    }
}

impl fmt::Debug for RunnableEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableEnvironment")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Capability check: can `environment` import modules at request time?
pub fn is_runnable_dev_environment(environment: &DevEnvironment) -> bool {
    matches!(environment, DevEnvironment::Runnable(_))
}

/// Read-only table of the host's environments, in registration order.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRegistry {
    environments: Arc<IndexMap<String, DevEnvironment>>,
}

impl EnvironmentRegistry {
    /// Build a registry from environments. Later duplicates replace earlier ones.
    pub fn new(environments: impl IntoIterator<Item = DevEnvironment>) -> Self {
        let environments = environments
            .into_iter()
            .map(|env| (env.name().to_string(), env))
            .collect();
        Self {
            environments: Arc::new(environments),
        }
    }

    /// Look up an environment by name.
    pub fn get(&self, name: &str) -> Option<&DevEnvironment> {
        self.environments.get(name)
    }

    /// Look up an environment that must support on-demand execution.
    ///
    /// # Errors
    ///
    /// - [`FullstackError::EnvironmentNotFound`] if `name` is not registered
    /// - [`FullstackError::EnvironmentNotRunnable`] if it has no module runner
    pub fn runnable(&self, name: &str) -> Result<&RunnableEnvironment> {
        let environment = self
            .get(name)
            .ok_or_else(|| FullstackError::EnvironmentNotFound {
                name: name.to_string(),
            })?;

        environment
            .as_runnable()
            .ok_or_else(|| FullstackError::EnvironmentNotRunnable {
                name: name.to_string(),
            })
    }

    /// Environment names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Number of registered environments.
    pub fn len(&self) -> usize {
        self.environments.len()
    }

    /// Whether no environment is registered.
    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ModuleTable;

    fn registry() -> EnvironmentRegistry {
        EnvironmentRegistry::new([
            DevEnvironment::static_env(
                "client",
                EnvironmentConfig::client(EntryInput::Single("/index.html".into())),
            ),
            DevEnvironment::runnable(
                "ssr",
                EnvironmentConfig::server("/src/server.ts"),
                Arc::new(ModuleTable::new()),
            ),
        ])
    }

    #[test]
    fn test_capability_predicate() {
        let registry = registry();
        assert!(is_runnable_dev_environment(registry.get("ssr").unwrap()));
        assert!(!is_runnable_dev_environment(registry.get("client").unwrap()));
    }

    #[test]
    fn test_runnable_lookup() {
        let registry = registry();
        let ssr = registry.runnable("ssr").unwrap();
        assert_eq!(ssr.name, "ssr");
        assert_eq!(ssr.config.consumer, Consumer::Server);
    }

    #[test]
    fn test_static_environment_rejected() {
        let err = registry().runnable("client").unwrap_err();
        assert!(matches!(err, FullstackError::EnvironmentNotRunnable { ref name } if name == "client"));
    }

    #[test]
    fn test_missing_environment_rejected() {
        let err = registry().runnable("edge").unwrap_err();
        assert!(matches!(err, FullstackError::EnvironmentNotFound { ref name } if name == "edge"));
    }

    #[test]
    fn test_names_keep_registration_order() {
        let registry = registry();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["client", "ssr"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
