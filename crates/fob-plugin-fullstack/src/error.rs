//! Error types for the fullstack plugin.
//!
//! Two families of errors exist and they never mix:
//!
//! - [`FullstackError`] is raised while the dev server is being configured
//!   (options, environment lookup, capability checks). These are fatal: a
//!   misconfigured server must not start.
//! - [`BridgeError`] is raised while a single request is bridged into the
//!   application's fetch handler. These are recovered per request and handed
//!   to the host's error continuation.

use miette::Diagnostic;
use thiserror::Error;

/// Setup and configuration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum FullstackError {
    /// The configured environment name does not exist in the host registry.
    #[error("Environment '{name}' is not registered with the dev server")]
    #[diagnostic(
        code(fullstack::environment_not_found),
        help("Register the environment on the dev server or change `server_environments`")
    )]
    EnvironmentNotFound {
        /// Name that was looked up
        name: String,
    },

    /// The configured environment cannot import modules at request time.
    #[error("Environment '{name}' does not support on-demand module execution")]
    #[diagnostic(
        code(fullstack::environment_not_runnable),
        help("The server handler needs a runnable environment with a module runner attached")
    )]
    EnvironmentNotRunnable {
        /// Name of the static environment
        name: String,
    },

    /// The environment's build input does not name a server entry.
    #[error("No server entry found for environment '{environment}': {reason}")]
    #[diagnostic(
        code(fullstack::entry_not_found),
        help("Set the environment input to a single module or to a map with an `index` key")
    )]
    EntryNotFound {
        /// Environment whose config was inspected
        environment: String,
        /// What was wrong with the input
        reason: String,
    },

    /// An option has a value the plugin cannot work with.
    #[error("Invalid value for '{field}': {value}")]
    #[diagnostic(code(fullstack::invalid_option))]
    InvalidOption {
        /// Option name
        field: String,
        /// Offending value
        value: String,
        /// How to fix it
        #[help]
        hint: String,
    },

    /// Options could not be extracted from config files or the environment.
    #[error("Failed to load plugin options")]
    #[diagnostic(
        code(fullstack::config),
        help("Check the [fullstack] table in fob.toml and FOB_FULLSTACK__* variables")
    )]
    Config(#[from] Box<figment::Error>),

    /// The dev server could not bind or serve.
    #[error("Server error: {message}")]
    #[diagnostic(code(fullstack::server))]
    Server {
        /// Context message
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for FullstackError {
    fn from(err: figment::Error) -> Self {
        FullstackError::Config(Box::new(err))
    }
}

/// Result type alias with [`FullstackError`] as the default error type.
pub type Result<T, E = FullstackError> = std::result::Result<T, E>;

/// Errors raised by a module runner while importing a specifier.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// No module is known under this specifier.
    #[error("Failed to resolve module '{0}'")]
    NotFound(String),

    /// The module was found but evaluating it failed.
    #[error("Failed to evaluate module '{specifier}'")]
    Evaluation {
        /// Specifier being evaluated
        specifier: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Per-request failures inside the request bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The server entry could not be determined from the environment config.
    #[error(transparent)]
    Entry(#[from] FullstackError),

    /// Importing the server entry through the runner failed.
    #[error("Failed to import server entry '{specifier}'")]
    Import {
        /// Server entry specifier
        specifier: String,
        #[source]
        source: RunnerError,
    },

    /// The request could not be converted into a fetch request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The application's fetch handler failed.
    #[error("Server handler failed")]
    Handler(#[source] anyhow::Error),
}
