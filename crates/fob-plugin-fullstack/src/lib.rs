//! Fullstack dev server plugin for Fob.
//!
//! Routes dev server requests into the application's server-side fetch
//! handler. The handler module is imported through the host's module runner
//! on every request, so server code edits show up without a restart.
//!
//! # Architecture
//!
//! ```text
//! request → DevServer middleware chain → RequestBridge
//!                                          │ entry_source(env config)
//!                                          │ runner.import(entry)
//!                                          │ restore original URI
//!                                          ▼
//!                              module.default.fetch(request) → response
//! ```
//!
//! - [`server_handler`] - the `fullstack:server-handler` plugin
//! - [`bridge`] - the request bridge middleware
//! - [`environment`] - runnable vs static execution environments
//! - [`runner`] - module runner and fetch handler capabilities
//! - [`dev`] - the dev server surface plugins configure
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::body::Body;
//! use fob_plugin_fullstack::{
//!     FullstackPluginOptions,
//!     dev::{DevConfig, DevServer},
//!     environment::{DevEnvironment, EnvironmentConfig, EnvironmentRegistry},
//!     fullstack_plugin,
//!     plugin::UserConfig,
//!     runner::{FetchResponse, ModuleTable, handler_fn},
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> fob_plugin_fullstack::Result<()> {
//! let modules = ModuleTable::new();
//! modules.register_handler(
//!     "/src/server.ts",
//!     handler_fn(|_req| async { Ok(FetchResponse::new(Body::from("ok"))) }),
//! );
//!
//! let environments = EnvironmentRegistry::new([DevEnvironment::runnable(
//!     "ssr",
//!     EnvironmentConfig::server("/src/server.ts"),
//!     Arc::new(modules),
//! )]);
//!
//! let server = DevServer::with_plugins(
//!     DevConfig::new("."),
//!     environments,
//!     &fullstack_plugin(FullstackPluginOptions::default()),
//!     UserConfig::default(),
//! )?;
//! server.start().await
//! # }
//! ```

pub mod bridge;
pub mod dev;
pub mod entry;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod options;
pub mod plugin;
pub mod runner;
pub mod server_handler;

#[cfg(feature = "logging")]
pub mod logging;

// Re-export commonly used types
pub use bridge::RequestBridge;
pub use error::{BridgeError, FullstackError, Result, RunnerError};
pub use options::FullstackPluginOptions;
pub use server_handler::{ServerHandlerPlugin, fullstack_plugin, server_handler_plugin};
