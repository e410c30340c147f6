//! Module runner capability and fetch-shaped handlers.
//!
//! The dev server host owns module loading. This module only describes the
//! capability the request bridge consumes:
//!
//! ```text
//! ModuleRunner::import(specifier) → ServerModule { default: FetchHandler }
//!                                                   │
//!                                   fetch(FetchRequest) → FetchResponse
//! ```
//!
//! [`ModuleTable`] is an in-process runner for hosts that register handlers
//! written in Rust. Its factories run on every import, so replacing a factory
//! is observed by the very next request.

use crate::error::RunnerError;
use async_trait::async_trait;
use axum::body::Body;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Standards-shaped request handed to an application handler.
///
/// The URI is always absolute (`scheme://authority/path?query`).
pub type FetchRequest = axum::http::Request<Body>;

/// Standards-shaped response returned by an application handler.
pub type FetchResponse = axum::http::Response<Body>;

/// An application's exported request handler.
#[async_trait]
pub trait FetchHandler: Send + Sync {
    /// Handle one request.
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FetchResponse>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> FetchHandler for FnHandler<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<FetchResponse>> + Send,
{
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FetchResponse> {
        (self.0)(request).await
    }
}

/// Wrap an async closure as a [`FetchHandler`].
///
/// # Example
///
/// ```rust
/// use axum::body::Body;
/// use fob_plugin_fullstack::runner::{FetchResponse, handler_fn};
///
/// let handler = handler_fn(|_req| async {
///     Ok(FetchResponse::new(Body::from("ok")))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn FetchHandler>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<FetchResponse>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Exports of an evaluated server entry.
#[derive(Clone)]
pub struct ServerModule {
    /// The module's default export
    pub default: Arc<dyn FetchHandler>,
}

impl ServerModule {
    /// Create a module whose default export is `handler`.
    pub fn new(handler: Arc<dyn FetchHandler>) -> Self {
        Self { default: handler }
    }
}

impl fmt::Debug for ServerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerModule").finish_non_exhaustive()
    }
}

/// On-demand module execution supplied by the host.
///
/// Implementations must be safe for concurrent, independent imports; the
/// bridge shares one runner across all in-flight requests without locking.
#[async_trait]
pub trait ModuleRunner: Send + Sync {
    /// Resolve and evaluate `specifier`, returning its exports.
    async fn import(&self, specifier: &str) -> Result<ServerModule, RunnerError>;
}

type ModuleFactory = Arc<dyn Fn() -> anyhow::Result<ServerModule> + Send + Sync>;

/// In-process [`ModuleRunner`] backed by a table of module factories.
#[derive(Default, Clone)]
pub struct ModuleTable {
    factories: Arc<RwLock<FxHashMap<String, ModuleFactory>>>,
}

impl ModuleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory evaluated for `specifier`.
    pub fn register<F>(&self, specifier: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<ServerModule> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(specifier.into(), Arc::new(factory));
    }

    /// Register a module that always exports `handler`.
    pub fn register_handler(&self, specifier: impl Into<String>, handler: Arc<dyn FetchHandler>) {
        self.register(specifier, move || Ok(ServerModule::new(Arc::clone(&handler))));
    }

    /// Remove a module from the table.
    pub fn remove(&self, specifier: &str) -> bool {
        self.factories.write().remove(specifier).is_some()
    }

    /// Whether a factory is registered for `specifier`.
    pub fn contains(&self, specifier: &str) -> bool {
        self.factories.read().contains_key(specifier)
    }
}

impl fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories = self.factories.read();
        let mut specifiers: Vec<_> = factories.keys().collect();
        specifiers.sort();
        f.debug_struct("ModuleTable")
            .field("specifiers", &specifiers)
            .finish()
    }
}

#[async_trait]
impl ModuleRunner for ModuleTable {
    async fn import(&self, specifier: &str) -> Result<ServerModule, RunnerError> {
        // Clone the factory out so the lock is not held while evaluating.
        let factory = self
            .factories
            .read()
            .get(specifier)
            .cloned()
            .ok_or_else(|| RunnerError::NotFound(specifier.to_string()))?;

        factory().map_err(|source| RunnerError::Evaluation {
            specifier: specifier.to_string(),
            source,
        })
    }
}
