//! Request bridge: dev server requests → application fetch handler.
//!
//! For every request, strictly in this order:
//!
//! 1. resolve the server entry from the environment config,
//! 2. import it through the environment's module runner,
//! 3. restore the URI the client sent, if the host rewrote it,
//! 4. call the module's `fetch` with a fetch-shaped request,
//! 5. return its response to the host.
//!
//! Nothing is cached between requests, so edits to the server entry are
//! picked up by the next request. Any failure goes to the host error
//! continuation exactly once; nothing is retried.

use crate::dev::{Middleware, Next};
use crate::entry::entry_source;
use crate::environment::{EnvironmentConfig, RunnableEnvironment};
use crate::error::BridgeError;
use crate::fetch;
use crate::runner::ModuleRunner;
use async_trait::async_trait;
use axum::extract::{OriginalUri, Request};
use axum::response::Response;
use std::sync::Arc;

/// Middleware forwarding requests to the server entry of a runnable environment.
#[derive(Clone)]
pub struct RequestBridge {
    environment: String,
    config: EnvironmentConfig,
    runner: Arc<dyn ModuleRunner>,
}

impl RequestBridge {
    /// Create a bridge for `environment`.
    pub fn new(environment: &RunnableEnvironment) -> Self {
        Self {
            environment: environment.name.clone(),
            config: environment.config.clone(),
            runner: Arc::clone(&environment.runner),
        }
    }

    /// Environment this bridge serves from.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Bridge one request.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Entry`] if the server entry cannot be determined
    /// - [`BridgeError::Import`] if the runner fails to import it
    /// - [`BridgeError::InvalidRequest`] if no fetch request can be built
    /// - [`BridgeError::Handler`] if the application handler fails
    pub async fn bridge(&self, request: Request) -> Result<Response, BridgeError> {
        let specifier = entry_source(&self.environment, &self.config)?;

        let module = self
            .runner
            .import(&specifier)
            .await
            .map_err(|source| BridgeError::Import {
                specifier: specifier.clone(),
                source,
            })?;

        let request = restore_original_uri(request);
        tracing::debug!(
            environment = %self.environment,
            entry = %specifier,
            "{} {}",
            request.method(),
            request.uri()
        );

        fetch::serve_fetch(module.default.as_ref(), request).await
    }
}

#[async_trait]
impl Middleware for RequestBridge {
    fn name(&self) -> &str {
        "fullstack:server-handler"
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        match self.bridge(request).await {
            Ok(response) => response,
            Err(error) => next.error(error),
        }
    }
}

impl std::fmt::Debug for RequestBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBridge")
            .field("environment", &self.environment)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Put back the URI the client sent when the host recorded one.
///
/// Only the original URI is consulted; if none was recorded the current URI
/// is kept as is.
pub fn restore_original_uri(mut request: Request) -> Request {
    if let Some(OriginalUri(original)) = request.extensions().get::<OriginalUri>().cloned() {
        *request.uri_mut() = original;
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryInput;
    use crate::environment::DevEnvironment;
    use crate::error::{FullstackError, RunnerError};
    use crate::runner::{FetchResponse, ModuleTable, handler_fn};
    use axum::body::Body;
    use axum::http::Uri;

    fn request(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header("host", "localhost:5173")
            .body(Body::empty())
            .unwrap()
    }

    fn bridge_with(table: &ModuleTable, config: EnvironmentConfig) -> RequestBridge {
        let env = DevEnvironment::runnable("ssr", config, Arc::new(table.clone()));
        RequestBridge::new(env.as_runnable().unwrap())
    }

    #[test]
    fn test_restore_original_uri() {
        let mut req = request("/rewritten");
        req.extensions_mut()
            .insert(OriginalUri("/original?q=1".parse::<Uri>().unwrap()));

        let req = restore_original_uri(req);
        assert_eq!(req.uri(), "/original?q=1");
    }

    #[test]
    fn test_restore_without_original_keeps_uri() {
        let req = restore_original_uri(request("/current"));
        assert_eq!(req.uri(), "/current");
    }

    #[tokio::test]
    async fn test_bridge_passes_absolute_url() {
        let table = ModuleTable::new();
        table.register_handler(
            "/src/server.ts",
            handler_fn(|req| async move {
                Ok(FetchResponse::new(Body::from(req.uri().to_string())))
            }),
        );

        let bridge = bridge_with(&table, EnvironmentConfig::server("/src/server.ts"));
        let response = bridge.bridge(request("/hello?x=1")).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"http://localhost:5173/hello?x=1");
    }

    #[tokio::test]
    async fn test_bridge_reports_missing_module() {
        let table = ModuleTable::new();
        let bridge = bridge_with(&table, EnvironmentConfig::server("/src/server.ts"));

        let err = bridge.bridge(request("/")).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Import { source: RunnerError::NotFound(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_bridge_reports_entry_error_before_import() {
        let table = ModuleTable::new();
        let config = EnvironmentConfig {
            input: Some(EntryInput::Multiple(vec!["./a.ts".into()])),
            ..Default::default()
        };
        let bridge = bridge_with(&table, config);

        let err = bridge.bridge(request("/")).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Entry(FullstackError::EntryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_bridge_reports_handler_error() {
        let table = ModuleTable::new();
        table.register_handler(
            "/src/server.ts",
            handler_fn(|_req| async {
                Err::<FetchResponse, _>(anyhow::anyhow!("database unavailable"))
            }),
        );
        let bridge = bridge_with(&table, EnvironmentConfig::server("/src/server.ts"));

        let err = bridge.bridge(request("/")).await.unwrap_err();
        assert!(matches!(err, BridgeError::Handler(_)));
        assert!(format!("{:#}", anyhow::Error::new(err)).contains("database unavailable"));
    }
}
