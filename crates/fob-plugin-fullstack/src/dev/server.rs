//! Development server host.
//!
//! Owns what plugins configure: the environment registry, the middleware
//! chain and the error continuation. The final chain is assembled as
//!
//! ```text
//! plugin middlewares → host middlewares (base path) → post-hook middlewares
//!                    → HTML fallback (spa/mpa only) → 404
//! ```

use crate::dev::middleware::{Chain, ErrorHandler, Middleware, Next};
use crate::dev::{AppType, DevConfig, OverlayErrorHandler};
use crate::environment::EnvironmentRegistry;
use crate::error::{FullstackError, Result};
use crate::plugin::{DevServerPlugin, UserConfig};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, Uri, header};
use axum::response::Response;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Configure,
    Post,
}

/// Development server.
pub struct DevServer {
    config: DevConfig,
    environments: EnvironmentRegistry,
    app_type: AppType,
    error_handler: Arc<dyn ErrorHandler>,
    phase: Phase,
    pre: Vec<Arc<dyn Middleware>>,
    post: Vec<Arc<dyn Middleware>>,
}

impl DevServer {
    /// Create a development server.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `environments` - Execution environments owned by the host
    pub fn new(config: DevConfig, environments: EnvironmentRegistry) -> Self {
        Self {
            config,
            environments,
            app_type: AppType::default(),
            error_handler: Arc::new(OverlayErrorHandler),
            phase: Phase::Configure,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    /// Create a server and apply `plugins` to it.
    pub fn with_plugins(
        config: DevConfig,
        environments: EnvironmentRegistry,
        plugins: &[Box<dyn DevServerPlugin>],
        user_config: UserConfig,
    ) -> Result<Self> {
        let mut server = Self::new(config, environments);
        server.apply_plugins(plugins, user_config)?;
        Ok(server)
    }

    /// Run the plugin hooks against this server.
    ///
    /// # Errors
    ///
    /// The first error from a `configure_server` hook or a post hook aborts
    /// setup and is returned.
    pub fn apply_plugins(
        &mut self,
        plugins: &[Box<dyn DevServerPlugin>],
        mut user_config: UserConfig,
    ) -> Result<()> {
        let active: Vec<_> = plugins.iter().filter(|plugin| plugin.apply()).collect();

        for plugin in &active {
            user_config.merge(plugin.config(&user_config));
        }
        self.app_type = user_config.app_type.unwrap_or_default();

        let mut post_hooks = Vec::new();
        for plugin in &active {
            tracing::debug!(plugin = %plugin.name(), "Configuring dev server");
            if let Some(hook) = plugin.configure_server(self)? {
                post_hooks.push(hook);
            }
        }

        self.phase = Phase::Post;
        for hook in post_hooks {
            hook(self)?;
        }

        Ok(())
    }

    /// Register a middleware.
    ///
    /// During `configure_server` it runs before the host middlewares; from a
    /// post hook, after them.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        match self.phase {
            Phase::Configure => self.pre.push(middleware),
            Phase::Post => self.post.push(middleware),
        }
    }

    /// Replace the error continuation.
    pub fn set_error_handler(&mut self, handler: Arc<dyn ErrorHandler>) {
        self.error_handler = handler;
    }

    /// Execution environments.
    pub fn environments(&self) -> &EnvironmentRegistry {
        &self.environments
    }

    /// Server configuration.
    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    /// Resolved application type.
    pub fn app_type(&self) -> AppType {
        self.app_type
    }

    /// Number of middlewares registered by plugins.
    pub fn middleware_count(&self) -> usize {
        self.pre.len() + self.post.len()
    }

    fn chain(&self) -> Arc<Chain> {
        let mut middlewares = self.pre.clone();

        let base = self.config.base_prefix();
        if !base.is_empty() {
            middlewares.push(Arc::new(BasePath {
                prefix: base.to_string(),
            }));
        }

        middlewares.extend(self.post.iter().cloned());

        if self.app_type != AppType::Custom {
            middlewares.push(Arc::new(HtmlFallback {
                root: self.config.root.clone(),
                app_type: self.app_type,
            }));
        }

        Chain::new(middlewares, Arc::clone(&self.error_handler))
    }

    /// Build the axum router.
    ///
    /// Every request goes through the middleware chain. Responses are passed
    /// through untouched unless [`DevConfig::cors`] is set.
    pub fn router(&self) -> Router {
        let chain = self.chain();
        let router =
            Router::new().fallback(move |request: Request| Arc::clone(&chain).dispatch(request));

        if !self.config.cors {
            return router;
        }

        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Bind to the configured address and serve until the process stops.
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound or the server fails.
    pub async fn start(mut self) -> Result<()> {
        self.config.validate()?;

        let listener = bind_listener(self.config.addr).await?;
        if let Ok(addr) = listener.local_addr() {
            self.config.addr = addr;
        }

        tracing::info!("Development server running at {}", self.config.server_url());

        axum::serve(listener, self.router())
            .await
            .map_err(|source| FullstackError::Server {
                message: "Server stopped unexpectedly".to_string(),
                source,
            })
    }
}

/// Bind `addr`, moving to the next free port when it is already taken.
async fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            let fallback = DevConfig::find_available_port(addr.ip(), addr.port())?;
            TcpListener::bind(fallback)
                .await
                .map_err(|source| bind_error(fallback, source))
        }
        Err(err) => Err(bind_error(addr, err)),
    }
}

fn bind_error(addr: SocketAddr, source: io::Error) -> FullstackError {
    FullstackError::Server {
        message: format!("Failed to bind to {}", addr),
        source,
    }
}

/// Strips the public base path so later middlewares see root-relative URIs.
struct BasePath {
    prefix: String,
}

#[async_trait]
impl Middleware for BasePath {
    fn name(&self) -> &str {
        "base-path"
    }

    async fn handle(&self, mut request: Request, next: Next) -> Response {
        if let Some(uri) = strip_base(request.uri(), &self.prefix) {
            *request.uri_mut() = uri;
        }
        next.run(request).await
    }
}

/// `/app/posts?x=1` with prefix `/app` → `/posts?x=1`. `None` when the path is
/// outside the base.
fn strip_base(uri: &Uri, prefix: &str) -> Option<Uri> {
    let rest = uri.path().strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let path = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    path_and_query.parse().ok()
}

/// Serves HTML files from the project root for browser navigations.
struct HtmlFallback {
    root: PathBuf,
    app_type: AppType,
}

impl HtmlFallback {
    fn candidates(&self, path: &str) -> Vec<PathBuf> {
        let relative = path.trim_start_matches('/');
        let mut candidates = Vec::new();

        if relative.is_empty() || relative.ends_with('/') {
            candidates.push(self.root.join(relative).join("index.html"));
        } else if Path::new(relative).extension().is_none() {
            candidates.push(self.root.join(format!("{}.html", relative)));
            candidates.push(self.root.join(relative).join("index.html"));
        }

        if self.app_type == AppType::Spa {
            candidates.push(self.root.join("index.html"));
        }

        candidates
    }
}

#[async_trait]
impl Middleware for HtmlFallback {
    fn name(&self) -> &str {
        "html-fallback"
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        let is_navigation = (request.method() == Method::GET || request.method() == Method::HEAD)
            && request
                .headers()
                .get(header::ACCEPT)
                .and_then(|accept| accept.to_str().ok())
                .is_some_and(|accept| accept.contains("text/html"));

        if !is_navigation || request.uri().path().contains("..") {
            return next.run(request).await;
        }

        for candidate in self.candidates(request.uri().path()) {
            if let Ok(content) = tokio::fs::read(&candidate).await {
                tracing::debug!("Serving {} for {}", candidate.display(), request.uri());
                let mut response = Response::new(Body::from(content));
                let headers = response.headers_mut();
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                return response;
            }
        }

        next.run(request).await
    }
}
