//! Development server configuration.

use crate::error::{FullstackError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// How the dev server treats requests no middleware answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    /// Serve `index.html` for every HTML navigation
    #[default]
    Spa,
    /// Serve `<path>/index.html` or `<path>.html`
    Mpa,
    /// No HTML handling; the application answers everything itself
    Custom,
}

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Server socket address (IP + port)
    pub addr: SocketAddr,

    /// Project root, used for HTML fallbacks
    pub root: PathBuf,

    /// Public base path; requests under it are rewritten before the
    /// host-internal middlewares run
    pub base: String,

    /// Answer CORS preflights and add permissive CORS headers to every
    /// response. Off by default: it overrides the CORS headers an
    /// application handler sets and hides `OPTIONS` requests from it.
    pub cors: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5173)),
            root: PathBuf::from("."),
            base: "/".to_string(),
            cors: false,
        }
    }
}

impl DevConfig {
    /// Create a config for the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Set the public base path.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Enable or disable the permissive CORS layer.
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    /// Set the socket address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base path is not absolute or the root is missing.
    pub fn validate(&self) -> Result<()> {
        if !self.base.starts_with('/') {
            return Err(FullstackError::InvalidOption {
                field: "base".to_string(),
                value: self.base.clone(),
                hint: "The base path must start with '/'".to_string(),
            });
        }

        if !self.root.exists() {
            return Err(FullstackError::InvalidOption {
                field: "root".to_string(),
                value: self.root.display().to_string(),
                hint: "Project root does not exist".to_string(),
            });
        }

        Ok(())
    }

    /// Base path without its trailing slash (`"/app/"` → `"/app"`, `"/"` → `""`).
    pub fn base_prefix(&self) -> &str {
        self.base.trim_end_matches('/')
    }

    /// Get the server URL as a string.
    pub fn server_url(&self) -> String {
        format!("http://{}{}", self.addr, self.base)
    }

    /// Find an available port on `ip` starting from `requested_port`.
    ///
    /// Tries the requested port first, then the next 10 ports.
    pub fn find_available_port(ip: IpAddr, requested_port: u16) -> Result<SocketAddr> {
        use std::net::TcpListener;

        let candidates = (0..=10u16).map(|offset| requested_port.saturating_add(offset));
        for port in candidates {
            let addr = SocketAddr::new(ip, port);
            if TcpListener::bind(addr).is_ok() {
                if port != requested_port {
                    tracing::warn!(
                        "Port {} is busy, using port {} instead",
                        requested_port,
                        port
                    );
                }
                return Ok(addr);
            }
        }

        Err(FullstackError::InvalidOption {
            field: "port".to_string(),
            value: requested_port.to_string(),
            hint: format!(
                "Ports {}-{} are all in use. Try a different port range.",
                requested_port,
                requested_port.saturating_add(10)
            ),
        })
    }
}
