//! Development server host.
//!
//! The parts of the dev server that plugins interact with:
//! - Environment registry lookup
//! - Middleware chain with an error continuation
//! - Error overlay for failed requests
//! - HTML fallback depending on the application type

pub mod config;
pub mod error_overlay;
pub mod middleware;
pub mod server;

// Re-exports
pub use config::{AppType, DevConfig};
pub use error_overlay::{OverlayErrorHandler, generate_error_overlay};
pub use middleware::{ErrorHandler, Middleware, Next};
pub use server::DevServer;
