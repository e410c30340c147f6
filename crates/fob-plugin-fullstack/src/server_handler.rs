//! The `fullstack:server-handler` plugin.
//!
//! Installs a [`RequestBridge`] for the first configured server environment.
//! The environment is looked up and checked once, at setup; a missing or
//! build-only environment stops the dev server from starting.

use crate::bridge::RequestBridge;
use crate::dev::{AppType, DevServer};
use crate::error::Result;
use crate::options::FullstackPluginOptions;
use crate::plugin::{ConfigPatch, DevServerPlugin, PostHook, UserConfig};
use std::borrow::Cow;
use std::sync::Arc;

/// Plugin name reported to the dev server.
pub const SERVER_HANDLER_PLUGIN_NAME: &str = "fullstack:server-handler";

/// Dev server plugin routing requests into the application's server entry.
#[derive(Debug, Clone, Default)]
pub struct ServerHandlerPlugin {
    options: FullstackPluginOptions,
}

impl ServerHandlerPlugin {
    /// Create the plugin.
    pub fn new(options: FullstackPluginOptions) -> Self {
        Self { options }
    }

    /// Plugin options.
    pub fn options(&self) -> &FullstackPluginOptions {
        &self.options
    }
}

impl DevServerPlugin for ServerHandlerPlugin {
    fn name(&self) -> Cow<'static, str> {
        SERVER_HANDLER_PLUGIN_NAME.into()
    }

    fn apply(&self) -> bool {
        self.options.server_handler
    }

    /// Default the application type to `custom` so the host's HTML fallback
    /// does not answer requests meant for the server handler.
    fn config(&self, user_config: &UserConfig) -> ConfigPatch {
        ConfigPatch {
            app_type: Some(user_config.app_type.unwrap_or(AppType::Custom)),
        }
    }

    fn configure_server(&self, server: &mut DevServer) -> Result<Option<PostHook>> {
        let name = self.options.primary_environment()?;
        let environment = server.environments().runnable(name)?;
        let bridge = Arc::new(RequestBridge::new(environment));

        tracing::debug!(environment = %name, "Server handler enabled");

        Ok(Some(Box::new(move |server: &mut DevServer| {
            server.use_middleware(bridge);
            Ok(())
        })))
    }
}

/// Plugins implementing the server handler.
pub fn server_handler_plugin(options: FullstackPluginOptions) -> Vec<Box<dyn DevServerPlugin>> {
    vec![Box::new(ServerHandlerPlugin::new(options))]
}

/// All fullstack plugins for the dev server.
///
/// Asset handling lives in a separate plugin; this returns the server
/// handler only.
pub fn fullstack_plugin(options: FullstackPluginOptions) -> Vec<Box<dyn DevServerPlugin>> {
    server_handler_plugin(options)
}
