//! Dev server plugin API.
//!
//! A plugin takes part in dev server setup through three hooks, called in
//! this order for every plugin whose [`DevServerPlugin::apply`] returns true:
//!
//! 1. [`config`](DevServerPlugin::config) returns a patch merged into the
//!    user config. Patches apply in plugin order; later ones win.
//! 2. [`configure_server`](DevServerPlugin::configure_server) may register
//!    middlewares directly. These run before the host's own middlewares.
//! 3. The optional [`PostHook`] returned by `configure_server` runs once
//!    every plugin has been configured and the host's middlewares are in
//!    place; middlewares registered there run after them.

use crate::dev::{AppType, DevServer};
use crate::error::Result;
use std::borrow::Cow;

/// User-facing dev server settings plugins may inspect and patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserConfig {
    /// Explicitly chosen application type
    pub app_type: Option<AppType>,
}

/// Changes a plugin wants applied to the [`UserConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// Application type to use
    pub app_type: Option<AppType>,
}

impl UserConfig {
    /// Apply `patch`, overriding only the fields it sets.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(app_type) = patch.app_type {
            self.app_type = Some(app_type);
        }
    }
}

/// Deferred setup step run after all plugins are configured.
pub type PostHook = Box<dyn FnOnce(&mut DevServer) -> Result<()> + Send>;

/// A dev server plugin.
pub trait DevServerPlugin: Send + Sync {
    /// Plugin name, used in logs.
    fn name(&self) -> Cow<'static, str>;

    /// Whether this plugin takes part in the dev server at all.
    fn apply(&self) -> bool {
        true
    }

    /// Patch the user config before the server is configured.
    fn config(&self, _user_config: &UserConfig) -> ConfigPatch {
        ConfigPatch::default()
    }

    /// Configure the server.
    ///
    /// Errors abort dev server setup.
    fn configure_server(&self, _server: &mut DevServer) -> Result<Option<PostHook>> {
        Ok(None)
    }
}
