//! Server entry lookup.
//!
//! The server entry is a framework convention: an environment's build input
//! either names one module, or is a map whose `index` key names it.

use crate::environment::EnvironmentConfig;
use crate::error::{FullstackError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key of the server entry inside a named input map.
pub const DEFAULT_ENTRY_NAME: &str = "index";

/// Build input of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryInput {
    /// One module
    Single(String),
    /// Several unnamed modules
    Multiple(Vec<String>),
    /// Named modules
    Named(IndexMap<String, String>),
}

/// Resolve the server entry specifier of an environment.
///
/// # Errors
///
/// Returns [`FullstackError::EntryNotFound`] when the input is missing, is an
/// unnamed list, or is a map without an `index` key.
pub fn entry_source(environment: &str, config: &EnvironmentConfig) -> Result<String> {
    let not_found = |reason: &str| FullstackError::EntryNotFound {
        environment: environment.to_string(),
        reason: reason.to_string(),
    };

    match config.input.as_ref() {
        Some(EntryInput::Single(source)) => Ok(source.clone()),
        Some(EntryInput::Named(inputs)) => inputs
            .get(DEFAULT_ENTRY_NAME)
            .cloned()
            .ok_or_else(|| not_found("input map has no `index` entry")),
        Some(EntryInput::Multiple(_)) => Err(not_found(
            "input is an unnamed list; use a map with an `index` key",
        )),
        None => Err(not_found("no build input configured")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(input: Option<EntryInput>) -> EnvironmentConfig {
        EnvironmentConfig {
            input,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_input() {
        let source = entry_source("ssr", &config(Some(EntryInput::Single("./src/server.ts".into()))));
        assert_eq!(source.unwrap(), "./src/server.ts");
    }

    #[test]
    fn test_named_input_uses_index() {
        let mut inputs = IndexMap::new();
        inputs.insert("worker".to_string(), "./src/worker.ts".to_string());
        inputs.insert("index".to_string(), "./src/entry.server.tsx".to_string());

        let source = entry_source("ssr", &config(Some(EntryInput::Named(inputs)))).unwrap();
        assert_eq!(source, "./src/entry.server.tsx");
    }

    #[test]
    fn test_named_input_without_index() {
        let mut inputs = IndexMap::new();
        inputs.insert("worker".to_string(), "./src/worker.ts".to_string());

        let err = entry_source("ssr", &config(Some(EntryInput::Named(inputs)))).unwrap_err();
        assert!(err.to_string().contains("`index`"));
    }

    #[test]
    fn test_list_input_rejected() {
        let input = EntryInput::Multiple(vec!["./a.ts".into(), "./b.ts".into()]);
        let err = entry_source("ssr", &config(Some(input))).unwrap_err();
        assert!(matches!(err, FullstackError::EntryNotFound { .. }));
    }

    #[test]
    fn test_missing_input() {
        let err = entry_source("edge", &config(None)).unwrap_err();
        assert!(err.to_string().contains("'edge'"));
    }

    #[test]
    fn test_input_deserializes_untagged() {
        let single: EntryInput = serde_json::from_str(r#""./src/server.ts""#).unwrap();
        assert_eq!(single, EntryInput::Single("./src/server.ts".into()));

        let named: EntryInput = serde_json::from_str(r#"{"index": "./src/server.ts"}"#).unwrap();
        assert!(matches!(named, EntryInput::Named(_)));
    }
}
