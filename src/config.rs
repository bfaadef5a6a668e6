//! Compiler configuration: catalog extensions and resolution policy.
//!
//! ```json
//! {
//!   "catalog": { "isUUID": { "kind": "validator", "outputPrimitive": "string" } },
//!   "widenNestedValidators": false
//! }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LoadError;
use crate::rules::{Catalog, CatalogEntry};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilerConfig {
    /// Added to (or overriding) the builtin catalog.
    pub catalog: IndexMap<String, CatalogEntry>,
    /// Union builtin validators with their array form on nested fields too.
    pub widen_nested_validators: bool,
}

impl CompilerConfig {
    pub fn from_str(src: &str) -> Result<Self, LoadError> {
        from_str_with_path(src)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let config = Self::from_str(&src)?;
        tracing::debug!(path = %path.display(), extra_rules = config.catalog.len(), "loaded compiler config");
        Ok(config)
    }

    /// The builtin catalog extended with this config's entries.
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::builtin().clone();
        catalog.extend(self.catalog.iter().map(|(k, v)| (k.clone(), *v)));
        catalog
    }
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| LoadError::Config {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}
