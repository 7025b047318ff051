//! Catalog loaders.
//!
//! The engine obtains catalog data through [`CatalogLoader`] and calls it
//! again on every reload, so a file-backed loader picks up edits.

use std::fs;
use std::path::{Path, PathBuf};

use crate::interpreter::ConfigurationError;
use crate::interpreter::catalog::CatalogData;

/// Source of raw catalog data.
pub trait CatalogLoader: Send + Sync {
    /// Load the full catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the source cannot be read or
    /// decoded.
    fn load_catalog(&self) -> Result<CatalogData, ConfigurationError>;

    /// Human-readable description of the source, for logs.
    fn describe(&self) -> String {
        "catalog".to_string()
    }
}

/// Loads a JSON catalog from a file or an in-memory string.
#[derive(Debug, Clone)]
pub struct JsonCatalogLoader {
    source: JsonSource,
}

#[derive(Debug, Clone)]
enum JsonSource {
    File(PathBuf),
    Inline(String),
}

impl JsonCatalogLoader {
    /// Read the catalog from `path` on every load.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: JsonSource::File(path.into()),
        }
    }

    /// Parse the catalog from a JSON string.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            source: JsonSource::Inline(json.into()),
        }
    }

    /// The file path, if loading from a file.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            JsonSource::File(path) => Some(path),
            JsonSource::Inline(_) => None,
        }
    }
}

impl CatalogLoader for JsonCatalogLoader {
    fn load_catalog(&self) -> Result<CatalogData, ConfigurationError> {
        match &self.source {
            JsonSource::File(path) => {
                let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                parse_catalog_json(&content, &path.display().to_string())
            }
            JsonSource::Inline(json) => parse_catalog_json(json, "<string>"),
        }
    }

    fn describe(&self) -> String {
        match &self.source {
            JsonSource::File(path) => path.display().to_string(),
            JsonSource::Inline(_) => "<string>".to_string(),
        }
    }
}

/// Serves a fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogLoader {
    data: CatalogData,
}

impl StaticCatalogLoader {
    pub fn new(data: CatalogData) -> Self {
        Self { data }
    }
}

impl CatalogLoader for StaticCatalogLoader {
    fn load_catalog(&self) -> Result<CatalogData, ConfigurationError> {
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        "<static>".to_string()
    }
}

/// Decode catalog JSON, reporting syntax and shape errors with their
/// location in `origin`.
///
/// # Errors
///
/// Returns [`ConfigurationError::Json`] with the line and column of the
/// first problem.
pub fn parse_catalog_json(json: &str, origin: &str) -> Result<CatalogData, ConfigurationError> {
    serde_json::from_str(json).map_err(|e| json_error(origin, &e))
}

pub(crate) fn json_error(origin: &str, error: &serde_json::Error) -> ConfigurationError {
    // serde_json appends " at line L column C"; the variant carries those apart
    let message = error.to_string();
    let message = match message.rfind(" at line ") {
        Some(pos) => message[..pos].to_string(),
        None => message,
    };
    ConfigurationError::Json {
        origin: origin.to_string(),
        line: error.line(),
        column: error.column(),
        message,
    }
}
