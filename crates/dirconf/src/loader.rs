//! Structured-data file loading and the extension registry.
//!
//! A [`LoaderRegistry`] maps file extensions to parse functions. The
//! built-in table covers YAML (`yml`, `yaml`), JSON (`json`), and TOML
//! (`toml`); callers may register additional loaders, override built-ins,
//! or disable an extension entirely.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::trace;

use crate::error::{ConfigError, Result};
use crate::value::{Map, Value};
use indexmap::IndexMap;

/// A parse function: file contents in, plain value out.
///
/// Errors are plain strings; the registry wraps them into
/// [`ConfigError::MalformedSource`] together with the file path.
pub type LoaderFn = Rc<dyn Fn(&str) -> std::result::Result<Value, String>>;

/// Extension-to-loader table.
///
/// Cloning is cheap: loader functions are reference-counted.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: IndexMap<String, LoaderFn>,
}

impl LoaderRegistry {
    /// An empty registry with no recognized extensions.
    pub fn empty() -> Self {
        Self {
            loaders: IndexMap::new(),
        }
    }

    /// The built-in table: `yml`/`yaml`, `json`, and `toml`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("yml", parse_yaml);
        registry.register("yaml", parse_yaml);
        registry.register("json", parse_json);
        registry.register("toml", parse_toml);
        registry
    }

    /// Register a loader for an extension, replacing any existing entry.
    pub fn register(
        &mut self,
        extension: &str,
        loader: impl Fn(&str) -> std::result::Result<Value, String> + 'static,
    ) {
        self.loaders
            .insert(extension.to_string(), Rc::new(loader));
    }

    /// Remove an extension from the table, disabling it.
    pub fn disable(&mut self, extension: &str) {
        self.loaders.shift_remove(extension);
    }

    /// The recognized extensions, in registration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    /// Probe `dir` for a file named `stem` with any recognized extension.
    ///
    /// Returns the first match in registration order, so an ambiguous
    /// stem (say `a.yml` next to `a.json`) resolves deterministically.
    pub(crate) fn probe(&self, dir: &Path, stem: &str) -> Option<PathBuf> {
        for ext in self.loaders.keys() {
            let candidate = dir.join(format!("{stem}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Read and parse a file through the loader registered for its
    /// extension.
    pub(crate) fn load_file(&self, path: &Path) -> Result<Value> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let loader = self
            .loaders
            .get(extension)
            .ok_or_else(|| ConfigError::MalformedSource {
                path: path.to_path_buf(),
                reason: format!("unrecognized extension '{extension}'"),
            })?;
        trace!(path = %path.display(), "parsing source file");
        let contents = fs::read_to_string(path)?;
        loader(&contents).map_err(|reason| ConfigError::MalformedSource {
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("extensions", &self.loaders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Built-in YAML loader.
fn parse_yaml(contents: &str) -> std::result::Result<Value, String> {
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
    yaml_to_value(parsed)
}

/// Built-in JSON loader.
fn parse_json(contents: &str) -> std::result::Result<Value, String> {
    let parsed: serde_json::Value =
        serde_json::from_str(contents).map_err(|e| e.to_string())?;
    json_to_value(parsed)
}

/// Built-in TOML loader.
fn parse_toml(contents: &str) -> std::result::Result<Value, String> {
    let parsed: toml::Value = toml::from_str(contents).map_err(|e| e.to_string())?;
    Ok(toml_to_value(parsed))
}

fn yaml_to_value(yaml: serde_yaml::Value) -> std::result::Result<Value, String> {
    Ok(match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(format!("unrepresentable number: {n}"));
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_value)
                .collect::<std::result::Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key_to_string(key)?, yaml_to_value(value)?);
            }
            Value::Map(map)
        }
        // A tag carries no meaning here; keep the tagged value itself.
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(tagged.value)?,
    })
}

/// Render a YAML mapping key as a string. Scalar keys are accepted and
/// stringified; structured keys are rejected.
fn yaml_key_to_string(key: serde_yaml::Value) -> std::result::Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(format!(
            "mapping key must be a scalar, found {other:?}"
        )),
    }
}

fn json_to_value(json: serde_json::Value) -> std::result::Result<Value, String> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(format!("unrepresentable number: {n}"));
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(json_to_value)
                .collect::<std::result::Result<_, _>>()?,
        ),
        serde_json::Value::Object(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key, json_to_value(value)?);
            }
            Value::Map(map)
        }
    })
}

fn toml_to_value(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        // TOML datetimes have no counterpart in the value model.
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            Value::Array(items.into_iter().map(toml_to_value).collect())
        }
        toml::Value::Table(table) => {
            let mut map = Map::with_capacity(table.len());
            for (key, value) in table {
                map.insert(key, toml_to_value(value));
            }
            Value::Map(map)
        }
    }
}
