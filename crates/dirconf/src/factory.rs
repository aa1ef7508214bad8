//! Entry points for building layered configuration views.

use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::lazy::{LazyMapping, LazyMode};
use crate::loader::LoaderRegistry;
use crate::overlay::{Config, ConfigList, MapSource, MismatchPolicy, Resolved, SeqSource};
use crate::value::Value;

/// Knobs shared by the directory-backed entry points.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Load strategy for every tree opened through these options.
    pub laziness: LazyMode,
    /// Extension-to-parser table.
    pub loaders: LoaderRegistry,
    /// How shape conflicts between default and overrides are handled.
    pub mismatch: MismatchPolicy,
}

/// Open a layered view: one default tree plus override trees, lowest
/// priority first.
///
/// Every directory is opened as a mapping; opening validates each tree's
/// top level (and, in eager mode, the whole tree).
pub fn from_path(
    default_dir: impl AsRef<Path>,
    override_dirs: &[PathBuf],
    options: &Options,
) -> Result<Config> {
    let default_dir = default_dir.as_ref();
    debug!(
        default = %default_dir.display(),
        overrides = override_dirs.len(),
        "building configuration from directories"
    );

    let default = LazyMapping::open(default_dir, options.laziness, options.loaders.clone())?;
    let mut overrides = Vec::with_capacity(override_dirs.len());
    for dir in override_dirs {
        let mapping = LazyMapping::open(dir, options.laziness, options.loaders.clone())?;
        overrides.push(MapSource::Lazy(mapping));
    }

    Ok(Config::new(
        MapSource::Lazy(default),
        overrides,
        options.mismatch,
    ))
}

/// Open a layered view from environment variables.
///
/// `config_var` must name the default tree; a missing or unset variable
/// is an error. `override_var`, if given and set, holds a
/// [`env::split_paths`]-style list of override trees, lowest priority
/// first; empty segments are ignored, and an unset override variable
/// just means no overrides.
pub fn from_env(config_var: &str, override_var: Option<&str>, options: &Options) -> Result<Config> {
    let default_dir = env::var(config_var)
        .map_err(|_| ConfigError::MissingEnvVar(config_var.to_string()))?;

    let override_dirs: Vec<PathBuf> = override_var
        .and_then(env::var_os)
        .map(|joined| {
            env::split_paths(&joined)
                .filter(|path| !path.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    debug!(
        config_var,
        override_var,
        overrides = override_dirs.len(),
        "building configuration from environment"
    );
    from_path(default_dir, &override_dirs, options)
}

/// Build a layered view from in-memory values, no filesystem involved.
///
/// A mapping default yields a [`Config`] whose overrides must all be
/// mappings. A sequence default yields a [`ConfigList`]: the
/// highest-priority non-empty override sequence replaces it wholesale.
/// Any other default is rejected with [`ConfigError::UnsupportedRoot`].
pub fn from_primitive(default: Value, overrides: Vec<Value>) -> Result<Resolved> {
    match default {
        Value::Map(map) => {
            let mut layers = Vec::with_capacity(overrides.len());
            for layer in overrides {
                match layer {
                    Value::Map(layer) => layers.push(MapSource::Plain(Rc::new(layer))),
                    other => {
                        return Err(ConfigError::TypeMismatch {
                            key: "<root>".to_string(),
                            expected: "mapping",
                            found: other.kind(),
                        });
                    }
                }
            }
            Ok(Resolved::Config(Config::new(
                MapSource::Plain(Rc::new(map)),
                layers,
                MismatchPolicy::default(),
            )))
        }
        Value::Array(items) => {
            let mut chosen = items;
            for layer in overrides.into_iter().rev() {
                match layer {
                    Value::Array(layer) if !layer.is_empty() => {
                        chosen = layer;
                        break;
                    }
                    Value::Array(_) => {}
                    other => {
                        return Err(ConfigError::TypeMismatch {
                            key: "<root>".to_string(),
                            expected: "sequence",
                            found: other.kind(),
                        });
                    }
                }
            }
            Ok(Resolved::List(ConfigList::new(
                SeqSource::Plain(Rc::new(chosen)),
                MismatchPolicy::default(),
            )))
        }
        other => Err(ConfigError::UnsupportedRoot {
            found: other.kind(),
        }),
    }
}
