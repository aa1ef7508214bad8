//! Directory-backed, layered configuration with lazy loading.
//!
//! A configuration is a directory tree: each directory is a mapping, each
//! structured-data file (YAML, JSON, or TOML) is one key, an optional
//! `__config__` keyfile contributes inline keys, and a subdirectory whose
//! entries are named `0`, `1`, … is a sequence. Trees are read lazily and
//! can be stacked: a default tree defines the key universe, override
//! trees refine values without ever introducing new keys.
//!
//! ```no_run
//! use dirconf::{from_path, Options};
//!
//! # fn main() -> dirconf::Result<()> {
//! let config = from_path("/etc/myapp", &["/etc/myapp.d/site".into()], &Options::default())?;
//! let version = config.at(&["service", "version"])?;
//! println!("version = {:?}", version.as_i64());
//! # Ok(())
//! # }
//! ```

mod error;
mod factory;
mod lazy;
mod loader;
mod materialize;
mod overlay;
mod value;

pub use error::{ConfigError, Result};
pub use factory::{from_env, from_path, from_primitive, Options};
pub use lazy::{ConfigValue, LazyMapping, LazyMode, LazySequence, Shape, KEYFILE};
pub use loader::{LoaderFn, LoaderRegistry};
pub use materialize::MaterializeOptions;
pub use overlay::{Config, ConfigList, MapSource, MismatchPolicy, Resolved, SeqSource};
pub use value::{Map, Value};
