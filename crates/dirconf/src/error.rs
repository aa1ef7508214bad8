//! Error types for dirconf.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while opening, resolving, or materializing
/// configuration trees.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The default tree does not declare this key. Overrides can never
    /// introduce keys, so a key missing from the default is unresolvable.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A sequence index has no backing element.
    #[error("list index out of range: {index} (length {len})")]
    IndexOutOfRange {
        /// The index as requested by the caller.
        index: i64,
        /// The declared element count of the sequence.
        len: usize,
    },

    /// A source file could not be parsed, or its content has the wrong
    /// top-level shape (e.g. a keyfile whose document is not a mapping).
    #[error("malformed configuration source {}: {reason}", path.display())]
    MalformedSource {
        /// The offending file or directory.
        path: PathBuf,
        /// Human-readable description of what is wrong.
        reason: String,
    },

    /// The same key is defined by both the keyfile and a directory entry
    /// within one mapping directory.
    #[error("duplicate key '{key}' in {}: defined by both the keyfile and a directory entry", path.display())]
    DuplicateKey {
        /// The duplicated key.
        key: String,
        /// The mapping directory containing the conflict.
        path: PathBuf,
    },

    /// An override supplies a value whose shape is incompatible with the
    /// shape the default declares for the same key. Only surfaced under
    /// [`MismatchPolicy::Error`](crate::MismatchPolicy::Error).
    #[error("type mismatch for key '{key}': default declares {expected}, override supplies {found}")]
    TypeMismatch {
        /// The key being resolved.
        key: String,
        /// Shape declared by the default.
        expected: &'static str,
        /// Shape supplied by the override.
        found: &'static str,
    },

    /// A configuration tree was opened from a path that is not a directory.
    #[error("not a configuration directory: {}", path.display())]
    NotADirectory {
        /// The path that was supposed to name a mapping directory.
        path: PathBuf,
    },

    /// The environment variable naming the default tree is not set.
    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    /// A view was built from a plain value that is neither a mapping nor
    /// a sequence.
    #[error("top-level value must be a mapping or a sequence, found {found}")]
    UnsupportedRoot {
        /// Kind of the offending value.
        found: &'static str,
    },

    /// Underlying I/O failure while listing a directory or reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
