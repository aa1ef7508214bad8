//! Lazy, directory-backed mappings and sequences.
//!
//! A mapping is a directory: an optional `__config__.{ext}` keyfile holds
//! an eagerly-parsed sub-mapping, and every other file or subdirectory is
//! one key. A subdirectory encodes a sequence iff it contains an element
//! named `0`; otherwise it is a nested mapping.
//!
//! # Laziness
//!
//! - [`LazyMode::Eager`]: every key is resolved at construction,
//!   recursively.
//! - [`LazyMode::Cached`]: a key is resolved once, on first access, and
//!   the resolved value is reused. Nested subdirectories stay lazy until
//!   accessed.
//! - [`LazyMode::OnDemand`]: every access re-resolves from disk; nested
//!   values inherit the same mode.
//!
//! Instances share subtree state through `Rc`; cloning a [`LazyMapping`]
//! or [`LazySequence`] is cheap and shares the cache. The whole model is
//! single-threaded and synchronous.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::error::{ConfigError, Result};
use crate::loader::LoaderRegistry;
use crate::value::{Map, Value};

/// File stem of the optional keyfile inside a mapping directory.
pub const KEYFILE: &str = "__config__";

/// Load strategy for directory-backed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LazyMode {
    /// Resolve every key at construction, recursively.
    Eager,
    /// Resolve a key on first access and reuse the result.
    #[default]
    Cached,
    /// Re-resolve on every access; no caching.
    OnDemand,
}

/// A value produced by resolving a key or element: either an
/// already-parsed plain value, or a lazy stand-in for a subtree that has
/// not been descended into yet.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    /// A plain value parsed from a file (or taken from a keyfile).
    Plain(Value),
    /// A directory-backed mapping, loaded per its laziness mode.
    Map(LazyMapping),
    /// A directory-backed sequence, loaded per its laziness mode.
    Seq(LazySequence),
}

/// The fundamental shape of a value, used to branch override resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Mapping-like: plain map or lazy mapping.
    Mapping,
    /// Sequence-like: plain array or lazy sequence.
    Sequence,
    /// Anything else.
    Scalar,
}

impl ConfigValue {
    /// Classify this value's shape without forcing any loads.
    pub fn shape(&self) -> Shape {
        match self {
            ConfigValue::Plain(Value::Map(_)) | ConfigValue::Map(_) => Shape::Mapping,
            ConfigValue::Plain(Value::Array(_)) | ConfigValue::Seq(_) => Shape::Sequence,
            ConfigValue::Plain(_) => Shape::Scalar,
        }
    }

    /// Recursively resolve into a plain [`Value`] with no lazy state.
    pub fn materialize(&self) -> Result<Value> {
        match self {
            ConfigValue::Plain(value) => Ok(value.clone()),
            ConfigValue::Map(mapping) => mapping.materialize(),
            ConfigValue::Seq(sequence) => sequence.materialize(),
        }
    }
}

/// A directory-backed mapping.
#[derive(Debug, Clone)]
pub struct LazyMapping {
    inner: Rc<MappingInner>,
}

#[derive(Debug)]
struct MappingInner {
    path: PathBuf,
    mode: LazyMode,
    loaders: LoaderRegistry,
    /// Eagerly-parsed partial mapping from the keyfile.
    keyfile: Map,
    /// Keys discovered by the directory scan, not yet loaded.
    pending: IndexSet<String>,
    /// Resolved directory-derived keys. Unused in `OnDemand` mode.
    cache: RefCell<IndexMap<String, ConfigValue>>,
}

impl LazyMapping {
    /// Open a mapping directory.
    ///
    /// Performs one non-recursive scan, parses the keyfile if present
    /// (its top-level value must be a mapping), and verifies that keyfile
    /// keys and directory-derived keys are disjoint. In
    /// [`LazyMode::Eager`] every key is then resolved recursively.
    pub fn open(
        path: impl AsRef<Path>,
        mode: LazyMode,
        loaders: LoaderRegistry,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory { path });
        }

        let keyfile = match loaders.probe(&path, KEYFILE) {
            Some(file) => match loaders.load_file(&file)? {
                Value::Map(map) => map,
                other => {
                    return Err(ConfigError::MalformedSource {
                        path: file,
                        reason: format!(
                            "keyfile top-level value must be a mapping, found {}",
                            other.kind()
                        ),
                    });
                }
            },
            None => Map::new(),
        };

        let pending = scan_directory_keys(&path)?;
        for key in &pending {
            if keyfile.contains_key(key) {
                return Err(ConfigError::DuplicateKey {
                    key: key.clone(),
                    path,
                });
            }
        }

        debug!(
            path = %path.display(),
            keyfile_keys = keyfile.len(),
            pending_keys = pending.len(),
            ?mode,
            "opened mapping directory"
        );

        let mapping = Self {
            inner: Rc::new(MappingInner {
                path,
                mode,
                loaders,
                keyfile,
                pending,
                cache: RefCell::new(IndexMap::new()),
            }),
        };

        if mode == LazyMode::Eager {
            mapping.resolve_all()?;
        }

        Ok(mapping)
    }

    /// Resolve a key.
    ///
    /// Resolution order: keyfile, cache, file with a recognized
    /// extension, subdirectory (sequence or nested mapping). Fails with
    /// [`ConfigError::KeyNotFound`] when none match.
    pub fn get(&self, key: &str) -> Result<ConfigValue> {
        if let Some(value) = self.inner.keyfile.get(key) {
            return Ok(ConfigValue::Plain(value.clone()));
        }

        if self.inner.mode != LazyMode::OnDemand {
            if let Some(value) = self.inner.cache.borrow().get(key) {
                return Ok(value.clone());
            }
        }

        if !self.inner.pending.contains(key) {
            return Err(ConfigError::KeyNotFound(key.to_string()));
        }

        let value = self.load_key(key)?;
        if self.inner.mode != LazyMode::OnDemand {
            self.inner
                .cache
                .borrow_mut()
                .insert(key.to_string(), value.clone());
        }
        Ok(value)
    }

    /// Load a directory-derived key from disk.
    fn load_key(&self, key: &str) -> Result<ConfigValue> {
        let inner = &*self.inner;
        if let Some(file) = inner.loaders.probe(&inner.path, key) {
            trace!(key, path = %file.display(), "loading key from file");
            return Ok(ConfigValue::Plain(inner.loaders.load_file(&file)?));
        }

        let dir = inner.path.join(key);
        if dir.is_dir() {
            trace!(key, path = %dir.display(), "descending into subdirectory");
            if is_sequence_dir(&dir, &inner.loaders) {
                let sequence = LazySequence::open(&dir, inner.mode, inner.loaders.clone())?;
                return Ok(ConfigValue::Seq(sequence));
            }
            let mapping = LazyMapping::open(&dir, inner.mode, inner.loaders.clone())?;
            return Ok(ConfigValue::Map(mapping));
        }

        // The scan saw an entry here, but it has no recognized extension.
        Err(ConfigError::KeyNotFound(key.to_string()))
    }

    /// Force every pending key into the cache, recursively.
    fn resolve_all(&self) -> Result<()> {
        for key in &self.inner.pending {
            // Nested directories opened here inherit the mode, so in
            // Eager mode they recurse on their own.
            self.get(key)?;
        }
        Ok(())
    }

    /// Recursively resolve every key and return a plain mapping.
    pub fn materialize(&self) -> Result<Value> {
        self.materialize_map().map(Value::Map)
    }

    pub(crate) fn materialize_map(&self) -> Result<Map> {
        let mut out = self.inner.keyfile.clone();
        for key in &self.inner.pending {
            let value = self.get(key)?.materialize()?;
            out.insert(key.clone(), value);
        }
        Ok(out)
    }

    /// Union of keyfile keys and directory-derived keys, keyfile first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner
            .keyfile
            .keys()
            .map(String::as_str)
            .chain(self.inner.pending.iter().map(String::as_str))
    }

    /// Whether the mapping declares this key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.keyfile.contains_key(key) || self.inner.pending.contains(key)
    }

    /// Number of keys (keyfile plus directory-derived).
    pub fn len(&self) -> usize {
        self.inner.keyfile.len() + self.inner.pending.len()
    }

    /// Whether the mapping has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The backing directory.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// The active laziness mode.
    pub fn mode(&self) -> LazyMode {
        self.inner.mode
    }
}

impl fmt::Display for LazyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LazyMapping(path='{}', keyfile keys: {:?}, lazy keys: {:?})",
            self.inner.path.display(),
            self.inner.keyfile.keys().collect::<Vec<_>>(),
            self.inner.pending.iter().collect::<Vec<_>>(),
        )
    }
}

/// A directory-backed sequence: elements are entries named `0`, `1`, …,
/// `N-1`, each either a structured-data file or a subdirectory.
#[derive(Debug, Clone)]
pub struct LazySequence {
    inner: Rc<SequenceInner>,
}

#[derive(Debug)]
struct SequenceInner {
    path: PathBuf,
    len: usize,
    mode: LazyMode,
    loaders: LoaderRegistry,
    cache: RefCell<IndexMap<usize, ConfigValue>>,
}

impl LazySequence {
    /// Open a sequence directory.
    ///
    /// The element count is the number of directory entries; element
    /// `count-1` must exist, which catches gaps and stray files early.
    pub fn open(
        path: impl AsRef<Path>,
        mode: LazyMode,
        loaders: LoaderRegistry,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory { path });
        }

        let len = fs::read_dir(&path)?.count();
        if len > 0 && !element_exists(&path, &loaders, len - 1) {
            return Err(ConfigError::MalformedSource {
                path: path.clone(),
                reason: format!(
                    "directory lists {len} entries but sequence element {} is missing",
                    len - 1
                ),
            });
        }

        debug!(path = %path.display(), len, ?mode, "opened sequence directory");

        let sequence = Self {
            inner: Rc::new(SequenceInner {
                path,
                len,
                mode,
                loaders,
                cache: RefCell::new(IndexMap::new()),
            }),
        };

        if mode == LazyMode::Eager {
            for index in 0..sequence.len() {
                sequence.get(index as i64)?;
            }
        }

        Ok(sequence)
    }

    /// Resolve one element. Negative indices count from the end.
    ///
    /// A missing backing entry surfaces as
    /// [`ConfigError::IndexOutOfRange`] at the offending index; the
    /// declared length is not pre-validated.
    pub fn get(&self, index: i64) -> Result<ConfigValue> {
        let resolved = self.resolve_index(index)?;

        if self.inner.mode != LazyMode::OnDemand {
            if let Some(value) = self.inner.cache.borrow().get(&resolved) {
                return Ok(value.clone());
            }
        }

        let value = self.load_element(resolved)?;
        if self.inner.mode != LazyMode::OnDemand {
            self.inner.cache.borrow_mut().insert(resolved, value.clone());
        }
        Ok(value)
    }

    /// Resolve several elements, in the given order.
    pub fn get_many(&self, indices: &[i64]) -> Result<Vec<ConfigValue>> {
        indices.iter().map(|&index| self.get(index)).collect()
    }

    /// Resolve the half-open range `start..end`. An oversized upper bound
    /// is clamped to the length, matching slice semantics.
    pub fn slice(&self, start: usize, end: usize) -> Result<Vec<ConfigValue>> {
        let end = end.min(self.inner.len);
        let start = start.min(end);
        (start..end).map(|index| self.get(index as i64)).collect()
    }

    /// The declared element count.
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// The backing directory.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Materialize every element into a plain array.
    pub fn materialize(&self) -> Result<Value> {
        self.materialize_items().map(Value::Array)
    }

    pub(crate) fn materialize_items(&self) -> Result<Vec<Value>> {
        (0..self.inner.len)
            .map(|index| self.get(index as i64)?.materialize())
            .collect()
    }

    fn resolve_index(&self, index: i64) -> Result<usize> {
        let len = self.inner.len as i64;
        let resolved = if index < 0 { index + len } else { index };
        if resolved < 0 {
            return Err(ConfigError::IndexOutOfRange {
                index,
                len: self.inner.len,
            });
        }
        Ok(resolved as usize)
    }

    fn load_element(&self, index: usize) -> Result<ConfigValue> {
        let inner = &*self.inner;
        let stem = index.to_string();
        if let Some(file) = inner.loaders.probe(&inner.path, &stem) {
            trace!(index, path = %file.display(), "loading sequence element");
            return Ok(ConfigValue::Plain(inner.loaders.load_file(&file)?));
        }

        let dir = inner.path.join(&stem);
        if dir.is_dir() {
            if is_sequence_dir(&dir, &inner.loaders) {
                let sequence = LazySequence::open(&dir, inner.mode, inner.loaders.clone())?;
                return Ok(ConfigValue::Seq(sequence));
            }
            let mapping = LazyMapping::open(&dir, inner.mode, inner.loaders.clone())?;
            return Ok(ConfigValue::Map(mapping));
        }

        Err(ConfigError::IndexOutOfRange {
            index: index as i64,
            len: inner.len,
        })
    }
}

impl fmt::Display for LazySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LazySequence(path='{}', length={})",
            self.inner.path.display(),
            self.inner.len
        )
    }
}

/// A subdirectory encodes a sequence iff it contains an element named `0`
/// (a file with a recognized extension, or a subdirectory).
fn is_sequence_dir(dir: &Path, loaders: &LoaderRegistry) -> bool {
    loaders.probe(dir, "0").is_some() || dir.join("0").is_dir()
}

/// Whether a sequence element with this index has any backing entry.
fn element_exists(dir: &Path, loaders: &LoaderRegistry, index: usize) -> bool {
    let stem = index.to_string();
    loaders.probe(dir, &stem).is_some() || dir.join(stem).is_dir()
}

/// One non-recursive directory scan: every entry except the keyfile
/// becomes a key. File names lose their extension; subdirectory names are
/// used as-is, so a dotted directory name stays addressable.
fn scan_directory_keys(path: &Path) -> Result<IndexSet<String>> {
    let mut keys = IndexSet::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let key = if entry.file_type()?.is_dir() {
            name.to_string()
        } else {
            Path::new(name.as_ref())
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| name.to_string())
        };
        if key == KEYFILE {
            continue;
        }
        keys.insert(key);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    fn open_mapping(dir: &Path, mode: LazyMode) -> LazyMapping {
        LazyMapping::open(dir, mode, LoaderRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_keyfile_and_directory_keys() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("__config__.yml"), "version: 1\nname: app");
        write(&dir.path().join("extra.yml"), "42");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        assert_eq!(mapping.len(), 3);
        assert!(mapping.contains_key("version"));
        assert!(mapping.contains_key("extra"));

        let extra = mapping.get("extra").unwrap().materialize().unwrap();
        assert_eq!(extra, Value::Integer(42));
    }

    #[test]
    fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        assert!(matches!(
            mapping.get("nope"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("__config__.yml"), "version: 1");
        write(&dir.path().join("version.yml"), "2");

        let result = LazyMapping::open(
            dir.path(),
            LazyMode::Cached,
            LoaderRegistry::with_defaults(),
        );
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateKey { ref key, .. }) if key == "version"
        ));
    }

    #[test]
    fn test_keyfile_must_be_mapping() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("__config__.yml"), "- just\n- a\n- list");

        let result = LazyMapping::open(
            dir.path(),
            LazyMode::Cached,
            LoaderRegistry::with_defaults(),
        );
        assert!(matches!(result, Err(ConfigError::MalformedSource { .. })));
    }

    #[test]
    fn test_subdirectory_becomes_nested_mapping() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested").join("inner.yml"), "leaf");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        let nested = mapping.get("nested").unwrap();
        assert_eq!(nested.shape(), Shape::Mapping);

        let ConfigValue::Map(nested) = nested else {
            panic!("expected mapping");
        };
        let inner = nested.get("inner").unwrap().materialize().unwrap();
        assert_eq!(inner, Value::from("leaf"));
    }

    #[test]
    fn test_zero_element_marks_sequence() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("list")).unwrap();
        write(&dir.path().join("list").join("0.yml"), "first");
        write(&dir.path().join("list").join("1.yml"), "second");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        let list = mapping.get("list").unwrap();
        let ConfigValue::Seq(list) = list else {
            panic!("expected sequence");
        };
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get(0).unwrap().materialize().unwrap(),
            Value::from("first")
        );
    }

    #[test]
    fn test_sequence_gap_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("list")).unwrap();
        write(&dir.path().join("list").join("0.yml"), "first");
        write(&dir.path().join("list").join("2.yml"), "third");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        // Two entries, so element 1 must exist; it does not.
        assert!(matches!(
            mapping.get("list"),
            Err(ConfigError::MalformedSource { .. })
        ));
    }

    #[test]
    fn test_negative_index() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("0.yml"), "a");
        write(&dir.path().join("1.yml"), "b");

        let seq =
            LazySequence::open(dir.path(), LazyMode::Cached, LoaderRegistry::with_defaults())
                .unwrap();
        assert_eq!(seq.get(-1).unwrap().materialize().unwrap(), Value::from("b"));
        assert_eq!(seq.get(-2).unwrap().materialize().unwrap(), Value::from("a"));
        assert!(matches!(
            seq.get(-3),
            Err(ConfigError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_index_past_end() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("0.yml"), "a");

        let seq =
            LazySequence::open(dir.path(), LazyMode::Cached, LoaderRegistry::with_defaults())
                .unwrap();
        assert!(matches!(
            seq.get(1),
            Err(ConfigError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_slice_clamps_upper_bound() {
        let dir = tempfile::tempdir().unwrap();
        for (i, v) in ["a", "b", "c"].iter().enumerate() {
            write(&dir.path().join(format!("{i}.yml")), v);
        }

        let seq =
            LazySequence::open(dir.path(), LazyMode::Cached, LoaderRegistry::with_defaults())
                .unwrap();
        let sliced = seq.slice(1, 1000).unwrap();
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced[0].materialize().unwrap(), Value::from("b"));
        assert_eq!(sliced[1].materialize().unwrap(), Value::from("c"));
    }

    #[test]
    fn test_get_many_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        for (i, v) in ["a", "b", "c"].iter().enumerate() {
            write(&dir.path().join(format!("{i}.yml")), v);
        }

        let seq =
            LazySequence::open(dir.path(), LazyMode::Cached, LoaderRegistry::with_defaults())
                .unwrap();
        let picked = seq.get_many(&[2, 0]).unwrap();
        assert_eq!(picked[0].materialize().unwrap(), Value::from("c"));
        assert_eq!(picked[1].materialize().unwrap(), Value::from("a"));
    }

    #[test]
    fn test_cached_mode_survives_file_removal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("key.yml"), "before");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        assert_eq!(
            mapping.get("key").unwrap().materialize().unwrap(),
            Value::from("before")
        );

        // A cached key never re-reads the file.
        fs::remove_file(dir.path().join("key.yml")).unwrap();
        assert_eq!(
            mapping.get("key").unwrap().materialize().unwrap(),
            Value::from("before")
        );
    }

    #[test]
    fn test_on_demand_mode_rereads() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("key.yml"), "before");

        let mapping = open_mapping(dir.path(), LazyMode::OnDemand);
        assert_eq!(
            mapping.get("key").unwrap().materialize().unwrap(),
            Value::from("before")
        );

        write(&dir.path().join("key.yml"), "after");
        assert_eq!(
            mapping.get("key").unwrap().materialize().unwrap(),
            Value::from("after")
        );
    }

    #[test]
    fn test_eager_mode_loads_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested").join("inner.yml"), "leaf");

        let mapping = open_mapping(dir.path(), LazyMode::Eager);

        // Everything was read at construction; the tree on disk is no
        // longer needed.
        fs::remove_dir_all(dir.path().join("nested")).unwrap();
        let nested = mapping.get("nested").unwrap();
        let ConfigValue::Map(nested) = nested else {
            panic!("expected mapping");
        };
        assert_eq!(
            nested.get("inner").unwrap().materialize().unwrap(),
            Value::from("leaf")
        );
    }

    #[test]
    fn test_materialize_full_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("__config__.yml"), "version: 1");
        fs::create_dir(dir.path().join("list")).unwrap();
        write(&dir.path().join("list").join("0.yml"), "a");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        let value = mapping.materialize().unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("version"), Some(&Value::Integer(1)));
        assert_eq!(
            map.get("list"),
            Some(&Value::Array(vec![Value::from("a")]))
        );
    }

    #[test]
    fn test_keys_are_keyfile_then_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("__config__.yml"), "alpha: 1\nbeta: 2");
        write(&dir.path().join("gamma.yml"), "3");

        let mapping = open_mapping(dir.path(), LazyMode::Cached);
        let keys: Vec<&str> = mapping.keys().collect();
        assert_eq!(&keys[..2], &["alpha", "beta"]);
        assert!(keys.contains(&"gamma"));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.yml");
        write(&file, "1");
        assert!(matches!(
            LazyMapping::open(&file, LazyMode::Cached, LoaderRegistry::with_defaults()),
            Err(ConfigError::NotADirectory { .. })
        ));
    }
}
