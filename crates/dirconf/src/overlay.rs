//! Layered configuration views.
//!
//! A [`Config`] stacks one default source and any number of override
//! sources. The default defines the key universe: a key that the default
//! does not declare cannot be resolved, no matter what the overrides say.
//! Resolution branches on the shape the *default* gives a key:
//!
//! - mapping: every override that also declares the key as a mapping is
//!   carried into a nested `Config`, so the layering applies recursively;
//! - sequence: the highest-priority override with a non-empty sequence
//!   replaces the default wholesale, with no per-element merging;
//! - scalar: the highest-priority override with a scalar value wins.
//!
//! Overrides are ordered lowest to highest priority. An override whose
//! value has the wrong shape for a key is handled per
//! [`MismatchPolicy`].

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::lazy::{ConfigValue, LazyMapping, LazySequence, Shape};
use crate::materialize::{merge_map, strip_nulls, MaterializeOptions};
use crate::value::{Map, Value};

/// How to treat an override whose value has a different shape than the
/// default declares for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Ignore the mismatched override and keep scanning lower layers.
    #[default]
    Skip,
    /// Fail resolution with [`ConfigError::TypeMismatch`].
    Error,
}

/// A mapping layer: either a lazy directory-backed mapping or a plain,
/// already-materialized map.
#[derive(Debug, Clone)]
pub enum MapSource {
    /// Directory-backed, loaded per its laziness mode.
    Lazy(LazyMapping),
    /// In-memory map, e.g. an override added programmatically.
    Plain(Rc<Map>),
}

impl MapSource {
    /// Look up a key. `Ok(None)` means the layer does not declare it.
    fn get(&self, key: &str) -> Result<Option<ConfigValue>> {
        match self {
            MapSource::Lazy(mapping) => match mapping.get(key) {
                Ok(value) => Ok(Some(value)),
                Err(ConfigError::KeyNotFound(_)) => Ok(None),
                Err(err) => Err(err),
            },
            MapSource::Plain(map) => {
                Ok(map.get(key).cloned().map(ConfigValue::Plain))
            }
        }
    }

    fn contains_key(&self, key: &str) -> bool {
        match self {
            MapSource::Lazy(mapping) => mapping.contains_key(key),
            MapSource::Plain(map) => map.contains_key(key),
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            MapSource::Lazy(mapping) => mapping.keys().map(str::to_string).collect(),
            MapSource::Plain(map) => map.keys().cloned().collect(),
        }
    }

    fn len(&self) -> usize {
        match self {
            MapSource::Lazy(mapping) => mapping.len(),
            MapSource::Plain(map) => map.len(),
        }
    }

    fn materialize(&self) -> Result<Map> {
        match self {
            MapSource::Lazy(mapping) => mapping.materialize_map(),
            MapSource::Plain(map) => Ok((**map).clone()),
        }
    }
}

/// A sequence layer: lazy directory-backed or plain in-memory.
#[derive(Debug, Clone)]
pub enum SeqSource {
    /// Directory-backed, loaded per its laziness mode.
    Lazy(LazySequence),
    /// In-memory sequence.
    Plain(Rc<Vec<Value>>),
}

impl SeqSource {
    fn len(&self) -> usize {
        match self {
            SeqSource::Lazy(sequence) => sequence.len(),
            SeqSource::Plain(items) => items.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: i64) -> Result<ConfigValue> {
        match self {
            SeqSource::Lazy(sequence) => sequence.get(index),
            SeqSource::Plain(items) => {
                let len = items.len() as i64;
                let resolved = if index < 0 { index + len } else { index };
                if resolved < 0 || resolved >= len {
                    return Err(ConfigError::IndexOutOfRange {
                        index,
                        len: items.len(),
                    });
                }
                Ok(ConfigValue::Plain(items[resolved as usize].clone()))
            }
        }
    }

    fn slice(&self, start: usize, end: usize) -> Result<Vec<ConfigValue>> {
        match self {
            SeqSource::Lazy(sequence) => sequence.slice(start, end),
            SeqSource::Plain(items) => {
                let end = end.min(items.len());
                let start = start.min(end);
                Ok(items[start..end]
                    .iter()
                    .cloned()
                    .map(ConfigValue::Plain)
                    .collect())
            }
        }
    }

    fn materialize(&self) -> Result<Vec<Value>> {
        match self {
            SeqSource::Lazy(sequence) => sequence.materialize_items(),
            SeqSource::Plain(items) => Ok((**items).clone()),
        }
    }
}

/// A resolved value: a nested layered mapping, a layered sequence, or a
/// plain scalar.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A nested mapping with its own override layers.
    Config(Config),
    /// A sequence view.
    List(ConfigList),
    /// A plain scalar value.
    Value(Value),
}

impl Resolved {
    /// Borrow as a nested `Config`, if this is a mapping.
    pub fn as_config(&self) -> Option<&Config> {
        match self {
            Resolved::Config(config) => Some(config),
            _ => None,
        }
    }

    /// Consume into a nested `Config`, if this is a mapping.
    pub fn into_config(self) -> Option<Config> {
        match self {
            Resolved::Config(config) => Some(config),
            _ => None,
        }
    }

    /// Borrow as a `ConfigList`, if this is a sequence.
    pub fn as_list(&self) -> Option<&ConfigList> {
        match self {
            Resolved::List(list) => Some(list),
            _ => None,
        }
    }

    /// Consume into a `ConfigList`, if this is a sequence.
    pub fn into_list(self) -> Option<ConfigList> {
        match self {
            Resolved::List(list) => Some(list),
            _ => None,
        }
    }

    /// Borrow the plain value, if this is a scalar.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Scalar string accessor.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Scalar integer accessor.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// Scalar float accessor, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// Scalar boolean accessor.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Whether this resolved to the null scalar.
    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Value(Value::Null))
    }

    /// Collapse into a plain value. Non-destructive: a `Config` stays
    /// layered, and null-valued keys are kept.
    pub fn materialize(&self) -> Result<Value> {
        match self {
            Resolved::Config(config) => config
                .resolved_map(&MaterializeOptions { strip_null: false })
                .map(Value::Map),
            Resolved::List(list) => list.materialize(),
            Resolved::Value(value) => Ok(value.clone()),
        }
    }
}

/// Wrap a raw value into its resolved view.
fn wrap(value: ConfigValue, mismatch: MismatchPolicy) -> Result<Resolved> {
    Ok(match value {
        ConfigValue::Map(mapping) => Resolved::Config(Config {
            default: MapSource::Lazy(mapping),
            overrides: Vec::new(),
            mismatch,
        }),
        ConfigValue::Seq(sequence) => Resolved::List(ConfigList {
            seq: SeqSource::Lazy(sequence),
            mismatch,
        }),
        ConfigValue::Plain(Value::Map(map)) => Resolved::Config(Config {
            default: MapSource::Plain(Rc::new(map)),
            overrides: Vec::new(),
            mismatch,
        }),
        ConfigValue::Plain(Value::Array(items)) => Resolved::List(ConfigList {
            seq: SeqSource::Plain(Rc::new(items)),
            mismatch,
        }),
        ConfigValue::Plain(value) => Resolved::Value(value),
    })
}

fn map_source_of(value: ConfigValue) -> Option<MapSource> {
    match value {
        ConfigValue::Map(mapping) => Some(MapSource::Lazy(mapping)),
        ConfigValue::Plain(Value::Map(map)) => Some(MapSource::Plain(Rc::new(map))),
        _ => None,
    }
}

fn seq_source_of(value: ConfigValue) -> Option<SeqSource> {
    match value {
        ConfigValue::Seq(sequence) => Some(SeqSource::Lazy(sequence)),
        ConfigValue::Plain(Value::Array(items)) => Some(SeqSource::Plain(Rc::new(items))),
        _ => None,
    }
}

fn shape_name(shape: Shape) -> &'static str {
    match shape {
        Shape::Mapping => "mapping",
        Shape::Sequence => "sequence",
        Shape::Scalar => "scalar",
    }
}

/// A layered configuration mapping.
#[derive(Debug, Clone)]
pub struct Config {
    default: MapSource,
    /// Lowest priority first; the last layer wins conflicts.
    overrides: Vec<MapSource>,
    mismatch: MismatchPolicy,
}

impl Config {
    /// Build a view over a default source and override layers, lowest
    /// priority first.
    pub fn new(default: MapSource, overrides: Vec<MapSource>, mismatch: MismatchPolicy) -> Self {
        Self {
            default,
            overrides,
            mismatch,
        }
    }

    /// Resolve a key through the layer stack.
    pub fn get(&self, key: &str) -> Result<Resolved> {
        let default = self
            .default
            .get(key)?
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        match default.shape() {
            Shape::Mapping => {
                // Carry every mapping-shaped override down one level.
                let mut nested = Vec::new();
                for layer in &self.overrides {
                    let Some(value) = layer.get(key)? else {
                        continue;
                    };
                    let found = value.shape();
                    match map_source_of(value) {
                        Some(source) => nested.push(source),
                        None => self.mismatched(key, Shape::Mapping, found)?,
                    }
                }
                let Some(default) = map_source_of(default) else {
                    // shape() said mapping, so this arm is unreachable;
                    // fall back to a key error rather than panicking.
                    return Err(ConfigError::KeyNotFound(key.to_string()));
                };
                Ok(Resolved::Config(Config {
                    default,
                    overrides: nested,
                    mismatch: self.mismatch,
                }))
            }
            Shape::Sequence => {
                for layer in self.overrides.iter().rev() {
                    let Some(value) = layer.get(key)? else {
                        continue;
                    };
                    let found = value.shape();
                    match seq_source_of(value) {
                        Some(seq) if !seq.is_empty() => {
                            return Ok(Resolved::List(ConfigList {
                                seq,
                                mismatch: self.mismatch,
                            }));
                        }
                        // An empty override sequence expresses no opinion.
                        Some(_) => {}
                        None => self.mismatched(key, Shape::Sequence, found)?,
                    }
                }
                wrap(default, self.mismatch)
            }
            Shape::Scalar => {
                for layer in self.overrides.iter().rev() {
                    let Some(value) = layer.get(key)? else {
                        continue;
                    };
                    if value.shape() == Shape::Scalar {
                        return Ok(Resolved::Value(value.materialize()?));
                    }
                    self.mismatched(key, Shape::Scalar, value.shape())?;
                }
                Ok(Resolved::Value(default.materialize()?))
            }
        }
    }

    fn mismatched(&self, key: &str, expected: Shape, found: Shape) -> Result<()> {
        match self.mismatch {
            MismatchPolicy::Skip => Ok(()),
            MismatchPolicy::Error => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: shape_name(expected),
                found: shape_name(found),
            }),
        }
    }

    /// Walk a path of nested mapping keys and resolve the final segment.
    ///
    /// `at(&["database", "connection", "hosts"])` is
    /// `get("database")?...get("hosts")` with intermediate segments
    /// required to resolve to mappings.
    pub fn at(&self, path: &[&str]) -> Result<Resolved> {
        let mut cursor = Resolved::Config(self.clone());
        for segment in path {
            let config = match &cursor {
                Resolved::Config(config) => config,
                other => {
                    return Err(ConfigError::TypeMismatch {
                        key: segment.to_string(),
                        expected: "mapping",
                        found: match other {
                            Resolved::List(_) => "sequence",
                            _ => "scalar",
                        },
                    });
                }
            };
            cursor = config.get(segment)?;
        }
        Ok(cursor)
    }

    /// Push an in-memory override layer at the highest priority.
    /// Null-valued keys are removed first so they cannot shadow defaults.
    pub fn add_override(&mut self, mut layer: Map) {
        strip_nulls(&mut layer);
        self.add_override_with_nulls(layer);
    }

    /// Push an in-memory override layer, keeping null-valued keys. A null
    /// override then wins scalar resolution with `Value::Null`.
    pub fn add_override_with_nulls(&mut self, layer: Map) {
        debug!(keys = layer.len(), "adding override layer");
        self.overrides.push(MapSource::Plain(Rc::new(layer)));
    }

    /// Merge the full stack into one plain map.
    pub(crate) fn resolved_map(&self, options: &MaterializeOptions) -> Result<Map> {
        let mut merged = self.default.materialize()?;
        for layer in &self.overrides {
            merge_map(&mut merged, layer.materialize()?, self.mismatch)?;
        }
        if options.strip_null {
            strip_nulls(&mut merged);
        }
        Ok(merged)
    }

    /// Collapse the view into a plain mapping and return it.
    ///
    /// Destructive and idempotent: the merged result replaces the layer
    /// stack, so later lookups read from the collapsed map and lazy
    /// state is dropped. Null-valued keys are stripped; use
    /// [`Config::materialize_with_options`] to keep them.
    pub fn materialize(&mut self) -> Result<Value> {
        self.materialize_with_options(&MaterializeOptions::default())
    }

    /// [`Config::materialize`] with explicit options.
    pub fn materialize_with_options(&mut self, options: &MaterializeOptions) -> Result<Value> {
        let merged = self.resolved_map(options)?;
        self.default = MapSource::Plain(Rc::new(merged.clone()));
        self.overrides.clear();
        Ok(Value::Map(merged))
    }

    /// The keys of the default source, which are exactly the resolvable
    /// keys of the whole view.
    pub fn keys(&self) -> Vec<String> {
        self.default.keys()
    }

    /// Whether a key is resolvable.
    pub fn contains_key(&self, key: &str) -> bool {
        self.default.contains_key(key)
    }

    /// Number of resolvable keys.
    pub fn len(&self) -> usize {
        self.default.len()
    }

    /// Whether the view has no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate keys together with their resolved values.
    pub fn iter(&self) -> impl Iterator<Item = (String, Result<Resolved>)> + '_ {
        self.keys().into_iter().map(move |key| {
            let value = self.get(&key);
            (key, value)
        })
    }
}

impl PartialEq for Config {
    /// Deep structural equality through the layer stacks. Resolution
    /// errors on either side compare unequal.
    fn eq(&self, other: &Self) -> bool {
        let options = MaterializeOptions { strip_null: false };
        match (self.resolved_map(&options), other.resolved_map(&options)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<Map> for Config {
    fn eq(&self, other: &Map) -> bool {
        let options = MaterializeOptions { strip_null: false };
        matches!(self.resolved_map(&options), Ok(map) if map == *other)
    }
}

impl PartialEq<Value> for Config {
    fn eq(&self, other: &Value) -> bool {
        match other.as_map() {
            Some(map) => *self == *map,
            None => false,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration keys: {}", self.keys().join(", "))
    }
}

/// A layered view over a sequence.
///
/// Sequences never merge per element: the winning layer was chosen when
/// the parent key resolved, so a `ConfigList` wraps exactly one source.
#[derive(Debug, Clone)]
pub struct ConfigList {
    seq: SeqSource,
    mismatch: MismatchPolicy,
}

impl ConfigList {
    /// Build a list view over a single sequence source.
    pub fn new(seq: SeqSource, mismatch: MismatchPolicy) -> Self {
        Self { seq, mismatch }
    }

    /// The element count.
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    /// Whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Resolve one element. Negative indices count from the end.
    pub fn get(&self, index: i64) -> Result<Resolved> {
        wrap(self.seq.get(index)?, self.mismatch)
    }

    /// Resolve several elements, in the given order.
    pub fn get_many(&self, indices: &[i64]) -> Result<Vec<Resolved>> {
        indices.iter().map(|&index| self.get(index)).collect()
    }

    /// Resolve the half-open range `start..end`, clamping the upper
    /// bound to the length.
    pub fn slice(&self, start: usize, end: usize) -> Result<Vec<Resolved>> {
        self.seq
            .slice(start, end)?
            .into_iter()
            .map(|value| wrap(value, self.mismatch))
            .collect()
    }

    /// Iterate resolved elements front to back.
    pub fn iter(&self) -> impl Iterator<Item = Result<Resolved>> + '_ {
        (0..self.len()).map(|index| self.get(index as i64))
    }

    /// Collapse every element into a plain array.
    pub fn materialize(&self) -> Result<Value> {
        self.seq.materialize().map(Value::Array)
    }
}

impl PartialEq for ConfigList {
    fn eq(&self, other: &Self) -> bool {
        match (self.seq.materialize(), other.seq.materialize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<Vec<Value>> for ConfigList {
    fn eq(&self, other: &Vec<Value>) -> bool {
        matches!(self.seq.materialize(), Ok(items) if items == *other)
    }
}

impl PartialEq<Value> for ConfigList {
    fn eq(&self, other: &Value) -> bool {
        match other.as_array() {
            Some(items) => matches!(self.seq.materialize(), Ok(ours) if ours == items),
            None => false,
        }
    }
}

impl fmt::Display for ConfigList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration list of length {}", self.len())
    }
}
