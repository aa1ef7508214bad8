//! Collapsing layered values into plain maps.
//!
//! The merge is shape-directed and the base map defines the key universe:
//! a layer key absent from the base is dropped, never inserted. Mappings
//! merge recursively, non-empty sequences replace wholesale, scalars
//! replace. Shape conflicts are handled per [`MismatchPolicy`].

use crate::error::{ConfigError, Result};
use crate::overlay::MismatchPolicy;
use crate::value::{Map, Value};

/// Options controlling materialization.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeOptions {
    /// Drop null-valued keys from the merged result, recursively.
    pub strip_null: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { strip_null: true }
    }
}

/// Apply one override layer on top of `base`, in place.
///
/// Only keys already present in `base` are touched. An empty sequence in
/// the layer is treated as "no opinion" and leaves the base value alone.
pub(crate) fn merge_map(base: &mut Map, layer: Map, policy: MismatchPolicy) -> Result<()> {
    for (key, incoming) in layer {
        let Some(current) = base.get_mut(&key) else {
            continue;
        };
        match (&mut *current, incoming) {
            (Value::Map(current), Value::Map(incoming)) => {
                merge_map(current, incoming, policy)?;
            }
            (current @ Value::Array(_), Value::Array(incoming)) => {
                if !incoming.is_empty() {
                    *current = Value::Array(incoming);
                }
            }
            (current_scalar, incoming) if current_scalar.is_scalar() && incoming.is_scalar() => {
                *current_scalar = incoming;
            }
            (current, incoming) => {
                if policy == MismatchPolicy::Error {
                    return Err(ConfigError::TypeMismatch {
                        key,
                        expected: current.kind(),
                        found: incoming.kind(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Remove null-valued keys, recursing into nested mappings and into
/// mappings inside sequences.
pub(crate) fn strip_nulls(map: &mut Map) {
    map.retain(|_, value| !value.is_null());
    for value in map.values_mut() {
        match value {
            Value::Map(nested) => strip_nulls(nested),
            Value::Array(items) => {
                for item in items {
                    if let Value::Map(nested) = item {
                        strip_nulls(nested);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Map {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_ignores_unknown_keys() {
        let mut base = map(&[("known", Value::from(1i64))]);
        let layer = map(&[("known", Value::from(2i64)), ("unknown", Value::from(3i64))]);
        merge_map(&mut base, layer, MismatchPolicy::Skip).unwrap();
        assert_eq!(base.get("known"), Some(&Value::Integer(2)));
        assert!(!base.contains_key("unknown"));
    }

    #[test]
    fn test_merge_recurses_into_mappings() {
        let mut base = map(&[(
            "nested",
            Value::Map(map(&[("a", Value::from(1i64)), ("b", Value::from(2i64))])),
        )]);
        let layer = map(&[("nested", Value::Map(map(&[("a", Value::from(10i64))])))]);
        merge_map(&mut base, layer, MismatchPolicy::Skip).unwrap();
        let nested = base.get("nested").unwrap().as_map().unwrap();
        assert_eq!(nested.get("a"), Some(&Value::Integer(10)));
        assert_eq!(nested.get("b"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_merge_replaces_sequences_wholesale() {
        let mut base = map(&[(
            "list",
            Value::Array(vec![Value::from("a"), Value::from("b")]),
        )]);
        let layer = map(&[("list", Value::Array(vec![Value::from("c")]))]);
        merge_map(&mut base, layer, MismatchPolicy::Skip).unwrap();
        assert_eq!(
            base.get("list"),
            Some(&Value::Array(vec![Value::from("c")]))
        );
    }

    #[test]
    fn test_merge_skips_empty_sequences() {
        let mut base = map(&[("list", Value::Array(vec![Value::from("a")]))]);
        let layer = map(&[("list", Value::Array(vec![]))]);
        merge_map(&mut base, layer, MismatchPolicy::Skip).unwrap();
        assert_eq!(
            base.get("list"),
            Some(&Value::Array(vec![Value::from("a")]))
        );
    }

    #[test]
    fn test_merge_mismatch_policies() {
        let mut base = map(&[("key", Value::from(1i64))]);
        let layer = map(&[("key", Value::Map(Map::new()))]);
        merge_map(&mut base, layer.clone(), MismatchPolicy::Skip).unwrap();
        assert_eq!(base.get("key"), Some(&Value::Integer(1)));

        let err = merge_map(&mut base, layer, MismatchPolicy::Error).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { ref key, .. } if key == "key"));
    }

    #[test]
    fn test_strip_nulls_recursive() {
        let mut m = map(&[
            ("keep", Value::from(1i64)),
            ("drop", Value::Null),
            (
                "nested",
                Value::Map(map(&[("inner_drop", Value::Null), ("inner_keep", Value::from(2i64))])),
            ),
            (
                "list",
                Value::Array(vec![Value::Map(map(&[("x", Value::Null)])), Value::Null]),
            ),
        ]);
        strip_nulls(&mut m);
        assert!(!m.contains_key("drop"));
        let nested = m.get("nested").unwrap().as_map().unwrap();
        assert!(!nested.contains_key("inner_drop"));
        assert!(nested.contains_key("inner_keep"));
        // Null elements inside sequences stay; stripping is key-based.
        let list = m.get("list").unwrap().as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].as_map().unwrap().is_empty());
    }
}
