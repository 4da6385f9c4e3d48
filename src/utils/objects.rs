//! Object helpers over JSON maps. Results are always new values; the inputs
//! are borrowed and never changed.

use serde_json::{Map, Value};

use super::arrays::Truthy;
use crate::functions::identity;

pub type Object = Map<String, Value>;

pub fn keys(item: &Object) -> Vec<&str> {
    item.keys().map(String::as_str).collect()
}

pub fn values(item: &Object) -> Vec<&Value> {
    item.values().collect()
}

/// True for a missing value, `null`, `[]`, `{}` and values without keys.
pub fn is_empty(item: Option<&Value>) -> bool {
    match item {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => true,
    }
}

pub fn map_key_values<K, V>(item: &Object, mut map_key: K, mut map_value: V) -> Object
where
    K: FnMut(&str) -> String,
    V: FnMut(&Value) -> Value,
{
    item.iter()
        .map(|(key, value)| (map_key(key), map_value(value)))
        .collect()
}

pub fn map_keys<K>(item: &Object, map_key: K) -> Object
where
    K: FnMut(&str) -> String,
{
    map_key_values(item, map_key, |value| identity(value).clone())
}

pub fn map_values<V>(item: &Object, map_value: V) -> Object
where
    V: FnMut(&Value) -> Value,
{
    map_key_values(item, |key| identity(key).to_string(), map_value)
}

/// Replace every value with `reducer(key, value)`.
pub fn reduce<F>(item: &Object, mut reducer: F) -> Object
where
    F: FnMut(&str, &Value) -> Value,
{
    item.iter()
        .map(|(key, value)| (key.clone(), reducer(key, value)))
        .collect()
}

pub fn filter<F>(item: &Object, mut keep: F) -> Object
where
    F: FnMut(&str) -> bool,
{
    item.iter()
        .filter(|(key, _)| keep(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub fn omit(item: &Object, keys: &[&str]) -> Object {
    filter(item, |key| !keys.contains(&key))
}

pub fn pick(item: &Object, keys: &[&str]) -> Object {
    filter(item, |key| keys.contains(&key))
}

fn is_mergeable(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Deep merge of `source` into a copy of `target`.
///
/// Objects merge key by key. Arrays merge by index: missing slots are filled,
/// overlapping arrays and objects merge recursively, and scalars not already in
/// `target` are appended. Any other combination yields a copy of `source`.
pub fn merge(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Array(target), Value::Array(source)) => Value::Array(merge_arrays(target, source)),
        (Value::Object(target), Value::Object(source)) => {
            Value::Object(merge_objects(target, source))
        }
        _ => source.clone(),
    }
}

fn merge_arrays(target: &[Value], source: &[Value]) -> Vec<Value> {
    let mut destination = target.to_vec();
    for (idx, item) in source.iter().enumerate() {
        if idx >= destination.len() {
            destination.push(item.clone());
        } else if is_mergeable(item) {
            destination[idx] = merge(target.get(idx).unwrap_or(&Value::Null), item);
        } else if !target.contains(item) {
            destination.push(item.clone());
        }
    }
    destination
}

fn merge_objects(target: &Object, source: &Object) -> Object {
    let mut destination = target.clone();
    for (key, value) in source {
        let merged = match target.get(key) {
            Some(existing) if is_mergeable(value) && existing.is_truthy() => merge(existing, value),
            _ => value.clone(),
        };
        destination.insert(key.clone(), merged);
    }
    destination
}

/// Entries of `patch` whose values differ from the same key in `old`.
pub fn patch(old: &Object, patch: &Object) -> Object {
    let mut result = Object::new();
    for (key, value) in patch {
        if old.get(key) != Some(value) {
            result.insert(key.clone(), value.clone());
        }
    }
    result
}

/// Primitives compare by value, arrays and objects by identity.
fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            std::ptr::eq(a, b)
        }
        _ => a == b,
    }
}

/// Compare own keys of two objects (or indices of two arrays), with values
/// compared by identity.
pub fn shallow_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    if identical(a, b) {
        return true;
    }

    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    b.get(key).is_some_and(|other| identical(value, other))
                })
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| identical(x, y))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn is_empty_cases() {
        assert!(is_empty(Some(&json!({}))));
        assert!(is_empty(None));
        assert!(is_empty(Some(&Value::Null)));
        assert!(is_empty(Some(&json!([]))));
        assert!(!is_empty(Some(&json!([1]))));
        assert!(!is_empty(Some(&json!({"key": 1}))));
    }

    #[test]
    fn keys_and_values_in_order() {
        let item = object(json!({"a": 1, "b": 2}));
        assert_eq!(keys(&item), vec!["a", "b"]);
        assert_eq!(values(&item), vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn map_values_transforms_each_value() {
        let item = object(json!({"a": 1, "b": 2}));
        let mapped = map_values(&item, |v| json!(v.as_i64().unwrap_or(0) + 1));
        assert_eq!(Value::Object(mapped), json!({"a": 2, "b": 3}));

        let item = object(json!({"a": "foo", "b": "bar"}));
        let mapped = map_values(&item, |v| json!(format!("{}z", v.as_str().unwrap_or(""))));
        assert_eq!(Value::Object(mapped), json!({"a": "fooz", "b": "barz"}));
    }

    #[test]
    fn map_keys_renames() {
        let item = object(json!({"a": "foo", "b": "bar"}));
        let mapped = map_keys(&item, |k| format!("{}z", k));
        assert_eq!(Value::Object(mapped), json!({"az": "foo", "bz": "bar"}));
    }

    #[test]
    fn reduce_sees_key_and_value() {
        let item = object(json!({"a": "foo", "b": "bar"}));
        let reduced = reduce(&item, |k, v| json!(format!("{}{}", k, v.as_str().unwrap_or(""))));
        assert_eq!(Value::Object(reduced), json!({"a": "afoo", "b": "bbar"}));
    }

    #[test]
    fn filter_omit_pick() {
        let item = object(json!({"a": "foo", "b": "bar"}));
        assert_eq!(Value::Object(filter(&item, |k| k != "a")), json!({"b": "bar"}));
        assert_eq!(Value::Object(omit(&item, &["a"])), json!({"b": "bar"}));
        assert_eq!(Value::Object(pick(&item, &["b"])), json!({"b": "bar"}));
    }

    #[test]
    fn patch_keeps_changed_and_new_entries() {
        let old = object(json!({"a": "foo", "b": "bar"}));
        let new = object(json!({"a": "foo", "b": "baz"}));
        assert_eq!(Value::Object(patch(&old, &new)), json!({"b": "baz"}));

        let old = object(json!({"a": 1, "b": 2}));
        let new = object(json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(Value::Object(patch(&old, &new)), json!({"b": 3, "c": 4}));
    }

    #[test]
    fn merge_is_immutable() {
        let source = json!({"key1": "value1", "key2": "value2"});
        let target = json!({});
        let result = merge(&target, &source);
        assert_eq!(target, json!({}));
        assert_eq!(result, source);
    }

    #[test]
    fn merge_simple() {
        let source = json!({"key1": "changed", "key2": "value2"});
        let target = json!({"key1": "value1", "key3": "value3"});
        assert_eq!(
            merge(&target, &source),
            json!({"key1": "changed", "key2": "value2", "key3": "value3"})
        );
    }

    #[test]
    fn merge_nested_objects() {
        let source = json!({"key1": {"subkey1": "changed", "subkey3": "added"}});
        let target = json!({"key1": {"subkey1": "value1", "subkey2": "value2"}});
        assert_eq!(
            merge(&target, &source),
            json!({"key1": {"subkey1": "changed", "subkey2": "value2", "subkey3": "added"}})
        );
    }

    #[test]
    fn merge_replaces_scalar_with_object() {
        let source = json!({"key1": {"subkey1": "subvalue1", "subkey2": "subvalue2"}});
        let target = json!({"key1": "value1", "key2": "value2"});
        assert_eq!(
            merge(&target, &source),
            json!({"key1": {"subkey1": "subvalue1", "subkey2": "subvalue2"}, "key2": "value2"})
        );
    }

    #[test]
    fn merge_adds_nested_object() {
        let source = json!({"b": {"c": {}}});
        let target = json!({"a": {}});
        assert_eq!(merge(&target, &source), json!({"a": {}, "b": {"c": {}}}));
    }

    #[test]
    fn merge_two_arrays() {
        assert_eq!(
            merge(&json!(["one", "two"]), &json!(["one", "three"])),
            json!(["one", "two", "three"])
        );
    }

    #[test]
    fn merge_longer_source_array() {
        let target = json!(["a1", "a2", "c1", "f1", "p1"]);
        let source = json!(["t1", "s1", "c2", "r1", "p2", "p3"]);
        assert_eq!(
            merge(&target, &source),
            json!(["a1", "a2", "c1", "f1", "p1", "t1", "s1", "c2", "r1", "p2", "p3"])
        );
        assert_eq!(target, json!(["a1", "a2", "c1", "f1", "p1"]));
    }

    #[test]
    fn merge_array_properties() {
        let source = json!({"key1": ["one", "three"], "key2": ["four"]});
        let target = json!({"key1": ["one", "two"]});
        assert_eq!(
            merge(&target, &source),
            json!({"key1": ["one", "two", "three"], "key2": ["four"]})
        );
    }

    #[test]
    fn merge_array_source_over_object() {
        let target = json!({"key1": ["one", "three"], "key2": ["four"]});
        let source = json!(["one", "two"]);
        assert_eq!(merge(&target, &source), json!(["one", "two"]));
    }

    #[test]
    fn merge_objects_inside_arrays() {
        let source = json!({"key1": [{"two": 1}]});
        let target = json!({"key1": [{"one": 1}]});
        assert_eq!(merge(&target, &source), json!({"key1": [{"one": 1, "two": 1}]}));
    }

    #[test]
    fn shallow_equal_null_handling() {
        assert!(!shallow_equal(Some(&Value::Null), Some(&json!({}))));
        assert!(!shallow_equal(Some(&json!({})), Some(&Value::Null)));
        assert!(shallow_equal(Some(&Value::Null), Some(&Value::Null)));
        assert!(shallow_equal(None, None));
    }

    #[test]
    fn shallow_equal_compares_keys_and_primitive_values() {
        let a = json!({"a": 1, "b": 2, "c": 3});
        assert!(shallow_equal(Some(&a), Some(&json!({"a": 1, "b": 2, "c": 3}))));
        assert!(!shallow_equal(Some(&a), Some(&json!({"a": 1, "b": 2}))));
        assert!(!shallow_equal(Some(&json!({"a": 1, "b": 2})), Some(&a)));
        assert!(!shallow_equal(Some(&json!({"a": 1, "b": 2, "d": 3})), Some(&a)));
    }

    #[test]
    fn shallow_equal_non_objects() {
        assert!(!shallow_equal(Some(&json!(1)), Some(&json!(2))));
        assert!(!shallow_equal(Some(&json!(1)), Some(&json!({}))));
        assert!(shallow_equal(Some(&json!("x")), Some(&json!("x"))));
    }

    #[test]
    fn shallow_equal_compound_values_by_identity() {
        let a = json!({"a": 1, "b": 2, "c": {}});
        let b = json!({"a": 1, "b": 2, "c": {}});
        assert!(!shallow_equal(Some(&a), Some(&b)));
        assert!(shallow_equal(Some(&a), Some(&a)));
    }

    #[test]
    fn shallow_equal_compares_arrays_by_index() {
        let xs = json!([1, "a", null]);
        assert!(shallow_equal(Some(&xs), Some(&json!([1, "a", null]))));
        assert!(!shallow_equal(Some(&json!([1])), Some(&json!([1, 2]))));
        assert!(!shallow_equal(Some(&json!([1, 2])), Some(&json!([2, 1]))));
        assert!(!shallow_equal(Some(&json!([[1]])), Some(&json!([[1]]))));
        assert!(!shallow_equal(Some(&json!([])), Some(&json!({}))));
    }
}
