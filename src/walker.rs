//! Generic pre-order traversal over JSON value trees.
//!
//! The walker knows nothing about FHIR: it reports every object node
//! together with the property path leading to it and leaves all meaning to
//! the caller's visit callback.

use serde_json::{Map, Value};

use crate::types::PropertyPath;

/// Visit every object node under `node`, root first.
///
/// Arrays are transparent: their elements are walked at the array's own
/// path. Object properties are walked in the object's enumeration order
/// with the property name appended. Scalars are only seen through their
/// parent object.
pub fn walk<'v, F>(node: &'v Value, path: &PropertyPath<'_>, visit: &mut F)
where
    F: FnMut(&'v Map<String, Value>, &PropertyPath<'_>),
{
    match node {
        Value::Array(items) => {
            for item in items {
                walk(item, path, visit);
            }
        }
        Value::Object(object) => {
            visit(object, path);
            for (key, value) in object {
                walk(value, &path.child(key), visit);
            }
        }
        _ => {}
    }
}

/// Number of object nodes in `node`, i.e. how many visits [`walk`] makes.
pub fn count_objects(node: &Value) -> usize {
    match node {
        Value::Array(items) => items.iter().map(count_objects).sum(),
        Value::Object(object) => 1 + object.values().map(count_objects).sum::<usize>(),
        _ => 0,
    }
}
