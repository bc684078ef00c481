//! Typed path access over schema-less field trees.
//!
//! Merge policies reach into objects by string path ("metadata.labels",
//! "spec.clusterIP"). These helpers make absent-vs-mistyped explicit so a
//! policy can treat "not set" as carry-forward while a malformed tree is a
//! hard error.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment on the way to the target does not exist
    #[error("path {0} not found")]
    NotFound(String),

    /// A node on the way to (or at) the target has the wrong JSON type
    #[error("path {path} is not a {expected}")]
    WrongType { path: String, expected: &'static str },
}

fn prefix(path: &[&str], depth: usize) -> String {
    if depth == 0 {
        ".".to_owned()
    } else {
        path[..depth].join(".")
    }
}

/// Resolve `path` in `root`, failing with the exact offending prefix.
pub fn get_path<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, PathError> {
    let mut node = root;
    for (depth, segment) in path.iter().enumerate() {
        let map = node.as_object().ok_or_else(|| PathError::WrongType {
            path: prefix(path, depth),
            expected: "object",
        })?;
        node = map
            .get(*segment)
            .ok_or_else(|| PathError::NotFound(prefix(path, depth + 1)))?;
    }
    Ok(node)
}

/// Like [`get_path`] but maps NotFound to `None`. Mistyped trees still fail.
pub fn get_opt<'a>(root: &'a Value, path: &[&str]) -> Result<Option<&'a Value>, PathError> {
    match get_path(root, path) {
        Ok(value) => Ok(Some(value)),
        Err(PathError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Resolve `path` and coerce it to a string.
pub fn get_str<'a>(root: &'a Value, path: &[&str]) -> Result<&'a str, PathError> {
    get_path(root, path)?.as_str().ok_or(PathError::WrongType {
        path: path.join("."),
        expected: "string",
    })
}

/// Set `value` at `path`, creating intermediate objects as needed. Empty
/// paths are rejected.
pub fn set_path(root: &mut Value, path: &[&str], value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(PathError::NotFound(".".to_owned()));
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let map = node.as_object_mut().ok_or_else(|| PathError::WrongType {
            path: prefix(path, depth),
            expected: "object",
        })?;
        node = map
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = node.as_object_mut().ok_or_else(|| PathError::WrongType {
        path: prefix(path, parents.len()),
        expected: "object",
    })?;
    map.insert((*last).to_owned(), value);
    Ok(())
}

/// Remove the value at `path`, returning it. Absent paths return `None`.
pub fn remove_path(root: &mut Value, path: &[&str]) -> Result<Option<Value>, PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(None);
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let map = node.as_object_mut().ok_or_else(|| PathError::WrongType {
            path: prefix(path, depth),
            expected: "object",
        })?;
        match map.get_mut(*segment) {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }

    let map = node.as_object_mut().ok_or_else(|| PathError::WrongType {
        path: prefix(path, parents.len()),
        expected: "object",
    })?;
    Ok(map.remove(*last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_resolves_nested_values() {
        let root = json!({"spec": {"clusterIP": "10.0.0.1"}});
        assert_eq!(
            get_path(&root, &["spec", "clusterIP"]).unwrap(),
            &json!("10.0.0.1")
        );
    }

    #[test]
    fn absent_key_is_not_found_with_exact_prefix() {
        let root = json!({"spec": {}});
        let err = get_path(&root, &["spec", "clusterIP"]).unwrap_err();
        assert_eq!(err, PathError::NotFound("spec.clusterIP".to_owned()));
    }

    #[test]
    fn mistyped_intermediate_is_wrong_type_not_not_found() {
        let root = json!({"spec": "oops"});
        let err = get_path(&root, &["spec", "clusterIP"]).unwrap_err();
        assert_eq!(
            err,
            PathError::WrongType {
                path: "spec".to_owned(),
                expected: "object",
            }
        );
    }

    #[test]
    fn get_str_rejects_non_string_leaf() {
        let root = json!({"spec": {"replicas": 3}});
        let err = get_str(&root, &["spec", "replicas"]).unwrap_err();
        assert_eq!(
            err,
            PathError::WrongType {
                path: "spec.replicas".to_owned(),
                expected: "string",
            }
        );
    }

    #[test]
    fn get_opt_maps_not_found_to_none() {
        let root = json!({});
        assert_eq!(get_opt(&root, &["metadata", "labels"]).unwrap(), None);
    }

    #[test]
    fn set_path_creates_intermediate_objects() {
        let mut root = json!({});
        set_path(&mut root, &["metadata", "labels", "app"], json!("multus")).unwrap();
        assert_eq!(root, json!({"metadata": {"labels": {"app": "multus"}}}));
    }

    #[test]
    fn set_path_refuses_to_tunnel_through_scalars() {
        let mut root = json!({"metadata": 7});
        let err = set_path(&mut root, &["metadata", "labels", "app"], json!("x")).unwrap_err();
        assert_eq!(
            err,
            PathError::WrongType {
                path: "metadata".to_owned(),
                expected: "object",
            }
        );
    }

    #[test]
    fn remove_path_returns_removed_value() {
        let mut root = json!({"metadata": {"resourceVersion": "42"}});
        let removed = remove_path(&mut root, &["metadata", "resourceVersion"]).unwrap();
        assert_eq!(removed, Some(json!("42")));
        assert_eq!(root, json!({"metadata": {}}));
    }

    #[test]
    fn remove_path_on_absent_branch_is_none() {
        let mut root = json!({});
        assert_eq!(remove_path(&mut root, &["status", "phase"]).unwrap(), None);
    }
}
