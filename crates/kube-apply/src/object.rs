//! Helpers over the schema-less object type.
//!
//! Identity is (group, kind, namespace, name); apiVersion carries the
//! group/version pair in one string and is split on demand.

use std::fmt;
use std::str::FromStr as _;

use kube::api::DynamicObject;
use kube::core::{GroupVersion, GroupVersionKind};

use crate::error::ApplyError;

/// "group/version" (bare "version" for the core group) for a GVK.
pub fn api_version_of(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    }
}

/// Extract the group/version/kind an object declares about itself.
pub fn gvk_of(obj: &DynamicObject) -> Result<GroupVersionKind, ApplyError> {
    let types = obj
        .types
        .as_ref()
        .ok_or_else(|| ApplyError::MissingTypeMeta(display_name(obj)))?;
    Ok(GroupVersion::from_str(&types.api_version)?.with_kind(&types.kind))
}

pub fn name_of(obj: &DynamicObject) -> Result<&str, ApplyError> {
    obj.metadata.name.as_deref().ok_or(ApplyError::MissingName)
}

/// True when the object carries `key: value` in its annotations.
pub fn has_annotation(obj: &DynamicObject, key: &str, value: &str) -> bool {
    obj.metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(key))
        .is_some_and(|v| v == value)
}

/// Best-effort "Kind ns/name" string for error messages and logs.
pub fn display_name(obj: &DynamicObject) -> String {
    let kind = obj
        .types
        .as_ref()
        .map(|t| t.kind.as_str())
        .unwrap_or("<unknown kind>");
    match (&obj.metadata.namespace, &obj.metadata.name) {
        (Some(namespace), Some(name)) => format!("{kind} {namespace}/{name}"),
        (None, Some(name)) => format!("{kind} {name}"),
        _ => format!("{kind} <unnamed>"),
    }
}

/// Full identity of an object, usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub group: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn new(
        group: impl Into<String>,
        kind: impl Into<String>,
        namespace: Option<&str>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            namespace: namespace.map(str::to_owned),
            name: name.into(),
        }
    }

    pub fn of(obj: &DynamicObject) -> Result<Self, ApplyError> {
        let gvk = gvk_of(obj)?;
        Ok(Self {
            group: gvk.group,
            kind: gvk.kind,
            namespace: obj.metadata.namespace.clone(),
            name: name_of(obj)?.to_owned(),
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{} {}/{}", self.kind, namespace, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(api_version: &str, kind: &str, name: &str) -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": api_version,
            "kind": kind,
            "metadata": {"name": name},
        }))
        .unwrap()
    }

    #[test]
    fn gvk_of_splits_core_and_grouped_api_versions() {
        let svc = object("v1", "Service", "s");
        let gvk = gvk_of(&svc).unwrap();
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "Service");

        let ds = object("apps/v1", "DaemonSet", "d");
        let gvk = gvk_of(&ds).unwrap();
        assert_eq!(gvk.group, "apps");
        assert_eq!(api_version_of(&gvk), "apps/v1");
    }

    #[test]
    fn annotation_check_requires_exact_value() {
        let mut obj = object("v1", "ConfigMap", "c");
        obj.metadata.annotations = Some(
            [("k".to_owned(), "true".to_owned())]
                .into_iter()
                .collect(),
        );
        assert!(has_annotation(&obj, "k", "true"));
        assert!(!has_annotation(&obj, "k", "false"));
        assert!(!has_annotation(&obj, "missing", "true"));
    }
}
