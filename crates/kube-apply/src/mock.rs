//! Mock ObjectClient for unit testing
//!
//! This module provides an in-memory implementation of [`ObjectClient`] so
//! reconcile logic can be tested without a running cluster.
//!
//! The mock stores objects keyed by identity, counts mutating calls, and
//! can be configured to fail specific calls for error-path tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;

use crate::client::ObjectClient;
use crate::error::ApplyError;
use crate::object::{api_version_of, gvk_of, name_of, ObjectKey};

/// Failure the mock injects on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    Conflict,
    Invalid,
}

/// In-memory ObjectClient for testing
#[derive(Clone, Default)]
pub struct MockObjectClient {
    objects: Arc<Mutex<HashMap<ObjectKey, DynamicObject>>>,
    creates: Arc<Mutex<u64>>,
    updates: Arc<Mutex<u64>>,
    deletes: Arc<Mutex<u64>>,
    status_replaces: Arc<Mutex<u64>>,
    next_uid: Arc<Mutex<u64>>,
    fail_next_update: Arc<Mutex<Option<MockFault>>>,
    status_conflicts: Arc<Mutex<u32>>,
    unknown_kinds: Arc<Mutex<HashSet<String>>>,
}

impl MockObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object into the store (for test setup). Unlike `create`,
    /// this assigns no uid and bumps no counter.
    pub fn add_object(&self, obj: DynamicObject) {
        let key = ObjectKey::of(&obj).expect("mock object needs identity");
        self.objects.lock().unwrap().insert(key, obj);
    }

    /// Look up a stored object by kind/namespace/name, ignoring group.
    pub fn stored(
        &self,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<DynamicObject> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| {
                key.kind == kind && key.namespace.as_deref() == namespace && key.name == name
            })
            .map(|(_, obj)| obj.clone())
    }

    /// Identities of every stored object, in deterministic order.
    pub fn stored_keys(&self) -> Vec<ObjectKey> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn create_count(&self) -> u64 {
        *self.creates.lock().unwrap()
    }

    pub fn update_count(&self) -> u64 {
        *self.updates.lock().unwrap()
    }

    pub fn delete_count(&self) -> u64 {
        *self.deletes.lock().unwrap()
    }

    pub fn status_replace_count(&self) -> u64 {
        *self.status_replaces.lock().unwrap()
    }

    /// Make the next `update` call fail with the given fault.
    pub fn fail_next_update(&self, fault: MockFault) {
        *self.fail_next_update.lock().unwrap() = Some(fault);
    }

    /// Make the next `n` `replace_status` calls fail with a conflict.
    pub fn fail_status_replaces(&self, n: u32) {
        *self.status_conflicts.lock().unwrap() = n;
    }

    /// Pretend the cluster does not serve this kind.
    pub fn mark_kind_unknown(&self, kind: impl Into<String>) {
        self.unknown_kinds.lock().unwrap().insert(kind.into());
    }

    fn key_for(gvk: &GroupVersionKind, namespace: Option<&str>, name: &str) -> ObjectKey {
        ObjectKey::new(gvk.group.clone(), gvk.kind.clone(), namespace, name)
    }

    fn check_kind(&self, gvk: &GroupVersionKind) -> Result<(), ApplyError> {
        if self.unknown_kinds.lock().unwrap().contains(&gvk.kind) {
            return Err(ApplyError::KindUnknown(format!(
                "{}/{}",
                api_version_of(gvk),
                gvk.kind
            )));
        }
        Ok(())
    }

    fn next_uid(&self) -> String {
        let mut id = self.next_uid.lock().unwrap();
        *id += 1;
        format!("uid-{id}")
    }

    fn bump_resource_version(obj: &mut DynamicObject) {
        let next = obj
            .metadata
            .resource_version
            .as_deref()
            .and_then(|rv| rv.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        obj.metadata.resource_version = Some(next.to_string());
    }
}

#[async_trait]
impl ObjectClient for MockObjectClient {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject, ApplyError> {
        self.check_kind(gvk)?;
        let key = Self::key_for(gvk, namespace, name);
        self.objects
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| ApplyError::NotFound(key.to_string()))
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let gvk = gvk_of(obj)?;
        self.check_kind(&gvk)?;
        *self.creates.lock().unwrap() += 1;

        let key = ObjectKey::of(obj)?;
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(ApplyError::Conflict(format!("{key} already exists")));
        }

        let mut stored = obj.clone();
        if stored.metadata.uid.is_none() {
            stored.metadata.uid = Some(self.next_uid());
        }
        stored.metadata.resource_version = Some("1".to_owned());
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let gvk = gvk_of(obj)?;
        self.check_kind(&gvk)?;
        *self.updates.lock().unwrap() += 1;

        if let Some(fault) = self.fail_next_update.lock().unwrap().take() {
            return Err(match fault {
                MockFault::Conflict => ApplyError::Conflict("injected conflict".to_owned()),
                MockFault::Invalid => {
                    ApplyError::Invalid("injected immutable field error".to_owned())
                }
            });
        }

        let key = ObjectKey::of(obj)?;
        let mut objects = self.objects.lock().unwrap();
        if !objects.contains_key(&key) {
            return Err(ApplyError::NotFound(key.to_string()));
        }

        let mut stored = obj.clone();
        Self::bump_resource_version(&mut stored);
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), ApplyError> {
        self.check_kind(gvk)?;
        *self.deletes.lock().unwrap() += 1;

        let key = Self::key_for(gvk, namespace, name);
        self.objects
            .lock()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| ApplyError::NotFound(key.to_string()))
    }

    async fn replace_status(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let gvk = gvk_of(obj)?;
        self.check_kind(&gvk)?;
        *self.status_replaces.lock().unwrap() += 1;

        {
            let mut conflicts = self.status_conflicts.lock().unwrap();
            if *conflicts > 0 {
                *conflicts -= 1;
                return Err(ApplyError::Conflict("status resource version stale".to_owned()));
            }
        }

        let name = name_of(obj)?.to_owned();
        let key = ObjectKey::of(obj)?;
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| ApplyError::NotFound(format!("{} {}", gvk.kind, name)))?;

        match obj.data.get("status") {
            Some(status) => {
                stored.data["status"] = status.clone();
            }
            None => {
                if let Some(map) = stored.data.as_object_mut() {
                    map.remove("status");
                }
            }
        }
        Self::bump_resource_version(stored);
        Ok(stored.clone())
    }
}
