//! Owner-reference helpers.
//!
//! Every rendered object is owned by the configuration record so cluster
//! garbage collection removes operands when the record is deleted, and so
//! explicit deletes can verify they only touch objects this operator made.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use kube::Resource;

/// Build the controller owner reference for `owner`. `None` when the
/// resource has no uid yet (not persisted).
pub fn owner_reference<O>(owner: &O) -> Option<OwnerReference>
where
    O: Resource<DynamicType = ()>,
{
    owner.controller_owner_ref(&())
}

/// Mark `obj` as owned, replacing any owner references it already carries.
pub fn set_owner(obj: &mut DynamicObject, owner_ref: &OwnerReference) {
    obj.metadata.owner_references = Some(vec![owner_ref.clone()]);
}

/// True when `obj` lists an owner reference matching `owner` by kind and
/// name. The uid is compared too when `owner` carries one, so a record
/// deleted and recreated under the same name does not claim stale objects.
pub fn is_owned_by(obj: &DynamicObject, owner: &OwnerReference) -> bool {
    obj.metadata
        .owner_references
        .as_ref()
        .is_some_and(|refs| {
            refs.iter().any(|r| {
                r.kind == owner.kind
                    && r.name == owner.name
                    && (owner.uid.is_empty() || r.uid == owner.uid)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner_ref(uid: &str) -> OwnerReference {
        OwnerReference {
            api_version: "networkaddons.microscaler.io/v1alpha1".to_owned(),
            kind: "NetworkAddonsConfig".to_owned(),
            name: "cluster".to_owned(),
            uid: uid.to_owned(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    fn service_account() -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "multus", "namespace": "network-addons"},
        }))
        .unwrap()
    }

    #[test]
    fn set_owner_then_is_owned_by_round_trips() {
        let mut obj = service_account();
        assert!(!is_owned_by(&obj, &owner_ref("abc")));

        set_owner(&mut obj, &owner_ref("abc"));
        assert!(is_owned_by(&obj, &owner_ref("abc")));
    }

    #[test]
    fn uid_mismatch_is_not_owned() {
        let mut obj = service_account();
        set_owner(&mut obj, &owner_ref("abc"));
        assert!(!is_owned_by(&obj, &owner_ref("other")));
    }

    #[test]
    fn uid_unset_on_probe_matches_by_kind_and_name() {
        let mut obj = service_account();
        set_owner(&mut obj, &owner_ref("abc"));
        assert!(is_owned_by(&obj, &owner_ref("")));
    }
}
