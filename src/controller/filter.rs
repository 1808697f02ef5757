//! # Change Filter
//!
//! Decides which watch events are worth a reconcile.
//!
//! The GSMSecret predicate ignores status writes (the controller's own),
//! label churn and unrelated annotations. The Secret predicate ignores
//! metadata-only updates so `resourceVersion` bumps from other writers do not
//! cause reconcile storms, while a reverted `data`/`type` is repaired.
//!
//! [`ChangeGate`] applies a predicate to a watcher stream. It remembers the
//! last object seen per [`ObjectRef`] so the predicate always has an "old"
//! side to compare against.

use crate::crd::{GsmSecret, RECOGNIZED_ANNOTATIONS};
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::Resource;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// GSMSecret: reconcile when `generation` or a recognized annotation changed.
#[must_use]
pub fn desired_state_changed(old: &GsmSecret, new: &GsmSecret) -> bool {
    if old.metadata.generation != new.metadata.generation {
        return true;
    }
    RECOGNIZED_ANNOTATIONS.iter().any(|key| {
        let before = old.metadata.annotations.as_ref().and_then(|a| a.get(*key));
        let after = new.metadata.annotations.as_ref().and_then(|a| a.get(*key));
        before != after
    })
}

/// Secret: reconcile when `data` or `type` changed. Missing and empty data are equal.
#[must_use]
pub fn target_object_changed(old: &Secret, new: &Secret) -> bool {
    let empty = BTreeMap::new();
    let old_data = old.data.as_ref().unwrap_or(&empty);
    let new_data = new.data.as_ref().unwrap_or(&empty);
    old_data != new_data || old.type_ != new.type_
}

/// Stateful filter in front of the controller's trigger streams
pub struct ChangeGate<K>
where
    K: Resource,
    K::DynamicType: Eq + Hash,
{
    seen: HashMap<ObjectRef<K>, K>,
    relisted: Option<HashSet<ObjectRef<K>>>,
    changed: fn(&K, &K) -> bool,
    pass_deletes: bool,
}

impl<K> ChangeGate<K>
where
    K: Resource + Clone,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    /// `pass_deletes` lets deletions through (owned Secrets must be recreated).
    #[must_use]
    pub fn new(changed: fn(&K, &K) -> bool, pass_deletes: bool) -> Self {
        Self {
            seen: HashMap::new(),
            relisted: None,
            changed,
            pass_deletes,
        }
    }

    /// Map a watcher event to the object that should trigger a reconcile, if any.
    ///
    /// Watch errors are passed through for the controller to log.
    pub fn admit(
        &mut self,
        event: Result<watcher::Event<K>, watcher::Error>,
    ) -> Option<Result<K, watcher::Error>> {
        match event {
            Err(err) => Some(Err(err)),
            Ok(watcher::Event::Apply(obj)) => self.observe(obj).map(Ok),
            Ok(watcher::Event::InitApply(obj)) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(ObjectRef::from_obj(&obj));
                }
                self.observe(obj).map(Ok)
            }
            Ok(watcher::Event::Delete(obj)) => {
                self.seen.remove(&ObjectRef::from_obj(&obj));
                self.pass_deletes.then_some(Ok(obj))
            }
            Ok(watcher::Event::Init) => {
                self.relisted = Some(HashSet::new());
                None
            }
            Ok(watcher::Event::InitDone) => {
                if let Some(relisted) = self.relisted.take() {
                    self.seen.retain(|key, _| relisted.contains(key));
                }
                None
            }
        }
    }

    fn observe(&mut self, obj: K) -> Option<K> {
        let key = ObjectRef::from_obj(&obj);
        let admit = match self.seen.get(&key) {
            None => true,
            Some(previous) => (self.changed)(previous, &obj),
        };
        self.seen.insert(key, obj.clone());
        admit.then_some(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        GsmSecretSpec, GsmSecretStatus, TargetRef, ANNOTATION_GSA, ANNOTATION_RELEASE,
    };
    use k8s_openapi::ByteString;

    fn gsm(generation: i64) -> GsmSecret {
        let mut gsm = GsmSecret::new(
            "app",
            GsmSecretSpec {
                target_ref: TargetRef {
                    name: "app-env".into(),
                },
                entries: vec![],
            },
        );
        gsm.metadata.namespace = Some("team-a".into());
        gsm.metadata.generation = Some(generation);
        gsm.metadata.resource_version = Some("1".into());
        gsm
    }

    fn annotate(gsm: &mut GsmSecret, key: &str, value: &str) {
        gsm.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
    }

    fn secret(data: Option<&[(&str, &str)]>) -> Secret {
        Secret {
            metadata: kube::api::ObjectMeta {
                name: Some("app-env".into()),
                namespace: Some("team-a".into()),
                resource_version: Some("1".into()),
                ..Default::default()
            },
            data: data.map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
                    .collect()
            }),
            type_: Some("Opaque".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_only_update_is_skipped() {
        let old = gsm(1);
        let mut new = old.clone();
        new.metadata.resource_version = Some("2".into());
        new.status = Some(GsmSecretStatus {
            observed_generation: Some(1),
            conditions: vec![],
        });
        assert!(!desired_state_changed(&old, &new));
    }

    #[test]
    fn test_generation_change_reconciles() {
        assert!(desired_state_changed(&gsm(1), &gsm(2)));
    }

    #[test]
    fn test_recognized_annotation_change_reconciles() {
        let old = gsm(1);
        let mut new = old.clone();
        annotate(&mut new, ANNOTATION_RELEASE, "2024-01-01T00:00:00Z");
        assert!(desired_state_changed(&old, &new));

        let mut newer = new.clone();
        annotate(&mut newer, ANNOTATION_RELEASE, "2024-01-02T00:00:00Z");
        assert!(desired_state_changed(&new, &newer));

        // removal counts too
        let mut removed = newer.clone();
        removed.metadata.annotations = None;
        assert!(desired_state_changed(&newer, &removed));
    }

    #[test]
    fn test_label_and_unrelated_annotation_changes_are_skipped() {
        let old = gsm(1);
        let mut new = old.clone();
        new.metadata.labels = Some(BTreeMap::from([("team".to_string(), "a".to_string())]));
        annotate(
            &mut new,
            "kubectl.kubernetes.io/last-applied-configuration",
            "{}",
        );
        assert!(!desired_state_changed(&old, &new));

        let mut gsa = new.clone();
        annotate(&mut gsa, ANNOTATION_GSA, "reader@p.iam.gserviceaccount.com");
        assert!(desired_state_changed(&new, &gsa));
    }

    #[test]
    fn test_secret_resource_version_bump_is_skipped() {
        let old = secret(Some(&[("K", "v")]));
        let mut new = old.clone();
        new.metadata.resource_version = Some("2".into());
        new.metadata.labels = Some(BTreeMap::from([("x".to_string(), "y".to_string())]));
        assert!(!target_object_changed(&old, &new));
    }

    #[test]
    fn test_secret_data_change_reconciles() {
        let old = secret(Some(&[("K", "v")]));
        let new = secret(Some(&[("K", "tampered")]));
        assert!(target_object_changed(&old, &new));

        let mut retyped = old.clone();
        retyped.type_ = Some("kubernetes.io/tls".into());
        assert!(target_object_changed(&old, &retyped));
    }

    #[test]
    fn test_secret_missing_and_empty_data_are_equal() {
        assert!(!target_object_changed(&secret(None), &secret(Some(&[]))));
    }

    #[test]
    fn test_gate_admits_creates_and_filters_updates() {
        let mut gate = ChangeGate::new(desired_state_changed, false);

        assert!(matches!(
            gate.admit(Ok(watcher::Event::Apply(gsm(1)))),
            Some(Ok(_))
        ));

        let mut status_only = gsm(1);
        status_only.metadata.resource_version = Some("2".into());
        assert!(gate.admit(Ok(watcher::Event::Apply(status_only))).is_none());

        assert!(matches!(
            gate.admit(Ok(watcher::Event::Apply(gsm(2)))),
            Some(Ok(_))
        ));
    }

    #[test]
    fn test_gate_delete_handling() {
        let mut desired = ChangeGate::new(desired_state_changed, false);
        desired.admit(Ok(watcher::Event::Apply(gsm(1))));
        assert!(desired.admit(Ok(watcher::Event::Delete(gsm(1)))).is_none());
        // re-created object is a create again
        assert!(desired.admit(Ok(watcher::Event::Apply(gsm(1)))).is_some());

        let mut owned = ChangeGate::new(target_object_changed, true);
        owned.admit(Ok(watcher::Event::Apply(secret(Some(&[("K", "v")])))));
        assert!(owned
            .admit(Ok(watcher::Event::Delete(secret(Some(&[("K", "v")])))))
            .is_some());
    }

    #[test]
    fn test_gate_relist_forgets_vanished_objects() {
        let mut gate = ChangeGate::new(target_object_changed, true);
        gate.admit(Ok(watcher::Event::Apply(secret(Some(&[("K", "v")])))));

        // identical object during a relist is not a change
        assert!(gate.admit(Ok(watcher::Event::Init)).is_none());
        assert!(gate
            .admit(Ok(watcher::Event::InitApply(secret(Some(&[("K", "v")])))))
            .is_none());
        assert!(gate.admit(Ok(watcher::Event::InitDone)).is_none());
        assert_eq!(gate.seen.len(), 1);

        // a relist that no longer contains it drops the memory
        gate.admit(Ok(watcher::Event::Init));
        gate.admit(Ok(watcher::Event::InitDone));
        assert!(gate.seen.is_empty());
    }
}
