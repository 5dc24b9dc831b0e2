//! Get-or-create reconciliation
//!
//! Objects are applied strictly in order, namespace first. An object that
//! already exists is left untouched; a missing one is created exactly as
//! rendered. The first failure stops the run and nothing created before it
//! is rolled back, so re-running the whole pipeline is the recovery path.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use kssh_common::{Error, GenericObject, ObjectKey};

use crate::cluster::{ClusterClient, CreateOutcome};

/// What one apply pass did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// The target namespace had to be created
    pub namespace_created: bool,
    /// Objects created by this pass, in input order
    pub created: Vec<ObjectKey>,
    /// Objects that were already present, in input order
    pub skipped: Vec<ObjectKey>,
}

impl ApplyReport {
    /// True when nothing had to be created
    pub fn is_noop(&self) -> bool {
        !self.namespace_created && self.created.is_empty()
    }
}

/// Applies a desired state against a cluster
pub struct Reconciler {
    client: Arc<dyn ClusterClient>,
}

impl Reconciler {
    /// Create a reconciler over the given cluster capability
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    /// Ensure `namespace` exists, then get-or-create every object in order.
    ///
    /// Objects without `metadata.namespace` are addressed in `namespace`.
    /// Every object is checked for identity fields before the first cluster
    /// call, so a malformed object never leaves a half-applied run.
    #[instrument(skip(self, objects), fields(objects = objects.len()))]
    pub async fn apply(
        &self,
        objects: &[GenericObject],
        namespace: &str,
    ) -> Result<ApplyReport, Error> {
        let keys = objects
            .iter()
            .map(|object| object.key(Some(namespace)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = ApplyReport::default();

        let ns_object = GenericObject::namespace_object(namespace);
        let ns_key = ns_object.key(None)?;
        report.namespace_created = self.ensure(&ns_key, &ns_object).await?;

        for (key, object) in keys.into_iter().zip(objects) {
            if self.ensure(&key, object).await? {
                report.created.push(key);
            } else {
                report.skipped.push(key);
            }
        }

        Ok(report)
    }

    /// Returns true if the object was created by this call
    async fn ensure(&self, key: &ObjectKey, object: &GenericObject) -> Result<bool, Error> {
        if self.client.get(key).await?.is_some() {
            debug!(
                kind = %key.kind,
                name = %key.name,
                namespace = ?key.namespace,
                "already exists, skipping"
            );
            return Ok(false);
        }
        match self.client.create(key, object).await? {
            CreateOutcome::Created => {
                info!(
                    kind = %key.kind,
                    name = %key.name,
                    namespace = ?key.namespace,
                    "created"
                );
                Ok(true)
            }
            CreateOutcome::AlreadyExists => {
                debug!(
                    kind = %key.kind,
                    name = %key.name,
                    namespace = ?key.namespace,
                    "created concurrently, skipping"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use mockall::predicate::always;
    use mockall::Sequence;

    use super::*;
    use crate::builder::test_support::builder;
    use crate::cluster::MockClusterClient;
    use kssh_common::decode_documents;

    fn objects() -> Vec<GenericObject> {
        decode_documents(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: kssh-bootstrap
  namespace: ns1
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: pod-0
  namespace: ns1
---
apiVersion: v1
kind: Service
metadata:
  name: pod-0
"#,
        )
        .unwrap()
    }

    fn reconciler(mock: MockClusterClient) -> Reconciler {
        Reconciler::new(Arc::new(mock))
    }

    fn other_error(key: &ObjectKey) -> Error {
        Error::cluster("get", &key.kind, key.namespace.as_deref(), &key.name, "forbidden")
    }

    #[tokio::test]
    async fn empty_cluster_creates_namespace_then_objects_in_order() {
        let mut mock = MockClusterClient::new();
        let mut seq = Sequence::new();
        let expected = ["Namespace", "ConfigMap", "Deployment", "Service"];
        for kind in expected {
            mock.expect_get()
                .withf(move |key| key.kind == kind)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(None));
            mock.expect_create()
                .withf(move |key, _| key.kind == kind)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(CreateOutcome::Created));
        }

        let report = reconciler(mock).apply(&objects(), "ns1").await.unwrap();
        assert!(report.namespace_created);
        assert_eq!(report.created.len(), 3);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn objects_without_namespace_use_the_target_namespace() {
        let mut mock = MockClusterClient::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_create()
            .withf(|key, _| key.kind != "Namespace")
            .returning(|key, _| {
                assert_eq!(key.namespace.as_deref(), Some("ns1"));
                Ok(CreateOutcome::Created)
            });
        mock.expect_create()
            .withf(|key, _| key.kind == "Namespace")
            .returning(|key, _| {
                assert_eq!(key.namespace, None);
                Ok(CreateOutcome::Created)
            });

        let report = reconciler(mock).apply(&objects(), "ns1").await.unwrap();
        assert_eq!(report.created[2].to_string(), "Service ns1/pod-0");
    }

    #[tokio::test]
    async fn rerun_against_populated_cluster_creates_nothing() {
        let mut mock = MockClusterClient::new();
        mock.expect_get()
            .times(4)
            .returning(|_| Ok(Some(GenericObject::namespace_object("ns1"))));
        mock.expect_create().never();

        let report = reconciler(mock).apply(&objects(), "ns1").await.unwrap();
        assert!(report.is_noop());
        assert_eq!(report.skipped.len(), 3);
    }

    #[tokio::test]
    async fn partial_state_creates_only_missing_objects() {
        let mut mock = MockClusterClient::new();
        mock.expect_get().returning(|key| {
            if key.kind == "Service" {
                Ok(None)
            } else {
                Ok(Some(GenericObject::namespace_object("ns1")))
            }
        });
        mock.expect_create()
            .withf(|key, _| key.kind == "Service")
            .times(1)
            .returning(|_, _| Ok(CreateOutcome::Created));

        let report = reconciler(mock).apply(&objects(), "ns1").await.unwrap();
        assert!(!report.namespace_created);
        let created: Vec<_> = report.created.iter().map(|k| k.kind.as_str()).collect();
        assert_eq!(created, vec!["Service"]);
        assert_eq!(report.skipped.len(), 2);
    }

    #[tokio::test]
    async fn conflict_on_create_counts_as_skipped() {
        let mut mock = MockClusterClient::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_create()
            .with(always(), always())
            .returning(|_, _| Ok(CreateOutcome::AlreadyExists));

        let report = reconciler(mock).apply(&objects(), "ns1").await.unwrap();
        assert!(report.is_noop());
        assert_eq!(report.skipped.len(), 3);
    }

    #[tokio::test]
    async fn get_failure_stops_the_run() {
        let mut mock = MockClusterClient::new();
        mock.expect_get()
            .withf(|key| key.kind == "Namespace" || key.kind == "ConfigMap")
            .returning(|_| Ok(None));
        mock.expect_get()
            .withf(|key| key.kind == "Deployment")
            .times(1)
            .returning(|key| Err(other_error(key)));
        mock.expect_get().withf(|key| key.kind == "Service").never();
        mock.expect_create()
            .times(2)
            .returning(|_, _| Ok(CreateOutcome::Created));

        let err = reconciler(mock).apply(&objects(), "ns1").await.unwrap_err();
        assert!(matches!(err, Error::Cluster { ref kind, .. } if kind == "Deployment"));
        assert!(!err.is_pre_apply());
    }

    #[tokio::test]
    async fn create_failure_stops_the_run() {
        let mut mock = MockClusterClient::new();
        mock.expect_get()
            .withf(|key| key.kind != "Service")
            .returning(|_| Ok(None));
        mock.expect_get().withf(|key| key.kind == "Service").never();
        mock.expect_create()
            .withf(|key, _| key.kind == "Deployment")
            .returning(|key, _| {
                Err(Error::cluster(
                    "create",
                    &key.kind,
                    key.namespace.as_deref(),
                    &key.name,
                    "quota exceeded",
                ))
            });
        mock.expect_create()
            .withf(|key, _| key.kind != "Deployment")
            .returning(|_, _| Ok(CreateOutcome::Created));

        let err = reconciler(mock).apply(&objects(), "ns1").await.unwrap_err();
        assert!(err.to_string().contains("Deployment ns1/pod-0: quota exceeded"));
    }

    #[tokio::test]
    async fn namespace_failure_touches_no_objects() {
        let mut mock = MockClusterClient::new();
        mock.expect_get()
            .withf(|key| key.kind == "Namespace")
            .times(1)
            .returning(|key| Err(other_error(key)));
        mock.expect_create().never();

        let err = reconciler(mock).apply(&objects(), "ns1").await.unwrap_err();
        assert!(matches!(err, Error::Cluster { ref kind, .. } if kind == "Namespace"));
    }

    #[tokio::test]
    async fn malformed_object_fails_before_any_cluster_call() {
        let mut invalid = objects();
        invalid.extend(decode_documents("apiVersion: v1\nkind: Secret\nmetadata: {}\n").unwrap());

        let mut mock = MockClusterClient::new();
        mock.expect_get().never();
        mock.expect_create().never();

        let err = reconciler(mock).apply(&invalid, "ns1").await.unwrap_err();
        assert!(matches!(err, Error::InvalidObject { .. }));
        assert!(err.is_pre_apply());
    }

    #[tokio::test]
    async fn built_fleet_applies_and_reapplies_idempotently() {
        let state = builder().build("ns1", "pod", 2).unwrap();
        let objects = state.into_objects();

        let existing: Arc<Mutex<HashSet<String>>> = Arc::default();
        let mut mock = MockClusterClient::new();
        let seen = existing.clone();
        mock.expect_get().returning(move |key| {
            let found = seen.lock().unwrap().contains(&key.to_string());
            Ok(found.then(|| GenericObject::namespace_object("ns1")))
        });
        let store = existing.clone();
        mock.expect_create().returning(move |key, _| {
            store.lock().unwrap().insert(key.to_string());
            Ok(CreateOutcome::Created)
        });
        let reconciler = reconciler(mock);

        let first = reconciler.apply(&objects, "ns1").await.unwrap();
        assert!(first.namespace_created);
        assert_eq!(first.created.len(), 7);

        let second = reconciler.apply(&objects, "ns1").await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.skipped.len(), 7);
        assert_eq!(existing.lock().unwrap().len(), 8);
    }
}
