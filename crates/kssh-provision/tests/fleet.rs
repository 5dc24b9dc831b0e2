//! End-to-end provisioning against an in-memory cluster

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kssh_common::{Error, GenericObject, ObjectKey};
use kssh_provision::{
    ClusterClient, CreateOutcome, DesiredStateBuilder, KeyPair, KeySource, ManifestAssets,
    Reconciler,
};

#[derive(Default)]
struct SequentialKeys {
    next: AtomicUsize,
}

impl KeySource for SequentialKeys {
    fn generate(&self) -> Result<KeyPair, Error> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(KeyPair::new(
            format!("private-{n}\n"),
            format!("ssh-rsa KEY{n}\n"),
        ))
    }
}

/// Stores created objects keyed by their display identity
#[derive(Default)]
struct MemoryCluster {
    objects: Mutex<BTreeMap<String, GenericObject>>,
    creates: AtomicUsize,
}

impl MemoryCluster {
    fn insert(&self, key: &ObjectKey, object: GenericObject) {
        self.objects.lock().unwrap().insert(key.to_string(), object);
    }

    fn lookup(&self, key: &str) -> Option<GenericObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn get(&self, key: &ObjectKey) -> Result<Option<GenericObject>, Error> {
        Ok(self.lookup(&key.to_string()))
    }

    async fn create(
        &self,
        key: &ObjectKey,
        object: &GenericObject,
    ) -> Result<CreateOutcome, Error> {
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key.to_string()) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        objects.insert(key.to_string(), object.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(CreateOutcome::Created)
    }
}

fn builder() -> DesiredStateBuilder {
    DesiredStateBuilder::new(ManifestAssets::embedded())
        .with_key_source(Box::new(SequentialKeys::default()))
}

#[tokio::test]
async fn fresh_cluster_then_rerun() {
    let cluster = Arc::new(MemoryCluster::default());
    let reconciler = Reconciler::new(cluster.clone());

    let state = builder().build("ns1", "pod", 2).unwrap();
    assert_eq!(state.len(), 7);
    let report = reconciler.apply(&state.into_objects(), "ns1").await.unwrap();
    assert!(report.namespace_created);
    assert_eq!(report.created.len(), 7);
    assert_eq!(cluster.creates.load(Ordering::SeqCst), 8);

    // A second run regenerates keys but must not touch anything.
    let rerun = builder().build("ns1", "pod", 2).unwrap();
    let report = reconciler.apply(&rerun.into_objects(), "ns1").await.unwrap();
    assert!(report.is_noop());
    assert_eq!(report.skipped.len(), 7);
    assert_eq!(cluster.creates.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn growing_the_fleet_adds_only_new_replicas() {
    let cluster = Arc::new(MemoryCluster::default());
    let reconciler = Reconciler::new(cluster.clone());

    let small = builder().build("ns1", "pod", 1).unwrap();
    reconciler.apply(&small.into_objects(), "ns1").await.unwrap();

    let large = builder().build("ns1", "pod", 3).unwrap();
    let report = reconciler.apply(&large.into_objects(), "ns1").await.unwrap();
    let created: Vec<_> = report.created.iter().map(ToString::to_string).collect();
    assert_eq!(
        created,
        vec![
            "Deployment ns1/pod-1",
            "Service ns1/pod-1",
            "Secret ns1/pod-1",
            "Deployment ns1/pod-2",
            "Service ns1/pod-2",
            "Secret ns1/pod-2",
        ]
    );
    assert_eq!(report.skipped.len(), 4);
}

#[tokio::test]
async fn existing_secret_is_never_overwritten() {
    let cluster = Arc::new(MemoryCluster::default());
    let key = ObjectKey {
        api_version: "v1".to_string(),
        kind: "Secret".to_string(),
        namespace: Some("ns1".to_string()),
        name: "pod-0".to_string(),
    };
    let original = GenericObject::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": "pod-0", "namespace": "ns1"},
        "data": {"id_rsa": "b3JpZ2luYWw="}
    }))
    .unwrap();
    cluster.insert(&key, original.clone());

    let state = builder().build("ns1", "pod", 1).unwrap();
    let report = Reconciler::new(cluster.clone())
        .apply(&state.into_objects(), "ns1")
        .await
        .unwrap();

    assert!(report.skipped.contains(&key));
    assert_eq!(cluster.lookup("Secret ns1/pod-0"), Some(original));
}
