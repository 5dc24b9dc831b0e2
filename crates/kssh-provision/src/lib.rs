//! SSH pod fleet provisioning
//!
//! Builds the desired state of a fleet of ssh-reachable pods and applies it
//! to a cluster with get-or-create semantics:
//!
//! - [`keys`]: per-replica RSA keypairs and the shared trust set
//! - [`assets`]: the templates and bootstrap script rendered into objects
//! - [`builder`]: keypairs + templates into an ordered object list
//! - [`cluster`]: the get/create capability and its kube-rs implementation
//! - [`reconcile`]: namespace-first, in-order get-or-create apply

#![deny(missing_docs)]

pub mod assets;
pub mod builder;
pub mod cluster;
pub mod keys;
pub mod reconcile;

pub use assets::ManifestAssets;
pub use builder::{DesiredState, DesiredStateBuilder, ReplicaObjects};
pub use cluster::{ClusterClient, CreateOutcome, KubeClusterClient};
pub use keys::{KeyPair, KeySource, RsaKeyGenerator, TrustSet};
pub use reconcile::{ApplyReport, Reconciler};
