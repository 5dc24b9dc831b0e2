//! Deploy command - build the fleet and create whatever is missing
//!
//! Keys are generated and every template rendered before the cluster is
//! contacted, so a bad template or parameter never leaves partial state.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use kssh_common::kube_utils;
use kssh_provision::{KubeClusterClient, Reconciler};

use super::FleetArgs;
use crate::Result;

/// Deploy the fleet
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub fleet: FleetArgs,

    /// Path to kubeconfig (defaults to KUBECONFIG, ~/.kube/config, then in-cluster)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
}

pub async fn run(args: DeployArgs) -> Result<()> {
    let state = args.fleet.build()?;
    let objects = state.into_objects();

    let client = kube_utils::create_client(args.kubeconfig.as_deref()).await?;
    let cluster = KubeClusterClient::new(client).await?;
    let report = Reconciler::new(Arc::new(cluster))
        .apply(&objects, &args.fleet.namespace)
        .await?;

    info!(
        namespace = %args.fleet.namespace,
        namespace_created = report.namespace_created,
        created = report.created.len(),
        skipped = report.skipped.len(),
        "deploy complete"
    );
    Ok(())
}
