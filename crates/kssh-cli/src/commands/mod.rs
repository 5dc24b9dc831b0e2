//! CLI commands

pub mod deploy;
pub mod render;

use std::path::{Path, PathBuf};

use clap::Args;

use kssh_provision::builder::{DEFAULT_IMAGE, DEFAULT_PORT};
use kssh_provision::{DesiredState, DesiredStateBuilder, ManifestAssets};

use crate::{Error, Result};

/// Fleet parameters shared by every command
#[derive(Args, Debug)]
pub struct FleetArgs {
    /// Namespace the fleet lives in
    #[arg(short, long, env = "KSSH_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Replicas are named `<prefix>-<index>`
    #[arg(long, env = "KSSH_NAME_PREFIX", default_value = "sample")]
    pub name_prefix: String,

    /// Number of ssh pods
    #[arg(short, long, env = "KSSH_REPLICAS", default_value_t = 2)]
    pub replicas: u32,

    /// ssh server image
    #[arg(long, env = "KSSH_IMAGE", default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Port the ssh server listens on
    #[arg(long, env = "KSSH_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Replace the embedded shared-objects template
    #[arg(long)]
    pub system_template: Option<PathBuf>,

    /// Replace the embedded per-replica template
    #[arg(long)]
    pub pod_template: Option<PathBuf>,

    /// Replace the embedded bootstrap script
    #[arg(long)]
    pub bootstrap_script: Option<PathBuf>,
}

impl FleetArgs {
    /// Embedded assets with any file overrides applied
    pub fn assets(&self) -> Result<ManifestAssets> {
        let mut assets = ManifestAssets::embedded();
        if let Some(path) = &self.system_template {
            assets = assets.with_system_template(read(path)?);
        }
        if let Some(path) = &self.pod_template {
            assets = assets.with_pod_template(read(path)?);
        }
        if let Some(path) = &self.bootstrap_script {
            assets = assets.with_bootstrap_script(read(path)?);
        }
        Ok(assets)
    }

    /// Generate keys and render the full object set
    pub fn build(&self) -> Result<DesiredState> {
        let state = DesiredStateBuilder::new(self.assets()?)
            .with_image(&self.image)
            .with_port(self.port)
            .build(&self.namespace, &self.name_prefix, self.replicas)?;
        Ok(state)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::read_file(path, e))
}
