//! Manifest assets
//!
//! The templates and the bootstrap script are plain text blobs handed to
//! the builder at construction. The embedded copies are the defaults;
//! callers may substitute any of them (the CLI reads overrides from disk).

use kssh_common::template::TemplateEngine;
use kssh_common::Error;

/// Template producing the shared, once-per-run objects
pub const SYSTEM_TEMPLATE: &str = include_str!("../templates/system-objects.yaml");

/// Template producing one replica's objects
pub const POD_TEMPLATE: &str = include_str!("../templates/pod-objects.yaml");

/// Script the init container runs to install ssh credentials
pub const BOOTSTRAP_SCRIPT: &str = include_str!("../templates/pod-bootstrap.sh");

/// Name of the system template in error messages
pub const SYSTEM_TEMPLATE_NAME: &str = "system-objects";

/// Name of the per-replica template in error messages
pub const POD_TEMPLATE_NAME: &str = "pod-objects";

/// Immutable text inputs of a build
#[derive(Debug, Clone)]
pub struct ManifestAssets {
    system_template: String,
    pod_template: String,
    bootstrap_script: String,
}

impl Default for ManifestAssets {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ManifestAssets {
    /// The assets compiled into the binary
    pub fn embedded() -> Self {
        Self::new(SYSTEM_TEMPLATE, POD_TEMPLATE, BOOTSTRAP_SCRIPT)
    }

    /// Assets from explicit text
    pub fn new(
        system_template: impl Into<String>,
        pod_template: impl Into<String>,
        bootstrap_script: impl Into<String>,
    ) -> Self {
        Self {
            system_template: system_template.into(),
            pod_template: pod_template.into(),
            bootstrap_script: bootstrap_script.into(),
        }
    }

    /// Replace the system template
    pub fn with_system_template(mut self, template: impl Into<String>) -> Self {
        self.system_template = template.into();
        self
    }

    /// Replace the per-replica template
    pub fn with_pod_template(mut self, template: impl Into<String>) -> Self {
        self.pod_template = template.into();
        self
    }

    /// Replace the bootstrap script
    pub fn with_bootstrap_script(mut self, script: impl Into<String>) -> Self {
        self.bootstrap_script = script.into();
        self
    }

    /// System template text
    pub fn system_template(&self) -> &str {
        &self.system_template
    }

    /// Per-replica template text
    pub fn pod_template(&self) -> &str {
        &self.pod_template
    }

    /// Bootstrap script text
    pub fn bootstrap_script(&self) -> &str {
        &self.bootstrap_script
    }

    /// Check that both templates parse
    pub fn validate(&self, engine: &TemplateEngine) -> Result<(), Error> {
        engine
            .validate_syntax(&self.system_template)
            .map_err(|e| Error::template(SYSTEM_TEMPLATE_NAME, e))?;
        engine
            .validate_syntax(&self.pod_template)
            .map_err(|e| Error::template(POD_TEMPLATE_NAME, e))
    }
}
