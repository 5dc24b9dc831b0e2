//! Desired-state building
//!
//! Turns (namespace, name prefix, replica count) into the ordered list of
//! objects a run applies:
//!
//! 1. one keypair per replica, public halves collected into a [`TrustSet`]
//! 2. the system template rendered once (shared bootstrap ConfigMap)
//! 3. the pod template rendered per replica with that replica's keypair and
//!    the complete trust set (Deployment, headless Service, Secret)
//!
//! The trust set is fully assembled before any replica is rendered, so
//! every replica trusts every other replica including those generated
//! after it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use kssh_common::template::{TemplateContext, TemplateEngine};
use kssh_common::{decode_documents, Error, GenericObject};

use crate::assets::{ManifestAssets, POD_TEMPLATE_NAME, SYSTEM_TEMPLATE_NAME};
use crate::keys::{KeyPair, KeySource, RsaKeyGenerator, TrustSet};

/// Default ssh server image
pub const DEFAULT_IMAGE: &str = "sheixinsheisb/ssh-server";

/// Default ssh port exposed by each replica
pub const DEFAULT_PORT: u16 = 22;

/// Name of the ConfigMap holding the bootstrap script
pub const BOOTSTRAP_CONFIG_MAP_NAME: &str = "kssh-bootstrap";

/// Longest replica name; leaves room for the `-init` container suffix
/// within the 63 character DNS label limit.
pub const MAX_REPLICA_NAME_LEN: usize = 58;

const DNS_LABEL_MAX_LEN: usize = 63;

/// Name of replica `index`: `<prefix>-<index>`
pub fn replica_name(prefix: &str, index: u32) -> String {
    format!("{}-{}", prefix, index)
}

/// Check run parameters before any key is generated
pub fn validate_run(namespace: &str, prefix: &str, replicas: u32) -> Result<(), Error> {
    validate_dns_label("namespace", namespace)?;
    validate_dns_label("name_prefix", prefix)?;
    if replicas > 0 {
        let longest = replica_name(prefix, replicas - 1);
        if longest.len() > MAX_REPLICA_NAME_LEN {
            return Err(Error::validation(
                "name_prefix",
                format!(
                    "replica name '{}' exceeds {} characters",
                    longest, MAX_REPLICA_NAME_LEN
                ),
            ));
        }
    }
    Ok(())
}

/// Check a container image reference can be embedded in a quoted scalar
pub fn validate_image(image: &str) -> Result<(), Error> {
    if image.is_empty() {
        return Err(Error::validation("image", "image must not be empty"));
    }
    if let Some(c) = image
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || *c == '"' || *c == '\\')
    {
        return Err(Error::validation(
            "image",
            format!("'{}' contains invalid character {:?}", image, c),
        ));
    }
    Ok(())
}

fn validate_dns_label(field: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() || value.len() > DNS_LABEL_MAX_LEN {
        return Err(Error::validation(
            field,
            format!("'{}' must be 1-{} characters", value, DNS_LABEL_MAX_LEN),
        ));
    }
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_ends = !value.starts_with('-') && !value.ends_with('-');
    if !valid_chars || !valid_ends {
        return Err(Error::validation(
            field,
            format!(
                "'{}' must consist of lowercase alphanumerics or '-' and start and end with an alphanumeric",
                value
            ),
        ));
    }
    Ok(())
}

/// Objects rendered for one replica
#[derive(Debug, Clone)]
pub struct ReplicaObjects {
    /// Replica name
    pub name: String,
    /// Decoded objects in template order
    pub objects: Vec<GenericObject>,
}

/// Everything one run applies, system objects first
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    system: Vec<GenericObject>,
    replicas: Vec<ReplicaObjects>,
}

impl DesiredState {
    /// Shared objects
    pub fn system(&self) -> &[GenericObject] {
        &self.system
    }

    /// Per-replica objects in index order
    pub fn replicas(&self) -> &[ReplicaObjects] {
        &self.replicas
    }

    /// All objects in apply order
    pub fn objects(&self) -> impl Iterator<Item = &GenericObject> {
        self.system
            .iter()
            .chain(self.replicas.iter().flat_map(|r| r.objects.iter()))
    }

    /// All objects in apply order, by value
    pub fn into_objects(self) -> Vec<GenericObject> {
        let mut objects = self.system;
        objects.extend(self.replicas.into_iter().flat_map(|r| r.objects));
        objects
    }

    /// Total object count
    pub fn len(&self) -> usize {
        self.system.len() + self.replicas.iter().map(|r| r.objects.len()).sum::<usize>()
    }

    /// True if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the desired state of a fleet
pub struct DesiredStateBuilder {
    engine: TemplateEngine,
    assets: ManifestAssets,
    keys: Box<dyn KeySource>,
    image: String,
    port: u16,
}

impl DesiredStateBuilder {
    /// Builder over the given assets with RSA keys, default image and port
    pub fn new(assets: ManifestAssets) -> Self {
        Self {
            engine: TemplateEngine::new(),
            assets,
            keys: Box::new(RsaKeyGenerator::new()),
            image: DEFAULT_IMAGE.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Use a different keypair source
    pub fn with_key_source(mut self, keys: Box<dyn KeySource>) -> Self {
        self.keys = keys;
        self
    }

    /// Use a different container image
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Use a different ssh port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Build the ordered object set for one run.
    ///
    /// Fails before returning anything if parameters are invalid, a template
    /// does not parse or render, rendered text does not decode, or key
    /// generation fails. Nothing here touches a cluster.
    pub fn build(
        &self,
        namespace: &str,
        name_prefix: &str,
        replicas: u32,
    ) -> Result<DesiredState, Error> {
        validate_run(namespace, name_prefix, replicas)?;
        validate_image(&self.image)?;
        self.assets.validate(&self.engine)?;

        let keypairs = (0..replicas)
            .map(|_| self.keys.generate())
            .collect::<Result<Vec<_>, _>>()?;
        let mut trust = TrustSet::new();
        for keypair in &keypairs {
            trust.push(keypair);
        }
        debug!(keys = trust.len(), "assembled trust set");

        let system = self.system_objects(namespace)?;

        let authorized_keys = trust.to_base64();
        let replica_objects = keypairs
            .iter()
            .enumerate()
            .map(|(index, keypair)| {
                let name = replica_name(name_prefix, index as u32);
                let objects = self.replica_objects(namespace, &name, keypair, &authorized_keys)?;
                Ok(ReplicaObjects { name, objects })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let state = DesiredState {
            system,
            replicas: replica_objects,
        };
        info!(
            namespace = %namespace,
            replicas = replicas,
            objects = state.len(),
            "built desired state"
        );
        Ok(state)
    }

    fn system_objects(&self, namespace: &str) -> Result<Vec<GenericObject>, Error> {
        let ctx = TemplateContext::builder(namespace)
            .bootstrap_config_map_name(BOOTSTRAP_CONFIG_MAP_NAME)
            .bootstrap_content(self.assets.bootstrap_script())
            .build();
        self.render(SYSTEM_TEMPLATE_NAME, self.assets.system_template(), &ctx)
    }

    fn replica_objects(
        &self,
        namespace: &str,
        name: &str,
        keypair: &KeyPair,
        authorized_keys: &str,
    ) -> Result<Vec<GenericObject>, Error> {
        let ctx = TemplateContext::builder(namespace)
            .name(name)
            .image(&self.image)
            .port(self.port)
            .bootstrap_config_map_name(BOOTSTRAP_CONFIG_MAP_NAME)
            .authorized_keys(authorized_keys)
            .keypair(
                STANDARD.encode(keypair.private_key_pem()),
                STANDARD.encode(keypair.authorized_key()),
            )
            .build();
        self.render(POD_TEMPLATE_NAME, self.assets.pod_template(), &ctx)
    }

    fn render(
        &self,
        template_name: &str,
        template: &str,
        ctx: &TemplateContext,
    ) -> Result<Vec<GenericObject>, Error> {
        let rendered = self
            .engine
            .render(template, ctx)
            .map_err(|e| Error::template(template_name, e))?;
        decode_documents(&rendered).map_err(|e| Error::decode(template_name, e))
    }
}
