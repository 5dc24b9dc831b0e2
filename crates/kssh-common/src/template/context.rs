//! Template context for manifest rendering
//!
//! A flat record of the values the manifest templates can reference:
//! - `{{ namespace }}` - target namespace (always present)
//! - `{{ name }}` - replica name, `<prefix>-<index>`
//! - `{{ image }}`, `{{ port }}` - container image and ssh port
//! - `{{ ssh_private_key }}`, `{{ ssh_public_key }}`, `{{ authorized_keys }}` - base64
//! - `{{ bootstrap_config_map_name }}`, `{{ bootstrap_content }}` - bootstrap script wiring
//!
//! Fields left unset are omitted from the rendered context, so a template
//! that references them fails under strict undefined handling.

use minijinja::Value;
use serde::Serialize;

use super::escape_multiline;

/// Values available for placeholder resolution
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
    /// Target namespace
    pub namespace: String,
    /// Replica name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Container image reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// SSH port exposed by the container and service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Base64 of the cluster-wide trust set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_keys: Option<String>,
    /// Base64 of this replica's PEM private key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
    /// Base64 of this replica's authorized-key line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,
    /// Name of the ConfigMap holding the bootstrap script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_config_map_name: Option<String>,
    /// Bootstrap script, escaped for a double-quoted YAML scalar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_content: Option<String>,
}

impl TemplateContext {
    /// Create a new builder for the given namespace
    pub fn builder(namespace: impl Into<String>) -> TemplateContextBuilder {
        TemplateContextBuilder {
            ctx: TemplateContext {
                namespace: namespace.into(),
                ..Default::default()
            },
        }
    }

    /// Convert to minijinja Value for rendering
    pub fn to_value(&self) -> Value {
        Value::from_serialize(self)
    }
}

/// Builder for TemplateContext
#[derive(Debug)]
pub struct TemplateContextBuilder {
    ctx: TemplateContext,
}

impl TemplateContextBuilder {
    /// Set the replica name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.ctx.name = Some(name.into());
        self
    }

    /// Set the container image
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.ctx.image = Some(image.into());
        self
    }

    /// Set the ssh port
    pub fn port(mut self, port: u16) -> Self {
        self.ctx.port = Some(port);
        self
    }

    /// Set the base64-encoded trust set
    pub fn authorized_keys(mut self, encoded: impl Into<String>) -> Self {
        self.ctx.authorized_keys = Some(encoded.into());
        self
    }

    /// Set the base64-encoded private and public key of this replica
    pub fn keypair(mut self, private_b64: impl Into<String>, public_b64: impl Into<String>) -> Self {
        self.ctx.ssh_private_key = Some(private_b64.into());
        self.ctx.ssh_public_key = Some(public_b64.into());
        self
    }

    /// Set the bootstrap ConfigMap name
    pub fn bootstrap_config_map_name(mut self, name: impl Into<String>) -> Self {
        self.ctx.bootstrap_config_map_name = Some(name.into());
        self
    }

    /// Set the raw bootstrap script; it is escaped for YAML embedding here
    pub fn bootstrap_content(mut self, script: &str) -> Self {
        self.ctx.bootstrap_content = Some(escape_multiline(script));
        self
    }

    /// Build the TemplateContext
    pub fn build(self) -> TemplateContext {
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        let ctx = TemplateContext::builder("ns1").build();
        let json = serde_json::to_value(&ctx).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["namespace"], "ns1");
    }

    #[test]
    fn builder_sets_every_field() {
        let ctx = TemplateContext::builder("ns1")
            .name("pod-1")
            .image("img")
            .port(2222)
            .authorized_keys("QUFB")
            .keypair("UFJJVg==", "UFVC")
            .bootstrap_config_map_name("kssh-bootstrap")
            .bootstrap_content("a\nb")
            .build();

        assert_eq!(ctx.name.as_deref(), Some("pod-1"));
        assert_eq!(ctx.port, Some(2222));
        assert_eq!(ctx.ssh_private_key.as_deref(), Some("UFJJVg=="));
        assert_eq!(ctx.ssh_public_key.as_deref(), Some("UFVC"));
        assert_eq!(ctx.bootstrap_content.as_deref(), Some("a\\nb"));
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 9);
    }
}
