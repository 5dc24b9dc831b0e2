//! Error types for kssh
//!
//! Each variant maps to one failure category of a provisioning run.
//! Cluster failures carry the object identity (kind, namespace, name) so
//! a run can be diagnosed from the message alone.

use thiserror::Error;

use crate::template::TemplateError;
use crate::yaml::YamlError;

/// Main error type for kssh operations
#[derive(Debug, Error)]
pub enum Error {
    /// Secure randomness or key marshalling failed
    #[error("key generation error: {message}")]
    KeyGeneration {
        /// Description of what failed
        message: String,
    },

    /// A manifest template failed to parse or render
    #[error("template error in {template}: {source}")]
    Template {
        /// Which template was being rendered
        template: String,
        /// The underlying template error
        #[source]
        source: TemplateError,
    },

    /// Rendered manifest text is not valid structured data
    #[error("decode error in {template}: {source}")]
    Decode {
        /// Which template produced the text
        template: String,
        /// The underlying parse error
        #[source]
        source: YamlError,
    },

    /// A decoded object lacks a field needed to address it
    #[error("invalid object: missing {field}")]
    InvalidObject {
        /// The absent field path (e.g., "metadata.name")
        field: String,
    },

    /// Run parameters are invalid
    #[error("validation error for {field}: {message}")]
    Validation {
        /// The offending parameter
        field: String,
        /// Description of what's invalid
        message: String,
    },

    /// A cluster call failed with anything other than not-found/already-exists
    #[error("cluster error: failed to {operation} {kind} {namespace}/{name}: {message}")]
    Cluster {
        /// The operation that failed (get, create)
        operation: String,
        /// Resource kind
        kind: String,
        /// Namespace, or "-" for cluster-scoped resources
        namespace: String,
        /// Resource name
        name: String,
        /// The underlying cause
        message: String,
    },

    /// Building the kube client or running API discovery failed
    #[error("client error [{context}]: {message}")]
    Client {
        /// Where the failure happened (e.g., "create_client", "discovery")
        context: String,
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a key generation error
    pub fn key_generation(msg: impl Into<String>) -> Self {
        Self::KeyGeneration {
            message: msg.into(),
        }
    }

    /// Create a template error for the named template
    pub fn template(template: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            template: template.into(),
            source,
        }
    }

    /// Create a decode error for the named template's output
    pub fn decode(template: impl Into<String>, source: YamlError) -> Self {
        Self::Decode {
            template: template.into(),
            source,
        }
    }

    /// Create an invalid object error for an absent field
    pub fn invalid_object(field: impl Into<String>) -> Self {
        Self::InvalidObject {
            field: field.into(),
        }
    }

    /// Create a validation error for a run parameter
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a cluster error with the object identity
    pub fn cluster(
        operation: impl Into<String>,
        kind: impl Into<String>,
        namespace: Option<&str>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Cluster {
            operation: operation.into(),
            kind: kind.into(),
            namespace: namespace.unwrap_or("-").to_string(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a client error with context
    pub fn client(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Client {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// True when the failure happened before any cluster mutation could occur
    pub fn is_pre_apply(&self) -> bool {
        matches!(
            self,
            Self::KeyGeneration { .. }
                | Self::Template { .. }
                | Self::Decode { .. }
                | Self::InvalidObject { .. }
                | Self::Validation { .. }
        )
    }
}
