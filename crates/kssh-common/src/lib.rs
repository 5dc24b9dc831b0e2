//! Common types for kssh: errors, manifest decoding, templating and kube helpers

#![deny(missing_docs)]

pub mod error;
pub mod kube_utils;
pub mod telemetry;
pub mod template;
pub mod yaml;

pub use error::Error;
pub use yaml::{decode_documents, GenericObject, ObjectKey};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label stamped on every object kssh renders
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] for kssh-owned objects
pub const LABEL_MANAGED_BY_KSSH: &str = "kssh";
