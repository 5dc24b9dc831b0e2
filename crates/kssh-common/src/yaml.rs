//! Multi-document manifest decoding using yaml-rust2
//!
//! Rendered manifests are streams of `---` separated YAML documents. Each
//! document is converted into a `serde_json::Value` tree (null, bool,
//! number, string, sequence, mapping) and wrapped in a [`GenericObject`]
//! that knows nothing about specific kinds beyond how to address them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::trace;
use yaml_rust2::{Yaml, YamlLoader};

use crate::Error;

/// Error type for YAML parsing
#[derive(Debug, Clone)]
pub struct YamlError(String);

impl YamlError {
    /// Create a YAML error with the given message
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for YamlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for YamlError {}

/// Decode a multi-document YAML stream into generic objects.
///
/// Documents are converted in stream order. Empty documents (nothing
/// between two `---` markers, leading or trailing markers, an empty
/// mapping) are dropped. Any malformed document fails the whole call;
/// no partial list is returned.
pub fn decode_documents(input: &str) -> Result<Vec<GenericObject>, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError(e.to_string()))?;

    let mut objects = Vec::with_capacity(docs.len());
    for (index, doc) in docs.into_iter().enumerate() {
        match yaml_to_json(doc)? {
            Value::Null => trace!(index, "skipping empty document"),
            Value::Object(map) if map.is_empty() => trace!(index, "skipping empty mapping"),
            Value::Object(map) => objects.push(GenericObject { fields: map }),
            other => {
                return Err(YamlError(format!(
                    "document {} is a {}, expected a mapping",
                    index,
                    value_type_name(&other)
                )))
            }
        }
    }
    Ok(objects)
}

/// Convert a yaml_rust2::Yaml value to serde_json::Value
fn yaml_to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => real_to_json(s),
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(r) => r,
                    Yaml::Boolean(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    _ => return Err(YamlError("unsupported YAML key type".to_string())),
                };
                yaml_to_json(v).map(|v| (key, v))
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(YamlError("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(YamlError("bad YAML value".to_string())),
    }
}

/// JSON has no NaN or infinity; such values fail rather than degrade to null.
fn real_to_json(literal: String) -> Result<Value, YamlError> {
    let parsed = Yaml::Real(literal.clone())
        .as_f64()
        .ok_or_else(|| YamlError(format!("invalid float literal '{}'", literal)))?;
    Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| YamlError(format!("'{}' is not a finite number", literal)))
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// A decoded manifest document.
///
/// The tree is opaque apart from the fields used to address the object:
/// `apiVersion`, `kind`, `metadata.name` and `metadata.namespace`. Lookups
/// return an error or `None` when the field is absent instead of panicking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericObject {
    fields: Map<String, Value>,
}

impl GenericObject {
    /// Wrap a JSON value; returns `None` unless it is a mapping
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// A cluster-scoped Namespace object
    pub fn namespace_object(name: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("apiVersion".to_string(), Value::from("v1"));
        fields.insert("kind".to_string(), Value::from("Namespace"));
        fields.insert(
            "metadata".to_string(),
            serde_json::json!({
                "name": name,
                "labels": { crate::LABEL_MANAGED_BY: crate::LABEL_MANAGED_BY_KSSH }
            }),
        );
        Self { fields }
    }

    /// `apiVersion`
    pub fn api_version(&self) -> Result<&str, Error> {
        self.str_field("/apiVersion", "apiVersion")
    }

    /// `kind`
    pub fn kind(&self) -> Result<&str, Error> {
        self.str_field("/kind", "kind")
    }

    /// `metadata.name`
    pub fn name(&self) -> Result<&str, Error> {
        self.str_field("/metadata/name", "metadata.name")
    }

    /// `metadata.namespace`, absent for cluster-scoped objects
    pub fn namespace(&self) -> Option<&str> {
        self.pointer("/metadata/namespace").and_then(Value::as_str)
    }

    /// Look up a nested field by JSON pointer (e.g. `/data/id_rsa`)
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let mut parts = pointer.strip_prefix('/')?.splitn(2, '/');
        let head = self.fields.get(parts.next()?)?;
        match parts.next() {
            Some(rest) => head.pointer(&format!("/{rest}")),
            None => Some(head),
        }
    }

    /// Top-level fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The whole tree as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Identity of this object; namespaced objects without an explicit
    /// namespace fall back to `default_namespace`.
    pub fn key(&self, default_namespace: Option<&str>) -> Result<ObjectKey, Error> {
        Ok(ObjectKey {
            api_version: self.api_version()?.to_string(),
            kind: self.kind()?.to_string(),
            namespace: self.namespace().or(default_namespace).map(str::to_string),
            name: self.name()?.to_string(),
        })
    }

    fn str_field(&self, pointer: &str, field: &str) -> Result<&str, Error> {
        self.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::invalid_object(field))
    }
}

/// Address of an object in the cluster
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Full API version (e.g., "apps/v1", "v1")
    pub api_version: String,
    /// Resource kind
    pub kind: String,
    /// Namespace; `None` for cluster-scoped objects
    pub namespace: Option<String>,
    /// Resource name
    pub name: String,
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}
