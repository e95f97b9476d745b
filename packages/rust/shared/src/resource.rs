//! Typed resource model used by functions.
//!
//! Functions work with resource bodies of any `serde` type; the helpers here
//! convert them to and from the [`Struct`] form carried on the wire.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ComposeFnError, Result};
use crate::proto::{self, ConnectionDetails, Struct};

// ---------------------------------------------------------------------------
// Name
// ---------------------------------------------------------------------------

/// The name under which a composed resource is tracked in a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Unstructured
// ---------------------------------------------------------------------------

/// A resource body with no schema beyond being a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unstructured(pub Struct);

impl Unstructured {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    /// `metadata.name`, if set.
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
    }

    /// The body's GVK, if both `apiVersion` and `kind` are set.
    pub fn gvk(&self) -> Option<GroupVersionKind> {
        Some(GroupVersionKind::from_api_version_kind(
            self.api_version()?,
            self.kind()?,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Struct> for Unstructured {
    fn from(s: Struct) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Composite / composed
// ---------------------------------------------------------------------------

/// A composite resource and its connection details.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composite<R = Unstructured> {
    pub resource: R,
    pub connection_details: ConnectionDetails,
}

/// A composed resource as observed by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedComposed<R = Unstructured> {
    pub resource: R,
    pub connection_details: ConnectionDetails,
}

/// A composed resource a function wants to exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredComposed<R = Unstructured> {
    pub resource: R,
    pub ready: Ready,
}

impl<R> DesiredComposed<R> {
    /// Wrap a body with unspecified readiness.
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            ready: Ready::Unspecified,
        }
    }
}

/// Whether a desired composed resource is ready.
///
/// `Unspecified` leaves the decision to the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Ready {
    #[default]
    Unspecified,
    False,
    True,
}

impl Ready {
    pub const ALL: [Ready; 3] = [Ready::Unspecified, Ready::False, Ready::True];
}

impl From<bool> for Ready {
    fn from(ready: bool) -> Self {
        if ready { Self::True } else { Self::False }
    }
}

impl From<Ready> for proto::Ready {
    fn from(ready: Ready) -> Self {
        match ready {
            Ready::Unspecified => proto::Ready::Unspecified,
            Ready::False => proto::Ready::False,
            Ready::True => proto::Ready::True,
        }
    }
}

impl From<proto::Ready> for Ready {
    fn from(ready: proto::Ready) -> Self {
        match ready {
            proto::Ready::Unspecified => Ready::Unspecified,
            proto::Ready::False => Ready::False,
            proto::Ready::True => Ready::True,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupVersionKind
// ---------------------------------------------------------------------------

/// Identifies a kind of resource. An empty group denotes the core API group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Split an `apiVersion` such as `example.org/v1` (or `v1` for the core
    /// group) into group and version.
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let (group, version) = api_version.rsplit_once('/').unwrap_or(("", api_version));
        Self::new(group, version, kind)
    }

    /// True when group, version and kind are all unset.
    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }

    /// The `apiVersion` string: `group/version`, or `version` alone for the
    /// core group.
    pub fn group_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.group_version(), self.kind)
    }
}

// ---------------------------------------------------------------------------
// Struct conversion
// ---------------------------------------------------------------------------

/// Serialize a resource body into a [`Struct`].
///
/// Fails if the serializer errors or the value is not a JSON object.
pub fn as_struct<T: Serialize + ?Sized>(value: &T) -> Result<Struct> {
    let type_name = std::any::type_name::<T>();
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ComposeFnError::conversion(
            type_name,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(ComposeFnError::conversion(type_name, e.to_string())),
    }
}

/// Deserialize a [`Struct`] into a typed resource body.
pub fn from_struct<T: DeserializeOwned>(value: &Struct) -> Result<T> {
    serde_json::from_value(Value::Object(value.clone()))
        .map_err(|e| ComposeFnError::conversion(std::any::type_name::<T>(), e.to_string()))
}

/// Labels used to select resources.
pub type Labels = BTreeMap<String, String>;

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Bucket {
        api_version: String,
        kind: String,
        region: String,
    }

    #[test]
    fn ready_mapping_is_total_and_stable() {
        for ready in Ready::ALL {
            let wire = proto::Ready::from(ready);
            assert_eq!(Ready::from(wire), ready);
            assert_eq!(proto::Ready::from(ready), wire);
        }
        assert_eq!(proto::Ready::from(Ready::Unspecified), proto::Ready::Unspecified);
        assert_eq!(proto::Ready::from(Ready::False), proto::Ready::False);
        assert_eq!(proto::Ready::from(Ready::True), proto::Ready::True);
        assert_eq!(Ready::from(true), Ready::True);
        assert_eq!(Ready::from(false), Ready::False);
    }

    #[test]
    fn gvk_group_version() {
        let gvk = GroupVersionKind::new("example.org", "v1", "Widget");
        assert_eq!(gvk.group_version(), "example.org/v1");
        assert_eq!(gvk.to_string(), "example.org/v1, Kind=Widget");

        let core = GroupVersionKind::from_api_version_kind("v1", "ConfigMap");
        assert_eq!(core.group, "");
        assert_eq!(core.group_version(), "v1");

        let parsed = GroupVersionKind::from_api_version_kind("example.org/v1", "Widget");
        assert_eq!(parsed, gvk);

        assert!(GroupVersionKind::default().is_empty());
        assert!(!core.is_empty());
    }

    #[test]
    fn typed_body_converts_both_ways() {
        let bucket = Bucket {
            api_version: "example.org/v1".into(),
            kind: "Bucket".into(),
            region: "us-east-2".into(),
        };
        let s = as_struct(&bucket).expect("as_struct");
        assert_eq!(s["region"], "us-east-2");

        let back: Bucket = from_struct(&s).expect("from_struct");
        assert_eq!(back, bucket);

        let u = Unstructured::from(s);
        assert_eq!(u.kind(), Some("Bucket"));
        assert_eq!(u.gvk(), Some(GroupVersionKind::new("example.org", "v1", "Bucket")));
        assert_eq!(u.name(), None);
    }

    #[test]
    fn non_object_body_is_a_conversion_error() {
        let err = as_struct(&"just a string").expect_err("strings are not objects");
        assert!(matches!(err, ComposeFnError::Conversion { .. }));
        assert!(err.to_string().contains("&str"));
        assert!(err.to_string().contains("a string"));

        let mut bad_keys = BTreeMap::new();
        bad_keys.insert(vec![1u8], "v");
        let err = as_struct(&bad_keys).expect_err("non-string keys");
        assert!(matches!(err, ComposeFnError::Conversion { .. }));
    }

    #[test]
    fn from_struct_reports_target_type() {
        let s = json!({"kind": 7}).as_object().cloned().expect("object");
        let err = from_struct::<Bucket>(&s).expect_err("missing fields");
        assert!(err.to_string().contains("Bucket"));
    }

    #[test]
    fn unstructured_metadata_name() {
        let u: Unstructured = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings"}
        }))
        .expect("deserialize");
        assert_eq!(u.name(), Some("settings"));
        assert_eq!(u.api_version(), Some("v1"));
    }
}
