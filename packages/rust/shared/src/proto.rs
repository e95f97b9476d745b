//! Message schema exchanged between the orchestrator and a function.
//!
//! Field names and enum values follow proto-JSON conventions so that
//! documents serialized here match what the orchestrator emits.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ComposeFnError;

/// A structured value: a JSON object of arbitrary depth.
pub type Struct = Map<String, Value>;

/// Connection secrets attached to a resource, keyed by name. Values are
/// base64 strings on the wire.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request from the orchestrator to run a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFunctionRequest {
    /// Metadata echoed back in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,
    /// Observed state of the composite and its composed resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<State>,
    /// Desired state accumulated by previous functions in the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<State>,
    /// Function-specific configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Struct>,
    /// Side-channel data passed between pipeline stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Struct>,
    /// Resources fetched by the orchestrator to satisfy earlier requirements.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_resources: BTreeMap<String, Resources>,
}

impl RunFunctionRequest {
    /// The request tag, or an empty string when no metadata was sent.
    pub fn tag(&self) -> &str {
        self.meta.as_ref().map_or("", |m| m.tag.as_str())
    }
}

/// Request metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Opaque tag identifying the request.
    #[serde(default)]
    pub tag: String,
}

/// A list of resources supplied for one requirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub items: Vec<Resource>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Observed or desired state: a composite plus its composed resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Resource>,
    /// Composed resources keyed by resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<BTreeMap<String, Resource>>,
}

impl State {
    /// The composed-resources map, allocated if absent.
    pub fn resources_mut(&mut self) -> &mut BTreeMap<String, Resource> {
        self.resources.get_or_insert_default()
    }
}

/// A single resource as carried on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// The resource body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Struct>,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        with = "connection_details"
    )]
    pub connection_details: ConnectionDetails,
    /// Readiness, only meaningful for desired composed resources.
    #[serde(default, skip_serializing_if = "Ready::is_unspecified")]
    pub ready: Ready,
}

/// Wire readiness of a desired composed resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ready {
    #[default]
    #[serde(rename = "READY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "READY_FALSE")]
    False,
    #[serde(rename = "READY_TRUE")]
    True,
}

impl Ready {
    pub fn is_unspecified(&self) -> bool {
        *self == Self::Unspecified
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A function's response to a [`RunFunctionRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<State>,
    /// Diagnostics in the order they were reported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FunctionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Struct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Requirements>,
}

impl RunFunctionResponse {
    /// The desired state, allocated if absent.
    pub fn desired_mut(&mut self) -> &mut State {
        self.desired.get_or_insert_default()
    }

    /// The context map, allocated if absent.
    pub fn context_mut(&mut self) -> &mut Struct {
        self.context.get_or_insert_default()
    }

    /// The requirements section, allocated if absent.
    pub fn requirements_mut(&mut self) -> &mut Requirements {
        self.requirements.get_or_insert_default()
    }

    /// The extra-resources requirement map, allocated (along with its
    /// parent section) if absent.
    pub fn extra_resources_mut(&mut self) -> &mut BTreeMap<String, ResourceSelector> {
        self.requirements_mut().extra_resources.get_or_insert_default()
    }
}

/// Response metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Tag copied from the request.
    #[serde(default)]
    pub tag: String,
    /// How long the orchestrator may cache this response.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration"
    )]
    pub ttl: Option<Duration>,
}

/// Resources the function needs the orchestrator to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    /// Selectors keyed by caller-supplied request ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_resources: Option<BTreeMap<String, ResourceSelector>>,
}

/// Identifies the resources to fetch for one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub api_version: String,
    pub kind: String,
    #[serde(flatten)]
    pub selector: Match,
}

/// How a [`ResourceSelector`] matches resources of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Match {
    /// Exactly one resource with this name.
    #[serde(rename = "matchName")]
    Name(String),
    /// Every resource carrying all of these labels.
    #[serde(rename = "matchLabels")]
    Labels(MatchLabels),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLabels {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A diagnostic reported by a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

/// Severity of a [`FunctionResult`].
///
/// Fatal results abort the pipeline. Warnings are surfaced but do not block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    #[serde(rename = "SEVERITY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "SEVERITY_FATAL")]
    Fatal,
    #[serde(rename = "SEVERITY_WARNING")]
    Warning,
    #[serde(rename = "SEVERITY_NORMAL")]
    Normal,
}

impl std::str::FromStr for Severity {
    type Err = ComposeFnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "warning" | "warn" => Ok(Self::Warning),
            "normal" => Ok(Self::Normal),
            other => Err(ComposeFnError::parse(format!(
                "unknown severity {other:?} (expected fatal, warning, or normal)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Format a duration the way proto-JSON does: seconds with an `s` suffix
/// and up to nine fractional digits.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", d.as_secs());
    }
    let frac = format!("{nanos:09}");
    format!("{}.{}s", d.as_secs(), frac.trim_end_matches('0'))
}

/// Parse a proto-JSON duration string such as `"60s"` or `"1.5s"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let body = s
        .strip_suffix('s')
        .ok_or_else(|| format!("duration {s:?} must end in 's'"))?;
    let (secs, frac) = body.split_once('.').unwrap_or((body, ""));
    let secs: u64 = secs
        .parse()
        .map_err(|_| format!("invalid seconds in duration {s:?}"))?;
    if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid fractional seconds in duration {s:?}"));
    }
    let nanos = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}")
            .parse()
            .map_err(|_| format!("invalid fractional seconds in duration {s:?}"))?
    };
    Ok(Duration::new(secs, nanos))
}

mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ttl: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match ttl {
            Some(d) => s.serialize_str(&super::format_duration(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| super::parse_duration(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

mod connection_details {
    use std::collections::BTreeMap;

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::ConnectionDetails;

    pub fn serialize<S: Serializer>(details: &ConnectionDetails, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(details.len()))?;
        for (key, value) in details {
            map.serialize_entry(key, &STANDARD.encode(value))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ConnectionDetails, D::Error> {
        BTreeMap::<String, String>::deserialize(d)?
            .into_iter()
            .map(|(key, encoded)| {
                STANDARD
                    .decode(&encoded)
                    .map(|bytes| (key.clone(), bytes))
                    .map_err(|e| de::Error::custom(format!("connection detail {key:?}: {e}")))
            })
            .collect()
    }
}
