//! Reading typed values out of a [`RunFunctionRequest`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use composefn_shared::proto::{self, RunFunctionRequest, State};
use composefn_shared::resource::{
    self, Composite, DesiredComposed, Name, ObservedComposed, Unstructured,
};
use composefn_shared::{ComposeFnError, Result};

/// Look up a context key passed along by earlier pipeline stages.
pub fn get_context_key<'a>(req: &'a RunFunctionRequest, key: &str) -> Option<&'a Value> {
    req.context.as_ref()?.get(key)
}

/// Deserialize the function's input into `T`.
pub fn get_input<T: DeserializeOwned>(req: &RunFunctionRequest) -> Result<T> {
    let input = req
        .input
        .as_ref()
        .ok_or_else(|| ComposeFnError::validation("request has no input"))?;
    resource::from_struct(input)
}

/// The observed composite resource. Empty if the request carries none.
pub fn get_observed_composite_resource(req: &RunFunctionRequest) -> Composite {
    composite(req.observed.as_ref())
}

/// The desired composite resource. Empty if the request carries none.
pub fn get_desired_composite_resource(req: &RunFunctionRequest) -> Composite {
    composite(req.desired.as_ref())
}

/// Observed composed resources keyed by name.
pub fn get_observed_composed_resources(
    req: &RunFunctionRequest,
) -> BTreeMap<Name, ObservedComposed> {
    composed(req.observed.as_ref())
        .map(|(name, r)| {
            let oc = ObservedComposed {
                resource: body(r),
                connection_details: r.connection_details.clone(),
            };
            (name, oc)
        })
        .collect()
}

/// Desired composed resources accumulated by earlier functions, keyed by
/// name.
pub fn get_desired_composed_resources(
    req: &RunFunctionRequest,
) -> BTreeMap<Name, DesiredComposed> {
    composed(req.desired.as_ref())
        .map(|(name, r)| {
            let dc = DesiredComposed {
                resource: body(r),
                ready: r.ready.into(),
            };
            (name, dc)
        })
        .collect()
}

/// Extra resources the orchestrator fetched, keyed by requirement ID.
pub fn get_extra_resources(req: &RunFunctionRequest) -> BTreeMap<String, Vec<Unstructured>> {
    req.extra_resources
        .iter()
        .map(|(id, resources)| {
            let items = resources
                .items
                .iter()
                .filter_map(|r| r.resource.clone().map(Unstructured))
                .collect();
            (id.clone(), items)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn body(r: &proto::Resource) -> Unstructured {
    Unstructured(r.resource.clone().unwrap_or_default())
}

fn composite(state: Option<&State>) -> Composite {
    state
        .and_then(|s| s.composite.as_ref())
        .map(|r| Composite {
            resource: body(r),
            connection_details: r.connection_details.clone(),
        })
        .unwrap_or_default()
}

fn composed<'a>(
    state: Option<&'a State>,
) -> impl Iterator<Item = (Name, &'a proto::Resource)> {
    state
        .and_then(|s| s.resources.as_ref())
        .into_iter()
        .flatten()
        .map(|(name, r)| (Name::from(name.as_str()), r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    use composefn_shared::resource::Ready;

    #[derive(Debug, Deserialize)]
    struct Input {
        region: String,
    }

    fn fixture() -> RunFunctionRequest {
        let raw = std::fs::read_to_string("../../../fixtures/json/request.fixture.json")
            .expect("read fixture");
        serde_json::from_str(&raw).expect("deserialize fixture request")
    }

    #[test]
    fn reads_context_and_input() {
        let req = fixture();
        assert_eq!(
            get_context_key(&req, "example.org/previous"),
            Some(&json!("value"))
        );
        assert_eq!(get_context_key(&req, "missing"), None);

        let input: Input = get_input(&req).expect("input");
        assert_eq!(input.region, "us-east-2");
    }

    #[test]
    fn missing_input_is_a_validation_error() {
        let err = get_input::<Input>(&RunFunctionRequest::default()).expect_err("no input");
        assert!(err.is_validation());
    }

    #[test]
    fn mismatched_input_is_a_conversion_error() {
        let req = RunFunctionRequest {
            input: json!({"region": 42}).as_object().cloned(),
            ..Default::default()
        };
        let err = get_input::<Input>(&req).expect_err("wrong type");
        assert!(matches!(err, ComposeFnError::Conversion { .. }));
    }

    #[test]
    fn reads_composites() {
        let req = fixture();
        let observed = get_observed_composite_resource(&req);
        assert_eq!(observed.resource.name(), Some("my-bucket"));
        assert_eq!(observed.resource.kind(), Some("XBucket"));
        assert_eq!(observed.connection_details["password"], b"hunter2".to_vec());

        let desired = get_desired_composite_resource(&req);
        assert_eq!(desired.resource.api_version(), Some("example.org/v1"));

        let empty = get_observed_composite_resource(&RunFunctionRequest::default());
        assert!(empty.resource.is_empty());
    }

    #[test]
    fn reads_composed_resources_with_readiness() {
        let req = fixture();
        let desired = get_desired_composed_resources(&req);
        assert_eq!(desired.len(), 1);
        let bucket = &desired[&Name::from("bucket")];
        assert_eq!(bucket.ready, Ready::True);
        assert_eq!(bucket.resource.kind(), Some("Bucket"));

        assert!(get_observed_composed_resources(&req).is_empty());
    }

    #[test]
    fn reads_extra_resources() {
        let req = fixture();
        let extra = get_extra_resources(&req);
        assert_eq!(extra["cfg"].len(), 1);
        assert_eq!(extra["cfg"][0].name(), Some("settings"));
    }
}
