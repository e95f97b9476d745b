//! Builders for function responses and readers for function requests.
//!
//! A function receives a [`RunFunctionRequest`], bootstraps a response with
//! [`to`], then threads it through the setters in this crate. Every setter
//! allocates the nested section it writes into only when that section is
//! absent, so data written earlier in the pipeline is never discarded.
//!
//! [`RunFunctionRequest`]: composefn_shared::RunFunctionRequest

pub mod request;
pub mod requirements;
pub mod response;
pub mod results;

pub use requirements::{request_extra_resource_by_labels, request_extra_resource_by_name};
pub use response::{
    set_context_key, set_desired_composed_resources, set_desired_composite_resource, to,
};
pub use results::{append_result, fatal, normal, normalf, warning};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use composefn_shared::proto::{Match, RequestMeta, ResourceSelector, Severity};
    use composefn_shared::{GroupVersionKind, RunFunctionRequest, Struct};
    use serde_json::json;

    use super::*;

    #[test]
    fn end_to_end_scenario() {
        let req = RunFunctionRequest {
            meta: Some(RequestMeta { tag: "abc".into() }),
            context: Some(Struct::new()),
            ..Default::default()
        };

        let mut rsp = to(&req, Duration::from_secs(60));
        set_context_key(&mut rsp, "note", "hello");
        normal(&mut rsp, "did a thing");
        request_extra_resource_by_name(
            &mut rsp,
            "req-1",
            "my-resource",
            &GroupVersionKind::new("example.org", "v1", "Widget"),
        )
        .expect("valid requirement");

        let meta = rsp.meta.as_ref().expect("meta");
        assert_eq!(meta.tag, "abc");
        assert_eq!(meta.ttl, Some(Duration::from_secs(60)));
        assert_eq!(rsp.context.as_ref().map(|c| &c["note"]), Some(&json!("hello")));
        assert_eq!(rsp.results.len(), 1);
        assert_eq!(rsp.results[0].severity, Severity::Normal);
        assert_eq!(rsp.results[0].message, "did a thing");
        assert_eq!(
            rsp.requirements
                .as_ref()
                .and_then(|r| r.extra_resources.as_ref())
                .map(|e| &e["req-1"]),
            Some(&ResourceSelector {
                api_version: "example.org/v1".into(),
                kind: "Widget".into(),
                selector: Match::Name("my-resource".into()),
            })
        );

        let wire = serde_json::to_value(&rsp).expect("serialize response");
        assert_eq!(wire["meta"]["ttl"], "60s");
        assert_eq!(wire["results"][0]["severity"], "SEVERITY_NORMAL");
        assert_eq!(
            wire["requirements"]["extraResources"]["req-1"]["matchName"],
            "my-resource"
        );
    }

    #[test]
    fn rejected_requirement_leaves_response_untouched() {
        let mut rsp = to(&RunFunctionRequest::default(), Duration::from_secs(60));
        let err = request_extra_resource_by_name(
            &mut rsp,
            "",
            "name",
            &GroupVersionKind::new("example.org", "v1", "Widget"),
        )
        .expect_err("empty id");
        assert!(err.is_validation());
        assert!(rsp.requirements.is_none());

        // The usual way to surface it: a fatal result.
        fatal(&mut rsp, &err);
        assert_eq!(rsp.results[0].severity, Severity::Fatal);
    }
}
