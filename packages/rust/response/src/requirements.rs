//! Requesting extra resources from the orchestrator.
//!
//! A requirement registered here is answered on the next invocation of the
//! function, where the fetched resources appear under the same ID in the
//! request's `extraResources`.

use tracing::debug;

use composefn_shared::proto::{Match, MatchLabels, ResourceSelector, RunFunctionResponse};
use composefn_shared::resource::{GroupVersionKind, Labels};
use composefn_shared::{ComposeFnError, Result};

/// Request exactly one resource of kind `gvk` named `name`, keyed by `id`.
///
/// Replaces any requirement previously registered under `id`.
pub fn request_extra_resource_by_name(
    rsp: &mut RunFunctionResponse,
    id: &str,
    name: &str,
    gvk: &GroupVersionKind,
) -> Result<()> {
    validate("name", id, gvk)?;
    if name.is_empty() {
        return Err(ComposeFnError::validation(
            "cannot request extra resource by name with empty name",
        ));
    }

    debug!(id, name, %gvk, "requesting extra resource by name");
    insert(rsp, id, gvk, Match::Name(name.to_string()));
    Ok(())
}

/// Request every resource of kind `gvk` carrying `labels`, keyed by `id`.
///
/// An empty label set selects every resource of the kind. Replaces any
/// requirement previously registered under `id`.
pub fn request_extra_resource_by_labels(
    rsp: &mut RunFunctionResponse,
    id: &str,
    labels: Labels,
    gvk: &GroupVersionKind,
) -> Result<()> {
    validate("labels", id, gvk)?;

    debug!(id, label_count = labels.len(), %gvk, "requesting extra resources by labels");
    insert(rsp, id, gvk, Match::Labels(MatchLabels { labels }));
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Checks run before anything is allocated.
fn validate(by: &str, id: &str, gvk: &GroupVersionKind) -> Result<()> {
    if gvk.is_empty() {
        return Err(ComposeFnError::validation(format!(
            "cannot request extra resource by {by} with empty GVK"
        )));
    }
    // The group may be empty (core API group); version and kind may not.
    if gvk.version.is_empty() || gvk.kind.is_empty() {
        return Err(ComposeFnError::validation(format!(
            "cannot request extra resource by {by} with incomplete GVK {gvk:?}"
        )));
    }
    if id.is_empty() {
        return Err(ComposeFnError::validation(format!(
            "cannot request extra resource by {by} with empty ID"
        )));
    }
    Ok(())
}

fn insert(rsp: &mut RunFunctionResponse, id: &str, gvk: &GroupVersionKind, selector: Match) {
    rsp.extra_resources_mut().insert(
        id.to_string(),
        ResourceSelector {
            api_version: gvk.group_version(),
            kind: gvk.kind.clone(),
            selector,
        },
    );
}
