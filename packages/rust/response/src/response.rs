//! Bootstrapping a response and writing desired state and context into it.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use composefn_shared::Result;
use composefn_shared::proto::{self, ResponseMeta, RunFunctionRequest, RunFunctionResponse};
use composefn_shared::resource::{self, Composite, DesiredComposed, Name};

/// Bootstrap a response to the supplied request.
///
/// The request's tag, desired state and context are copied forward, so a
/// function that changes nothing passes the pipeline's state through intact.
pub fn to(req: &RunFunctionRequest, ttl: Duration) -> RunFunctionResponse {
    RunFunctionResponse {
        meta: Some(ResponseMeta {
            tag: req.tag().to_string(),
            ttl: Some(ttl),
        }),
        desired: req.desired.clone(),
        context: req.context.clone(),
        ..Default::default()
    }
}

/// Set `key` in the response context, replacing any previous value.
pub fn set_context_key(
    rsp: &mut RunFunctionResponse,
    key: impl Into<String>,
    value: impl Into<Value>,
) {
    let key = key.into();
    trace!(%key, "setting context key");
    rsp.context_mut().insert(key, value.into());
}

/// Set the desired composite resource.
///
/// This replaces any desired composite accumulated by earlier functions in
/// the pipeline. On a conversion error the response is left untouched.
pub fn set_desired_composite_resource<R: Serialize>(
    rsp: &mut RunFunctionResponse,
    xr: &Composite<R>,
) -> Result<()> {
    let body = resource::as_struct(&xr.resource)?;
    rsp.desired_mut().composite = Some(proto::Resource {
        resource: Some(body),
        connection_details: xr.connection_details.clone(),
        ready: proto::Ready::Unspecified,
    });
    Ok(())
}

/// Set desired composed resources.
///
/// Entries are merged into the existing map: names not in `dcds` keep their
/// current value, names in `dcds` are overwritten. Every body is converted
/// before anything is written, so a conversion error leaves the response
/// exactly as it was.
#[instrument(skip_all)]
pub fn set_desired_composed_resources<'a, R, I>(rsp: &mut RunFunctionResponse, dcds: I) -> Result<()>
where
    R: Serialize + 'a,
    I: IntoIterator<Item = (&'a Name, &'a DesiredComposed<R>)>,
{
    let converted = dcds
        .into_iter()
        .map(|(name, dcd)| {
            let body = resource::as_struct(&dcd.resource)?;
            Ok((
                name.0.clone(),
                proto::Resource {
                    resource: Some(body),
                    ready: dcd.ready.into(),
                    ..Default::default()
                },
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(count = converted.len(), "setting desired composed resources");
    rsp.desired_mut().resources_mut().extend(converted);
    Ok(())
}
