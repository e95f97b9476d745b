//! Reporting diagnostics. None of these can fail.

use std::fmt;

use tracing::trace;

use composefn_shared::proto::{FunctionResult, RunFunctionResponse, Severity};

/// Append a result with the given severity. Results keep insertion order.
pub fn append_result(rsp: &mut RunFunctionResponse, severity: Severity, message: impl Into<String>) {
    let message = message.into();
    trace!(?severity, %message, "appending result");
    rsp.results.push(FunctionResult { severity, message });
}

/// Add a fatal result. The orchestrator aborts the pipeline when it sees one.
pub fn fatal(rsp: &mut RunFunctionResponse, err: impl fmt::Display) {
    append_result(rsp, Severity::Fatal, err.to_string());
}

/// Add a warning result.
pub fn warning(rsp: &mut RunFunctionResponse, err: impl fmt::Display) {
    append_result(rsp, Severity::Warning, err.to_string());
}

/// Add a normal result.
pub fn normal(rsp: &mut RunFunctionResponse, message: impl Into<String>) {
    append_result(rsp, Severity::Normal, message);
}

/// Add a normal result from format arguments, e.g.
/// `normalf(&mut rsp, format_args!("created {n} resources"))`.
pub fn normalf(rsp: &mut RunFunctionResponse, args: fmt::Arguments<'_>) {
    normal(rsp, fmt::format(args));
}
