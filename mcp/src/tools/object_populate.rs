use std::sync::Arc;

use error_stack::Report;
use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::ToolFn;
use super::ToolResponse;
use super::ToolStatus;
use super::Tools;
use crate::error::Error;
use crate::error::Result;
use crate::error::report_to_response;
use crate::host::Host;
use crate::marshal::Reflector;
use crate::node::SerializedNode;
use crate::node::Transcript;
use crate::reflect::ObjectRef;

/// Parameters of `object_populate`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulateParams {
    /// Host object to modify
    pub target: ObjectRef,
    /// Entries to apply; members left out are not touched
    pub diff:   SerializedNode,
}

/// Parameters of `object_populate_batch`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulateBatchParams {
    /// Host objects to modify
    pub targets: Vec<ObjectRef>,
    /// One diff per target, in the same order
    pub diffs:   Vec<SerializedNode>,
}

pub struct ObjectPopulate;

pub struct ObjectPopulateBatch;

impl ToolFn for ObjectPopulate {
    type Params = PopulateParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        let reflector = Arc::clone(&tools.reflector);
        let work = tools.host.run(cancel, move |host| -> Result<ToolResponse> {
            let PopulateParams { target, mut diff } = params;
            let mut transcript = reflector.transcript();
            let applied = populate_one(&reflector, host, &target, &mut diff, &mut transcript)?;
            Ok(respond(applied, &format!("'{}'", target.handle), &transcript))
        });
        async move { work.await? }.boxed()
    }
}

impl ToolFn for ObjectPopulateBatch {
    type Params = PopulateBatchParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        if params.targets.len() != params.diffs.len() {
            let error = Error::invalid(
                "diffs",
                format!(
                    "{} targets but {} diffs were supplied; they must pair up one to one",
                    params.targets.len(),
                    params.diffs.len()
                ),
            );
            return async move { Err(Report::new(error)) }.boxed();
        }

        let reflector = Arc::clone(&tools.reflector);
        let work = tools.host.run(cancel, move |host| {
            let mut transcript = reflector.transcript();
            let mut applied = false;
            let subject = format!("{} object(s)", params.targets.len());
            for (target, mut diff) in params.targets.iter().zip(params.diffs) {
                // a failing target is reported and the rest still run
                match populate_one(&reflector, host, target, &mut diff, &mut transcript) {
                    Ok(changed) => applied |= changed,
                    Err(report) => transcript.error(0, report_to_response(&report)),
                }
            }
            respond(applied, &subject, &transcript)
        });
        async move { work.await }.boxed()
    }
}

fn populate_one(
    reflector: &Reflector,
    host: &mut dyn Host,
    target: &ObjectRef,
    diff: &mut SerializedNode,
    transcript: &mut Transcript,
) -> Result<bool> {
    if target.is_null() {
        return Err(Report::new(Error::missing("target handle")));
    }
    reflector.populate_handle(host, target.handle, diff, transcript)
}

/// Depth-0 summary line followed by the indented transcript
fn respond(applied: bool, subject: &str, transcript: &Transcript) -> ToolResponse {
    let summary = if applied {
        ToolResponse::success(format!("Populated {subject}."))
    } else if transcript.has_errors() {
        ToolResponse::error(format!("Nothing was applied to {subject}."))
    } else {
        ToolResponse::success("No modifications were made.")
    };
    if transcript.is_empty() {
        return summary;
    }
    ToolResponse::prefixed(summary.status, format!("{}\n{transcript}", summary.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::LineLevel;

    #[test]
    fn test_response_opens_with_a_summary_line() {
        let mut transcript = Transcript::default();
        transcript.success(1, "'intensity' (f32) changed: 2.5 -> 3.0");
        let response = respond(true, "'3'", &transcript);
        assert_eq!(response.status, ToolStatus::Success);
        assert_eq!(
            response.message,
            "[Success] Populated '3'.\n  [Success] 'intensity' (f32) changed: 2.5 -> 3.0"
        );

        transcript.error(1, "Field 'glow' not found on 'scene::Light'.");
        let failed = respond(false, "'3'", &transcript);
        assert_eq!(failed.status, ToolStatus::Error);
        assert!(failed.message.starts_with(&format!("[{}] Nothing was applied", LineLevel::Error)));
    }
}
