use std::sync::Arc;

use error_stack::Report;
use error_stack::ResultExt;
use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use super::ToolFn;
use super::ToolResponse;
use super::Tools;
use super::method_find::known_namespace;
use super::method_find::match_levels;
use crate::error::Error;
use crate::error::Result;
use crate::host::DetachedHost;
use crate::host::Host;
use crate::host::OperationTicket;
use crate::host::PendingOperations;
use crate::marshal::Reflector;
use crate::method::InvocationResult;
use crate::method::MatchLevels;
use crate::method::MethodDescriptor;
use crate::method::ParameterShape;
use crate::node::SerializedNode;
use crate::node::Transcript;

/// Parameters of `method_call`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MethodCallParams {
    /// Partial description of the method; must resolve to exactly one method
    #[serde(default)]
    pub filter:                  MethodDescriptor,
    /// Treat `filter.namespace` as exact instead of case-insensitive
    #[serde(default)]
    pub known_namespace:         bool,
    /// Minimal type name match level, 0 to 6. Defaults to 1
    #[serde(default)]
    pub type_name_match_level:   Option<u8>,
    /// Minimal method name match level, 0 to 6. Defaults to 1
    #[serde(default)]
    pub method_name_match_level: Option<u8>,
    /// Minimal parameters match level, 0 to 2. Defaults to 2
    #[serde(default)]
    pub parameters_match_level:  Option<u8>,
    /// Instance to call the method on. Left out, a new instance of the declaring type is created.
    /// Ignored for static methods
    #[serde(default)]
    pub target_object:           Option<SerializedNode>,
    /// Arguments, each with `name`, `typeName` and `value`
    #[serde(default)]
    pub input_parameters:        Vec<SerializedNode>,
    /// Run on the host thread; defaults to the bridge configuration. Off the host thread no
    /// live host object can be reached
    #[serde(default)]
    pub run_on_host_thread:      Option<bool>,
}

impl MethodCallParams {
    /// Filter used for resolution, with the arguments folded in when it lists no parameters
    fn descriptor(&self) -> MethodDescriptor {
        let mut filter = self.filter.clone();
        let unspecified = filter.parameters.as_ref().is_none_or(Vec::is_empty);
        if unspecified && !self.input_parameters.is_empty() {
            filter.parameters = Some(
                self.input_parameters
                    .iter()
                    .map(|arg| ParameterShape {
                        name:      arg.name.clone(),
                        type_name: Some(arg.type_name.clone()).filter(|t| !t.is_empty()),
                    })
                    .collect(),
            );
        }
        filter
    }
}

enum CallOutcome {
    NotFound(MethodDescriptor),
    Invoked {
        result:     InvocationResult,
        transcript: Transcript,
    },
}

pub struct MethodCall;

impl ToolFn for MethodCall {
    type Params = MethodCallParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        let reflector = Arc::clone(&tools.reflector);
        let on_host_thread = params
            .run_on_host_thread
            .unwrap_or(reflector.config().run_on_host_thread);

        if on_host_thread {
            let operations = tools.operations.clone();
            let work = tools
                .host
                .run(cancel, move |host| call_impl(&reflector, host, Some(&operations), &params));
            return async move { respond(work.await??) }.boxed();
        }

        let outcome = if cancel.is_cancelled() {
            Err(Report::new(Error::Cancelled(
                "the request was cancelled before the method ran".to_string(),
            )))
        } else {
            call_impl(&reflector, &mut DetachedHost, None, &params)
        };
        async move { respond(outcome?) }.boxed()
    }
}

fn call_impl(
    reflector: &Reflector,
    host: &mut dyn Host,
    operations: Option<&PendingOperations>,
    params: &MethodCallParams,
) -> Result<CallOutcome> {
    let descriptor = params.descriptor();
    let levels = match_levels(
        MatchLevels::for_call(),
        params.type_name_match_level,
        params.method_name_match_level,
        params.parameters_match_level,
    );
    let method = reflector
        .resolve_method(
            &descriptor,
            levels,
            known_namespace(&descriptor, params.known_namespace),
        )
        .attach("Only a single method can be called. Specify the method more precisely.")?;
    let Some(method) = method else {
        return Ok(CallOutcome::NotFound(descriptor));
    };

    let mut transcript = reflector.transcript();
    let result = reflector.invoke(
        host,
        operations,
        method,
        params.target_object.as_ref(),
        &params.input_parameters,
        &mut transcript,
    )?;
    Ok(CallOutcome::Invoked { result, transcript })
}

fn respond(outcome: CallOutcome) -> Result<ToolResponse> {
    let (result, transcript) = match outcome {
        CallOutcome::NotFound(descriptor) => {
            return Ok(ToolResponse::error(format!("Method not found.\n{descriptor}")));
        },
        CallOutcome::Invoked { result, transcript } => (result, transcript),
    };
    let mut response = match result {
        InvocationResult::Empty => ToolResponse::success("Execution result: null"),
        InvocationResult::Value(value) => {
            ToolResponse::success(format!("Execution result: {value}")).with_payload(value)?
        },
        InvocationResult::Structured(node) => {
            let rendered =
                serde_json::to_string_pretty(&node).map_err(|e| Report::new(Error::from(e)))?;
            ToolResponse::success(format!("Execution result:\n```json\n{rendered}\n```"))
                .with_payload(node)?
        },
        InvocationResult::Processing(ticket) => {
            let id = ticket.id();
            let message = format!(
                "Processing '{}'. A completion notice with operation id {id} follows.",
                ticket.description()
            );
            watch(ticket);
            ToolResponse::processing(message).with_payload(json!({ "operationId": id }))?
        },
    };
    // argument binding logs every assigned member; only problems are returned
    if transcript.has_problems() {
        response.message.push('\n');
        response.message.push_str(&transcript.render());
    }
    Ok(response)
}

/// Log the completion of a started operation; subscribers get the notice directly
fn watch(ticket: OperationTicket) {
    tokio::spawn(async move {
        match ticket.wait().await {
            Ok(notice) => info!(id = %notice.id, message = %notice.message, "Operation finished"),
            Err(report) => warn!(error = ?report, "Operation never finished"),
        }
    });
}
