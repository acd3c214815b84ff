use std::sync::Arc;

use error_stack::Report;
use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::ToolFn;
use super::ToolResponse;
use super::Tools;
use crate::error::Error;
use crate::error::Result;
use crate::host::Host;
use crate::marshal::Reflector;
use crate::node::SerializedNode;
use crate::reflect::ObjectRef;

/// Parameters of `object_serialize`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerializeParams {
    /// Full or short type name. Required when `target` is a plain value
    #[serde(default)]
    pub type_name: Option<String>,
    /// `{"handle": <id>}` of a host object, or a plain JSON value of `typeName`
    #[serde(default)]
    pub target:    Value,
    /// Walk nested members into `fields`/`props`; defaults to the bridge configuration
    #[serde(default)]
    pub recursive: Option<bool>,
    /// Name given to the root node
    #[serde(default)]
    pub name:      Option<String>,
}

pub struct ObjectSerialize;

impl ToolFn for ObjectSerialize {
    type Params = SerializeParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        let reflector = Arc::clone(&tools.reflector);
        let work = tools
            .host
            .run(cancel, move |host| handle_impl(&reflector, host, &params));
        async move { work.await? }.boxed()
    }
}

fn handle_impl(
    reflector: &Reflector,
    host: &mut dyn Host,
    params: &SerializeParams,
) -> Result<ToolResponse> {
    let recursive = params
        .recursive
        .unwrap_or(reflector.config().default_recursive);
    let name = params.name.as_deref();
    let mut transcript = reflector.transcript();

    let declared = match params.type_name.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(type_name) => Some(reflector.types().info(type_name.trim())?),
        None => None,
    };

    let node = match declared {
        Some(info) if !info.is_host_owned() => {
            let source = SerializedNode::leaf(info.name.clone(), None, params.target.clone());
            let value = reflector.deserialize(host, &source, &info.name, &mut transcript)?;
            reflector.serialize(host, value.as_deref(), &info.name, name, recursive, &mut transcript)
        },
        declared => {
            let reference = ObjectRef::from_value(&params.target).ok_or_else(|| {
                Report::new(Error::invalid(
                    "target",
                    "expected {\"handle\": <id>}, or a 'typeName' naming a value type",
                ))
            })?;
            match declared {
                Some(info) if reference.is_null() => {
                    reflector.serialize(host, None, &info.name, name, recursive, &mut transcript)
                },
                _ => reflector.serialize_handle(host, reference.handle, name, recursive, &mut transcript)?,
            }
        },
    };

    let message = if transcript.is_empty() {
        format!("Serialized '{}'.", node.type_name)
    } else {
        format!("Serialized '{}'.\n{transcript}", node.type_name)
    };
    ToolResponse::success(message).with_payload(node)
}
