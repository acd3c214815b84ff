use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::ToolFn;
use super::ToolResponse;
use super::Tools;
use crate::error::Result;
use crate::method::MatchLevels;
use crate::method::MethodData;
use crate::method::MethodDescriptor;

/// Parameters of `method_find`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MethodFindParams {
    /// Partial description of the wanted method
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
    /// Minimal parameters match level, 0 to 2. Defaults to 0
    #[serde(default)]
    pub parameters_match_level:  Option<u8>,
}

/// Levels from the request, falling back to `defaults` per criterion
pub(super) fn match_levels(
    defaults: MatchLevels,
    type_name: Option<u8>,
    method_name: Option<u8>,
    parameters: Option<u8>,
) -> MatchLevels {
    MatchLevels::new(
        type_name.unwrap_or(defaults.type_name_level),
        method_name.unwrap_or(defaults.method_name_level),
        parameters.unwrap_or(defaults.parameters_level),
    )
}

/// Namespace a search is pinned to when the caller says the namespace is known
pub(super) fn known_namespace(filter: &MethodDescriptor, known: bool) -> Option<&str> {
    if known {
        filter.namespace.as_deref().map(str::trim)
    } else {
        None
    }
}

pub struct MethodFind;

impl ToolFn for MethodFind {
    type Params = MethodFindParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        _cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        // the method registry is immutable, no host access needed
        let response = handle_impl(tools, &params);
        async move { response }.boxed()
    }
}

fn handle_impl(tools: &Tools, params: &MethodFindParams) -> Result<ToolResponse> {
    let reflector = tools.reflector();
    let levels = match_levels(
        MatchLevels::default(),
        params.type_name_match_level,
        params.method_name_match_level,
        params.parameters_match_level,
    );
    let found = reflector.find_methods(
        &params.filter,
        levels,
        known_namespace(&params.filter, params.known_namespace),
    );
    if found.is_empty() {
        return Ok(ToolResponse::success(format!(
            "Method not found. With request:\n{}",
            params.filter
        )));
    }

    let data: Vec<MethodData> = found
        .into_iter()
        .map(|method| reflector.method_data(method))
        .collect();
    ToolResponse::success(format!("Found {} method(s).", data.len())).with_payload(data)
}
