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
use crate::reflect::Ownership;
use crate::reflect::TypeInfo;
use crate::reflect::TypeKind;
use crate::reflect::TypeName;

/// Parameters of `type_schema`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeSchemaParams {
    /// Full or short type name
    pub type_name: String,
}

/// Parameters of `type_list`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeListParams {
    /// Case-insensitive substring of the full type name
    #[serde(default)]
    pub filter: Option<String>,
}

/// One entry of the type list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypeSummary {
    name:        TypeName,
    kind:        &'static str,
    ownership:   Ownership,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<&TypeInfo> for TypeSummary {
    fn from(info: &TypeInfo) -> Self {
        let kind = match info.kind {
            TypeKind::Primitive { .. } => "primitive",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Sequence { .. } => "sequence",
            TypeKind::Composite { .. } => "composite",
            TypeKind::Reference => "reference",
            TypeKind::Optional { .. } => "optional",
        };
        Self {
            name: info.name.clone(),
            kind,
            ownership: info.ownership,
            description: info.description.clone(),
        }
    }
}

pub struct TypeSchema;

pub struct TypeList;

impl ToolFn for TypeSchema {
    type Params = TypeSchemaParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        _cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        let type_name = params.type_name.trim();
        let response = tools
            .reflector()
            .schema_of(type_name)
            .and_then(|schema| {
                ToolResponse::success(format!("Schema of '{type_name}'.")).with_payload(schema)
            });
        async move { response }.boxed()
    }
}

impl ToolFn for TypeList {
    type Params = TypeListParams;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        _cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>> {
        let filter = params
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);
        let types: Vec<TypeSummary> = tools
            .reflector()
            .types()
            .iter()
            .filter(|info| {
                filter
                    .as_deref()
                    .is_none_or(|f| info.name.as_str().to_lowercase().contains(f))
            })
            .map(TypeSummary::from)
            .collect();
        let response =
            ToolResponse::success(format!("Found {} type(s).", types.len())).with_payload(types);
        async move { response }.boxed()
    }
}
