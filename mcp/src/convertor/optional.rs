use serde_json::Value;

use super::Convertor;
use super::Priority;
use crate::marshal::PopulateCx;
use crate::marshal::SerializeCx;
use crate::node::SerializedNode;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;
use crate::reflect::TypeKind;
use crate::reflect::TypeName;

/// `Option<T>`: absent is a `null` leaf, a present value is handled by the inner type's convertor
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionalConvertor;

fn inner_type(info: &TypeInfo) -> TypeName {
    match &info.kind {
        TypeKind::Optional { inner } => inner.clone(),
        _ => TypeName::unknown(),
    }
}

impl Convertor for OptionalConvertor {
    fn name(&self) -> &'static str { "optional" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        matches!(info.kind, TypeKind::Optional { .. }).then(Priority::family)
    }

    fn serialize(
        &self,
        cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        recursive: bool,
        depth: usize,
    ) -> SerializedNode {
        let Some(inner) = obj.inner_value() else {
            return SerializedNode::leaf(info.name.clone(), name, Value::Null);
        };
        let host_owned = cx
            .reflector
            .types()
            .get(inner.type_name().as_str())
            .is_some_and(|registration| registration.info().is_host_owned());
        let mut node = cx.serialize(
            Some(inner),
            &inner_type(info),
            name,
            recursive && !host_owned,
            depth,
        );
        node.type_name = info.name.clone();
        node
    }

    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let label = node.name.clone().unwrap_or_else(|| info.name.short_name());
        if node.is_leaf() && node.is_explicit_null() {
            let before = obj.to_json();
            return match obj.set_json(&Value::Null) {
                Ok(()) => {
                    cx.transcript.success(
                        depth,
                        format!("'{label}' ({}) changed: {before} -> null", info.name),
                    );
                    true
                },
                Err(error) => {
                    cx.transcript
                        .error(depth, format!("'{label}' ({}) not changed. {error}", info.name));
                    false
                },
            };
        }

        let was_empty = obj.inner_value().is_none();
        let declared = node.type_name.clone();
        if declared.is_empty() || info.name.matches(declared.as_str()) {
            node.type_name = inner_type(info);
        }
        let applied = match obj.inner_value_mut() {
            Some(inner) => cx.populate(inner, node, depth),
            None => {
                cx.transcript
                    .error(depth, format!("'{label}' ({}) cannot hold a value.", info.name));
                false
            },
        };
        node.type_name = declared;

        // a failed first assignment leaves the optional empty
        if !applied && was_empty && obj.set_json(&Value::Null).is_err() {
            cx.transcript
                .error(depth, format!("'{label}' ({}) could not be reset.", info.name));
        }
        applied
    }
}
