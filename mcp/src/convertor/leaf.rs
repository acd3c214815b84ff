//! Convertors for single-value types: primitives, enumerations and opaque references

use super::Convertor;
use super::Priority;
use crate::marshal::PopulateCx;
use crate::marshal::SerializeCx;
use crate::node::SerializedNode;
use crate::reflect::ObjectRef;
use crate::reflect::Reflect;
use crate::reflect::TypeInfo;
use crate::reflect::TypeKind;

/// Integers, numbers, strings and booleans
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveConvertor;

/// Fieldless enumerations, serialized by variant name
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumConvertor;

/// Opaque references; assigned handles are checked against the host
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectRefConvertor;

fn serialize_leaf(obj: &dyn Reflect, info: &TypeInfo, name: Option<&str>) -> SerializedNode {
    SerializedNode::leaf(info.name.clone(), name, obj.to_json())
}

fn label(node: &SerializedNode, info: &TypeInfo) -> String {
    node.name.clone().unwrap_or_else(|| info.name.short_name())
}

/// Assign `node.value` onto a leaf, recording old and new representations
fn populate_leaf(
    cx: &mut PopulateCx<'_>,
    obj: &mut dyn Reflect,
    info: &TypeInfo,
    node: &SerializedNode,
    depth: usize,
) -> bool {
    let label = label(node, info);
    if !node.is_leaf() {
        cx.transcript.error(
            depth,
            format!(
                "'{label}' ({}) is a value type. Set 'value' instead of 'fields' or 'props'.",
                info.name
            ),
        );
        return false;
    }
    let Some(value) = node.value.as_ref() else {
        cx.transcript
            .warning(depth, format!("No value provided for '{label}' ({}).", info.name));
        return false;
    };

    let before = obj.to_json();
    match obj.set_json(value) {
        Ok(()) => {
            cx.transcript.success(
                depth,
                format!(
                    "'{label}' ({}) changed: {before} -> {}",
                    info.name,
                    obj.to_json()
                ),
            );
            true
        },
        Err(error) => {
            cx.transcript
                .error(depth, format!("'{label}' ({}) not changed. {error}", info.name));
            false
        },
    }
}

impl Convertor for PrimitiveConvertor {
    fn name(&self) -> &'static str { "primitive" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        matches!(info.kind, TypeKind::Primitive { .. }).then(Priority::family)
    }

    fn serialize(
        &self,
        _cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        _recursive: bool,
        _depth: usize,
    ) -> SerializedNode {
        serialize_leaf(obj, info, name)
    }

    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        populate_leaf(cx, obj, info, node, depth)
    }
}

impl Convertor for EnumConvertor {
    fn name(&self) -> &'static str { "enum" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        matches!(info.kind, TypeKind::Enum { .. }).then(Priority::family)
    }

    fn serialize(
        &self,
        _cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        _recursive: bool,
        _depth: usize,
    ) -> SerializedNode {
        serialize_leaf(obj, info, name)
    }

    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        populate_leaf(cx, obj, info, node, depth)
    }
}

impl Convertor for ObjectRefConvertor {
    fn name(&self) -> &'static str { "object_ref" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        matches!(info.kind, TypeKind::Reference).then(Priority::exact)
    }

    fn serialize(
        &self,
        _cx: &mut SerializeCx<'_>,
        obj: &dyn Reflect,
        info: &TypeInfo,
        name: Option<&str>,
        _recursive: bool,
        _depth: usize,
    ) -> SerializedNode {
        serialize_leaf(obj, info, name)
    }

    fn populate(
        &self,
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        info: &TypeInfo,
        node: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        if let Some(reference) = node.object_ref().filter(|r| !r.is_null()) {
            let Some(target) = cx.host.resolve(reference.handle) else {
                cx.transcript.error(
                    depth,
                    format!(
                        "'{}' ({}) not changed. Object with handle '{}' not found.",
                        label(node, info),
                        info.name,
                        reference.handle
                    ),
                );
                return false;
            };
            let kind = target.type_name().short_name();
            if reference.kind.is_empty() {
                node.value = Some(ObjectRef::new(reference.handle, kind).to_value());
            }
        }
        populate_leaf(cx, obj, info, node, depth)
    }
}
