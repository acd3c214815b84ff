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

/// Ordered collections; elements are addressed positionally as `[i]`
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceConvertor;

fn element_name(index: usize) -> String { format!("[{index}]") }

fn item_type(info: &TypeInfo) -> TypeName {
    match &info.kind {
        TypeKind::Sequence { item } => item.clone(),
        _ => TypeName::unknown(),
    }
}

impl SequenceConvertor {
    /// Populate element `index`, appending a default element when `index == len`
    fn populate_element(
        cx: &mut PopulateCx<'_>,
        obj: &mut dyn Reflect,
        item: &TypeName,
        index: usize,
        entry: &mut SerializedNode,
        depth: usize,
    ) -> bool {
        let len = obj.element_count();
        if index < len {
            return obj
                .element_mut(index)
                .is_some_and(|element| cx.populate(element, entry, depth));
        }
        if index > len {
            cx.transcript.error(
                depth,
                format!(
                    "Index {index} is out of range for '{}' with {len} element(s).",
                    obj.type_name()
                ),
            );
            return false;
        }

        let mut element = match cx.create_value(item) {
            Ok(element) => element,
            Err(report) => {
                cx.transcript
                    .error(depth, report.current_context().to_string());
                return false;
            },
        };
        let applied = cx.populate(element.as_mut(), entry, depth);
        if entry.is_empty() || applied {
            if let Err(error) = obj.push_element(element) {
                cx.transcript.error(depth, error.to_string());
                return false;
            }
        }
        applied
    }
}

impl Convertor for SequenceConvertor {
    fn name(&self) -> &'static str { "sequence" }

    fn priority(&self, info: &TypeInfo) -> Option<Priority> {
        matches!(info.kind, TypeKind::Sequence { .. }).then(Priority::family)
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
        if !recursive || obj.element_count() == 0 {
            return SerializedNode::leaf(info.name.clone(), name, obj.to_json());
        }
        let item = item_type(info);
        let mut node = SerializedNode::composite(info.name.clone(), name);
        for index in 0..obj.element_count() {
            let element = obj.element(index);
            let child = cx.serialize(element, &item, Some(&element_name(index)), true, depth + 1);
            node.fields.push(child);
        }
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
        let item = item_type(info);
        let mut applied = false;

        match node.value.take() {
            None => {},
            Some(Value::Array(items)) => {
                let len = items.len();
                for (index, value) in items.into_iter().enumerate() {
                    let mut entry =
                        SerializedNode::leaf(item.clone(), Some(&element_name(index)), value);
                    applied |=
                        Self::populate_element(cx, obj, &item, index, &mut entry, depth + 1);
                }
                if obj.element_count() > len {
                    obj.truncate_elements(len);
                    cx.transcript.success(
                        depth,
                        format!("'{}' truncated to {len} element(s).", info.name),
                    );
                    applied = true;
                }
                if len == 0 {
                    applied = true;
                }
            },
            Some(other) => {
                let error = crate::error::Error::unsupported(&info.name, &other);
                cx.transcript.error(depth, error.to_string());
                return false;
            },
        }

        let mut entries = std::mem::take(&mut node.fields);
        for entry in &mut entries {
            let Some(index) = entry.positional_index() else {
                cx.transcript.error(
                    depth + 1,
                    format!(
                        "Element '{}' of '{}' has no positional index such as '[0]'.",
                        entry.name.as_deref().unwrap_or_default(),
                        info.name
                    ),
                );
                continue;
            };
            applied |= Self::populate_element(cx, obj, &item, index, entry, depth + 1);
        }
        node.fields = entries;

        for prop in &node.props {
            cx.transcript.warning(
                depth,
                format!(
                    "'{}' has no properties, '{}' ignored.",
                    info.name,
                    prop.name.as_deref().unwrap_or_default()
                ),
            );
        }
        applied
    }
}
